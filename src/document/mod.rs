//! Document state management and text utilities.
//!
//! This module provides:
//! - `LineIndex` and `full_range` for LSP position conversion
//! - `TextBuffer` and `BufferStore` for host-owned buffer contents
//! - `ChangeEvents` and `Subscription` for change notifications
//! - `XmlTree`, the owned parse result
//! - `DocumentModel`, the per-buffer parse cache, and `Workspace`, which ties them together

mod buffer;
mod events;
mod model;
mod state;
mod text;
mod tree;

pub use buffer::{BufferStore, TextBuffer, XML_LANGUAGES, XQUERY_LANGUAGE};
pub use events::{ChangeEvent, ChangeEvents, Subscription};
pub use model::DocumentModel;
pub use state::Workspace;
pub use text::{full_range, LineIndex};
pub use tree::{Attribute, Element, NamespaceDecl, QName, TreeError, XmlNode, XmlTree};
