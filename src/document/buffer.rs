//! Host-owned text buffers.

use std::sync::Arc;

use dashmap::DashMap;
use parking_lot::RwLock;
use tower_lsp::lsp_types::Url;

/// Language ids whose buffers get a [`DocumentModel`](super::DocumentModel).
pub const XML_LANGUAGES: &[&str] = &["xml", "xsl"];

pub const XQUERY_LANGUAGE: &str = "xquery";

/// The contents of one open editor buffer.
///
/// Identity is the URI: two buffers are "the same" when their URIs match,
/// regardless of content.
#[derive(Debug)]
pub struct TextBuffer {
    uri: Url,
    language_id: String,
    snapshot: RwLock<Snapshot>,
}

#[derive(Debug, Clone)]
struct Snapshot {
    text: Arc<str>,
    version: i32,
}

impl TextBuffer {
    pub fn new(uri: Url, language_id: impl Into<String>, text: impl Into<String>, version: i32) -> Self {
        Self {
            uri,
            language_id: language_id.into().to_lowercase(),
            snapshot: RwLock::new(Snapshot {
                text: Arc::from(text.into()),
                version,
            }),
        }
    }

    pub fn uri(&self) -> &Url {
        &self.uri
    }

    pub fn language_id(&self) -> &str {
        &self.language_id
    }

    /// The full current text.
    pub fn text(&self) -> Arc<str> {
        Arc::clone(&self.snapshot.read().text)
    }

    pub fn version(&self) -> i32 {
        self.snapshot.read().version
    }

    pub fn is_xml(&self) -> bool {
        XML_LANGUAGES.contains(&self.language_id.as_str())
    }

    pub fn is_xquery(&self) -> bool {
        self.language_id == XQUERY_LANGUAGE
    }

    pub(crate) fn replace(&self, text: String, version: i32) {
        *self.snapshot.write() = Snapshot {
            text: Arc::from(text),
            version,
        };
    }
}

/// Open buffers keyed by URI.
#[derive(Debug, Default)]
pub struct BufferStore {
    buffers: DashMap<Url, Arc<TextBuffer>>,
}

impl BufferStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Insert a buffer, replacing any previous buffer for the same URI.
    pub fn open(&self, buffer: TextBuffer) -> Arc<TextBuffer> {
        let buffer = Arc::new(buffer);
        self.buffers
            .insert(buffer.uri().clone(), Arc::clone(&buffer));
        buffer
    }

    /// Replace the text of an open buffer. Returns `None` if it is not open.
    pub fn update(&self, uri: &Url, text: String, version: i32) -> Option<Arc<TextBuffer>> {
        let buffer = self.get(uri)?;
        buffer.replace(text, version);
        Some(buffer)
    }

    pub fn close(&self, uri: &Url) -> Option<Arc<TextBuffer>> {
        self.buffers.remove(uri).map(|(_, buffer)| buffer)
    }

    pub fn get(&self, uri: &Url) -> Option<Arc<TextBuffer>> {
        self.buffers.get(uri).map(|r| Arc::clone(&r))
    }
}
