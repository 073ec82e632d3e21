//! Open-document bookkeeping: buffers, change events and document models.

use std::sync::Arc;

use dashmap::DashMap;
use tower_lsp::lsp_types::Url;
use tracing::debug;

use super::buffer::{BufferStore, TextBuffer};
use super::events::{ChangeEvent, ChangeEvents};
use super::model::DocumentModel;

/// Every open buffer plus one [`DocumentModel`] per XML-family buffer.
#[derive(Debug, Default)]
pub struct Workspace {
    buffers: BufferStore,
    events: ChangeEvents,
    models: DashMap<Url, Arc<DocumentModel>>,
}

impl Workspace {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn events(&self) -> &ChangeEvents {
        &self.events
    }

    /// Open a buffer. XML buffers get a model, which parses immediately via
    /// the initial change notification.
    pub fn open(&self, uri: Url, language_id: &str, text: String, version: i32) -> Arc<TextBuffer> {
        if let Some((_, stale)) = self.models.remove(&uri) {
            stale.dispose();
        }

        let buffer = self
            .buffers
            .open(TextBuffer::new(uri.clone(), language_id, text, version));
        if buffer.is_xml() {
            let model = DocumentModel::new(&buffer, &self.events);
            self.models.insert(uri.clone(), Arc::new(model));
        }

        self.events.notify(&ChangeEvent { uri, version });
        buffer
    }

    /// Replace a buffer's text and notify listeners.
    pub fn change(&self, uri: &Url, text: String, version: i32) -> Option<Arc<TextBuffer>> {
        let buffer = self.buffers.update(uri, text, version)?;
        self.events.notify(&ChangeEvent {
            uri: uri.clone(),
            version,
        });
        Some(buffer)
    }

    pub fn close(&self, uri: &Url) {
        if let Some((_, model)) = self.models.remove(uri) {
            model.dispose();
        }
        if self.buffers.close(uri).is_some() {
            debug!(%uri, "buffer closed");
        }
    }

    pub fn buffer(&self, uri: &Url) -> Option<Arc<TextBuffer>> {
        self.buffers.get(uri)
    }

    pub fn model(&self, uri: &Url) -> Option<Arc<DocumentModel>> {
        self.models.get(uri).map(|r| Arc::clone(&r))
    }

    /// Dispose every model. Buffers stay readable.
    pub fn dispose_models(&self) {
        let uris: Vec<Url> = self.models.iter().map(|r| r.key().clone()).collect();
        for uri in uris {
            if let Some((_, model)) = self.models.remove(&uri) {
                model.dispose();
            }
        }
    }
}
