//! Parsed XML cache for one buffer.

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, Weak};

use parking_lot::{Mutex, RwLock};
use tower_lsp::lsp_types::Url;
use tracing::{debug, trace};

use super::buffer::TextBuffer;
use super::events::{ChangeEvent, ChangeEvents, Subscription};
use super::tree::{TreeError, XmlTree};

#[derive(Debug, Default)]
struct ParseCache {
    tree: Option<Arc<XmlTree>>,
    valid: bool,
    last_error: Option<TreeError>,
}

#[derive(Debug)]
struct ModelInner {
    uri: Url,
    buffer: Weak<TextBuffer>,
    cache: RwLock<ParseCache>,
    disposed: AtomicBool,
}

impl ModelInner {
    fn on_change(&self, event: &ChangeEvent) {
        if event.uri != self.uri || self.disposed.load(Ordering::Acquire) {
            return;
        }
        let Some(buffer) = self.buffer.upgrade() else {
            return;
        };
        if buffer.is_xml() {
            self.refresh(&buffer);
        }
    }

    fn refresh(&self, buffer: &TextBuffer) {
        let text = buffer.text();
        let parsed = XmlTree::parse(&text);

        let mut cache = self.cache.write();
        match parsed {
            Ok(tree) => {
                trace!(uri = %self.uri, "parsed xml");
                cache.tree = Some(Arc::new(tree));
                cache.valid = true;
                cache.last_error = None;
            }
            Err(err) => {
                // The previous tree stays cached; readers must check validity.
                debug!(uri = %self.uri, error = %err, "xml parse failed");
                cache.valid = false;
                cache.last_error = Some(err);
            }
        }
    }
}

/// Cached XML tree for one text buffer, kept in sync with change events.
///
/// The model observes its buffer through a weak reference and re-parses the
/// full text synchronously on every change notification for that buffer.
/// When a parse fails the previously parsed tree is retained and
/// [`is_valid_as_of_last_parse`](Self::is_valid_as_of_last_parse) turns false.
#[derive(Debug)]
pub struct DocumentModel {
    inner: Arc<ModelInner>,
    subscription: Mutex<Option<Subscription>>,
}

impl DocumentModel {
    /// Attach a model to `buffer`. Nothing is parsed until the first change
    /// notification for the buffer arrives.
    pub fn new(buffer: &Arc<TextBuffer>, events: &ChangeEvents) -> Self {
        let inner = Arc::new(ModelInner {
            uri: buffer.uri().clone(),
            buffer: Arc::downgrade(buffer),
            cache: RwLock::new(ParseCache::default()),
            disposed: AtomicBool::new(false),
        });

        let weak = Arc::downgrade(&inner);
        let subscription = events.subscribe(move |event| {
            if let Some(inner) = weak.upgrade() {
                inner.on_change(event);
            }
        });

        Self {
            inner,
            subscription: Mutex::new(Some(subscription)),
        }
    }

    pub fn uri(&self) -> &Url {
        &self.inner.uri
    }

    /// The observed buffer, if the host still holds it.
    pub fn base_buffer(&self) -> Option<Arc<TextBuffer>> {
        self.inner.buffer.upgrade()
    }

    pub fn is_valid_as_of_last_parse(&self) -> bool {
        self.inner.cache.read().valid
    }

    /// The last successfully parsed tree. Check
    /// [`is_valid_as_of_last_parse`](Self::is_valid_as_of_last_parse) first;
    /// after a failed parse this is the older tree.
    pub fn current_tree(&self) -> Option<Arc<XmlTree>> {
        self.inner.cache.read().tree.clone()
    }

    /// The error from the most recent parse, if it failed.
    pub fn last_error(&self) -> Option<TreeError> {
        self.inner.cache.read().last_error.clone()
    }

    /// Detach from change events. Safe to call more than once.
    pub fn dispose(&self) {
        self.inner.disposed.store(true, Ordering::Release);
        if let Some(subscription) = self.subscription.lock().take() {
            subscription.dispose();
            debug!(uri = %self.inner.uri, "document model disposed");
        }
    }

    pub fn is_disposed(&self) -> bool {
        self.inner.disposed.load(Ordering::Acquire)
    }
}

impl Drop for DocumentModel {
    fn drop(&mut self) {
        self.dispose();
    }
}
