//! Extension lifecycle and extension-lifetime state.
//!
//! [`activate`] registers commands and providers with a [`Registrar`];
//! [`deactivate`] clears the persisted query history and detaches every
//! document model. State that outlives a single request lives in an
//! [`ExtensionContext`] that is passed to whoever needs it.

use std::collections::{BTreeMap, HashMap};
use std::path::{Path, PathBuf};
use std::sync::Arc;

use dashmap::DashMap;
use parking_lot::RwLock;
use serde::de::DeserializeOwned;
use serde::Serialize;
use tower_lsp::lsp_types::Url;
use tracing::{debug, info, warn};

use crate::commands::Command;
use crate::document::{TextBuffer, Workspace, XQUERY_LANGUAGE};
use crate::host::{ContentProvider, DiagnosticsProvider, Host, Registrar};
use crate::lsp::tree_view::{self, XmlTreeContentProvider};
use crate::lsp::XQueryLintProvider;
use crate::settings::Settings;

/// State key of the XPath query history.
pub const MEM_QUERY_HISTORY: &str = "xpathQueryHistory";

const HISTORY_LIMIT: usize = 25;

/// Key/value store of JSON values.
#[derive(Debug, Default)]
pub struct StateStore {
    values: DashMap<String, serde_json::Value>,
}

impl StateStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// The stored value, or `None` if absent or of another shape.
    pub fn get<T: DeserializeOwned>(&self, key: &str) -> Option<T> {
        let value = self.values.get(key)?.clone();
        match serde_json::from_value(value) {
            Ok(v) => Some(v),
            Err(e) => {
                warn!(key, error = %e, "stored state has unexpected shape");
                None
            }
        }
    }

    pub fn update<T: Serialize>(&self, key: &str, value: &T) {
        match serde_json::to_value(value) {
            Ok(v) => {
                self.values.insert(key.to_string(), v);
            }
            Err(e) => warn!(key, error = %e, "failed to store state"),
        }
    }
}

/// Most-recent-first list of XPath queries.
#[derive(Debug, Clone, Copy)]
pub struct QueryHistory<'a> {
    store: &'a StateStore,
}

impl<'a> QueryHistory<'a> {
    pub fn new(store: &'a StateStore) -> Self {
        Self { store }
    }

    pub fn entries(&self) -> Vec<String> {
        self.store.get(MEM_QUERY_HISTORY).unwrap_or_default()
    }

    pub fn last(&self) -> Option<String> {
        self.entries().into_iter().next()
    }

    /// Move `query` to the front, dropping older duplicates.
    pub fn record(&self, query: &str) {
        let mut entries = self.entries();
        entries.retain(|q| q != query);
        entries.insert(0, query.to_string());
        entries.truncate(HISTORY_LIMIT);
        self.store.update(MEM_QUERY_HISTORY, &entries);
    }

    pub fn clear(&self) {
        self.store.update(MEM_QUERY_HISTORY, &Vec::<String>::new());
    }
}

/// Extension-lifetime state: settings and persisted key/value stores.
#[derive(Debug)]
pub struct ExtensionContext {
    workspace_root: Option<PathBuf>,
    settings: RwLock<Settings>,
    global_state: StateStore,
    workspace_state: Option<StateStore>,
}

impl ExtensionContext {
    /// A context for `workspace_root`. Workspace state exists only when a
    /// root is known.
    pub fn new(workspace_root: Option<PathBuf>, settings: Settings) -> Self {
        let workspace_state = workspace_root.as_ref().map(|_| StateStore::new());
        Self {
            workspace_root,
            settings: RwLock::new(settings),
            global_state: StateStore::new(),
            workspace_state,
        }
    }

    pub fn workspace_root(&self) -> Option<&Path> {
        self.workspace_root.as_deref()
    }

    /// A snapshot of the current settings.
    pub fn settings(&self) -> Settings {
        self.settings.read().clone()
    }

    pub fn set_settings(&self, settings: Settings) {
        *self.settings.write() = settings;
    }

    pub fn global_state(&self) -> &StateStore {
        &self.global_state
    }

    /// Workspace state when available, otherwise global state.
    pub fn memento(&self) -> &StateStore {
        self.workspace_state.as_ref().unwrap_or(&self.global_state)
    }

    pub fn query_history(&self) -> QueryHistory<'_> {
        QueryHistory::new(self.memento())
    }
}

/// Everything registered at activation.
#[derive(Default)]
pub struct Registry {
    commands: BTreeMap<String, Command>,
    content_providers: HashMap<String, Arc<dyn ContentProvider>>,
    diagnostics_providers: HashMap<String, Arc<dyn DiagnosticsProvider>>,
}

impl Registry {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn command(&self, name: &str) -> Option<Command> {
        self.commands.get(name).copied()
    }

    /// Registered command names, sorted.
    pub fn command_names(&self) -> Vec<String> {
        self.commands.keys().cloned().collect()
    }

    pub fn content_provider(&self, scheme: &str) -> Option<Arc<dyn ContentProvider>> {
        self.content_providers.get(scheme).cloned()
    }

    pub fn diagnostics_provider(&self, language_id: &str) -> Option<Arc<dyn DiagnosticsProvider>> {
        self.diagnostics_providers.get(language_id).cloned()
    }
}

impl Registrar for Registry {
    fn register_command(&mut self, command: Command) {
        self.commands.insert(command.name().to_string(), command);
    }

    fn register_content_provider(&mut self, scheme: &str, provider: Arc<dyn ContentProvider>) {
        self.content_providers.insert(scheme.to_string(), provider);
    }

    fn register_diagnostics_provider(&mut self, language_id: &str, provider: Arc<dyn DiagnosticsProvider>) {
        self.diagnostics_providers
            .insert(language_id.to_string(), provider);
    }
}

impl std::fmt::Debug for Registry {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Registry")
            .field("commands", &self.command_names())
            .field("content_providers", &self.content_providers.keys().collect::<Vec<_>>())
            .field(
                "diagnostics_providers",
                &self.diagnostics_providers.keys().collect::<Vec<_>>(),
            )
            .finish()
    }
}

/// Register all commands and providers.
pub fn activate(registrar: &mut dyn Registrar) {
    info!("activate extension");
    for command in Command::ALL {
        registrar.register_command(command);
    }
    registrar.register_content_provider(tree_view::SCHEME, Arc::new(XmlTreeContentProvider));
    registrar.register_diagnostics_provider(XQUERY_LANGUAGE, Arc::new(XQueryLintProvider));
}

/// Clear the query history and detach all document models.
pub fn deactivate(context: &ExtensionContext, workspace: &Workspace) {
    context.query_history().clear();
    workspace.dispose_models();
    debug!("extension deactivated");
}

/// Publish diagnostics for `buffer` if its language has a provider.
///
/// Called whenever the buffer gains focus or changes.
pub async fn handle_context_change(buffer: &TextBuffer, registry: &Registry, host: &dyn Host) {
    let Some(provider) = registry.diagnostics_provider(buffer.language_id()) else {
        return;
    };
    let diagnostics = provider.provide_diagnostics(&buffer.text());
    debug!(uri = %buffer.uri(), count = diagnostics.len(), "publishing diagnostics");
    host.publish_diagnostics(buffer.uri().clone(), diagnostics, Some(buffer.version()))
        .await;
}

/// Clear diagnostics published for a closed buffer.
pub async fn clear_diagnostics(uri: Url, host: &dyn Host) {
    host.publish_diagnostics(uri, Vec::new(), None).await;
}
