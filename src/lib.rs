//! XML and XQuery language server.

use std::path::PathBuf;
use std::sync::{Arc, OnceLock};

use serde_json::Value;
use tower_lsp::jsonrpc::Result;
use tower_lsp::lsp_types::*;
use tower_lsp::{Client, LanguageServer, LspService};
use tracing::{debug, info, warn};

pub mod commands;
pub mod document;
pub mod extension;
pub mod host;
pub mod lsp;
pub mod services;
pub mod settings;
pub mod types;

pub use commands::{Command, CommandContext, CommandError};
pub use document::{DocumentModel, LineIndex, TextBuffer, Workspace, XmlTree};
pub use extension::{activate, deactivate, ExtensionContext, Registry};
pub use host::{ContentProvider, DiagnosticsProvider, Host, LspHost, Registrar};
pub use settings::{discover_settings, load_settings, Settings};

use services::FormatOptions;

pub struct Backend {
    host: LspHost,
    workspace: Workspace,
    registry: Registry,
    context: OnceLock<Arc<ExtensionContext>>,
}

impl Backend {
    pub(crate) fn new(client: Client) -> Self {
        let mut registry = Registry::new();
        extension::activate(&mut registry);
        Self {
            host: LspHost::new(client),
            workspace: Workspace::new(),
            registry,
            context: OnceLock::new(),
        }
    }

    /// The extension context, with defaults if the client never initialized.
    fn context(&self) -> &Arc<ExtensionContext> {
        self.context
            .get_or_init(|| Arc::new(ExtensionContext::new(None, Settings::default())))
    }

    fn command_context(&self) -> CommandContext<'_> {
        CommandContext {
            workspace: &self.workspace,
            extension: self.context(),
            registry: &self.registry,
            host: &self.host,
        }
    }

    /// Re-lint a buffer that was opened, edited or saved.
    async fn on_context_change(&self, uri: &Url) {
        if let Some(buffer) = self.workspace.buffer(uri) {
            extension::handle_context_change(&buffer, &self.registry, &self.host).await;
        }
    }

    /// Whole-document formatting edit for an XML buffer.
    async fn format_document(&self, uri: &Url, options: &FormattingOptions) -> Option<Vec<TextEdit>> {
        let buffer = self.workspace.buffer(uri)?;
        if !buffer.is_xml() {
            return None;
        }
        let text = buffer.text();
        match services::format(&text, FormatOptions::from_lsp(options)) {
            Ok(formatted) if formatted == *text => Some(vec![]),
            Ok(formatted) => Some(vec![TextEdit {
                range: document::full_range(&text),
                new_text: formatted,
            }]),
            Err(e) => {
                warn!(%uri, error = %e, "formatting failed");
                self.host
                    .show_message(MessageType::ERROR, e.to_string())
                    .await;
                None
            }
        }
    }
}

fn workspace_root(params: &InitializeParams) -> Option<PathBuf> {
    params
        .workspace_folders
        .as_ref()
        .and_then(|folders| folders.first())
        .and_then(|f| f.uri.to_file_path().ok())
        .or_else(|| {
            #[allow(deprecated)]
            params.root_uri.as_ref()?.to_file_path().ok()
        })
}

#[tower_lsp::async_trait]
impl LanguageServer for Backend {
    async fn initialize(&self, params: InitializeParams) -> Result<InitializeResult> {
        let root = workspace_root(&params);

        // Discover settings by walking up the directory tree, then let the
        // client's initialization options override them
        let mut settings = match &root {
            Some(root) => settings::discover_settings(root).0,
            None => Settings::default(),
        };
        if let Some(overrides) = params
            .initialization_options
            .as_ref()
            .and_then(settings::settings_from_json)
        {
            settings = overrides;
        }
        info!(root = ?root, "initializing");
        let _ = self
            .context
            .set(Arc::new(ExtensionContext::new(root, settings)));

        Ok(InitializeResult {
            capabilities: ServerCapabilities {
                text_document_sync: Some(TextDocumentSyncCapability::Kind(
                    TextDocumentSyncKind::FULL,
                )),
                completion_provider: Some(CompletionOptions {
                    trigger_characters: Some(
                        lsp::TRIGGER_CHARACTERS
                            .iter()
                            .map(|c| c.to_string())
                            .collect(),
                    ),
                    resolve_provider: Some(false),
                    ..Default::default()
                }),
                document_formatting_provider: Some(OneOf::Left(true)),
                document_range_formatting_provider: Some(OneOf::Left(true)),
                execute_command_provider: Some(ExecuteCommandOptions {
                    commands: self.registry.command_names(),
                    ..Default::default()
                }),
                ..Default::default()
            },
            server_info: Some(ServerInfo {
                name: env!("CARGO_PKG_NAME").to_string(),
                version: Some(env!("CARGO_PKG_VERSION").to_string()),
            }),
        })
    }

    async fn initialized(&self, _: InitializedParams) {
        self.host
            .log_message(MessageType::INFO, "XML tools language server initialized".to_string())
            .await;
    }

    async fn shutdown(&self) -> Result<()> {
        extension::deactivate(self.context(), &self.workspace);
        Ok(())
    }

    async fn did_open(&self, params: DidOpenTextDocumentParams) {
        let doc = params.text_document;
        debug!(uri = %doc.uri, language = %doc.language_id, "open");
        self.workspace
            .open(doc.uri.clone(), &doc.language_id, doc.text, doc.version);
        self.on_context_change(&doc.uri).await;
    }

    async fn did_change(&self, params: DidChangeTextDocumentParams) {
        // We use FULL sync, so there's exactly one change with the full text
        let uri = params.text_document.uri;
        if let Some(change) = params.content_changes.into_iter().next() {
            self.workspace
                .change(&uri, change.text, params.text_document.version);
            self.on_context_change(&uri).await;
        }
    }

    async fn did_save(&self, params: DidSaveTextDocumentParams) {
        self.on_context_change(&params.text_document.uri).await;
    }

    async fn did_close(&self, params: DidCloseTextDocumentParams) {
        let uri = params.text_document.uri;
        self.workspace.close(&uri);
        extension::clear_diagnostics(uri, &self.host).await;
    }

    async fn did_change_configuration(&self, params: DidChangeConfigurationParams) {
        match settings::settings_from_json(&params.settings) {
            Some(settings) => {
                debug!(?settings, "configuration changed");
                self.context().set_settings(settings);
            }
            None => debug!("configuration change without xmlTools section"),
        }
    }

    async fn completion(&self, params: CompletionParams) -> Result<Option<CompletionResponse>> {
        let uri = &params.text_document_position.text_document.uri;
        let position = params.text_document_position.position;

        let Some(buffer) = self.workspace.buffer(uri) else {
            return Ok(None);
        };
        if !buffer.is_xquery() {
            return Ok(None);
        }
        let line_index = LineIndex::new(buffer.text().to_string());
        Ok(lsp::completion_at_position(&line_index, position))
    }

    async fn formatting(&self, params: DocumentFormattingParams) -> Result<Option<Vec<TextEdit>>> {
        Ok(self
            .format_document(&params.text_document.uri, &params.options)
            .await)
    }

    /// Formats the whole document; a fragment of XML is rarely well-formed on
    /// its own.
    async fn range_formatting(
        &self,
        params: DocumentRangeFormattingParams,
    ) -> Result<Option<Vec<TextEdit>>> {
        Ok(self
            .format_document(&params.text_document.uri, &params.options)
            .await)
    }

    async fn execute_command(&self, params: ExecuteCommandParams) -> Result<Option<Value>> {
        Ok(commands::run_by_name(&params.command, params.arguments, self.command_context()).await)
    }
}

pub fn create_service() -> (LspService<Backend>, tower_lsp::ClientSocket) {
    LspService::new(Backend::new)
}
