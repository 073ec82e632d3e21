//! Capability interfaces between the tooling and the editor host.
//!
//! [`Host`] is the output surface (messages, edits, diagnostics, prompts) and
//! [`Registrar`] the registration surface. Document models and feature
//! providers only see these traits; [`LspHost`] adapts them to a
//! `tower_lsp::Client`, and tests substitute recording fakes.

use std::collections::HashMap;
use std::sync::Arc;

use thiserror::Error;
use tower_lsp::lsp_types::{
    Diagnostic, MessageActionItem, MessageType, TextEdit, Url, WorkspaceEdit,
};
use tower_lsp::Client;
use tracing::warn;

use crate::commands::Command;
use crate::document::Workspace;

#[derive(Debug, Clone, Error, PartialEq, Eq)]
#[error("host request failed: {0}")]
pub struct HostError(pub String);

#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum ContentError {
    #[error("{0} is not a valid content URI")]
    BadUri(Url),
    #[error("{0} is not open")]
    UnknownDocument(Url),
    #[error("the document is not valid XML: {0}")]
    NotValidXml(String),
}

/// Output surface of the editor.
#[tower_lsp::async_trait]
pub trait Host: Send + Sync {
    async fn show_message(&self, kind: MessageType, message: String);

    async fn log_message(&self, kind: MessageType, message: String);

    /// Ask the user to pick one of `choices`. `None` if dismissed.
    async fn pick(&self, message: String, choices: Vec<String>) -> Option<String>;

    /// Apply edits to one document. `Ok(false)` if the host declined them.
    async fn apply_edits(&self, uri: Url, edits: Vec<TextEdit>) -> Result<bool, HostError>;

    async fn publish_diagnostics(&self, uri: Url, diagnostics: Vec<Diagnostic>, version: Option<i32>);
}

/// Produces the text of virtual documents under one URI scheme.
pub trait ContentProvider: Send + Sync {
    fn provide_content(&self, uri: &Url, workspace: &Workspace) -> Result<String, ContentError>;
}

/// Produces diagnostics for buffers of one language.
pub trait DiagnosticsProvider: Send + Sync {
    fn provide_diagnostics(&self, text: &str) -> Vec<Diagnostic>;
}

/// Registration surface, used once at activation.
pub trait Registrar {
    fn register_command(&mut self, command: Command);
    fn register_content_provider(&mut self, scheme: &str, provider: Arc<dyn ContentProvider>);
    fn register_diagnostics_provider(&mut self, language_id: &str, provider: Arc<dyn DiagnosticsProvider>);
}

/// [`Host`] backed by an LSP client connection.
#[derive(Clone)]
pub struct LspHost {
    client: Client,
}

impl LspHost {
    pub fn new(client: Client) -> Self {
        Self { client }
    }
}

#[tower_lsp::async_trait]
impl Host for LspHost {
    async fn show_message(&self, kind: MessageType, message: String) {
        self.client.show_message(kind, message).await;
    }

    async fn log_message(&self, kind: MessageType, message: String) {
        self.client.log_message(kind, message).await;
    }

    async fn pick(&self, message: String, choices: Vec<String>) -> Option<String> {
        let actions = choices
            .into_iter()
            .map(|title| MessageActionItem {
                title,
                properties: HashMap::new(),
            })
            .collect();
        match self
            .client
            .show_message_request(MessageType::INFO, message, Some(actions))
            .await
        {
            Ok(choice) => choice.map(|item| item.title),
            Err(e) => {
                warn!(error = %e, "choice prompt failed");
                None
            }
        }
    }

    async fn apply_edits(&self, uri: Url, edits: Vec<TextEdit>) -> Result<bool, HostError> {
        let edit = WorkspaceEdit {
            changes: Some(HashMap::from([(uri, edits)])),
            ..Default::default()
        };
        let response = self
            .client
            .apply_edit(edit)
            .await
            .map_err(|e| HostError(e.to_string()))?;
        if let Some(reason) = &response.failure_reason {
            warn!(%reason, "client rejected edit");
        }
        Ok(response.applied)
    }

    async fn publish_diagnostics(&self, uri: Url, diagnostics: Vec<Diagnostic>, version: Option<i32>) {
        self.client
            .publish_diagnostics(uri, diagnostics, version)
            .await;
    }
}
