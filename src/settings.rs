//! Settings infrastructure.
//!
//! Settings live under the `xmlTools` namespace and come from two places:
//! an `xmltools.toml` file discovered from the workspace root, and JSON
//! payloads sent by the client (`initializationOptions` and
//! `workspace/didChangeConfiguration`). Client payloads win. Anything that
//! fails to load is logged and the defaults apply.

use std::path::{Path, PathBuf};

use serde::Deserialize;
use tracing::warn;

/// Name of the settings file searched for by [`discover_settings`].
pub const SETTINGS_FILE: &str = "xmltools.toml";

/// Root settings structure.
#[derive(Debug, Clone, Default, PartialEq, Deserialize)]
pub struct Settings {
    #[serde(rename = "xmlTools", default)]
    pub xml_tools: XmlToolsSettings,
}

/// The `xmlTools` section.
#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct XmlToolsSettings {
    /// Strip comments when minifying.
    pub remove_comments_on_minify: bool,

    /// Drop default namespace declarations before evaluating XPath, so
    /// unprefixed steps match elements in the default namespace.
    pub ignore_default_namespace: bool,

    /// Remember XPath queries and reuse the last one when none is given.
    pub persist_x_path_query: bool,

    /// Executable used to run XQuery scripts.
    pub xquery_execution_engine: Option<String>,

    /// Arguments passed to the engine. `$(script)`, `$(input)` and
    /// `$(input.output)` are substituted.
    pub xquery_execution_arguments: Vec<String>,
}

impl Default for XmlToolsSettings {
    fn default() -> Self {
        Self {
            remove_comments_on_minify: false,
            ignore_default_namespace: true,
            persist_x_path_query: true,
            xquery_execution_engine: None,
            xquery_execution_arguments: [
                "-xquery",
                "$(script)",
                "-in",
                "$(input)",
                "-out",
                "$(input.output)",
            ]
            .into_iter()
            .map(String::from)
            .collect(),
        }
    }
}

impl XmlToolsSettings {
    /// The configured engine, treating an empty string as unset.
    pub fn execution_engine(&self) -> Option<&str> {
        self.xquery_execution_engine
            .as_deref()
            .map(str::trim)
            .filter(|s| !s.is_empty())
    }
}

/// Load settings from a TOML file.
///
/// Returns default settings if the file doesn't exist or can't be parsed.
pub fn load_settings(path: &Path) -> Settings {
    match std::fs::read_to_string(path) {
        Ok(content) => match toml::from_str(&content) {
            Ok(settings) => settings,
            Err(e) => {
                warn!(path = %path.display(), error = %e, "failed to parse settings");
                Settings::default()
            }
        },
        Err(_) => Settings::default(),
    }
}

/// Discover `xmltools.toml` by searching up the directory tree, then direct
/// children of `start_dir`.
///
/// Returns `(settings, settings_dir)`; if nothing is found, the defaults and
/// `start_dir`.
pub fn discover_settings(start_dir: &Path) -> (Settings, PathBuf) {
    let mut current = Some(start_dir);
    while let Some(dir) = current {
        let candidate = dir.join(SETTINGS_FILE);
        if candidate.is_file() {
            return (load_settings(&candidate), dir.to_path_buf());
        }
        current = dir.parent();
    }

    if let Ok(entries) = std::fs::read_dir(start_dir) {
        for entry in entries.flatten() {
            if entry.file_type().map(|ft| ft.is_dir()).unwrap_or(false) {
                let candidate = entry.path().join(SETTINGS_FILE);
                if candidate.is_file() {
                    return (load_settings(&candidate), entry.path());
                }
            }
        }
    }

    (Settings::default(), start_dir.to_path_buf())
}

/// Settings from a client JSON payload such as `{"xmlTools": {...}}`.
///
/// Returns `None` for payloads without an `xmlTools` section so that file
/// settings are kept.
pub fn settings_from_json(value: &serde_json::Value) -> Option<Settings> {
    value.get("xmlTools")?;
    match serde_json::from_value(value.clone()) {
        Ok(settings) => Some(settings),
        Err(e) => {
            warn!(error = %e, "ignoring malformed client settings");
            None
        }
    }
}
