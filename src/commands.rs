//! The four editor commands.
//!
//! Each handler returns a `Result`; [`run`] is the boundary that turns every
//! failure into an error message on the [`Host`], so a command never fails
//! the protocol request that invoked it.

use std::path::{Path, PathBuf};

use serde_json::{json, Value};
use thiserror::Error;
use tower_lsp::lsp_types::{MessageType, TextEdit, Url};
use tracing::{debug, info, warn};

use crate::document::{full_range, Workspace};
use crate::extension::{ExtensionContext, Registry};
use crate::host::{ContentError, Host, HostError};
use crate::lsp::tree_view;
use crate::services::xquery::{self, ExecutionError, ExecutionRequest};
use crate::services::{self, FormatError, MinifyOptions, XPathError, XPathOptions};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Command {
    MinifyXml,
    EvaluateXPath,
    ExecuteXQuery,
    ViewXmlTree,
}

impl Command {
    pub const ALL: [Command; 4] = [
        Command::MinifyXml,
        Command::EvaluateXPath,
        Command::ExecuteXQuery,
        Command::ViewXmlTree,
    ];

    pub fn name(self) -> &'static str {
        match self {
            Command::MinifyXml => "xmlTools.minifyXml",
            Command::EvaluateXPath => "xmlTools.evaluateXPath",
            Command::ExecuteXQuery => "xmlTools.executeXQuery",
            Command::ViewXmlTree => "xmlTools.viewXmlTree",
        }
    }

    pub fn from_name(name: &str) -> Option<Self> {
        Self::ALL.into_iter().find(|c| c.name() == name)
    }
}

#[derive(Debug, Error)]
pub enum CommandError {
    #[error("Unknown command: {0}")]
    UnknownCommand(String),
    #[error("No document was given for this command.")]
    MissingUri,
    #[error("Invalid command argument: {0}")]
    InvalidArgument(String),
    #[error("{0} is not open.")]
    DocumentNotOpen(Url),
    #[error("This action can only be performed on an XML document.")]
    NotXml,
    #[error("The XML document is not valid: {0}")]
    NotValidXml(String),
    #[error("No XPath query was given.")]
    MissingQuery,
    #[error("The edit could not be applied.")]
    EditRejected,
    #[error(transparent)]
    Format(#[from] FormatError),
    #[error(transparent)]
    XPath(#[from] XPathError),
    #[error(transparent)]
    Execution(#[from] ExecutionError),
    #[error("The XML Tree could not be created: {0}")]
    Tree(#[from] ContentError),
    #[error(transparent)]
    Host(#[from] HostError),
}

/// Everything a command handler may touch.
#[derive(Clone, Copy)]
pub struct CommandContext<'a> {
    pub workspace: &'a Workspace,
    pub extension: &'a ExtensionContext,
    pub registry: &'a Registry,
    pub host: &'a dyn Host,
}

/// Run `command`, reporting any failure as an error message.
pub async fn run(command: Command, args: Vec<Value>, cx: CommandContext<'_>) -> Option<Value> {
    debug!(command = command.name(), "executing command");
    let result = match command {
        Command::MinifyXml => minify_xml(&args, cx).await,
        Command::EvaluateXPath => evaluate_xpath(&args, cx).await,
        Command::ExecuteXQuery => execute_xquery(&args, cx).await,
        Command::ViewXmlTree => view_xml_tree(&args, cx).await,
    };
    match result {
        Ok(value) => value,
        Err(e) => {
            warn!(command = command.name(), error = %e, "command failed");
            cx.host.show_message(MessageType::ERROR, e.to_string()).await;
            None
        }
    }
}

/// Look up `name` and run it.
pub async fn run_by_name(name: &str, args: Vec<Value>, cx: CommandContext<'_>) -> Option<Value> {
    match cx.registry.command(name) {
        Some(command) => run(command, args, cx).await,
        None => {
            let e = CommandError::UnknownCommand(name.to_string());
            cx.host.show_message(MessageType::ERROR, e.to_string()).await;
            None
        }
    }
}

fn uri_arg(args: &[Value]) -> Result<Url, CommandError> {
    let raw = match args.first() {
        Some(Value::String(s)) => s.as_str(),
        Some(Value::Object(map)) => map
            .get("uri")
            .and_then(Value::as_str)
            .ok_or(CommandError::MissingUri)?,
        Some(other) => return Err(CommandError::InvalidArgument(other.to_string())),
        None => return Err(CommandError::MissingUri),
    };
    Url::parse(raw).map_err(|e| CommandError::InvalidArgument(format!("{}: {}", raw, e)))
}

/// Optional non-empty string argument at `index`.
fn string_arg(args: &[Value], index: usize) -> Option<String> {
    args.get(index)
        .and_then(Value::as_str)
        .map(str::trim)
        .filter(|s| !s.is_empty())
        .map(str::to_string)
}

async fn minify_xml(args: &[Value], cx: CommandContext<'_>) -> Result<Option<Value>, CommandError> {
    let uri = uri_arg(args)?;
    let buffer = cx
        .workspace
        .buffer(&uri)
        .ok_or_else(|| CommandError::DocumentNotOpen(uri.clone()))?;
    if !buffer.is_xml() {
        return Err(CommandError::NotXml);
    }
    let options = MinifyOptions {
        remove_comments: cx.extension.settings().xml_tools.remove_comments_on_minify,
    };
    let text = buffer.text();
    let minified = services::minify(&text, options)?;
    let edit = TextEdit {
        range: full_range(&text),
        new_text: minified,
    };
    if !cx.host.apply_edits(uri, vec![edit]).await? {
        return Err(CommandError::EditRejected);
    }
    Ok(None)
}

async fn evaluate_xpath(args: &[Value], cx: CommandContext<'_>) -> Result<Option<Value>, CommandError> {
    let uri = uri_arg(args)?;
    if cx.workspace.buffer(&uri).is_none() {
        return Err(CommandError::DocumentNotOpen(uri));
    }
    let model = cx.workspace.model(&uri).ok_or(CommandError::NotXml)?;
    let tree = match model.current_tree() {
        Some(tree) if model.is_valid_as_of_last_parse() => tree,
        _ => {
            let reason = model
                .last_error()
                .map(|e| e.to_string())
                .unwrap_or_else(|| "the document has not been parsed".to_string());
            return Err(CommandError::NotValidXml(reason));
        }
    };

    let settings = cx.extension.settings().xml_tools;
    let history = cx.extension.query_history();
    let query = string_arg(args, 1)
        .or_else(|| history.last())
        .ok_or(CommandError::MissingQuery)?;

    let options = XPathOptions {
        ignore_default_namespace: settings.ignore_default_namespace,
    };
    let outcome = services::evaluate_tree(&tree, &query, options)?;
    if settings.persist_x_path_query {
        history.record(&query);
    }

    let mut log = vec![format!("XPath Query: {}", query)];
    log.extend(outcome.lines());
    cx.host.log_message(MessageType::INFO, log.join("\n")).await;
    cx.host.show_message(MessageType::INFO, outcome.summary()).await;

    Ok(Some(json!({ "query": query, "result": outcome })))
}

/// Candidate input files, shown to the user relative to `root`.
fn input_choices(root: &Path, files: &[PathBuf]) -> Vec<String> {
    files
        .iter()
        .map(|f| f.strip_prefix(root).unwrap_or(f).display().to_string())
        .collect()
}

async fn choose_input(
    args: &[Value],
    script: &Path,
    cx: CommandContext<'_>,
) -> Result<PathBuf, CommandError> {
    if let Some(input) = string_arg(args, 1) {
        return match Url::parse(&input) {
            Ok(url) if url.scheme() == "file" => url
                .to_file_path()
                .map_err(|_| CommandError::InvalidArgument(input.clone())),
            _ => Ok(PathBuf::from(input)),
        };
    }

    let root = match cx.extension.workspace_root() {
        Some(root) => root.to_path_buf(),
        None => script
            .parent()
            .map(Path::to_path_buf)
            .unwrap_or_default(),
    };
    let mut files = xquery::discover_input_files(root.clone()).await?;
    match files.len() {
        0 => Err(ExecutionError::NoInputFiles.into()),
        1 => Ok(files.remove(0)),
        _ => {
            let choices = input_choices(&root, &files);
            let picked = cx
                .host
                .pick("Select an input file".to_string(), choices.clone())
                .await
                .ok_or(ExecutionError::NoInputSelected)?;
            choices
                .iter()
                .position(|c| *c == picked)
                .map(|i| files.swap_remove(i))
                .ok_or_else(|| ExecutionError::NoInputSelected.into())
        }
    }
}

async fn execute_xquery(args: &[Value], cx: CommandContext<'_>) -> Result<Option<Value>, CommandError> {
    let uri = uri_arg(args)?;
    let buffer = cx
        .workspace
        .buffer(&uri)
        .ok_or_else(|| CommandError::DocumentNotOpen(uri.clone()))?;
    if !buffer.is_xquery() {
        return Err(ExecutionError::NotXQuery.into());
    }

    let settings = cx.extension.settings().xml_tools;
    let engine = settings
        .execution_engine()
        .ok_or(ExecutionError::EngineNotConfigured)?
        .to_string();
    let script = uri
        .to_file_path()
        .map_err(|_| ExecutionError::UnsavedScript)?;
    let input = choose_input(args, &script, cx).await?;

    let request = ExecutionRequest::new(&engine, &settings.xquery_execution_arguments, script, input);
    let version = buffer.version();
    cx.host
        .log_message(
            MessageType::INFO,
            format!("Executing XQuery script {}", request.script.display()),
        )
        .await;

    let output = xquery::execute(&request).await?;

    let current = cx.workspace.buffer(&uri).map(|b| b.version());
    if current != Some(version) {
        info!(%uri, "script changed during execution, result not announced");
        cx.host
            .log_message(
                MessageType::INFO,
                format!(
                    "XQuery output written to {} (script changed while running)",
                    request.output.display()
                ),
            )
            .await;
        return Ok(None);
    }

    if !output.stdout.trim().is_empty() {
        cx.host
            .log_message(MessageType::INFO, output.stdout.clone())
            .await;
    }
    cx.host
        .show_message(
            MessageType::INFO,
            format!(
                "XQuery execution complete. Output written to {}",
                request.output.display()
            ),
        )
        .await;
    Ok(Some(json!({ "output": request.output })))
}

async fn view_xml_tree(args: &[Value], cx: CommandContext<'_>) -> Result<Option<Value>, CommandError> {
    let uri = uri_arg(args)?;
    let tree_uri = tree_view::build_uri(&uri).ok_or_else(|| ContentError::BadUri(uri.clone()))?;
    let provider = cx
        .registry
        .content_provider(tree_view::SCHEME)
        .ok_or_else(|| ContentError::BadUri(tree_uri.clone()))?;
    let content = provider.provide_content(&tree_uri, cx.workspace)?;

    cx.host
        .log_message(MessageType::INFO, content.clone())
        .await;
    Ok(Some(json!({ "uri": tree_uri, "content": content })))
}

#[cfg(test)]
mod tests {
    use super::*;
    use parking_lot::Mutex;
    use tower_lsp::lsp_types::Diagnostic;

    use crate::extension::activate;
    use crate::settings::Settings;

    /// Records every host call; answers prompts with `pick_answer`.
    #[derive(Default)]
    struct RecordingHost {
        messages: Mutex<Vec<(MessageType, String)>>,
        logs: Mutex<Vec<String>>,
        edits: Mutex<Vec<(Url, Vec<TextEdit>)>>,
        picks: Mutex<Vec<Vec<String>>>,
        pick_answer: Option<String>,
        reject_edits: bool,
    }

    impl RecordingHost {
        fn errors(&self) -> Vec<String> {
            self.messages
                .lock()
                .iter()
                .filter(|(kind, _)| *kind == MessageType::ERROR)
                .map(|(_, m)| m.clone())
                .collect()
        }

        fn infos(&self) -> Vec<String> {
            self.messages
                .lock()
                .iter()
                .filter(|(kind, _)| *kind == MessageType::INFO)
                .map(|(_, m)| m.clone())
                .collect()
        }
    }

    #[tower_lsp::async_trait]
    impl Host for RecordingHost {
        async fn show_message(&self, kind: MessageType, message: String) {
            self.messages.lock().push((kind, message));
        }

        async fn log_message(&self, _kind: MessageType, message: String) {
            self.logs.lock().push(message);
        }

        async fn pick(&self, _message: String, choices: Vec<String>) -> Option<String> {
            self.picks.lock().push(choices);
            self.pick_answer.clone()
        }

        async fn apply_edits(&self, uri: Url, edits: Vec<TextEdit>) -> Result<bool, HostError> {
            self.edits.lock().push((uri, edits));
            Ok(!self.reject_edits)
        }

        async fn publish_diagnostics(&self, _uri: Url, _diagnostics: Vec<Diagnostic>, _version: Option<i32>) {}
    }

    struct Fixture {
        workspace: Workspace,
        extension: ExtensionContext,
        registry: Registry,
    }

    impl Fixture {
        fn new(settings: Settings) -> Self {
            let mut registry = Registry::new();
            activate(&mut registry);
            Self {
                workspace: Workspace::new(),
                extension: ExtensionContext::new(None, settings),
                registry,
            }
        }

        fn cx<'a>(&'a self, host: &'a RecordingHost) -> CommandContext<'a> {
            CommandContext {
                workspace: &self.workspace,
                extension: &self.extension,
                registry: &self.registry,
                host,
            }
        }
    }

    fn file(name: &str) -> Url {
        Url::parse(&format!("file:///work/{}", name)).unwrap()
    }

    #[test]
    fn command_names_round_trip() {
        for command in Command::ALL {
            assert_eq!(Command::from_name(command.name()), Some(command));
        }
        assert_eq!(Command::from_name("xmlTools.nope"), None);
    }

    #[tokio::test]
    async fn minify_replaces_whole_document() {
        let fx = Fixture::new(Settings::default());
        fx.workspace
            .open(file("a.xml"), "xml", "<a>\n  <b/>\n</a>\n".into(), 1);
        let host = RecordingHost::default();

        let result = run(Command::MinifyXml, vec![json!(file("a.xml").as_str())], fx.cx(&host)).await;

        assert!(result.is_none());
        assert!(host.errors().is_empty());
        let edits = host.edits.lock();
        assert_eq!(edits.len(), 1);
        assert_eq!(edits[0].1[0].new_text, "<a><b/></a>");
        assert_eq!(edits[0].1[0].range.start, tower_lsp::lsp_types::Position::new(0, 0));
        assert_eq!(edits[0].1[0].range.end, tower_lsp::lsp_types::Position::new(3, 0));
    }

    #[tokio::test]
    async fn minify_honors_remove_comments() {
        let mut settings = Settings::default();
        settings.xml_tools.remove_comments_on_minify = true;
        let fx = Fixture::new(settings);
        fx.workspace
            .open(file("a.xml"), "xml", "<a><!-- x --><b/></a>".into(), 1);
        let host = RecordingHost::default();

        run(Command::MinifyXml, vec![json!(file("a.xml").as_str())], fx.cx(&host)).await;

        assert_eq!(host.edits.lock()[0].1[0].new_text, "<a><b/></a>");
    }

    #[tokio::test]
    async fn minify_reports_malformed_xml() {
        let fx = Fixture::new(Settings::default());
        fx.workspace.open(file("a.xml"), "xml", "<a><b></a>".into(), 1);
        let host = RecordingHost::default();

        run(Command::MinifyXml, vec![json!(file("a.xml").as_str())], fx.cx(&host)).await;

        assert!(host.edits.lock().is_empty());
        assert_eq!(host.errors().len(), 1);
    }

    #[tokio::test]
    async fn rejected_edit_is_reported() {
        let fx = Fixture::new(Settings::default());
        fx.workspace.open(file("a.xml"), "xml", "<a/>".into(), 1);
        let host = RecordingHost {
            reject_edits: true,
            ..Default::default()
        };

        run(Command::MinifyXml, vec![json!(file("a.xml").as_str())], fx.cx(&host)).await;

        assert_eq!(host.errors(), vec!["The edit could not be applied."]);
    }

    #[tokio::test]
    async fn missing_uri_is_reported() {
        let fx = Fixture::new(Settings::default());
        let host = RecordingHost::default();

        run(Command::MinifyXml, vec![], fx.cx(&host)).await;

        assert_eq!(host.errors(), vec!["No document was given for this command."]);
    }

    #[tokio::test]
    async fn xpath_reports_summary_and_records_history() {
        let fx = Fixture::new(Settings::default());
        fx.workspace.open(
            file("a.xml"),
            "xml",
            "<root xmlns=\"urn:x\"><b>1</b><b>2</b></root>".into(),
            1,
        );
        let host = RecordingHost::default();

        let result = run(
            Command::EvaluateXPath,
            vec![json!(file("a.xml").as_str()), json!("/root/b")],
            fx.cx(&host),
        )
        .await;

        assert!(result.is_some());
        assert_eq!(host.infos(), vec!["Your XPath query returned 2 node(s)."]);
        assert_eq!(fx.extension.query_history().entries(), vec!["/root/b"]);
        assert!(host.logs.lock()[0].starts_with("XPath Query: /root/b"));
    }

    #[tokio::test]
    async fn xpath_reuses_last_query() {
        let fx = Fixture::new(Settings::default());
        fx.workspace
            .open(file("a.xml"), "xml", "<root><b/></root>".into(), 1);
        fx.extension.query_history().record("count(//b)");
        let host = RecordingHost::default();

        run(Command::EvaluateXPath, vec![json!(file("a.xml").as_str())], fx.cx(&host)).await;

        assert_eq!(host.infos(), vec!["XPath result: 1"]);
    }

    #[tokio::test]
    async fn xpath_without_persistence_leaves_history_alone() {
        let mut settings = Settings::default();
        settings.xml_tools.persist_x_path_query = false;
        let fx = Fixture::new(settings);
        fx.workspace
            .open(file("a.xml"), "xml", "<root/>".into(), 1);
        let host = RecordingHost::default();

        run(
            Command::EvaluateXPath,
            vec![json!(file("a.xml").as_str()), json!("/root")],
            fx.cx(&host),
        )
        .await;

        assert!(fx.extension.query_history().entries().is_empty());
    }

    #[tokio::test]
    async fn xpath_on_invalid_document_is_reported() {
        let fx = Fixture::new(Settings::default());
        fx.workspace.open(file("a.xml"), "xml", "<root>".into(), 1);
        let host = RecordingHost::default();

        run(
            Command::EvaluateXPath,
            vec![json!(file("a.xml").as_str()), json!("/root")],
            fx.cx(&host),
        )
        .await;

        let errors = host.errors();
        assert_eq!(errors.len(), 1);
        assert!(errors[0].starts_with("The XML document is not valid"));
    }

    #[tokio::test]
    async fn xpath_queries_documents_with_a_doctype() {
        let fx = Fixture::new(Settings::default());
        fx.workspace.open(
            file("a.xml"),
            "xml",
            "<!DOCTYPE a [<!ENTITY e 'x'>]><a><b>&e;</b></a>".into(),
            1,
        );
        let host = RecordingHost::default();

        run(
            Command::EvaluateXPath,
            vec![json!(file("a.xml").as_str()), json!("//b")],
            fx.cx(&host),
        )
        .await;

        assert!(host.errors().is_empty());
        assert_eq!(host.infos(), vec!["Your XPath query returned 1 node(s)."]);
        assert_eq!(host.logs.lock()[0], "XPath Query: //b\nb: x");
    }

    #[tokio::test]
    async fn xpath_on_overly_nested_document_is_reported() {
        let depth = 20_000;
        let source = format!("{}{}", "<a>".repeat(depth), "</a>".repeat(depth));
        let fx = Fixture::new(Settings::default());
        fx.workspace.open(file("a.xml"), "xml", source, 1);
        let host = RecordingHost::default();

        run(
            Command::EvaluateXPath,
            vec![json!(file("a.xml").as_str()), json!("count(//a)")],
            fx.cx(&host),
        )
        .await;

        let errors = host.errors();
        assert_eq!(errors.len(), 1);
        assert!(errors[0].contains("nested deeper than"));
    }

    #[tokio::test]
    async fn xpath_without_query_is_reported() {
        let fx = Fixture::new(Settings::default());
        fx.workspace.open(file("a.xml"), "xml", "<root/>".into(), 1);
        let host = RecordingHost::default();

        run(Command::EvaluateXPath, vec![json!(file("a.xml").as_str())], fx.cx(&host)).await;

        assert_eq!(host.errors(), vec!["No XPath query was given."]);
    }

    #[tokio::test]
    async fn xquery_requires_xquery_buffer() {
        let fx = Fixture::new(Settings::default());
        fx.workspace.open(file("a.xml"), "xml", "<a/>".into(), 1);
        let host = RecordingHost::default();

        run(Command::ExecuteXQuery, vec![json!(file("a.xml").as_str())], fx.cx(&host)).await;

        assert_eq!(
            host.errors(),
            vec!["This action can only be performed on an XQuery file."]
        );
    }

    #[tokio::test]
    async fn xquery_requires_engine() {
        let fx = Fixture::new(Settings::default());
        fx.workspace
            .open(file("q.xq"), "xquery", "1 + 1".into(), 1);
        let host = RecordingHost::default();

        run(Command::ExecuteXQuery, vec![json!(file("q.xq").as_str())], fx.cx(&host)).await;

        assert_eq!(
            host.errors(),
            vec!["An XQuery execution engine has not been defined."]
        );
    }

    #[tokio::test]
    async fn xquery_dismissed_prompt_is_reported() {
        let dir = tempfile::tempdir().unwrap();
        std::fs::write(dir.path().join("a.xml"), "<a/>").unwrap();
        std::fs::write(dir.path().join("b.xml"), "<b/>").unwrap();
        let script = dir.path().join("q.xq");
        std::fs::write(&script, "1").unwrap();

        let mut settings = Settings::default();
        settings.xml_tools.xquery_execution_engine = Some("engine".to_string());
        let mut fx = Fixture::new(settings.clone());
        fx.extension = ExtensionContext::new(Some(dir.path().to_path_buf()), settings);
        let uri = Url::from_file_path(&script).unwrap();
        fx.workspace.open(uri.clone(), "xquery", "1".into(), 1);
        let host = RecordingHost::default();

        run(Command::ExecuteXQuery, vec![json!(uri.as_str())], fx.cx(&host)).await;

        assert_eq!(host.picks.lock()[0], vec!["a.xml", "b.xml"]);
        assert_eq!(host.errors(), vec!["No input file was selected."]);
    }

    #[cfg(unix)]
    #[tokio::test]
    async fn xquery_runs_engine_on_single_input() {
        let dir = tempfile::tempdir().unwrap();
        std::fs::write(dir.path().join("in.xml"), "<a/>").unwrap();
        let script = dir.path().join("q.xq");
        std::fs::write(&script, "1").unwrap();

        let mut settings = Settings::default();
        settings.xml_tools.xquery_execution_engine = Some("sh".to_string());
        settings.xml_tools.xquery_execution_arguments = vec![
            "-c".to_string(),
            "cp \"$0\" \"$1\"".to_string(),
            "$(input)".to_string(),
            "$(input.output)".to_string(),
        ];
        let mut fx = Fixture::new(settings.clone());
        fx.extension = ExtensionContext::new(Some(dir.path().to_path_buf()), settings);
        let uri = Url::from_file_path(&script).unwrap();
        fx.workspace.open(uri.clone(), "xquery", "1".into(), 1);
        let host = RecordingHost::default();

        let result = run(Command::ExecuteXQuery, vec![json!(uri.as_str())], fx.cx(&host)).await;

        assert!(host.errors().is_empty(), "{:?}", host.errors());
        assert!(result.is_some());
        let output = dir.path().join("in.output.xml");
        assert_eq!(std::fs::read_to_string(output).unwrap(), "<a/>");
        assert!(host.picks.lock().is_empty());
    }

    #[tokio::test]
    async fn tree_view_returns_content() {
        let fx = Fixture::new(Settings::default());
        fx.workspace
            .open(file("a.xml"), "xml", "<a><b/></a>".into(), 1);
        let host = RecordingHost::default();

        let result = run(Command::ViewXmlTree, vec![json!(file("a.xml").as_str())], fx.cx(&host))
            .await
            .unwrap();

        assert_eq!(result["content"], "a\n  b\n");
        assert!(result["uri"].as_str().unwrap().starts_with("xmltree:"));
    }

    #[tokio::test]
    async fn tree_view_reports_invalid_xml() {
        let fx = Fixture::new(Settings::default());
        fx.workspace.open(file("a.xml"), "xml", "<a>".into(), 1);
        let host = RecordingHost::default();

        run(Command::ViewXmlTree, vec![json!(file("a.xml").as_str())], fx.cx(&host)).await;

        let errors = host.errors();
        assert_eq!(errors.len(), 1);
        assert!(errors[0].starts_with("The XML Tree could not be created: the document is not valid XML"));
    }

    #[tokio::test]
    async fn unknown_command_is_reported() {
        let fx = Fixture::new(Settings::default());
        let host = RecordingHost::default();

        let result = run_by_name("xmlTools.nope", vec![], fx.cx(&host)).await;

        assert!(result.is_none());
        assert_eq!(host.errors(), vec!["Unknown command: xmlTools.nope"]);
    }
}
