//! XQuery execution through an external engine process.
//!
//! The engine is any executable configured in `xqueryExecutionEngine`; its
//! arguments are built from `xqueryExecutionArguments` by substituting the
//! script, input and output paths.

use std::path::{Path, PathBuf};
use std::process::Stdio;

use thiserror::Error;
use tokio::process::Command;
use tracing::{debug, info};
use walkdir::WalkDir;

pub const SCRIPT_PLACEHOLDER: &str = "$(script)";
pub const INPUT_PLACEHOLDER: &str = "$(input)";
pub const OUTPUT_PLACEHOLDER: &str = "$(input.output)";

/// Directories never searched for input files.
const SKIPPED_DIRS: &[&str] = &["node_modules", "target"];

#[derive(Debug, Error)]
pub enum ExecutionError {
    #[error("This action can only be performed on an XQuery file.")]
    NotXQuery,
    #[error("An XQuery execution engine has not been defined.")]
    EngineNotConfigured,
    #[error("The XQuery script must be saved to disk before it can be executed.")]
    UnsavedScript,
    #[error("No XML input files were found in the workspace.")]
    NoInputFiles,
    #[error("No input file was selected.")]
    NoInputSelected,
    #[error("searching for XML input files failed: {0}")]
    Discovery(String),
    #[error("failed to start XQuery engine '{engine}': {source}")]
    Spawn {
        engine: String,
        #[source]
        source: std::io::Error,
    },
    #[error("XQuery engine exited with {}: {stderr}", exit_description(.code))]
    Failed { code: Option<i32>, stderr: String },
}

fn exit_description(code: &Option<i32>) -> String {
    match code {
        Some(code) => format!("status {}", code),
        None => "no status".to_string(),
    }
}

/// A fully resolved engine invocation.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ExecutionRequest {
    pub engine: String,
    pub arguments: Vec<String>,
    pub script: PathBuf,
    pub input: PathBuf,
    pub output: PathBuf,
}

impl ExecutionRequest {
    /// Build a request, writing output next to the input file.
    pub fn new(engine: &str, arguments: &[String], script: PathBuf, input: PathBuf) -> Self {
        let output = output_path_for(&input);
        let arguments = substitute_arguments(arguments, &script, &input, &output);
        Self {
            engine: engine.to_string(),
            arguments,
            script,
            input,
            output,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ExecutionOutput {
    pub stdout: String,
    pub stderr: String,
}

/// Replace the path placeholders in each argument.
pub fn substitute_arguments(arguments: &[String], script: &Path, input: &Path, output: &Path) -> Vec<String> {
    let script = script.to_string_lossy();
    let input = input.to_string_lossy();
    let output = output.to_string_lossy();

    arguments
        .iter()
        // the output placeholder contains the input one, so it goes first
        .map(|arg| {
            arg.replace(OUTPUT_PLACEHOLDER, &output)
                .replace(SCRIPT_PLACEHOLDER, &script)
                .replace(INPUT_PLACEHOLDER, &input)
        })
        .collect()
}

/// `dir/data.xml` becomes `dir/data.output.xml`.
pub fn output_path_for(input: &Path) -> PathBuf {
    let stem = input
        .file_stem()
        .map(|s| s.to_string_lossy().into_owned())
        .unwrap_or_default();
    input.with_file_name(format!("{}.output.xml", stem))
}

/// All `.xml` files under `root`, sorted, skipping hidden and build
/// directories and previous engine output.
pub fn find_input_files(root: &Path) -> Vec<PathBuf> {
    let mut files: Vec<PathBuf> = WalkDir::new(root)
        .into_iter()
        .filter_entry(|entry| {
            if entry.depth() == 0 || !entry.file_type().is_dir() {
                return true;
            }
            let name = entry.file_name().to_string_lossy();
            !name.starts_with('.') && !SKIPPED_DIRS.iter().any(|skipped| *skipped == name)
        })
        .filter_map(Result::ok)
        .filter(|entry| entry.file_type().is_file())
        .map(|entry| entry.into_path())
        .filter(|path| {
            let name = path.file_name().map(|n| n.to_string_lossy()).unwrap_or_default();
            name.ends_with(".xml") && !name.ends_with(".output.xml")
        })
        .collect();
    files.sort();
    files
}

/// [`find_input_files`] on the blocking thread pool.
pub async fn discover_input_files(root: PathBuf) -> Result<Vec<PathBuf>, ExecutionError> {
    tokio::task::spawn_blocking(move || find_input_files(&root))
        .await
        .map_err(|e| ExecutionError::Discovery(e.to_string()))
}

/// Run the engine and wait for it without blocking the runtime.
pub async fn execute(request: &ExecutionRequest) -> Result<ExecutionOutput, ExecutionError> {
    info!(engine = %request.engine, script = %request.script.display(), input = %request.input.display(), "executing xquery");
    debug!(arguments = ?request.arguments, "xquery engine arguments");

    let output = Command::new(&request.engine)
        .args(&request.arguments)
        .stdin(Stdio::null())
        .stdout(Stdio::piped())
        .stderr(Stdio::piped())
        .kill_on_drop(true)
        .output()
        .await
        .map_err(|source| ExecutionError::Spawn {
            engine: request.engine.clone(),
            source,
        })?;

    let stdout = String::from_utf8_lossy(&output.stdout).into_owned();
    let stderr = String::from_utf8_lossy(&output.stderr).into_owned();

    if output.status.success() {
        Ok(ExecutionOutput { stdout, stderr })
    } else {
        Err(ExecutionError::Failed {
            code: output.status.code(),
            stderr: stderr.trim().to_string(),
        })
    }
}
