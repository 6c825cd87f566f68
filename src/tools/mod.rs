// Typed tool directives carried in model replies
// The generator asks the model to emit fenced ```tool blocks holding one
// JSON object each; the tag field selects the variant, so content that
// merely mentions a tool name cannot be mistaken for a call.

pub mod files;
pub mod shell;

pub use files::{FileStore, LocalFileStore, NOT_FOUND_SENTINEL};
pub use shell::{run_command, ShellTestRunner, TestRunner};

use regex::Regex;
use serde::{Deserialize, Serialize};
use tracing::warn;

/// One tool invocation requested by the model
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "tool", rename_all = "snake_case")]
pub enum ToolDirective {
    /// Write a named artifact into the run's output directory
    SaveFile { filename: String, content: String },
    /// Execute a shell command in the run's output directory
    RunCommand { command: String },
}

/// Extract the tool directives embedded in a model reply
///
/// Malformed blocks are logged and skipped; the surrounding text is left
/// for the caller to use as-is.
pub fn extract_directives(content: &str) -> Vec<ToolDirective> {
    let block_re = Regex::new(r"(?s)```tool\s*\n(.*?)```").expect("static regex");

    let mut directives = Vec::new();
    for capture in block_re.captures_iter(content) {
        let raw = capture[1].trim();
        match serde_json::from_str::<ToolDirective>(raw) {
            Ok(directive) => directives.push(directive),
            Err(e) => warn!("Skipping malformed tool directive: {}", e),
        }
    }
    directives
}
