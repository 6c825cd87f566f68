// Shell execution for model-requested commands and the generated test suite
// Failures never propagate: every outcome is folded into the returned text

use async_trait::async_trait;
use std::path::Path;
use tokio::process::Command;
use tracing::debug;

/// Run a shell command in `cwd`, returning combined stdout/stderr as text
///
/// Spawn failures and non-zero exits are rendered into the returned string
/// rather than raised.
pub async fn run_command(command: &str, cwd: &Path) -> String {
    debug!("Running command: {}", command);
    let output = Command::new("sh")
        .arg("-c")
        .arg(command)
        .current_dir(cwd)
        .output()
        .await;

    match output {
        Ok(output) => {
            let mut text = String::from_utf8_lossy(&output.stdout).to_string();
            let stderr = String::from_utf8_lossy(&output.stderr);
            if !stderr.is_empty() {
                if !text.is_empty() {
                    text.push('\n');
                }
                text.push_str(&stderr);
            }
            if text.is_empty() {
                "Command executed (no output)".to_string()
            } else {
                text
            }
        }
        Err(e) => format!("Error: {}", e),
    }
}

/// Runner for the generated project's test suite
#[async_trait]
pub trait TestRunner: Send + Sync {
    /// Execute the tests for `test_file` inside `dir`, returning raw output
    async fn run_tests(&self, test_file: &str, dir: &Path) -> String;
}

/// Runs a configured shell command with `{test_file}` substituted
#[derive(Debug, Clone)]
pub struct ShellTestRunner {
    command_template: String,
}

impl ShellTestRunner {
    pub fn new(command_template: impl Into<String>) -> Self {
        Self {
            command_template: command_template.into(),
        }
    }
}

#[async_trait]
impl TestRunner for ShellTestRunner {
    async fn run_tests(&self, test_file: &str, dir: &Path) -> String {
        let command = self.command_template.replace("{test_file}", test_file);
        run_command(&command, dir).await
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::tempdir;

    #[tokio::test]
    async fn test_captures_stdout() {
        let dir = tempdir().unwrap();
        let output = run_command("echo hello", dir.path()).await;
        assert_eq!(output.trim(), "hello");
    }

    #[tokio::test]
    async fn test_silent_command_reports_no_output() {
        let dir = tempdir().unwrap();
        let output = run_command("true", dir.path()).await;
        assert_eq!(output, "Command executed (no output)");
    }

    #[tokio::test]
    async fn test_failure_is_text_not_error() {
        let dir = tempdir().unwrap();
        let output = run_command("ls /definitely/not/here", dir.path()).await;
        assert!(!output.is_empty());
    }

    #[tokio::test]
    async fn test_runner_substitutes_test_file() {
        let dir = tempdir().unwrap();
        let runner = ShellTestRunner::new("echo running {test_file}");
        let output = runner.run_tests("tests.py", dir.path()).await;
        assert_eq!(output.trim(), "running tests.py");
    }
}
