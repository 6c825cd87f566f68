// Code-generating collaborator
// Sends the rendered prompt to the model, then executes the typed tool
// directives embedded in the reply against the run's output directory

use crate::agents::{Generator, OpenRouterClient};
use crate::error::CrucibleResult;
use crate::tools::{extract_directives, run_command, FileStore, ToolDirective};
use async_trait::async_trait;
use std::path::Path;
use std::sync::Arc;
use std::time::Duration;
use tracing::info;

const GENERATION_TIMEOUT: Duration = Duration::from_secs(60);
const GENERATION_TEMPERATURE: f64 = 0.7;

/// Generator backed by a chat model and the injected file store
pub struct GeneratorAgent {
    client: OpenRouterClient,
    file_store: Arc<dyn FileStore>,
}

impl GeneratorAgent {
    pub fn new(client: OpenRouterClient, file_store: Arc<dyn FileStore>) -> Self {
        Self { client, file_store }
    }

    async fn execute_directive(&self, directive: &ToolDirective, output_dir: &Path) -> String {
        match directive {
            ToolDirective::SaveFile { filename, content } => {
                let status = self.file_store.save(content, filename, output_dir);
                format!("**Tool:** save_file {}\n**Result:** {}", filename, status)
            }
            ToolDirective::RunCommand { command } => {
                let result = run_command(command, output_dir).await;
                format!(
                    "**Tool:** run_command `{}`\n**Result:**\n```\n{}\n```",
                    command, result
                )
            }
        }
    }
}

#[async_trait]
impl Generator for GeneratorAgent {
    async fn generate(
        &self,
        prompt: &str,
        max_tokens: u32,
        output_dir: &Path,
    ) -> CrucibleResult<String> {
        let content = self
            .client
            .chat(prompt, GENERATION_TEMPERATURE, max_tokens, GENERATION_TIMEOUT)
            .await?;

        let directives = extract_directives(&content);
        info!(
            "Model {} replied with {} tool directive(s)",
            self.client.model(),
            directives.len()
        );

        let mut transcript = content;
        for directive in &directives {
            let outcome = self.execute_directive(directive, output_dir).await;
            transcript.push_str("\n\n");
            transcript.push_str(&outcome);
        }
        Ok(transcript)
    }
}
