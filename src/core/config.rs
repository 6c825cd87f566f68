use crate::error::{CrucibleError, CrucibleResult};
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::Path;
use tracing::debug;

const DEFAULT_BASE_URL: &str = "https://openrouter.ai/api/v1";

/// Which update rule governs the run
///
/// Serialized as a plain string; the literal `"dynamic"` means "let the
/// meta-agent pick per iteration", anything else pins an algorithm by name.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(from = "String", into = "String")]
pub enum AlgorithmChoice {
    Dynamic,
    Named(String),
}

impl From<String> for AlgorithmChoice {
    fn from(value: String) -> Self {
        if value.eq_ignore_ascii_case("dynamic") {
            AlgorithmChoice::Dynamic
        } else {
            AlgorithmChoice::Named(value)
        }
    }
}

impl From<AlgorithmChoice> for String {
    fn from(choice: AlgorithmChoice) -> Self {
        match choice {
            AlgorithmChoice::Dynamic => "dynamic".to_string(),
            AlgorithmChoice::Named(name) => name,
        }
    }
}

/// Model routing for the three collaborator roles
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ModelsConfig {
    /// Chat-completions endpoint base URL
    #[serde(default = "default_base_url")]
    pub base_url: String,
    /// Model id used to generate the project
    pub generator: String,
    /// Model ids used to score the generated code
    pub evaluators: Vec<String>,
    /// Model id asked to propose new algorithm variants
    pub proposer: String,
}

fn default_base_url() -> String {
    DEFAULT_BASE_URL.to_string()
}

impl Default for ModelsConfig {
    fn default() -> Self {
        Self {
            base_url: default_base_url(),
            generator: "google/gemini-2.0-flash-001".to_string(),
            evaluators: vec![
                "google/gemini-pro-1.5".to_string(),
                "anthropic/claude-3.5-sonnet".to_string(),
            ],
            proposer: "google/gemini-pro-1.5".to_string(),
        }
    }
}

/// Full configuration for one simulation run, loaded from a JSON file
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SimulationConfig {
    pub project_type: String,
    pub project_description: String,
    /// Prompt template with `{named}` placeholders: project_type,
    /// project_description, feedback, action, library_file, main_file,
    /// test_file
    pub prompt_template: String,
    pub library_file: String,
    pub main_file: String,
    pub test_file: String,
    pub rl_algorithm: AlgorithmChoice,
    #[serde(default = "default_max_iterations")]
    pub max_iterations: usize,
    /// Shell command used to exercise the generated tests; `{test_file}`
    /// is substituted before execution
    #[serde(default = "default_test_command")]
    pub test_command: String,
    #[serde(default)]
    pub models: ModelsConfig,
}

fn default_max_iterations() -> usize {
    3
}

fn default_test_command() -> String {
    "pytest {test_file} --tb=short".to_string()
}

impl SimulationConfig {
    /// Load configuration from a JSON file; any failure here is fatal
    pub fn load(path: impl AsRef<Path>) -> CrucibleResult<Self> {
        let path = path.as_ref();
        let raw = fs::read_to_string(path).map_err(|e| {
            CrucibleError::config_error(format!("cannot read {}: {}", path.display(), e))
        })?;
        let config: SimulationConfig = serde_json::from_str(&raw).map_err(|e| {
            CrucibleError::config_error(format!("cannot parse {}: {}", path.display(), e))
        })?;
        debug!("Loaded configuration from {}", path.display());
        Ok(config)
    }

    /// Write this configuration as pretty JSON
    pub fn save(&self, path: impl AsRef<Path>) -> CrucibleResult<()> {
        let raw = serde_json::to_string_pretty(self)?;
        fs::write(path.as_ref(), raw)
            .map_err(|e| CrucibleError::io_error(e, Some(path.as_ref())))?;
        Ok(())
    }

    /// A runnable example configuration for a small directory-site project
    pub fn example() -> Self {
        Self {
            project_type: "Directory Site Generator".to_string(),
            project_description: "An AI-powered directory site that aggregates data from \
                multiple sources and displays it in a web interface"
                .to_string(),
            prompt_template: default_prompt_template(),
            library_file: "data_utils.py".to_string(),
            main_file: "app.py".to_string(),
            test_file: "tests.py".to_string(),
            rl_algorithm: AlgorithmChoice::Dynamic,
            max_iterations: default_max_iterations(),
            test_command: default_test_command(),
            models: ModelsConfig::default(),
        }
    }
}

fn default_prompt_template() -> String {
    [
        "You are a coding agent building a {project_type} application ({project_description}).",
        "1. Create a reusable library with utility functions.",
        "2. Write a main script that uses this library to implement a basic feature.",
        "3. Generate tests that validate the library and the main script.",
        "4. Keep the code modular and concise, following DRY principles.",
        "5. Focus on this action: {action}.",
        "6. Save the library to '{library_file}', the main script to '{main_file}', and \
         tests to '{test_file}'.",
        "Previous feedback (apply if provided):\n{feedback}",
        "",
        "Emit each file as a fenced tool directive:",
        "```tool",
        "{\"tool\": \"save_file\", \"filename\": \"{library_file}\", \"content\": \"...\"}",
        "```",
    ]
    .join("\n")
}
