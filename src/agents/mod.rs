// Model-backed collaborators around the simulation core
// The simulation only sees these traits; the HTTP plumbing lives behind them

pub mod evaluator;
pub mod generator;
pub mod openrouter;
pub mod proposer;

pub use evaluator::EvaluatorAgent;
pub use generator::GeneratorAgent;
pub use openrouter::OpenRouterClient;
pub use proposer::ProposerAgent;

use crate::error::CrucibleResult;
use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use std::path::Path;

/// Produces project code from a prompt, executing any embedded tool
/// directives against the run's output directory
#[async_trait]
pub trait Generator: Send + Sync {
    /// Errors here abort the run; everything downstream degrades locally
    async fn generate(
        &self,
        prompt: &str,
        max_tokens: u32,
        output_dir: &Path,
    ) -> CrucibleResult<String>;
}

/// Scoring verdict from one evaluator
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Evaluation {
    #[serde(default)]
    pub score: i64,
    #[serde(default)]
    pub functionality_feedback: String,
    #[serde(default)]
    pub quality_feedback: String,
}

impl Evaluation {
    /// Zero-score sentinel used when an evaluator cannot produce a verdict
    pub fn failure(message: impl std::fmt::Display) -> Self {
        Self {
            score: 0,
            functionality_feedback: format!("Evaluation failed: {}", message),
            quality_feedback: String::new(),
        }
    }
}

/// Scores generated code against the project goals
#[async_trait]
pub trait Evaluator: Send + Sync {
    fn model_id(&self) -> &str;

    /// Never fails: transport or parse problems collapse into
    /// `Evaluation::failure`
    async fn evaluate(
        &self,
        code: &str,
        project_type: &str,
        project_description: &str,
        test_results: &str,
    ) -> Evaluation;
}

/// Free-text descriptor of a model-proposed algorithm variant
///
/// Recorded in the run history for later reading; never instantiated.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AlgorithmProposal {
    #[serde(default)]
    pub name: String,
    #[serde(default)]
    pub description: String,
    #[serde(default)]
    pub pseudo_code: String,
}

impl AlgorithmProposal {
    /// Error descriptor used when the proposal call cannot produce one
    pub fn failure(message: impl std::fmt::Display) -> Self {
        Self {
            name: "Error".to_string(),
            description: format!("Generation failed: {}", message),
            pseudo_code: String::new(),
        }
    }
}

/// Asks a model to sketch a new RL algorithm variant
#[async_trait]
pub trait AlgorithmProposer: Send + Sync {
    /// Never fails: problems collapse into `AlgorithmProposal::failure`
    async fn propose(&self, existing: &[String]) -> AlgorithmProposal;
}
