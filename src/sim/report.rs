// Persisted run history
// One record per iteration, appended in order and written out at the end of
// the run (or after an early termination)

use crate::agents::AlgorithmProposal;
use crate::error::{CrucibleError, CrucibleResult};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::Path;
use uuid::Uuid;

/// Filename for the serialized history under the run's output directory
pub const RESULTS_FILENAME: &str = "simulation_results.json";

/// How the run ended
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum RunOutcome {
    /// Average score reached the success threshold
    ScoreThreshold,
    /// The iteration budget ran out
    BudgetExhausted,
    /// The generator collaborator failed; remaining iterations were skipped
    GeneratorFailure,
}

/// One generate → test → evaluate → update cycle
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct IterationRecord {
    /// 1-based iteration index
    pub iteration: usize,
    /// Combined artifact text that was evaluated
    pub code: String,
    /// Average evaluator score, 0–100
    pub score: f64,
    /// Feedback text carried into the next prompt
    pub feedback: String,
    /// Name of the algorithm that drove this iteration
    pub rl_algorithm: String,
    pub elapsed_seconds: f64,
    /// Model-proposed algorithm descriptor, when the proposal coin flip hit
    #[serde(skip_serializing_if = "Option::is_none")]
    pub new_algorithm: Option<AlgorithmProposal>,
}

impl IterationRecord {
    /// Record for an iteration aborted by a generator failure
    pub fn failed(
        iteration: usize,
        rl_algorithm: String,
        error: impl std::fmt::Display,
        elapsed_seconds: f64,
    ) -> Self {
        Self {
            iteration,
            code: String::new(),
            score: 0.0,
            feedback: format!("Generation failed: {}", error),
            rl_algorithm,
            elapsed_seconds,
            new_algorithm: None,
        }
    }
}

/// Full serialized output of one simulation run
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SimulationReport {
    pub run_id: Uuid,
    pub started_at: DateTime<Utc>,
    pub project_type: String,
    pub outcome: RunOutcome,
    pub iterations: Vec<IterationRecord>,
}

impl SimulationReport {
    pub fn new(project_type: impl Into<String>) -> Self {
        Self {
            run_id: Uuid::new_v4(),
            started_at: Utc::now(),
            project_type: project_type.into(),
            outcome: RunOutcome::BudgetExhausted,
            iterations: Vec::new(),
        }
    }

    /// Final average score, if any iteration completed
    pub fn final_score(&self) -> Option<f64> {
        self.iterations.last().map(|record| record.score)
    }

    /// Write the report as pretty JSON under `output_dir`
    pub fn save(&self, output_dir: &Path) -> CrucibleResult<()> {
        fs::create_dir_all(output_dir)
            .map_err(|e| CrucibleError::io_error(e, Some(output_dir)))?;
        let path = output_dir.join(RESULTS_FILENAME);
        let raw = serde_json::to_string_pretty(self)?;
        fs::write(&path, raw).map_err(|e| CrucibleError::io_error(e, Some(path)))?;
        Ok(())
    }
}
