// Simulation orchestrator
// Drives the generate → test → evaluate → update cycle and owns every piece
// of mutable run state: the state token, the meta-agent, and the history

pub mod report;

pub use report::{IterationRecord, RunOutcome, SimulationReport, RESULTS_FILENAME};

use crate::agents::{AlgorithmProposer, Evaluator, Generator};
use crate::core::{AlgorithmChoice, SimulationConfig};
use crate::error::CrucibleResult;
use crate::rl::{default_algorithms, state_for_score, Action, MetaAgent, INITIAL_STATE};
use crate::tools::{FileStore, TestRunner};
use rand::Rng;
use std::path::PathBuf;
use std::sync::Arc;
use std::time::Instant;
use tracing::{debug, error, info, warn};

/// Average score at or above which the run stops early
const SCORE_THRESHOLD: f64 = 90.0;
/// Chance of asking for a new-algorithm proposal on the first iteration
const PROPOSAL_PROBABILITY: f64 = 0.3;
/// Token budget for each generation request
const GENERATION_MAX_TOKENS: u32 = 3000;

/// Render the configured prompt template with one iteration's inputs
pub fn render_prompt(config: &SimulationConfig, action: Action, feedback: &str) -> String {
    config
        .prompt_template
        .replace("{project_type}", &config.project_type)
        .replace("{project_description}", &config.project_description)
        .replace("{action}", action.as_str())
        .replace("{library_file}", &config.library_file)
        .replace("{main_file}", &config.main_file)
        .replace("{test_file}", &config.test_file)
        .replace("{feedback}", feedback)
}

/// One full simulation run over injected collaborators
///
/// Execution is strictly sequential: one iteration at a time, one evaluator
/// call at a time. Tables and histories start cold on every run.
pub struct RlSimulation {
    config: SimulationConfig,
    generator: Box<dyn Generator>,
    evaluators: Vec<Box<dyn Evaluator>>,
    proposer: Box<dyn AlgorithmProposer>,
    test_runner: Box<dyn TestRunner>,
    file_store: Arc<dyn FileStore>,
    output_dir: PathBuf,
    meta_agent: MetaAgent,
    state: String,
}

impl RlSimulation {
    pub fn new(
        config: SimulationConfig,
        generator: Box<dyn Generator>,
        evaluators: Vec<Box<dyn Evaluator>>,
        proposer: Box<dyn AlgorithmProposer>,
        test_runner: Box<dyn TestRunner>,
        file_store: Arc<dyn FileStore>,
        output_dir: PathBuf,
    ) -> Self {
        Self {
            config,
            generator,
            evaluators,
            proposer,
            test_runner,
            file_store,
            output_dir,
            meta_agent: MetaAgent::new(default_algorithms()),
            state: INITIAL_STATE.to_string(),
        }
    }

    /// Current state token
    pub fn state(&self) -> &str {
        &self.state
    }

    /// Pick the algorithm for this iteration: the pinned name when one is
    /// configured (first roster entry if unrecognized), else the meta-agent
    fn select_algorithm_index(&self) -> usize {
        match &self.config.rl_algorithm {
            AlgorithmChoice::Named(name) => self.meta_agent.index_of(name).unwrap_or_else(|| {
                warn!("Unknown rl_algorithm {:?}, falling back to {}", name, self.meta_agent.algorithm(0).name());
                0
            }),
            AlgorithmChoice::Dynamic => self.meta_agent.select_algorithm(),
        }
    }

    /// Read back the three expected artifacts and join them for evaluation
    fn combined_code(&self) -> String {
        let library = self.file_store.read(&self.config.library_file, &self.output_dir);
        let main = self.file_store.read(&self.config.main_file, &self.output_dir);
        let tests = self.file_store.read(&self.config.test_file, &self.output_dir);
        format!(
            "# {}\n{}\n\n# {}\n{}\n\n# {}\n{}",
            self.config.library_file, library, self.config.main_file, main, self.config.test_file, tests
        )
    }

    async fn collect_scores(&self, code: &str, test_results: &str) -> Vec<f64> {
        let mut scores = Vec::with_capacity(self.evaluators.len());
        for (index, evaluator) in self.evaluators.iter().enumerate() {
            let evaluation = evaluator
                .evaluate(
                    code,
                    &self.config.project_type,
                    &self.config.project_description,
                    test_results,
                )
                .await;
            info!(
                "Evaluator {} ({}): score {}",
                index + 1,
                evaluator.model_id(),
                evaluation.score
            );
            scores.push(evaluation.score as f64);
        }
        scores
    }

    /// Re-query every evaluator for its latest wording and join the feedback
    /// lines for the next prompt; scores from this pass are discarded
    async fn collect_feedback(&self, code: &str, test_results: &str) -> String {
        let mut lines = Vec::with_capacity(self.evaluators.len());
        for (index, evaluator) in self.evaluators.iter().enumerate() {
            let evaluation = evaluator
                .evaluate(
                    code,
                    &self.config.project_type,
                    &self.config.project_description,
                    test_results,
                )
                .await;
            lines.push(format!(
                "Evaluator {}: {} {}",
                index + 1,
                evaluation.functionality_feedback,
                evaluation.quality_feedback
            ));
        }
        lines.join("\n")
    }

    /// Execute the run to completion and persist the history
    pub async fn run(&mut self) -> CrucibleResult<SimulationReport> {
        let mut report = SimulationReport::new(self.config.project_type.clone());
        let mut feedback = String::new();
        let mut outcome = RunOutcome::BudgetExhausted;

        for iteration in 0..self.config.max_iterations {
            let started = Instant::now();
            info!("--- Iteration {} ---", iteration + 1);

            let algo_index = self.select_algorithm_index();
            let algo_name = self.meta_agent.algorithm(algo_index).name().to_string();
            info!("Using RL algorithm: {}", algo_name);

            let action = self.meta_agent.algorithm_mut(algo_index).get_action(&self.state);
            debug!("State {:?}, action {}", self.state, action);

            let prompt = render_prompt(&self.config, action, &feedback);
            match self
                .generator
                .generate(&prompt, GENERATION_MAX_TOKENS, &self.output_dir)
                .await
            {
                Ok(transcript) => debug!("Generator transcript:\n{}", transcript),
                Err(e) => {
                    error!("Generation failed: {}", e);
                    report.iterations.push(IterationRecord::failed(
                        iteration + 1,
                        algo_name,
                        e,
                        started.elapsed().as_secs_f64(),
                    ));
                    outcome = RunOutcome::GeneratorFailure;
                    break;
                }
            }

            let code = self.combined_code();
            let test_results = self
                .test_runner
                .run_tests(&self.config.test_file, &self.output_dir)
                .await;
            debug!("Test results:\n{}", test_results);

            let scores = self.collect_scores(&code, &test_results).await;
            let avg_score = if scores.is_empty() {
                0.0
            } else {
                scores.iter().sum::<f64>() / scores.len() as f64
            };

            self.meta_agent.update_score(&algo_name, avg_score);

            let next_state = state_for_score(avg_score);
            let algorithm = self.meta_agent.algorithm_mut(algo_index);
            let next_action = algorithm.get_action(&next_state);
            algorithm.update(
                &self.state,
                action,
                avg_score / 100.0,
                &next_state,
                Some(next_action),
            );
            self.state = next_state;

            feedback = self.collect_feedback(&code, &test_results).await;

            report.iterations.push(IterationRecord {
                iteration: iteration + 1,
                code,
                score: avg_score,
                feedback: feedback.clone(),
                rl_algorithm: algo_name,
                elapsed_seconds: started.elapsed().as_secs_f64(),
                new_algorithm: None,
            });

            if iteration == 0 && rand::thread_rng().gen::<f64>() < PROPOSAL_PROBABILITY {
                let proposal = self.proposer.propose(&self.meta_agent.algorithm_names()).await;
                info!("Proposed new RL algorithm: {}", proposal.name);
                if let Some(last) = report.iterations.last_mut() {
                    last.new_algorithm = Some(proposal);
                }
            }

            info!(
                "Iteration {} finished in {:.2}s, average score {:.1}",
                iteration + 1,
                started.elapsed().as_secs_f64(),
                avg_score
            );

            if avg_score >= SCORE_THRESHOLD {
                info!("Score threshold reached, stopping early");
                outcome = RunOutcome::ScoreThreshold;
                break;
            }
        }

        report.outcome = outcome;
        if let Err(e) = report.save(&self.output_dir) {
            warn!("Failed to save results: {}", e);
        } else {
            info!(
                "Results saved to {}",
                self.output_dir.join(RESULTS_FILENAME).display()
            );
        }
        Ok(report)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::agents::{AlgorithmProposal, Evaluation};
    use crate::error::CrucibleError;
    use crate::tools::{LocalFileStore, NOT_FOUND_SENTINEL};
    use async_trait::async_trait;
    use std::path::Path;
    use std::sync::atomic::{AtomicUsize, Ordering};
    use tempfile::tempdir;

    struct StubGenerator {
        files: Vec<(String, String)>,
        store: Arc<dyn FileStore>,
        fail: bool,
    }

    #[async_trait]
    impl Generator for StubGenerator {
        async fn generate(
            &self,
            _prompt: &str,
            _max_tokens: u32,
            output_dir: &Path,
        ) -> CrucibleResult<String> {
            if self.fail {
                return Err(CrucibleError::generation_error("stubbed outage"));
            }
            for (filename, content) in &self.files {
                self.store.save(content, filename, output_dir);
            }
            Ok("generated".to_string())
        }
    }

    struct StubEvaluator {
        score: i64,
        calls: Arc<AtomicUsize>,
    }

    #[async_trait]
    impl Evaluator for StubEvaluator {
        fn model_id(&self) -> &str {
            "stub-model"
        }

        async fn evaluate(&self, _: &str, _: &str, _: &str, _: &str) -> Evaluation {
            self.calls.fetch_add(1, Ordering::SeqCst);
            Evaluation {
                score: self.score,
                functionality_feedback: "looks good".to_string(),
                quality_feedback: "clean".to_string(),
            }
        }
    }

    struct StubRunner(String);

    #[async_trait]
    impl TestRunner for StubRunner {
        async fn run_tests(&self, _: &str, _: &Path) -> String {
            self.0.clone()
        }
    }

    struct StubProposer;

    #[async_trait]
    impl AlgorithmProposer for StubProposer {
        async fn propose(&self, _: &[String]) -> AlgorithmProposal {
            AlgorithmProposal {
                name: "Hybrid".to_string(),
                description: "blend of the roster".to_string(),
                pseudo_code: String::new(),
            }
        }
    }

    fn test_config(rl_algorithm: AlgorithmChoice, max_iterations: usize) -> SimulationConfig {
        SimulationConfig {
            project_type: "CLI".to_string(),
            project_description: "a tiny tool".to_string(),
            prompt_template: "build {project_type}, action {action}, feedback: {feedback}"
                .to_string(),
            library_file: "lib.py".to_string(),
            main_file: "main.py".to_string(),
            test_file: "tests.py".to_string(),
            rl_algorithm,
            max_iterations,
            test_command: "pytest {test_file}".to_string(),
            models: Default::default(),
        }
    }

    fn build_simulation(
        rl_algorithm: AlgorithmChoice,
        max_iterations: usize,
        score: i64,
        evaluator_count: usize,
        generator_fails: bool,
        output_dir: PathBuf,
    ) -> (RlSimulation, Arc<AtomicUsize>) {
        let store: Arc<dyn FileStore> = Arc::new(LocalFileStore);
        let calls = Arc::new(AtomicUsize::new(0));

        let generator = Box::new(StubGenerator {
            files: vec![
                ("lib.py".to_string(), "def helper():\n    return 1\n".to_string()),
                ("main.py".to_string(), "print('ok')\n".to_string()),
                ("tests.py".to_string(), "def test_ok():\n    assert True\n".to_string()),
            ],
            store: Arc::clone(&store),
            fail: generator_fails,
        });
        let evaluators: Vec<Box<dyn Evaluator>> = (0..evaluator_count)
            .map(|_| {
                Box::new(StubEvaluator {
                    score,
                    calls: Arc::clone(&calls),
                }) as Box<dyn Evaluator>
            })
            .collect();

        let sim = RlSimulation::new(
            test_config(rl_algorithm, max_iterations),
            generator,
            evaluators,
            Box::new(StubProposer),
            Box::new(StubRunner("2 passed".to_string())),
            store,
            output_dir,
        );
        (sim, calls)
    }

    #[test]
    fn test_render_prompt_substitutes_placeholders() {
        let config = test_config(AlgorithmChoice::Dynamic, 1);
        let prompt = render_prompt(&config, Action::FixBugs, "tighten the loop");
        assert_eq!(prompt, "build CLI, action fix_bugs, feedback: tighten the loop");
    }

    #[tokio::test]
    async fn test_high_score_stops_after_first_iteration() {
        let dir = tempdir().unwrap();
        let (mut sim, _) = build_simulation(
            AlgorithmChoice::Dynamic,
            3,
            95,
            1,
            false,
            dir.path().to_path_buf(),
        );

        let report = sim.run().await.unwrap();
        assert_eq!(report.outcome, RunOutcome::ScoreThreshold);
        assert_eq!(report.iterations.len(), 1);
        assert_eq!(report.iterations[0].score, 95.0);
        // Meta-agent bootstrap hands the first iteration to the roster head
        assert_eq!(report.iterations[0].rl_algorithm, "Q-Learning");
        assert!(dir.path().join(RESULTS_FILENAME).exists());
    }

    #[tokio::test]
    async fn test_zero_evaluators_runs_out_the_budget() {
        let dir = tempdir().unwrap();
        let (mut sim, _) = build_simulation(
            AlgorithmChoice::Dynamic,
            2,
            0,
            0,
            false,
            dir.path().to_path_buf(),
        );

        let report = sim.run().await.unwrap();
        assert_eq!(report.outcome, RunOutcome::BudgetExhausted);
        assert_eq!(report.iterations.len(), 2);
        assert!(report.iterations.iter().all(|r| r.score == 0.0));
    }

    #[tokio::test]
    async fn test_generator_failure_ends_the_run_but_keeps_history() {
        let dir = tempdir().unwrap();
        let (mut sim, calls) = build_simulation(
            AlgorithmChoice::Dynamic,
            5,
            95,
            1,
            true,
            dir.path().to_path_buf(),
        );

        let report = sim.run().await.unwrap();
        assert_eq!(report.outcome, RunOutcome::GeneratorFailure);
        assert_eq!(report.iterations.len(), 1);
        assert_eq!(report.iterations[0].score, 0.0);
        assert!(report.iterations[0].feedback.contains("Generation failed"));
        assert_eq!(calls.load(Ordering::SeqCst), 0);
        assert!(dir.path().join(RESULTS_FILENAME).exists());
    }

    #[tokio::test]
    async fn test_pinned_algorithm_drives_every_iteration() {
        let dir = tempdir().unwrap();
        let (mut sim, _) = build_simulation(
            AlgorithmChoice::Named("SARSA".to_string()),
            2,
            50,
            1,
            false,
            dir.path().to_path_buf(),
        );

        let report = sim.run().await.unwrap();
        assert_eq!(report.iterations.len(), 2);
        assert!(report.iterations.iter().all(|r| r.rl_algorithm == "SARSA"));
    }

    #[tokio::test]
    async fn test_unknown_pinned_name_falls_back_to_roster_head() {
        let dir = tempdir().unwrap();
        let (mut sim, _) = build_simulation(
            AlgorithmChoice::Named("DQN".to_string()),
            1,
            50,
            1,
            false,
            dir.path().to_path_buf(),
        );

        let report = sim.run().await.unwrap();
        assert_eq!(report.iterations[0].rl_algorithm, "Q-Learning");
    }

    #[tokio::test]
    async fn test_feedback_pass_queries_evaluators_again() {
        let dir = tempdir().unwrap();
        let (mut sim, calls) = build_simulation(
            AlgorithmChoice::Dynamic,
            1,
            50,
            1,
            false,
            dir.path().to_path_buf(),
        );

        let report = sim.run().await.unwrap();
        // One pass for scores, one pass to rebuild the feedback text
        assert_eq!(calls.load(Ordering::SeqCst), 2);
        assert_eq!(
            report.iterations[0].feedback,
            "Evaluator 1: looks good clean"
        );
    }

    #[tokio::test]
    async fn test_state_advances_to_score_bucket() {
        let dir = tempdir().unwrap();
        let (mut sim, _) = build_simulation(
            AlgorithmChoice::Dynamic,
            1,
            42,
            1,
            false,
            dir.path().to_path_buf(),
        );

        assert_eq!(sim.state(), INITIAL_STATE);
        sim.run().await.unwrap();
        assert_eq!(sim.state(), "score_42");
    }

    #[tokio::test]
    async fn test_missing_artifacts_degrade_to_sentinels() {
        let dir = tempdir().unwrap();
        let store: Arc<dyn FileStore> = Arc::new(LocalFileStore);
        let calls = Arc::new(AtomicUsize::new(0));
        let mut sim = RlSimulation::new(
            test_config(AlgorithmChoice::Dynamic, 1),
            Box::new(StubGenerator {
                files: Vec::new(),
                store: Arc::clone(&store),
                fail: false,
            }),
            vec![Box::new(StubEvaluator {
                score: 10,
                calls: Arc::clone(&calls),
            })],
            Box::new(StubProposer),
            Box::new(StubRunner("no tests ran".to_string())),
            store,
            dir.path().to_path_buf(),
        );

        let report = sim.run().await.unwrap();
        assert_eq!(report.iterations.len(), 1);
        assert!(report.iterations[0].code.contains(NOT_FOUND_SENTINEL));
    }

    #[tokio::test]
    async fn test_combined_code_carries_all_three_artifacts() {
        let dir = tempdir().unwrap();
        let (mut sim, _) = build_simulation(
            AlgorithmChoice::Dynamic,
            1,
            30,
            1,
            false,
            dir.path().to_path_buf(),
        );

        let report = sim.run().await.unwrap();
        let code = &report.iterations[0].code;
        assert!(code.contains("# lib.py"));
        assert!(code.contains("# main.py"));
        assert!(code.contains("# tests.py"));
        assert!(code.contains("def helper()"));
    }
}
