use anyhow::{bail, Context, Result};
use clap::Parser;
use std::path::PathBuf;
use std::sync::Arc;
use tracing::info;

use crucible::agents::{
    AlgorithmProposer, Evaluator, EvaluatorAgent, Generator, GeneratorAgent, OpenRouterClient,
    ProposerAgent,
};
use crucible::core::SimulationConfig;
use crucible::sim::RlSimulation;
use crucible::tools::{FileStore, LocalFileStore, ShellTestRunner};

/// Iteratively generate, test, and score a small software project, steering
/// the prompting strategy with tabular RL methods
#[derive(Parser, Debug)]
#[command(name = "crucible", version)]
struct Cli {
    /// Path to the simulation configuration file
    #[arg(short, long, default_value = "config.json")]
    config: PathBuf,

    /// Directory for generated artifacts and the run report
    #[arg(short, long, default_value = "workspace")]
    output_dir: PathBuf,

    /// Override the configured iteration budget
    #[arg(long)]
    max_iterations: Option<usize>,

    /// Write an example configuration to the --config path and exit
    #[arg(long)]
    init_config: bool,

    /// Disable ANSI colors in log output
    #[arg(long)]
    plain_logs: bool,
}

#[tokio::main]
async fn main() -> Result<()> {
    dotenv::dotenv().ok();
    let cli = Cli::parse();

    crucible::init_with_logger(!cli.plain_logs).context("Failed to initialize logging")?;

    if cli.init_config {
        SimulationConfig::example()
            .save(&cli.config)
            .with_context(|| format!("Failed to write {}", cli.config.display()))?;
        info!("Example configuration written to {}", cli.config.display());
        return Ok(());
    }

    let mut config = SimulationConfig::load(&cli.config)
        .with_context(|| format!("Failed to load {}", cli.config.display()))?;
    if let Some(max_iterations) = cli.max_iterations {
        config.max_iterations = max_iterations;
    }

    // The key is read once here and carried in the clients; nothing else
    // touches the environment
    let api_key = match std::env::var("OPENROUTER_API_KEY") {
        Ok(key) if !key.is_empty() => key,
        _ => bail!("OPENROUTER_API_KEY is not set"),
    };

    info!(
        "Starting crucible v{} for project type {:?}",
        crucible::version(),
        config.project_type
    );

    let file_store: Arc<dyn FileStore> = Arc::new(LocalFileStore);
    let base_url = config.models.base_url.clone();

    let generator: Box<dyn Generator> = Box::new(GeneratorAgent::new(
        OpenRouterClient::new(
            base_url.as_str(),
            api_key.as_str(),
            config.models.generator.as_str(),
        ),
        Arc::clone(&file_store),
    ));
    let evaluators: Vec<Box<dyn Evaluator>> = config
        .models
        .evaluators
        .iter()
        .map(|model| {
            Box::new(EvaluatorAgent::new(OpenRouterClient::new(
                base_url.as_str(),
                api_key.as_str(),
                model.as_str(),
            ))) as Box<dyn Evaluator>
        })
        .collect();
    let proposer: Box<dyn AlgorithmProposer> = Box::new(ProposerAgent::new(OpenRouterClient::new(
        base_url.as_str(),
        api_key.as_str(),
        config.models.proposer.as_str(),
    )));
    let test_runner = Box::new(ShellTestRunner::new(config.test_command.clone()));

    let mut simulation = RlSimulation::new(
        config,
        generator,
        evaluators,
        proposer,
        test_runner,
        file_store,
        cli.output_dir,
    );

    let report = simulation.run().await.context("Simulation run failed")?;
    info!(
        "Run {} finished: {:?}, {} iteration(s), final score {}",
        report.run_id,
        report.outcome,
        report.iterations.len(),
        report
            .final_score()
            .map_or_else(|| "n/a".to_string(), |score| format!("{:.1}", score))
    );

    Ok(())
}
