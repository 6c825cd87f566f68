// Crucible - an RL-steered code generation loop
// Generates a small project with an LLM, scores it with LLM evaluators,
// and nudges its own prompting strategy with tabular RL methods.

pub mod agents;
pub mod core;
pub mod error;
pub mod rl;
pub mod sim;
pub mod tools;

pub use error::{CrucibleError, CrucibleResult};

use anyhow::Result;
use tracing::info;

pub fn version() -> &'static str {
    env!("CARGO_PKG_VERSION")
}

/// Initialize crucible with default settings
pub fn init() -> Result<()> {
    init_with_logger(true)
}

/// Initialize crucible with custom logger configuration
///
/// @param ansi_colors - Whether to enable ANSI color codes in logs
/// Disable when the output is captured or piped into another process
pub fn init_with_logger(ansi_colors: bool) -> Result<()> {
    use tracing_subscriber::fmt;
    use tracing_subscriber::EnvFilter;

    if !ansi_colors {
        fmt::Subscriber::builder()
            .with_ansi(false)
            .with_writer(std::io::stderr)
            .with_env_filter(EnvFilter::from_default_env())
            .with_target(false)
            .init();

        info!("Initializing crucible v{} (plain log format)", version());
    } else {
        fmt::Subscriber::builder()
            .with_ansi(true)
            .with_env_filter(EnvFilter::from_default_env())
            .with_target(true)
            .init();

        info!("Initializing crucible v{}", version());
    }

    Ok(())
}
