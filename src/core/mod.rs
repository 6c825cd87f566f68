pub mod config;

pub use config::{AlgorithmChoice, ModelsConfig, SimulationConfig};
