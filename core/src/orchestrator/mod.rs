mod accumulator;
mod options;
mod run;
mod services;

pub use accumulator::RunAccumulator;
pub use options::{RunOptions, RunSettings};
pub use run::Orchestrator;
pub use services::BackgroundServices;
