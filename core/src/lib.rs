//! Core of `localci`: replays a CI pipeline on a developer machine.
//!
//! A run flows through these pieces:
//!
//! ```text
//! CheckRegistry (static, from config)
//!   ↓  view: categories / quick preset
//! CategoryScheduler::plan() → Vec<Wave>
//!   ↓  per wave: sequential / parallel / service
//! runner::run_check() → CheckResult
//!   ↓
//! Classifier::classify() (transient failures → Warning)
//!   ↓
//! RunAccumulator → report::build_report() → RunReport
//! ```
//!
//! Process spawning lives behind [`runner::RunnerPlugin`]; concrete runners
//! are provided by the plugins crate.

pub mod check;
pub mod classifier;
pub mod config;
pub mod error;
pub mod orchestrator;
pub mod progress;
pub mod report;
pub mod runner;
pub mod scheduler;
pub mod util;

pub use check::{Check, CheckRegistry, CheckResult, CheckStatus};
pub use classifier::Classifier;
pub use orchestrator::{Orchestrator, RunOptions};
pub use report::RunReport;
pub use scheduler::CategoryScheduler;
