#[allow(clippy::module_inception)]
pub mod error;
pub mod check;
pub mod report;

pub use check::{ClassifierError, RegistryError, TransitionError};
pub use error::{CliError, ConfigError, RunnerError};
pub use report::ReportError;
