mod defaults;
mod registry;
mod types;

pub use defaults::default_checks;
pub use registry::CheckRegistry;
pub use types::{Check, CheckResult, CheckStatus};
