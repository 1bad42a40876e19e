mod abort;
mod cancel;
mod engine;
mod io_pump;
mod service;
mod traits;
pub mod types;

pub use cancel::CancelToken;
pub use engine::{run_check, ExecContext, ExecutionOutput, RunMode};
pub use io_pump::Echo;
pub use service::ServiceHandle;
pub use traits::{RunnerPlugin, RunnerSession};
pub use types::{RunnerStartArgs, Signal};
