mod plan;
mod stage;

pub use plan::{CategoryPlan, CategoryScheduler, ExecutionMode, Wave};
pub use stage::{run_parallel, run_sequential};
