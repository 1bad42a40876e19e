use std::sync::Arc;

use localci_core::runner::RunnerPlugin;

use crate::runner::{DryRunRunnerPlugin, ProcessRunnerPlugin};

/// Real processes, or the printing stand-in for `--dry-run`.
pub fn build_runner(dry_run: bool, print_commands: bool) -> Arc<dyn RunnerPlugin> {
    if dry_run {
        Arc::new(DryRunRunnerPlugin::new(print_commands))
    } else {
        Arc::new(ProcessRunnerPlugin::new())
    }
}
