use std::time::Duration;

use crate::config::AppConfig;
use crate::report::RunFlags;

/// What the caller asked for on this invocation.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct RunOptions {
    /// Empty means every category (or the quick preset with `quick`).
    pub categories: Vec<String>,
    pub quick: bool,
    /// Promote every check to critical.
    pub ci: bool,
    /// Merge adjacent independent categories into one concurrent stage.
    pub parallel: bool,
    /// Commands are printed, not run; service categories run as plain batches.
    pub dry_run: bool,
}

impl RunOptions {
    pub fn flags(&self) -> RunFlags {
        RunFlags {
            requested_categories: self.categories.clone(),
            quick: self.quick,
            ci: self.ci,
            parallel: self.parallel,
            dry_run: self.dry_run,
        }
    }
}

/// Tunables resolved from config once per run.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RunSettings {
    pub max_parallel: usize,
    pub capture_bytes: usize,
    pub kill_grace: Duration,
    pub service_shutdown: Duration,
    pub echo_output: bool,
    /// Keep stdout for the report: echoed child stdout goes to stderr.
    pub echo_to_stderr: bool,
    pub output_chars: usize,
    pub show_progress: bool,
}

impl RunSettings {
    pub fn from_config(cfg: &AppConfig) -> Self {
        Self {
            max_parallel: cfg.runner.effective_max_parallel(),
            capture_bytes: cfg.runner.capture_bytes.max(1),
            kill_grace: Duration::from_millis(cfg.runner.kill_grace_ms),
            service_shutdown: Duration::from_millis(cfg.scheduler.service_shutdown_ms),
            echo_output: cfg.runner.echo_output,
            echo_to_stderr: false,
            output_chars: cfg.reports.output_chars,
            show_progress: false,
        }
    }
}

impl Default for RunSettings {
    fn default() -> Self {
        Self::from_config(&AppConfig::default())
    }
}
