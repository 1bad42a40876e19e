use std::collections::HashMap;
use std::sync::Mutex;
use std::time::Duration;

use indicatif::{MultiProgress, ProgressBar, ProgressStyle};

use crate::check::{CheckResult, CheckStatus};

/// Live progress: one overall bar plus a spinner per running check.
///
/// Methods take `&self` so checks running concurrently can report
/// through a shared reference. A disabled monitor does nothing.
pub struct ProgressMonitor {
    multi: MultiProgress,
    overall: ProgressBar,
    bars: Mutex<HashMap<String, ProgressBar>>,
    enabled: bool,
}

impl ProgressMonitor {
    pub fn new(total_checks: usize, enabled: bool) -> Self {
        if !enabled {
            return Self::disabled();
        }

        let multi = MultiProgress::new();
        let overall = multi.add(ProgressBar::new(total_checks as u64));
        overall.set_style(
            ProgressStyle::default_bar()
                .template("[{elapsed_precise}] {bar:40.cyan/blue} {pos}/{len} checks {msg}")
                .unwrap_or_else(|_| ProgressStyle::default_bar())
                .progress_chars("█▓▒░  "),
        );
        overall.set_message("starting");

        Self {
            multi,
            overall,
            bars: Mutex::new(HashMap::new()),
            enabled: true,
        }
    }

    pub fn disabled() -> Self {
        Self {
            multi: MultiProgress::new(),
            overall: ProgressBar::hidden(),
            bars: Mutex::new(HashMap::new()),
            enabled: false,
        }
    }

    pub fn is_enabled(&self) -> bool {
        self.enabled
    }

    pub fn start_wave(&self, index: usize, total: usize, categories: &[&str]) {
        if self.enabled {
            self.overall.set_message(format!(
                "stage {}/{}: {}",
                index + 1,
                total,
                categories.join(" + ")
            ));
        }
    }

    pub fn start_check(&self, name: &str) {
        if !self.enabled {
            return;
        }
        let bar = self.multi.add(ProgressBar::new_spinner());
        bar.set_style(
            ProgressStyle::default_spinner()
                .template("  {spinner:.green} {msg} {elapsed:.dim}")
                .unwrap_or_else(|_| ProgressStyle::default_spinner())
                .tick_strings(&["⠋", "⠙", "⠹", "⠸", "⠼", "⠴", "⠦", "⠧", "⠇", "⠏"]),
        );
        bar.set_message(name.to_string());
        bar.enable_steady_tick(Duration::from_millis(100));
        self.lock_bars().insert(name.to_string(), bar);
    }

    pub fn finish_check(&self, result: &CheckResult) {
        if !self.enabled {
            return;
        }
        if let Some(bar) = self.lock_bars().remove(&result.name) {
            let icon = match result.status {
                CheckStatus::Passed => "✅",
                CheckStatus::Warning => "⚠️",
                CheckStatus::Skipped => "⏭",
                _ => "❌",
            };
            bar.finish_with_message(format!(
                "{} {} ({}ms)",
                icon, result.name, result.duration_ms
            ));
        }
        self.overall.inc(1);
    }

    /// Count checks that will never run.
    pub fn skip(&self, count: usize) {
        if self.enabled {
            self.overall.inc(count as u64);
        }
    }

    pub fn finish(&self, success: bool) {
        if !self.enabled {
            return;
        }
        let msg = if success { "✅ done" } else { "❌ failed" };
        self.overall.finish_with_message(msg);
    }

    fn lock_bars(&self) -> std::sync::MutexGuard<'_, HashMap<String, ProgressBar>> {
        self.bars.lock().unwrap_or_else(|e| e.into_inner())
    }
}

impl Drop for ProgressMonitor {
    fn drop(&mut self) {
        for (_, bar) in self.lock_bars().drain() {
            bar.finish_and_clear();
        }
    }
}
