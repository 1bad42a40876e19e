use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::check::CheckResult;

/// How the run was invoked.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct RunFlags {
    /// Categories asked for on the command line; empty means "all".
    pub requested_categories: Vec<String>,
    pub quick: bool,
    pub ci: bool,
    pub parallel: bool,
    pub dry_run: bool,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum CategoryStatus {
    Passed,
    /// Nothing blocking, but at least one warning.
    Warning,
    Failed,
    /// No check in the category ran.
    Skipped,
}

impl CategoryStatus {
    pub fn label(self) -> &'static str {
        match self {
            Self::Passed => "passed",
            Self::Warning => "warning",
            Self::Failed => "failed",
            Self::Skipped => "skipped",
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CategorySummary {
    pub name: String,
    pub status: CategoryStatus,
    pub total: usize,
    pub passed: usize,
    pub failed: usize,
    pub warnings: usize,
    pub skipped: usize,
    /// Passed over executed (total minus skipped), in percent.
    pub success_rate: f64,
    pub duration_ms: u64,
    /// Why the category did not run, when none of its checks executed.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub skip_reason: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FailureDetail {
    pub name: String,
    pub category: String,
    pub command: String,
    pub exit_code: Option<i32>,
    pub timed_out: bool,
    pub error_detail: Option<String>,
    /// Tail of stderr, or stdout when stderr was empty.
    pub output: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct WarningDetail {
    pub name: String,
    pub category: String,
    /// Remediation text for reclassified failures, otherwise the failure detail.
    pub detail: Option<String>,
    pub reclassified_by: Option<String>,
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Totals {
    pub total: usize,
    pub passed: usize,
    pub failed: usize,
    pub warnings: usize,
    pub skipped: usize,
}

impl Totals {
    pub fn executed(&self) -> usize {
        self.total - self.skipped
    }
}

/// Everything one invocation produced. Built once at the end of the run.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RunReport {
    pub run_id: String,
    pub started_at: DateTime<Utc>,
    pub finished_at: DateTime<Utc>,
    pub duration_ms: u64,
    pub mode: RunFlags,
    pub categories: Vec<CategorySummary>,
    pub checks: Vec<CheckResult>,
    pub failures: Vec<FailureDetail>,
    pub warnings: Vec<WarningDetail>,
    pub totals: Totals,
    pub success_rate: f64,
    pub overall_success: bool,
    /// Gate category whose failure stopped the run early.
    pub halted_after: Option<String>,
    pub interrupted: bool,
    pub exit_code: i32,
}

impl RunReport {
    pub fn category(&self, name: &str) -> Option<&CategorySummary> {
        self.categories.iter().find(|c| c.name == name)
    }

    pub fn check(&self, name: &str) -> Option<&CheckResult> {
        self.checks.iter().find(|c| c.name == name)
    }

    pub fn short_id(&self) -> &str {
        self.run_id.get(..8).unwrap_or(&self.run_id)
    }
}
