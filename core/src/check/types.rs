use std::collections::BTreeMap;
use std::fmt;
use std::path::PathBuf;

use serde::{Deserialize, Serialize};

use crate::error::TransitionError;

/// One validation unit, backed by an external command.
///
/// Checks are built once at startup from the registry and never mutated;
/// everything that changes while a run progresses lives in [`CheckResult`].
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Check {
    pub name: String,

    #[serde(default)]
    pub description: String,

    pub category: String,

    /// Program followed by its arguments. Opaque to the orchestrator.
    pub command: Vec<String>,

    #[serde(default = "default_timeout_secs")]
    pub timeout_secs: u64,

    #[serde(default = "default_critical")]
    pub critical: bool,

    /// Exempt from transient-failure reclassification (core build, core unit tests).
    #[serde(default)]
    pub always_critical: bool,

    /// Part of the quick preset when its category is.
    #[serde(default = "default_quick")]
    pub quick: bool,

    /// Extra environment for this check only.
    #[serde(default)]
    pub env: BTreeMap<String, String>,

    #[serde(default)]
    pub workdir: Option<PathBuf>,
}

fn default_timeout_secs() -> u64 {
    300
}

fn default_critical() -> bool {
    true
}

fn default_quick() -> bool {
    true
}

impl Check {
    pub fn new<I, S>(name: &str, category: &str, command: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self {
            name: name.to_string(),
            description: String::new(),
            category: category.to_string(),
            command: command.into_iter().map(Into::into).collect(),
            timeout_secs: default_timeout_secs(),
            critical: default_critical(),
            always_critical: false,
            quick: default_quick(),
            env: BTreeMap::new(),
            workdir: None,
        }
    }

    pub fn describe(mut self, description: &str) -> Self {
        self.description = description.to_string();
        self
    }

    pub fn timeout(mut self, secs: u64) -> Self {
        self.timeout_secs = secs;
        self
    }

    pub fn non_critical(mut self) -> Self {
        self.critical = false;
        self
    }

    pub fn always_critical(mut self) -> Self {
        self.critical = true;
        self.always_critical = true;
        self
    }

    pub fn full_only(mut self) -> Self {
        self.quick = false;
        self
    }

    pub fn env(mut self, key: &str, value: &str) -> Self {
        self.env.insert(key.to_string(), value.to_string());
        self
    }

    /// Command rendered for humans: arguments containing whitespace or
    /// quotes are single-quoted.
    pub fn command_line(&self) -> String {
        self.command
            .iter()
            .map(|arg| {
                if arg.is_empty() || arg.chars().any(|c| c.is_whitespace() || c == '\'' || c == '"')
                {
                    format!("'{}'", arg.replace('\'', r"'\''"))
                } else {
                    arg.clone()
                }
            })
            .collect::<Vec<_>>()
            .join(" ")
    }

    /// Criticality after the `--ci` promotion is applied.
    pub fn effective_critical(&self, promote: bool) -> bool {
        self.critical || self.always_critical || promote
    }
}

/// Lifecycle of one check within a run.
///
/// `Pending → Running → {Passed, Failed, Warning, Skipped}`; a pending check
/// may also go straight to `Skipped`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum CheckStatus {
    Pending,
    Running,
    Passed,
    Failed,
    Warning,
    Skipped,
}

impl CheckStatus {
    pub fn is_terminal(self) -> bool {
        matches!(
            self,
            CheckStatus::Passed | CheckStatus::Failed | CheckStatus::Warning | CheckStatus::Skipped
        )
    }

    pub fn advance(self, next: CheckStatus) -> Result<CheckStatus, TransitionError> {
        let ok = match (self, next) {
            (CheckStatus::Pending, CheckStatus::Running) => true,
            (CheckStatus::Pending, CheckStatus::Skipped) => true,
            (CheckStatus::Running, to) => to.is_terminal(),
            _ => false,
        };
        if ok {
            Ok(next)
        } else {
            Err(TransitionError {
                from: self,
                to: next,
            })
        }
    }

    pub fn label(self) -> &'static str {
        match self {
            CheckStatus::Pending => "pending",
            CheckStatus::Running => "running",
            CheckStatus::Passed => "passed",
            CheckStatus::Failed => "failed",
            CheckStatus::Warning => "warning",
            CheckStatus::Skipped => "skipped",
        }
    }
}

impl fmt::Display for CheckStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}

/// Outcome of one check. Owned by the orchestrator's accumulator; the engine
/// hands it over by value.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CheckResult {
    pub name: String,
    pub category: String,
    pub command: String,
    pub status: CheckStatus,
    /// Effective criticality for this run (CI promotion and reclassification applied).
    pub critical: bool,
    pub duration_ms: u64,
    #[serde(default)]
    pub exit_code: Option<i32>,
    #[serde(default)]
    pub timed_out: bool,
    #[serde(default)]
    pub stdout_tail: String,
    #[serde(default)]
    pub stderr_tail: String,
    #[serde(default)]
    pub error_detail: Option<String>,
    /// Name of the classifier rule that downgraded this result, if any.
    #[serde(default)]
    pub reclassified_by: Option<String>,
    /// Why a `Skipped` check never ran.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub skip_reason: Option<String>,
}

impl CheckResult {
    pub fn pending(check: &Check, critical: bool) -> Self {
        Self {
            name: check.name.clone(),
            category: check.category.clone(),
            command: check.command_line(),
            status: CheckStatus::Pending,
            critical,
            duration_ms: 0,
            exit_code: None,
            timed_out: false,
            stdout_tail: String::new(),
            stderr_tail: String::new(),
            error_detail: None,
            reclassified_by: None,
            skip_reason: None,
        }
    }

    pub fn skipped(check: &Check, critical: bool, reason: impl Into<String>) -> Self {
        let mut result = Self::pending(check, critical);
        result.status = CheckStatus::Skipped;
        result.skip_reason = Some(reason.into());
        result
    }

    pub fn advance(&mut self, next: CheckStatus) -> Result<(), TransitionError> {
        self.status = self.status.advance(next)?;
        Ok(())
    }

    /// Terminal status for a run that did not succeed: `Failed` when the
    /// check is critical, `Warning` otherwise.
    pub fn unsuccessful_status(&self) -> CheckStatus {
        if self.critical {
            CheckStatus::Failed
        } else {
            CheckStatus::Warning
        }
    }

    /// Mark an unsuccessful result as environmental: `Failed` becomes a
    /// non-blocking `Warning`, an existing `Warning` keeps its status. Either
    /// way the detail is replaced by the remediation text.
    ///
    /// This is the only change allowed after a terminal status, only once,
    /// and only before the result is recorded.
    pub fn downgrade(&mut self, rule: &str, remediation: &str) -> Result<(), TransitionError> {
        if !self.is_reclassifiable() {
            return Err(TransitionError {
                from: self.status,
                to: CheckStatus::Warning,
            });
        }
        self.status = CheckStatus::Warning;
        self.critical = false;
        self.error_detail = Some(remediation.to_string());
        self.reclassified_by = Some(rule.to_string());
        Ok(())
    }

    /// `Failed`, or a `Warning` no rule has claimed yet.
    pub fn is_reclassifiable(&self) -> bool {
        match self.status {
            CheckStatus::Failed => true,
            CheckStatus::Warning => self.reclassified_by.is_none(),
            _ => false,
        }
    }

    pub fn is_failed(&self) -> bool {
        self.status == CheckStatus::Failed
    }

    pub fn is_critical_failure(&self) -> bool {
        self.status == CheckStatus::Failed && self.critical
    }
}
