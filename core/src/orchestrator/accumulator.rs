use crate::check::{CheckResult, CheckStatus};
use crate::scheduler::CategoryPlan;

/// Results of one run, appended by the orchestrator loop only.
#[derive(Debug, Default)]
pub struct RunAccumulator {
    results: Vec<CheckResult>,
    critical_failures: Vec<String>,
    warnings: Vec<String>,
}

impl RunAccumulator {
    pub fn record(&mut self, result: CheckResult) {
        match result.status {
            CheckStatus::Failed if result.critical => self.critical_failures.push(result.name.clone()),
            CheckStatus::Warning => self.warnings.push(result.name.clone()),
            _ => {}
        }
        self.results.push(result);
    }

    /// Record every check of `category` as skipped.
    pub fn skip_category(&mut self, category: &CategoryPlan<'_>, promote_critical: bool, reason: &str) {
        for check in &category.checks {
            self.record(CheckResult::skipped(
                check,
                check.effective_critical(promote_critical),
                reason,
            ));
        }
    }

    pub fn results(&self) -> &[CheckResult] {
        &self.results
    }

    pub fn critical_failures(&self) -> &[String] {
        &self.critical_failures
    }

    pub fn warnings(&self) -> &[String] {
        &self.warnings
    }

    pub fn is_success(&self) -> bool {
        self.critical_failures.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::check::Check;
    use crate::scheduler::ExecutionMode;

    fn done(check: &Check, critical: bool, status: CheckStatus) -> CheckResult {
        let mut r = CheckResult::pending(check, critical);
        r.advance(CheckStatus::Running).unwrap();
        r.advance(status).unwrap();
        r
    }

    #[test]
    fn side_lists_follow_recorded_results() {
        let lint = Check::new("lint", "quality", ["ruff"]);
        let audit = Check::new("audit", "security", ["pip-audit"]).non_critical();
        let docs = Check::new("docs", "documentation", ["mkdocs"]).non_critical();

        let mut acc = RunAccumulator::default();
        acc.record(done(&lint, true, CheckStatus::Failed));
        acc.record(done(&audit, false, CheckStatus::Warning));
        acc.skip_category(
            &CategoryPlan {
                name: "documentation".into(),
                mode: ExecutionMode::Parallel,
                gate: false,
                checks: vec![&docs],
            },
            true,
            "halted",
        );

        assert_eq!(acc.critical_failures(), ["lint".to_string()]);
        assert_eq!(acc.warnings(), ["audit".to_string()]);
        assert!(!acc.is_success());
        let skipped = &acc.results()[2];
        assert_eq!(skipped.status, CheckStatus::Skipped);
        assert!(skipped.critical, "ci promotion applies to skipped records too");
    }
}
