use chrono::{DateTime, Utc};
use uuid::Uuid;

use crate::check::{CheckResult, CheckStatus};
use crate::util::tail_chars;

use super::model::{
    CategoryStatus, CategorySummary, FailureDetail, RunFlags, RunReport, Totals, WarningDetail,
};

pub struct ReportInput<'a> {
    pub run_id: Uuid,
    pub started_at: DateTime<Utc>,
    pub finished_at: DateTime<Utc>,
    pub flags: RunFlags,
    /// Results in execution order, skipped checks included.
    pub results: &'a [CheckResult],
    pub halted_after: Option<String>,
    pub interrupted: bool,
    /// Chars of each output stream kept in the report.
    pub output_chars: usize,
}

pub fn build_report(input: ReportInput<'_>) -> RunReport {
    let checks: Vec<CheckResult> = input
        .results
        .iter()
        .map(|r| {
            let mut r = r.clone();
            r.stdout_tail = tail_chars(&r.stdout_tail, input.output_chars);
            r.stderr_tail = tail_chars(&r.stderr_tail, input.output_chars);
            r
        })
        .collect();

    let categories = summarize_categories(&checks);
    let totals = count(checks.iter());

    let failures = checks
        .iter()
        .filter(|r| r.status == CheckStatus::Failed)
        .map(|r| FailureDetail {
            name: r.name.clone(),
            category: r.category.clone(),
            command: r.command.clone(),
            exit_code: r.exit_code,
            timed_out: r.timed_out,
            error_detail: r.error_detail.clone(),
            output: if r.stderr_tail.trim().is_empty() {
                r.stdout_tail.clone()
            } else {
                r.stderr_tail.clone()
            },
        })
        .collect();

    let warnings = checks
        .iter()
        .filter(|r| r.status == CheckStatus::Warning)
        .map(|r| WarningDetail {
            name: r.name.clone(),
            category: r.category.clone(),
            detail: r.error_detail.clone(),
            reclassified_by: r.reclassified_by.clone(),
        })
        .collect();

    let overall_success = totals.failed == 0;
    let exit_code = if overall_success && !input.interrupted {
        0
    } else {
        1
    };

    RunReport {
        run_id: input.run_id.to_string(),
        started_at: input.started_at,
        finished_at: input.finished_at,
        duration_ms: (input.finished_at - input.started_at)
            .num_milliseconds()
            .max(0) as u64,
        mode: input.flags,
        success_rate: rate(totals.passed, totals.executed()),
        categories,
        checks,
        failures,
        warnings,
        totals,
        overall_success,
        halted_after: input.halted_after,
        interrupted: input.interrupted,
        exit_code,
    }
}

fn summarize_categories(checks: &[CheckResult]) -> Vec<CategorySummary> {
    let mut names: Vec<&str> = Vec::new();
    for r in checks {
        if !names.contains(&r.category.as_str()) {
            names.push(&r.category);
        }
    }

    names
        .into_iter()
        .map(|name| {
            let members = checks.iter().filter(|r| r.category == name);
            let t = count(members.clone());
            let status = if t.failed > 0 {
                CategoryStatus::Failed
            } else if t.executed() == 0 {
                CategoryStatus::Skipped
            } else if t.warnings > 0 {
                CategoryStatus::Warning
            } else {
                CategoryStatus::Passed
            };
            CategorySummary {
                name: name.to_string(),
                status,
                total: t.total,
                passed: t.passed,
                failed: t.failed,
                warnings: t.warnings,
                skipped: t.skipped,
                success_rate: rate(t.passed, t.executed()),
                duration_ms: members.map(|r| r.duration_ms).sum(),
                skip_reason: if status == CategoryStatus::Skipped {
                    checks
                        .iter()
                        .filter(|r| r.category == name)
                        .find_map(|r| r.skip_reason.clone())
                } else {
                    None
                },
            }
        })
        .collect()
}

fn count<'a>(results: impl Iterator<Item = &'a CheckResult>) -> Totals {
    let mut t = Totals::default();
    for r in results {
        t.total += 1;
        match r.status {
            CheckStatus::Passed => t.passed += 1,
            CheckStatus::Failed => t.failed += 1,
            CheckStatus::Warning => t.warnings += 1,
            CheckStatus::Skipped => t.skipped += 1,
            // not recorded by the orchestrator; count as not executed
            CheckStatus::Pending | CheckStatus::Running => t.skipped += 1,
        }
    }
    t
}

/// Percentage rounded to one decimal; 0 when nothing ran.
fn rate(passed: usize, executed: usize) -> f64 {
    if executed == 0 {
        return 0.0;
    }
    (passed as f64 * 1000.0 / executed as f64).round() / 10.0
}
