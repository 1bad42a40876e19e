use crate::util::truncate_chars;

use super::model::{CategoryStatus, RunReport};

const DETAIL_CHARS: usize = 240;
const OUTPUT_LINES: usize = 8;

/// Short console summary of a finished run.
pub fn render_text(report: &RunReport) -> String {
    let mut out = String::new();

    out.push_str(&format!(
        "localci run {} ({:.1}s){}\n\n",
        report.short_id(),
        report.duration_ms as f64 / 1000.0,
        if report.mode.dry_run { " [dry run]" } else { "" }
    ));

    let width = report
        .categories
        .iter()
        .map(|c| c.name.len())
        .max()
        .unwrap_or(0)
        .max(8);
    for c in &report.categories {
        let line = match c.status {
            CategoryStatus::Skipped => match &c.skip_reason {
                Some(reason) => format!("skipped ({reason})"),
                None => "skipped".to_string(),
            },
            _ => {
                let mut s = format!("{}/{} passed", c.passed, c.total - c.skipped);
                if c.failed > 0 {
                    s.push_str(&format!(", {} failed", c.failed));
                }
                if c.warnings > 0 {
                    s.push_str(&format!(", {} warning(s)", c.warnings));
                }
                if c.skipped > 0 {
                    s.push_str(&format!(", {} skipped", c.skipped));
                }
                s
            }
        };
        out.push_str(&format!(
            "  {:<width$}  {:<8} {}\n",
            c.name,
            c.status.label().to_uppercase(),
            line
        ));
    }

    let t = &report.totals;
    out.push_str(&format!(
        "\nOverall: {}/{} checks passed ({:.1}%), {} failed, {} warning(s), {} skipped\n",
        t.passed,
        t.executed(),
        report.success_rate,
        t.failed,
        t.warnings,
        t.skipped
    ));

    if !report.warnings.is_empty() {
        out.push_str("\nWarnings (advisory, not blocking):\n");
        for w in &report.warnings {
            let detail = w.detail.as_deref().unwrap_or("non-critical check failed");
            out.push_str(&format!(
                "  - {} [{}]: {}\n",
                w.name,
                w.category,
                truncate_chars(detail, DETAIL_CHARS)
            ));
            if let Some(rule) = &w.reclassified_by {
                out.push_str(&format!("    (environmental failure, rule `{rule}`)\n"));
            }
        }
    }

    if let Some(cat) = &report.halted_after {
        out.push_str(&format!(
            "\nStopped after gate category `{cat}`; later categories were skipped.\n"
        ));
    }
    if report.interrupted {
        out.push_str("\nRun was interrupted; remaining checks were skipped.\n");
    }

    if report.failures.is_empty() {
        out.push_str("\nAll critical checks passed.\n");
        return out;
    }

    let names: Vec<&str> = report.failures.iter().map(|f| f.name.as_str()).collect();
    out.push_str(&format!(
        "\nBLOCKED — do not proceed. Failing checks: {}\n",
        names.join(", ")
    ));
    for f in &report.failures {
        out.push_str(&format!(
            "  - {} [{}]: {}\n",
            f.name,
            f.category,
            f.error_detail.as_deref().unwrap_or("failed")
        ));
        out.push_str(&format!("    $ {}\n", f.command));
        let lines: Vec<&str> = f.output.lines().filter(|l| !l.trim().is_empty()).collect();
        let skip = lines.len().saturating_sub(OUTPUT_LINES);
        for line in &lines[skip..] {
            out.push_str(&format!("    | {}\n", truncate_chars(line, DETAIL_CHARS)));
        }
    }

    out
}
