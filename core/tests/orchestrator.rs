mod common;

use std::sync::Arc;
use std::time::{Duration, Instant};

use pretty_assertions::assert_eq;

use common::{orchestrator, scheduler_config, Script, ScriptedRunner};
use localci_core::check::{Check, CheckStatus};
use localci_core::config::QuickPreset;
use localci_core::report::{CategoryStatus, RunReport};
use localci_core::runner::Signal;
use localci_core::RunOptions;

fn pipeline_order() -> [&'static str; 5] {
    ["setup", "quality", "security", "tests", "docs"]
}

fn counts(report: &RunReport) -> Vec<(String, usize, usize, CategoryStatus)> {
    report
        .categories
        .iter()
        .map(|c| (c.name.clone(), c.passed, c.total, c.status))
        .collect()
}

#[tokio::test]
async fn gate_failure_skips_later_categories() {
    let runner = Arc::new(
        ScriptedRunner::new()
            .script("setup", Script::pass())
            .script("lint", Script::fail(1).stderr("app.py:3:1: E302 expected 2 blank lines"))
            .script("docs", Script::pass()),
    );
    let checks = vec![
        Check::new("setup-env", "setup", ["setup"]),
        Check::new("lint", "quality", ["lint"]),
        Check::new("docs-build", "docs", ["docs"]).non_critical(),
    ];
    let orch = orchestrator(
        checks,
        scheduler_config(&["setup", "quality", "docs"], &["docs"], &["quality"]),
        QuickPreset::default(),
        runner.clone(),
    );

    let report = orch.run_all(&RunOptions::default()).await.unwrap();

    assert_eq!(
        counts(&report),
        vec![
            ("setup".to_string(), 1, 1, CategoryStatus::Passed),
            ("quality".to_string(), 0, 1, CategoryStatus::Failed),
            ("docs".to_string(), 0, 1, CategoryStatus::Skipped),
        ]
    );
    assert!(!report.overall_success);
    assert_eq!(report.exit_code, 1);
    assert_eq!(report.halted_after.as_deref(), Some("quality"));
    assert!(!runner.started("docs"));
    let docs = report.check("docs-build").unwrap();
    assert!(docs.error_detail.is_none());
    assert_eq!(docs.skip_reason.as_deref(), Some("gate category `quality` failed"));
    assert_eq!(
        report.category("docs").unwrap().skip_reason.as_deref(),
        Some("gate category `quality` failed")
    );

    let failure = &report.failures[0];
    assert_eq!(failure.name, "lint");
    assert_eq!(failure.error_detail.as_deref(), Some("exited with code 1"));
    assert!(failure.output.contains("E302"));
}

#[tokio::test]
async fn timed_out_check_with_transient_signature_is_a_warning() {
    let runner = Arc::new(
        ScriptedRunner::new()
            .script("trivy", Script::hang().stderr("FATAL failed to download vulnerability DB")),
    );
    let checks = vec![Check::new("image-scan", "build", ["trivy", "image", "app"]).timeout(1)];
    let orch = orchestrator(
        checks,
        scheduler_config(&["build"], &[], &["build"]),
        QuickPreset::default(),
        runner.clone(),
    );

    let started = Instant::now();
    let report = orch.run_all(&RunOptions::default()).await.unwrap();
    assert!(started.elapsed() < Duration::from_secs(3), "bounded by timeout");

    let scan = report.check("image-scan").unwrap();
    assert_eq!(scan.status, CheckStatus::Warning);
    assert!(scan.timed_out);
    assert!(!scan.critical);
    assert_eq!(scan.reclassified_by.as_deref(), Some("scanner-database"));
    assert!(report.overall_success);
    assert_eq!(report.exit_code, 0);
    assert_eq!(runner.signals("trivy"), vec![Signal::Kill]);
}

#[tokio::test]
async fn timeout_without_signature_fails() {
    let runner = Arc::new(ScriptedRunner::new().script("pytest", Script::hang()));
    let checks = vec![Check::new("unit-tests", "tests", ["pytest"]).timeout(1)];
    let orch = orchestrator(
        checks,
        scheduler_config(&pipeline_order(), &[], &["tests"]),
        QuickPreset::default(),
        runner,
    );

    let report = orch.run_all(&RunOptions::default()).await.unwrap();
    let r = report.check("unit-tests").unwrap();
    assert_eq!(r.status, CheckStatus::Failed);
    assert_eq!(r.error_detail.as_deref(), Some("timed out after 1s"));
    assert!(r.duration_ms < 2_500);
}

#[tokio::test]
async fn advisory_timeout_with_signature_gets_remediation() {
    let runner = Arc::new(
        ScriptedRunner::new()
            .script("trivy", Script::hang().stderr("FATAL failed to download vulnerability DB")),
    );
    let checks = vec![Check::new("image-scan", "build", ["trivy"])
        .timeout(1)
        .non_critical()];
    let orch = orchestrator(
        checks,
        scheduler_config(&["build"], &[], &[]),
        QuickPreset::default(),
        runner,
    );

    let report = orch.run_all(&RunOptions::default()).await.unwrap();
    let scan = report.check("image-scan").unwrap();
    assert_eq!(scan.status, CheckStatus::Warning);
    assert!(scan.timed_out);
    assert_eq!(scan.reclassified_by.as_deref(), Some("scanner-database"));
    assert_ne!(scan.error_detail.as_deref(), Some("timed out after 1s"));

    let warning = &report.warnings[0];
    assert_eq!(warning.reclassified_by.as_deref(), Some("scanner-database"));
    assert!(report.overall_success);
}

#[tokio::test]
async fn quick_selects_exactly_the_preset() {
    let mut runner = ScriptedRunner::new();
    let mut checks = Vec::new();
    for (idx, category) in pipeline_order().iter().enumerate() {
        for n in 0..3 {
            let program = format!("{category}-{n}");
            runner = runner.script(&program, Script::pass());
            let mut check = Check::new(&program, category, [program.as_str()]);
            if idx == 3 && n > 0 {
                check = check.full_only();
            }
            checks.push(check);
        }
    }
    let runner = Arc::new(runner);
    let preset = QuickPreset {
        categories: vec!["setup".into(), "tests".into()],
    };
    let orch = orchestrator(
        checks,
        scheduler_config(&pipeline_order(), &[], &[]),
        preset,
        runner.clone(),
    );

    let opts = RunOptions {
        quick: true,
        ..RunOptions::default()
    };
    let report = orch.run_all(&opts).await.unwrap();

    let names: Vec<&str> = report.categories.iter().map(|c| c.name.as_str()).collect();
    assert_eq!(names, vec!["setup", "tests"]);
    assert_eq!(
        runner.start_order(),
        vec!["setup-0", "setup-1", "setup-2", "tests-0"]
    );
    assert!(report.mode.quick);
}

#[tokio::test]
async fn non_critical_exit_is_never_failed() {
    let runner = Arc::new(
        ScriptedRunner::new()
            .script("audit", Script::fail(1).stderr("2 known vulnerabilities"))
            .script("links", Script::fail(127)),
    );
    let checks = vec![
        Check::new("pip-audit", "security", ["audit"]).non_critical(),
        Check::new("links", "docs", ["links"]).non_critical(),
    ];
    let orch = orchestrator(
        checks,
        scheduler_config(&pipeline_order(), &["docs"], &["security"]),
        QuickPreset::default(),
        runner,
    );

    let report = orch.run_all(&RunOptions::default()).await.unwrap();
    assert!(report.checks.iter().all(|c| c.status == CheckStatus::Warning));
    assert_eq!(report.totals.failed, 0);
    assert!(report.overall_success);
    assert_eq!(report.halted_after, None);
    assert_eq!(report.warnings.len(), 2);
}

#[tokio::test]
async fn ci_promotes_non_critical_checks() {
    let runner = Arc::new(ScriptedRunner::new().script("audit", Script::fail(1)));
    let checks = vec![Check::new("pip-audit", "security", ["audit"]).non_critical()];
    let orch = orchestrator(
        checks,
        scheduler_config(&pipeline_order(), &[], &["security"]),
        QuickPreset::default(),
        runner,
    );

    let opts = RunOptions {
        ci: true,
        ..RunOptions::default()
    };
    let report = orch.run_all(&opts).await.unwrap();
    assert_eq!(report.check("pip-audit").unwrap().status, CheckStatus::Failed);
    assert_eq!(report.exit_code, 1);
    assert!(orch.registry().get("pip-audit").is_some_and(|c| !c.critical));
}

#[tokio::test]
async fn overall_success_tracks_failed_count() {
    let cases = [
        (Script::pass(), Script::pass()),
        (Script::fail(2), Script::pass()),
        (Script::pass(), Script::fail(1)),
    ];
    for (a, b) in cases {
        let runner = Arc::new(ScriptedRunner::new().script("a", a).script("b", b));
        let checks = vec![
            Check::new("a", "setup", ["a"]),
            Check::new("b", "docs", ["b"]).non_critical(),
        ];
        let orch = orchestrator(
            checks,
            scheduler_config(&pipeline_order(), &[], &[]),
            QuickPreset::default(),
            runner,
        );
        let report = orch.run_all(&RunOptions::default()).await.unwrap();
        assert_eq!(report.overall_success, report.totals.failed == 0);
        assert_eq!(report.exit_code == 0, report.overall_success);
    }
}

#[tokio::test]
async fn categories_run_in_dependency_order() {
    let runner = Arc::new(
        ScriptedRunner::new()
            .script("deps", Script::pass().delay_ms(40))
            .script("lint", Script::pass().delay_ms(20))
            .script("types", Script::pass().delay_ms(20))
            .script("docs-a", Script::pass().delay_ms(80))
            .script("docs-b", Script::pass().delay_ms(80)),
    );
    // registration order deliberately differs from dependency order
    let checks = vec![
        Check::new("docs-a", "docs", ["docs-a"]),
        Check::new("lint", "quality", ["lint"]),
        Check::new("docs-b", "docs", ["docs-b"]),
        Check::new("types", "quality", ["types"]),
        Check::new("deps", "setup", ["deps"]),
    ];
    let orch = orchestrator(
        checks,
        scheduler_config(&pipeline_order(), &["docs"], &["quality"]),
        QuickPreset::default(),
        runner.clone(),
    );

    let opts = RunOptions {
        categories: vec!["docs".into(), "quality".into(), "setup".into()],
        ..RunOptions::default()
    };
    orch.run_all(&opts).await.unwrap();

    let (_, deps_end) = runner.span("deps");
    let (lint_start, lint_end) = runner.span("lint");
    let (types_start, types_end) = runner.span("types");
    let (a_start, a_end) = runner.span("docs-a");
    let (b_start, b_end) = runner.span("docs-b");

    assert!(deps_end <= lint_start);
    // sequential category keeps registration order without overlap
    assert!(lint_end <= types_start);
    assert!(types_end <= a_start.min(b_start));
    // parallel category overlaps
    assert!(a_start < b_end && b_start < a_end);
}

#[tokio::test]
async fn repeated_clean_runs_report_identical_counts() {
    let make = || {
        let runner = Arc::new(
            ScriptedRunner::new()
                .script("deps", Script::pass())
                .script("lint", Script::pass())
                .script("docs", Script::pass()),
        );
        let checks = vec![
            Check::new("deps", "setup", ["deps"]),
            Check::new("lint", "quality", ["lint"]),
            Check::new("docs", "docs", ["docs"]).non_critical(),
        ];
        orchestrator(
            checks,
            scheduler_config(&pipeline_order(), &["docs"], &["quality"]),
            QuickPreset::default(),
            runner,
        )
    };

    let first = make().run_all(&RunOptions::default()).await.unwrap();
    let second = make().run_all(&RunOptions::default()).await.unwrap();
    assert_eq!(counts(&first), counts(&second));
    assert_ne!(first.run_id, second.run_id);
}

#[tokio::test]
async fn unknown_category_is_rejected() {
    let runner = Arc::new(ScriptedRunner::new());
    let orch = orchestrator(
        vec![Check::new("deps", "setup", ["deps"])],
        scheduler_config(&pipeline_order(), &[], &[]),
        QuickPreset::default(),
        runner,
    );
    let opts = RunOptions {
        categories: vec!["nope".into()],
        ..RunOptions::default()
    };
    assert!(orch.run_all(&opts).await.is_err());
}

#[tokio::test]
async fn spawn_failure_becomes_a_result() {
    let runner = Arc::new(ScriptedRunner::new());
    let orch = orchestrator(
        vec![Check::new("prisma", "setup", ["prisma", "generate"])],
        scheduler_config(&pipeline_order(), &[], &[]),
        QuickPreset::default(),
        runner,
    );
    let report = orch.run_all(&RunOptions::default()).await.unwrap();
    let r = report.check("prisma").unwrap();
    assert_eq!(r.status, CheckStatus::Failed);
    assert!(r
        .error_detail
        .as_deref()
        .is_some_and(|d| d.starts_with("failed to start `prisma`")));
}

#[tokio::test]
async fn env_overrides_reach_only_their_check() {
    let runner = Arc::new(
        ScriptedRunner::new()
            .script("cfn-lint", Script::pass())
            .script("tflint", Script::pass()),
    );
    let checks = vec![
        Check::new("cfn", "deploy", ["cfn-lint"]).env("AWS_PROFILE", "local-ci"),
        Check::new("tf", "deploy", ["tflint"]),
    ];
    let orch = orchestrator(
        checks,
        scheduler_config(&["deploy"], &[], &[]),
        QuickPreset::default(),
        runner.clone(),
    );
    orch.run_all(&RunOptions::default()).await.unwrap();

    assert_eq!(
        runner.envs("cfn-lint").get("AWS_PROFILE").map(String::as_str),
        Some("local-ci")
    );
    assert!(runner.envs("tflint").is_empty());
}

#[tokio::test]
async fn services_stay_up_until_the_run_ends() {
    let runner = Arc::new(
        ScriptedRunner::new()
            .script("uvicorn", Script::hang().stdout("Uvicorn running on http://127.0.0.1:8765"))
            .script("smoke", Script::pass())
            .script("worker", Script::fail(3).delay_ms(20)),
    );
    let checks = vec![
        Check::new("api", "services", ["uvicorn"]).non_critical(),
        Check::new("worker", "services", ["worker"]).non_critical(),
        Check::new("smoke", "docs", ["smoke"]),
    ];
    let orch = orchestrator(
        checks,
        scheduler_config(&["services", "docs"], &[], &[]),
        QuickPreset::default(),
        runner.clone(),
    );

    let report = orch.run_all(&RunOptions::default()).await.unwrap();

    let api = report.check("api").unwrap();
    assert_eq!(api.status, CheckStatus::Passed);
    assert!(api.stdout_tail.contains("Uvicorn running"));

    let worker = report.check("worker").unwrap();
    assert_eq!(worker.status, CheckStatus::Warning);
    assert_eq!(
        worker.error_detail.as_deref(),
        Some("service exited during startup with code 3")
    );

    // still running while the next category ran, stopped at the end
    let (_, api_end) = runner.span("uvicorn");
    let (_, smoke_end) = runner.span("smoke");
    assert!(smoke_end <= api_end);
    assert_eq!(runner.signals("uvicorn"), vec![Signal::Term]);
}

#[tokio::test]
async fn dry_run_treats_services_as_batch() {
    let runner = Arc::new(ScriptedRunner::new().script("uvicorn", Script::pass()));
    let orch = orchestrator(
        vec![Check::new("api", "services", ["uvicorn"])],
        scheduler_config(&["services"], &[], &[]),
        QuickPreset::default(),
        runner.clone(),
    );
    let opts = RunOptions {
        dry_run: true,
        ..RunOptions::default()
    };
    let report = orch.run_all(&opts).await.unwrap();
    assert_eq!(report.check("api").unwrap().status, CheckStatus::Passed);
    assert!(runner.signals("uvicorn").is_empty());
    assert!(report.mode.dry_run);
}

#[tokio::test]
async fn cancellation_kills_in_flight_checks_and_skips_the_rest() {
    let runner = Arc::new(
        ScriptedRunner::new()
            .script("pytest", Script::hang())
            .script("mkdocs", Script::pass()),
    );
    let checks = vec![
        Check::new("unit-tests", "tests", ["pytest"]),
        Check::new("smoke-tests", "tests", ["smoke"]),
        Check::new("docs", "docs", ["mkdocs"]).non_critical(),
    ];
    let orch = orchestrator(
        checks,
        scheduler_config(&pipeline_order(), &["docs"], &["tests"]),
        QuickPreset::default(),
        runner.clone(),
    );

    let token = orch.cancel_token();
    tokio::spawn(async move {
        tokio::time::sleep(Duration::from_millis(100)).await;
        token.cancel();
    });

    let started = Instant::now();
    let report = orch.run_all(&RunOptions::default()).await.unwrap();
    assert!(started.elapsed() < Duration::from_secs(2));

    let tests = report.check("unit-tests").unwrap();
    assert_eq!(tests.status, CheckStatus::Failed);
    assert_eq!(tests.error_detail.as_deref(), Some("cancelled"));
    assert_eq!(runner.signals("pytest"), vec![Signal::Kill]);

    let smoke = report.check("smoke-tests").unwrap();
    assert_eq!(smoke.status, CheckStatus::Skipped);
    assert_eq!(smoke.skip_reason.as_deref(), Some("cancelled before start"));
    assert!(smoke.error_detail.is_none());
    assert!(!runner.started("smoke"));

    let docs = report.check("docs").unwrap();
    assert_eq!(docs.status, CheckStatus::Skipped);
    assert_eq!(docs.skip_reason.as_deref(), Some("run cancelled"));
    assert!(docs.error_detail.is_none());
    assert!(!runner.started("mkdocs"));
    assert!(report.interrupted);
    assert_eq!(report.exit_code, 1);
}

#[tokio::test]
async fn cross_category_parallel_merges_independent_categories() {
    let runner = Arc::new(
        ScriptedRunner::new()
            .script("tf", Script::pass().delay_ms(80))
            .script("mkdocs", Script::pass().delay_ms(80)),
    );
    let checks = vec![
        Check::new("tf", "deploy", ["tf"]),
        Check::new("mkdocs", "docs", ["mkdocs"]),
    ];
    let orch = orchestrator(
        checks,
        scheduler_config(&["deploy", "docs"], &["deploy", "docs"], &[]),
        QuickPreset::default(),
        runner.clone(),
    );

    let opts = RunOptions {
        parallel: true,
        ..RunOptions::default()
    };
    assert_eq!(orch.plan(&opts).unwrap().len(), 1);
    orch.run_all(&opts).await.unwrap();

    let (tf_start, tf_end) = runner.span("tf");
    let (docs_start, docs_end) = runner.span("mkdocs");
    assert!(tf_start < docs_end && docs_start < tf_end);
}
