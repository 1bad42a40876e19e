//! Wires config, CLI flags, the runner and the orchestrator together.

use std::path::Path;

use localci_core::config::AppConfig;
use localci_core::error::{CliError, ReportError};
use localci_core::report::{render_text, write_report};
use localci_core::runner::CancelToken;
use localci_core::scheduler::Wave;
use localci_core::{Orchestrator, RunOptions};
use localci_plugins::factory::build_runner;

use crate::commands::cli::{ListArgs, OutputFormat, RunArgs};

/// Fold command-line overrides into the loaded config.
pub fn apply_run_overrides(cfg: &mut AppConfig, args: &RunArgs) {
    if let Some(n) = args.max_parallel {
        cfg.runner.max_parallel = Some(n as usize);
    }
    if let Some(dir) = &args.report_dir {
        cfg.reports.directory = dir.to_string_lossy().to_string();
    }
    if args.verbose {
        cfg.runner.echo_output = true;
    }
}

pub fn run_options(args: &RunArgs) -> RunOptions {
    RunOptions {
        categories: args.categories.clone(),
        quick: args.quick,
        ci: args.ci,
        parallel: args.parallel,
        dry_run: args.dry_run,
    }
}

/// Exit status used when a second interrupt aborts the process.
pub const FORCED_EXIT_CODE: i32 = 130;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum InterruptAction {
    /// Stop running checks and let the run wind down.
    Cancel,
    /// Give up on grace periods and exit now.
    ForceExit,
}

/// React to the `seen`-th ctrl-c of this run.
pub fn on_interrupt(cancel: &CancelToken, seen: u32) -> InterruptAction {
    if seen <= 1 {
        tracing::warn!("interrupt received, stopping running checks (press ctrl-c again to force)");
        cancel.cancel();
        InterruptAction::Cancel
    } else {
        tracing::warn!("second interrupt, exiting without cleanup");
        InterruptAction::ForceExit
    }
}

/// Orchestrator for one `run`, with output routing matched to the format.
pub fn build_orchestrator(args: &RunArgs, cfg: &AppConfig) -> Result<Orchestrator, CliError> {
    let text = args.format == OutputFormat::Text;
    let show_progress = text
        && !args.no_progress
        && !cfg.runner.echo_output
        && atty::is(atty::Stream::Stdout);
    let runner = build_runner(args.dry_run, text);
    Ok(Orchestrator::from_config(cfg, runner)?
        .with_progress(show_progress)
        .with_echo_to_stderr(!text))
}

#[tracing::instrument(name = "cli.run_app", skip_all)]
pub async fn run_app(args: RunArgs, mut cfg: AppConfig) -> Result<i32, CliError> {
    apply_run_overrides(&mut cfg, &args);
    let orchestrator = build_orchestrator(&args, &cfg)?;

    let cancel = orchestrator.cancel_token();
    let interrupt = tokio::spawn(async move {
        let mut seen = 0;
        while tokio::signal::ctrl_c().await.is_ok() {
            seen += 1;
            if on_interrupt(&cancel, seen) == InterruptAction::ForceExit {
                std::process::exit(FORCED_EXIT_CODE);
            }
        }
    });

    let outcome = orchestrator.run_all(&run_options(&args)).await;
    interrupt.abort();
    let report = outcome?;

    let path = write_report(
        &report,
        Path::new(&cfg.reports.directory),
        cfg.reports.write_latest,
    )
    .await?;

    match args.format {
        OutputFormat::Text => {
            print!("{}", render_text(&report));
            println!("\nReport: {}", path.display());
        }
        OutputFormat::Json => {
            let json = serde_json::to_string_pretty(&report).map_err(ReportError::from)?;
            println!("{json}");
        }
    }

    Ok(report.exit_code)
}

pub fn list_app(args: ListArgs, cfg: &AppConfig) -> Result<i32, CliError> {
    let orchestrator = Orchestrator::from_config(cfg, build_runner(true, false))?;
    let opts = RunOptions {
        categories: args.categories,
        quick: args.quick,
        parallel: args.parallel,
        ..RunOptions::default()
    };
    let waves = orchestrator.plan(&opts)?;
    print!("{}", format_plan(&waves));
    Ok(0)
}

/// One block per stage, one line per check.
pub fn format_plan(waves: &[Wave<'_>]) -> String {
    let mut out = String::new();
    if waves.is_empty() {
        out.push_str("nothing selected\n");
        return out;
    }
    for (idx, wave) in waves.iter().enumerate() {
        for category in &wave.categories {
            let mut tags = vec![category.mode.label()];
            if category.gate {
                tags.push("gate");
            }
            out.push_str(&format!(
                "stage {}: {} ({})\n",
                idx + 1,
                category.name,
                tags.join(", ")
            ));
            for check in &category.checks {
                let kind = if check.always_critical {
                    "always-critical"
                } else if check.critical {
                    "critical"
                } else {
                    "advisory"
                };
                out.push_str(&format!(
                    "  - {:<24} {:<15} {:>5}s  {}\n",
                    check.name,
                    kind,
                    check.timeout_secs,
                    check.command_line()
                ));
            }
        }
    }
    out
}
