use std::sync::Arc;

use chrono::Utc;
use uuid::Uuid;

use crate::check::{Check, CheckRegistry, CheckStatus};
use crate::classifier::Classifier;
use crate::config::{AppConfig, QuickPreset};
use crate::error::{CliError, RegistryError};
use crate::progress::ProgressMonitor;
use crate::report::{build_report, ReportInput, RunReport};
use crate::runner::{run_check, CancelToken, ExecContext, ExecutionOutput, RunMode, RunnerPlugin};
use crate::scheduler::{run_parallel, run_sequential, CategoryScheduler, ExecutionMode, Wave};

use super::accumulator::RunAccumulator;
use super::options::{RunOptions, RunSettings};
use super::services::BackgroundServices;

/// Drives one local pipeline run from category selection to the final report.
pub struct Orchestrator {
    registry: CheckRegistry,
    scheduler: CategoryScheduler,
    classifier: Classifier,
    quick: QuickPreset,
    runner: Arc<dyn RunnerPlugin>,
    settings: RunSettings,
    cancel: CancelToken,
}

impl Orchestrator {
    pub fn new(
        registry: CheckRegistry,
        scheduler: CategoryScheduler,
        classifier: Classifier,
        quick: QuickPreset,
        runner: Arc<dyn RunnerPlugin>,
        settings: RunSettings,
    ) -> Self {
        Self {
            registry,
            scheduler,
            classifier,
            quick,
            runner,
            settings,
            cancel: CancelToken::new(),
        }
    }

    pub fn from_config(cfg: &AppConfig, runner: Arc<dyn RunnerPlugin>) -> Result<Self, CliError> {
        Ok(Self::new(
            CheckRegistry::from_config(cfg)?,
            CategoryScheduler::new(&cfg.scheduler),
            Classifier::from_config(&cfg.classifier)?,
            cfg.quick.clone(),
            runner,
            RunSettings::from_config(cfg),
        ))
    }

    pub fn with_progress(mut self, enabled: bool) -> Self {
        self.settings.show_progress = enabled;
        self
    }

    pub fn with_echo_to_stderr(mut self, enabled: bool) -> Self {
        self.settings.echo_to_stderr = enabled;
        self
    }

    /// Token that aborts the run when cancelled. Clones share state.
    pub fn cancel_token(&self) -> CancelToken {
        self.cancel.clone()
    }

    pub fn registry(&self) -> &CheckRegistry {
        &self.registry
    }

    pub fn settings(&self) -> &RunSettings {
        &self.settings
    }

    /// Requested category names and the checks they select.
    ///
    /// Explicit categories win over the quick preset's category list; with
    /// `quick`, checks marked full-only are dropped either way.
    pub fn select(&self, opts: &RunOptions) -> Result<(Vec<String>, Vec<&Check>), RegistryError> {
        if !opts.categories.is_empty() {
            let mut selection = self.registry.by_categories(&opts.categories)?;
            if opts.quick {
                selection.retain(|c| c.quick);
            }
            return Ok((opts.categories.clone(), selection));
        }
        if opts.quick {
            return Ok((self.quick.categories.clone(), self.registry.quick(&self.quick)));
        }
        let requested = self
            .registry
            .categories()
            .into_iter()
            .map(str::to_string)
            .collect();
        Ok((requested, self.registry.all()))
    }

    pub fn plan(&self, opts: &RunOptions) -> Result<Vec<Wave<'_>>, RegistryError> {
        let (requested, selection) = self.select(opts)?;
        Ok(self.scheduler.plan(&requested, &selection, opts.parallel))
    }

    /// Run every planned stage and build the report.
    ///
    /// Only selection errors surface as `Err`; check failures are results.
    pub async fn run_all(&self, opts: &RunOptions) -> Result<RunReport, RegistryError> {
        let run_id = Uuid::new_v4();
        let started_at = Utc::now();
        let waves = self.plan(opts)?;

        let total_checks: usize = waves.iter().map(|w| w.checks().count()).sum();
        tracing::info!(
            run_id = %run_id,
            stages = waves.len(),
            checks = total_checks,
            quick = opts.quick,
            ci = opts.ci,
            parallel = opts.parallel,
            dry_run = opts.dry_run,
            runner = self.runner.name(),
            "run started"
        );

        let progress = ProgressMonitor::new(total_checks, self.settings.show_progress);
        let ctx = ExecContext {
            runner: self.runner.as_ref(),
            cancel: &self.cancel,
            capture_bytes: self.settings.capture_bytes,
            kill_grace: self.settings.kill_grace,
            echo: self.settings.echo_output,
            echo_to_stderr: self.settings.echo_to_stderr,
            promote_critical: opts.ci,
        };

        let mut acc = RunAccumulator::default();
        let mut services = BackgroundServices::default();
        let mut halted_after: Option<String> = None;

        for (idx, wave) in waves.iter().enumerate() {
            let skip_reason = match (&halted_after, self.cancel.is_cancelled()) {
                (Some(gate), _) => Some(format!("gate category `{gate}` failed")),
                (None, true) => Some("run cancelled".to_string()),
                (None, false) => None,
            };
            if let Some(reason) = skip_reason {
                for category in &wave.categories {
                    acc.skip_category(category, opts.ci, &reason);
                    progress.skip(category.checks.len());
                }
                continue;
            }

            let names = wave.names();
            progress.start_wave(idx, waves.len(), &names);
            tracing::info!(
                stage = idx + 1,
                categories = %names.join(","),
                concurrent = wave.is_concurrent(),
                "stage started"
            );

            for out in self.run_wave(&ctx, wave, opts.dry_run, &progress).await {
                if let Some(handle) = out.service {
                    services.push(handle);
                }
                acc.record(out.result);
            }

            for category in &wave.categories {
                let results: Vec<_> = acc
                    .results()
                    .iter()
                    .filter(|r| r.category == category.name)
                    .collect();
                tracing::info!(
                    category = %category.name,
                    passed = results.iter().filter(|r| r.status == CheckStatus::Passed).count(),
                    failed = results.iter().filter(|r| r.status == CheckStatus::Failed).count(),
                    warnings = results.iter().filter(|r| r.status == CheckStatus::Warning).count(),
                    "category finished"
                );
                if halted_after.is_none() && self.scheduler.should_halt(category, acc.results()) {
                    tracing::warn!(
                        category = %category.name,
                        failures = ?acc.critical_failures(),
                        "gate category failed, stopping"
                    );
                    halted_after = Some(category.name.clone());
                }
            }
        }

        services.shutdown_all(self.settings.service_shutdown).await;

        let interrupted = self.cancel.is_cancelled();
        if interrupted {
            tracing::warn!("run interrupted");
        }
        progress.finish(acc.is_success() && !interrupted);

        let report = build_report(ReportInput {
            run_id,
            started_at,
            finished_at: Utc::now(),
            flags: opts.flags(),
            results: acc.results(),
            halted_after,
            interrupted,
            output_chars: self.settings.output_chars,
        });
        tracing::info!(
            run_id = %run_id,
            success = report.overall_success,
            success_rate = report.success_rate,
            failed = report.totals.failed,
            warnings = report.totals.warnings,
            duration_ms = report.duration_ms,
            "run finished"
        );
        Ok(report)
    }

    async fn run_wave<'a>(
        &self,
        ctx: &ExecContext<'_>,
        wave: &Wave<'a>,
        dry_run: bool,
        progress: &ProgressMonitor,
    ) -> Vec<ExecutionOutput> {
        if wave.is_concurrent() {
            let checks: Vec<&'a Check> = wave.checks().collect();
            return run_parallel(&checks, self.settings.max_parallel, |check| {
                self.execute(ctx, check, RunMode::Batch, progress)
            })
            .await;
        }

        let mut outputs = Vec::new();
        for category in &wave.categories {
            let mode = match category.mode {
                ExecutionMode::Service if !dry_run => RunMode::Service {
                    grace: self.scheduler.service_grace(),
                },
                _ => RunMode::Batch,
            };
            outputs.extend(
                run_sequential(&category.checks, |check| {
                    self.execute(ctx, check, mode, progress)
                })
                .await,
            );
        }
        outputs
    }

    async fn execute(
        &self,
        ctx: &ExecContext<'_>,
        check: &Check,
        mode: RunMode,
        progress: &ProgressMonitor,
    ) -> ExecutionOutput {
        progress.start_check(&check.name);
        let mut out = run_check(ctx, check, mode).await;
        out.result = self.classifier.classify(check, out.result);
        progress.finish_check(&out.result);

        tracing::info!(
            check = %check.name,
            category = %check.category,
            status = %out.result.status,
            duration_ms = out.result.duration_ms,
            exit_code = ?out.result.exit_code,
            "check finished"
        );
        out
    }
}
