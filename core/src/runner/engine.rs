//! Runs one check: start the command, pump its output into tail buffers,
//! enforce the deadline and turn whatever happened into a `CheckResult`.
//!
//! Nothing in here returns an error to the caller. Spawn failures, wait
//! failures, timeouts and cancellation all end up as a terminal status.

use std::time::{Duration, Instant};

use tokio::task::JoinHandle;

use crate::check::{Check, CheckResult, CheckStatus};
use crate::error::RunnerError;
use crate::util::RingBytes;

use super::abort;
use super::cancel::CancelToken;
use super::io_pump::{self, Echo};
use super::service::ServiceHandle;
use super::traits::RunnerPlugin;
use super::types::RunnerStartArgs;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RunMode {
    /// Wait for exit within the check's timeout.
    Batch,
    /// Wait `grace`; still running afterwards means started.
    Service { grace: Duration },
}

pub struct ExecContext<'a> {
    pub runner: &'a dyn RunnerPlugin,
    pub cancel: &'a CancelToken,
    pub capture_bytes: usize,
    pub kill_grace: Duration,
    pub echo: bool,
    /// Echo child stdout on stderr too.
    pub echo_to_stderr: bool,
    /// `--ci`: treat every check as critical.
    pub promote_critical: bool,
}

#[derive(Debug)]
pub struct ExecutionOutput {
    pub result: CheckResult,
    /// Set when a service check left its process running.
    pub service: Option<ServiceHandle>,
}

impl ExecutionOutput {
    fn done(result: CheckResult) -> Self {
        Self {
            result,
            service: None,
        }
    }
}

enum Finish {
    Exited(anyhow::Result<i32>),
    TimedOut,
    Cancelled,
    StillRunning,
}

pub async fn run_check(ctx: &ExecContext<'_>, check: &Check, mode: RunMode) -> ExecutionOutput {
    let critical = check.effective_critical(ctx.promote_critical);
    let mut result = CheckResult::pending(check, critical);

    if ctx.cancel.is_cancelled() {
        settle(&mut result, CheckStatus::Skipped, Some("cancelled before start".into()));
        return ExecutionOutput::done(result);
    }

    settle(&mut result, CheckStatus::Running, None);
    let started = Instant::now();

    let Some(start_args) = RunnerStartArgs::from_check(check) else {
        let status = result.unsuccessful_status();
        settle(&mut result, status, Some("empty command".into()));
        return ExecutionOutput::done(result);
    };

    tracing::debug!(
        check = %check.name,
        runner = ctx.runner.name(),
        cmd = %start_args.cmd,
        env_overrides = start_args.envs.len(),
        "starting check"
    );

    let mut session = match ctx.runner.start_session(&start_args).await {
        Ok(s) => s,
        Err(e) => {
            tracing::error!(check = %check.name, error = %e, "spawn failed");
            let status = result.unsuccessful_status();
            result.duration_ms = started.elapsed().as_millis() as u64;
            settle(
                &mut result,
                status,
                Some(format!("failed to start `{}`: {e}", start_args.cmd)),
            );
            return ExecutionOutput::done(result);
        }
    };

    let ring_out = RingBytes::new(ctx.capture_bytes);
    let ring_err = RingBytes::new(ctx.capture_bytes);
    let echo = ctx.echo.then(|| Echo {
        prefix: check.name.clone(),
        stdout_to_stderr: ctx.echo_to_stderr,
    });

    let mut pumps = Vec::with_capacity(2);
    if let Some(out) = session.stdout() {
        pumps.push(io_pump::pump_stdout(out, ring_out.clone(), echo.clone()));
    }
    if let Some(err) = session.stderr() {
        pumps.push(io_pump::pump_stderr(err, ring_err.clone(), echo));
    }

    let deadline = Duration::from_secs(check.timeout_secs);
    let finish = match mode {
        RunMode::Batch => {
            tokio::select! {
                res = session.wait() => Finish::Exited(res),
                _ = tokio::time::sleep(deadline) => Finish::TimedOut,
                _ = ctx.cancel.cancelled() => Finish::Cancelled,
            }
        }
        RunMode::Service { grace } => {
            tokio::select! {
                res = session.wait() => Finish::Exited(res),
                _ = tokio::time::sleep(grace.min(deadline)) => Finish::StillRunning,
                _ = ctx.cancel.cancelled() => Finish::Cancelled,
            }
        }
    };

    if let Finish::StillRunning = finish {
        result.duration_ms = started.elapsed().as_millis() as u64;
        result.stdout_tail = ring_out.tail_string();
        result.stderr_tail = ring_err.tail_string();
        settle(&mut result, CheckStatus::Passed, None);
        tracing::info!(check = %check.name, pid = ?session.pid(), "service is up");
        let handle = ServiceHandle::new(check.name.clone(), session, pumps, ring_err);
        return ExecutionOutput {
            result,
            service: Some(handle),
        };
    }

    let (status, detail) = match finish {
        Finish::Exited(Ok(0)) if matches!(mode, RunMode::Batch) => (CheckStatus::Passed, None),
        Finish::Exited(Ok(code)) => {
            result.exit_code = Some(code);
            let detail = match mode {
                RunMode::Batch => format!("exited with code {code}"),
                RunMode::Service { .. } => format!("service exited during startup with code {code}"),
            };
            (result.unsuccessful_status(), Some(detail))
        }
        Finish::Exited(Err(e)) => (
            result.unsuccessful_status(),
            Some(format!("failed waiting for process: {e}")),
        ),
        Finish::TimedOut => {
            result.timed_out = true;
            result.exit_code = abort::kill_now(&mut session, ctx.kill_grace).await;
            tracing::warn!(check = %check.name, timeout_secs = check.timeout_secs, "check timed out");
            (
                result.unsuccessful_status(),
                Some(format!("timed out after {}s", check.timeout_secs)),
            )
        }
        Finish::Cancelled => {
            result.exit_code = abort::kill_now(&mut session, ctx.kill_grace).await;
            (result.unsuccessful_status(), Some("cancelled".to_string()))
        }
        Finish::StillRunning => unreachable!("handled above"),
    };
    if status == CheckStatus::Passed {
        result.exit_code = Some(0);
    }

    drain_pumps(pumps, ctx.kill_grace, &check.name).await;

    result.duration_ms = started.elapsed().as_millis() as u64;
    result.stdout_tail = ring_out.tail_string();
    result.stderr_tail = ring_err.tail_string();
    settle(&mut result, status, detail);

    ExecutionOutput::done(result)
}

fn settle(result: &mut CheckResult, status: CheckStatus, detail: Option<String>) {
    if let Err(e) = result.advance(status) {
        tracing::error!(check = %result.name, error = %e, "status transition rejected");
        return;
    }
    if detail.is_none() {
        return;
    }
    if status == CheckStatus::Skipped {
        result.skip_reason = detail;
    } else {
        result.error_detail = detail;
    }
}

/// Wait for the output pumps to hit EOF. A grandchild that inherited the
/// pipes can keep them open, so this is bounded.
async fn drain_pumps(
    pumps: Vec<JoinHandle<Result<u64, RunnerError>>>,
    grace: Duration,
    check: &str,
) {
    for mut pump in pumps {
        match tokio::time::timeout(grace, &mut pump).await {
            Ok(Ok(Ok(_))) => {}
            Ok(Ok(Err(e))) => tracing::debug!(check, error = %e, "output pump failed"),
            Ok(Err(e)) => tracing::debug!(check, error = %e, "output pump panicked"),
            Err(_) => {
                pump.abort();
                tracing::debug!(check, "output still open after exit, detaching");
            }
        }
    }
}
