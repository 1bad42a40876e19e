use std::time::Duration;

use super::traits::RunnerSession;
use super::types::Signal;

/// Kill the command group right away and reap it, waiting at most `grace`.
/// Returns the exit code when the process could be reaped.
pub async fn kill_now(session: &mut Box<dyn RunnerSession>, grace: Duration) -> Option<i32> {
    if let Err(e) = session.signal(Signal::Kill).await {
        tracing::debug!(error = %e, "kill signal failed");
    }
    match tokio::time::timeout(grace, session.wait()).await {
        Ok(Ok(code)) => Some(code),
        Ok(Err(e)) => {
            tracing::debug!(error = %e, "wait after kill failed");
            None
        }
        Err(_) => {
            tracing::warn!(pid = ?session.pid(), "process did not exit after kill");
            None
        }
    }
}

/// Ask politely first: SIGTERM, wait up to `grace`, then SIGKILL.
pub async fn terminate(session: &mut Box<dyn RunnerSession>, grace: Duration) -> Option<i32> {
    if let Err(e) = session.signal(Signal::Term).await {
        tracing::debug!(error = %e, "term signal failed");
    }
    match tokio::time::timeout(grace, session.wait()).await {
        Ok(Ok(code)) => Some(code),
        _ => kill_now(session, grace).await,
    }
}
