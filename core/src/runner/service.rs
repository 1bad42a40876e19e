use std::sync::Arc;
use std::time::Duration;

use tokio::task::JoinHandle;

use crate::error::RunnerError;
use crate::util::RingBytes;

use super::abort;
use super::traits::RunnerSession;

/// A long-running process left alive after its check passed. The
/// orchestrator owns it and stops it when the run ends.
pub struct ServiceHandle {
    pub check_name: String,
    session: Box<dyn RunnerSession>,
    pumps: Vec<JoinHandle<Result<u64, RunnerError>>>,
    stderr: Arc<RingBytes>,
}

impl std::fmt::Debug for ServiceHandle {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ServiceHandle")
            .field("check_name", &self.check_name)
            .field("pid", &self.session.pid())
            .finish()
    }
}

impl ServiceHandle {
    pub(crate) fn new(
        check_name: String,
        session: Box<dyn RunnerSession>,
        pumps: Vec<JoinHandle<Result<u64, RunnerError>>>,
        stderr: Arc<RingBytes>,
    ) -> Self {
        Self {
            check_name,
            session,
            pumps,
            stderr,
        }
    }

    pub fn pid(&self) -> Option<u32> {
        self.session.pid()
    }

    /// SIGTERM, then SIGKILL after `grace`. Returns the exit code if the
    /// process was reaped.
    pub async fn shutdown(mut self, grace: Duration) -> Option<i32> {
        let code = abort::terminate(&mut self.session, grace).await;
        for mut pump in self.pumps.drain(..) {
            if tokio::time::timeout(grace, &mut pump).await.is_err() {
                pump.abort();
                tracing::debug!(check = %self.check_name, "output pump still open after shutdown");
            }
        }
        tracing::info!(
            check = %self.check_name,
            exit_code = ?code,
            stderr_bytes = self.stderr.total_pushed(),
            "background service stopped"
        );
        code
    }
}
