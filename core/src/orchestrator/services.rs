use std::time::Duration;

use futures::future::join_all;

use crate::runner::ServiceHandle;

/// Processes started by service checks, stopped together when the run ends.
#[derive(Debug, Default)]
pub struct BackgroundServices {
    handles: Vec<ServiceHandle>,
}

impl BackgroundServices {
    pub fn push(&mut self, handle: ServiceHandle) {
        self.handles.push(handle);
    }

    pub fn len(&self) -> usize {
        self.handles.len()
    }

    pub fn is_empty(&self) -> bool {
        self.handles.is_empty()
    }

    /// SIGTERM every service, SIGKILL whatever is left after `grace`, and
    /// wait for all of them.
    pub async fn shutdown_all(&mut self, grace: Duration) {
        if self.handles.is_empty() {
            return;
        }
        tracing::info!(count = self.handles.len(), "stopping background services");
        let stops = self.handles.drain(..).map(|h| h.shutdown(grace));
        join_all(stops).await;
    }
}
