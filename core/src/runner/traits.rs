use async_trait::async_trait;
use tokio::io::AsyncRead;

use super::types::{RunnerStartArgs, Signal};

/// One started external command.
#[async_trait]
pub trait RunnerSession: Send {
    fn pid(&self) -> Option<u32>;
    fn stdout(&mut self) -> Option<Box<dyn AsyncRead + Unpin + Send>>;
    fn stderr(&mut self) -> Option<Box<dyn AsyncRead + Unpin + Send>>;
    /// Deliver `signal` to the command and everything it spawned.
    async fn signal(&mut self, signal: Signal) -> anyhow::Result<()>;
    /// Wait for exit and return the exit code. Must be cancel-safe.
    async fn wait(&mut self) -> anyhow::Result<i32>;
}

#[async_trait]
pub trait RunnerPlugin: Send + Sync {
    fn name(&self) -> &str;
    async fn start_session(&self, args: &RunnerStartArgs)
        -> anyhow::Result<Box<dyn RunnerSession>>;
}
