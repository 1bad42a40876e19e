use anyhow::Result;
use async_trait::async_trait;
use tokio::io::AsyncRead;

use super::{render_command, RunnerPlugin, RunnerSession, RunnerStartArgs, Signal};

/// Prints what would run and reports success without spawning anything.
pub struct DryRunRunnerPlugin {
    print: bool,
}

impl DryRunRunnerPlugin {
    pub fn new(print: bool) -> Self {
        Self { print }
    }
}

#[async_trait]
impl RunnerPlugin for DryRunRunnerPlugin {
    fn name(&self) -> &str {
        "dry-run"
    }

    async fn start_session(&self, args: &RunnerStartArgs) -> Result<Box<dyn RunnerSession>> {
        let line = render_command(args);
        if self.print {
            eprintln!("[dry-run] {line}");
        }
        Ok(Box::new(DryRunSession {
            stdout: Some(format!("would run: {line}\n")),
        }))
    }
}

struct DryRunSession {
    stdout: Option<String>,
}

#[async_trait]
impl RunnerSession for DryRunSession {
    fn pid(&self) -> Option<u32> {
        None
    }

    fn stdout(&mut self) -> Option<Box<dyn AsyncRead + Unpin + Send>> {
        self.stdout
            .take()
            .map(|s| Box::new(std::io::Cursor::new(s.into_bytes())) as Box<dyn AsyncRead + Unpin + Send>)
    }

    fn stderr(&mut self) -> Option<Box<dyn AsyncRead + Unpin + Send>> {
        None
    }

    async fn signal(&mut self, _signal: Signal) -> Result<()> {
        Ok(())
    }

    async fn wait(&mut self) -> Result<i32> {
        Ok(0)
    }
}
