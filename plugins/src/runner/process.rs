use std::process::Stdio;

use anyhow::{Context, Result};
use async_trait::async_trait;
use tokio::io::AsyncRead;
use tokio::process::{Child, Command};

use super::{RunnerPlugin, RunnerSession, RunnerStartArgs, Signal};

/// Runs checks as real child processes.
///
/// On unix every child leads its own process group so a timeout or Ctrl-C
/// reaches everything the check spawned, not just the direct child.
pub struct ProcessRunnerPlugin {}

impl ProcessRunnerPlugin {
    pub fn new() -> Self {
        Self {}
    }
}

impl Default for ProcessRunnerPlugin {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl RunnerPlugin for ProcessRunnerPlugin {
    fn name(&self) -> &str {
        "process"
    }

    async fn start_session(&self, args: &RunnerStartArgs) -> Result<Box<dyn RunnerSession>> {
        let mut cmd = Command::new(&args.cmd);
        cmd.args(&args.args)
            .envs(&args.envs)
            .stdin(Stdio::null())
            .stdout(Stdio::piped())
            .stderr(Stdio::piped())
            .kill_on_drop(true);
        if let Some(dir) = &args.workdir {
            cmd.current_dir(dir);
        }
        #[cfg(unix)]
        {
            cmd.process_group(0);
        }

        let child = cmd
            .spawn()
            .with_context(|| format!("spawn {}", args.cmd))?;
        let pid = child.id();
        tracing::debug!(cmd = %args.cmd, pid = ?pid, "child spawned");

        Ok(Box::new(ProcessRunnerSession { child, pid }))
    }
}

struct ProcessRunnerSession {
    child: Child,
    /// Kept after the child is reaped: the group may outlive its leader.
    pid: Option<u32>,
}

#[async_trait]
impl RunnerSession for ProcessRunnerSession {
    fn pid(&self) -> Option<u32> {
        self.pid
    }

    fn stdout(&mut self) -> Option<Box<dyn AsyncRead + Unpin + Send>> {
        self.child
            .stdout
            .take()
            .map(|s| Box::new(s) as Box<dyn AsyncRead + Unpin + Send>)
    }

    fn stderr(&mut self) -> Option<Box<dyn AsyncRead + Unpin + Send>> {
        self.child
            .stderr
            .take()
            .map(|s| Box::new(s) as Box<dyn AsyncRead + Unpin + Send>)
    }

    async fn signal(&mut self, signal: Signal) -> Result<()> {
        #[cfg(unix)]
        {
            if let Some(pid) = self.pid {
                use nix::errno::Errno;
                use nix::sys::signal::{killpg, Signal as NixSignal};
                use nix::unistd::Pid;

                let sig = match signal {
                    Signal::Term => NixSignal::SIGTERM,
                    Signal::Kill => NixSignal::SIGKILL,
                };
                match killpg(Pid::from_raw(pid as i32), sig) {
                    Ok(()) | Err(Errno::ESRCH) => return Ok(()),
                    Err(e) => tracing::debug!(pid, error = %e, "killpg failed, killing child only"),
                }
            }
        }

        // Direct child only; Term degrades to a hard kill.
        match self.child.start_kill() {
            Ok(()) => Ok(()),
            Err(_) if self.child.try_wait().ok().flatten().is_some() => Ok(()),
            Err(e) => Err(e).context("kill child"),
        }
    }

    async fn wait(&mut self) -> Result<i32> {
        let status = self.child.wait().await.context("wait for child")?;
        Ok(normalize_exit(status))
    }
}

fn normalize_exit(status: std::process::ExitStatus) -> i32 {
    #[cfg(unix)]
    {
        use std::os::unix::process::ExitStatusExt;
        if let Some(code) = status.code() {
            code
        } else if let Some(sig) = status.signal() {
            128 + sig
        } else {
            1
        }
    }
    #[cfg(windows)]
    {
        status.code().unwrap_or(1)
    }
}
