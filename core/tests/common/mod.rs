#![allow(dead_code)]

use std::collections::{BTreeMap, HashMap};
use std::sync::{Arc, Mutex};
use std::time::{Duration, Instant};

use async_trait::async_trait;
use tokio::io::{AsyncRead, AsyncWriteExt};
use tokio::sync::watch;

use localci_core::check::{Check, CheckRegistry};
use localci_core::classifier::{default_rules, Classifier};
use localci_core::config::{QuickPreset, SchedulerConfig};
use localci_core::orchestrator::{Orchestrator, RunSettings};
use localci_core::runner::{RunnerPlugin, RunnerSession, RunnerStartArgs, Signal};
use localci_core::scheduler::CategoryScheduler;

/// Behaviour of one fake program.
#[derive(Debug, Clone, Default)]
pub struct Script {
    pub exit_code: i32,
    pub stdout: String,
    pub stderr: String,
    pub delay: Duration,
    /// Never exits on its own; only a signal ends it.
    pub hang: bool,
}

impl Script {
    pub fn pass() -> Self {
        Self::default()
    }

    pub fn fail(code: i32) -> Self {
        Self {
            exit_code: code,
            ..Self::default()
        }
    }

    pub fn hang() -> Self {
        Self {
            hang: true,
            ..Self::default()
        }
    }

    pub fn stdout(mut self, s: &str) -> Self {
        self.stdout = s.to_string();
        self
    }

    pub fn stderr(mut self, s: &str) -> Self {
        self.stderr = s.to_string();
        self
    }

    pub fn delay_ms(mut self, ms: u64) -> Self {
        self.delay = Duration::from_millis(ms);
        self
    }
}

#[derive(Debug, Clone)]
pub enum Event {
    Started {
        program: String,
        envs: BTreeMap<String, String>,
        at: Instant,
    },
    Exited {
        program: String,
        code: i32,
        at: Instant,
    },
    Signalled {
        program: String,
        signal: Signal,
    },
}

/// In-memory runner: programs are looked up by name in a script table,
/// output flows through `tokio::io::duplex` pipes. Unknown programs fail
/// to start.
#[derive(Default)]
pub struct ScriptedRunner {
    scripts: HashMap<String, Script>,
    log: Arc<Mutex<Vec<Event>>>,
}

impl ScriptedRunner {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn script(mut self, program: &str, script: Script) -> Self {
        self.scripts.insert(program.to_string(), script);
        self
    }

    pub fn events(&self) -> Vec<Event> {
        self.log.lock().unwrap().clone()
    }

    pub fn started(&self, program: &str) -> bool {
        self.events()
            .iter()
            .any(|e| matches!(e, Event::Started { program: p, .. } if p == program))
    }

    pub fn start_order(&self) -> Vec<String> {
        self.events()
            .into_iter()
            .filter_map(|e| match e {
                Event::Started { program, .. } => Some(program),
                _ => None,
            })
            .collect()
    }

    /// (start, exit) instants of a program that ran to completion.
    pub fn span(&self, program: &str) -> (Instant, Instant) {
        let events = self.events();
        let start = events
            .iter()
            .find_map(|e| match e {
                Event::Started { program: p, at, .. } if p == program => Some(*at),
                _ => None,
            })
            .expect("program started");
        let end = events
            .iter()
            .find_map(|e| match e {
                Event::Exited { program: p, at, .. } if p == program => Some(*at),
                _ => None,
            })
            .expect("program exited");
        (start, end)
    }

    pub fn signals(&self, program: &str) -> Vec<Signal> {
        self.events()
            .into_iter()
            .filter_map(|e| match e {
                Event::Signalled { program: p, signal } if p == program => Some(signal),
                _ => None,
            })
            .collect()
    }

    pub fn envs(&self, program: &str) -> BTreeMap<String, String> {
        self.events()
            .into_iter()
            .find_map(|e| match e {
                Event::Started { program: p, envs, .. } if p == program => Some(envs),
                _ => None,
            })
            .unwrap_or_default()
    }
}

#[async_trait]
impl RunnerPlugin for ScriptedRunner {
    fn name(&self) -> &str {
        "scripted"
    }

    async fn start_session(
        &self,
        args: &RunnerStartArgs,
    ) -> anyhow::Result<Box<dyn RunnerSession>> {
        let Some(script) = self.scripts.get(&args.cmd).cloned() else {
            anyhow::bail!("No such file or directory (os error 2): {}", args.cmd);
        };
        self.log.lock().unwrap().push(Event::Started {
            program: args.cmd.clone(),
            envs: args.envs.clone(),
            at: Instant::now(),
        });
        let (killed, _) = watch::channel(None);
        Ok(Box::new(ScriptedSession {
            program: args.cmd.clone(),
            stdout: Some(pipe(script.stdout.clone())),
            stderr: Some(pipe(script.stderr.clone())),
            finish_at: tokio::time::Instant::now() + script.delay,
            script,
            killed,
            reaped: false,
            log: self.log.clone(),
        }))
    }
}

fn pipe(content: String) -> Box<dyn AsyncRead + Unpin + Send> {
    let (mut wr, rd) = tokio::io::duplex(64 * 1024);
    tokio::spawn(async move {
        let _ = wr.write_all(content.as_bytes()).await;
    });
    Box::new(rd)
}

struct ScriptedSession {
    program: String,
    script: Script,
    stdout: Option<Box<dyn AsyncRead + Unpin + Send>>,
    stderr: Option<Box<dyn AsyncRead + Unpin + Send>>,
    finish_at: tokio::time::Instant,
    killed: watch::Sender<Option<i32>>,
    reaped: bool,
    log: Arc<Mutex<Vec<Event>>>,
}

impl ScriptedSession {
    fn reap(&mut self, code: i32) -> i32 {
        if !self.reaped {
            self.reaped = true;
            self.log.lock().unwrap().push(Event::Exited {
                program: self.program.clone(),
                code,
                at: Instant::now(),
            });
        }
        code
    }
}

#[async_trait]
impl RunnerSession for ScriptedSession {
    fn pid(&self) -> Option<u32> {
        Some(4242)
    }

    fn stdout(&mut self) -> Option<Box<dyn AsyncRead + Unpin + Send>> {
        self.stdout.take()
    }

    fn stderr(&mut self) -> Option<Box<dyn AsyncRead + Unpin + Send>> {
        self.stderr.take()
    }

    async fn signal(&mut self, signal: Signal) -> anyhow::Result<()> {
        self.log.lock().unwrap().push(Event::Signalled {
            program: self.program.clone(),
            signal,
        });
        let code = match signal {
            Signal::Term => 128 + 15,
            Signal::Kill => 128 + 9,
        };
        self.killed.send_replace(Some(code));
        Ok(())
    }

    async fn wait(&mut self) -> anyhow::Result<i32> {
        let mut killed = self.killed.subscribe();
        loop {
            if let Some(code) = *killed.borrow_and_update() {
                return Ok(self.reap(code));
            }
            let hang = self.script.hang;
            tokio::select! {
                _ = tokio::time::sleep_until(self.finish_at), if !hang => {
                    let code = self.script.exit_code;
                    return Ok(self.reap(code));
                }
                changed = killed.changed() => {
                    if changed.is_err() {
                        std::future::pending::<()>().await;
                    }
                }
            }
        }
    }
}

pub fn scheduler_config(order: &[&str], parallel: &[&str], gates: &[&str]) -> SchedulerConfig {
    let owned = |items: &[&str]| items.iter().map(|s| s.to_string()).collect::<Vec<_>>();
    SchedulerConfig {
        order: owned(order),
        parallel_categories: owned(parallel),
        gate_categories: owned(gates),
        service_categories: vec!["services".to_string()],
        service_grace_ms: 150,
        service_shutdown_ms: 200,
    }
}

pub fn settings() -> RunSettings {
    RunSettings {
        max_parallel: 4,
        capture_bytes: 4096,
        kill_grace: Duration::from_millis(200),
        service_shutdown: Duration::from_millis(200),
        echo_output: false,
        echo_to_stderr: false,
        output_chars: 2000,
        show_progress: false,
    }
}

pub fn orchestrator(
    checks: Vec<Check>,
    scheduler: SchedulerConfig,
    quick: QuickPreset,
    runner: Arc<ScriptedRunner>,
) -> Orchestrator {
    Orchestrator::new(
        CheckRegistry::new(checks).expect("valid registry"),
        CategoryScheduler::new(&scheduler),
        Classifier::new(&default_rules()).expect("built-in rules compile"),
        quick,
        runner,
        settings(),
    )
}
