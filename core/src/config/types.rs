use serde::{Deserialize, Serialize};

use crate::check::Check;
use crate::classifier::{default_rules, ClassifierRule};

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct AppConfig {
    #[serde(default)]
    pub logging: LoggingConfig,

    #[serde(default)]
    pub runner: RunnerConfig,

    #[serde(default)]
    pub reports: ReportsConfig,

    #[serde(default)]
    pub scheduler: SchedulerConfig,

    #[serde(default)]
    pub quick: QuickPreset,

    #[serde(default)]
    pub classifier: ClassifierConfig,

    /// Check registry. Empty means the built-in pipeline.
    #[serde(default)]
    pub checks: Vec<Check>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LoggingConfig {
    #[serde(default = "default_logging_enabled")]
    pub enabled: bool,

    /// If true, log to stderr.
    #[serde(default = "default_logging_console")]
    pub console: bool,

    /// If true, log to a daily rolling file under `directory`.
    #[serde(default = "default_logging_file")]
    pub file: bool,

    /// EnvFilter string, e.g. "info" or "localci_core=debug".
    #[serde(default = "default_logging_level")]
    pub level: String,

    /// Directory for log files. Unset means `<reports.directory>/logs`.
    #[serde(default)]
    pub directory: Option<String>,
}

fn default_logging_enabled() -> bool {
    true
}

fn default_logging_console() -> bool {
    true
}

fn default_logging_file() -> bool {
    true
}

fn default_logging_level() -> String {
    "warn,localci_core=info,localci_cli=info".to_string()
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            enabled: default_logging_enabled(),
            console: default_logging_console(),
            file: default_logging_file(),
            level: default_logging_level(),
            directory: None,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RunnerConfig {
    /// Upper bound on concurrently running checks. Unset means one per CPU.
    #[serde(default)]
    pub max_parallel: Option<usize>,

    /// Tail bytes kept per output stream while a check runs.
    #[serde(default = "default_capture_bytes")]
    pub capture_bytes: usize,

    /// How long a killed process gets to be reaped before we give up on it.
    #[serde(default = "default_kill_grace_ms")]
    pub kill_grace_ms: u64,

    /// Mirror child output to the terminal, prefixed with the check name.
    #[serde(default)]
    pub echo_output: bool,
}

fn default_capture_bytes() -> usize {
    64 * 1024
}

fn default_kill_grace_ms() -> u64 {
    2_000
}

impl Default for RunnerConfig {
    fn default() -> Self {
        Self {
            max_parallel: None,
            capture_bytes: default_capture_bytes(),
            kill_grace_ms: default_kill_grace_ms(),
            echo_output: false,
        }
    }
}

impl RunnerConfig {
    pub fn effective_max_parallel(&self) -> usize {
        self.max_parallel.unwrap_or_else(num_cpus::get).max(1)
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ReportsConfig {
    #[serde(default = "default_reports_directory")]
    pub directory: String,

    /// Chars of stdout/stderr kept per check in the persisted report.
    #[serde(default = "default_output_chars")]
    pub output_chars: usize,

    /// Also write `latest.json` next to the timestamped report.
    #[serde(default = "default_write_latest")]
    pub write_latest: bool,
}

fn default_reports_directory() -> String {
    "reports/local-ci".to_string()
}

fn default_output_chars() -> usize {
    2_000
}

fn default_write_latest() -> bool {
    true
}

impl Default for ReportsConfig {
    fn default() -> Self {
        Self {
            directory: default_reports_directory(),
            output_chars: default_output_chars(),
            write_latest: default_write_latest(),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SchedulerConfig {
    /// Fixed dependency order over category names.
    #[serde(default = "default_order")]
    pub order: Vec<String>,

    /// Categories whose checks run concurrently.
    #[serde(default = "default_parallel_categories")]
    pub parallel_categories: Vec<String>,

    /// Categories whose critical failure halts the run.
    #[serde(default = "default_gate_categories")]
    pub gate_categories: Vec<String>,

    /// Categories whose checks start long-running processes.
    #[serde(default = "default_service_categories")]
    pub service_categories: Vec<String>,

    /// How long a service must stay up to count as started.
    #[serde(default = "default_service_grace_ms")]
    pub service_grace_ms: u64,

    /// How long a service gets to exit after SIGTERM at the end of the run.
    #[serde(default = "default_service_shutdown_ms")]
    pub service_shutdown_ms: u64,
}

fn strings(items: &[&str]) -> Vec<String> {
    items.iter().map(|s| s.to_string()).collect()
}

fn default_order() -> Vec<String> {
    strings(&[
        "environment",
        "codegen",
        "quality",
        "security",
        "tests",
        "build",
        "services",
        "deployment",
        "documentation",
    ])
}

fn default_parallel_categories() -> Vec<String> {
    strings(&["deployment", "documentation"])
}

fn default_gate_categories() -> Vec<String> {
    strings(&["quality", "security", "tests"])
}

fn default_service_categories() -> Vec<String> {
    strings(&["services"])
}

fn default_service_grace_ms() -> u64 {
    3_000
}

fn default_service_shutdown_ms() -> u64 {
    5_000
}

impl Default for SchedulerConfig {
    fn default() -> Self {
        Self {
            order: default_order(),
            parallel_categories: default_parallel_categories(),
            gate_categories: default_gate_categories(),
            service_categories: default_service_categories(),
            service_grace_ms: default_service_grace_ms(),
            service_shutdown_ms: default_service_shutdown_ms(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct QuickPreset {
    #[serde(default = "default_quick_categories")]
    pub categories: Vec<String>,
}

fn default_quick_categories() -> Vec<String> {
    strings(&["environment", "quality", "security", "tests"])
}

impl Default for QuickPreset {
    fn default() -> Self {
        Self {
            categories: default_quick_categories(),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ClassifierConfig {
    #[serde(default = "default_classifier_enabled")]
    pub enabled: bool,

    /// Append the built-in signature table after `rules`.
    #[serde(default = "default_include_builtin")]
    pub include_builtin: bool,

    /// Project rules, evaluated before the built-in ones.
    #[serde(default)]
    pub rules: Vec<ClassifierRule>,
}

fn default_classifier_enabled() -> bool {
    true
}

fn default_include_builtin() -> bool {
    true
}

impl Default for ClassifierConfig {
    fn default() -> Self {
        Self {
            enabled: default_classifier_enabled(),
            include_builtin: default_include_builtin(),
            rules: Vec::new(),
        }
    }
}

impl ClassifierConfig {
    /// Rules in evaluation order.
    pub fn effective_rules(&self) -> Vec<ClassifierRule> {
        if !self.enabled {
            return Vec::new();
        }
        let mut rules = self.rules.clone();
        if self.include_builtin {
            rules.extend(default_rules());
        }
        rules
    }
}
