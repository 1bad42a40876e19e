pub mod dry_run;
pub mod process;

pub use localci_core::runner::{RunnerPlugin, RunnerSession, RunnerStartArgs, Signal};

pub use dry_run::DryRunRunnerPlugin;
pub use process::ProcessRunnerPlugin;

/// `KEY=value program arg ...`, quoting args that need it.
pub(crate) fn render_command(args: &RunnerStartArgs) -> String {
    let quote = |s: &str| {
        if s.is_empty() || s.chars().any(|c| c.is_whitespace() || c == '\'' || c == '"') {
            format!("'{}'", s.replace('\'', r"'\''"))
        } else {
            s.to_string()
        }
    };
    args.envs
        .iter()
        .map(|(k, v)| format!("{k}={}", quote(v)))
        .chain(std::iter::once(quote(&args.cmd)))
        .chain(args.args.iter().map(|a| quote(a)))
        .collect::<Vec<_>>()
        .join(" ")
}
