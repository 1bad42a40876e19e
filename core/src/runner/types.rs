use std::collections::BTreeMap;
use std::path::PathBuf;

use crate::check::Check;

#[derive(Debug, Clone, Copy, PartialEq, Eq, serde::Serialize, serde::Deserialize)]
pub enum Signal {
    Term,
    Kill,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RunnerStartArgs {
    pub cmd: String,
    pub args: Vec<String>,
    /// Added on top of the inherited process environment.
    pub envs: BTreeMap<String, String>,
    pub workdir: Option<PathBuf>,
}

impl RunnerStartArgs {
    /// `None` when the check has no program to run.
    pub fn from_check(check: &Check) -> Option<Self> {
        let (cmd, args) = check.command.split_first()?;
        Some(Self {
            cmd: cmd.clone(),
            args: args.to_vec(),
            envs: check.env.clone(),
            workdir: check.workdir.clone(),
        })
    }
}
