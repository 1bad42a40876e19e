use std::path::{Path, PathBuf};

use crate::error::ConfigError;

use super::types::AppConfig;

pub const LOCAL_CONFIG_FILE: &str = "localci.toml";

pub fn load_from_path(path: &Path) -> Result<AppConfig, ConfigError> {
    let s = std::fs::read_to_string(path).map_err(|source| ConfigError::Read {
        path: path.to_path_buf(),
        source,
    })?;
    toml::from_str::<AppConfig>(&s).map_err(|source| ConfigError::Parse {
        path: path.to_path_buf(),
        source,
    })
}

pub fn load(explicit: Option<&Path>) -> Result<AppConfig, ConfigError> {
    // Priority 1: --config <path>
    // Priority 2: ./localci.toml
    // Priority 3: built-in defaults
    let local_config = Path::new(LOCAL_CONFIG_FILE);

    let mut cfg = match explicit {
        Some(path) => load_from_path(path)?,
        None if local_config.exists() => load_from_path(local_config)?,
        None => AppConfig::default(),
    };

    apply_env_overrides(&mut cfg, |key| std::env::var(key).ok())?;
    fill_log_directory(&mut cfg);

    Ok(cfg)
}

/// Environment overrides win over file values. `lookup` is injectable so
/// tests do not have to touch the process environment.
pub fn apply_env_overrides<F>(cfg: &mut AppConfig, lookup: F) -> Result<(), ConfigError>
where
    F: Fn(&str) -> Option<String>,
{
    let non_empty = |key: &str| lookup(key).filter(|v| !v.trim().is_empty());

    if let Some(v) = non_empty("LOCALCI_REPORT_DIR") {
        cfg.reports.directory = v;
    }
    if let Some(v) = non_empty("LOCALCI_LOG_DIR") {
        cfg.logging.directory = Some(v);
    }
    if let Some(v) = non_empty("LOCALCI_MAX_PARALLEL") {
        let n = v
            .trim()
            .parse::<usize>()
            .ok()
            .filter(|n| *n > 0)
            .ok_or(ConfigError::InvalidValue {
                key: "LOCALCI_MAX_PARALLEL",
                value: v.clone(),
            })?;
        cfg.runner.max_parallel = Some(n);
    }
    Ok(())
}

fn fill_log_directory(cfg: &mut AppConfig) {
    let unset = cfg
        .logging
        .directory
        .as_ref()
        .map(|s| s.trim().is_empty())
        .unwrap_or(true);
    if unset {
        let logs = PathBuf::from(&cfg.reports.directory).join("logs");
        cfg.logging.directory = Some(logs.to_string_lossy().to_string());
    }
}
