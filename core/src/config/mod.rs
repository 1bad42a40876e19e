mod load;
mod types;

pub use load::{apply_env_overrides, load, load_from_path, LOCAL_CONFIG_FILE};
pub use types::{
    AppConfig, ClassifierConfig, LoggingConfig, QuickPreset, ReportsConfig, RunnerConfig,
    SchedulerConfig,
};
