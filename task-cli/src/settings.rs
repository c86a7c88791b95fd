use config::{ConfigError, Environment, File};
use serde::Deserialize;
use std::path::PathBuf;
use tracing::level_filters::LevelFilter;

pub const DEFAULT_TASK_FILE: &str = "tasks.json";
pub const DEFAULT_LOG_LEVEL: &str = "warn";
const CONFIG_FILE: &str = "task-cli";
const ENV_PREFIX: &str = "TASK_CLI";

/// Where tasks are kept and how loud the logs are.
///
/// Resolved from, lowest priority first: built-in defaults, an optional
/// `task-cli.toml` in the working directory, `TASK_CLI_*` environment
/// variables, and finally the `--file` flag.
#[derive(Debug, Clone, Deserialize, PartialEq)]
pub struct Settings {
    pub file: PathBuf,
    pub log_level: String,
}

impl Settings {
    pub fn load(file_override: Option<String>) -> Result<Self, ConfigError> {
        Self::from_sources(
            File::with_name(CONFIG_FILE).required(false),
            Environment::with_prefix(ENV_PREFIX),
            file_override,
        )
    }

    fn from_sources(
        config_file: impl config::Source + Send + Sync + 'static,
        environment: Environment,
        file_override: Option<String>,
    ) -> Result<Self, ConfigError> {
        config::Config::builder()
            .set_default("file", DEFAULT_TASK_FILE)?
            .set_default("log_level", DEFAULT_LOG_LEVEL)?
            .add_source(config_file)
            .add_source(environment)
            .set_override_option("file", file_override)?
            .build()?
            .try_deserialize()
    }

    pub fn log_level(&self) -> Result<LevelFilter, ConfigError> {
        self.log_level.parse().map_err(|_| {
            ConfigError::Message(format!("invalid log level '{}'", self.log_level))
        })
    }
}
