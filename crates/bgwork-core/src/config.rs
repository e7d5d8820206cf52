use std::collections::{BTreeMap, HashMap};

use figment::{
    providers::{Env, Format, Toml},
    Figment,
};
use serde::{Deserialize, Serialize};

use crate::error::{CoreError, Result};
use crate::types::{JobConfiguration, JobIdentifier};

pub const DEFAULT_LOG_FILTER: &str = "bgwork=info";
pub const DEFAULT_TYPE_NAME: &str = "BackgroundJobIdentifiers";
/// Env var naming an explicit config file, checked before the home default.
pub const CONFIG_PATH_ENV: &str = "BGWORK_CONFIG";

/// Top-level config (bgwork.toml + BGWORK_* env overrides).
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct BgWorkConfig {
    #[serde(default)]
    pub log: LogConfig,
    /// Job table keyed by identifier, in authoring order-independent form.
    #[serde(default)]
    pub jobs: BTreeMap<String, JobConfiguration>,
    #[serde(default)]
    pub generator: GeneratorConfig,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LogConfig {
    /// `tracing_subscriber::EnvFilter` directive used when RUST_LOG is unset.
    #[serde(default = "default_log_filter")]
    pub filter: String,
}

impl Default for LogConfig {
    fn default() -> Self {
        Self {
            filter: default_log_filter(),
        }
    }
}

/// Inputs for the identifier generator. Every field can be overridden on
/// the `bgwork-gen` command line.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct GeneratorConfig {
    /// Rust module path the generated file belongs to, e.g. `app::jobs`.
    pub package_name: Option<String>,
    /// Name of the generated enum. Falls back to [`DEFAULT_TYPE_NAME`].
    pub type_name: Option<String>,
    /// Root directory the module path is resolved against.
    pub output_dir: Option<String>,
    /// iOS `Info.plist` that lists the permitted background identifiers.
    pub manifest_path: Option<String>,
}

fn default_log_filter() -> String {
    DEFAULT_LOG_FILTER.to_string()
}

impl BgWorkConfig {
    /// Load config from a TOML file with BGWORK_* env var overrides.
    ///
    /// Checks in order:
    ///   1. Explicit path argument
    ///   2. `BGWORK_CONFIG` env var
    ///   3. ~/.bgwork/bgwork.toml
    ///
    /// Nested keys are separated by a double underscore in env vars
    /// (`BGWORK_LOG__FILTER`) because job identifiers use single underscores.
    pub fn load(config_path: Option<&str>) -> Result<Self> {
        let path = config_path
            .map(String::from)
            .or_else(|| std::env::var(CONFIG_PATH_ENV).ok())
            .unwrap_or_else(default_config_path);

        tracing::debug!(%path, "loading bgwork config");

        Figment::new()
            .merge(Toml::file(&path))
            .merge(Env::prefixed("BGWORK_").split("__").ignore(&["config"]))
            .extract()
            .map_err(|e| CoreError::Config(e.to_string()))
    }

    /// The configured job table with every identifier checked against the
    /// authoring rules. Fails on the first invalid identifier.
    pub fn job_table(&self) -> Result<HashMap<JobIdentifier, JobConfiguration>> {
        self.jobs
            .iter()
            .map(|(id, config)| Ok((JobIdentifier::parse(id)?, *config)))
            .collect()
    }

    pub fn type_name(&self) -> &str {
        self.generator
            .type_name
            .as_deref()
            .unwrap_or(DEFAULT_TYPE_NAME)
    }
}

fn default_config_path() -> String {
    let home = std::env::var("HOME").unwrap_or_else(|_| ".".to_string());
    format!("{}/.bgwork/bgwork.toml", home)
}
