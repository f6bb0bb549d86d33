use crate::domain::month::EndBound;
use anyhow::Context;
use serde::Deserialize;

/// Environment variable holding the service-account key JSON.
pub const CREDENTIAL_VAR: &str = "EE_KEY_JSON";

const ENV_PREFIX: &str = "LSTNDVI";

#[derive(Debug, Deserialize, Clone, Default)]
pub struct AppConfig {
    #[serde(default)]
    pub server: ServerSettings,
    #[serde(default)]
    pub earth_engine: EarthEngineSettings,
    #[serde(default)]
    pub timeseries: TimeseriesSettings,
    #[serde(default)]
    pub dates: DateSettings,
}

#[derive(Debug, Deserialize, Clone)]
pub struct ServerSettings {
    #[serde(default = "default_bind")]
    pub bind: String,
}

#[derive(Debug, Deserialize, Clone)]
pub struct EarthEngineSettings {
    #[serde(default = "default_base_url")]
    pub base_url: String,
    /// Cloud project for API calls; falls back to the key's `project_id`
    #[serde(default)]
    pub project: Option<String>,
    #[serde(default = "default_timeout_secs")]
    pub request_timeout_secs: u64,
}

#[derive(Debug, Deserialize, Clone)]
pub struct TimeseriesSettings {
    #[serde(default = "default_concurrency")]
    pub concurrency: usize,
}

#[derive(Debug, Deserialize, Clone, Default)]
pub struct DateSettings {
    #[serde(default)]
    pub end_bound: EndBound,
}

fn default_bind() -> String {
    "0.0.0.0:8000".to_string()
}

fn default_base_url() -> String {
    "https://earthengine.googleapis.com".to_string()
}

fn default_timeout_secs() -> u64 {
    60
}

fn default_concurrency() -> usize {
    4
}

impl Default for ServerSettings {
    fn default() -> Self {
        Self {
            bind: default_bind(),
        }
    }
}

impl Default for EarthEngineSettings {
    fn default() -> Self {
        Self {
            base_url: default_base_url(),
            project: None,
            request_timeout_secs: default_timeout_secs(),
        }
    }
}

impl Default for TimeseriesSettings {
    fn default() -> Self {
        Self {
            concurrency: default_concurrency(),
        }
    }
}

/// Load `config/server.toml` (optional), overridden by `LSTNDVI_*` variables,
/// e.g. `LSTNDVI_SERVER__BIND=127.0.0.1:9000`.
pub fn load_app_config() -> anyhow::Result<AppConfig> {
    let settings = config::Config::builder()
        .add_source(config::File::with_name("config/server").required(false))
        .add_source(
            config::Environment::with_prefix(ENV_PREFIX)
                .prefix_separator("_")
                .separator("__"),
        )
        .build()?;

    Ok(settings.try_deserialize()?)
}

/// Read the credential blob. Absence is fatal at startup.
pub fn read_credential_blob() -> anyhow::Result<String> {
    std::env::var(CREDENTIAL_VAR)
        .ok()
        .filter(|blob| !blob.trim().is_empty())
        .with_context(|| format!("Environment variable {} is not set", CREDENTIAL_VAR))
}
