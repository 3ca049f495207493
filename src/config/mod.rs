//! Tries to create an `AppConfig` from config files and the environment.
//! Uses `figment` to layer `config/base.toml`, `config/<environment>.toml` and environment variables.
//! Gets initialized with `OnceLock` so it only needs to get initialized once.

mod error;
mod types;

use std::{path::Path, sync::OnceLock};

use figment::{
    providers::{Env, Format, Toml},
    Figment,
};
use tracing::info;

// Re-export config structs
pub use error::{ConfigError, ConfigResult};
pub use types::{
    AppConfig, Environment, NetConfig, ResendConfig, ResendCredentials, DEFAULT_RESEND_URL,
};

/// Environment variables the hosting platform injects for the mailing provider.
const RESEND_ENV_VARS: [&str; 3] = ["RESEND_API_KEY", "RESEND_AUDIENCE_ID", "RESEND_FROM_EMAIL"];

/// Allocates a static `OnceLock` containing `AppConfig`.
/// This ensures configuration only gets initialized the first time we call this function.
/// Every other caller gets a &'static ref to AppConfig.
/// Panics if anything goes wrong.
pub fn get_or_init_config() -> &'static AppConfig {
    static CONFIG_INIT: OnceLock<AppConfig> = OnceLock::new();
    CONFIG_INIT.get_or_init(|| {
        info!(
            "{:<12} - Initializing the configuration",
            "get_or_init_config"
        );
        let base_path = std::env::current_dir().expect("Failed to determine the current DIR.");
        let config_dir = base_path.join("config");

        let environment: Environment = std::env::var("APP_ENVIRONMENT")
            .unwrap_or_else(|_| "local".into())
            .try_into()
            .expect("Failed to parse APP_ENVIRONMENT.");

        AppConfig::load(&config_dir, environment)
            .unwrap_or_else(|er| panic!("Fatal Error: Building config: {er}"))
    })
}

impl AppConfig {
    /// Builds the configuration in this order, later sources win:
    /// `base.toml`, `<environment>.toml`, `APP_`-prefixed variables (`__` nests),
    /// and finally the plain `RESEND_*` variables.
    pub fn load(config_dir: &Path, environment: Environment) -> ConfigResult<Self> {
        let environment_filename = format!("{}.toml", environment.as_ref().to_lowercase());

        let config = Figment::new()
            .merge(Toml::file(config_dir.join("base.toml")))
            .merge(Toml::file(config_dir.join(environment_filename)))
            .merge(Env::prefixed("APP_").split("__"))
            .merge(resend_env())
            .extract()?;

        Ok(config)
    }
}

fn resend_env() -> Env {
    Env::raw().only(&RESEND_ENV_VARS).map(|key| {
        if key == "RESEND_API_KEY" {
            "resend_config.api_key".into()
        } else if key == "RESEND_AUDIENCE_ID" {
            "resend_config.audience_id".into()
        } else {
            "resend_config.from_email".into()
        }
    })
}
