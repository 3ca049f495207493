//! The configuration structs used to build the AppConfig, and their impls.
use secrecy::{ExposeSecret, SecretString};
use serde::{Deserialize, Deserializer};
use strum_macros::AsRefStr;

use crate::config::{ConfigError, ConfigResult};

pub const DEFAULT_RESEND_URL: &str = "https://api.resend.com";

// ###################################
// ->   STRUCTS
// ###################################
#[derive(Debug, Clone, Copy, PartialEq, Eq, AsRefStr)]
pub enum Environment {
    Local,
    Production,
}

#[derive(Deserialize, Clone, Debug)]
pub struct AppConfig {
    pub net_config: NetConfig,
    #[serde(default)]
    pub resend_config: ResendConfig,
}

#[derive(Deserialize, Clone, Debug, PartialEq, Eq)]
pub struct NetConfig {
    pub host: [u8; 4],
    pub app_port: u16,
}

/// Settings of the mailing provider.
///
/// The three values the signup flow needs (`api_key`, `audience_id` and `from_email`) are
/// optional here so that a half-configured deployment still boots. They get resolved per
/// request through [`ResendConfig::credentials`].
#[derive(Deserialize, Clone, Debug)]
pub struct ResendConfig {
    #[serde(default = "default_resend_url")]
    pub base_url: String,
    #[serde(default, deserialize_with = "deserialize_opaque_secret")]
    pub api_key: Option<SecretString>,
    #[serde(default, deserialize_with = "deserialize_opaque_string")]
    pub audience_id: Option<String>,
    #[serde(default, deserialize_with = "deserialize_opaque_string")]
    pub from_email: Option<String>,
    /// No timeout unless set.
    #[serde(default)]
    pub timeout_millis: Option<u64>,
}

/// Resolved provider settings. Every field is guaranteed to be non-blank.
#[derive(Debug, Clone, Copy)]
pub struct ResendCredentials<'a> {
    pub api_key: &'a SecretString,
    pub audience_id: &'a str,
    pub from_email: &'a str,
}

// ###################################
// ->   IMPLs
// ###################################
fn default_resend_url() -> String {
    DEFAULT_RESEND_URL.to_string()
}

/// Environment providers hand numeric looking values over as numbers.
/// The provider settings are opaque text, so those are taken back as their literal form.
fn deserialize_opaque_string<'de, D>(deserializer: D) -> Result<Option<String>, D::Error>
where
    D: Deserializer<'de>,
{
    #[derive(Deserialize)]
    #[serde(untagged)]
    enum Opaque {
        Text(String),
        Number(serde_json::Number),
        Flag(bool),
    }

    let value = Option::<Opaque>::deserialize(deserializer)?.map(|value| match value {
        Opaque::Text(text) => text,
        Opaque::Number(number) => number.to_string(),
        Opaque::Flag(flag) => flag.to_string(),
    });
    Ok(value)
}

fn deserialize_opaque_secret<'de, D>(deserializer: D) -> Result<Option<SecretString>, D::Error>
where
    D: Deserializer<'de>,
{
    Ok(deserialize_opaque_string(deserializer)?.map(SecretString::from))
}

impl Default for ResendConfig {
    fn default() -> Self {
        Self {
            base_url: default_resend_url(),
            api_key: None,
            audience_id: None,
            from_email: None,
            timeout_millis: None,
        }
    }
}

impl ResendConfig {
    /// Checks that every required setting is present and non-blank.
    /// The sender address is trimmed, the rest is used as is.
    pub fn credentials(&self) -> ConfigResult<ResendCredentials<'_>> {
        let api_key = self
            .api_key
            .as_ref()
            .filter(|key| !key.expose_secret().trim().is_empty())
            .ok_or(ConfigError::MissingResendSetting("api_key"))?;
        let audience_id = self
            .audience_id
            .as_deref()
            .filter(|id| !id.trim().is_empty())
            .ok_or(ConfigError::MissingResendSetting("audience_id"))?;
        let from_email = self
            .from_email
            .as_deref()
            .map(str::trim)
            .filter(|from| !from.is_empty())
            .ok_or(ConfigError::MissingResendSetting("from_email"))?;

        Ok(ResendCredentials {
            api_key,
            audience_id,
            from_email,
        })
    }

    pub fn timeout(&self) -> Option<std::time::Duration> {
        self.timeout_millis.map(std::time::Duration::from_millis)
    }
}

// ###################################
// ->   TRY FROMs
// ###################################

impl TryFrom<String> for Environment {
    type Error = ConfigError;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        match value.to_ascii_lowercase().as_str() {
            "local" => Ok(Self::Local),
            "production" => Ok(Self::Production),
            _ => Err(Self::Error::StringToEnvironmentFail),
        }
    }
}

// ###################################
// ->   TESTS
// ###################################
