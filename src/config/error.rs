pub type ConfigResult<T> = core::result::Result<T, ConfigError>;

#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("failed to build the 'Enviroment' from the provided string.")]
    StringToEnvironmentFail,
    #[error("missing resend setting: '{0}'")]
    MissingResendSetting(&'static str),

    #[error("figment error: {0}")]
    Figment(#[from] figment::Error),
}
