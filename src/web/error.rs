use std::sync::Arc;

use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
};
use strum_macros::AsRefStr;

use crate::{config::ConfigError, utils::error_chain_fmt, web::types::DataParsingError};

pub type WebResult<T> = core::result::Result<T, Error>;

/// Everything that can go wrong while handling a signup.
/// Only `ClientError` messages ever reach the caller, the variants' data is for the logs.
#[derive(AsRefStr, thiserror::Error)]
pub enum Error {
    #[error("invalid signup input")]
    Validation(#[from] DataParsingError),
    #[error("signup configuration is incomplete")]
    Configuration(#[from] ConfigError),
    #[error("audience registration failed: {0}")]
    UpstreamRegistration(String),
    #[error("welcome email failed: {0}")]
    UpstreamEmail(String),
    #[error("unexpected error")]
    Unexpected(#[from] anyhow::Error),
}

impl std::fmt::Debug for Error {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        error_chain_fmt(self, f)
    }
}

impl From<crate::email_client::Error> for Error {
    fn from(value: crate::email_client::Error) -> Self {
        Self::Unexpected(value.into())
    }
}

impl Error {
    pub fn status_code_and_client_error(&self) -> (StatusCode, ClientError) {
        use ClientError::*;

        match self {
            Error::Validation(_) => (StatusCode::BAD_REQUEST, InvalidEmail),
            Error::UpstreamEmail(_) => (StatusCode::BAD_GATEWAY, WelcomeEmailFailed),
            Error::Configuration(_) | Error::UpstreamRegistration(_) | Error::Unexpected(_) => {
                (StatusCode::INTERNAL_SERVER_ERROR, ServiceError)
            }
        }
    }
}

impl IntoResponse for Error {
    fn into_response(self) -> Response {
        tracing::debug!("{:<12} - into_response(Error: {self:?})", "INTO_RESP");

        // Construct a response
        let mut res = StatusCode::INTERNAL_SERVER_ERROR.into_response();

        // Insert the Error into response so that it can be retrieved later.
        res.extensions_mut().insert(Arc::new(self));

        res
    }
}

/// The fixed messages a caller gets to see.
#[derive(Debug, Clone, Copy, PartialEq, Eq, AsRefStr, derive_more::Display)]
pub enum ClientError {
    #[display("Please enter a valid email address.")]
    InvalidEmail,
    #[display("Unable to send welcome email. Please try again.")]
    WelcomeEmailFailed,
    #[display("Something went wrong. Please try again.")]
    ServiceError,
}
