use anyhow::Context;
use axum::{
    body::Bytes,
    extract::{rejection::BytesRejection, State},
    http::{HeaderMap, StatusCode},
    Json,
};
use serde::Serialize;
use serde_json::Value;
use tracing::info;

use crate::{
    config::ResendCredentials,
    email_client::{ContactOutcome, EmailOutcome, SignupGateway},
    templ_manager::WelcomeEmail,
    web::{
        log,
        types::{SignupRequest, ValidEmail},
        Error, WebResult,
    },
    AppState,
};

#[derive(Debug, Serialize, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct SignupResponse {
    pub success: bool,
    pub already_on_waitlist: bool,
}

// ###################################
// ->   API
// ###################################
/// The body is taken as raw bytes: an unreadable or oversized body and malformed JSON are
/// unexpected failures rather than extractor rejections, and a missing `Content-Type` is fine.
#[tracing::instrument(name = "Joining the waitlist", skip_all)]
pub async fn waitlist_signup(
    State(app_state): State<AppState>,
    headers: HeaderMap,
    body: Result<Bytes, BytesRejection>,
) -> WebResult<Json<SignupResponse>> {
    let body = body.context("signup: failed to read the request body")?;
    let body: Value =
        serde_json::from_slice(&body).context("signup: request body is not valid JSON")?;

    // Validation comes first, nothing leaves the process for an invalid email.
    let signup = SignupRequest::parse(&body)?;
    let creds = app_state.resend_config.credentials()?;

    log::log_signup(&signup, &headers);

    let response = register_and_welcome(
        app_state.gateway.as_ref(),
        creds,
        &signup.email,
        &app_state.welcome_email,
    )
    .await?;

    info!(
        already_on_waitlist = response.already_on_waitlist,
        "SUCCESS"
    );
    Ok(Json(response))
}

pub async fn waitlist_signup_preflight() -> StatusCode {
    StatusCode::NO_CONTENT
}

/// Adds the email to the audience and, unless that failed, sends the welcome email.
/// An already registered contact still gets the email.
pub async fn register_and_welcome(
    gateway: &dyn SignupGateway,
    creds: ResendCredentials<'_>,
    email: &ValidEmail,
    welcome: &WelcomeEmail,
) -> WebResult<SignupResponse> {
    let already_on_waitlist = match gateway.register_contact(creds, email).await? {
        ContactOutcome::Registered => false,
        ContactOutcome::AlreadyRegistered => true,
        ContactOutcome::Failed(reason) => return Err(Error::UpstreamRegistration(reason)),
    };

    match gateway.send_welcome_email(creds, email, welcome).await? {
        EmailOutcome::Sent => Ok(SignupResponse {
            success: true,
            already_on_waitlist,
        }),
        EmailOutcome::Failed(reason) => Err(Error::UpstreamEmail(reason)),
    }
}
