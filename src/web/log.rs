use axum::http::{HeaderMap, Method, StatusCode, Uri};
use serde::Serialize;
use serde_json::{json, Value};
use serde_with::skip_serializing_none;
use tracing::{debug, info};

use super::error::ClientError;
use crate::web::{types::SignupRequest, Error};

/// Geolocation hint set by the CDN in front of the service.
pub const COUNTRY_HEADER: &str = "cf-ipcountry";

pub fn log_request(
    req_id: Option<String>,
    req_method: Method,
    uri: Uri,
    status_code: StatusCode,
    web_error: Option<&Error>,
    client_status_and_error: Option<(StatusCode, ClientError)>,
) {
    let timestamp = chrono::Utc::now().to_rfc3339();
    let req_method = req_method.to_string();
    let uri = uri.to_string();
    let client_error_type = client_status_and_error
        .as_ref()
        .map(|(_, ce)| ce.as_ref().to_string());
    let status_code = client_status_and_error
        .map(|(sc, _)| sc.as_u16())
        .unwrap_or(status_code.as_u16());
    let web_error_type = web_error.map(|we| we.as_ref().to_string());
    let web_error_data = web_error.map(|we| we.to_string());

    let logline = LogLine {
        timestamp,
        req_id,
        req_method,
        uri,
        status_code,
        client_error_type,
        web_error_type,
        web_error_data,
    };

    debug!("LOGLINE: {}", json!(logline));
}

#[skip_serializing_none]
#[derive(Serialize)]
struct LogLine {
    timestamp: String,
    req_id: Option<String>,

    req_method: String,
    uri: String,
    status_code: u16,

    client_error_type: Option<String>,
    web_error_type: Option<String>,
    web_error_data: Option<String>,
}

/// Emits the one record kept for every accepted signup.
pub fn log_signup(signup: &SignupRequest, headers: &HeaderMap) {
    info!("WAITLIST SIGNUP: {}", signup_logline(signup, headers));
}

/// Builds the signup record: normalized email, present attribution fields only,
/// timestamp, user agent and country.
pub fn signup_logline(signup: &SignupRequest, headers: &HeaderMap) -> Value {
    let header = |name: &str| {
        headers
            .get(name)
            .and_then(|v| v.to_str().ok())
            .map(str::to_owned)
    };

    let logline = SignupLogLine {
        email: signup.email.as_ref(),
        attribution: &signup.attribution,
        timestamp: chrono::Utc::now().to_rfc3339(),
        user_agent: header("user-agent"),
        country: header(COUNTRY_HEADER),
    };

    json!(logline)
}

#[skip_serializing_none]
#[derive(Serialize)]
struct SignupLogLine<'a> {
    email: &'a str,
    #[serde(flatten)]
    attribution: &'a super::types::Attribution,
    timestamp: String,
    user_agent: Option<String>,
    country: Option<String>,
}
