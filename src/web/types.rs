//! Most of the structs in `web` module and their implementations live here.
//! Includes the signup payload, its validation and sanitization, and tests for those.

use serde::Serialize;
use serde_json::Value;
use serde_with::skip_serializing_none;

/// Max length of short attribution identifiers (`source`, `persona`, `utm_*`).
pub const SHORT_FIELD_MAX_LEN: usize = 120;
pub const PATH_MAX_LEN: usize = 240;
pub const REFERRER_MAX_LEN: usize = 400;

// ###################################
// ->   STRUCTS
// ###################################
/// Validated waitlist signup.
#[derive(Debug, Clone)]
pub struct SignupRequest {
    pub email: ValidEmail,
    pub attribution: Attribution,
}

impl SignupRequest {
    /// Extracts the signup from any JSON value. Only the email can make this fail.
    pub fn parse(body: &Value) -> Result<Self, DataParsingError> {
        let email = body
            .get("email")
            .and_then(Value::as_str)
            .ok_or(DataParsingError::EmailMissing)?;

        Ok(SignupRequest {
            email: ValidEmail::parse(email)?,
            attribution: Attribution::sanitize(body),
        })
    }
}

/// Trimmed and lower-cased email address.
///
/// The only requirement is an `@` somewhere in the value. This is intentionally permissive,
/// anything stricter changes which signups get accepted.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ValidEmail(String);

impl AsRef<str> for ValidEmail {
    fn as_ref(&self) -> &str {
        &self.0
    }
}

impl ValidEmail {
    pub fn parse<S>(value: S) -> Result<Self, DataParsingError>
    where
        S: AsRef<str>,
    {
        let value = value.as_ref();

        if !value.contains('@') {
            return Err(DataParsingError::EmailInvalid);
        }

        Ok(ValidEmail(value.trim().to_lowercase()))
    }
}

/// Optional marketing attribution sent along with the signup.
/// A field is either absent or a non-empty string no longer than its max length.
#[skip_serializing_none]
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct Attribution {
    pub source: Option<String>,
    pub persona: Option<String>,
    pub path: Option<String>,
    pub referrer: Option<String>,
    pub utm_source: Option<String>,
    pub utm_medium: Option<String>,
    pub utm_campaign: Option<String>,
    pub utm_term: Option<String>,
    pub utm_content: Option<String>,
}

impl Attribution {
    pub fn sanitize(body: &Value) -> Self {
        let field = |name: &str, max_len: usize| sanitize_text(body.get(name), max_len);

        Attribution {
            source: field("source", SHORT_FIELD_MAX_LEN),
            persona: field("persona", SHORT_FIELD_MAX_LEN),
            path: field("path", PATH_MAX_LEN),
            referrer: field("referrer", REFERRER_MAX_LEN),
            utm_source: field("utm_source", SHORT_FIELD_MAX_LEN),
            utm_medium: field("utm_medium", SHORT_FIELD_MAX_LEN),
            utm_campaign: field("utm_campaign", SHORT_FIELD_MAX_LEN),
            utm_term: field("utm_term", SHORT_FIELD_MAX_LEN),
            utm_content: field("utm_content", SHORT_FIELD_MAX_LEN),
        }
    }
}

/// Trims a string value and cuts it down to `max_len` characters.
/// Anything that isn't a non-blank string is dropped.
fn sanitize_text(value: Option<&Value>, max_len: usize) -> Option<String> {
    let cleaned = value?.as_str()?.trim();
    if cleaned.is_empty() {
        return None;
    }

    Some(cleaned.chars().take(max_len).collect())
}

// ###################################
// ->   ERROR
// ###################################
#[derive(Debug, thiserror::Error)]
pub enum DataParsingError {
    #[error("email missing or not a string")]
    EmailMissing,
    #[error("email invalid")]
    EmailInvalid,
}
