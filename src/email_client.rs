use async_trait::async_trait;
use reqwest::{Client, Response};
use secrecy::ExposeSecret;
use serde::Serialize;
use serde_json::Value;

use crate::{
    config::{ResendConfig, ResendCredentials},
    templ_manager::WelcomeEmail,
    web::types::ValidEmail,
};

const AUDIENCE_FAILURE_FALLBACK: &str = "Failed to add to audience";
const EMAIL_FAILURE_FALLBACK: &str = "Unknown Resend error";

// ###################################
// ->   OUTCOMES
// ###################################
/// Result of adding an email to the audience.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ContactOutcome {
    Registered,
    /// The provider answered with a conflict, the contact was already there.
    AlreadyRegistered,
    Failed(String),
}

/// Result of dispatching the welcome email.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum EmailOutcome {
    Sent,
    Failed(String),
}

/// The two provider calls a signup needs.
///
/// Only reachable with resolved `ResendCredentials`, so an incomplete configuration can
/// never produce a remote call. `Err` is reserved for transport failures, every HTTP
/// answer gets classified into an outcome.
#[async_trait]
pub trait SignupGateway: Send + Sync {
    async fn register_contact(
        &self,
        creds: ResendCredentials<'_>,
        email: &ValidEmail,
    ) -> Result<ContactOutcome>;

    async fn send_welcome_email(
        &self,
        creds: ResendCredentials<'_>,
        email: &ValidEmail,
        welcome: &WelcomeEmail,
    ) -> Result<EmailOutcome>;
}

// ###################################
// ->   CLIENT
// ###################################
/// `SignupGateway` talking to the Resend HTTP API.
#[derive(Debug)]
pub struct EmailClient {
    pub http_client: Client,
    pub url: reqwest::Url,
}

impl EmailClient {
    pub fn new<S: AsRef<str>>(url: S, timeout: Option<std::time::Duration>) -> Result<Self> {
        let url =
            reqwest::Url::parse(url.as_ref()).map_err(|e| Error::UrlParsing(e.to_string()))?;

        let mut builder = Client::builder();
        if let Some(timeout) = timeout {
            builder = builder.timeout(timeout);
        }
        let http_client = builder.build()?;

        Ok(EmailClient { http_client, url })
    }

    pub fn from_config(config: &ResendConfig) -> Result<Self> {
        Self::new(&config.base_url, config.timeout())
    }

    /// Appends `segments` to the base url, keeping any path prefix the base url carries.
    /// Each segment is percent-encoded on its own.
    fn endpoint(&self, segments: &[&str]) -> Result<reqwest::Url> {
        let mut url = self.url.clone();
        url.path_segments_mut()
            .map_err(|_| Error::UrlParsing(format!("{} cannot be a base url", self.url)))?
            .pop_if_empty()
            .extend(segments);
        Ok(url)
    }
}

#[async_trait]
impl SignupGateway for EmailClient {
    #[tracing::instrument(name = "Adding contact to the audience", skip_all)]
    async fn register_contact(
        &self,
        creds: ResendCredentials<'_>,
        email: &ValidEmail,
    ) -> Result<ContactOutcome> {
        let url = self.endpoint(&["audiences", creds.audience_id, "contacts"])?;

        let resp = self
            .http_client
            .post(url)
            .bearer_auth(creds.api_key.expose_secret())
            .json(&NewContact {
                email: email.as_ref(),
            })
            .send()
            .await?;

        let status = resp.status();
        let body = ProviderBody::read(resp).await?;

        let outcome = if status.is_success() {
            ContactOutcome::Registered
        } else if status == reqwest::StatusCode::CONFLICT {
            ContactOutcome::AlreadyRegistered
        } else {
            ContactOutcome::Failed(body.reason_or(AUDIENCE_FAILURE_FALLBACK))
        };
        tracing::debug!("{:<12} - {status} -> {outcome:?}", "AUDIENCE");

        Ok(outcome)
    }

    #[tracing::instrument(name = "Sending welcome email", skip_all)]
    async fn send_welcome_email(
        &self,
        creds: ResendCredentials<'_>,
        email: &ValidEmail,
        welcome: &WelcomeEmail,
    ) -> Result<EmailOutcome> {
        let url = self.endpoint(&["emails"])?;

        let email_content = EmailContent {
            from: creds.from_email,
            to: [email.as_ref()],
            subject: &welcome.subject,
            html: &welcome.html,
        };

        let resp = self
            .http_client
            .post(url)
            .bearer_auth(creds.api_key.expose_secret())
            .json(&email_content)
            .send()
            .await?;

        let status = resp.status();
        let body = ProviderBody::read(resp).await?;

        let outcome = if status.is_success() {
            EmailOutcome::Sent
        } else {
            EmailOutcome::Failed(body.reason_or(EMAIL_FAILURE_FALLBACK))
        };
        tracing::debug!("{:<12} - {status} -> {outcome:?}", "EMAIL");

        Ok(outcome)
    }
}

#[derive(Serialize)]
pub struct NewContact<'a> {
    pub email: &'a str,
}

#[derive(Serialize)]
pub struct EmailContent<'a> {
    pub from: &'a str,
    pub to: [&'a str; 1],
    pub subject: &'a str,
    pub html: &'a str,
}

// ###################################
// ->   PROVIDER BODY
// ###################################
/// Whatever the provider sent back. `None` when the body was empty.
#[derive(Debug, Default, Clone, PartialEq, Eq)]
pub struct ProviderBody {
    pub id: Option<String>,
    pub name: Option<String>,
    pub message: Option<String>,
}

impl ProviderBody {
    async fn read(resp: Response) -> Result<Option<Self>> {
        let raw = resp.text().await?;
        Ok(Self::parse(&raw))
    }

    /// Never fails: JSON objects give their string fields, other JSON gives an empty body
    /// and anything that isn't JSON becomes the `message`.
    pub fn parse(raw: &str) -> Option<Self> {
        if raw.is_empty() {
            return None;
        }

        let body = match serde_json::from_str::<Value>(raw) {
            Ok(value) => {
                let field =
                    |name: &str| value.get(name).and_then(Value::as_str).map(str::to_owned);
                ProviderBody {
                    id: field("id"),
                    name: field("name"),
                    message: field("message"),
                }
            }
            Err(_) => ProviderBody {
                message: Some(raw.to_owned()),
                ..Default::default()
            },
        };

        Some(body)
    }
}

trait ReasonOr {
    fn reason_or(self, fallback: &str) -> String;
}

impl ReasonOr for Option<ProviderBody> {
    fn reason_or(self, fallback: &str) -> String {
        self.and_then(|body| body.message)
            .filter(|message| !message.is_empty())
            .unwrap_or_else(|| fallback.to_owned())
    }
}

// ###################################
// ->   ERROR & RESULT
// ###################################
pub type Result<T> = core::result::Result<T, Error>;

#[derive(Debug, thiserror::Error)]
pub enum Error {
    #[error("url parsing error: {0}")]
    UrlParsing(String),
    #[error("reqwest error: {0}")]
    Reqwest(#[from] reqwest::Error),
}
