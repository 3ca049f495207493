use std::sync::Arc;

use anyhow::Result;
use async_trait::async_trait;
use reqwest::StatusCode;
use serde_json::{json, Value};
use waitlist::{
    app::serve::MAX_BODY_BYTES,
    config::{ResendConfig, ResendCredentials},
    email_client::{self, ContactOutcome, EmailOutcome, SignupGateway},
    templ_manager::WelcomeEmail,
    web::types::ValidEmail,
    AppState,
};
use wiremock::{
    matchers::{any, body_json, header, method, path},
    Mock, ResponseTemplate,
};

use crate::helpers::{
    assert_cors_headers, TestApp, TEST_API_KEY, TEST_AUDIENCE_ID, TEST_FROM_EMAIL,
};

const CONTACTS_PATH: &str = "/audiences/aud_test/contacts";
const EMAILS_PATH: &str = "/emails";
const GENERIC_ERROR: &str = "Something went wrong. Please try again.";

async fn mount_contacts(app: &TestApp, template: ResponseTemplate, expect: u64) {
    Mock::given(path(CONTACTS_PATH))
        .and(method("POST"))
        .respond_with(template)
        .expect(expect)
        .mount(&app.email_server)
        .await;
}

async fn mount_emails(app: &TestApp, template: ResponseTemplate, expect: u64) {
    Mock::given(path(EMAILS_PATH))
        .and(method("POST"))
        .respond_with(template)
        .expect(expect)
        .mount(&app.email_server)
        .await;
}

fn ok_json(id: &str) -> ResponseTemplate {
    ResponseTemplate::new(200).set_body_json(json!({ "id": id }))
}

#[tokio::test]
async fn signup_ok_when_audience_and_email_succeed() -> Result<()> {
    let app = TestApp::spawn().await?;

    Mock::given(path(CONTACTS_PATH))
        .and(method("POST"))
        .and(header(
            "Authorization",
            format!("Bearer {TEST_API_KEY}").as_str(),
        ))
        .and(body_json(json!({ "email": "test@example.com" })))
        .respond_with(ok_json("contact_1"))
        .expect(1)
        .mount(&app.email_server)
        .await;
    mount_emails(&app, ok_json("email_1"), 1).await;

    let res = app.post_signup(&json!({ "email": "test@example.com" })).await?;

    assert_eq!(res.status(), StatusCode::OK);
    assert_cors_headers(&res);
    let body: Value = res.json().await?;
    assert_eq!(body, json!({ "success": true, "alreadyOnWaitlist": false }));

    let requests = app
        .email_server
        .received_requests()
        .await
        .unwrap_or_default();
    assert_eq!(requests.len(), 2);

    let email_body: Value = serde_json::from_slice(&requests[1].body)?;
    assert_eq!(email_body["from"], TEST_FROM_EMAIL);
    assert_eq!(email_body["to"], json!(["test@example.com"]));
    assert_eq!(email_body["subject"], "Thanks for joining the Byeori waitlist");
    assert!(email_body["html"]
        .as_str()
        .is_some_and(|html| html.contains("Thanks for joining the waitlist.")));

    Ok(())
}

#[tokio::test]
async fn signup_duplicate_ok_only_if_welcome_email_succeeds() -> Result<()> {
    let app = TestApp::spawn().await?;

    mount_contacts(
        &app,
        ResponseTemplate::new(409).set_body_json(json!({ "message": "Contact already exists" })),
        1,
    )
    .await;
    mount_emails(&app, ok_json("email_2"), 1).await;

    let res = app.post_signup(&json!({ "email": "dup@example.com" })).await?;

    assert_eq!(res.status(), StatusCode::OK);
    let body: Value = res.json().await?;
    assert_eq!(body["success"], true);
    assert_eq!(body["alreadyOnWaitlist"], true);

    Ok(())
}

#[tokio::test]
async fn signup_502_when_welcome_email_fails() -> Result<()> {
    let cases = [
        ResponseTemplate::new(503).set_body_json(json!({ "message": "Email provider unavailable" })),
        ResponseTemplate::new(500).set_body_string("not json at all"),
        ResponseTemplate::new(422),
    ];

    for template in cases {
        let app = TestApp::spawn().await?;
        mount_contacts(&app, ok_json("contact_2"), 1).await;
        mount_emails(&app, template, 1).await;

        let res = app
            .post_signup(&json!({ "email": "mailfail@example.com" }))
            .await?;

        assert_eq!(res.status(), StatusCode::BAD_GATEWAY);
        assert_cors_headers(&res);
        let body: Value = res.json().await?;
        assert_eq!(
            body,
            json!({ "error": "Unable to send welcome email. Please try again." })
        );
    }

    Ok(())
}

#[tokio::test]
async fn signup_500_when_audience_registration_fails() -> Result<()> {
    let app = TestApp::spawn().await?;

    mount_contacts(
        &app,
        ResponseTemplate::new(500).set_body_json(json!({ "message": "Internal error" })),
        1,
    )
    .await;
    mount_emails(&app, ok_json("never"), 0).await;

    let res = app
        .post_signup(&json!({ "email": "audfail@example.com" }))
        .await?;

    assert_eq!(res.status(), StatusCode::INTERNAL_SERVER_ERROR);
    let body: Value = res.json().await?;
    assert_eq!(body, json!({ "error": GENERIC_ERROR }));

    Ok(())
}

#[tokio::test]
async fn signup_handles_non_json_error_payloads_safely() -> Result<()> {
    let app = TestApp::spawn().await?;

    mount_contacts(
        &app,
        ResponseTemplate::new(502).set_body_string("upstream timeout"),
        1,
    )
    .await;
    mount_emails(&app, ok_json("never"), 0).await;

    let res = app.post_signup(&json!({ "email": "plain@example.com" })).await?;

    assert_eq!(res.status(), StatusCode::INTERNAL_SERVER_ERROR);
    let body: Value = res.json().await?;
    assert_eq!(body["error"], GENERIC_ERROR);

    Ok(())
}

#[tokio::test]
async fn signup_400_for_invalid_email_before_calling_provider() -> Result<()> {
    let app = TestApp::spawn().await?;

    Mock::given(any())
        .respond_with(ResponseTemplate::new(200))
        .expect(0)
        .mount(&app.email_server)
        .await;

    let cases = [
        (json!({ "email": "invalid-email" }), "Missing @"),
        (json!({ "email": "" }), "Empty email"),
        (json!({ "email": 42 }), "Non textual email"),
        (json!({ "email": null }), "Null email"),
        (json!({ "source": "hero" }), "Missing email"),
        (json!([]), "Not an object"),
    ];

    for (body, description) in cases {
        let res = app.post_signup(&body).await?;
        assert_eq!(
            res.status(),
            StatusCode::BAD_REQUEST,
            "The API did not return a 400 BAD REQUEST, the payload was: {description}."
        );
        assert_cors_headers(&res);
        let body: Value = res.json().await?;
        assert_eq!(body, json!({ "error": "Please enter a valid email address." }));
    }

    Ok(())
}

#[tokio::test]
async fn signup_500_when_required_config_is_missing() -> Result<()> {
    let customizations: [fn(&mut ResendConfig); 3] = [
        |config| config.from_email = Some("   ".to_string()),
        |config| config.api_key = None,
        |config| config.audience_id = Some(String::new()),
    ];

    for customize in customizations {
        let app = TestApp::spawn_with(|config| customize(&mut config.resend_config)).await?;

        Mock::given(any())
            .respond_with(ResponseTemplate::new(200))
            .expect(0)
            .mount(&app.email_server)
            .await;

        let res = app.post_signup(&json!({ "email": "test@example.com" })).await?;

        assert_eq!(res.status(), StatusCode::INTERNAL_SERVER_ERROR);
        let body: Value = res.json().await?;
        assert_eq!(body, json!({ "error": GENERIC_ERROR }));
    }

    Ok(())
}

#[tokio::test]
async fn signup_500_for_malformed_json_body() -> Result<()> {
    let app = TestApp::spawn().await?;

    Mock::given(any())
        .respond_with(ResponseTemplate::new(200))
        .expect(0)
        .mount(&app.email_server)
        .await;

    let res = app.post_signup_raw("{\"email\": ").await?;

    assert_eq!(res.status(), StatusCode::INTERNAL_SERVER_ERROR);
    assert_cors_headers(&res);
    let body: Value = res.json().await?;
    assert_eq!(body, json!({ "error": GENERIC_ERROR }));

    Ok(())
}

#[tokio::test]
async fn signup_500_for_oversized_body() -> Result<()> {
    let app = TestApp::spawn().await?;

    Mock::given(any())
        .respond_with(ResponseTemplate::new(200))
        .expect(0)
        .mount(&app.email_server)
        .await;

    let body = json!({
        "email": "big@example.com",
        "referrer": "x".repeat(MAX_BODY_BYTES + 1),
    });
    let res = app.post_signup(&body).await?;

    assert_eq!(res.status(), StatusCode::INTERNAL_SERVER_ERROR);
    assert_cors_headers(&res);
    let body: Value = res.json().await?;
    assert_eq!(body, json!({ "error": GENERIC_ERROR }));

    Ok(())
}

#[tokio::test]
async fn signup_normalizes_email_and_accepts_attribution() -> Result<()> {
    let app = TestApp::spawn().await?;

    Mock::given(path(format!("/audiences/{TEST_AUDIENCE_ID}/contacts")))
        .and(body_json(json!({ "email": "ursula@example.com" })))
        .respond_with(ok_json("contact_3"))
        .expect(1)
        .mount(&app.email_server)
        .await;
    mount_emails(&app, ok_json("email_3"), 1).await;

    let res = app
        .post_signup(&json!({
            "email": "  Ursula@Example.COM ",
            "source": "hero",
            "persona": "x".repeat(1_000),
            "path": "/pricing",
            "referrer": 7,
            "utm_campaign": "   ",
        }))
        .await?;

    assert_eq!(res.status(), StatusCode::OK);

    Ok(())
}

#[tokio::test]
async fn signup_twice_sends_two_emails() -> Result<()> {
    let app = TestApp::spawn().await?;

    Mock::given(path(CONTACTS_PATH))
        .respond_with(ok_json("contact_4"))
        .up_to_n_times(1)
        .expect(1)
        .mount(&app.email_server)
        .await;
    mount_contacts(
        &app,
        ResponseTemplate::new(409).set_body_json(json!({ "message": "Contact already exists" })),
        1,
    )
    .await;
    mount_emails(&app, ok_json("email_4"), 2).await;

    let body = json!({ "email": "twice@example.com" });

    let first: Value = app.post_signup(&body).await?.json().await?;
    let second: Value = app.post_signup(&body).await?.json().await?;

    assert_eq!(first, json!({ "success": true, "alreadyOnWaitlist": false }));
    assert_eq!(second, json!({ "success": true, "alreadyOnWaitlist": true }));

    Ok(())
}

#[tokio::test]
async fn signup_preflight_returns_cors_headers_without_body() -> Result<()> {
    let app = TestApp::spawn().await?;

    let res = app
        .http_client
        .request(reqwest::Method::OPTIONS, app.signup_url())
        .header("Origin", "https://byeori.example")
        .header("Access-Control-Request-Method", "POST")
        .send()
        .await?;

    assert_eq!(res.status(), StatusCode::NO_CONTENT);
    assert_cors_headers(&res);
    assert!(res.bytes().await?.is_empty());

    Ok(())
}

/// Gateway that blows up, standing in for any failure nobody planned for.
struct PanickingGateway;

#[async_trait]
impl SignupGateway for PanickingGateway {
    async fn register_contact(
        &self,
        _creds: ResendCredentials<'_>,
        _email: &ValidEmail,
    ) -> email_client::Result<ContactOutcome> {
        panic!("gateway exploded");
    }

    async fn send_welcome_email(
        &self,
        _creds: ResendCredentials<'_>,
        _email: &ValidEmail,
        _welcome: &WelcomeEmail,
    ) -> email_client::Result<EmailOutcome> {
        panic!("gateway exploded");
    }
}

#[tokio::test]
async fn signup_panic_is_answered_with_generic_500() -> Result<()> {
    let resend_config = ResendConfig {
        api_key: Some(secrecy::SecretString::from(TEST_API_KEY.to_string())),
        audience_id: Some(TEST_AUDIENCE_ID.to_string()),
        from_email: Some(TEST_FROM_EMAIL.to_string()),
        ..Default::default()
    };
    let welcome = WelcomeEmail {
        subject: "Welcome".to_string(),
        html: "<p>Hi</p>".to_string(),
    };
    let app_state = AppState::new(Arc::new(PanickingGateway), resend_config, welcome);
    let addr = TestApp::spawn_with_state(app_state).await?;

    let res = reqwest::Client::new()
        .post(format!("http://{addr}/api/waitlist-signup"))
        .json(&json!({ "email": "boom@example.com" }))
        .send()
        .await?;

    assert_eq!(res.status(), StatusCode::INTERNAL_SERVER_ERROR);
    assert_cors_headers(&res);
    let body: Value = res.json().await?;
    assert_eq!(body, json!({ "error": GENERIC_ERROR }));

    Ok(())
}
