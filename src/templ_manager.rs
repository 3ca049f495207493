use chrono::{Datelike, Utc};
use tera::{Context, Tera};
use tracing::info;

pub const WELCOME_SUBJECT: &str = "Thanks for joining the Byeori waitlist";
const WELCOME_TEMPLATE: &str = "welcome_email.html";

/// The rendered welcome email, shared by every signup.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct WelcomeEmail {
    pub subject: String,
    pub html: String,
}

#[derive(Debug)]
pub struct TemplateManager {
    tera: Tera,
}

impl TemplateManager {
    /// Templates are compiled into the binary, so this only fails on a broken template.
    pub fn init() -> Result<Self, tera::Error> {
        info!(
            "{:<20} - Initializing the Template manager",
            "templ manager"
        );
        let mut tera = Tera::default();
        tera.add_raw_template(
            WELCOME_TEMPLATE,
            include_str!("../templates/welcome_email.html"),
        )?;

        Ok(Self { tera })
    }

    pub fn render_welcome_email(&self) -> Result<WelcomeEmail, tera::Error> {
        let mut ctx = Context::new();
        ctx.insert("current_year", &Utc::now().year());

        let html = self.tera.render(WELCOME_TEMPLATE, &ctx)?;

        Ok(WelcomeEmail {
            subject: WELCOME_SUBJECT.to_string(),
            html,
        })
    }
}
