pub mod serve;

// re-export
pub use serve::serve;

use std::{net::SocketAddr, sync::Arc};

use derive_more::Deref;
use tokio::net::TcpListener;
use tracing::info;

use crate::{
    config::{AppConfig, ResendConfig},
    email_client::SignupGateway,
    templ_manager::{TemplateManager, WelcomeEmail},
    EmailClient, Result,
};

// ###################################
// ->  Structs
// ###################################
pub struct App {
    pub app_state: AppState,
    pub listener: TcpListener,
}
impl App {
    pub fn new(app_state: AppState, listener: TcpListener) -> Self {
        App {
            app_state,
            listener,
        }
    }

    pub async fn build_from_config(config: AppConfig) -> Result<Self> {
        let email_client = EmailClient::from_config(&config.resend_config)?;
        let welcome_email = TemplateManager::init()?.render_welcome_email()?;

        if let Err(er) = config.resend_config.credentials() {
            tracing::warn!("{:<20} - {er}, signups will fail", "Resend config:");
        }

        let app_state = AppState::new(
            Arc::new(email_client),
            config.resend_config,
            welcome_email,
        );

        let addr = SocketAddr::from((config.net_config.host, config.net_config.app_port));
        let listener = TcpListener::bind(addr).await?;
        let addr = listener.local_addr()?;
        info!("{:<20} - {}", "Listening on:", addr);

        let app = App::new(app_state, listener);
        Ok(app)
    }
}

pub struct InternalState {
    pub gateway: Arc<dyn SignupGateway>,
    pub resend_config: ResendConfig,
    pub welcome_email: WelcomeEmail,
}

/// Application state containing all global data.
/// It implements `Deref` to easily access the fields on `InternalState`
/// Uses an `Arc` so it can be cloned around.
#[derive(Clone, Deref)]
pub struct AppState(Arc<InternalState>);

impl AppState {
    pub fn new(
        gateway: Arc<dyn SignupGateway>,
        resend_config: ResendConfig,
        welcome_email: WelcomeEmail,
    ) -> Self {
        AppState(Arc::new(InternalState {
            gateway,
            resend_config,
            welcome_email,
        }))
    }
}
