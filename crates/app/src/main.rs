mod error;
mod router;
mod submit;
mod telemetry;

use std::net::SocketAddr;

use reqwest::Client;
use tracing::{info, warn};
use url::Url;

use consult_intake_mailer::MailRelayClient;
use consult_intake_storage::Database;
use consult_intake_util::{load_env_file, AppConfig};

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    load_env_file();
    let config = AppConfig::from_env()?;

    telemetry::init_tracing(&config)?;
    let metrics = telemetry::init_metrics()?;

    let storage = match config.database_url.as_deref() {
        Some(url) => {
            let database = Database::connect(url).await?;
            database.run_migrations().await?;
            Some(database)
        }
        None => {
            warn!(
                stage = "app",
                "DATABASE_URL is not set; submissions will fail closed"
            );
            None
        }
    };

    let mailer = match config.mail.as_ref() {
        Some(mail) => {
            let base_url = Url::parse(&mail.api_url)?;
            let http = Client::builder().build()?;
            Some(MailRelayClient::new(
                base_url,
                mail.api_token.clone(),
                mail.sender.clone(),
                mail.notify_to.clone(),
                http,
            ))
        }
        None => {
            info!(
                stage = "app",
                "mail relay not configured; notifications disabled"
            );
            None
        }
    };

    let state = router::AppState::new(metrics, storage, mailer, config.submit_diagnostics);

    let addr: SocketAddr = config.bind_addr;
    info!(stage = "app", %addr, env = %config.environment.as_str(), "starting HTTP server");

    let listener = tokio::net::TcpListener::bind(addr).await?;
    axum::serve(listener, router::app_router(state))
        .await
        .map_err(|err| err.into())
}
