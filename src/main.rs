use std::sync::{Arc, Mutex};
use std::time::Instant;

use tracing_subscriber::EnvFilter;

use studiobook::config::AppConfig;
use studiobook::db::{self, queries};
use studiobook::handlers;
use studiobook::services::auth::{self, StaticKeyAuthenticator};
use studiobook::services::gateway::razorpay::RazorpayGateway;
use studiobook::services::mailer::resend::ResendMailer;
use studiobook::state::AppState;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let _ = dotenvy::dotenv();

    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| "info".into()))
        .init();

    let config = AppConfig::from_env();

    let conn = db::init_db(&config.database_url)?;
    let admin_hash = auth::hash_password(&config.admin_password);
    queries::ensure_admin_user(&conn, "Admin", &config.admin_email, &admin_hash)?;

    if config.razorpay_key_secret.is_empty() {
        tracing::warn!("RAZORPAY_KEY_SECRET is not set; payment verification will reject everything");
    }
    if config.resend_api_key.is_empty() {
        tracing::warn!("RESEND_API_KEY is not set; outgoing email will fail");
    }

    let state = Arc::new(AppState {
        db: Arc::new(Mutex::new(conn)),
        config: config.clone(),
        gateway: Box::new(RazorpayGateway::new(
            config.razorpay_key_id.clone(),
            config.razorpay_key_secret.clone(),
        )),
        mailer: Box::new(ResendMailer::new(
            config.resend_api_key.clone(),
            config.from_email.clone(),
        )),
        admin_auth: Box::new(StaticKeyAuthenticator::new(config.admin_api_key.clone())),
        started_at: Instant::now(),
    });

    let app = handlers::router(state);

    let addr = format!("0.0.0.0:{}", config.port);
    tracing::info!("starting server on {addr}");

    let listener = tokio::net::TcpListener::bind(&addr).await?;
    axum::serve(listener, app).await?;

    Ok(())
}
