use std::sync::{Arc, Mutex};
use std::time::Instant;

use rusqlite::Connection;

use crate::config::AppConfig;
use crate::services::auth::AdminAuthenticator;
use crate::services::gateway::PaymentGateway;
use crate::services::mailer::EmailProvider;

/// Shared application state handed to every handler.
pub struct AppState {
    pub db: Arc<Mutex<Connection>>,
    pub config: AppConfig,
    pub gateway: Box<dyn PaymentGateway>,
    pub mailer: Box<dyn EmailProvider>,
    pub admin_auth: Box<dyn AdminAuthenticator>,
    pub started_at: Instant,
}
