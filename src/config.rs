use std::env;

#[derive(Clone, Debug)]
pub struct AppConfig {
    pub port: u16,
    pub database_url: String,
    pub environment: String,
    pub admin_api_key: String,
    pub admin_email: String,
    pub admin_password: String,
    pub razorpay_key_id: String,
    pub razorpay_key_secret: String,
    pub resend_api_key: String,
    pub from_email: String,
    pub allowed_origins: Vec<String>,
    /// Smallest order amount (in rupees) the gateway will accept.
    pub min_order_amount: i64,
    /// When set, admin status updates must follow the booking lifecycle
    /// graph instead of accepting any valid status value.
    pub enforce_status_graph: bool,
}

impl AppConfig {
    pub fn from_env() -> Self {
        Self {
            port: env::var("PORT")
                .ok()
                .and_then(|v| v.parse().ok())
                .unwrap_or(5000),
            database_url: env::var("DATABASE_URL").unwrap_or_else(|_| "studiobook.db".to_string()),
            environment: env::var("APP_ENV").unwrap_or_else(|_| "development".to_string()),
            admin_api_key: env::var("ADMIN_API_KEY").unwrap_or_else(|_| "changeme".to_string()),
            admin_email: env::var("ADMIN_EMAIL")
                .unwrap_or_else(|_| "admin@studiobook.local".to_string()),
            admin_password: env::var("ADMIN_PASSWORD").unwrap_or_else(|_| "admin123".to_string()),
            razorpay_key_id: env::var("RAZORPAY_KEY_ID").unwrap_or_default(),
            razorpay_key_secret: env::var("RAZORPAY_KEY_SECRET").unwrap_or_default(),
            resend_api_key: env::var("RESEND_API_KEY").unwrap_or_default(),
            from_email: env::var("FROM_EMAIL")
                .unwrap_or_else(|_| "onboarding@resend.dev".to_string()),
            allowed_origins: env::var("ALLOWED_ORIGINS")
                .map(|v| {
                    v.split(',')
                        .map(|s| s.trim().to_string())
                        .filter(|s| !s.is_empty())
                        .collect()
                })
                .unwrap_or_default(),
            min_order_amount: env::var("MIN_ORDER_AMOUNT")
                .ok()
                .and_then(|v| v.parse().ok())
                .unwrap_or(100),
            enforce_status_graph: env::var("ENFORCE_STATUS_GRAPH")
                .map(|v| v == "1" || v.eq_ignore_ascii_case("true"))
                .unwrap_or(false),
        }
    }
}
