pub mod admin;
pub mod auth;
pub mod bookings;
pub mod contact;
pub mod crm;
pub mod health;
pub mod inventory;
pub mod notifications;
pub mod payments;
pub mod reports;
pub mod reviews;

use std::sync::Arc;

use axum::http::{HeaderValue, Method, StatusCode, Uri};
use axum::response::IntoResponse;
use axum::routing::{delete, get, post, put};
use axum::{Json, Router};
use serde::Serialize;
use tower_http::cors::{AllowOrigin, Any, CorsLayer};
use tower_http::trace::TraceLayer;

use crate::state::AppState;

/// Listing envelope shared by the paginated admin collections.
#[derive(Debug, Serialize)]
pub struct Pagination {
    pub total: i64,
    pub limit: i64,
    pub offset: i64,
    #[serde(rename = "hasMore")]
    pub has_more: bool,
}

impl Pagination {
    pub fn new(total: i64, limit: i64, offset: i64, returned: usize) -> Self {
        Self {
            total,
            limit,
            offset,
            has_more: total > offset + returned as i64,
        }
    }
}

async fn not_found(method: Method, uri: Uri) -> impl IntoResponse {
    (
        StatusCode::NOT_FOUND,
        Json(serde_json::json!({
            "success": false,
            "message": "API endpoint not found",
            "requestedUrl": uri.path(),
            "method": method.as_str(),
        })),
    )
}

fn cors_layer(origins: &[String]) -> CorsLayer {
    if origins.is_empty() {
        return CorsLayer::permissive();
    }
    let list: Vec<HeaderValue> = origins.iter().filter_map(|o| o.parse().ok()).collect();
    CorsLayer::new()
        .allow_origin(AllowOrigin::list(list))
        .allow_methods(Any)
        .allow_headers(Any)
}

pub fn router(state: Arc<AppState>) -> Router {
    let cors = cors_layer(&state.config.allowed_origins);

    Router::new()
        .route("/api/health", get(health::health))
        .route("/api/booking", post(bookings::create))
        .route("/api/bookings/admin/all", get(bookings::admin_list))
        .route("/api/bookings/admin/analytics", get(bookings::admin_analytics))
        .route("/api/bookings/admin/:id/status", put(bookings::admin_update_status))
        .route("/api/bookings/my-bookings", get(bookings::my_bookings))
        .route("/api/bookings/:id/cancel", put(bookings::cancel))
        .route("/api/payments/create-order", post(payments::create_order))
        .route("/api/payments/verify", post(payments::verify))
        .route("/api/payments/admin/all", get(payments::admin_list))
        .route("/api/payments/:payment_id", get(payments::detail))
        .route("/api/auth/register", post(auth::register))
        .route("/api/auth/login", post(auth::login))
        .route("/api/auth/logout", post(auth::logout))
        .route("/api/auth/me", get(auth::me))
        .route("/api/auth/profile", put(auth::update_profile))
        .route("/api/contact/submit", post(contact::submit))
        .route("/api/contact/admin/messages", get(contact::admin_messages))
        .route("/api/contact/admin/messages/:id/read", put(contact::mark_read))
        .route("/api/contact/admin/messages/:id/replied", put(contact::mark_replied))
        .route("/api/contact/admin/messages/:id", delete(contact::remove))
        .route("/api/contact/admin/stats", get(contact::admin_stats))
        .route("/api/reviews", get(reviews::approved))
        .route("/api/reviews/featured", get(reviews::featured))
        .route("/api/reviews/submit", post(reviews::submit))
        .route("/api/reviews/stats", get(reviews::stats))
        .route("/api/reviews/admin/all", get(reviews::admin_all))
        .route("/api/reviews/admin/:id/approve", put(reviews::approve))
        .route("/api/reviews/admin/:id/feature", put(reviews::toggle_feature))
        .route("/api/reviews/admin/:id", delete(reviews::remove))
        .route("/api/admin/stats", get(admin::stats))
        .route("/api/admin/recent-bookings", get(admin::recent_bookings))
        .route("/api/admin/expenses", get(admin::list_expenses).post(admin::add_expense))
        .route("/api/admin/monthly-pl", get(admin::monthly_pl))
        .route("/api/reports/gst", get(reports::gst))
        .route("/api/reports/income-tax", get(reports::income_tax))
        .route("/api/reports/customers", get(reports::customers))
        .route("/api/reports/services", get(reports::services))
        .route("/api/reports/monthly", get(reports::monthly))
        .route("/api/crm/leads", get(crm::list_leads).post(crm::create_lead))
        .route("/api/crm/leads/:id", put(crm::update_lead))
        .route("/api/crm/leads/:id/activity", post(crm::add_activity))
        .route("/api/crm/leads/:id/activities", get(crm::list_activities))
        .route("/api/crm/funnel", get(crm::funnel))
        .route("/api/crm/sources", get(crm::sources))
        .route("/api/crm/follow-ups/today", get(crm::todays_follow_ups))
        .route("/api/crm/metrics", get(crm::metrics))
        .route("/api/inventory/equipment", get(inventory::list).post(inventory::add))
        .route("/api/inventory/equipment/:id", put(inventory::update))
        .route(
            "/api/inventory/equipment/:id/maintenance",
            get(inventory::maintenance_history).post(inventory::add_maintenance),
        )
        .route("/api/inventory/equipment/:id/usage", post(inventory::log_usage))
        .route("/api/inventory/depreciation", get(inventory::depreciation))
        .route("/api/notifications", get(notifications::list))
        .route("/api/notifications/unread-count", get(notifications::unread_count))
        .route("/api/notifications/send", post(notifications::send))
        .route("/api/notifications/auto-generate", post(notifications::auto_generate))
        .route("/api/notifications/send-reminders", post(notifications::send_reminders))
        .route("/api/notifications/:id/read", put(notifications::mark_read))
        .fallback(not_found)
        .layer(TraceLayer::new_for_http())
        .layer(cors)
        .with_state(state)
}
