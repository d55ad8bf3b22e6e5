use std::sync::Arc;

use axum::extract::{Path, Query, State};
use axum::http::{HeaderMap, StatusCode};
use axum::response::IntoResponse;
use axum::Json;
use chrono::{NaiveDate, Utc};
use serde::{Deserialize, Serialize};

use crate::db::queries;
use crate::errors::AppError;
use crate::models::Notification;
use crate::services::notify;
use crate::state::AppState;

// GET /api/notifications
#[derive(Deserialize)]
pub struct ListQuery {
    pub limit: Option<i64>,
}

#[derive(Serialize)]
pub struct NotificationListResponse {
    success: bool,
    notifications: Vec<Notification>,
}

pub async fn list(
    State(state): State<Arc<AppState>>,
    headers: HeaderMap,
    Query(q): Query<ListQuery>,
) -> Result<Json<NotificationListResponse>, AppError> {
    state.admin_auth.authorize(&headers)?;

    let db = state.db.lock().unwrap();
    Ok(Json(NotificationListResponse {
        success: true,
        notifications: queries::list_notifications(&db, q.limit.unwrap_or(50).max(1))?,
    }))
}

// GET /api/notifications/unread-count
pub async fn unread_count(
    State(state): State<Arc<AppState>>,
    headers: HeaderMap,
) -> Result<Json<serde_json::Value>, AppError> {
    state.admin_auth.authorize(&headers)?;

    let count = {
        let db = state.db.lock().unwrap();
        queries::unread_notification_count(&db)?
    };
    Ok(Json(serde_json::json!({
        "success": true,
        "count": count,
    })))
}

// PUT /api/notifications/:id/read
pub async fn mark_read(
    State(state): State<Arc<AppState>>,
    headers: HeaderMap,
    Path(id): Path<i64>,
) -> Result<Json<serde_json::Value>, AppError> {
    state.admin_auth.authorize(&headers)?;

    let updated = {
        let db = state.db.lock().unwrap();
        queries::mark_notification_read(&db, id)?
    };
    if !updated {
        return Err(AppError::NotFound("Notification not found"));
    }
    Ok(Json(serde_json::json!({
        "success": true,
        "message": "Notification marked as read",
    })))
}

// POST /api/notifications/send
#[derive(Deserialize)]
pub struct SendRequest {
    #[serde(rename = "type")]
    pub kind: Option<String>,
    #[serde(default)]
    pub title: String,
    #[serde(default)]
    pub message: String,
    #[serde(rename = "recipientEmail", alias = "recipient_email")]
    pub recipient_email: Option<String>,
    #[serde(rename = "relatedBookingId", alias = "related_booking_id")]
    pub related_booking_id: Option<i64>,
}

pub async fn send(
    State(state): State<Arc<AppState>>,
    headers: HeaderMap,
    Json(req): Json<SendRequest>,
) -> Result<impl IntoResponse, AppError> {
    state.admin_auth.authorize(&headers)?;

    if req.title.trim().is_empty() || req.message.trim().is_empty() {
        return Err(AppError::BadRequest("Title and message are required"));
    }

    let recipient = req.recipient_email.as_deref().filter(|e| !e.trim().is_empty());
    let id = {
        let db = state.db.lock().unwrap();
        queries::insert_notification(
            &db,
            req.kind.as_deref().unwrap_or("general"),
            req.title.trim(),
            req.message.trim(),
            recipient,
            req.related_booking_id,
        )?
    };

    if let Some(email) = recipient {
        notify::dispatch(
            &state,
            vec![notify::custom(email, req.title.trim(), req.message.trim())],
        );
    }

    Ok((
        StatusCode::CREATED,
        Json(serde_json::json!({
            "success": true,
            "id": id,
        })),
    ))
}

// POST /api/notifications/auto-generate
//
// Scans for things the studio should know about: events inside the next
// week, bookings stuck unpaid for a day, and gear due for maintenance.
// Re-running is safe; an unread notification suppresses its duplicate.
pub async fn auto_generate(
    State(state): State<Arc<AppState>>,
    headers: HeaderMap,
) -> Result<Json<serde_json::Value>, AppError> {
    state.admin_auth.authorize(&headers)?;

    let today = Utc::now().date_naive();
    let (generated, notifications) = {
        let db = state.db.lock().unwrap();
        let mut generated = 0;

        for event in queries::upcoming_paid_bookings(&db, 7)? {
            let days_away = NaiveDate::parse_from_str(&event.event_date, "%Y-%m-%d")
                .ok()
                .map(|d| (d - today).num_days());
            let message = match days_away {
                Some(days) => format!(
                    "{} for {} is {} day(s) away on {}",
                    event.service_name, event.customer_name, days, event.event_date
                ),
                None => format!(
                    "{} for {} scheduled on {}",
                    event.service_name, event.customer_name, event.event_date
                ),
            };
            if queries::insert_notification_if_absent(
                &db,
                "upcoming_event",
                &format!("Upcoming Event: {}", event.customer_name),
                &message,
                Some(event.id),
            )? {
                generated += 1;
            }
        }

        for stale in queries::stale_pending_bookings(&db, 24)? {
            if queries::insert_notification_if_absent(
                &db,
                "payment_pending",
                &format!("Payment Pending: {}", stale.customer_name),
                &format!(
                    "Booking #{} has been awaiting payment for over 24 hours (\u{20b9}{} due)",
                    stale.id, stale.total_amount
                ),
                Some(stale.id),
            )? {
                generated += 1;
            }
        }

        for due in queries::maintenance_due(&db, 7)? {
            if queries::insert_notification_if_absent(
                &db,
                "maintenance_due",
                &format!("Maintenance Due: {}", due.equipment_name),
                &format!(
                    "{} is due for maintenance on {}",
                    due.equipment_name, due.next_due_date
                ),
                None,
            )? {
                generated += 1;
            }
        }

        (generated, queries::list_notifications(&db, 20)?)
    };

    tracing::info!(generated, "auto-generated notifications");
    Ok(Json(serde_json::json!({
        "success": true,
        "generated": generated,
        "notifications": notifications,
    })))
}

// POST /api/notifications/send-reminders
//
// Emails every paid booking whose event lands in the next day or two.
// Failures are logged and skipped so one bad address cannot stall the rest.
pub async fn send_reminders(
    State(state): State<Arc<AppState>>,
    headers: HeaderMap,
) -> Result<Json<serde_json::Value>, AppError> {
    state.admin_auth.authorize(&headers)?;

    let due = {
        let db = state.db.lock().unwrap();
        queries::bookings_needing_reminder(&db)?
    };

    let mut sent = 0;
    for booking in &due {
        match state.mailer.send(&notify::event_reminder(booking)).await {
            Ok(()) => sent += 1,
            Err(e) => {
                tracing::error!(booking_id = booking.id, error = %e, "reminder email failed")
            }
        }
    }

    tracing::info!(sent, total = due.len(), "event reminders sent");
    Ok(Json(serde_json::json!({
        "success": true,
        "sent": sent,
    })))
}
