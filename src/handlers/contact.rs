use std::sync::Arc;

use axum::extract::{Path, Query, State};
use axum::http::{HeaderMap, StatusCode};
use axum::response::IntoResponse;
use axum::Json;
use serde::{Deserialize, Serialize};

use crate::db::queries::{self, ContactStats};
use crate::errors::AppError;
use crate::models::ContactMessage;
use crate::services::{notify, validation};
use crate::state::AppState;

use super::Pagination;

// POST /api/contact/submit
#[derive(Deserialize)]
pub struct ContactRequest {
    #[serde(default)]
    pub name: String,
    #[serde(default)]
    pub email: String,
    #[serde(default)]
    pub phone: Option<String>,
    #[serde(default)]
    pub subject: String,
    #[serde(default)]
    pub message: String,
}

pub async fn submit(
    State(state): State<Arc<AppState>>,
    Json(req): Json<ContactRequest>,
) -> Result<impl IntoResponse, AppError> {
    let mut errors = vec![];
    validation::min_len(&mut errors, "name", &req.name, 2, "Name must be at least 2 characters");
    validation::email(&mut errors, "email", &req.email, "Valid email required");
    if let Some(phone) = req.phone.as_deref().filter(|p| !p.trim().is_empty()) {
        validation::mobile(&mut errors, "phone", phone, "Valid Indian phone number required");
    }
    validation::min_len(
        &mut errors,
        "subject",
        &req.subject,
        5,
        "Subject must be at least 5 characters",
    );
    validation::min_len(
        &mut errors,
        "message",
        &req.message,
        10,
        "Message must be at least 10 characters",
    );
    validation::finish(errors)?;

    let id = {
        let db = state.db.lock().unwrap();
        queries::insert_contact_message(
            &db,
            req.name.trim(),
            req.email.trim(),
            req.phone.as_deref().filter(|p| !p.trim().is_empty()),
            req.subject.trim(),
            req.message.trim(),
        )?
    };

    tracing::info!(message_id = id, "contact message received");
    notify::dispatch(
        &state,
        vec![notify::contact_alert(
            &state.config,
            req.name.trim(),
            req.email.trim(),
            req.phone.as_deref().filter(|p| !p.trim().is_empty()),
            req.subject.trim(),
            req.message.trim(),
        )],
    );

    Ok((
        StatusCode::CREATED,
        Json(serde_json::json!({
            "success": true,
            "message": "Thank you for your message! We will get back to you soon.",
            "messageId": id,
        })),
    ))
}

// GET /api/contact/admin/messages
#[derive(Deserialize)]
pub struct MessagesQuery {
    pub is_read: Option<bool>,
    pub limit: Option<i64>,
    pub offset: Option<i64>,
}

#[derive(Serialize)]
pub struct MessagesResponse {
    success: bool,
    messages: Vec<ContactMessage>,
    pagination: Pagination,
}

pub async fn admin_messages(
    State(state): State<Arc<AppState>>,
    headers: HeaderMap,
    Query(q): Query<MessagesQuery>,
) -> Result<Json<MessagesResponse>, AppError> {
    state.admin_auth.authorize(&headers)?;

    let limit = q.limit.unwrap_or(50).max(1);
    let offset = q.offset.unwrap_or(0).max(0);
    let (messages, total) = {
        let db = state.db.lock().unwrap();
        queries::list_contact_messages(&db, q.is_read, limit, offset)?
    };

    let pagination = Pagination::new(total, limit, offset, messages.len());
    Ok(Json(MessagesResponse {
        success: true,
        messages,
        pagination,
    }))
}

// PUT /api/contact/admin/messages/:id/read
pub async fn mark_read(
    State(state): State<Arc<AppState>>,
    headers: HeaderMap,
    Path(id): Path<i64>,
) -> Result<Json<serde_json::Value>, AppError> {
    state.admin_auth.authorize(&headers)?;

    let updated = {
        let db = state.db.lock().unwrap();
        queries::mark_message_read(&db, id)?
    };
    if !updated {
        return Err(AppError::NotFound("Message not found"));
    }
    Ok(Json(serde_json::json!({
        "success": true,
        "message": "Message marked as read",
    })))
}

// PUT /api/contact/admin/messages/:id/replied
pub async fn mark_replied(
    State(state): State<Arc<AppState>>,
    headers: HeaderMap,
    Path(id): Path<i64>,
) -> Result<Json<serde_json::Value>, AppError> {
    state.admin_auth.authorize(&headers)?;

    let updated = {
        let db = state.db.lock().unwrap();
        queries::mark_message_replied(&db, id)?
    };
    if !updated {
        return Err(AppError::NotFound("Message not found"));
    }
    Ok(Json(serde_json::json!({
        "success": true,
        "message": "Message marked as replied",
    })))
}

// DELETE /api/contact/admin/messages/:id
pub async fn remove(
    State(state): State<Arc<AppState>>,
    headers: HeaderMap,
    Path(id): Path<i64>,
) -> Result<Json<serde_json::Value>, AppError> {
    state.admin_auth.authorize(&headers)?;

    let deleted = {
        let db = state.db.lock().unwrap();
        queries::delete_contact_message(&db, id)?
    };
    if !deleted {
        return Err(AppError::NotFound("Message not found"));
    }
    Ok(Json(serde_json::json!({
        "success": true,
        "message": "Message deleted successfully",
    })))
}

// GET /api/contact/admin/stats
#[derive(Serialize)]
pub struct ContactStatsResponse {
    success: bool,
    stats: ContactStats,
    #[serde(rename = "recentMessages")]
    recent_messages: Vec<ContactMessage>,
}

pub async fn admin_stats(
    State(state): State<Arc<AppState>>,
    headers: HeaderMap,
) -> Result<Json<ContactStatsResponse>, AppError> {
    state.admin_auth.authorize(&headers)?;

    let db = state.db.lock().unwrap();
    Ok(Json(ContactStatsResponse {
        success: true,
        stats: queries::contact_stats(&db)?,
        recent_messages: queries::recent_contact_messages(&db, 10)?,
    }))
}
