use std::sync::Arc;

use axum::extract::{Path, State};
use axum::http::{HeaderMap, StatusCode};
use axum::response::IntoResponse;
use axum::Json;
use serde::Deserialize;

use crate::db::queries::{self, FollowUp, FunnelStage, LeadMetrics, NewLead, SourceStats};
use crate::errors::AppError;
use crate::models::lead::LEAD_STATUSES;
use crate::models::{Lead, LeadActivity};
use crate::state::AppState;

// GET /api/crm/leads
pub async fn list_leads(
    State(state): State<Arc<AppState>>,
    headers: HeaderMap,
) -> Result<Json<Vec<Lead>>, AppError> {
    state.admin_auth.authorize(&headers)?;

    let db = state.db.lock().unwrap();
    Ok(Json(queries::list_leads(&db)?))
}

// POST /api/crm/leads
#[derive(Deserialize)]
pub struct CreateLeadRequest {
    #[serde(default)]
    pub name: String,
    #[serde(default)]
    pub phone: String,
    pub email: Option<String>,
    pub service_interest: Option<String>,
    pub event_date: Option<String>,
    pub budget: Option<f64>,
    #[serde(default)]
    pub source: String,
    pub notes: Option<String>,
    pub priority: Option<String>,
    pub follow_up_date: Option<String>,
}

pub async fn create_lead(
    State(state): State<Arc<AppState>>,
    headers: HeaderMap,
    Json(req): Json<CreateLeadRequest>,
) -> Result<impl IntoResponse, AppError> {
    state.admin_auth.authorize(&headers)?;

    if req.name.trim().is_empty() || req.phone.trim().is_empty() || req.source.trim().is_empty() {
        return Err(AppError::BadRequest("Name, phone, and source are required"));
    }

    let id = {
        let db = state.db.lock().unwrap();
        queries::insert_lead(
            &db,
            &NewLead {
                name: req.name.trim(),
                phone: req.phone.trim(),
                email: req.email.as_deref().filter(|e| !e.trim().is_empty()),
                service_interest: req.service_interest.as_deref(),
                event_date: req.event_date.as_deref(),
                budget: req.budget,
                source: req.source.trim(),
                notes: req.notes.as_deref(),
                priority: req.priority.as_deref().unwrap_or("medium"),
                follow_up_date: req.follow_up_date.as_deref(),
            },
        )?
    };

    tracing::info!(lead_id = id, source = %req.source.trim(), "lead created");
    Ok((
        StatusCode::CREATED,
        Json(serde_json::json!({
            "id": id,
            "message": "Lead created successfully",
        })),
    ))
}

// PUT /api/crm/leads/:id
#[derive(Deserialize)]
pub struct UpdateLeadRequest {
    pub status: Option<String>,
    pub notes: Option<String>,
    pub follow_up_date: Option<String>,
}

pub async fn update_lead(
    State(state): State<Arc<AppState>>,
    headers: HeaderMap,
    Path(id): Path<i64>,
    Json(req): Json<UpdateLeadRequest>,
) -> Result<Json<serde_json::Value>, AppError> {
    state.admin_auth.authorize(&headers)?;

    if let Some(status) = req.status.as_deref() {
        if !LEAD_STATUSES.contains(&status) {
            return Err(AppError::InvalidStatus("lead"));
        }
    }

    let updated = {
        let db = state.db.lock().unwrap();
        queries::update_lead(
            &db,
            id,
            req.status.as_deref(),
            req.notes.as_deref(),
            req.follow_up_date.as_deref(),
        )?
    };
    if !updated {
        return Err(AppError::NotFound("Lead not found"));
    }
    Ok(Json(serde_json::json!({
        "message": "Lead updated successfully",
    })))
}

// POST /api/crm/leads/:id/activity
#[derive(Deserialize)]
pub struct ActivityRequest {
    #[serde(default)]
    pub activity_type: String,
    #[serde(default)]
    pub description: String,
    pub next_action: Option<String>,
    pub next_action_date: Option<String>,
}

pub async fn add_activity(
    State(state): State<Arc<AppState>>,
    headers: HeaderMap,
    Path(id): Path<i64>,
    Json(req): Json<ActivityRequest>,
) -> Result<impl IntoResponse, AppError> {
    state.admin_auth.authorize(&headers)?;

    if req.activity_type.trim().is_empty() || req.description.trim().is_empty() {
        return Err(AppError::BadRequest(
            "Activity type and description are required",
        ));
    }

    let activity_id = {
        let db = state.db.lock().unwrap();
        if queries::get_lead(&db, id)?.is_none() {
            return Err(AppError::NotFound("Lead not found"));
        }
        queries::insert_lead_activity(
            &db,
            id,
            req.activity_type.trim(),
            req.description.trim(),
            req.next_action.as_deref(),
            req.next_action_date.as_deref(),
        )?
    };

    Ok((
        StatusCode::CREATED,
        Json(serde_json::json!({
            "id": activity_id,
            "message": "Activity logged",
        })),
    ))
}

// GET /api/crm/leads/:id/activities
pub async fn list_activities(
    State(state): State<Arc<AppState>>,
    headers: HeaderMap,
    Path(id): Path<i64>,
) -> Result<Json<Vec<LeadActivity>>, AppError> {
    state.admin_auth.authorize(&headers)?;

    let db = state.db.lock().unwrap();
    Ok(Json(queries::list_lead_activities(&db, id)?))
}

// GET /api/crm/funnel
pub async fn funnel(
    State(state): State<Arc<AppState>>,
    headers: HeaderMap,
) -> Result<Json<Vec<FunnelStage>>, AppError> {
    state.admin_auth.authorize(&headers)?;

    let db = state.db.lock().unwrap();
    Ok(Json(queries::lead_funnel(&db)?))
}

// GET /api/crm/sources
pub async fn sources(
    State(state): State<Arc<AppState>>,
    headers: HeaderMap,
) -> Result<Json<Vec<SourceStats>>, AppError> {
    state.admin_auth.authorize(&headers)?;

    let db = state.db.lock().unwrap();
    Ok(Json(queries::lead_sources(&db)?))
}

// GET /api/crm/follow-ups/today
pub async fn todays_follow_ups(
    State(state): State<Arc<AppState>>,
    headers: HeaderMap,
) -> Result<Json<Vec<FollowUp>>, AppError> {
    state.admin_auth.authorize(&headers)?;

    let db = state.db.lock().unwrap();
    Ok(Json(queries::todays_follow_ups(&db)?))
}

// GET /api/crm/metrics
pub async fn metrics(
    State(state): State<Arc<AppState>>,
    headers: HeaderMap,
) -> Result<Json<LeadMetrics>, AppError> {
    state.admin_auth.authorize(&headers)?;

    let db = state.db.lock().unwrap();
    Ok(Json(queries::lead_metrics(&db)?))
}
