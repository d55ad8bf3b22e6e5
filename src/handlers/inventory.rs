use std::sync::Arc;

use axum::extract::{Path, State};
use axum::http::{HeaderMap, StatusCode};
use axum::response::IntoResponse;
use axum::Json;
use serde::Deserialize;

use crate::db::queries::{self, DepreciationRow, EquipmentUpdate, NewEquipment};
use crate::errors::AppError;
use crate::models::{Equipment, MaintenanceRecord};
use crate::state::AppState;

// GET /api/inventory/equipment
pub async fn list(
    State(state): State<Arc<AppState>>,
    headers: HeaderMap,
) -> Result<Json<Vec<Equipment>>, AppError> {
    state.admin_auth.authorize(&headers)?;

    let db = state.db.lock().unwrap();
    Ok(Json(queries::list_equipment(&db)?))
}

// POST /api/inventory/equipment
#[derive(Deserialize)]
pub struct AddEquipmentRequest {
    #[serde(default)]
    pub name: String,
    #[serde(default)]
    pub category: String,
    pub brand: Option<String>,
    pub model: Option<String>,
    pub purchase_date: Option<String>,
    pub purchase_price: Option<f64>,
    pub current_value: Option<f64>,
    pub condition_status: Option<String>,
    pub location: Option<String>,
    pub notes: Option<String>,
}

pub async fn add(
    State(state): State<Arc<AppState>>,
    headers: HeaderMap,
    Json(req): Json<AddEquipmentRequest>,
) -> Result<impl IntoResponse, AppError> {
    state.admin_auth.authorize(&headers)?;

    if req.name.trim().is_empty() || req.category.trim().is_empty() {
        return Err(AppError::BadRequest("Name and category are required"));
    }

    let id = {
        let db = state.db.lock().unwrap();
        queries::insert_equipment(
            &db,
            &NewEquipment {
                name: req.name.trim(),
                category: req.category.trim(),
                brand: req.brand.as_deref(),
                model: req.model.as_deref(),
                purchase_date: req.purchase_date.as_deref(),
                purchase_price: req.purchase_price,
                current_value: req.current_value.or(req.purchase_price),
                condition_status: req.condition_status.as_deref().unwrap_or("good"),
                location: req.location.as_deref(),
                notes: req.notes.as_deref(),
            },
        )?
    };

    tracing::info!(equipment_id = id, "equipment added");
    Ok((
        StatusCode::CREATED,
        Json(serde_json::json!({
            "id": id,
            "message": "Equipment added successfully",
        })),
    ))
}

// PUT /api/inventory/equipment/:id
#[derive(Deserialize)]
pub struct UpdateEquipmentRequest {
    pub name: Option<String>,
    pub category: Option<String>,
    pub brand: Option<String>,
    pub model: Option<String>,
    pub purchase_price: Option<f64>,
    pub current_value: Option<f64>,
    pub condition_status: Option<String>,
    pub location: Option<String>,
    pub notes: Option<String>,
}

pub async fn update(
    State(state): State<Arc<AppState>>,
    headers: HeaderMap,
    Path(id): Path<i64>,
    Json(req): Json<UpdateEquipmentRequest>,
) -> Result<Json<serde_json::Value>, AppError> {
    state.admin_auth.authorize(&headers)?;

    let updated = {
        let db = state.db.lock().unwrap();
        queries::update_equipment(
            &db,
            id,
            &EquipmentUpdate {
                name: req.name.as_deref(),
                category: req.category.as_deref(),
                brand: req.brand.as_deref(),
                model: req.model.as_deref(),
                purchase_price: req.purchase_price,
                current_value: req.current_value,
                condition_status: req.condition_status.as_deref(),
                location: req.location.as_deref(),
                notes: req.notes.as_deref(),
            },
        )?
    };
    if !updated {
        return Err(AppError::NotFound("Equipment not found"));
    }
    Ok(Json(serde_json::json!({
        "message": "Equipment updated successfully",
    })))
}

// GET /api/inventory/equipment/:id/maintenance
pub async fn maintenance_history(
    State(state): State<Arc<AppState>>,
    headers: HeaderMap,
    Path(id): Path<i64>,
) -> Result<Json<Vec<MaintenanceRecord>>, AppError> {
    state.admin_auth.authorize(&headers)?;

    let db = state.db.lock().unwrap();
    Ok(Json(queries::list_maintenance(&db, id)?))
}

// POST /api/inventory/equipment/:id/maintenance
#[derive(Deserialize)]
pub struct MaintenanceRequest {
    #[serde(default)]
    pub maintenance_date: String,
    #[serde(default)]
    pub description: String,
    pub cost: Option<f64>,
    pub performed_by: Option<String>,
    pub next_due_date: Option<String>,
}

pub async fn add_maintenance(
    State(state): State<Arc<AppState>>,
    headers: HeaderMap,
    Path(id): Path<i64>,
    Json(req): Json<MaintenanceRequest>,
) -> Result<impl IntoResponse, AppError> {
    state.admin_auth.authorize(&headers)?;

    if req.maintenance_date.trim().is_empty() || req.description.trim().is_empty() {
        return Err(AppError::BadRequest(
            "Maintenance date and description are required",
        ));
    }

    let record_id = {
        let db = state.db.lock().unwrap();
        if queries::get_equipment(&db, id)?.is_none() {
            return Err(AppError::NotFound("Equipment not found"));
        }
        queries::insert_maintenance(
            &db,
            id,
            req.maintenance_date.trim(),
            req.description.trim(),
            req.cost,
            req.performed_by.as_deref(),
            req.next_due_date.as_deref(),
        )?
    };

    Ok((
        StatusCode::CREATED,
        Json(serde_json::json!({
            "id": record_id,
            "message": "Maintenance record added",
        })),
    ))
}

// POST /api/inventory/equipment/:id/usage
#[derive(Deserialize)]
pub struct UsageRequest {
    pub booking_id: Option<i64>,
    #[serde(default)]
    pub usage_date: String,
    pub hours_used: Option<f64>,
    pub condition_after: Option<String>,
}

pub async fn log_usage(
    State(state): State<Arc<AppState>>,
    headers: HeaderMap,
    Path(id): Path<i64>,
    Json(req): Json<UsageRequest>,
) -> Result<impl IntoResponse, AppError> {
    state.admin_auth.authorize(&headers)?;

    if req.usage_date.trim().is_empty() {
        return Err(AppError::BadRequest("Usage date is required"));
    }

    let usage_id = {
        let db = state.db.lock().unwrap();
        if queries::get_equipment(&db, id)?.is_none() {
            return Err(AppError::NotFound("Equipment not found"));
        }
        let usage_id = queries::insert_usage(
            &db,
            id,
            req.booking_id,
            req.usage_date.trim(),
            req.hours_used,
            req.condition_after.as_deref(),
        )?;

        // A shoot can leave gear in a different state than it went out in.
        if let Some(condition) = req.condition_after.as_deref().filter(|c| !c.trim().is_empty()) {
            queries::update_equipment(
                &db,
                id,
                &EquipmentUpdate {
                    name: None,
                    category: None,
                    brand: None,
                    model: None,
                    purchase_price: None,
                    current_value: None,
                    condition_status: Some(condition.trim()),
                    location: None,
                    notes: None,
                },
            )?;
        }
        usage_id
    };

    Ok((
        StatusCode::CREATED,
        Json(serde_json::json!({
            "id": usage_id,
            "message": "Usage logged",
        })),
    ))
}

// GET /api/inventory/depreciation
pub async fn depreciation(
    State(state): State<Arc<AppState>>,
    headers: HeaderMap,
) -> Result<Json<Vec<DepreciationRow>>, AppError> {
    state.admin_auth.authorize(&headers)?;

    let db = state.db.lock().unwrap();
    Ok(Json(queries::depreciation_report(&db)?))
}
