use std::sync::Arc;

use axum::extract::{Query, State};
use axum::http::{HeaderMap, StatusCode};
use axum::response::IntoResponse;
use axum::Json;
use serde::{Deserialize, Serialize};

use crate::db::queries::{self, DashboardStats, MonthlyPnl, RecentBooking};
use crate::errors::AppError;
use crate::models::Expense;
use crate::services::validation;
use crate::state::AppState;

// GET /api/admin/stats
pub async fn stats(
    State(state): State<Arc<AppState>>,
    headers: HeaderMap,
) -> Result<Json<DashboardStats>, AppError> {
    state.admin_auth.authorize(&headers)?;

    let db = state.db.lock().unwrap();
    Ok(Json(queries::dashboard_stats(&db)?))
}

// GET /api/admin/recent-bookings
#[derive(Deserialize)]
pub struct RecentQuery {
    pub limit: Option<i64>,
}

pub async fn recent_bookings(
    State(state): State<Arc<AppState>>,
    headers: HeaderMap,
    Query(q): Query<RecentQuery>,
) -> Result<Json<Vec<RecentBooking>>, AppError> {
    state.admin_auth.authorize(&headers)?;

    let db = state.db.lock().unwrap();
    Ok(Json(queries::recent_bookings(&db, q.limit.unwrap_or(10).max(1))?))
}

// GET /api/admin/expenses
#[derive(Serialize)]
pub struct ExpensesResponse {
    expenses: Vec<Expense>,
    total: f64,
}

pub async fn list_expenses(
    State(state): State<Arc<AppState>>,
    headers: HeaderMap,
) -> Result<Json<ExpensesResponse>, AppError> {
    state.admin_auth.authorize(&headers)?;

    let (expenses, total) = {
        let db = state.db.lock().unwrap();
        queries::list_expenses(&db)?
    };
    Ok(Json(ExpensesResponse { expenses, total }))
}

// POST /api/admin/expenses
#[derive(Deserialize)]
pub struct AddExpenseRequest {
    #[serde(default)]
    pub date: String,
    #[serde(default)]
    pub description: String,
    pub amount: Option<f64>,
    #[serde(default)]
    pub category: String,
}

pub async fn add_expense(
    State(state): State<Arc<AppState>>,
    headers: HeaderMap,
    Json(req): Json<AddExpenseRequest>,
) -> Result<impl IntoResponse, AppError> {
    state.admin_auth.authorize(&headers)?;

    let amount = match req.amount {
        Some(amount)
            if amount > 0.0
                && validation::is_iso_date(&req.date)
                && !req.description.trim().is_empty()
                && !req.category.trim().is_empty() =>
        {
            amount
        }
        _ => {
            return Err(AppError::BadRequest(
                "Date, description, amount, and category are required",
            ))
        }
    };

    let id = {
        let db = state.db.lock().unwrap();
        queries::insert_expense(
            &db,
            req.date.trim(),
            req.description.trim(),
            amount,
            req.category.trim(),
        )?
    };

    tracing::info!(expense_id = id, amount, "expense recorded");
    Ok((
        StatusCode::CREATED,
        Json(serde_json::json!({
            "id": id,
            "message": "Expense added successfully",
        })),
    ))
}

// GET /api/admin/monthly-pl
#[derive(Deserialize)]
pub struct MonthlyPlQuery {
    pub months: Option<i64>,
}

pub async fn monthly_pl(
    State(state): State<Arc<AppState>>,
    headers: HeaderMap,
    Query(q): Query<MonthlyPlQuery>,
) -> Result<Json<Vec<MonthlyPnl>>, AppError> {
    state.admin_auth.authorize(&headers)?;

    let db = state.db.lock().unwrap();
    Ok(Json(queries::monthly_pnl(&db, q.months.unwrap_or(6).max(1))?))
}
