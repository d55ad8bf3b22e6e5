use std::sync::Arc;

use axum::extract::{Path, Query, State};
use axum::http::{HeaderMap, StatusCode};
use axum::response::IntoResponse;
use axum::Json;
use serde::{Deserialize, Serialize};

use crate::db::queries::{self, ReviewStats};
use crate::errors::AppError;
use crate::models::Review;
use crate::services::notify;
use crate::state::AppState;

// GET /api/reviews
#[derive(Serialize)]
pub struct ReviewListResponse {
    success: bool,
    reviews: Vec<Review>,
}

pub async fn approved(
    State(state): State<Arc<AppState>>,
) -> Result<Json<ReviewListResponse>, AppError> {
    let db = state.db.lock().unwrap();
    Ok(Json(ReviewListResponse {
        success: true,
        reviews: queries::list_approved_reviews(&db)?,
    }))
}

// GET /api/reviews/featured
#[derive(Deserialize)]
pub struct FeaturedQuery {
    pub limit: Option<i64>,
}

pub async fn featured(
    State(state): State<Arc<AppState>>,
    Query(q): Query<FeaturedQuery>,
) -> Result<Json<ReviewListResponse>, AppError> {
    let db = state.db.lock().unwrap();
    Ok(Json(ReviewListResponse {
        success: true,
        reviews: queries::featured_reviews(&db, q.limit.unwrap_or(6).max(1))?,
    }))
}

// POST /api/reviews/submit
#[derive(Deserialize)]
pub struct SubmitReviewRequest {
    #[serde(default)]
    pub name: String,
    #[serde(default)]
    pub email: Option<String>,
    pub rating: Option<i64>,
    #[serde(rename = "reviewText", alias = "review_text", default)]
    pub review_text: String,
    #[serde(rename = "bookingId", alias = "booking_id", default)]
    pub booking_id: Option<i64>,
}

pub async fn submit(
    State(state): State<Arc<AppState>>,
    Json(req): Json<SubmitReviewRequest>,
) -> Result<impl IntoResponse, AppError> {
    let rating = match req.rating {
        Some(r) if !req.name.trim().is_empty() && !req.review_text.trim().is_empty() => r,
        _ => {
            return Err(AppError::BadRequest(
                "Name, rating, and review text are required",
            ))
        }
    };
    if !(1..=5).contains(&rating) {
        return Err(AppError::BadRequest("Rating must be between 1 and 5"));
    }

    let id = {
        let db = state.db.lock().unwrap();
        queries::insert_review(
            &db,
            req.booking_id,
            req.name.trim(),
            req.email.as_deref().filter(|e| !e.trim().is_empty()),
            rating,
            req.review_text.trim(),
        )?
    };

    tracing::info!(review_id = id, rating, "review submitted");
    notify::dispatch(
        &state,
        vec![notify::review_alert(
            &state.config,
            req.name.trim(),
            rating,
            req.review_text.trim(),
        )],
    );

    Ok((
        StatusCode::CREATED,
        Json(serde_json::json!({
            "success": true,
            "message": "Review submitted successfully! It will be published after approval.",
        })),
    ))
}

// GET /api/reviews/stats
#[derive(Serialize)]
pub struct ReviewStatsResponse {
    success: bool,
    stats: ReviewStats,
}

pub async fn stats(
    State(state): State<Arc<AppState>>,
) -> Result<Json<ReviewStatsResponse>, AppError> {
    let db = state.db.lock().unwrap();
    Ok(Json(ReviewStatsResponse {
        success: true,
        stats: queries::review_stats(&db)?,
    }))
}

// GET /api/reviews/admin/all
pub async fn admin_all(
    State(state): State<Arc<AppState>>,
    headers: HeaderMap,
) -> Result<Json<ReviewListResponse>, AppError> {
    state.admin_auth.authorize(&headers)?;

    let db = state.db.lock().unwrap();
    Ok(Json(ReviewListResponse {
        success: true,
        reviews: queries::list_all_reviews(&db)?,
    }))
}

// PUT /api/reviews/admin/:id/approve
#[derive(Deserialize)]
pub struct ApproveRequest {
    pub featured: Option<bool>,
}

pub async fn approve(
    State(state): State<Arc<AppState>>,
    headers: HeaderMap,
    Path(id): Path<i64>,
    body: Option<Json<ApproveRequest>>,
) -> Result<Json<serde_json::Value>, AppError> {
    state.admin_auth.authorize(&headers)?;

    let featured = body
        .as_ref()
        .and_then(|Json(b)| b.featured)
        .unwrap_or(false);
    let updated = {
        let db = state.db.lock().unwrap();
        queries::approve_review(&db, id, featured)?
    };
    if !updated {
        return Err(AppError::NotFound("Review not found"));
    }
    Ok(Json(serde_json::json!({
        "success": true,
        "message": "Review approved successfully",
    })))
}

// PUT /api/reviews/admin/:id/feature
pub async fn toggle_feature(
    State(state): State<Arc<AppState>>,
    headers: HeaderMap,
    Path(id): Path<i64>,
) -> Result<Json<serde_json::Value>, AppError> {
    state.admin_auth.authorize(&headers)?;

    let updated = {
        let db = state.db.lock().unwrap();
        queries::toggle_review_featured(&db, id)?
    };
    if !updated {
        return Err(AppError::NotFound("Review not found"));
    }
    Ok(Json(serde_json::json!({
        "success": true,
        "message": "Review feature status updated",
    })))
}

// DELETE /api/reviews/admin/:id
pub async fn remove(
    State(state): State<Arc<AppState>>,
    headers: HeaderMap,
    Path(id): Path<i64>,
) -> Result<Json<serde_json::Value>, AppError> {
    state.admin_auth.authorize(&headers)?;

    let deleted = {
        let db = state.db.lock().unwrap();
        queries::delete_review(&db, id)?
    };
    if !deleted {
        return Err(AppError::NotFound("Review not found"));
    }
    Ok(Json(serde_json::json!({
        "success": true,
        "message": "Review deleted successfully",
    })))
}
