use std::sync::Arc;

use axum::extract::{Path, Query, State};
use axum::http::{HeaderMap, StatusCode};
use axum::response::IntoResponse;
use axum::Json;
use serde::{Deserialize, Serialize};

use crate::db::queries::{
    self, BookingDetail, BookingFilter, MonthlyTrend, PopularService, RecentBooking,
};
use crate::errors::AppError;
use crate::services::auth;
use crate::services::booking::{self, Actor, CreateBookingRequest, UpdateStatusRequest};
use crate::state::AppState;

use super::Pagination;

// POST /api/booking
#[derive(Serialize)]
pub struct CreateBookingResponse {
    success: bool,
    message: &'static str,
    booking: BookingDetail,
}

pub async fn create(
    State(state): State<Arc<AppState>>,
    headers: HeaderMap,
    Json(req): Json<CreateBookingRequest>,
) -> Result<impl IntoResponse, AppError> {
    // Logged-in customers get the booking attached to their account,
    // anonymous visitors book just as well without one.
    let user_id = {
        let db = state.db.lock().unwrap();
        auth::optional_session_user(&db, &headers).map(|u| u.id)
    };

    let detail = booking::create_booking(&state, user_id, &req)?;
    Ok((
        StatusCode::CREATED,
        Json(CreateBookingResponse {
            success: true,
            message: "Booking created successfully",
            booking: detail,
        }),
    ))
}

// GET /api/bookings/admin/all
#[derive(Deserialize)]
pub struct AdminListQuery {
    pub status: Option<String>,
    #[serde(rename = "dateFrom")]
    pub date_from: Option<String>,
    #[serde(rename = "dateTo")]
    pub date_to: Option<String>,
    pub limit: Option<i64>,
    pub offset: Option<i64>,
}

#[derive(Serialize)]
pub struct BookingListResponse {
    success: bool,
    bookings: Vec<BookingDetail>,
    pagination: Pagination,
}

pub async fn admin_list(
    State(state): State<Arc<AppState>>,
    headers: HeaderMap,
    Query(q): Query<AdminListQuery>,
) -> Result<Json<BookingListResponse>, AppError> {
    state.admin_auth.authorize(&headers)?;

    let limit = q.limit.unwrap_or(50).max(1);
    let offset = q.offset.unwrap_or(0).max(0);
    let filter = BookingFilter {
        status: q.status.filter(|s| !s.is_empty()),
        date_from: q.date_from.filter(|s| !s.is_empty()),
        date_to: q.date_to.filter(|s| !s.is_empty()),
        limit,
        offset,
    };

    let (bookings, total) = {
        let db = state.db.lock().unwrap();
        queries::list_bookings_admin(&db, &filter)?
    };

    let pagination = Pagination::new(total, limit, offset, bookings.len());
    Ok(Json(BookingListResponse {
        success: true,
        bookings,
        pagination,
    }))
}

// GET /api/bookings/admin/analytics
#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
pub struct BookingAnalytics {
    total_bookings: i64,
    confirmed_bookings: i64,
    pending_bookings: i64,
    completed_bookings: i64,
    total_revenue: i64,
    monthly_revenue: i64,
    popular_services: Vec<PopularService>,
    recent_bookings: Vec<RecentBooking>,
    monthly_trends: Vec<MonthlyTrend>,
}

#[derive(Serialize)]
pub struct AnalyticsResponse {
    success: bool,
    analytics: BookingAnalytics,
}

pub async fn admin_analytics(
    State(state): State<Arc<AppState>>,
    headers: HeaderMap,
) -> Result<Json<AnalyticsResponse>, AppError> {
    state.admin_auth.authorize(&headers)?;

    let db = state.db.lock().unwrap();
    let (total, confirmed, pending, completed) = queries::booking_counts(&db)?;
    let (total_revenue, monthly_revenue) = queries::revenue_totals(&db)?;

    Ok(Json(AnalyticsResponse {
        success: true,
        analytics: BookingAnalytics {
            total_bookings: total,
            confirmed_bookings: confirmed,
            pending_bookings: pending,
            completed_bookings: completed,
            total_revenue,
            monthly_revenue,
            popular_services: queries::popular_services(&db, 5)?,
            recent_bookings: queries::recent_bookings(&db, 10)?,
            monthly_trends: queries::monthly_trends(&db, 6)?,
        },
    }))
}

// PUT /api/bookings/admin/:id/status
#[derive(Serialize)]
pub struct StatusUpdateResponse {
    success: bool,
    message: &'static str,
    booking: BookingDetail,
}

pub async fn admin_update_status(
    State(state): State<Arc<AppState>>,
    headers: HeaderMap,
    Path(id): Path<i64>,
    Json(req): Json<UpdateStatusRequest>,
) -> Result<Json<StatusUpdateResponse>, AppError> {
    state.admin_auth.authorize(&headers)?;

    let detail = booking::admin_update_booking(&state, id, &req)?;
    Ok(Json(StatusUpdateResponse {
        success: true,
        message: "Booking status updated successfully",
        booking: detail,
    }))
}

// GET /api/bookings/my-bookings
#[derive(Deserialize)]
pub struct MyBookingsQuery {
    pub status: Option<String>,
}

#[derive(Serialize)]
pub struct MyBookingsResponse {
    success: bool,
    bookings: Vec<BookingDetail>,
}

pub async fn my_bookings(
    State(state): State<Arc<AppState>>,
    headers: HeaderMap,
    Query(q): Query<MyBookingsQuery>,
) -> Result<Json<MyBookingsResponse>, AppError> {
    let db = state.db.lock().unwrap();
    let user = auth::session_user(&db, &headers)?;
    let bookings =
        queries::list_user_bookings(&db, user.id, q.status.as_deref().filter(|s| !s.is_empty()))?;
    Ok(Json(MyBookingsResponse {
        success: true,
        bookings,
    }))
}

// PUT /api/bookings/:id/cancel
#[derive(Deserialize)]
pub struct CancelRequest {
    pub reason: Option<String>,
}

pub async fn cancel(
    State(state): State<Arc<AppState>>,
    headers: HeaderMap,
    Path(id): Path<i64>,
    body: Option<Json<CancelRequest>>,
) -> Result<Json<serde_json::Value>, AppError> {
    let actor = if state.admin_auth.authorize(&headers).is_ok() {
        Actor::Admin
    } else {
        let db = state.db.lock().unwrap();
        let user = auth::session_user(&db, &headers)?;
        if user.is_admin() {
            Actor::Admin
        } else {
            Actor::Customer(user.id)
        }
    };

    let reason = body.as_ref().and_then(|Json(b)| b.reason.as_deref());
    booking::cancel_booking(&state, id, actor, reason)?;

    Ok(Json(serde_json::json!({
        "success": true,
        "message": "Booking cancelled successfully",
    })))
}
