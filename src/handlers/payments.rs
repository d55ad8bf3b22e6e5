use std::sync::Arc;

use axum::extract::{Path, Query, State};
use axum::http::HeaderMap;
use axum::Json;
use serde::{Deserialize, Serialize};

use crate::db::queries::{self, PaymentDetail};
use crate::errors::AppError;
use crate::services::gateway::GatewayOrder;
use crate::services::payments::{self, CreateOrderRequest, VerifyPaymentRequest};
use crate::state::AppState;

use super::Pagination;

// POST /api/payments/create-order
#[derive(Serialize)]
pub struct CreateOrderResponse {
    success: bool,
    order: GatewayOrder,
    #[serde(rename = "paymentId")]
    payment_id: i64,
}

pub async fn create_order(
    State(state): State<Arc<AppState>>,
    Json(req): Json<CreateOrderRequest>,
) -> Result<Json<CreateOrderResponse>, AppError> {
    let (order, payment_id) = payments::create_order(&state, &req).await?;
    Ok(Json(CreateOrderResponse {
        success: true,
        order,
        payment_id,
    }))
}

// POST /api/payments/verify
pub async fn verify(
    State(state): State<Arc<AppState>>,
    Json(req): Json<VerifyPaymentRequest>,
) -> Result<Json<serde_json::Value>, AppError> {
    payments::verify_payment(&state, &req)?;
    Ok(Json(serde_json::json!({
        "success": true,
        "message": "Payment verified successfully",
        "payment_id": req.razorpay_payment_id,
    })))
}

// GET /api/payments/admin/all
#[derive(Deserialize)]
pub struct PaymentListQuery {
    pub status: Option<String>,
    pub limit: Option<i64>,
    pub offset: Option<i64>,
}

#[derive(Serialize)]
pub struct PaymentListResponse {
    success: bool,
    payments: Vec<PaymentDetail>,
    pagination: Pagination,
}

pub async fn admin_list(
    State(state): State<Arc<AppState>>,
    headers: HeaderMap,
    Query(q): Query<PaymentListQuery>,
) -> Result<Json<PaymentListResponse>, AppError> {
    state.admin_auth.authorize(&headers)?;

    let limit = q.limit.unwrap_or(50).max(1);
    let offset = q.offset.unwrap_or(0).max(0);
    let (payments, total) = {
        let db = state.db.lock().unwrap();
        queries::list_payments(&db, q.status.as_deref().filter(|s| !s.is_empty()), limit, offset)?
    };

    let pagination = Pagination::new(total, limit, offset, payments.len());
    Ok(Json(PaymentListResponse {
        success: true,
        payments,
        pagination,
    }))
}

// GET /api/payments/:payment_id
#[derive(Serialize)]
pub struct PaymentDetailResponse {
    success: bool,
    payment: PaymentDetail,
}

pub async fn detail(
    State(state): State<Arc<AppState>>,
    headers: HeaderMap,
    Path(payment_id): Path<String>,
) -> Result<Json<PaymentDetailResponse>, AppError> {
    state.admin_auth.authorize(&headers)?;

    let payment = {
        let db = state.db.lock().unwrap();
        queries::get_payment_detail(&db, &payment_id)?
    };
    let payment = payment.ok_or(AppError::NotFound("Payment not found"))?;
    Ok(Json(PaymentDetailResponse {
        success: true,
        payment,
    }))
}
