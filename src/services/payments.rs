use std::sync::Arc;

use chrono::Utc;
use hmac::{Hmac, Mac};
use serde::Deserialize;
use sha2::Sha256;

use crate::db::queries;
use crate::errors::AppError;
use crate::services::gateway::GatewayOrder;
use crate::services::notify;
use crate::state::AppState;

type HmacSha256 = Hmac<Sha256>;

#[derive(Debug, Deserialize)]
pub struct CreateOrderRequest {
    pub amount: i64,
    #[serde(rename = "bookingId", default)]
    pub booking_id: Option<serde_json::Value>,
    #[serde(rename = "customerName")]
    pub customer_name: Option<String>,
    #[serde(rename = "customerEmail")]
    pub customer_email: Option<String>,
    #[serde(rename = "customerPhone")]
    pub customer_phone: Option<String>,
}

#[derive(Debug, Deserialize)]
pub struct VerifyPaymentRequest {
    pub razorpay_order_id: String,
    pub razorpay_payment_id: String,
    pub razorpay_signature: String,
    #[serde(default)]
    pub booking_id: Option<i64>,
}

/// Hex HMAC-SHA256 over `order_id|payment_id`, the signature scheme the
/// gateway signs callbacks with.
pub fn expected_signature(secret: &str, order_id: &str, payment_id: &str) -> Option<String> {
    let mut mac = HmacSha256::new_from_slice(secret.as_bytes()).ok()?;
    mac.update(order_id.as_bytes());
    mac.update(b"|");
    mac.update(payment_id.as_bytes());
    Some(hex::encode(mac.finalize().into_bytes()))
}

pub fn signature_matches(secret: &str, order_id: &str, payment_id: &str, supplied: &str) -> bool {
    match expected_signature(secret, order_id, payment_id) {
        Some(expected) => expected.eq_ignore_ascii_case(supplied.trim()),
        None => false,
    }
}

/// Booking reference for the row linkage. Synthetic ids from checkout test
/// runs (prefixed `test_`) stay unlinked so they never touch a real booking.
fn linked_booking_id(value: Option<&serde_json::Value>) -> Option<i64> {
    match value? {
        serde_json::Value::Number(n) => n.as_i64(),
        serde_json::Value::String(s) if s.starts_with("test_") => None,
        serde_json::Value::String(s) => s.trim().parse().ok(),
        _ => None,
    }
}

/// Raw reference used in the order receipt, kept verbatim even when the
/// booking is not linked.
fn booking_ref_label(value: Option<&serde_json::Value>) -> Option<String> {
    match value? {
        serde_json::Value::Number(n) => Some(n.to_string()),
        serde_json::Value::String(s) if !s.trim().is_empty() => Some(s.trim().to_string()),
        _ => None,
    }
}

pub async fn create_order(
    state: &Arc<AppState>,
    req: &CreateOrderRequest,
) -> Result<(GatewayOrder, i64), AppError> {
    if req.amount < state.config.min_order_amount {
        return Err(AppError::AmountTooSmall(state.config.min_order_amount));
    }

    let booking_id = linked_booking_id(req.booking_id.as_ref());
    let receipt = match booking_ref_label(req.booking_id.as_ref()) {
        Some(label) => format!("booking_{label}"),
        None => format!("booking_{}", Utc::now().timestamp_millis()),
    };
    let notes = serde_json::json!({
        "booking_id": req.booking_id,
        "customer_name": req.customer_name,
        "customer_email": req.customer_email,
        "customer_phone": req.customer_phone,
    });

    // Gateway amounts are in paise.
    let order = state
        .gateway
        .create_order(req.amount * 100, "INR", &receipt, notes)
        .await
        .map_err(AppError::Gateway)?;

    let payment_row_id = {
        let db = state.db.lock().unwrap();
        queries::insert_payment(
            &db,
            &order.id,
            booking_id,
            req.amount,
            req.customer_name.as_deref(),
            req.customer_email.as_deref(),
            req.customer_phone.as_deref(),
        )?
    };

    tracing::info!(order_id = %order.id, amount = req.amount, booking_id, "payment order created");
    Ok((order, payment_row_id))
}

pub fn verify_payment(
    state: &Arc<AppState>,
    req: &VerifyPaymentRequest,
) -> Result<(), AppError> {
    if !signature_matches(
        &state.config.razorpay_key_secret,
        &req.razorpay_order_id,
        &req.razorpay_payment_id,
        &req.razorpay_signature,
    ) {
        tracing::warn!(order_id = %req.razorpay_order_id, "payment signature mismatch");
        return Err(AppError::SignatureMismatch);
    }

    let mail_payload = {
        let mut db = state.db.lock().unwrap();
        let tx = db.transaction()?;

        let Some(payment) = queries::get_payment_by_order(&tx, &req.razorpay_order_id)? else {
            return Err(AppError::NotFound("Payment not found"));
        };

        queries::complete_payment(
            &tx,
            &req.razorpay_order_id,
            &req.razorpay_payment_id,
            &req.razorpay_signature,
        )?;

        // The linkage recorded at order time wins over whatever the client
        // sends back with the callback.
        let booking_id = payment.booking_id.or(req.booking_id);
        if let Some(booking_id) = booking_id {
            queries::mark_booking_paid(&tx, booking_id, &req.razorpay_payment_id)?;
        }

        let detail = match booking_id {
            Some(booking_id) => queries::get_booking_detail(&tx, booking_id)?,
            None => None,
        };
        let payment = queries::get_payment_by_order(&tx, &req.razorpay_order_id)?;

        tx.commit()?;
        detail.zip(payment)
    };

    tracing::info!(
        order_id = %req.razorpay_order_id,
        payment_id = %req.razorpay_payment_id,
        "payment verified"
    );
    if let Some((detail, payment)) = mail_payload {
        notify::dispatch(state, notify::payment_emails(&state.config, &detail, &payment));
    }

    Ok(())
}
