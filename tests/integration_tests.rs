use std::sync::{Arc, Mutex};
use std::time::Instant;

use async_trait::async_trait;
use axum::body::Body;
use axum::http::{Request, StatusCode};
use chrono::{Duration, Utc};
use tower::ServiceExt;

use studiobook::config::AppConfig;
use studiobook::db::{self, queries};
use studiobook::handlers;
use studiobook::services::auth::StaticKeyAuthenticator;
use studiobook::services::gateway::{GatewayOrder, PaymentGateway};
use studiobook::services::mailer::{EmailProvider, OutgoingEmail};
use studiobook::services::payments;
use studiobook::state::AppState;

// ── Mock Providers ──

/// Gateway that never leaves the process. Hands out sequential order ids
/// and records what was asked of it.
struct MockGateway {
    orders: Arc<Mutex<Vec<(i64, String)>>>,
}

impl MockGateway {
    fn new() -> Self {
        Self {
            orders: Arc::new(Mutex::new(Vec::new())),
        }
    }
}

#[async_trait]
impl PaymentGateway for MockGateway {
    async fn create_order(
        &self,
        amount_paise: i64,
        currency: &str,
        receipt: &str,
        _notes: serde_json::Value,
    ) -> anyhow::Result<GatewayOrder> {
        let mut orders = self.orders.lock().unwrap();
        orders.push((amount_paise, receipt.to_string()));
        Ok(GatewayOrder {
            id: format!("order_test_{}", orders.len()),
            amount: amount_paise,
            currency: currency.to_string(),
            receipt: Some(receipt.to_string()),
            status: "created".to_string(),
        })
    }
}

struct MockMailer {
    sent: Arc<Mutex<Vec<(String, String)>>>,
}

impl MockMailer {
    fn new() -> Self {
        Self {
            sent: Arc::new(Mutex::new(Vec::new())),
        }
    }
}

#[async_trait]
impl EmailProvider for MockMailer {
    async fn send(&self, email: &OutgoingEmail) -> anyhow::Result<()> {
        self.sent
            .lock()
            .unwrap()
            .push((email.to.clone(), email.subject.clone()));
        Ok(())
    }
}

// ── Helpers ──

fn test_config() -> AppConfig {
    AppConfig {
        port: 3000,
        database_url: ":memory:".to_string(),
        environment: "test".to_string(),
        admin_api_key: "test-admin-key".to_string(),
        admin_email: "admin@example.com".to_string(),
        admin_password: "admin123".to_string(),
        razorpay_key_id: "rzp_test_key".to_string(),
        razorpay_key_secret: "test_secret".to_string(),
        resend_api_key: String::new(),
        from_email: "studio@example.com".to_string(),
        allowed_origins: vec![],
        min_order_amount: 100,
        enforce_status_graph: false,
    }
}

fn test_state_with_config(config: AppConfig) -> Arc<AppState> {
    let conn = db::init_db(":memory:").unwrap();
    let admin_key = config.admin_api_key.clone();
    Arc::new(AppState {
        db: Arc::new(Mutex::new(conn)),
        config,
        gateway: Box::new(MockGateway::new()),
        mailer: Box::new(MockMailer::new()),
        admin_auth: Box::new(StaticKeyAuthenticator::new(admin_key)),
        started_at: Instant::now(),
    })
}

fn test_state() -> Arc<AppState> {
    test_state_with_config(test_config())
}

/// Like `test_state` but exposes the mailer's log so tests can assert on
/// delivered email.
fn test_state_with_sent() -> (Arc<AppState>, Arc<Mutex<Vec<(String, String)>>>) {
    let config = test_config();
    let conn = db::init_db(":memory:").unwrap();
    let mailer = MockMailer::new();
    let sent = Arc::clone(&mailer.sent);
    let admin_key = config.admin_api_key.clone();
    let state = Arc::new(AppState {
        db: Arc::new(Mutex::new(conn)),
        config,
        gateway: Box::new(MockGateway::new()),
        mailer: Box::new(mailer),
        admin_auth: Box::new(StaticKeyAuthenticator::new(admin_key)),
        started_at: Instant::now(),
    });
    (state, sent)
}

fn test_app(state: Arc<AppState>) -> axum::Router {
    handlers::router(state)
}

fn get(uri: &str) -> Request<Body> {
    Request::builder()
        .method("GET")
        .uri(uri)
        .body(Body::empty())
        .unwrap()
}

fn admin_get(uri: &str) -> Request<Body> {
    Request::builder()
        .method("GET")
        .uri(uri)
        .header("admin-key", "test-admin-key")
        .body(Body::empty())
        .unwrap()
}

fn admin_empty(method: &str, uri: &str) -> Request<Body> {
    Request::builder()
        .method(method)
        .uri(uri)
        .header("admin-key", "test-admin-key")
        .body(Body::empty())
        .unwrap()
}

fn json_request(method: &str, uri: &str, body: serde_json::Value) -> Request<Body> {
    Request::builder()
        .method(method)
        .uri(uri)
        .header("Content-Type", "application/json")
        .body(Body::from(body.to_string()))
        .unwrap()
}

fn admin_json_request(method: &str, uri: &str, body: serde_json::Value) -> Request<Body> {
    Request::builder()
        .method(method)
        .uri(uri)
        .header("Content-Type", "application/json")
        .header("admin-key", "test-admin-key")
        .body(Body::from(body.to_string()))
        .unwrap()
}

fn bearer_json_request(
    method: &str,
    uri: &str,
    token: &str,
    body: serde_json::Value,
) -> Request<Body> {
    Request::builder()
        .method(method)
        .uri(uri)
        .header("Content-Type", "application/json")
        .header("Authorization", format!("Bearer {token}"))
        .body(Body::from(body.to_string()))
        .unwrap()
}

async fn body_json(res: axum::response::Response) -> serde_json::Value {
    let bytes = axum::body::to_bytes(res.into_body(), usize::MAX)
        .await
        .unwrap();
    serde_json::from_slice(&bytes).unwrap()
}

fn booking_body(date: &str, time: &str) -> serde_json::Value {
    serde_json::json!({
        "name": "Asha Verma",
        "email": "asha@example.com",
        "phone": "9876543210",
        "service": "wedding-basic",
        "price": 25000,
        "date": date,
        "time": time,
        "location": "Rose Garden, Jaipur"
    })
}

/// Creates a booking through the public endpoint and returns its id.
async fn create_booking(state: &Arc<AppState>, token: Option<&str>, date: &str, time: &str) -> i64 {
    let mut builder = Request::builder()
        .method("POST")
        .uri("/api/booking")
        .header("Content-Type", "application/json");
    if let Some(token) = token {
        builder = builder.header("Authorization", format!("Bearer {token}"));
    }
    let req = builder
        .body(Body::from(booking_body(date, time).to_string()))
        .unwrap();

    let res = test_app(state.clone()).oneshot(req).await.unwrap();
    assert_eq!(res.status(), StatusCode::CREATED);
    let json = body_json(res).await;
    json["booking"]["id"].as_i64().unwrap()
}

/// Registers a user and returns their session token.
async fn register_user(state: &Arc<AppState>, name: &str, email: &str) -> String {
    let res = test_app(state.clone())
        .oneshot(json_request(
            "POST",
            "/api/auth/register",
            serde_json::json!({
                "name": name,
                "email": email,
                "phone": "9876543210",
                "password": "secret123"
            }),
        ))
        .await
        .unwrap();
    assert_eq!(res.status(), StatusCode::CREATED);
    let json = body_json(res).await;
    json["token"].as_str().unwrap().to_string()
}

// ── Health & Routing ──

#[tokio::test]
async fn test_health_endpoint() {
    let state = test_state();
    let res = test_app(state).oneshot(get("/api/health")).await.unwrap();

    assert_eq!(res.status(), StatusCode::OK);
    let json = body_json(res).await;
    assert_eq!(json["success"], true);
    assert_eq!(json["message"], "StudioBook API is healthy");
    assert_eq!(json["environment"], "test");
}

#[tokio::test]
async fn test_unknown_route_returns_structured_404() {
    let state = test_state();
    let res = test_app(state)
        .oneshot(get("/api/does-not-exist"))
        .await
        .unwrap();

    assert_eq!(res.status(), StatusCode::NOT_FOUND);
    let json = body_json(res).await;
    assert_eq!(json["success"], false);
    assert_eq!(json["message"], "API endpoint not found");
    assert_eq!(json["requestedUrl"], "/api/does-not-exist");
}

// ── Bookings ──

#[tokio::test]
async fn test_create_booking() {
    let state = test_state();
    let res = test_app(state.clone())
        .oneshot(json_request(
            "POST",
            "/api/booking",
            booking_body("2030-06-15", "10:00"),
        ))
        .await
        .unwrap();

    assert_eq!(res.status(), StatusCode::CREATED);
    let json = body_json(res).await;
    assert_eq!(json["success"], true);
    assert_eq!(json["message"], "Booking created successfully");
    assert_eq!(json["booking"]["customer_name"], "Asha Verma");
    assert_eq!(json["booking"]["service_name"], "Wedding Basic");
    assert_eq!(json["booking"]["booking_status"], "pending");
    assert_eq!(json["booking"]["payment_status"], "pending");
}

#[tokio::test]
async fn test_create_booking_rejects_bad_fields() {
    let state = test_state();
    let res = test_app(state)
        .oneshot(json_request(
            "POST",
            "/api/booking",
            serde_json::json!({
                "name": "A",
                "email": "not-an-email",
                "phone": "12345",
                "service": "wedding-basic",
                "price": 25000,
                "date": "15-06-2030",
                "time": "ten",
                "location": ""
            }),
        ))
        .await
        .unwrap();

    assert_eq!(res.status(), StatusCode::BAD_REQUEST);
    let json = body_json(res).await;
    assert_eq!(json["success"], false);
    let errors = json["errors"].as_array().unwrap();
    let fields: Vec<&str> = errors
        .iter()
        .map(|e| e["field"].as_str().unwrap())
        .collect();
    for field in ["name", "email", "phone", "date", "time", "location"] {
        assert!(fields.contains(&field), "missing error for {field}: {json}");
    }
}

#[tokio::test]
async fn test_create_booking_rejects_unknown_service() {
    let state = test_state();
    let mut body = booking_body("2030-06-15", "10:00");
    body["service"] = serde_json::json!("underwater-drone");

    let res = test_app(state)
        .oneshot(json_request("POST", "/api/booking", body))
        .await
        .unwrap();

    assert_eq!(res.status(), StatusCode::BAD_REQUEST);
    let json = body_json(res).await;
    assert_eq!(json["message"], "Invalid service selected: underwater-drone");
}

#[tokio::test]
async fn test_slot_conflict_only_after_confirmation() {
    let state = test_state();
    let first = create_booking(&state, None, "2030-06-15", "10:00").await;

    // Pending bookings don't hold the slot.
    let res = test_app(state.clone())
        .oneshot(json_request(
            "POST",
            "/api/booking",
            booking_body("2030-06-15", "10:00"),
        ))
        .await
        .unwrap();
    assert_eq!(res.status(), StatusCode::CREATED);

    let res = test_app(state.clone())
        .oneshot(admin_json_request(
            "PUT",
            &format!("/api/bookings/admin/{first}/status"),
            serde_json::json!({"booking_status": "confirmed"}),
        ))
        .await
        .unwrap();
    assert_eq!(res.status(), StatusCode::OK);

    let res = test_app(state.clone())
        .oneshot(json_request(
            "POST",
            "/api/booking",
            booking_body("2030-06-15", "10:00"),
        ))
        .await
        .unwrap();
    assert_eq!(res.status(), StatusCode::CONFLICT);
    let json = body_json(res).await;
    assert_eq!(
        json["message"],
        "This time slot is already booked. Please choose a different time."
    );

    // A different time on the same day is fine.
    let res = test_app(state)
        .oneshot(json_request(
            "POST",
            "/api/booking",
            booking_body("2030-06-15", "16:00"),
        ))
        .await
        .unwrap();
    assert_eq!(res.status(), StatusCode::CREATED);
}

#[tokio::test]
async fn test_my_bookings_requires_session_and_lists_own() {
    let state = test_state();

    let res = test_app(state.clone())
        .oneshot(get("/api/bookings/my-bookings"))
        .await
        .unwrap();
    assert_eq!(res.status(), StatusCode::UNAUTHORIZED);

    let token = register_user(&state, "Asha Verma", "asha@example.com").await;
    create_booking(&state, Some(&token), "2030-06-15", "10:00").await;
    // Anonymous booking should not show up under this account.
    create_booking(&state, None, "2030-06-16", "10:00").await;

    let res = test_app(state)
        .oneshot(
            Request::builder()
                .method("GET")
                .uri("/api/bookings/my-bookings")
                .header("Authorization", format!("Bearer {token}"))
                .body(Body::empty())
                .unwrap(),
        )
        .await
        .unwrap();
    assert_eq!(res.status(), StatusCode::OK);
    let json = body_json(res).await;
    let bookings = json["bookings"].as_array().unwrap();
    assert_eq!(bookings.len(), 1, "got: {json}");
}

#[tokio::test]
async fn test_owner_can_cancel_but_only_once() {
    let state = test_state();
    let token = register_user(&state, "Asha Verma", "asha@example.com").await;
    let id = create_booking(&state, Some(&token), "2030-06-15", "10:00").await;

    let res = test_app(state.clone())
        .oneshot(bearer_json_request(
            "PUT",
            &format!("/api/bookings/{id}/cancel"),
            &token,
            serde_json::json!({"reason": "Change of plans"}),
        ))
        .await
        .unwrap();
    assert_eq!(res.status(), StatusCode::OK);
    let json = body_json(res).await;
    assert_eq!(json["message"], "Booking cancelled successfully");

    let res = test_app(state.clone())
        .oneshot(bearer_json_request(
            "PUT",
            &format!("/api/bookings/{id}/cancel"),
            &token,
            serde_json::json!({}),
        ))
        .await
        .unwrap();
    assert_eq!(res.status(), StatusCode::BAD_REQUEST);
    let json = body_json(res).await;
    assert_eq!(json["message"], "Booking is already cancelled");

    {
        let db = state.db.lock().unwrap();
        let booking = queries::get_booking(&db, id).unwrap().unwrap();
        assert_eq!(booking.booking_status.as_str(), "cancelled");
        let notes = booking.special_requirements.unwrap_or_default();
        assert!(
            notes.contains("Cancellation reason: Change of plans"),
            "got: {notes}"
        );
    }
}

#[tokio::test]
async fn test_cancel_denied_for_other_users_and_completed_bookings() {
    let state = test_state();
    let owner = register_user(&state, "Asha Verma", "asha@example.com").await;
    let stranger = register_user(&state, "Rahul Jain", "rahul@example.com").await;
    let id = create_booking(&state, Some(&owner), "2030-06-15", "10:00").await;

    // Someone else's booking looks like it doesn't exist.
    let res = test_app(state.clone())
        .oneshot(bearer_json_request(
            "PUT",
            &format!("/api/bookings/{id}/cancel"),
            &stranger,
            serde_json::json!({}),
        ))
        .await
        .unwrap();
    assert_eq!(res.status(), StatusCode::NOT_FOUND);

    let res = test_app(state.clone())
        .oneshot(admin_json_request(
            "PUT",
            &format!("/api/bookings/admin/{id}/status"),
            serde_json::json!({"booking_status": "completed"}),
        ))
        .await
        .unwrap();
    assert_eq!(res.status(), StatusCode::OK);

    let res = test_app(state)
        .oneshot(bearer_json_request(
            "PUT",
            &format!("/api/bookings/{id}/cancel"),
            &owner,
            serde_json::json!({}),
        ))
        .await
        .unwrap();
    assert_eq!(res.status(), StatusCode::BAD_REQUEST);
    let json = body_json(res).await;
    assert_eq!(json["message"], "Cannot cancel completed booking");
}

#[tokio::test]
async fn test_admin_key_can_cancel_any_booking() {
    let state = test_state();
    let id = create_booking(&state, None, "2030-06-15", "10:00").await;

    let res = test_app(state.clone())
        .oneshot(admin_empty("PUT", &format!("/api/bookings/{id}/cancel")))
        .await
        .unwrap();
    assert_eq!(res.status(), StatusCode::OK);

    {
        let db = state.db.lock().unwrap();
        let booking = queries::get_booking(&db, id).unwrap().unwrap();
        assert_eq!(booking.booking_status.as_str(), "cancelled");
        let notes = booking.special_requirements.unwrap_or_default();
        assert!(notes.contains("No reason provided"), "got: {notes}");
    }
}

#[tokio::test]
async fn test_admin_booking_list_filters_and_paginates() {
    let state = test_state();
    create_booking(&state, None, "2030-06-15", "10:00").await;
    create_booking(&state, None, "2030-06-16", "11:00").await;
    create_booking(&state, None, "2030-07-01", "12:00").await;

    let res = test_app(state.clone())
        .oneshot(admin_get("/api/bookings/admin/all?limit=2&offset=0"))
        .await
        .unwrap();
    assert_eq!(res.status(), StatusCode::OK);
    let json = body_json(res).await;
    assert_eq!(json["bookings"].as_array().unwrap().len(), 2);
    assert_eq!(json["pagination"]["total"], 3);
    assert_eq!(json["pagination"]["hasMore"], true);

    let res = test_app(state.clone())
        .oneshot(admin_get(
            "/api/bookings/admin/all?dateFrom=2030-07-01&dateTo=2030-07-31",
        ))
        .await
        .unwrap();
    let json = body_json(res).await;
    assert_eq!(json["bookings"].as_array().unwrap().len(), 1, "got: {json}");

    let res = test_app(state)
        .oneshot(admin_get("/api/bookings/admin/all?status=cancelled"))
        .await
        .unwrap();
    let json = body_json(res).await;
    assert_eq!(json["bookings"].as_array().unwrap().len(), 0);
}

#[tokio::test]
async fn test_booking_analytics_shape() {
    let state = test_state();
    create_booking(&state, None, "2030-06-15", "10:00").await;

    let res = test_app(state)
        .oneshot(admin_get("/api/bookings/admin/analytics"))
        .await
        .unwrap();
    assert_eq!(res.status(), StatusCode::OK);
    let json = body_json(res).await;
    assert_eq!(json["success"], true);
    assert_eq!(json["analytics"]["totalBookings"], 1);
    assert_eq!(json["analytics"]["pendingBookings"], 1);
    assert_eq!(json["analytics"]["totalRevenue"], 0);
    assert!(json["analytics"]["popularServices"].is_array());
    assert!(json["analytics"]["monthlyTrends"].is_array());
}

// ── Payments ──

#[tokio::test]
async fn test_create_order_enforces_minimum_amount() {
    let state = test_state();
    let res = test_app(state)
        .oneshot(json_request(
            "POST",
            "/api/payments/create-order",
            serde_json::json!({"amount": 50}),
        ))
        .await
        .unwrap();

    assert_eq!(res.status(), StatusCode::BAD_REQUEST);
    let json = body_json(res).await;
    assert_eq!(json["message"], "Invalid amount. Minimum ₹100 required.");
}

#[tokio::test]
async fn test_create_order_links_booking_and_converts_to_paise() {
    let state = test_state();
    let id = create_booking(&state, None, "2030-06-15", "10:00").await;

    let res = test_app(state.clone())
        .oneshot(json_request(
            "POST",
            "/api/payments/create-order",
            serde_json::json!({
                "amount": 25000,
                "bookingId": id,
                "customerName": "Asha Verma",
                "customerEmail": "asha@example.com"
            }),
        ))
        .await
        .unwrap();

    assert_eq!(res.status(), StatusCode::OK);
    let json = body_json(res).await;
    assert_eq!(json["success"], true);
    assert_eq!(json["order"]["id"], "order_test_1");
    assert_eq!(json["order"]["amount"], 2_500_000);
    assert_eq!(json["order"]["currency"], "INR");
    assert_eq!(json["order"]["receipt"], format!("booking_{id}"));
    let payment_row = json["paymentId"].as_i64().unwrap();

    {
        let db = state.db.lock().unwrap();
        let payment = queries::get_payment_by_order(&db, "order_test_1")
            .unwrap()
            .unwrap();
        assert_eq!(payment.id, payment_row);
        assert_eq!(payment.booking_id, Some(id));
        assert_eq!(payment.amount, 25000);
        assert_eq!(payment.status.as_str(), "created");
    }
}

#[tokio::test]
async fn test_create_order_with_test_reference_stays_unlinked() {
    let state = test_state();
    let res = test_app(state.clone())
        .oneshot(json_request(
            "POST",
            "/api/payments/create-order",
            serde_json::json!({"amount": 500, "bookingId": "test_widget_demo"}),
        ))
        .await
        .unwrap();

    assert_eq!(res.status(), StatusCode::OK);
    let json = body_json(res).await;
    assert_eq!(json["order"]["receipt"], "booking_test_widget_demo");

    {
        let db = state.db.lock().unwrap();
        let payment = queries::get_payment_by_order(&db, "order_test_1")
            .unwrap()
            .unwrap();
        assert_eq!(payment.booking_id, None, "test references must not link");
    }
}

#[tokio::test]
async fn test_verify_payment_completes_and_is_idempotent() {
    let state = test_state();
    let id = create_booking(&state, None, "2030-06-15", "10:00").await;

    let res = test_app(state.clone())
        .oneshot(json_request(
            "POST",
            "/api/payments/create-order",
            serde_json::json!({"amount": 25000, "bookingId": id}),
        ))
        .await
        .unwrap();
    assert_eq!(res.status(), StatusCode::OK);

    let signature =
        payments::expected_signature("test_secret", "order_test_1", "pay_test_1").unwrap();
    let verify_body = serde_json::json!({
        "razorpay_order_id": "order_test_1",
        "razorpay_payment_id": "pay_test_1",
        "razorpay_signature": signature,
    });

    let res = test_app(state.clone())
        .oneshot(json_request(
            "POST",
            "/api/payments/verify",
            verify_body.clone(),
        ))
        .await
        .unwrap();
    assert_eq!(res.status(), StatusCode::OK);
    let json = body_json(res).await;
    assert_eq!(json["success"], true);
    assert_eq!(json["message"], "Payment verified successfully");

    {
        let db = state.db.lock().unwrap();
        let payment = queries::get_payment_by_order(&db, "order_test_1")
            .unwrap()
            .unwrap();
        assert_eq!(payment.status.as_str(), "completed");
        assert_eq!(payment.payment_id.as_deref(), Some("pay_test_1"));

        let booking = queries::get_booking(&db, id).unwrap().unwrap();
        assert_eq!(booking.payment_status.as_str(), "paid");
        assert_eq!(booking.booking_status.as_str(), "confirmed");
        assert_eq!(booking.razorpay_payment_id.as_deref(), Some("pay_test_1"));
    }

    // Gateways retry callbacks; a replay must succeed without complaint.
    let res = test_app(state)
        .oneshot(json_request("POST", "/api/payments/verify", verify_body))
        .await
        .unwrap();
    assert_eq!(res.status(), StatusCode::OK);
}

#[tokio::test]
async fn test_verify_rejects_tampered_signature_without_side_effects() {
    let state = test_state();
    let id = create_booking(&state, None, "2030-06-15", "10:00").await;

    let res = test_app(state.clone())
        .oneshot(json_request(
            "POST",
            "/api/payments/create-order",
            serde_json::json!({"amount": 25000, "bookingId": id}),
        ))
        .await
        .unwrap();
    assert_eq!(res.status(), StatusCode::OK);

    let res = test_app(state.clone())
        .oneshot(json_request(
            "POST",
            "/api/payments/verify",
            serde_json::json!({
                "razorpay_order_id": "order_test_1",
                "razorpay_payment_id": "pay_test_1",
                "razorpay_signature": "deadbeef".repeat(8),
            }),
        ))
        .await
        .unwrap();
    assert_eq!(res.status(), StatusCode::BAD_REQUEST);
    let json = body_json(res).await;
    assert_eq!(json["message"], "Payment verification failed");

    {
        let db = state.db.lock().unwrap();
        let payment = queries::get_payment_by_order(&db, "order_test_1")
            .unwrap()
            .unwrap();
        assert_eq!(payment.status.as_str(), "created");
        let booking = queries::get_booking(&db, id).unwrap().unwrap();
        assert_eq!(booking.payment_status.as_str(), "pending");
        assert_eq!(booking.booking_status.as_str(), "pending");
    }
}

#[tokio::test]
async fn test_verify_unknown_order_is_404() {
    let state = test_state();
    let signature =
        payments::expected_signature("test_secret", "order_nowhere", "pay_test_9").unwrap();

    let res = test_app(state)
        .oneshot(json_request(
            "POST",
            "/api/payments/verify",
            serde_json::json!({
                "razorpay_order_id": "order_nowhere",
                "razorpay_payment_id": "pay_test_9",
                "razorpay_signature": signature,
            }),
        ))
        .await
        .unwrap();

    assert_eq!(res.status(), StatusCode::NOT_FOUND);
    let json = body_json(res).await;
    assert_eq!(json["message"], "Payment not found");
}

#[tokio::test]
async fn test_payment_admin_list_and_detail() {
    let state = test_state();
    let id = create_booking(&state, None, "2030-06-15", "10:00").await;

    let res = test_app(state.clone())
        .oneshot(json_request(
            "POST",
            "/api/payments/create-order",
            serde_json::json!({"amount": 25000, "bookingId": id}),
        ))
        .await
        .unwrap();
    let payment_row = body_json(res).await["paymentId"].as_i64().unwrap();

    let res = test_app(state.clone())
        .oneshot(admin_get("/api/payments/admin/all"))
        .await
        .unwrap();
    assert_eq!(res.status(), StatusCode::OK);
    let json = body_json(res).await;
    assert_eq!(json["payments"].as_array().unwrap().len(), 1);
    assert_eq!(json["pagination"]["total"], 1);
    assert_eq!(json["payments"][0]["booking_customer"], "Asha Verma");

    let res = test_app(state.clone())
        .oneshot(admin_get(&format!("/api/payments/{payment_row}")))
        .await
        .unwrap();
    assert_eq!(res.status(), StatusCode::OK);
    let json = body_json(res).await;
    assert_eq!(json["payment"]["order_id"], "order_test_1");

    let res = test_app(state)
        .oneshot(admin_get("/api/payments/pay_unknown"))
        .await
        .unwrap();
    assert_eq!(res.status(), StatusCode::NOT_FOUND);
}

// ── Auth ──

#[tokio::test]
async fn test_register_login_and_me() {
    let state = test_state();

    let res = test_app(state.clone())
        .oneshot(json_request(
            "POST",
            "/api/auth/register",
            serde_json::json!({
                "name": "Asha Verma",
                "email": "  Asha@Example.COM ",
                "password": "secret123"
            }),
        ))
        .await
        .unwrap();
    assert_eq!(res.status(), StatusCode::CREATED);
    let json = body_json(res).await;
    assert_eq!(json["message"], "User registered successfully");
    assert_eq!(json["user"]["email"], "asha@example.com");
    assert_eq!(json["user"]["role"], "customer");
    assert!(json["user"]["password_hash"].is_null(), "hash must not leak");

    let res = test_app(state.clone())
        .oneshot(json_request(
            "POST",
            "/api/auth/login",
            serde_json::json!({"email": "asha@example.com", "password": "secret123"}),
        ))
        .await
        .unwrap();
    assert_eq!(res.status(), StatusCode::OK);
    let json = body_json(res).await;
    assert_eq!(json["message"], "Login successful");
    let token = json["token"].as_str().unwrap().to_string();

    let res = test_app(state)
        .oneshot(
            Request::builder()
                .method("GET")
                .uri("/api/auth/me")
                .header("Authorization", format!("Bearer {token}"))
                .body(Body::empty())
                .unwrap(),
        )
        .await
        .unwrap();
    assert_eq!(res.status(), StatusCode::OK);
    let json = body_json(res).await;
    assert_eq!(json["user"]["name"], "Asha Verma");
}

#[tokio::test]
async fn test_register_rejects_duplicate_email() {
    let state = test_state();
    register_user(&state, "Asha Verma", "asha@example.com").await;

    let res = test_app(state)
        .oneshot(json_request(
            "POST",
            "/api/auth/register",
            serde_json::json!({
                "name": "Another Asha",
                "email": "ASHA@example.com",
                "password": "different1"
            }),
        ))
        .await
        .unwrap();

    assert_eq!(res.status(), StatusCode::BAD_REQUEST);
    let json = body_json(res).await;
    assert_eq!(json["errors"][0]["field"], "email");
    assert_eq!(
        json["errors"][0]["message"],
        "User with this email already exists"
    );
}

#[tokio::test]
async fn test_login_rejects_wrong_password() {
    let state = test_state();
    register_user(&state, "Asha Verma", "asha@example.com").await;

    let res = test_app(state.clone())
        .oneshot(json_request(
            "POST",
            "/api/auth/login",
            serde_json::json!({"email": "asha@example.com", "password": "wrong"}),
        ))
        .await
        .unwrap();
    assert_eq!(res.status(), StatusCode::UNAUTHORIZED);
    let json = body_json(res).await;
    assert_eq!(json["message"], "Invalid email or password");

    // Unknown accounts get the same answer as bad passwords.
    let res = test_app(state)
        .oneshot(json_request(
            "POST",
            "/api/auth/login",
            serde_json::json!({"email": "nobody@example.com", "password": "secret123"}),
        ))
        .await
        .unwrap();
    assert_eq!(res.status(), StatusCode::UNAUTHORIZED);
    let json = body_json(res).await;
    assert_eq!(json["message"], "Invalid email or password");
}

#[tokio::test]
async fn test_logout_invalidates_session() {
    let state = test_state();
    let token = register_user(&state, "Asha Verma", "asha@example.com").await;

    let res = test_app(state.clone())
        .oneshot(
            Request::builder()
                .method("POST")
                .uri("/api/auth/logout")
                .header("Authorization", format!("Bearer {token}"))
                .body(Body::empty())
                .unwrap(),
        )
        .await
        .unwrap();
    assert_eq!(res.status(), StatusCode::OK);
    let json = body_json(res).await;
    assert_eq!(json["message"], "Logout successful");

    let res = test_app(state)
        .oneshot(
            Request::builder()
                .method("GET")
                .uri("/api/auth/me")
                .header("Authorization", format!("Bearer {token}"))
                .body(Body::empty())
                .unwrap(),
        )
        .await
        .unwrap();
    assert_eq!(res.status(), StatusCode::UNAUTHORIZED);
}

#[tokio::test]
async fn test_profile_update() {
    let state = test_state();
    let token = register_user(&state, "Asha Verma", "asha@example.com").await;

    let res = test_app(state.clone())
        .oneshot(bearer_json_request(
            "PUT",
            "/api/auth/profile",
            &token,
            serde_json::json!({"name": "Asha V. Sharma", "phone": "9123456780"}),
        ))
        .await
        .unwrap();
    assert_eq!(res.status(), StatusCode::OK);
    let json = body_json(res).await;
    assert_eq!(json["message"], "Profile updated successfully");
    assert_eq!(json["user"]["name"], "Asha V. Sharma");
    assert_eq!(json["user"]["phone"], "9123456780");

    let res = test_app(state)
        .oneshot(bearer_json_request(
            "PUT",
            "/api/auth/profile",
            &token,
            serde_json::json!({"phone": "12"}),
        ))
        .await
        .unwrap();
    assert_eq!(res.status(), StatusCode::BAD_REQUEST);
}

// ── Admin Access & Status Graph ──

#[tokio::test]
async fn test_admin_routes_require_the_key() {
    let state = test_state();

    for uri in [
        "/api/bookings/admin/all",
        "/api/payments/admin/all",
        "/api/admin/stats",
        "/api/crm/leads",
        "/api/inventory/equipment",
        "/api/notifications",
        "/api/reports/customers",
    ] {
        let res = test_app(state.clone()).oneshot(get(uri)).await.unwrap();
        assert_eq!(
            res.status(),
            StatusCode::UNAUTHORIZED,
            "expected 401 without key for {uri}"
        );

        let res = test_app(state.clone())
            .oneshot(
                Request::builder()
                    .method("GET")
                    .uri(uri)
                    .header("admin-key", "wrong-key")
                    .body(Body::empty())
                    .unwrap(),
            )
            .await
            .unwrap();
        assert_eq!(
            res.status(),
            StatusCode::UNAUTHORIZED,
            "expected 401 with wrong key for {uri}"
        );
    }
}

#[tokio::test]
async fn test_status_update_validates_values() {
    let state = test_state();
    let id = create_booking(&state, None, "2030-06-15", "10:00").await;

    let res = test_app(state.clone())
        .oneshot(admin_json_request(
            "PUT",
            &format!("/api/bookings/admin/{id}/status"),
            serde_json::json!({"booking_status": "teleported"}),
        ))
        .await
        .unwrap();
    assert_eq!(res.status(), StatusCode::BAD_REQUEST);
    let json = body_json(res).await;
    assert_eq!(json["message"], "Invalid booking status");

    let res = test_app(state)
        .oneshot(admin_json_request(
            "PUT",
            &format!("/api/bookings/admin/{id}/status"),
            serde_json::json!({"payment_status": "maybe"}),
        ))
        .await
        .unwrap();
    assert_eq!(res.status(), StatusCode::BAD_REQUEST);
    let json = body_json(res).await;
    assert_eq!(json["message"], "Invalid payment status");
}

#[tokio::test]
async fn test_status_graph_enforced_when_configured() {
    let mut config = test_config();
    config.enforce_status_graph = true;
    let state = test_state_with_config(config);
    let id = create_booking(&state, None, "2030-06-15", "10:00").await;

    // Pending can't jump straight to in_progress.
    let res = test_app(state.clone())
        .oneshot(admin_json_request(
            "PUT",
            &format!("/api/bookings/admin/{id}/status"),
            serde_json::json!({"booking_status": "in_progress"}),
        ))
        .await
        .unwrap();
    assert_eq!(res.status(), StatusCode::BAD_REQUEST);
    let json = body_json(res).await;
    assert_eq!(
        json["message"],
        "Cannot move booking from pending to in_progress"
    );

    let res = test_app(state.clone())
        .oneshot(admin_json_request(
            "PUT",
            &format!("/api/bookings/admin/{id}/status"),
            serde_json::json!({"booking_status": "confirmed"}),
        ))
        .await
        .unwrap();
    assert_eq!(res.status(), StatusCode::OK);

    let res = test_app(state)
        .oneshot(admin_json_request(
            "PUT",
            &format!("/api/bookings/admin/{id}/status"),
            serde_json::json!({"booking_status": "in_progress"}),
        ))
        .await
        .unwrap();
    assert_eq!(res.status(), StatusCode::OK);
}

#[tokio::test]
async fn test_dashboard_stats_and_expenses() {
    let state = test_state();
    create_booking(&state, None, "2030-06-15", "10:00").await;

    let res = test_app(state.clone())
        .oneshot(admin_get("/api/admin/stats"))
        .await
        .unwrap();
    assert_eq!(res.status(), StatusCode::OK);
    let json = body_json(res).await;
    assert_eq!(json["total_bookings"], 1);
    assert_eq!(json["pending_bookings"], 1);
    assert_eq!(json["total_revenue"], 0);

    let res = test_app(state.clone())
        .oneshot(admin_json_request(
            "POST",
            "/api/admin/expenses",
            serde_json::json!({
                "date": "2030-06-01",
                "description": "New 85mm lens",
                "amount": 65000,
                "category": "equipment"
            }),
        ))
        .await
        .unwrap();
    assert_eq!(res.status(), StatusCode::CREATED);
    let json = body_json(res).await;
    assert_eq!(json["message"], "Expense added successfully");

    let res = test_app(state.clone())
        .oneshot(admin_json_request(
            "POST",
            "/api/admin/expenses",
            serde_json::json!({"description": "no date or amount"}),
        ))
        .await
        .unwrap();
    assert_eq!(res.status(), StatusCode::BAD_REQUEST);

    let res = test_app(state.clone())
        .oneshot(admin_get("/api/admin/expenses"))
        .await
        .unwrap();
    let json = body_json(res).await;
    assert_eq!(json["expenses"].as_array().unwrap().len(), 1);
    assert_eq!(json["total"], 65000.0);

    let res = test_app(state)
        .oneshot(admin_get("/api/admin/monthly-pl?months=3"))
        .await
        .unwrap();
    assert_eq!(res.status(), StatusCode::OK);
}

// ── Contact ──

#[tokio::test]
async fn test_contact_submit_and_admin_flow() {
    let state = test_state();

    let res = test_app(state.clone())
        .oneshot(json_request(
            "POST",
            "/api/contact/submit",
            serde_json::json!({
                "name": "Priya Nair",
                "email": "priya@example.com",
                "subject": "Wedding quote",
                "message": "Looking for coverage on 12 Dec, two venues."
            }),
        ))
        .await
        .unwrap();
    assert_eq!(res.status(), StatusCode::CREATED);
    let json = body_json(res).await;
    assert_eq!(
        json["message"],
        "Thank you for your message! We will get back to you soon."
    );
    let message_id = json["messageId"].as_i64().unwrap();

    let res = test_app(state.clone())
        .oneshot(admin_get("/api/contact/admin/messages?is_read=false"))
        .await
        .unwrap();
    let json = body_json(res).await;
    assert_eq!(json["messages"].as_array().unwrap().len(), 1);

    let res = test_app(state.clone())
        .oneshot(admin_empty(
            "PUT",
            &format!("/api/contact/admin/messages/{message_id}/read"),
        ))
        .await
        .unwrap();
    assert_eq!(res.status(), StatusCode::OK);
    let json = body_json(res).await;
    assert_eq!(json["message"], "Message marked as read");

    let res = test_app(state.clone())
        .oneshot(admin_get("/api/contact/admin/stats"))
        .await
        .unwrap();
    let json = body_json(res).await;
    assert_eq!(json["stats"]["total_messages"], 1);
    assert_eq!(json["stats"]["unread_messages"], 0);
    assert_eq!(json["stats"]["today_messages"], 1);
    assert!(json["recentMessages"].is_array());

    let res = test_app(state.clone())
        .oneshot(admin_empty(
            "DELETE",
            &format!("/api/contact/admin/messages/{message_id}"),
        ))
        .await
        .unwrap();
    assert_eq!(res.status(), StatusCode::OK);

    let res = test_app(state)
        .oneshot(admin_empty(
            "PUT",
            &format!("/api/contact/admin/messages/{message_id}/read"),
        ))
        .await
        .unwrap();
    assert_eq!(res.status(), StatusCode::NOT_FOUND);
}

#[tokio::test]
async fn test_contact_submit_validates() {
    let state = test_state();
    let res = test_app(state)
        .oneshot(json_request(
            "POST",
            "/api/contact/submit",
            serde_json::json!({
                "name": "P",
                "email": "bad",
                "subject": "",
                "message": "short"
            }),
        ))
        .await
        .unwrap();

    assert_eq!(res.status(), StatusCode::BAD_REQUEST);
    let json = body_json(res).await;
    let fields: Vec<&str> = json["errors"]
        .as_array()
        .unwrap()
        .iter()
        .map(|e| e["field"].as_str().unwrap())
        .collect();
    for field in ["name", "email", "subject", "message"] {
        assert!(fields.contains(&field), "missing error for {field}");
    }
}

// ── Reviews ──

#[tokio::test]
async fn test_review_submission_validates() {
    let state = test_state();

    let res = test_app(state.clone())
        .oneshot(json_request(
            "POST",
            "/api/reviews/submit",
            serde_json::json!({"name": "Asha", "reviewText": "Lovely photos"}),
        ))
        .await
        .unwrap();
    assert_eq!(res.status(), StatusCode::BAD_REQUEST);
    let json = body_json(res).await;
    assert_eq!(json["message"], "Name, rating, and review text are required");

    let res = test_app(state)
        .oneshot(json_request(
            "POST",
            "/api/reviews/submit",
            serde_json::json!({"name": "Asha", "rating": 6, "reviewText": "Too good"}),
        ))
        .await
        .unwrap();
    assert_eq!(res.status(), StatusCode::BAD_REQUEST);
    let json = body_json(res).await;
    assert_eq!(json["message"], "Rating must be between 1 and 5");
}

#[tokio::test]
async fn test_review_goes_public_only_after_approval() {
    let state = test_state();

    let res = test_app(state.clone())
        .oneshot(json_request(
            "POST",
            "/api/reviews/submit",
            serde_json::json!({
                "name": "Asha Verma",
                "email": "asha@example.com",
                "rating": 5,
                "reviewText": "The team caught every moment of the ceremony."
            }),
        ))
        .await
        .unwrap();
    assert_eq!(res.status(), StatusCode::CREATED);

    let res = test_app(state.clone())
        .oneshot(get("/api/reviews"))
        .await
        .unwrap();
    let json = body_json(res).await;
    assert_eq!(
        json["reviews"].as_array().unwrap().len(),
        0,
        "unapproved reviews must stay hidden"
    );

    let review_id = {
        let res = test_app(state.clone())
            .oneshot(admin_get("/api/reviews/admin/all"))
            .await
            .unwrap();
        let json = body_json(res).await;
        json["reviews"][0]["id"].as_i64().unwrap()
    };

    let res = test_app(state.clone())
        .oneshot(admin_json_request(
            "PUT",
            &format!("/api/reviews/admin/{review_id}/approve"),
            serde_json::json!({"featured": true}),
        ))
        .await
        .unwrap();
    assert_eq!(res.status(), StatusCode::OK);
    let json = body_json(res).await;
    assert_eq!(json["message"], "Review approved successfully");

    let res = test_app(state.clone())
        .oneshot(get("/api/reviews"))
        .await
        .unwrap();
    let json = body_json(res).await;
    assert_eq!(json["reviews"].as_array().unwrap().len(), 1);

    let res = test_app(state.clone())
        .oneshot(get("/api/reviews/featured"))
        .await
        .unwrap();
    let json = body_json(res).await;
    assert_eq!(json["reviews"].as_array().unwrap().len(), 1);

    let res = test_app(state)
        .oneshot(get("/api/reviews/stats"))
        .await
        .unwrap();
    let json = body_json(res).await;
    assert_eq!(json["stats"]["total_reviews"], 1);
    assert_eq!(json["stats"]["average_rating"], 5.0);
    assert_eq!(json["stats"]["five_star"], 1);
}

// ── Reports ──

#[tokio::test]
async fn test_gst_report_requires_date_range() {
    let state = test_state();

    let res = test_app(state.clone())
        .oneshot(admin_get("/api/reports/gst"))
        .await
        .unwrap();
    assert_eq!(res.status(), StatusCode::BAD_REQUEST);
    let json = body_json(res).await;
    assert_eq!(
        json["message"],
        "Valid start and end dates required (YYYY-MM-DD)"
    );

    let res = test_app(state)
        .oneshot(admin_get(
            "/api/reports/gst?startDate=2030-04-01&endDate=2030-04-30",
        ))
        .await
        .unwrap();
    assert_eq!(res.status(), StatusCode::OK);
    let json = body_json(res).await;
    assert_eq!(json["gstRate"], "18%");
    assert_eq!(json["totalSales"], 0);
    assert!(json["transactions"].is_array());
}

#[tokio::test]
async fn test_income_tax_report_validates_financial_year() {
    let state = test_state();

    let res = test_app(state.clone())
        .oneshot(admin_get("/api/reports/income-tax?financialYear=24-25"))
        .await
        .unwrap();
    assert_eq!(res.status(), StatusCode::BAD_REQUEST);
    let json = body_json(res).await;
    assert_eq!(json["errors"][0]["field"], "financialYear");

    let res = test_app(state)
        .oneshot(admin_get("/api/reports/income-tax?financialYear=2030-31"))
        .await
        .unwrap();
    assert_eq!(res.status(), StatusCode::OK);
    let json = body_json(res).await;
    assert_eq!(json["financialYear"], "2030-31");
    assert_eq!(json["grossRevenue"], 0);
    assert_eq!(json["estimatedTax"], 0.0);
}

// ── CRM ──

#[tokio::test]
async fn test_lead_lifecycle() {
    let state = test_state();

    let res = test_app(state.clone())
        .oneshot(admin_json_request(
            "POST",
            "/api/crm/leads",
            serde_json::json!({"name": "Vikram", "phone": ""}),
        ))
        .await
        .unwrap();
    assert_eq!(res.status(), StatusCode::BAD_REQUEST);
    let json = body_json(res).await;
    assert_eq!(json["message"], "Name, phone, and source are required");

    let res = test_app(state.clone())
        .oneshot(admin_json_request(
            "POST",
            "/api/crm/leads",
            serde_json::json!({
                "name": "Vikram Singh",
                "phone": "9988776655",
                "source": "instagram",
                "service_interest": "wedding-premium",
                "budget": 45000
            }),
        ))
        .await
        .unwrap();
    assert_eq!(res.status(), StatusCode::CREATED);
    let lead_id = body_json(res).await["id"].as_i64().unwrap();

    let res = test_app(state.clone())
        .oneshot(admin_json_request(
            "PUT",
            &format!("/api/crm/leads/{lead_id}"),
            serde_json::json!({"status": "evaporated"}),
        ))
        .await
        .unwrap();
    assert_eq!(res.status(), StatusCode::BAD_REQUEST);
    let json = body_json(res).await;
    assert_eq!(json["message"], "Invalid lead status");

    let res = test_app(state.clone())
        .oneshot(admin_json_request(
            "PUT",
            &format!("/api/crm/leads/{lead_id}"),
            serde_json::json!({"status": "won"}),
        ))
        .await
        .unwrap();
    assert_eq!(res.status(), StatusCode::OK);

    let today = Utc::now().format("%Y-%m-%d").to_string();
    let res = test_app(state.clone())
        .oneshot(admin_json_request(
            "POST",
            &format!("/api/crm/leads/{lead_id}/activity"),
            serde_json::json!({
                "activity_type": "call",
                "description": "Agreed on the premium package",
                "next_action": "Send contract",
                "next_action_date": today
            }),
        ))
        .await
        .unwrap();
    assert_eq!(res.status(), StatusCode::CREATED);

    let res = test_app(state.clone())
        .oneshot(admin_get(&format!("/api/crm/leads/{lead_id}/activities")))
        .await
        .unwrap();
    let json = body_json(res).await;
    assert_eq!(json.as_array().unwrap().len(), 1);

    let res = test_app(state.clone())
        .oneshot(admin_get("/api/crm/follow-ups/today"))
        .await
        .unwrap();
    let json = body_json(res).await;
    assert_eq!(json.as_array().unwrap().len(), 1, "got: {json}");

    let res = test_app(state.clone())
        .oneshot(admin_get("/api/crm/funnel"))
        .await
        .unwrap();
    let json = body_json(res).await;
    let won = json
        .as_array()
        .unwrap()
        .iter()
        .find(|row| row["status"] == "won")
        .expect("funnel should have a won stage");
    assert_eq!(won["count"], 1);

    let res = test_app(state.clone())
        .oneshot(admin_get("/api/crm/sources"))
        .await
        .unwrap();
    let json = body_json(res).await;
    assert_eq!(json[0]["source"], "instagram");
    assert_eq!(json[0]["converted"], 1);

    let res = test_app(state)
        .oneshot(admin_get("/api/crm/metrics"))
        .await
        .unwrap();
    let json = body_json(res).await;
    assert_eq!(json["total_leads"], 1);
    assert_eq!(json["won_leads"], 1);
}

#[tokio::test]
async fn test_lead_activity_requires_existing_lead() {
    let state = test_state();
    let res = test_app(state)
        .oneshot(admin_json_request(
            "POST",
            "/api/crm/leads/99/activity",
            serde_json::json!({"activity_type": "call", "description": "hello?"}),
        ))
        .await
        .unwrap();
    assert_eq!(res.status(), StatusCode::NOT_FOUND);
    let json = body_json(res).await;
    assert_eq!(json["message"], "Lead not found");
}

// ── Inventory ──

#[tokio::test]
async fn test_equipment_lifecycle() {
    let state = test_state();

    let res = test_app(state.clone())
        .oneshot(admin_json_request(
            "POST",
            "/api/inventory/equipment",
            serde_json::json!({"name": "", "category": "camera"}),
        ))
        .await
        .unwrap();
    assert_eq!(res.status(), StatusCode::BAD_REQUEST);
    let json = body_json(res).await;
    assert_eq!(json["message"], "Name and category are required");

    let res = test_app(state.clone())
        .oneshot(admin_json_request(
            "POST",
            "/api/inventory/equipment",
            serde_json::json!({
                "name": "Sony A7 IV",
                "category": "camera",
                "brand": "Sony",
                "purchase_date": "2024-01-15",
                "purchase_price": 250000
            }),
        ))
        .await
        .unwrap();
    assert_eq!(res.status(), StatusCode::CREATED);
    let equipment_id = body_json(res).await["id"].as_i64().unwrap();

    // current_value falls back to the purchase price when omitted.
    let res = test_app(state.clone())
        .oneshot(admin_get("/api/inventory/equipment"))
        .await
        .unwrap();
    let json = body_json(res).await;
    assert_eq!(json[0]["current_value"], 250000.0);
    assert_eq!(json[0]["condition_status"], "good");

    let res = test_app(state.clone())
        .oneshot(admin_json_request(
            "PUT",
            &format!("/api/inventory/equipment/{equipment_id}"),
            serde_json::json!({"current_value": 180000, "location": "Studio shelf B"}),
        ))
        .await
        .unwrap();
    assert_eq!(res.status(), StatusCode::OK);
    let json = body_json(res).await;
    assert_eq!(json["message"], "Equipment updated successfully");

    let res = test_app(state.clone())
        .oneshot(admin_json_request(
            "POST",
            &format!("/api/inventory/equipment/{equipment_id}/maintenance"),
            serde_json::json!({
                "maintenance_date": "2030-01-10",
                "description": "Sensor cleaning",
                "cost": 1500
            }),
        ))
        .await
        .unwrap();
    assert_eq!(res.status(), StatusCode::CREATED);

    let res = test_app(state.clone())
        .oneshot(admin_get(&format!(
            "/api/inventory/equipment/{equipment_id}/maintenance"
        )))
        .await
        .unwrap();
    let json = body_json(res).await;
    assert_eq!(json.as_array().unwrap().len(), 1);

    // Usage can downgrade the condition on return.
    let res = test_app(state.clone())
        .oneshot(admin_json_request(
            "POST",
            &format!("/api/inventory/equipment/{equipment_id}/usage"),
            serde_json::json!({
                "usage_date": "2030-06-15",
                "hours_used": 8,
                "condition_after": "needs_repair"
            }),
        ))
        .await
        .unwrap();
    assert_eq!(res.status(), StatusCode::CREATED);

    let res = test_app(state.clone())
        .oneshot(admin_get("/api/inventory/equipment"))
        .await
        .unwrap();
    let json = body_json(res).await;
    assert_eq!(json[0]["condition_status"], "needs_repair");

    let res = test_app(state)
        .oneshot(admin_get("/api/inventory/depreciation"))
        .await
        .unwrap();
    let json = body_json(res).await;
    assert_eq!(json[0]["purchase_price"], 250000.0);
    assert_eq!(json[0]["depreciated_amount"], 70000.0);
    assert_eq!(json[0]["depreciation_percentage"], 28.0);
}

#[tokio::test]
async fn test_usage_requires_date_and_known_equipment() {
    let state = test_state();

    let res = test_app(state.clone())
        .oneshot(admin_json_request(
            "POST",
            "/api/inventory/equipment/42/usage",
            serde_json::json!({"hours_used": 2}),
        ))
        .await
        .unwrap();
    assert_eq!(res.status(), StatusCode::BAD_REQUEST);
    let json = body_json(res).await;
    assert_eq!(json["message"], "Usage date is required");

    let res = test_app(state)
        .oneshot(admin_json_request(
            "POST",
            "/api/inventory/equipment/42/usage",
            serde_json::json!({"usage_date": "2030-06-15"}),
        ))
        .await
        .unwrap();
    assert_eq!(res.status(), StatusCode::NOT_FOUND);
    let json = body_json(res).await;
    assert_eq!(json["message"], "Equipment not found");
}

// ── Notifications ──

#[tokio::test]
async fn test_auto_generate_covers_all_sources_and_deduplicates() {
    let state = test_state();

    // Paid booking three days out.
    let soon = (Utc::now() + Duration::days(3))
        .format("%Y-%m-%d")
        .to_string();
    let upcoming = create_booking(&state, None, &soon, "10:00").await;
    // Pending booking that has sat unpaid for two days.
    let stale = create_booking(&state, None, "2030-06-16", "10:00").await;
    {
        let db = state.db.lock().unwrap();
        queries::mark_booking_paid(&db, upcoming, "pay_test_1").unwrap();
        db.execute(
            "UPDATE bookings SET created_at = datetime('now', '-2 days') WHERE id = ?1",
            [stale],
        )
        .unwrap();
    }

    // Equipment with maintenance due in five days.
    let res = test_app(state.clone())
        .oneshot(admin_json_request(
            "POST",
            "/api/inventory/equipment",
            serde_json::json!({"name": "Drone", "category": "drone"}),
        ))
        .await
        .unwrap();
    let equipment_id = body_json(res).await["id"].as_i64().unwrap();
    let due = (Utc::now() + Duration::days(5))
        .format("%Y-%m-%d")
        .to_string();
    let res = test_app(state.clone())
        .oneshot(admin_json_request(
            "POST",
            &format!("/api/inventory/equipment/{equipment_id}/maintenance"),
            serde_json::json!({
                "maintenance_date": "2030-01-10",
                "description": "Propeller swap",
                "next_due_date": due
            }),
        ))
        .await
        .unwrap();
    assert_eq!(res.status(), StatusCode::CREATED);

    let res = test_app(state.clone())
        .oneshot(admin_empty("POST", "/api/notifications/auto-generate"))
        .await
        .unwrap();
    assert_eq!(res.status(), StatusCode::OK);
    let json = body_json(res).await;
    assert_eq!(json["generated"], 3, "got: {json}");
    let kinds: Vec<&str> = json["notifications"]
        .as_array()
        .unwrap()
        .iter()
        .map(|n| n["type"].as_str().unwrap())
        .collect();
    for kind in ["upcoming_event", "payment_pending", "maintenance_due"] {
        assert!(kinds.contains(&kind), "missing {kind} in {kinds:?}");
    }

    // Second sweep finds everything already flagged.
    let res = test_app(state.clone())
        .oneshot(admin_empty("POST", "/api/notifications/auto-generate"))
        .await
        .unwrap();
    let json = body_json(res).await;
    assert_eq!(json["generated"], 0);

    let res = test_app(state.clone())
        .oneshot(admin_get("/api/notifications/unread-count"))
        .await
        .unwrap();
    let json = body_json(res).await;
    assert_eq!(json["count"], 3);

    let first_id = {
        let res = test_app(state.clone())
            .oneshot(admin_get("/api/notifications"))
            .await
            .unwrap();
        let json = body_json(res).await;
        json["notifications"][0]["id"].as_i64().unwrap()
    };
    let res = test_app(state.clone())
        .oneshot(admin_empty(
            "PUT",
            &format!("/api/notifications/{first_id}/read"),
        ))
        .await
        .unwrap();
    assert_eq!(res.status(), StatusCode::OK);

    let res = test_app(state)
        .oneshot(admin_get("/api/notifications/unread-count"))
        .await
        .unwrap();
    let json = body_json(res).await;
    assert_eq!(json["count"], 2);
}

#[tokio::test]
async fn test_manual_notification_requires_title_and_message() {
    let state = test_state();

    let res = test_app(state.clone())
        .oneshot(admin_json_request(
            "POST",
            "/api/notifications/send",
            serde_json::json!({"title": "Missing body"}),
        ))
        .await
        .unwrap();
    assert_eq!(res.status(), StatusCode::BAD_REQUEST);
    let json = body_json(res).await;
    assert_eq!(json["message"], "Title and message are required");

    let res = test_app(state.clone())
        .oneshot(admin_json_request(
            "POST",
            "/api/notifications/send",
            serde_json::json!({
                "title": "Festive closure",
                "message": "Studio closed 1-3 Nov for Diwali."
            }),
        ))
        .await
        .unwrap();
    assert_eq!(res.status(), StatusCode::CREATED);
    let json = body_json(res).await;
    assert_eq!(json["success"], true);
    assert!(json["id"].as_i64().unwrap() > 0);

    let res = test_app(state)
        .oneshot(admin_get("/api/notifications"))
        .await
        .unwrap();
    let json = body_json(res).await;
    assert_eq!(json["notifications"][0]["title"], "Festive closure");
    assert_eq!(json["notifications"][0]["type"], "general");
}

#[tokio::test]
async fn test_send_reminders_mails_tomorrows_paid_bookings() {
    let (state, sent) = test_state_with_sent();

    let tomorrow = (Utc::now() + Duration::days(1))
        .format("%Y-%m-%d")
        .to_string();
    let id = create_booking(&state, None, &tomorrow, "10:00").await;
    // Unpaid booking on the same day must not get a reminder.
    create_booking(&state, None, &tomorrow, "16:00").await;
    {
        let db = state.db.lock().unwrap();
        queries::mark_booking_paid(&db, id, "pay_test_1").unwrap();
    }

    let res = test_app(state)
        .oneshot(admin_empty("POST", "/api/notifications/send-reminders"))
        .await
        .unwrap();
    assert_eq!(res.status(), StatusCode::OK);
    let json = body_json(res).await;
    assert_eq!(json["sent"], 1, "got: {json}");

    // Booking confirmations also go through the mailer, so pick the
    // reminder out by subject.
    let sent = sent.lock().unwrap();
    let reminders: Vec<_> = sent
        .iter()
        .filter(|(_, subject)| subject.starts_with("Reminder:"))
        .collect();
    assert_eq!(reminders.len(), 1, "got: {sent:?}");
    assert_eq!(reminders[0].0, "asha@example.com");
    assert_eq!(reminders[0].1, format!("Reminder: Wedding Basic on {tomorrow}"));
}
