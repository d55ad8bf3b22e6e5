use std::sync::Arc;

use axum::extract::State;
use axum::http::{HeaderMap, StatusCode};
use axum::response::IntoResponse;
use axum::Json;
use serde::{Deserialize, Serialize};

use crate::db::queries;
use crate::errors::{AppError, FieldError};
use crate::models::User;
use crate::services::{auth, validation};
use crate::state::AppState;

// POST /api/auth/register
#[derive(Deserialize)]
pub struct RegisterRequest {
    #[serde(default)]
    pub name: String,
    #[serde(default)]
    pub email: String,
    #[serde(default)]
    pub phone: Option<String>,
    #[serde(default)]
    pub password: String,
}

#[derive(Serialize)]
pub struct AuthResponse {
    success: bool,
    message: &'static str,
    user: User,
    token: String,
}

pub async fn register(
    State(state): State<Arc<AppState>>,
    Json(req): Json<RegisterRequest>,
) -> Result<impl IntoResponse, AppError> {
    let mut errors = vec![];
    validation::min_len(&mut errors, "name", &req.name, 2, "Name must be at least 2 characters");
    validation::email(&mut errors, "email", &req.email, "Valid email required");
    if let Some(phone) = req.phone.as_deref().filter(|p| !p.trim().is_empty()) {
        validation::mobile(&mut errors, "phone", phone, "Valid Indian phone number required");
    }
    validation::min_len(
        &mut errors,
        "password",
        &req.password,
        6,
        "Password must be at least 6 characters",
    );
    validation::finish(errors)?;

    let email = req.email.trim().to_lowercase();
    let password_hash = auth::hash_password(&req.password);

    let (user, token) = {
        let db = state.db.lock().unwrap();
        if queries::get_user_by_email(&db, &email)?.is_some() {
            return Err(AppError::Validation(vec![FieldError {
                field: "email",
                message: "User with this email already exists",
            }]));
        }
        let id = queries::insert_user(
            &db,
            req.name.trim(),
            &email,
            req.phone.as_deref().filter(|p| !p.trim().is_empty()),
            &password_hash,
        )?;
        let user = queries::get_user(&db, id)?
            .ok_or_else(|| anyhow::anyhow!("user {id} missing after insert"))?;
        let token = auth::create_session(&db, id)?;
        (user, token)
    };

    tracing::info!(user_id = user.id, "user registered");
    Ok((
        StatusCode::CREATED,
        Json(AuthResponse {
            success: true,
            message: "User registered successfully",
            user,
            token,
        }),
    ))
}

// POST /api/auth/login
#[derive(Deserialize)]
pub struct LoginRequest {
    #[serde(default)]
    pub email: String,
    #[serde(default)]
    pub password: String,
}

pub async fn login(
    State(state): State<Arc<AppState>>,
    Json(req): Json<LoginRequest>,
) -> Result<Json<AuthResponse>, AppError> {
    let email = req.email.trim().to_lowercase();

    let (user, token) = {
        let db = state.db.lock().unwrap();
        let user = queries::get_user_by_email(&db, &email)?
            .ok_or(AppError::Unauthorized("Invalid email or password"))?;
        if !auth::verify_password(&req.password, &user.password_hash) {
            return Err(AppError::Unauthorized("Invalid email or password"));
        }
        let token = auth::create_session(&db, user.id)?;
        (user, token)
    };

    tracing::info!(user_id = user.id, "user logged in");
    Ok(Json(AuthResponse {
        success: true,
        message: "Login successful",
        user,
        token,
    }))
}

// GET /api/auth/me
#[derive(Serialize)]
pub struct MeResponse {
    success: bool,
    user: User,
}

pub async fn me(
    State(state): State<Arc<AppState>>,
    headers: HeaderMap,
) -> Result<Json<MeResponse>, AppError> {
    let db = state.db.lock().unwrap();
    let user = auth::session_user(&db, &headers)?;
    Ok(Json(MeResponse { success: true, user }))
}

// POST /api/auth/logout
pub async fn logout(
    State(state): State<Arc<AppState>>,
    headers: HeaderMap,
) -> Result<Json<serde_json::Value>, AppError> {
    if let Some(token) = auth::bearer_token(&headers) {
        let db = state.db.lock().unwrap();
        queries::delete_session(&db, token)?;
    }
    Ok(Json(serde_json::json!({
        "success": true,
        "message": "Logout successful",
    })))
}

// PUT /api/auth/profile
#[derive(Deserialize)]
pub struct ProfileRequest {
    pub name: Option<String>,
    pub phone: Option<String>,
}

#[derive(Serialize)]
pub struct ProfileResponse {
    success: bool,
    message: &'static str,
    user: User,
}

pub async fn update_profile(
    State(state): State<Arc<AppState>>,
    headers: HeaderMap,
    Json(req): Json<ProfileRequest>,
) -> Result<Json<ProfileResponse>, AppError> {
    let mut errors = vec![];
    if let Some(name) = req.name.as_deref() {
        validation::min_len(&mut errors, "name", name, 2, "Name must be at least 2 characters");
    }
    if let Some(phone) = req.phone.as_deref().filter(|p| !p.trim().is_empty()) {
        validation::mobile(&mut errors, "phone", phone, "Valid Indian phone number required");
    }
    validation::finish(errors)?;

    let db = state.db.lock().unwrap();
    let user = auth::session_user(&db, &headers)?;
    queries::update_user_profile(
        &db,
        user.id,
        req.name.as_deref().map(str::trim),
        req.phone.as_deref().map(str::trim),
    )?;
    let user = queries::get_user(&db, user.id)?
        .ok_or_else(|| anyhow::anyhow!("user {} missing after update", user.id))?;

    Ok(Json(ProfileResponse {
        success: true,
        message: "Profile updated successfully",
        user,
    }))
}
