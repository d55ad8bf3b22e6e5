use axum::http::HeaderMap;
use chrono::{Duration, Utc};
use rusqlite::Connection;
use sha2::{Digest, Sha256};
use uuid::Uuid;

use crate::db::queries;
use crate::errors::AppError;
use crate::models::User;

pub const SESSION_TTL_HOURS: i64 = 24;

/// Gate in front of the admin API surface.
pub trait AdminAuthenticator: Send + Sync {
    fn authorize(&self, headers: &HeaderMap) -> Result<(), AppError>;
}

/// Compares the `admin-key` request header against a fixed key from config.
pub struct StaticKeyAuthenticator {
    key: String,
}

impl StaticKeyAuthenticator {
    pub fn new(key: String) -> Self {
        Self { key }
    }
}

impl AdminAuthenticator for StaticKeyAuthenticator {
    fn authorize(&self, headers: &HeaderMap) -> Result<(), AppError> {
        let supplied = headers
            .get("admin-key")
            .and_then(|v| v.to_str().ok())
            .unwrap_or("");
        if supplied.is_empty() || supplied != self.key {
            return Err(AppError::Unauthorized("Unauthorized"));
        }
        Ok(())
    }
}

fn password_digest(salt: &str, password: &str) -> String {
    let mut hasher = Sha256::new();
    hasher.update(salt.as_bytes());
    hasher.update(b"$");
    hasher.update(password.as_bytes());
    hex::encode(hasher.finalize())
}

/// Stored as `salt$digest` with a fresh random salt per account.
pub fn hash_password(password: &str) -> String {
    let salt = Uuid::new_v4().simple().to_string();
    let digest = password_digest(&salt, password);
    format!("{salt}${digest}")
}

pub fn verify_password(password: &str, stored: &str) -> bool {
    match stored.split_once('$') {
        Some((salt, digest)) => password_digest(salt, password) == digest,
        None => false,
    }
}

pub fn create_session(conn: &Connection, user_id: i64) -> anyhow::Result<String> {
    let token = Uuid::new_v4().to_string();
    let expires_at = (Utc::now() + Duration::hours(SESSION_TTL_HOURS))
        .naive_utc()
        .format("%Y-%m-%d %H:%M:%S")
        .to_string();
    queries::insert_session(conn, &token, user_id, &expires_at)?;
    Ok(token)
}

pub fn bearer_token(headers: &HeaderMap) -> Option<&str> {
    headers
        .get("authorization")
        .and_then(|v| v.to_str().ok())
        .and_then(|v| v.strip_prefix("Bearer "))
}

/// Resolves the calling user from their bearer token, rejecting missing,
/// unknown and expired sessions alike.
pub fn session_user(conn: &Connection, headers: &HeaderMap) -> Result<User, AppError> {
    let token = bearer_token(headers).ok_or(AppError::Unauthorized("Authentication required"))?;
    match queries::get_session_user(conn, token) {
        Ok(Some(user)) => Ok(user),
        Ok(None) => Err(AppError::Unauthorized("Authentication required")),
        Err(e) => Err(AppError::Internal(e)),
    }
}

/// Like `session_user` but anonymous callers are fine. Used where a login
/// only enriches the request, such as linking a booking to its account.
pub fn optional_session_user(conn: &Connection, headers: &HeaderMap) -> Option<User> {
    let token = bearer_token(headers)?;
    queries::get_session_user(conn, token).ok().flatten()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn hash_and_verify_round_trip() {
        let stored = hash_password("hunter2");
        assert!(verify_password("hunter2", &stored));
        assert!(!verify_password("hunter3", &stored));
    }

    #[test]
    fn salts_differ_between_hashes() {
        let a = hash_password("same-password");
        let b = hash_password("same-password");
        assert_ne!(a, b);
        assert!(verify_password("same-password", &a));
        assert!(verify_password("same-password", &b));
    }

    #[test]
    fn verify_rejects_malformed_stored_values() {
        assert!(!verify_password("anything", "no-separator"));
        assert!(!verify_password("anything", ""));
    }

    #[test]
    fn bearer_token_requires_prefix() {
        let mut headers = HeaderMap::new();
        assert_eq!(bearer_token(&headers), None);
        headers.insert("authorization", "Bearer abc123".parse().unwrap());
        assert_eq!(bearer_token(&headers), Some("abc123"));
        headers.insert("authorization", "Basic abc123".parse().unwrap());
        assert_eq!(bearer_token(&headers), None);
    }

    #[test]
    fn static_key_authenticator_rejects_bad_keys() {
        let auth = StaticKeyAuthenticator::new("secret-key".to_string());

        let mut headers = HeaderMap::new();
        assert!(auth.authorize(&headers).is_err());

        headers.insert("admin-key", "wrong".parse().unwrap());
        assert!(auth.authorize(&headers).is_err());

        headers.insert("admin-key", "secret-key".parse().unwrap());
        assert!(auth.authorize(&headers).is_ok());
    }

    #[test]
    fn empty_configured_key_never_authorizes() {
        let auth = StaticKeyAuthenticator::new(String::new());
        let mut headers = HeaderMap::new();
        headers.insert("admin-key", "".parse().unwrap());
        assert!(auth.authorize(&headers).is_err());
    }
}
