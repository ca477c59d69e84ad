// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@rolandd.dev>

//! Session token lifecycle: login, persistence, decoding and expiry.
//!
//! Tokens are JWTs issued by the backend. The client cannot verify the
//! signature, so it only decodes the payload segment; the backend remains
//! responsible for rejecting forged or expired tokens.

use crate::error::{AppError, Result};
use crate::models::Identity;
use crate::services::api::WorkoutApi;
use crate::services::clock::Clock;
use crate::services::storage::KeyValueStore;
use base64::{engine::general_purpose::URL_SAFE_NO_PAD, Engine as _};
use std::sync::Arc;

/// Storage key holding the raw session token.
pub const TOKEN_KEY: &str = "auth_token";

/// Decode the identity carried by a token.
///
/// Never panics: any malformed input is reported as `AppError::Decode`.
pub fn decode(token: &str) -> Result<Identity> {
    let segments: Vec<&str> = token.trim().split('.').collect();
    if segments.len() != 3 {
        return Err(AppError::Decode(format!(
            "expected 3 segments, found {}",
            segments.len()
        )));
    }

    // Some issuers keep base64 padding; the URL-safe alphabet is the same.
    let payload = segments[1].trim_end_matches('=');
    let bytes = URL_SAFE_NO_PAD
        .decode(payload)
        .map_err(|e| AppError::Decode(format!("payload is not base64url: {}", e)))?;

    Identity::from_payload(&bytes).map_err(AppError::Decode)
}

/// Owns the persisted session token.
pub struct SessionManager {
    storage: Arc<dyn KeyValueStore>,
    clock: Arc<dyn Clock>,
    api: Option<Arc<dyn WorkoutApi>>,
}

impl SessionManager {
    /// Create a session manager. Without an API, login and register are
    /// unavailable but persisted sessions can still be read.
    pub fn new(
        storage: Arc<dyn KeyValueStore>,
        clock: Arc<dyn Clock>,
        api: Option<Arc<dyn WorkoutApi>>,
    ) -> Self {
        Self {
            storage,
            clock,
            api,
        }
    }

    /// Whether `token` decodes and has not expired.
    pub fn is_valid(&self, token: &str) -> bool {
        match decode(token) {
            Ok(identity) => identity.is_live_at(self.clock.unix_seconds()),
            Err(_) => false,
        }
    }

    /// Store the token.
    pub fn persist(&self, token: &str) -> Result<()> {
        self.storage.set(TOKEN_KEY, token)
    }

    /// Forget the token.
    pub fn clear(&self) -> Result<()> {
        self.storage.delete(TOKEN_KEY)
    }

    /// Raw persisted token, if any.
    pub fn token(&self) -> Option<String> {
        self.storage.get(TOKEN_KEY).filter(|t| !t.is_empty())
    }

    /// Identity of the persisted token.
    ///
    /// Only decodability is checked here; an expired identity is still
    /// returned. Use [`SessionManager::is_valid`] or
    /// [`SessionManager::current_valid`] before trusting it.
    pub fn current(&self) -> Option<Identity> {
        let token = self.token()?;
        match decode(&token) {
            Ok(identity) => Some(identity),
            Err(e) => {
                tracing::debug!(error = %e, "Stored session token does not decode");
                None
            }
        }
    }

    /// Identity of the persisted token if it is still valid.
    ///
    /// An invalid stored token is cleared.
    pub fn current_valid(&self) -> Option<Identity> {
        let token = self.token()?;
        let now = self.clock.unix_seconds();

        match decode(&token) {
            Ok(identity) if identity.is_live_at(now) => Some(identity),
            Ok(identity) => {
                tracing::warn!(user_id = %identity.id, exp = identity.exp, "Session expired, signing out");
                self.clear_quietly();
                None
            }
            Err(e) => {
                tracing::warn!(error = %e, "Stored session token is malformed, signing out");
                self.clear_quietly();
                None
            }
        }
    }

    /// Sign in with email and password.
    pub async fn login(&self, email: &str, password: &str) -> Result<Identity> {
        require_credentials(email, password)?;
        let api = self.api()?;

        let issued = api.login(email, password).await.map_err(|e| {
            tracing::warn!(error = %e, "Login failed");
            auth_error(e, "Login failed")
        })?;

        let identity = self.accept_token(&issued.token)?;
        tracing::info!(user_id = %identity.id, "Signed in");
        Ok(identity)
    }

    /// Create an account and sign in.
    pub async fn register(&self, email: &str, password: &str, full_name: &str) -> Result<Identity> {
        require_credentials(email, password)?;
        if full_name.trim().is_empty() {
            return Err(AppError::Validation("full name is required".to_string()));
        }
        let api = self.api()?;

        let issued = api
            .register(email, password, full_name)
            .await
            .map_err(|e| {
                tracing::warn!(error = %e, "Registration failed");
                auth_error(e, "Registration failed")
            })?;

        let identity = self.accept_token(&issued.token)?;
        tracing::info!(user_id = %identity.id, "Registered and signed in");
        Ok(identity)
    }

    /// Sign out.
    pub fn logout(&self) -> Result<()> {
        if let Some(identity) = self.current() {
            tracing::info!(user_id = %identity.id, "Signing out");
        }
        self.clear()
    }

    fn api(&self) -> Result<&Arc<dyn WorkoutApi>> {
        self.api
            .as_ref()
            .ok_or_else(|| AppError::Auth("Sign-in is unavailable in offline mode".to_string()))
    }

    /// Decode an issued token and persist it; undecodable tokens are rejected.
    fn accept_token(&self, token: &str) -> Result<Identity> {
        let identity = decode(token).map_err(|e| {
            tracing::error!(error = %e, "Server issued an undecodable token");
            AppError::Auth("Server returned an invalid session token".to_string())
        })?;
        self.persist(token)?;
        Ok(identity)
    }

    fn clear_quietly(&self) {
        if let Err(e) = self.clear() {
            tracing::warn!(error = %e, "Failed to clear session token");
        }
    }
}

fn require_credentials(email: &str, password: &str) -> Result<()> {
    if email.trim().is_empty() || password.is_empty() {
        return Err(AppError::Validation(
            "email and password are required".to_string(),
        ));
    }
    Ok(())
}

fn auth_error(err: AppError, fallback: &str) -> AppError {
    match err {
        AppError::Transport(detail) if !detail.is_empty() => AppError::Auth(detail),
        AppError::Auth(msg) => AppError::Auth(msg),
        _ => AppError::Auth(fallback.to_string()),
    }
}
