// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@rolandd.dev>

//! User identity decoded from a session token.

use serde::{Deserialize, Serialize};
use serde_json::Value;

/// Decoded user claims.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Identity {
    /// Opaque user identifier
    pub id: String,
    /// Display name, if the token carries one
    pub full_name: Option<String>,
    /// Expiration time (Unix timestamp, seconds)
    pub exp: f64,
}

/// Claims as they appear in the token payload.
///
/// Backends disagree on whether the user id is `id` or `sub`, and on
/// whether it is a number or a string.
#[derive(Debug, Deserialize)]
struct RawClaims {
    #[serde(default)]
    id: Option<Value>,
    #[serde(default)]
    sub: Option<Value>,
    #[serde(default)]
    full_name: Option<String>,
    #[serde(default)]
    exp: Option<f64>,
}

impl Identity {
    /// Parse a JSON claims payload.
    ///
    /// A payload without `exp` yields an identity that is never valid.
    pub fn from_payload(payload: &[u8]) -> Result<Self, String> {
        let claims: RawClaims =
            serde_json::from_slice(payload).map_err(|e| format!("invalid claims: {}", e))?;

        let id = claims
            .id
            .as_ref()
            .and_then(claim_to_string)
            .or_else(|| claims.sub.as_ref().and_then(claim_to_string))
            .ok_or_else(|| "token carries no user id".to_string())?;

        Ok(Self {
            id,
            full_name: claims.full_name,
            exp: claims.exp.unwrap_or(0.0),
        })
    }

    /// Whether the identity has not yet expired at `now` (Unix seconds).
    pub fn is_live_at(&self, now: f64) -> bool {
        self.exp > now
    }

    /// Name to greet the user with.
    pub fn display_name(&self) -> &str {
        self.full_name.as_deref().unwrap_or(&self.id)
    }
}

fn claim_to_string(value: &Value) -> Option<String> {
    match value {
        Value::String(s) if !s.is_empty() => Some(s.clone()),
        Value::Number(n) => Some(n.to_string()),
        _ => None,
    }
}
