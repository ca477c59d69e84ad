// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@rolandd.dev>

//! Application error types shared by the session and workout layers.

/// Application error type.
///
/// Only `Auth`, `Validation` and `NotFound` are meant to reach the user as
/// actionable messages. `Transport` and `Decode` are absorbed by the
/// services that can degrade to an empty or unchanged result.
#[derive(Debug, thiserror::Error)]
pub enum AppError {
    #[error("Authentication failed: {0}")]
    Auth(String),

    #[error("Request failed: {0}")]
    Transport(String),

    #[error("Invalid input: {0}")]
    Validation(String),

    #[error("Malformed session token: {0}")]
    Decode(String),

    #[error("Workout not found: {0}")]
    NotFound(String),

    #[error("Storage error: {0}")]
    Storage(String),

    #[error("Internal error: {0}")]
    Internal(#[from] anyhow::Error),
}

impl AppError {
    /// Whether this error carries a message meant for the user.
    pub fn is_user_facing(&self) -> bool {
        matches!(
            self,
            AppError::Auth(_) | AppError::Validation(_) | AppError::NotFound(_)
        )
    }

    /// Message suitable for showing to the user.
    ///
    /// Internal failures collapse to a generic message; the details are
    /// logged where they happen.
    pub fn user_message(&self) -> String {
        match self {
            AppError::Auth(msg) | AppError::Validation(msg) | AppError::NotFound(msg) => {
                msg.clone()
            }
            AppError::Transport(_) => "Connection error, please try again".to_string(),
            AppError::Decode(_) => "Your session has ended, please sign in again".to_string(),
            AppError::Storage(_) | AppError::Internal(_) => "Something went wrong".to_string(),
        }
    }
}

/// Result type alias used across the crate.
pub type Result<T> = std::result::Result<T, AppError>;
