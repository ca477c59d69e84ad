// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@rolandd.dev>

//! Workout backend client.
//!
//! `WorkoutApi` is the transport seam used by the session and workout
//! services; `HttpWorkoutApi` implements it against the REST backend:
//! - `POST /client/login`, `POST /client/register`
//! - `GET /client/my_trains`
//! - `POST /client/new_trainer`
//! - `PUT /client/toggle_ready/{id}`

use crate::config::Config;
use crate::error::AppError;
use crate::models::{NewWorkoutRequest, ServerWorkoutRecord};
use async_trait::async_trait;
use serde::{de::DeserializeOwned, Deserialize};

/// Session token issued by login/register.
#[derive(Debug, Clone, PartialEq)]
pub struct AuthToken {
    pub token: String,
}

/// Server reply to a completion toggle.
#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct ToggleReadyResponse {
    #[serde(default)]
    pub status: Option<String>,
    #[serde(default)]
    pub train_id: serde_json::Value,
    pub new_is_ready: bool,
}

/// Remote authority for accounts and workouts.
///
/// Every failure (network, non-2xx, malformed body) is reported as
/// `AppError::Transport` carrying a human-readable detail.
#[async_trait]
pub trait WorkoutApi: Send + Sync {
    async fn login(&self, email: &str, password: &str) -> Result<AuthToken, AppError>;

    async fn register(
        &self,
        email: &str,
        password: &str,
        full_name: &str,
    ) -> Result<AuthToken, AppError>;

    async fn list_my_workouts(&self, token: &str) -> Result<Vec<ServerWorkoutRecord>, AppError>;

    async fn create_workout(
        &self,
        token: &str,
        workout: &NewWorkoutRequest,
    ) -> Result<ServerWorkoutRecord, AppError>;

    async fn toggle_ready(&self, token: &str, id: &str) -> Result<ToggleReadyResponse, AppError>;
}

/// Login/register response body.
#[derive(Debug, Deserialize)]
struct TokenResponse {
    #[serde(default)]
    status: Option<String>,
    #[serde(rename = "JWT", default)]
    jwt: Option<String>,
    #[serde(default)]
    detail: Option<String>,
}

/// `/client/my_trains` answers with a bare list, or with an object when the
/// user has no workouts yet.
#[derive(Debug, Deserialize)]
#[serde(untagged)]
enum MyTrainsResponse {
    List(Vec<ServerWorkoutRecord>),
    Empty {
        #[serde(default)]
        trains: Vec<ServerWorkoutRecord>,
    },
}

/// Error body returned by the backend on non-2xx responses.
#[derive(Debug, Deserialize)]
struct ErrorBody {
    detail: Option<serde_json::Value>,
}

/// HTTP implementation of [`WorkoutApi`].
#[derive(Clone)]
pub struct HttpWorkoutApi {
    http: reqwest::Client,
    base_url: String,
}

impl HttpWorkoutApi {
    /// Create a client for the backend at `base_url`.
    pub fn new(base_url: &str) -> Self {
        Self {
            http: reqwest::Client::new(),
            base_url: base_url.trim_end_matches('/').to_string(),
        }
    }

    /// Create a client from configuration, applying the optional timeout.
    pub fn from_config(config: &Config) -> Result<Self, AppError> {
        let mut builder = reqwest::Client::builder();
        if let Some(timeout) = config.http_timeout {
            builder = builder.timeout(timeout);
        }
        let http = builder
            .build()
            .map_err(|e| AppError::Transport(format!("Failed to build HTTP client: {}", e)))?;

        Ok(Self {
            http,
            base_url: config.api_base_url.trim_end_matches('/').to_string(),
        })
    }

    fn url(&self, path: &str) -> String {
        format!("{}{}", self.base_url, path)
    }

    /// Shared login/register flow.
    async fn request_token(
        &self,
        path: &str,
        body: serde_json::Value,
        fallback: &str,
    ) -> Result<AuthToken, AppError> {
        let response = self
            .http
            .post(self.url(path))
            .json(&body)
            .send()
            .await
            .map_err(|e| AppError::Transport(e.to_string()))?;

        let reply: TokenResponse = self.check_response_json(response).await?;

        match (reply.status.as_deref(), reply.jwt) {
            (Some("ok"), Some(token)) if !token.is_empty() => Ok(AuthToken { token }),
            _ => Err(AppError::Transport(
                reply.detail.unwrap_or_else(|| fallback.to_string()),
            )),
        }
    }

    /// Check response status and parse the JSON body.
    async fn check_response_json<T: DeserializeOwned>(
        &self,
        response: reqwest::Response,
    ) -> Result<T, AppError> {
        if !response.status().is_success() {
            let status = response.status();
            let body = response.text().await.unwrap_or_default();
            tracing::debug!(status = %status, body = %body, "Workout API returned an error");
            return Err(AppError::Transport(error_detail(status.as_u16(), &body)));
        }

        response
            .json()
            .await
            .map_err(|e| AppError::Transport(format!("JSON parse error: {}", e)))
    }
}

/// Human-readable detail for a failed response.
///
/// Uses the backend's `detail` field when present.
fn error_detail(status: u16, body: &str) -> String {
    let detail = serde_json::from_str::<ErrorBody>(body)
        .ok()
        .and_then(|b| b.detail)
        .map(|d| match d {
            serde_json::Value::String(s) => s,
            other => other.to_string(),
        });

    detail.unwrap_or_else(|| format!("HTTP error! status: {}", status))
}

#[async_trait]
impl WorkoutApi for HttpWorkoutApi {
    async fn login(&self, email: &str, password: &str) -> Result<AuthToken, AppError> {
        let body = serde_json::json!({
            "email": email,
            "password": password,
        });
        self.request_token("/client/login", body, "Login failed")
            .await
    }

    async fn register(
        &self,
        email: &str,
        password: &str,
        full_name: &str,
    ) -> Result<AuthToken, AppError> {
        let body = serde_json::json!({
            "email": email,
            "password": password,
            "full_name": full_name,
        });
        self.request_token("/client/register", body, "Registration failed")
            .await
    }

    async fn list_my_workouts(&self, token: &str) -> Result<Vec<ServerWorkoutRecord>, AppError> {
        let response = self
            .http
            .get(self.url("/client/my_trains"))
            .bearer_auth(token)
            .send()
            .await
            .map_err(|e| AppError::Transport(e.to_string()))?;

        let reply: MyTrainsResponse = self.check_response_json(response).await?;
        Ok(match reply {
            MyTrainsResponse::List(records) => records,
            MyTrainsResponse::Empty { trains } => trains,
        })
    }

    async fn create_workout(
        &self,
        token: &str,
        workout: &NewWorkoutRequest,
    ) -> Result<ServerWorkoutRecord, AppError> {
        let response = self
            .http
            .post(self.url("/client/new_trainer"))
            .bearer_auth(token)
            .json(workout)
            .send()
            .await
            .map_err(|e| AppError::Transport(e.to_string()))?;

        self.check_response_json(response).await
    }

    async fn toggle_ready(&self, token: &str, id: &str) -> Result<ToggleReadyResponse, AppError> {
        let response = self
            .http
            .put(self.url(&format!("/client/toggle_ready/{}", id)))
            .bearer_auth(token)
            .send()
            .await
            .map_err(|e| AppError::Transport(e.to_string()))?;

        self.check_response_json(response).await
    }
}
