// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@rolandd.dev>

//! Client configuration loaded from environment variables (and `.env`).

use std::env;
use std::path::PathBuf;
use std::time::Duration;

const DEFAULT_API_URL: &str = "http://localhost:8085";
const DEFAULT_STORAGE_PATH: &str = ".fitness-tracker/storage.json";

/// Client configuration, loaded once at startup.
#[derive(Debug, Clone)]
pub struct Config {
    /// Base URL of the workout backend
    pub api_base_url: String,
    /// File backing the durable key-value store
    pub storage_path: PathBuf,
    /// When set, no transport is configured and the store runs in fallback mode
    pub offline: bool,
    /// Optional per-request timeout for the HTTP transport
    pub http_timeout: Option<Duration>,
}

impl Config {
    /// Load configuration from environment variables.
    ///
    /// Every variable has a default, so this only fails on values that are
    /// present but unparseable.
    pub fn from_env() -> Result<Self, ConfigError> {
        dotenvy::dotenv().ok(); // Load .env file if present

        let offline = match env::var("FITNESS_OFFLINE") {
            Ok(v) => parse_flag(&v).ok_or(ConfigError::Invalid("FITNESS_OFFLINE", v))?,
            Err(_) => false,
        };

        let http_timeout = match env::var("FITNESS_HTTP_TIMEOUT_SECS") {
            Ok(v) => Some(Duration::from_secs(
                v.trim()
                    .parse()
                    .map_err(|_| ConfigError::Invalid("FITNESS_HTTP_TIMEOUT_SECS", v.clone()))?,
            )),
            Err(_) => None,
        };

        Ok(Self {
            api_base_url: env::var("FITNESS_API_URL")
                .map(|v| v.trim().trim_end_matches('/').to_string())
                .unwrap_or_else(|_| DEFAULT_API_URL.to_string()),
            storage_path: env::var("FITNESS_STORAGE_PATH")
                .map(PathBuf::from)
                .unwrap_or_else(|_| PathBuf::from(DEFAULT_STORAGE_PATH)),
            offline,
            http_timeout,
        })
    }

    /// Default config for testing only.
    pub fn test_default() -> Self {
        Self {
            api_base_url: "http://localhost:8085".to_string(),
            storage_path: PathBuf::from("target/test-storage.json"),
            offline: true,
            http_timeout: Some(Duration::from_secs(5)),
        }
    }
}

fn parse_flag(value: &str) -> Option<bool> {
    match value.trim().to_ascii_lowercase().as_str() {
        "1" | "true" | "yes" | "on" => Some(true),
        "0" | "false" | "no" | "off" | "" => Some(false),
        _ => None,
    }
}

/// Configuration errors
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("Invalid value for environment variable {0}: {1:?}")]
    Invalid(&'static str, String),
}
