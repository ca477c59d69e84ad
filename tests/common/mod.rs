// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@rolandd.dev>

use async_trait::async_trait;
use chrono::{NaiveDate, TimeZone, Utc};
use fitness_tracker::config::Config;
use fitness_tracker::error::AppError;
use fitness_tracker::models::{NewWorkoutRequest, ServerWorkoutRecord};
use fitness_tracker::services::session::decode;
use fitness_tracker::services::{
    AuthToken, FixedClock, KeyValueStore, MemoryStore, ToggleReadyResponse, WorkoutApi,
};
use fitness_tracker::AppState;
use jsonwebtoken::{encode, Algorithm, EncodingKey, Header};
use serde::Serialize;
use serde_json::json;
use std::collections::{HashMap, VecDeque};
use std::path::Path;
use std::sync::atomic::{AtomicBool, AtomicU64, AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};
use std::time::Duration;

/// Instant all tests run at: Wednesday 2024-06-05 12:00:00 UTC.
#[allow(dead_code)]
pub const NOW: i64 = 1_717_588_800;

const SIGNING_KEY: &[u8] = b"test_signing_key_32_bytes_long!!";

/// Claims in the shape the backend issues.
#[derive(Debug, Serialize)]
struct Claims {
    id: u64,
    full_name: String,
    exp: i64,
}

/// Create a signed session token (mirrors the backend's token format).
#[allow(dead_code)]
pub fn create_test_jwt(user_id: u64, full_name: &str, exp: i64) -> String {
    let claims = Claims {
        id: user_id,
        full_name: full_name.to_string(),
        exp,
    };

    encode(
        &Header::new(Algorithm::HS256),
        &claims,
        &EncodingKey::from_secret(SIGNING_KEY),
    )
    .expect("Failed to create JWT")
}

#[allow(dead_code)]
pub fn test_clock() -> Arc<FixedClock> {
    Arc::new(FixedClock::new(Utc.timestamp_opt(NOW, 0).unwrap()))
}

#[allow(dead_code)]
pub fn date(s: &str) -> NaiveDate {
    NaiveDate::parse_from_str(s, "%Y-%m-%d").unwrap()
}

/// Scripted reply for one `list_my_workouts` call.
#[allow(dead_code)]
pub struct ScriptedList {
    pub delay: Duration,
    pub records: Vec<ServerWorkoutRecord>,
}

/// In-memory stand-in for the workout backend.
#[derive(Default)]
pub struct FakeApi {
    /// email -> (password, user id, full name)
    accounts: Mutex<HashMap<String, (String, u64, String)>>,
    records: Mutex<Vec<ServerWorkoutRecord>>,
    scripted_lists: Mutex<VecDeque<ScriptedList>>,
    next_user_id: AtomicU64,
    next_workout_id: AtomicU64,
    pub calls: AtomicUsize,
    pub fail_requests: AtomicBool,
}

#[allow(dead_code)]
impl FakeApi {
    pub fn new() -> Arc<Self> {
        Arc::new(Self {
            next_user_id: AtomicU64::new(100),
            next_workout_id: AtomicU64::new(1),
            ..Default::default()
        })
    }

    pub fn add_account(&self, email: &str, password: &str, full_name: &str) -> u64 {
        let id = self.next_user_id.fetch_add(1, Ordering::SeqCst);
        self.accounts.lock().unwrap().insert(
            email.to_string(),
            (password.to_string(), id, full_name.to_string()),
        );
        id
    }

    pub fn seed_record(&self, record: serde_json::Value) {
        let record = serde_json::from_value(record).expect("seed record");
        self.records.lock().unwrap().push(record);
    }

    pub fn script_list(&self, delay: Duration, records: Vec<serde_json::Value>) {
        let records = records
            .into_iter()
            .map(|r| serde_json::from_value(r).expect("scripted record"))
            .collect();
        self.scripted_lists
            .lock()
            .unwrap()
            .push_back(ScriptedList { delay, records });
    }

    pub fn call_count(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }

    fn begin(&self) -> Result<(), AppError> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        if self.fail_requests.load(Ordering::SeqCst) {
            return Err(AppError::Transport("connection refused".to_string()));
        }
        Ok(())
    }

    fn user_of(&self, token: &str) -> Result<String, AppError> {
        decode(token)
            .map(|identity| identity.id)
            .map_err(|_| AppError::Transport("Некорректный токен".to_string()))
    }

    fn issue(&self, user_id: u64, full_name: &str) -> AuthToken {
        AuthToken {
            token: create_test_jwt(user_id, full_name, NOW + 3600),
        }
    }
}

#[async_trait]
impl WorkoutApi for FakeApi {
    async fn login(&self, email: &str, password: &str) -> Result<AuthToken, AppError> {
        self.begin()?;
        let accounts = self.accounts.lock().unwrap();
        match accounts.get(email) {
            Some((pw, id, name)) if pw == password => Ok(self.issue(*id, name)),
            _ => Err(AppError::Transport("Invalid email or password".to_string())),
        }
    }

    async fn register(
        &self,
        email: &str,
        password: &str,
        full_name: &str,
    ) -> Result<AuthToken, AppError> {
        self.begin()?;
        if self.accounts.lock().unwrap().contains_key(email) {
            return Err(AppError::Transport("User already exists".to_string()));
        }
        let id = self.add_account(email, password, full_name);
        Ok(self.issue(id, full_name))
    }

    async fn list_my_workouts(&self, token: &str) -> Result<Vec<ServerWorkoutRecord>, AppError> {
        self.begin()?;
        let user_id = self.user_of(token)?;

        let scripted = self.scripted_lists.lock().unwrap().pop_front();
        if let Some(script) = scripted {
            tokio::time::sleep(script.delay).await;
            return Ok(script.records);
        }

        Ok(self
            .records
            .lock()
            .unwrap()
            .iter()
            .filter(|r| r.client_id.as_ref().map(|c| c.to_string()) == Some(user_id.clone()))
            .cloned()
            .collect())
    }

    async fn create_workout(
        &self,
        token: &str,
        workout: &NewWorkoutRequest,
    ) -> Result<ServerWorkoutRecord, AppError> {
        self.begin()?;
        self.user_of(token)?;

        let id = self.next_workout_id.fetch_add(1, Ordering::SeqCst);
        let stored = json!({
            "id": id,
            "client_id": workout.client_id,
            "typetrain": workout.typetrain,
            "date_train_time": format!("{}+00:00", workout.date_train_time),
            "time_train": workout.time_train,
            "end_time": workout.end_time,
            "exercises": workout.exercises,
            "is_ready": workout.is_ready,
        });
        self.seed_record(stored);

        Ok(serde_json::from_value(json!({"status": "ok", "id": id})).unwrap())
    }

    async fn toggle_ready(&self, token: &str, id: &str) -> Result<ToggleReadyResponse, AppError> {
        self.begin()?;
        self.user_of(token)?;

        let mut records = self.records.lock().unwrap();
        let record = records
            .iter_mut()
            .find(|r| r.id_string() == id)
            .ok_or_else(|| AppError::Transport("Тренировка не найдена".to_string()))?;
        let new_is_ready = !record.is_ready.unwrap_or(false);
        record.is_ready = Some(new_is_ready);

        Ok(ToggleReadyResponse {
            status: Some("ok".to_string()),
            train_id: json!(id),
            new_is_ready,
        })
    }
}

/// App wired to a fake backend, in-memory storage and a fixed clock.
#[allow(dead_code)]
pub fn create_remote_app() -> (AppState, Arc<FakeApi>, Arc<MemoryStore>) {
    let api = FakeApi::new();
    let storage = Arc::new(MemoryStore::new());
    let app = AppState::new(
        storage.clone() as Arc<dyn KeyValueStore>,
        test_clock(),
        Some(api.clone() as Arc<dyn WorkoutApi>),
    );
    (app, api, storage)
}

/// App with no backend (fallback mode), signed in as `user_id`.
#[allow(dead_code)]
pub fn create_offline_app(user_id: u64) -> (AppState, Arc<MemoryStore>) {
    let storage = Arc::new(MemoryStore::new());
    let app = AppState::new(storage.clone() as Arc<dyn KeyValueStore>, test_clock(), None);
    app.sessions
        .persist(&create_test_jwt(user_id, "Offline User", NOW + 3600))
        .unwrap();
    (app, storage)
}

/// Offline app built from the test configuration the way the binary builds
/// it: file storage at `storage_path` and the system clock.
#[allow(dead_code)]
pub fn create_file_app(storage_path: &Path) -> AppState {
    let config = Config {
        storage_path: storage_path.to_path_buf(),
        ..Config::test_default()
    };
    AppState::from_config(&config).expect("offline config should build")
}
