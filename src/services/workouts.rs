// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@rolandd.dev>

//! Workout collection for the signed-in user.
//!
//! The store runs in one of two modes, chosen on every call:
//! - Remote: an API is configured and a session token is present. The
//!   server is authoritative; every mutation is followed by a full refresh.
//! - Fallback: workouts live in durable storage under a per-user key, as
//!   dates paired with the workouts scheduled that day, both kept in
//!   insertion order.
//!
//! Every operation first resolves a live session. An expired or malformed
//! token is cleared and the call proceeds as signed out.
//!
//! Refreshes and clears are ordered by a monotonic ticket so that a slow
//! response never overwrites a newer collection.

use crate::error::{AppError, Result};
use crate::models::{normalize, Identity, NewWorkoutRequest, Workout, WorkoutDraft};
use crate::services::api::WorkoutApi;
use crate::services::clock::Clock;
use crate::services::session::SessionManager;
use crate::services::storage::KeyValueStore;
use crate::time_utils::format_utc_rfc3339;
use chrono::NaiveDate;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{Arc, Mutex, MutexGuard};

/// Prefix of the per-user storage key for fallback workouts.
pub const LOCAL_WORKOUTS_KEY: &str = "fitness_tracker_workouts";

/// Process-wide counter for local workout ids.
static LOCAL_ID_COUNTER: AtomicU64 = AtomicU64::new(0);

/// Fallback persistence shape: `(ISO date, workouts)` pairs. Dates appear
/// in the order they were first used, workouts in the order they were added.
type LocalBook = Vec<(String, Vec<Workout>)>;

/// How the current call is served.
enum Mode {
    Remote {
        api: Arc<dyn WorkoutApi>,
        token: String,
    },
    Fallback,
}

struct CollectionState {
    workouts: Vec<Workout>,
    /// Ticket of the last applied refresh/clear.
    applied: u64,
}

/// Authoritative in-memory workout collection.
pub struct WorkoutStore {
    sessions: Arc<SessionManager>,
    storage: Arc<dyn KeyValueStore>,
    clock: Arc<dyn Clock>,
    api: Option<Arc<dyn WorkoutApi>>,
    state: Mutex<CollectionState>,
    next_ticket: AtomicU64,
}

impl WorkoutStore {
    pub fn new(
        sessions: Arc<SessionManager>,
        storage: Arc<dyn KeyValueStore>,
        clock: Arc<dyn Clock>,
        api: Option<Arc<dyn WorkoutApi>>,
    ) -> Self {
        Self {
            sessions,
            storage,
            clock,
            api,
            state: Mutex::new(CollectionState {
                workouts: Vec::new(),
                applied: 0,
            }),
            next_ticket: AtomicU64::new(0),
        }
    }

    // ─── Accessors ───────────────────────────────────────────────

    /// Snapshot of the collection.
    pub fn workouts(&self) -> Vec<Workout> {
        self.lock().workouts.clone()
    }

    /// Run `f` over the collection without copying it.
    pub fn with_workouts<R>(&self, f: impl FnOnce(&[Workout]) -> R) -> R {
        f(&self.lock().workouts)
    }

    /// Whether the next call would be served by the remote API.
    pub fn is_remote(&self) -> bool {
        self.api.is_some() && self.sessions.current_valid().is_some()
    }

    // ─── Operations ──────────────────────────────────────────────

    /// Reload the collection from its authority.
    ///
    /// Never fails: transport errors are logged and leave the collection
    /// empty. Returns the collection after the refresh.
    pub async fn refresh(&self) -> Vec<Workout> {
        let ticket = self.issue_ticket();

        let Some(identity) = self.sessions.current_valid() else {
            self.apply(ticket, Vec::new());
            return self.workouts();
        };

        let workouts = match self.mode() {
            Mode::Remote { api, token } => match api.list_my_workouts(&token).await {
                Ok(records) => records.into_iter().map(normalize).collect(),
                Err(e) => {
                    tracing::error!(error = %e, "Failed to load workouts from server");
                    Vec::new()
                }
            },
            Mode::Fallback => flatten(self.load_book(&identity.id)),
        };

        self.apply(ticket, workouts);
        self.workouts()
    }

    /// Create a workout from a draft. Returns the new workout's id.
    ///
    /// The draft is validated before anything else happens.
    pub async fn add(&self, draft: &WorkoutDraft) -> Result<String> {
        draft.check()?;
        let identity = self.require_identity()?;

        match self.mode() {
            Mode::Remote { api, token } => {
                let request = NewWorkoutRequest::from_draft(draft, &identity.id);
                let created = api.create_workout(&token, &request).await.map_err(|e| {
                    tracing::error!(error = %e, user_id = %identity.id, "Failed to create workout");
                    e
                })?;

                let id = created.id_string();
                tracing::info!(user_id = %identity.id, workout_id = %id, "Workout created");

                // The server is the source of truth; re-read instead of merging.
                self.refresh().await;
                Ok(id)
            }
            Mode::Fallback => {
                let id = self.next_local_id();
                let workout = Workout::from_draft(draft, id.clone(), format_utc_rfc3339(self.clock.now()))?;

                let mut book = self.load_book(&identity.id);
                day_entry(&mut book, &workout.date.to_string()).push(workout);
                self.save_book(&identity.id, &book)?;

                tracing::info!(user_id = %identity.id, workout_id = %id, "Workout stored locally");
                self.apply(self.issue_ticket(), flatten(book));
                Ok(id)
            }
        }
    }

    /// Flip the completion flag of the workout `id` on `date`.
    /// Returns the new value.
    pub async fn toggle_completion(&self, id: &str, date: NaiveDate) -> Result<bool> {
        let identity = self.require_identity()?;

        match self.mode() {
            Mode::Remote { api, token } => {
                let known = self.with_workouts(|workouts| {
                    workouts.iter().any(|w| w.id == id && w.date == date)
                });
                if !known {
                    return Err(AppError::NotFound(format!("{} on {}", id, date)));
                }

                let reply = api.toggle_ready(&token, id).await.map_err(|e| {
                    tracing::error!(error = %e, user_id = %identity.id, workout_id = id, "Failed to toggle workout");
                    e
                })?;
                tracing::info!(workout_id = id, completed = reply.new_is_ready, "Workout toggled");

                self.refresh().await;
                Ok(reply.new_is_ready)
            }
            Mode::Fallback => {
                let key = date.to_string();
                let mut book = self.load_book(&identity.id);
                let workout = book
                    .iter_mut()
                    .find(|(day, _)| *day == key)
                    .and_then(|(_, day)| day.iter_mut().find(|w| w.id == id))
                    .ok_or_else(|| AppError::NotFound(format!("{} on {}", id, date)))?;

                workout.completed = !workout.completed;
                let completed = workout.completed;
                self.save_book(&identity.id, &book)?;

                tracing::info!(user_id = %identity.id, workout_id = id, completed, "Workout toggled locally");
                self.apply(self.issue_ticket(), flatten(book));
                Ok(completed)
            }
        }
    }

    /// Empty the in-memory collection (on logout).
    ///
    /// Locally stored workouts are kept so they return on the user's next
    /// sign-in.
    pub fn clear(&self) {
        self.apply(self.issue_ticket(), Vec::new());
    }

    // ─── Internals ───────────────────────────────────────────────

    /// Identity of a live session; an expired or malformed token is cleared.
    fn require_identity(&self) -> Result<Identity> {
        self.sessions
            .current_valid()
            .ok_or_else(|| AppError::Auth("Please sign in first".to_string()))
    }

    /// Only meaningful once the session has been resolved.
    fn mode(&self) -> Mode {
        match (&self.api, self.sessions.token()) {
            (Some(api), Some(token)) => Mode::Remote {
                api: api.clone(),
                token,
            },
            _ => Mode::Fallback,
        }
    }

    fn lock(&self) -> MutexGuard<'_, CollectionState> {
        self.state.lock().unwrap_or_else(|e| e.into_inner())
    }

    fn issue_ticket(&self) -> u64 {
        self.next_ticket.fetch_add(1, Ordering::SeqCst) + 1
    }

    /// Replace the collection unless a newer ticket has already been applied.
    fn apply(&self, ticket: u64, workouts: Vec<Workout>) -> bool {
        let mut state = self.lock();
        if ticket <= state.applied {
            tracing::debug!(ticket, applied = state.applied, "Discarding stale workout result");
            return false;
        }
        state.workouts = workouts;
        state.applied = ticket;
        true
    }

    fn next_local_id(&self) -> String {
        let n = LOCAL_ID_COUNTER.fetch_add(1, Ordering::Relaxed);
        format!("local-{}-{}", self.clock.now().timestamp_millis(), n)
    }

    fn load_book(&self, user_id: &str) -> LocalBook {
        let Some(json) = self.storage.get(&local_key(user_id)) else {
            return LocalBook::new();
        };
        serde_json::from_str(&json).unwrap_or_else(|e| {
            tracing::warn!(user_id, error = %e, "Stored workouts are corrupt, starting empty");
            LocalBook::new()
        })
    }

    fn save_book(&self, user_id: &str, book: &LocalBook) -> Result<()> {
        let json = serde_json::to_string(book).map_err(|e| AppError::Storage(e.to_string()))?;
        self.storage.set(&local_key(user_id), &json)
    }
}

fn local_key(user_id: &str) -> String {
    format!("{}:{}", LOCAL_WORKOUTS_KEY, user_id)
}

/// Workouts scheduled on `date`, creating the day at the end if new.
fn day_entry<'a>(book: &'a mut LocalBook, date: &str) -> &'a mut Vec<Workout> {
    let pos = match book.iter().position(|(day, _)| day == date) {
        Some(pos) => pos,
        None => {
            book.push((date.to_string(), Vec::new()));
            book.len() - 1
        }
    };
    &mut book[pos].1
}

/// Days in first-use order, insertion order within a day.
///
/// For any weekday, the first matching workout is the earliest added one.
fn flatten(book: LocalBook) -> Vec<Workout> {
    book.into_iter().flat_map(|(_, day)| day).collect()
}
