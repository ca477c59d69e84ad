// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@rolandd.dev>

//! Services module - session, workout and view logic plus their collaborators.

pub mod api;
pub mod clock;
pub mod session;
pub mod storage;
pub mod view;
pub mod workouts;

pub use api::{AuthToken, HttpWorkoutApi, ToggleReadyResponse, WorkoutApi};
pub use clock::{Clock, FixedClock, SystemClock};
pub use session::SessionManager;
pub use storage::{FileStore, KeyValueStore, MemoryStore};
pub use view::{DaySlot, ViewCoordinator};
pub use workouts::WorkoutStore;
