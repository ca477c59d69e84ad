// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@kernel.org>

//! Data models for the application.

pub mod identity;
pub mod workout;

pub use identity::Identity;
pub use workout::{
    normalize, Exercise, NewWorkoutRequest, ServerWorkoutRecord, Workout, WorkoutDraft,
};
