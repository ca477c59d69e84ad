// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@kernel.org>

//! Fitness-Tracker: client core for scheduled workouts
//!
//! This crate signs a user in against the workout backend, keeps that
//! user's workouts in sync (or in local storage when no server is
//! available), and derives the week and today views shown to the user.

pub mod config;
pub mod error;
pub mod models;
pub mod services;
pub mod time_utils;

use config::Config;
use error::Result;
use services::{
    Clock, FileStore, HttpWorkoutApi, KeyValueStore, SessionManager, SystemClock,
    ViewCoordinator, WorkoutApi, WorkoutStore,
};
use std::sync::Arc;

/// Shared application state: the three components wired to one set of
/// collaborators.
pub struct AppState {
    pub sessions: Arc<SessionManager>,
    pub workouts: Arc<WorkoutStore>,
    pub views: ViewCoordinator,
}

impl AppState {
    /// Wire the components to explicit collaborators.
    pub fn new(
        storage: Arc<dyn KeyValueStore>,
        clock: Arc<dyn Clock>,
        api: Option<Arc<dyn WorkoutApi>>,
    ) -> Self {
        let sessions = Arc::new(SessionManager::new(
            storage.clone(),
            clock.clone(),
            api.clone(),
        ));
        let workouts = Arc::new(WorkoutStore::new(
            sessions.clone(),
            storage,
            clock.clone(),
            api,
        ));
        let views = ViewCoordinator::new(workouts.clone(), clock);

        Self {
            sessions,
            workouts,
            views,
        }
    }

    /// Build production collaborators from configuration.
    pub fn from_config(config: &Config) -> Result<Self> {
        let storage: Arc<dyn KeyValueStore> = Arc::new(FileStore::new(&config.storage_path));
        let api: Option<Arc<dyn WorkoutApi>> = if config.offline {
            None
        } else {
            Some(Arc::new(HttpWorkoutApi::from_config(config)?))
        };
        Ok(Self::new(storage, Arc::new(SystemClock), api))
    }

    /// Sign out and drop the in-memory collection.
    pub fn logout(&self) -> Result<()> {
        self.sessions.logout()?;
        self.workouts.clear();
        Ok(())
    }
}
