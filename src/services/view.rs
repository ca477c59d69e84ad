// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@rolandd.dev>

//! Read-only projections over the workout collection.

use crate::models::Workout;
use crate::services::clock::Clock;
use crate::services::workouts::WorkoutStore;
use crate::time_utils::{weekday_name, WEEK};
use chrono::{NaiveDate, Weekday};
use std::sync::Arc;

/// One day of the week view.
#[derive(Debug, Clone, PartialEq)]
pub struct DaySlot {
    pub day: Weekday,
    pub workout: Option<Workout>,
}

impl DaySlot {
    pub fn day_name(&self) -> &'static str {
        weekday_name(self.day)
    }
}

/// Derives week/today/detail views. Nothing is cached; every call reads
/// the store's current collection.
pub struct ViewCoordinator {
    store: Arc<WorkoutStore>,
    clock: Arc<dyn Clock>,
}

impl ViewCoordinator {
    pub fn new(store: Arc<WorkoutStore>, clock: Arc<dyn Clock>) -> Self {
        Self { store, clock }
    }

    /// Seven slots, Monday first. Each holds the first workout in
    /// collection order that falls on that weekday.
    pub fn week_view(&self) -> Vec<DaySlot> {
        self.store.with_workouts(|workouts| {
            WEEK.iter()
                .map(|&day| DaySlot {
                    day,
                    workout: workouts.iter().find(|w| w.day() == day).cloned(),
                })
                .collect()
        })
    }

    /// The workout scheduled for today's local date.
    pub fn today_workout(&self) -> Option<Workout> {
        let today = self.clock.today();
        self.store
            .with_workouts(|workouts| workouts.iter().find(|w| w.date == today).cloned())
    }

    /// The workout with exactly this id and date.
    pub fn detail(&self, id: &str, date: NaiveDate) -> Option<Workout> {
        self.store.with_workouts(|workouts| {
            workouts
                .iter()
                .find(|w| w.id == id && w.date == date)
                .cloned()
        })
    }
}
