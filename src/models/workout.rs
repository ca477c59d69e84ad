// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@rolandd.dev>

//! Workout models: the client's canonical shape, the server's wire shape,
//! and the normalization between them.

use crate::error::AppError;
use crate::time_utils::{parse_hh_mm, parse_iso_date, strip_seconds, truncate_to_date};
use chrono::{Datelike, NaiveDate, Weekday};
use serde::{Deserialize, Serialize};
use serde_json::Value;
use validator::{Validate, ValidationError};

/// One exercise within a workout.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, Validate)]
pub struct Exercise {
    #[validate(length(min = 1, message = "exercise name is required"))]
    pub name: String,
    #[validate(range(min = 1, message = "sets must be a positive number"))]
    pub sets: u32,
    #[validate(range(min = 1, message = "reps must be a positive number"))]
    pub reps: u32,
}

impl Exercise {
    pub fn new(name: &str, sets: u32, reps: u32) -> Self {
        Self {
            name: name.to_string(),
            sets,
            reps,
        }
    }
}

/// A scheduled workout in the client's canonical shape.
///
/// The weekday is always derived from `date`; it is never stored.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Workout {
    pub id: String,
    pub date: NaiveDate,
    pub category: String,
    pub time_from: String,
    pub time_to: String,
    pub exercises: Vec<Exercise>,
    pub completed: bool,
    pub created_at: String,
    /// Server record this workout was normalized from (remote mode only)
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub origin: Option<ServerWorkoutRecord>,
}

impl Workout {
    /// Weekday of `date`.
    pub fn day(&self) -> Weekday {
        self.date.weekday()
    }

    /// Build a local workout from an already validated draft.
    pub fn from_draft(draft: &WorkoutDraft, id: String, created_at: String) -> Result<Self, AppError> {
        let date = parse_iso_date(&draft.date)
            .ok_or_else(|| AppError::Validation("date must be YYYY-MM-DD".to_string()))?;

        Ok(Self {
            id,
            date,
            category: draft.category.trim().to_string(),
            time_from: draft.time_from.clone(),
            time_to: draft.time_to.clone(),
            exercises: draft.exercises.clone(),
            completed: false,
            created_at,
            origin: None,
        })
    }
}

/// A workout submitted by the user for creation.
///
/// Fields hold the raw user input; `validate()` must pass before the draft
/// is sent anywhere.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize, Validate)]
#[validate(schema(function = "validate_schedule"))]
pub struct WorkoutDraft {
    #[validate(length(min = 1, message = "date is required"))]
    pub date: String,
    #[validate(length(min = 1, message = "category is required"))]
    pub category: String,
    #[validate(length(min = 1, message = "start time is required"))]
    pub time_from: String,
    #[validate(length(min = 1, message = "end time is required"))]
    pub time_to: String,
    #[validate(length(min = 1, message = "at least one exercise is required"), nested)]
    pub exercises: Vec<Exercise>,
}

impl WorkoutDraft {
    /// Validate the draft, flattening failures into one user-facing error.
    pub fn check(&self) -> Result<(), AppError> {
        self.validate()
            .map_err(|errors| AppError::Validation(errors.to_string()))
    }
}

fn validate_schedule(draft: &WorkoutDraft) -> Result<(), ValidationError> {
    // Missing values are reported by the field rules.
    if draft.date.is_empty() || draft.time_from.is_empty() || draft.time_to.is_empty() {
        return Ok(());
    }

    if draft.category.trim().is_empty() {
        return Err(schedule_error("category", "category is required"));
    }
    if parse_iso_date(&draft.date).is_none() {
        return Err(schedule_error("date_format", "date must be YYYY-MM-DD"));
    }
    let from = parse_hh_mm(&draft.time_from)
        .ok_or_else(|| schedule_error("time_format", "start time must be HH:MM"))?;
    let to = parse_hh_mm(&draft.time_to)
        .ok_or_else(|| schedule_error("time_format", "end time must be HH:MM"))?;

    if from >= to {
        return Err(schedule_error(
            "time_order",
            "start time must be before end time",
        ));
    }
    Ok(())
}

fn schedule_error(code: &'static str, message: &'static str) -> ValidationError {
    ValidationError::new(code).with_message(message.into())
}

/// Workout record as returned by the backend.
///
/// Every field is lenient so that any JSON object deserializes; unknown
/// fields are retained in `extra`.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ServerWorkoutRecord {
    #[serde(default)]
    pub id: Value,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub client_id: Option<Value>,
    #[serde(default)]
    pub typetrain: Option<String>,
    #[serde(default)]
    pub date_train_time: Option<String>,
    #[serde(default)]
    pub time_train: Option<String>,
    #[serde(default)]
    pub end_time: Option<String>,
    #[serde(default)]
    pub exercises: Value,
    #[serde(default)]
    pub is_ready: Option<bool>,
    #[serde(flatten)]
    pub extra: serde_json::Map<String, Value>,
}

impl ServerWorkoutRecord {
    /// Record id rendered as a string (empty when absent).
    pub fn id_string(&self) -> String {
        value_to_id(&self.id)
    }
}

/// Map a server record to the client's canonical workout.
///
/// Total: missing or malformed optional fields degrade to defaults.
pub fn normalize(record: ServerWorkoutRecord) -> Workout {
    let created_at = record.date_train_time.clone().unwrap_or_default();

    let date = truncate_to_date(&created_at).unwrap_or_else(|| {
        tracing::warn!(
            id = %record.id,
            date_train_time = %created_at,
            "Workout record has no usable date, defaulting to epoch"
        );
        NaiveDate::default()
    });

    let exercises = match &record.exercises {
        Value::Array(items) => items
            .iter()
            .filter_map(|item| serde_json::from_value::<Exercise>(item.clone()).ok())
            .collect(),
        _ => Vec::new(),
    };

    Workout {
        id: record.id_string(),
        date,
        category: record.typetrain.clone().unwrap_or_default(),
        time_from: record.time_train.as_deref().map(strip_seconds).unwrap_or_default(),
        time_to: record.end_time.as_deref().map(strip_seconds).unwrap_or_default(),
        exercises,
        completed: record.is_ready.unwrap_or(false),
        created_at,
        origin: Some(record),
    }
}

fn value_to_id(value: &Value) -> String {
    match value {
        Value::Null => String::new(),
        Value::String(s) => s.clone(),
        other => other.to_string(),
    }
}

/// Create-workout payload sent to the backend.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct NewWorkoutRequest {
    pub client_id: Value,
    pub typetrain: String,
    pub date_train_time: String,
    pub time_train: String,
    pub end_time: String,
    pub exercises: Vec<Exercise>,
    pub is_ready: bool,
}

impl NewWorkoutRequest {
    /// Build the payload for a validated draft owned by `client_id`.
    ///
    /// Numeric user ids are sent as JSON numbers.
    pub fn from_draft(draft: &WorkoutDraft, client_id: &str) -> Self {
        let client_id = client_id
            .parse::<i64>()
            .map(Value::from)
            .unwrap_or_else(|_| Value::String(client_id.to_string()));

        Self {
            client_id,
            typetrain: draft.category.trim().to_string(),
            date_train_time: format!("{}T{}:00", draft.date, draft.time_from),
            time_train: format!("{}:00", draft.time_from),
            end_time: format!("{}:00", draft.time_to),
            exercises: draft.exercises.clone(),
            is_ready: false,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn make_draft(time_from: &str, time_to: &str) -> WorkoutDraft {
        WorkoutDraft {
            date: "2024-06-03".to_string(),
            category: "Legs".to_string(),
            time_from: time_from.to_string(),
            time_to: time_to.to_string(),
            exercises: vec![Exercise::new("Squat", 3, 10)],
        }
    }

    fn record(value: Value) -> ServerWorkoutRecord {
        serde_json::from_value(value).expect("any object is a record")
    }

    #[test]
    fn test_normalize_full_record() {
        let workout = normalize(record(json!({
            "id": 17,
            "client_id": 5,
            "typetrain": "Legs",
            "date_train_time": "2024-06-03T07:30:00+00:00",
            "time_train": "07:30:00",
            "end_time": "08:15:00",
            "exercises": [{"name": "Squat", "sets": 3, "reps": 10}],
            "is_ready": true
        })));

        assert_eq!(workout.id, "17");
        assert_eq!(workout.date, NaiveDate::from_ymd_opt(2024, 6, 3).unwrap());
        assert_eq!(workout.day(), Weekday::Mon);
        assert_eq!(workout.category, "Legs");
        assert_eq!(workout.time_from, "07:30");
        assert_eq!(workout.time_to, "08:15");
        assert_eq!(workout.exercises, vec![Exercise::new("Squat", 3, 10)]);
        assert!(workout.completed);
        assert_eq!(
            workout.origin.as_ref().and_then(|o| o.client_id.clone()),
            Some(json!(5))
        );
    }

    #[test]
    fn test_normalize_defaults_missing_fields() {
        let workout = normalize(record(json!({
            "id": "a1",
            "typetrain": "Arms",
            "date_train_time": "2024-06-05T10:00:00",
            "time_train": "10:00",
            "end_time": "11:00"
        })));

        assert!(workout.exercises.is_empty());
        assert!(!workout.completed);
        assert_eq!(workout.time_from, "10:00");
        assert_eq!(workout.day(), Weekday::Wed);
    }

    #[test]
    fn test_normalize_non_list_exercises() {
        let workout = normalize(record(json!({
            "id": 1,
            "date_train_time": "2024-06-05",
            "exercises": {"name": "Squat"}
        })));
        assert!(workout.exercises.is_empty());
    }

    #[test]
    fn test_normalize_empty_object_is_total() {
        let workout = normalize(record(json!({})));
        assert_eq!(workout.id, "");
        assert_eq!(workout.date, NaiveDate::default());
        assert_eq!(workout.time_from, "");
        assert!(!workout.completed);
    }

    #[test]
    fn test_normalize_drops_malformed_exercises() {
        let workout = normalize(record(json!({
            "id": 2,
            "date_train_time": "2024-06-05T10:00:00Z",
            "exercises": [
                {"name": "Row", "sets": 4, "reps": 8},
                {"name": "Broken", "sets": -1, "reps": 8},
                "nonsense"
            ]
        })));
        assert_eq!(workout.exercises, vec![Exercise::new("Row", 4, 8)]);
    }

    #[test]
    fn test_draft_valid() {
        assert!(make_draft("09:00", "10:00").check().is_ok());
    }

    #[test]
    fn test_draft_rejects_reversed_times() {
        let err = make_draft("10:00", "09:00").check().unwrap_err();
        match err {
            AppError::Validation(msg) => {
                assert!(msg.contains("start time must be before end time"), "{}", msg)
            }
            other => panic!("expected validation error, got {:?}", other),
        }
    }

    #[test]
    fn test_draft_rejects_equal_times() {
        assert!(make_draft("09:00", "09:00").check().is_err());
    }

    #[test]
    fn test_draft_rejects_missing_fields() {
        let mut draft = make_draft("09:00", "10:00");
        draft.category.clear();
        assert!(matches!(draft.check(), Err(AppError::Validation(_))));

        let mut draft = make_draft("09:00", "10:00");
        draft.exercises.clear();
        assert!(matches!(draft.check(), Err(AppError::Validation(_))));
    }

    #[test]
    fn test_draft_rejects_bad_exercise() {
        let mut draft = make_draft("09:00", "10:00");
        draft.exercises.push(Exercise::new("", 3, 10));
        assert!(draft.check().is_err());

        let mut draft = make_draft("09:00", "10:00");
        draft.exercises[0].sets = 0;
        assert!(draft.check().is_err());
    }

    #[test]
    fn test_draft_rejects_bad_formats() {
        let mut draft = make_draft("9am", "10:00");
        assert!(draft.check().is_err());

        draft = make_draft("09:00", "10:00");
        draft.date = "03.06.2024".to_string();
        assert!(draft.check().is_err());
    }

    #[test]
    fn test_new_workout_request_from_draft() {
        let request = NewWorkoutRequest::from_draft(&make_draft("07:30", "08:15"), "5");

        assert_eq!(request.client_id, json!(5));
        assert_eq!(request.date_train_time, "2024-06-03T07:30:00");
        assert_eq!(request.time_train, "07:30:00");
        assert_eq!(request.end_time, "08:15:00");
        assert!(!request.is_ready);

        let request = NewWorkoutRequest::from_draft(&make_draft("07:30", "08:15"), "u-1");
        assert_eq!(request.client_id, json!("u-1"));
    }

    #[test]
    fn test_workout_serializes_without_day() {
        let workout = Workout::from_draft(
            &make_draft("07:30", "08:15"),
            "local-1".to_string(),
            "2024-06-01T00:00:00Z".to_string(),
        )
        .unwrap();
        let json = serde_json::to_value(&workout).unwrap();

        assert_eq!(json["date"], "2024-06-03");
        assert_eq!(json["timeFrom"], "07:30");
        assert!(json.get("day").is_none());
        assert!(json.get("origin").is_none());
    }
}
