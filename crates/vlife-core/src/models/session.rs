// ABOUTME: Workout session models: logs, per-exercise logs, sets, and personal records
// ABOUTME: WorkoutLog lifecycle is in_progress -> completed
//
// SPDX-License-Identifier: MIT OR Apache-2.0
// Copyright (c) 2025 Pierre Fitness Intelligence

use std::fmt::{Display, Formatter, Result as FmtResult};
use std::str::FromStr;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::constants::limits::SECONDS_PER_MINUTE;
use crate::errors::AppError;

/// Status of a workout session log
#[non_exhaustive]
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Default)]
#[serde(rename_all = "snake_case")]
pub enum WorkoutLogStatus {
    /// Session started, sets being logged
    #[default]
    InProgress,
    /// Session finished and aggregated
    Completed,
}

impl WorkoutLogStatus {
    /// Database string representation
    #[must_use]
    pub const fn as_str(&self) -> &'static str {
        match self {
            Self::InProgress => "in_progress",
            Self::Completed => "completed",
        }
    }
}

impl Display for WorkoutLogStatus {
    fn fmt(&self, f: &mut Formatter<'_>) -> FmtResult {
        f.write_str(self.as_str())
    }
}

impl FromStr for WorkoutLogStatus {
    type Err = AppError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "in_progress" => Ok(Self::InProgress),
            "completed" => Ok(Self::Completed),
            _ => Err(AppError::invalid_input(format!(
                "Invalid workout log status: {s}"
            ))),
        }
    }
}

/// One user session attempt against a planned workout
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct WorkoutLog {
    /// Log id
    pub id: Uuid,
    /// Owner
    pub user_id: Uuid,
    /// Planned workout being performed
    pub planned_workout_id: Uuid,
    /// Lifecycle status
    pub status: WorkoutLogStatus,
    /// Session start
    pub started_at: DateTime<Utc>,
    /// Session end
    pub completed_at: Option<DateTime<Utc>>,
    /// Whole minutes between start and completion
    pub duration_minutes: Option<i64>,
    /// Sum of exercise volumes (lbs)
    pub total_volume: Option<f64>,
    /// Sum of completed reps
    pub total_reps: Option<i64>,
    /// Sum of completed sets
    pub total_sets: Option<i64>,
    /// Number of exercise logs
    pub total_exercises: Option<i64>,
    /// Mean of per-exercise average RPE
    pub avg_rpe: Option<f64>,
    /// Free-text notes
    pub notes: Option<String>,
    /// Subjective difficulty (1-10)
    pub perceived_difficulty: Option<i32>,
    /// Subjective energy (1-10)
    pub energy_level: Option<i32>,
}

impl WorkoutLog {
    /// Fresh in-progress log stamped with `started_at`
    #[must_use]
    pub fn start(user_id: Uuid, planned_workout_id: Uuid, started_at: DateTime<Utc>) -> Self {
        Self {
            id: Uuid::new_v4(),
            user_id,
            planned_workout_id,
            status: WorkoutLogStatus::InProgress,
            started_at,
            completed_at: None,
            duration_minutes: None,
            total_volume: None,
            total_reps: None,
            total_sets: None,
            total_exercises: None,
            avg_rpe: None,
            notes: None,
            perceived_difficulty: None,
            energy_level: None,
        }
    }

    /// Whether the log can no longer change
    #[must_use]
    pub fn is_completed(&self) -> bool {
        self.status == WorkoutLogStatus::Completed
    }
}

/// A single performed set
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct SetEntry {
    /// Load in lbs
    pub weight: f64,
    /// Repetitions
    pub reps: u32,
    /// Rate of perceived exertion
    #[serde(default)]
    pub rpe: Option<f64>,
    /// Whether the set was finished
    #[serde(default = "default_completed")]
    pub completed: bool,
}

const fn default_completed() -> bool {
    true
}

/// Per-exercise record inside a workout log
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ExerciseLog {
    /// Row id
    pub id: Uuid,
    /// Parent log
    pub workout_log_id: Uuid,
    /// Exercise library reference
    pub exercise_id: Uuid,
    /// Sets prescribed by the plan
    pub sets_planned: u32,
    /// Sets actually completed
    pub sets_completed: u32,
    /// Set-by-set detail
    pub sets: Vec<SetEntry>,
    /// Sum of weight x reps over completed sets
    pub total_volume_lbs: f64,
    /// Sum of reps over completed sets
    pub total_reps: u32,
    /// Mean load over completed sets
    pub avg_weight: Option<f64>,
    /// Heaviest completed set
    pub max_weight: Option<f64>,
    /// Mean reps over completed sets
    pub avg_reps: Option<f64>,
    /// Most reps in a completed set
    pub max_reps: Option<u32>,
    /// Mean RPE over completed sets that recorded one
    pub avg_rpe: Option<f64>,
    /// Insert timestamp
    pub created_at: DateTime<Utc>,
}

/// Session totals written when a log completes
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct WorkoutAggregates {
    /// Whole elapsed minutes
    pub duration_minutes: i64,
    /// Count of exercise logs
    pub total_exercises: i64,
    /// Sum of `sets_completed`
    pub total_sets: i64,
    /// Sum of `total_volume_lbs`
    pub total_volume: f64,
    /// Sum of `total_reps`
    pub total_reps: i64,
    /// Mean of present `avg_rpe` values
    pub avg_rpe: Option<f64>,
}

impl WorkoutAggregates {
    /// Session totals over `logs`, timed from `started_at` to `completed_at`
    ///
    /// Duration is whole minutes, floored, and never negative.
    #[must_use]
    pub fn from_exercise_logs(
        started_at: DateTime<Utc>,
        completed_at: DateTime<Utc>,
        logs: &[ExerciseLog],
    ) -> Self {
        let duration_minutes =
            (completed_at - started_at).num_seconds().max(0) / SECONDS_PER_MINUTE;
        let rpes: Vec<f64> = logs.iter().filter_map(|l| l.avg_rpe).collect();
        let avg_rpe = (!rpes.is_empty()).then(|| rpes.iter().sum::<f64>() / rpes.len() as f64);

        Self {
            duration_minutes,
            total_exercises: i64::try_from(logs.len()).unwrap_or(i64::MAX),
            total_sets: logs.iter().map(|l| i64::from(l.sets_completed)).sum(),
            total_volume: logs.iter().map(|l| l.total_volume_lbs).sum(),
            total_reps: logs.iter().map(|l| i64::from(l.total_reps)).sum(),
            avg_rpe,
        }
    }
}

/// Caller-supplied subjective fields recorded at completion
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct CompletionFeedback {
    /// Free-text notes
    pub notes: Option<String>,
    /// Subjective difficulty (1-10)
    pub perceived_difficulty: Option<i32>,
    /// Subjective energy (1-10)
    pub energy_level: Option<i32>,
}

/// Best performance per (user, exercise), maintained by a store trigger
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PersonalRecord {
    /// Owner
    pub user_id: Uuid,
    /// Exercise library reference
    pub exercise_id: Uuid,
    /// Library name, when joined
    pub exercise_name: Option<String>,
    /// Heaviest completed set
    pub max_weight: f64,
    /// Most reps in a completed set
    pub max_reps: i64,
    /// Largest single-session volume
    pub max_volume: f64,
    /// Last time any of the records moved
    pub achieved_at: DateTime<Utc>,
}
