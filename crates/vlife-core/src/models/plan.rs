// ABOUTME: Workout plan models and the LLM week-generation contract
// ABOUTME: WorkoutPlan, PlannedWorkout, WeekType, preferences, and GeneratedWeek
//
// SPDX-License-Identifier: MIT OR Apache-2.0
// Copyright (c) 2025 Pierre Fitness Intelligence

use std::fmt::{Display, Formatter, Result as FmtResult};
use std::str::FromStr;

use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Deserializer, Serialize};
use uuid::Uuid;

use crate::errors::AppError;

// ============================================================================
// Enums
// ============================================================================

/// Lifecycle of a workout plan
#[non_exhaustive]
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Default)]
#[serde(rename_all = "snake_case")]
pub enum PlanStatus {
    /// Plan currently being followed
    #[default]
    Active,
    /// Every progression week finished
    Completed,
    /// Replaced or abandoned by the user
    Archived,
}

impl PlanStatus {
    /// Database string representation
    #[must_use]
    pub const fn as_str(&self) -> &'static str {
        match self {
            Self::Active => "active",
            Self::Completed => "completed",
            Self::Archived => "archived",
        }
    }
}

impl Display for PlanStatus {
    fn fmt(&self, f: &mut Formatter<'_>) -> FmtResult {
        f.write_str(self.as_str())
    }
}

impl FromStr for PlanStatus {
    type Err = AppError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "active" => Ok(Self::Active),
            "completed" => Ok(Self::Completed),
            "archived" => Ok(Self::Archived),
            _ => Err(AppError::invalid_input(format!("Invalid plan status: {s}"))),
        }
    }
}

/// Role of a week inside a four-week progression block
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum WeekType {
    /// Week 1: establish working weights
    Baseline,
    /// Weeks 2-3: progressive overload
    Build,
    /// Week 4: recovery
    Deload,
}

impl WeekType {
    /// Classify a progression week (1-based)
    #[must_use]
    pub const fn for_week(week_number: u32) -> Self {
        match week_number {
            1 => Self::Baseline,
            4 => Self::Deload,
            _ => Self::Build,
        }
    }

    /// Intensity wording used in the generation prompt
    #[must_use]
    pub const fn intensity(&self) -> &'static str {
        match self {
            Self::Baseline => "moderate",
            Self::Build => "high",
            Self::Deload => "light",
        }
    }

    /// String representation
    #[must_use]
    pub const fn as_str(&self) -> &'static str {
        match self {
            Self::Baseline => "baseline",
            Self::Build => "build",
            Self::Deload => "deload",
        }
    }
}

impl Display for WeekType {
    fn fmt(&self, f: &mut Formatter<'_>) -> FmtResult {
        f.write_str(self.as_str())
    }
}

// ============================================================================
// Persisted plan
// ============================================================================

/// A user's training program
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct WorkoutPlan {
    /// Plan id
    pub id: Uuid,
    /// Owner
    pub user_id: Uuid,
    /// Display name
    pub name: String,
    /// Plan type (strength, hypertrophy, general...)
    pub plan_type: String,
    /// First day of the plan
    pub start_date: NaiveDate,
    /// Last day of the plan
    pub end_date: Option<NaiveDate>,
    /// Training days per week
    pub days_per_week: u32,
    /// Split pattern (upper/lower, push/pull/legs...)
    pub split_pattern: Option<String>,
    /// Lifecycle status
    pub status: PlanStatus,
    /// Progression week the user is on (advanced by a store trigger)
    pub current_week: u32,
    /// Creation timestamp
    pub created_at: DateTime<Utc>,
}

/// One scheduled session inside a plan
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PlannedWorkout {
    /// Workout id
    pub id: Uuid,
    /// Parent plan
    pub plan_id: Uuid,
    /// Progression week (1-4)
    pub week_number: u32,
    /// Day of week (1 = Monday)
    pub day_of_week: u32,
    /// Display name
    pub name: String,
    /// Muscles targeted by the session
    pub target_muscles: Vec<String>,
    /// Estimated session length
    pub estimated_duration_minutes: Option<u32>,
    /// Whether a session log completed this workout
    pub completed: bool,
    /// When it was completed
    pub completed_at: Option<DateTime<Utc>>,
    /// Ordered prescription
    pub exercises: Vec<PlannedExercise>,
}

/// A prescribed exercise inside a planned workout
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PlannedExercise {
    /// Row id
    pub id: Uuid,
    /// Exercise library reference
    pub exercise_id: Uuid,
    /// Library name, when joined
    pub exercise_name: Option<String>,
    /// Position in the workout (0-based)
    pub order_index: u32,
    /// Target working sets
    pub target_sets: u32,
    /// Target reps ("8-10", "12", "AMRAP")
    pub target_reps: String,
    /// Rest between sets
    pub rest_seconds: Option<u32>,
    /// Tempo notation ("3-1-1-0")
    pub tempo: Option<String>,
    /// Target RPE
    pub target_rpe: Option<f64>,
    /// Short coaching cue
    pub notes: Option<String>,
}

// ============================================================================
// Generation contract
// ============================================================================

/// User training preferences used to shape a generated week
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct TrainingPreferences {
    /// Training style ("strength", "hypertrophy", "functional"...)
    pub training_style: String,
    /// Sessions per week
    pub days_per_week: u32,
    /// Target session length in minutes
    pub session_minutes: u32,
    /// Exercises per session
    pub exercises_per_workout: u32,
}

/// Week returned by the model in JSON mode
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct GeneratedWeek {
    /// Progression week number
    pub week_number: u32,
    /// Week label as written by the model
    pub week_type: String,
    /// Sessions for the week
    pub workouts: Vec<GeneratedWorkout>,
}

impl GeneratedWeek {
    /// Every exercise id referenced by the week, in order of appearance
    pub fn exercise_ids(&self) -> impl Iterator<Item = &str> {
        self.workouts
            .iter()
            .flat_map(|w| w.exercises.iter().map(|e| e.exercise_id.as_str()))
    }
}

/// Session inside a generated week
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct GeneratedWorkout {
    /// Session name
    pub name: String,
    /// Day of week (1 = Monday)
    pub day_of_week: u32,
    /// Muscles targeted
    #[serde(default)]
    pub target_muscles: Vec<String>,
    /// Estimated duration in minutes
    #[serde(default)]
    pub estimated_duration: Option<u32>,
    /// Ordered exercises
    pub exercises: Vec<GeneratedExercise>,
}

/// Exercise prescription inside a generated workout
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct GeneratedExercise {
    /// Id copied from the candidate list
    pub exercise_id: String,
    /// Working sets
    pub sets: u32,
    /// Rep target; models emit either a number or a range string
    #[serde(deserialize_with = "deserialize_reps")]
    pub reps: String,
    /// Rest between sets
    #[serde(default)]
    pub rest_seconds: Option<u32>,
    /// Tempo notation
    #[serde(default)]
    pub tempo: Option<String>,
    /// Target RPE
    #[serde(default)]
    pub rpe: Option<f64>,
    /// Coaching note
    #[serde(default)]
    pub notes: Option<String>,
}

fn deserialize_reps<'de, D>(deserializer: D) -> Result<String, D::Error>
where
    D: Deserializer<'de>,
{
    #[derive(Deserialize)]
    #[serde(untagged)]
    enum RepsValue {
        Int(u64),
        Float(f64),
        Text(String),
    }

    Ok(match RepsValue::deserialize(deserializer)? {
        RepsValue::Int(n) => n.to_string(),
        RepsValue::Float(f) => format!("{}", f.round()),
        RepsValue::Text(s) => s,
    })
}
