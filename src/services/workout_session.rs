// ABOUTME: Workout session lifecycle - start/resume, exercise logging, and completion
// ABOUTME: Derives per-exercise and per-workout aggregates from performed sets
//
// SPDX-License-Identifier: MIT OR Apache-2.0
// Copyright (c) 2025 Pierre Fitness Intelligence

//! # Workout Sessions
//!
//! A [`WorkoutLog`] moves `none -> in_progress -> completed`. Starting is an
//! atomic conditional insert, so two concurrent starts for the same
//! `(user, planned workout)` resolve to one log. Exercise entries are only
//! accepted while the log is in progress, checked in the insert itself.
//! Completion computes the session aggregates from the stored entries and
//! marks the planned workout done in one guarded transaction.

use std::sync::Arc;

use serde::Serialize;
use tracing::{info, warn};
use uuid::Uuid;

use crate::cache::Clock;
use crate::constants::limits::{
    DEFAULT_LOGS_LIMIT, DEFAULT_PR_LIMIT, MAX_LOGS_LIMIT, MAX_PR_LIMIT, MAX_REPS_PER_SET,
};
use crate::database::{WorkoutCompletion, WorkoutStore};
use crate::errors::{AppError, AppResult};
use crate::models::{CompletionFeedback, ExerciseLog, PersonalRecord, SetEntry, WorkoutLog};

/// Result of a start request
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct StartOutcome {
    /// The in-progress log
    pub log: WorkoutLog,
    /// True when an existing in-progress log was returned
    pub is_resume: bool,
}

/// A log with its exercise entries
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct WorkoutLogDetail {
    /// Session log
    #[serde(flatten)]
    pub log: WorkoutLog,
    /// Exercise entries in insert order
    pub exercises: Vec<ExerciseLog>,
}

/// Caller input for one logged exercise
#[derive(Debug, Clone)]
pub struct ExerciseEntry {
    /// Exercise library reference
    pub exercise_id: Uuid,
    /// Prescribed sets; defaults to the number of sets sent
    pub sets_planned: Option<u32>,
    /// Performed sets
    pub sets: Vec<SetEntry>,
}

/// Aggregates over the completed sets of one exercise
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct SetSummary {
    /// Sets marked completed
    pub sets_completed: u32,
    /// Sum of weight x reps
    pub total_volume_lbs: f64,
    /// Sum of reps, saturating at `u32::MAX`
    pub total_reps: u32,
    /// Mean load
    pub avg_weight: Option<f64>,
    /// Heaviest set
    pub max_weight: Option<f64>,
    /// Mean reps per set
    pub avg_reps: Option<f64>,
    /// Most reps in one set
    pub max_reps: Option<u32>,
    /// Mean RPE over sets that recorded one
    pub avg_rpe: Option<f64>,
}

/// Summarize performed sets; sets not marked completed are ignored
#[must_use]
pub fn summarize_sets(sets: &[SetEntry]) -> SetSummary {
    let done: Vec<&SetEntry> = sets.iter().filter(|s| s.completed).collect();
    let count = done.len();

    let total_volume_lbs: f64 = done.iter().map(|s| s.weight * f64::from(s.reps)).sum();
    let total_reps: u64 = done.iter().map(|s| u64::from(s.reps)).sum();
    let rpes: Vec<f64> = done.iter().filter_map(|s| s.rpe).collect();

    SetSummary {
        sets_completed: u32::try_from(count).unwrap_or(u32::MAX),
        total_volume_lbs,
        total_reps: u32::try_from(total_reps).unwrap_or(u32::MAX),
        avg_weight: mean(done.iter().map(|s| s.weight), count),
        max_weight: done.iter().map(|s| s.weight).reduce(f64::max),
        avg_reps: mean(done.iter().map(|s| f64::from(s.reps)), count),
        max_reps: done.iter().map(|s| s.reps).max(),
        avg_rpe: mean(rpes.iter().copied(), rpes.len()),
    }
}

fn mean(values: impl Iterator<Item = f64>, count: usize) -> Option<f64> {
    (count > 0).then(|| values.sum::<f64>() / count as f64)
}

/// Clamp a caller-supplied page size into `1..=max`
#[must_use]
pub fn clamp_limit(requested: Option<u32>, default: u32, max: u32) -> u32 {
    requested.unwrap_or(default).clamp(1, max)
}

fn validate_feedback(feedback: &CompletionFeedback) -> AppResult<()> {
    for (field, value) in [
        ("perceivedDifficulty", feedback.perceived_difficulty),
        ("energyLevel", feedback.energy_level),
    ] {
        if let Some(v) = value {
            if !(1..=10).contains(&v) {
                return Err(AppError::out_of_range(format!(
                    "{field} must be between 1 and 10, got {v}"
                )));
            }
        }
    }
    Ok(())
}

fn validate_sets(sets: &[SetEntry]) -> AppResult<()> {
    if sets.is_empty() {
        return Err(AppError::invalid_input("At least one set is required"));
    }
    for (index, set) in sets.iter().enumerate() {
        if set.reps > MAX_REPS_PER_SET {
            return Err(AppError::out_of_range(format!(
                "Set {} reps must be at most {MAX_REPS_PER_SET}, got {}",
                index + 1,
                set.reps
            )));
        }
        if !set.weight.is_finite() || set.weight < 0.0 {
            return Err(AppError::out_of_range(format!(
                "Set {} has an invalid weight",
                index + 1
            )));
        }
        if let Some(rpe) = set.rpe {
            if !(0.0..=10.0).contains(&rpe) {
                return Err(AppError::out_of_range(format!(
                    "Set {} RPE must be between 0 and 10",
                    index + 1
                )));
            }
        }
    }
    Ok(())
}

/// Session lifecycle over a [`WorkoutStore`]
#[derive(Clone)]
pub struct WorkoutSessionService {
    store: Arc<dyn WorkoutStore>,
    clock: Arc<dyn Clock>,
}

impl WorkoutSessionService {
    /// Create a new session service
    #[must_use]
    pub fn new(store: Arc<dyn WorkoutStore>, clock: Arc<dyn Clock>) -> Self {
        Self { store, clock }
    }

    /// Start a session, or resume the user's in-progress one
    ///
    /// # Errors
    ///
    /// Returns not found when the planned workout does not exist
    pub async fn start(&self, user_id: Uuid, planned_workout_id: Uuid) -> AppResult<StartOutcome> {
        self.store
            .get_planned_workout(planned_workout_id)
            .await?
            .ok_or_else(|| AppError::not_found("Planned workout"))?;

        if let Some(log) = self
            .store
            .find_in_progress_log(user_id, planned_workout_id)
            .await?
        {
            info!(log_id = %log.id, %user_id, "Resuming in-progress workout");
            return Ok(StartOutcome {
                log,
                is_resume: true,
            });
        }

        let candidate = WorkoutLog::start(user_id, planned_workout_id, self.clock.utc_now());
        let log = self.store.insert_in_progress_log(&candidate).await?;
        let is_resume = log.id != candidate.id;
        if is_resume {
            info!(log_id = %log.id, %user_id, "Concurrent start resolved to existing workout");
        } else {
            info!(log_id = %log.id, %user_id, %planned_workout_id, "Started workout");
        }

        Ok(StartOutcome { log, is_resume })
    }

    /// In-progress log for `(user, planned workout)`, if any
    ///
    /// # Errors
    ///
    /// Returns an error if the store query fails
    pub async fn active(
        &self,
        user_id: Uuid,
        planned_workout_id: Uuid,
    ) -> AppResult<Option<WorkoutLog>> {
        self.store
            .find_in_progress_log(user_id, planned_workout_id)
            .await
    }

    /// Append an exercise entry to an in-progress log
    ///
    /// # Errors
    ///
    /// Returns not found for an unknown log, a state conflict when the log is
    /// already completed, or a validation error for malformed sets
    pub async fn record_exercise(
        &self,
        log_id: Uuid,
        entry: ExerciseEntry,
    ) -> AppResult<ExerciseLog> {
        let log = self
            .store
            .get_workout_log(log_id)
            .await?
            .ok_or_else(|| AppError::not_found("Workout log"))?;
        if log.is_completed() {
            return Err(AppError::state_conflict(
                "Cannot log exercises on a completed workout",
            ));
        }
        validate_sets(&entry.sets)?;

        let summary = summarize_sets(&entry.sets);
        let sets_planned = entry
            .sets_planned
            .unwrap_or_else(|| u32::try_from(entry.sets.len()).unwrap_or(u32::MAX));

        let exercise_log = ExerciseLog {
            id: Uuid::new_v4(),
            workout_log_id: log_id,
            exercise_id: entry.exercise_id,
            sets_planned,
            sets_completed: summary.sets_completed,
            sets: entry.sets,
            total_volume_lbs: summary.total_volume_lbs,
            total_reps: summary.total_reps,
            avg_weight: summary.avg_weight,
            max_weight: summary.max_weight,
            avg_reps: summary.avg_reps,
            max_reps: summary.max_reps,
            avg_rpe: summary.avg_rpe,
            created_at: self.clock.utc_now(),
        };
        if !self.store.insert_exercise_log(&exercise_log).await? {
            warn!(%log_id, "Workout was completed while logging an exercise");
            return Err(AppError::state_conflict(
                "Cannot log exercises on a completed workout",
            ));
        }

        Ok(exercise_log)
    }

    /// Complete a session, writing aggregates over its exercise logs
    ///
    /// # Errors
    ///
    /// Returns not found for an unknown log and a state conflict when the log
    /// was already completed, including by a concurrent request
    pub async fn complete(
        &self,
        log_id: Uuid,
        feedback: CompletionFeedback,
    ) -> AppResult<WorkoutLog> {
        let log = self
            .store
            .get_workout_log(log_id)
            .await?
            .ok_or_else(|| AppError::not_found("Workout log"))?;
        if log.is_completed() {
            return Err(AppError::state_conflict("Workout is already completed"));
        }
        validate_feedback(&feedback)?;

        let Some(aggregates) = self
            .store
            .complete_workout_log(&WorkoutCompletion {
                log_id,
                planned_workout_id: log.planned_workout_id,
                started_at: log.started_at,
                completed_at: self.clock.utc_now(),
                feedback,
            })
            .await?
        else {
            warn!(%log_id, "Workout was completed concurrently");
            return Err(AppError::state_conflict("Workout is already completed"));
        };

        info!(
            %log_id,
            duration_minutes = aggregates.duration_minutes,
            total_sets = aggregates.total_sets,
            total_volume = aggregates.total_volume,
            "Workout completed"
        );

        self.store
            .get_workout_log(log_id)
            .await?
            .ok_or_else(|| AppError::not_found("Workout log"))
    }

    /// Log with its exercise entries
    ///
    /// # Errors
    ///
    /// Returns not found for an unknown log
    pub async fn detail(&self, log_id: Uuid) -> AppResult<WorkoutLogDetail> {
        let log = self
            .store
            .get_workout_log(log_id)
            .await?
            .ok_or_else(|| AppError::not_found("Workout log"))?;
        let exercises = self.store.list_exercise_logs(log_id).await?;
        Ok(WorkoutLogDetail { log, exercises })
    }

    /// Newest logs first
    ///
    /// # Errors
    ///
    /// Returns an error if the store query fails
    pub async fn list_logs(&self, user_id: Uuid, limit: Option<u32>) -> AppResult<Vec<WorkoutLog>> {
        let limit = clamp_limit(limit, DEFAULT_LOGS_LIMIT, MAX_LOGS_LIMIT);
        self.store.list_workout_logs(user_id, limit).await
    }

    /// Trigger-maintained personal records, most recent first
    ///
    /// # Errors
    ///
    /// Returns an error if the store query fails
    pub async fn personal_records(
        &self,
        user_id: Uuid,
        limit: Option<u32>,
    ) -> AppResult<Vec<PersonalRecord>> {
        let limit = clamp_limit(limit, DEFAULT_PR_LIMIT, MAX_PR_LIMIT);
        self.store.list_personal_records(user_id, limit).await
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::errors::ErrorCode;

    fn set(weight: f64, reps: u32, rpe: Option<f64>, completed: bool) -> SetEntry {
        SetEntry {
            weight,
            reps,
            rpe,
            completed,
        }
    }

    #[test]
    fn test_summary_ignores_incomplete_sets() {
        let summary = summarize_sets(&[
            set(100.0, 10, Some(7.0), true),
            set(120.0, 8, Some(9.0), true),
            set(140.0, 2, None, false),
        ]);

        assert_eq!(summary.sets_completed, 2);
        assert!((summary.total_volume_lbs - 1960.0).abs() < f64::EPSILON);
        assert_eq!(summary.total_reps, 18);
        assert_eq!(summary.max_weight, Some(120.0));
        assert_eq!(summary.avg_weight, Some(110.0));
        assert_eq!(summary.max_reps, Some(10));
        assert_eq!(summary.avg_rpe, Some(8.0));
    }

    #[test]
    fn test_summary_of_no_completed_sets() {
        let summary = summarize_sets(&[set(50.0, 5, Some(6.0), false)]);
        assert_eq!(summary.sets_completed, 0);
        assert_eq!(summary.total_reps, 0);
        assert_eq!(summary.max_weight, None);
        assert_eq!(summary.avg_rpe, None);
    }

    #[test]
    fn test_rep_totals_saturate_instead_of_overflowing() {
        let summary = summarize_sets(&[
            set(1.0, 3_000_000_000, None, true),
            set(1.0, 3_000_000_000, None, true),
        ]);
        assert_eq!(summary.total_reps, u32::MAX);
        assert_eq!(summary.max_reps, Some(3_000_000_000));
    }

    #[test]
    fn test_oversized_reps_rejected() {
        let too_many = [set(135.0, MAX_REPS_PER_SET + 1, None, true)];
        let err = validate_sets(&too_many).unwrap_err();
        assert_eq!(err.code, ErrorCode::ValueOutOfRange);

        let at_limit = [set(135.0, MAX_REPS_PER_SET, None, true)];
        assert!(validate_sets(&at_limit).is_ok());
    }

    #[test]
    fn test_limit_clamping() {
        assert_eq!(clamp_limit(None, 20, 100), 20);
        assert_eq!(clamp_limit(Some(500), 20, 100), 100);
        assert_eq!(clamp_limit(Some(0), 20, 100), 1);
    }

    #[test]
    fn test_feedback_range() {
        let ok = CompletionFeedback {
            notes: None,
            perceived_difficulty: Some(7),
            energy_level: Some(10),
        };
        assert!(validate_feedback(&ok).is_ok());

        let bad = CompletionFeedback {
            energy_level: Some(11),
            ..ok
        };
        assert!(validate_feedback(&bad).is_err());
    }
}
