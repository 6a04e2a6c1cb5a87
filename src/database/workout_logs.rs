// ABOUTME: Database operations for workout sessions, exercise logs, and personal records
// ABOUTME: Start is a conditional insert on a partial unique index; completion is one transaction
//
// SPDX-License-Identifier: MIT OR Apache-2.0
// Copyright (c) 2025 Pierre Fitness Intelligence

use sqlx::sqlite::SqliteRow;
use sqlx::{Sqlite, SqliteExecutor, SqlitePool, Transaction};
use tracing::debug;
use uuid::Uuid;

use super::{rows, WorkoutCompletion};
use crate::errors::{AppError, AppResult};
use crate::models::{
    ExerciseLog, PersonalRecord, WorkoutAggregates, WorkoutLog, WorkoutLogStatus,
};

const LOG_COLUMNS: &str = "id, user_id, planned_workout_id, status, started_at, completed_at, \
                           duration_minutes, total_volume, total_reps, total_sets, \
                           total_exercises, avg_rpe, notes, perceived_difficulty, energy_level";

const EXERCISE_LOG_COLUMNS: &str = "id, workout_log_id, exercise_id, sets_planned, sets_completed, \
                                    sets_data, total_volume_lbs, total_reps, avg_weight, \
                                    max_weight, avg_reps, max_reps, avg_rpe, created_at";

/// Workout session database operations manager
#[derive(Clone)]
pub struct WorkoutLogManager {
    pool: SqlitePool,
}

impl WorkoutLogManager {
    /// Create a new workout log manager
    #[must_use]
    pub const fn new(pool: SqlitePool) -> Self {
        Self { pool }
    }

    /// Find the in-progress log for (user, planned workout)
    ///
    /// # Errors
    ///
    /// Returns an error if the database query fails
    pub async fn find_in_progress_log(
        &self,
        user_id: Uuid,
        planned_workout_id: Uuid,
    ) -> AppResult<Option<WorkoutLog>> {
        let row = sqlx::query(&format!(
            r"
            SELECT {LOG_COLUMNS} FROM workout_logs
            WHERE user_id = $1 AND planned_workout_id = $2 AND status = 'in_progress'
            "
        ))
        .bind(user_id.to_string())
        .bind(planned_workout_id.to_string())
        .fetch_optional(&self.pool)
        .await
        .map_err(|e| AppError::database(format!("Failed to find in-progress log: {e}")))?;

        row.map(|r| Self::row_to_log(&r)).transpose()
    }

    /// Insert an in-progress log unless one already exists
    ///
    /// The partial unique index `idx_workout_logs_one_in_progress` turns a
    /// concurrent duplicate into a no-op; the surviving row is returned.
    ///
    /// # Errors
    ///
    /// Returns an error if the database query fails
    pub async fn insert_in_progress_log(&self, log: &WorkoutLog) -> AppResult<WorkoutLog> {
        let result = sqlx::query(
            r"
            INSERT INTO workout_logs (id, user_id, planned_workout_id, status, started_at)
            VALUES ($1, $2, $3, 'in_progress', $4)
            ON CONFLICT (user_id, planned_workout_id) WHERE status = 'in_progress' DO NOTHING
            ",
        )
        .bind(log.id.to_string())
        .bind(log.user_id.to_string())
        .bind(log.planned_workout_id.to_string())
        .bind(rows::ts(log.started_at))
        .execute(&self.pool)
        .await
        .map_err(|e| AppError::database(format!("Failed to insert workout log: {e}")))?;

        if result.rows_affected() == 0 {
            debug!(
                user_id = %log.user_id,
                planned_workout_id = %log.planned_workout_id,
                "In-progress log already exists, returning existing row"
            );
        }

        self.find_in_progress_log(log.user_id, log.planned_workout_id)
            .await?
            .ok_or_else(|| AppError::database("In-progress log vanished after insert"))
    }

    /// Get a log by id
    ///
    /// # Errors
    ///
    /// Returns an error if the database query fails
    pub async fn get_workout_log(&self, log_id: Uuid) -> AppResult<Option<WorkoutLog>> {
        let row = sqlx::query(&format!(
            "SELECT {LOG_COLUMNS} FROM workout_logs WHERE id = $1"
        ))
        .bind(log_id.to_string())
        .fetch_optional(&self.pool)
        .await
        .map_err(|e| AppError::database(format!("Failed to get workout log: {e}")))?;

        row.map(|r| Self::row_to_log(&r)).transpose()
    }

    /// Insert an exercise log while its parent session is in progress
    ///
    /// The status check and the insert are one statement, so an entry can
    /// never land under a completed log. Returns `false` when nothing was
    /// inserted.
    ///
    /// # Errors
    ///
    /// Returns an error if the database query fails
    pub async fn insert_exercise_log(&self, log: &ExerciseLog) -> AppResult<bool> {
        let inserted = sqlx::query(&format!(
            r"
            INSERT INTO exercise_logs ({EXERCISE_LOG_COLUMNS})
            SELECT $1, $2, $3, $4, $5, $6, $7, $8, $9, $10, $11, $12, $13, $14
            WHERE EXISTS (
                SELECT 1 FROM workout_logs WHERE id = $2 AND status = 'in_progress'
            )
            "
        ))
        .bind(log.id.to_string())
        .bind(log.workout_log_id.to_string())
        .bind(log.exercise_id.to_string())
        .bind(i64::from(log.sets_planned))
        .bind(i64::from(log.sets_completed))
        .bind(rows::to_json(&log.sets)?)
        .bind(log.total_volume_lbs)
        .bind(i64::from(log.total_reps))
        .bind(log.avg_weight)
        .bind(log.max_weight)
        .bind(log.avg_reps)
        .bind(log.max_reps.map(i64::from))
        .bind(log.avg_rpe)
        .bind(rows::ts(log.created_at))
        .execute(&self.pool)
        .await
        .map_err(|e| AppError::database(format!("Failed to insert exercise log: {e}")))?;

        Ok(inserted.rows_affected() > 0)
    }

    /// List a session's exercise logs in insertion order
    ///
    /// # Errors
    ///
    /// Returns an error if the database query fails
    pub async fn list_exercise_logs(&self, workout_log_id: Uuid) -> AppResult<Vec<ExerciseLog>> {
        Self::fetch_exercise_logs(&self.pool, workout_log_id).await
    }

    async fn fetch_exercise_logs<'e>(
        executor: impl SqliteExecutor<'e>,
        workout_log_id: Uuid,
    ) -> AppResult<Vec<ExerciseLog>> {
        let rows = sqlx::query(&format!(
            r"
            SELECT {EXERCISE_LOG_COLUMNS}
            FROM exercise_logs
            WHERE workout_log_id = $1
            ORDER BY created_at, rowid
            "
        ))
        .bind(workout_log_id.to_string())
        .fetch_all(executor)
        .await
        .map_err(|e| AppError::database(format!("Failed to list exercise logs: {e}")))?;

        rows.iter().map(Self::row_to_exercise_log).collect()
    }

    /// Complete a session in one transaction
    ///
    /// The status flip is guarded by `status = 'in_progress'` and runs first,
    /// taking the write lock; aggregates are then computed from the exercise
    /// logs visible inside the same transaction. When the guard touches no
    /// row the transaction is rolled back and `None` is returned.
    ///
    /// # Errors
    ///
    /// Returns an error if any statement or the commit fails
    pub async fn complete_workout_log(
        &self,
        completion: &WorkoutCompletion,
    ) -> AppResult<Option<WorkoutAggregates>> {
        let mut tx = self
            .pool
            .begin()
            .await
            .map_err(|e| AppError::database(format!("Failed to begin transaction: {e}")))?;

        let completed_at = rows::ts(completion.completed_at);

        let claimed = sqlx::query(
            r"
            UPDATE workout_logs
            SET status = 'completed',
                completed_at = $1,
                notes = $2,
                perceived_difficulty = $3,
                energy_level = $4
            WHERE id = $5 AND status = 'in_progress'
            ",
        )
        .bind(&completed_at)
        .bind(&completion.feedback.notes)
        .bind(completion.feedback.perceived_difficulty)
        .bind(completion.feedback.energy_level)
        .bind(completion.log_id.to_string())
        .execute(&mut *tx)
        .await
        .map_err(|e| AppError::database(format!("Failed to complete workout log: {e}")))?;

        if claimed.rows_affected() == 0 {
            tx.rollback()
                .await
                .map_err(|e| AppError::database(format!("Failed to roll back: {e}")))?;
            return Ok(None);
        }

        let children = Self::fetch_exercise_logs(&mut *tx, completion.log_id).await?;
        let aggregates = WorkoutAggregates::from_exercise_logs(
            completion.started_at,
            completion.completed_at,
            &children,
        );
        Self::write_aggregates(&mut tx, completion.log_id, &aggregates).await?;

        sqlx::query(
            r"
            UPDATE plan_workouts
            SET completed = 1, completed_at = $1
            WHERE id = $2 AND completed = 0
            ",
        )
        .bind(&completed_at)
        .bind(completion.planned_workout_id.to_string())
        .execute(&mut *tx)
        .await
        .map_err(|e| {
            AppError::database(format!("Failed to mark planned workout completed: {e}"))
        })?;

        tx.commit()
            .await
            .map_err(|e| AppError::database(format!("Failed to commit completion: {e}")))?;

        Ok(Some(aggregates))
    }

    async fn write_aggregates(
        tx: &mut Transaction<'_, Sqlite>,
        log_id: Uuid,
        aggregates: &WorkoutAggregates,
    ) -> AppResult<()> {
        sqlx::query(
            r"
            UPDATE workout_logs
            SET duration_minutes = $1,
                total_volume = $2,
                total_reps = $3,
                total_sets = $4,
                total_exercises = $5,
                avg_rpe = $6
            WHERE id = $7
            ",
        )
        .bind(aggregates.duration_minutes)
        .bind(aggregates.total_volume)
        .bind(aggregates.total_reps)
        .bind(aggregates.total_sets)
        .bind(aggregates.total_exercises)
        .bind(aggregates.avg_rpe)
        .bind(log_id.to_string())
        .execute(&mut **tx)
        .await
        .map_err(|e| AppError::database(format!("Failed to write workout totals: {e}")))?;

        Ok(())
    }

    /// List a user's sessions newest first
    ///
    /// # Errors
    ///
    /// Returns an error if the database query fails
    pub async fn list_workout_logs(&self, user_id: Uuid, limit: u32) -> AppResult<Vec<WorkoutLog>> {
        let rows = sqlx::query(&format!(
            r"
            SELECT {LOG_COLUMNS} FROM workout_logs
            WHERE user_id = $1
            ORDER BY started_at DESC
            LIMIT $2
            "
        ))
        .bind(user_id.to_string())
        .bind(i64::from(limit))
        .fetch_all(&self.pool)
        .await
        .map_err(|e| AppError::database(format!("Failed to list workout logs: {e}")))?;

        rows.iter().map(Self::row_to_log).collect()
    }

    /// List a user's personal records
    ///
    /// # Errors
    ///
    /// Returns an error if the database query fails
    pub async fn list_personal_records(
        &self,
        user_id: Uuid,
        limit: u32,
    ) -> AppResult<Vec<PersonalRecord>> {
        let rows = sqlx::query(
            r"
            SELECT pr.user_id, pr.exercise_id, el.name AS exercise_name,
                   pr.max_weight, pr.max_reps, pr.max_volume, pr.achieved_at
            FROM exercise_pr_history pr
            LEFT JOIN exercise_library el ON el.id = pr.exercise_id
            WHERE pr.user_id = $1
            ORDER BY pr.achieved_at DESC
            LIMIT $2
            ",
        )
        .bind(user_id.to_string())
        .bind(i64::from(limit))
        .fetch_all(&self.pool)
        .await
        .map_err(|e| AppError::database(format!("Failed to list personal records: {e}")))?;

        rows.iter()
            .map(|row| {
                Ok(PersonalRecord {
                    user_id: rows::uuid(row, "user_id")?,
                    exercise_id: rows::uuid(row, "exercise_id")?,
                    exercise_name: rows::opt_text(row, "exercise_name")?,
                    max_weight: rows::real(row, "max_weight")?,
                    max_reps: rows::int(row, "max_reps")?,
                    max_volume: rows::real(row, "max_volume")?,
                    achieved_at: rows::timestamp(row, "achieved_at")?,
                })
            })
            .collect()
    }

    // ========================================================================
    // Row mapping
    // ========================================================================

    fn row_to_log(row: &SqliteRow) -> AppResult<WorkoutLog> {
        let opt_i32 = |column: &str| -> AppResult<Option<i32>> {
            rows::opt_int(row, column)?
                .map(|v| {
                    i32::try_from(v).map_err(|_| {
                        AppError::database(format!("Column {column} out of range: {v}"))
                    })
                })
                .transpose()
        };

        Ok(WorkoutLog {
            id: rows::uuid(row, "id")?,
            user_id: rows::uuid(row, "user_id")?,
            planned_workout_id: rows::uuid(row, "planned_workout_id")?,
            status: rows::text(row, "status")?.parse::<WorkoutLogStatus>()?,
            started_at: rows::timestamp(row, "started_at")?,
            completed_at: rows::opt_timestamp(row, "completed_at")?,
            duration_minutes: rows::opt_int(row, "duration_minutes")?,
            total_volume: rows::opt_real(row, "total_volume")?,
            total_reps: rows::opt_int(row, "total_reps")?,
            total_sets: rows::opt_int(row, "total_sets")?,
            total_exercises: rows::opt_int(row, "total_exercises")?,
            avg_rpe: rows::opt_real(row, "avg_rpe")?,
            notes: rows::opt_text(row, "notes")?,
            perceived_difficulty: opt_i32("perceived_difficulty")?,
            energy_level: opt_i32("energy_level")?,
        })
    }

    fn row_to_exercise_log(row: &SqliteRow) -> AppResult<ExerciseLog> {
        Ok(ExerciseLog {
            id: rows::uuid(row, "id")?,
            workout_log_id: rows::uuid(row, "workout_log_id")?,
            exercise_id: rows::uuid(row, "exercise_id")?,
            sets_planned: rows::unsigned(row, "sets_planned")?,
            sets_completed: rows::unsigned(row, "sets_completed")?,
            sets: rows::json(row, "sets_data")?,
            total_volume_lbs: rows::real(row, "total_volume_lbs")?,
            total_reps: rows::unsigned(row, "total_reps")?,
            avg_weight: rows::opt_real(row, "avg_weight")?,
            max_weight: rows::opt_real(row, "max_weight")?,
            avg_reps: rows::opt_real(row, "avg_reps")?,
            max_reps: rows::opt_unsigned(row, "max_reps")?,
            avg_rpe: rows::opt_real(row, "avg_rpe")?,
            created_at: rows::timestamp(row, "created_at")?,
        })
    }
}
