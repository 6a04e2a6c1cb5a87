// ABOUTME: Database operations for the exercise library, profiles, and workout plans
// ABOUTME: Planned weeks are inserted workout-by-workout inside a single transaction
//
// SPDX-License-Identifier: MIT OR Apache-2.0
// Copyright (c) 2025 Pierre Fitness Intelligence

use chrono::{NaiveDate, Utc};
use sqlx::sqlite::SqliteRow;
use sqlx::SqlitePool;
use uuid::Uuid;

use super::rows;
use crate::errors::{AppError, AppResult};
use crate::models::{
    ExerciseSummary, PlanStatus, PlannedExercise, PlannedWorkout, TrainingPreferences,
    WorkoutPlan,
};

const PLAN_COLUMNS: &str = "id, user_id, name, plan_type, start_date, end_date, days_per_week, \
                            split_pattern, status, current_week, created_at";

const WORKOUT_COLUMNS: &str = "id, plan_id, week_number, day_of_week, name, target_muscles, \
                               estimated_duration_minutes, completed, completed_at";

/// Plan and library database operations manager
#[derive(Clone)]
pub struct PlanManager {
    pool: SqlitePool,
}

impl PlanManager {
    /// Create a new plan manager
    #[must_use]
    pub const fn new(pool: SqlitePool) -> Self {
        Self { pool }
    }

    // ========================================================================
    // Exercise library
    // ========================================================================

    /// List all library exercises ordered by name
    ///
    /// # Errors
    ///
    /// Returns an error if the database query fails
    pub async fn list_exercise_library(&self) -> AppResult<Vec<ExerciseSummary>> {
        let rows = sqlx::query(
            "SELECT id, name, category, target_muscles FROM exercise_library ORDER BY name",
        )
        .fetch_all(&self.pool)
        .await
        .map_err(|e| AppError::database(format!("Failed to list exercise library: {e}")))?;

        rows.iter()
            .map(|row| {
                Ok(ExerciseSummary {
                    id: rows::uuid(row, "id")?,
                    name: rows::text(row, "name")?,
                    category: rows::opt_text(row, "category")?,
                    target_muscles: rows::json(row, "target_muscles")?,
                })
            })
            .collect()
    }

    /// Insert or update a library exercise
    ///
    /// # Errors
    ///
    /// Returns an error if the database query fails
    pub async fn upsert_exercise(&self, exercise: &ExerciseSummary) -> AppResult<()> {
        sqlx::query(
            r"
            INSERT INTO exercise_library (id, name, category, target_muscles)
            VALUES ($1, $2, $3, $4)
            ON CONFLICT (id) DO UPDATE SET
                name = excluded.name,
                category = excluded.category,
                target_muscles = excluded.target_muscles
            ",
        )
        .bind(exercise.id.to_string())
        .bind(&exercise.name)
        .bind(&exercise.category)
        .bind(rows::to_json(&exercise.target_muscles)?)
        .execute(&self.pool)
        .await
        .map_err(|e| AppError::database(format!("Failed to upsert exercise: {e}")))?;

        Ok(())
    }

    // ========================================================================
    // Profiles
    // ========================================================================

    /// Get a user's stored training preferences
    ///
    /// # Errors
    ///
    /// Returns an error if the database query fails
    pub async fn get_training_preferences(
        &self,
        user_id: Uuid,
    ) -> AppResult<Option<TrainingPreferences>> {
        let row = sqlx::query(
            r"
            SELECT training_style, days_per_week, session_minutes, exercises_per_workout
            FROM profiles WHERE id = $1
            ",
        )
        .bind(user_id.to_string())
        .fetch_optional(&self.pool)
        .await
        .map_err(|e| AppError::database(format!("Failed to get profile: {e}")))?;

        row.map(|r| {
            Ok(TrainingPreferences {
                training_style: rows::text(&r, "training_style")?,
                days_per_week: rows::unsigned(&r, "days_per_week")?,
                session_minutes: rows::unsigned(&r, "session_minutes")?,
                exercises_per_workout: rows::unsigned(&r, "exercises_per_workout")?,
            })
        })
        .transpose()
    }

    /// Insert or update a user's training preferences
    ///
    /// # Errors
    ///
    /// Returns an error if the database query fails
    pub async fn upsert_profile(
        &self,
        user_id: Uuid,
        preferences: &TrainingPreferences,
    ) -> AppResult<()> {
        sqlx::query(
            r"
            INSERT INTO profiles
                (id, training_style, days_per_week, session_minutes, exercises_per_workout, updated_at)
            VALUES ($1, $2, $3, $4, $5, $6)
            ON CONFLICT (id) DO UPDATE SET
                training_style = excluded.training_style,
                days_per_week = excluded.days_per_week,
                session_minutes = excluded.session_minutes,
                exercises_per_workout = excluded.exercises_per_workout,
                updated_at = excluded.updated_at
            ",
        )
        .bind(user_id.to_string())
        .bind(&preferences.training_style)
        .bind(i64::from(preferences.days_per_week))
        .bind(i64::from(preferences.session_minutes))
        .bind(i64::from(preferences.exercises_per_workout))
        .bind(rows::ts(Utc::now()))
        .execute(&self.pool)
        .await
        .map_err(|e| AppError::database(format!("Failed to upsert profile: {e}")))?;

        Ok(())
    }

    // ========================================================================
    // Plans
    // ========================================================================

    /// Insert a new plan
    ///
    /// # Errors
    ///
    /// Returns an error if the database query fails
    pub async fn create_plan(&self, plan: &WorkoutPlan) -> AppResult<()> {
        sqlx::query(
            r"
            INSERT INTO user_workout_plans
                (id, user_id, name, plan_type, start_date, end_date, days_per_week,
                 split_pattern, status, current_week, created_at)
            VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, $10, $11)
            ",
        )
        .bind(plan.id.to_string())
        .bind(plan.user_id.to_string())
        .bind(&plan.name)
        .bind(&plan.plan_type)
        .bind(plan.start_date.to_string())
        .bind(plan.end_date.map(|d| d.to_string()))
        .bind(i64::from(plan.days_per_week))
        .bind(&plan.split_pattern)
        .bind(plan.status.as_str())
        .bind(i64::from(plan.current_week))
        .bind(rows::ts(plan.created_at))
        .execute(&self.pool)
        .await
        .map_err(|e| AppError::database(format!("Failed to create plan: {e}")))?;

        Ok(())
    }

    /// Get a plan by id
    ///
    /// # Errors
    ///
    /// Returns an error if the database query fails
    pub async fn get_plan(&self, plan_id: Uuid) -> AppResult<Option<WorkoutPlan>> {
        let row = sqlx::query(&format!(
            "SELECT {PLAN_COLUMNS} FROM user_workout_plans WHERE id = $1"
        ))
        .bind(plan_id.to_string())
        .fetch_optional(&self.pool)
        .await
        .map_err(|e| AppError::database(format!("Failed to get plan: {e}")))?;

        row.map(|r| Self::row_to_plan(&r)).transpose()
    }

    /// Get the newest active plan for a user
    ///
    /// # Errors
    ///
    /// Returns an error if the database query fails
    pub async fn get_active_plan(&self, user_id: Uuid) -> AppResult<Option<WorkoutPlan>> {
        let row = sqlx::query(&format!(
            r"
            SELECT {PLAN_COLUMNS} FROM user_workout_plans
            WHERE user_id = $1 AND status = 'active'
            ORDER BY created_at DESC
            LIMIT 1
            "
        ))
        .bind(user_id.to_string())
        .fetch_optional(&self.pool)
        .await
        .map_err(|e| AppError::database(format!("Failed to get active plan: {e}")))?;

        row.map(|r| Self::row_to_plan(&r)).transpose()
    }

    // ========================================================================
    // Planned workouts
    // ========================================================================

    /// List one week's workouts with their exercises
    ///
    /// # Errors
    ///
    /// Returns an error if the database query fails
    pub async fn list_plan_workouts(
        &self,
        plan_id: Uuid,
        week_number: u32,
    ) -> AppResult<Vec<PlannedWorkout>> {
        let rows = sqlx::query(&format!(
            r"
            SELECT {WORKOUT_COLUMNS} FROM plan_workouts
            WHERE plan_id = $1 AND week_number = $2
            ORDER BY day_of_week
            "
        ))
        .bind(plan_id.to_string())
        .bind(i64::from(week_number))
        .fetch_all(&self.pool)
        .await
        .map_err(|e| AppError::database(format!("Failed to list plan workouts: {e}")))?;

        let mut workouts = Vec::with_capacity(rows.len());
        for row in &rows {
            let mut workout = Self::row_to_workout(row)?;
            workout.exercises = self.list_planned_exercises(workout.id).await?;
            workouts.push(workout);
        }
        Ok(workouts)
    }

    /// Get one planned workout with its exercises
    ///
    /// # Errors
    ///
    /// Returns an error if the database query fails
    pub async fn get_planned_workout(&self, workout_id: Uuid) -> AppResult<Option<PlannedWorkout>> {
        let row = sqlx::query(&format!(
            "SELECT {WORKOUT_COLUMNS} FROM plan_workouts WHERE id = $1"
        ))
        .bind(workout_id.to_string())
        .fetch_optional(&self.pool)
        .await
        .map_err(|e| AppError::database(format!("Failed to get planned workout: {e}")))?;

        let Some(row) = row else {
            return Ok(None);
        };
        let mut workout = Self::row_to_workout(&row)?;
        workout.exercises = self.list_planned_exercises(workout.id).await?;
        Ok(Some(workout))
    }

    async fn list_planned_exercises(&self, workout_id: Uuid) -> AppResult<Vec<PlannedExercise>> {
        let rows = sqlx::query(
            r"
            SELECT pe.id, pe.exercise_id, el.name AS exercise_name, pe.order_index,
                   pe.target_sets, pe.target_reps, pe.rest_seconds, pe.tempo,
                   pe.target_rpe, pe.notes
            FROM plan_exercises pe
            LEFT JOIN exercise_library el ON el.id = pe.exercise_id
            WHERE pe.plan_workout_id = $1
            ORDER BY pe.order_index
            ",
        )
        .bind(workout_id.to_string())
        .fetch_all(&self.pool)
        .await
        .map_err(|e| AppError::database(format!("Failed to list planned exercises: {e}")))?;

        rows.iter()
            .map(|row| {
                Ok(PlannedExercise {
                    id: rows::uuid(row, "id")?,
                    exercise_id: rows::uuid(row, "exercise_id")?,
                    exercise_name: rows::opt_text(row, "exercise_name")?,
                    order_index: rows::unsigned(row, "order_index")?,
                    target_sets: rows::unsigned(row, "target_sets")?,
                    target_reps: rows::text(row, "target_reps")?,
                    rest_seconds: rows::opt_unsigned(row, "rest_seconds")?,
                    tempo: rows::opt_text(row, "tempo")?,
                    target_rpe: rows::opt_real(row, "target_rpe")?,
                    notes: rows::opt_text(row, "notes")?,
                })
            })
            .collect()
    }

    /// Insert a generated week atomically
    ///
    /// # Errors
    ///
    /// Returns a state conflict if the week already has workouts, or a
    /// database error if any insert fails (nothing is written in that case)
    pub async fn insert_planned_week(
        &self,
        plan_id: Uuid,
        week_number: u32,
        workouts: &[PlannedWorkout],
    ) -> AppResult<()> {
        let mut tx = self
            .pool
            .begin()
            .await
            .map_err(|e| AppError::database(format!("Failed to begin transaction: {e}")))?;

        let existing: i64 = sqlx::query_scalar(
            "SELECT COUNT(*) FROM plan_workouts WHERE plan_id = $1 AND week_number = $2",
        )
        .bind(plan_id.to_string())
        .bind(i64::from(week_number))
        .fetch_one(&mut *tx)
        .await
        .map_err(|e| AppError::database(format!("Failed to count plan workouts: {e}")))?;

        if existing > 0 {
            return Err(AppError::state_conflict(format!(
                "Week {week_number} has already been generated for this plan"
            )));
        }

        for workout in workouts {
            sqlx::query(
                r"
                INSERT INTO plan_workouts
                    (id, plan_id, week_number, day_of_week, name, target_muscles,
                     estimated_duration_minutes, completed, completed_at)
                VALUES ($1, $2, $3, $4, $5, $6, $7, 0, NULL)
                ",
            )
            .bind(workout.id.to_string())
            .bind(plan_id.to_string())
            .bind(i64::from(week_number))
            .bind(i64::from(workout.day_of_week))
            .bind(&workout.name)
            .bind(rows::to_json(&workout.target_muscles)?)
            .bind(workout.estimated_duration_minutes.map(i64::from))
            .execute(&mut *tx)
            .await
            .map_err(|e| AppError::database(format!("Failed to insert plan workout: {e}")))?;

            for exercise in &workout.exercises {
                sqlx::query(
                    r"
                    INSERT INTO plan_exercises
                        (id, plan_workout_id, exercise_id, order_index, target_sets,
                         target_reps, rest_seconds, tempo, target_rpe, notes)
                    VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, $10)
                    ",
                )
                .bind(exercise.id.to_string())
                .bind(workout.id.to_string())
                .bind(exercise.exercise_id.to_string())
                .bind(i64::from(exercise.order_index))
                .bind(i64::from(exercise.target_sets))
                .bind(&exercise.target_reps)
                .bind(exercise.rest_seconds.map(i64::from))
                .bind(&exercise.tempo)
                .bind(exercise.target_rpe)
                .bind(&exercise.notes)
                .execute(&mut *tx)
                .await
                .map_err(|e| AppError::database(format!("Failed to insert plan exercise: {e}")))?;
            }
        }

        tx.commit()
            .await
            .map_err(|e| AppError::database(format!("Failed to commit planned week: {e}")))?;

        Ok(())
    }

    // ========================================================================
    // Row mapping
    // ========================================================================

    fn row_to_plan(row: &SqliteRow) -> AppResult<WorkoutPlan> {
        let parse_date = |column: &str, raw: &str| {
            NaiveDate::parse_from_str(raw, "%Y-%m-%d")
                .map_err(|e| AppError::database(format!("Invalid date in column {column}: {e}")))
        };

        Ok(WorkoutPlan {
            id: rows::uuid(row, "id")?,
            user_id: rows::uuid(row, "user_id")?,
            name: rows::text(row, "name")?,
            plan_type: rows::text(row, "plan_type")?,
            start_date: parse_date("start_date", &rows::text(row, "start_date")?)?,
            end_date: rows::opt_text(row, "end_date")?
                .map(|raw| parse_date("end_date", &raw))
                .transpose()?,
            days_per_week: rows::unsigned(row, "days_per_week")?,
            split_pattern: rows::opt_text(row, "split_pattern")?,
            status: rows::text(row, "status")?.parse::<PlanStatus>()?,
            current_week: rows::unsigned(row, "current_week")?,
            created_at: rows::timestamp(row, "created_at")?,
        })
    }

    fn row_to_workout(row: &SqliteRow) -> AppResult<PlannedWorkout> {
        Ok(PlannedWorkout {
            id: rows::uuid(row, "id")?,
            plan_id: rows::uuid(row, "plan_id")?,
            week_number: rows::unsigned(row, "week_number")?,
            day_of_week: rows::unsigned(row, "day_of_week")?,
            name: rows::text(row, "name")?,
            target_muscles: rows::json(row, "target_muscles")?,
            estimated_duration_minutes: rows::opt_unsigned(row, "estimated_duration_minutes")?,
            completed: rows::int(row, "completed")? != 0,
            completed_at: rows::opt_timestamp(row, "completed_at")?,
            exercises: Vec::new(),
        })
    }
}
