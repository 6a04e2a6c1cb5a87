// ABOUTME: Persistence layer for plans, workout sessions, personal records, and subscriptions
// ABOUTME: WorkoutStore trait plus the sqlx SQLite implementation with inline migrations
//
// SPDX-License-Identifier: MIT OR Apache-2.0
// Copyright (c) 2025 Pierre Fitness Intelligence

//! # Database
//!
//! Services depend on [`WorkoutStore`] only. [`SqliteWorkoutStore`] is the
//! production implementation; it delegates to one manager per table group,
//! each wrapping the shared `SqlitePool`.
//!
//! Personal records and week progression are maintained by triggers created
//! in [`migrations`]; application code never writes `exercise_pr_history`.

/// Schema creation: tables, indexes, triggers
pub mod migrations;
/// Exercise library, profiles, plans, planned workouts
pub mod plans;
/// Row decoding helpers shared by the managers
mod rows;
/// `RevenueCat` subscription rows
pub mod subscriptions;
/// Workout logs, exercise logs, personal records
pub mod workout_logs;

use std::str::FromStr;

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use sqlx::sqlite::{SqliteConnectOptions, SqlitePoolOptions};
use sqlx::SqlitePool;
use tracing::info;
use uuid::Uuid;

use crate::errors::{AppError, AppResult};
use crate::models::{
    CompletionFeedback, ExerciseLog, ExerciseSummary, PersonalRecord, PlannedWorkout,
    Subscription, TrainingPreferences, WorkoutAggregates, WorkoutLog, WorkoutPlan,
};

pub use plans::PlanManager;
pub use subscriptions::SubscriptionManager;
pub use workout_logs::WorkoutLogManager;

/// Everything written when a session completes
#[derive(Debug, Clone)]
pub struct WorkoutCompletion {
    /// Log being completed
    pub log_id: Uuid,
    /// Planned workout to mark completed in the same transaction
    pub planned_workout_id: Uuid,
    /// Session start, for the duration
    pub started_at: DateTime<Utc>,
    /// Completion timestamp
    pub completed_at: DateTime<Utc>,
    /// Caller-supplied subjective fields
    pub feedback: CompletionFeedback,
}

/// Storage contract used by the services
#[async_trait]
pub trait WorkoutStore: Send + Sync {
    // ------------------------------------------------------------------
    // Exercise library and profiles
    // ------------------------------------------------------------------

    /// All exercises available to the week generator
    async fn list_exercise_library(&self) -> AppResult<Vec<ExerciseSummary>>;

    /// Insert or update one library exercise
    async fn upsert_exercise(&self, exercise: &ExerciseSummary) -> AppResult<()>;

    /// Stored training preferences for a user
    async fn get_training_preferences(
        &self,
        user_id: Uuid,
    ) -> AppResult<Option<TrainingPreferences>>;

    /// Insert or update a user's training preferences
    async fn upsert_profile(&self, user_id: Uuid, preferences: &TrainingPreferences)
        -> AppResult<()>;

    // ------------------------------------------------------------------
    // Plans
    // ------------------------------------------------------------------

    /// Insert a new plan
    async fn create_plan(&self, plan: &WorkoutPlan) -> AppResult<()>;

    /// Plan by id
    async fn get_plan(&self, plan_id: Uuid) -> AppResult<Option<WorkoutPlan>>;

    /// Most recent active plan for a user
    async fn get_active_plan(&self, user_id: Uuid) -> AppResult<Option<WorkoutPlan>>;

    /// Workouts (with exercises) for one week of a plan, ordered by day
    async fn list_plan_workouts(
        &self,
        plan_id: Uuid,
        week_number: u32,
    ) -> AppResult<Vec<PlannedWorkout>>;

    /// Planned workout by id, with exercises
    async fn get_planned_workout(&self, workout_id: Uuid) -> AppResult<Option<PlannedWorkout>>;

    /// Insert a generated week's workouts and exercises in one transaction
    async fn insert_planned_week(
        &self,
        plan_id: Uuid,
        week_number: u32,
        workouts: &[PlannedWorkout],
    ) -> AppResult<()>;

    // ------------------------------------------------------------------
    // Sessions
    // ------------------------------------------------------------------

    /// In-progress log for (user, planned workout), if any
    async fn find_in_progress_log(
        &self,
        user_id: Uuid,
        planned_workout_id: Uuid,
    ) -> AppResult<Option<WorkoutLog>>;

    /// Atomically insert `log` unless an in-progress log already exists for the
    /// same (user, planned workout); returns whichever log is in progress afterwards
    async fn insert_in_progress_log(&self, log: &WorkoutLog) -> AppResult<WorkoutLog>;

    /// Log by id
    async fn get_workout_log(&self, log_id: Uuid) -> AppResult<Option<WorkoutLog>>;

    /// Insert an exercise log if its session is still in progress; fires the
    /// personal-record trigger. Returns `false` when nothing was inserted.
    async fn insert_exercise_log(&self, log: &ExerciseLog) -> AppResult<bool>;

    /// Exercise logs of a session in insertion order
    async fn list_exercise_logs(&self, workout_log_id: Uuid) -> AppResult<Vec<ExerciseLog>>;

    /// Complete the log, write aggregates over its exercise logs, and mark the
    /// planned workout completed in one transaction. Returns `None` without
    /// writing when the log is no longer in progress.
    async fn complete_workout_log(
        &self,
        completion: &WorkoutCompletion,
    ) -> AppResult<Option<WorkoutAggregates>>;

    /// Newest-first session history
    async fn list_workout_logs(&self, user_id: Uuid, limit: u32) -> AppResult<Vec<WorkoutLog>>;

    /// Personal records, most recently improved first
    async fn list_personal_records(
        &self,
        user_id: Uuid,
        limit: u32,
    ) -> AppResult<Vec<PersonalRecord>>;

    // ------------------------------------------------------------------
    // Subscriptions
    // ------------------------------------------------------------------

    /// Insert or replace the subscription row for a user
    async fn upsert_subscription(&self, subscription: &Subscription) -> AppResult<()>;

    /// Subscription row for a user
    async fn get_subscription(&self, user_id: Uuid) -> AppResult<Option<Subscription>>;

    /// Cheap connectivity probe for readiness checks
    async fn health_check(&self) -> AppResult<()>;
}

/// `SQLite` implementation of [`WorkoutStore`]
#[derive(Clone)]
pub struct SqliteWorkoutStore {
    pool: SqlitePool,
    plans: PlanManager,
    logs: WorkoutLogManager,
    subscriptions: SubscriptionManager,
}

impl SqliteWorkoutStore {
    /// Connect and run migrations
    ///
    /// # Errors
    ///
    /// Returns an error if the URL is invalid, the connection fails, or a
    /// migration statement fails
    pub async fn connect(database_url: &str) -> AppResult<Self> {
        let options = SqliteConnectOptions::from_str(database_url)
            .map_err(|e| AppError::config_invalid(format!("Invalid DATABASE_URL: {e}")))?
            .create_if_missing(true)
            .foreign_keys(true);

        // Every connection to `sqlite::memory:` is a separate database, so the
        // single connection must never be recycled
        let in_memory = database_url.contains(":memory:");
        let pool_options = if in_memory {
            SqlitePoolOptions::new()
                .max_connections(1)
                .idle_timeout(None)
                .max_lifetime(None)
        } else {
            SqlitePoolOptions::new().max_connections(5)
        };

        let pool = pool_options
            .connect_with(options)
            .await
            .map_err(|e| AppError::database(format!("Failed to connect to database: {e}")))?;

        let store = Self::from_pool(pool);
        store.migrate().await?;
        info!("Database ready: {database_url}");
        Ok(store)
    }

    /// Wrap an existing pool without running migrations
    #[must_use]
    pub fn from_pool(pool: SqlitePool) -> Self {
        Self {
            plans: PlanManager::new(pool.clone()),
            logs: WorkoutLogManager::new(pool.clone()),
            subscriptions: SubscriptionManager::new(pool.clone()),
            pool,
        }
    }

    /// Run schema migrations
    ///
    /// # Errors
    ///
    /// Returns an error if any DDL statement fails
    pub async fn migrate(&self) -> AppResult<()> {
        migrations::run(&self.pool).await
    }

    /// Get a reference to the database pool
    #[must_use]
    pub const fn pool(&self) -> &SqlitePool {
        &self.pool
    }
}

#[async_trait]
impl WorkoutStore for SqliteWorkoutStore {
    async fn list_exercise_library(&self) -> AppResult<Vec<ExerciseSummary>> {
        self.plans.list_exercise_library().await
    }

    async fn upsert_exercise(&self, exercise: &ExerciseSummary) -> AppResult<()> {
        self.plans.upsert_exercise(exercise).await
    }

    async fn get_training_preferences(
        &self,
        user_id: Uuid,
    ) -> AppResult<Option<TrainingPreferences>> {
        self.plans.get_training_preferences(user_id).await
    }

    async fn upsert_profile(
        &self,
        user_id: Uuid,
        preferences: &TrainingPreferences,
    ) -> AppResult<()> {
        self.plans.upsert_profile(user_id, preferences).await
    }

    async fn create_plan(&self, plan: &WorkoutPlan) -> AppResult<()> {
        self.plans.create_plan(plan).await
    }

    async fn get_plan(&self, plan_id: Uuid) -> AppResult<Option<WorkoutPlan>> {
        self.plans.get_plan(plan_id).await
    }

    async fn get_active_plan(&self, user_id: Uuid) -> AppResult<Option<WorkoutPlan>> {
        self.plans.get_active_plan(user_id).await
    }

    async fn list_plan_workouts(
        &self,
        plan_id: Uuid,
        week_number: u32,
    ) -> AppResult<Vec<PlannedWorkout>> {
        self.plans.list_plan_workouts(plan_id, week_number).await
    }

    async fn get_planned_workout(&self, workout_id: Uuid) -> AppResult<Option<PlannedWorkout>> {
        self.plans.get_planned_workout(workout_id).await
    }

    async fn insert_planned_week(
        &self,
        plan_id: Uuid,
        week_number: u32,
        workouts: &[PlannedWorkout],
    ) -> AppResult<()> {
        self.plans
            .insert_planned_week(plan_id, week_number, workouts)
            .await
    }

    async fn find_in_progress_log(
        &self,
        user_id: Uuid,
        planned_workout_id: Uuid,
    ) -> AppResult<Option<WorkoutLog>> {
        self.logs
            .find_in_progress_log(user_id, planned_workout_id)
            .await
    }

    async fn insert_in_progress_log(&self, log: &WorkoutLog) -> AppResult<WorkoutLog> {
        self.logs.insert_in_progress_log(log).await
    }

    async fn get_workout_log(&self, log_id: Uuid) -> AppResult<Option<WorkoutLog>> {
        self.logs.get_workout_log(log_id).await
    }

    async fn insert_exercise_log(&self, log: &ExerciseLog) -> AppResult<bool> {
        self.logs.insert_exercise_log(log).await
    }

    async fn list_exercise_logs(&self, workout_log_id: Uuid) -> AppResult<Vec<ExerciseLog>> {
        self.logs.list_exercise_logs(workout_log_id).await
    }

    async fn complete_workout_log(
        &self,
        completion: &WorkoutCompletion,
    ) -> AppResult<Option<WorkoutAggregates>> {
        self.logs.complete_workout_log(completion).await
    }

    async fn list_workout_logs(&self, user_id: Uuid, limit: u32) -> AppResult<Vec<WorkoutLog>> {
        self.logs.list_workout_logs(user_id, limit).await
    }

    async fn list_personal_records(
        &self,
        user_id: Uuid,
        limit: u32,
    ) -> AppResult<Vec<PersonalRecord>> {
        self.logs.list_personal_records(user_id, limit).await
    }

    async fn upsert_subscription(&self, subscription: &Subscription) -> AppResult<()> {
        self.subscriptions.upsert_subscription(subscription).await
    }

    async fn get_subscription(&self, user_id: Uuid) -> AppResult<Option<Subscription>> {
        self.subscriptions.get_subscription(user_id).await
    }

    async fn health_check(&self) -> AppResult<()> {
        sqlx::query("SELECT 1")
            .execute(&self.pool)
            .await
            .map_err(|e| AppError::database(format!("Health check failed: {e}")))?;
        Ok(())
    }
}
