// ABOUTME: Inline schema migrations for the V-Life SQLite database
// ABOUTME: Creates tables, the one-active-session index, and PR/progression triggers
//
// SPDX-License-Identifier: MIT OR Apache-2.0
// Copyright (c) 2025 Pierre Fitness Intelligence

use sqlx::SqlitePool;

use crate::errors::{AppError, AppResult};

/// Ordered DDL statements; every statement is idempotent
const SCHEMA: &[(&str, &str)] = &[
    (
        "profiles",
        r"
        CREATE TABLE IF NOT EXISTS profiles (
            id TEXT PRIMARY KEY,
            training_style TEXT NOT NULL,
            days_per_week INTEGER NOT NULL CHECK (days_per_week BETWEEN 1 AND 7),
            session_minutes INTEGER NOT NULL,
            exercises_per_workout INTEGER NOT NULL,
            updated_at TEXT NOT NULL
        )
        ",
    ),
    (
        "exercise_library",
        r"
        CREATE TABLE IF NOT EXISTS exercise_library (
            id TEXT PRIMARY KEY,
            name TEXT NOT NULL,
            category TEXT,
            target_muscles TEXT NOT NULL DEFAULT '[]'
        )
        ",
    ),
    (
        "user_workout_plans",
        r"
        CREATE TABLE IF NOT EXISTS user_workout_plans (
            id TEXT PRIMARY KEY,
            user_id TEXT NOT NULL,
            name TEXT NOT NULL,
            plan_type TEXT NOT NULL,
            start_date TEXT NOT NULL,
            end_date TEXT,
            days_per_week INTEGER NOT NULL,
            split_pattern TEXT,
            status TEXT NOT NULL DEFAULT 'active'
                CHECK (status IN ('active', 'completed', 'archived')),
            current_week INTEGER NOT NULL DEFAULT 1,
            created_at TEXT NOT NULL
        )
        ",
    ),
    (
        "idx_user_workout_plans_user",
        "CREATE INDEX IF NOT EXISTS idx_user_workout_plans_user ON user_workout_plans(user_id, status)",
    ),
    (
        "plan_workouts",
        r"
        CREATE TABLE IF NOT EXISTS plan_workouts (
            id TEXT PRIMARY KEY,
            plan_id TEXT NOT NULL REFERENCES user_workout_plans(id) ON DELETE CASCADE,
            week_number INTEGER NOT NULL CHECK (week_number BETWEEN 1 AND 4),
            day_of_week INTEGER NOT NULL,
            name TEXT NOT NULL,
            target_muscles TEXT NOT NULL DEFAULT '[]',
            estimated_duration_minutes INTEGER,
            completed INTEGER NOT NULL DEFAULT 0,
            completed_at TEXT
        )
        ",
    ),
    (
        "idx_plan_workouts_plan_week",
        "CREATE INDEX IF NOT EXISTS idx_plan_workouts_plan_week ON plan_workouts(plan_id, week_number)",
    ),
    (
        "plan_exercises",
        r"
        CREATE TABLE IF NOT EXISTS plan_exercises (
            id TEXT PRIMARY KEY,
            plan_workout_id TEXT NOT NULL REFERENCES plan_workouts(id) ON DELETE CASCADE,
            exercise_id TEXT NOT NULL,
            order_index INTEGER NOT NULL,
            target_sets INTEGER NOT NULL,
            target_reps TEXT NOT NULL,
            rest_seconds INTEGER,
            tempo TEXT,
            target_rpe REAL,
            notes TEXT
        )
        ",
    ),
    (
        "workout_logs",
        r"
        CREATE TABLE IF NOT EXISTS workout_logs (
            id TEXT PRIMARY KEY,
            user_id TEXT NOT NULL,
            planned_workout_id TEXT NOT NULL,
            status TEXT NOT NULL CHECK (status IN ('in_progress', 'completed')),
            started_at TEXT NOT NULL,
            completed_at TEXT,
            duration_minutes INTEGER,
            total_volume REAL,
            total_reps INTEGER,
            total_sets INTEGER,
            total_exercises INTEGER,
            avg_rpe REAL,
            notes TEXT,
            perceived_difficulty INTEGER,
            energy_level INTEGER
        )
        ",
    ),
    (
        "idx_workout_logs_one_in_progress",
        r"
        CREATE UNIQUE INDEX IF NOT EXISTS idx_workout_logs_one_in_progress
        ON workout_logs(user_id, planned_workout_id)
        WHERE status = 'in_progress'
        ",
    ),
    (
        "idx_workout_logs_user_started",
        "CREATE INDEX IF NOT EXISTS idx_workout_logs_user_started ON workout_logs(user_id, started_at)",
    ),
    (
        "exercise_logs",
        r"
        CREATE TABLE IF NOT EXISTS exercise_logs (
            id TEXT PRIMARY KEY,
            workout_log_id TEXT NOT NULL REFERENCES workout_logs(id) ON DELETE CASCADE,
            exercise_id TEXT NOT NULL,
            sets_planned INTEGER NOT NULL,
            sets_completed INTEGER NOT NULL,
            sets_data TEXT NOT NULL DEFAULT '[]',
            total_volume_lbs REAL NOT NULL DEFAULT 0,
            total_reps INTEGER NOT NULL DEFAULT 0,
            avg_weight REAL,
            max_weight REAL,
            avg_reps REAL,
            max_reps INTEGER,
            avg_rpe REAL,
            created_at TEXT NOT NULL
        )
        ",
    ),
    (
        "idx_exercise_logs_workout",
        "CREATE INDEX IF NOT EXISTS idx_exercise_logs_workout ON exercise_logs(workout_log_id)",
    ),
    (
        "exercise_pr_history",
        r"
        CREATE TABLE IF NOT EXISTS exercise_pr_history (
            user_id TEXT NOT NULL,
            exercise_id TEXT NOT NULL,
            max_weight REAL NOT NULL DEFAULT 0,
            max_reps INTEGER NOT NULL DEFAULT 0,
            max_volume REAL NOT NULL DEFAULT 0,
            achieved_at TEXT NOT NULL,
            PRIMARY KEY (user_id, exercise_id)
        )
        ",
    ),
    (
        "subscriptions",
        r"
        CREATE TABLE IF NOT EXISTS subscriptions (
            user_id TEXT PRIMARY KEY,
            status TEXT NOT NULL CHECK (status IN ('active', 'cancelled', 'past_due')),
            plan_tier TEXT NOT NULL,
            product_id TEXT,
            store TEXT,
            current_period_end TEXT,
            last_event_type TEXT NOT NULL,
            last_event_id TEXT,
            updated_at TEXT NOT NULL
        )
        ",
    ),
    // Personal records: keep the best weight, reps and volume per (user, exercise)
    (
        "trg_exercise_logs_personal_records",
        r"
        CREATE TRIGGER IF NOT EXISTS trg_exercise_logs_personal_records
        AFTER INSERT ON exercise_logs
        BEGIN
            INSERT INTO exercise_pr_history
                (user_id, exercise_id, max_weight, max_reps, max_volume, achieved_at)
            SELECT wl.user_id, NEW.exercise_id,
                   COALESCE(NEW.max_weight, 0), COALESCE(NEW.max_reps, 0),
                   NEW.total_volume_lbs, NEW.created_at
            FROM workout_logs wl
            WHERE wl.id = NEW.workout_log_id
            ON CONFLICT (user_id, exercise_id) DO UPDATE SET
                max_weight = MAX(max_weight, excluded.max_weight),
                max_reps = MAX(max_reps, excluded.max_reps),
                max_volume = MAX(max_volume, excluded.max_volume),
                achieved_at = CASE
                    WHEN excluded.max_weight > max_weight
                      OR excluded.max_reps > max_reps
                      OR excluded.max_volume > max_volume
                    THEN excluded.achieved_at
                    ELSE achieved_at
                END;
        END
        ",
    ),
    // Week progression: once every workout of the current week is completed,
    // move to the next week; finishing week 4 completes the plan
    (
        "trg_plan_workouts_advance_week",
        r"
        CREATE TRIGGER IF NOT EXISTS trg_plan_workouts_advance_week
        AFTER UPDATE OF completed ON plan_workouts
        WHEN NEW.completed = 1 AND OLD.completed = 0
        BEGIN
            UPDATE user_workout_plans
            SET current_week = MIN(current_week + 1, 4),
                status = CASE WHEN current_week >= 4 THEN 'completed' ELSE status END
            WHERE id = NEW.plan_id
              AND status = 'active'
              AND current_week = NEW.week_number
              AND NOT EXISTS (
                  SELECT 1 FROM plan_workouts pw
                  WHERE pw.plan_id = NEW.plan_id
                    AND pw.week_number = NEW.week_number
                    AND pw.completed = 0
              );
        END
        ",
    ),
];

/// Run every schema statement in order
///
/// # Errors
///
/// Returns an error naming the first statement that fails
pub async fn run(pool: &SqlitePool) -> AppResult<()> {
    for (name, statement) in SCHEMA {
        sqlx::query(statement)
            .execute(pool)
            .await
            .map_err(|e| AppError::database(format!("Migration {name} failed: {e}")))?;
    }
    Ok(())
}
