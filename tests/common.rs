// ABOUTME: Shared test utilities and setup functions for integration tests
// ABOUTME: In-memory store, scripted LLM provider, seed helpers, and resource wiring
//
// SPDX-License-Identifier: MIT OR Apache-2.0
// Copyright (c) 2025 Pierre Fitness Intelligence
#![allow(
    dead_code,
    clippy::missing_errors_doc,
    clippy::missing_panics_doc,
    clippy::must_use_candidate,
    clippy::unwrap_used,
    clippy::expect_used
)]
//! Shared test utilities for `vlife_server`

use std::collections::VecDeque;
use std::sync::{Arc, Mutex, Once};

use anyhow::Result;
use async_trait::async_trait;
use chrono::{TimeZone, Utc};
use serde_json::json;
use uuid::Uuid;
use vlife_server::{
    cache::{Clock, ManualClock},
    config::ServerConfig,
    database::{SqliteWorkoutStore, WorkoutStore},
    errors::AppError,
    llm::{ChatRequest, ChatResponse, LlmCapabilities, LlmProvider},
    models::{
        ExerciseSummary, PlanStatus, PlannedExercise, PlannedWorkout, TrainingPreferences,
        WorkoutPlan,
    },
    resources::ServerResources,
};

static INIT_LOGGER: Once = Once::new();

/// Initialize quiet logging for tests (call once per test process)
pub fn init_test_logging() {
    INIT_LOGGER.call_once(|| {
        let log_level = match std::env::var("TEST_LOG").as_deref() {
            Ok("TRACE") => tracing::Level::TRACE,
            Ok("DEBUG") => tracing::Level::DEBUG,
            Ok("INFO") => tracing::Level::INFO,
            _ => tracing::Level::WARN,
        };

        tracing_subscriber::fmt()
            .with_max_level(log_level)
            .with_test_writer()
            .init();
    });
}

/// Fresh migrated in-memory store
pub async fn create_test_store() -> Result<Arc<SqliteWorkoutStore>> {
    init_test_logging();
    let store = SqliteWorkoutStore::connect("sqlite::memory:").await?;
    Ok(Arc::new(store))
}

/// Clock pinned to a fixed instant
pub fn manual_clock() -> Arc<ManualClock> {
    Arc::new(ManualClock::starting_at(
        Utc.with_ymd_and_hms(2025, 3, 3, 7, 0, 0).unwrap(),
    ))
}

/// Provider that replays queued responses and records every request
#[derive(Default)]
pub struct ScriptedLlmProvider {
    responses: Mutex<VecDeque<Result<ChatResponse, AppError>>>,
    requests: Mutex<Vec<ChatRequest>>,
}

impl ScriptedLlmProvider {
    pub fn new() -> Arc<Self> {
        Arc::new(Self::default())
    }

    /// Queue a successful completion
    pub fn push_content(&self, content: impl Into<String>, finish_reason: &str) {
        self.responses.lock().unwrap().push_back(Ok(ChatResponse {
            content: content.into(),
            model: "scripted".to_owned(),
            usage: None,
            finish_reason: Some(finish_reason.to_owned()),
        }));
    }

    /// Queue a provider failure
    pub fn push_error(&self, error: AppError) {
        self.responses.lock().unwrap().push_back(Err(error));
    }

    pub fn requests(&self) -> Vec<ChatRequest> {
        self.requests.lock().unwrap().clone()
    }

    pub fn call_count(&self) -> usize {
        self.requests.lock().unwrap().len()
    }
}

#[async_trait]
impl LlmProvider for ScriptedLlmProvider {
    fn name(&self) -> &'static str {
        "scripted"
    }

    fn capabilities(&self) -> LlmCapabilities {
        LlmCapabilities::JSON_MODE | LlmCapabilities::SYSTEM_MESSAGES
    }

    fn default_model(&self) -> &str {
        "scripted"
    }

    async fn complete(&self, request: &ChatRequest) -> Result<ChatResponse, AppError> {
        self.requests.lock().unwrap().push(request.clone());
        self.responses
            .lock()
            .unwrap()
            .pop_front()
            .unwrap_or_else(|| Err(AppError::internal("No scripted response left")))
    }
}

/// Insert `count` library exercises
pub async fn seed_library(store: &dyn WorkoutStore, count: usize) -> Result<Vec<ExerciseSummary>> {
    let names = [
        "Barbell Back Squat",
        "Bench Press",
        "Deadlift",
        "Pull Up",
        "Overhead Press",
        "Romanian Deadlift",
        "Dumbbell Row",
        "Plank",
    ];
    let mut exercises = Vec::with_capacity(count);
    for i in 0..count {
        let exercise = ExerciseSummary {
            id: Uuid::new_v4(),
            name: names.get(i).map_or_else(|| format!("Exercise {i}"), |n| (*n).to_owned()),
            category: Some("strength".to_owned()),
            target_muscles: vec!["legs".to_owned()],
        };
        store.upsert_exercise(&exercise).await?;
        exercises.push(exercise);
    }
    Ok(exercises)
}

pub fn preferences() -> TrainingPreferences {
    TrainingPreferences {
        training_style: "strength".to_owned(),
        days_per_week: 3,
        session_minutes: 45,
        exercises_per_workout: 4,
    }
}

/// Active plan on `current_week` with `workouts_per_week` workouts for that week
pub async fn seed_plan_week(
    store: &dyn WorkoutStore,
    user_id: Uuid,
    current_week: u32,
    workouts_per_week: u32,
    exercise_id: Uuid,
) -> Result<(WorkoutPlan, Vec<PlannedWorkout>)> {
    let plan = WorkoutPlan {
        id: Uuid::new_v4(),
        user_id,
        name: "4-Week Strength Program".to_owned(),
        plan_type: "strength".to_owned(),
        start_date: Utc::now().date_naive(),
        end_date: None,
        days_per_week: workouts_per_week,
        split_pattern: Some("full_body".to_owned()),
        status: PlanStatus::Active,
        current_week,
        created_at: Utc::now(),
    };
    store.create_plan(&plan).await?;

    let workouts: Vec<PlannedWorkout> = (0..workouts_per_week)
        .map(|day| PlannedWorkout {
            id: Uuid::new_v4(),
            plan_id: plan.id,
            week_number: current_week,
            day_of_week: day * 2 + 1,
            name: format!("Full Body {}", day + 1),
            target_muscles: vec!["legs".to_owned()],
            estimated_duration_minutes: Some(45),
            completed: false,
            completed_at: None,
            exercises: vec![PlannedExercise {
                id: Uuid::new_v4(),
                exercise_id,
                exercise_name: None,
                order_index: 0,
                target_sets: 3,
                target_reps: "5".to_owned(),
                rest_seconds: Some(180),
                tempo: None,
                target_rpe: Some(8.0),
                notes: None,
            }],
        })
        .collect();
    store
        .insert_planned_week(plan.id, current_week, &workouts)
        .await?;

    Ok((plan, workouts))
}

/// JSON week referencing `ids`, one workout per chunk of two exercises
pub fn week_json(week_number: u32, ids: &[String]) -> String {
    let workouts: Vec<_> = ids
        .chunks(2)
        .enumerate()
        .map(|(i, chunk)| {
            json!({
                "name": format!("Session {}", i + 1),
                "dayOfWeek": i * 2 + 1,
                "targetMuscles": ["legs", "back"],
                "estimatedDuration": 45,
                "exercises": chunk.iter().map(|id| json!({
                    "exerciseId": id,
                    "sets": 3,
                    "reps": "8-10",
                    "restSeconds": 90,
                    "rpe": 7
                })).collect::<Vec<_>>()
            })
        })
        .collect();
    json!({ "weekNumber": week_number, "weekType": "baseline", "workouts": workouts }).to_string()
}

/// Wire resources over `store` with optional LLM and the given config
pub fn test_resources(
    store: Arc<SqliteWorkoutStore>,
    llm: Option<Arc<dyn LlmProvider>>,
    clock: Arc<dyn Clock>,
    config: ServerConfig,
) -> Result<Arc<ServerResources>> {
    Ok(Arc::new(ServerResources::new(config, store, llm, clock)?))
}
