// ABOUTME: Route handlers for workout plans, session logging, and personal records
// ABOUTME: Thin axum handlers over TrainingPlanService and WorkoutSessionService
//
// SPDX-License-Identifier: MIT OR Apache-2.0
// Copyright (c) 2025 Pierre Fitness Intelligence

//! Workout routes
//!
//! Request and response bodies use camelCase. Every response from this
//! router carries `Cache-Control: no-store`. Malformed bodies and query
//! strings are reported as `INVALID_INPUT`.

use std::sync::Arc;

use axum::{
    extract::{Path, State},
    http::{header, HeaderValue, StatusCode},
    response::{IntoResponse, Response},
    routing::{get, post},
    Json, Router,
};
use serde::Deserialize;
use serde_json::json;
use tower_http::set_header::SetResponseHeaderLayer;
use uuid::Uuid;

use crate::errors::{AppError, AppResult};
use crate::models::{CompletionFeedback, SetEntry};
use crate::resources::ServerResources;
use crate::routes::extract::{ApiJson, ApiQuery};
use crate::services::training_plans::GenerateWeekRequest;
use crate::services::workout_session::ExerciseEntry;

/// `?userId=`
#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct UserQuery {
    user_id: Option<Uuid>,
}

/// `?userId=&limit=`
#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct ListQuery {
    user_id: Option<Uuid>,
    limit: Option<u32>,
}

/// `?userId=&workoutId=`
#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct ActiveSessionQuery {
    user_id: Option<Uuid>,
    workout_id: Option<Uuid>,
}

/// Body of `POST /api/workouts/logs/start`
#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct StartBody {
    user_id: Option<Uuid>,
    #[serde(alias = "plannedWorkoutId")]
    workout_id: Option<Uuid>,
}

/// Body of `POST /api/workouts/logs/:log_id/exercises`
#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct RecordExerciseBody {
    exercise_id: Uuid,
    #[serde(default)]
    sets_planned: Option<u32>,
    sets: Vec<SetEntry>,
}

/// Body of `POST /api/workouts/logs/complete`
#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct CompleteBody {
    log_id: Option<Uuid>,
    #[serde(flatten)]
    feedback: CompletionFeedback,
}

fn require<T>(value: Option<T>, field: &str) -> AppResult<T> {
    value.ok_or_else(|| AppError::missing_field(field))
}

fn parse_id(raw: &str, what: &str) -> AppResult<Uuid> {
    Uuid::parse_str(raw).map_err(|_| AppError::invalid_input(format!("Invalid {what}: {raw}")))
}

/// Workout routes implementation
pub struct WorkoutRoutes;

impl WorkoutRoutes {
    /// Create all workout routes
    pub fn routes(resources: Arc<ServerResources>) -> Router {
        Router::new()
            .route("/api/workouts/current-plan", get(Self::handle_current_plan))
            .route("/api/workouts/generate-week", post(Self::handle_generate_week))
            .route(
                "/api/workouts/logs/start",
                get(Self::handle_active_session).post(Self::handle_start),
            )
            .route("/api/workouts/logs/complete", post(Self::handle_complete))
            .route("/api/workouts/logs", get(Self::handle_list_logs))
            .route("/api/workouts/logs/:log_id", get(Self::handle_log_detail))
            .route(
                "/api/workouts/logs/:log_id/exercises",
                post(Self::handle_record_exercise),
            )
            .route(
                "/api/workouts/personal-records",
                get(Self::handle_personal_records),
            )
            .layer(SetResponseHeaderLayer::overriding(
                header::CACHE_CONTROL,
                HeaderValue::from_static("no-store"),
            ))
            .with_state(resources)
    }

    /// Handle GET /api/workouts/current-plan
    async fn handle_current_plan(
        State(resources): State<Arc<ServerResources>>,
        ApiQuery(query): ApiQuery<UserQuery>,
    ) -> Result<Response, AppError> {
        let user_id = require(query.user_id, "userId")?;
        let current = resources.plans.current_plan(user_id).await?;
        Ok((StatusCode::OK, Json(current)).into_response())
    }

    /// Handle POST /api/workouts/generate-week
    async fn handle_generate_week(
        State(resources): State<Arc<ServerResources>>,
        ApiJson(body): ApiJson<GenerateWeekRequest>,
    ) -> Result<Response, AppError> {
        let generated = resources.plans.generate_week(body).await?;
        Ok((StatusCode::CREATED, Json(generated)).into_response())
    }

    /// Handle GET /api/workouts/logs/start - current in-progress session
    async fn handle_active_session(
        State(resources): State<Arc<ServerResources>>,
        ApiQuery(query): ApiQuery<ActiveSessionQuery>,
    ) -> Result<Response, AppError> {
        let user_id = require(query.user_id, "userId")?;
        let workout_id = require(query.workout_id, "workoutId")?;
        let log = resources.sessions.active(user_id, workout_id).await?;
        Ok((StatusCode::OK, Json(json!({ "log": log }))).into_response())
    }

    /// Handle POST /api/workouts/logs/start - start or resume
    async fn handle_start(
        State(resources): State<Arc<ServerResources>>,
        ApiJson(body): ApiJson<StartBody>,
    ) -> Result<Response, AppError> {
        let user_id = require(body.user_id, "userId")?;
        let workout_id = require(body.workout_id, "workoutId")?;
        let outcome = resources.sessions.start(user_id, workout_id).await?;
        let status = if outcome.is_resume {
            StatusCode::OK
        } else {
            StatusCode::CREATED
        };
        Ok((status, Json(outcome)).into_response())
    }

    /// Handle POST /api/workouts/logs/:log_id/exercises
    async fn handle_record_exercise(
        State(resources): State<Arc<ServerResources>>,
        Path(log_id): Path<String>,
        ApiJson(body): ApiJson<RecordExerciseBody>,
    ) -> Result<Response, AppError> {
        let log_id = parse_id(&log_id, "log id")?;
        let entry = ExerciseEntry {
            exercise_id: body.exercise_id,
            sets_planned: body.sets_planned,
            sets: body.sets,
        };
        let exercise_log = resources.sessions.record_exercise(log_id, entry).await?;
        Ok((StatusCode::CREATED, Json(exercise_log)).into_response())
    }

    /// Handle POST /api/workouts/logs/complete
    async fn handle_complete(
        State(resources): State<Arc<ServerResources>>,
        ApiJson(body): ApiJson<CompleteBody>,
    ) -> Result<Response, AppError> {
        let log_id = require(body.log_id, "logId")?;
        let log = resources.sessions.complete(log_id, body.feedback).await?;
        Ok((StatusCode::OK, Json(json!({ "log": log }))).into_response())
    }

    /// Handle GET /api/workouts/logs
    async fn handle_list_logs(
        State(resources): State<Arc<ServerResources>>,
        ApiQuery(query): ApiQuery<ListQuery>,
    ) -> Result<Response, AppError> {
        let user_id = require(query.user_id, "userId")?;
        let logs = resources.sessions.list_logs(user_id, query.limit).await?;
        Ok((StatusCode::OK, Json(json!({ "logs": logs }))).into_response())
    }

    /// Handle GET /api/workouts/logs/:log_id
    async fn handle_log_detail(
        State(resources): State<Arc<ServerResources>>,
        Path(log_id): Path<String>,
    ) -> Result<Response, AppError> {
        let log_id = parse_id(&log_id, "log id")?;
        let detail = resources.sessions.detail(log_id).await?;
        Ok((StatusCode::OK, Json(detail)).into_response())
    }

    /// Handle GET /api/workouts/personal-records
    async fn handle_personal_records(
        State(resources): State<Arc<ServerResources>>,
        ApiQuery(query): ApiQuery<ListQuery>,
    ) -> Result<Response, AppError> {
        let user_id = require(query.user_id, "userId")?;
        let records = resources
            .sessions
            .personal_records(user_id, query.limit)
            .await?;
        Ok((StatusCode::OK, Json(json!({ "personalRecords": records }))).into_response())
    }
}
