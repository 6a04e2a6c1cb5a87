// ABOUTME: Route handlers for cached ExerciseDB metadata lookups
// ABOUTME: Exercise detail by id and an explicit cache revalidation endpoint
//
// SPDX-License-Identifier: MIT OR Apache-2.0
// Copyright (c) 2025 Pierre Fitness Intelligence

use std::sync::Arc;

use axum::{
    extract::{Path, State},
    http::StatusCode,
    response::{IntoResponse, Response},
    routing::{get, post},
    Json, Router,
};
use serde_json::json;

use crate::errors::AppError;
use crate::resources::ServerResources;

/// `ExerciseDB` routes implementation
pub struct ExerciseDbRoutes;

impl ExerciseDbRoutes {
    /// Create all `ExerciseDB` routes
    pub fn routes(resources: Arc<ServerResources>) -> Router {
        Router::new()
            .route(
                "/api/exercisedb/exercises/:exercise_id",
                get(Self::handle_get_exercise),
            )
            .route("/api/cache/revalidate", post(Self::handle_revalidate))
            .with_state(resources)
    }

    /// Handle GET /api/exercisedb/exercises/:exercise_id
    async fn handle_get_exercise(
        State(resources): State<Arc<ServerResources>>,
        Path(exercise_id): Path<String>,
    ) -> Result<Response, AppError> {
        let metadata = resources.exercise_db.get_exercise(&exercise_id).await?;
        Ok((StatusCode::OK, Json(metadata)).into_response())
    }

    /// Handle POST /api/cache/revalidate
    async fn handle_revalidate(
        State(resources): State<Arc<ServerResources>>,
    ) -> Result<Response, AppError> {
        let removed = resources.exercise_db.revalidate().await;
        Ok((
            StatusCode::OK,
            Json(json!({
                "revalidated": true,
                "removed": removed,
                "timestamp": resources.clock.utc_now().to_rfc3339(),
            })),
        )
            .into_response())
    }
}
