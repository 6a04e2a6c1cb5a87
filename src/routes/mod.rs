// ABOUTME: Route module organization for the V-Life HTTP endpoints
// ABOUTME: Assembles domain routers and the tracing, request-id, and CORS layers
//
// SPDX-License-Identifier: MIT OR Apache-2.0
// Copyright (c) 2025 Pierre Fitness Intelligence

//! Route module for the V-Life server
//!
//! Each domain module contains only route definitions and thin handler
//! functions that delegate to the service layer.

/// `ExerciseDB` metadata lookups and cache revalidation
pub mod exercisedb;
/// Extractors mapping malformed input to `AppError`
pub mod extract;
/// Health check and readiness routes
pub mod health;
/// `RevenueCat` webhook
pub mod webhooks;
/// Plans, sessions, and personal records
pub mod workouts;

use std::sync::Arc;

use axum::Router;
use tower_http::trace::{DefaultMakeSpan, DefaultOnResponse, TraceLayer};
use tower_http::LatencyUnit;
use tracing::Level;

use crate::middleware::{propagate_request_id, set_request_id, setup_cors};
use crate::resources::ServerResources;

pub use exercisedb::ExerciseDbRoutes;
pub use health::HealthRoutes;
pub use webhooks::WebhookRoutes;
pub use workouts::WorkoutRoutes;

/// Build the complete application router
///
/// Layers apply bottom-up: the request id is assigned before the trace span
/// is created, so the span's headers include it.
pub fn build_router(resources: &Arc<ServerResources>) -> Router {
    Router::new()
        .merge(HealthRoutes::routes(resources.clone()))
        .merge(WorkoutRoutes::routes(resources.clone()))
        .merge(WebhookRoutes::routes(resources.clone()))
        .merge(ExerciseDbRoutes::routes(resources.clone()))
        .layer(propagate_request_id())
        .layer(
            TraceLayer::new_for_http()
                .make_span_with(
                    DefaultMakeSpan::new()
                        .level(Level::INFO)
                        .include_headers(false),
                )
                .on_response(
                    DefaultOnResponse::new()
                        .level(Level::INFO)
                        .latency_unit(LatencyUnit::Millis),
                ),
        )
        .layer(set_request_id())
        .layer(setup_cors(&resources.config))
}
