// ABOUTME: Domain service layer for business logic extracted from route handlers
// ABOUTME: Plan generation, workout sessions, and subscription sync over the WorkoutStore
//
// SPDX-License-Identifier: MIT OR Apache-2.0
// Copyright (c) 2025 Pierre Fitness Intelligence

//! Domain service layer
//!
//! Route handlers stay thin: they parse the request, call one service method,
//! and serialize the result. Services depend on [`crate::database::WorkoutStore`]
//! and [`crate::cache::Clock`] so they can be driven from tests.

/// RevenueCat event mapping and subscription upserts
pub mod subscription_sync;

/// Current plan reads and week generation requests
pub mod training_plans;

/// Prompt, parser, and membership checks for generated weeks
pub mod week_generation;

/// Session start/resume, exercise logging, and completion
pub mod workout_session;
