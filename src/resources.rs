// ABOUTME: Centralized resource container for dependency injection in the HTTP server
// ABOUTME: Wires the store, LLM provider, clock, and services once at startup
//
// SPDX-License-Identifier: MIT OR Apache-2.0
// Copyright (c) 2025 Pierre Fitness Intelligence

//! # Server Resources
//!
//! Built once in `main` (or in a test) and shared with every handler as
//! `State<Arc<ServerResources>>`. Tests swap in a scripted LLM provider and a
//! manual clock through [`ServerResources::new`].

use std::sync::Arc;

use tracing::info;

use crate::cache::Clock;
use crate::config::ServerConfig;
use crate::database::WorkoutStore;
use crate::errors::AppResult;
use crate::external::ExerciseDbClient;
use crate::llm::LlmProvider;
use crate::services::subscription_sync::SubscriptionSync;
use crate::services::training_plans::TrainingPlanService;
use crate::services::week_generation::WeekGenerator;
use crate::services::workout_session::WorkoutSessionService;

/// Shared server state
#[derive(Clone)]
pub struct ServerResources {
    /// Loaded configuration
    pub config: Arc<ServerConfig>,
    /// Persistence
    pub store: Arc<dyn WorkoutStore>,
    /// Time source for timestamps and cache expiry
    pub clock: Arc<dyn Clock>,
    /// Cached exercise metadata lookups
    pub exercise_db: ExerciseDbClient,
    /// Plans and week generation
    pub plans: TrainingPlanService,
    /// Session lifecycle and history
    pub sessions: WorkoutSessionService,
    /// `RevenueCat` event handling
    pub subscriptions: SubscriptionSync,
}

impl ServerResources {
    /// Wire services over the given store, provider, and clock
    ///
    /// Week generation is disabled when `llm` is `None`.
    ///
    /// # Errors
    ///
    /// Returns an error if the `ExerciseDB` HTTP client cannot be built
    pub fn new(
        config: ServerConfig,
        store: Arc<dyn WorkoutStore>,
        llm: Option<Arc<dyn LlmProvider>>,
        clock: Arc<dyn Clock>,
    ) -> AppResult<Self> {
        let generator = llm.map(|provider| {
            info!(
                provider = provider.name(),
                model = %config.llm.model,
                max_attempts = config.llm.max_generation_attempts,
                "Week generation enabled"
            );
            WeekGenerator::new(
                provider,
                config.llm.model.clone(),
                config.llm.max_generation_attempts,
            )
        });

        let exercise_db = ExerciseDbClient::new(config.exercisedb.clone(), clock.clone())?;

        Ok(Self {
            plans: TrainingPlanService::new(store.clone(), generator, clock.clone()),
            sessions: WorkoutSessionService::new(store.clone(), clock.clone()),
            subscriptions: SubscriptionSync::new(store.clone()),
            exercise_db,
            config: Arc::new(config),
            store,
            clock,
        })
    }
}
