// ABOUTME: Core data models for the V-Life workout backend
// ABOUTME: Re-exports plan, session, exercise, and subscription types
//
// SPDX-License-Identifier: MIT OR Apache-2.0
// Copyright (c) 2025 Pierre Fitness Intelligence

//! # Data Models
//!
//! - `WorkoutPlan` / `PlannedWorkout` / `PlannedExercise`: the generated program
//! - `WorkoutLog` / `ExerciseLog` / `SetEntry`: what the user actually did
//! - `PersonalRecord`: trigger-maintained bests per exercise
//! - `Subscription`: entitlement state synced from `RevenueCat`

mod exercise;
mod plan;
mod session;
mod subscription;

pub use exercise::{ExerciseMetadata, ExerciseSummary};
pub use plan::{
    GeneratedExercise, GeneratedWeek, GeneratedWorkout, PlanStatus, PlannedExercise,
    PlannedWorkout, TrainingPreferences, WeekType, WorkoutPlan,
};
pub use session::{
    CompletionFeedback, ExerciseLog, PersonalRecord, SetEntry, WorkoutAggregates, WorkoutLog,
    WorkoutLogStatus,
};
pub use subscription::{PlanTier, Subscription, SubscriptionStatus};
