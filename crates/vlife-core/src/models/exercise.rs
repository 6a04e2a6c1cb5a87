// ABOUTME: Exercise library and external exercise metadata models
// ABOUTME: ExerciseSummary feeds the week prompt, ExerciseMetadata mirrors ExerciseDB
//
// SPDX-License-Identifier: MIT OR Apache-2.0
// Copyright (c) 2025 Pierre Fitness Intelligence

use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Candidate exercise from the local exercise library
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct ExerciseSummary {
    /// Library id, echoed back by the model in generated weeks
    pub id: Uuid,
    /// Display name
    pub name: String,
    /// Movement category (push, pull, legs, core...)
    pub category: Option<String>,
    /// Primary muscles worked
    #[serde(default)]
    pub target_muscles: Vec<String>,
}

/// Exercise record as served by the `ExerciseDB` API
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct ExerciseMetadata {
    /// `ExerciseDB` identifier
    pub id: String,
    /// Exercise name
    pub name: String,
    /// Body part (chest, back, upper legs...)
    #[serde(default)]
    pub body_part: Option<String>,
    /// Equipment needed
    #[serde(default)]
    pub equipment: Option<String>,
    /// Target muscle
    #[serde(default)]
    pub target: Option<String>,
    /// Secondary muscles
    #[serde(default)]
    pub secondary_muscles: Vec<String>,
    /// Step-by-step instructions
    #[serde(default)]
    pub instructions: Vec<String>,
    /// Animated demonstration
    #[serde(default)]
    pub gif_url: Option<String>,
}
