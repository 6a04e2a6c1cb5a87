// ABOUTME: Configuration module root
// ABOUTME: Environment-driven server settings
//
// SPDX-License-Identifier: MIT OR Apache-2.0
// Copyright (c) 2025 Pierre Fitness Intelligence

/// Environment-based server configuration
pub mod environment;

pub use environment::{
    CorsConfig, Environment, ExerciseDbConfig, LlmConfig, ServerConfig, WebhookConfig,
};
