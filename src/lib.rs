// ABOUTME: Main library entry point for the V-Life workout backend
// ABOUTME: AI weekly plans, session logging with aggregation, and subscription sync
//
// SPDX-License-Identifier: MIT OR Apache-2.0
// Copyright (c) 2025 Pierre Fitness Intelligence

#![deny(unsafe_code)]

//! # V-Life Server
//!
//! HTTP backend for the V-Life fitness app.
//!
//! ## Features
//!
//! - **Week generation**: one progression week per LLM call, JSON mode, with
//!   exercise ids checked against the candidate library
//! - **Session logging**: start/resume, per-exercise set logging, and
//!   completion with aggregates written in one transaction
//! - **Personal records**: maintained by a database trigger on exercise logs
//! - **Subscriptions**: `RevenueCat` webhook mapped onto one row per user
//! - **Exercise metadata**: `ExerciseDB` lookups behind a TTL + LRU cache
//!
//! ## Architecture
//!
//! - **Routes**: thin axum handlers
//! - **Services**: business rules over the [`database::WorkoutStore`] trait
//! - **Database**: sqlx `SQLite` with inline migrations and triggers
//! - **LLM**: the [`llm::LlmProvider`] trait with an OpenAI-compatible client
//!
//! ## Example Usage
//!
//! ```rust,no_run
//! use vlife_server::config::ServerConfig;
//!
//! fn main() -> anyhow::Result<()> {
//!     let config = ServerConfig::from_env()?;
//!     println!("V-Life server configured with port: HTTP={}", config.http_port);
//!     Ok(())
//! }
//! ```

/// TTL + LRU cache and injectable clock
pub mod cache;

/// Environment-based configuration
pub mod config;

/// `WorkoutStore` trait and `SQLite` implementation
pub mod database;

/// External API clients
pub mod external;

/// LLM provider abstraction
pub mod llm;

/// Structured logging setup
pub mod logging;

/// HTTP middleware layers
pub mod middleware;

/// Shared server state
pub mod resources;

/// HTTP routes
pub mod routes;

/// HTTP server startup
pub mod server;

/// Domain services
pub mod services;

// Foundation types live in the core crate
pub use vlife_core::{constants, errors, models};
