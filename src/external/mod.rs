// ABOUTME: External API client modules (ExerciseDB)
// ABOUTME: Exercise metadata lookups behind a TTL + LRU cache
//
// SPDX-License-Identifier: MIT OR Apache-2.0
// Copyright (c) 2025 Pierre Fitness Intelligence

//! External API Clients

pub mod exercisedb_client;

pub use exercisedb_client::ExerciseDbClient;
