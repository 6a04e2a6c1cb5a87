// ABOUTME: Cache-related constants for TTL and capacity
// ABOUTME: Defaults for the exercise metadata lookup cache
//
// SPDX-License-Identifier: MIT OR Apache-2.0
// Copyright (c) 2025 Pierre Fitness Intelligence

/// Default maximum entries held by the exercise metadata cache
pub const DEFAULT_CACHE_MAX_ENTRIES: usize = 1_000;

/// Exercise metadata TTL (24 hours) - the upstream catalog changes rarely
pub const TTL_EXERCISE_METADATA_SECS: u64 = 86_400;

/// Longest accepted metadata TTL (30 days)
pub const MAX_CACHE_TTL_SECS: u64 = 2_592_000;

/// Period of the background sweep that drops expired entries
pub const CLEANUP_INTERVAL_SECS: u64 = 300;
