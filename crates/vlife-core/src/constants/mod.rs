// ABOUTME: Constants module with domain-separated organization
// ABOUTME: Pure data constants organized by domain for the V-Life backend
//
// SPDX-License-Identifier: MIT OR Apache-2.0
// Copyright (c) 2025 Pierre Fitness Intelligence

//! Constants module
//!
//! Constants are grouped into logical domains rather than being in a single large file.

/// Cache-related constants (TTL, sizes)
pub mod cache;

/// Network ports
pub mod ports {
    /// Default HTTP port
    pub const DEFAULT_HTTP_PORT: u16 = 8081;
}

/// Default limits
pub mod limits {
    /// Default number of workout logs returned by the history endpoint
    pub const DEFAULT_LOGS_LIMIT: u32 = 20;
    /// Maximum workout logs returned in one request
    pub const MAX_LOGS_LIMIT: u32 = 100;
    /// Default number of personal records returned
    pub const DEFAULT_PR_LIMIT: u32 = 50;
    /// Maximum personal records returned in one request
    pub const MAX_PR_LIMIT: u32 = 200;
    /// Upper bound on reps accepted for a single set
    pub const MAX_REPS_PER_SET: u32 = 1_000;
    /// Seconds per minute
    pub const SECONDS_PER_MINUTE: i64 = 60;
}

/// Weekly plan generation
pub mod plan_generation {
    /// Minimum candidate exercises required to build a week prompt
    pub const MIN_CANDIDATE_EXERCISES: usize = 5;
    /// Number of weeks in a progression block
    pub const WEEKS_PER_BLOCK: u32 = 4;
    /// Sampling temperature for week generation
    pub const TEMPERATURE: f32 = 0.7;
    /// Token ceiling for a generated week
    pub const MAX_TOKENS: u32 = 6000;
    /// Default attempts when the model returns exercise ids outside the candidate list
    pub const DEFAULT_MAX_ATTEMPTS: u32 = 2;
    /// Provider finish reason signalling a truncated completion
    pub const FINISH_REASON_LENGTH: &str = "length";
}

/// Timeout configurations
pub mod timeouts {
    /// Default HTTP client request timeout in seconds
    pub const HTTP_CLIENT_TIMEOUT_SECS: u64 = 30;
    /// Default HTTP client connect timeout in seconds
    pub const HTTP_CLIENT_CONNECT_TIMEOUT_SECS: u64 = 10;
    /// LLM request timeout in seconds (a full week can take a while)
    pub const LLM_REQUEST_TIMEOUT_SECS: u64 = 120;
}

/// `RevenueCat` webhook constants
pub mod revenuecat {
    /// Prefix RevenueCat uses for anonymous app user ids
    pub const ANONYMOUS_ID_PREFIX: &str = "$RCAnonymousID:";
    /// Store value recorded for subscriptions synced from RevenueCat
    pub const SOURCE: &str = "revenuecat";
}

/// Service names for structured logging
pub mod service_names {
    /// Main server service name
    pub const VLIFE_SERVER: &str = "vlife-server";
}
