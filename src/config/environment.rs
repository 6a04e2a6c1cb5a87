// ABOUTME: Environment configuration management for deployment-specific settings
// ABOUTME: Reads ports, database URL, LLM, webhook, and ExerciseDB settings from env vars
//
// SPDX-License-Identifier: MIT OR Apache-2.0
// Copyright (c) 2025 Pierre Fitness Intelligence

//! Environment-based configuration management

use std::env;
use std::fmt::{Display, Formatter, Result as FmtResult};
use std::str::FromStr;
use std::time::Duration;

use anyhow::{ensure, Context, Result};
use tracing::info;

use vlife_core::constants::{cache, plan_generation, ports};

/// Default `SQLite` database location
const DEFAULT_DATABASE_URL: &str = "sqlite:./data/vlife.db";
/// Default OpenAI-compatible endpoint
const DEFAULT_LLM_BASE_URL: &str = "https://api.openai.com/v1";
/// Default completion model
const DEFAULT_LLM_MODEL: &str = "gpt-4o-mini";
/// Default `ExerciseDB` endpoint
const DEFAULT_EXERCISEDB_BASE_URL: &str = "https://exercisedb.p.rapidapi.com";

/// Deployment environment
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Environment {
    /// Local development
    #[default]
    Development,
    /// Production deployment
    Production,
    /// Automated tests
    Testing,
}

impl Environment {
    /// Parse from string with fallback
    #[must_use]
    pub fn from_str_or_default(s: &str) -> Self {
        match s.to_lowercase().as_str() {
            "production" | "prod" => Self::Production,
            "testing" | "test" => Self::Testing,
            _ => Self::Development,
        }
    }

    /// Check if this is a production environment
    #[must_use]
    pub const fn is_production(&self) -> bool {
        matches!(self, Self::Production)
    }
}

impl Display for Environment {
    fn fmt(&self, f: &mut Formatter<'_>) -> FmtResult {
        match self {
            Self::Development => write!(f, "development"),
            Self::Production => write!(f, "production"),
            Self::Testing => write!(f, "testing"),
        }
    }
}

/// LLM completion endpoint settings
#[derive(Debug, Clone)]
pub struct LlmConfig {
    /// OpenAI-compatible base URL
    pub base_url: String,
    /// Bearer key; generation is disabled without one
    pub api_key: Option<String>,
    /// Model used for week generation
    pub model: String,
    /// Attempts allowed when the model returns unknown exercise ids
    pub max_generation_attempts: u32,
}

/// `RevenueCat` webhook settings
#[derive(Debug, Clone, Default)]
pub struct WebhookConfig {
    /// Shared secret expected in the `Authorization` header
    pub revenuecat_secret: Option<String>,
}

/// `ExerciseDB` lookup settings
#[derive(Debug, Clone)]
pub struct ExerciseDbConfig {
    /// API base URL
    pub base_url: String,
    /// `RapidAPI` key; lookups answer 503 without one
    pub api_key: Option<String>,
    /// Metadata cache TTL
    pub cache_ttl: Duration,
    /// Metadata cache capacity
    pub cache_max_entries: usize,
}

/// Cross-origin settings
#[derive(Debug, Clone)]
pub struct CorsConfig {
    /// Comma-separated origins, or `*`
    pub allowed_origins: String,
}

impl Default for CorsConfig {
    fn default() -> Self {
        Self {
            allowed_origins: "*".to_owned(),
        }
    }
}

/// Server configuration
#[derive(Debug, Clone)]
pub struct ServerConfig {
    /// HTTP listen port
    pub http_port: u16,
    /// Bind address
    pub host: String,
    /// sqlx connection URL
    pub database_url: String,
    /// Deployment environment
    pub environment: Environment,
    /// LLM settings
    pub llm: LlmConfig,
    /// Webhook settings
    pub webhooks: WebhookConfig,
    /// `ExerciseDB` settings
    pub exercisedb: ExerciseDbConfig,
    /// CORS settings
    pub cors: CorsConfig,
}

impl ServerConfig {
    /// Load configuration from environment variables
    ///
    /// # Errors
    ///
    /// Returns an error if a numeric variable is set but cannot be parsed, or
    /// if the cache TTL exceeds thirty days
    pub fn from_env() -> Result<Self> {
        info!("Loading configuration from environment variables");

        let cache_ttl_secs = env_parse(
            "EXERCISEDB_CACHE_TTL_SECS",
            cache::TTL_EXERCISE_METADATA_SECS,
        )?;
        ensure!(
            cache_ttl_secs <= cache::MAX_CACHE_TTL_SECS,
            "EXERCISEDB_CACHE_TTL_SECS must be at most {} seconds, got {cache_ttl_secs}",
            cache::MAX_CACHE_TTL_SECS
        );

        let config = Self {
            http_port: env_parse("HTTP_PORT", ports::DEFAULT_HTTP_PORT)?,
            host: env_var_or("HOST", "0.0.0.0"),
            database_url: env_var_or("DATABASE_URL", DEFAULT_DATABASE_URL),
            environment: Environment::from_str_or_default(&env_var_or(
                "ENVIRONMENT",
                "development",
            )),
            llm: LlmConfig {
                base_url: env_var_or("LLM_BASE_URL", DEFAULT_LLM_BASE_URL),
                api_key: env_non_empty("LLM_API_KEY").or_else(|| env_non_empty("OPENAI_API_KEY")),
                model: env_var_or("LLM_MODEL", DEFAULT_LLM_MODEL),
                max_generation_attempts: env_parse(
                    "LLM_MAX_GENERATION_ATTEMPTS",
                    plan_generation::DEFAULT_MAX_ATTEMPTS,
                )?
                .max(1),
            },
            webhooks: WebhookConfig {
                revenuecat_secret: env_non_empty("REVENUECAT_WEBHOOK_SECRET"),
            },
            exercisedb: ExerciseDbConfig {
                base_url: env_var_or("EXERCISEDB_BASE_URL", DEFAULT_EXERCISEDB_BASE_URL),
                api_key: env_non_empty("EXERCISEDB_API_KEY"),
                cache_ttl: Duration::from_secs(cache_ttl_secs),
                cache_max_entries: env_parse(
                    "EXERCISEDB_CACHE_MAX_ENTRIES",
                    cache::DEFAULT_CACHE_MAX_ENTRIES,
                )?,
            },
            cors: CorsConfig {
                allowed_origins: env_var_or("CORS_ALLOWED_ORIGINS", "*"),
            },
        };

        Ok(config)
    }

    /// One-line summary safe to log (no secrets)
    #[must_use]
    pub fn summary(&self) -> String {
        format!(
            "environment={} host={} port={} database={} llm_model={} llm_configured={} \
             revenuecat_secret={} exercisedb_configured={}",
            self.environment,
            self.host,
            self.http_port,
            self.database_url,
            self.llm.model,
            self.llm.api_key.is_some(),
            self.webhooks.revenuecat_secret.is_some(),
            self.exercisedb.api_key.is_some(),
        )
    }
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            http_port: ports::DEFAULT_HTTP_PORT,
            host: "127.0.0.1".to_owned(),
            database_url: "sqlite::memory:".to_owned(),
            environment: Environment::Testing,
            llm: LlmConfig {
                base_url: DEFAULT_LLM_BASE_URL.to_owned(),
                api_key: None,
                model: DEFAULT_LLM_MODEL.to_owned(),
                max_generation_attempts: plan_generation::DEFAULT_MAX_ATTEMPTS,
            },
            webhooks: WebhookConfig::default(),
            exercisedb: ExerciseDbConfig {
                base_url: DEFAULT_EXERCISEDB_BASE_URL.to_owned(),
                api_key: None,
                cache_ttl: Duration::from_secs(cache::TTL_EXERCISE_METADATA_SECS),
                cache_max_entries: cache::DEFAULT_CACHE_MAX_ENTRIES,
            },
            cors: CorsConfig::default(),
        }
    }
}

/// Get environment variable or default value
fn env_var_or(key: &str, default: &str) -> String {
    env::var(key).unwrap_or_else(|_| default.to_owned())
}

/// Get environment variable, treating empty strings as unset
fn env_non_empty(key: &str) -> Option<String> {
    env::var(key).ok().filter(|v| !v.trim().is_empty())
}

/// Parse an environment variable, falling back to `default` when unset
fn env_parse<T>(key: &str, default: T) -> Result<T>
where
    T: FromStr,
    T::Err: std::error::Error + Send + Sync + 'static,
{
    match env_non_empty(key) {
        Some(raw) => raw
            .trim()
            .parse()
            .with_context(|| format!("Invalid {key} value: {raw}")),
        None => Ok(default),
    }
}
