// ABOUTME: ExerciseDB (RapidAPI) client for exercise metadata lookups
// ABOUTME: Serves repeated lookups from a TTL + LRU cache with an injected clock
//
// SPDX-License-Identifier: MIT OR Apache-2.0
// Copyright (c) 2025 Pierre Fitness Intelligence

//! `ExerciseDB` API Client
//!
//! Fetches exercise metadata (body part, equipment, instructions, animation
//! URL) by id. Results are cached for `EXERCISEDB_CACHE_TTL_SECS` and swept
//! every few minutes; the cache can be emptied through
//! `POST /api/cache/revalidate`.
//!
//! Without `EXERCISEDB_API_KEY` every lookup fails with `ConfigMissing`,
//! which the HTTP layer reports as 503.

use std::sync::Arc;
use std::time::Duration;

use reqwest::{StatusCode, Url};
use tracing::{debug, info};

use crate::cache::{CacheConfig, Clock, TtlLruCache};
use crate::config::ExerciseDbConfig;
use crate::constants::cache::CLEANUP_INTERVAL_SECS;
use crate::constants::timeouts::{HTTP_CLIENT_CONNECT_TIMEOUT_SECS, HTTP_CLIENT_TIMEOUT_SECS};
use crate::errors::{AppError, AppResult};
use crate::models::ExerciseMetadata;

const SERVICE_NAME: &str = "ExerciseDB";
const MAX_ID_LEN: usize = 64;

/// `ExerciseDB` client with a metadata cache
#[derive(Clone)]
pub struct ExerciseDbClient {
    config: ExerciseDbConfig,
    http_client: reqwest::Client,
    cache: TtlLruCache<String, ExerciseMetadata>,
}

impl ExerciseDbClient {
    /// Create a client; the cache uses the configured TTL and capacity
    ///
    /// # Errors
    ///
    /// Returns an error if the HTTP client cannot be built
    pub fn new(config: ExerciseDbConfig, clock: Arc<dyn Clock>) -> AppResult<Self> {
        let http_client = reqwest::Client::builder()
            .timeout(Duration::from_secs(HTTP_CLIENT_TIMEOUT_SECS))
            .connect_timeout(Duration::from_secs(HTTP_CLIENT_CONNECT_TIMEOUT_SECS))
            .build()
            .map_err(|e| AppError::internal(format!("Failed to build HTTP client: {e}")))?;

        let cache = TtlLruCache::new(
            CacheConfig {
                max_entries: config.cache_max_entries,
                ttl: config.cache_ttl,
                cleanup_interval: Some(Duration::from_secs(CLEANUP_INTERVAL_SECS)),
            },
            clock,
        );

        Ok(Self {
            config,
            http_client,
            cache,
        })
    }

    /// Whether an API key is configured
    #[must_use]
    pub const fn is_configured(&self) -> bool {
        self.config.api_key.is_some()
    }

    /// The metadata cache
    #[must_use]
    pub const fn cache(&self) -> &TtlLruCache<String, ExerciseMetadata> {
        &self.cache
    }

    /// Look up one exercise, from cache when fresh
    ///
    /// # Errors
    ///
    /// Returns `ConfigMissing` without an API key, a validation error for a
    /// malformed id, not found when the API has no such exercise, or an
    /// external service error for other failures
    pub async fn get_exercise(&self, exercise_id: &str) -> AppResult<ExerciseMetadata> {
        let api_key = self
            .config
            .api_key
            .as_deref()
            .ok_or_else(|| AppError::config_missing("ExerciseDB API key is not configured"))?;

        let exercise_id = exercise_id.trim();
        if exercise_id.is_empty()
            || exercise_id.len() > MAX_ID_LEN
            || !exercise_id
                .chars()
                .all(|c| c.is_ascii_alphanumeric() || c == '-' || c == '_')
        {
            return Err(AppError::invalid_input(format!(
                "Invalid exercise id: {exercise_id}"
            )));
        }

        let cache_key = exercise_id.to_owned();
        if let Some(hit) = self.cache.get(&cache_key).await {
            debug!(exercise_id, "ExerciseDB cache hit");
            return Ok(hit);
        }

        let url = format!(
            "{}/exercises/exercise/{exercise_id}",
            self.config.base_url.trim_end_matches('/')
        );
        let response = self
            .http_client
            .get(&url)
            .header("X-RapidAPI-Key", api_key)
            .header("X-RapidAPI-Host", self.rapidapi_host()?)
            .send()
            .await
            .map_err(|e| AppError::external_service(SERVICE_NAME, e.to_string()))?;

        let status = response.status();
        if status == StatusCode::NOT_FOUND {
            return Err(AppError::not_found(format!("Exercise {exercise_id}")));
        }
        if !status.is_success() {
            return Err(AppError::external_service(
                SERVICE_NAME,
                format!(
                    "HTTP {status}: {}",
                    response.text().await.unwrap_or_default()
                ),
            ));
        }

        let metadata: ExerciseMetadata = response.json().await.map_err(|e| {
            AppError::external_service(SERVICE_NAME, format!("JSON parse error: {e}"))
        })?;

        self.cache.insert(cache_key, metadata.clone()).await;
        Ok(metadata)
    }

    /// Drop every cached entry; returns how many were removed
    pub async fn revalidate(&self) -> usize {
        let removed = self.cache.invalidate_all().await;
        info!(removed, "ExerciseDB cache revalidated");
        removed
    }

    fn rapidapi_host(&self) -> AppResult<String> {
        Url::parse(&self.config.base_url)
            .ok()
            .and_then(|url| url.host_str().map(str::to_owned))
            .ok_or_else(|| {
                AppError::config_invalid(format!(
                    "Invalid EXERCISEDB_BASE_URL: {}",
                    self.config.base_url
                ))
            })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::cache::ManualClock;
    use crate::errors::ErrorCode;

    fn config(api_key: Option<&str>) -> ExerciseDbConfig {
        ExerciseDbConfig {
            // Unroutable; tests must never reach the network
            base_url: "http://127.0.0.1:9".to_owned(),
            api_key: api_key.map(str::to_owned),
            cache_ttl: Duration::from_secs(60),
            cache_max_entries: 10,
        }
    }

    fn metadata(id: &str) -> ExerciseMetadata {
        ExerciseMetadata {
            id: id.to_owned(),
            name: "barbell bench press".to_owned(),
            body_part: Some("chest".to_owned()),
            equipment: Some("barbell".to_owned()),
            target: Some("pectorals".to_owned()),
            secondary_muscles: vec!["triceps".to_owned()],
            instructions: Vec::new(),
            gif_url: None,
        }
    }

    #[tokio::test]
    async fn test_missing_key_is_config_missing() {
        let client = ExerciseDbClient::new(config(None), Arc::new(ManualClock::new())).unwrap();
        let err = client.get_exercise("0025").await.unwrap_err();
        assert_eq!(err.code, ErrorCode::ConfigMissing);
        assert_eq!(err.http_status(), 503);
    }

    #[tokio::test]
    async fn test_malformed_id_rejected() {
        let client =
            ExerciseDbClient::new(config(Some("key")), Arc::new(ManualClock::new())).unwrap();
        let err = client.get_exercise("../admin").await.unwrap_err();
        assert_eq!(err.code, ErrorCode::InvalidInput);
    }

    #[tokio::test]
    async fn test_fresh_cache_entry_served_without_request() {
        let clock = Arc::new(ManualClock::new());
        let client = ExerciseDbClient::new(config(Some("key")), clock.clone()).unwrap();
        assert!(client.cache().has_cleanup_task());
        client
            .cache()
            .insert("0025".to_owned(), metadata("0025"))
            .await;

        let hit = client.get_exercise("0025").await.unwrap();
        assert_eq!(hit.name, "barbell bench press");

        assert_eq!(client.revalidate().await, 1);
        assert!(client.cache().is_empty().await);
    }

    #[test]
    fn test_rapidapi_host_from_base_url() {
        let mut cfg = config(Some("key"));
        cfg.base_url = "https://exercisedb.p.rapidapi.com".to_owned();
        let client = ExerciseDbClient::new(cfg, Arc::new(ManualClock::new())).unwrap();
        // Built outside a runtime, so no sweep task
        assert!(!client.cache().has_cleanup_task());
        assert_eq!(client.rapidapi_host().unwrap(), "exercisedb.p.rapidapi.com");
    }
}
