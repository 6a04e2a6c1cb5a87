// ABOUTME: Route handler for the RevenueCat subscription webhook
// ABOUTME: Verifies the shared secret, then hands the event to SubscriptionSync
//
// SPDX-License-Identifier: MIT OR Apache-2.0
// Copyright (c) 2025 Pierre Fitness Intelligence

use std::sync::Arc;

use axum::{
    body::Bytes,
    extract::State,
    http::{header, HeaderMap, StatusCode},
    response::{IntoResponse, Response},
    routing::post,
    Json, Router,
};

use crate::errors::AppError;
use crate::resources::ServerResources;
use crate::routes::extract::parse_json;
use crate::services::subscription_sync::{verify_authorization, RevenueCatWebhook};

/// Webhook routes implementation
pub struct WebhookRoutes;

impl WebhookRoutes {
    /// Create all webhook routes
    pub fn routes(resources: Arc<ServerResources>) -> Router {
        Router::new()
            .route("/api/webhooks/revenuecat", post(Self::handle_revenuecat))
            .with_state(resources)
    }

    /// Handle POST /api/webhooks/revenuecat
    ///
    /// The body is only parsed after the shared secret checks out.
    async fn handle_revenuecat(
        State(resources): State<Arc<ServerResources>>,
        headers: HeaderMap,
        body: Bytes,
    ) -> Result<Response, AppError> {
        verify_authorization(
            resources.config.webhooks.revenuecat_secret.as_deref(),
            headers
                .get(header::AUTHORIZATION)
                .and_then(|value| value.to_str().ok()),
        )?;
        let webhook: RevenueCatWebhook = parse_json(&body)?;

        let outcome = resources
            .subscriptions
            .handle(webhook, resources.clock.utc_now())
            .await?;
        Ok((StatusCode::OK, Json(outcome)).into_response())
    }
}
