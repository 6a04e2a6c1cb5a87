// ABOUTME: RevenueCat webhook handling - shared-secret check and event-to-status mapping
// ABOUTME: Upserts one subscription row per user from entitlement lifecycle events
//
// SPDX-License-Identifier: MIT OR Apache-2.0
// Copyright (c) 2025 Pierre Fitness Intelligence

use std::sync::Arc;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use subtle::ConstantTimeEq;
use tracing::{debug, info, warn};
use uuid::Uuid;

use crate::constants::revenuecat::ANONYMOUS_ID_PREFIX;
use crate::database::WorkoutStore;
use crate::errors::{AppError, AppResult};
use crate::models::{PlanTier, Subscription, SubscriptionStatus};

/// `RevenueCat` webhook body
#[derive(Debug, Clone, Deserialize)]
pub struct RevenueCatWebhook {
    /// Payload format version
    #[serde(default)]
    pub api_version: Option<String>,
    /// The event
    pub event: RevenueCatEvent,
}

/// Fields of a `RevenueCat` event this service reads
#[derive(Debug, Clone, Deserialize)]
pub struct RevenueCatEvent {
    /// Event type (`INITIAL_PURCHASE`, `RENEWAL`, ...)
    #[serde(rename = "type")]
    pub event_type: String,
    /// Unique event id
    #[serde(default)]
    pub id: Option<String>,
    /// App user id; V-Life sets it to the user's UUID
    #[serde(default)]
    pub app_user_id: Option<String>,
    /// Store product id
    #[serde(default)]
    pub product_id: Option<String>,
    /// Store (`APP_STORE`, `PLAY_STORE`, ...)
    #[serde(default)]
    pub store: Option<String>,
    /// Entitlement expiry, epoch millis
    #[serde(default)]
    pub expiration_at_ms: Option<i64>,
}

/// What the webhook did with an event
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "result", rename_all = "camelCase", rename_all_fields = "camelCase")]
pub enum WebhookOutcome {
    /// The user's subscription row was written
    Updated {
        /// User whose row changed
        user_id: Uuid,
        /// New status
        status: SubscriptionStatus,
    },
    /// The event maps to a status but cannot be attributed to a user
    Skipped {
        /// Why
        reason: String,
    },
    /// Event type does not affect entitlements
    Ignored {
        /// The event type received
        event_type: String,
    },
}

/// Subscription status implied by an event type, `None` for informational events
#[must_use]
pub fn status_for_event(event_type: &str) -> Option<SubscriptionStatus> {
    match event_type {
        "INITIAL_PURCHASE"
        | "RENEWAL"
        | "PRODUCT_CHANGE"
        | "UNCANCELLATION"
        | "NON_RENEWING_PURCHASE"
        | "SUBSCRIPTION_EXTENDED"
        | "TEMPORARY_ENTITLEMENT_GRANT" => Some(SubscriptionStatus::Active),
        "CANCELLATION" | "EXPIRATION" | "SUBSCRIPTION_PAUSED" => {
            Some(SubscriptionStatus::Cancelled)
        }
        "BILLING_ISSUE" => Some(SubscriptionStatus::PastDue),
        _ => None,
    }
}

/// Check the `Authorization` header against the configured secret
///
/// No secret configured means every request is accepted. The header may
/// carry the bare secret or `Bearer <secret>`.
///
/// # Errors
///
/// Returns `AuthInvalid` when the header is missing or does not match
pub fn verify_authorization(secret: Option<&str>, header: Option<&str>) -> AppResult<()> {
    let Some(secret) = secret else {
        return Ok(());
    };
    let provided = header
        .map(str::trim)
        .ok_or_else(|| AppError::auth_invalid("Missing webhook authorization"))?;
    let provided = provided.strip_prefix("Bearer ").unwrap_or(provided);

    if bool::from(provided.as_bytes().ct_eq(secret.as_bytes())) {
        Ok(())
    } else {
        Err(AppError::auth_invalid("Invalid webhook authorization"))
    }
}

/// Applies `RevenueCat` events to the subscriptions table
#[derive(Clone)]
pub struct SubscriptionSync {
    store: Arc<dyn WorkoutStore>,
}

impl SubscriptionSync {
    /// Create a new sync handler
    #[must_use]
    pub fn new(store: Arc<dyn WorkoutStore>) -> Self {
        Self { store }
    }

    /// Apply one webhook event
    ///
    /// # Errors
    ///
    /// Returns a validation error when a status-changing event has no app
    /// user id, or a database error if the upsert fails
    pub async fn handle(
        &self,
        webhook: RevenueCatWebhook,
        received_at: DateTime<Utc>,
    ) -> AppResult<WebhookOutcome> {
        let event = webhook.event;
        let Some(status) = status_for_event(&event.event_type) else {
            debug!(event_type = %event.event_type, "Ignoring RevenueCat event");
            return Ok(WebhookOutcome::Ignored {
                event_type: event.event_type,
            });
        };

        let app_user_id = event
            .app_user_id
            .as_deref()
            .map(str::trim)
            .filter(|id| !id.is_empty())
            .ok_or_else(|| AppError::missing_field("event.app_user_id"))?;

        if app_user_id.starts_with(ANONYMOUS_ID_PREFIX) {
            info!(event_type = %event.event_type, "Skipping RevenueCat event for anonymous user");
            return Ok(WebhookOutcome::Skipped {
                reason: "anonymous app user".to_owned(),
            });
        }

        let Ok(user_id) = Uuid::parse_str(app_user_id) else {
            warn!(
                event_type = %event.event_type,
                app_user_id,
                "RevenueCat app user id is not a V-Life user id"
            );
            return Ok(WebhookOutcome::Skipped {
                reason: "app user id is not a user UUID".to_owned(),
            });
        };

        let plan_tier = PlanTier::from_product_id(event.product_id.as_deref().unwrap_or_default());
        let subscription = Subscription {
            user_id,
            status,
            plan_tier,
            product_id: event.product_id,
            store: event.store,
            current_period_end: event
                .expiration_at_ms
                .and_then(DateTime::from_timestamp_millis),
            last_event_type: event.event_type,
            last_event_id: event.id,
            updated_at: received_at,
        };
        self.store.upsert_subscription(&subscription).await?;

        info!(
            %user_id,
            status = %status,
            plan_tier = %plan_tier,
            event_type = %subscription.last_event_type,
            "Subscription updated from RevenueCat"
        );
        Ok(WebhookOutcome::Updated { user_id, status })
    }
}
