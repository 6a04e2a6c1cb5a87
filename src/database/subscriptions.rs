// ABOUTME: Database operations for subscription entitlement rows
// ABOUTME: One row per user, upserted by RevenueCat webhook events
//
// SPDX-License-Identifier: MIT OR Apache-2.0
// Copyright (c) 2025 Pierre Fitness Intelligence

use sqlx::SqlitePool;
use uuid::Uuid;

use super::rows;
use crate::errors::{AppError, AppResult};
use crate::models::{PlanTier, Subscription, SubscriptionStatus};

/// Subscription database operations manager
#[derive(Clone)]
pub struct SubscriptionManager {
    pool: SqlitePool,
}

impl SubscriptionManager {
    /// Create a new subscription manager
    #[must_use]
    pub const fn new(pool: SqlitePool) -> Self {
        Self { pool }
    }

    /// Insert or replace the subscription for `subscription.user_id`
    ///
    /// # Errors
    ///
    /// Returns an error if the database query fails
    pub async fn upsert_subscription(&self, subscription: &Subscription) -> AppResult<()> {
        sqlx::query(
            r"
            INSERT INTO subscriptions
                (user_id, status, plan_tier, product_id, store, current_period_end,
                 last_event_type, last_event_id, updated_at)
            VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9)
            ON CONFLICT (user_id) DO UPDATE SET
                status = excluded.status,
                plan_tier = excluded.plan_tier,
                product_id = excluded.product_id,
                store = excluded.store,
                current_period_end = excluded.current_period_end,
                last_event_type = excluded.last_event_type,
                last_event_id = excluded.last_event_id,
                updated_at = excluded.updated_at
            ",
        )
        .bind(subscription.user_id.to_string())
        .bind(subscription.status.as_str())
        .bind(subscription.plan_tier.as_str())
        .bind(&subscription.product_id)
        .bind(&subscription.store)
        .bind(subscription.current_period_end.map(rows::ts))
        .bind(&subscription.last_event_type)
        .bind(&subscription.last_event_id)
        .bind(rows::ts(subscription.updated_at))
        .execute(&self.pool)
        .await
        .map_err(|e| AppError::database(format!("Failed to upsert subscription: {e}")))?;

        Ok(())
    }

    /// Get the subscription row for a user
    ///
    /// # Errors
    ///
    /// Returns an error if the database query fails
    pub async fn get_subscription(&self, user_id: Uuid) -> AppResult<Option<Subscription>> {
        let row = sqlx::query(
            r"
            SELECT user_id, status, plan_tier, product_id, store, current_period_end,
                   last_event_type, last_event_id, updated_at
            FROM subscriptions WHERE user_id = $1
            ",
        )
        .bind(user_id.to_string())
        .fetch_optional(&self.pool)
        .await
        .map_err(|e| AppError::database(format!("Failed to get subscription: {e}")))?;

        row.map(|r| {
            Ok(Subscription {
                user_id: rows::uuid(&r, "user_id")?,
                status: rows::text(&r, "status")?.parse::<SubscriptionStatus>()?,
                plan_tier: rows::text(&r, "plan_tier")?.parse::<PlanTier>()?,
                product_id: rows::opt_text(&r, "product_id")?,
                store: rows::opt_text(&r, "store")?,
                current_period_end: rows::opt_timestamp(&r, "current_period_end")?,
                last_event_type: rows::text(&r, "last_event_type")?,
                last_event_id: rows::opt_text(&r, "last_event_id")?,
                updated_at: rows::timestamp(&r, "updated_at")?,
            })
        })
        .transpose()
    }
}
