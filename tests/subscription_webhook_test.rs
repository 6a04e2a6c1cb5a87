// ABOUTME: Integration tests for RevenueCat webhook processing against the SQLite store
// ABOUTME: Verifies status mapping, tier derivation, and skipped or ignored events
//
// SPDX-License-Identifier: MIT OR Apache-2.0
// Copyright (c) 2025 Pierre Fitness Intelligence

#![allow(clippy::unwrap_used, clippy::expect_used, clippy::panic)]
#![allow(missing_docs)]

mod common;

use anyhow::Result;
use chrono::{DateTime, Utc};
use serde_json::json;
use uuid::Uuid;
use vlife_server::{
    database::WorkoutStore,
    errors::ErrorCode,
    models::{PlanTier, SubscriptionStatus},
    services::subscription_sync::{RevenueCatWebhook, SubscriptionSync, WebhookOutcome},
};

use common::create_test_store;

fn webhook(event_type: &str, app_user_id: &str, product_id: &str) -> RevenueCatWebhook {
    serde_json::from_value(json!({
        "api_version": "1.0",
        "event": {
            "type": event_type,
            "id": Uuid::new_v4().to_string(),
            "app_user_id": app_user_id,
            "product_id": product_id,
            "store": "APP_STORE",
            "expiration_at_ms": 1_767_225_600_000_i64
        }
    }))
    .unwrap()
}

#[tokio::test]
async fn test_initial_purchase_creates_active_subscription() -> Result<()> {
    let store = create_test_store().await?;
    let sync = SubscriptionSync::new(store.clone());
    let user_id = Uuid::new_v4();

    let outcome = sync
        .handle(
            webhook("INITIAL_PURCHASE", &user_id.to_string(), "vlife_annual_99"),
            Utc::now(),
        )
        .await?;

    assert_eq!(
        outcome,
        WebhookOutcome::Updated {
            user_id,
            status: SubscriptionStatus::Active
        }
    );
    let row = store.get_subscription(user_id).await?.unwrap();
    assert_eq!(row.status, SubscriptionStatus::Active);
    assert_eq!(row.plan_tier, PlanTier::Annual);
    assert_eq!(row.store.as_deref(), Some("APP_STORE"));
    assert_eq!(row.last_event_type, "INITIAL_PURCHASE");
    assert_eq!(
        row.current_period_end,
        DateTime::from_timestamp_millis(1_767_225_600_000)
    );
    Ok(())
}

#[tokio::test]
async fn test_later_events_update_the_same_row() -> Result<()> {
    let store = create_test_store().await?;
    let sync = SubscriptionSync::new(store.clone());
    let user_id = Uuid::new_v4().to_string();

    sync.handle(
        webhook("INITIAL_PURCHASE", &user_id, "vlife_monthly"),
        Utc::now(),
    )
    .await?;
    sync.handle(
        webhook("BILLING_ISSUE", &user_id, "vlife_monthly"),
        Utc::now(),
    )
    .await?;
    let row = store
        .get_subscription(Uuid::parse_str(&user_id)?)
        .await?
        .unwrap();
    assert_eq!(row.status, SubscriptionStatus::PastDue);
    assert_eq!(row.plan_tier, PlanTier::Monthly);

    sync.handle(webhook("EXPIRATION", &user_id, "vlife_monthly"), Utc::now())
        .await?;
    let row = store
        .get_subscription(Uuid::parse_str(&user_id)?)
        .await?
        .unwrap();
    assert_eq!(row.status, SubscriptionStatus::Cancelled);
    assert_eq!(row.last_event_type, "EXPIRATION");
    Ok(())
}

#[tokio::test]
async fn test_anonymous_and_foreign_users_are_skipped() -> Result<()> {
    let store = create_test_store().await?;
    let sync = SubscriptionSync::new(store.clone());

    let outcome = sync
        .handle(
            webhook("RENEWAL", "$RCAnonymousID:8a1f2c", "vlife_monthly"),
            Utc::now(),
        )
        .await?;
    assert!(matches!(outcome, WebhookOutcome::Skipped { .. }));

    let outcome = sync
        .handle(
            webhook("RENEWAL", "legacy-user-42", "vlife_monthly"),
            Utc::now(),
        )
        .await?;
    assert!(matches!(outcome, WebhookOutcome::Skipped { .. }));
    Ok(())
}

#[tokio::test]
async fn test_informational_events_are_ignored() -> Result<()> {
    let store = create_test_store().await?;
    let sync = SubscriptionSync::new(store.clone());
    let user_id = Uuid::new_v4();

    let outcome = sync
        .handle(
            webhook("TEST", &user_id.to_string(), "vlife_monthly"),
            Utc::now(),
        )
        .await?;

    assert_eq!(
        outcome,
        WebhookOutcome::Ignored {
            event_type: "TEST".to_owned()
        }
    );
    assert!(store.get_subscription(user_id).await?.is_none());
    Ok(())
}

#[tokio::test]
async fn test_status_event_without_user_is_rejected() -> Result<()> {
    let store = create_test_store().await?;
    let sync = SubscriptionSync::new(store.clone());
    let body: RevenueCatWebhook = serde_json::from_value(json!({
        "event": { "type": "RENEWAL", "product_id": "vlife_monthly" }
    }))?;

    let err = sync.handle(body, Utc::now()).await.unwrap_err();
    assert_eq!(err.code, ErrorCode::MissingRequiredField);
    Ok(())
}
