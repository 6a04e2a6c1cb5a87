// ABOUTME: Subscription entitlement models synced from RevenueCat webhooks
// ABOUTME: SubscriptionStatus and PlanTier derivation from store product ids
//
// SPDX-License-Identifier: MIT OR Apache-2.0
// Copyright (c) 2025 Pierre Fitness Intelligence

use std::fmt::{Display, Formatter, Result as FmtResult};
use std::str::FromStr;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::errors::AppError;

/// Entitlement state for a user
#[non_exhaustive]
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub enum SubscriptionStatus {
    /// Paid access granted
    Active,
    /// Cancelled, expired, or paused
    Cancelled,
    /// Store could not collect payment
    PastDue,
}

impl SubscriptionStatus {
    /// Database string representation
    #[must_use]
    pub const fn as_str(&self) -> &'static str {
        match self {
            Self::Active => "active",
            Self::Cancelled => "cancelled",
            Self::PastDue => "past_due",
        }
    }
}

impl Display for SubscriptionStatus {
    fn fmt(&self, f: &mut Formatter<'_>) -> FmtResult {
        f.write_str(self.as_str())
    }
}

impl FromStr for SubscriptionStatus {
    type Err = AppError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "active" => Ok(Self::Active),
            "cancelled" => Ok(Self::Cancelled),
            "past_due" => Ok(Self::PastDue),
            _ => Err(AppError::invalid_input(format!(
                "Invalid subscription status: {s}"
            ))),
        }
    }
}

/// Billing tier derived from the store product identifier
#[non_exhaustive]
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum PlanTier {
    /// Yearly billing
    Annual,
    /// Monthly billing
    Monthly,
    /// One-time purchase
    Lifetime,
    /// Any other paid product
    Premium,
}

impl PlanTier {
    /// Case-insensitive substring match on the product id
    #[must_use]
    pub fn from_product_id(product_id: &str) -> Self {
        let product = product_id.to_lowercase();
        if product.contains("annual") || product.contains("yearly") {
            Self::Annual
        } else if product.contains("month") {
            Self::Monthly
        } else if product.contains("lifetime") {
            Self::Lifetime
        } else {
            Self::Premium
        }
    }

    /// Database string representation
    #[must_use]
    pub const fn as_str(&self) -> &'static str {
        match self {
            Self::Annual => "annual",
            Self::Monthly => "monthly",
            Self::Lifetime => "lifetime",
            Self::Premium => "premium",
        }
    }
}

impl Display for PlanTier {
    fn fmt(&self, f: &mut Formatter<'_>) -> FmtResult {
        f.write_str(self.as_str())
    }
}

impl FromStr for PlanTier {
    type Err = AppError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "annual" => Ok(Self::Annual),
            "monthly" => Ok(Self::Monthly),
            "lifetime" => Ok(Self::Lifetime),
            "premium" => Ok(Self::Premium),
            _ => Err(AppError::invalid_input(format!("Invalid plan tier: {s}"))),
        }
    }
}

/// One row per user, upserted by webhook events
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Subscription {
    /// Owner
    pub user_id: Uuid,
    /// Entitlement state
    pub status: SubscriptionStatus,
    /// Billing tier
    pub plan_tier: PlanTier,
    /// Store product id
    pub product_id: Option<String>,
    /// Store name (`APP_STORE`, `PLAY_STORE`...)
    pub store: Option<String>,
    /// End of the paid period
    pub current_period_end: Option<DateTime<Utc>>,
    /// Event type that last touched the row
    pub last_event_type: String,
    /// Event id that last touched the row
    pub last_event_id: Option<String>,
    /// Update timestamp
    pub updated_at: DateTime<Utc>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_tier_from_product_id() {
        assert_eq!(
            PlanTier::from_product_id("vlife_Annual_99"),
            PlanTier::Annual
        );
        assert_eq!(PlanTier::from_product_id("vlife.yearly"), PlanTier::Annual);
        assert_eq!(
            PlanTier::from_product_id("vlife_monthly"),
            PlanTier::Monthly
        );
        assert_eq!(
            PlanTier::from_product_id("LIFETIME_pass"),
            PlanTier::Lifetime
        );
        assert_eq!(PlanTier::from_product_id("vlife_pro"), PlanTier::Premium);
    }

    #[test]
    fn test_status_strings() -> Result<(), AppError> {
        assert_eq!(SubscriptionStatus::PastDue.as_str(), "past_due");
        assert_eq!(
            "cancelled".parse::<SubscriptionStatus>()?,
            SubscriptionStatus::Cancelled
        );
        Ok(())
    }
}
