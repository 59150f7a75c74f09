//! Billing API DTOs

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

pub use crate::common::{Plan, SubscriptionStatus};

/// Subscription as returned by GET /api/billing/status/
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Subscription {
    pub plan: Plan,
    pub status: SubscriptionStatus,
    pub start_date: NaiveDate,
    pub end_date: NaiveDate,
    #[serde(default)]
    pub transaction_id: Option<String>,
    #[serde(default)]
    pub days_remaining: i64,
    #[serde(default)]
    pub trial_days_remaining: i64,
}

impl Subscription {
    pub fn is_active(&self) -> bool {
        self.status == SubscriptionStatus::Active
    }
}

/// Checkout request for POST /api/billing/subscribe/
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SubscribeRequest {
    pub plan: Plan,
    pub card_number: String,
    pub expiry: String,
    pub cvc: String,
}
