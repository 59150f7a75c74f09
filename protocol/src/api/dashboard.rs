//! Dashboard API DTOs

use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::fmt;
use std::str::FromStr;

use crate::common::{Plan, SubscriptionStatus};

/// Reporting window for GET /api/dashboard/?period=
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Period {
    #[default]
    Today,
    Week,
    Month,
}

impl Period {
    pub fn as_str(&self) -> &'static str {
        match self {
            Period::Today => "today",
            Period::Week => "week",
            Period::Month => "month",
        }
    }
}

impl fmt::Display for Period {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Period {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "today" | "day" => Ok(Period::Today),
            "week" => Ok(Period::Week),
            "month" => Ok(Period::Month),
            other => Err(format!("unknown period '{}'", other)),
        }
    }
}

/// Per-day task counts
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DailyCount {
    pub date: String,
    pub total: u32,
    pub completed: u32,
}

/// Aggregated statistics returned by the dashboard endpoint
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DashboardStats {
    pub total_tasks: u32,
    pub completed_tasks: u32,
    pub pending_tasks: u32,
    pub completion_rate: u32,
    #[serde(default)]
    pub tasks_by_category: BTreeMap<String, u32>,
    #[serde(default)]
    pub tasks_by_date: Vec<DailyCount>,
    #[serde(default)]
    pub trial_days_remaining: i64,
    pub subscription_plan: Plan,
    pub subscription_status: SubscriptionStatus,
}
