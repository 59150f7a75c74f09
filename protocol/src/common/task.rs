//! Task data structures

use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// Colour label attached to a task
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum TaskLabel {
    #[default]
    None,
    Yellow,
    Green,
    Blue,
    Red,
}

impl TaskLabel {
    pub const ALL: [TaskLabel; 5] = [
        TaskLabel::None,
        TaskLabel::Yellow,
        TaskLabel::Green,
        TaskLabel::Blue,
        TaskLabel::Red,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            TaskLabel::None => "none",
            TaskLabel::Yellow => "yellow",
            TaskLabel::Green => "green",
            TaskLabel::Blue => "blue",
            TaskLabel::Red => "red",
        }
    }
}

impl fmt::Display for TaskLabel {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for TaskLabel {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        TaskLabel::ALL
            .into_iter()
            .find(|label| label.as_str().eq_ignore_ascii_case(s.trim()))
            .ok_or_else(|| format!("unknown label '{}'", s))
    }
}

/// Task as returned by the API
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Task {
    pub id: i64,
    pub title: String,
    #[serde(default)]
    pub description: String,
    #[serde(default)]
    pub completed: bool,
    pub due_date: NaiveDate,
    #[serde(default)]
    pub category: String,
    #[serde(default)]
    pub label: TaskLabel,
    pub created_at: DateTime<Utc>,
}
