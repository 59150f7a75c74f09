//! Task and template API DTOs

use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Serialize};

pub use crate::common::{Task, TaskLabel};

// ============================================================================
// Task DTOs
// ============================================================================

/// Create task request for POST /api/tasks/
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct NewTask {
    pub title: String,
    #[serde(default)]
    pub description: String,
    pub due_date: NaiveDate,
    #[serde(default)]
    pub category: String,
    #[serde(default)]
    pub label: TaskLabel,
}

/// Partial task update for PATCH /api/tasks/{id}/
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct TaskPatch {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub title: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub completed: Option<bool>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub due_date: Option<NaiveDate>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub category: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub label: Option<TaskLabel>,
}

impl TaskPatch {
    pub fn completed(completed: bool) -> Self {
        Self {
            completed: Some(completed),
            ..Self::default()
        }
    }

    pub fn is_empty(&self) -> bool {
        self.title.is_none()
            && self.description.is_none()
            && self.completed.is_none()
            && self.due_date.is_none()
            && self.category.is_none()
            && self.label.is_none()
    }
}

// ============================================================================
// Template DTOs
// ============================================================================

/// One task blueprint inside a template
///
/// `due_date_offset` is counted in days from the base date the template is
/// instantiated with.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TemplateItem {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub id: Option<i64>,
    pub title: String,
    #[serde(default)]
    pub description: String,
    #[serde(default)]
    pub category: String,
    #[serde(default)]
    pub label: TaskLabel,
    #[serde(default)]
    pub due_date_offset: i64,
    #[serde(default)]
    pub order: u32,
}

/// Template as returned by GET /api/tasks/templates/
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TaskTemplate {
    pub id: i64,
    pub name: String,
    #[serde(default)]
    pub description: String,
    #[serde(default)]
    pub category: String,
    #[serde(default)]
    pub items: Vec<TemplateItem>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

/// Body for POST/PUT on /api/tasks/templates/
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TemplateDraft {
    pub name: String,
    #[serde(default)]
    pub description: String,
    #[serde(default)]
    pub category: String,
    #[serde(default)]
    pub items: Vec<TemplateItem>,
}

impl TemplateDraft {
    /// Renumber items by position and drop server ids
    pub fn normalized(mut self) -> Self {
        for (index, item) in self.items.iter_mut().enumerate() {
            item.id = None;
            item.order = index as u32;
        }
        self
    }
}

/// Request for POST /api/tasks/from-template/
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct FromTemplateRequest {
    pub template_id: i64,
    pub base_date: NaiveDate,
}

/// Tasks created from a template
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct FromTemplateResponse {
    #[serde(default)]
    pub tasks: Vec<Task>,
}

impl FromTemplateResponse {
    /// Earliest due date among the created tasks
    pub fn earliest_due_date(&self) -> Option<NaiveDate> {
        self.tasks.iter().map(|t| t.due_date).min()
    }
}
