//! Task templates
//!
//! A template is a named list of task blueprints. Instantiating it creates
//! one task per item, each due `due_date_offset` days after the base date.

use chrono::NaiveDate;
use std::path::Path;

use taskman_protocol::{
    FromTemplateRequest, FromTemplateResponse, ListResponse, TaskTemplate, TemplateDraft,
};

use crate::client::ApiRequest;
use crate::error::{Result, TaskmanError};
use crate::session::Session;

const TEMPLATES_PATH: &str = "/api/tasks/templates/";

fn template_path(id: i64) -> String {
    format!("{}{}/", TEMPLATES_PATH, id)
}

/// Read a draft from a JSON file
pub async fn load_draft(path: &Path) -> Result<TemplateDraft> {
    if !path.exists() {
        return Err(TaskmanError::file_not_found(path.display().to_string()));
    }
    let content = tokio::fs::read_to_string(path)
        .await
        .map_err(|e| TaskmanError::io_from_error("Failed to read template file", e))?;
    serde_json::from_str(&content).map_err(|e| {
        TaskmanError::invalid_input(format!("{} is not a valid template: {}", path.display(), e))
    })
}

fn validate(draft: &TemplateDraft) -> Result<()> {
    if draft.name.trim().is_empty() {
        return Err(TaskmanError::invalid_input("Template name cannot be empty"));
    }
    if let Some(position) = draft.items.iter().position(|i| i.title.trim().is_empty()) {
        return Err(TaskmanError::invalid_input(format!(
            "Template item {} has no title",
            position + 1
        )));
    }
    Ok(())
}

/// Template service
pub struct TemplateService<'a> {
    session: &'a Session,
}

impl<'a> TemplateService<'a> {
    pub fn new(session: &'a Session) -> Self {
        Self { session }
    }

    pub async fn list(&self) -> Result<Vec<TaskTemplate>> {
        let list: ListResponse<TaskTemplate> = self
            .session
            .authenticated_fetch(ApiRequest::get(TEMPLATES_PATH))
            .await?
            .into_result()?;
        Ok(list.into_items())
    }

    pub async fn create(&self, draft: TemplateDraft) -> Result<TaskTemplate> {
        validate(&draft)?;
        let request = ApiRequest::post(TEMPLATES_PATH).json(&draft.normalized())?;
        self.session
            .authenticated_fetch(request)
            .await?
            .into_result()
    }

    /// Replace a template; its items are rewritten in draft order
    pub async fn update(&self, id: i64, draft: TemplateDraft) -> Result<TaskTemplate> {
        validate(&draft)?;
        let request = ApiRequest::put(template_path(id)).json(&draft.normalized())?;
        self.session
            .authenticated_fetch(request)
            .await?
            .into_result()
    }

    pub async fn delete(&self, id: i64) -> Result<()> {
        self.session
            .authenticated_fetch(ApiRequest::delete(template_path(id)))
            .await?
            .into_unit()
    }

    /// Create the template's tasks relative to `base_date`
    pub async fn instantiate(&self, id: i64, base_date: NaiveDate) -> Result<FromTemplateResponse> {
        let request = ApiRequest::post("/api/tasks/from-template/").json(&FromTemplateRequest {
            template_id: id,
            base_date,
        })?;
        self.session
            .authenticated_fetch(request)
            .await?
            .into_result()
    }
}
