//! Task operations

use chrono::NaiveDate;

use taskman_protocol::{ListResponse, NewTask, Task, TaskPatch};

use crate::client::ApiRequest;
use crate::error::{Result, TaskmanError};
use crate::session::Session;

const TASKS_PATH: &str = "/api/tasks/";

fn task_path(id: i64) -> String {
    format!("{}{}/", TASKS_PATH, id)
}

/// Task service
pub struct TaskService<'a> {
    session: &'a Session,
}

impl<'a> TaskService<'a> {
    pub fn new(session: &'a Session) -> Self {
        Self { session }
    }

    /// Tasks due on `date`
    pub async fn list_for_date(&self, date: NaiveDate) -> Result<Vec<Task>> {
        let request = ApiRequest::get(TASKS_PATH).query("due_date", date.format("%Y-%m-%d"));
        let list: ListResponse<Task> = self
            .session
            .authenticated_fetch(request)
            .await?
            .into_result()?;
        Ok(list.into_items())
    }

    pub async fn list_all(&self) -> Result<Vec<Task>> {
        let list: ListResponse<Task> = self
            .session
            .authenticated_fetch(ApiRequest::get(TASKS_PATH))
            .await?
            .into_result()?;
        Ok(list.into_items())
    }

    /// The ten most recently created tasks
    pub async fn recent(&self) -> Result<Vec<Task>> {
        self.session
            .authenticated_fetch(ApiRequest::get("/api/tasks/recent/"))
            .await?
            .into_result()
    }

    /// One page of the user's task history, newest first
    pub async fn user_tasks(&self, page: u32) -> Result<ListResponse<Task>> {
        let request = ApiRequest::get("/api/tasks/user-tasks/").query("page", page.max(1));
        self.session
            .authenticated_fetch(request)
            .await?
            .into_result()
    }

    pub async fn get(&self, id: i64) -> Result<Task> {
        self.session
            .authenticated_fetch(ApiRequest::get(task_path(id)))
            .await?
            .into_result()
    }

    pub async fn create(&self, task: &NewTask) -> Result<Task> {
        if task.title.trim().is_empty() {
            return Err(TaskmanError::invalid_input("Task title cannot be empty"));
        }
        let request = ApiRequest::post(TASKS_PATH).json(task)?;
        self.session
            .authenticated_fetch(request)
            .await?
            .into_result()
    }

    pub async fn update(&self, id: i64, patch: &TaskPatch) -> Result<Task> {
        if patch.is_empty() {
            return Err(TaskmanError::invalid_input("Nothing to update"));
        }
        let request = ApiRequest::patch(task_path(id)).json(patch)?;
        self.session
            .authenticated_fetch(request)
            .await?
            .into_result()
    }

    pub async fn set_completed(&self, id: i64, completed: bool) -> Result<Task> {
        self.update(id, &TaskPatch::completed(completed)).await
    }

    pub async fn delete(&self, id: i64) -> Result<()> {
        self.session
            .authenticated_fetch(ApiRequest::delete(task_path(id)))
            .await?
            .into_unit()
    }
}
