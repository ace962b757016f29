use std::sync::Arc;

use crate::client::{ApiClient, ApiRequest};
use crate::errors::{ApiError, ApiResult};
use crate::models::{CreateProjectData, Project, UpdateProjectData};

const PROJECTS_PATH: &str = "/projects";

/// CRUD over `/projects`
pub struct ProjectApi {
    client: Arc<ApiClient>,
}

impl ProjectApi {
    pub fn new(client: Arc<ApiClient>) -> Self {
        Self { client }
    }

    pub async fn list(&self) -> ApiResult<Vec<Project>> {
        self.client.get(PROJECTS_PATH).await
    }

    pub async fn get(&self, id: i64) -> ApiResult<Project> {
        self.client.get(&project_path(id)).await
    }

    pub async fn create(&self, data: &CreateProjectData) -> ApiResult<Project> {
        if data.name.trim().is_empty() {
            return Err(ApiError::InvalidRequest("project name is required".to_string()));
        }
        self.client.post(PROJECTS_PATH, data).await
    }

    pub async fn update(&self, id: i64, data: &UpdateProjectData) -> ApiResult<Project> {
        self.client.put(&project_path(id), data).await
    }

    pub async fn delete(&self, id: i64) -> ApiResult<()> {
        self.client.send(ApiRequest::delete(project_path(id))).await
    }
}

fn project_path(id: i64) -> String {
    format!("{}/{}", PROJECTS_PATH, id)
}
