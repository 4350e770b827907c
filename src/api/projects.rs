use serde::Deserialize;
use serde_json::Value;

use crate::api::common::{parse_object_id, render, render_all};
use crate::db::models::Project;
use crate::db::project_repository::{ProjectFilter, ProjectRepository};
use crate::error::AppError;

/// Query string of `GET /api/projects`.
#[derive(Debug, Default, Deserialize)]
pub struct ProjectQuery {
    /// Only the literal `true` restricts to featured projects.
    pub featured: Option<String>,
    pub category: Option<String>,
}

impl ProjectQuery {
    pub fn to_filter(&self) -> ProjectFilter {
        ProjectFilter {
            featured_only: self.featured.as_deref() == Some("true"),
            category: self.category.clone().filter(|c| !c.is_empty()),
        }
    }
}

pub async fn process_list_projects(
    repo: &dyn ProjectRepository,
    query: &ProjectQuery,
) -> Result<Vec<Project>, AppError> {
    repo.list(&query.to_filter()).await
}

pub async fn process_get_project(repo: &dyn ProjectRepository, id: &str) -> Result<Project, AppError> {
    let oid = parse_object_id(id, "Project")?;
    repo.find_by_id(oid)
        .await?
        .ok_or_else(|| AppError::NotFound("Project not found".into()))
}

/// Axum handler for `GET /api/projects`.
pub async fn list_projects_handler(
    axum::extract::State(state): axum::extract::State<crate::app::AppState>,
    crate::api::common::ApiQuery(query): crate::api::common::ApiQuery<ProjectQuery>,
) -> Result<axum::Json<Value>, AppError> {
    let projects = process_list_projects(state.project_repo.as_ref(), &query)
        .await
        .map_err(|e| e.or_internal("Failed to fetch projects"))?;
    Ok(axum::Json(render_all(&projects)?))
}

/// Axum handler for `GET /api/projects/{id}`.
pub async fn get_project_handler(
    axum::extract::State(state): axum::extract::State<crate::app::AppState>,
    axum::extract::Path(id): axum::extract::Path<String>,
) -> Result<axum::Json<Value>, AppError> {
    let project = process_get_project(state.project_repo.as_ref(), &id)
        .await
        .map_err(|e| e.or_internal("Failed to fetch project"))?;
    Ok(axum::Json(render(&project)?))
}
