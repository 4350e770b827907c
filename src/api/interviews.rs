use serde::Deserialize;
use serde_json::Value;

use crate::api::common::{parse_object_id, render, render_all};
use crate::db::interview_repository::{parse_limit, InterviewFilter, InterviewRepository};
use crate::db::models::Interview;
use crate::error::AppError;

/// Query string of `GET /api/interviews`.
#[derive(Debug, Default, Deserialize)]
pub struct InterviewQuery {
    pub company: Option<String>,
    pub domain: Option<String>,
    pub result: Option<String>,
    pub limit: Option<String>,
}

impl InterviewQuery {
    pub fn to_filter(&self) -> InterviewFilter {
        let non_empty = |v: &Option<String>| v.clone().filter(|s| !s.is_empty());
        InterviewFilter {
            company: non_empty(&self.company),
            domain: non_empty(&self.domain),
            result: non_empty(&self.result),
            limit: parse_limit(self.limit.as_deref()),
        }
    }
}

pub async fn process_list_interviews(
    repo: &dyn InterviewRepository,
    query: &InterviewQuery,
) -> Result<Vec<Interview>, AppError> {
    repo.list(&query.to_filter()).await
}

pub async fn process_get_interview(repo: &dyn InterviewRepository, id: &str) -> Result<Interview, AppError> {
    let oid = parse_object_id(id, "Interview")?;
    repo.find_by_id(oid)
        .await?
        .ok_or_else(|| AppError::NotFound("Interview not found".into()))
}

/// Axum handler for `GET /api/interviews`.
pub async fn list_interviews_handler(
    axum::extract::State(state): axum::extract::State<crate::app::AppState>,
    crate::api::common::ApiQuery(query): crate::api::common::ApiQuery<InterviewQuery>,
) -> Result<axum::Json<Value>, AppError> {
    let interviews = process_list_interviews(state.interview_repo.as_ref(), &query)
        .await
        .map_err(|e| e.or_internal("Failed to fetch interviews"))?;
    Ok(axum::Json(render_all(&interviews)?))
}

/// Axum handler for `GET /api/interviews/{id}`.
pub async fn get_interview_handler(
    axum::extract::State(state): axum::extract::State<crate::app::AppState>,
    axum::extract::Path(id): axum::extract::Path<String>,
) -> Result<axum::Json<Value>, AppError> {
    let interview = process_get_interview(state.interview_repo.as_ref(), &id)
        .await
        .map_err(|e| e.or_internal("Failed to fetch interview"))?;
    Ok(axum::Json(render(&interview)?))
}
