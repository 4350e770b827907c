use serde::Deserialize;
use serde_json::Value;

use crate::api::common::{parse_object_id, render, render_all};
use crate::db::achievement_repository::{AchievementFilter, AchievementRepository};
use crate::db::models::{Achievement, AchievementType};
use crate::error::AppError;

/// Query string of `GET /api/achievements`.
#[derive(Debug, Default, Deserialize)]
pub struct AchievementQuery {
    /// `Hackathon`, `CTF`, `Coding`, `Other`, or `All`.
    #[serde(rename = "type")]
    pub kind: Option<String>,
}

impl AchievementQuery {
    /// Build the repository filter. `None` when the type is not one any
    /// achievement can have.
    pub fn to_filter(&self) -> Option<AchievementFilter> {
        match self.kind.as_deref().map(str::trim) {
            None | Some("") | Some("All") => Some(AchievementFilter::default()),
            Some(raw) => AchievementType::parse(raw).map(|kind| AchievementFilter { kind: Some(kind) }),
        }
    }
}

pub async fn process_list_achievements(
    repo: &dyn AchievementRepository,
    query: &AchievementQuery,
) -> Result<Vec<Achievement>, AppError> {
    match query.to_filter() {
        Some(filter) => repo.list(&filter).await,
        None => Ok(Vec::new()),
    }
}

pub async fn process_get_achievement(
    repo: &dyn AchievementRepository,
    id: &str,
) -> Result<Achievement, AppError> {
    let oid = parse_object_id(id, "Achievement")?;
    repo.find_by_id(oid)
        .await?
        .ok_or_else(|| AppError::NotFound("Achievement not found".into()))
}

/// Axum handler for `GET /api/achievements`.
pub async fn list_achievements_handler(
    axum::extract::State(state): axum::extract::State<crate::app::AppState>,
    crate::api::common::ApiQuery(query): crate::api::common::ApiQuery<AchievementQuery>,
) -> Result<axum::Json<Value>, AppError> {
    let achievements = process_list_achievements(state.achievement_repo.as_ref(), &query)
        .await
        .map_err(|e| e.or_internal("Failed to fetch achievements"))?;
    Ok(axum::Json(render_all(&achievements)?))
}

/// Axum handler for `GET /api/achievements/{id}`.
pub async fn get_achievement_handler(
    axum::extract::State(state): axum::extract::State<crate::app::AppState>,
    axum::extract::Path(id): axum::extract::Path<String>,
) -> Result<axum::Json<Value>, AppError> {
    let achievement = process_get_achievement(state.achievement_repo.as_ref(), &id)
        .await
        .map_err(|e| e.or_internal("Failed to fetch achievement"))?;
    Ok(axum::Json(render(&achievement)?))
}
