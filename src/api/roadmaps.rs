use serde_json::Value;

use crate::api::common::{render, render_all};
use crate::db::models::{Roadmap, RoadmapSummary};
use crate::db::roadmap_repository::RoadmapRepository;
use crate::error::AppError;
use crate::models::roadmap_progress::{compute_progress, ChecklistState, RoadmapProgress};

pub async fn process_list_roadmaps(repo: &dyn RoadmapRepository) -> Result<Vec<RoadmapSummary>, AppError> {
    repo.list_summaries().await
}

pub async fn process_get_roadmap(repo: &dyn RoadmapRepository, slug: &str) -> Result<Roadmap, AppError> {
    repo.find_by_slug(slug)
        .await?
        .ok_or_else(|| AppError::NotFound("Roadmap not found".into()))
}

pub async fn process_roadmap_progress(
    repo: &dyn RoadmapRepository,
    slug: &str,
    state: &ChecklistState,
) -> Result<RoadmapProgress, AppError> {
    let roadmap = process_get_roadmap(repo, slug).await?;
    Ok(compute_progress(&roadmap, state))
}

/// Axum handler for `GET /api/roadmaps`.
pub async fn list_roadmaps_handler(
    axum::extract::State(state): axum::extract::State<crate::app::AppState>,
) -> Result<axum::Json<Value>, AppError> {
    let roadmaps = process_list_roadmaps(state.roadmap_repo.as_ref())
        .await
        .map_err(|e| e.or_internal("Failed to fetch roadmaps"))?;
    Ok(axum::Json(render_all(&roadmaps)?))
}

/// Axum handler for `GET /api/roadmaps/{id}`.
pub async fn get_roadmap_handler(
    axum::extract::State(state): axum::extract::State<crate::app::AppState>,
    axum::extract::Path(slug): axum::extract::Path<String>,
) -> Result<axum::Json<Value>, AppError> {
    let roadmap = process_get_roadmap(state.roadmap_repo.as_ref(), &slug)
        .await
        .map_err(|e| e.or_internal("Failed to fetch roadmap"))?;
    Ok(axum::Json(render(&roadmap)?))
}

/// Axum handler for `POST /api/roadmaps/{id}/progress`.
pub async fn roadmap_progress_handler(
    axum::extract::State(state): axum::extract::State<crate::app::AppState>,
    axum::extract::Path(slug): axum::extract::Path<String>,
    crate::api::common::ApiJson(checklist): crate::api::common::ApiJson<ChecklistState>,
) -> Result<axum::Json<RoadmapProgress>, AppError> {
    let progress = process_roadmap_progress(state.roadmap_repo.as_ref(), &slug, &checklist)
        .await
        .map_err(|e| e.or_internal("Failed to compute roadmap progress"))?;
    Ok(axum::Json(progress))
}
