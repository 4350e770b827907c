use std::sync::Arc;

use axum::routing::{get, patch, post};
use axum::Router;
use tower::ServiceBuilder;
use tower_http::cors::CorsLayer;
use tower_http::trace::TraceLayer;

use crate::api;
use crate::auth::verifier::TokenVerifier;
use crate::db::achievement_repository::AchievementRepository;
use crate::db::article_repository::ArticleRepository;
use crate::db::company_repository::CompanyRepository;
use crate::db::interview_repository::InterviewRepository;
use crate::db::project_repository::ProjectRepository;
use crate::db::roadmap_repository::RoadmapRepository;
use crate::db::topic_repository::TopicRepository;
use crate::db::user_repository::UserRepository;
use crate::storage::client::StorageClient;

/// Application state shared across all handlers.
#[derive(Clone)]
pub struct AppState {
    pub achievement_repo: Arc<dyn AchievementRepository>,
    pub company_repo: Arc<dyn CompanyRepository>,
    pub interview_repo: Arc<dyn InterviewRepository>,
    pub project_repo: Arc<dyn ProjectRepository>,
    pub roadmap_repo: Arc<dyn RoadmapRepository>,
    pub topic_repo: Arc<dyn TopicRepository>,
    pub article_repo: Arc<dyn ArticleRepository>,
    pub user_repo: Arc<dyn UserRepository>,
    /// Image storage; uploads answer 503 when absent.
    pub storage_client: Option<Arc<dyn StorageClient>>,
    /// Bearer token verification; every authenticated route answers 401
    /// when absent.
    pub token_verifier: Option<Arc<TokenVerifier>>,
}

async fn health_handler() -> &'static str {
    "ok"
}

/// Build the full API router.
pub fn build_router(state: AppState) -> Router {
    let resources = Router::new()
        .route("/api/achievements", get(api::achievements::list_achievements_handler))
        .route("/api/achievements/{id}", get(api::achievements::get_achievement_handler))
        .route("/api/companies", get(api::companies::list_companies_handler))
        .route("/api/companies/{id}", get(api::companies::get_company_handler))
        .route("/api/interviews", get(api::interviews::list_interviews_handler))
        .route("/api/interviews/{id}", get(api::interviews::get_interview_handler))
        .route("/api/projects", get(api::projects::list_projects_handler))
        .route("/api/projects/{id}", get(api::projects::get_project_handler))
        .route("/api/roadmaps", get(api::roadmaps::list_roadmaps_handler))
        .route("/api/roadmaps/{id}", get(api::roadmaps::get_roadmap_handler))
        .route("/api/roadmaps/{id}/progress", post(api::roadmaps::roadmap_progress_handler))
        .route("/api/certifications", get(api::catalog::list_certifications_handler))
        .route("/api/certified-students", get(api::catalog::certified_students_handler));

    let topics = Router::new()
        .route("/api/topics", get(api::topics::list_topics_handler))
        .route("/api/topics/feed", get(api::topics::feed_handler))
        .route("/api/topics/{slug}/articles", get(api::topics::topic_articles_handler))
        .route(
            "/api/topics/{slug}/articles/{article_slug}",
            get(api::topics::topic_article_handler),
        );

    let authoring = Router::new()
        .route("/api/articles", post(api::articles::create_article_handler))
        .route("/api/articles/my", get(api::articles::my_articles_handler))
        .route(
            "/api/articles/{id}",
            get(api::articles::get_article_handler)
                .patch(api::articles::update_article_handler)
                .delete(api::articles::delete_article_handler),
        )
        .route("/api/articles/{id}/submit", patch(api::articles::submit_article_handler))
        .route("/api/v1/upload-image", post(api::upload::upload_image_handler))
        .route("/api/v1/image/{filename}", get(api::upload::serve_image_handler));

    let admin = Router::new()
        .route("/api/admin/users", get(api::admin::list_users_handler))
        .route("/api/admin/users/{uid}/role", patch(api::admin::set_role_handler))
        .route(
            "/api/admin/topics",
            get(api::admin::list_topics_handler).post(api::admin::create_topic_handler),
        )
        .route(
            "/api/admin/topics/{id}",
            patch(api::admin::update_topic_handler).delete(api::admin::delete_topic_handler),
        )
        .route("/api/admin/articles", get(api::admin::list_articles_handler))
        .route("/api/admin/articles/{id}/status", patch(api::admin::set_status_handler))
        .route("/api/admin/articles/{id}/order", patch(api::admin::set_order_handler));

    Router::new()
        .route("/health", get(health_handler))
        .merge(resources)
        .merge(topics)
        .merge(authoring)
        .merge(admin)
        .layer(
            ServiceBuilder::new()
                .layer(TraceLayer::new_for_http())
                .layer(CorsLayer::permissive()),
        )
        .with_state(state)
}
