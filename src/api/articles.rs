use std::collections::HashSet;

use bson::oid::ObjectId;
use chrono::Utc;
use serde::Deserialize;
use serde_json::{json, Value};

use crate::api::common::{parse_object_id, render};
use crate::api::topics::render_listing;
use crate::auth::models::{AuthenticatedUser, Role};
use crate::db::article_repository::{ArticleFilter, ArticleOrder, ArticleRepository};
use crate::db::models::{Article, ArticleStatus};
use crate::db::topic_repository::TopicRepository;
use crate::error::AppError;
use crate::models::slug::{slugify, unique_slug};

/// Body of `POST /api/articles`.
#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CreateArticleRequest {
    pub title: String,
    pub topic_id: String,
    #[serde(default)]
    pub content: String,
    pub cover_image: Option<String>,
    #[serde(default)]
    pub tags: Vec<String>,
}

/// Body of `PATCH /api/articles/{id}`. Absent fields are left untouched.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct UpdateArticleRequest {
    pub title: Option<String>,
    pub topic_id: Option<String>,
    pub content: Option<String>,
    pub cover_image: Option<String>,
    pub tags: Option<Vec<String>>,
}

/// Resolve a topic id from a request body. Unlike path ids, a bad reference
/// here is the caller's mistake.
async fn resolve_topic(topic_repo: &dyn TopicRepository, raw: &str) -> Result<ObjectId, AppError> {
    let invalid = || AppError::BadRequest(format!("Topic '{raw}' does not exist"));
    let id = ObjectId::parse_str(raw).map_err(|_| invalid())?;
    topic_repo.find_by_id(id).await?.ok_or_else(invalid)?;
    Ok(id)
}

/// Slug for `title` that no other article of `topic_id` uses.
async fn free_slug(
    article_repo: &dyn ArticleRepository,
    topic_id: ObjectId,
    title: &str,
    exclude: Option<ObjectId>,
) -> Result<String, AppError> {
    let base = slugify(title);
    if base.is_empty() {
        return Err(AppError::BadRequest("Title must contain letters or digits".into()));
    }

    let filter = ArticleFilter::default().in_topic(topic_id);
    let taken: HashSet<String> = article_repo
        .list(&filter, ArticleOrder::RecentlyUpdated)
        .await?
        .into_iter()
        .filter(|a| exclude.is_none() || a.id != exclude)
        .map(|a| a.slug)
        .collect();

    Ok(unique_slug(&base, |candidate| taken.contains(candidate)))
}

/// Load an article the caller owns.
async fn load_owned(
    article_repo: &dyn ArticleRepository,
    user: &AuthenticatedUser,
    id: &str,
) -> Result<Article, AppError> {
    let oid = parse_object_id(id, "Article")?;
    let article = article_repo
        .find_by_id(oid)
        .await?
        .ok_or_else(|| AppError::NotFound("Article not found".into()))?;

    if article.author_uid != user.uid {
        return Err(AppError::Forbidden("You are not the author of this article".into()));
    }
    Ok(article)
}

pub async fn process_my_articles(
    article_repo: &dyn ArticleRepository,
    user: &AuthenticatedUser,
) -> Result<Vec<Article>, AppError> {
    user.require(Role::Author)?;
    let filter = ArticleFilter {
        author_uid: Some(user.uid.clone()),
        ..Default::default()
    };
    article_repo.list(&filter, ArticleOrder::RecentlyUpdated).await
}

pub async fn process_create_article(
    topic_repo: &dyn TopicRepository,
    article_repo: &dyn ArticleRepository,
    user: &AuthenticatedUser,
    request: CreateArticleRequest,
) -> Result<Article, AppError> {
    user.require(Role::Author)?;

    let title = request.title.trim();
    if title.is_empty() {
        return Err(AppError::BadRequest("Title cannot be empty".into()));
    }
    let topic_id = resolve_topic(topic_repo, &request.topic_id).await?;
    let slug = free_slug(article_repo, topic_id, title, None).await?;

    let now = Utc::now();
    let mut article = Article {
        id: None,
        title: title.to_string(),
        slug,
        topic_id,
        content: request.content,
        cover_image: request.cover_image.filter(|c| !c.is_empty()),
        author_uid: user.uid.clone(),
        author_name: user.byline(),
        status: ArticleStatus::Draft,
        rejection_reason: None,
        order: 0,
        tags: request.tags,
        created_at: now,
        updated_at: now,
        published_at: None,
    };

    let id = article_repo.insert(article.clone()).await?;
    article.id = Some(id);

    tracing::info!(article = %id, author = %user.uid, "Draft article created");
    Ok(article)
}

/// Read an article for editing. Admins may read any article.
pub async fn process_get_article(
    article_repo: &dyn ArticleRepository,
    user: &AuthenticatedUser,
    id: &str,
) -> Result<Article, AppError> {
    user.require(Role::Author)?;
    if user.role.has_access(Role::Admin) {
        let oid = parse_object_id(id, "Article")?;
        return article_repo
            .find_by_id(oid)
            .await?
            .ok_or_else(|| AppError::NotFound("Article not found".into()));
    }
    load_owned(article_repo, user, id).await
}

pub async fn process_update_article(
    topic_repo: &dyn TopicRepository,
    article_repo: &dyn ArticleRepository,
    user: &AuthenticatedUser,
    id: &str,
    request: UpdateArticleRequest,
) -> Result<Article, AppError> {
    user.require(Role::Author)?;
    let mut article = load_owned(article_repo, user, id).await?;

    if !article.status.is_editable() {
        return Err(AppError::BadRequest(format!(
            "Articles that are {} cannot be edited",
            article.status.as_str()
        )));
    }

    if let Some(title) = request.title {
        let title = title.trim();
        if title.is_empty() {
            return Err(AppError::BadRequest("Title cannot be empty".into()));
        }
        article.title = title.to_string();
    }
    if let Some(raw) = request.topic_id {
        let topic_id = resolve_topic(topic_repo, &raw).await?;
        if topic_id != article.topic_id {
            // Keep the slug, unless it collides in the new topic.
            let taken_in_target = article_repo
                .find_one(&ArticleFilter {
                    slug: Some(article.slug.clone()),
                    ..ArticleFilter::default().in_topic(topic_id)
                })
                .await?
                .is_some();
            if taken_in_target {
                article.slug = free_slug(article_repo, topic_id, &article.slug, article.id).await?;
            }
            article.topic_id = topic_id;
        }
    }
    if let Some(content) = request.content {
        article.content = content;
    }
    if let Some(cover) = request.cover_image {
        article.cover_image = Some(cover).filter(|c| !c.is_empty());
    }
    if let Some(tags) = request.tags {
        article.tags = tags;
    }

    if article.status == ArticleStatus::Rejected {
        article.status = ArticleStatus::Draft;
        article.rejection_reason = None;
    }

    article_repo.replace(article).await
}

pub async fn process_delete_article(
    article_repo: &dyn ArticleRepository,
    user: &AuthenticatedUser,
    id: &str,
) -> Result<(), AppError> {
    user.require(Role::Author)?;
    let oid = parse_object_id(id, "Article")?;
    let article = article_repo
        .find_by_id(oid)
        .await?
        .ok_or_else(|| AppError::NotFound("Article not found".into()))?;

    let is_admin = user.role.has_access(Role::Admin);
    if !is_admin {
        if article.author_uid != user.uid {
            return Err(AppError::Forbidden("You are not the author of this article".into()));
        }
        if article.status == ArticleStatus::Published {
            return Err(AppError::Forbidden(
                "Published articles can only be removed by an admin".into(),
            ));
        }
    }

    if !article_repo.delete(oid).await? {
        return Err(AppError::NotFound("Article not found".into()));
    }
    tracing::info!(article = %oid, by = %user.uid, "Article deleted");
    Ok(())
}

pub async fn process_submit_article(
    article_repo: &dyn ArticleRepository,
    user: &AuthenticatedUser,
    id: &str,
) -> Result<Article, AppError> {
    user.require(Role::Author)?;
    let mut article = load_owned(article_repo, user, id).await?;

    if !article.status.can_transition_to(ArticleStatus::Pending) {
        return Err(AppError::BadRequest(format!(
            "Cannot submit an article that is {}",
            article.status.as_str()
        )));
    }
    article.status = ArticleStatus::Pending;
    article.rejection_reason = None;

    article_repo.replace(article).await
}

/// Axum handler for `GET /api/articles/my`.
pub async fn my_articles_handler(
    axum::extract::State(state): axum::extract::State<crate::app::AppState>,
    user: AuthenticatedUser,
) -> Result<axum::Json<Value>, AppError> {
    let articles = process_my_articles(state.article_repo.as_ref(), &user)
        .await
        .map_err(|e| e.or_internal("Failed to fetch articles"))?;
    let articles = articles
        .iter()
        .map(render_listing)
        .collect::<Result<Vec<_>, _>>()?;
    Ok(axum::Json(json!({ "articles": articles })))
}

/// Axum handler for `POST /api/articles`.
pub async fn create_article_handler(
    axum::extract::State(state): axum::extract::State<crate::app::AppState>,
    user: AuthenticatedUser,
    crate::api::common::ApiJson(request): crate::api::common::ApiJson<CreateArticleRequest>,
) -> Result<(axum::http::StatusCode, axum::Json<Value>), AppError> {
    let article = process_create_article(
        state.topic_repo.as_ref(),
        state.article_repo.as_ref(),
        &user,
        request,
    )
    .await
    .map_err(|e| e.or_internal("Failed to create article"))?;
    Ok((
        axum::http::StatusCode::CREATED,
        axum::Json(json!({ "article": render(&article)? })),
    ))
}

/// Axum handler for `GET /api/articles/{id}`.
pub async fn get_article_handler(
    axum::extract::State(state): axum::extract::State<crate::app::AppState>,
    user: AuthenticatedUser,
    axum::extract::Path(id): axum::extract::Path<String>,
) -> Result<axum::Json<Value>, AppError> {
    let article = process_get_article(state.article_repo.as_ref(), &user, &id)
        .await
        .map_err(|e| e.or_internal("Failed to fetch article"))?;
    Ok(axum::Json(json!({ "article": render(&article)? })))
}

/// Axum handler for `PATCH /api/articles/{id}`.
pub async fn update_article_handler(
    axum::extract::State(state): axum::extract::State<crate::app::AppState>,
    user: AuthenticatedUser,
    axum::extract::Path(id): axum::extract::Path<String>,
    crate::api::common::ApiJson(request): crate::api::common::ApiJson<UpdateArticleRequest>,
) -> Result<axum::Json<Value>, AppError> {
    let article = process_update_article(
        state.topic_repo.as_ref(),
        state.article_repo.as_ref(),
        &user,
        &id,
        request,
    )
    .await
    .map_err(|e| e.or_internal("Failed to update article"))?;
    Ok(axum::Json(json!({ "article": render(&article)? })))
}

/// Axum handler for `DELETE /api/articles/{id}`.
pub async fn delete_article_handler(
    axum::extract::State(state): axum::extract::State<crate::app::AppState>,
    user: AuthenticatedUser,
    axum::extract::Path(id): axum::extract::Path<String>,
) -> Result<axum::Json<Value>, AppError> {
    process_delete_article(state.article_repo.as_ref(), &user, &id)
        .await
        .map_err(|e| e.or_internal("Failed to delete article"))?;
    Ok(axum::Json(json!({ "message": "Article deleted" })))
}

/// Axum handler for `PATCH /api/articles/{id}/submit`.
pub async fn submit_article_handler(
    axum::extract::State(state): axum::extract::State<crate::app::AppState>,
    user: AuthenticatedUser,
    axum::extract::Path(id): axum::extract::Path<String>,
) -> Result<axum::Json<Value>, AppError> {
    let article = process_submit_article(state.article_repo.as_ref(), &user, &id)
        .await
        .map_err(|e| e.or_internal("Failed to submit article"))?;
    Ok(axum::Json(json!({ "article": render(&article)? })))
}
