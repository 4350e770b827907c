//! Moderation endpoints. Every operation requires the `admin` role.

use chrono::Utc;
use serde::Deserialize;
use serde_json::{json, Value};

use crate::api::common::{parse_object_id, render, render_all};
use crate::api::topics::render_listing;
use crate::auth::models::{AuthenticatedUser, Role, User};
use crate::db::article_repository::{ArticleFilter, ArticleOrder, ArticleRepository};
use crate::db::models::{Article, ArticleStatus, Topic, TopicType};
use crate::db::topic_repository::{TopicRepository, TopicUpdate};
use crate::db::user_repository::UserRepository;
use crate::error::AppError;
use crate::models::slug::slugify;

#[derive(Debug, Clone, Deserialize)]
pub struct SetRoleRequest {
    pub role: String,
}

#[derive(Debug, Clone, Deserialize)]
pub struct CreateTopicRequest {
    pub title: String,
    pub description: Option<String>,
    #[serde(rename = "type")]
    pub kind: Option<String>,
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct UpdateTopicRequest {
    pub title: Option<String>,
    pub description: Option<String>,
    pub order: Option<i32>,
    #[serde(rename = "type")]
    pub kind: Option<String>,
}

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AdminArticleQuery {
    pub status: Option<String>,
    pub topic_id: Option<String>,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SetStatusRequest {
    pub status: String,
    pub rejection_reason: Option<String>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct SetOrderRequest {
    pub order: i32,
}

fn parse_topic_type(raw: &str) -> Result<TopicType, AppError> {
    TopicType::parse(raw).ok_or_else(|| {
        AppError::BadRequest(format!("Invalid topic type '{raw}'. Expected: ctf, blog, experiment"))
    })
}

async fn load_article(article_repo: &dyn ArticleRepository, id: &str) -> Result<Article, AppError> {
    let oid = parse_object_id(id, "Article")?;
    article_repo
        .find_by_id(oid)
        .await?
        .ok_or_else(|| AppError::NotFound("Article not found".into()))
}

pub async fn process_list_users(
    user_repo: &dyn UserRepository,
    admin: &AuthenticatedUser,
) -> Result<Vec<User>, AppError> {
    admin.require(Role::Admin)?;
    user_repo.list_all().await
}

pub async fn process_set_role(
    user_repo: &dyn UserRepository,
    admin: &AuthenticatedUser,
    uid: &str,
    request: SetRoleRequest,
) -> Result<User, AppError> {
    admin.require(Role::Admin)?;
    let role = Role::from_str_ci(&request.role).ok_or_else(|| {
        AppError::BadRequest(format!(
            "Invalid role '{}'. Expected: student, author, admin",
            request.role
        ))
    })?;

    let user = user_repo
        .set_role(uid, role)
        .await?
        .ok_or_else(|| AppError::NotFound("User not found".into()))?;

    tracing::info!(uid = %uid, role = %role, by = %admin.uid, "User role changed");
    Ok(user)
}

pub async fn process_list_topics(
    topic_repo: &dyn TopicRepository,
    admin: &AuthenticatedUser,
) -> Result<Vec<Topic>, AppError> {
    admin.require(Role::Admin)?;
    topic_repo.list(None).await
}

pub async fn process_create_topic(
    topic_repo: &dyn TopicRepository,
    admin: &AuthenticatedUser,
    request: CreateTopicRequest,
) -> Result<Topic, AppError> {
    admin.require(Role::Admin)?;

    let title = request.title.trim();
    let slug = slugify(title);
    if slug.is_empty() {
        return Err(AppError::BadRequest("Title must contain letters or digits".into()));
    }
    if topic_repo.find_by_slug(&slug).await?.is_some() {
        return Err(AppError::Conflict(format!("A topic with slug '{slug}' already exists")));
    }
    let kind = match request.kind.as_deref() {
        None | Some("") => TopicType::default(),
        Some(raw) => parse_topic_type(raw)?,
    };
    let order = i32::try_from(topic_repo.count().await?).unwrap_or(i32::MAX);

    let now = Utc::now();
    let mut topic = Topic {
        id: None,
        title: title.to_string(),
        slug,
        description: request.description.filter(|d| !d.is_empty()),
        kind,
        order,
        created_by: admin.uid.clone(),
        created_at: now,
        updated_at: now,
    };
    topic.id = Some(topic_repo.insert(topic.clone()).await?);

    tracing::info!(slug = %topic.slug, by = %admin.uid, "Topic created");
    Ok(topic)
}

pub async fn process_update_topic(
    topic_repo: &dyn TopicRepository,
    admin: &AuthenticatedUser,
    id: &str,
    request: UpdateTopicRequest,
) -> Result<Topic, AppError> {
    admin.require(Role::Admin)?;
    let oid = parse_object_id(id, "Topic")?;

    let update = TopicUpdate {
        title: request.title.map(|t| t.trim().to_string()),
        description: request.description,
        order: request.order,
        kind: request.kind.as_deref().map(parse_topic_type).transpose()?,
    };
    if update.is_empty() {
        return Err(AppError::BadRequest("Nothing to update".into()));
    }
    if update.title.as_deref() == Some("") {
        return Err(AppError::BadRequest("Title cannot be empty".into()));
    }

    topic_repo
        .update(oid, update)
        .await?
        .ok_or_else(|| AppError::NotFound("Topic not found".into()))
}

pub async fn process_delete_topic(
    topic_repo: &dyn TopicRepository,
    article_repo: &dyn ArticleRepository,
    admin: &AuthenticatedUser,
    id: &str,
) -> Result<(), AppError> {
    admin.require(Role::Admin)?;
    let oid = parse_object_id(id, "Topic")?;

    let referencing = article_repo.count(&ArticleFilter::default().in_topic(oid)).await?;
    if referencing > 0 {
        return Err(AppError::Conflict(format!(
            "Topic still has {referencing} article(s); move or delete them first"
        )));
    }
    if !topic_repo.delete(oid).await? {
        return Err(AppError::NotFound("Topic not found".into()));
    }

    tracing::info!(topic = %oid, by = %admin.uid, "Topic deleted");
    Ok(())
}

pub async fn process_list_articles(
    article_repo: &dyn ArticleRepository,
    admin: &AuthenticatedUser,
    query: &AdminArticleQuery,
) -> Result<Vec<Article>, AppError> {
    admin.require(Role::Admin)?;

    let mut filter = ArticleFilter::default();
    if let Some(raw) = query.status.as_deref().filter(|s| !s.is_empty()) {
        filter.status = Some(
            ArticleStatus::parse(raw)
                .ok_or_else(|| AppError::BadRequest(format!("Invalid status '{raw}'")))?,
        );
    }
    if let Some(raw) = query.topic_id.as_deref().filter(|s| !s.is_empty()) {
        let topic_id = bson::oid::ObjectId::parse_str(raw)
            .map_err(|_| AppError::BadRequest(format!("Invalid topicId '{raw}'")))?;
        filter = filter.in_topic(topic_id);
    }

    article_repo.list(&filter, ArticleOrder::RecentlyUpdated).await
}

pub async fn process_set_status(
    article_repo: &dyn ArticleRepository,
    admin: &AuthenticatedUser,
    id: &str,
    request: SetStatusRequest,
) -> Result<Article, AppError> {
    admin.require(Role::Admin)?;
    let next = ArticleStatus::parse(&request.status)
        .ok_or_else(|| AppError::BadRequest(format!("Invalid status '{}'", request.status)))?;
    let mut article = load_article(article_repo, id).await?;

    if !article.status.can_transition_to(next) {
        return Err(AppError::BadRequest(format!(
            "Cannot move an article from {} to {}",
            article.status.as_str(),
            next.as_str()
        )));
    }

    if next == ArticleStatus::Rejected {
        let reason = request
            .rejection_reason
            .map(|r| r.trim().to_string())
            .filter(|r| !r.is_empty())
            .ok_or_else(|| AppError::BadRequest("A rejection reason is required".into()))?;
        article.rejection_reason = Some(reason);
    } else {
        article.rejection_reason = None;
    }
    if next == ArticleStatus::Published && article.published_at.is_none() {
        article.published_at = Some(Utc::now());
    }

    let from = article.status;
    article.status = next;
    let article = article_repo.replace(article).await?;

    tracing::info!(
        article = %id,
        from = from.as_str(),
        to = next.as_str(),
        by = %admin.uid,
        "Article status changed"
    );
    Ok(article)
}

pub async fn process_set_order(
    article_repo: &dyn ArticleRepository,
    admin: &AuthenticatedUser,
    id: &str,
    request: SetOrderRequest,
) -> Result<Article, AppError> {
    admin.require(Role::Admin)?;
    let mut article = load_article(article_repo, id).await?;
    article.order = request.order;
    article_repo.replace(article).await
}

fn render_listings(articles: &[Article]) -> Result<Vec<Value>, AppError> {
    articles.iter().map(render_listing).collect()
}

/// Axum handler for `GET /api/admin/users`.
pub async fn list_users_handler(
    axum::extract::State(state): axum::extract::State<crate::app::AppState>,
    admin: AuthenticatedUser,
) -> Result<axum::Json<Value>, AppError> {
    let users = process_list_users(state.user_repo.as_ref(), &admin)
        .await
        .map_err(|e| e.or_internal("Failed to fetch users"))?;
    Ok(axum::Json(json!({ "users": render_all(&users)? })))
}

/// Axum handler for `PATCH /api/admin/users/{uid}/role`.
pub async fn set_role_handler(
    axum::extract::State(state): axum::extract::State<crate::app::AppState>,
    admin: AuthenticatedUser,
    axum::extract::Path(uid): axum::extract::Path<String>,
    crate::api::common::ApiJson(request): crate::api::common::ApiJson<SetRoleRequest>,
) -> Result<axum::Json<Value>, AppError> {
    let user = process_set_role(state.user_repo.as_ref(), &admin, &uid, request)
        .await
        .map_err(|e| e.or_internal("Failed to update role"))?;
    Ok(axum::Json(json!({ "user": render(&user)? })))
}

/// Axum handler for `GET /api/admin/topics`.
pub async fn list_topics_handler(
    axum::extract::State(state): axum::extract::State<crate::app::AppState>,
    admin: AuthenticatedUser,
) -> Result<axum::Json<Value>, AppError> {
    let topics = process_list_topics(state.topic_repo.as_ref(), &admin)
        .await
        .map_err(|e| e.or_internal("Failed to fetch topics"))?;
    Ok(axum::Json(json!({ "topics": render_all(&topics)? })))
}

/// Axum handler for `POST /api/admin/topics`.
pub async fn create_topic_handler(
    axum::extract::State(state): axum::extract::State<crate::app::AppState>,
    admin: AuthenticatedUser,
    crate::api::common::ApiJson(request): crate::api::common::ApiJson<CreateTopicRequest>,
) -> Result<(axum::http::StatusCode, axum::Json<Value>), AppError> {
    let topic = process_create_topic(state.topic_repo.as_ref(), &admin, request)
        .await
        .map_err(|e| e.or_internal("Failed to create topic"))?;
    Ok((
        axum::http::StatusCode::CREATED,
        axum::Json(json!({ "topic": render(&topic)? })),
    ))
}

/// Axum handler for `PATCH /api/admin/topics/{id}`.
pub async fn update_topic_handler(
    axum::extract::State(state): axum::extract::State<crate::app::AppState>,
    admin: AuthenticatedUser,
    axum::extract::Path(id): axum::extract::Path<String>,
    crate::api::common::ApiJson(request): crate::api::common::ApiJson<UpdateTopicRequest>,
) -> Result<axum::Json<Value>, AppError> {
    let topic = process_update_topic(state.topic_repo.as_ref(), &admin, &id, request)
        .await
        .map_err(|e| e.or_internal("Failed to update topic"))?;
    Ok(axum::Json(json!({ "topic": render(&topic)? })))
}

/// Axum handler for `DELETE /api/admin/topics/{id}`.
pub async fn delete_topic_handler(
    axum::extract::State(state): axum::extract::State<crate::app::AppState>,
    admin: AuthenticatedUser,
    axum::extract::Path(id): axum::extract::Path<String>,
) -> Result<axum::Json<Value>, AppError> {
    process_delete_topic(state.topic_repo.as_ref(), state.article_repo.as_ref(), &admin, &id)
        .await
        .map_err(|e| e.or_internal("Failed to delete topic"))?;
    Ok(axum::Json(json!({ "message": "Topic deleted" })))
}

/// Axum handler for `GET /api/admin/articles`.
pub async fn list_articles_handler(
    axum::extract::State(state): axum::extract::State<crate::app::AppState>,
    admin: AuthenticatedUser,
    crate::api::common::ApiQuery(query): crate::api::common::ApiQuery<AdminArticleQuery>,
) -> Result<axum::Json<Value>, AppError> {
    let articles = process_list_articles(state.article_repo.as_ref(), &admin, &query)
        .await
        .map_err(|e| e.or_internal("Failed to fetch articles"))?;
    Ok(axum::Json(json!({ "articles": render_listings(&articles)? })))
}

/// Axum handler for `PATCH /api/admin/articles/{id}/status`.
pub async fn set_status_handler(
    axum::extract::State(state): axum::extract::State<crate::app::AppState>,
    admin: AuthenticatedUser,
    axum::extract::Path(id): axum::extract::Path<String>,
    crate::api::common::ApiJson(request): crate::api::common::ApiJson<SetStatusRequest>,
) -> Result<axum::Json<Value>, AppError> {
    let article = process_set_status(state.article_repo.as_ref(), &admin, &id, request)
        .await
        .map_err(|e| e.or_internal("Failed to update article status"))?;
    Ok(axum::Json(json!({ "article": render(&article)? })))
}

/// Axum handler for `PATCH /api/admin/articles/{id}/order`.
pub async fn set_order_handler(
    axum::extract::State(state): axum::extract::State<crate::app::AppState>,
    admin: AuthenticatedUser,
    axum::extract::Path(id): axum::extract::Path<String>,
    crate::api::common::ApiJson(request): crate::api::common::ApiJson<SetOrderRequest>,
) -> Result<axum::Json<Value>, AppError> {
    let article = process_set_order(state.article_repo.as_ref(), &admin, &id, request)
        .await
        .map_err(|e| e.or_internal("Failed to update article order"))?;
    Ok(axum::Json(json!({ "article": render(&article)? })))
}
