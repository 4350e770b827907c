use std::collections::HashMap;

use bson::oid::ObjectId;
use serde::Deserialize;
use serde_json::{json, Value};

use crate::api::common::{render, render_all};
use crate::db::article_repository::{ArticleFilter, ArticleOrder, ArticleRepository};
use crate::db::models::{Article, Topic, TopicType};
use crate::db::topic_repository::TopicRepository;
use crate::error::AppError;

/// `?type=` of the topic endpoints.
#[derive(Debug, Default, Deserialize)]
pub struct TopicTypeQuery {
    #[serde(rename = "type")]
    pub kind: Option<String>,
}

/// Parsed `?type=`: absent, a known type, or a value no topic can have.
enum TypeSelector {
    Any,
    Only(TopicType),
    Unknown,
}

impl TopicTypeQuery {
    fn selector(&self) -> TypeSelector {
        match self.kind.as_deref().filter(|k| !k.is_empty()) {
            None => TypeSelector::Any,
            Some(raw) => TopicType::parse(raw).map_or(TypeSelector::Unknown, TypeSelector::Only),
        }
    }
}

/// A published article in the cross-topic feed.
#[derive(Debug, Clone)]
pub struct FeedEntry {
    pub article: Article,
    /// `None` when the article points at a topic that no longer exists.
    pub topic: Option<Topic>,
}

/// Render an article for a listing: everything but `content`.
pub fn render_listing(article: &Article) -> Result<Value, AppError> {
    let mut value = render(article)?;
    if let Value::Object(map) = &mut value {
        map.remove("content");
    }
    Ok(value)
}

fn topic_summary(topic: &Topic) -> Value {
    json!({
        "_id": topic.id.map(|id| id.to_hex()),
        "title": topic.title,
        "slug": topic.slug,
        "type": topic.kind.as_str(),
    })
}

fn render_feed_entry(entry: &FeedEntry) -> Result<Value, AppError> {
    let mut value = render_listing(&entry.article)?;
    if let Value::Object(map) = &mut value {
        map.insert(
            "topicId".to_string(),
            entry.topic.as_ref().map_or(Value::Null, topic_summary),
        );
    }
    Ok(value)
}

pub async fn process_list_topics(
    topic_repo: &dyn TopicRepository,
    query: &TopicTypeQuery,
) -> Result<Vec<Topic>, AppError> {
    match query.selector() {
        TypeSelector::Any => topic_repo.list(None).await,
        TypeSelector::Only(kind) => topic_repo.list(Some(kind)).await,
        TypeSelector::Unknown => Ok(Vec::new()),
    }
}

/// Every published article, newest first, each joined to its topic.
pub async fn process_feed(
    topic_repo: &dyn TopicRepository,
    article_repo: &dyn ArticleRepository,
    query: &TopicTypeQuery,
) -> Result<Vec<FeedEntry>, AppError> {
    let mut filter = ArticleFilter::published();
    match query.selector() {
        TypeSelector::Any => {}
        TypeSelector::Only(kind) => {
            let ids: Vec<ObjectId> = topic_repo
                .list(Some(kind))
                .await?
                .into_iter()
                .filter_map(|t| t.id)
                .collect();
            if ids.is_empty() {
                return Ok(Vec::new());
            }
            filter.topic_ids = Some(ids);
        }
        TypeSelector::Unknown => return Ok(Vec::new()),
    }

    let articles = article_repo.list(&filter, ArticleOrder::Newest).await?;

    let mut topic_ids: Vec<ObjectId> = articles.iter().map(|a| a.topic_id).collect();
    topic_ids.sort();
    topic_ids.dedup();
    let topics: HashMap<ObjectId, Topic> = topic_repo
        .find_many(&topic_ids)
        .await?
        .into_iter()
        .filter_map(|t| t.id.map(|id| (id, t)))
        .collect();

    Ok(articles
        .into_iter()
        .map(|article| FeedEntry {
            topic: topics.get(&article.topic_id).cloned(),
            article,
        })
        .collect())
}

async fn find_topic(topic_repo: &dyn TopicRepository, slug: &str) -> Result<Topic, AppError> {
    topic_repo
        .find_by_slug(slug)
        .await?
        .ok_or_else(|| AppError::NotFound("Topic not found".into()))
}

/// A topic and its published articles, in index order.
pub async fn process_topic_articles(
    topic_repo: &dyn TopicRepository,
    article_repo: &dyn ArticleRepository,
    slug: &str,
) -> Result<(Topic, Vec<Article>), AppError> {
    let topic = find_topic(topic_repo, slug).await?;
    let Some(topic_id) = topic.id else {
        return Ok((topic, Vec::new()));
    };

    let filter = ArticleFilter::published().in_topic(topic_id);
    let articles = article_repo.list(&filter, ArticleOrder::TopicIndex).await?;
    Ok((topic, articles))
}

/// One published article of a topic, with its content.
pub async fn process_topic_article(
    topic_repo: &dyn TopicRepository,
    article_repo: &dyn ArticleRepository,
    topic_slug: &str,
    article_slug: &str,
) -> Result<(Topic, Article), AppError> {
    let topic = find_topic(topic_repo, topic_slug).await?;
    let not_found = || AppError::NotFound("Article not found or not published".into());
    let topic_id = topic.id.ok_or_else(not_found)?;

    let mut filter = ArticleFilter::published().in_topic(topic_id);
    filter.slug = Some(article_slug.to_string());

    let article = article_repo.find_one(&filter).await?.ok_or_else(not_found)?;
    Ok((topic, article))
}

/// Axum handler for `GET /api/topics`.
pub async fn list_topics_handler(
    axum::extract::State(state): axum::extract::State<crate::app::AppState>,
    crate::api::common::ApiQuery(query): crate::api::common::ApiQuery<TopicTypeQuery>,
) -> Result<axum::Json<Value>, AppError> {
    let topics = process_list_topics(state.topic_repo.as_ref(), &query)
        .await
        .map_err(|e| e.or_internal("Failed to fetch topics"))?;
    Ok(axum::Json(json!({ "topics": render_all(&topics)? })))
}

/// Axum handler for `GET /api/topics/feed`.
pub async fn feed_handler(
    axum::extract::State(state): axum::extract::State<crate::app::AppState>,
    crate::api::common::ApiQuery(query): crate::api::common::ApiQuery<TopicTypeQuery>,
) -> Result<axum::Json<Value>, AppError> {
    let entries = process_feed(state.topic_repo.as_ref(), state.article_repo.as_ref(), &query)
        .await
        .map_err(|e| e.or_internal("Failed to fetch feed"))?;
    let articles = entries
        .iter()
        .map(render_feed_entry)
        .collect::<Result<Vec<_>, _>>()?;
    Ok(axum::Json(json!({ "articles": articles })))
}

/// Axum handler for `GET /api/topics/{slug}/articles`.
pub async fn topic_articles_handler(
    axum::extract::State(state): axum::extract::State<crate::app::AppState>,
    axum::extract::Path(slug): axum::extract::Path<String>,
) -> Result<axum::Json<Value>, AppError> {
    let (topic, articles) =
        process_topic_articles(state.topic_repo.as_ref(), state.article_repo.as_ref(), &slug)
            .await
            .map_err(|e| e.or_internal("Failed to fetch articles"))?;
    let articles = articles
        .iter()
        .map(render_listing)
        .collect::<Result<Vec<_>, _>>()?;
    Ok(axum::Json(json!({ "topic": render(&topic)?, "articles": articles })))
}

/// Axum handler for `GET /api/topics/{topicSlug}/articles/{articleSlug}`.
pub async fn topic_article_handler(
    axum::extract::State(state): axum::extract::State<crate::app::AppState>,
    axum::extract::Path((topic_slug, article_slug)): axum::extract::Path<(String, String)>,
) -> Result<axum::Json<Value>, AppError> {
    let (topic, article) = process_topic_article(
        state.topic_repo.as_ref(),
        state.article_repo.as_ref(),
        &topic_slug,
        &article_slug,
    )
    .await
    .map_err(|e| e.or_internal("Failed to fetch article"))?;
    Ok(axum::Json(json!({ "topic": render(&topic)?, "article": render(&article)? })))
}
