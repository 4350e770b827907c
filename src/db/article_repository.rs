use std::cmp::Ordering;

use async_trait::async_trait;
use bson::oid::ObjectId;
use bson::{doc, Document};

use crate::db::models::{Article, ArticleStatus};
use crate::error::AppError;

/// Filter over the `articles` collection. Every set field must match.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ArticleFilter {
    pub status: Option<ArticleStatus>,
    /// Restrict to articles whose topic is one of these ids.
    pub topic_ids: Option<Vec<ObjectId>>,
    pub author_uid: Option<String>,
    pub slug: Option<String>,
}

impl ArticleFilter {
    pub fn published() -> Self {
        Self {
            status: Some(ArticleStatus::Published),
            ..Default::default()
        }
    }

    pub fn in_topic(mut self, topic_id: ObjectId) -> Self {
        self.topic_ids = Some(vec![topic_id]);
        self
    }

    pub fn to_document(&self) -> Document {
        let mut filter = Document::new();
        if let Some(status) = self.status {
            filter.insert("status", status.as_str());
        }
        match self.topic_ids.as_deref() {
            Some([single]) => {
                filter.insert("topicId", *single);
            }
            Some(ids) => {
                filter.insert("topicId", doc! { "$in": ids.to_vec() });
            }
            None => {}
        }
        if let Some(uid) = &self.author_uid {
            filter.insert("authorUid", uid.as_str());
        }
        if let Some(slug) = &self.slug {
            filter.insert("slug", slug.as_str());
        }
        filter
    }

    /// In-process equivalent of [`Self::to_document`].
    pub fn matches(&self, article: &Article) -> bool {
        self.status.map_or(true, |s| article.status == s)
            && self
                .topic_ids
                .as_ref()
                .map_or(true, |ids| ids.contains(&article.topic_id))
            && self
                .author_uid
                .as_ref()
                .map_or(true, |uid| &article.author_uid == uid)
            && self.slug.as_ref().map_or(true, |slug| &article.slug == slug)
    }
}

/// Sort orders used by the article listings.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ArticleOrder {
    /// `publishedAt` descending (the public feed).
    Newest,
    /// `order` ascending, then `publishedAt` descending (a topic's index).
    TopicIndex,
    /// `updatedAt` descending (dashboards).
    RecentlyUpdated,
}

impl ArticleOrder {
    pub fn to_document(self) -> Document {
        match self {
            ArticleOrder::Newest => doc! { "publishedAt": -1 },
            ArticleOrder::TopicIndex => doc! { "order": 1, "publishedAt": -1 },
            ArticleOrder::RecentlyUpdated => doc! { "updatedAt": -1 },
        }
    }

    /// In-process equivalent of [`Self::to_document`]. Missing `publishedAt`
    /// sorts last in descending order, as in MongoDB.
    pub fn compare(self, a: &Article, b: &Article) -> Ordering {
        match self {
            ArticleOrder::Newest => b.published_at.cmp(&a.published_at),
            ArticleOrder::TopicIndex => a
                .order
                .cmp(&b.order)
                .then_with(|| b.published_at.cmp(&a.published_at)),
            ArticleOrder::RecentlyUpdated => b.updated_at.cmp(&a.updated_at),
        }
    }
}

/// Repository trait for articles.
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait ArticleRepository: Send + Sync {
    /// List matching articles. Listings never carry `content`.
    async fn list(&self, filter: &ArticleFilter, order: ArticleOrder) -> Result<Vec<Article>, AppError>;

    /// Find one matching article, with its content.
    async fn find_one(&self, filter: &ArticleFilter) -> Result<Option<Article>, AppError>;

    async fn find_by_id(&self, id: ObjectId) -> Result<Option<Article>, AppError>;

    async fn insert(&self, article: Article) -> Result<ObjectId, AppError>;

    /// Replace a stored article (matched by id), bumping `updatedAt`.
    async fn replace(&self, article: Article) -> Result<Article, AppError>;

    /// Delete an article. Returns `false` when it did not exist.
    async fn delete(&self, id: ObjectId) -> Result<bool, AppError>;

    async fn count(&self, filter: &ArticleFilter) -> Result<u64, AppError>;
}

/// MongoDB implementation of the ArticleRepository.
pub struct MongoArticleRepository {
    collection: mongodb::Collection<Article>,
}

impl MongoArticleRepository {
    pub fn new(db: &mongodb::Database) -> Self {
        Self {
            collection: db.collection("articles"),
        }
    }
}

#[async_trait]
impl ArticleRepository for MongoArticleRepository {
    async fn list(&self, filter: &ArticleFilter, order: ArticleOrder) -> Result<Vec<Article>, AppError> {
        use futures::TryStreamExt;
        use mongodb::options::FindOptions;

        let options = FindOptions::builder()
            .sort(order.to_document())
            .projection(doc! { "content": 0 })
            .build();

        let cursor = self
            .collection
            .find(filter.to_document())
            .with_options(options)
            .await?;

        Ok(cursor.try_collect().await?)
    }

    async fn find_one(&self, filter: &ArticleFilter) -> Result<Option<Article>, AppError> {
        Ok(self.collection.find_one(filter.to_document()).await?)
    }

    async fn find_by_id(&self, id: ObjectId) -> Result<Option<Article>, AppError> {
        Ok(self.collection.find_one(doc! { "_id": id }).await?)
    }

    async fn insert(&self, mut article: Article) -> Result<ObjectId, AppError> {
        let now = chrono::Utc::now();
        article.id = None;
        article.created_at = now;
        article.updated_at = now;

        let result = self.collection.insert_one(&article).await?;
        result
            .inserted_id
            .as_object_id()
            .ok_or_else(|| AppError::Database("Inserted id is not an ObjectId".into()))
    }

    async fn replace(&self, mut article: Article) -> Result<Article, AppError> {
        let id = article
            .id
            .ok_or_else(|| AppError::Internal("Cannot replace an article without an id".into()))?;
        article.updated_at = chrono::Utc::now();

        let result = self.collection.replace_one(doc! { "_id": id }, &article).await?;
        if result.matched_count == 0 {
            return Err(AppError::NotFound("Article not found".into()));
        }

        Ok(article)
    }

    async fn delete(&self, id: ObjectId) -> Result<bool, AppError> {
        let result = self.collection.delete_one(doc! { "_id": id }).await?;
        Ok(result.deleted_count > 0)
    }

    async fn count(&self, filter: &ArticleFilter) -> Result<u64, AppError> {
        Ok(self.collection.count_documents(filter.to_document()).await?)
    }
}
