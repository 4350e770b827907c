use async_trait::async_trait;
use bson::oid::ObjectId;
use bson::{doc, Document};

use crate::db::models::{Topic, TopicType};
use crate::error::AppError;

/// Partial update of a topic. `None` leaves the field untouched.
#[derive(Debug, Clone, Default)]
pub struct TopicUpdate {
    pub title: Option<String>,
    pub description: Option<String>,
    pub order: Option<i32>,
    pub kind: Option<TopicType>,
}

impl TopicUpdate {
    pub fn is_empty(&self) -> bool {
        self.title.is_none() && self.description.is_none() && self.order.is_none() && self.kind.is_none()
    }

    /// Build the `$set` document, always bumping `updatedAt`.
    pub fn to_set_document(&self) -> Document {
        let mut set = doc! { "updatedAt": bson::DateTime::now() };
        if let Some(title) = &self.title {
            set.insert("title", title.as_str());
        }
        if let Some(description) = &self.description {
            set.insert("description", description.as_str());
        }
        if let Some(order) = self.order {
            set.insert("order", order);
        }
        if let Some(kind) = self.kind {
            set.insert("type", kind.as_str());
        }
        set
    }
}

/// Repository trait for article topics.
#[async_trait]
pub trait TopicRepository: Send + Sync {
    /// List topics by `order`, then creation time. `kind` narrows to one type.
    async fn list(&self, kind: Option<TopicType>) -> Result<Vec<Topic>, AppError>;

    async fn find_by_slug(&self, slug: &str) -> Result<Option<Topic>, AppError>;

    async fn find_by_id(&self, id: ObjectId) -> Result<Option<Topic>, AppError>;

    /// Find several topics at once (used to join articles to their topic).
    async fn find_many(&self, ids: &[ObjectId]) -> Result<Vec<Topic>, AppError>;

    async fn insert(&self, topic: Topic) -> Result<ObjectId, AppError>;

    /// Apply a partial update and return the updated topic, if it exists.
    async fn update(&self, id: ObjectId, update: TopicUpdate) -> Result<Option<Topic>, AppError>;

    /// Delete a topic. Returns `false` when it did not exist.
    async fn delete(&self, id: ObjectId) -> Result<bool, AppError>;

    async fn count(&self) -> Result<u64, AppError>;
}

/// MongoDB implementation of the TopicRepository.
pub struct MongoTopicRepository {
    collection: mongodb::Collection<Topic>,
}

impl MongoTopicRepository {
    pub fn new(db: &mongodb::Database) -> Self {
        Self {
            collection: db.collection("topics"),
        }
    }
}

#[async_trait]
impl TopicRepository for MongoTopicRepository {
    async fn list(&self, kind: Option<TopicType>) -> Result<Vec<Topic>, AppError> {
        use futures::TryStreamExt;
        use mongodb::options::FindOptions;

        let filter = match kind {
            Some(kind) => doc! { "type": kind.as_str() },
            None => doc! {},
        };
        let options = FindOptions::builder()
            .sort(doc! { "order": 1, "createdAt": 1 })
            .build();

        let cursor = self.collection.find(filter).with_options(options).await?;
        Ok(cursor.try_collect().await?)
    }

    async fn find_by_slug(&self, slug: &str) -> Result<Option<Topic>, AppError> {
        Ok(self.collection.find_one(doc! { "slug": slug }).await?)
    }

    async fn find_by_id(&self, id: ObjectId) -> Result<Option<Topic>, AppError> {
        Ok(self.collection.find_one(doc! { "_id": id }).await?)
    }

    async fn find_many(&self, ids: &[ObjectId]) -> Result<Vec<Topic>, AppError> {
        use futures::TryStreamExt;

        if ids.is_empty() {
            return Ok(Vec::new());
        }
        let cursor = self.collection.find(doc! { "_id": { "$in": ids.to_vec() } }).await?;
        Ok(cursor.try_collect().await?)
    }

    async fn insert(&self, mut topic: Topic) -> Result<ObjectId, AppError> {
        let now = chrono::Utc::now();
        topic.id = None;
        topic.created_at = now;
        topic.updated_at = now;

        let result = self.collection.insert_one(&topic).await?;
        result
            .inserted_id
            .as_object_id()
            .ok_or_else(|| AppError::Database("Inserted id is not an ObjectId".into()))
    }

    async fn update(&self, id: ObjectId, update: TopicUpdate) -> Result<Option<Topic>, AppError> {
        use mongodb::options::{FindOneAndUpdateOptions, ReturnDocument};

        let options = FindOneAndUpdateOptions::builder()
            .return_document(ReturnDocument::After)
            .build();

        Ok(self
            .collection
            .find_one_and_update(doc! { "_id": id }, doc! { "$set": update.to_set_document() })
            .with_options(options)
            .await?)
    }

    async fn delete(&self, id: ObjectId) -> Result<bool, AppError> {
        let result = self.collection.delete_one(doc! { "_id": id }).await?;
        Ok(result.deleted_count > 0)
    }

    async fn count(&self) -> Result<u64, AppError> {
        Ok(self.collection.count_documents(doc! {}).await?)
    }
}
