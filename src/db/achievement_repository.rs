use async_trait::async_trait;
use bson::oid::ObjectId;
use bson::{doc, Document};

use crate::db::models::{Achievement, AchievementType};
use crate::error::AppError;

/// Query-string filter for the achievements listing.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct AchievementFilter {
    pub kind: Option<AchievementType>,
}

impl AchievementFilter {
    pub fn to_document(&self) -> Document {
        let mut filter = Document::new();
        if let Some(kind) = self.kind {
            filter.insert("type", kind.as_str());
        }
        filter
    }
}

/// Repository trait for achievements.
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait AchievementRepository: Send + Sync {
    /// List achievements, newest `date` first, then newest record first.
    async fn list(&self, filter: &AchievementFilter) -> Result<Vec<Achievement>, AppError>;

    async fn find_by_id(&self, id: ObjectId) -> Result<Option<Achievement>, AppError>;

    /// Insert a new achievement, stamping its timestamps.
    async fn insert(&self, achievement: Achievement) -> Result<ObjectId, AppError>;

    async fn count(&self) -> Result<u64, AppError>;
}

/// MongoDB implementation of the AchievementRepository.
pub struct MongoAchievementRepository {
    collection: mongodb::Collection<Achievement>,
}

impl MongoAchievementRepository {
    pub fn new(db: &mongodb::Database) -> Self {
        Self {
            collection: db.collection("achievements"),
        }
    }
}

#[async_trait]
impl AchievementRepository for MongoAchievementRepository {
    async fn list(&self, filter: &AchievementFilter) -> Result<Vec<Achievement>, AppError> {
        use futures::TryStreamExt;
        use mongodb::options::FindOptions;

        let options = FindOptions::builder()
            .sort(doc! { "date": -1, "createdAt": -1 })
            .build();

        let cursor = self
            .collection
            .find(filter.to_document())
            .with_options(options)
            .await?;

        Ok(cursor.try_collect().await?)
    }

    async fn find_by_id(&self, id: ObjectId) -> Result<Option<Achievement>, AppError> {
        Ok(self.collection.find_one(doc! { "_id": id }).await?)
    }

    async fn insert(&self, mut achievement: Achievement) -> Result<ObjectId, AppError> {
        let now = chrono::Utc::now();
        achievement.id = None;
        achievement.created_at = now;
        achievement.updated_at = now;

        let result = self.collection.insert_one(&achievement).await?;
        result
            .inserted_id
            .as_object_id()
            .ok_or_else(|| AppError::Database("Inserted id is not an ObjectId".into()))
    }

    async fn count(&self) -> Result<u64, AppError> {
        Ok(self.collection.count_documents(doc! {}).await?)
    }
}
