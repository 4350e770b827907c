use async_trait::async_trait;
use bson::doc;

use crate::db::models::{Roadmap, RoadmapSummary};
use crate::error::AppError;

/// Repository trait for career roadmaps.
#[async_trait]
pub trait RoadmapRepository: Send + Sync {
    /// List all roadmaps without their steps.
    async fn list_summaries(&self) -> Result<Vec<RoadmapSummary>, AppError>;

    /// Find a roadmap by its public slug (e.g. `SOC_ANALYST`).
    async fn find_by_slug(&self, slug: &str) -> Result<Option<Roadmap>, AppError>;

    /// Create a new roadmap or replace the one with the same slug.
    async fn upsert(&self, roadmap: Roadmap) -> Result<(), AppError>;

    async fn count(&self) -> Result<u64, AppError>;
}

/// MongoDB implementation of the RoadmapRepository.
pub struct MongoRoadmapRepository {
    collection: mongodb::Collection<Roadmap>,
}

impl MongoRoadmapRepository {
    pub fn new(db: &mongodb::Database) -> Self {
        Self {
            collection: db.collection("roadmaps"),
        }
    }
}

#[async_trait]
impl RoadmapRepository for MongoRoadmapRepository {
    async fn list_summaries(&self) -> Result<Vec<RoadmapSummary>, AppError> {
        use futures::TryStreamExt;
        use mongodb::options::FindOptions;

        let options = FindOptions::builder()
            .projection(doc! { "id": 1, "title": 1, "subtitle": 1 })
            .build();

        let cursor = self
            .collection
            .clone_with_type::<RoadmapSummary>()
            .find(doc! {})
            .with_options(options)
            .await?;

        Ok(cursor.try_collect().await?)
    }

    async fn find_by_slug(&self, slug: &str) -> Result<Option<Roadmap>, AppError> {
        Ok(self.collection.find_one(doc! { "id": slug }).await?)
    }

    async fn upsert(&self, mut roadmap: Roadmap) -> Result<(), AppError> {
        use mongodb::options::ReplaceOptions;

        let existing = self.find_by_slug(&roadmap.id).await?;
        let now = chrono::Utc::now();
        roadmap.oid = existing.as_ref().and_then(|r| r.oid);
        roadmap.created_at = existing.map(|r| r.created_at).unwrap_or(now);
        roadmap.updated_at = now;

        let options = ReplaceOptions::builder().upsert(true).build();

        self.collection
            .replace_one(doc! { "id": &roadmap.id }, &roadmap)
            .with_options(options)
            .await?;

        Ok(())
    }

    async fn count(&self) -> Result<u64, AppError> {
        Ok(self.collection.count_documents(doc! {}).await?)
    }
}
