use async_trait::async_trait;
use bson::oid::ObjectId;
use bson::{doc, Document};

use crate::db::models::Project;
use crate::error::AppError;

/// Query-string filter for the project showcase.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ProjectFilter {
    pub featured_only: bool,
    /// Matches when the value is one of the project's categories.
    pub category: Option<String>,
}

impl ProjectFilter {
    pub fn to_document(&self) -> Document {
        let mut filter = Document::new();
        if self.featured_only {
            filter.insert("featured", true);
        }
        if let Some(category) = &self.category {
            filter.insert("categories", category.as_str());
        }
        filter
    }
}

/// Repository trait for projects.
#[async_trait]
pub trait ProjectRepository: Send + Sync {
    /// List projects, featured first, then newest first.
    async fn list(&self, filter: &ProjectFilter) -> Result<Vec<Project>, AppError>;

    async fn find_by_id(&self, id: ObjectId) -> Result<Option<Project>, AppError>;

    async fn insert(&self, project: Project) -> Result<ObjectId, AppError>;

    async fn count(&self) -> Result<u64, AppError>;
}

/// MongoDB implementation of the ProjectRepository.
pub struct MongoProjectRepository {
    collection: mongodb::Collection<Project>,
}

impl MongoProjectRepository {
    pub fn new(db: &mongodb::Database) -> Self {
        Self {
            collection: db.collection("projects"),
        }
    }
}

#[async_trait]
impl ProjectRepository for MongoProjectRepository {
    async fn list(&self, filter: &ProjectFilter) -> Result<Vec<Project>, AppError> {
        use futures::TryStreamExt;
        use mongodb::options::FindOptions;

        let options = FindOptions::builder()
            .sort(doc! { "featured": -1, "createdAt": -1 })
            .build();

        let cursor = self
            .collection
            .find(filter.to_document())
            .with_options(options)
            .await?;

        Ok(cursor.try_collect().await?)
    }

    async fn find_by_id(&self, id: ObjectId) -> Result<Option<Project>, AppError> {
        Ok(self.collection.find_one(doc! { "_id": id }).await?)
    }

    async fn insert(&self, mut project: Project) -> Result<ObjectId, AppError> {
        let now = chrono::Utc::now();
        project.id = None;
        project.created_at = now;
        project.updated_at = now;

        let result = self.collection.insert_one(&project).await?;
        result
            .inserted_id
            .as_object_id()
            .ok_or_else(|| AppError::Database("Inserted id is not an ObjectId".into()))
    }

    async fn count(&self) -> Result<u64, AppError> {
        Ok(self.collection.count_documents(doc! {}).await?)
    }
}
