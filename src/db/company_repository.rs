use async_trait::async_trait;
use bson::oid::ObjectId;
use bson::{doc, Document};

use crate::db::models::Company;
use crate::error::AppError;

/// Database-side filter for the company directory.
///
/// Free-text search and the CTC threshold are applied afterwards by
/// [`crate::models::company_query::CompanyQuery`].
#[derive(Debug, Clone, Default, PartialEq)]
pub struct CompanyFilter {
    pub industry: Option<String>,
    /// Matches when the value is one of the company's opportunity types.
    pub opportunity_type: Option<String>,
}

impl CompanyFilter {
    pub fn to_document(&self) -> Document {
        let mut filter = Document::new();
        if let Some(industry) = &self.industry {
            filter.insert("industry", industry.as_str());
        }
        if let Some(opportunity) = &self.opportunity_type {
            // Equality against an array field matches any element.
            filter.insert("opportunityType", opportunity.as_str());
        }
        filter
    }
}

/// Repository trait for the company directory.
#[async_trait]
pub trait CompanyRepository: Send + Sync {
    /// List companies alphabetically by name.
    async fn list(&self, filter: &CompanyFilter) -> Result<Vec<Company>, AppError>;

    async fn find_by_id(&self, id: ObjectId) -> Result<Option<Company>, AppError>;

    async fn insert(&self, company: Company) -> Result<ObjectId, AppError>;

    async fn count(&self) -> Result<u64, AppError>;
}

/// MongoDB implementation of the CompanyRepository.
pub struct MongoCompanyRepository {
    collection: mongodb::Collection<Company>,
}

impl MongoCompanyRepository {
    pub fn new(db: &mongodb::Database) -> Self {
        Self {
            collection: db.collection("companies"),
        }
    }
}

#[async_trait]
impl CompanyRepository for MongoCompanyRepository {
    async fn list(&self, filter: &CompanyFilter) -> Result<Vec<Company>, AppError> {
        use futures::TryStreamExt;
        use mongodb::options::FindOptions;

        let options = FindOptions::builder()
            .sort(doc! { "companyName": 1 })
            .build();

        let cursor = self
            .collection
            .find(filter.to_document())
            .with_options(options)
            .await?;

        Ok(cursor.try_collect().await?)
    }

    async fn find_by_id(&self, id: ObjectId) -> Result<Option<Company>, AppError> {
        Ok(self.collection.find_one(doc! { "_id": id }).await?)
    }

    async fn insert(&self, mut company: Company) -> Result<ObjectId, AppError> {
        let now = chrono::Utc::now();
        company.id = None;
        company.created_at = now;
        company.updated_at = now;

        let result = self.collection.insert_one(&company).await?;
        result
            .inserted_id
            .as_object_id()
            .ok_or_else(|| AppError::Database("Inserted id is not an ObjectId".into()))
    }

    async fn count(&self) -> Result<u64, AppError> {
        Ok(self.collection.count_documents(doc! {}).await?)
    }
}
