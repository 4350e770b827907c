use async_trait::async_trait;
use bson::oid::ObjectId;
use bson::{doc, Document};

use crate::db::models::Interview;
use crate::error::AppError;

/// Query-string filter for interview experiences.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct InterviewFilter {
    pub company: Option<String>,
    pub domain: Option<String>,
    pub result: Option<String>,
    /// Maximum number of records. `None` means unlimited.
    pub limit: Option<i64>,
}

impl InterviewFilter {
    pub fn to_document(&self) -> Document {
        let mut filter = Document::new();
        if let Some(company) = &self.company {
            filter.insert("company", company.as_str());
        }
        if let Some(domain) = &self.domain {
            filter.insert("domain", domain.as_str());
        }
        if let Some(result) = &self.result {
            filter.insert("result", result.as_str());
        }
        filter
    }
}

/// Lenient `limit` parsing: the leading digits count (`10abc` is 10,
/// `5.7` is 5). Anything without a positive leading integer means
/// "no limit".
pub fn parse_limit(raw: Option<&str>) -> Option<i64> {
    let s = raw?.trim_start();
    let unsigned = s.strip_prefix('+').unwrap_or(s);
    let digits_end = unsigned
        .find(|c: char| !c.is_ascii_digit())
        .unwrap_or(unsigned.len());
    unsigned[..digits_end].parse::<i64>().ok().filter(|n| *n > 0)
}

/// Repository trait for interview experiences.
#[async_trait]
pub trait InterviewRepository: Send + Sync {
    /// List interviews, newest `date` first, then newest record first.
    async fn list(&self, filter: &InterviewFilter) -> Result<Vec<Interview>, AppError>;

    async fn find_by_id(&self, id: ObjectId) -> Result<Option<Interview>, AppError>;

    async fn insert(&self, interview: Interview) -> Result<ObjectId, AppError>;

    async fn count(&self) -> Result<u64, AppError>;
}

/// MongoDB implementation of the InterviewRepository.
pub struct MongoInterviewRepository {
    collection: mongodb::Collection<Interview>,
}

impl MongoInterviewRepository {
    pub fn new(db: &mongodb::Database) -> Self {
        Self {
            collection: db.collection("interviews"),
        }
    }
}

#[async_trait]
impl InterviewRepository for MongoInterviewRepository {
    async fn list(&self, filter: &InterviewFilter) -> Result<Vec<Interview>, AppError> {
        use futures::TryStreamExt;
        use mongodb::options::FindOptions;

        let mut options = FindOptions::builder()
            .sort(doc! { "date": -1, "createdAt": -1 })
            .build();
        options.limit = filter.limit;

        let cursor = self
            .collection
            .find(filter.to_document())
            .with_options(options)
            .await?;

        Ok(cursor.try_collect().await?)
    }

    async fn find_by_id(&self, id: ObjectId) -> Result<Option<Interview>, AppError> {
        Ok(self.collection.find_one(doc! { "_id": id }).await?)
    }

    async fn insert(&self, mut interview: Interview) -> Result<ObjectId, AppError> {
        let now = chrono::Utc::now();
        interview.id = None;
        interview.created_at = now;
        interview.updated_at = now;

        let result = self.collection.insert_one(&interview).await?;
        result
            .inserted_id
            .as_object_id()
            .ok_or_else(|| AppError::Database("Inserted id is not an ObjectId".into()))
    }

    async fn count(&self) -> Result<u64, AppError> {
        Ok(self.collection.count_documents(doc! {}).await?)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_filter_combines_fields() {
        let filter = InterviewFilter {
            company: Some("Acme".to_string()),
            domain: None,
            result: Some("Selected".to_string()),
            limit: Some(5),
        };
        assert_eq!(
            filter.to_document(),
            doc! { "company": "Acme", "result": "Selected" }
        );
    }

    #[test]
    fn test_parse_limit() {
        assert_eq!(parse_limit(Some("10")), Some(10));
        assert_eq!(parse_limit(Some(" 3 ")), Some(3));
        assert_eq!(parse_limit(Some("0")), None);
        assert_eq!(parse_limit(Some("-4")), None);
        assert_eq!(parse_limit(Some("ten")), None);
        assert_eq!(parse_limit(None), None);
    }

    #[test]
    fn test_parse_limit_reads_leading_digits() {
        assert_eq!(parse_limit(Some("10abc")), Some(10));
        assert_eq!(parse_limit(Some("5.7")), Some(5));
        assert_eq!(parse_limit(Some("+2")), Some(2));
        assert_eq!(parse_limit(Some("abc10")), None);
        assert_eq!(parse_limit(Some("-5.7")), None);
        assert_eq!(parse_limit(Some("")), None);
    }
}
