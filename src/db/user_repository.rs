use async_trait::async_trait;
use bson::doc;

use crate::auth::models::{Role, User};
use crate::error::AppError;

/// Repository trait for portal users.
#[async_trait]
pub trait UserRepository: Send + Sync {
    /// Return the stored user for `candidate.uid`, creating it from
    /// `candidate` on first sight. Profile fields are refreshed on every call
    /// while the stored role is kept.
    async fn get_or_create(&self, candidate: User) -> Result<User, AppError>;

    /// List every user, oldest first.
    async fn list_all(&self) -> Result<Vec<User>, AppError>;

    /// Change a user's role. Returns the updated user, if it exists.
    async fn set_role(&self, uid: &str, role: Role) -> Result<Option<User>, AppError>;
}

/// MongoDB implementation of the UserRepository.
pub struct MongoUserRepository {
    collection: mongodb::Collection<User>,
}

impl MongoUserRepository {
    pub fn new(db: &mongodb::Database) -> Self {
        Self {
            collection: db.collection("users"),
        }
    }
}

#[async_trait]
impl UserRepository for MongoUserRepository {
    async fn get_or_create(&self, candidate: User) -> Result<User, AppError> {
        use mongodb::options::{FindOneAndUpdateOptions, ReturnDocument};

        let mut set = doc! { "email": &candidate.email };
        if let Some(name) = &candidate.display_name {
            set.insert("displayName", name.as_str());
        }
        if let Some(photo) = &candidate.photo_url {
            set.insert("photoURL", photo.as_str());
        }

        let update = doc! {
            "$set": set,
            "$setOnInsert": {
                "uid": &candidate.uid,
                "role": bson::to_bson(&candidate.role)?,
                "createdAt": bson::DateTime::from_chrono(candidate.created_at),
            },
        };

        let options = FindOneAndUpdateOptions::builder()
            .upsert(true)
            .return_document(ReturnDocument::After)
            .build();

        self.collection
            .find_one_and_update(doc! { "uid": &candidate.uid }, update)
            .with_options(options)
            .await?
            .ok_or_else(|| AppError::Database(format!("Upsert of user '{}' returned nothing", candidate.uid)))
    }

    async fn list_all(&self) -> Result<Vec<User>, AppError> {
        use futures::TryStreamExt;
        use mongodb::options::FindOptions;

        let options = FindOptions::builder().sort(doc! { "createdAt": 1 }).build();
        let cursor = self.collection.find(doc! {}).with_options(options).await?;
        Ok(cursor.try_collect().await?)
    }

    async fn set_role(&self, uid: &str, role: Role) -> Result<Option<User>, AppError> {
        use mongodb::options::{FindOneAndUpdateOptions, ReturnDocument};

        let options = FindOneAndUpdateOptions::builder()
            .return_document(ReturnDocument::After)
            .build();

        Ok(self
            .collection
            .find_one_and_update(
                doc! { "uid": uid },
                doc! { "$set": { "role": bson::to_bson(&role)? } },
            )
            .with_options(options)
            .await?)
    }
}
