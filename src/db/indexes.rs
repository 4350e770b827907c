use bson::Document;
use mongodb::options::IndexOptions;
use mongodb::IndexModel;

use crate::error::AppError;

/// Unique keys the application relies on: `(collection, keys, index name)`.
const UNIQUE_INDEXES: &[(&str, &[&str], &str)] = &[
    ("topics", &["slug"], "topics_slug_unique"),
    ("roadmaps", &["id"], "roadmaps_id_unique"),
    ("users", &["uid"], "users_uid_unique"),
    ("articles", &["topicId", "slug"], "articles_topic_slug_unique"),
];

/// Index key document for `fields`, all ascending.
fn index_keys(fields: &[&str]) -> Document {
    fields.iter().map(|f| (f.to_string(), bson::Bson::Int32(1))).collect()
}

/// Create the unique indexes. Existing indexes with the same definition are
/// left untouched, so this is safe to run on every startup.
pub async fn ensure_indexes(db: &mongodb::Database) -> Result<(), AppError> {
    for (collection, fields, name) in UNIQUE_INDEXES {
        let model = IndexModel::builder()
            .keys(index_keys(fields))
            .options(
                IndexOptions::builder()
                    .unique(true)
                    .name(name.to_string())
                    .build(),
            )
            .build();

        db.collection::<Document>(collection)
            .create_index(model)
            .await?;
        tracing::debug!(collection, index = name, "Unique index ensured");
    }

    tracing::info!("Ensured {} unique indexes", UNIQUE_INDEXES.len());
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use bson::doc;

    #[test]
    fn test_compound_keys_keep_field_order() {
        assert_eq!(index_keys(&["topicId", "slug"]), doc! { "topicId": 1, "slug": 1 });
    }

    #[test]
    fn test_every_uniqueness_rule_has_an_index() {
        let names: Vec<_> = UNIQUE_INDEXES.iter().map(|(c, f, _)| (*c, f.to_vec())).collect();
        assert!(names.contains(&("topics", vec!["slug"])));
        assert!(names.contains(&("roadmaps", vec!["id"])));
        assert!(names.contains(&("users", vec!["uid"])));
        assert!(names.contains(&("articles", vec!["topicId", "slug"])));
    }
}
