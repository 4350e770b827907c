use serde::{Deserialize, Serialize};

use crate::error::AppError;
use crate::models::certification::{
    batches, filter_by_level, group_students, load_catalog, load_certified_students,
    CertificationCategory, CertificationCount, CertificationLevel, GroupBy, StudentGroup, StudentQuery,
};

#[derive(Debug, Default, Deserialize)]
pub struct CertificationQuery {
    pub level: Option<String>,
}

#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CertifiedStudentsQuery {
    pub q: Option<String>,
    pub batch: Option<String>,
    pub status: Option<CertificationCount>,
    pub group_by: Option<GroupBy>,
}

#[derive(Debug, Serialize)]
pub struct CertifiedStudentsResponse {
    /// Every batch on the wall, regardless of filters.
    pub batches: Vec<String>,
    pub groups: Vec<StudentGroup>,
}

pub fn process_list_certifications(query: &CertificationQuery) -> Result<Vec<CertificationCategory>, AppError> {
    let level = match query.level.as_deref().filter(|l| !l.is_empty() && *l != "All") {
        None => None,
        Some(raw) => Some(CertificationLevel::parse(raw).ok_or_else(|| {
            AppError::BadRequest(format!(
                "Invalid level '{raw}'. Expected: Beginner, Intermediate, Advanced"
            ))
        })?),
    };
    Ok(filter_by_level(load_catalog()?, level))
}

pub fn process_certified_students(query: &CertifiedStudentsQuery) -> Result<CertifiedStudentsResponse, AppError> {
    let students = load_certified_students()?;
    let all_batches = batches(&students);

    let filter = StudentQuery {
        search: query.q.clone(),
        batch: query.batch.clone().filter(|b| !b.is_empty() && b != "All"),
        count: query.status.unwrap_or_default(),
    };
    let matching = students.into_iter().filter(|s| filter.matches(s)).collect();

    Ok(CertifiedStudentsResponse {
        batches: all_batches,
        groups: group_students(matching, query.group_by.unwrap_or_default()),
    })
}

/// Axum handler for `GET /api/certifications`.
pub async fn list_certifications_handler(
    crate::api::common::ApiQuery(query): crate::api::common::ApiQuery<CertificationQuery>,
) -> Result<axum::Json<Vec<CertificationCategory>>, AppError> {
    let categories =
        process_list_certifications(&query).map_err(|e| e.or_internal("Failed to load certifications"))?;
    Ok(axum::Json(categories))
}

/// Axum handler for `GET /api/certified-students`.
pub async fn certified_students_handler(
    crate::api::common::ApiQuery(query): crate::api::common::ApiQuery<CertifiedStudentsQuery>,
) -> Result<axum::Json<CertifiedStudentsResponse>, AppError> {
    let response = process_certified_students(&query)
        .map_err(|e| e.or_internal("Failed to load certified students"))?;
    Ok(axum::Json(response))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_level_all_is_unfiltered() {
        let all = process_list_certifications(&CertificationQuery {
            level: Some("All".to_string()),
        })
        .unwrap();
        assert_eq!(all.len(), 6);

        let bad = process_list_certifications(&CertificationQuery {
            level: Some("Expert".to_string()),
        });
        assert!(matches!(bad, Err(AppError::BadRequest(_))));
    }

    #[test]
    fn test_query_string_decoding() {
        let query: CertifiedStudentsQuery =
            serde_json::from_str(r#"{"status":"Single","groupBy":"certification","batch":"All"}"#).unwrap();
        assert_eq!(query.status, Some(CertificationCount::Single));
        assert_eq!(query.group_by, Some(GroupBy::Certification));

        let response = process_certified_students(&query).unwrap();
        assert_eq!(response.batches.len(), 4);
        let students: usize = response.groups.iter().map(|g| g.students.len()).sum();
        assert_eq!(students, 3);
    }

    #[test]
    fn test_filters_do_not_shrink_batches() {
        let response = process_certified_students(&CertifiedStudentsQuery {
            q: Some("no such student".to_string()),
            ..Default::default()
        })
        .unwrap();
        assert!(response.groups.is_empty());
        assert_eq!(response.batches, vec!["2024", "2023", "2022", "2021"]);
    }

    #[tokio::test]
    async fn test_malformed_query_is_a_json_bad_request() {
        let router = axum::Router::new().route(
            "/api/certified-students",
            axum::routing::get(certified_students_handler),
        );
        let server = axum_test::TestServer::builder().build(router);

        for (key, value) in [("status", "Bogus"), ("groupBy", "x")] {
            let response = server
                .get("/api/certified-students")
                .add_query_param(key, value)
                .await;
            response.assert_status_bad_request();
            let body: serde_json::Value = response.json();
            assert!(body["error"].is_string(), "{key}={value} gave {body}");
        }
    }
}
