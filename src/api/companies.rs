use serde::Deserialize;
use serde_json::Value;

use crate::api::common::{parse_object_id, render, render_all};
use crate::db::company_repository::{CompanyFilter, CompanyRepository};
use crate::db::models::Company;
use crate::error::AppError;
use crate::models::company_query::CompanyQuery;

/// Query string of `GET /api/companies`.
#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CompanyListQuery {
    pub industry: Option<String>,
    pub opportunity_type: Option<String>,
    /// Free-text search.
    pub q: Option<String>,
    /// Kept as text so that a malformed value can be reported clearly.
    pub min_ctc: Option<String>,
}

impl CompanyListQuery {
    fn split(&self) -> Result<(CompanyFilter, CompanyQuery), AppError> {
        let non_empty = |v: &Option<String>| v.clone().filter(|s| !s.trim().is_empty());

        let min_ctc = match non_empty(&self.min_ctc) {
            None => None,
            Some(raw) => Some(raw.trim().parse::<f64>().map_err(|_| {
                AppError::BadRequest(format!("Invalid minCtc '{raw}': expected a number"))
            })?),
        };

        Ok((
            CompanyFilter {
                industry: non_empty(&self.industry),
                opportunity_type: non_empty(&self.opportunity_type),
            },
            CompanyQuery {
                search: non_empty(&self.q),
                min_ctc,
            },
        ))
    }
}

pub async fn process_list_companies(
    repo: &dyn CompanyRepository,
    query: &CompanyListQuery,
) -> Result<Vec<Company>, AppError> {
    let (filter, predicates) = query.split()?;
    let companies = repo.list(&filter).await?;
    Ok(predicates.apply(companies))
}

pub async fn process_get_company(repo: &dyn CompanyRepository, id: &str) -> Result<Company, AppError> {
    let oid = parse_object_id(id, "Company")?;
    repo.find_by_id(oid)
        .await?
        .ok_or_else(|| AppError::NotFound("Company not found".into()))
}

/// Axum handler for `GET /api/companies`.
pub async fn list_companies_handler(
    axum::extract::State(state): axum::extract::State<crate::app::AppState>,
    crate::api::common::ApiQuery(query): crate::api::common::ApiQuery<CompanyListQuery>,
) -> Result<axum::Json<Value>, AppError> {
    let companies = process_list_companies(state.company_repo.as_ref(), &query)
        .await
        .map_err(|e| e.or_internal("Failed to fetch companies"))?;
    Ok(axum::Json(render_all(&companies)?))
}

/// Axum handler for `GET /api/companies/{id}`.
pub async fn get_company_handler(
    axum::extract::State(state): axum::extract::State<crate::app::AppState>,
    axum::extract::Path(id): axum::extract::Path<String>,
) -> Result<axum::Json<Value>, AppError> {
    let company = process_get_company(state.company_repo.as_ref(), &id)
        .await
        .map_err(|e| e.or_internal("Failed to fetch company"))?;
    Ok(axum::Json(render(&company)?))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::db::memory::InMemoryCompanyRepository;
    use chrono::Utc;

    fn company(name: &str, industry: &str, opportunities: &[&str], ctc: Option<f64>) -> Company {
        Company {
            id: None,
            company_name: name.to_string(),
            logo: String::new(),
            industry: industry.to_string(),
            location: String::new(),
            website: String::new(),
            roles: vec!["Security Analyst".to_string()],
            eligibility_criteria: String::new(),
            salary_package: String::new(),
            ctc,
            opportunity_type: opportunities.iter().map(|s| s.to_string()).collect(),
            selection_process: vec![],
            interview_experience: None,
            notes_tips: String::new(),
            created_at: Utc::now(),
            updated_at: Utc::now(),
        }
    }

    async fn seeded() -> InMemoryCompanyRepository {
        let repo = InMemoryCompanyRepository::default();
        repo.insert(company("Quick Heal", "Cybersecurity", &["Internship", "Full-time"], Some(7.0)))
            .await
            .unwrap();
        repo.insert(company("Barclays", "Banking", &["Full-time"], Some(12.0)))
            .await
            .unwrap();
        repo.insert(company("Acme Labs", "Cybersecurity", &["Internship"], None))
            .await
            .unwrap();
        repo
    }

    fn names(companies: &[Company]) -> Vec<&str> {
        companies.iter().map(|c| c.company_name.as_str()).collect()
    }

    #[tokio::test]
    async fn test_sorted_by_name() {
        let repo = seeded().await;
        let all = process_list_companies(&repo, &CompanyListQuery::default()).await.unwrap();
        assert_eq!(names(&all), vec!["Acme Labs", "Barclays", "Quick Heal"]);
    }

    #[tokio::test]
    async fn test_database_and_memory_filters_combine() {
        let repo = seeded().await;
        let query = CompanyListQuery {
            industry: Some("Cybersecurity".to_string()),
            opportunity_type: Some("Internship".to_string()),
            q: None,
            min_ctc: Some("5".to_string()),
        };
        let result = process_list_companies(&repo, &query).await.unwrap();
        assert_eq!(names(&result), vec!["Quick Heal"]);
    }

    #[tokio::test]
    async fn test_search_over_roles() {
        let repo = seeded().await;
        let query = CompanyListQuery {
            q: Some("analyst".to_string()),
            ..Default::default()
        };
        assert_eq!(process_list_companies(&repo, &query).await.unwrap().len(), 3);
    }

    #[tokio::test]
    async fn test_invalid_min_ctc() {
        let repo = seeded().await;
        let query = CompanyListQuery {
            min_ctc: Some("lots".to_string()),
            ..Default::default()
        };
        let result = process_list_companies(&repo, &query).await;
        assert!(matches!(result, Err(AppError::BadRequest(_))));
    }

    #[tokio::test]
    async fn test_unknown_company() {
        let repo = seeded().await;
        let result = process_get_company(&repo, "64b7f0c2a1b2c3d4e5f60718").await;
        match result.unwrap_err() {
            AppError::NotFound(msg) => assert_eq!(msg, "Company not found"),
            other => panic!("Expected NotFound, got: {:?}", other),
        }
    }
}
