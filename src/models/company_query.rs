use crate::db::models::Company;

/// Directory predicates applied after the database query.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct CompanyQuery {
    /// Case-insensitive substring over name, industry and roles.
    pub search: Option<String>,
    /// Minimum CTC. Companies without a CTC never pass a threshold.
    pub min_ctc: Option<f64>,
}

impl CompanyQuery {
    pub fn is_empty(&self) -> bool {
        self.search.is_none() && self.min_ctc.is_none()
    }

    pub fn matches(&self, company: &Company) -> bool {
        self.matches_search(company) && self.matches_ctc(company)
    }

    fn matches_search(&self, company: &Company) -> bool {
        let Some(term) = self.search.as_deref().map(str::trim).filter(|t| !t.is_empty()) else {
            return true;
        };
        let term = term.to_lowercase();

        company.company_name.to_lowercase().contains(&term)
            || company.industry.to_lowercase().contains(&term)
            || company.roles.iter().any(|r| r.to_lowercase().contains(&term))
    }

    fn matches_ctc(&self, company: &Company) -> bool {
        match self.min_ctc {
            None => true,
            Some(min) => company.ctc.is_some_and(|ctc| ctc >= min),
        }
    }

    /// Keep the matching companies, preserving order.
    pub fn apply(&self, companies: Vec<Company>) -> Vec<Company> {
        if self.is_empty() {
            return companies;
        }
        companies.into_iter().filter(|c| self.matches(c)).collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Utc;

    fn company(name: &str, industry: &str, roles: &[&str], ctc: Option<f64>) -> Company {
        Company {
            id: None,
            company_name: name.to_string(),
            logo: String::new(),
            industry: industry.to_string(),
            location: "Pune".to_string(),
            website: String::new(),
            roles: roles.iter().map(|r| r.to_string()).collect(),
            eligibility_criteria: String::new(),
            salary_package: String::new(),
            ctc,
            opportunity_type: vec!["Full-time".to_string()],
            selection_process: vec![],
            interview_experience: None,
            notes_tips: String::new(),
            created_at: Utc::now(),
            updated_at: Utc::now(),
        }
    }

    #[test]
    fn test_search_matches_name_industry_or_role() {
        let acme = company("Acme Security", "Cybersecurity", &["SOC Analyst"], Some(6.0));
        let query = |s: &str| CompanyQuery {
            search: Some(s.to_string()),
            min_ctc: None,
        };

        assert!(query("acme").matches(&acme));
        assert!(query("CYBER").matches(&acme));
        assert!(query("soc an").matches(&acme));
        assert!(!query("pentest").matches(&acme));
    }

    #[test]
    fn test_blank_search_matches_everything() {
        let acme = company("Acme", "Fintech", &[], None);
        let query = CompanyQuery {
            search: Some("   ".to_string()),
            min_ctc: None,
        };
        assert!(query.matches(&acme));
    }

    #[test]
    fn test_ctc_threshold() {
        let query = CompanyQuery {
            search: None,
            min_ctc: Some(8.0),
        };
        assert!(query.matches(&company("A", "", &[], Some(8.0))));
        assert!(query.matches(&company("B", "", &[], Some(12.5))));
        assert!(!query.matches(&company("C", "", &[], Some(7.9))));
        assert!(!query.matches(&company("D", "", &[], None)));
    }

    #[test]
    fn test_apply_preserves_order() {
        let list = vec![
            company("Zeta", "Cloud", &[], Some(10.0)),
            company("Alpha", "Cloud", &[], Some(4.0)),
            company("Beta", "Cloud", &[], Some(11.0)),
        ];
        let query = CompanyQuery {
            search: Some("cloud".to_string()),
            min_ctc: Some(9.0),
        };
        let names: Vec<_> = query
            .apply(list)
            .into_iter()
            .map(|c| c.company_name)
            .collect();
        assert_eq!(names, vec!["Zeta", "Beta"]);
    }
}
