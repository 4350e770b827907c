//! Certification catalog and the certified-students wall.
//!
//! Both are static content compiled into the binary from `data/*.yaml`.

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

use crate::error::AppError;

const CERTIFICATIONS_YAML: &str = include_str!("../../data/certifications.yaml");
const CERTIFIED_STUDENTS_YAML: &str = include_str!("../../data/certified_students.yaml");

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum CertificationLevel {
    Beginner,
    Intermediate,
    Advanced,
}

impl CertificationLevel {
    pub fn parse(s: &str) -> Option<Self> {
        match s {
            "Beginner" => Some(Self::Beginner),
            "Intermediate" => Some(Self::Intermediate),
            "Advanced" => Some(Self::Advanced),
            _ => None,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Certification {
    pub name: String,
    pub level: CertificationLevel,
    pub short_desc: String,
    pub organization: String,
    pub exam: String,
    pub prep: String,
    pub roles: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub badge_url: Option<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CertificationCategory {
    pub title: String,
    pub certifications: Vec<Certification>,
}

#[derive(Debug, Clone, Deserialize)]
struct CatalogFile {
    categories: Vec<CertificationCategory>,
}

/// Parse the embedded certification catalog.
pub fn load_catalog() -> Result<Vec<CertificationCategory>, AppError> {
    serde_yaml::from_str::<CatalogFile>(CERTIFICATIONS_YAML)
        .map(|f| f.categories)
        .map_err(|e| AppError::Internal(format!("Invalid certification catalog: {e}")))
}

/// Keep only certifications of `level`, dropping categories left empty.
pub fn filter_by_level(
    categories: Vec<CertificationCategory>,
    level: Option<CertificationLevel>,
) -> Vec<CertificationCategory> {
    let Some(level) = level else {
        return categories;
    };
    categories
        .into_iter()
        .filter_map(|mut category| {
            category.certifications.retain(|c| c.level == level);
            (!category.certifications.is_empty()).then_some(category)
        })
        .collect()
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct EarnedCertification {
    pub name: String,
    pub organization: String,
    #[serde(default)]
    pub logo: String,
    pub month: String,
    pub year: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CertifiedStudent {
    pub id: String,
    pub name: String,
    pub batch: String,
    #[serde(default)]
    pub photo_url: String,
    pub primary_certification: EarnedCertification,
    #[serde(default)]
    pub additional_certifications: Vec<EarnedCertification>,
    #[serde(default)]
    pub testimonial: String,
    #[serde(default)]
    pub difficulty_perceived: String,
}

#[derive(Debug, Clone, Deserialize)]
struct StudentsFile {
    students: Vec<CertifiedStudent>,
}

pub fn load_certified_students() -> Result<Vec<CertifiedStudent>, AppError> {
    serde_yaml::from_str::<StudentsFile>(CERTIFIED_STUDENTS_YAML)
        .map(|f| f.students)
        .map_err(|e| AppError::Internal(format!("Invalid certified students list: {e}")))
}

/// How many certifications a student holds.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Deserialize)]
pub enum CertificationCount {
    #[default]
    All,
    /// Only the primary certification.
    Single,
    /// At least one additional certification.
    Multiple,
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum GroupBy {
    #[default]
    Batch,
    Certification,
}

/// Search and filters of the certified-students wall.
#[derive(Debug, Clone, Default)]
pub struct StudentQuery {
    /// Case-insensitive substring over the name and the primary certification.
    pub search: Option<String>,
    /// `None` (or `All` at the HTTP layer) means every batch.
    pub batch: Option<String>,
    pub count: CertificationCount,
}

impl StudentQuery {
    pub fn matches(&self, student: &CertifiedStudent) -> bool {
        let search_ok = match self.search.as_deref().map(str::trim).filter(|s| !s.is_empty()) {
            None => true,
            Some(term) => {
                let term = term.to_lowercase();
                student.name.to_lowercase().contains(&term)
                    || student.primary_certification.name.to_lowercase().contains(&term)
            }
        };
        let batch_ok = self.batch.as_ref().map_or(true, |b| &student.batch == b);
        let count_ok = match self.count {
            CertificationCount::All => true,
            CertificationCount::Single => student.additional_certifications.is_empty(),
            CertificationCount::Multiple => !student.additional_certifications.is_empty(),
        };
        search_ok && batch_ok && count_ok
    }
}

#[derive(Debug, Clone, Serialize)]
pub struct StudentGroup {
    pub title: String,
    pub students: Vec<CertifiedStudent>,
}

/// Distinct batches, most recent first.
pub fn batches(students: &[CertifiedStudent]) -> Vec<String> {
    let mut batches: Vec<String> = students.iter().map(|s| s.batch.clone()).collect();
    batches.sort_by(|a, b| batch_number(b).cmp(&batch_number(a)).then_with(|| b.cmp(a)));
    batches.dedup();
    batches
}

fn batch_number(batch: &str) -> i64 {
    batch.trim().parse().unwrap_or(0)
}

/// Group students, keeping their relative order within a group.
///
/// Batch groups are titled `Class of {batch}` and sorted descending;
/// certification groups are titled by the primary certification and sorted
/// ascending.
pub fn group_students(students: Vec<CertifiedStudent>, group_by: GroupBy) -> Vec<StudentGroup> {
    let mut groups: BTreeMap<String, Vec<CertifiedStudent>> = BTreeMap::new();
    for student in students {
        let title = match group_by {
            GroupBy::Batch => format!("Class of {}", student.batch),
            GroupBy::Certification => student.primary_certification.name.clone(),
        };
        groups.entry(title).or_default().push(student);
    }

    let groups = groups
        .into_iter()
        .map(|(title, students)| StudentGroup { title, students });
    match group_by {
        GroupBy::Batch => groups.rev().collect(),
        GroupBy::Certification => groups.collect(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_embedded_catalog_parses() {
        let catalog = load_catalog().unwrap();
        assert_eq!(catalog.len(), 6);
        assert!(catalog.iter().all(|c| !c.certifications.is_empty()));

        let students = load_certified_students().unwrap();
        assert_eq!(students.len(), 6);
    }

    #[test]
    fn test_level_filter_drops_empty_categories() {
        let advanced = filter_by_level(load_catalog().unwrap(), Some(CertificationLevel::Advanced));
        assert!(advanced
            .iter()
            .flat_map(|c| &c.certifications)
            .all(|c| c.level == CertificationLevel::Advanced));
        // Networking has no advanced certification.
        assert!(!advanced.iter().any(|c| c.title.starts_with("Networking")));
        assert_eq!(advanced.len(), 5);
    }

    #[test]
    fn test_batches_are_numeric_descending() {
        let students = load_certified_students().unwrap();
        assert_eq!(batches(&students), vec!["2024", "2023", "2022", "2021"]);
    }

    #[test]
    fn test_query_filters() {
        let students = load_certified_students().unwrap();
        let count = |q: StudentQuery| students.iter().filter(|s| q.matches(s)).count();

        assert_eq!(
            count(StudentQuery {
                search: Some("security+".to_string()),
                ..Default::default()
            }),
            1
        );
        assert_eq!(
            count(StudentQuery {
                search: Some("priya".to_string()),
                ..Default::default()
            }),
            1
        );
        assert_eq!(
            count(StudentQuery {
                count: CertificationCount::Multiple,
                ..Default::default()
            }),
            3
        );
        assert_eq!(
            count(StudentQuery {
                batch: Some("2024".to_string()),
                count: CertificationCount::Single,
                ..Default::default()
            }),
            2
        );
    }

    #[test]
    fn test_grouping() {
        let students = load_certified_students().unwrap();

        let by_batch = group_students(students.clone(), GroupBy::Batch);
        let titles: Vec<_> = by_batch.iter().map(|g| g.title.as_str()).collect();
        assert_eq!(titles, vec!["Class of 2024", "Class of 2023", "Class of 2022", "Class of 2021"]);
        assert_eq!(by_batch[1].students.len(), 2);

        let by_cert = group_students(students, GroupBy::Certification);
        let titles: Vec<_> = by_cert.iter().map(|g| g.title.clone()).collect();
        let mut sorted = titles.clone();
        sorted.sort();
        assert_eq!(titles, sorted);
        assert_eq!(by_cert.len(), 6);
    }
}
