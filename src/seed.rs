//! Demo content for fresh databases.
//!
//! Fixtures are embedded from `seed_data/*.yaml`. A collection is only seeded
//! while it is empty, so restarting with seeding enabled never duplicates data.

use serde::de::DeserializeOwned;

use crate::app::AppState;
use crate::db::models::{Achievement, Company, Interview, Project, Roadmap, Topic};
use crate::error::AppError;

const ROADMAPS_YAML: &str = include_str!("../seed_data/roadmaps.yaml");
const COMPANIES_YAML: &str = include_str!("../seed_data/companies.yaml");
const ACHIEVEMENTS_YAML: &str = include_str!("../seed_data/achievements.yaml");
const PROJECTS_YAML: &str = include_str!("../seed_data/projects.yaml");
const INTERVIEWS_YAML: &str = include_str!("../seed_data/interviews.yaml");
const TOPICS_YAML: &str = include_str!("../seed_data/topics.yaml");

/// Number of records inserted per collection.
#[derive(Debug, Default, Clone, PartialEq, Eq)]
pub struct SeedReport {
    pub roadmaps: usize,
    pub companies: usize,
    pub achievements: usize,
    pub projects: usize,
    pub interviews: usize,
    pub topics: usize,
}

impl SeedReport {
    pub fn total(&self) -> usize {
        self.roadmaps + self.companies + self.achievements + self.projects + self.interviews + self.topics
    }
}

fn parse_fixture<T: DeserializeOwned>(collection: &str, yaml: &str) -> Result<Vec<T>, AppError> {
    serde_yaml::from_str(yaml)
        .map_err(|e| AppError::Internal(format!("Invalid {collection} fixture: {e}")))
}

fn should_seed(collection: &str, existing: u64) -> bool {
    if existing > 0 {
        tracing::info!(collection, existing, "Collection not empty, skipping seed");
        return false;
    }
    true
}

/// Insert the embedded fixtures into every empty collection.
pub async fn seed_demo_data(state: &AppState) -> Result<SeedReport, AppError> {
    tracing::info!("Starting demo data seeding...");
    let mut report = SeedReport::default();

    if should_seed("roadmaps", state.roadmap_repo.count().await?) {
        for roadmap in parse_fixture::<Roadmap>("roadmaps", ROADMAPS_YAML)? {
            state.roadmap_repo.upsert(roadmap).await?;
            report.roadmaps += 1;
        }
    }

    if should_seed("companies", state.company_repo.count().await?) {
        for company in parse_fixture::<Company>("companies", COMPANIES_YAML)? {
            state.company_repo.insert(company).await?;
            report.companies += 1;
        }
    }

    if should_seed("achievements", state.achievement_repo.count().await?) {
        for achievement in parse_fixture::<Achievement>("achievements", ACHIEVEMENTS_YAML)? {
            state.achievement_repo.insert(achievement).await?;
            report.achievements += 1;
        }
    }

    if should_seed("projects", state.project_repo.count().await?) {
        for project in parse_fixture::<Project>("projects", PROJECTS_YAML)? {
            state.project_repo.insert(project).await?;
            report.projects += 1;
        }
    }

    if should_seed("interviews", state.interview_repo.count().await?) {
        for interview in parse_fixture::<Interview>("interviews", INTERVIEWS_YAML)? {
            state.interview_repo.insert(interview).await?;
            report.interviews += 1;
        }
    }

    if should_seed("topics", state.topic_repo.count().await?) {
        for topic in parse_fixture::<Topic>("topics", TOPICS_YAML)? {
            state.topic_repo.insert(topic).await?;
            report.topics += 1;
        }
    }

    tracing::info!(?report, "Demo data seeding completed.");
    Ok(report)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::db::memory::InMemoryRepos;
    use crate::db::models::{AchievementType, TopicType};

    #[test]
    fn test_fixtures_parse() {
        let roadmaps: Vec<Roadmap> = parse_fixture("roadmaps", ROADMAPS_YAML).unwrap();
        assert!(roadmaps.iter().all(|r| !r.steps.is_empty()));

        let achievements: Vec<Achievement> = parse_fixture("achievements", ACHIEVEMENTS_YAML).unwrap();
        assert!(achievements.iter().any(|a| a.kind == AchievementType::Ctf));

        let topics: Vec<Topic> = parse_fixture("topics", TOPICS_YAML).unwrap();
        assert!(topics.iter().any(|t| t.kind == TopicType::Experiment));

        parse_fixture::<Company>("companies", COMPANIES_YAML).unwrap();
        parse_fixture::<Project>("projects", PROJECTS_YAML).unwrap();
        parse_fixture::<Interview>("interviews", INTERVIEWS_YAML).unwrap();
    }

    #[tokio::test]
    async fn test_seeds_empty_collections_once() {
        let repos = InMemoryRepos::default();
        let state = repos.state();

        let first = seed_demo_data(&state).await.unwrap();
        assert_eq!(first.roadmaps, 2);
        assert_eq!(first.companies, 3);
        assert_eq!(first.topics, 4);
        assert_eq!(repos.interviews.items.lock().unwrap().len(), first.interviews);

        let second = seed_demo_data(&state).await.unwrap();
        assert_eq!(second.total(), 0);
        assert_eq!(repos.companies.items.lock().unwrap().len(), 3);
    }

    #[tokio::test]
    async fn test_skips_populated_collection() {
        let repos = InMemoryRepos::default();
        let projects: Vec<Project> = parse_fixture("projects", PROJECTS_YAML).unwrap();
        repos.projects.items.lock().unwrap().push(projects[0].clone());

        let report = seed_demo_data(&repos.state()).await.unwrap();
        assert_eq!(report.projects, 0);
        assert_eq!(report.achievements, 3);
        assert_eq!(repos.projects.items.lock().unwrap().len(), 1);
    }
}
