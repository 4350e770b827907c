//! In-memory repositories used by unit tests.

use std::sync::{Arc, Mutex};

use async_trait::async_trait;
use bson::oid::ObjectId;
use chrono::Utc;

use crate::app::AppState;
use crate::auth::models::{Role, User};
use crate::db::achievement_repository::{AchievementFilter, AchievementRepository};
use crate::db::article_repository::{ArticleFilter, ArticleOrder, ArticleRepository};
use crate::db::company_repository::{CompanyFilter, CompanyRepository};
use crate::db::interview_repository::{InterviewFilter, InterviewRepository};
use crate::db::models::{
    Achievement, Article, Company, Interview, Project, Roadmap, RoadmapSummary, Topic, TopicType,
};
use crate::db::project_repository::{ProjectFilter, ProjectRepository};
use crate::db::roadmap_repository::RoadmapRepository;
use crate::db::topic_repository::{TopicRepository, TopicUpdate};
use crate::db::user_repository::UserRepository;
use crate::error::AppError;

#[derive(Default)]
pub struct InMemoryAchievementRepository {
    pub items: Mutex<Vec<Achievement>>,
}

#[async_trait]
impl AchievementRepository for InMemoryAchievementRepository {
    async fn list(&self, filter: &AchievementFilter) -> Result<Vec<Achievement>, AppError> {
        let mut items: Vec<_> = self
            .items
            .lock()
            .unwrap()
            .iter()
            .filter(|a| filter.kind.map_or(true, |k| a.kind == k))
            .cloned()
            .collect();
        items.sort_by(|a, b| b.date.cmp(&a.date).then(b.created_at.cmp(&a.created_at)));
        Ok(items)
    }

    async fn find_by_id(&self, id: ObjectId) -> Result<Option<Achievement>, AppError> {
        Ok(self.items.lock().unwrap().iter().find(|a| a.id == Some(id)).cloned())
    }

    async fn insert(&self, mut achievement: Achievement) -> Result<ObjectId, AppError> {
        let id = ObjectId::new();
        achievement.id = Some(id);
        self.items.lock().unwrap().push(achievement);
        Ok(id)
    }

    async fn count(&self) -> Result<u64, AppError> {
        Ok(self.items.lock().unwrap().len() as u64)
    }
}

#[derive(Default)]
pub struct InMemoryCompanyRepository {
    pub items: Mutex<Vec<Company>>,
}

#[async_trait]
impl CompanyRepository for InMemoryCompanyRepository {
    async fn list(&self, filter: &CompanyFilter) -> Result<Vec<Company>, AppError> {
        let mut items: Vec<_> = self
            .items
            .lock()
            .unwrap()
            .iter()
            .filter(|c| filter.industry.as_ref().map_or(true, |i| &c.industry == i))
            .filter(|c| {
                filter
                    .opportunity_type
                    .as_ref()
                    .map_or(true, |o| c.opportunity_type.contains(o))
            })
            .cloned()
            .collect();
        items.sort_by(|a, b| a.company_name.cmp(&b.company_name));
        Ok(items)
    }

    async fn find_by_id(&self, id: ObjectId) -> Result<Option<Company>, AppError> {
        Ok(self.items.lock().unwrap().iter().find(|c| c.id == Some(id)).cloned())
    }

    async fn insert(&self, mut company: Company) -> Result<ObjectId, AppError> {
        let id = ObjectId::new();
        company.id = Some(id);
        self.items.lock().unwrap().push(company);
        Ok(id)
    }

    async fn count(&self) -> Result<u64, AppError> {
        Ok(self.items.lock().unwrap().len() as u64)
    }
}

#[derive(Default)]
pub struct InMemoryInterviewRepository {
    pub items: Mutex<Vec<Interview>>,
}

#[async_trait]
impl InterviewRepository for InMemoryInterviewRepository {
    async fn list(&self, filter: &InterviewFilter) -> Result<Vec<Interview>, AppError> {
        let mut items: Vec<_> = self
            .items
            .lock()
            .unwrap()
            .iter()
            .filter(|i| filter.company.as_ref().map_or(true, |c| &i.company == c))
            .filter(|i| filter.domain.as_ref().map_or(true, |d| &i.domain == d))
            .filter(|i| filter.result.as_ref().map_or(true, |r| &i.result == r))
            .cloned()
            .collect();
        items.sort_by(|a, b| b.date.cmp(&a.date).then(b.created_at.cmp(&a.created_at)));
        if let Some(limit) = filter.limit {
            items.truncate(limit as usize);
        }
        Ok(items)
    }

    async fn find_by_id(&self, id: ObjectId) -> Result<Option<Interview>, AppError> {
        Ok(self.items.lock().unwrap().iter().find(|i| i.id == Some(id)).cloned())
    }

    async fn insert(&self, mut interview: Interview) -> Result<ObjectId, AppError> {
        let id = ObjectId::new();
        interview.id = Some(id);
        self.items.lock().unwrap().push(interview);
        Ok(id)
    }

    async fn count(&self) -> Result<u64, AppError> {
        Ok(self.items.lock().unwrap().len() as u64)
    }
}

#[derive(Default)]
pub struct InMemoryProjectRepository {
    pub items: Mutex<Vec<Project>>,
}

#[async_trait]
impl ProjectRepository for InMemoryProjectRepository {
    async fn list(&self, filter: &ProjectFilter) -> Result<Vec<Project>, AppError> {
        let mut items: Vec<_> = self
            .items
            .lock()
            .unwrap()
            .iter()
            .filter(|p| !filter.featured_only || p.featured)
            .filter(|p| filter.category.as_ref().map_or(true, |c| p.categories.contains(c)))
            .cloned()
            .collect();
        items.sort_by(|a, b| b.featured.cmp(&a.featured).then(b.created_at.cmp(&a.created_at)));
        Ok(items)
    }

    async fn find_by_id(&self, id: ObjectId) -> Result<Option<Project>, AppError> {
        Ok(self.items.lock().unwrap().iter().find(|p| p.id == Some(id)).cloned())
    }

    async fn insert(&self, mut project: Project) -> Result<ObjectId, AppError> {
        let id = ObjectId::new();
        project.id = Some(id);
        self.items.lock().unwrap().push(project);
        Ok(id)
    }

    async fn count(&self) -> Result<u64, AppError> {
        Ok(self.items.lock().unwrap().len() as u64)
    }
}

#[derive(Default)]
pub struct InMemoryRoadmapRepository {
    pub items: Mutex<Vec<Roadmap>>,
}

#[async_trait]
impl RoadmapRepository for InMemoryRoadmapRepository {
    async fn list_summaries(&self) -> Result<Vec<RoadmapSummary>, AppError> {
        Ok(self
            .items
            .lock()
            .unwrap()
            .iter()
            .map(|r| RoadmapSummary {
                oid: r.oid.unwrap_or_else(ObjectId::new),
                id: r.id.clone(),
                title: r.title.clone(),
                subtitle: r.subtitle.clone(),
            })
            .collect())
    }

    async fn find_by_slug(&self, slug: &str) -> Result<Option<Roadmap>, AppError> {
        Ok(self.items.lock().unwrap().iter().find(|r| r.id == slug).cloned())
    }

    async fn upsert(&self, mut roadmap: Roadmap) -> Result<(), AppError> {
        let mut items = self.items.lock().unwrap();
        roadmap.oid = roadmap.oid.or_else(|| Some(ObjectId::new()));
        items.retain(|r| r.id != roadmap.id);
        items.push(roadmap);
        Ok(())
    }

    async fn count(&self) -> Result<u64, AppError> {
        Ok(self.items.lock().unwrap().len() as u64)
    }
}

#[derive(Default)]
pub struct InMemoryTopicRepository {
    pub items: Mutex<Vec<Topic>>,
}

#[async_trait]
impl TopicRepository for InMemoryTopicRepository {
    async fn list(&self, kind: Option<TopicType>) -> Result<Vec<Topic>, AppError> {
        let mut items: Vec<_> = self
            .items
            .lock()
            .unwrap()
            .iter()
            .filter(|t| kind.map_or(true, |k| t.kind == k))
            .cloned()
            .collect();
        items.sort_by(|a, b| a.order.cmp(&b.order).then(a.created_at.cmp(&b.created_at)));
        Ok(items)
    }

    async fn find_by_slug(&self, slug: &str) -> Result<Option<Topic>, AppError> {
        Ok(self.items.lock().unwrap().iter().find(|t| t.slug == slug).cloned())
    }

    async fn find_by_id(&self, id: ObjectId) -> Result<Option<Topic>, AppError> {
        Ok(self.items.lock().unwrap().iter().find(|t| t.id == Some(id)).cloned())
    }

    async fn find_many(&self, ids: &[ObjectId]) -> Result<Vec<Topic>, AppError> {
        Ok(self
            .items
            .lock()
            .unwrap()
            .iter()
            .filter(|t| t.id.is_some_and(|id| ids.contains(&id)))
            .cloned()
            .collect())
    }

    async fn insert(&self, mut topic: Topic) -> Result<ObjectId, AppError> {
        let mut items = self.items.lock().unwrap();
        if items.iter().any(|t| t.slug == topic.slug) {
            return Err(AppError::Conflict(format!("Topic '{}' already exists", topic.slug)));
        }
        let id = ObjectId::new();
        topic.id = Some(id);
        items.push(topic);
        Ok(id)
    }

    async fn update(&self, id: ObjectId, update: TopicUpdate) -> Result<Option<Topic>, AppError> {
        let mut items = self.items.lock().unwrap();
        let Some(topic) = items.iter_mut().find(|t| t.id == Some(id)) else {
            return Ok(None);
        };
        if let Some(title) = update.title {
            topic.title = title;
        }
        if let Some(description) = update.description {
            topic.description = Some(description);
        }
        if let Some(order) = update.order {
            topic.order = order;
        }
        if let Some(kind) = update.kind {
            topic.kind = kind;
        }
        topic.updated_at = Utc::now();
        Ok(Some(topic.clone()))
    }

    async fn delete(&self, id: ObjectId) -> Result<bool, AppError> {
        let mut items = self.items.lock().unwrap();
        let before = items.len();
        items.retain(|t| t.id != Some(id));
        Ok(items.len() < before)
    }

    async fn count(&self) -> Result<u64, AppError> {
        Ok(self.items.lock().unwrap().len() as u64)
    }
}

#[derive(Default)]
pub struct InMemoryArticleRepository {
    pub items: Mutex<Vec<Article>>,
}

#[async_trait]
impl ArticleRepository for InMemoryArticleRepository {
    async fn list(&self, filter: &ArticleFilter, order: ArticleOrder) -> Result<Vec<Article>, AppError> {
        let mut items: Vec<_> = self
            .items
            .lock()
            .unwrap()
            .iter()
            .filter(|a| filter.matches(a))
            .cloned()
            .map(|mut a| {
                a.content.clear();
                a
            })
            .collect();
        items.sort_by(|a, b| order.compare(a, b));
        Ok(items)
    }

    async fn find_one(&self, filter: &ArticleFilter) -> Result<Option<Article>, AppError> {
        Ok(self.items.lock().unwrap().iter().find(|a| filter.matches(a)).cloned())
    }

    async fn find_by_id(&self, id: ObjectId) -> Result<Option<Article>, AppError> {
        Ok(self.items.lock().unwrap().iter().find(|a| a.id == Some(id)).cloned())
    }

    async fn insert(&self, mut article: Article) -> Result<ObjectId, AppError> {
        let id = ObjectId::new();
        article.id = Some(id);
        self.items.lock().unwrap().push(article);
        Ok(id)
    }

    async fn replace(&self, mut article: Article) -> Result<Article, AppError> {
        let mut items = self.items.lock().unwrap();
        let slot = items
            .iter_mut()
            .find(|a| a.id.is_some() && a.id == article.id)
            .ok_or_else(|| AppError::NotFound("Article not found".into()))?;
        article.updated_at = Utc::now();
        *slot = article.clone();
        Ok(article)
    }

    async fn delete(&self, id: ObjectId) -> Result<bool, AppError> {
        let mut items = self.items.lock().unwrap();
        let before = items.len();
        items.retain(|a| a.id != Some(id));
        Ok(items.len() < before)
    }

    async fn count(&self, filter: &ArticleFilter) -> Result<u64, AppError> {
        Ok(self.items.lock().unwrap().iter().filter(|a| filter.matches(a)).count() as u64)
    }
}

#[derive(Default)]
pub struct InMemoryUserRepository {
    pub items: Mutex<Vec<User>>,
}

#[async_trait]
impl UserRepository for InMemoryUserRepository {
    async fn get_or_create(&self, candidate: User) -> Result<User, AppError> {
        let mut items = self.items.lock().unwrap();
        if let Some(existing) = items.iter_mut().find(|u| u.uid == candidate.uid) {
            existing.email = candidate.email;
            if candidate.display_name.is_some() {
                existing.display_name = candidate.display_name;
            }
            if candidate.photo_url.is_some() {
                existing.photo_url = candidate.photo_url;
            }
            return Ok(existing.clone());
        }
        items.push(candidate.clone());
        Ok(candidate)
    }

    async fn list_all(&self) -> Result<Vec<User>, AppError> {
        Ok(self.items.lock().unwrap().clone())
    }

    async fn set_role(&self, uid: &str, role: Role) -> Result<Option<User>, AppError> {
        let mut items = self.items.lock().unwrap();
        Ok(items.iter_mut().find(|u| u.uid == uid).map(|u| {
            u.role = role;
            u.clone()
        }))
    }
}

/// Every in-memory repository, wired into an `AppState` on demand.
#[derive(Default)]
pub struct InMemoryRepos {
    pub achievements: Arc<InMemoryAchievementRepository>,
    pub companies: Arc<InMemoryCompanyRepository>,
    pub interviews: Arc<InMemoryInterviewRepository>,
    pub projects: Arc<InMemoryProjectRepository>,
    pub roadmaps: Arc<InMemoryRoadmapRepository>,
    pub topics: Arc<InMemoryTopicRepository>,
    pub articles: Arc<InMemoryArticleRepository>,
    pub users: Arc<InMemoryUserRepository>,
}

impl InMemoryRepos {
    pub fn state(&self) -> AppState {
        AppState {
            achievement_repo: self.achievements.clone(),
            company_repo: self.companies.clone(),
            interview_repo: self.interviews.clone(),
            project_repo: self.projects.clone(),
            roadmap_repo: self.roadmaps.clone(),
            topic_repo: self.topics.clone(),
            article_repo: self.articles.clone(),
            user_repo: self.users.clone(),
            storage_client: None,
            token_verifier: None,
        }
    }
}
