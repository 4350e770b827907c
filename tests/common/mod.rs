#![allow(dead_code)]

use std::sync::Arc;

use axum::Router;
use chrono::Utc;
use testcontainers::runners::AsyncRunner;
use testcontainers::ContainerAsync;
use testcontainers_modules::minio::MinIO;
use testcontainers_modules::mongo::Mongo;

use cyshub::app::{build_router, AppState};
use cyshub::auth::models::{Role, User};
use cyshub::auth::token::{encode_token, Claims};
use cyshub::auth::verifier::TokenVerifier;
use cyshub::db::achievement_repository::{AchievementRepository, MongoAchievementRepository};
use cyshub::db::article_repository::{ArticleRepository, MongoArticleRepository};
use cyshub::db::company_repository::{CompanyRepository, MongoCompanyRepository};
use cyshub::db::interview_repository::{InterviewRepository, MongoInterviewRepository};
use cyshub::db::project_repository::{MongoProjectRepository, ProjectRepository};
use cyshub::db::roadmap_repository::{MongoRoadmapRepository, RoadmapRepository};
use cyshub::db::topic_repository::{MongoTopicRepository, TopicRepository};
use cyshub::db::user_repository::{MongoUserRepository, UserRepository};
use cyshub::storage::client::{S3StorageClient, StorageClient};

pub const JWT_SECRET: &str = "integration-secret";

/// Holds running containers and provides the Axum router for integration tests.
///
/// Containers are kept alive for as long as this struct lives. When dropped,
/// containers are stopped and cleaned up automatically.
pub struct TestEnv {
    _mongo: ContainerAsync<Mongo>,
    _minio: Option<ContainerAsync<MinIO>>,
    pub router: Router,
    pub state: AppState,
    pub achievements: Arc<dyn AchievementRepository>,
    pub companies: Arc<dyn CompanyRepository>,
    pub interviews: Arc<dyn InterviewRepository>,
    pub projects: Arc<dyn ProjectRepository>,
    pub roadmaps: Arc<dyn RoadmapRepository>,
    pub topics: Arc<dyn TopicRepository>,
    pub articles: Arc<dyn ArticleRepository>,
    pub users: Arc<dyn UserRepository>,
}

impl TestEnv {
    /// Start MongoDB only. Image storage stays unconfigured.
    pub async fn start() -> Self {
        Self::start_inner(false).await
    }

    /// Start MongoDB and MinIO.
    pub async fn start_with_storage() -> Self {
        Self::start_inner(true).await
    }

    async fn start_inner(with_storage: bool) -> Self {
        let mongo_container = Mongo::default()
            .start()
            .await
            .expect("Failed to start MongoDB container");
        let mongo_port = mongo_container
            .get_host_port_ipv4(27017)
            .await
            .expect("Failed to get MongoDB port");
        let mongo_client = mongodb::Client::with_uri_str(format!("mongodb://127.0.0.1:{mongo_port}"))
            .await
            .expect("Failed to connect to MongoDB");
        let mongo_db = mongo_client.database("cyshub_test");
        cyshub::db::indexes::ensure_indexes(&mongo_db)
            .await
            .expect("Failed to create indexes");

        let (minio_container, storage_client) = if with_storage {
            let (container, client) = start_minio().await;
            (Some(container), Some(client))
        } else {
            (None, None)
        };

        let achievements: Arc<dyn AchievementRepository> = Arc::new(MongoAchievementRepository::new(&mongo_db));
        let companies: Arc<dyn CompanyRepository> = Arc::new(MongoCompanyRepository::new(&mongo_db));
        let interviews: Arc<dyn InterviewRepository> = Arc::new(MongoInterviewRepository::new(&mongo_db));
        let projects: Arc<dyn ProjectRepository> = Arc::new(MongoProjectRepository::new(&mongo_db));
        let roadmaps: Arc<dyn RoadmapRepository> = Arc::new(MongoRoadmapRepository::new(&mongo_db));
        let topics: Arc<dyn TopicRepository> = Arc::new(MongoTopicRepository::new(&mongo_db));
        let articles: Arc<dyn ArticleRepository> = Arc::new(MongoArticleRepository::new(&mongo_db));
        let users: Arc<dyn UserRepository> = Arc::new(MongoUserRepository::new(&mongo_db));

        let state = AppState {
            achievement_repo: achievements.clone(),
            company_repo: companies.clone(),
            interview_repo: interviews.clone(),
            project_repo: projects.clone(),
            roadmap_repo: roadmaps.clone(),
            topic_repo: topics.clone(),
            article_repo: articles.clone(),
            user_repo: users.clone(),
            storage_client,
            token_verifier: Some(Arc::new(TokenVerifier::SharedSecret(JWT_SECRET.to_string()))),
        };

        Self {
            _mongo: mongo_container,
            _minio: minio_container,
            router: build_router(state.clone()),
            state,
            achievements,
            companies,
            interviews,
            projects,
            roadmaps,
            topics,
            articles,
            users,
        }
    }

    /// Build an `axum_test::TestServer` from this environment's router.
    pub fn server(&self) -> axum_test::TestServer {
        axum_test::TestServer::builder()
            .expect_success_by_default()
            .build(self.router.clone())
    }

    /// Build a `TestServer` that does NOT expect success by default (for error tests).
    pub fn server_permissive(&self) -> axum_test::TestServer {
        axum_test::TestServer::builder()
            .build(self.router.clone())
    }

    /// Register `uid` with `role` and return a bearer token for it.
    pub async fn login(&self, uid: &str, role: Role) -> String {
        self.users
            .get_or_create(User {
                uid: uid.to_string(),
                email: format!("{uid}@dept.edu"),
                display_name: Some(format!("User {uid}")),
                photo_url: None,
                role: Role::Student,
                created_at: Utc::now(),
            })
            .await
            .expect("Failed to register user");
        self.users
            .set_role(uid, role)
            .await
            .expect("Failed to set role");

        token_for(uid)
    }
}

/// Sign a token for `uid` without touching the database.
pub fn token_for(uid: &str) -> String {
    let claims = Claims {
        sub: uid.to_string(),
        email: format!("{uid}@dept.edu"),
        name: Some(format!("User {uid}")),
        picture: None,
        exp: (Utc::now() + chrono::Duration::hours(1)).timestamp(),
    };
    encode_token(&claims, JWT_SECRET).expect("Failed to sign token")
}

async fn start_minio() -> (ContainerAsync<MinIO>, Arc<dyn StorageClient>) {
    let container = MinIO::default()
        .start()
        .await
        .expect("Failed to start MinIO container");
    let minio_port = container
        .get_host_port_ipv4(9000)
        .await
        .expect("Failed to get MinIO port");
    let minio_endpoint = format!("http://127.0.0.1:{minio_port}");

    // Set env vars for AWS SDK to pick up MinIO credentials
    unsafe {
        std::env::set_var("AWS_ACCESS_KEY_ID", "minioadmin");
        std::env::set_var("AWS_SECRET_ACCESS_KEY", "minioadmin");
        std::env::set_var("AWS_REGION", "us-east-1");
    }

    let s3_config = aws_config::defaults(aws_config::BehaviorVersion::latest())
        .endpoint_url(&minio_endpoint)
        .region(aws_config::Region::new("us-east-1"))
        .load()
        .await;
    let s3_client = aws_sdk_s3::Client::from_conf(
        aws_sdk_s3::config::Builder::from(&s3_config)
            .force_path_style(true)
            .build(),
    );

    let bucket_name = "cyshub-test";
    let _ = s3_client.create_bucket().bucket(bucket_name).send().await;

    let storage: Arc<dyn StorageClient> = Arc::new(S3StorageClient::new(s3_client, bucket_name.to_string()));
    (container, storage)
}
