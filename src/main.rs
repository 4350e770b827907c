use std::sync::Arc;

use anyhow::Context;
use clap::Parser;

use cyshub::app::{build_router, AppState};
use cyshub::auth::verifier::TokenVerifier;
use cyshub::config::{redact_uri, AppConfig};
use cyshub::db::achievement_repository::MongoAchievementRepository;
use cyshub::db::article_repository::MongoArticleRepository;
use cyshub::db::company_repository::MongoCompanyRepository;
use cyshub::db::interview_repository::MongoInterviewRepository;
use cyshub::db::project_repository::MongoProjectRepository;
use cyshub::db::roadmap_repository::MongoRoadmapRepository;
use cyshub::db::topic_repository::MongoTopicRepository;
use cyshub::db::user_repository::MongoUserRepository;
use cyshub::storage::client::{S3StorageClient, StorageClient};

/// Backend of the department knowledge portal.
#[derive(Debug, Parser)]
#[command(version, about)]
struct Args {
    /// Address to listen on; overrides `bind_addr`.
    #[arg(long, env = "BIND_ADDR")]
    bind: Option<String>,

    /// Seed empty collections with demo content.
    #[arg(long)]
    seed: bool,
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "cyshub=info,tower_http=info".into()),
        )
        .init();

    let args = Args::parse();
    tracing::info!("Starting CyS Knowledge Hub server...");

    let config = AppConfig::load().context("Failed to load configuration")?;

    // Connect to MongoDB
    let mongo_uri = config
        .mongo_connection_uri()
        .context("Failed to resolve MongoDB URI")?;
    let mongo_client = mongodb::Client::with_uri_str(&mongo_uri)
        .await
        .context("Failed to connect to MongoDB")?;
    let mongo_db = mongo_client.database(&config.mongodb_database);
    tracing::info!(
        "Connected to MongoDB at {} (database '{}')",
        redact_uri(&mongo_uri),
        config.mongodb_database
    );
    cyshub::db::indexes::ensure_indexes(&mongo_db)
        .await
        .context("Failed to create MongoDB indexes")?;

    // Image storage is optional
    let storage_client: Option<Arc<dyn StorageClient>> = match config.s3_bucket.clone() {
        Some(bucket) => {
            let client: Arc<dyn StorageClient> =
                Arc::new(S3StorageClient::connect(bucket.clone(), config.s3_endpoint.as_deref()).await);
            tracing::info!("S3 storage client initialized for bucket '{}'", bucket);
            Some(client)
        }
        None => {
            tracing::warn!("S3_BUCKET not set, image uploads are disabled");
            None
        }
    };

    let token_verifier = match config.auth_mode().context("Invalid authentication settings")? {
        Some(mode) => Some(Arc::new(
            TokenVerifier::from_mode(mode)
                .await
                .context("Failed to initialize token verification")?,
        )),
        None => {
            tracing::warn!(
                "Neither FIREBASE_PROJECT_ID, AUTH_JWKS_URL nor JWT_SECRET is set, authenticated endpoints will reject every request"
            );
            None
        }
    };

    let state = AppState {
        achievement_repo: Arc::new(MongoAchievementRepository::new(&mongo_db)),
        company_repo: Arc::new(MongoCompanyRepository::new(&mongo_db)),
        interview_repo: Arc::new(MongoInterviewRepository::new(&mongo_db)),
        project_repo: Arc::new(MongoProjectRepository::new(&mongo_db)),
        roadmap_repo: Arc::new(MongoRoadmapRepository::new(&mongo_db)),
        topic_repo: Arc::new(MongoTopicRepository::new(&mongo_db)),
        article_repo: Arc::new(MongoArticleRepository::new(&mongo_db)),
        user_repo: Arc::new(MongoUserRepository::new(&mongo_db)),
        storage_client,
        token_verifier,
    };

    if args.seed || config.seed_demo_data {
        if let Err(e) = cyshub::seed::seed_demo_data(&state).await {
            tracing::error!(error = %e, "Demo data seeding failed");
        }
    }

    let app = build_router(state);

    let addr = args.bind.unwrap_or(config.bind_addr);
    tracing::info!("Listening on http://{}", addr);
    let listener = tokio::net::TcpListener::bind(&addr)
        .await
        .with_context(|| format!("Failed to bind {addr}"))?;
    axum::serve(listener, app.into_make_service())
        .await
        .context("Server error")?;

    Ok(())
}
