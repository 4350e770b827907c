pub mod app;
pub mod auth;
pub mod config;
pub mod error;
pub mod seed;
pub mod api {
    pub mod achievements;
    pub mod admin;
    pub mod articles;
    pub mod catalog;
    pub mod common;
    pub mod companies;
    pub mod errors;
    pub mod interviews;
    pub mod projects;
    pub mod roadmaps;
    pub mod topics;
    pub mod upload;
}
pub mod db {
    pub mod achievement_repository;
    pub mod article_repository;
    pub mod company_repository;
    pub mod indexes;
    pub mod interview_repository;
    #[cfg(test)]
    pub mod memory;
    pub mod models;
    pub mod project_repository;
    pub mod roadmap_repository;
    pub mod topic_repository;
    pub mod user_repository;
}
pub mod models {
    pub mod certification;
    pub mod company_query;
    pub mod roadmap_progress;
    pub mod slug;
}
pub mod storage {
    pub mod client;
}
