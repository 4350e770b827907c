mod common;

use serde_json::{json, Value};

async fn seeded_env() -> common::TestEnv {
    let env = common::TestEnv::start().await;
    cyshub::seed::seed_demo_data(&env.state)
        .await
        .expect("Failed to seed demo data");
    env
}

fn titles(body: &Value, field: &str) -> Vec<String> {
    body.as_array()
        .expect("Expected a JSON array")
        .iter()
        .map(|v| v[field].as_str().unwrap_or_default().to_string())
        .collect()
}

#[tokio::test]
async fn achievements_filter_and_sort() {
    let env = seeded_env().await;
    let server = env.server();

    let all: Value = server.get("/api/achievements").await.json();
    assert_eq!(
        titles(&all, "title"),
        vec![
            "Smart India Hackathon Winners",
            "National CTF Finalists",
            "ICPC Regionals Qualification"
        ]
    );
    assert!(all[0]["_id"].is_string(), "ids should render as hex strings");

    let ctf: Value = server.get("/api/achievements").add_query_param("type", "CTF").await.json();
    assert_eq!(titles(&ctf, "title"), vec!["National CTF Finalists"]);

    let everything: Value = server.get("/api/achievements").add_query_param("type", "All").await.json();
    assert_eq!(everything.as_array().unwrap().len(), 3);

    let id = ctf[0]["_id"].as_str().unwrap();
    let one: Value = server.get(&format!("/api/achievements/{id}")).await.json();
    assert_eq!(one["eventName"], "CyberShield CTF");
}

#[tokio::test]
async fn unknown_achievement_type_lists_nothing() {
    let env = seeded_env().await;
    let server = env.server();

    let body: Value = server.get("/api/achievements").add_query_param("type", "Quiz").await.json();
    assert_eq!(body, json!([]));
}

#[tokio::test]
async fn get_by_id_returns_404_for_unknown_or_malformed_ids() {
    let env = seeded_env().await;
    let server = env.server_permissive();
    let missing = bson::oid::ObjectId::new().to_hex();

    for resource in ["achievements", "companies", "interviews", "projects"] {
        server
            .get(&format!("/api/{resource}/{missing}"))
            .await
            .assert_status_not_found();
        server
            .get(&format!("/api/{resource}/not-an-id"))
            .await
            .assert_status_not_found();
    }
    server.get("/api/roadmaps/NOT_A_ROADMAP").await.assert_status_not_found();
}

#[tokio::test]
async fn companies_directory_filters() {
    let env = seeded_env().await;
    let server = env.server();

    let all: Value = server.get("/api/companies").await.json();
    assert_eq!(
        titles(&all, "companyName"),
        vec!["Palo Alto Networks", "Quick Heal Technologies", "Tata Consultancy Services"]
    );

    let internships: Value = server
        .get("/api/companies")
        .add_query_param("opportunityType", "Internship")
        .await
        .json();
    assert_eq!(
        titles(&internships, "companyName"),
        vec!["Palo Alto Networks", "Quick Heal Technologies"]
    );

    let well_paid: Value = server
        .get("/api/companies")
        .add_query_param("industry", "Cybersecurity")
        .add_query_param("minCtc", "10")
        .await
        .json();
    assert_eq!(titles(&well_paid, "companyName"), vec!["Palo Alto Networks"]);

    let searched: Value = server.get("/api/companies").add_query_param("q", "malware").await.json();
    assert_eq!(titles(&searched, "companyName"), vec!["Quick Heal Technologies"]);
}

#[tokio::test]
async fn companies_reject_invalid_min_ctc() {
    let env = seeded_env().await;
    let server = env.server_permissive();

    server
        .get("/api/companies")
        .add_query_param("minCtc", "lots")
        .await
        .assert_status_bad_request();
}

#[tokio::test]
async fn interviews_filters_and_limit() {
    let env = seeded_env().await;
    let server = env.server();

    let latest: Value = server.get("/api/interviews").add_query_param("limit", "1").await.json();
    assert_eq!(titles(&latest, "studentName"), vec!["Sneha Kulkarni"]);

    let unlimited: Value = server.get("/api/interviews").add_query_param("limit", "abc").await.json();
    assert_eq!(unlimited.as_array().unwrap().len(), 2);

    let truncated: Value = server.get("/api/interviews").add_query_param("limit", "1.9").await.json();
    assert_eq!(titles(&truncated, "studentName"), vec!["Sneha Kulkarni"]);

    let rejected: Value = server
        .get("/api/interviews")
        .add_query_param("result", "Rejected")
        .await
        .json();
    assert_eq!(titles(&rejected, "company"), vec!["Palo Alto Networks"]);
}

#[tokio::test]
async fn projects_featured_filter() {
    let env = seeded_env().await;
    let server = env.server();

    let featured: Value = server.get("/api/projects").add_query_param("featured", "true").await.json();
    assert_eq!(titles(&featured, "title"), vec!["PhishGuard"]);
    assert!(featured[0]["abstract"].is_string());

    let not_a_flag: Value = server.get("/api/projects").add_query_param("featured", "yes").await.json();
    assert_eq!(titles(&not_a_flag, "title"), vec!["PhishGuard", "Honeynet Dashboard"]);

    let network: Value = server
        .get("/api/projects")
        .add_query_param("category", "Network Security")
        .await
        .json();
    assert_eq!(titles(&network, "title"), vec!["Honeynet Dashboard"]);
}

#[tokio::test]
async fn roadmaps_listing_detail_and_progress() {
    let env = seeded_env().await;
    let server = env.server();

    let list: Value = server.get("/api/roadmaps").await.json();
    let list = list.as_array().unwrap();
    assert_eq!(list.len(), 2);
    assert!(list.iter().all(|r| r.get("steps").is_none()));

    let roadmap: Value = server.get("/api/roadmaps/SOC_ANALYST").await.json();
    assert_eq!(roadmap["steps"].as_array().unwrap().len(), 2);

    let progress: Value = server
        .post("/api/roadmaps/SOC_ANALYST/progress")
        .json(&json!({ "checked": { "0.0.0": true, "0.0.1": true, "0.1.0": false, "9.9.9": true } }))
        .await
        .json();
    assert_eq!(progress, json!({ "done": 2, "total": 11, "percent": 18 }));
}

#[tokio::test]
async fn malformed_progress_body_is_a_json_bad_request() {
    let env = seeded_env().await;
    let server = env.server_permissive();

    let response = server
        .post("/api/roadmaps/SOC_ANALYST/progress")
        .json(&json!({ "checked": { "0.0.0": "yes" } }))
        .await;
    response.assert_status_bad_request();
    let body: Value = response.json();
    assert!(body["error"].is_string());
}

#[tokio::test]
async fn seeding_twice_inserts_nothing() {
    let env = seeded_env().await;
    let report = cyshub::seed::seed_demo_data(&env.state).await.unwrap();
    assert_eq!(report.total(), 0);
}

#[tokio::test]
async fn health_check() {
    let env = common::TestEnv::start().await;
    let server = env.server();
    server.get("/health").await.assert_text("ok");
}
