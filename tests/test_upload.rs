mod common;

use axum_test::multipart::{MultipartForm, Part};
use cyshub::auth::models::Role;

fn png_bytes() -> Vec<u8> {
    vec![
        0x89, 0x50, 0x4E, 0x47, 0x0D, 0x0A, 0x1A, 0x0A, // PNG signature
        0x00, 0x00, 0x00, 0x0D, 0x49, 0x48, 0x44, 0x52, // IHDR chunk
        0x00, 0x00, 0x00, 0x01, 0x00, 0x00, 0x00, 0x01, // 1x1
        0x08, 0x02, 0x00, 0x00, 0x00, 0x90, 0x77, 0x53, 0xDE, // bit depth, color type, CRC
        0x00, 0x00, 0x00, 0x00, 0x49, 0x45, 0x4E, 0x44, // IEND chunk
        0xAE, 0x42, 0x60, 0x82,
    ]
}

fn png_form(field: &str) -> MultipartForm {
    MultipartForm::new().add_part(
        field,
        Part::bytes(png_bytes()).file_name("cover.png").mime_type("image/png"),
    )
}

#[tokio::test]
async fn upload_then_serve_image() {
    let env = common::TestEnv::start_with_storage().await;
    let server = env.server();
    let author = env.login("author-1", Role::Author).await;

    let response = server
        .post("/api/v1/upload-image")
        .authorization_bearer(&author)
        .multipart(png_form("file"))
        .await;
    let body: serde_json::Value = response.json();
    let url = body["url"].as_str().expect("Response should contain url");
    assert!(url.starts_with("/api/v1/image/"), "unexpected url: {url}");
    assert!(url.ends_with("cover.png"), "unexpected url: {url}");

    let image = server.get(url).await;
    assert_eq!(image.header("content-type"), "image/png");
    assert_eq!(image.as_bytes().to_vec(), png_bytes());
}

#[tokio::test]
async fn upload_rules() {
    let env = common::TestEnv::start_with_storage().await;
    let server = env.server_permissive();
    let author = env.login("author-1", Role::Author).await;
    let student = env.login("student-1", Role::Student).await;

    server
        .post("/api/v1/upload-image")
        .authorization_bearer(&student)
        .multipart(png_form("file"))
        .await
        .assert_status_forbidden();

    let text = MultipartForm::new().add_part(
        "file",
        Part::bytes(b"hello world".to_vec()).file_name("notes.txt").mime_type("text/plain"),
    );
    server
        .post("/api/v1/upload-image")
        .authorization_bearer(&author)
        .multipart(text)
        .await
        .assert_status_bad_request();

    server
        .post("/api/v1/upload-image")
        .authorization_bearer(&author)
        .multipart(png_form("wrong_field"))
        .await
        .assert_status_bad_request();

    server
        .get("/api/v1/image/0_missing.png")
        .await
        .assert_status_not_found();
}

#[tokio::test]
async fn storage_not_configured() {
    let env = common::TestEnv::start().await;
    let server = env.server_permissive();
    let author = env.login("author-1", Role::Author).await;

    server
        .post("/api/v1/upload-image")
        .authorization_bearer(&author)
        .multipart(png_form("file"))
        .await
        .assert_status(axum::http::StatusCode::SERVICE_UNAVAILABLE);
    server
        .get("/api/v1/image/anything.png")
        .await
        .assert_status(axum::http::StatusCode::SERVICE_UNAVAILABLE);
}
