mod common;

use axum::{
    body::Body,
    http::{header, Method, Request, StatusCode},
};
use serde_json::json;

use common::{TestApp, PASSWORD};
use studylog_server::routes::auth::decode_token;

async fn user_count(app: &TestApp) -> i64 {
    sqlx::query_scalar("SELECT COUNT(*) FROM users")
        .fetch_one(&app.state.db.pool)
        .await
        .unwrap()
}

#[tokio::test]
async fn signup_then_login_issues_token_for_same_user() {
    let app = TestApp::spawn().await;
    let (signup_token, user_id) = app.signup("ada@example.com", "ada").await;
    let login_token = app.login("ada@example.com").await;

    let secret = &app.state.config.jwt_secret;
    assert_eq!(decode_token(&signup_token, secret).unwrap().user_id, user_id);
    assert_eq!(decode_token(&login_token, secret).unwrap().user_id, user_id);
}

#[tokio::test]
async fn signup_response_hides_password_hash() {
    let app = TestApp::spawn().await;
    let (status, body) = app
        .json(
            Method::POST,
            "/auth/signup",
            None,
            Some(json!({ "email": "ada@example.com", "password": PASSWORD, "userName": "ada" })),
        )
        .await;

    assert_eq!(status, StatusCode::CREATED);
    assert_eq!(body["user"]["email"], "ada@example.com");
    assert_eq!(body["user"]["userName"], "ada");
    assert!(body["user"].get("passwordHash").is_none());
}

#[tokio::test]
async fn duplicate_signup_is_conflict_and_creates_nothing() {
    let app = TestApp::spawn().await;
    app.signup("ada@example.com", "ada").await;
    assert_eq!(user_count(&app).await, 1);

    let (status, body) = app
        .json(
            Method::POST,
            "/auth/signup",
            None,
            Some(json!({ "email": "ada@example.com", "password": PASSWORD, "userName": "other" })),
        )
        .await;

    assert_eq!(status, StatusCode::CONFLICT);
    assert!(body["message"].is_string());
    assert_eq!(user_count(&app).await, 1);
}

#[tokio::test]
async fn signup_rejects_bad_input() {
    let app = TestApp::spawn().await;

    let cases = [
        json!({ "email": "not-an-email", "password": PASSWORD, "userName": "ada" }),
        json!({ "email": "ada@example.com", "password": "short", "userName": "ada" }),
        json!({ "email": "ada@example.com", "password": PASSWORD, "userName": "  " }),
    ];
    for case in cases {
        let (status, _) = app
            .json(Method::POST, "/auth/signup", None, Some(case))
            .await;
        assert_eq!(status, StatusCode::BAD_REQUEST);
    }
    assert_eq!(user_count(&app).await, 0);
}

#[tokio::test]
async fn incomplete_or_malformed_json_is_a_validation_error() {
    let app = TestApp::spawn().await;

    let (status, body) = app
        .json(
            Method::POST,
            "/auth/signup",
            None,
            Some(json!({ "email": "a@b.io", "password": PASSWORD })),
        )
        .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert!(body["message"].as_str().unwrap().contains("userName"));

    let request = Request::builder()
        .method(Method::POST)
        .uri("/auth/login")
        .header(header::CONTENT_TYPE, "application/json")
        .body(Body::from("{\"email\": "))
        .unwrap();
    let (status, body) = app.send(request).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert!(body["message"].is_string());

    assert_eq!(user_count(&app).await, 0);
}

#[tokio::test]
async fn malformed_path_and_query_are_validation_errors() {
    let app = TestApp::spawn().await;

    let (status, body) = app.get("/post/not-a-number", None).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert!(body["message"].is_string());

    let (status, body) = app.get("/post?page=first", None).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert!(body["message"].is_string());
}

#[tokio::test]
async fn login_distinguishes_unknown_email_from_wrong_password() {
    let app = TestApp::spawn().await;
    app.signup("ada@example.com", "ada").await;

    let (status, _) = app
        .json(
            Method::POST,
            "/auth/login",
            None,
            Some(json!({ "email": "nobody@example.com", "password": PASSWORD })),
        )
        .await;
    assert_eq!(status, StatusCode::NOT_FOUND);

    let (status, _) = app
        .json(
            Method::POST,
            "/auth/login",
            None,
            Some(json!({ "email": "ada@example.com", "password": "wrong-password" })),
        )
        .await;
    assert_eq!(status, StatusCode::UNAUTHORIZED);
}

#[tokio::test]
async fn login_records_login_activity() {
    let app = TestApp::spawn().await;
    let (_, _) = app.signup("ada@example.com", "ada").await;
    let token = app.login("ada@example.com").await;

    let (status, body) = app.get("/my/grass", Some(&token)).await;
    assert_eq!(status, StatusCode::OK);
    let grass = body["grass"].as_array().unwrap();
    assert_eq!(grass.len(), 1);
    assert_eq!(grass[0]["isLogin"], true);
    assert_eq!(grass[0]["isPost"], false);
}

#[tokio::test]
async fn protected_routes_require_a_valid_token() {
    let app = TestApp::spawn().await;

    let (status, _) = app.get("/my/profile", None).await;
    assert_eq!(status, StatusCode::UNAUTHORIZED);

    let (status, _) = app.get("/my/profile", Some("garbage")).await;
    assert_eq!(status, StatusCode::UNAUTHORIZED);

    let (status, _) = app.get("/my/schedule", None).await;
    assert_eq!(status, StatusCode::UNAUTHORIZED);

    let (status, _) = app
        .json(
            Method::POST,
            "/post/1/comments",
            None,
            Some(json!({ "content": "hello" })),
        )
        .await;
    assert_eq!(status, StatusCode::UNAUTHORIZED);
}

#[tokio::test]
async fn token_for_deleted_user_is_rejected() {
    let app = TestApp::spawn().await;
    let (token, user_id) = app.signup("ada@example.com", "ada").await;

    sqlx::query("DELETE FROM users WHERE id = ?")
        .bind(user_id)
        .execute(&app.state.db.pool)
        .await
        .unwrap();

    let (status, _) = app.get("/my/profile", Some(&token)).await;
    assert_eq!(status, StatusCode::UNAUTHORIZED);
}

#[tokio::test]
async fn health_and_unknown_routes() {
    let app = TestApp::spawn().await;

    let (status, body) = app.get("/health", None).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body, "OK");

    let (status, body) = app.get("/does-not-exist", None).await;
    assert_eq!(status, StatusCode::NOT_FOUND);
    assert_eq!(body["message"], "Not found");
}
