mod common;

use axum::http::{Method, StatusCode};
use serde_json::json;

use common::TestApp;

fn select_uri(post_id: i64, comment_id: i64) -> String {
    format!("/post/{post_id}/comments/{comment_id}/select")
}

#[tokio::test]
async fn comments_are_listed_in_creation_order() {
    let app = TestApp::spawn().await;
    let (author, _) = app.signup("ada@example.com", "ada").await;
    let (reader, _) = app.signup("bob@example.com", "bob").await;
    let post_id = app.create_post(&author, "Question", "qna").await;

    app.create_comment(&reader, post_id, "first").await;
    app.create_comment(&author, post_id, "second").await;
    app.create_comment(&reader, post_id, "third").await;

    let (status, body) = app.get(&format!("/post/{post_id}/comments"), None).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["commentCount"], 3);

    let comments = body["comments"].as_array().unwrap();
    let contents: Vec<_> = comments.iter().map(|c| c["content"].as_str().unwrap()).collect();
    assert_eq!(contents, ["first", "second", "third"]);
    let seqs: Vec<_> = comments.iter().map(|c| c["seq"].as_i64().unwrap()).collect();
    assert_eq!(seqs, [0, 1, 2]);
    assert_eq!(comments[0]["authorName"], "bob");
}

#[tokio::test]
async fn commenting_notifies_the_post_author_only() {
    let app = TestApp::spawn().await;
    let (author, _) = app.signup("ada@example.com", "ada").await;
    let (reader, _) = app.signup("bob@example.com", "bob").await;
    let post_id = app.create_post(&author, "Question", "qna").await;

    app.create_comment(&author, post_id, "self reply").await;
    let (_, body) = app.get("/my/notifications", Some(&author)).await;
    assert!(body["notifications"].as_array().unwrap().is_empty());

    app.create_comment(&reader, post_id, "an answer").await;
    let (_, body) = app.get("/my/notifications", Some(&author)).await;
    let notifications = body["notifications"].as_array().unwrap();
    assert_eq!(notifications.len(), 1);
    assert_eq!(notifications[0]["type"], "COMMENT");
    assert_eq!(notifications[0]["relatedValue"], post_id.to_string());
    assert_eq!(notifications[0]["isRead"], false);

    let (_, body) = app.get("/my/notifications", Some(&reader)).await;
    assert!(body["notifications"].as_array().unwrap().is_empty());
}

#[tokio::test]
async fn commenting_on_missing_post_is_not_found() {
    let app = TestApp::spawn().await;
    let (token, _) = app.signup("ada@example.com", "ada").await;

    let (status, _) = app
        .json(
            Method::POST,
            "/post/42/comments",
            Some(&token),
            Some(json!({ "content": "hello" })),
        )
        .await;
    assert_eq!(status, StatusCode::NOT_FOUND);
}

#[tokio::test]
async fn only_the_comment_author_can_edit_or_delete() {
    let app = TestApp::spawn().await;
    let (author, _) = app.signup("ada@example.com", "ada").await;
    let (commenter, _) = app.signup("bob@example.com", "bob").await;
    let post_id = app.create_post(&author, "Question", "qna").await;
    let comment_id = app.create_comment(&commenter, post_id, "original").await;
    let uri = format!("/post/{post_id}/comments/{comment_id}");

    let (status, _) = app
        .json(Method::PUT, &uri, Some(&author), Some(json!({ "content": "edited" })))
        .await;
    assert_eq!(status, StatusCode::FORBIDDEN);

    let (status, _) = app.json(Method::DELETE, &uri, Some(&author), None).await;
    assert_eq!(status, StatusCode::FORBIDDEN);

    let (status, body) = app
        .json(Method::PUT, &uri, Some(&commenter), Some(json!({ "content": "edited" })))
        .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["comment"]["content"], "edited");

    let (status, _) = app.json(Method::DELETE, &uri, Some(&commenter), None).await;
    assert_eq!(status, StatusCode::OK);

    let (status, _) = app.get(&uri, None).await;
    assert_eq!(status, StatusCode::NOT_FOUND);
}

#[tokio::test]
async fn comment_addressed_through_another_post_is_not_found() {
    let app = TestApp::spawn().await;
    let (author, _) = app.signup("ada@example.com", "ada").await;
    let first = app.create_post(&author, "First", "qna").await;
    let second = app.create_post(&author, "Second", "qna").await;
    let comment_id = app.create_comment(&author, first, "on first").await;

    let (status, _) = app
        .get(&format!("/post/{second}/comments/{comment_id}"), None)
        .await;
    assert_eq!(status, StatusCode::NOT_FOUND);
}

#[tokio::test]
async fn selecting_an_answer() {
    let app = TestApp::spawn().await;
    let (author, _) = app.signup("ada@example.com", "ada").await;
    let (answerer, _) = app.signup("bob@example.com", "bob").await;
    let post_id = app.create_post(&author, "Question", "qna").await;
    let other_post = app.create_post(&author, "Another", "qna").await;

    let answer = app.create_comment(&answerer, post_id, "try this").await;
    let runner_up = app.create_comment(&answerer, post_id, "or this").await;
    let stray = app.create_comment(&answerer, other_post, "elsewhere").await;

    // Only the post author may select
    let (status, _) = app
        .json(Method::PATCH, &select_uri(post_id, answer), Some(&answerer), None)
        .await;
    assert_eq!(status, StatusCode::FORBIDDEN);

    // The comment must belong to the post
    let (status, _) = app
        .json(Method::PATCH, &select_uri(post_id, stray), Some(&author), None)
        .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);

    let (status, body) = app
        .json(Method::PATCH, &select_uri(post_id, answer), Some(&author), None)
        .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["comment"]["isSelected"], true);

    let (_, body) = app.get(&format!("/post/{post_id}"), None).await;
    assert_eq!(body["post"]["isSolved"], true);

    // Selecting again, or selecting a second answer, conflicts
    let (status, _) = app
        .json(Method::PATCH, &select_uri(post_id, answer), Some(&author), None)
        .await;
    assert_eq!(status, StatusCode::CONFLICT);

    let (status, _) = app
        .json(Method::PATCH, &select_uri(post_id, runner_up), Some(&author), None)
        .await;
    assert_eq!(status, StatusCode::CONFLICT);

    let (_, body) = app.get(&format!("/post/{post_id}/comments"), None).await;
    let selected: Vec<_> = body["comments"]
        .as_array()
        .unwrap()
        .iter()
        .filter(|c| c["isSelected"] == true)
        .collect();
    assert_eq!(selected.len(), 1);

    let (_, body) = app.get("/my/notifications", Some(&answerer)).await;
    let kinds: Vec<_> = body["notifications"]
        .as_array()
        .unwrap()
        .iter()
        .map(|n| n["type"].as_str().unwrap().to_string())
        .collect();
    assert_eq!(kinds, ["COMMENT_SELECTED"]);
}

#[tokio::test]
async fn activity_flags_follow_posts_and_comments() {
    let app = TestApp::spawn().await;
    let (_, _) = app.signup("ada@example.com", "ada").await;
    let token = app.login("ada@example.com").await;

    let post_id = app.create_post(&token, "Today I learned", "free").await;
    let comment_id = app.create_comment(&token, post_id, "and more").await;

    let (_, body) = app.get("/my/grass", Some(&token)).await;
    let grass = body["grass"].as_array().unwrap();
    assert_eq!(grass.len(), 1);
    assert_eq!(grass[0]["isLogin"], true);
    assert_eq!(grass[0]["isPost"], true);
    assert_eq!(grass[0]["isComment"], true);
    assert_eq!(grass[0]["isCode"], false);

    app.json(
        Method::DELETE,
        &format!("/post/{post_id}/comments/{comment_id}"),
        Some(&token),
        None,
    )
    .await;

    let (_, body) = app.get("/my/grass", Some(&token)).await;
    assert_eq!(body["grass"][0]["isComment"], false);
    assert_eq!(body["grass"][0]["isPost"], true);
}
