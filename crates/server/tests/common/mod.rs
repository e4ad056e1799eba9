#![allow(dead_code)]

use std::path::PathBuf;

use axum::{
    body::{to_bytes, Body},
    http::{header, Method, Request, StatusCode},
    Router,
};
use serde_json::{json, Value};
use tower::ServiceExt;
use uuid::Uuid;

use studylog_server::{build_router, config::Config, db::Database, AppState};

pub const PASSWORD: &str = "password123";

pub struct TestApp {
    pub router: Router,
    pub state: AppState,
    db_file: Option<PathBuf>,
}

impl TestApp {
    /// App over a single-connection in-memory database.
    pub async fn spawn() -> Self {
        let db = Database::in_memory().await.expect("in-memory database");
        Self::with_database(db, None).await
    }

    /// App over a temporary database file with a multi-connection pool, so
    /// concurrent requests really run side by side.
    pub async fn spawn_on_disk() -> Self {
        let path = std::env::temp_dir().join(format!("studylog-test-{}.db", Uuid::new_v4()));
        let db = Database::connect(&format!("sqlite:{}?mode=rwc", path.display()))
            .await
            .expect("file database");
        Self::with_database(db, Some(path)).await
    }

    async fn with_database(db: Database, db_file: Option<PathBuf>) -> Self {
        db.run_migrations().await.expect("migrations");

        let upload_dir = std::env::temp_dir().join(format!("studylog-test-{}", Uuid::new_v4()));
        let config = Config {
            port: 0,
            database_url: "sqlite::memory:".to_string(),
            upload_dir: upload_dir.to_string_lossy().into_owned(),
            jwt_secret: "test-secret".to_string(),
            jwt_expires_in_secs: 3600,
        };

        let state = AppState::new(db, config);
        state.uploads.init().await.expect("upload dir");

        Self {
            router: build_router(state.clone()),
            state,
            db_file,
        }
    }

    pub fn upload_dir(&self) -> PathBuf {
        self.state.uploads.base_path().to_path_buf()
    }

    /// Number of files currently stored in the upload directory.
    pub fn stored_files(&self) -> usize {
        std::fs::read_dir(self.upload_dir())
            .map(|entries| entries.count())
            .unwrap_or(0)
    }

    pub async fn send(&self, request: Request<Body>) -> (StatusCode, Value) {
        let response = self
            .router
            .clone()
            .oneshot(request)
            .await
            .expect("router is infallible");
        let status = response.status();
        let bytes = to_bytes(response.into_body(), usize::MAX)
            .await
            .expect("read body");
        let body = if bytes.is_empty() {
            Value::Null
        } else {
            serde_json::from_slice(&bytes)
                .unwrap_or_else(|_| Value::String(String::from_utf8_lossy(&bytes).into_owned()))
        };
        (status, body)
    }

    pub async fn json(
        &self,
        method: Method,
        uri: &str,
        token: Option<&str>,
        body: Option<Value>,
    ) -> (StatusCode, Value) {
        let mut builder = Request::builder().method(method).uri(uri);
        if let Some(token) = token {
            builder = builder.header(header::AUTHORIZATION, format!("Bearer {token}"));
        }
        let request = match body {
            Some(body) => builder
                .header(header::CONTENT_TYPE, "application/json")
                .body(Body::from(body.to_string())),
            None => builder.body(Body::empty()),
        }
        .expect("request");
        self.send(request).await
    }

    pub async fn get(&self, uri: &str, token: Option<&str>) -> (StatusCode, Value) {
        self.json(Method::GET, uri, token, None).await
    }

    pub async fn multipart(
        &self,
        method: Method,
        uri: &str,
        token: &str,
        form: MultipartForm,
    ) -> (StatusCode, Value) {
        let (content_type, body) = form.finish();
        let request = Request::builder()
            .method(method)
            .uri(uri)
            .header(header::AUTHORIZATION, format!("Bearer {token}"))
            .header(header::CONTENT_TYPE, content_type)
            .body(Body::from(body))
            .expect("request");
        self.send(request).await
    }

    /// Signs up a fresh user and returns (token, user id).
    pub async fn signup(&self, email: &str, user_name: &str) -> (String, i64) {
        let (status, body) = self
            .json(
                Method::POST,
                "/auth/signup",
                None,
                Some(json!({ "email": email, "password": PASSWORD, "userName": user_name })),
            )
            .await;
        assert_eq!(status, StatusCode::CREATED, "signup failed: {body}");
        (
            body["token"].as_str().expect("token").to_string(),
            body["user"]["id"].as_i64().expect("user id"),
        )
    }

    pub async fn login(&self, email: &str) -> String {
        let (status, body) = self
            .json(
                Method::POST,
                "/auth/login",
                None,
                Some(json!({ "email": email, "password": PASSWORD })),
            )
            .await;
        assert_eq!(status, StatusCode::OK, "login failed: {body}");
        body["token"].as_str().expect("token").to_string()
    }

    /// Creates a post without files and returns its id.
    pub async fn create_post(&self, token: &str, title: &str, post_type: &str) -> i64 {
        let form = MultipartForm::new()
            .text("title", title)
            .text("type", post_type)
            .text("content", "post body text");
        let (status, body) = self.multipart(Method::POST, "/post", token, form).await;
        assert_eq!(status, StatusCode::CREATED, "create post failed: {body}");
        body["post"]["id"].as_i64().expect("post id")
    }

    pub async fn create_comment(&self, token: &str, post_id: i64, content: &str) -> i64 {
        let (status, body) = self
            .json(
                Method::POST,
                &format!("/post/{post_id}/comments"),
                Some(token),
                Some(json!({ "content": content })),
            )
            .await;
        assert_eq!(status, StatusCode::CREATED, "create comment failed: {body}");
        body["comment"]["id"].as_i64().expect("comment id")
    }
}

impl Drop for TestApp {
    fn drop(&mut self) {
        let _ = std::fs::remove_dir_all(self.upload_dir());
        if let Some(path) = &self.db_file {
            for suffix in ["", "-wal", "-shm"] {
                let mut file = path.clone().into_os_string();
                file.push(suffix);
                let _ = std::fs::remove_file(file);
            }
        }
    }
}

/// Minimal multipart/form-data encoder for request bodies.
pub struct MultipartForm {
    boundary: String,
    body: Vec<u8>,
}

impl MultipartForm {
    pub fn new() -> Self {
        Self {
            boundary: format!("----studylog{}", Uuid::new_v4().simple()),
            body: Vec::new(),
        }
    }

    pub fn text(mut self, name: &str, value: &str) -> Self {
        self.body.extend_from_slice(
            format!(
                "--{}\r\nContent-Disposition: form-data; name=\"{name}\"\r\n\r\n{value}\r\n",
                self.boundary
            )
            .as_bytes(),
        );
        self
    }

    pub fn file(mut self, name: &str, file_name: &str, data: &[u8]) -> Self {
        self.body.extend_from_slice(
            format!(
                "--{}\r\nContent-Disposition: form-data; name=\"{name}\"; filename=\"{file_name}\"\r\nContent-Type: application/octet-stream\r\n\r\n",
                self.boundary
            )
            .as_bytes(),
        );
        self.body.extend_from_slice(data);
        self.body.extend_from_slice(b"\r\n");
        self
    }

    pub fn finish(mut self) -> (String, Vec<u8>) {
        self.body
            .extend_from_slice(format!("--{}--\r\n", self.boundary).as_bytes());
        (
            format!("multipart/form-data; boundary={}", self.boundary),
            self.body,
        )
    }
}
