use axum::{
    extract::{DefaultBodyLimit, Multipart, State},
    http::StatusCode,
    routing::get,
    Router,
};
use serde::{Deserialize, Serialize};
use sqlx::{SqliteConnection, SqlitePool};

use crate::{
    db::{
        comments,
        files::{self, NewFile, POST_OWNER},
        grass::Activity,
        likes,
        models::{FileRecord, Post, PostSummary},
        posts::{self, ListFilter},
    },
    error::{AppError, Result},
    extract::{Json, Path, Query},
    middleware::auth::AuthUser,
    services::{
        activity,
        uploads::{FileField, UploadedForm, MAX_FILE_BYTES},
    },
    validate, AppState,
};

pub const MAIN_IMAGE_FIELD: &str = "mainImage";
pub const ATTACHMENT_FIELD: &str = "files";
pub const MAX_ATTACHMENTS: usize = 10;

const POST_FILE_FIELDS: [FileField; 2] = [
    FileField {
        name: MAIN_IMAGE_FIELD,
        max_count: 1,
    },
    FileField {
        name: ATTACHMENT_FIELD,
        max_count: MAX_ATTACHMENTS,
    },
];

// Room for a full set of files plus the text fields
const POST_BODY_LIMIT: usize = (MAX_ATTACHMENTS + 2) * MAX_FILE_BYTES;

const DEFAULT_PAGE_SIZE: i64 = 10;
const MAX_PAGE_SIZE: i64 = 100;

pub fn router() -> Router<AppState> {
    Router::new()
        .route("/", get(list_posts).post(create_post))
        .route("/:id", get(get_post).put(update_post).delete(delete_post))
        .layer(DefaultBodyLimit::max(POST_BODY_LIMIT))
}

#[derive(Debug, Default, Deserialize)]
pub struct ListQuery {
    pub page: Option<i64>,
    pub limit: Option<i64>,
    #[serde(rename = "type")]
    pub post_type: Option<String>,
    pub keyword: Option<String>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Pagination {
    pub page: i64,
    pub limit: i64,
    pub total: i64,
    pub total_pages: i64,
}

impl Pagination {
    pub fn new(page: Option<i64>, limit: Option<i64>, total: i64) -> Self {
        let page = page.unwrap_or(1).max(1);
        let limit = limit.unwrap_or(DEFAULT_PAGE_SIZE).clamp(1, MAX_PAGE_SIZE);
        let total_pages = (total + limit - 1) / limit;
        Self {
            page,
            limit,
            total,
            total_pages,
        }
    }

    pub fn offset(&self) -> i64 {
        (self.page - 1).saturating_mul(self.limit)
    }
}

#[derive(Debug, Serialize)]
pub struct PostListResponse {
    pub posts: Vec<PostSummary>,
    pub pagination: Pagination,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct PostFile {
    pub id: i64,
    pub path: String,
    pub original_name: String,
    pub seq: i64,
    pub is_main_image: bool,
}

impl PostFile {
    pub fn from_record(file: FileRecord, main_image_id: Option<i64>) -> Self {
        Self {
            is_main_image: main_image_id == Some(file.id),
            id: file.id,
            path: file.path,
            original_name: file.original_name,
            seq: file.seq,
        }
    }
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct PostDetail {
    #[serde(flatten)]
    pub post: Post,
    pub main_image: Option<String>,
    pub files: Vec<PostFile>,
    pub like_count: i64,
    pub comment_count: i64,
}

#[derive(Debug, Serialize)]
pub struct PostResponse {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub message: Option<&'static str>,
    pub post: PostDetail,
}

#[derive(Debug, Serialize)]
pub struct MessageResponse {
    pub message: &'static str,
}

pub(crate) async fn find_post(pool: &SqlitePool, id: i64) -> Result<Post> {
    posts::find_by_id(pool, id)
        .await?
        .ok_or_else(|| AppError::NotFound("Post not found".to_string()))
}

async fn load_detail(pool: &SqlitePool, id: i64) -> Result<PostDetail> {
    let post = find_post(pool, id).await?;
    let files = files::list_by_owner(pool, POST_OWNER, id).await?;
    let like_count = likes::count_by_post(pool, id).await?;
    let comment_count = comments::count_by_post(pool, id).await?;

    let main_image = files
        .iter()
        .find(|f| post.main_image_id == Some(f.id))
        .map(|f| f.path.clone());

    let files = files
        .into_iter()
        .map(|f| PostFile::from_record(f, post.main_image_id))
        .collect();

    Ok(PostDetail {
        post,
        main_image,
        files,
        like_count,
        comment_count,
    })
}

/// Records the form's files against the post, numbering them from `seq`.
/// The main image is stored first and becomes the post's main image.
async fn attach_uploads(
    conn: &mut SqliteConnection,
    post_id: i64,
    user_id: i64,
    form: &UploadedForm,
    mut seq: i64,
) -> Result<()> {
    if let Some(image) = form.single_file(MAIN_IMAGE_FIELD) {
        let file_id = files::create(
            &mut *conn,
            NewFile {
                owner_type: POST_OWNER,
                owner_id: post_id,
                path: &image.path,
                original_name: &image.original_name,
                seq,
                user_id,
            },
        )
        .await?;
        seq += 1;
        posts::set_main_image(&mut *conn, post_id, file_id).await?;
    }

    for file in form.files(ATTACHMENT_FIELD) {
        files::create(
            &mut *conn,
            NewFile {
                owner_type: POST_OWNER,
                owner_id: post_id,
                path: &file.path,
                original_name: &file.original_name,
                seq,
                user_id,
            },
        )
        .await?;
        seq += 1;
    }

    Ok(())
}

struct PostInput<'a> {
    title: &'a str,
    post_type: &'a str,
    content: &'a str,
}

fn validate_content(content: Option<&str>) -> Result<&str> {
    let content = validate::required(content, "content")?;
    if content.chars().count() < validate::MIN_POST_CONTENT_LEN {
        return Err(AppError::Validation(format!(
            "content must be at least {} characters",
            validate::MIN_POST_CONTENT_LEN
        )));
    }
    Ok(content)
}

fn validate_new_post(form: &UploadedForm) -> Result<PostInput<'_>> {
    Ok(PostInput {
        title: validate::required(form.text("title"), "title")?,
        post_type: validate::required(form.text("type"), "type")?,
        content: validate_content(form.text("content"))?,
    })
}

async fn insert_post(
    pool: &SqlitePool,
    user_id: i64,
    input: &PostInput<'_>,
    form: &UploadedForm,
) -> Result<i64> {
    let mut tx = pool.begin().await?;
    let post_id = posts::create(
        &mut *tx,
        input.title,
        input.post_type,
        input.content,
        user_id,
    )
    .await?;
    attach_uploads(&mut tx, post_id, user_id, form, 0).await?;
    tx.commit().await?;
    Ok(post_id)
}

async fn rewrite_post(
    pool: &SqlitePool,
    post_id: i64,
    user_id: i64,
    title: &str,
    content: &str,
    form: &UploadedForm,
) -> Result<()> {
    let mut tx = pool.begin().await?;
    posts::update_content(&mut *tx, post_id, title, content).await?;
    let seq = files::next_seq(&mut *tx, POST_OWNER, post_id).await?;
    attach_uploads(&mut tx, post_id, user_id, form, seq).await?;
    tx.commit().await?;
    Ok(())
}

async fn list_posts(
    State(state): State<AppState>,
    Query(query): Query<ListQuery>,
) -> Result<Json<PostListResponse>> {
    let filter = ListFilter {
        post_type: query
            .post_type
            .map(|t| t.trim().to_string())
            .filter(|t| !t.is_empty()),
        keyword: query
            .keyword
            .map(|k| k.trim().to_string())
            .filter(|k| !k.is_empty()),
    };

    let total = posts::count(&state.db.pool, &filter).await?;
    let pagination = Pagination::new(query.page, query.limit, total);
    let posts = posts::list(
        &state.db.pool,
        &filter,
        pagination.limit,
        pagination.offset(),
    )
    .await?;

    Ok(Json(PostListResponse { posts, pagination }))
}

async fn get_post(
    State(state): State<AppState>,
    Path(id): Path<i64>,
) -> Result<Json<PostResponse>> {
    if !posts::increment_views(&state.db.pool, id).await? {
        return Err(AppError::NotFound("Post not found".to_string()));
    }

    let post = load_detail(&state.db.pool, id).await?;
    Ok(Json(PostResponse {
        message: None,
        post,
    }))
}

async fn create_post(
    State(state): State<AppState>,
    user: AuthUser,
    multipart: Multipart,
) -> Result<(StatusCode, Json<PostResponse>)> {
    let form = UploadedForm::collect(multipart, &state.uploads, &POST_FILE_FIELDS).await?;

    let input = match validate_new_post(&form) {
        Ok(input) => input,
        Err(e) => {
            form.discard(&state.uploads).await;
            return Err(e);
        }
    };

    let post_id = match insert_post(&state.db.pool, user.id, &input, &form).await {
        Ok(id) => id,
        Err(e) => {
            form.discard(&state.uploads).await;
            return Err(e);
        }
    };

    activity::record(&state.db.pool, user.id, Activity::Post).await;
    tracing::info!("User {} created post {post_id}", user.id);

    let post = load_detail(&state.db.pool, post_id).await?;
    Ok((
        StatusCode::CREATED,
        Json(PostResponse {
            message: Some("Post created"),
            post,
        }),
    ))
}

async fn update_post(
    State(state): State<AppState>,
    user: AuthUser,
    Path(id): Path<i64>,
    multipart: Multipart,
) -> Result<Json<PostResponse>> {
    let existing = find_post(&state.db.pool, id).await?;
    if existing.user_id != user.id {
        return Err(AppError::Forbidden(
            "Only the author can edit this post".to_string(),
        ));
    }

    let form = UploadedForm::collect(multipart, &state.uploads, &POST_FILE_FIELDS).await?;

    // The type is fixed at creation; a submitted `type` field is ignored
    let fields = validate::required(form.text("title"), "title")
        .and_then(|title| Ok((title, validate_content(form.text("content"))?)));
    let (title, content) = match fields {
        Ok(fields) => fields,
        Err(e) => {
            form.discard(&state.uploads).await;
            return Err(e);
        }
    };

    if let Err(e) = rewrite_post(&state.db.pool, id, user.id, title, content, &form).await {
        form.discard(&state.uploads).await;
        return Err(e);
    }

    let post = load_detail(&state.db.pool, id).await?;
    Ok(Json(PostResponse {
        message: Some("Post updated"),
        post,
    }))
}

async fn delete_post(
    State(state): State<AppState>,
    user: AuthUser,
    Path(id): Path<i64>,
) -> Result<Json<MessageResponse>> {
    let post = find_post(&state.db.pool, id).await?;
    if post.user_id != user.id {
        return Err(AppError::Forbidden(
            "Only the author can delete this post".to_string(),
        ));
    }

    let attached: Vec<String> = files::list_by_owner(&state.db.pool, POST_OWNER, id)
        .await?
        .into_iter()
        .map(|f| f.path)
        .collect();
    let commenter_days = comments::commenter_days(&state.db.pool, id).await?;

    // Comments, likes and scraps go with the post via ON DELETE CASCADE
    let mut tx = state.db.pool.begin().await?;
    files::delete_by_owner(&mut *tx, POST_OWNER, id).await?;
    posts::delete(&mut *tx, id).await?;
    tx.commit().await?;

    state.uploads.remove_all(&attached).await;

    activity::reconcile(&state.db.pool, user.id, &post.created_at, Activity::Post).await;
    for (commenter, day) in &commenter_days {
        activity::reconcile(&state.db.pool, *commenter, day, Activity::Comment).await;
    }
    tracing::info!("User {} deleted post {id}", user.id);

    Ok(Json(MessageResponse {
        message: "Post deleted",
    }))
}
