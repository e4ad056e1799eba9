use axum::{
    extract::State,
    http::StatusCode,
    routing::{get, patch},
    Router,
};
use serde::{Deserialize, Serialize};
use sqlx::SqlitePool;

use crate::{
    db::{
        comments,
        grass::Activity,
        models::Comment,
        notifications::NotificationKind,
        posts,
    },
    error::{AppError, Result},
    extract::{Json, Path},
    middleware::auth::AuthUser,
    routes::posts::{find_post, MessageResponse},
    services::{activity, notify},
    validate, AppState,
};

pub fn router() -> Router<AppState> {
    Router::new()
        .route("/:id/comments", get(list_comments).post(create_comment))
        .route(
            "/:id/comments/:comment_id",
            get(get_comment).put(update_comment).delete(delete_comment),
        )
        .route("/:id/comments/:comment_id/select", patch(select_comment))
}

#[derive(Debug, Deserialize)]
pub struct CommentRequest {
    pub content: String,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct CommentsListResponse {
    pub comments: Vec<Comment>,
    pub comment_count: usize,
}

#[derive(Debug, Serialize)]
pub struct CommentResponse {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub message: Option<&'static str>,
    pub comment: Comment,
}

async fn find_comment(pool: &SqlitePool, id: i64) -> Result<Comment> {
    comments::find_by_id(pool, id)
        .await?
        .ok_or_else(|| AppError::NotFound("Comment not found".to_string()))
}

/// A comment addressed through a post it does not belong to is reported as
/// missing.
async fn find_comment_on_post(pool: &SqlitePool, post_id: i64, id: i64) -> Result<Comment> {
    let comment = find_comment(pool, id).await?;
    if comment.post_id != post_id {
        return Err(AppError::NotFound("Comment not found".to_string()));
    }
    Ok(comment)
}

async fn list_comments(
    State(state): State<AppState>,
    Path(post_id): Path<i64>,
) -> Result<Json<CommentsListResponse>> {
    find_post(&state.db.pool, post_id).await?;

    let comments = comments::list_by_post(&state.db.pool, post_id).await?;
    Ok(Json(CommentsListResponse {
        comment_count: comments.len(),
        comments,
    }))
}

async fn get_comment(
    State(state): State<AppState>,
    Path((post_id, id)): Path<(i64, i64)>,
) -> Result<Json<CommentResponse>> {
    let comment = find_comment_on_post(&state.db.pool, post_id, id).await?;
    Ok(Json(CommentResponse {
        message: None,
        comment,
    }))
}

async fn create_comment(
    State(state): State<AppState>,
    user: AuthUser,
    Path(post_id): Path<i64>,
    Json(body): Json<CommentRequest>,
) -> Result<(StatusCode, Json<CommentResponse>)> {
    let content = validate::required(Some(&body.content), "content")?;
    let post = find_post(&state.db.pool, post_id).await?;

    let id = comments::create(&state.db.pool, post_id, user.id, content).await?;
    let comment = find_comment(&state.db.pool, id).await?;

    notify::send(
        &state.db.pool,
        post.user_id,
        user.id,
        NotificationKind::Comment,
        post_id,
        &format!("{} commented on your post \"{}\"", comment.author_name, post.title),
    )
    .await;
    activity::record(&state.db.pool, user.id, Activity::Comment).await;

    Ok((
        StatusCode::CREATED,
        Json(CommentResponse {
            message: Some("Comment created"),
            comment,
        }),
    ))
}

async fn update_comment(
    State(state): State<AppState>,
    user: AuthUser,
    Path((post_id, id)): Path<(i64, i64)>,
    Json(body): Json<CommentRequest>,
) -> Result<Json<CommentResponse>> {
    let content = validate::required(Some(&body.content), "content")?;

    let existing = find_comment_on_post(&state.db.pool, post_id, id).await?;
    if existing.user_id != user.id {
        return Err(AppError::Forbidden(
            "Only the author can edit this comment".to_string(),
        ));
    }

    comments::update_content(&state.db.pool, id, user.id, content).await?;
    let comment = find_comment(&state.db.pool, id).await?;

    Ok(Json(CommentResponse {
        message: Some("Comment updated"),
        comment,
    }))
}

async fn delete_comment(
    State(state): State<AppState>,
    user: AuthUser,
    Path((post_id, id)): Path<(i64, i64)>,
) -> Result<Json<MessageResponse>> {
    let existing = find_comment_on_post(&state.db.pool, post_id, id).await?;
    if existing.user_id != user.id {
        return Err(AppError::Forbidden(
            "Only the author can delete this comment".to_string(),
        ));
    }

    comments::delete(&state.db.pool, id, user.id).await?;
    activity::reconcile(
        &state.db.pool,
        user.id,
        &existing.created_at,
        Activity::Comment,
    )
    .await;

    Ok(Json(MessageResponse {
        message: "Comment deleted",
    }))
}

async fn select_comment(
    State(state): State<AppState>,
    user: AuthUser,
    Path((post_id, id)): Path<(i64, i64)>,
) -> Result<Json<CommentResponse>> {
    let post = find_post(&state.db.pool, post_id).await?;
    if post.user_id != user.id {
        return Err(AppError::Forbidden(
            "Only the post author can accept an answer".to_string(),
        ));
    }

    let comment = find_comment(&state.db.pool, id).await?;
    if comment.post_id != post_id {
        return Err(AppError::Validation(
            "Comment does not belong to this post".to_string(),
        ));
    }
    if comment.is_selected {
        return Err(AppError::Conflict("Comment is already selected".to_string()));
    }

    let mut tx = state.db.pool.begin().await?;
    if !comments::select(&mut *tx, id, post_id).await? {
        return Err(AppError::Conflict(
            "This post already has an accepted answer".to_string(),
        ));
    }
    posts::mark_solved(&mut *tx, post_id).await?;
    tx.commit().await?;

    let comment = find_comment(&state.db.pool, id).await?;

    notify::send(
        &state.db.pool,
        comment.user_id,
        user.id,
        NotificationKind::CommentSelected,
        post_id,
        &format!("Your comment on \"{}\" was accepted", post.title),
    )
    .await;

    Ok(Json(CommentResponse {
        message: Some("Answer accepted"),
        comment,
    }))
}
