use axum::{
    extract::State,
    routing::get,
    Router,
};
use serde::Serialize;

use crate::{
    db::likes,
    error::Result,
    extract::{Json, Path},
    middleware::auth::AuthUser,
    routes::posts::find_post,
    AppState,
};

pub fn router() -> Router<AppState> {
    Router::new()
        .route("/:id/like", get(like_status).post(toggle_like))
        .route("/:id/like/count", get(like_count))
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct LikeStatusResponse {
    pub is_liked: bool,
    pub like_count: i64,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct LikeCountResponse {
    pub like_count: i64,
}

async fn toggle_like(
    State(state): State<AppState>,
    user: AuthUser,
    Path(post_id): Path<i64>,
) -> Result<Json<LikeStatusResponse>> {
    find_post(&state.db.pool, post_id).await?;

    let mut tx = state.db.pool.begin().await?;
    let is_liked = likes::toggle(&mut tx, post_id, user.id).await?;
    tx.commit().await?;

    let like_count = likes::count_by_post(&state.db.pool, post_id).await?;
    Ok(Json(LikeStatusResponse {
        is_liked,
        like_count,
    }))
}

async fn like_status(
    State(state): State<AppState>,
    user: AuthUser,
    Path(post_id): Path<i64>,
) -> Result<Json<LikeStatusResponse>> {
    find_post(&state.db.pool, post_id).await?;

    let is_liked = likes::is_liked(&state.db.pool, post_id, user.id).await?;
    let like_count = likes::count_by_post(&state.db.pool, post_id).await?;
    Ok(Json(LikeStatusResponse {
        is_liked,
        like_count,
    }))
}

async fn like_count(
    State(state): State<AppState>,
    Path(post_id): Path<i64>,
) -> Result<Json<LikeCountResponse>> {
    find_post(&state.db.pool, post_id).await?;

    let like_count = likes::count_by_post(&state.db.pool, post_id).await?;
    Ok(Json(LikeCountResponse { like_count }))
}
