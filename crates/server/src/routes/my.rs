use axum::{
    extract::{DefaultBodyLimit, Multipart, State},
    routing::{get, patch},
    Router,
};
use serde::{Deserialize, Serialize};

use crate::{
    db::{
        files::{self, POST_OWNER},
        grass,
        models::{Grass, Notification, ScrappedPost, User},
        notifications::{self, NotificationKind},
        scraps,
        users::{self, ProfileChanges, UserStats},
    },
    error::{AppError, Result},
    extract::{Json, Path},
    middleware::auth::AuthUser,
    routes::{
        auth::hash_password,
        posts::{find_post, MessageResponse, PostFile},
    },
    services::{
        notify,
        uploads::{FileField, UploadedForm, MAX_FILE_BYTES},
    },
    validate, AppState,
};

pub const PROFILE_IMAGE_FIELD: &str = "profileImage";

const PROFILE_FILE_FIELDS: [FileField; 1] = [FileField {
    name: PROFILE_IMAGE_FIELD,
    max_count: 1,
}];

pub fn router() -> Router<AppState> {
    Router::new()
        .route(
            "/profile",
            get(get_profile)
                .put(update_profile)
                .layer(DefaultBodyLimit::max(2 * MAX_FILE_BYTES)),
        )
        .route("/grass", get(get_grass))
        .route("/scraps", get(list_scraps).post(toggle_scrap))
        .route("/notifications", get(list_notifications))
        .route(
            "/notifications/:id",
            axum::routing::delete(delete_notification),
        )
        .route("/notifications/:id/read", patch(mark_notification_read))
}

#[derive(Debug, Serialize)]
pub struct ProfileResponse {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub message: Option<&'static str>,
    pub profile: User,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub stats: Option<UserStats>,
}

#[derive(Debug, Serialize)]
pub struct GrassResponse {
    pub grass: Vec<Grass>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ScrapRequest {
    pub post_id: i64,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ScrapToggleResponse {
    pub is_scrapped: bool,
}

#[derive(Debug, Serialize)]
pub struct ScrapEntry {
    #[serde(flatten)]
    pub scrap: ScrappedPost,
    pub files: Vec<PostFile>,
}

#[derive(Debug, Serialize)]
pub struct ScrapListResponse {
    pub scraps: Vec<ScrapEntry>,
}

#[derive(Debug, Serialize)]
pub struct NotificationListResponse {
    pub notifications: Vec<Notification>,
}

async fn find_user(state: &AppState, id: i64) -> Result<User> {
    users::find_by_id(&state.db.pool, id)
        .await?
        .ok_or_else(|| AppError::NotFound("User not found".to_string()))
}

async fn get_profile(
    State(state): State<AppState>,
    user: AuthUser,
) -> Result<Json<ProfileResponse>> {
    let profile = find_user(&state, user.id).await?;
    let stats = users::stats(&state.db.pool, user.id).await?;

    Ok(Json(ProfileResponse {
        message: None,
        profile,
        stats: Some(stats),
    }))
}

fn profile_changes(form: &UploadedForm) -> Result<ProfileChanges> {
    let mut changes = ProfileChanges::default();

    if let Some(email) = form.text("email") {
        validate::email(email)?;
        changes.email = Some(email.to_string());
    }
    if let Some(user_name) = form.text("userName") {
        changes.user_name = Some(user_name.to_string());
    }
    // An empty value clears the desired job
    if let Some(job) = form.field("desiredJob") {
        changes.desired_job = Some(job.to_string());
    }
    if let Some(password) = form.text("password") {
        validate::password(password)?;
        changes.password_hash = Some(hash_password(password)?);
    }
    if let Some(image) = form.single_file(PROFILE_IMAGE_FIELD) {
        changes.profile_image = Some(image.path.clone());
    }

    Ok(changes)
}

async fn update_profile(
    State(state): State<AppState>,
    user: AuthUser,
    multipart: Multipart,
) -> Result<Json<ProfileResponse>> {
    let previous = find_user(&state, user.id).await?;
    let form = UploadedForm::collect(multipart, &state.uploads, &PROFILE_FILE_FIELDS).await?;

    let changes = match profile_changes(&form) {
        Ok(changes) => changes,
        Err(e) => {
            form.discard(&state.uploads).await;
            return Err(e);
        }
    };

    if !changes.is_empty() {
        if let Err(e) = users::update_profile(&state.db.pool, user.id, &changes).await {
            form.discard(&state.uploads).await;
            return Err(match AppError::from(e) {
                AppError::Conflict(_) => {
                    AppError::Conflict("Email is already registered".to_string())
                }
                other => other,
            });
        }
    }

    // The replaced image has no other owner
    if let (Some(_), Some(old)) = (&changes.profile_image, &previous.profile_image) {
        state.uploads.remove_all(std::slice::from_ref(old)).await;
    }

    let profile = find_user(&state, user.id).await?;
    Ok(Json(ProfileResponse {
        message: Some("Profile updated"),
        profile,
        stats: None,
    }))
}

async fn get_grass(
    State(state): State<AppState>,
    user: AuthUser,
) -> Result<Json<GrassResponse>> {
    let grass = grass::list_recent(&state.db.pool, user.id).await?;
    Ok(Json(GrassResponse { grass }))
}

async fn toggle_scrap(
    State(state): State<AppState>,
    user: AuthUser,
    Json(body): Json<ScrapRequest>,
) -> Result<Json<ScrapToggleResponse>> {
    let post = find_post(&state.db.pool, body.post_id).await?;

    let mut tx = state.db.pool.begin().await?;
    let is_scrapped = scraps::toggle(&mut tx, post.id, user.id).await?;
    tx.commit().await?;

    if is_scrapped {
        notify::send(
            &state.db.pool,
            post.user_id,
            user.id,
            NotificationKind::Scrap,
            post.id,
            &format!("Someone scrapped your post \"{}\"", post.title),
        )
        .await;
    }

    Ok(Json(ScrapToggleResponse { is_scrapped }))
}

async fn list_scraps(
    State(state): State<AppState>,
    user: AuthUser,
) -> Result<Json<ScrapListResponse>> {
    let rows = scraps::list_by_user(&state.db.pool, user.id).await?;

    let mut scraps = Vec::with_capacity(rows.len());
    for scrap in rows {
        let files = files::list_by_owner(&state.db.pool, POST_OWNER, scrap.post_id)
            .await?
            .into_iter()
            .map(|f| PostFile::from_record(f, scrap.main_image_id))
            .collect();
        scraps.push(ScrapEntry { scrap, files });
    }

    Ok(Json(ScrapListResponse { scraps }))
}

async fn list_notifications(
    State(state): State<AppState>,
    user: AuthUser,
) -> Result<Json<NotificationListResponse>> {
    let notifications = notifications::list_by_user(&state.db.pool, user.id).await?;
    Ok(Json(NotificationListResponse { notifications }))
}

async fn mark_notification_read(
    State(state): State<AppState>,
    user: AuthUser,
    Path(id): Path<i64>,
) -> Result<Json<MessageResponse>> {
    if !notifications::mark_read(&state.db.pool, id, user.id).await? {
        return Err(AppError::NotFound("Notification not found".to_string()));
    }
    Ok(Json(MessageResponse {
        message: "Notification marked as read",
    }))
}

async fn delete_notification(
    State(state): State<AppState>,
    user: AuthUser,
    Path(id): Path<i64>,
) -> Result<Json<MessageResponse>> {
    if !notifications::delete(&state.db.pool, id, user.id).await? {
        return Err(AppError::NotFound("Notification not found".to_string()));
    }
    Ok(Json(MessageResponse {
        message: "Notification deleted",
    }))
}
