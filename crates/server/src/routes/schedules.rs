use axum::{
    extract::State,
    http::StatusCode,
    routing::get,
    Router,
};
use serde::{Deserialize, Serialize};

use crate::{
    db::{models::Schedule, schedules},
    error::{AppError, Result},
    extract::{Json, Path, Query},
    middleware::auth::AuthUser,
    routes::posts::MessageResponse,
    validate, AppState,
};

pub fn router() -> Router<AppState> {
    Router::new()
        .route("/", get(list_schedules).post(create_schedule))
        .route(
            "/:id",
            get(get_schedule)
                .put(update_schedule)
                .delete(delete_schedule),
        )
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ScheduleRequest {
    pub title: String,
    pub description: Option<String>,
    pub schedule_date: String,
}

#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RangeQuery {
    pub start_date: Option<String>,
    pub end_date: Option<String>,
}

#[derive(Debug, Serialize)]
pub struct ScheduleResponse {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub message: Option<&'static str>,
    pub schedule: Schedule,
}

#[derive(Debug, Serialize)]
pub struct ScheduleListResponse {
    pub schedules: Vec<Schedule>,
}

struct ScheduleInput<'a> {
    title: &'a str,
    description: Option<&'a str>,
    date: String,
}

impl ScheduleRequest {
    fn validated(&self) -> Result<ScheduleInput<'_>> {
        let title = validate::required(Some(&self.title), "title")?;
        let date = validate::calendar_date(self.schedule_date.trim())?;
        let description = self
            .description
            .as_deref()
            .map(str::trim)
            .filter(|d| !d.is_empty());

        Ok(ScheduleInput {
            title,
            description,
            date: date.format("%Y-%m-%d").to_string(),
        })
    }
}

fn range_bound(value: Option<&str>) -> Result<Option<String>> {
    value
        .map(str::trim)
        .filter(|v| !v.is_empty())
        .map(|v| validate::calendar_date(v).map(|d| d.format("%Y-%m-%d").to_string()))
        .transpose()
}

/// Readable only by its owner; anyone else sees it as missing.
async fn find_own_schedule(state: &AppState, user: AuthUser, id: i64) -> Result<Schedule> {
    schedules::find_by_id(&state.db.pool, id)
        .await?
        .filter(|s| s.user_id == user.id)
        .ok_or_else(|| AppError::NotFound("Schedule not found".to_string()))
}

/// Mutations distinguish a foreign entry (403) from a missing one (404).
async fn check_schedule_owner(state: &AppState, user: AuthUser, id: i64) -> Result<()> {
    let schedule = schedules::find_by_id(&state.db.pool, id)
        .await?
        .ok_or_else(|| AppError::NotFound("Schedule not found".to_string()))?;

    if schedule.user_id != user.id {
        return Err(AppError::Forbidden(
            "Only the owner can change this schedule".to_string(),
        ));
    }
    Ok(())
}

async fn create_schedule(
    State(state): State<AppState>,
    user: AuthUser,
    Json(body): Json<ScheduleRequest>,
) -> Result<(StatusCode, Json<ScheduleResponse>)> {
    let input = body.validated()?;

    let id = schedules::create(
        &state.db.pool,
        user.id,
        input.title,
        input.description,
        &input.date,
    )
    .await?;
    let schedule = find_own_schedule(&state, user, id).await?;

    Ok((
        StatusCode::CREATED,
        Json(ScheduleResponse {
            message: Some("Schedule created"),
            schedule,
        }),
    ))
}

async fn list_schedules(
    State(state): State<AppState>,
    user: AuthUser,
    Query(range): Query<RangeQuery>,
) -> Result<Json<ScheduleListResponse>> {
    let start = range_bound(range.start_date.as_deref())?;
    let end = range_bound(range.end_date.as_deref())?;

    let schedules =
        schedules::list_by_user(&state.db.pool, user.id, start.as_deref(), end.as_deref())
            .await?;
    Ok(Json(ScheduleListResponse { schedules }))
}

async fn get_schedule(
    State(state): State<AppState>,
    user: AuthUser,
    Path(id): Path<i64>,
) -> Result<Json<ScheduleResponse>> {
    let schedule = find_own_schedule(&state, user, id).await?;
    Ok(Json(ScheduleResponse {
        message: None,
        schedule,
    }))
}

async fn update_schedule(
    State(state): State<AppState>,
    user: AuthUser,
    Path(id): Path<i64>,
    Json(body): Json<ScheduleRequest>,
) -> Result<Json<ScheduleResponse>> {
    let input = body.validated()?;
    check_schedule_owner(&state, user, id).await?;

    schedules::update(
        &state.db.pool,
        id,
        user.id,
        input.title,
        input.description,
        &input.date,
    )
    .await?;
    let schedule = find_own_schedule(&state, user, id).await?;

    Ok(Json(ScheduleResponse {
        message: Some("Schedule updated"),
        schedule,
    }))
}

async fn delete_schedule(
    State(state): State<AppState>,
    user: AuthUser,
    Path(id): Path<i64>,
) -> Result<Json<MessageResponse>> {
    check_schedule_owner(&state, user, id).await?;
    schedules::delete(&state.db.pool, id, user.id).await?;

    Ok(Json(MessageResponse {
        message: "Schedule deleted",
    }))
}
