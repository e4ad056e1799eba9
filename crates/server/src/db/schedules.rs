use chrono::Utc;
use sqlx::{QueryBuilder, Sqlite, SqliteExecutor};

use super::models::Schedule;

const SCHEDULE_COLUMNS: &str =
    "id, user_id, title, description, schedule_date, created_at, updated_at";

pub async fn find_by_id<'e>(db: impl SqliteExecutor<'e>, id: i64) -> sqlx::Result<Option<Schedule>> {
    sqlx::query_as::<_, Schedule>(&format!(
        "SELECT {SCHEDULE_COLUMNS} FROM schedules WHERE id = ?"
    ))
    .bind(id)
    .fetch_optional(db)
    .await
}

pub async fn create<'e>(
    db: impl SqliteExecutor<'e>,
    user_id: i64,
    title: &str,
    description: Option<&str>,
    schedule_date: &str,
) -> sqlx::Result<i64> {
    let now = Utc::now().to_rfc3339();
    let result = sqlx::query(
        "INSERT INTO schedules (user_id, title, description, schedule_date, created_at, updated_at) VALUES (?, ?, ?, ?, ?, ?)",
    )
    .bind(user_id)
    .bind(title)
    .bind(description)
    .bind(schedule_date)
    .bind(&now)
    .bind(&now)
    .execute(db)
    .await?;

    Ok(result.last_insert_rowid())
}

/// Both bounds are inclusive and optional.
pub async fn list_by_user<'e>(
    db: impl SqliteExecutor<'e>,
    user_id: i64,
    start: Option<&str>,
    end: Option<&str>,
) -> sqlx::Result<Vec<Schedule>> {
    let mut qb = QueryBuilder::<Sqlite>::new(format!(
        "SELECT {SCHEDULE_COLUMNS} FROM schedules WHERE user_id = "
    ));
    qb.push_bind(user_id);
    if let Some(start) = start {
        qb.push(" AND schedule_date >= ").push_bind(start.to_string());
    }
    if let Some(end) = end {
        qb.push(" AND schedule_date <= ").push_bind(end.to_string());
    }
    qb.push(" ORDER BY schedule_date ASC, created_at ASC, id ASC");

    qb.build_query_as::<Schedule>().fetch_all(db).await
}

pub async fn update<'e>(
    db: impl SqliteExecutor<'e>,
    id: i64,
    user_id: i64,
    title: &str,
    description: Option<&str>,
    schedule_date: &str,
) -> sqlx::Result<bool> {
    let result = sqlx::query(
        "UPDATE schedules SET title = ?, description = ?, schedule_date = ?, updated_at = ? WHERE id = ? AND user_id = ?",
    )
    .bind(title)
    .bind(description)
    .bind(schedule_date)
    .bind(Utc::now().to_rfc3339())
    .bind(id)
    .bind(user_id)
    .execute(db)
    .await?;
    Ok(result.rows_affected() > 0)
}

pub async fn delete<'e>(db: impl SqliteExecutor<'e>, id: i64, user_id: i64) -> sqlx::Result<bool> {
    let result = sqlx::query("DELETE FROM schedules WHERE id = ? AND user_id = ?")
        .bind(id)
        .bind(user_id)
        .execute(db)
        .await?;
    Ok(result.rows_affected() > 0)
}
