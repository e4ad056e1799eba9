use chrono::NaiveDate;
use sqlx::SqliteExecutor;

use super::models::Grass;

/// The independent flags of a day's activity record.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Activity {
    Login,
    Code,
    Post,
    Comment,
}

impl Activity {
    fn column(self) -> &'static str {
        match self {
            Activity::Login => "is_login",
            Activity::Code => "is_code",
            Activity::Post => "is_post",
            Activity::Comment => "is_comment",
        }
    }
}

fn day(date: NaiveDate) -> String {
    date.format("%Y-%m-%d").to_string()
}

/// Sets one flag for (user, date), creating the row when it does not exist
/// and leaving the other flags untouched.
pub async fn record<'e>(
    db: impl SqliteExecutor<'e>,
    user_id: i64,
    date: NaiveDate,
    activity: Activity,
) -> sqlx::Result<()> {
    let column = activity.column();
    sqlx::query(&format!(
        "INSERT INTO grass (user_id, grass_date, {column}) VALUES (?, ?, 1) \
         ON CONFLICT (user_id, grass_date) DO UPDATE SET {column} = 1"
    ))
    .bind(user_id)
    .bind(day(date))
    .execute(db)
    .await?;
    Ok(())
}

pub async fn clear<'e>(
    db: impl SqliteExecutor<'e>,
    user_id: i64,
    date: NaiveDate,
    activity: Activity,
) -> sqlx::Result<()> {
    let column = activity.column();
    sqlx::query(&format!(
        "UPDATE grass SET {column} = 0 WHERE user_id = ? AND grass_date = ?"
    ))
    .bind(user_id)
    .bind(day(date))
    .execute(db)
    .await?;
    Ok(())
}

/// Most recent year of activity, newest first.
pub async fn list_recent<'e>(db: impl SqliteExecutor<'e>, user_id: i64) -> sqlx::Result<Vec<Grass>> {
    sqlx::query_as::<_, Grass>(
        r#"
        SELECT id, user_id, grass_date, is_login, is_code, is_post, is_comment
        FROM grass
        WHERE user_id = ?
        ORDER BY grass_date DESC
        LIMIT 365
        "#,
    )
    .bind(user_id)
    .fetch_all(db)
    .await
}
