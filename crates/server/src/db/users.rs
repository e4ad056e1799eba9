use chrono::Utc;
use sqlx::SqliteExecutor;

use super::models::User;

const USER_COLUMNS: &str =
    "id, email, password_hash, user_name, desired_job, profile_image, created_at";

pub async fn find_by_email<'e>(db: impl SqliteExecutor<'e>, email: &str) -> sqlx::Result<Option<User>> {
    sqlx::query_as::<_, User>(&format!("SELECT {USER_COLUMNS} FROM users WHERE email = ?"))
        .bind(email)
        .fetch_optional(db)
        .await
}

pub async fn find_by_id<'e>(db: impl SqliteExecutor<'e>, id: i64) -> sqlx::Result<Option<User>> {
    sqlx::query_as::<_, User>(&format!("SELECT {USER_COLUMNS} FROM users WHERE id = ?"))
        .bind(id)
        .fetch_optional(db)
        .await
}

pub async fn exists<'e>(db: impl SqliteExecutor<'e>, id: i64) -> sqlx::Result<bool> {
    let count = sqlx::query_scalar::<_, i64>("SELECT COUNT(*) FROM users WHERE id = ?")
        .bind(id)
        .fetch_one(db)
        .await?;
    Ok(count > 0)
}

/// Inserts a user and returns its id. A taken email surfaces as a unique
/// violation.
pub async fn create<'e>(
    db: impl SqliteExecutor<'e>,
    email: &str,
    password_hash: &str,
    user_name: &str,
) -> sqlx::Result<i64> {
    let now = Utc::now().to_rfc3339();
    let result = sqlx::query(
        "INSERT INTO users (email, password_hash, user_name, created_at) VALUES (?, ?, ?, ?)",
    )
    .bind(email)
    .bind(password_hash)
    .bind(user_name)
    .bind(&now)
    .execute(db)
    .await?;

    Ok(result.last_insert_rowid())
}

#[derive(Debug, Default)]
pub struct ProfileChanges {
    pub email: Option<String>,
    pub user_name: Option<String>,
    pub desired_job: Option<String>,
    pub password_hash: Option<String>,
    pub profile_image: Option<String>,
}

impl ProfileChanges {
    pub fn is_empty(&self) -> bool {
        self.email.is_none()
            && self.user_name.is_none()
            && self.desired_job.is_none()
            && self.password_hash.is_none()
            && self.profile_image.is_none()
    }
}

/// Applies only the provided fields. Unset fields keep their stored value.
pub async fn update_profile<'e>(
    db: impl SqliteExecutor<'e>,
    id: i64,
    changes: &ProfileChanges,
) -> sqlx::Result<()> {
    sqlx::query(
        r#"
        UPDATE users SET
            email = COALESCE(?, email),
            user_name = COALESCE(?, user_name),
            desired_job = COALESCE(?, desired_job),
            password_hash = COALESCE(?, password_hash),
            profile_image = COALESCE(?, profile_image)
        WHERE id = ?
        "#,
    )
    .bind(&changes.email)
    .bind(&changes.user_name)
    .bind(&changes.desired_job)
    .bind(&changes.password_hash)
    .bind(&changes.profile_image)
    .bind(id)
    .execute(db)
    .await?;
    Ok(())
}

#[derive(Debug, Clone, Copy, serde::Serialize, sqlx::FromRow)]
#[serde(rename_all = "camelCase")]
pub struct UserStats {
    pub post_count: i64,
    pub scrap_count: i64,
    pub view_count: i64,
}

pub async fn stats<'e>(db: impl SqliteExecutor<'e>, id: i64) -> sqlx::Result<UserStats> {
    sqlx::query_as::<_, UserStats>(
        r#"
        SELECT
            (SELECT COUNT(*) FROM posts WHERE user_id = ?1) AS post_count,
            (SELECT COUNT(*) FROM scraps WHERE user_id = ?1) AS scrap_count,
            (SELECT COALESCE(SUM(views), 0) FROM posts WHERE user_id = ?1) AS view_count
        "#,
    )
    .bind(id)
    .fetch_one(db)
    .await
}
