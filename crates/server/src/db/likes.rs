use chrono::Utc;
use sqlx::{SqliteConnection, SqliteExecutor};

/// Inserts the like if absent. Concurrent adds collapse into a single row.
pub async fn add<'e>(db: impl SqliteExecutor<'e>, post_id: i64, user_id: i64) -> sqlx::Result<()> {
    sqlx::query(
        "INSERT INTO likes (post_id, user_id, created_at) VALUES (?, ?, ?) ON CONFLICT (post_id, user_id) DO NOTHING",
    )
    .bind(post_id)
    .bind(user_id)
    .bind(Utc::now().to_rfc3339())
    .execute(db)
    .await?;
    Ok(())
}

pub async fn remove<'e>(db: impl SqliteExecutor<'e>, post_id: i64, user_id: i64) -> sqlx::Result<bool> {
    let result = sqlx::query("DELETE FROM likes WHERE post_id = ? AND user_id = ?")
        .bind(post_id)
        .bind(user_id)
        .execute(db)
        .await?;
    Ok(result.rows_affected() > 0)
}

/// Flips the like and returns the new state. Run it inside a transaction:
/// the delete takes the write lock before the insert is attempted.
pub async fn toggle(conn: &mut SqliteConnection, post_id: i64, user_id: i64) -> sqlx::Result<bool> {
    if remove(&mut *conn, post_id, user_id).await? {
        return Ok(false);
    }
    add(&mut *conn, post_id, user_id).await?;
    Ok(true)
}

pub async fn is_liked<'e>(db: impl SqliteExecutor<'e>, post_id: i64, user_id: i64) -> sqlx::Result<bool> {
    let count = sqlx::query_scalar::<_, i64>(
        "SELECT COUNT(*) FROM likes WHERE post_id = ? AND user_id = ?",
    )
    .bind(post_id)
    .bind(user_id)
    .fetch_one(db)
    .await?;
    Ok(count > 0)
}

pub async fn count_by_post<'e>(db: impl SqliteExecutor<'e>, post_id: i64) -> sqlx::Result<i64> {
    sqlx::query_scalar::<_, i64>("SELECT COUNT(*) FROM likes WHERE post_id = ?")
        .bind(post_id)
        .fetch_one(db)
        .await
}
