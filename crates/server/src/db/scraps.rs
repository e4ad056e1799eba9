use chrono::Utc;
use sqlx::{SqliteConnection, SqliteExecutor};

use super::models::ScrappedPost;

pub async fn add<'e>(db: impl SqliteExecutor<'e>, post_id: i64, user_id: i64) -> sqlx::Result<()> {
    sqlx::query(
        "INSERT INTO scraps (post_id, user_id, created_at) VALUES (?, ?, ?) ON CONFLICT (post_id, user_id) DO NOTHING",
    )
    .bind(post_id)
    .bind(user_id)
    .bind(Utc::now().to_rfc3339())
    .execute(db)
    .await?;
    Ok(())
}

pub async fn remove<'e>(db: impl SqliteExecutor<'e>, post_id: i64, user_id: i64) -> sqlx::Result<bool> {
    let result = sqlx::query("DELETE FROM scraps WHERE post_id = ? AND user_id = ?")
        .bind(post_id)
        .bind(user_id)
        .execute(db)
        .await?;
    Ok(result.rows_affected() > 0)
}

/// Same contract as the like toggle: call inside a transaction.
pub async fn toggle(conn: &mut SqliteConnection, post_id: i64, user_id: i64) -> sqlx::Result<bool> {
    if remove(&mut *conn, post_id, user_id).await? {
        return Ok(false);
    }
    add(&mut *conn, post_id, user_id).await?;
    Ok(true)
}

pub async fn list_by_user<'e>(db: impl SqliteExecutor<'e>, user_id: i64) -> sqlx::Result<Vec<ScrappedPost>> {
    sqlx::query_as::<_, ScrappedPost>(
        r#"
        SELECT s.id AS scrap_id, s.post_id, s.created_at AS scrapped_at,
               p.title, p.post_type, p.content, p.user_id AS author_id,
               u.user_name AS author_name, p.main_image_id, p.views, p.is_solved,
               (SELECT COUNT(*) FROM likes l WHERE l.post_id = p.id) AS like_count,
               p.created_at, p.updated_at
        FROM scraps s
        JOIN posts p ON s.post_id = p.id
        JOIN users u ON p.user_id = u.id
        WHERE s.user_id = ?
        ORDER BY s.created_at DESC, s.id DESC
        "#,
    )
    .bind(user_id)
    .fetch_all(db)
    .await
}
