use chrono::Utc;
use sqlx::SqliteExecutor;

use super::models::Comment;

const COMMENT_SELECT: &str = r#"
    SELECT c.id, c.post_id, c.user_id, u.user_name AS author_name, c.content, c.seq,
           c.is_selected, c.created_at, c.updated_at
    FROM comments c
    JOIN users u ON c.user_id = u.id
"#;

pub async fn find_by_id<'e>(db: impl SqliteExecutor<'e>, id: i64) -> sqlx::Result<Option<Comment>> {
    sqlx::query_as::<_, Comment>(&format!("{COMMENT_SELECT} WHERE c.id = ?"))
        .bind(id)
        .fetch_optional(db)
        .await
}

pub async fn list_by_post<'e>(db: impl SqliteExecutor<'e>, post_id: i64) -> sqlx::Result<Vec<Comment>> {
    sqlx::query_as::<_, Comment>(&format!(
        "{COMMENT_SELECT} WHERE c.post_id = ? ORDER BY c.seq ASC, c.id ASC"
    ))
    .bind(post_id)
    .fetch_all(db)
    .await
}

/// Inserts a comment with the next sequence number for the post, computed in
/// the same statement.
pub async fn create<'e>(
    db: impl SqliteExecutor<'e>,
    post_id: i64,
    user_id: i64,
    content: &str,
) -> sqlx::Result<i64> {
    let now = Utc::now().to_rfc3339();
    let result = sqlx::query(
        r#"
        INSERT INTO comments (post_id, user_id, content, seq, created_at, updated_at)
        SELECT ?1, ?2, ?3, COALESCE(MAX(seq), -1) + 1, ?4, ?4
        FROM comments WHERE post_id = ?1
        "#,
    )
    .bind(post_id)
    .bind(user_id)
    .bind(content)
    .bind(&now)
    .execute(db)
    .await?;

    Ok(result.last_insert_rowid())
}

pub async fn update_content<'e>(
    db: impl SqliteExecutor<'e>,
    id: i64,
    user_id: i64,
    content: &str,
) -> sqlx::Result<bool> {
    let result = sqlx::query(
        "UPDATE comments SET content = ?, updated_at = ? WHERE id = ? AND user_id = ?",
    )
    .bind(content)
    .bind(Utc::now().to_rfc3339())
    .bind(id)
    .bind(user_id)
    .execute(db)
    .await?;
    Ok(result.rows_affected() > 0)
}

pub async fn delete<'e>(db: impl SqliteExecutor<'e>, id: i64, user_id: i64) -> sqlx::Result<bool> {
    let result = sqlx::query("DELETE FROM comments WHERE id = ? AND user_id = ?")
        .bind(id)
        .bind(user_id)
        .execute(db)
        .await?;
    Ok(result.rows_affected() > 0)
}

pub async fn count_by_post<'e>(db: impl SqliteExecutor<'e>, post_id: i64) -> sqlx::Result<i64> {
    sqlx::query_scalar::<_, i64>("SELECT COUNT(*) FROM comments WHERE post_id = ?")
        .bind(post_id)
        .fetch_one(db)
        .await
}

/// Marks the comment as the accepted answer. Returns false when the comment
/// is already selected or the post already has an accepted answer.
pub async fn select<'e>(db: impl SqliteExecutor<'e>, id: i64, post_id: i64) -> sqlx::Result<bool> {
    let result = sqlx::query(
        r#"
        UPDATE comments SET is_selected = 1
        WHERE id = ?1 AND post_id = ?2 AND is_selected = 0
          AND NOT EXISTS (SELECT 1 FROM comments WHERE post_id = ?2 AND is_selected = 1)
        "#,
    )
    .bind(id)
    .bind(post_id)
    .execute(db)
    .await?;
    Ok(result.rows_affected() > 0)
}

/// Distinct (author, `YYYY-MM-DD`) pairs of the comments on a post.
pub async fn commenter_days<'e>(
    db: impl SqliteExecutor<'e>,
    post_id: i64,
) -> sqlx::Result<Vec<(i64, String)>> {
    sqlx::query_as::<_, (i64, String)>(
        "SELECT DISTINCT user_id, substr(created_at, 1, 10) FROM comments WHERE post_id = ?",
    )
    .bind(post_id)
    .fetch_all(db)
    .await
}

/// Whether the user still has a comment created on `date` (`YYYY-MM-DD`).
pub async fn exists_on_date<'e>(
    db: impl SqliteExecutor<'e>,
    user_id: i64,
    date: &str,
) -> sqlx::Result<bool> {
    let count = sqlx::query_scalar::<_, i64>(
        "SELECT COUNT(*) FROM comments WHERE user_id = ? AND substr(created_at, 1, 10) = ?",
    )
    .bind(user_id)
    .bind(date)
    .fetch_one(db)
    .await?;
    Ok(count > 0)
}
