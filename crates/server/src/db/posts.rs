use chrono::Utc;
use sqlx::{QueryBuilder, Sqlite, SqliteExecutor};

use super::models::{Post, PostSummary};

const POST_SELECT: &str = r#"
    SELECT p.id, p.title, p.post_type, p.content, p.user_id, u.user_name AS author_name,
           p.main_image_id, p.views, p.is_solved, p.created_at, p.updated_at
    FROM posts p
    JOIN users u ON p.user_id = u.id
"#;

pub async fn find_by_id<'e>(db: impl SqliteExecutor<'e>, id: i64) -> sqlx::Result<Option<Post>> {
    sqlx::query_as::<_, Post>(&format!("{POST_SELECT} WHERE p.id = ?"))
        .bind(id)
        .fetch_optional(db)
        .await
}

/// Inserts a post without a main image and returns its id.
pub async fn create<'e>(
    db: impl SqliteExecutor<'e>,
    title: &str,
    post_type: &str,
    content: &str,
    user_id: i64,
) -> sqlx::Result<i64> {
    let now = Utc::now().to_rfc3339();
    let result = sqlx::query(
        "INSERT INTO posts (title, post_type, content, user_id, created_at, updated_at) VALUES (?, ?, ?, ?, ?, ?)",
    )
    .bind(title)
    .bind(post_type)
    .bind(content)
    .bind(user_id)
    .bind(&now)
    .bind(&now)
    .execute(db)
    .await?;

    Ok(result.last_insert_rowid())
}

/// Title and content are the only mutable fields; the type is fixed at creation.
pub async fn update_content<'e>(
    db: impl SqliteExecutor<'e>,
    id: i64,
    title: &str,
    content: &str,
) -> sqlx::Result<()> {
    sqlx::query("UPDATE posts SET title = ?, content = ?, updated_at = ? WHERE id = ?")
        .bind(title)
        .bind(content)
        .bind(Utc::now().to_rfc3339())
        .bind(id)
        .execute(db)
        .await?;
    Ok(())
}

pub async fn set_main_image<'e>(
    db: impl SqliteExecutor<'e>,
    id: i64,
    file_id: i64,
) -> sqlx::Result<()> {
    sqlx::query("UPDATE posts SET main_image_id = ? WHERE id = ?")
        .bind(file_id)
        .bind(id)
        .execute(db)
        .await?;
    Ok(())
}

pub async fn increment_views<'e>(db: impl SqliteExecutor<'e>, id: i64) -> sqlx::Result<bool> {
    let result = sqlx::query("UPDATE posts SET views = views + 1 WHERE id = ?")
        .bind(id)
        .execute(db)
        .await?;
    Ok(result.rows_affected() > 0)
}

pub async fn mark_solved<'e>(db: impl SqliteExecutor<'e>, id: i64) -> sqlx::Result<()> {
    sqlx::query("UPDATE posts SET is_solved = 1 WHERE id = ?")
        .bind(id)
        .execute(db)
        .await?;
    Ok(())
}

pub async fn delete<'e>(db: impl SqliteExecutor<'e>, id: i64) -> sqlx::Result<()> {
    sqlx::query("DELETE FROM posts WHERE id = ?")
        .bind(id)
        .execute(db)
        .await?;
    Ok(())
}

/// Whether the user still has a post created on `date` (`YYYY-MM-DD`).
pub async fn exists_on_date<'e>(
    db: impl SqliteExecutor<'e>,
    user_id: i64,
    date: &str,
) -> sqlx::Result<bool> {
    let count = sqlx::query_scalar::<_, i64>(
        "SELECT COUNT(*) FROM posts WHERE user_id = ? AND substr(created_at, 1, 10) = ?",
    )
    .bind(user_id)
    .bind(date)
    .fetch_one(db)
    .await?;
    Ok(count > 0)
}

#[derive(Debug, Clone, Default)]
pub struct ListFilter {
    pub post_type: Option<String>,
    pub keyword: Option<String>,
}

fn push_filter(qb: &mut QueryBuilder<'_, Sqlite>, filter: &ListFilter) {
    qb.push(" WHERE 1 = 1");
    if let Some(post_type) = &filter.post_type {
        qb.push(" AND p.post_type = ").push_bind(post_type.clone());
    }
    if let Some(keyword) = &filter.keyword {
        let pattern = format!("%{}%", escape_like(keyword));
        qb.push(" AND (p.title LIKE ")
            .push_bind(pattern.clone())
            .push(" ESCAPE '\\' OR p.content LIKE ")
            .push_bind(pattern)
            .push(" ESCAPE '\\')");
    }
}

/// Keywords match literally; LIKE wildcards in them are escaped.
fn escape_like(keyword: &str) -> String {
    let mut escaped = String::with_capacity(keyword.len());
    for c in keyword.chars() {
        if matches!(c, '\\' | '%' | '_') {
            escaped.push('\\');
        }
        escaped.push(c);
    }
    escaped
}

pub async fn count<'e>(db: impl SqliteExecutor<'e>, filter: &ListFilter) -> sqlx::Result<i64> {
    let mut qb = QueryBuilder::<Sqlite>::new("SELECT COUNT(*) FROM posts p");
    push_filter(&mut qb, filter);
    qb.build_query_scalar::<i64>().fetch_one(db).await
}

/// Newest first. `offset` and `limit` come from the caller's page arithmetic.
pub async fn list<'e>(
    db: impl SqliteExecutor<'e>,
    filter: &ListFilter,
    limit: i64,
    offset: i64,
) -> sqlx::Result<Vec<PostSummary>> {
    let mut qb = QueryBuilder::<Sqlite>::new(
        r#"
        SELECT p.id, p.title, p.post_type, p.content, p.user_id, u.user_name AS author_name,
               p.main_image_id, f.path AS main_image_path, p.views, p.is_solved,
               (SELECT COUNT(*) FROM likes l WHERE l.post_id = p.id) AS like_count,
               (SELECT COUNT(*) FROM comments c WHERE c.post_id = p.id) AS comment_count,
               p.created_at, p.updated_at
        FROM posts p
        JOIN users u ON p.user_id = u.id
        LEFT JOIN files f ON f.id = p.main_image_id
        "#,
    );
    push_filter(&mut qb, filter);
    qb.push(" ORDER BY p.created_at DESC, p.id DESC LIMIT ")
        .push_bind(limit)
        .push(" OFFSET ")
        .push_bind(offset);

    qb.build_query_as::<PostSummary>().fetch_all(db).await
}
