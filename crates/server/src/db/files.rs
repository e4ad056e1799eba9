use chrono::Utc;
use sqlx::SqliteExecutor;

use super::models::FileRecord;

/// Owner type for files attached to posts.
pub const POST_OWNER: &str = "post";

pub struct NewFile<'a> {
    pub owner_type: &'a str,
    pub owner_id: i64,
    pub path: &'a str,
    pub original_name: &'a str,
    pub seq: i64,
    pub user_id: i64,
}

pub async fn create<'e>(db: impl SqliteExecutor<'e>, file: NewFile<'_>) -> sqlx::Result<i64> {
    let result = sqlx::query(
        "INSERT INTO files (owner_type, owner_id, path, original_name, seq, user_id, created_at) VALUES (?, ?, ?, ?, ?, ?, ?)",
    )
    .bind(file.owner_type)
    .bind(file.owner_id)
    .bind(file.path)
    .bind(file.original_name)
    .bind(file.seq)
    .bind(file.user_id)
    .bind(Utc::now().to_rfc3339())
    .execute(db)
    .await?;

    Ok(result.last_insert_rowid())
}

/// Next sequence number for an owner: one past the highest ever stored, or 0.
pub async fn next_seq<'e>(
    db: impl SqliteExecutor<'e>,
    owner_type: &str,
    owner_id: i64,
) -> sqlx::Result<i64> {
    let max = sqlx::query_scalar::<_, i64>(
        "SELECT COALESCE(MAX(seq), -1) FROM files WHERE owner_type = ? AND owner_id = ?",
    )
    .bind(owner_type)
    .bind(owner_id)
    .fetch_one(db)
    .await?;
    Ok(max + 1)
}

pub async fn list_by_owner<'e>(
    db: impl SqliteExecutor<'e>,
    owner_type: &str,
    owner_id: i64,
) -> sqlx::Result<Vec<FileRecord>> {
    sqlx::query_as::<_, FileRecord>(
        r#"
        SELECT id, owner_type, owner_id, path, original_name, seq, user_id, created_at
        FROM files
        WHERE owner_type = ? AND owner_id = ?
        ORDER BY seq ASC, id ASC
        "#,
    )
    .bind(owner_type)
    .bind(owner_id)
    .fetch_all(db)
    .await
}

pub async fn delete_by_owner<'e>(
    db: impl SqliteExecutor<'e>,
    owner_type: &str,
    owner_id: i64,
) -> sqlx::Result<()> {
    sqlx::query("DELETE FROM files WHERE owner_type = ? AND owner_id = ?")
        .bind(owner_type)
        .bind(owner_id)
        .execute(db)
        .await?;
    Ok(())
}
