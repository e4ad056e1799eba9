use chrono::Utc;
use sqlx::SqliteExecutor;

use super::models::Notification;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum NotificationKind {
    Comment,
    CommentSelected,
    Scrap,
}

impl NotificationKind {
    pub fn as_str(self) -> &'static str {
        match self {
            NotificationKind::Comment => "COMMENT",
            NotificationKind::CommentSelected => "COMMENT_SELECTED",
            NotificationKind::Scrap => "SCRAP",
        }
    }
}

pub async fn create<'e>(
    db: impl SqliteExecutor<'e>,
    user_id: i64,
    kind: NotificationKind,
    related_value: &str,
    message: &str,
) -> sqlx::Result<i64> {
    let result = sqlx::query(
        "INSERT INTO notifications (user_id, kind, related_value, message, created_at) VALUES (?, ?, ?, ?, ?)",
    )
    .bind(user_id)
    .bind(kind.as_str())
    .bind(related_value)
    .bind(message)
    .bind(Utc::now().to_rfc3339())
    .execute(db)
    .await?;

    Ok(result.last_insert_rowid())
}

pub async fn list_by_user<'e>(db: impl SqliteExecutor<'e>, user_id: i64) -> sqlx::Result<Vec<Notification>> {
    sqlx::query_as::<_, Notification>(
        r#"
        SELECT id, user_id, kind, related_value, message, is_read, created_at
        FROM notifications
        WHERE user_id = ?
        ORDER BY created_at DESC, id DESC
        "#,
    )
    .bind(user_id)
    .fetch_all(db)
    .await
}

/// Ownership is part of the predicate; a foreign id simply matches nothing.
pub async fn mark_read<'e>(db: impl SqliteExecutor<'e>, id: i64, user_id: i64) -> sqlx::Result<bool> {
    let result = sqlx::query("UPDATE notifications SET is_read = 1 WHERE id = ? AND user_id = ?")
        .bind(id)
        .bind(user_id)
        .execute(db)
        .await?;
    Ok(result.rows_affected() > 0)
}

pub async fn delete<'e>(db: impl SqliteExecutor<'e>, id: i64, user_id: i64) -> sqlx::Result<bool> {
    let result = sqlx::query("DELETE FROM notifications WHERE id = ? AND user_id = ?")
        .bind(id)
        .bind(user_id)
        .execute(db)
        .await?;
    Ok(result.rows_affected() > 0)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::db::testing;

    #[tokio::test]
    async fn recipient_owns_read_and_delete() {
        let db = testing::migrated().await;
        let owner = testing::insert_user(&db, "a@b.io").await;
        let stranger = testing::insert_user(&db, "c@d.io").await;

        let id = create(&db.pool, owner, NotificationKind::Comment, "1", "hello")
            .await
            .unwrap();

        assert!(!mark_read(&db.pool, id, stranger).await.unwrap());
        assert!(mark_read(&db.pool, id, owner).await.unwrap());

        let list = list_by_user(&db.pool, owner).await.unwrap();
        assert_eq!(list.len(), 1);
        assert!(list[0].is_read);
        assert_eq!(list[0].kind, "COMMENT");

        assert!(!delete(&db.pool, id, stranger).await.unwrap());
        assert!(delete(&db.pool, id, owner).await.unwrap());
        assert!(list_by_user(&db.pool, owner).await.unwrap().is_empty());
    }
}
