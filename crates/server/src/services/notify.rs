use sqlx::SqlitePool;

use crate::db::notifications::{self, NotificationKind};

/// Appends a notification for `recipient` unless they caused it themselves.
/// Delivery is best-effort: failures are logged only.
pub async fn send(
    pool: &SqlitePool,
    recipient: i64,
    actor: i64,
    kind: NotificationKind,
    related_value: impl ToString,
    message: &str,
) {
    if recipient == actor {
        return;
    }

    let related_value = related_value.to_string();
    if let Err(e) = notifications::create(pool, recipient, kind, &related_value, message).await {
        tracing::warn!(
            "Failed to create {} notification for user {recipient}: {e}",
            kind.as_str()
        );
    }
}
