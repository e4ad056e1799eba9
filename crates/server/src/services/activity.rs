// Best-effort activity ("grass") bookkeeping. Failures are logged and never
// reach the caller.

use chrono::{NaiveDate, Utc};
use sqlx::SqlitePool;

use crate::db::{comments, grass, grass::Activity, posts};

pub fn today() -> NaiveDate {
    Utc::now().date_naive()
}

/// Calendar day of an RFC 3339 timestamp as stored in the database.
pub fn day_of(timestamp: &str) -> Option<NaiveDate> {
    timestamp
        .get(..10)
        .and_then(|d| NaiveDate::parse_from_str(d, "%Y-%m-%d").ok())
}

pub async fn record(pool: &SqlitePool, user_id: i64, activity: Activity) {
    if let Err(e) = grass::record(pool, user_id, today(), activity).await {
        tracing::warn!("Failed to record {activity:?} activity for user {user_id}: {e}");
    }
}

/// Clears the day's flag once the user has nothing of that kind left on it.
pub async fn reconcile(pool: &SqlitePool, user_id: i64, created_at: &str, activity: Activity) {
    let Some(date) = day_of(created_at) else {
        tracing::warn!("Unparseable timestamp {created_at:?} while reconciling activity");
        return;
    };
    let day = date.format("%Y-%m-%d").to_string();

    let remaining = match activity {
        Activity::Post => posts::exists_on_date(pool, user_id, &day).await,
        Activity::Comment => comments::exists_on_date(pool, user_id, &day).await,
        Activity::Login | Activity::Code => return,
    };

    let result = match remaining {
        Ok(true) => Ok(()),
        Ok(false) => grass::clear(pool, user_id, date, activity).await,
        Err(e) => Err(e),
    };

    if let Err(e) = result {
        tracing::warn!("Failed to reconcile {activity:?} activity for user {user_id}: {e}");
    }
}
