use chrono::NaiveDate;
use postforge_core::UserId;
use postforge_quota::{PlanLimits, UsageCounter, UsageSnapshot};
use sqlx::{FromRow, PgConnection, PgPool};

use crate::db::{count_from_db, count_to_db, StoreError};

#[derive(FromRow)]
struct CounterRow {
    user_id: uuid::Uuid,
    daily_count: i32,
    monthly_count: i32,
    day_start: NaiveDate,
    month_start: NaiveDate,
}

impl From<CounterRow> for UsageCounter {
    fn from(row: CounterRow) -> Self {
        UsageCounter {
            user_id: row.user_id,
            daily_count: count_from_db(row.daily_count),
            monthly_count: count_from_db(row.monthly_count),
            day_start: row.day_start,
            month_start: row.month_start,
        }
    }
}

const SELECT_COUNTER: &str =
    "SELECT user_id, daily_count, monthly_count, day_start, month_start FROM usage_counters WHERE user_id = $1";

/// Usage as of `today`. A missing row reads as zero usage; nothing is written.
pub async fn load_snapshot(
    pool: &PgPool,
    user_id: UserId,
    limits: &PlanLimits,
    today: NaiveDate,
) -> Result<UsageSnapshot, sqlx::Error> {
    let counter = sqlx::query_as::<_, CounterRow>(SELECT_COUNTER)
        .bind(user_id)
        .fetch_optional(pool)
        .await?
        .map(UsageCounter::from)
        .unwrap_or_else(|| UsageCounter::new(user_id, today));
    Ok(UsageSnapshot::new(&counter, limits, today))
}

/// Count `n` generations against the user's quota.
///
/// Runs on the caller's connection so it can share a transaction with the
/// post inserts. The counter row is locked with `FOR UPDATE`, so concurrent
/// requests for the same user serialize here and the limit is re-checked
/// against the committed count.
pub async fn record_generation(
    conn: &mut PgConnection,
    user_id: UserId,
    limits: &PlanLimits,
    today: NaiveDate,
    n: u32,
) -> Result<UsageSnapshot, StoreError> {
    let fresh = UsageCounter::new(user_id, today);
    sqlx::query(
        "INSERT INTO usage_counters (user_id, day_start, month_start) VALUES ($1, $2, $3) \
         ON CONFLICT (user_id) DO NOTHING",
    )
    .bind(user_id)
    .bind(fresh.day_start)
    .bind(fresh.month_start)
    .execute(&mut *conn)
    .await?;

    let row = sqlx::query_as::<_, CounterRow>(&format!("{SELECT_COUNTER} FOR UPDATE"))
        .bind(user_id)
        .fetch_one(&mut *conn)
        .await?;
    let mut counter = UsageCounter::from(row);
    counter.record_many(today, limits, n)?;

    sqlx::query(
        "UPDATE usage_counters \
         SET daily_count = $2, monthly_count = $3, day_start = $4, month_start = $5, updated_at = NOW() \
         WHERE user_id = $1",
    )
    .bind(user_id)
    .bind(count_to_db(counter.daily_count))
    .bind(count_to_db(counter.monthly_count))
    .bind(counter.day_start)
    .bind(counter.month_start)
    .execute(&mut *conn)
    .await?;

    Ok(UsageSnapshot::new(&counter, limits, today))
}
