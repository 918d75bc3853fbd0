use std::sync::Arc;

use axum::extract::State;
use axum::Json;
use chrono::{NaiveDate, Utc};
use postforge_core::UserId;
use postforge_quota::{PlanLimits, QuotaError, UsageSnapshot};
use sqlx::PgPool;

use super::{internal_error, quota_exceeded, require_pg, ApiError, ApiResult};
use crate::auth::AuthUser;
use crate::state::AppState;
use crate::{profile_store, usage_store};

/// Current usage
///
/// Used and remaining generations for today and this month, with reset times.
#[utoipa::path(
    get,
    path = "/api/usage",
    tag = "Usage",
    responses(
        (status = 200, description = "Usage snapshot", body = UsageSnapshot),
        (status = 401, description = "Not signed in", body = super::ErrorResponse),
        (status = 503, description = "PostgreSQL not configured", body = super::ErrorResponse)
    )
)]
pub async fn usage(
    State(state): State<Arc<AppState>>,
    AuthUser(user_id): AuthUser,
) -> ApiResult<Json<UsageSnapshot>> {
    let pool = require_pg(&state)?;
    let limits = plan_limits(pool, user_id).await?;
    let snapshot = usage_store::load_snapshot(pool, user_id, &limits, today())
        .await
        .map_err(internal_error)?;
    Ok(Json(snapshot))
}

pub(crate) fn today() -> NaiveDate {
    Utc::now().date_naive()
}

pub(crate) async fn plan_limits(pool: &PgPool, user_id: UserId) -> ApiResult<PlanLimits> {
    let plan = profile_store::get_plan(pool, user_id).await.map_err(internal_error)?;
    Ok(PlanLimits::for_plan(plan))
}

/// Reject before calling the model if `n` generations no longer fit.
pub(crate) async fn precheck(
    pool: &PgPool,
    user_id: UserId,
    limits: &PlanLimits,
    today: NaiveDate,
    n: u32,
) -> ApiResult<()> {
    let usage = usage_store::load_snapshot(pool, user_id, limits, today)
        .await
        .map_err(internal_error)?;
    usage.check(n).map_err(|e| quota_exceeded(e.to_string(), usage))
}

/// 429 for a rejection from the atomic usage update, with fresh usage attached.
pub(crate) async fn quota_rejection(
    pool: &PgPool,
    user_id: UserId,
    limits: &PlanLimits,
    today: NaiveDate,
    e: QuotaError,
) -> ApiError {
    match usage_store::load_snapshot(pool, user_id, limits, today).await {
        Ok(usage) => quota_exceeded(e.to_string(), usage),
        Err(db) => internal_error(db),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::http::StatusCode;
    use postforge_core::PlanTier;
    use postforge_quota::UsageCounter;
    use uuid::Uuid;

    fn snapshot(plan: PlanTier, daily: u32, monthly: u32) -> UsageSnapshot {
        let today = NaiveDate::from_ymd_opt(2026, 5, 4).unwrap();
        let mut counter = UsageCounter::new(Uuid::nil(), today);
        counter.daily_count = daily;
        counter.monthly_count = monthly;
        UsageSnapshot::new(&counter, &PlanLimits::for_plan(plan), today)
    }

    #[test]
    fn multi_variant_request_can_exceed_daily() {
        let usage = snapshot(PlanTier::Free, 1, 1);
        assert!(usage.check(2).is_ok());
        let e = usage.check(3).unwrap_err();
        assert_eq!(e, QuotaError::DailyLimitReached { used: 1, limit: 3 });
    }

    #[test]
    fn rejection_carries_usage() {
        let usage = snapshot(PlanTier::Free, 0, 10);
        let e = usage.check(1).unwrap_err();
        let (status, Json(body)) = quota_exceeded(e.to_string(), usage);
        assert_eq!(status, StatusCode::TOO_MANY_REQUESTS);
        assert!(body.error.contains("monthly"));
        assert_eq!(body.usage.unwrap().monthly.remaining, Some(0));
    }

    #[test]
    fn business_is_never_precheck_rejected() {
        assert!(snapshot(PlanTier::Business, 500, 5000).check(3).is_ok());
    }
}
