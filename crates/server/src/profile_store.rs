use postforge_core::{PlanTier, UserId};
use sqlx::PgPool;
use tracing::warn;

/// The user's plan tier. Users without a profile row are on the free plan.
pub async fn get_plan(pool: &PgPool, user_id: UserId) -> Result<PlanTier, sqlx::Error> {
    let plan: Option<String> = sqlx::query_scalar("SELECT plan FROM profiles WHERE user_id = $1")
        .bind(user_id)
        .fetch_optional(pool)
        .await?;

    Ok(match plan {
        None => PlanTier::default(),
        Some(raw) => raw.parse().unwrap_or_else(|e| {
            warn!(%user_id, plan = %raw, "unreadable plan in profiles ({}), treating as free", e);
            PlanTier::default()
        }),
    })
}

/// Insert or change a user's plan (used by billing webhooks and the CLI).
pub async fn set_plan(pool: &PgPool, user_id: UserId, plan: PlanTier) -> Result<(), sqlx::Error> {
    sqlx::query(
        "INSERT INTO profiles (user_id, plan) VALUES ($1, $2) \
         ON CONFLICT (user_id) DO UPDATE SET plan = EXCLUDED.plan, updated_at = NOW()",
    )
    .bind(user_id)
    .bind(plan.as_str())
    .execute(pool)
    .await?;
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::db::testing;
    use uuid::Uuid;

    #[ignore]
    #[tokio::test]
    async fn plan_defaults_to_free_and_can_be_changed() {
        let pool = testing::pool().await;
        let user = Uuid::new_v4();
        assert_eq!(get_plan(&pool, user).await.unwrap(), PlanTier::Free);
        set_plan(&pool, user, PlanTier::Pro).await.unwrap();
        assert_eq!(get_plan(&pool, user).await.unwrap(), PlanTier::Pro);
        set_plan(&pool, user, PlanTier::Business).await.unwrap();
        assert_eq!(get_plan(&pool, user).await.unwrap(), PlanTier::Business);
    }
}

