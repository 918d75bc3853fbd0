use chrono::{DateTime, Utc};
use postforge_core::{UserId, WritingStyle, WritingStyleInput};
use sqlx::{FromRow, PgPool};
use uuid::Uuid;

use crate::db::StoreError;

#[derive(FromRow)]
struct StyleRow {
    id: Uuid,
    user_id: Uuid,
    name: String,
    description: Option<String>,
    sample_posts: Vec<String>,
    is_default: bool,
    created_at: DateTime<Utc>,
    updated_at: DateTime<Utc>,
}

impl From<StyleRow> for WritingStyle {
    fn from(row: StyleRow) -> Self {
        WritingStyle {
            id: row.id,
            user_id: row.user_id,
            name: row.name,
            description: row.description,
            sample_posts: row.sample_posts,
            is_default: row.is_default,
            created_at: row.created_at,
            updated_at: row.updated_at,
        }
    }
}

const STYLE_COLUMNS: &str =
    "id, user_id, name, description, sample_posts, is_default, created_at, updated_at";

const NAME_CONSTRAINT: &str = "writing_styles_user_name";
const ONE_DEFAULT_INDEX: &str = "writing_styles_one_default";

/// Which unique constraint a failed write violated, if any.
fn violated_constraint(e: &sqlx::Error) -> Option<&str> {
    match e {
        sqlx::Error::Database(db) if db.is_unique_violation() => Some(db.constraint().unwrap_or("")),
        _ => None,
    }
}

fn conflict_message(constraint: &str, name: &str) -> String {
    if constraint == ONE_DEFAULT_INDEX {
        "another default writing style was set at the same time, retry".to_string()
    } else {
        format!("a writing style named '{name}' already exists")
    }
}

fn write_error(e: sqlx::Error, name: &str) -> StoreError {
    match violated_constraint(&e) {
        Some(constraint) => StoreError::Conflict(conflict_message(constraint, name)),
        None => StoreError::Db(e),
    }
}

/// Default style first, then by name.
pub async fn list_styles(pool: &PgPool, user_id: UserId) -> Result<Vec<WritingStyle>, sqlx::Error> {
    let rows = sqlx::query_as::<_, StyleRow>(&format!(
        "SELECT {STYLE_COLUMNS} FROM writing_styles WHERE user_id = $1 ORDER BY is_default DESC, name"
    ))
    .bind(user_id)
    .fetch_all(pool)
    .await?;
    Ok(rows.into_iter().map(WritingStyle::from).collect())
}

pub async fn get_style(
    pool: &PgPool,
    user_id: UserId,
    id: Uuid,
) -> Result<Option<WritingStyle>, sqlx::Error> {
    let row = sqlx::query_as::<_, StyleRow>(&format!(
        "SELECT {STYLE_COLUMNS} FROM writing_styles WHERE id = $1 AND user_id = $2"
    ))
    .bind(id)
    .bind(user_id)
    .fetch_optional(pool)
    .await?;
    Ok(row.map(WritingStyle::from))
}

pub async fn default_style(pool: &PgPool, user_id: UserId) -> Result<Option<WritingStyle>, sqlx::Error> {
    let row = sqlx::query_as::<_, StyleRow>(&format!(
        "SELECT {STYLE_COLUMNS} FROM writing_styles WHERE user_id = $1 AND is_default"
    ))
    .bind(user_id)
    .fetch_optional(pool)
    .await?;
    Ok(row.map(WritingStyle::from))
}

/// Create a style from already-normalized input. A user's first style
/// becomes their default.
///
/// Two concurrent "first" inserts collide on the one-default index; the
/// loser is retried once and then sees the winner's row, so it is stored as
/// a non-default style.
pub async fn create_style(
    pool: &PgPool,
    user_id: UserId,
    input: &WritingStyleInput,
) -> Result<WritingStyle, StoreError> {
    match insert_style(pool, user_id, input).await {
        Err(e) if violated_constraint(&e) == Some(ONE_DEFAULT_INDEX) => {
            insert_style(pool, user_id, input).await
        }
        other => other,
    }
    .map(WritingStyle::from)
    .map_err(|e| write_error(e, &input.name))
}

async fn insert_style(
    pool: &PgPool,
    user_id: UserId,
    input: &WritingStyleInput,
) -> Result<StyleRow, sqlx::Error> {
    sqlx::query_as::<_, StyleRow>(&format!(
        "INSERT INTO writing_styles (id, user_id, name, description, sample_posts, is_default) \
         VALUES ($1, $2, $3, $4, $5, NOT EXISTS (SELECT 1 FROM writing_styles WHERE user_id = $2)) \
         RETURNING {STYLE_COLUMNS}"
    ))
    .bind(Uuid::new_v4())
    .bind(user_id)
    .bind(&input.name)
    .bind(&input.description)
    .bind(&input.sample_posts)
    .fetch_one(pool)
    .await
}

pub async fn update_style(
    pool: &PgPool,
    user_id: UserId,
    id: Uuid,
    input: &WritingStyleInput,
) -> Result<Option<WritingStyle>, StoreError> {
    let row = sqlx::query_as::<_, StyleRow>(&format!(
        "UPDATE writing_styles SET name = $3, description = $4, sample_posts = $5, updated_at = NOW() \
         WHERE id = $1 AND user_id = $2 RETURNING {STYLE_COLUMNS}"
    ))
    .bind(id)
    .bind(user_id)
    .bind(&input.name)
    .bind(&input.description)
    .bind(&input.sample_posts)
    .fetch_optional(pool)
    .await
    .map_err(|e| write_error(e, &input.name))?;
    Ok(row.map(WritingStyle::from))
}

/// Posts that referenced the style keep their content; their `style_id` is cleared.
pub async fn delete_style(pool: &PgPool, user_id: UserId, id: Uuid) -> Result<bool, sqlx::Error> {
    let result = sqlx::query("DELETE FROM writing_styles WHERE id = $1 AND user_id = $2")
        .bind(id)
        .bind(user_id)
        .execute(pool)
        .await?;
    Ok(result.rows_affected() > 0)
}

/// Make `id` the user's only default style.
pub async fn set_default_style(
    pool: &PgPool,
    user_id: UserId,
    id: Uuid,
) -> Result<Option<WritingStyle>, sqlx::Error> {
    let mut tx = pool.begin().await?;

    let exists: Option<Uuid> = sqlx::query_scalar(
        "SELECT id FROM writing_styles WHERE id = $1 AND user_id = $2 FOR UPDATE",
    )
    .bind(id)
    .bind(user_id)
    .fetch_optional(&mut *tx)
    .await?;
    if exists.is_none() {
        return Ok(None);
    }

    sqlx::query(
        "UPDATE writing_styles SET is_default = FALSE, updated_at = NOW() \
         WHERE user_id = $1 AND is_default AND id <> $2",
    )
    .bind(user_id)
    .bind(id)
    .execute(&mut *tx)
    .await?;

    let row = sqlx::query_as::<_, StyleRow>(&format!(
        "UPDATE writing_styles SET is_default = TRUE, updated_at = NOW() \
         WHERE id = $1 AND user_id = $2 RETURNING {STYLE_COLUMNS}"
    ))
    .bind(id)
    .bind(user_id)
    .fetch_one(&mut *tx)
    .await?;

    tx.commit().await?;
    Ok(Some(row.into()))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn conflict_messages_name_the_constraint() {
        assert_eq!(
            conflict_message(NAME_CONSTRAINT, "Founder voice"),
            "a writing style named 'Founder voice' already exists"
        );
        assert!(conflict_message(ONE_DEFAULT_INDEX, "Founder voice").contains("default"));
    }

    #[test]
    fn non_database_errors_are_not_conflicts() {
        assert_eq!(violated_constraint(&sqlx::Error::RowNotFound), None);
        assert!(matches!(write_error(sqlx::Error::PoolTimedOut, "x"), StoreError::Db(_)));
    }

    // ── Against DATABASE_URL (ignored by default) ──

    use crate::db::testing;
    use uuid::Uuid;

    fn input(name: &str) -> WritingStyleInput {
        WritingStyleInput {
            name: name.into(),
            description: None,
            sample_posts: vec!["I hired 40 engineers last year. Here is what I learned.".into()],
        }
    }

    #[ignore]
    #[tokio::test]
    async fn first_style_is_default_and_default_stays_unique() {
        let pool = testing::pool().await;
        let user = Uuid::new_v4();

        let first = create_style(&pool, user, &input("Founder")).await.unwrap();
        let second = create_style(&pool, user, &input("Coach")).await.unwrap();
        assert!(first.is_default);
        assert!(!second.is_default);

        let switched = set_default_style(&pool, user, second.id).await.unwrap().unwrap();
        assert!(switched.is_default);
        let styles = list_styles(&pool, user).await.unwrap();
        assert_eq!(styles.iter().filter(|s| s.is_default).count(), 1);
        assert_eq!(styles[0].id, second.id, "default is listed first");
        assert_eq!(default_style(&pool, user).await.unwrap().unwrap().id, second.id);
    }

    #[ignore]
    #[tokio::test]
    async fn concurrent_first_styles_leave_one_default() {
        let pool = testing::pool().await;
        let user = Uuid::new_v4();
        let (alpha, beta) = (input("Alpha"), input("Beta"));
        let (a, b) = tokio::join!(
            create_style(&pool, user, &alpha),
            create_style(&pool, user, &beta),
        );
        a.unwrap();
        b.unwrap();
        let styles = list_styles(&pool, user).await.unwrap();
        assert_eq!(styles.len(), 2);
        assert_eq!(styles.iter().filter(|s| s.is_default).count(), 1);
    }

    #[ignore]
    #[tokio::test]
    async fn duplicate_names_conflict_and_styles_are_private() {
        let pool = testing::pool().await;
        let user = Uuid::new_v4();
        let style = create_style(&pool, user, &input("Founder")).await.unwrap();

        let err = create_style(&pool, user, &input("Founder")).await.unwrap_err();
        match err {
            StoreError::Conflict(msg) => assert!(msg.contains("named 'Founder'"), "{msg}"),
            other => panic!("expected conflict, got {other:?}"),
        }

        let stranger = Uuid::new_v4();
        assert!(get_style(&pool, stranger, style.id).await.unwrap().is_none());
        assert!(update_style(&pool, stranger, style.id, &input("Mine")).await.unwrap().is_none());
        assert!(set_default_style(&pool, stranger, style.id).await.unwrap().is_none());
        assert!(!delete_style(&pool, stranger, style.id).await.unwrap());
        assert!(delete_style(&pool, user, style.id).await.unwrap());
    }
}
