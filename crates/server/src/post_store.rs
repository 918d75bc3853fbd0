use chrono::{DateTime, Utc};
use postforge_core::{
    extract_hashtags, Post, PostId, PostStatus, PostVersion, PostforgeError, Tone, UserId,
    VersionSource,
};
use sqlx::{FromRow, PgConnection, PgPool};
use uuid::Uuid;

use crate::db::{score_from_db, StoreError};

pub const DEFAULT_PAGE_SIZE: i64 = 20;
pub const MAX_PAGE_SIZE: i64 = 100;

// ── Rows ───────────────────────────────────────────

#[derive(FromRow)]
struct PostRow {
    id: Uuid,
    user_id: Uuid,
    topic: String,
    tone: String,
    content: String,
    hashtags: Vec<String>,
    status: String,
    engagement_score: i16,
    style_id: Option<Uuid>,
    current_version: i32,
    created_at: DateTime<Utc>,
    updated_at: DateTime<Utc>,
}

impl TryFrom<PostRow> for Post {
    type Error = PostforgeError;

    fn try_from(row: PostRow) -> Result<Self, Self::Error> {
        Ok(Post {
            id: row.id,
            user_id: row.user_id,
            topic: row.topic,
            tone: row.tone.parse()?,
            content: row.content,
            hashtags: row.hashtags,
            status: row.status.parse()?,
            engagement_score: score_from_db(row.engagement_score),
            style_id: row.style_id,
            current_version: row.current_version,
            created_at: row.created_at,
            updated_at: row.updated_at,
        })
    }
}

#[derive(FromRow)]
struct VersionRow {
    id: Uuid,
    post_id: Uuid,
    version_number: i32,
    content: String,
    engagement_score: i16,
    source: String,
    created_at: DateTime<Utc>,
}

impl TryFrom<VersionRow> for PostVersion {
    type Error = PostforgeError;

    fn try_from(row: VersionRow) -> Result<Self, Self::Error> {
        Ok(PostVersion {
            id: row.id,
            post_id: row.post_id,
            version_number: row.version_number,
            content: row.content,
            engagement_score: score_from_db(row.engagement_score),
            source: row.source.parse()?,
            created_at: row.created_at,
        })
    }
}

const POST_COLUMNS: &str = "id, user_id, topic, tone, content, hashtags, status, engagement_score, \
                            style_id, current_version, created_at, updated_at";

const VERSION_COLUMNS: &str =
    "v.id, v.post_id, v.version_number, v.content, v.engagement_score, v.source, v.created_at";

// ── Types ──────────────────────────────────────────

pub struct NewPost<'a> {
    pub user_id: UserId,
    pub topic: &'a str,
    pub tone: Tone,
    pub content: &'a str,
    pub engagement_score: u8,
    pub style_id: Option<Uuid>,
}

#[derive(Debug, Clone, Default)]
pub struct PostFilter {
    pub status: Option<PostStatus>,
    pub limit: Option<i64>,
    pub offset: Option<i64>,
}

impl PostFilter {
    /// Page size clamped to 1..=MAX_PAGE_SIZE.
    pub fn limit(&self) -> i64 {
        self.limit.unwrap_or(DEFAULT_PAGE_SIZE).clamp(1, MAX_PAGE_SIZE)
    }

    pub fn offset(&self) -> i64 {
        self.offset.unwrap_or(0).max(0)
    }
}

// ── Operations ─────────────────────────────────────

/// Insert a post together with its first version.
pub async fn create_post_with_version(
    conn: &mut PgConnection,
    new: &NewPost<'_>,
    source: VersionSource,
) -> Result<Post, StoreError> {
    let id = Uuid::new_v4();
    let row = sqlx::query_as::<_, PostRow>(&format!(
        "INSERT INTO posts (id, user_id, topic, tone, content, hashtags, engagement_score, style_id, current_version) \
         VALUES ($1, $2, $3, $4, $5, $6, $7, $8, 1) RETURNING {POST_COLUMNS}"
    ))
    .bind(id)
    .bind(new.user_id)
    .bind(new.topic)
    .bind(new.tone.as_str())
    .bind(new.content)
    .bind(extract_hashtags(new.content))
    .bind(i16::from(new.engagement_score))
    .bind(new.style_id)
    .fetch_one(&mut *conn)
    .await?;

    insert_version(conn, id, 1, new.content, new.engagement_score, source).await?;
    Ok(Post::try_from(row)?)
}

pub async fn get_post(pool: &PgPool, user_id: UserId, id: PostId) -> Result<Option<Post>, StoreError> {
    let row = sqlx::query_as::<_, PostRow>(&format!(
        "SELECT {POST_COLUMNS} FROM posts WHERE id = $1 AND user_id = $2"
    ))
    .bind(id)
    .bind(user_id)
    .fetch_optional(pool)
    .await?;
    Ok(row.map(Post::try_from).transpose()?)
}

/// Newest first. Returns the page and the total number of matching posts.
pub async fn list_posts(
    pool: &PgPool,
    user_id: UserId,
    filter: &PostFilter,
) -> Result<(Vec<Post>, i64), StoreError> {
    let status = filter.status.map(|s| s.as_str());
    let rows = sqlx::query_as::<_, PostRow>(&format!(
        "SELECT {POST_COLUMNS} FROM posts \
         WHERE user_id = $1 AND ($2::TEXT IS NULL OR status = $2) \
         ORDER BY created_at DESC, id \
         LIMIT $3 OFFSET $4"
    ))
    .bind(user_id)
    .bind(status)
    .bind(filter.limit())
    .bind(filter.offset())
    .fetch_all(pool)
    .await?;

    let total: i64 = sqlx::query_scalar(
        "SELECT COUNT(*) FROM posts WHERE user_id = $1 AND ($2::TEXT IS NULL OR status = $2)",
    )
    .bind(user_id)
    .bind(status)
    .fetch_one(pool)
    .await?;

    let posts = rows
        .into_iter()
        .map(Post::try_from)
        .collect::<Result<Vec<_>, _>>()?;
    Ok((posts, total))
}

/// Append a version and make it the post's current content.
///
/// Locks the post row, so concurrent edits get consecutive version numbers.
/// Identical content is a no-op and returns the post unchanged.
pub async fn add_version(
    conn: &mut PgConnection,
    user_id: UserId,
    id: PostId,
    content: &str,
    engagement_score: u8,
    source: VersionSource,
) -> Result<Post, StoreError> {
    let current = lock_post(conn, user_id, id).await?;
    let tone = current.tone;
    let appended = append_version(conn, &current, content, engagement_score, source, tone).await?;
    Ok(appended.unwrap_or(current))
}

/// Append a `Regenerated` version written in `tone`, which becomes the
/// post's tone. `None` when the rewrite equals the current content; nothing
/// is written then.
pub async fn add_regenerated_version(
    conn: &mut PgConnection,
    user_id: UserId,
    id: PostId,
    content: &str,
    engagement_score: u8,
    tone: Tone,
) -> Result<Option<Post>, StoreError> {
    let current = lock_post(conn, user_id, id).await?;
    append_version(conn, &current, content, engagement_score, VersionSource::Regenerated, tone).await
}

async fn append_version(
    conn: &mut PgConnection,
    current: &Post,
    content: &str,
    engagement_score: u8,
    source: VersionSource,
    tone: Tone,
) -> Result<Option<Post>, StoreError> {
    if current.content == content {
        return Ok(None);
    }

    let next = current.current_version + 1;
    insert_version(conn, current.id, next, content, engagement_score, source).await?;

    let row = sqlx::query_as::<_, PostRow>(&format!(
        "UPDATE posts SET content = $3, hashtags = $4, engagement_score = $5, current_version = $6, \
         tone = $7, updated_at = NOW() WHERE id = $1 AND user_id = $2 RETURNING {POST_COLUMNS}"
    ))
    .bind(current.id)
    .bind(current.user_id)
    .bind(content)
    .bind(extract_hashtags(content))
    .bind(i16::from(engagement_score))
    .bind(next)
    .bind(tone.as_str())
    .fetch_one(&mut *conn)
    .await?;
    Ok(Some(Post::try_from(row)?))
}

/// Replace the content with a user edit.
pub async fn update_content(
    conn: &mut PgConnection,
    user_id: UserId,
    id: PostId,
    content: &str,
    engagement_score: u8,
) -> Result<Post, StoreError> {
    add_version(conn, user_id, id, content, engagement_score, VersionSource::Edited).await
}

/// Copy an old version's content into a new `Restored` version.
/// `rescore` computes the engagement score of the restored text.
pub async fn restore_version(
    conn: &mut PgConnection,
    user_id: UserId,
    id: PostId,
    version_number: i32,
    rescore: impl FnOnce(&str) -> u8,
) -> Result<Post, StoreError> {
    let current = lock_post(conn, user_id, id).await?;
    let content: Option<String> = sqlx::query_scalar(
        "SELECT content FROM post_versions WHERE post_id = $1 AND version_number = $2",
    )
    .bind(id)
    .bind(version_number)
    .fetch_optional(&mut *conn)
    .await?;
    let content = content.ok_or(StoreError::NotFound)?;

    if content == current.content {
        return Ok(current);
    }
    let score = rescore(&content);
    let tone = current.tone;
    let appended =
        append_version(conn, &current, &content, score, VersionSource::Restored, tone).await?;
    Ok(appended.unwrap_or(current))
}

pub async fn set_status(
    conn: &mut PgConnection,
    user_id: UserId,
    id: PostId,
    next: PostStatus,
) -> Result<Post, StoreError> {
    let current = lock_post(conn, user_id, id).await?;
    let status = current.status.transition(next)?;
    if status == current.status {
        return Ok(current);
    }

    let row = sqlx::query_as::<_, PostRow>(&format!(
        "UPDATE posts SET status = $3, updated_at = NOW() WHERE id = $1 AND user_id = $2 \
         RETURNING {POST_COLUMNS}"
    ))
    .bind(id)
    .bind(user_id)
    .bind(status.as_str())
    .fetch_one(&mut *conn)
    .await?;
    Ok(Post::try_from(row)?)
}

/// Delete a post and its versions. Returns false if the user has no such post.
pub async fn delete_post(pool: &PgPool, user_id: UserId, id: PostId) -> Result<bool, sqlx::Error> {
    let result = sqlx::query("DELETE FROM posts WHERE id = $1 AND user_id = $2")
        .bind(id)
        .bind(user_id)
        .execute(pool)
        .await?;
    Ok(result.rows_affected() > 0)
}

/// Oldest first. `None` when the post does not exist for this user.
pub async fn list_versions(
    pool: &PgPool,
    user_id: UserId,
    id: PostId,
) -> Result<Option<Vec<PostVersion>>, StoreError> {
    if get_post(pool, user_id, id).await?.is_none() {
        return Ok(None);
    }
    let rows = sqlx::query_as::<_, VersionRow>(&format!(
        "SELECT {VERSION_COLUMNS} FROM post_versions v WHERE v.post_id = $1 ORDER BY v.version_number"
    ))
    .bind(id)
    .fetch_all(pool)
    .await?;
    let versions = rows
        .into_iter()
        .map(PostVersion::try_from)
        .collect::<Result<Vec<_>, _>>()?;
    Ok(Some(versions))
}

pub async fn get_version(
    pool: &PgPool,
    user_id: UserId,
    id: PostId,
    version_number: i32,
) -> Result<Option<PostVersion>, StoreError> {
    let row = sqlx::query_as::<_, VersionRow>(&format!(
        "SELECT {VERSION_COLUMNS} FROM post_versions v JOIN posts p ON p.id = v.post_id \
         WHERE v.post_id = $1 AND p.user_id = $2 AND v.version_number = $3"
    ))
    .bind(id)
    .bind(user_id)
    .bind(version_number)
    .fetch_optional(pool)
    .await?;
    Ok(row.map(PostVersion::try_from).transpose()?)
}

// ── Helpers ────────────────────────────────────────

async fn lock_post(conn: &mut PgConnection, user_id: UserId, id: PostId) -> Result<Post, StoreError> {
    let row = sqlx::query_as::<_, PostRow>(&format!(
        "SELECT {POST_COLUMNS} FROM posts WHERE id = $1 AND user_id = $2 FOR UPDATE"
    ))
    .bind(id)
    .bind(user_id)
    .fetch_optional(&mut *conn)
    .await?
    .ok_or(StoreError::NotFound)?;
    Ok(Post::try_from(row)?)
}

async fn insert_version(
    conn: &mut PgConnection,
    post_id: PostId,
    version_number: i32,
    content: &str,
    engagement_score: u8,
    source: VersionSource,
) -> Result<(), sqlx::Error> {
    sqlx::query(
        "INSERT INTO post_versions (id, post_id, version_number, content, engagement_score, source) \
         VALUES ($1, $2, $3, $4, $5, $6)",
    )
    .bind(Uuid::new_v4())
    .bind(post_id)
    .bind(version_number)
    .bind(content)
    .bind(i16::from(engagement_score))
    .bind(source.as_str())
    .execute(&mut *conn)
    .await?;
    Ok(())
}
