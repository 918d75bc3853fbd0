use std::str::FromStr;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::error::PostforgeError;
use crate::tone::Tone;

pub type UserId = Uuid;
pub type PostId = Uuid;

/// LinkedIn's hard limit on post body length, in characters.
pub const MAX_POST_CHARS: usize = 3000;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[cfg_attr(feature = "openapi", derive(utoipa::ToSchema))]
#[serde(rename_all = "lowercase")]
pub enum PostStatus {
    #[default]
    Draft,
    Published,
    Archived,
}

impl PostStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            PostStatus::Draft => "draft",
            PostStatus::Published => "published",
            PostStatus::Archived => "archived",
        }
    }

    /// Whether a post in `self` may move to `next`.
    ///
    /// A published post can only be archived; archiving is undone by moving
    /// back to draft. Staying in the same state is always allowed.
    pub fn can_transition_to(&self, next: PostStatus) -> bool {
        use PostStatus::*;
        matches!(
            (self, next),
            (Draft, Draft)
                | (Published, Published)
                | (Archived, Archived)
                | (Draft, Published)
                | (Draft, Archived)
                | (Published, Archived)
                | (Archived, Draft)
        )
    }

    pub fn transition(&self, next: PostStatus) -> Result<PostStatus, PostforgeError> {
        if self.can_transition_to(next) {
            Ok(next)
        } else {
            Err(PostforgeError::IllegalTransition {
                from: self.to_string(),
                to: next.to_string(),
            })
        }
    }
}

impl std::fmt::Display for PostStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for PostStatus {
    type Err = PostforgeError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "draft" => Ok(PostStatus::Draft),
            "published" => Ok(PostStatus::Published),
            "archived" => Ok(PostStatus::Archived),
            other => Err(PostforgeError::InvalidValue {
                field: "status",
                value: other.to_string(),
            }),
        }
    }
}

/// How a version's content came to exist.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[cfg_attr(feature = "openapi", derive(utoipa::ToSchema))]
#[serde(rename_all = "lowercase")]
pub enum VersionSource {
    Generated,
    Edited,
    Regenerated,
    Restored,
}

impl VersionSource {
    pub fn as_str(&self) -> &'static str {
        match self {
            VersionSource::Generated => "generated",
            VersionSource::Edited => "edited",
            VersionSource::Regenerated => "regenerated",
            VersionSource::Restored => "restored",
        }
    }
}

impl std::fmt::Display for VersionSource {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for VersionSource {
    type Err = PostforgeError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "generated" => Ok(VersionSource::Generated),
            "edited" => Ok(VersionSource::Edited),
            "regenerated" => Ok(VersionSource::Regenerated),
            "restored" => Ok(VersionSource::Restored),
            other => Err(PostforgeError::InvalidValue {
                field: "version source",
                value: other.to_string(),
            }),
        }
    }
}

/// A post and its current content. `current_version` always names the
/// newest row in the post's version history.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[cfg_attr(feature = "openapi", derive(utoipa::ToSchema))]
pub struct Post {
    #[cfg_attr(feature = "openapi", schema(value_type = Uuid))]
    pub id: PostId,
    #[cfg_attr(feature = "openapi", schema(value_type = Uuid))]
    pub user_id: UserId,
    pub topic: String,
    pub tone: Tone,
    pub content: String,
    pub hashtags: Vec<String>,
    pub status: PostStatus,
    pub engagement_score: u8,
    pub style_id: Option<Uuid>,
    pub current_version: i32,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[cfg_attr(feature = "openapi", derive(utoipa::ToSchema))]
pub struct PostVersion {
    pub id: Uuid,
    #[cfg_attr(feature = "openapi", schema(value_type = Uuid))]
    pub post_id: PostId,
    pub version_number: i32,
    pub content: String,
    pub engagement_score: u8,
    pub source: VersionSource,
    pub created_at: DateTime<Utc>,
}

/// Reject content LinkedIn would not accept.
pub fn validate_post_content(content: &str) -> Result<(), PostforgeError> {
    if content.trim().is_empty() {
        return Err(PostforgeError::Validation("post content must not be empty".into()));
    }
    let chars = content.chars().count();
    if chars > MAX_POST_CHARS {
        return Err(PostforgeError::Validation(format!(
            "post content is {chars} characters, limit is {MAX_POST_CHARS}"
        )));
    }
    Ok(())
}

/// Hashtags in order of first appearance, without duplicates (case-insensitive).
pub fn extract_hashtags(content: &str) -> Vec<String> {
    let mut seen = std::collections::HashSet::new();
    content
        .split_whitespace()
        .filter_map(normalize_hashtag)
        .filter(|tag| seen.insert(tag.to_lowercase()))
        .collect()
}

/// `#rust,` -> `#rust`; returns None for tokens that are not hashtags.
pub fn normalize_hashtag(token: &str) -> Option<String> {
    let rest = token.strip_prefix('#')?;
    let body: String = rest
        .chars()
        .take_while(|c| c.is_alphanumeric() || *c == '_')
        .collect();
    if body.chars().any(|c| c.is_alphanumeric()) {
        Some(format!("#{body}"))
    } else {
        None
    }
}
