use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::error::PostforgeError;
use crate::post::{UserId, MAX_POST_CHARS};

pub const MAX_STYLE_NAME_CHARS: usize = 80;
pub const MAX_STYLE_SAMPLES: usize = 5;

/// A named bundle of the user's own posts, fed to the model as few-shot
/// examples of their voice.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[cfg_attr(feature = "openapi", derive(utoipa::ToSchema))]
pub struct WritingStyle {
    pub id: Uuid,
    #[cfg_attr(feature = "openapi", schema(value_type = Uuid))]
    pub user_id: UserId,
    pub name: String,
    pub description: Option<String>,
    pub sample_posts: Vec<String>,
    pub is_default: bool,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

/// Create/update payload for a writing style.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[cfg_attr(feature = "openapi", derive(utoipa::ToSchema))]
pub struct WritingStyleInput {
    pub name: String,
    #[serde(default)]
    pub description: Option<String>,
    pub sample_posts: Vec<String>,
}

impl WritingStyleInput {
    /// Validate and return a trimmed copy.
    pub fn normalized(&self) -> Result<WritingStyleInput, PostforgeError> {
        let name = self.name.trim();
        if name.is_empty() {
            return Err(PostforgeError::Validation("style name must not be empty".into()));
        }
        if name.chars().count() > MAX_STYLE_NAME_CHARS {
            return Err(PostforgeError::Validation(format!(
                "style name exceeds {MAX_STYLE_NAME_CHARS} characters"
            )));
        }
        if self.sample_posts.is_empty() || self.sample_posts.len() > MAX_STYLE_SAMPLES {
            return Err(PostforgeError::Validation(format!(
                "a style needs between 1 and {MAX_STYLE_SAMPLES} sample posts, got {}",
                self.sample_posts.len()
            )));
        }

        let mut samples = Vec::with_capacity(self.sample_posts.len());
        for (i, sample) in self.sample_posts.iter().enumerate() {
            let sample = sample.trim();
            if sample.is_empty() {
                return Err(PostforgeError::Validation(format!("sample post {} is empty", i + 1)));
            }
            if sample.chars().count() > MAX_POST_CHARS {
                return Err(PostforgeError::Validation(format!(
                    "sample post {} exceeds {MAX_POST_CHARS} characters",
                    i + 1
                )));
            }
            samples.push(sample.to_string());
        }

        Ok(WritingStyleInput {
            name: name.to_string(),
            description: self
                .description
                .as_deref()
                .map(str::trim)
                .filter(|d| !d.is_empty())
                .map(String::from),
            sample_posts: samples,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn input(name: &str, samples: &[&str]) -> WritingStyleInput {
        WritingStyleInput {
            name: name.to_string(),
            description: Some("  ".into()),
            sample_posts: samples.iter().map(|s| s.to_string()).collect(),
        }
    }

    #[test]
    fn normalizes_whitespace() {
        let out = input("  Founder voice ", &["  first post  ", "second"]).normalized().unwrap();
        assert_eq!(out.name, "Founder voice");
        assert_eq!(out.sample_posts, vec!["first post", "second"]);
        assert_eq!(out.description, None);
    }

    #[test]
    fn rejects_empty_name_and_samples() {
        assert!(input("   ", &["x"]).normalized().is_err());
        assert!(input("ok", &[]).normalized().is_err());
        assert!(input("ok", &["fine", "  "]).normalized().is_err());
    }

    #[test]
    fn rejects_too_many_samples() {
        let samples = ["a"; MAX_STYLE_SAMPLES + 1];
        assert!(input("ok", &samples).normalized().is_err());
        assert!(input("ok", &samples[..MAX_STYLE_SAMPLES]).normalized().is_ok());
    }

    #[test]
    fn rejects_oversized_sample() {
        let big = "a".repeat(MAX_POST_CHARS + 1);
        assert!(input("ok", &[big.as_str()]).normalized().is_err());
    }
}
