//! Point tables for the engagement score, loadable from YAML.

use std::path::Path;

use serde::{Deserialize, Serialize};
use thiserror::Error;

#[derive(Debug, Error)]
pub enum ScoringConfigError {
    #[error("failed to read scoring config {path}: {source}")]
    Io {
        path: String,
        #[source]
        source: std::io::Error,
    },
    #[error("failed to parse scoring config: {0}")]
    Parse(#[from] serde_yaml::Error),
    #[error("invalid scoring config: {0}")]
    Invalid(String),
}

/// All components' maxima must add up to this.
pub const MAX_SCORE: u32 = 100;

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(deny_unknown_fields, default)]
pub struct ScoringWeights {
    pub length: LengthRule,
    pub line_breaks: LineBreakRule,
    pub hashtags: HashtagRule,
    pub punctuation: PunctuationRule,
    pub call_to_action: CallToActionRule,
}

/// Word-count bands, from the ideal band outward.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(deny_unknown_fields)]
pub struct LengthRule {
    pub ideal_min: usize,
    pub ideal_max: usize,
    pub ideal_points: u32,
    pub near_min: usize,
    pub near_max: usize,
    pub near_points: u32,
    pub outer_min: usize,
    pub outer_max: usize,
    pub outer_points: u32,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(deny_unknown_fields)]
pub struct LineBreakRule {
    /// Paragraph breaks needed for full points.
    pub many_breaks: usize,
    pub many_points: u32,
    /// At least one paragraph break, fewer than `many_breaks`.
    pub some_points: u32,
    /// No blank lines, but the post still spans this many lines.
    pub multiline_min_lines: usize,
    pub multiline_points: u32,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(deny_unknown_fields)]
pub struct HashtagRule {
    pub ideal_min: usize,
    pub ideal_max: usize,
    pub ideal_points: u32,
    /// Between one and `ideal_min - 1` hashtags.
    pub few_points: u32,
    /// Above `ideal_max` up to this many still earns `excessive_points`.
    pub excessive_max: usize,
    pub excessive_points: u32,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(deny_unknown_fields)]
pub struct PunctuationRule {
    pub question_points: u32,
    /// Up to this many `!` earn `exclamation_points`; more earns nothing.
    pub exclamation_max: usize,
    pub exclamation_points: u32,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(deny_unknown_fields)]
pub struct CallToActionRule {
    /// Matched case-insensitively on word boundaries.
    pub keywords: Vec<String>,
    pub strong_matches: usize,
    pub strong_points: u32,
    pub single_points: u32,
}

impl Default for ScoringWeights {
    fn default() -> Self {
        Self {
            length: LengthRule {
                ideal_min: 100,
                ideal_max: 200,
                ideal_points: 30,
                near_min: 50,
                near_max: 300,
                near_points: 18,
                outer_min: 20,
                outer_max: 500,
                outer_points: 8,
            },
            line_breaks: LineBreakRule {
                many_breaks: 3,
                many_points: 20,
                some_points: 12,
                multiline_min_lines: 3,
                multiline_points: 6,
            },
            hashtags: HashtagRule {
                ideal_min: 3,
                ideal_max: 5,
                ideal_points: 15,
                few_points: 10,
                excessive_max: 10,
                excessive_points: 5,
            },
            punctuation: PunctuationRule {
                question_points: 10,
                exclamation_max: 3,
                exclamation_points: 5,
            },
            call_to_action: CallToActionRule {
                keywords: DEFAULT_CTA_KEYWORDS.iter().map(|k| k.to_string()).collect(),
                strong_matches: 2,
                strong_points: 20,
                single_points: 12,
            },
        }
    }
}

const DEFAULT_CTA_KEYWORDS: &[&str] = &[
    "comment",
    "comments",
    "share",
    "thoughts",
    "let me know",
    "what do you think",
    "agree",
    "follow",
    "repost",
    "dm me",
    "tag someone",
    "your experience",
    "drop a",
    "sign up",
    "learn more",
];

impl ScoringWeights {
    pub fn from_yaml_str(yaml: &str) -> Result<Self, ScoringConfigError> {
        let weights: ScoringWeights = serde_yaml::from_str(yaml)?;
        weights.validate()?;
        Ok(weights)
    }

    pub fn from_yaml_file(path: &Path) -> Result<Self, ScoringConfigError> {
        let yaml = std::fs::read_to_string(path).map_err(|source| ScoringConfigError::Io {
            path: path.display().to_string(),
            source,
        })?;
        let weights = Self::from_yaml_str(&yaml)?;
        tracing::info!(path = %path.display(), "loaded engagement scoring weights");
        Ok(weights)
    }

    /// Sum of each component's best possible score.
    pub fn max_total(&self) -> u32 {
        self.length.ideal_points
            + self.line_breaks.many_points
            + self.hashtags.ideal_points
            + self.punctuation.question_points
            + self.punctuation.exclamation_points
            + self.call_to_action.strong_points
    }

    pub fn validate(&self) -> Result<(), ScoringConfigError> {
        let total = self.max_total();
        if total != MAX_SCORE {
            return Err(ScoringConfigError::Invalid(format!(
                "component maxima sum to {total}, expected {MAX_SCORE}"
            )));
        }

        let l = &self.length;
        if !(l.outer_min <= l.near_min
            && l.near_min <= l.ideal_min
            && l.ideal_min <= l.ideal_max
            && l.ideal_max <= l.near_max
            && l.near_max <= l.outer_max)
        {
            return Err(ScoringConfigError::Invalid(
                "length bands must nest: outer ⊇ near ⊇ ideal".into(),
            ));
        }
        if !(l.outer_points <= l.near_points && l.near_points <= l.ideal_points) {
            return Err(ScoringConfigError::Invalid(
                "length points must not increase away from the ideal band".into(),
            ));
        }

        let b = &self.line_breaks;
        if b.many_breaks < 2 || b.some_points > b.many_points || b.multiline_points > b.some_points {
            return Err(ScoringConfigError::Invalid(
                "line break points must decrease from many > some > multiline".into(),
            ));
        }

        let h = &self.hashtags;
        if h.ideal_min == 0 || h.ideal_min > h.ideal_max || h.excessive_max < h.ideal_max {
            return Err(ScoringConfigError::Invalid(
                "hashtag bands must satisfy 1 <= ideal_min <= ideal_max <= excessive_max".into(),
            ));
        }

        let c = &self.call_to_action;
        if c.keywords.iter().all(|k| k.trim().is_empty()) {
            return Err(ScoringConfigError::Invalid(
                "at least one call-to-action keyword is required".into(),
            ));
        }
        if c.strong_matches == 0 || c.single_points > c.strong_points {
            return Err(ScoringConfigError::Invalid(
                "call-to-action strong_matches must be >= 1 and single_points <= strong_points".into(),
            ));
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults_are_valid_and_sum_to_100() {
        let w = ScoringWeights::default();
        assert_eq!(w.max_total(), MAX_SCORE);
        w.validate().unwrap();
    }

    #[test]
    fn bundled_yaml_matches_defaults() {
        let yaml = include_str!("../../../data/scoring/engagement.yml");
        let w = ScoringWeights::from_yaml_str(yaml).unwrap();
        assert_eq!(w, ScoringWeights::default());
    }

    #[test]
    fn partial_yaml_falls_back_to_defaults() {
        let yaml = r#"
punctuation:
  question_points: 5
  exclamation_max: 3
  exclamation_points: 10
"#;
        let w = ScoringWeights::from_yaml_str(yaml).unwrap();
        assert_eq!(w.punctuation.exclamation_points, 10);
        assert_eq!(w.length, ScoringWeights::default().length);
    }

    #[test]
    fn rejects_maxima_not_summing_to_100() {
        let yaml = r#"
punctuation:
  question_points: 50
  exclamation_max: 3
  exclamation_points: 5
"#;
        let err = ScoringWeights::from_yaml_str(yaml).unwrap_err();
        assert!(matches!(err, ScoringConfigError::Invalid(msg) if msg.contains("140")));
    }

    #[test]
    fn rejects_unknown_fields() {
        let err = ScoringWeights::from_yaml_str("emoji_points: 5\n").unwrap_err();
        assert!(matches!(err, ScoringConfigError::Parse(_)));
    }

    #[test]
    fn rejects_non_nesting_length_bands() {
        let mut w = ScoringWeights::default();
        w.length.near_min = 150;
        assert!(w.validate().is_err());
    }

    #[test]
    fn rejects_empty_keyword_list() {
        let mut w = ScoringWeights::default();
        w.call_to_action.keywords = vec!["  ".into()];
        assert!(w.validate().is_err());
    }

    #[test]
    fn loads_from_file() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("weights.yml");
        std::fs::write(&path, serde_yaml::to_string(&ScoringWeights::default()).unwrap()).unwrap();
        let w = ScoringWeights::from_yaml_file(&path).unwrap();
        assert_eq!(w, ScoringWeights::default());
    }

    #[test]
    fn missing_file_is_io_error() {
        let err = ScoringWeights::from_yaml_file(Path::new("/nonexistent/weights.yml")).unwrap_err();
        assert!(matches!(err, ScoringConfigError::Io { .. }));
    }
}
