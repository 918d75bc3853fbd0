use std::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::error::PostforgeError;

/// Voice the generated post should be written in.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[cfg_attr(feature = "openapi", derive(utoipa::ToSchema))]
#[serde(rename_all = "lowercase")]
pub enum Tone {
    #[default]
    Professional,
    Casual,
    Inspirational,
    Educational,
    Storytelling,
    Humorous,
}

impl Tone {
    pub fn as_str(&self) -> &'static str {
        match self {
            Tone::Professional => "professional",
            Tone::Casual => "casual",
            Tone::Inspirational => "inspirational",
            Tone::Educational => "educational",
            Tone::Storytelling => "storytelling",
            Tone::Humorous => "humorous",
        }
    }

    /// Instruction sentence injected into the user prompt.
    pub fn instruction(&self) -> &'static str {
        match self {
            Tone::Professional => "Write in a clear, confident, professional voice suited to industry peers.",
            Tone::Casual => "Write in a relaxed, conversational voice, as if talking to a colleague over coffee.",
            Tone::Inspirational => "Write in an uplifting, motivating voice that leaves the reader energized.",
            Tone::Educational => "Write in an instructive voice that teaches one concrete, practical lesson.",
            Tone::Storytelling => "Open with a short personal story and draw a lesson from it.",
            Tone::Humorous => "Write with light, good-natured humor while keeping the point useful.",
        }
    }
}

impl std::fmt::Display for Tone {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Tone {
    type Err = PostforgeError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "professional" => Ok(Tone::Professional),
            "casual" => Ok(Tone::Casual),
            "inspirational" => Ok(Tone::Inspirational),
            "educational" => Ok(Tone::Educational),
            "storytelling" => Ok(Tone::Storytelling),
            "humorous" => Ok(Tone::Humorous),
            other => Err(PostforgeError::InvalidValue {
                field: "tone",
                value: other.to_string(),
            }),
        }
    }
}

/// Target length bucket for a generated post.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[cfg_attr(feature = "openapi", derive(utoipa::ToSchema))]
#[serde(rename_all = "lowercase")]
pub enum PostLength {
    Short,
    #[default]
    Medium,
    Long,
}

impl PostLength {
    /// Inclusive word range the prompt asks for.
    pub fn word_range(&self) -> (usize, usize) {
        match self {
            PostLength::Short => (40, 100),
            PostLength::Medium => (100, 200),
            PostLength::Long => (200, 300),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn tone_round_trips_through_str() {
        for tone in [
            Tone::Professional,
            Tone::Casual,
            Tone::Inspirational,
            Tone::Educational,
            Tone::Storytelling,
            Tone::Humorous,
        ] {
            assert_eq!(tone.as_str().parse::<Tone>().unwrap(), tone);
            assert!(!tone.instruction().is_empty());
        }
    }

    #[test]
    fn unknown_tone_is_rejected() {
        assert!("sarcastic".parse::<Tone>().is_err());
    }

    #[test]
    fn length_ranges_are_ordered() {
        let (s_lo, s_hi) = PostLength::Short.word_range();
        let (m_lo, m_hi) = PostLength::Medium.word_range();
        let (l_lo, l_hi) = PostLength::Long.word_range();
        assert!(s_lo < s_hi && s_hi <= m_lo && m_lo < m_hi && m_hi <= l_lo && l_lo < l_hi);
    }
}
