use std::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::error::PostforgeError;

/// Subscription tier stored on the user's profile row.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[cfg_attr(feature = "openapi", derive(utoipa::ToSchema))]
#[serde(rename_all = "lowercase")]
pub enum PlanTier {
    #[default]
    Free,
    Pro,
    Business,
}

impl PlanTier {
    pub fn as_str(&self) -> &'static str {
        match self {
            PlanTier::Free => "free",
            PlanTier::Pro => "pro",
            PlanTier::Business => "business",
        }
    }
}

impl std::fmt::Display for PlanTier {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for PlanTier {
    type Err = PostforgeError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "free" => Ok(PlanTier::Free),
            "pro" => Ok(PlanTier::Pro),
            "business" => Ok(PlanTier::Business),
            other => Err(PostforgeError::InvalidValue {
                field: "plan",
                value: other.to_string(),
            }),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_case_insensitively() {
        assert_eq!("PRO".parse::<PlanTier>().unwrap(), PlanTier::Pro);
        assert_eq!(" free ".parse::<PlanTier>().unwrap(), PlanTier::Free);
        assert_eq!("Business".parse::<PlanTier>().unwrap(), PlanTier::Business);
    }

    #[test]
    fn rejects_unknown_plan() {
        let err = "enterprise".parse::<PlanTier>().unwrap_err();
        assert!(matches!(err, PostforgeError::InvalidValue { field: "plan", .. }));
    }

    #[test]
    fn serializes_lowercase() {
        assert_eq!(serde_json::to_string(&PlanTier::Business).unwrap(), "\"business\"");
    }
}
