//! Engagement-score heuristic for LinkedIn posts.
//!
//! A post is reduced to a handful of string features ([`PostFeatures`]) and
//! each feature earns points according to [`ScoringWeights`]. The sum is
//! clamped to 0..=100. Scoring is pure and deterministic: the same content
//! and weights always produce the same [`EngagementScore`].

pub mod features;
pub mod score;
pub mod weights;

pub use features::PostFeatures;
pub use score::{score, EngagementGrade, EngagementScore, ScoreBreakdown};
pub use weights::{ScoringConfigError, ScoringWeights};
