use serde::Serialize;

use crate::features::PostFeatures;
use crate::weights::{ScoringWeights, MAX_SCORE};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[cfg_attr(feature = "openapi", derive(utoipa::ToSchema))]
#[serde(rename_all = "lowercase")]
pub enum EngagementGrade {
    Low,
    Fair,
    Good,
    Excellent,
}

impl EngagementGrade {
    pub fn from_total(total: u8) -> Self {
        match total {
            0..=39 => EngagementGrade::Low,
            40..=59 => EngagementGrade::Fair,
            60..=79 => EngagementGrade::Good,
            _ => EngagementGrade::Excellent,
        }
    }
}

/// Points earned per component.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
#[cfg_attr(feature = "openapi", derive(utoipa::ToSchema))]
pub struct ScoreBreakdown {
    pub length: u32,
    pub line_breaks: u32,
    pub hashtags: u32,
    pub punctuation: u32,
    pub call_to_action: u32,
}

impl ScoreBreakdown {
    pub fn sum(&self) -> u32 {
        self.length + self.line_breaks + self.hashtags + self.punctuation + self.call_to_action
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[cfg_attr(feature = "openapi", derive(utoipa::ToSchema))]
pub struct EngagementScore {
    pub total: u8,
    pub grade: EngagementGrade,
    pub breakdown: ScoreBreakdown,
    pub features: PostFeatures,
    pub suggestions: Vec<String>,
}

/// Score a post body. Empty or whitespace-only content scores 0.
pub fn score(content: &str, weights: &ScoringWeights) -> EngagementScore {
    let features = PostFeatures::extract(content, &weights.call_to_action.keywords);

    if content.trim().is_empty() {
        return EngagementScore {
            total: 0,
            grade: EngagementGrade::Low,
            breakdown: ScoreBreakdown::default(),
            features,
            suggestions: vec!["Write something first: the post is empty.".to_string()],
        };
    }

    let breakdown = ScoreBreakdown {
        length: length_points(&features, weights),
        line_breaks: line_break_points(&features, weights),
        hashtags: hashtag_points(&features, weights),
        punctuation: punctuation_points(&features, weights),
        call_to_action: cta_points(&features, weights),
    };
    let total = breakdown.sum().min(MAX_SCORE) as u8;
    let suggestions = suggestions(&features, &breakdown, weights);

    EngagementScore {
        total,
        grade: EngagementGrade::from_total(total),
        breakdown,
        features,
        suggestions,
    }
}

fn length_points(f: &PostFeatures, w: &ScoringWeights) -> u32 {
    let r = &w.length;
    let n = f.word_count;
    if (r.ideal_min..=r.ideal_max).contains(&n) {
        r.ideal_points
    } else if (r.near_min..=r.near_max).contains(&n) {
        r.near_points
    } else if (r.outer_min..=r.outer_max).contains(&n) {
        r.outer_points
    } else {
        0
    }
}

fn line_break_points(f: &PostFeatures, w: &ScoringWeights) -> u32 {
    let r = &w.line_breaks;
    if f.paragraph_breaks >= r.many_breaks {
        r.many_points
    } else if f.paragraph_breaks >= 1 {
        r.some_points
    } else if f.line_count >= r.multiline_min_lines {
        r.multiline_points
    } else {
        0
    }
}

fn hashtag_points(f: &PostFeatures, w: &ScoringWeights) -> u32 {
    let r = &w.hashtags;
    let n = f.hashtag_count;
    if (r.ideal_min..=r.ideal_max).contains(&n) {
        r.ideal_points
    } else if n >= 1 && n < r.ideal_min {
        r.few_points
    } else if n > r.ideal_max && n <= r.excessive_max {
        r.excessive_points
    } else {
        0
    }
}

fn punctuation_points(f: &PostFeatures, w: &ScoringWeights) -> u32 {
    let r = &w.punctuation;
    let mut points = 0;
    if f.question_marks > 0 {
        points += r.question_points;
    }
    if (1..=r.exclamation_max).contains(&f.exclamation_marks) {
        points += r.exclamation_points;
    }
    points
}

fn cta_points(f: &PostFeatures, w: &ScoringWeights) -> u32 {
    let r = &w.call_to_action;
    match f.cta_matches.len() {
        0 => 0,
        n if n >= r.strong_matches => r.strong_points,
        _ => r.single_points,
    }
}

fn suggestions(f: &PostFeatures, b: &ScoreBreakdown, w: &ScoringWeights) -> Vec<String> {
    let mut out = Vec::new();

    if b.length < w.length.ideal_points {
        if f.word_count < w.length.ideal_min {
            out.push(format!(
                "Expand the post: {} words, aim for {}-{}.",
                f.word_count, w.length.ideal_min, w.length.ideal_max
            ));
        } else {
            out.push(format!(
                "Tighten the post: {} words, aim for {}-{}.",
                f.word_count, w.length.ideal_min, w.length.ideal_max
            ));
        }
    }
    if b.line_breaks < w.line_breaks.many_points {
        out.push(format!(
            "Break the text into at least {} short paragraphs separated by blank lines.",
            w.line_breaks.many_breaks + 1
        ));
    }
    if b.hashtags < w.hashtags.ideal_points {
        if f.hashtag_count > w.hashtags.ideal_max {
            out.push(format!(
                "Trim hashtags to {}-{}; {} reads as spam.",
                w.hashtags.ideal_min, w.hashtags.ideal_max, f.hashtag_count
            ));
        } else {
            out.push(format!(
                "Add {}-{} relevant hashtags at the end.",
                w.hashtags.ideal_min, w.hashtags.ideal_max
            ));
        }
    }
    let p = &w.punctuation;
    if b.punctuation < p.question_points + p.exclamation_points {
        let exclamation = if f.exclamation_marks > p.exclamation_max {
            format!("use at most {} exclamation marks", p.exclamation_max)
        } else {
            format!("add an exclamation mark or two (at most {})", p.exclamation_max)
        };
        let hint = if f.question_marks > 0 {
            format!("Keep the question, and {exclamation}.")
        } else if b.punctuation >= p.exclamation_points {
            "Ask the reader a question to invite replies.".to_string()
        } else {
            format!("Ask the reader a question and {exclamation}.")
        };
        out.push(hint);
    }
    if b.call_to_action < w.call_to_action.strong_points {
        out.push("Close with a clear call to action, e.g. \"Share your thoughts in the comments\".".to_string());
    }
    out
}
