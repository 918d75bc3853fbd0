use postforge_core::normalize_hashtag;
use serde::Serialize;

/// String features the score is computed from.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
#[cfg_attr(feature = "openapi", derive(utoipa::ToSchema))]
pub struct PostFeatures {
    pub char_count: usize,
    /// Whitespace-separated tokens with at least one letter or digit, hashtags excluded.
    pub word_count: usize,
    /// Non-empty lines.
    pub line_count: usize,
    /// Runs of blank lines between two non-empty lines.
    pub paragraph_breaks: usize,
    /// Hashtag tokens; repeats count each time.
    pub hashtag_count: usize,
    pub question_marks: usize,
    pub exclamation_marks: usize,
    /// Distinct call-to-action keywords found, in keyword-list order.
    pub cta_matches: Vec<String>,
    /// Word count of the opening line (the "hook" shown before "see more").
    pub first_line_words: usize,
}

impl PostFeatures {
    pub fn extract(content: &str, cta_keywords: &[String]) -> Self {
        let mut word_count = 0;
        let mut hashtag_count = 0;
        for token in content.split_whitespace() {
            if normalize_hashtag(token).is_some() {
                hashtag_count += 1;
            } else if token.chars().any(char::is_alphanumeric) {
                word_count += 1;
            }
        }

        let mut line_count = 0;
        let mut paragraph_breaks = 0;
        let mut seen_text = false;
        let mut pending_blank = false;
        let mut first_line_words = None;
        for line in content.lines() {
            if line.trim().is_empty() {
                if seen_text {
                    pending_blank = true;
                }
                continue;
            }
            if pending_blank {
                paragraph_breaks += 1;
                pending_blank = false;
            }
            seen_text = true;
            line_count += 1;
            if first_line_words.is_none() {
                first_line_words = Some(line.split_whitespace().count());
            }
        }

        let lowered = content.to_lowercase();
        let mut cta_matches: Vec<String> = Vec::new();
        for kw in cta_keywords {
            let kw = kw.trim().to_lowercase();
            if kw.is_empty() || cta_matches.contains(&kw) {
                continue;
            }
            if contains_phrase(&lowered, &kw) {
                cta_matches.push(kw);
            }
        }

        Self {
            char_count: content.chars().count(),
            word_count,
            line_count,
            paragraph_breaks,
            hashtag_count,
            question_marks: content.matches('?').count(),
            exclamation_marks: content.matches('!').count(),
            cta_matches,
            first_line_words: first_line_words.unwrap_or(0),
        }
    }
}

/// Substring match that only counts when the phrase is not glued to
/// surrounding letters or digits ("follow" does not match "following").
fn contains_phrase(haystack: &str, phrase: &str) -> bool {
    haystack.match_indices(phrase).any(|(start, m)| {
        let before = haystack[..start].chars().next_back();
        let after = haystack[start + m.len()..].chars().next();
        !before.is_some_and(char::is_alphanumeric) && !after.is_some_and(char::is_alphanumeric)
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    fn kws(list: &[&str]) -> Vec<String> {
        list.iter().map(|s| s.to_string()).collect()
    }

    #[test]
    fn counts_words_without_hashtags_or_symbols() {
        let f = PostFeatures::extract("Hello world — it's 2025 #rust #dev", &[]);
        assert_eq!(f.word_count, 4);
        assert_eq!(f.hashtag_count, 2);
    }

    #[test]
    fn paragraph_breaks_count_blank_runs_between_text() {
        let text = "\n\nHook line\n\n\nBody one\nBody two\n\nClosing\n\n";
        let f = PostFeatures::extract(text, &[]);
        assert_eq!(f.line_count, 4);
        assert_eq!(f.paragraph_breaks, 2);
        assert_eq!(f.first_line_words, 2);
    }

    #[test]
    fn whitespace_only_lines_are_blank() {
        let f = PostFeatures::extract("a\n   \t\nb", &[]);
        assert_eq!(f.paragraph_breaks, 1);
    }

    #[test]
    fn cta_matching_respects_word_boundaries() {
        let keywords = kws(&["follow", "let me know", "comment"]);
        let f = PostFeatures::extract("I keep following this. Let me know!", &keywords);
        assert_eq!(f.cta_matches, vec!["let me know"]);

        let f = PostFeatures::extract("Follow for more, and comment below.", &keywords);
        assert_eq!(f.cta_matches, vec!["follow", "comment"]);
    }

    #[test]
    fn duplicate_keywords_count_once() {
        let keywords = kws(&["Share", "share"]);
        let f = PostFeatures::extract("please share", &keywords);
        assert_eq!(f.cta_matches, vec!["share"]);
    }

    #[test]
    fn punctuation_counts() {
        let f = PostFeatures::extract("Why? Really?! Wow!", &[]);
        assert_eq!(f.question_marks, 2);
        assert_eq!(f.exclamation_marks, 2);
    }

    #[test]
    fn empty_content_has_no_features() {
        assert_eq!(PostFeatures::extract("", &kws(&["share"])), PostFeatures::default());
    }
}
