//! Pure mention scoring for one response.
//!
//! [`score`] is deterministic and does no I/O: it counts company-name
//! occurrences, classifies the most prominent mention via an ordered priority
//! list of phrase rules, detects list position, and derives a quality score
//! from configurable weights.
//!
//! Counting is a raw case-insensitive substring match (with the name escaped
//! before compiling). A company name that is a substring of an unrelated word
//! ("Ally" inside "radically") therefore counts as a mention, a known
//! limitation kept as-is because tightening to word boundaries would silently
//! change historical scores.

use std::collections::BTreeMap;
use std::ops::Range;

use regex::Regex;

use crate::error::EngineError;
use crate::types::{MentionAnalysis, MentionType, Query};

/// Per-response ceiling on counted mentions. Keeps one verbose answer from
/// dominating aggregate scores relative to a short, equally relevant one.
pub const MENTION_CAP: usize = 3;

/// Characters of context kept on each side of the first mention.
const SNIPPET_WINDOW: usize = 80;

/// Quality weights for each mention type plus positional bonuses.
///
/// The type weights must be strictly decreasing in prominence order; use
/// [`ScoringWeights::validate`] after deserializing a custom set.
#[derive(Debug, Clone)]
pub struct ScoringWeights {
    pub primary_recommendation: f64,
    pub top_option: f64,
    pub listed_option: f64,
    pub mentioned_in_context: f64,
    /// Bonus for position 1 in a detected list.
    pub position_first_bonus: f64,
    /// Bonus for positions 2–3.
    pub position_early_bonus: f64,
}

impl Default for ScoringWeights {
    fn default() -> Self {
        Self {
            primary_recommendation: 10.0,
            top_option: 7.0,
            listed_option: 5.0,
            mentioned_in_context: 2.0,
            position_first_bonus: 2.0,
            position_early_bonus: 1.0,
        }
    }
}

impl ScoringWeights {
    /// Checks that type weights are strictly monotonic and positive, and that
    /// the first-position bonus is at least the early-position bonus.
    ///
    /// # Errors
    ///
    /// Returns [`EngineError::InvalidScoringConfig`] describing the violation.
    pub fn validate(&self) -> Result<(), EngineError> {
        let ordered = self.primary_recommendation > self.top_option
            && self.top_option > self.listed_option
            && self.listed_option > self.mentioned_in_context
            && self.mentioned_in_context > 0.0;
        if !ordered {
            return Err(EngineError::InvalidScoringConfig(
                "type weights must satisfy primary > top > listed > contextual > 0".to_owned(),
            ));
        }
        if self.position_first_bonus < self.position_early_bonus || self.position_early_bonus < 0.0
        {
            return Err(EngineError::InvalidScoringConfig(
                "position bonuses must satisfy first >= early >= 0".to_owned(),
            ));
        }
        Ok(())
    }

    fn weight(&self, mention_type: MentionType) -> f64 {
        match mention_type {
            MentionType::PrimaryRecommendation => self.primary_recommendation,
            MentionType::TopOption => self.top_option,
            MentionType::ListedOption => self.listed_option,
            MentionType::MentionedInContext => self.mentioned_in_context,
            MentionType::None => 0.0,
        }
    }

    fn position_bonus(&self, position: Option<usize>) -> f64 {
        match position {
            Some(1) => self.position_first_bonus,
            Some(2 | 3) => self.position_early_bonus,
            _ => 0.0,
        }
    }
}

/// Scores one response for mentions of `company_name`.
///
/// Pure and deterministic; `query` and `platform_id` are carried through
/// untouched so the result is self-describing for the aggregator.
#[must_use]
pub fn score(
    query: &Query,
    platform_id: &str,
    response: &str,
    company_name: &str,
    competitors: &[String],
    weights: &ScoringWeights,
) -> MentionAnalysis {
    let empty = |competitor_mentions| MentionAnalysis {
        query: query.clone(),
        platform_id: platform_id.to_owned(),
        raw_mention_count: 0,
        capped_mention_count: 0,
        quality_score: 0.0,
        mention_type: MentionType::None,
        position: None,
        context_snippet: String::new(),
        competitor_mentions,
    };

    let Some(name_re) = mention_regex(company_name) else {
        return empty(BTreeMap::new());
    };

    let competitor_mentions = count_competitors(response, company_name, competitors);

    let matches: Vec<Range<usize>> = name_re.find_iter(response).map(|m| m.range()).collect();
    if matches.is_empty() {
        return empty(competitor_mentions);
    }

    let raw_mention_count = matches.len();
    let capped_mention_count = raw_mention_count.min(MENTION_CAP);

    let list_position = detect_list_position(response, &name_re);
    let mention_type = classify(response, company_name, list_position.is_some());

    let position = match mention_type {
        MentionType::ListedOption => list_position,
        MentionType::TopOption | MentionType::PrimaryRecommendation => {
            list_position.or_else(|| detect_inline_position(response, &name_re))
        }
        MentionType::MentionedInContext | MentionType::None => None,
    };

    let quality_score = weights.weight(mention_type) + weights.position_bonus(position);

    MentionAnalysis {
        query: query.clone(),
        platform_id: platform_id.to_owned(),
        raw_mention_count,
        capped_mention_count,
        quality_score,
        mention_type,
        position,
        context_snippet: context_snippet(response, &matches[0]),
        competitor_mentions,
    }
}

/// Case-insensitive matcher for an escaped company name. `None` for blank names.
fn mention_regex(name: &str) -> Option<Regex> {
    let trimmed = name.trim();
    if trimmed.is_empty() {
        return None;
    }
    Regex::new(&format!("(?i){}", regex::escape(trimmed))).ok()
}

/// Classifies the most prominent mention, first match wins:
/// recommendation phrases, then superlative/top phrases, then list
/// membership, then plain contextual mention.
fn classify(response: &str, company_name: &str, in_list: bool) -> MentionType {
    let n = regex::escape(company_name.trim());

    let primary = Regex::new(&format!(
        r"(?i)(?:\b(?:i|we)(?:'d|\s+would)?\s+recommend\s+(?:\w+\s+){{0,2}}{n})|(?:{n}\s+is\s+(?:the\s+)?best\b)|(?:\bbest\s+(?:option|choice|pick)\s+is\s+{n})|(?:{n}\s+is\s+(?:my|our)\s+top\s+(?:pick|choice)\b)"
    ));
    if primary.is_ok_and(|re| re.is_match(response)) {
        return MentionType::PrimaryRecommendation;
    }

    let top = Regex::new(&format!(
        r"(?i)(?:\b(?:top|best|leading|most\s+popular)\b[^.!?\n]{{0,80}}?{n})|(?:{n}\s+is\s+(?:among|one\s+of)\s+the\s+(?:best|top|leading)\b)|(?:\b(?:include|including|like|such\s+as)\b[^.!?\n]{{0,80}}?{n})"
    ));
    if top.is_ok_and(|re| re.is_match(response)) {
        return MentionType::TopOption;
    }

    if in_list {
        return MentionType::ListedOption;
    }

    MentionType::MentionedInContext
}

/// Finds the 1-based position of the first list item mentioning the company.
///
/// A list is a run of consecutive bullet (`-`, `*`, `•`) or numbered
/// (`1.` / `1)`) lines; intervening prose resets the run, blank lines do not.
fn detect_list_position(response: &str, name_re: &Regex) -> Option<usize> {
    let marker = Regex::new(r"^\s*(?:[-*•]|\d+[.)])\s+").ok()?;
    let mut position = 0usize;
    for line in response.lines() {
        if marker.is_match(line) {
            position += 1;
            if name_re.is_match(line) {
                return Some(position);
            }
        } else if !line.trim().is_empty() {
            position = 0;
        }
    }
    None
}

/// Detects the company's 1-based position inside an inline enumeration such
/// as "the best tools are Acme, BuildRight, and Hammertime".
fn detect_inline_position(response: &str, name_re: &Regex) -> Option<usize> {
    let m = name_re.find(response)?;
    let start = response[..m.start()]
        .rfind(['.', '!', '?', '\n'])
        .map_or(0, |i| i + 1);
    let end = response[m.end()..]
        .find(['.', '!', '?', '\n'])
        .map_or(response.len(), |i| m.end() + i);
    let sentence = &response[start..end];

    // Without an introducing verb or colon there is no enumeration to index.
    let intro = Regex::new(r"(?i)\b(?:are|include|including|such\s+as|like)\b|:").ok()?;
    let im = intro.find(sentence)?;
    let tail = &sentence[im.end()..];

    let mut index = 0usize;
    for part in tail.split([',', ';']) {
        for item in part.split(" and ") {
            if item.trim().is_empty() {
                continue;
            }
            index += 1;
            if name_re.is_match(item) {
                return Some(index);
            }
        }
    }
    None
}

/// Extracts a trimmed text window around the first mention.
fn context_snippet(response: &str, mention: &Range<usize>) -> String {
    let mut start = mention.start;
    let mut chars = 0usize;
    while start > 0 && chars < SNIPPET_WINDOW {
        start -= 1;
        while start > 0 && !response.is_char_boundary(start) {
            start -= 1;
        }
        chars += 1;
    }

    let mut end = mention.end;
    chars = 0;
    while end < response.len() && chars < SNIPPET_WINDOW {
        end += 1;
        while end < response.len() && !response.is_char_boundary(end) {
            end += 1;
        }
        chars += 1;
    }

    response[start..end].trim().to_owned()
}

/// Counts competitor occurrences with the same substring technique used for
/// the target. Only competitors that actually appear are included. The
/// target's own name is skipped if it leaks into the competitor list.
fn count_competitors(
    response: &str,
    company_name: &str,
    competitors: &[String],
) -> BTreeMap<String, usize> {
    let mut counts = BTreeMap::new();
    for competitor in competitors {
        if competitor.trim().eq_ignore_ascii_case(company_name.trim()) {
            continue;
        }
        let Some(re) = mention_regex(competitor) else {
            continue;
        };
        let count = re.find_iter(response).count();
        if count > 0 {
            counts.insert(competitor.trim().to_owned(), count);
        }
    }
    counts
}

#[cfg(test)]
mod tests {
    use crate::types::Dimension;

    use super::*;

    fn run(response: &str, company: &str) -> MentionAnalysis {
        score(
            &Query::new("test query", Dimension::Recommendation),
            "test-platform",
            response,
            company,
            &[],
            &ScoringWeights::default(),
        )
    }

    #[test]
    fn empty_response_is_all_zero() {
        let analysis = run("", "Acme");
        assert_eq!(analysis.raw_mention_count, 0);
        assert_eq!(analysis.capped_mention_count, 0);
        assert_eq!(analysis.quality_score, 0.0);
        assert_eq!(analysis.mention_type, MentionType::None);
        assert!(analysis.position.is_none());
        assert!(analysis.context_snippet.is_empty());
    }

    #[test]
    fn no_mention_is_all_zero() {
        let analysis = run("BuildRight makes a fine hammer.", "Acme");
        assert_eq!(analysis.raw_mention_count, 0);
        assert_eq!(analysis.capped_mention_count, 0);
        assert_eq!(analysis.quality_score, 0.0);
        assert_eq!(analysis.mention_type, MentionType::None);
    }

    #[test]
    fn blank_company_name_is_all_zero() {
        let analysis = run("Anything at all.", "   ");
        assert_eq!(analysis.mention_type, MentionType::None);
        assert_eq!(analysis.raw_mention_count, 0);
    }

    #[test]
    fn counting_is_case_insensitive() {
        let analysis = run("ACME is fine. I like acme. Acme ships fast.", "Acme");
        assert_eq!(analysis.raw_mention_count, 3);
        assert_eq!(analysis.capped_mention_count, 3);
    }

    #[test]
    fn cap_holds_under_heavy_repetition() {
        let response = "Acme ".repeat(50);
        let analysis = run(&response, "Acme");
        assert_eq!(analysis.raw_mention_count, 50);
        assert_eq!(analysis.capped_mention_count, MENTION_CAP);
        assert!(analysis.capped_mention_count <= analysis.raw_mention_count);
    }

    #[test]
    fn special_regex_characters_are_escaped() {
        let analysis = run("Need C++ help? C++ Experts (Pty) delivers.", "C++ Experts (Pty)");
        assert_eq!(analysis.raw_mention_count, 1);
        assert!(analysis.quality_score > 0.0);
    }

    #[test]
    fn substring_false_positive_is_accepted() {
        // Documented limitation: substring matching counts "Ally" inside
        // "radically".
        let analysis = run("Prices dropped radically last year.", "Ally");
        assert_eq!(analysis.raw_mention_count, 1);
        assert_eq!(analysis.mention_type, MentionType::MentionedInContext);
    }

    #[test]
    fn scenario_best_sentence_is_top_option() {
        let analysis = run("The best construction tools are Acme and BuildRight.", "Acme");
        assert_eq!(analysis.capped_mention_count, 1);
        assert_eq!(analysis.mention_type, MentionType::TopOption);
        assert!(
            analysis.quality_score > 0.0,
            "quality: {}",
            analysis.quality_score
        );
    }

    #[test]
    fn inline_enumeration_position_is_detected() {
        let first = run("The best construction tools are Acme and BuildRight.", "Acme");
        assert_eq!(first.position, Some(1));

        let second = run(
            "The best construction tools are BuildRight and Acme.",
            "Acme",
        );
        assert_eq!(second.position, Some(2));
        assert!(
            first.quality_score > second.quality_score,
            "earlier position should score higher: {} vs {}",
            first.quality_score,
            second.quality_score
        );
    }

    #[test]
    fn recommend_phrase_is_primary_recommendation() {
        let analysis = run("For that job I recommend Acme without hesitation.", "Acme");
        assert_eq!(analysis.mention_type, MentionType::PrimaryRecommendation);
        assert_eq!(
            analysis.quality_score,
            ScoringWeights::default().primary_recommendation
        );
    }

    #[test]
    fn is_the_best_phrase_is_primary_recommendation() {
        let analysis = run("Acme is the best option for small crews.", "Acme");
        assert_eq!(analysis.mention_type, MentionType::PrimaryRecommendation);
    }

    #[test]
    fn among_the_best_phrase_is_top_option() {
        let analysis = run("Acme is among the best vendors out there.", "Acme");
        assert_eq!(analysis.mention_type, MentionType::TopOption);
    }

    #[test]
    fn bulleted_list_is_listed_option_with_position() {
        let response = "Several vendors stand out:\n- BuildRight\n- Acme\n- Hammertime\n";
        let analysis = run(response, "Acme");
        assert_eq!(analysis.mention_type, MentionType::ListedOption);
        assert_eq!(analysis.position, Some(2));
        let expected = ScoringWeights::default().listed_option
            + ScoringWeights::default().position_early_bonus;
        assert_eq!(analysis.quality_score, expected);
    }

    #[test]
    fn numbered_list_first_position_gets_full_bonus() {
        let response = "Here is my ranking:\n1. Acme\n2. BuildRight\n";
        let analysis = run(response, "Acme");
        // "ranking:" sentence has no top phrase; the numbered list drives it.
        assert_eq!(analysis.mention_type, MentionType::ListedOption);
        assert_eq!(analysis.position, Some(1));
        let expected = ScoringWeights::default().listed_option
            + ScoringWeights::default().position_first_bonus;
        assert_eq!(analysis.quality_score, expected);
    }

    #[test]
    fn prose_between_lists_resets_position() {
        let response = "- Unrelated\n\nNow for tools:\n- BuildRight\n- Acme\n";
        let analysis = run(response, "Acme");
        assert_eq!(analysis.position, Some(2));
    }

    #[test]
    fn plain_mention_is_contextual_with_no_position() {
        let analysis = run("Acme was founded in 2015 in Ohio.", "Acme");
        assert_eq!(analysis.mention_type, MentionType::MentionedInContext);
        assert!(analysis.position.is_none());
        assert_eq!(
            analysis.quality_score,
            ScoringWeights::default().mentioned_in_context
        );
    }

    #[test]
    fn snippet_surrounds_first_mention() {
        let padding = "x".repeat(200);
        let response = format!("{padding} Acme builds ladders. {padding}");
        let analysis = run(&response, "Acme");
        assert!(analysis.context_snippet.contains("Acme builds ladders"));
        assert!(analysis.context_snippet.len() < response.len());
    }

    #[test]
    fn competitors_are_counted_separately() {
        let analysis = score(
            &Query::new("q", Dimension::Comparison),
            "p",
            "BuildRight and Hammertime both beat Acme here. BuildRight wins.",
            "Acme",
            &[
                "BuildRight".to_owned(),
                "Hammertime".to_owned(),
                "Ghost Co".to_owned(),
            ],
            &ScoringWeights::default(),
        );
        assert_eq!(analysis.competitor_mentions.get("BuildRight"), Some(&2));
        assert_eq!(analysis.competitor_mentions.get("Hammertime"), Some(&1));
        assert!(!analysis.competitor_mentions.contains_key("Ghost Co"));
    }

    #[test]
    fn competitor_list_containing_target_is_skipped() {
        let analysis = score(
            &Query::new("q", Dimension::Comparison),
            "p",
            "Acme Acme Acme.",
            "Acme",
            &["acme".to_owned()],
            &ScoringWeights::default(),
        );
        assert!(analysis.competitor_mentions.is_empty());
    }

    #[test]
    fn default_weights_validate() {
        assert!(ScoringWeights::default().validate().is_ok());
    }

    #[test]
    fn non_monotonic_weights_are_rejected() {
        let weights = ScoringWeights {
            top_option: 11.0,
            ..ScoringWeights::default()
        };
        let err = weights.validate().unwrap_err();
        assert!(err.to_string().contains("primary > top"));
    }

    #[test]
    fn inverted_bonuses_are_rejected() {
        let weights = ScoringWeights {
            position_first_bonus: 0.5,
            position_early_bonus: 1.0,
            ..ScoringWeights::default()
        };
        assert!(weights.validate().is_err());
    }
}
