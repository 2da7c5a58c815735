//! Heuristic activist-proposal scoring: four independent detectors over the
//! proposal text, combined by a capped weighted sum. Fully deterministic for
//! a given text and table set; malformed or empty text scores zero.

pub mod keywords;
pub mod patterns;

use crate::models::score::{ActivistScore, Category};
use serde::Deserialize;
use std::collections::BTreeSet;

pub const METHOD_KEYWORD: &str = "keyword";
pub const METHOD_PATTERN: &str = "pattern";
pub const METHOD_SENTIMENT: &str = "sentiment";
pub const METHOD_STRUCTURAL: &str = "structural";
pub const METHOD_TITLE: &str = "title";

const KEYWORD_CATEGORY_CAP: f64 = 0.5;
const PATTERN_INCREMENT: f64 = 0.15;
const PHRASE_INCREMENT: f64 = 0.05;
const PHRASE_CAP: f64 = 0.5;
const STRUCTURAL_CAP: f64 = 0.15;
const TITLE_INDICATOR_INCREMENT: f64 = 0.15;
const TITLE_PREFIX_BONUS: f64 = 0.2;
const LONG_BODY_CHARS: usize = 1_000;

/// Per-detector weights. Tunable configuration; the defaults are the
/// commonly observed 0.3/0.3/0.2/0.2 split.
#[derive(Clone, Copy, Debug, Deserialize)]
pub struct ScoringWeights {
    #[serde(default = "default_keyword_weight")]
    pub keyword: f64,
    #[serde(default = "default_pattern_weight")]
    pub pattern: f64,
    #[serde(default = "default_sentiment_weight")]
    pub sentiment: f64,
    #[serde(default = "default_title_weight")]
    pub title: f64,
}

fn default_keyword_weight() -> f64 {
    0.3
}
fn default_pattern_weight() -> f64 {
    0.3
}
fn default_sentiment_weight() -> f64 {
    0.2
}
fn default_title_weight() -> f64 {
    0.2
}

impl Default for ScoringWeights {
    fn default() -> Self {
        Self {
            keyword: default_keyword_weight(),
            pattern: default_pattern_weight(),
            sentiment: default_sentiment_weight(),
            title: default_title_weight(),
        }
    }
}

/// Scores a proposal's title and body. The result is clamped to [0, 1].
pub fn score_text(title: &str, body: &str, weights: &ScoringWeights) -> ActivistScore {
    let text = format!("{title} {body}").to_lowercase();
    let title_lower = title.to_lowercase();

    let mut matched_categories = BTreeSet::new();
    let mut detection_methods = BTreeSet::new();

    let (keyword, keyword_categories) = keyword_score(&text);
    if keyword > 0.0 {
        detection_methods.insert(METHOD_KEYWORD.to_string());
        matched_categories.extend(keyword_categories);
    }

    let (pattern, pattern_categories) = pattern_score(&text);
    if pattern > 0.0 {
        detection_methods.insert(METHOD_PATTERN.to_string());
        matched_categories.extend(pattern_categories);
    }

    let (phrase, structural) = context_score(&text);
    if phrase > 0.0 {
        detection_methods.insert(METHOD_SENTIMENT.to_string());
    }
    if structural > 0.0 {
        detection_methods.insert(METHOD_STRUCTURAL.to_string());
    }
    let sentiment = (phrase + structural).min(1.0);

    let title_part = title_score(&title_lower);
    if title_part > 0.0 {
        detection_methods.insert(METHOD_TITLE.to_string());
    }

    let score = (keyword * weights.keyword
        + pattern * weights.pattern
        + sentiment * weights.sentiment
        + title_part * weights.title)
        .clamp(0.0, 1.0);

    ActivistScore {
        score,
        matched_categories,
        detection_methods,
    }
}

/// Per-category contribution is `min(hits / list_len, 0.5)`; the detector
/// total is capped at 1.0.
fn keyword_score(text: &str) -> (f64, BTreeSet<Category>) {
    let mut total = 0.0;
    let mut matched = BTreeSet::new();

    for (category, words) in keywords::KEYWORDS {
        let hits = words.iter().filter(|word| text.contains(**word)).count();
        if hits > 0 {
            matched.insert(*category);
            total += (hits as f64 / words.len() as f64).min(KEYWORD_CATEGORY_CAP);
        }
    }

    (total.min(1.0), matched)
}

fn pattern_score(text: &str) -> (f64, BTreeSet<Category>) {
    let mut total = 0.0;
    let mut matched = BTreeSet::new();

    for (pattern, category) in patterns::PATTERNS.iter() {
        if pattern.is_match(text) {
            total += PATTERN_INCREMENT;
            matched.insert(*category);
        }
    }

    (total.min(1.0), matched)
}

/// Activist-signal phrases plus structural hints (long body, bullet density,
/// numeric parameters). Returned separately so both methods are attributed.
fn context_score(text: &str) -> (f64, f64) {
    let phrase_hits = keywords::CONTEXT_PHRASES
        .iter()
        .filter(|phrase| text.contains(**phrase))
        .count();
    let phrase = (phrase_hits as f64 * PHRASE_INCREMENT).min(PHRASE_CAP);

    let mut structural = 0.0f64;
    if text.chars().count() > LONG_BODY_CHARS {
        structural += 0.1;
    }
    if text.matches('\n').count() > 5
        || text.matches('•').count() > 3
        || text.matches("- ").count() > 3
    {
        structural += 0.05;
    }
    if patterns::NUMERIC_PARAMS.is_match(text) {
        structural += 0.1;
    }

    (phrase, structural.min(STRUCTURAL_CAP))
}

fn title_score(title_lower: &str) -> f64 {
    let mut score = keywords::TITLE_INDICATORS
        .iter()
        .filter(|word| title_lower.contains(**word))
        .count() as f64
        * TITLE_INDICATOR_INCREMENT;

    if keywords::TITLE_PREFIXES
        .iter()
        .any(|prefix| title_lower.contains(prefix))
    {
        score += TITLE_PREFIX_BONUS;
    }

    score.min(1.0)
}
