//! Keyword heuristics over a candidate's title and transcript.

use serde::Serialize;

/// Phrases that signal surprise or shock. Lowercase; matched as whole words.
pub(crate) const SHOCK_KEYWORDS: &[&str] = &[
    "surprise",
    "caught",
    "gasp",
    "shock",
    "unbelievable",
    "insane",
    "crazy",
    "omg",
    "wait for it",
    "plot twist",
    "prank",
    "jaw drop",
    "can't believe",
    "scared",
    "epic fail",
];

/// Phrases that signal warmth or tenderness. Lowercase; matched as whole words.
pub(crate) const WARMTH_KEYWORDS: &[&str] = &[
    "baby",
    "hug",
    "heartwarming",
    "wholesome",
    "grandma",
    "grandpa",
    "puppy",
    "kitten",
    "reunion",
    "tears of joy",
    "proposal",
    "kindness",
    "adorable",
    "cute",
    "family",
];

const SHOCK_BASE: u32 = 70;
const SHOCK_STEP: u32 = 10;
const WARMTH_BASE: u32 = 60;
const WARMTH_STEP: u32 = 15;
const HEURISTIC_MAX: u32 = 100;

/// Locally computed heuristic scores. Identical for a given text whatever
/// track the candidate later lands in.
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct ViralHeuristics {
    pub shock: f64,
    pub warmth: f64,
    pub shareability: f64,
    pub shock_warmth_ratio: f64,
}

impl ViralHeuristics {
    /// Compute every heuristic for a title and optional transcript.
    #[must_use]
    pub fn compute(title: &str, transcript: Option<&str>) -> Self {
        let words = words(title, transcript);
        let shock = shock_score(&words);
        let warmth = warmth_score(&words);

        Self {
            shock,
            warmth,
            shareability: shareability_score(shock, warmth),
            shock_warmth_ratio: shock_warmth_ratio(shock, warmth),
        }
    }

    /// Emotional-hook signal used by short-form ranking: the stronger of
    /// shock and warmth.
    #[must_use]
    pub fn shock_warmth_signal(&self) -> f64 {
        self.shock.max(self.warmth)
    }
}

/// Shock score in `[0, 100]`: `min(70 + 10n, 100)` for `n ≥ 1` distinct hits.
fn shock_score(words: &[String]) -> f64 {
    keyword_score(words, SHOCK_KEYWORDS, SHOCK_BASE, SHOCK_STEP)
}

/// Warmth score in `[0, 100]`: `min(60 + 15n, 100)` for `n ≥ 1` distinct hits.
fn warmth_score(words: &[String]) -> f64 {
    keyword_score(words, WARMTH_KEYWORDS, WARMTH_BASE, WARMTH_STEP)
}

#[must_use]
pub fn shareability_score(shock: f64, warmth: f64) -> f64 {
    (shock * 0.6 + warmth * 0.4).round()
}

/// `shock / warmth` rounded to two decimals, or `shock` itself when warmth is zero.
#[must_use]
pub fn shock_warmth_ratio(shock: f64, warmth: f64) -> f64 {
    if warmth > 0.0 {
        (shock / warmth * 100.0).round() / 100.0
    } else {
        shock
    }
}

/// Lowercased words of the title followed by the transcript, with leading
/// and trailing punctuation stripped.
fn words(title: &str, transcript: Option<&str>) -> Vec<String> {
    title
        .split_whitespace()
        .chain(transcript.into_iter().flat_map(str::split_whitespace))
        .map(|word| {
            word.trim_matches(|c: char| !c.is_alphabetic())
                .to_lowercase()
        })
        .filter(|word| !word.is_empty())
        .collect()
}

/// A keyword matches when its words appear consecutively in `words`.
fn contains_phrase(words: &[String], keyword: &str) -> bool {
    let phrase: Vec<&str> = keyword.split_whitespace().collect();
    if phrase.is_empty() {
        return false;
    }
    words
        .windows(phrase.len())
        .any(|window| window.iter().zip(&phrase).all(|(w, p)| w == p))
}

fn keyword_score(words: &[String], keywords: &[&str], base: u32, step: u32) -> f64 {
    let hits = keywords
        .iter()
        .filter(|k| contains_phrase(words, k))
        .count();
    if hits == 0 {
        return 0.0;
    }
    let hits = u32::try_from(hits).unwrap_or(u32::MAX);
    let score = base.saturating_add(step.saturating_mul(hits)).min(HEURISTIC_MAX);
    f64::from(score)
}
