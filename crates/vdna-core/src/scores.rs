//! Score sets produced by the external LLM scorer.
//!
//! [`RawScoreSet`] is the boundary shape: every field optional, numbers
//! accepted as JSON numbers or numeric strings. [`RawScoreSet::validate`]
//! turns it into a [`ScoreSet`] that the ranking code can trust.

use serde::{Deserialize, Deserializer, Serialize};

use crate::candidate::{AdType, ContentType};

/// Lower and upper bounds for every numeric score.
pub const SCORE_MIN: f64 = 0.0;
pub const SCORE_MAX: f64 = 100.0;

/// Videos longer than this are classified long-form when no usable hint exists.
pub const CLASSIFY_LONG_FORM_AFTER_SECS: f64 = 180.0;

/// Score set as delivered by the scorer or read from nullable columns.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct RawScoreSet {
    #[serde(deserialize_with = "lenient_score", alias = "commercialFitScore")]
    pub commercial_fit_score: Option<f64>,
    #[serde(deserialize_with = "lenient_score", alias = "viralityScore")]
    pub virality_score: Option<f64>,
    #[serde(deserialize_with = "lenient_score", alias = "productFitScore")]
    pub product_fit_score: Option<f64>,
    #[serde(deserialize_with = "lenient_score", alias = "cloneFeasibilityScore")]
    pub clone_feasibility_score: Option<f64>,
    #[serde(deserialize_with = "lenient_score", alias = "emotionalDepthScore")]
    pub emotional_depth_score: Option<f64>,
    #[serde(deserialize_with = "lenient_score", alias = "informationalValueScore")]
    pub informational_value_score: Option<f64>,
    #[serde(deserialize_with = "lenient_score", alias = "transformationScore")]
    pub transformation_score: Option<f64>,
    #[serde(deserialize_with = "lenient_score", alias = "compositeScore")]
    pub composite_score: Option<f64>,
    #[serde(alias = "contentType")]
    pub content_type: Option<String>,
    #[serde(alias = "adType")]
    pub ad_type: Option<String>,
}

/// Validated scores attached to a [`crate::Candidate`]. All numbers lie in `[0, 100]`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ScoreSet {
    pub commercial_fit: f64,
    pub virality: f64,
    pub product_fit: f64,
    pub clone_feasibility: f64,
    pub emotional_depth: f64,
    pub informational_value: f64,
    pub transformation: f64,
    pub composite: f64,
    pub content_type: ContentType,
    pub ad_type: Option<AdType>,
}

impl RawScoreSet {
    /// Validate into a [`ScoreSet`].
    ///
    /// Missing or non-finite numbers become `0`; everything else is clamped
    /// to `[0, 100]`. The content type goes through [`classify_content_type`]
    /// using `duration_seconds` and the scorer's label as the hint.
    #[must_use]
    pub fn validate(&self, duration_seconds: f64) -> ScoreSet {
        ScoreSet {
            commercial_fit: normalize_score(self.commercial_fit_score),
            virality: normalize_score(self.virality_score),
            product_fit: normalize_score(self.product_fit_score),
            clone_feasibility: normalize_score(self.clone_feasibility_score),
            emotional_depth: normalize_score(self.emotional_depth_score),
            informational_value: normalize_score(self.informational_value_score),
            transformation: normalize_score(self.transformation_score),
            composite: normalize_score(self.composite_score),
            content_type: classify_content_type(duration_seconds, self.content_type.as_deref()),
            ad_type: self.ad_type.as_deref().and_then(AdType::parse),
        }
    }
}

fn normalize_score(value: Option<f64>) -> f64 {
    match value {
        Some(v) if v.is_finite() => v.clamp(SCORE_MIN, SCORE_MAX),
        _ => 0.0,
    }
}

/// Canonical content-type classification.
///
/// A recognised hint (`short_form`, `short`, `long-form`, …) wins. Without
/// one, durations above [`CLASSIFY_LONG_FORM_AFTER_SECS`] are long-form and
/// everything else (including unknown or zero durations) is short-form.
#[must_use]
pub fn classify_content_type(duration_seconds: f64, hint: Option<&str>) -> ContentType {
    if let Some(parsed) = hint.and_then(parse_content_type_hint) {
        return parsed;
    }

    if duration_seconds.is_finite() && duration_seconds > CLASSIFY_LONG_FORM_AFTER_SECS {
        ContentType::LongForm
    } else {
        ContentType::ShortForm
    }
}

fn parse_content_type_hint(raw: &str) -> Option<ContentType> {
    let normalized: String = raw
        .trim()
        .to_ascii_lowercase()
        .chars()
        .filter(|c| !matches!(c, '_' | '-' | ' '))
        .collect();

    match normalized.as_str() {
        "shortform" | "short" => Some(ContentType::ShortForm),
        "longform" | "long" => Some(ContentType::LongForm),
        _ => None,
    }
}

/// Accept a score as a JSON number, a numeric string, or null.
///
/// Anything else (booleans, objects, non-numeric strings) is treated as missing
/// rather than failing the whole payload.
fn lenient_score<'de, D>(deserializer: D) -> Result<Option<f64>, D::Error>
where
    D: Deserializer<'de>,
{
    let value = Option::<serde_json::Value>::deserialize(deserializer)?;
    Ok(match value {
        Some(serde_json::Value::Number(n)) => n.as_f64(),
        Some(serde_json::Value::String(s)) => s.trim().parse::<f64>().ok(),
        _ => None,
    })
}
