//! Trending-video candidates and their classification enums.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::scores::ScoreSet;

/// Content track a video belongs to.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ContentType {
    ShortForm,
    LongForm,
}

impl ContentType {
    #[must_use]
    pub fn as_str(self) -> &'static str {
        match self {
            ContentType::ShortForm => "short_form",
            ContentType::LongForm => "long_form",
        }
    }
}

impl std::fmt::Display for ContentType {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Ad format assigned by the scorer.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum AdType {
    Ugc,
    Superbowl,
    Commercial,
    Educational,
    Motivational,
    Informational,
}

impl AdType {
    /// Parse a scorer label, ignoring case and surrounding whitespace.
    ///
    /// Returns `None` for labels outside the known set.
    #[must_use]
    pub fn parse(raw: &str) -> Option<Self> {
        match raw.trim().to_ascii_lowercase().as_str() {
            "ugc" => Some(AdType::Ugc),
            "superbowl" | "super_bowl" | "super bowl" => Some(AdType::Superbowl),
            "commercial" => Some(AdType::Commercial),
            "educational" => Some(AdType::Educational),
            "motivational" => Some(AdType::Motivational),
            "informational" => Some(AdType::Informational),
            _ => None,
        }
    }

    #[must_use]
    pub fn as_str(self) -> &'static str {
        match self {
            AdType::Ugc => "ugc",
            AdType::Superbowl => "superbowl",
            AdType::Commercial => "commercial",
            AdType::Educational => "educational",
            AdType::Motivational => "motivational",
            AdType::Informational => "informational",
        }
    }
}

impl std::fmt::Display for AdType {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Social platform a production job is posted to.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Platform {
    Tiktok,
    Instagram,
    Youtube,
    Facebook,
}

impl Platform {
    /// Default posting targets for every production job.
    pub const DEFAULT_TARGETS: [Platform; 4] = [
        Platform::Tiktok,
        Platform::Instagram,
        Platform::Youtube,
        Platform::Facebook,
    ];

    #[must_use]
    pub fn as_str(self) -> &'static str {
        match self {
            Platform::Tiktok => "tiktok",
            Platform::Instagram => "instagram",
            Platform::Youtube => "youtube",
            Platform::Facebook => "facebook",
        }
    }
}

impl std::fmt::Display for Platform {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A trending video observed by the external collector, joined with its scores.
///
/// `url` is the identity key across runs.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Candidate {
    pub id: i64,
    pub url: String,
    pub platform: String,
    pub title: String,
    pub transcript: Option<String>,
    pub view_count: i64,
    pub like_count: i64,
    pub comment_count: i64,
    pub duration_seconds: f64,
    pub captured_at: DateTime<Utc>,
    pub scores: ScoreSet,
}

impl Candidate {
    /// Hours elapsed between capture and `now`. Negative when captured in the future.
    #[must_use]
    pub fn hours_since_capture(&self, now: DateTime<Utc>) -> f64 {
        #[allow(clippy::cast_precision_loss)]
        let secs = (now - self.captured_at).num_seconds() as f64;
        secs / 3600.0
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn ad_type_parse_is_case_insensitive() {
        assert_eq!(AdType::parse(" UGC "), Some(AdType::Ugc));
        assert_eq!(AdType::parse("Super Bowl"), Some(AdType::Superbowl));
        assert_eq!(AdType::parse("Informational"), Some(AdType::Informational));
    }

    #[test]
    fn ad_type_parse_rejects_unknown_labels() {
        assert_eq!(AdType::parse("meme"), None);
        assert_eq!(AdType::parse(""), None);
    }

    #[test]
    fn content_type_serializes_snake_case() {
        let json = serde_json::to_string(&ContentType::ShortForm).expect("serialize");
        assert_eq!(json, "\"short_form\"");
        assert_eq!(ContentType::LongForm.to_string(), "long_form");
    }

    #[test]
    fn default_targets_are_distinct() {
        let mut seen = std::collections::HashSet::new();
        for p in Platform::DEFAULT_TARGETS {
            assert!(seen.insert(p), "duplicate platform {p}");
        }
        assert_eq!(seen.len(), 4);
    }
}
