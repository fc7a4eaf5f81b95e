//! Business parameters for the daily viral cycle.
//!
//! Everything here encodes pricing or editorial decisions rather than
//! algorithm structure, so it is loaded from an optional YAML file. Every
//! field has a default; a file only needs the keys it overrides.

use std::collections::HashSet;
use std::path::Path;

use serde::{Deserialize, Serialize};

use crate::candidate::Platform;
use crate::ConfigError;

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct PipelineSettings {
    pub candidates: CandidateQuerySettings,
    pub selection: SelectionSettings,
    pub pricing: CreditPricing,
    pub schedule: ScheduleSettings,
}

/// Filters applied when fetching candidates from the collector's table.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct CandidateQuerySettings {
    pub max_age_hours: i64,
    pub min_views: i64,
    pub limit: i64,
}

impl Default for CandidateQuerySettings {
    fn default() -> Self {
        Self {
            max_age_hours: 168,
            min_views: 1_000_000,
            limit: 100,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct SelectionSettings {
    pub short_form_cap: usize,
    pub long_form_cap: usize,
    pub short_form_max_duration_secs: f64,
    pub long_form_min_duration_secs: f64,
    pub long_form_max_duration_secs: f64,
    pub min_commercial_fit: f64,
    pub min_clone_feasibility: f64,
    /// Long-form candidates need informational value OR transformation at or above this.
    pub min_long_form_value: f64,
    /// Recency decays linearly to zero over this many hours.
    pub recency_window_hours: f64,
    pub short_form_weights: ShortFormWeights,
    pub long_form_weights: LongFormWeights,
}

impl Default for SelectionSettings {
    fn default() -> Self {
        Self {
            short_form_cap: 4,
            long_form_cap: 2,
            short_form_max_duration_secs: 60.0,
            long_form_min_duration_secs: 300.0,
            long_form_max_duration_secs: 900.0,
            min_commercial_fit: 60.0,
            min_clone_feasibility: 60.0,
            min_long_form_value: 60.0,
            recency_window_hours: 168.0,
            short_form_weights: ShortFormWeights::default(),
            long_form_weights: LongFormWeights::default(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct ShortFormWeights {
    pub virality: f64,
    pub shareability: f64,
    pub shock_warmth: f64,
    pub recency: f64,
}

impl Default for ShortFormWeights {
    fn default() -> Self {
        Self {
            virality: 0.4,
            shareability: 0.3,
            shock_warmth: 0.3,
            recency: 0.1,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct LongFormWeights {
    pub informational: f64,
    pub transformation: f64,
    pub emotional_depth: f64,
    pub recency: f64,
}

impl Default for LongFormWeights {
    fn default() -> Self {
        Self {
            informational: 0.5,
            transformation: 0.3,
            emotional_depth: 0.2,
            recency: 0.1,
        }
    }
}

/// Credit cost of one production job: `base_cost + per_platform_cost * platforms`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct CreditPricing {
    pub base_cost: i64,
    pub per_platform_cost: i64,
    pub target_platforms: Vec<Platform>,
}

impl Default for CreditPricing {
    fn default() -> Self {
        Self {
            base_cost: 120,
            per_platform_cost: 10,
            target_platforms: Platform::DEFAULT_TARGETS.to_vec(),
        }
    }
}

impl CreditPricing {
    /// Credits required for one job posted to every target platform.
    #[must_use]
    pub fn job_cost(&self) -> i64 {
        let platforms = i64::try_from(self.target_platforms.len()).unwrap_or(i64::MAX);
        self.base_cost
            .saturating_add(self.per_platform_cost.saturating_mul(platforms))
    }
}

/// Posting hours per track, interpreted in a fixed UTC offset.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct ScheduleSettings {
    pub short_form_hours: Vec<u32>,
    pub long_form_hours: Vec<u32>,
    pub utc_offset_minutes: i32,
}

impl Default for ScheduleSettings {
    fn default() -> Self {
        Self {
            short_form_hours: vec![9, 12, 15, 18],
            long_form_hours: vec![8, 20],
            utc_offset_minutes: 0,
        }
    }
}

/// Load pipeline settings from a YAML file, or return defaults when `path` is `None`.
///
/// # Errors
///
/// Returns `ConfigError` if the file cannot be read, parsed, or fails validation.
pub fn load_pipeline_settings(path: Option<&Path>) -> Result<PipelineSettings, ConfigError> {
    let Some(path) = path else {
        return Ok(PipelineSettings::default());
    };

    let content = std::fs::read_to_string(path).map_err(|e| ConfigError::SettingsFileIo {
        path: path.display().to_string(),
        source: e,
    })?;

    parse_pipeline_settings(&content)
}

/// Parse and validate pipeline settings from a YAML string.
///
/// # Errors
///
/// Returns `ConfigError` if the YAML is malformed or fails validation.
pub fn parse_pipeline_settings(content: &str) -> Result<PipelineSettings, ConfigError> {
    // An empty document deserializes to unit, not a map; treat it as all defaults.
    if content.trim().is_empty() {
        return Ok(PipelineSettings::default());
    }

    let settings: PipelineSettings =
        serde_yaml::from_str(content).map_err(ConfigError::SettingsFileParse)?;
    settings.validate()?;
    Ok(settings)
}

impl PipelineSettings {
    /// Check invariants that serde cannot express.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError::Validation`] describing the first violation found.
    pub fn validate(&self) -> Result<(), ConfigError> {
        let fail = |msg: String| Err(ConfigError::Validation(msg));

        let q = &self.candidates;
        if q.max_age_hours <= 0 || q.limit <= 0 || q.min_views < 0 {
            return fail(
                "candidates.max_age_hours and candidates.limit must be positive; min_views must not be negative"
                    .to_string(),
            );
        }

        let s = &self.selection;
        if s.short_form_cap == 0 || s.long_form_cap == 0 {
            return fail("selection caps must be at least 1".to_string());
        }
        if s.short_form_max_duration_secs.is_nan() || s.short_form_max_duration_secs <= 0.0 {
            return fail("selection.short_form_max_duration_secs must be positive".to_string());
        }
        if s.long_form_min_duration_secs.is_nan()
            || s.long_form_max_duration_secs.is_nan()
            || s.long_form_min_duration_secs > s.long_form_max_duration_secs
        {
            return fail(format!(
                "selection.long_form_min_duration_secs ({}) exceeds long_form_max_duration_secs ({})",
                s.long_form_min_duration_secs, s.long_form_max_duration_secs
            ));
        }
        if s.recency_window_hours.is_nan() || s.recency_window_hours <= 0.0 {
            return fail("selection.recency_window_hours must be positive".to_string());
        }

        let sw = &s.short_form_weights;
        let lw = &s.long_form_weights;
        let weights = [
            ("short_form_weights.virality", sw.virality),
            ("short_form_weights.shareability", sw.shareability),
            ("short_form_weights.shock_warmth", sw.shock_warmth),
            ("short_form_weights.recency", sw.recency),
            ("long_form_weights.informational", lw.informational),
            ("long_form_weights.transformation", lw.transformation),
            ("long_form_weights.emotional_depth", lw.emotional_depth),
            ("long_form_weights.recency", lw.recency),
        ];
        for (name, w) in weights {
            if !w.is_finite() || w < 0.0 {
                return fail(format!("selection.{name} must be a non-negative number"));
            }
        }

        let p = &self.pricing;
        if p.base_cost < 0 || p.per_platform_cost < 0 {
            return fail("pricing costs must not be negative".to_string());
        }
        if p.target_platforms.is_empty() {
            return fail("pricing.target_platforms must not be empty".to_string());
        }
        let mut seen = HashSet::new();
        if let Some(dup) = p.target_platforms.iter().find(|pl| !seen.insert(**pl)) {
            return fail(format!(
                "pricing.target_platforms lists {} more than once",
                dup.as_str()
            ));
        }

        let sched = &self.schedule;
        for (name, hours) in [
            ("short_form_hours", &sched.short_form_hours),
            ("long_form_hours", &sched.long_form_hours),
        ] {
            if hours.is_empty() {
                return fail(format!("schedule.{name} must not be empty"));
            }
            if let Some(h) = hours.iter().find(|h| **h > 23) {
                return fail(format!("schedule.{name} contains invalid hour {h}"));
            }
        }
        if sched.utc_offset_minutes.abs() >= 24 * 60 {
            return fail("schedule.utc_offset_minutes must be within ±23:59".to_string());
        }

        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults_are_valid() {
        PipelineSettings::default()
            .validate()
            .expect("defaults must validate");
    }

    #[test]
    fn default_job_cost_is_base_plus_four_platforms() {
        assert_eq!(CreditPricing::default().job_cost(), 160);
    }

    #[test]
    fn missing_path_returns_defaults() {
        let settings = load_pipeline_settings(None).expect("defaults");
        assert_eq!(settings, PipelineSettings::default());
    }

    #[test]
    fn empty_document_returns_defaults() {
        let settings = parse_pipeline_settings("  \n").expect("defaults");
        assert_eq!(settings.selection.short_form_cap, 4);
    }

    #[test]
    fn partial_document_overrides_only_given_keys() {
        let yaml = r"
selection:
  short_form_cap: 6
  short_form_weights:
    virality: 0.5
pricing:
  base_cost: 200
  target_platforms: [tiktok, youtube]
schedule:
  long_form_hours: [7]
";
        let settings = parse_pipeline_settings(yaml).expect("parse");
        assert_eq!(settings.selection.short_form_cap, 6);
        assert_eq!(settings.selection.long_form_cap, 2);
        assert!((settings.selection.short_form_weights.virality - 0.5).abs() < f64::EPSILON);
        assert!((settings.selection.short_form_weights.shareability - 0.3).abs() < f64::EPSILON);
        assert_eq!(settings.pricing.job_cost(), 220);
        assert_eq!(settings.schedule.long_form_hours, vec![7]);
        assert_eq!(settings.schedule.short_form_hours, vec![9, 12, 15, 18]);
    }

    #[test]
    fn shipped_example_matches_defaults() {
        let yaml = include_str!("../../../config/pipeline.example.yaml");
        let settings = parse_pipeline_settings(yaml).expect("example parses");
        assert_eq!(settings, PipelineSettings::default());
    }

    #[test]
    fn unknown_keys_are_rejected() {
        let result = parse_pipeline_settings("selection:\n  short_cap: 3\n");
        assert!(matches!(result, Err(ConfigError::SettingsFileParse(_))));
    }

    #[test]
    fn zero_cap_fails_validation() {
        let result = parse_pipeline_settings("selection:\n  long_form_cap: 0\n");
        assert!(matches!(result, Err(ConfigError::Validation(_))));
    }

    #[test]
    fn invalid_hour_fails_validation() {
        let result = parse_pipeline_settings("schedule:\n  short_form_hours: [9, 24]\n");
        assert!(
            matches!(result, Err(ConfigError::Validation(ref msg)) if msg.contains("24")),
            "got {result:?}"
        );
    }

    #[test]
    fn negative_weight_fails_validation() {
        let yaml = "selection:\n  long_form_weights:\n    recency: -0.1\n";
        let result = parse_pipeline_settings(yaml);
        assert!(matches!(result, Err(ConfigError::Validation(_))));
    }

    #[test]
    fn empty_platform_list_fails_validation() {
        let result = parse_pipeline_settings("pricing:\n  target_platforms: []\n");
        assert!(matches!(result, Err(ConfigError::Validation(_))));
    }

    #[test]
    fn duplicate_platform_fails_validation() {
        let result = parse_pipeline_settings("pricing:\n  target_platforms: [tiktok, tiktok]\n");
        assert!(
            matches!(result, Err(ConfigError::Validation(ref msg)) if msg.contains("tiktok")),
            "got {result:?}"
        );
    }

    #[test]
    fn unreadable_file_reports_path() {
        let err = load_pipeline_settings(Some(Path::new("/nonexistent/vdna/pipeline.yaml")))
            .expect_err("missing file");
        assert!(
            matches!(err, ConfigError::SettingsFileIo { ref path, .. } if path.contains("pipeline.yaml"))
        );
    }
}
