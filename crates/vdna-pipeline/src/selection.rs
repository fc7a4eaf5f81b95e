//! Short-form and long-form track selection.
//!
//! Both tracks run over the full candidate set. Each applies its own filter,
//! ranks survivors by a track-specific composite score and keeps the top
//! `cap`. Ties fall back to view count (descending) and URL (ascending).

use std::cmp::Ordering;

use chrono::{DateTime, Utc};
use vdna_core::{AdType, Candidate, ContentType, SelectionSettings};

use crate::scorer::ViralHeuristics;
use crate::types::ScoredCandidate;

const SHORT_FORM_AD_TYPES: &[AdType] = &[AdType::Ugc, AdType::Superbowl, AdType::Commercial];
const LONG_FORM_AD_TYPES: &[AdType] = &[
    AdType::Educational,
    AdType::Motivational,
    AdType::Informational,
];

/// Ranked, capped selections for one run.
#[derive(Debug, Clone, Default)]
pub struct TrackSelection {
    pub short_form: Vec<ScoredCandidate>,
    pub long_form: Vec<ScoredCandidate>,
}

impl TrackSelection {
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.short_form.is_empty() && self.long_form.is_empty()
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.short_form.len() + self.long_form.len()
    }

    /// Union of both tracks, short-form first, each in rank order.
    #[must_use]
    pub fn into_pool(self) -> Vec<ScoredCandidate> {
        let mut pool = self.short_form;
        pool.extend(self.long_form);
        pool
    }
}

/// Linear decay from 1 at capture to 0 after `window_hours`. Captures in the
/// future count as fully fresh.
#[must_use]
pub fn recency_factor(hours_since_capture: f64, window_hours: f64) -> f64 {
    if !hours_since_capture.is_finite() || window_hours <= 0.0 {
        return 0.0;
    }
    (1.0 - hours_since_capture / window_hours).clamp(0.0, 1.0)
}

#[must_use]
pub fn is_short_form_eligible(candidate: &Candidate, settings: &SelectionSettings) -> bool {
    let s = &candidate.scores;
    s.content_type == ContentType::ShortForm
        && candidate.duration_seconds > 0.0
        && candidate.duration_seconds <= settings.short_form_max_duration_secs
        && s.ad_type.is_some_and(|t| SHORT_FORM_AD_TYPES.contains(&t))
        && s.commercial_fit >= settings.min_commercial_fit
        && s.clone_feasibility >= settings.min_clone_feasibility
}

#[must_use]
pub fn is_long_form_eligible(candidate: &Candidate, settings: &SelectionSettings) -> bool {
    let s = &candidate.scores;
    s.content_type == ContentType::LongForm
        && candidate.duration_seconds >= settings.long_form_min_duration_secs
        && candidate.duration_seconds <= settings.long_form_max_duration_secs
        && s.ad_type.is_some_and(|t| LONG_FORM_AD_TYPES.contains(&t))
        && (s.informational_value >= settings.min_long_form_value
            || s.transformation >= settings.min_long_form_value)
}

#[must_use]
pub fn short_form_score(
    candidate: &Candidate,
    heuristics: &ViralHeuristics,
    recency: f64,
    settings: &SelectionSettings,
) -> f64 {
    let w = &settings.short_form_weights;
    candidate.scores.virality * w.virality
        + heuristics.shareability * w.shareability
        + heuristics.shock_warmth_signal() * w.shock_warmth
        + recency * 100.0 * w.recency
}

#[must_use]
pub fn long_form_score(candidate: &Candidate, recency: f64, settings: &SelectionSettings) -> f64 {
    let w = &settings.long_form_weights;
    let s = &candidate.scores;
    s.informational_value * w.informational
        + s.transformation * w.transformation
        + s.emotional_depth * w.emotional_depth
        + recency * 100.0 * w.recency
}

/// Run both track selections over `candidates`, measuring recency against `now`.
#[must_use]
pub fn select_tracks(
    candidates: &[Candidate],
    settings: &SelectionSettings,
    now: DateTime<Utc>,
) -> TrackSelection {
    let mut selection = TrackSelection::default();

    for candidate in candidates {
        let heuristics =
            ViralHeuristics::compute(&candidate.title, candidate.transcript.as_deref());
        let recency = recency_factor(
            candidate.hours_since_capture(now),
            settings.recency_window_hours,
        );

        if is_short_form_eligible(candidate, settings) {
            selection.short_form.push(ScoredCandidate {
                candidate: candidate.clone(),
                track: ContentType::ShortForm,
                heuristics,
                recency,
                track_score: short_form_score(candidate, &heuristics, recency, settings),
            });
        } else if is_long_form_eligible(candidate, settings) {
            selection.long_form.push(ScoredCandidate {
                candidate: candidate.clone(),
                track: ContentType::LongForm,
                heuristics,
                recency,
                track_score: long_form_score(candidate, recency, settings),
            });
        }
    }

    rank_and_cap(&mut selection.short_form, settings.short_form_cap);
    rank_and_cap(&mut selection.long_form, settings.long_form_cap);
    selection
}

fn rank_and_cap(track: &mut Vec<ScoredCandidate>, cap: usize) {
    track.sort_by(compare_ranked);
    track.truncate(cap);
}

fn compare_ranked(a: &ScoredCandidate, b: &ScoredCandidate) -> Ordering {
    b.track_score
        .total_cmp(&a.track_score)
        .then_with(|| b.candidate.view_count.cmp(&a.candidate.view_count))
        .then_with(|| a.candidate.url.cmp(&b.candidate.url))
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Duration;
    use vdna_core::ScoreSet;

    fn now() -> DateTime<Utc> {
        DateTime::parse_from_rfc3339("2026-03-10T06:00:00Z")
            .expect("valid timestamp")
            .with_timezone(&Utc)
    }

    fn short(url: &str, duration: f64, virality: f64) -> Candidate {
        Candidate {
            id: 1,
            url: url.to_string(),
            platform: "tiktok".to_string(),
            title: "Street interview".to_string(),
            transcript: None,
            view_count: 2_000_000,
            like_count: 0,
            comment_count: 0,
            duration_seconds: duration,
            captured_at: now() - Duration::hours(12),
            scores: ScoreSet {
                commercial_fit: 80.0,
                virality,
                product_fit: 50.0,
                clone_feasibility: 80.0,
                emotional_depth: 40.0,
                informational_value: 20.0,
                transformation: 10.0,
                composite: 70.0,
                content_type: ContentType::ShortForm,
                ad_type: Some(AdType::Ugc),
            },
        }
    }

    fn long(url: &str, duration: f64, informational: f64) -> Candidate {
        let mut c = short(url, duration, 50.0);
        c.scores.content_type = ContentType::LongForm;
        c.scores.ad_type = Some(AdType::Educational);
        c.scores.informational_value = informational;
        c
    }

    #[test]
    fn recency_decays_linearly_and_clamps() {
        assert_eq!(recency_factor(0.0, 168.0), 1.0);
        assert_eq!(recency_factor(84.0, 168.0), 0.5);
        assert_eq!(recency_factor(168.0, 168.0), 0.0);
        assert_eq!(recency_factor(500.0, 168.0), 0.0);
        assert_eq!(recency_factor(-3.0, 168.0), 1.0);
    }

    #[test]
    fn short_form_rejects_long_durations() {
        let settings = SelectionSettings::default();
        assert!(is_short_form_eligible(&short("a", 60.0, 90.0), &settings));
        assert!(!is_short_form_eligible(&short("a", 60.5, 90.0), &settings));
        assert!(!is_short_form_eligible(&short("a", 0.0, 90.0), &settings));
    }

    #[test]
    fn short_form_rejects_low_commercial_fit_regardless_of_other_scores() {
        let settings = SelectionSettings::default();
        let mut c = short("a", 30.0, 100.0);
        c.title = "surprise baby hug omg".to_string();
        c.scores.commercial_fit = 59.9;
        assert!(!is_short_form_eligible(&c, &settings));

        let selection = select_tracks(&[c], &settings, now());
        assert!(selection.short_form.is_empty());
    }

    #[test]
    fn short_form_requires_matching_ad_type() {
        let settings = SelectionSettings::default();
        let mut c = short("a", 30.0, 90.0);
        c.scores.ad_type = Some(AdType::Educational);
        assert!(!is_short_form_eligible(&c, &settings));
        c.scores.ad_type = None;
        assert!(!is_short_form_eligible(&c, &settings));
        c.scores.ad_type = Some(AdType::Superbowl);
        assert!(is_short_form_eligible(&c, &settings));
    }

    #[test]
    fn long_form_accepts_either_value_threshold() {
        let settings = SelectionSettings::default();
        let mut c = long("a", 400.0, 10.0);
        assert!(!is_long_form_eligible(&c, &settings));
        c.scores.transformation = 60.0;
        assert!(is_long_form_eligible(&c, &settings));
    }

    #[test]
    fn long_form_duration_bounds_are_inclusive() {
        let settings = SelectionSettings::default();
        assert!(is_long_form_eligible(&long("a", 300.0, 70.0), &settings));
        assert!(is_long_form_eligible(&long("a", 900.0, 70.0), &settings));
        assert!(!is_long_form_eligible(&long("a", 299.0, 70.0), &settings));
        assert!(!is_long_form_eligible(&long("a", 901.0, 70.0), &settings));
    }

    #[test]
    fn short_form_score_uses_weights_and_heuristics() {
        let settings = SelectionSettings::default();
        let mut c = short("a", 30.0, 90.0);
        c.title = "Surprise!".to_string();
        let h = ViralHeuristics::compute(&c.title, None);
        // shock 80, warmth 0, shareability 48, signal 80
        let score = short_form_score(&c, &h, 0.5, &settings);
        let expected = 90.0 * 0.4 + 48.0 * 0.3 + 80.0 * 0.3 + 50.0 * 0.1;
        assert!((score - expected).abs() < 1e-9, "got {score}");
    }

    #[test]
    fn caps_hold_for_large_inputs() {
        let settings = SelectionSettings::default();
        let mut candidates = Vec::new();
        for i in 0..40 {
            candidates.push(short(&format!("s{i}"), 30.0, f64::from(i)));
            candidates.push(long(&format!("l{i}"), 600.0, 60.0 + f64::from(i % 40)));
        }

        let selection = select_tracks(&candidates, &settings, now());
        assert_eq!(selection.short_form.len(), 4);
        assert_eq!(selection.long_form.len(), 2);
        assert_eq!(selection.short_form[0].candidate.url, "s39");
        assert_eq!(selection.long_form[0].candidate.url, "l39");
    }

    #[test]
    fn ties_break_by_views_then_url() {
        let settings = SelectionSettings::default();
        let mut a = short("b-url", 30.0, 70.0);
        let mut b = short("a-url", 30.0, 70.0);
        let mut c = short("c-url", 30.0, 70.0);
        a.view_count = 5_000_000;
        b.view_count = 3_000_000;
        c.view_count = 3_000_000;

        let selection = select_tracks(&[c, b, a], &settings, now());
        let urls: Vec<&str> = selection
            .short_form
            .iter()
            .map(|s| s.candidate.url.as_str())
            .collect();
        assert_eq!(urls, vec!["b-url", "a-url", "c-url"]);
    }

    #[test]
    fn configured_caps_are_respected() {
        let settings = SelectionSettings {
            short_form_cap: 1,
            long_form_cap: 1,
            ..SelectionSettings::default()
        };
        let candidates = vec![
            short("s1", 30.0, 70.0),
            short("s2", 30.0, 80.0),
            long("l1", 600.0, 70.0),
            long("l2", 600.0, 90.0),
        ];

        let selection = select_tracks(&candidates, &settings, now());
        assert_eq!(selection.len(), 2);
        assert_eq!(selection.short_form[0].candidate.url, "s2");
        assert_eq!(selection.long_form[0].candidate.url, "l2");

        let pool = selection.into_pool();
        assert_eq!(pool[0].track, ContentType::ShortForm);
        assert_eq!(pool[1].track, ContentType::LongForm);
    }
}
