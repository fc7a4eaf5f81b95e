//! Read access to `trending_videos` joined with `viral_scores`.

use chrono::{DateTime, Utc};
use sqlx::PgPool;
use vdna_core::{Candidate, RawScoreSet};

use crate::DbError;

/// A trending video with its (possibly partial) score columns.
///
/// Score columns are nullable: the scorer may not have produced every field,
/// or may not have run yet at all (LEFT JOIN).
#[derive(Debug, Clone, sqlx::FromRow)]
pub struct CandidateRow {
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
    pub commercial_fit_score: Option<f64>,
    pub virality_score: Option<f64>,
    pub product_fit_score: Option<f64>,
    pub clone_feasibility_score: Option<f64>,
    pub emotional_depth_score: Option<f64>,
    pub informational_value_score: Option<f64>,
    pub transformation_score: Option<f64>,
    pub composite_score: Option<f64>,
    pub content_type: Option<String>,
    pub ad_type: Option<String>,
}

impl CandidateRow {
    /// Score columns in their unvalidated boundary shape.
    #[must_use]
    pub fn raw_scores(&self) -> RawScoreSet {
        RawScoreSet {
            commercial_fit_score: self.commercial_fit_score,
            virality_score: self.virality_score,
            product_fit_score: self.product_fit_score,
            clone_feasibility_score: self.clone_feasibility_score,
            emotional_depth_score: self.emotional_depth_score,
            informational_value_score: self.informational_value_score,
            transformation_score: self.transformation_score,
            composite_score: self.composite_score,
            content_type: self.content_type.clone(),
            ad_type: self.ad_type.clone(),
        }
    }

    /// Validate scores and convert into a domain [`Candidate`].
    #[must_use]
    pub fn into_candidate(self) -> Candidate {
        let scores = self.raw_scores().validate(self.duration_seconds);
        Candidate {
            id: self.id,
            url: self.url,
            platform: self.platform,
            title: self.title,
            transcript: self.transcript,
            view_count: self.view_count,
            like_count: self.like_count,
            comment_count: self.comment_count,
            duration_seconds: self.duration_seconds,
            captured_at: self.captured_at,
            scores,
        }
    }
}

/// Returns videos captured within the last `max_age_hours` with at least
/// `min_views` views, most-viewed first, capped at `limit`.
///
/// # Errors
///
/// Returns [`DbError::Sqlx`] if the query fails.
pub async fn list_recent_candidates(
    pool: &PgPool,
    max_age_hours: i64,
    min_views: i64,
    limit: i64,
) -> Result<Vec<CandidateRow>, DbError> {
    let rows = sqlx::query_as::<_, CandidateRow>(
        "SELECT v.id, v.url, v.platform, v.title, v.transcript, \
                v.view_count, v.like_count, v.comment_count, v.duration_seconds, v.captured_at, \
                s.commercial_fit_score, s.virality_score, s.product_fit_score, \
                s.clone_feasibility_score, s.emotional_depth_score, \
                s.informational_value_score, s.transformation_score, s.composite_score, \
                s.content_type, s.ad_type \
         FROM trending_videos v \
         LEFT JOIN viral_scores s ON s.video_id = v.id \
         WHERE v.captured_at >= NOW() - make_interval(hours => $1::int) \
           AND v.view_count >= $2 \
         ORDER BY v.view_count DESC, v.id ASC \
         LIMIT $3",
    )
    .bind(i32::try_from(max_age_hours).unwrap_or(i32::MAX))
    .bind(min_views)
    .bind(limit)
    .fetch_all(pool)
    .await?;

    Ok(rows)
}
