use chrono::{DateTime, Utc};
use serde::Serialize;
use uuid::Uuid;
use vdna_core::{Candidate, ContentType, Platform};

use crate::scorer::ViralHeuristics;

/// A candidate that passed one track's filter, with its ranking inputs.
#[derive(Debug, Clone)]
pub struct ScoredCandidate {
    pub candidate: Candidate,
    pub track: ContentType,
    pub heuristics: ViralHeuristics,
    /// Linear freshness factor in `[0, 1]`.
    pub recency: f64,
    /// Track-specific composite used for ranking.
    pub track_score: f64,
}

/// Default creative identity an organization's jobs are attributed to.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CreativeIdentity {
    pub id: i64,
    pub name: String,
}

/// One post slot of a production order.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ScheduledPost {
    pub platform: Platform,
    pub scheduled_for: DateTime<Utc>,
}

/// Everything the job sink needs to charge credits and create one job.
#[derive(Debug, Clone)]
pub struct ProductionOrder {
    pub organization_id: i64,
    pub creative_identity_id: Option<i64>,
    pub source_video_id: i64,
    pub source_url: String,
    pub content_type: ContentType,
    pub credits: i64,
    /// Ledger reason, `viral_cycle:<content_type> <platform> video: <title>`.
    pub reason: String,
    pub schedules: Vec<ScheduledPost>,
}

/// Result of the job sink's atomic charge-and-create transaction.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ProductionOutcome {
    Created {
        job_id: i64,
        public_id: Uuid,
        balance_after: i64,
    },
    InsufficientCredits,
    AlreadyProcessed,
}

/// Why an (organization, candidate) pairing produced no job.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum SkipReason {
    InsufficientCredits,
    AlreadyProcessed,
}

impl SkipReason {
    #[must_use]
    pub fn as_str(self) -> &'static str {
        match self {
            SkipReason::InsufficientCredits => "insufficient_credits",
            SkipReason::AlreadyProcessed => "already_processed",
        }
    }
}

/// Result of one (organization, candidate) unit of work.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum PairingOutcome {
    Created {
        job_id: i64,
        public_id: Uuid,
        content_type: ContentType,
    },
    Skipped(SkipReason),
    Failed(String),
}
