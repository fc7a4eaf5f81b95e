//! Collaborator seams for the daily cycle.
//!
//! The cycle never touches a database client directly; it is handed trait
//! objects built once at startup. [`PgPipelineStore`] implements every store
//! trait over `vdna-db`.

mod pg;

use std::collections::HashSet;

use async_trait::async_trait;
use vdna_core::{Candidate, CandidateQuerySettings, Organization};

use crate::error::StoreError;
use crate::types::{CreativeIdentity, ProductionOrder, ProductionOutcome};

pub use pg::PgPipelineStore;

/// Source of scored trending videos.
#[async_trait]
pub trait CandidateSource: Send + Sync {
    /// Candidates captured within `query.max_age_hours` with at least
    /// `query.min_views` views, most-viewed first, at most `query.limit`.
    async fn fetch_candidates(
        &self,
        query: &CandidateQuerySettings,
    ) -> Result<Vec<Candidate>, StoreError>;
}

/// Record of source URLs already turned into production work.
#[async_trait]
pub trait DedupStore: Send + Sync {
    /// Subset of `urls` processed for any organization. One lookup per batch.
    async fn find_processed_urls(&self, urls: &[String]) -> Result<HashSet<String>, StoreError>;
}

#[async_trait]
pub trait OrganizationStore: Send + Sync {
    async fn list_autopilot_organizations(&self) -> Result<Vec<Organization>, StoreError>;

    async fn default_creative_identity(
        &self,
        organization_id: i64,
    ) -> Result<Option<CreativeIdentity>, StoreError>;

    async fn credit_balance(&self, organization_id: i64) -> Result<i64, StoreError>;
}

/// Atomic charge-and-create for production jobs.
#[async_trait]
pub trait JobSink: Send + Sync {
    /// Claim the (organization, source URL) pair, deduct `order.credits` only
    /// if the balance covers it, and create the job with its schedules. Either
    /// every write lands or none does.
    async fn create_production(
        &self,
        order: &ProductionOrder,
    ) -> Result<ProductionOutcome, StoreError>;
}
