use std::collections::HashSet;

use async_trait::async_trait;
use sqlx::PgPool;
use vdna_core::{Candidate, CandidateQuerySettings, Organization};
use vdna_db::{NewPostSchedule, NewProductionJob, ProductionInsert};

use super::{CandidateSource, DedupStore, JobSink, OrganizationStore};
use crate::error::StoreError;
use crate::types::{CreativeIdentity, ProductionOrder, ProductionOutcome};

/// Postgres-backed implementation of every store trait.
#[derive(Debug, Clone)]
pub struct PgPipelineStore {
    pool: PgPool,
}

impl PgPipelineStore {
    #[must_use]
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

#[async_trait]
impl CandidateSource for PgPipelineStore {
    async fn fetch_candidates(
        &self,
        query: &CandidateQuerySettings,
    ) -> Result<Vec<Candidate>, StoreError> {
        let rows = vdna_db::list_recent_candidates(
            &self.pool,
            query.max_age_hours,
            query.min_views,
            query.limit,
        )
        .await?;

        Ok(rows.into_iter().map(vdna_db::CandidateRow::into_candidate).collect())
    }
}

#[async_trait]
impl DedupStore for PgPipelineStore {
    async fn find_processed_urls(&self, urls: &[String]) -> Result<HashSet<String>, StoreError> {
        Ok(vdna_db::find_processed_urls(&self.pool, urls).await?)
    }
}

#[async_trait]
impl OrganizationStore for PgPipelineStore {
    async fn list_autopilot_organizations(&self) -> Result<Vec<Organization>, StoreError> {
        let rows = vdna_db::list_autopilot_organizations(&self.pool).await?;
        Ok(rows.into_iter().map(Organization::from).collect())
    }

    async fn default_creative_identity(
        &self,
        organization_id: i64,
    ) -> Result<Option<CreativeIdentity>, StoreError> {
        let row = vdna_db::get_default_creative_identity(&self.pool, organization_id).await?;
        Ok(row.map(|r| CreativeIdentity {
            id: r.id,
            name: r.name,
        }))
    }

    async fn credit_balance(&self, organization_id: i64) -> Result<i64, StoreError> {
        Ok(vdna_db::get_credit_balance(&self.pool, organization_id).await?)
    }
}

#[async_trait]
impl JobSink for PgPipelineStore {
    async fn create_production(
        &self,
        order: &ProductionOrder,
    ) -> Result<ProductionOutcome, StoreError> {
        let job = NewProductionJob {
            organization_id: order.organization_id,
            creative_identity_id: order.creative_identity_id,
            source_video_id: Some(order.source_video_id),
            source_url: order.source_url.clone(),
            content_type: order.content_type.as_str().to_string(),
            credits: order.credits,
            reason: order.reason.clone(),
            schedules: order
                .schedules
                .iter()
                .map(|s| NewPostSchedule {
                    platform: s.platform.as_str().to_string(),
                    scheduled_for: s.scheduled_for,
                })
                .collect(),
        };

        let outcome = match vdna_db::create_production_job(&self.pool, &job).await? {
            ProductionInsert::Created {
                job_id,
                public_id,
                balance_after,
            } => ProductionOutcome::Created {
                job_id,
                public_id,
                balance_after,
            },
            ProductionInsert::InsufficientCredits => ProductionOutcome::InsufficientCredits,
            ProductionInsert::AlreadyProcessed => ProductionOutcome::AlreadyProcessed,
        };

        Ok(outcome)
    }
}
