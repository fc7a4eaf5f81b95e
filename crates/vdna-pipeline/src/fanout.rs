//! Per-organization fan-out of the deduplicated pool.
//!
//! [`process_pairing`] is the unit of work for one (organization, candidate)
//! pair. It never returns an error: every failure becomes
//! [`PairingOutcome::Failed`] so the remaining pairs keep going.

use chrono::{DateTime, Utc};
use vdna_core::{ContentType, Organization, PipelineSettings};

use crate::report::OrganizationTally;
use crate::schedule::schedule_posts;
use crate::store::{JobSink, OrganizationStore};
use crate::types::{
    CreativeIdentity, PairingOutcome, ProductionOrder, ProductionOutcome, ScoredCandidate,
    SkipReason,
};

/// Ledger reason for a viral-cycle charge.
#[must_use]
pub fn charge_reason(content_type: ContentType, platform: &str, title: &str) -> String {
    format!("viral_cycle:{content_type} {platform} video: {title}")
}

/// Inputs shared by every pairing of one organization.
#[derive(Debug, Clone, Copy)]
pub struct PairingContext<'a> {
    pub organization: &'a Organization,
    pub creative_identity: Option<&'a CreativeIdentity>,
    pub settings: &'a PipelineSettings,
    pub now: DateTime<Utc>,
}

/// Charge credits and create one production job for `candidate`.
///
/// `slot` is how many jobs of the candidate's track this organization has
/// already received in this run; it picks the post hours.
pub async fn process_pairing(
    organizations: &dyn OrganizationStore,
    jobs: &dyn JobSink,
    ctx: PairingContext<'_>,
    candidate: &ScoredCandidate,
    slot: usize,
) -> PairingOutcome {
    let org_id = ctx.organization.id;
    let url = candidate.candidate.url.as_str();
    let pricing = &ctx.settings.pricing;
    let cost = pricing.job_cost();

    let balance = match organizations.credit_balance(org_id).await {
        Ok(balance) => balance,
        Err(e) => {
            tracing::warn!(
                organization_id = org_id,
                url,
                error = %e,
                "viral_cycle: credit balance lookup failed"
            );
            return PairingOutcome::Failed(e.to_string());
        }
    };

    if balance < cost {
        tracing::info!(
            organization_id = org_id,
            url,
            balance,
            cost,
            "viral_cycle: insufficient credits, skipping"
        );
        return PairingOutcome::Skipped(SkipReason::InsufficientCredits);
    }

    let order = ProductionOrder {
        organization_id: org_id,
        creative_identity_id: ctx.creative_identity.map(|c| c.id),
        source_video_id: candidate.candidate.id,
        source_url: candidate.candidate.url.clone(),
        content_type: candidate.track,
        credits: cost,
        reason: charge_reason(
            candidate.track,
            &candidate.candidate.platform,
            &candidate.candidate.title,
        ),
        schedules: schedule_posts(
            candidate.track,
            slot,
            &pricing.target_platforms,
            &ctx.settings.schedule,
            ctx.now,
        ),
    };

    match jobs.create_production(&order).await {
        Ok(ProductionOutcome::Created {
            job_id,
            public_id,
            balance_after,
        }) => {
            tracing::info!(
                organization_id = org_id,
                url,
                job_id,
                content_type = %candidate.track,
                balance_after,
                "viral_cycle: production job created"
            );
            PairingOutcome::Created {
                job_id,
                public_id,
                content_type: candidate.track,
            }
        }
        Ok(ProductionOutcome::InsufficientCredits) => {
            tracing::info!(
                organization_id = org_id,
                url,
                "viral_cycle: credit deduction lost a race, skipping"
            );
            PairingOutcome::Skipped(SkipReason::InsufficientCredits)
        }
        Ok(ProductionOutcome::AlreadyProcessed) => {
            tracing::info!(
                organization_id = org_id,
                url,
                "viral_cycle: source already processed for organization, skipping"
            );
            PairingOutcome::Skipped(SkipReason::AlreadyProcessed)
        }
        Err(e) => {
            tracing::warn!(
                organization_id = org_id,
                url,
                error = %e,
                "viral_cycle: production job creation failed"
            );
            PairingOutcome::Failed(e.to_string())
        }
    }
}

/// Run every pairing for one organization, in pool order.
pub async fn fan_out_organization(
    organizations: &dyn OrganizationStore,
    jobs: &dyn JobSink,
    organization: &Organization,
    pool: &[ScoredCandidate],
    settings: &PipelineSettings,
    now: DateTime<Utc>,
) -> OrganizationTally {
    let creative_identity = match organizations
        .default_creative_identity(organization.id)
        .await
    {
        Ok(identity) => identity,
        Err(e) => {
            tracing::warn!(
                organization_id = organization.id,
                error = %e,
                "viral_cycle: creative identity lookup failed, continuing without one"
            );
            None
        }
    };

    let ctx = PairingContext {
        organization,
        creative_identity: creative_identity.as_ref(),
        settings,
        now,
    };

    let mut tally = OrganizationTally::new(organization.id, &organization.name);
    for candidate in pool {
        let slot = match candidate.track {
            ContentType::ShortForm => tally.jobs_created.short_form,
            ContentType::LongForm => tally.jobs_created.long_form,
        };
        let outcome = process_pairing(organizations, jobs, ctx, candidate, slot).await;
        tally.record(&outcome);
    }

    tracing::info!(
        organization_id = organization.id,
        created = tally.jobs_created.total,
        skipped = tally.skipped.total,
        failed = tally.failed,
        "viral_cycle: organization fan-out complete"
    );
    tally
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn charge_reason_includes_track_platform_and_title() {
        assert_eq!(
            charge_reason(ContentType::LongForm, "youtube", "How I paid off my debt"),
            "viral_cycle:long_form youtube video: How I paid off my debt"
        );
    }
}
