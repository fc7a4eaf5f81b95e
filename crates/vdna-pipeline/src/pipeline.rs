//! Daily viral cycle orchestration.

use std::collections::HashSet;

use chrono::{DateTime, Utc};
use uuid::Uuid;
use vdna_core::PipelineSettings;

use crate::dedup::{dedupe_by_url, partition_processed, pool_urls};
use crate::error::PipelineError;
use crate::fanout::fan_out_organization;
use crate::notify::RunNotifier;
use crate::report::{RunReport, SelectedSummary, NO_QUALIFYING_CANDIDATES};
use crate::selection::select_tracks;
use crate::store::{CandidateSource, DedupStore, JobSink, OrganizationStore};

pub const ALL_CANDIDATES_PROCESSED: &str = "all selected candidates were already processed";

/// Collaborators injected into one cycle.
#[derive(Clone, Copy)]
pub struct CycleCollaborators<'a> {
    pub candidates: &'a dyn CandidateSource,
    pub dedup: &'a dyn DedupStore,
    pub organizations: &'a dyn OrganizationStore,
    pub jobs: &'a dyn JobSink,
    pub notifier: &'a dyn RunNotifier,
}

/// Run one full daily cycle.
///
/// 1. Fetch recent candidates and collapse repeated URLs.
/// 2. Select the short-form and long-form tracks.
/// 3. Drop sources already processed for any organization (one batch lookup).
/// 4. Fan the remaining pool out to every autopilot organization.
/// 5. Hand the report to the notifier; delivery failures are only logged.
///
/// `now` drives recency and post scheduling.
///
/// # Errors
///
/// Returns [`PipelineError::Upstream`] if the candidate or organization fetch
/// fails. No writes have happened at that point. Every other failure is
/// counted in the report.
pub async fn run_daily_cycle(
    collab: CycleCollaborators<'_>,
    settings: &PipelineSettings,
    run_id: Uuid,
    now: DateTime<Utc>,
) -> Result<RunReport, PipelineError> {
    let mut report = RunReport::new(run_id, now);

    let fetched = collab
        .candidates
        .fetch_candidates(&settings.candidates)
        .await
        .map_err(PipelineError::upstream("candidates"))?;
    let candidates = dedupe_by_url(fetched);
    report.candidates_evaluated = candidates.len();

    let selection = select_tracks(&candidates, &settings.selection, now);
    report.short_form_selected = selection.short_form.len();
    report.long_form_selected = selection.long_form.len();

    tracing::info!(
        %run_id,
        evaluated = report.candidates_evaluated,
        short_form = report.short_form_selected,
        long_form = report.long_form_selected,
        "viral_cycle: track selection complete"
    );

    if selection.is_empty() {
        report.early_exit_reason = Some(NO_QUALIFYING_CANDIDATES.to_string());
        return Ok(conclude(report, collab.notifier).await);
    }

    let pool = selection.into_pool();
    report.selected = pool.iter().map(SelectedSummary::from).collect();

    let processed = match collab.dedup.find_processed_urls(&pool_urls(&pool)).await {
        Ok(processed) => processed,
        Err(e) => {
            tracing::warn!(
                %run_id,
                error = %e,
                "viral_cycle: processed-source lookup failed, relying on per-organization claims"
            );
            HashSet::new()
        }
    };
    let dedup = partition_processed(pool, &processed);
    report.duplicates_skipped = dedup.duplicates.len();
    report.new_candidates = dedup.fresh.len();

    for dup in &dedup.duplicates {
        tracing::debug!(%run_id, url = %dup.candidate.url, "viral_cycle: duplicate source skipped");
    }

    if dedup.fresh.is_empty() {
        report.early_exit_reason = Some(ALL_CANDIDATES_PROCESSED.to_string());
        return Ok(conclude(report, collab.notifier).await);
    }

    let organizations = collab
        .organizations
        .list_autopilot_organizations()
        .await
        .map_err(PipelineError::upstream("organizations"))?;

    for organization in organizations.iter().filter(|o| o.autopilot_enabled) {
        let tally = fan_out_organization(
            collab.organizations,
            collab.jobs,
            organization,
            &dedup.fresh,
            settings,
            now,
        )
        .await;
        report.record_organization(tally);
    }

    Ok(conclude(report, collab.notifier).await)
}

async fn conclude(mut report: RunReport, notifier: &dyn RunNotifier) -> RunReport {
    report.finish(Utc::now());

    tracing::info!(
        run_id = %report.run_id,
        jobs_created = report.jobs_created.total,
        short_form_jobs = report.jobs_created.short_form,
        long_form_jobs = report.jobs_created.long_form,
        duplicates_skipped = report.duplicates_skipped,
        skipped = report.pairings_skipped.total,
        failed = report.pairings_failed,
        early_exit = report.early_exit_reason.as_deref().unwrap_or(""),
        "viral_cycle: run complete"
    );

    if let Err(e) = notifier.notify(&report).await {
        tracing::warn!(
            run_id = %report.run_id,
            error = %e,
            "viral_cycle: run report notification failed"
        );
    }

    report
}
