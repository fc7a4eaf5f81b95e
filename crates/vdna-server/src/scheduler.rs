//! Background job scheduler.
//!
//! When a cron expression is configured, registers the daily viral cycle as a
//! recurring job sharing the HTTP trigger's [`CycleRunner`].

use tokio_cron_scheduler::{Job, JobScheduler, JobSchedulerError};

use crate::cycle::{CycleRunError, CycleRunner};

/// Builds and starts the scheduler, or returns `None` when no cron expression
/// is configured.
///
/// The returned [`JobScheduler`] must be kept alive for the lifetime of the
/// process. Dropping it shuts down the job.
///
/// # Errors
///
/// Returns [`JobSchedulerError`] if the cron expression is invalid or the
/// scheduler cannot be started.
pub async fn build_scheduler(
    runner: CycleRunner,
    cron: Option<&str>,
) -> Result<Option<JobScheduler>, JobSchedulerError> {
    let Some(cron) = cron else {
        tracing::info!("scheduler: VDNA_CYCLE_CRON not set, viral cycle runs on demand only");
        return Ok(None);
    };

    let scheduler = JobScheduler::new().await?;
    register_viral_cycle_job(&scheduler, runner, cron).await?;
    scheduler.start().await?;

    tracing::info!(cron, "scheduler: viral cycle job registered");
    Ok(Some(scheduler))
}

async fn register_viral_cycle_job(
    scheduler: &JobScheduler,
    runner: CycleRunner,
    cron: &str,
) -> Result<(), JobSchedulerError> {
    let job = Job::new_async(cron, move |_uuid, _lock| {
        let runner = runner.clone();

        Box::pin(async move {
            tracing::info!("scheduler: starting daily viral cycle");
            match runner.run("schedule").await {
                Ok(report) => tracing::info!(
                    run_id = %report.run_id,
                    jobs_created = report.jobs_created.total,
                    "scheduler: daily viral cycle complete"
                ),
                Err(CycleRunError::InProgress) => {
                    tracing::warn!("scheduler: skipped, a cycle is already running");
                }
                Err(e) => tracing::error!(error = %e, "scheduler: daily viral cycle failed"),
            }
        })
    })?;

    scheduler.add(job).await?;
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::Arc;
    use vdna_core::PipelineSettings;
    use vdna_pipeline::NoopNotifier;

    fn runner() -> CycleRunner {
        let pool = sqlx::postgres::PgPoolOptions::new()
            .connect_lazy("postgres://localhost/vdna_unused")
            .expect("lazy pool");
        CycleRunner::new(pool, PipelineSettings::default(), Arc::new(NoopNotifier))
    }

    #[tokio::test]
    async fn no_cron_means_no_scheduler() {
        let scheduler = build_scheduler(runner(), None).await.expect("build");
        assert!(scheduler.is_none());
    }

    #[tokio::test]
    async fn invalid_cron_is_rejected() {
        assert!(build_scheduler(runner(), Some("not a cron")).await.is_err());
    }
}
