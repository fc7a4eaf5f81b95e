//! Single-flight execution of the daily viral cycle.
//!
//! HTTP triggers and the cron job share one [`CycleRunner`]. A second trigger
//! while a cycle is running is refused instead of queued.

use std::sync::Arc;

use chrono::Utc;
use sqlx::PgPool;
use thiserror::Error;
use tokio::sync::Mutex;
use uuid::Uuid;
use vdna_core::PipelineSettings;
use vdna_pipeline::{
    run_daily_cycle, CycleCollaborators, PgPipelineStore, PipelineError, RunNotifier, RunReport,
};

#[derive(Debug, Error)]
pub enum CycleRunError {
    #[error("a viral cycle is already running")]
    InProgress,

    #[error(transparent)]
    Pipeline(#[from] PipelineError),

    #[error("failed to record pipeline run: {0}")]
    Db(#[from] vdna_db::DbError),
}

#[derive(Clone)]
pub struct CycleRunner {
    pool: PgPool,
    settings: Arc<PipelineSettings>,
    notifier: Arc<dyn RunNotifier>,
    lock: Arc<Mutex<()>>,
}

impl CycleRunner {
    pub fn new(pool: PgPool, settings: PipelineSettings, notifier: Arc<dyn RunNotifier>) -> Self {
        Self {
            pool,
            settings: Arc::new(settings),
            notifier,
            lock: Arc::new(Mutex::new(())),
        }
    }

    #[cfg(test)]
    pub(crate) fn lock_handle(&self) -> Arc<Mutex<()>> {
        Arc::clone(&self.lock)
    }

    /// Run one cycle and record it in `pipeline_runs`.
    ///
    /// # Errors
    ///
    /// - [`CycleRunError::InProgress`] if another cycle holds the lock.
    /// - [`CycleRunError::Pipeline`] if an upstream fetch failed; the run row
    ///   is marked `failed`.
    /// - [`CycleRunError::Db`] if the run row cannot be created.
    pub async fn run(&self, trigger_source: &str) -> Result<RunReport, CycleRunError> {
        let Ok(_guard) = self.lock.try_lock() else {
            tracing::warn!(trigger_source, "viral_cycle: trigger refused, cycle in progress");
            return Err(CycleRunError::InProgress);
        };

        let run_id = Uuid::new_v4();
        let run = vdna_db::create_pipeline_run(&self.pool, run_id, trigger_source).await?;
        tracing::info!(%run_id, trigger_source, "viral_cycle: run started");

        let store = PgPipelineStore::new(self.pool.clone());
        let collab = CycleCollaborators {
            candidates: &store,
            dedup: &store,
            organizations: &store,
            jobs: &store,
            notifier: self.notifier.as_ref(),
        };

        match run_daily_cycle(collab, &self.settings, run_id, Utc::now()).await {
            Ok(report) => {
                self.record_success(run.id, &report).await;
                Ok(report)
            }
            Err(e) => {
                tracing::error!(%run_id, error = %e, "viral_cycle: run failed");
                if let Err(db_err) =
                    vdna_db::fail_pipeline_run(&self.pool, run.id, &e.to_string()).await
                {
                    tracing::error!(
                        %run_id,
                        error = %db_err,
                        "viral_cycle: failed to mark run failed"
                    );
                }
                Err(e.into())
            }
        }
    }

    async fn record_success(&self, id: i64, report: &RunReport) {
        let jobs_created = i32::try_from(report.jobs_created.total).unwrap_or(i32::MAX);
        let payload = match serde_json::to_value(report) {
            Ok(v) => v,
            Err(e) => {
                tracing::error!(
                    run_id = %report.run_id,
                    error = %e,
                    "viral_cycle: report serialization failed"
                );
                serde_json::Value::Null
            }
        };

        if let Err(e) =
            vdna_db::complete_pipeline_run(&self.pool, id, jobs_created, &payload).await
        {
            tracing::error!(
                run_id = %report.run_id,
                error = %e,
                "viral_cycle: failed to mark run succeeded"
            );
        }
    }
}
