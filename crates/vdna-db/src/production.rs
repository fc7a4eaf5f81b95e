//! Production job creation and the processed-source dedup store.
//!
//! [`create_production_job`] is the only writer used by the viral cycle. It
//! claims the `(organization, source_url)` pair, charges credits, inserts the
//! job with its post schedules, and records a ledger entry in one transaction.

use std::collections::HashSet;

use chrono::{DateTime, Utc};
use sqlx::PgPool;
use uuid::Uuid;

use crate::DbError;

/// One post slot for a new production job.
#[derive(Debug, Clone)]
pub struct NewPostSchedule {
    pub platform: String,
    pub scheduled_for: DateTime<Utc>,
}

/// Everything needed to create one production job.
#[derive(Debug, Clone)]
pub struct NewProductionJob {
    pub organization_id: i64,
    pub creative_identity_id: Option<i64>,
    pub source_video_id: Option<i64>,
    pub source_url: String,
    pub content_type: String,
    pub credits: i64,
    pub reason: String,
    pub schedules: Vec<NewPostSchedule>,
}

/// Result of [`create_production_job`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ProductionInsert {
    Created {
        job_id: i64,
        public_id: Uuid,
        balance_after: i64,
    },
    /// The balance was below the job cost when the decrement ran.
    InsufficientCredits,
    /// `(organization_id, source_url)` already has a processed-source record.
    AlreadyProcessed,
}

/// A row from the `post_schedules` table.
#[derive(Debug, Clone, sqlx::FromRow)]
pub struct PostScheduleRow {
    pub id: i64,
    pub production_job_id: i64,
    pub platform: String,
    pub scheduled_for: DateTime<Utc>,
    pub status: String,
}

/// Returns the subset of `urls` that already have a processed-source record
/// for any organization. One round-trip regardless of batch size.
///
/// # Errors
///
/// Returns [`DbError::Sqlx`] if the query fails.
pub async fn find_processed_urls(pool: &PgPool, urls: &[String]) -> Result<HashSet<String>, DbError> {
    if urls.is_empty() {
        return Ok(HashSet::new());
    }

    let rows: Vec<String> = sqlx::query_scalar::<_, String>(
        "SELECT DISTINCT source_url FROM processed_sources WHERE source_url = ANY($1::text[])",
    )
    .bind(urls)
    .fetch_all(pool)
    .await?;

    Ok(rows.into_iter().collect())
}

/// Create a production job atomically.
///
/// Within one transaction:
/// 1. insert the processed-source claim (`ON CONFLICT DO NOTHING`);
/// 2. decrement the credit balance only if it covers `job.credits`;
/// 3. insert the job, its post schedules, and a ledger entry.
///
/// A lost claim or an insufficient balance rolls back and is reported through
/// [`ProductionInsert`] rather than as an error; nothing is written.
///
/// # Errors
///
/// Returns [`DbError::Sqlx`] if any statement fails. The transaction is rolled
/// back on drop, so no partial writes survive.
pub async fn create_production_job(
    pool: &PgPool,
    job: &NewProductionJob,
) -> Result<ProductionInsert, DbError> {
    let mut tx = pool.begin().await?;

    let claim_id: Option<i64> = sqlx::query_scalar(
        "INSERT INTO processed_sources (organization_id, source_url) \
         VALUES ($1, $2) \
         ON CONFLICT (organization_id, source_url) DO NOTHING \
         RETURNING id",
    )
    .bind(job.organization_id)
    .bind(&job.source_url)
    .fetch_optional(&mut *tx)
    .await?;

    let Some(claim_id) = claim_id else {
        tx.rollback().await?;
        return Ok(ProductionInsert::AlreadyProcessed);
    };

    let balance_after: Option<i64> = sqlx::query_scalar(
        "UPDATE organizations \
         SET credit_balance = credit_balance - $2, updated_at = NOW() \
         WHERE id = $1 AND credit_balance >= $2 \
         RETURNING credit_balance",
    )
    .bind(job.organization_id)
    .bind(job.credits)
    .fetch_optional(&mut *tx)
    .await?;

    let Some(balance_after) = balance_after else {
        tx.rollback().await?;
        return Ok(ProductionInsert::InsufficientCredits);
    };

    let public_id = Uuid::new_v4();
    let job_id: i64 = sqlx::query_scalar(
        "INSERT INTO production_jobs \
             (public_id, organization_id, creative_identity_id, source_video_id, source_url, \
              content_type, status, script_status, credits_charged) \
         VALUES ($1, $2, $3, $4, $5, $6, 'queued', 'pending', $7) \
         RETURNING id",
    )
    .bind(public_id)
    .bind(job.organization_id)
    .bind(job.creative_identity_id)
    .bind(job.source_video_id)
    .bind(&job.source_url)
    .bind(&job.content_type)
    .bind(job.credits)
    .fetch_one(&mut *tx)
    .await?;

    sqlx::query("UPDATE processed_sources SET production_job_id = $1 WHERE id = $2")
        .bind(job_id)
        .bind(claim_id)
        .execute(&mut *tx)
        .await?;

    sqlx::query(
        "INSERT INTO credit_ledger \
             (organization_id, amount, balance_after, reason, production_job_id) \
         VALUES ($1, $2, $3, $4, $5)",
    )
    .bind(job.organization_id)
    .bind(-job.credits)
    .bind(balance_after)
    .bind(&job.reason)
    .bind(job_id)
    .execute(&mut *tx)
    .await?;

    if !job.schedules.is_empty() {
        let platforms: Vec<String> = job.schedules.iter().map(|s| s.platform.clone()).collect();
        let times: Vec<DateTime<Utc>> = job.schedules.iter().map(|s| s.scheduled_for).collect();

        sqlx::query(
            "INSERT INTO post_schedules (production_job_id, platform, scheduled_for) \
             SELECT $1, * FROM UNNEST($2::text[], $3::timestamptz[])",
        )
        .bind(job_id)
        .bind(&platforms)
        .bind(&times)
        .execute(&mut *tx)
        .await?;
    }

    tx.commit().await?;

    Ok(ProductionInsert::Created {
        job_id,
        public_id,
        balance_after,
    })
}

/// Returns the post schedule entries for a production job, earliest first.
///
/// # Errors
///
/// Returns [`DbError::Sqlx`] if the query fails.
pub async fn list_post_schedules(
    pool: &PgPool,
    production_job_id: i64,
) -> Result<Vec<PostScheduleRow>, DbError> {
    let rows = sqlx::query_as::<_, PostScheduleRow>(
        "SELECT id, production_job_id, platform, scheduled_for, status \
         FROM post_schedules \
         WHERE production_job_id = $1 \
         ORDER BY scheduled_for ASC, platform ASC",
    )
    .bind(production_job_id)
    .fetch_all(pool)
    .await?;

    Ok(rows)
}
