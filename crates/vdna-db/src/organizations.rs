//! Database operations for `organizations` and `creative_identities`.

use chrono::{DateTime, Utc};
use sqlx::PgPool;
use uuid::Uuid;

use crate::DbError;

/// A row from the `organizations` table.
#[derive(Debug, Clone, sqlx::FromRow)]
pub struct OrganizationRow {
    pub id: i64,
    pub public_id: Uuid,
    pub name: String,
    pub autopilot_enabled: bool,
    pub credit_balance: i64,
    pub created_at: DateTime<Utc>,
}

impl From<OrganizationRow> for vdna_core::Organization {
    fn from(row: OrganizationRow) -> Self {
        Self {
            id: row.id,
            public_id: row.public_id,
            name: row.name,
            autopilot_enabled: row.autopilot_enabled,
            credit_balance: row.credit_balance,
        }
    }
}

/// A row from the `creative_identities` table.
#[derive(Debug, Clone, sqlx::FromRow)]
pub struct CreativeIdentityRow {
    pub id: i64,
    pub public_id: Uuid,
    pub organization_id: i64,
    pub name: String,
    pub created_at: DateTime<Utc>,
}

/// Returns every organization with autopilot enabled, oldest first.
///
/// # Errors
///
/// Returns [`DbError::Sqlx`] if the query fails.
pub async fn list_autopilot_organizations(pool: &PgPool) -> Result<Vec<OrganizationRow>, DbError> {
    let rows = sqlx::query_as::<_, OrganizationRow>(
        "SELECT id, public_id, name, autopilot_enabled, credit_balance, created_at \
         FROM organizations \
         WHERE autopilot_enabled = TRUE \
         ORDER BY created_at ASC, id ASC",
    )
    .fetch_all(pool)
    .await?;

    Ok(rows)
}

/// Returns the organization's oldest active creative identity, if any.
///
/// # Errors
///
/// Returns [`DbError::Sqlx`] if the query fails.
pub async fn get_default_creative_identity(
    pool: &PgPool,
    organization_id: i64,
) -> Result<Option<CreativeIdentityRow>, DbError> {
    let row = sqlx::query_as::<_, CreativeIdentityRow>(
        "SELECT id, public_id, organization_id, name, created_at \
         FROM creative_identities \
         WHERE organization_id = $1 AND is_active = TRUE \
         ORDER BY created_at ASC, id ASC \
         LIMIT 1",
    )
    .bind(organization_id)
    .fetch_optional(pool)
    .await?;

    Ok(row)
}

/// Reads the current credit balance for an organization.
///
/// # Errors
///
/// Returns [`DbError::NotFound`] if the organization does not exist, or
/// [`DbError::Sqlx`] if the query fails.
pub async fn get_credit_balance(pool: &PgPool, organization_id: i64) -> Result<i64, DbError> {
    let balance = sqlx::query_scalar::<_, i64>(
        "SELECT credit_balance FROM organizations WHERE id = $1",
    )
    .bind(organization_id)
    .fetch_optional(pool)
    .await?
    .ok_or(DbError::NotFound)?;

    Ok(balance)
}
