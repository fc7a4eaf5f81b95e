use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Tenant eligible for automated production.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Organization {
    pub id: i64,
    pub public_id: Uuid,
    pub name: String,
    pub autopilot_enabled: bool,
    /// Balance at the time the organization list was loaded. Fan-out re-reads
    /// the live balance before every charge.
    pub credit_balance: i64,
}
