//! Storage traits consumed by the linking subsystem.
//!
//! The host application owns the concrete adapters (PostgreSQL or in-memory)
//! and injects them as trait objects.

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use thiserror::Error;

use crate::database::models::{CandidateRecord, Citizen, FallbackPool, Tenant};
use crate::types::{CitizenId, TenantId, TenantStatus};

#[derive(Debug, Error)]
pub enum StoreError {
    #[error("Not found: {0}")]
    NotFound(String),

    #[error("Invalid record: {0}")]
    InvalidRecord(String),

    #[error("Storage unavailable: {0}")]
    Unavailable(String),

    #[error("Query error: {0}")]
    QueryError(String),

    #[error(transparent)]
    Sqlx(#[from] sqlx::Error),
}

impl StoreError {
    /// Errors worth retrying for a single write
    pub fn is_transient(&self) -> bool {
        match self {
            StoreError::Unavailable(_) => true,
            StoreError::Sqlx(err) => match err {
                sqlx::Error::Io(_) | sqlx::Error::PoolTimedOut => true,
                // serialization_failure, deadlock_detected
                sqlx::Error::Database(db) => matches!(db.code().as_deref(), Some("40001") | Some("40P01")),
                _ => false,
            },
            _ => false,
        }
    }
}

/// Result of a conditional ownership write
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ReassignOutcome {
    /// The citizen was owned by the fallback pool and now belongs to the target
    Reassigned,
    /// The guard failed: the citizen no longer belongs to the fallback pool
    AlreadyResolved,
}

/// Read access to tenants and their canonical location fields
#[async_trait]
pub trait TenantDirectory: Send + Sync {
    /// Tenants with status active or trial, both location fields set, excluding
    /// the fallback pool. `scope` restricts the listing to one tenant.
    async fn eligible_tenants(
        &self,
        pool: FallbackPool,
        scope: Option<TenantId>,
    ) -> Result<Vec<Tenant>, StoreError>;

    async fn get_tenant(&self, id: TenantId) -> Result<Option<Tenant>, StoreError>;

    async fn health_check(&self) -> Result<(), StoreError> {
        Ok(())
    }
}

/// Write side of the tenant table, used by tenant lifecycle code
#[async_trait]
pub trait TenantRegistry: TenantDirectory {
    async fn insert_tenant(&self, tenant: Tenant) -> Result<Tenant, StoreError>;

    /// Write only the status column; other fields keep their stored values
    async fn update_tenant_status(
        &self,
        id: TenantId,
        status: TenantStatus,
        updated_at: DateTime<Utc>,
    ) -> Result<Tenant, StoreError>;

    /// Write only the location columns; other fields keep their stored values
    async fn update_tenant_location(
        &self,
        id: TenantId,
        municipality: Option<String>,
        state: Option<String>,
        updated_at: DateTime<Utc>,
    ) -> Result<Tenant, StoreError>;

    async fn list_tenants(&self) -> Result<Vec<Tenant>, StoreError>;
}

#[async_trait]
pub trait CitizenStore: Send + Sync {
    /// Citizens owned by the fallback pool with a non-null address, in retrieval order
    async fn fallback_candidates(&self, pool: FallbackPool) -> Result<Vec<CandidateRecord>, StoreError>;

    /// Set `citizen.tenant_id = target` only while it is still owned by `pool`
    async fn reassign(
        &self,
        citizen: CitizenId,
        pool: FallbackPool,
        target: TenantId,
    ) -> Result<ReassignOutcome, StoreError>;

    async fn insert_citizen(&self, citizen: Citizen) -> Result<Citizen, StoreError>;

    async fn get_citizen(&self, id: CitizenId) -> Result<Option<Citizen>, StoreError>;
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn classifies_transient_errors() {
        assert!(StoreError::Unavailable("down".into()).is_transient());
        assert!(StoreError::Sqlx(sqlx::Error::PoolTimedOut).is_transient());
        assert!(!StoreError::Sqlx(sqlx::Error::RowNotFound).is_transient());
        assert!(!StoreError::QueryError("syntax".into()).is_transient());
        assert!(!StoreError::NotFound("x".into()).is_transient());
    }
}
