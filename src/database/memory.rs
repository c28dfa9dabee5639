use async_trait::async_trait;
use chrono::{DateTime, Utc};
use tokio::sync::RwLock;

use crate::database::models::{CandidateRecord, Citizen, CitizenRow, FallbackPool, Tenant};
use crate::database::store::{CitizenStore, ReassignOutcome, StoreError, TenantDirectory, TenantRegistry};
use crate::types::{CitizenId, TenantId, TenantStatus};

/// In-process store for development and tests.
///
/// Citizens are kept in their stored row shape so reads go through the same
/// address validation as the PostgreSQL adapter. Insertion order is the
/// retrieval order.
#[derive(Default)]
pub struct MemoryStore {
    tenants: RwLock<Vec<Tenant>>,
    citizens: RwLock<Vec<CitizenRow>>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Insert a raw citizen row, bypassing typed validation
    pub async fn insert_row(&self, row: CitizenRow) {
        self.citizens.write().await.push(row);
    }

    async fn modify_tenant(&self, id: TenantId, apply: impl FnOnce(&mut Tenant)) -> Result<Tenant, StoreError> {
        let mut tenants = self.tenants.write().await;
        match tenants.iter_mut().find(|t| t.id == id) {
            Some(existing) => {
                apply(existing);
                Ok(existing.clone())
            }
            None => Err(StoreError::NotFound(format!("tenant {}", id))),
        }
    }

    /// Citizens currently owned by `tenant`, in retrieval order
    pub async fn citizens_of(&self, tenant: TenantId) -> Vec<CitizenId> {
        self.citizens
            .read()
            .await
            .iter()
            .filter(|row| row.tenant_id == tenant.as_uuid())
            .map(|row| CitizenId(row.id))
            .collect()
    }
}

#[async_trait]
impl TenantDirectory for MemoryStore {
    async fn eligible_tenants(
        &self,
        pool: FallbackPool,
        scope: Option<TenantId>,
    ) -> Result<Vec<Tenant>, StoreError> {
        let tenants = self.tenants.read().await;
        Ok(tenants
            .iter()
            .filter(|t| pool.is_eligible(t))
            .filter(|t| scope.map_or(true, |id| t.id == id))
            .cloned()
            .collect())
    }

    async fn get_tenant(&self, id: TenantId) -> Result<Option<Tenant>, StoreError> {
        Ok(self.tenants.read().await.iter().find(|t| t.id == id).cloned())
    }
}

#[async_trait]
impl TenantRegistry for MemoryStore {
    async fn insert_tenant(&self, tenant: Tenant) -> Result<Tenant, StoreError> {
        let mut tenants = self.tenants.write().await;
        if tenants.iter().any(|t| t.id == tenant.id) {
            return Err(StoreError::InvalidRecord(format!("tenant {} already exists", tenant.id)));
        }
        tenants.push(tenant.clone());
        Ok(tenant)
    }

    async fn update_tenant_status(
        &self,
        id: TenantId,
        status: TenantStatus,
        updated_at: DateTime<Utc>,
    ) -> Result<Tenant, StoreError> {
        self.modify_tenant(id, |t| {
            t.status = status;
            t.updated_at = updated_at;
        })
        .await
    }

    async fn update_tenant_location(
        &self,
        id: TenantId,
        municipality: Option<String>,
        state: Option<String>,
        updated_at: DateTime<Utc>,
    ) -> Result<Tenant, StoreError> {
        self.modify_tenant(id, |t| {
            t.municipality = municipality;
            t.state = state;
            t.updated_at = updated_at;
        })
        .await
    }

    async fn list_tenants(&self) -> Result<Vec<Tenant>, StoreError> {
        Ok(self.tenants.read().await.clone())
    }
}

#[async_trait]
impl CitizenStore for MemoryStore {
    async fn fallback_candidates(&self, pool: FallbackPool) -> Result<Vec<CandidateRecord>, StoreError> {
        let citizens = self.citizens.read().await;
        Ok(citizens
            .iter()
            .filter(|row| pool.contains(TenantId(row.tenant_id)))
            .filter(|row| !matches!(row.address, None | Some(serde_json::Value::Null)))
            .cloned()
            .map(CitizenRow::into_candidate)
            .collect())
    }

    async fn reassign(
        &self,
        citizen: CitizenId,
        pool: FallbackPool,
        target: TenantId,
    ) -> Result<ReassignOutcome, StoreError> {
        // Check and write under one lock so concurrent runs cannot both win
        let mut citizens = self.citizens.write().await;
        match citizens.iter_mut().find(|row| row.id == citizen.as_uuid()) {
            Some(row) if pool.contains(TenantId(row.tenant_id)) => {
                row.tenant_id = target.as_uuid();
                Ok(ReassignOutcome::Reassigned)
            }
            _ => Ok(ReassignOutcome::AlreadyResolved),
        }
    }

    async fn insert_citizen(&self, citizen: Citizen) -> Result<Citizen, StoreError> {
        let address = citizen
            .address
            .as_ref()
            .map(serde_json::to_value)
            .transpose()
            .map_err(|e| StoreError::InvalidRecord(e.to_string()))?;

        let mut citizens = self.citizens.write().await;
        if citizens.iter().any(|row| row.id == citizen.id.as_uuid()) {
            return Err(StoreError::InvalidRecord(format!("citizen {} already exists", citizen.id)));
        }
        citizens.push(CitizenRow {
            id: citizen.id.as_uuid(),
            tenant_id: citizen.tenant_id.as_uuid(),
            display_name: citizen.display_name.clone(),
            email: citizen.email.clone(),
            address,
            created_at: citizen.created_at,
        });
        Ok(citizen)
    }

    async fn get_citizen(&self, id: CitizenId) -> Result<Option<Citizen>, StoreError> {
        let row = self
            .citizens
            .read()
            .await
            .iter()
            .find(|row| row.id == id.as_uuid())
            .cloned();

        match row.map(CitizenRow::into_candidate) {
            None => Ok(None),
            Some(Ok(citizen)) => Ok(Some(citizen)),
            Some(Err(malformed)) => Err(StoreError::InvalidRecord(format!(
                "citizen {}: {}",
                malformed.id, malformed.reason
            ))),
        }
    }
}

impl MemoryStore {
    /// Convenience for seeding: a citizen row with the given owner and address JSON
    pub fn citizen_row(
        tenant: TenantId,
        display_name: &str,
        address: Option<serde_json::Value>,
    ) -> CitizenRow {
        CitizenRow {
            id: CitizenId::new().as_uuid(),
            tenant_id: tenant.as_uuid(),
            display_name: display_name.to_string(),
            email: format!("{}@example.com", display_name.to_lowercase().replace(' ', ".")),
            address,
            created_at: Utc::now(),
        }
    }
}
