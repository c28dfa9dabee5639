use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use uuid::Uuid;

use crate::types::{TenantId, TenantStatus};

/// A municipality tenant, or the shared fallback pool
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Tenant {
    pub id: TenantId,
    pub name: String,
    pub status: TenantStatus,
    /// Canonical municipality name (e.g. "Springfield")
    pub municipality: Option<String>,
    /// Canonical state/province code (e.g. "SP")
    pub state: Option<String>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl Tenant {
    /// Both location fields are set and non-blank
    pub fn has_location(&self) -> bool {
        is_present(&self.municipality) && is_present(&self.state)
    }

    /// Same canonical location as `other`, compared verbatim
    pub fn same_location(&self, other: &Tenant) -> bool {
        self.municipality == other.municipality && self.state == other.state
    }
}

fn is_present(field: &Option<String>) -> bool {
    field.as_deref().map(|s| !s.trim().is_empty()).unwrap_or(false)
}

/// Fields required to provision a tenant
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct NewTenant {
    pub name: String,
    pub status: TenantStatus,
    #[serde(default)]
    pub municipality: Option<String>,
    #[serde(default)]
    pub state: Option<String>,
}

/// The designated fallback tenant that holds citizens awaiting resolution.
///
/// Every "is this the fallback pool" decision goes through this type so the
/// configured identifier is never compared ad hoc.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct FallbackPool {
    id: TenantId,
}

impl FallbackPool {
    pub fn new(id: TenantId) -> Self {
        Self { id }
    }

    pub fn id(&self) -> TenantId {
        self.id
    }

    pub fn contains(&self, tenant_id: TenantId) -> bool {
        self.id == tenant_id
    }

    /// Whether `tenant` may be a matching target: operational status,
    /// both location fields set, and not the fallback pool itself.
    pub fn is_eligible(&self, tenant: &Tenant) -> bool {
        !self.contains(tenant.id) && tenant.status.is_operational() && tenant.has_location()
    }
}

/// Row shape of the `tenants` table
#[derive(Debug, Clone, FromRow)]
pub struct TenantRow {
    pub id: Uuid,
    pub name: String,
    pub status: String,
    pub municipality: Option<String>,
    pub state: Option<String>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl TryFrom<TenantRow> for Tenant {
    type Error = crate::types::UnknownStatus;

    fn try_from(row: TenantRow) -> Result<Self, Self::Error> {
        Ok(Tenant {
            id: TenantId(row.id),
            name: row.name,
            status: row.status.parse()?,
            municipality: row.municipality,
            state: row.state,
            created_at: row.created_at,
            updated_at: row.updated_at,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn tenant(status: TenantStatus, municipality: Option<&str>, state: Option<&str>) -> Tenant {
        let now = Utc::now();
        Tenant {
            id: TenantId::new(),
            name: "Prefeitura".to_string(),
            status,
            municipality: municipality.map(str::to_string),
            state: state.map(str::to_string),
            created_at: now,
            updated_at: now,
        }
    }

    #[test]
    fn eligibility_requires_status_and_location() {
        let pool = FallbackPool::new(TenantId::new());
        assert!(pool.is_eligible(&tenant(TenantStatus::Active, Some("Springfield"), Some("SP"))));
        assert!(pool.is_eligible(&tenant(TenantStatus::Trial, Some("Springfield"), Some("SP"))));
        assert!(!pool.is_eligible(&tenant(TenantStatus::Suspended, Some("Springfield"), Some("SP"))));
        assert!(!pool.is_eligible(&tenant(TenantStatus::Active, Some("Springfield"), None)));
        assert!(!pool.is_eligible(&tenant(TenantStatus::Active, Some("  "), Some("SP"))));
    }

    #[test]
    fn fallback_pool_is_never_eligible() {
        let mut t = tenant(TenantStatus::Active, Some("Springfield"), Some("SP"));
        let pool = FallbackPool::new(t.id);
        assert!(!pool.is_eligible(&t));

        t.id = TenantId::new();
        assert!(pool.is_eligible(&t));
    }
}
