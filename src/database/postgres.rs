use async_trait::async_trait;
use chrono::{DateTime, Utc};
use sqlx::PgPool;
use tracing::debug;

use crate::database::manager::DatabaseManager;
use crate::database::models::{CandidateRecord, Citizen, CitizenRow, FallbackPool, Tenant, TenantRow};
use crate::database::store::{CitizenStore, ReassignOutcome, StoreError, TenantDirectory, TenantRegistry};
use crate::types::{CitizenId, TenantId, TenantStatus};

const TENANT_COLUMNS: &str = "id, name, status, municipality, state, created_at, updated_at";
const CITIZEN_COLUMNS: &str = "id, tenant_id, display_name, email, address, created_at";

/// PostgreSQL implementation of the tenant and citizen stores
#[derive(Clone)]
pub struct PgStore {
    pool: PgPool,
}

impl PgStore {
    pub fn new(manager: &DatabaseManager) -> Self {
        Self { pool: manager.pool() }
    }

    /// Apply the bundled migrations
    pub async fn migrate(&self) -> Result<(), StoreError> {
        sqlx::migrate!("./migrations")
            .run(&self.pool)
            .await
            .map_err(|e| StoreError::QueryError(format!("migration failed: {}", e)))
    }
}

fn into_tenant(row: TenantRow) -> Result<Tenant, StoreError> {
    let id = row.id;
    Tenant::try_from(row).map_err(|e| StoreError::InvalidRecord(format!("tenant {}: {}", id, e)))
}

#[async_trait]
impl TenantDirectory for PgStore {
    async fn eligible_tenants(
        &self,
        pool: FallbackPool,
        scope: Option<TenantId>,
    ) -> Result<Vec<Tenant>, StoreError> {
        let sql = format!(
            r#"
            SELECT {TENANT_COLUMNS}
            FROM tenants
            WHERE status IN ('active', 'trial')
              AND municipality IS NOT NULL
              AND state IS NOT NULL
              AND id <> $1
              AND ($2::uuid IS NULL OR id = $2)
            ORDER BY created_at, id
            "#
        );

        let rows: Vec<TenantRow> = sqlx::query_as(&sql)
            .bind(pool.id().as_uuid())
            .bind(scope.map(|id| id.as_uuid()))
            .fetch_all(&self.pool)
            .await?;

        debug!("Loaded {} eligible tenant rows (scope={:?})", rows.len(), scope);
        rows.into_iter().map(into_tenant).collect()
    }

    async fn get_tenant(&self, id: TenantId) -> Result<Option<Tenant>, StoreError> {
        let sql = format!("SELECT {TENANT_COLUMNS} FROM tenants WHERE id = $1");
        let row: Option<TenantRow> = sqlx::query_as(&sql)
            .bind(id.as_uuid())
            .fetch_optional(&self.pool)
            .await?;
        row.map(into_tenant).transpose()
    }

    async fn health_check(&self) -> Result<(), StoreError> {
        sqlx::query("SELECT 1").execute(&self.pool).await?;
        Ok(())
    }
}

#[async_trait]
impl TenantRegistry for PgStore {
    async fn insert_tenant(&self, tenant: Tenant) -> Result<Tenant, StoreError> {
        let sql = format!(
            r#"
            INSERT INTO tenants (id, name, status, municipality, state, created_at, updated_at)
            VALUES ($1, $2, $3, $4, $5, $6, $7)
            RETURNING {TENANT_COLUMNS}
            "#
        );
        let row: TenantRow = sqlx::query_as(&sql)
            .bind(tenant.id.as_uuid())
            .bind(&tenant.name)
            .bind(tenant.status.as_str())
            .bind(&tenant.municipality)
            .bind(&tenant.state)
            .bind(tenant.created_at)
            .bind(tenant.updated_at)
            .fetch_one(&self.pool)
            .await?;
        into_tenant(row)
    }

    async fn update_tenant_status(
        &self,
        id: TenantId,
        status: TenantStatus,
        updated_at: DateTime<Utc>,
    ) -> Result<Tenant, StoreError> {
        let sql = format!(
            r#"
            UPDATE tenants
            SET status = $2, updated_at = $3
            WHERE id = $1
            RETURNING {TENANT_COLUMNS}
            "#
        );
        let row: Option<TenantRow> = sqlx::query_as(&sql)
            .bind(id.as_uuid())
            .bind(status.as_str())
            .bind(updated_at)
            .fetch_optional(&self.pool)
            .await?;

        row.map(into_tenant)
            .unwrap_or_else(|| Err(StoreError::NotFound(format!("tenant {}", id))))
    }

    async fn update_tenant_location(
        &self,
        id: TenantId,
        municipality: Option<String>,
        state: Option<String>,
        updated_at: DateTime<Utc>,
    ) -> Result<Tenant, StoreError> {
        let sql = format!(
            r#"
            UPDATE tenants
            SET municipality = $2, state = $3, updated_at = $4
            WHERE id = $1
            RETURNING {TENANT_COLUMNS}
            "#
        );
        let row: Option<TenantRow> = sqlx::query_as(&sql)
            .bind(id.as_uuid())
            .bind(municipality)
            .bind(state)
            .bind(updated_at)
            .fetch_optional(&self.pool)
            .await?;

        row.map(into_tenant)
            .unwrap_or_else(|| Err(StoreError::NotFound(format!("tenant {}", id))))
    }

    async fn list_tenants(&self) -> Result<Vec<Tenant>, StoreError> {
        let sql = format!("SELECT {TENANT_COLUMNS} FROM tenants ORDER BY created_at, id");
        let rows: Vec<TenantRow> = sqlx::query_as(&sql).fetch_all(&self.pool).await?;
        rows.into_iter().map(into_tenant).collect()
    }
}

#[async_trait]
impl CitizenStore for PgStore {
    async fn fallback_candidates(&self, pool: FallbackPool) -> Result<Vec<CandidateRecord>, StoreError> {
        let sql = format!(
            r#"
            SELECT {CITIZEN_COLUMNS}
            FROM citizens
            WHERE tenant_id = $1
              AND address IS NOT NULL
              AND address <> 'null'::jsonb
            ORDER BY created_at, id
            "#
        );
        let rows: Vec<CitizenRow> = sqlx::query_as(&sql)
            .bind(pool.id().as_uuid())
            .fetch_all(&self.pool)
            .await?;

        Ok(rows.into_iter().map(CitizenRow::into_candidate).collect())
    }

    async fn reassign(
        &self,
        citizen: CitizenId,
        pool: FallbackPool,
        target: TenantId,
    ) -> Result<ReassignOutcome, StoreError> {
        // The tenant_id clause is the compare-and-swap guard
        let result = sqlx::query(
            r#"
            UPDATE citizens
            SET tenant_id = $1, updated_at = now()
            WHERE id = $2 AND tenant_id = $3
            "#,
        )
        .bind(target.as_uuid())
        .bind(citizen.as_uuid())
        .bind(pool.id().as_uuid())
        .execute(&self.pool)
        .await?;

        if result.rows_affected() == 1 {
            Ok(ReassignOutcome::Reassigned)
        } else {
            Ok(ReassignOutcome::AlreadyResolved)
        }
    }

    async fn insert_citizen(&self, citizen: Citizen) -> Result<Citizen, StoreError> {
        let address = citizen
            .address
            .as_ref()
            .map(serde_json::to_value)
            .transpose()
            .map_err(|e| StoreError::InvalidRecord(e.to_string()))?;

        sqlx::query(
            r#"
            INSERT INTO citizens (id, tenant_id, display_name, email, address, created_at)
            VALUES ($1, $2, $3, $4, $5, $6)
            "#,
        )
        .bind(citizen.id.as_uuid())
        .bind(citizen.tenant_id.as_uuid())
        .bind(&citizen.display_name)
        .bind(&citizen.email)
        .bind(address)
        .bind(citizen.created_at)
        .execute(&self.pool)
        .await?;

        Ok(citizen)
    }

    async fn get_citizen(&self, id: CitizenId) -> Result<Option<Citizen>, StoreError> {
        let sql = format!("SELECT {CITIZEN_COLUMNS} FROM citizens WHERE id = $1");
        let row: Option<CitizenRow> = sqlx::query_as(&sql)
            .bind(id.as_uuid())
            .fetch_optional(&self.pool)
            .await?;

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
