use std::sync::Arc;

use chrono::Utc;
use tracing::info;

use crate::database::models::{FallbackPool, NewTenant, Tenant};
use crate::database::store::{StoreError, TenantRegistry};
use crate::linking::TenantLifecycleHook;
use crate::types::{TenantId, TenantStatus};

#[derive(Debug, thiserror::Error)]
pub enum TenantError {
    #[error("Store error: {0}")]
    Store(#[from] StoreError),
    #[error("Tenant not found: {0}")]
    NotFound(TenantId),
    #[error("Invalid tenant name: {0}")]
    InvalidName(String),
    #[error("Invalid tenant location: {0}")]
    InvalidLocation(String),
    #[error("The fallback pool tenant cannot be modified")]
    FallbackPoolProtected,
}

/// Tenant provisioning and lifecycle changes.
///
/// Changes that make a tenant a matching target fire the lifecycle hook in the
/// background; the caller never waits for or sees the link outcome.
pub struct TenantService {
    registry: Arc<dyn TenantRegistry>,
    hook: TenantLifecycleHook,
    pool: FallbackPool,
}

impl TenantService {
    pub fn new(registry: Arc<dyn TenantRegistry>, hook: TenantLifecycleHook, pool: FallbackPool) -> Self {
        Self { registry, hook, pool }
    }

    /// Create the fallback pool tenant if it does not exist yet
    pub async fn ensure_fallback_pool(&self, name: &str) -> Result<Tenant, TenantError> {
        if let Some(existing) = self.registry.get_tenant(self.pool.id()).await? {
            return Ok(existing);
        }

        let now = Utc::now();
        let tenant = self
            .registry
            .insert_tenant(Tenant {
                id: self.pool.id(),
                name: name.to_string(),
                status: TenantStatus::Active,
                municipality: None,
                state: None,
                created_at: now,
                updated_at: now,
            })
            .await?;

        info!("Created fallback pool tenant {}", tenant.id);
        Ok(tenant)
    }

    pub async fn provision(&self, input: NewTenant) -> Result<Tenant, TenantError> {
        self.validate_name(&input.name)?;
        let (municipality, state) = self.validate_location(input.municipality, input.state)?;

        let now = Utc::now();
        let tenant = self
            .registry
            .insert_tenant(Tenant {
                id: TenantId::new(),
                name: input.name.trim().to_string(),
                status: input.status,
                municipality,
                state,
                created_at: now,
                updated_at: now,
            })
            .await?;

        info!("Provisioned tenant {} ({})", tenant.name, tenant.id);
        self.hook.on_tenant_changed(None, &tenant);
        Ok(tenant)
    }

    pub async fn update_status(&self, id: TenantId, status: TenantStatus) -> Result<Tenant, TenantError> {
        let before = self.load_mutable(id).await?;
        let saved = self.registry.update_tenant_status(id, status, Utc::now()).await?;
        Ok(self.changed(before, saved))
    }

    pub async fn update_location(
        &self,
        id: TenantId,
        municipality: Option<String>,
        state: Option<String>,
    ) -> Result<Tenant, TenantError> {
        let before = self.load_mutable(id).await?;
        let (municipality, state) = self.validate_location(municipality, state)?;
        let saved = self
            .registry
            .update_tenant_location(id, municipality, state, Utc::now())
            .await?;
        Ok(self.changed(before, saved))
    }

    pub async fn get(&self, id: TenantId) -> Result<Tenant, TenantError> {
        self.registry.get_tenant(id).await?.ok_or(TenantError::NotFound(id))
    }

    pub async fn list(&self) -> Result<Vec<Tenant>, TenantError> {
        Ok(self.registry.list_tenants().await?)
    }

    async fn load_mutable(&self, id: TenantId) -> Result<Tenant, TenantError> {
        if self.pool.contains(id) {
            return Err(TenantError::FallbackPoolProtected);
        }
        self.get(id).await
    }

    fn changed(&self, before: Tenant, saved: Tenant) -> Tenant {
        info!("Updated tenant {} (status={})", saved.id, saved.status);
        self.hook.on_tenant_changed(Some(&before), &saved);
        saved
    }

    fn validate_name(&self, name: &str) -> Result<(), TenantError> {
        let name = name.trim();
        if name.is_empty() {
            return Err(TenantError::InvalidName("Tenant name must not be empty".to_string()));
        }
        if name.chars().count() > 100 {
            return Err(TenantError::InvalidName("Tenant name must be at most 100 characters".to_string()));
        }
        Ok(())
    }

    /// Location fields are set together or not at all
    fn validate_location(
        &self,
        municipality: Option<String>,
        state: Option<String>,
    ) -> Result<(Option<String>, Option<String>), TenantError> {
        let clean = |v: Option<String>| v.map(|s| s.trim().to_string()).filter(|s| !s.is_empty());

        match (clean(municipality), clean(state)) {
            (Some(m), Some(s)) => Ok((Some(m), Some(s))),
            (None, None) => Ok((None, None)),
            _ => Err(TenantError::InvalidLocation(
                "municipality and state must be set together".to_string(),
            )),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::LinkingConfig;
    use crate::database::memory::MemoryStore;
    use crate::database::store::TenantDirectory;
    use crate::linking::LinkingOrchestrator;

    fn service() -> (TenantService, Arc<MemoryStore>, FallbackPool) {
        let store = Arc::new(MemoryStore::new());
        let config = LinkingConfig::with_fallback(TenantId::new());
        let pool = FallbackPool::new(config.fallback_tenant_id);
        let orchestrator = Arc::new(LinkingOrchestrator::new(store.clone(), store.clone(), config));
        let hook = TenantLifecycleHook::new(orchestrator);
        (TenantService::new(store.clone(), hook, pool), store, pool)
    }

    fn new_tenant(municipality: Option<&str>, state: Option<&str>) -> NewTenant {
        NewTenant {
            name: "Prefeitura de Springfield".to_string(),
            status: TenantStatus::Trial,
            municipality: municipality.map(str::to_string),
            state: state.map(str::to_string),
        }
    }

    #[tokio::test]
    async fn rejects_half_set_location() {
        let (svc, _, _) = service();
        let err = svc.provision(new_tenant(Some("Springfield"), None)).await.unwrap_err();
        assert!(matches!(err, TenantError::InvalidLocation(_)));

        let err = svc.provision(new_tenant(Some("Springfield"), Some("  "))).await.unwrap_err();
        assert!(matches!(err, TenantError::InvalidLocation(_)));
    }

    #[tokio::test]
    async fn rejects_blank_name() {
        let (svc, _, _) = service();
        let mut input = new_tenant(None, None);
        input.name = "   ".to_string();
        assert!(matches!(svc.provision(input).await.unwrap_err(), TenantError::InvalidName(_)));
    }

    #[tokio::test]
    async fn fallback_pool_is_protected() {
        let (svc, _, pool) = service();
        svc.ensure_fallback_pool("Unassigned").await.unwrap();

        let err = svc.update_status(pool.id(), TenantStatus::Inactive).await.unwrap_err();
        assert!(matches!(err, TenantError::FallbackPoolProtected));
        let err = svc
            .update_location(pool.id(), Some("Springfield".into()), Some("SP".into()))
            .await
            .unwrap_err();
        assert!(matches!(err, TenantError::FallbackPoolProtected));
    }

    #[tokio::test]
    async fn ensure_fallback_pool_is_idempotent() {
        let (svc, store, pool) = service();
        svc.ensure_fallback_pool("Unassigned").await.unwrap();
        svc.ensure_fallback_pool("Unassigned").await.unwrap();
        let tenants = store.list_tenants().await.unwrap();
        assert_eq!(tenants.len(), 1);
        assert_eq!(tenants[0].id, pool.id());
    }

    /// Registry whose reads lag, so two updates overlap between read and write
    struct SlowReads(Arc<MemoryStore>);

    #[async_trait::async_trait]
    impl TenantDirectory for SlowReads {
        async fn eligible_tenants(
            &self,
            pool: FallbackPool,
            scope: Option<TenantId>,
        ) -> Result<Vec<Tenant>, StoreError> {
            self.0.eligible_tenants(pool, scope).await
        }

        async fn get_tenant(&self, id: TenantId) -> Result<Option<Tenant>, StoreError> {
            let tenant = self.0.get_tenant(id).await;
            tokio::time::sleep(std::time::Duration::from_millis(20)).await;
            tenant
        }
    }

    #[async_trait::async_trait]
    impl TenantRegistry for SlowReads {
        async fn insert_tenant(&self, tenant: Tenant) -> Result<Tenant, StoreError> {
            self.0.insert_tenant(tenant).await
        }

        async fn update_tenant_status(
            &self,
            id: TenantId,
            status: TenantStatus,
            updated_at: chrono::DateTime<Utc>,
        ) -> Result<Tenant, StoreError> {
            self.0.update_tenant_status(id, status, updated_at).await
        }

        async fn update_tenant_location(
            &self,
            id: TenantId,
            municipality: Option<String>,
            state: Option<String>,
            updated_at: chrono::DateTime<Utc>,
        ) -> Result<Tenant, StoreError> {
            self.0.update_tenant_location(id, municipality, state, updated_at).await
        }

        async fn list_tenants(&self) -> Result<Vec<Tenant>, StoreError> {
            self.0.list_tenants().await
        }
    }

    #[tokio::test]
    async fn concurrent_updates_keep_both_fields() {
        let (_, store, pool) = service();
        let orchestrator = Arc::new(LinkingOrchestrator::new(
            store.clone(),
            store.clone(),
            LinkingConfig::with_fallback(pool.id()),
        ));
        let svc = TenantService::new(Arc::new(SlowReads(store.clone())), TenantLifecycleHook::new(orchestrator), pool);
        let tenant = svc.provision(new_tenant(None, None)).await.unwrap();

        let (status, location) = tokio::join!(
            svc.update_status(tenant.id, TenantStatus::Suspended),
            svc.update_location(tenant.id, Some("Springfield".into()), Some("SP".into())),
        );
        status.unwrap();
        location.unwrap();

        let stored = store.get_tenant(tenant.id).await.unwrap().unwrap();
        assert_eq!(stored.status, TenantStatus::Suspended);
        assert_eq!(stored.municipality.as_deref(), Some("Springfield"));
        assert_eq!(stored.state.as_deref(), Some("SP"));
    }

    #[tokio::test]
    async fn updating_a_missing_tenant_is_not_found() {
        let (svc, _, _) = service();
        let err = svc.update_status(TenantId::new(), TenantStatus::Active).await.unwrap_err();
        assert!(matches!(err, TenantError::NotFound(_)));
    }

    #[tokio::test]
    async fn update_status_persists() {
        let (svc, _, _) = service();
        let tenant = svc.provision(new_tenant(None, None)).await.unwrap();
        let updated = svc.update_status(tenant.id, TenantStatus::Suspended).await.unwrap();
        assert_eq!(updated.status, TenantStatus::Suspended);
        assert_eq!(svc.get(tenant.id).await.unwrap().status, TenantStatus::Suspended);
    }
}
