#![allow(dead_code)]

use std::collections::HashSet;
use std::sync::Arc;
use std::time::Duration;

use anyhow::Result;
use async_trait::async_trait;
use chrono::Utc;
use serde_json::Value;

use municipal_link::api::{app, AppState};
use municipal_link::config::LinkingConfig;
use municipal_link::database::models::{CandidateRecord, Citizen, FallbackPool, Tenant};
use municipal_link::database::{CitizenStore, MemoryStore, ReassignOutcome, StoreError, TenantDirectory, TenantRegistry};
use municipal_link::linking::LinkingOrchestrator;
use municipal_link::types::{CitizenId, TenantId, TenantStatus};

/// A memory store seeded with a fallback pool tenant
pub struct World {
    pub store: Arc<MemoryStore>,
    pub config: LinkingConfig,
}

impl World {
    pub async fn new() -> Self {
        let config = LinkingConfig {
            write_retry_backoff_ms: 1,
            ..LinkingConfig::with_fallback(TenantId::new())
        };
        let store = Arc::new(MemoryStore::new());
        let now = Utc::now();
        store
            .insert_tenant(Tenant {
                id: config.fallback_tenant_id,
                name: "Unassigned citizens".into(),
                status: TenantStatus::Active,
                municipality: None,
                state: None,
                created_at: now,
                updated_at: now,
            })
            .await
            .expect("seed fallback pool");
        Self { store, config }
    }

    pub fn pool(&self) -> FallbackPool {
        FallbackPool::new(self.config.fallback_tenant_id)
    }

    pub async fn tenant(&self, municipality: &str, state: &str, status: TenantStatus) -> Tenant {
        let now = Utc::now();
        let tenant = Tenant {
            id: TenantId::new(),
            name: format!("Prefeitura de {}", municipality),
            status,
            municipality: Some(municipality.to_string()),
            state: Some(state.to_string()),
            created_at: now,
            updated_at: now,
        };
        self.store.insert_tenant(tenant).await.expect("seed tenant")
    }

    /// A fallback-pool citizen with the given raw address JSON
    pub async fn waiting(&self, name: &str, address: Value) -> CitizenId {
        let row = MemoryStore::citizen_row(self.config.fallback_tenant_id, name, Some(address));
        let id = CitizenId(row.id);
        self.store.insert_row(row).await;
        id
    }

    pub async fn owner_of(&self, id: CitizenId) -> TenantId {
        self.store
            .get_citizen(id)
            .await
            .expect("read citizen")
            .expect("citizen exists")
            .tenant_id
    }

    pub fn orchestrator(&self) -> LinkingOrchestrator {
        LinkingOrchestrator::new(self.store.clone(), self.store.clone(), self.config.clone())
    }

    pub fn orchestrator_with(&self, citizens: Arc<dyn CitizenStore>) -> LinkingOrchestrator {
        LinkingOrchestrator::new(self.store.clone(), citizens, self.config.clone())
    }
}

/// Citizen store whose writes fail permanently for selected citizens
pub struct FailingWrites {
    pub inner: Arc<MemoryStore>,
    pub fail_for: HashSet<CitizenId>,
    pub panic_for: HashSet<CitizenId>,
}

#[async_trait]
impl CitizenStore for FailingWrites {
    async fn fallback_candidates(&self, pool: FallbackPool) -> Result<Vec<CandidateRecord>, StoreError> {
        self.inner.fallback_candidates(pool).await
    }

    async fn reassign(&self, citizen: CitizenId, pool: FallbackPool, target: TenantId) -> Result<ReassignOutcome, StoreError> {
        if self.panic_for.contains(&citizen) {
            panic!("simulated driver panic for {}", citizen);
        }
        if self.fail_for.contains(&citizen) {
            return Err(StoreError::QueryError(format!("write rejected for {}", citizen)));
        }
        self.inner.reassign(citizen, pool, target).await
    }

    async fn insert_citizen(&self, citizen: Citizen) -> Result<Citizen, StoreError> {
        self.inner.insert_citizen(citizen).await
    }

    async fn get_citizen(&self, id: CitizenId) -> Result<Option<Citizen>, StoreError> {
        self.inner.get_citizen(id).await
    }
}

/// Directory that is unreachable, or panics when `panics` is set
pub struct BrokenDirectory {
    pub panics: bool,
}

#[async_trait]
impl TenantDirectory for BrokenDirectory {
    async fn eligible_tenants(&self, _pool: FallbackPool, _scope: Option<TenantId>) -> Result<Vec<Tenant>, StoreError> {
        if self.panics {
            panic!("simulated directory panic");
        }
        Err(StoreError::Unavailable("directory offline".into()))
    }

    async fn get_tenant(&self, _id: TenantId) -> Result<Option<Tenant>, StoreError> {
        Err(StoreError::Unavailable("directory offline".into()))
    }

    async fn health_check(&self) -> Result<(), StoreError> {
        Err(StoreError::Unavailable("directory offline".into()))
    }
}

/// Poll `check` until it returns true or the timeout elapses
pub async fn eventually<F, Fut>(timeout: Duration, mut check: F) -> bool
where
    F: FnMut() -> Fut,
    Fut: std::future::Future<Output = bool>,
{
    let deadline = tokio::time::Instant::now() + timeout;
    loop {
        if check().await {
            return true;
        }
        if tokio::time::Instant::now() > deadline {
            return false;
        }
        tokio::time::sleep(Duration::from_millis(20)).await;
    }
}

pub struct TestServer {
    pub base_url: String,
    pub state: AppState,
}

/// Serve the admin router on an ephemeral port backed by `store`
pub async fn spawn_server(store: Arc<MemoryStore>, config: LinkingConfig) -> Result<TestServer> {
    let state = AppState::from_store(store, config);
    state.tenants.ensure_fallback_pool("Unassigned citizens").await?;

    let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await?;
    let addr = listener.local_addr()?;
    let router = app(state.clone());
    tokio::spawn(async move {
        let _ = axum::serve(listener, router).await;
    });

    Ok(TestServer {
        base_url: format!("http://{}", addr),
        state,
    })
}
