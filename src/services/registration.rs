use std::sync::Arc;

use chrono::Utc;
use tracing::info;

use crate::database::models::{Citizen, FallbackPool, NewCitizen};
use crate::database::store::{CitizenStore, StoreError, TenantDirectory};
use crate::linking::{LocationMatcher, MatchResult, TenantIndex};
use crate::types::CitizenId;

#[derive(Debug, thiserror::Error)]
pub enum RegistrationError {
    #[error("Store error: {0}")]
    Store(#[from] StoreError),
    #[error("Invalid registration: {0}")]
    Invalid(String),
}

/// Places newly registered citizens: directly in their municipality tenant when
/// one is eligible, otherwise in the fallback pool to wait for linking.
pub struct CitizenRegistration {
    directory: Arc<dyn TenantDirectory>,
    citizens: Arc<dyn CitizenStore>,
    pool: FallbackPool,
}

impl CitizenRegistration {
    pub fn new(directory: Arc<dyn TenantDirectory>, citizens: Arc<dyn CitizenStore>, pool: FallbackPool) -> Self {
        Self { directory, citizens, pool }
    }

    pub async fn register(&self, input: NewCitizen) -> Result<Citizen, RegistrationError> {
        let display_name = input.display_name.trim().to_string();
        if display_name.is_empty() {
            return Err(RegistrationError::Invalid("display_name must not be empty".to_string()));
        }
        let email = input.email.trim().to_string();
        if !email.contains('@') {
            return Err(RegistrationError::Invalid(format!("invalid email: {}", email)));
        }

        let snapshot = self.directory.eligible_tenants(self.pool, None).await?;
        let index = TenantIndex::build(&self.pool, &snapshot);

        let tenant_id = match index.resolve(input.address.as_ref()) {
            MatchResult::Matched(id) => id,
            MatchResult::NoMatch(_) => self.pool.id(),
        };

        let citizen = self
            .citizens
            .insert_citizen(Citizen {
                id: CitizenId::new(),
                tenant_id,
                display_name,
                email,
                address: input.address,
                created_at: Utc::now(),
            })
            .await?;

        if self.pool.contains(citizen.tenant_id) {
            info!("Registered citizen {} in the fallback pool", citizen.id);
        } else {
            info!("Registered citizen {} in tenant {}", citizen.id, citizen.tenant_id);
        }
        Ok(citizen)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::database::memory::MemoryStore;
    use crate::database::models::{Address, Tenant};
    use crate::database::store::TenantRegistry;
    use crate::types::{TenantId, TenantStatus};

    async fn setup() -> (CitizenRegistration, Tenant, FallbackPool) {
        let store = Arc::new(MemoryStore::new());
        let pool = FallbackPool::new(TenantId::new());
        let now = Utc::now();
        let tenant = Tenant {
            id: TenantId::new(),
            name: "Prefeitura de Campinas".into(),
            status: TenantStatus::Active,
            municipality: Some("Campinas".into()),
            state: Some("SP".into()),
            created_at: now,
            updated_at: now,
        };
        store.insert_tenant(tenant.clone()).await.unwrap();
        (CitizenRegistration::new(store.clone(), store, pool), tenant, pool)
    }

    fn input(address: Option<Address>) -> NewCitizen {
        NewCitizen {
            display_name: "Joana Silva".into(),
            email: "joana@example.com".into(),
            address,
        }
    }

    #[tokio::test]
    async fn places_citizen_in_matching_tenant() {
        let (reg, tenant, _) = setup().await;
        let citizen = reg.register(input(Some(Address::new("campinas ", "sp")))).await.unwrap();
        assert_eq!(citizen.tenant_id, tenant.id);
    }

    #[tokio::test]
    async fn unmatched_or_missing_address_goes_to_pool() {
        let (reg, _, pool) = setup().await;
        let citizen = reg.register(input(Some(Address::new("Sorocaba", "SP")))).await.unwrap();
        assert!(pool.contains(citizen.tenant_id));

        let citizen = reg.register(input(None)).await.unwrap();
        assert!(pool.contains(citizen.tenant_id));
    }

    #[tokio::test]
    async fn validates_input() {
        let (reg, _, _) = setup().await;
        let mut bad = input(None);
        bad.email = "not-an-email".into();
        assert!(matches!(reg.register(bad).await.unwrap_err(), RegistrationError::Invalid(_)));

        let mut bad = input(None);
        bad.display_name = " ".into();
        assert!(matches!(reg.register(bad).await.unwrap_err(), RegistrationError::Invalid(_)));
    }
}
