//! Location matching: maps a citizen's self-reported city/state to a tenant.
//!
//! Matching is exact on a normalized key. Lowercasing and trimming are the only
//! normalizations; accents, abbreviations and spelling variants are significant.

use std::collections::HashMap;
use std::collections::hash_map::Entry;

use serde::{Deserialize, Serialize};
use tracing::warn;

use crate::database::models::{Address, FallbackPool, Tenant};
use crate::types::TenantId;

const KEY_SEPARATOR: char = '|';

/// Why a citizen could not be matched
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum NoMatchReason {
    /// No address, or city or state missing/blank
    IncompleteAddress,
    /// Address complete but no eligible tenant has that location
    NoTenantForLocation,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MatchResult {
    Matched(TenantId),
    NoMatch(NoMatchReason),
}

/// Normalized `city|state` lookup key
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct LocationKey(String);

impl LocationKey {
    /// Build a key from two optional parts; `None` if either is absent or blank
    pub fn new(city: Option<&str>, state: Option<&str>) -> Option<Self> {
        let city = normalize(city?)?;
        let state = normalize(state?)?;
        Some(Self(format!("{city}{KEY_SEPARATOR}{state}")))
    }

    pub fn for_address(address: &Address) -> Option<Self> {
        Self::new(address.city.as_deref(), address.state.as_deref())
    }

    pub fn for_tenant(tenant: &Tenant) -> Option<Self> {
        Self::new(tenant.municipality.as_deref(), tenant.state.as_deref())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

fn normalize(part: &str) -> Option<String> {
    let part = part.trim().to_lowercase();
    if part.is_empty() {
        None
    } else {
        Some(part)
    }
}

/// Resolution strategy seam. The exact-key [`TenantIndex`] is the shipped
/// implementation; tolerant strategies plug in here.
pub trait LocationMatcher: Send + Sync {
    fn resolve(&self, address: Option<&Address>) -> MatchResult;

    /// True when no tenant can ever be matched
    fn is_empty(&self) -> bool;
}

/// Precomputed key → tenant map for one run
#[derive(Debug, Default, Clone)]
pub struct TenantIndex {
    by_key: HashMap<LocationKey, TenantId>,
}

impl TenantIndex {
    /// Index a directory snapshot. Tenants that are not eligible (including the
    /// fallback pool) are skipped. On key collisions the first tenant wins.
    pub fn build(pool: &FallbackPool, snapshot: &[Tenant]) -> Self {
        let mut by_key = HashMap::with_capacity(snapshot.len());

        for tenant in snapshot.iter().filter(|t| pool.is_eligible(t)) {
            let Some(key) = LocationKey::for_tenant(tenant) else {
                continue;
            };
            match by_key.entry(key) {
                Entry::Vacant(slot) => {
                    slot.insert(tenant.id);
                }
                Entry::Occupied(slot) => {
                    warn!(
                        key = slot.key().as_str(),
                        kept = %slot.get(),
                        ignored = %tenant.id,
                        "Two eligible tenants share a location key"
                    );
                }
            }
        }

        Self { by_key }
    }

    pub fn len(&self) -> usize {
        self.by_key.len()
    }
}

impl LocationMatcher for TenantIndex {
    fn resolve(&self, address: Option<&Address>) -> MatchResult {
        let Some(key) = address.and_then(LocationKey::for_address) else {
            return MatchResult::NoMatch(NoMatchReason::IncompleteAddress);
        };
        match self.by_key.get(&key) {
            Some(id) => MatchResult::Matched(*id),
            None => MatchResult::NoMatch(NoMatchReason::NoTenantForLocation),
        }
    }

    fn is_empty(&self) -> bool {
        self.by_key.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::TenantStatus;
    use chrono::Utc;

    fn tenant(municipality: &str, state: &str) -> Tenant {
        let now = Utc::now();
        Tenant {
            id: TenantId::new(),
            name: format!("Prefeitura de {}", municipality),
            status: TenantStatus::Active,
            municipality: Some(municipality.to_string()),
            state: Some(state.to_string()),
            created_at: now,
            updated_at: now,
        }
    }

    fn addr(city: &str, state: &str) -> Address {
        Address::new(city, state)
    }

    #[test]
    fn matches_ignoring_case_and_surrounding_whitespace() {
        let springfield = tenant("Springfield", "sp");
        let pool = FallbackPool::new(TenantId::new());
        let index = TenantIndex::build(&pool, &[springfield.clone()]);

        assert_eq!(index.resolve(Some(&addr("Springfield", "SP"))), MatchResult::Matched(springfield.id));
        assert_eq!(index.resolve(Some(&addr("Springfield ", "SP"))), MatchResult::Matched(springfield.id));
        assert_eq!(index.resolve(Some(&addr("  SPRINGFIELD", " sp "))), MatchResult::Matched(springfield.id));
    }

    #[test]
    fn inner_spacing_accents_and_abbreviations_are_significant() {
        let pool = FallbackPool::new(TenantId::new());
        let index = TenantIndex::build(&pool, &[tenant("Springfield", "SP"), tenant("São Paulo", "SP")]);

        let no_tenant = MatchResult::NoMatch(NoMatchReason::NoTenantForLocation);
        assert_eq!(index.resolve(Some(&addr("Spring field", "SP"))), no_tenant);
        assert_eq!(index.resolve(Some(&addr("Sao Paulo", "SP"))), no_tenant);
        assert_eq!(index.resolve(Some(&addr("Springfield", "São Paulo"))), no_tenant);
    }

    #[test]
    fn non_ascii_case_folds() {
        let pool = FallbackPool::new(TenantId::new());
        let sp = tenant("São Paulo", "SP");
        let index = TenantIndex::build(&pool, &[sp.clone()]);
        assert_eq!(index.resolve(Some(&addr("SÃO PAULO", "sp"))), MatchResult::Matched(sp.id));
    }

    #[test]
    fn incomplete_addresses_are_distinguished() {
        let pool = FallbackPool::new(TenantId::new());
        let index = TenantIndex::build(&pool, &[tenant("Springfield", "SP")]);
        let incomplete = MatchResult::NoMatch(NoMatchReason::IncompleteAddress);

        assert_eq!(index.resolve(None), incomplete);
        assert_eq!(index.resolve(Some(&Address::default())), incomplete);
        assert_eq!(
            index.resolve(Some(&Address { city: Some("Springfield".into()), state: None })),
            incomplete
        );
        assert_eq!(index.resolve(Some(&addr("   ", "SP"))), incomplete);
    }

    #[test]
    fn fallback_pool_is_never_indexed() {
        let pooled = tenant("Springfield", "SP");
        let pool = FallbackPool::new(pooled.id);
        let index = TenantIndex::build(&pool, &[pooled]);

        assert!(index.is_empty());
        assert_eq!(
            index.resolve(Some(&addr("Springfield", "SP"))),
            MatchResult::NoMatch(NoMatchReason::NoTenantForLocation)
        );
    }

    #[test]
    fn ineligible_snapshot_entries_are_skipped() {
        let mut suspended = tenant("Springfield", "SP");
        suspended.status = TenantStatus::Suspended;
        let pool = FallbackPool::new(TenantId::new());
        assert!(TenantIndex::build(&pool, &[suspended]).is_empty());
    }

    #[test]
    fn first_tenant_wins_on_key_collision() {
        let first = tenant("Springfield", "SP");
        let second = tenant("springfield", "sp");
        let pool = FallbackPool::new(TenantId::new());
        let index = TenantIndex::build(&pool, &[first.clone(), second]);

        assert_eq!(index.len(), 1);
        assert_eq!(index.resolve(Some(&addr("Springfield", "SP"))), MatchResult::Matched(first.id));
    }
}
