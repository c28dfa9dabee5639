use std::panic::AssertUnwindSafe;
use std::sync::Arc;
use std::time::Duration;

use futures::{stream, FutureExt, StreamExt};
use thiserror::Error;
use tracing::{debug, info, info_span, warn, Instrument};

use crate::config::LinkingConfig;
use crate::database::models::{CandidateRecord, FallbackPool};
use crate::database::store::{CitizenStore, ReassignOutcome, StoreError, TenantDirectory};
use crate::linking::matching::{LocationMatcher, MatchResult, TenantIndex};
use crate::linking::outcome::{CandidateResult, LinkOutcome, LinkedCitizen, UnlinkedReason};
use crate::types::{CitizenId, TenantId};

/// Run-level failures. Per-citizen failures never surface here; they are
/// recorded in the outcome instead.
#[derive(Debug, Error)]
pub enum LinkingError {
    #[error("Tenant directory unavailable: {0}")]
    Directory(#[source] StoreError),

    #[error("Could not load fallback pool citizens: {0}")]
    Candidates(#[source] StoreError),
}

/// Drives resolution runs that move citizens out of the fallback pool
pub struct LinkingOrchestrator {
    directory: Arc<dyn TenantDirectory>,
    citizens: Arc<dyn CitizenStore>,
    pool: FallbackPool,
    config: LinkingConfig,
}

impl LinkingOrchestrator {
    pub fn new(
        directory: Arc<dyn TenantDirectory>,
        citizens: Arc<dyn CitizenStore>,
        config: LinkingConfig,
    ) -> Self {
        Self {
            directory,
            citizens,
            pool: FallbackPool::new(config.fallback_tenant_id),
            config,
        }
    }

    pub fn fallback_pool(&self) -> FallbackPool {
        self.pool
    }

    /// Run one resolution pass.
    ///
    /// With `target` set only that tenant can receive citizens; an ineligible
    /// or unknown target yields an empty outcome. A global run always lists the
    /// fallback pool, so waiting citizens appear in the outcome with a reason
    /// even when no tenant is eligible. Re-running with no data
    /// changes links nothing, because resolved citizens leave the pool.
    pub async fn run_linking(&self, target: Option<TenantId>) -> Result<LinkOutcome, LinkingError> {
        let scope = target.map(|id| id.to_string()).unwrap_or_else(|| "global".to_string());
        let span = info_span!("link_run", scope = %scope);
        self.run_scoped(target).instrument(span).await
    }

    async fn run_scoped(&self, target: Option<TenantId>) -> Result<LinkOutcome, LinkingError> {
        let mut snapshot = self
            .directory
            .eligible_tenants(self.pool, target)
            .await
            .map_err(LinkingError::Directory)?;

        if let Some(target) = target {
            snapshot.retain(|t| t.id == target);
        }

        let index = TenantIndex::build(&self.pool, &snapshot);
        let mut outcome = LinkOutcome::new(target);

        // A global run still reports every waiting citizen, even with no targets
        if target.is_some() && index.is_empty() {
            info!("Target tenant is not eligible, nothing to link");
            return Ok(outcome);
        }

        let candidates = self
            .citizens
            .fallback_candidates(self.pool)
            .await
            .map_err(LinkingError::Candidates)?;

        debug!(tenants = index.len(), candidates = candidates.len(), "Starting link run");

        let pending: Vec<_> = candidates
            .into_iter()
            .map(|candidate| self.process_candidate(&index, candidate))
            .collect();

        // buffered keeps results in retrieval order
        let results: Vec<CandidateResult> = stream::iter(pending)
            .buffered(self.config.max_concurrent_writes.max(1))
            .collect()
            .await;

        for result in results {
            outcome.record(result);
        }

        info!(
            total = outcome.total_processed,
            linked = outcome.linked,
            unlinked = outcome.unlinked,
            "Link run finished"
        );
        Ok(outcome)
    }

    /// Isolation boundary: nothing that happens to one candidate escapes it
    async fn process_candidate(&self, matcher: &dyn LocationMatcher, candidate: CandidateRecord) -> CandidateResult {
        let (citizen_id, display_name) = match &candidate {
            Ok(citizen) => (citizen.id, citizen.display_name.clone()),
            Err(malformed) => (malformed.id, malformed.display_name.clone()),
        };

        match AssertUnwindSafe(self.resolve_candidate(matcher, candidate))
            .catch_unwind()
            .await
        {
            Ok(result) => result,
            Err(_) => {
                warn!(citizen_id = %citizen_id, "Panic while linking citizen");
                CandidateResult::unlinked(citizen_id, display_name, UnlinkedReason::ProcessingError)
            }
        }
    }

    async fn resolve_candidate(&self, matcher: &dyn LocationMatcher, candidate: CandidateRecord) -> CandidateResult {
        let citizen = match candidate {
            Ok(citizen) => citizen,
            Err(malformed) => {
                warn!(citizen_id = %malformed.id, reason = %malformed.reason, "Skipping malformed citizen record");
                return CandidateResult::unlinked(malformed.id, malformed.display_name, UnlinkedReason::ProcessingError);
            }
        };

        let target = match matcher.resolve(citizen.address.as_ref()) {
            MatchResult::Matched(target) => target,
            MatchResult::NoMatch(reason) => {
                return CandidateResult::unlinked(citizen.id, citizen.display_name, reason.into());
            }
        };

        match self.reassign_with_retry(citizen.id, target).await {
            Ok(ReassignOutcome::Reassigned) => {
                debug!(citizen_id = %citizen.id, tenant_id = %target, "Citizen linked");
                CandidateResult::Linked(LinkedCitizen {
                    citizen_id: citizen.id,
                    display_name: citizen.display_name,
                    tenant_id: target,
                })
            }
            Ok(ReassignOutcome::AlreadyResolved) => {
                debug!(citizen_id = %citizen.id, "Citizen already left the fallback pool");
                CandidateResult::unlinked(citizen.id, citizen.display_name, UnlinkedReason::AlreadyResolved)
            }
            Err(e) => {
                warn!(citizen_id = %citizen.id, tenant_id = %target, error = %e, "Failed to reassign citizen");
                CandidateResult::unlinked(citizen.id, citizen.display_name, UnlinkedReason::ProcessingError)
            }
        }
    }

    async fn reassign_with_retry(&self, citizen: CitizenId, target: TenantId) -> Result<ReassignOutcome, StoreError> {
        let attempts = self.config.write_retry_attempts.max(1);
        let mut attempt = 1;

        loop {
            match self.citizens.reassign(citizen, self.pool, target).await {
                Err(e) if e.is_transient() && attempt < attempts => {
                    debug!(citizen_id = %citizen, attempt, error = %e, "Transient write failure, retrying");
                    let backoff = self.config.write_retry_backoff_ms.saturating_mul(attempt as u64);
                    tokio::time::sleep(Duration::from_millis(backoff)).await;
                    attempt += 1;
                }
                other => return other,
            }
        }
    }
}
