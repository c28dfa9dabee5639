//! Tenant lifecycle hook: claims waiting citizens when a tenant becomes eligible.
//!
//! Every entry point returns `()`. Reconciliation is best effort and must never
//! fail or block the tenant operation that triggered it.

use std::panic::AssertUnwindSafe;
use std::sync::Arc;

use futures::FutureExt;
use tokio::task::JoinHandle;
use tracing::{error, info};

use crate::database::models::{FallbackPool, Tenant};
use crate::linking::orchestrator::LinkingOrchestrator;
use crate::types::TenantId;

#[derive(Clone)]
pub struct TenantLifecycleHook {
    orchestrator: Arc<LinkingOrchestrator>,
}

impl TenantLifecycleHook {
    pub fn new(orchestrator: Arc<LinkingOrchestrator>) -> Self {
        Self { orchestrator }
    }

    /// Run a scoped link for `tenant_id`, logging the outcome. Errors and
    /// panics from the run are logged and swallowed.
    pub async fn on_tenant_activated(&self, tenant_id: TenantId) {
        let run = self.orchestrator.run_linking(Some(tenant_id));

        match AssertUnwindSafe(run).catch_unwind().await {
            Ok(Ok(outcome)) => info!(
                tenant_id = %tenant_id,
                linked = outcome.linked,
                unlinked = outcome.unlinked,
                "Auto-linking after tenant activation finished"
            ),
            Ok(Err(e)) => error!(tenant_id = %tenant_id, error = %e, "Auto-linking after tenant activation failed"),
            Err(_) => error!(tenant_id = %tenant_id, "Auto-linking after tenant activation panicked"),
        }
    }

    /// Fire-and-forget variant; the handle only reports completion
    pub fn notify_tenant_activated(&self, tenant_id: TenantId) -> JoinHandle<()> {
        let hook = self.clone();
        tokio::spawn(async move { hook.on_tenant_activated(tenant_id).await })
    }

    /// Inspect a tenant change and fire the hook when it made the tenant a
    /// matching target. Returns the spawned run, if any.
    pub fn on_tenant_changed(&self, before: Option<&Tenant>, after: &Tenant) -> Option<JoinHandle<()>> {
        if triggers_linking(&self.orchestrator.fallback_pool(), before, after) {
            Some(self.notify_tenant_activated(after.id))
        } else {
            None
        }
    }
}

/// A change triggers linking when the tenant ends up eligible and it is new,
/// was not eligible before, changed status, or changed location.
pub fn triggers_linking(pool: &FallbackPool, before: Option<&Tenant>, after: &Tenant) -> bool {
    if !pool.is_eligible(after) {
        return false;
    }
    match before {
        None => true,
        Some(before) => {
            !pool.is_eligible(before) || before.status != after.status || !before.same_location(after)
        }
    }
}
