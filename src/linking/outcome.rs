use serde::{Deserialize, Serialize};

use crate::linking::matching::NoMatchReason;
use crate::types::{CitizenId, TenantId};

/// Reason code attached to every unlinked citizen
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum UnlinkedReason {
    IncompleteAddress,
    NoMatchingTenant,
    /// The ownership guard failed: another run already moved this citizen
    AlreadyResolved,
    ProcessingError,
}

impl From<NoMatchReason> for UnlinkedReason {
    fn from(reason: NoMatchReason) -> Self {
        match reason {
            NoMatchReason::IncompleteAddress => UnlinkedReason::IncompleteAddress,
            NoMatchReason::NoTenantForLocation => UnlinkedReason::NoMatchingTenant,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct LinkedCitizen {
    pub citizen_id: CitizenId,
    pub display_name: String,
    pub tenant_id: TenantId,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct UnlinkedCitizen {
    pub citizen_id: CitizenId,
    pub display_name: String,
    pub reason: UnlinkedReason,
}

/// Result of processing one candidate
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum CandidateResult {
    Linked(LinkedCitizen),
    Unlinked(UnlinkedCitizen),
}

impl CandidateResult {
    pub fn unlinked(citizen_id: CitizenId, display_name: impl Into<String>, reason: UnlinkedReason) -> Self {
        CandidateResult::Unlinked(UnlinkedCitizen {
            citizen_id,
            display_name: display_name.into(),
            reason,
        })
    }
}

/// Summary of one resolution run
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct LinkOutcome {
    /// Target tenant of a scoped run; `None` for a global run
    pub target_tenant_id: Option<TenantId>,
    pub total_processed: usize,
    pub linked: usize,
    pub unlinked: usize,
    pub linked_citizens: Vec<LinkedCitizen>,
    pub unlinked_citizens: Vec<UnlinkedCitizen>,
}

impl LinkOutcome {
    pub fn new(target_tenant_id: Option<TenantId>) -> Self {
        Self {
            target_tenant_id,
            ..Self::default()
        }
    }

    pub fn record(&mut self, result: CandidateResult) {
        self.total_processed += 1;
        match result {
            CandidateResult::Linked(entry) => {
                self.linked += 1;
                self.linked_citizens.push(entry);
            }
            CandidateResult::Unlinked(entry) => {
                self.unlinked += 1;
                self.unlinked_citizens.push(entry);
            }
        }
    }

    /// Number of unlinked entries carrying `reason`
    pub fn count_reason(&self, reason: UnlinkedReason) -> usize {
        self.unlinked_citizens.iter().filter(|u| u.reason == reason).count()
    }

    pub fn is_consistent(&self) -> bool {
        self.linked + self.unlinked == self.total_processed
            && self.linked == self.linked_citizens.len()
            && self.unlinked == self.unlinked_citizens.len()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn record_keeps_counts_consistent() {
        let mut outcome = LinkOutcome::new(None);
        outcome.record(CandidateResult::Linked(LinkedCitizen {
            citizen_id: CitizenId::new(),
            display_name: "Ana".into(),
            tenant_id: TenantId::new(),
        }));
        outcome.record(CandidateResult::unlinked(CitizenId::new(), "Bia", UnlinkedReason::ProcessingError));
        outcome.record(CandidateResult::unlinked(CitizenId::new(), "Caio", UnlinkedReason::NoMatchingTenant));

        assert_eq!(outcome.total_processed, 3);
        assert_eq!(outcome.linked, 1);
        assert_eq!(outcome.unlinked, 2);
        assert_eq!(outcome.count_reason(UnlinkedReason::ProcessingError), 1);
        assert!(outcome.is_consistent());
    }

    #[test]
    fn reason_codes_serialize_snake_case() {
        let v = serde_json::to_value(UnlinkedReason::AlreadyResolved).unwrap();
        assert_eq!(v, json!("already_resolved"));
        let v = serde_json::to_value(UnlinkedReason::from(NoMatchReason::NoTenantForLocation)).unwrap();
        assert_eq!(v, json!("no_matching_tenant"));
    }

    #[test]
    fn empty_outcome_serializes_zero_counts() {
        let v = serde_json::to_value(LinkOutcome::new(None)).unwrap();
        assert_eq!(v["total_processed"], json!(0));
        assert_eq!(v["linked"], json!(0));
        assert_eq!(v["unlinked"], json!(0));
        assert_eq!(v["target_tenant_id"], serde_json::Value::Null);
    }
}
