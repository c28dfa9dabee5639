pub mod hook;
pub mod matching;
pub mod orchestrator;
pub mod outcome;

pub use hook::{triggers_linking, TenantLifecycleHook};
pub use matching::{LocationKey, LocationMatcher, MatchResult, NoMatchReason, TenantIndex};
pub use orchestrator::{LinkingError, LinkingOrchestrator};
pub use outcome::{CandidateResult, LinkOutcome, LinkedCitizen, UnlinkedCitizen, UnlinkedReason};
