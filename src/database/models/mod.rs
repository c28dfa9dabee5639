pub mod citizen;
pub mod tenant;

pub use citizen::{Address, CandidateRecord, Citizen, CitizenRow, MalformedCitizen, NewCitizen};
pub use tenant::{FallbackPool, NewTenant, Tenant, TenantRow};
