pub mod registration;
pub mod tenant_service;

pub use registration::{CitizenRegistration, RegistrationError};
pub use tenant_service::{TenantError, TenantService};
