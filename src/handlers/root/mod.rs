// handlers/root/mod.rs - Administrative handlers
//
// Operator-triggered link runs and tenant lifecycle changes. Authentication is
// provided by the host application in front of this router.

pub mod linking; // POST /api/root/linking
pub mod tenant;  // /api/root/tenant[/:id]

pub use linking::linking_run;
pub use tenant::{tenant_create, tenant_list, tenant_location, tenant_show, tenant_status};
