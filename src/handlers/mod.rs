// handlers/mod.rs - HTTP handlers
//
// Public: health and citizen registration
// Root:   linking runs and tenant lifecycle (/api/root/*)
pub mod citizen;
pub mod health;
pub mod root;
