pub mod link;
pub mod server;
pub mod tenant;
