pub mod api;
pub mod cli;
pub mod config;
pub mod database;
pub mod error;
pub mod handlers;
pub mod linking;
pub mod middleware;
pub mod services;
pub mod types;
