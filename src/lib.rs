pub mod config;
pub mod constants;
pub mod error;
pub mod logging;
pub mod observability;
pub mod pipeline;
pub mod types;

// Application boundary and infrastructure adapters
pub mod app;
pub mod infra;
