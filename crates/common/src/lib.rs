pub mod chain;
pub mod config;
pub mod model;
pub mod observability;
pub mod types;
