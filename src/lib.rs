pub mod api;
pub mod comfort;
pub mod config;
pub mod export;
pub mod model;
pub mod store;
