pub mod api;
pub mod auth;
pub mod config;
pub mod entities;
pub mod error;
pub mod metrics;
pub mod migrator;
pub mod telemetry;

pub use sea_orm;
