//! `PostgreSQL` adapters for tenant configuration persistence.

mod models;
mod repository;
mod schema;

pub use repository::{ConfigPgPool, PostgresConfigurationRepository};
