//! Tenant workflow: per-tenant customization and workflow metadata.
//!
//! This crate defines and enforces the vocabularies a tenant customizes
//! (task statuses, stages, priorities, lead sources, campaign and milestone
//! settings), the data-driven status transition graph, typed custom fields
//! and declarative automation rules that resolve events into action
//! intents.
//!
//! # Architecture
//!
//! Every bounded context follows hexagonal architecture principles:
//!
//! - **Domain**: Pure business logic with no infrastructure dependencies
//! - **Ports**: Abstract trait interfaces for external interactions
//! - **Adapters**: Concrete implementations of ports (in-memory, `PostgreSQL`)
//! - **Services**: Orchestration over a versioned configuration snapshot
//!
//! # Modules
//!
//! - [`vocabulary`]: Versioned per-tenant vocabulary store and seeding
//! - [`workflow`]: Task-status transition graph
//! - [`custom_field`]: Custom-field declarations and value validation
//! - [`automation`]: Rule expression language, resolution and rule health
//! - [`engine`]: End-to-end evaluation of task changes
//! - [`error`], [`config`], [`telemetry`]: Errors, settings and logging

pub mod automation;
pub mod config;
pub mod custom_field;
pub mod engine;
pub mod error;
pub mod telemetry;
pub mod vocabulary;
pub mod workflow;
