//! Per-tenant vocabulary store.
//!
//! Owns every configurable enumeration of a tenant (task statuses, stages,
//! types, priorities, notification types, custom fields, transitions,
//! automation rules, and the lead-source, campaign and milestone
//! customizations) as typed rows of one versioned [`TenantConfiguration`]
//! snapshot. The module follows hexagonal architecture:
//!
//! - Domain types in [`domain`]
//! - Port contracts in [`ports`]
//! - Adapter implementations in [`adapters`]
//! - Orchestration services in [`services`]
//!
//! [`TenantConfiguration`]: domain::TenantConfiguration

pub mod adapters;
pub mod domain;
pub mod ports;
pub mod services;

#[cfg(test)]
mod tests;
