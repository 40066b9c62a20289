//! Shared fixtures for in-memory engine integration tests.

use std::sync::Arc;

use mockable::DefaultClock;
use rstest::fixture;
use tenant_workflow::{
    automation::adapters::memory::InMemoryRuleHealthStore,
    config::EngineConfig,
    custom_field::adapters::memory::InMemoryReferenceResolver,
    engine::services::CustomizationEngine,
    vocabulary::{
        adapters::memory::InMemoryConfigurationRepository,
        domain::Code,
        services::{TenantConfigStore, TenantContext},
    },
};

/// Engine wired to in-memory adapters.
pub type TestEngine = CustomizationEngine<
    InMemoryConfigurationRepository,
    DefaultClock,
    InMemoryReferenceResolver,
    InMemoryRuleHealthStore,
>;

/// Provides an engine whose tenants are seeded on first access.
#[fixture]
pub fn engine() -> TestEngine {
    let store = Arc::new(TenantConfigStore::new(
        Arc::new(InMemoryConfigurationRepository::new()),
        Arc::new(DefaultClock),
        EngineConfig::default(),
    ));
    CustomizationEngine::new(
        store,
        Arc::new(InMemoryReferenceResolver::new()),
        Arc::new(InMemoryRuleHealthStore::new()),
    )
}

/// Provides an unpinned context for tenant `t1`.
#[fixture]
pub fn t1() -> TenantContext {
    TenantContext::for_tenant("t1").expect("valid tenant")
}

/// Builds a code, panicking on malformed test input.
#[must_use]
pub fn code(raw: &str) -> Code {
    Code::new(raw).expect("valid code")
}
