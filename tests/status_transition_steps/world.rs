//! Shared world state for status transition BDD scenarios.

use std::sync::Arc;

use mockable::DefaultClock;
use rstest::fixture;
use tenant_workflow::{
    config::EngineConfig,
    error::CustomizationError,
    vocabulary::{
        adapters::memory::InMemoryConfigurationRepository,
        domain::TaskStatus,
        services::{TenantConfigStore, TenantContext, VocabularyService},
    },
    workflow::services::TransitionService,
};

/// Service type used by the BDD world.
pub type TestTransitionService = TransitionService<InMemoryConfigurationRepository, DefaultClock>;

/// Vocabulary service type used by the BDD world.
pub type TestVocabularyService = VocabularyService<InMemoryConfigurationRepository, DefaultClock>;

/// Scenario world for status transition behaviour tests.
pub struct StatusTransitionWorld {
    pub vocabulary: TestVocabularyService,
    pub transitions: TestTransitionService,
    pub context: Option<TenantContext>,
    pub last_check: Option<Result<bool, CustomizationError>>,
    pub last_allowed: Option<Vec<TaskStatus>>,
}

impl StatusTransitionWorld {
    /// Creates a world over an empty in-memory repository.
    #[must_use]
    pub fn new() -> Self {
        let store = Arc::new(TenantConfigStore::new(
            Arc::new(InMemoryConfigurationRepository::new()),
            Arc::new(DefaultClock),
            EngineConfig::default(),
        ));

        Self {
            vocabulary: TestVocabularyService::new(Arc::clone(&store)),
            transitions: TransitionService::new(store),
            context: None,
            last_check: None,
            last_allowed: None,
        }
    }

    /// Returns the scenario tenant's context.
    pub fn context(&self) -> Result<&TenantContext, eyre::Report> {
        self.context
            .as_ref()
            .ok_or_else(|| eyre::eyre!("missing tenant context in scenario world"))
    }
}

impl Default for StatusTransitionWorld {
    fn default() -> Self {
        Self::new()
    }
}

/// Fixture that creates a new scenario world.
#[fixture]
pub fn world() -> StatusTransitionWorld {
    StatusTransitionWorld::default()
}

/// Runs an async operation within sync step definitions.
pub fn run_async<T>(future: impl std::future::Future<Output = T>) -> T {
    tokio::task::block_in_place(|| tokio::runtime::Handle::current().block_on(future))
}
