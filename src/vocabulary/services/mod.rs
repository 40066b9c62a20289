//! Application services for tenant vocabularies.

mod context;
mod store;
mod vocabulary;

pub use context::TenantContext;
pub use store::TenantConfigStore;
pub use vocabulary::{ListFilter, VocabularyService};
