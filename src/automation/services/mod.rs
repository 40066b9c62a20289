//! Application services for the automation rule engine.

mod automation;

pub use automation::AutomationService;
