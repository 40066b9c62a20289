//! Application services for the custom-field engine.

mod fields;

pub use fields::CustomFieldService;
