//! Custom-field declarations and value validation.

mod definition;
mod error;
mod validate;

pub use definition::{CustomFieldDefinition, FieldConstraints, FieldKind, ReferenceTarget};
pub use error::FieldValidationError;
pub use validate::{
    FieldMode, FieldValidation, PendingReference, check_value, validate_fields,
};
