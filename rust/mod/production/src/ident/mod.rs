pub mod compose;
pub mod derive;
pub mod shift;

pub use compose::{compose, render, render_fields, validate, validate_definition, ValidationResult};
pub use derive::{resolve_fields, resolve_value, DeriveContext, DEFAULT_SERIAL_WIDTH};
pub use shift::{resolve_shift, validate_shift_table};
