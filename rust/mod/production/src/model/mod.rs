pub mod configuration;
pub mod field;
pub mod grade;
pub mod record;
pub mod selection;
pub mod serial;
pub mod shift;
pub mod time;

pub use configuration::{model_number_of, Configuration, YearFormat};
pub use field::{default_fields, Field, FieldKind, MODEL_NUMBER};
pub use grade::{Grade, GradeConfig};
pub use record::ProductionRecord;
pub use selection::Selection;
pub use serial::{SerialAction, SerialConfigLog, SerialCounterState, SerialSettings};
pub use shift::{ShiftDefinition, ShiftSchedule};
pub use time::{ParseTimeError, TimeOfDay, MINUTES_PER_DAY};
