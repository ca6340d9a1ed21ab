// Form-level behaviour around the data model: the field store and its
// persisted field map, wizard steps and validation, transient notices, and
// the example profiles.

pub mod fields;
pub mod notice;
pub mod samples;
pub mod wizard;

pub use fields::{FieldId, FieldMap};
pub use notice::{Notice, NotificationCenter};
pub use samples::Sample;
pub use wizard::{FieldError, Wizard, WizardError};
