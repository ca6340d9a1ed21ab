// Form data model: profile, repeatable sections, tag collections and
// customization, aggregated into an immutable-per-update `FormState`.

pub mod customization;
pub mod form;
pub mod profile;
pub mod sections;
pub mod tags;

use serde::{Deserialize, Serialize};
use thiserror::Error;

pub use customization::{CustomizationOptions, ExportOptions, NavItem, TemplateId, Theme};
pub use form::FormState;
pub use profile::ProfileRecord;
pub use sections::{
    CertificationEntry, EducationEntry, ExperienceEntry, ProjectEntry, Section, SectionEntry,
    SectionKind,
};
pub use tags::{HobbyEntry, SkillEntry, TagKind, TagList};

/// A single input value as the browser sends it: text inputs carry strings,
/// checkboxes carry booleans.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum FieldValue {
    Flag(bool),
    Text(String),
}

impl FieldValue {
    pub fn into_text(self, field: &str) -> Result<String, FormError> {
        match self {
            FieldValue::Text(s) => Ok(s),
            FieldValue::Flag(_) => Err(FormError::WrongType {
                field: field.to_string(),
                expected: "text",
            }),
        }
    }

    pub fn into_flag(self, field: &str) -> Result<bool, FormError> {
        match self {
            FieldValue::Flag(b) => Ok(b),
            FieldValue::Text(_) => Err(FormError::WrongType {
                field: field.to_string(),
                expected: "a boolean",
            }),
        }
    }
}

impl From<&str> for FieldValue {
    fn from(s: &str) -> Self {
        FieldValue::Text(s.to_string())
    }
}

impl From<String> for FieldValue {
    fn from(s: String) -> Self {
        FieldValue::Text(s)
    }
}

impl From<bool> for FieldValue {
    fn from(b: bool) -> Self {
        FieldValue::Flag(b)
    }
}

/// Refused mutations. The form state is never modified when one of these is
/// returned; the caller surfaces `to_string()` as a transient notice.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum FormError {
    #[error("Cannot remove the last {} section. Clear fields if not needed.", .0.label())]
    LastEntry(SectionKind),

    #[error("No {} entry at position {index}", .kind.label())]
    NoSuchEntry { kind: SectionKind, index: usize },

    #[error("{} already added", .0.label())]
    DuplicateTag(TagKind, String),

    #[error("{} name is empty", .0.label())]
    EmptyTag(TagKind),

    #[error("{} '{1}' not found", .0.label())]
    UnknownTag(TagKind, String),

    #[error("Unknown field '{0}'")]
    UnknownField(String),

    #[error("Field '{field}' expects {expected}")]
    WrongType {
        field: String,
        expected: &'static str,
    },

    #[error("'{value}' is not a valid value for {field}")]
    InvalidValue { field: String, value: String },

    #[error("End date is disabled while currently working")]
    EndPeriodLocked,
}

impl FormError {
    /// Empty tag input is dropped without telling the user.
    pub fn is_silent(&self) -> bool {
        matches!(self, FormError::EmptyTag(_))
    }

    pub fn code(&self) -> &'static str {
        match self {
            FormError::LastEntry(_) => "LAST_ENTRY",
            FormError::NoSuchEntry { .. } => "NO_SUCH_ENTRY",
            FormError::DuplicateTag(..) => "DUPLICATE_TAG",
            FormError::EmptyTag(_) => "EMPTY_TAG",
            FormError::UnknownTag(..) => "UNKNOWN_TAG",
            FormError::UnknownField(_) => "UNKNOWN_FIELD",
            FormError::WrongType { .. } => "WRONG_FIELD_TYPE",
            FormError::InvalidValue { .. } => "INVALID_VALUE",
            FormError::EndPeriodLocked => "FIELD_DISABLED",
        }
    }
}
