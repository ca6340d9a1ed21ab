//! Wizard Controller: the five form steps, their validation rules and the
//! per-field error bookkeeping.

use chrono::{DateTime, Duration, Utc};
use serde::Serialize;
use thiserror::Error;

use crate::models::profile::is_valid_email;
use crate::models::{FieldValue, FormState, Section, SectionEntry};

pub const FIRST_STEP: u8 = 1;
pub const LAST_STEP: u8 = 5;

/// Field errors disappear on their own after this long.
pub const FIELD_ERROR_TTL_SECS: i64 = 5;

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct FieldError {
    pub field: String,
    pub message: String,
}

impl FieldError {
    fn new(field: impl Into<String>, message: impl Into<String>) -> Self {
        Self {
            field: field.into(),
            message: message.into(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum WizardError {
    #[error("Step {0} does not exist")]
    NoSuchStep(u8),

    #[error("Please complete the required fields")]
    Invalid(Vec<FieldError>),
}

/// Collects the validation failures for `step`. An empty list means the step
/// may be left.
pub fn validate_step(step: u8, form: &FormState) -> Vec<FieldError> {
    let mut errors = Vec::new();
    match step {
        1 => {
            let p = &form.profile;
            if p.full_name.trim().is_empty() {
                errors.push(FieldError::new("fullName", "Full name is required"));
            }
            if p.profession.trim().is_empty() {
                errors.push(FieldError::new("profession", "Profession is required"));
            }
            if p.email.trim().is_empty() {
                errors.push(FieldError::new("email", "Email is required"));
            } else if !is_valid_email(&p.email) {
                errors.push(FieldError::new("email", "Please enter a valid email address"));
            }
        }
        2 => require_entries(&form.education, &mut errors),
        3 => require_entries(&form.experience, &mut errors),
        4 => require_entries(&form.projects, &mut errors),
        _ => {}
    }
    errors
}

fn require_entries<T: SectionEntry>(section: &Section<T>, errors: &mut Vec<FieldError>) {
    for (i, entry) in section.entries().iter().enumerate() {
        for (field, message) in T::REQUIRED {
            let blank = match entry.get(field) {
                Some(FieldValue::Text(v)) => v.trim().is_empty(),
                _ => true,
            };
            if blank {
                errors.push(FieldError::new(format!("{}.{i}.{field}", T::KIND), *message));
            }
        }
    }
}

#[derive(Debug, Clone)]
struct RaisedError {
    error: FieldError,
    raised_at: DateTime<Utc>,
}

#[derive(Debug, Clone)]
pub struct Wizard {
    step: u8,
    errors: Vec<RaisedError>,
}

impl Default for Wizard {
    fn default() -> Self {
        Self {
            step: FIRST_STEP,
            errors: Vec::new(),
        }
    }
}

impl Wizard {
    pub fn step(&self) -> u8 {
        self.step
    }

    pub fn progress_percent(&self) -> u8 {
        ((self.step - FIRST_STEP) as u32 * 100 / (LAST_STEP - FIRST_STEP) as u32) as u8
    }

    /// Field errors still inside their display window.
    pub fn active_errors(&self, now: DateTime<Utc>) -> Vec<FieldError> {
        self.errors
            .iter()
            .filter(|e| now - e.raised_at < Duration::seconds(FIELD_ERROR_TTL_SECS))
            .map(|e| e.error.clone())
            .collect()
    }

    /// Validates the current step and advances when it passes.
    pub fn next(&mut self, form: &FormState, now: DateTime<Utc>) -> Result<u8, WizardError> {
        self.check_current(form, now)?;
        self.step = (self.step + 1).min(LAST_STEP);
        Ok(self.step)
    }

    pub fn back(&mut self) -> u8 {
        self.step = (self.step - 1).max(FIRST_STEP);
        self.step
    }

    /// Jumps to `target`. Moving backwards (or staying) is always allowed;
    /// moving forward requires the current step to validate.
    pub fn go_to(
        &mut self,
        target: u8,
        form: &FormState,
        now: DateTime<Utc>,
    ) -> Result<u8, WizardError> {
        if !(FIRST_STEP..=LAST_STEP).contains(&target) {
            return Err(WizardError::NoSuchStep(target));
        }
        if target > self.step {
            self.check_current(form, now)?;
        }
        self.step = target;
        Ok(self.step)
    }

    /// Final submit: the current step must validate.
    pub fn generate(&mut self, form: &FormState, now: DateTime<Utc>) -> Result<(), WizardError> {
        self.check_current(form, now)
    }

    pub fn reset(&mut self) {
        *self = Wizard::default();
    }

    fn check_current(&mut self, form: &FormState, now: DateTime<Utc>) -> Result<(), WizardError> {
        let errors = validate_step(self.step, form);
        if errors.is_empty() {
            return Ok(());
        }
        self.raise(&errors, now);
        Err(WizardError::Invalid(errors))
    }

    fn raise(&mut self, errors: &[FieldError], now: DateTime<Utc>) {
        let ttl = Duration::seconds(FIELD_ERROR_TTL_SECS);
        self.errors.retain(|e| {
            now - e.raised_at < ttl && !errors.iter().any(|n| n.field == e.error.field)
        });
        self.errors.extend(errors.iter().cloned().map(|error| RaisedError {
            error,
            raised_at: now,
        }));
    }
}
