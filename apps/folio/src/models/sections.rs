//! Repeatable form sections (education, experience, projects, certifications).
//!
//! A `Section<T>` is an ordered list of entries that is never empty: it is
//! created with one blank entry, deserialization tops an empty list back up to
//! one, and removal of the last entry is refused. Entries have no identity
//! beyond their position. Every mutation returns a new section and leaves the
//! receiver untouched.

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Deserializer, Serialize, Serializer};

use crate::models::{FieldValue, FormError};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SectionKind {
    Education,
    Experience,
    Projects,
    Certifications,
}

impl SectionKind {
    pub const ALL: [SectionKind; 4] = [
        SectionKind::Education,
        SectionKind::Experience,
        SectionKind::Projects,
        SectionKind::Certifications,
    ];

    pub fn as_str(self) -> &'static str {
        match self {
            SectionKind::Education => "education",
            SectionKind::Experience => "experience",
            SectionKind::Projects => "projects",
            SectionKind::Certifications => "certifications",
        }
    }

    /// Singular noun used in user-facing notices.
    pub fn label(self) -> &'static str {
        match self {
            SectionKind::Education => "education",
            SectionKind::Experience => "experience",
            SectionKind::Projects => "project",
            SectionKind::Certifications => "certification",
        }
    }
}

impl fmt::Display for SectionKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for SectionKind {
    type Err = FormError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        SectionKind::ALL
            .into_iter()
            .find(|k| k.as_str() == s)
            .ok_or_else(|| FormError::UnknownField(s.to_string()))
    }
}

/// Behaviour shared by the four entry record types.
pub trait SectionEntry: Clone + Default + PartialEq {
    const KIND: SectionKind;
    /// Field names in form order; also the keys used in the persisted field map.
    const FIELDS: &'static [&'static str];
    /// `(field, message)` pairs the wizard requires to be non-blank.
    const REQUIRED: &'static [(&'static str, &'static str)];

    /// The field that decides whether the whole section is shown.
    fn primary(&self) -> &str;

    /// False when the entry has nothing worth rendering.
    fn is_renderable(&self) -> bool;

    fn get(&self, field: &str) -> Option<FieldValue>;

    fn set(&mut self, field: &str, value: FieldValue) -> Result<(), FormError>;
}

// ────────────────────────────────────────────────────────────────────────────
// Entry records
// ────────────────────────────────────────────────────────────────────────────

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct EducationEntry {
    pub degree: String,
    pub institution: String,
    pub location: String,
    pub year: String,
    pub description: String,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ExperienceEntry {
    pub title: String,
    pub company: String,
    pub location: String,
    pub start: String,
    pub end: String,
    /// Currently working here. Mutually exclusive with `end`.
    pub current: bool,
    pub description: String,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ProjectEntry {
    pub name: String,
    pub url: String,
    pub description: String,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct CertificationEntry {
    pub name: String,
    pub organization: String,
    pub date: String,
}

fn set_text(
    kind: SectionKind,
    slots: &mut [(&str, &mut String)],
    field: &str,
    value: FieldValue,
) -> Result<(), FormError> {
    let qualified = format!("{kind}.{field}");
    match slots.iter_mut().find(|(name, _)| *name == field) {
        Some((_, slot)) => {
            **slot = value.into_text(&qualified)?;
            Ok(())
        }
        None => Err(FormError::UnknownField(qualified)),
    }
}

impl SectionEntry for EducationEntry {
    const KIND: SectionKind = SectionKind::Education;
    const FIELDS: &'static [&'static str] =
        &["degree", "institution", "location", "year", "description"];
    const REQUIRED: &'static [(&'static str, &'static str)] = &[
        ("degree", "Degree is required"),
        ("institution", "Institution is required"),
    ];

    fn primary(&self) -> &str {
        &self.degree
    }

    fn is_renderable(&self) -> bool {
        !self.degree.trim().is_empty() || !self.institution.trim().is_empty()
    }

    fn get(&self, field: &str) -> Option<FieldValue> {
        let v = match field {
            "degree" => &self.degree,
            "institution" => &self.institution,
            "location" => &self.location,
            "year" => &self.year,
            "description" => &self.description,
            _ => return None,
        };
        Some(FieldValue::Text(v.clone()))
    }

    fn set(&mut self, field: &str, value: FieldValue) -> Result<(), FormError> {
        let mut slots = [
            ("degree", &mut self.degree),
            ("institution", &mut self.institution),
            ("location", &mut self.location),
            ("year", &mut self.year),
            ("description", &mut self.description),
        ];
        set_text(Self::KIND, &mut slots, field, value)
    }
}

impl SectionEntry for ExperienceEntry {
    const KIND: SectionKind = SectionKind::Experience;
    const FIELDS: &'static [&'static str] = &[
        "title",
        "company",
        "location",
        "start",
        "end",
        "current",
        "description",
    ];
    const REQUIRED: &'static [(&'static str, &'static str)] = &[
        ("title", "Job title is required"),
        ("company", "Company is required"),
    ];

    fn primary(&self) -> &str {
        &self.title
    }

    fn is_renderable(&self) -> bool {
        !self.title.trim().is_empty() || !self.company.trim().is_empty()
    }

    fn get(&self, field: &str) -> Option<FieldValue> {
        let v = match field {
            "title" => &self.title,
            "company" => &self.company,
            "location" => &self.location,
            "start" => &self.start,
            "end" => &self.end,
            "current" => return Some(FieldValue::Flag(self.current)),
            "description" => &self.description,
            _ => return None,
        };
        Some(FieldValue::Text(v.clone()))
    }

    fn set(&mut self, field: &str, value: FieldValue) -> Result<(), FormError> {
        match field {
            "current" => {
                self.current = value.into_flag("experience.current")?;
                if self.current {
                    self.end.clear();
                }
                Ok(())
            }
            "end" => {
                let end = value.into_text("experience.end")?;
                if self.current && !end.is_empty() {
                    return Err(FormError::EndPeriodLocked);
                }
                self.end = end;
                Ok(())
            }
            _ => {
                let mut slots = [
                    ("title", &mut self.title),
                    ("company", &mut self.company),
                    ("location", &mut self.location),
                    ("start", &mut self.start),
                    ("description", &mut self.description),
                ];
                set_text(Self::KIND, &mut slots, field, value)
            }
        }
    }
}

impl SectionEntry for ProjectEntry {
    const KIND: SectionKind = SectionKind::Projects;
    const FIELDS: &'static [&'static str] = &["name", "url", "description"];
    const REQUIRED: &'static [(&'static str, &'static str)] =
        &[("name", "Project name is required")];

    fn primary(&self) -> &str {
        &self.name
    }

    fn is_renderable(&self) -> bool {
        !self.name.trim().is_empty()
    }

    fn get(&self, field: &str) -> Option<FieldValue> {
        let v = match field {
            "name" => &self.name,
            "url" => &self.url,
            "description" => &self.description,
            _ => return None,
        };
        Some(FieldValue::Text(v.clone()))
    }

    fn set(&mut self, field: &str, value: FieldValue) -> Result<(), FormError> {
        let mut slots = [
            ("name", &mut self.name),
            ("url", &mut self.url),
            ("description", &mut self.description),
        ];
        set_text(Self::KIND, &mut slots, field, value)
    }
}

impl SectionEntry for CertificationEntry {
    const KIND: SectionKind = SectionKind::Certifications;
    const FIELDS: &'static [&'static str] = &["name", "organization", "date"];
    const REQUIRED: &'static [(&'static str, &'static str)] = &[];

    fn primary(&self) -> &str {
        &self.name
    }

    fn is_renderable(&self) -> bool {
        !self.name.trim().is_empty()
    }

    fn get(&self, field: &str) -> Option<FieldValue> {
        let v = match field {
            "name" => &self.name,
            "organization" => &self.organization,
            "date" => &self.date,
            _ => return None,
        };
        Some(FieldValue::Text(v.clone()))
    }

    fn set(&mut self, field: &str, value: FieldValue) -> Result<(), FormError> {
        let mut slots = [
            ("name", &mut self.name),
            ("organization", &mut self.organization),
            ("date", &mut self.date),
        ];
        set_text(Self::KIND, &mut slots, field, value)
    }
}

// ────────────────────────────────────────────────────────────────────────────
// Section container
// ────────────────────────────────────────────────────────────────────────────

#[derive(Debug, Clone, PartialEq)]
pub struct Section<T> {
    entries: Vec<T>,
}

impl<T: SectionEntry> Default for Section<T> {
    fn default() -> Self {
        Self {
            entries: vec![T::default()],
        }
    }
}

impl<T: SectionEntry> Section<T> {
    /// Builds a section from restored entries, topping an empty list up to one
    /// blank entry.
    pub fn from_entries(entries: Vec<T>) -> Self {
        if entries.is_empty() {
            Self::default()
        } else {
            Self { entries }
        }
    }

    pub fn entries(&self) -> &[T] {
        &self.entries
    }

    #[cfg(test)]
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    /// The first entry, whose primary field gates the section in the preview.
    pub fn representative(&self) -> &T {
        // Never empty: every constructor guarantees at least one entry.
        &self.entries[0]
    }

    pub fn with_added(&self) -> Self {
        let mut entries = self.entries.clone();
        entries.push(T::default());
        Self { entries }
    }

    pub fn without(&self, index: usize) -> Result<Self, FormError> {
        if index >= self.entries.len() {
            return Err(FormError::NoSuchEntry {
                kind: T::KIND,
                index,
            });
        }
        if self.entries.len() == 1 {
            return Err(FormError::LastEntry(T::KIND));
        }
        let mut entries = self.entries.clone();
        entries.remove(index);
        Ok(Self { entries })
    }

    pub fn with_field(&self, index: usize, field: &str, value: FieldValue) -> Result<Self, FormError> {
        let mut entries = self.entries.clone();
        let entry = entries.get_mut(index).ok_or(FormError::NoSuchEntry {
            kind: T::KIND,
            index,
        })?;
        entry.set(field, value)?;
        Ok(Self { entries })
    }

    /// Replaces the first entry, used by the sample profiles.
    pub fn with_first(&self, entry: T) -> Self {
        let mut entries = self.entries.clone();
        entries[0] = entry;
        Self { entries }
    }
}

impl<T: Serialize> Serialize for Section<T> {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        self.entries.serialize(serializer)
    }
}

impl<'de, T: SectionEntry + Deserialize<'de>> Deserialize<'de> for Section<T> {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let entries = Vec::<T>::deserialize(deserializer)?;
        Ok(Section::from_entries(entries))
    }
}
