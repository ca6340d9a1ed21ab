//! The whole form as one value. Every mutation handler borrows the current
//! state and returns a fresh one, so a refused mutation can never leave a
//! half-applied edit behind.

use serde::{Deserialize, Serialize};

use crate::models::{
    CertificationEntry, CustomizationOptions, EducationEntry, ExperienceEntry, ExportOptions,
    FieldValue, FormError, HobbyEntry, NavItem, ProfileRecord, ProjectEntry, Section,
    SectionKind, SkillEntry, TagKind, TagList,
};

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct FormState {
    pub profile: ProfileRecord,
    pub education: Section<EducationEntry>,
    pub experience: Section<ExperienceEntry>,
    pub projects: Section<ProjectEntry>,
    pub certifications: Section<CertificationEntry>,
    pub skills: TagList<SkillEntry>,
    pub hobbies: TagList<HobbyEntry>,
    pub customization: CustomizationOptions,
    pub export: ExportOptions,
}

impl FormState {
    #[cfg(test)]
    pub fn section_len(&self, kind: SectionKind) -> usize {
        match kind {
            SectionKind::Education => self.education.len(),
            SectionKind::Experience => self.experience.len(),
            SectionKind::Projects => self.projects.len(),
            SectionKind::Certifications => self.certifications.len(),
        }
    }

    #[cfg(test)]
    pub fn tag_len(&self, kind: TagKind) -> usize {
        match kind {
            TagKind::Skills => self.skills.len(),
            TagKind::Hobbies => self.hobbies.len(),
        }
    }

    // ── Dynamic sections ────────────────────────────────────────────────────

    pub fn add_entry(&self, kind: SectionKind) -> FormState {
        let mut next = self.clone();
        match kind {
            SectionKind::Education => next.education = self.education.with_added(),
            SectionKind::Experience => next.experience = self.experience.with_added(),
            SectionKind::Projects => next.projects = self.projects.with_added(),
            SectionKind::Certifications => {
                next.certifications = self.certifications.with_added()
            }
        }
        next
    }

    pub fn remove_entry(&self, kind: SectionKind, index: usize) -> Result<FormState, FormError> {
        let mut next = self.clone();
        match kind {
            SectionKind::Education => next.education = self.education.without(index)?,
            SectionKind::Experience => next.experience = self.experience.without(index)?,
            SectionKind::Projects => next.projects = self.projects.without(index)?,
            SectionKind::Certifications => {
                next.certifications = self.certifications.without(index)?
            }
        }
        Ok(next)
    }

    pub fn set_entry_field(
        &self,
        kind: SectionKind,
        index: usize,
        field: &str,
        value: FieldValue,
    ) -> Result<FormState, FormError> {
        let mut next = self.clone();
        match kind {
            SectionKind::Education => {
                next.education = self.education.with_field(index, field, value)?
            }
            SectionKind::Experience => {
                next.experience = self.experience.with_field(index, field, value)?
            }
            SectionKind::Projects => {
                next.projects = self.projects.with_field(index, field, value)?
            }
            SectionKind::Certifications => {
                next.certifications = self.certifications.with_field(index, field, value)?
            }
        }
        Ok(next)
    }

    // ── Tag collections ─────────────────────────────────────────────────────

    pub fn add_tag(&self, kind: TagKind, name: &str) -> Result<FormState, FormError> {
        let mut next = self.clone();
        match kind {
            TagKind::Skills => next.skills = self.skills.with_added(name)?,
            TagKind::Hobbies => next.hobbies = self.hobbies.with_added(name)?,
        }
        Ok(next)
    }

    pub fn remove_tag(&self, kind: TagKind, name: &str) -> Result<FormState, FormError> {
        let mut next = self.clone();
        match kind {
            TagKind::Skills => next.skills = self.skills.without(name)?,
            TagKind::Hobbies => next.hobbies = self.hobbies.without(name)?,
        }
        Ok(next)
    }

    pub fn set_skill_level(&self, name: &str, level: i64) -> Result<FormState, FormError> {
        let mut next = self.clone();
        next.skills = self.skills.with_level(name, level)?;
        Ok(next)
    }

    #[cfg(test)]
    pub fn has_tag(&self, kind: TagKind, name: &str) -> bool {
        match kind {
            TagKind::Skills => self.skills.contains(name),
            TagKind::Hobbies => self.hobbies.contains(name),
        }
    }

    // ── Export navigation ───────────────────────────────────────────────────

    /// Replaces the anchors of the exported page's navigation bar. An empty
    /// list brings back the five defaults. One bad item refuses the lot.
    pub fn set_nav_items(&self, items: Vec<NavItem>) -> Result<FormState, FormError> {
        for (i, item) in items.iter().enumerate() {
            item.check(i)?;
        }
        let mut next = self.clone();
        next.export.nav_items = (!items.is_empty()).then_some(items);
        Ok(next)
    }
}
