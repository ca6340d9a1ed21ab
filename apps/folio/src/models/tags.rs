//! Skill and hobby chips: ordered, case-sensitively deduplicated name lists.

use std::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::models::FormError;

pub const MIN_SKILL_LEVEL: u8 = 1;
pub const MAX_SKILL_LEVEL: u8 = 5;
pub const DEFAULT_SKILL_LEVEL: u8 = 3;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum TagKind {
    Skills,
    Hobbies,
}

impl TagKind {
    pub fn as_str(self) -> &'static str {
        match self {
            TagKind::Skills => "skills",
            TagKind::Hobbies => "hobbies",
        }
    }

    pub fn label(self) -> &'static str {
        match self {
            TagKind::Skills => "Skill",
            TagKind::Hobbies => "Hobby",
        }
    }
}

impl FromStr for TagKind {
    type Err = FormError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        [TagKind::Skills, TagKind::Hobbies]
            .into_iter()
            .find(|kind| kind.as_str() == s)
            .ok_or_else(|| FormError::UnknownField(s.to_string()))
    }
}

/// Something that lives in a `TagList`, identified by its name.
pub trait Tag: Clone {
    const KIND: TagKind;

    fn named(name: String) -> Self;

    fn name(&self) -> &str;
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SkillEntry {
    pub name: String,
    /// Always within `MIN_SKILL_LEVEL..=MAX_SKILL_LEVEL`.
    pub level: u8,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct HobbyEntry {
    pub name: String,
}

impl Tag for SkillEntry {
    const KIND: TagKind = TagKind::Skills;

    fn named(name: String) -> Self {
        SkillEntry {
            name,
            level: DEFAULT_SKILL_LEVEL,
        }
    }

    fn name(&self) -> &str {
        &self.name
    }
}

impl Tag for HobbyEntry {
    const KIND: TagKind = TagKind::Hobbies;

    fn named(name: String) -> Self {
        HobbyEntry { name }
    }

    fn name(&self) -> &str {
        &self.name
    }
}

/// Clamps any requested level into the 1–5 scale.
pub fn clamp_level(level: i64) -> u8 {
    level.clamp(MIN_SKILL_LEVEL as i64, MAX_SKILL_LEVEL as i64) as u8
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct TagList<T> {
    items: Vec<T>,
}

impl<T> Default for TagList<T> {
    fn default() -> Self {
        Self { items: Vec::new() }
    }
}

impl<T: Tag> TagList<T> {
    pub fn items(&self) -> &[T] {
        &self.items
    }

    #[cfg(test)]
    pub fn len(&self) -> usize {
        self.items.len()
    }

    pub fn is_empty(&self) -> bool {
        self.items.is_empty()
    }

    pub fn contains(&self, name: &str) -> bool {
        self.items.iter().any(|t| t.name() == name)
    }

    /// Appends `name` after trimming. Blank input and exact duplicates are
    /// refused; only the duplicate case is meant to be shown to the user.
    pub fn with_added(&self, name: &str) -> Result<Self, FormError> {
        let name = name.trim();
        if name.is_empty() {
            return Err(FormError::EmptyTag(T::KIND));
        }
        if self.contains(name) {
            return Err(FormError::DuplicateTag(T::KIND, name.to_string()));
        }
        let mut items = self.items.clone();
        items.push(T::named(name.to_string()));
        Ok(Self { items })
    }

    /// Removes the first tag named `name`.
    pub fn without(&self, name: &str) -> Result<Self, FormError> {
        let pos = self
            .items
            .iter()
            .position(|t| t.name() == name)
            .ok_or_else(|| FormError::UnknownTag(T::KIND, name.to_string()))?;
        let mut items = self.items.clone();
        items.remove(pos);
        Ok(Self { items })
    }

    /// Restores a list from persisted items, dropping blanks and later duplicates.
    pub fn from_items(restored: Vec<T>) -> Self {
        let mut list = Self::default();
        for item in restored {
            let name = item.name().trim();
            if !name.is_empty() && !list.contains(name) {
                list.items.push(item);
            }
        }
        list
    }
}

impl TagList<SkillEntry> {
    pub fn with_level(&self, name: &str, level: i64) -> Result<Self, FormError> {
        let mut items = self.items.clone();
        let skill = items
            .iter_mut()
            .find(|s| s.name == name)
            .ok_or_else(|| FormError::UnknownTag(TagKind::Skills, name.to_string()))?;
        skill.level = clamp_level(level);
        Ok(Self { items })
    }
}
