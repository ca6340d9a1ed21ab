//! Field Store: typed get/set for the labeled inputs of the form, plus the
//! flat `field id → value` map the form is persisted as.
//!
//! Fixed inputs use the ids of the browser form (`fullName`, `templateColor`,
//! `showHobbies`, ...). Repeatable entries and tags are flattened into dotted
//! keys: `experience.0.title`, `skills.1.level`, `hobbies.0.name`,
//! `navItems.0.icon`.

use std::collections::BTreeMap;
use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};
use tracing::warn;

use crate::models::customization::{is_hex_color, is_safe_class_name, is_safe_font_family};
use crate::models::tags::{clamp_level, DEFAULT_SKILL_LEVEL};
use crate::models::{
    FieldValue, FormError, FormState, HobbyEntry, NavItem, Section, SectionEntry, SkillEntry,
    TagList,
};

pub type FieldMap = BTreeMap<String, FieldValue>;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum FieldId {
    FullName,
    Profession,
    Email,
    Phone,
    Address,
    Summary,
    Linkedin,
    Github,
    Website,
    Twitter,
    TemplateSelect,
    FontFamily,
    TemplateColor,
    AccentColor,
    TextColor,
    BackgroundColor,
    LayoutStyle,
    ShowPhoto,
    ShowSocial,
    ShowSkillsChart,
    ShowReferences,
    ShowHobbies,
    IncludeNavigation,
    NavStyle,
}

impl FieldId {
    pub const ALL: [FieldId; 24] = [
        FieldId::FullName,
        FieldId::Profession,
        FieldId::Email,
        FieldId::Phone,
        FieldId::Address,
        FieldId::Summary,
        FieldId::Linkedin,
        FieldId::Github,
        FieldId::Website,
        FieldId::Twitter,
        FieldId::TemplateSelect,
        FieldId::FontFamily,
        FieldId::TemplateColor,
        FieldId::AccentColor,
        FieldId::TextColor,
        FieldId::BackgroundColor,
        FieldId::LayoutStyle,
        FieldId::ShowPhoto,
        FieldId::ShowSocial,
        FieldId::ShowSkillsChart,
        FieldId::ShowReferences,
        FieldId::ShowHobbies,
        FieldId::IncludeNavigation,
        FieldId::NavStyle,
    ];

    pub fn as_str(self) -> &'static str {
        match self {
            FieldId::FullName => "fullName",
            FieldId::Profession => "profession",
            FieldId::Email => "email",
            FieldId::Phone => "phone",
            FieldId::Address => "address",
            FieldId::Summary => "summary",
            FieldId::Linkedin => "linkedin",
            FieldId::Github => "github",
            FieldId::Website => "website",
            FieldId::Twitter => "twitter",
            FieldId::TemplateSelect => "templateSelect",
            FieldId::FontFamily => "fontFamily",
            FieldId::TemplateColor => "templateColor",
            FieldId::AccentColor => "accentColor",
            FieldId::TextColor => "textColor",
            FieldId::BackgroundColor => "backgroundColor",
            FieldId::LayoutStyle => "layoutStyle",
            FieldId::ShowPhoto => "showPhoto",
            FieldId::ShowSocial => "showSocial",
            FieldId::ShowSkillsChart => "showSkillsChart",
            FieldId::ShowReferences => "showReferences",
            FieldId::ShowHobbies => "showHobbies",
            FieldId::IncludeNavigation => "includeNavigation",
            FieldId::NavStyle => "navStyle",
        }
    }

    pub fn is_checkbox(self) -> bool {
        matches!(
            self,
            FieldId::ShowPhoto
                | FieldId::ShowSocial
                | FieldId::ShowSkillsChart
                | FieldId::ShowReferences
                | FieldId::ShowHobbies
                | FieldId::IncludeNavigation
        )
    }

    /// Typed text inputs. Edits to these re-render the preview after the
    /// debounce window; selects, pickers and checkboxes re-render at once.
    pub fn is_free_text(self) -> bool {
        matches!(
            self,
            FieldId::FullName
                | FieldId::Profession
                | FieldId::Email
                | FieldId::Phone
                | FieldId::Address
                | FieldId::Summary
                | FieldId::Linkedin
                | FieldId::Github
                | FieldId::Website
                | FieldId::Twitter
        )
    }
}

impl FromStr for FieldId {
    type Err = FormError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        FieldId::ALL
            .into_iter()
            .find(|id| id.as_str() == s)
            .ok_or_else(|| FormError::UnknownField(s.to_string()))
    }
}

impl fmt::Display for FieldId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Entry text fields are debounced like the fixed text inputs; the
/// "currently working" checkbox is not.
pub fn is_free_text_entry_field(field: &str) -> bool {
    field != "current"
}

// ────────────────────────────────────────────────────────────────────────────
// Get / set
// ────────────────────────────────────────────────────────────────────────────

pub fn get_field(form: &FormState, id: FieldId) -> FieldValue {
    let p = &form.profile;
    let c = &form.customization;
    let text = |s: &str| FieldValue::Text(s.to_string());
    match id {
        FieldId::FullName => text(&p.full_name),
        FieldId::Profession => text(&p.profession),
        FieldId::Email => text(&p.email),
        FieldId::Phone => text(&p.phone),
        FieldId::Address => text(&p.address),
        FieldId::Summary => text(&p.summary),
        FieldId::Linkedin => text(&p.linkedin),
        FieldId::Github => text(&p.github),
        FieldId::Website => text(&p.website),
        FieldId::Twitter => text(&p.twitter),
        FieldId::TemplateSelect => text(c.template.as_str()),
        FieldId::FontFamily => text(&c.font_family),
        FieldId::TemplateColor => text(&c.primary_color),
        FieldId::AccentColor => text(&c.accent_color),
        FieldId::TextColor => text(&c.text_color),
        FieldId::BackgroundColor => text(&c.background_color),
        FieldId::LayoutStyle => text(c.layout.as_str()),
        FieldId::ShowPhoto => FieldValue::Flag(c.show_photo),
        FieldId::ShowSocial => FieldValue::Flag(c.show_social),
        FieldId::ShowSkillsChart => FieldValue::Flag(c.show_skills_chart),
        FieldId::ShowReferences => FieldValue::Flag(c.show_references),
        FieldId::ShowHobbies => FieldValue::Flag(c.show_hobbies),
        FieldId::IncludeNavigation => FieldValue::Flag(form.export.include_navigation),
        FieldId::NavStyle => text(&form.export.nav_style),
    }
}

pub fn set_field(form: &FormState, id: FieldId, value: FieldValue) -> Result<FormState, FormError> {
    let mut next = form.clone();
    let name = id.as_str();

    if id.is_checkbox() {
        let flag = value.into_flag(name)?;
        let c = &mut next.customization;
        match id {
            FieldId::ShowPhoto => c.show_photo = flag,
            FieldId::ShowSocial => c.show_social = flag,
            FieldId::ShowSkillsChart => c.show_skills_chart = flag,
            FieldId::ShowReferences => c.show_references = flag,
            FieldId::ShowHobbies => c.show_hobbies = flag,
            FieldId::IncludeNavigation => next.export.include_navigation = flag,
            _ => unreachable!("is_checkbox covers exactly the flag fields"),
        }
        return Ok(next);
    }

    let text = value.into_text(name)?;
    let invalid = |text: &str| FormError::InvalidValue {
        field: name.to_string(),
        value: text.to_string(),
    };
    let p = &mut next.profile;
    let c = &mut next.customization;
    match id {
        FieldId::FullName => p.full_name = text,
        FieldId::Profession => p.profession = text,
        FieldId::Email => p.email = text,
        FieldId::Phone => p.phone = text,
        FieldId::Address => p.address = text,
        FieldId::Summary => p.summary = text,
        FieldId::Linkedin => p.linkedin = text,
        FieldId::Github => p.github = text,
        FieldId::Website => p.website = text,
        FieldId::Twitter => p.twitter = text,
        FieldId::TemplateSelect => c.template = text.parse()?,
        FieldId::LayoutStyle => c.layout = text.parse()?,
        FieldId::FontFamily => {
            if !is_safe_font_family(&text) {
                return Err(invalid(&text));
            }
            c.font_family = text;
        }
        FieldId::TemplateColor
        | FieldId::AccentColor
        | FieldId::TextColor
        | FieldId::BackgroundColor => {
            if !is_hex_color(&text) {
                return Err(invalid(&text));
            }
            let slot = match id {
                FieldId::TemplateColor => &mut c.primary_color,
                FieldId::AccentColor => &mut c.accent_color,
                FieldId::TextColor => &mut c.text_color,
                _ => &mut c.background_color,
            };
            *slot = text.to_lowercase();
        }
        FieldId::NavStyle => {
            if !is_safe_class_name(&text) {
                return Err(invalid(&text));
            }
            next.export.nav_style = text;
        }
        _ => unreachable!("checkbox fields handled above"),
    }
    Ok(next)
}

// ────────────────────────────────────────────────────────────────────────────
// Persisted field map
// ────────────────────────────────────────────────────────────────────────────

/// Flattens the form into the persisted `field id → value` map.
pub fn to_field_map(form: &FormState) -> FieldMap {
    let mut map = FieldMap::new();
    for id in FieldId::ALL {
        map.insert(id.as_str().to_string(), get_field(form, id));
    }
    flatten_section(&mut map, &form.education);
    flatten_section(&mut map, &form.experience);
    flatten_section(&mut map, &form.projects);
    flatten_section(&mut map, &form.certifications);
    for (i, skill) in form.skills.items().iter().enumerate() {
        map.insert(format!("skills.{i}.name"), skill.name.as_str().into());
        map.insert(format!("skills.{i}.level"), skill.level.to_string().into());
    }
    for (i, hobby) in form.hobbies.items().iter().enumerate() {
        map.insert(format!("hobbies.{i}.name"), hobby.name.as_str().into());
    }
    for (i, item) in form.export.nav_items.iter().flatten().enumerate() {
        map.insert(format!("navItems.{i}.label"), item.label.as_str().into());
        map.insert(format!("navItems.{i}.id"), item.id.as_str().into());
        map.insert(format!("navItems.{i}.icon"), item.icon.as_str().into());
    }
    map
}

fn flatten_section<T: SectionEntry>(map: &mut FieldMap, section: &Section<T>) {
    for (i, entry) in section.entries().iter().enumerate() {
        for field in T::FIELDS {
            if let Some(value) = entry.get(field) {
                map.insert(format!("{}.{i}.{field}", T::KIND), value);
            }
        }
    }
}

/// Rebuilds a form from a persisted map, applied wholesale over the defaults.
/// Unknown keys and values that no longer validate are skipped.
pub fn from_field_map(map: &FieldMap) -> FormState {
    let mut form = FormState::default();
    for id in FieldId::ALL {
        if let Some(value) = map.get(id.as_str()) {
            match set_field(&form, id, value.clone()) {
                Ok(next) => form = next,
                Err(e) => warn!(field = id.as_str(), error = %e, "Skipping persisted field"),
            }
        }
    }

    form.education = restore_section(map);
    form.experience = restore_section(map);
    form.projects = restore_section(map);
    form.certifications = restore_section(map);

    let skills: Vec<SkillEntry> = indexed_groups(map, "skills")
        .into_values()
        .filter_map(|fields| {
            let name = text_of(fields.get("name")?)?;
            let level = fields
                .get("level")
                .and_then(|v| text_of(v))
                .and_then(|l| l.parse::<i64>().ok())
                .map(clamp_level)
                .unwrap_or(DEFAULT_SKILL_LEVEL);
            Some(SkillEntry { name, level })
        })
        .collect();
    form.skills = TagList::from_items(skills);

    let hobbies: Vec<HobbyEntry> = indexed_groups(map, "hobbies")
        .into_values()
        .filter_map(|fields| Some(HobbyEntry { name: text_of(fields.get("name")?)? }))
        .collect();
    form.hobbies = TagList::from_items(hobbies);

    let nav_items: Vec<NavItem> = indexed_groups(map, "navItems")
        .into_iter()
        .filter_map(|(i, fields)| {
            let item = NavItem {
                label: text_of(fields.get("label")?)?,
                id: text_of(fields.get("id")?)?,
                icon: text_of(fields.get("icon")?)?,
            };
            match item.check(i) {
                Ok(()) => Some(item),
                Err(e) => {
                    warn!(error = %e, "Skipping persisted nav item");
                    None
                }
            }
        })
        .collect();
    if !nav_items.is_empty() {
        form.export.nav_items = Some(nav_items);
    }

    form
}

fn restore_section<T: SectionEntry>(map: &FieldMap) -> Section<T> {
    let entries = indexed_groups(map, T::KIND.as_str())
        .into_values()
        .map(|fields| {
            let mut entry = T::default();
            for (field, value) in fields {
                if let Err(e) = entry.set(field, value.clone()) {
                    warn!(section = T::KIND.as_str(), field, error = %e, "Skipping persisted entry field");
                }
            }
            entry
        })
        .collect();
    Section::from_entries(entries)
}

/// Groups `prefix.{index}.{field}` keys by index, in index order.
fn indexed_groups<'a>(
    map: &'a FieldMap,
    prefix: &str,
) -> BTreeMap<usize, BTreeMap<&'a str, &'a FieldValue>> {
    let mut groups: BTreeMap<usize, BTreeMap<&str, &FieldValue>> = BTreeMap::new();
    for (key, value) in map {
        let Some(rest) = key.strip_prefix(prefix).and_then(|r| r.strip_prefix('.')) else {
            continue;
        };
        let Some((index, field)) = rest.split_once('.') else {
            continue;
        };
        if let Ok(index) = index.parse::<usize>() {
            groups.entry(index).or_default().insert(field, value);
        }
    }
    groups
}

fn text_of(value: &FieldValue) -> Option<String> {
    match value {
        FieldValue::Text(s) => Some(s.clone()),
        FieldValue::Flag(_) => None,
    }
}
