use std::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::models::FormError;

pub const DEFAULT_FONT_FAMILY: &str = "'Poppins', sans-serif";
pub const DEFAULT_PRIMARY_COLOR: &str = "#4a6fa5";
pub const DEFAULT_ACCENT_COLOR: &str = "#ff7e5f";
pub const DEFAULT_TEXT_COLOR: &str = "#333333";
pub const DEFAULT_BACKGROUND_COLOR: &str = "#ffffff";
pub const DEFAULT_NAV_STYLE: &str = "standard";

// ────────────────────────────────────────────────────────────────────────────
// Templates
// ────────────────────────────────────────────────────────────────────────────

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum TemplateId {
    #[default]
    Professional,
    Modern,
    Creative,
    Minimal,
    Executive,
}

/// Catalog card for a template, as listed in the template gallery.
#[derive(Debug, Clone, Serialize)]
pub struct TemplateInfo {
    pub id: TemplateId,
    pub title: &'static str,
    pub category: &'static str,
    pub description: &'static str,
    pub features: &'static [&'static str],
}

impl TemplateId {
    pub const ALL: [TemplateId; 5] = [
        TemplateId::Professional,
        TemplateId::Modern,
        TemplateId::Creative,
        TemplateId::Minimal,
        TemplateId::Executive,
    ];

    pub fn as_str(self) -> &'static str {
        match self {
            TemplateId::Professional => "professional",
            TemplateId::Modern => "modern",
            TemplateId::Creative => "creative",
            TemplateId::Minimal => "minimal",
            TemplateId::Executive => "executive",
        }
    }

    /// Name shown in the template selector and the preview statistics.
    pub fn display_name(self) -> &'static str {
        match self {
            TemplateId::Professional => "Professional",
            TemplateId::Modern => "Modern",
            TemplateId::Creative => "Creative",
            TemplateId::Minimal => "Minimal",
            TemplateId::Executive => "Executive",
        }
    }

    pub fn info(self) -> TemplateInfo {
        let (title, category, description, features): (_, _, _, &'static [&'static str]) =
            match self {
                TemplateId::Professional => (
                    "Professional Clean",
                    "professional",
                    "Clean and professional layout for corporate jobs",
                    &["ATS Friendly", "Responsive"],
                ),
                TemplateId::Modern => (
                    "Modern Edge",
                    "professional",
                    "Sleek design with modern elements",
                    &["Custom Colors", "Two-Column Option"],
                ),
                TemplateId::Creative => (
                    "Creative Flow",
                    "creative",
                    "Vibrant template for designers and artists",
                    &["Bold Accents", "Image Support"],
                ),
                TemplateId::Minimal => (
                    "Minimalist",
                    "minimal",
                    "Simple and elegant minimal design",
                    &["Fast Load", "Easy Read"],
                ),
                TemplateId::Executive => (
                    "Executive Pro",
                    "executive",
                    "Premium layout for high-level positions",
                    &["Charts", "Linked Sections"],
                ),
            };
        TemplateInfo {
            id: self,
            title,
            category,
            description,
            features,
        }
    }
}

impl FromStr for TemplateId {
    type Err = FormError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        TemplateId::ALL
            .into_iter()
            .find(|t| t.as_str() == s)
            .ok_or_else(|| FormError::InvalidValue {
                field: "templateSelect".to_string(),
                value: s.to_string(),
            })
    }
}

pub fn template_catalog() -> Vec<TemplateInfo> {
    TemplateId::ALL.into_iter().map(TemplateId::info).collect()
}

// ────────────────────────────────────────────────────────────────────────────
// Layout
// ────────────────────────────────────────────────────────────────────────────

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum LayoutMode {
    #[default]
    Single,
    TwoColumn,
}

impl LayoutMode {
    pub fn as_str(self) -> &'static str {
        match self {
            LayoutMode::Single => "single",
            LayoutMode::TwoColumn => "two-column",
        }
    }
}

impl FromStr for LayoutMode {
    type Err = FormError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "single" => Ok(LayoutMode::Single),
            "two-column" => Ok(LayoutMode::TwoColumn),
            other => Err(FormError::InvalidValue {
                field: "layoutStyle".to_string(),
                value: other.to_string(),
            }),
        }
    }
}

// ────────────────────────────────────────────────────────────────────────────
// Options
// ────────────────────────────────────────────────────────────────────────────

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CustomizationOptions {
    pub template: TemplateId,
    pub font_family: String,
    pub primary_color: String,
    pub accent_color: String,
    pub text_color: String,
    pub background_color: String,
    pub layout: LayoutMode,
    pub show_photo: bool,
    pub show_social: bool,
    pub show_skills_chart: bool,
    pub show_references: bool,
    pub show_hobbies: bool,
}

impl Default for CustomizationOptions {
    fn default() -> Self {
        Self {
            template: TemplateId::default(),
            font_family: DEFAULT_FONT_FAMILY.to_string(),
            primary_color: DEFAULT_PRIMARY_COLOR.to_string(),
            accent_color: DEFAULT_ACCENT_COLOR.to_string(),
            text_color: DEFAULT_TEXT_COLOR.to_string(),
            background_color: DEFAULT_BACKGROUND_COLOR.to_string(),
            layout: LayoutMode::default(),
            show_photo: true,
            show_social: true,
            show_skills_chart: true,
            show_references: true,
            show_hobbies: true,
        }
    }
}

impl CustomizationOptions {
    /// Inline style for the preview container. Values are validated on entry,
    /// so they can be substituted without further escaping.
    pub fn container_style(&self) -> String {
        format!(
            "font-family: {}; color: {}; background-color: {}; --primary-color: {}; --accent-color: {};",
            self.font_family,
            self.text_color,
            self.background_color,
            self.primary_color,
            self.accent_color
        )
    }
}

/// A navigation anchor in the exported HTML page.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct NavItem {
    pub label: String,
    pub id: String,
    pub icon: String,
}

impl NavItem {
    fn new(label: &str, id: &str, icon: &str) -> Self {
        Self {
            label: label.to_string(),
            id: id.to_string(),
            icon: icon.to_string(),
        }
    }

    /// `id` ends up in a fragment link and `icon` in a class attribute.
    /// `index` only names the offending field in the error.
    pub fn check(&self, index: usize) -> Result<(), FormError> {
        let invalid = |field: &str, value: &str| FormError::InvalidValue {
            field: format!("navItems.{index}.{field}"),
            value: value.to_string(),
        };
        if self.label.trim().is_empty() {
            return Err(invalid("label", &self.label));
        }
        if !is_safe_class_name(&self.id) {
            return Err(invalid("id", &self.id));
        }
        if !is_safe_class_list(&self.icon) {
            return Err(invalid("icon", &self.icon));
        }
        Ok(())
    }
}

pub fn default_nav_items() -> Vec<NavItem> {
    vec![
        NavItem::new("Home", "home", "fas fa-home"),
        NavItem::new("About", "about", "fas fa-user"),
        NavItem::new("Experience", "experience", "fas fa-briefcase"),
        NavItem::new("Projects", "projects", "fas fa-project-diagram"),
        NavItem::new("Contact", "contact", "fas fa-envelope"),
    ]
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ExportOptions {
    pub include_navigation: bool,
    pub nav_style: String,
    /// Overrides the five default anchors when set.
    #[serde(default)]
    pub nav_items: Option<Vec<NavItem>>,
}

impl Default for ExportOptions {
    fn default() -> Self {
        Self {
            include_navigation: true,
            nav_style: DEFAULT_NAV_STYLE.to_string(),
            nav_items: None,
        }
    }
}

impl ExportOptions {
    pub fn nav_items(&self) -> Vec<NavItem> {
        self.nav_items.clone().unwrap_or_else(default_nav_items)
    }
}

/// Light/dark appearance of the editor, stored apart from the form data.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Theme {
    #[default]
    Light,
    Dark,
}

impl Theme {
    pub fn as_str(self) -> &'static str {
        match self {
            Theme::Light => "light",
            Theme::Dark => "dark",
        }
    }
}

impl FromStr for Theme {
    type Err = FormError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "light" => Ok(Theme::Light),
            "dark" => Ok(Theme::Dark),
            other => Err(FormError::InvalidValue {
                field: "theme".to_string(),
                value: other.to_string(),
            }),
        }
    }
}

// ────────────────────────────────────────────────────────────────────────────
// Value checks
// ────────────────────────────────────────────────────────────────────────────

/// `#rgb` or `#rrggbb`.
pub fn is_hex_color(value: &str) -> bool {
    let Some(hex) = value.strip_prefix('#') else {
        return false;
    };
    matches!(hex.len(), 3 | 6) && hex.chars().all(|c| c.is_ascii_hexdigit())
}

/// Font stacks end up inside a `<style>` block and a `style` attribute.
pub fn is_safe_font_family(value: &str) -> bool {
    !value.trim().is_empty() && !value.contains(['<', '>', '{', '}', ';', '"'])
}

/// Navigation style becomes a class name.
pub fn is_safe_class_name(value: &str) -> bool {
    !value.is_empty()
        && value
            .chars()
            .all(|c| c.is_ascii_alphanumeric() || c == '-' || c == '_')
}

/// Space-separated class names, e.g. `fas fa-briefcase`.
pub fn is_safe_class_list(value: &str) -> bool {
    let mut classes = value.split_whitespace().peekable();
    classes.peek().is_some() && classes.all(is_safe_class_name)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults_match_form_defaults() {
        let c = CustomizationOptions::default();
        assert_eq!(c.template, TemplateId::Professional);
        assert_eq!(c.primary_color, "#4a6fa5");
        assert_eq!(c.layout, LayoutMode::Single);
        assert!(c.show_references);
        assert!(c.show_skills_chart);
    }

    #[test]
    fn test_template_parse_and_display() {
        let t: TemplateId = "executive".parse().unwrap();
        assert_eq!(t.display_name(), "Executive");
        assert!("fancy".parse::<TemplateId>().is_err());
    }

    #[test]
    fn test_catalog_lists_five_templates() {
        let catalog = template_catalog();
        assert_eq!(catalog.len(), 5);
        assert_eq!(catalog[0].title, "Professional Clean");
        assert_eq!(catalog[2].category, "creative");
    }

    #[test]
    fn test_layout_parse() {
        assert_eq!("two-column".parse::<LayoutMode>().unwrap(), LayoutMode::TwoColumn);
        assert!("grid".parse::<LayoutMode>().is_err());
    }

    #[test]
    fn test_hex_colors() {
        assert!(is_hex_color("#fff"));
        assert!(is_hex_color("#4a6fa5"));
        assert!(!is_hex_color("4a6fa5"));
        assert!(!is_hex_color("#4a6fa"));
        assert!(!is_hex_color("red; background: url(x)"));
    }

    #[test]
    fn test_font_family_rejects_style_breakout() {
        assert!(is_safe_font_family("'Roboto', sans-serif"));
        assert!(!is_safe_font_family("x</style><script>"));
        assert!(!is_safe_font_family("a; color: red"));
    }

    #[test]
    fn test_default_nav_items() {
        let labels: Vec<_> = ExportOptions::default()
            .nav_items()
            .into_iter()
            .map(|n| n.label)
            .collect();
        assert_eq!(labels, ["Home", "About", "Experience", "Projects", "Contact"]);
    }

    #[test]
    fn test_nav_item_check() {
        let item = NavItem::new("Work", "work", "fas fa-briefcase");
        assert!(item.check(0).is_ok());

        let bad_id = NavItem::new("Work", "work\" onclick=\"x", "fas fa-briefcase");
        let err = bad_id.check(2).unwrap_err();
        assert!(matches!(err, FormError::InvalidValue { ref field, .. } if field == "navItems.2.id"));

        let bad_icon = NavItem::new("Work", "work", "fas\"><script>");
        assert!(bad_icon.check(0).is_err());
        assert!(NavItem::new("  ", "work", "fas fa-home").check(0).is_err());
        assert!(!is_safe_class_list("   "));
    }

    #[test]
    fn test_theme_parse() {
        assert_eq!("dark".parse::<Theme>().unwrap(), Theme::Dark);
        assert_eq!(Theme::default().as_str(), "light");
        assert!("sepia".parse::<Theme>().is_err());
    }

    #[test]
    fn test_container_style_carries_custom_properties() {
        let style = CustomizationOptions::default().container_style();
        assert!(style.contains("--primary-color: #4a6fa5;"));
        assert!(style.contains("--accent-color: #ff7e5f;"));
        assert!(style.contains("background-color: #ffffff;"));
    }
}
