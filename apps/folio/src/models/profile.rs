use std::sync::OnceLock;

use regex::Regex;
use serde::{Deserialize, Serialize};

pub const PLACEHOLDER_NAME: &str = "Your Name";
pub const PLACEHOLDER_PROFESSION: &str = "Your Profession";
pub const PLACEHOLDER_EMAIL: &str = "email@example.com";

/// Personal block of the form. Every field is free text; only `email` is
/// checked, and only when the wizard validates step 1.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ProfileRecord {
    pub full_name: String,
    pub profession: String,
    pub email: String,
    pub phone: String,
    pub address: String,
    pub summary: String,
    pub linkedin: String,
    pub github: String,
    pub website: String,
    pub twitter: String,
}

impl ProfileRecord {
    pub fn display_name(&self) -> &str {
        non_empty_or(&self.full_name, PLACEHOLDER_NAME)
    }

    pub fn display_profession(&self) -> &str {
        non_empty_or(&self.profession, PLACEHOLDER_PROFESSION)
    }

    pub fn display_email(&self) -> &str {
        non_empty_or(&self.email, PLACEHOLDER_EMAIL)
    }

    /// True when at least one social/network link is filled in.
    pub fn has_links(&self) -> bool {
        [&self.linkedin, &self.github, &self.website, &self.twitter]
            .iter()
            .any(|l| !l.is_empty())
    }
}

fn non_empty_or<'a>(value: &'a str, placeholder: &'a str) -> &'a str {
    if value.is_empty() {
        placeholder
    } else {
        value
    }
}

/// `local@domain.tld` with no whitespace and no second `@`.
pub fn is_valid_email(email: &str) -> bool {
    static EMAIL: OnceLock<Regex> = OnceLock::new();
    EMAIL
        .get_or_init(|| Regex::new(r"^[^\s@]+@[^\s@]+\.[^\s@]+$").expect("static email pattern"))
        .is_match(email)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_placeholders_for_empty_fields() {
        let p = ProfileRecord::default();
        assert_eq!(p.display_name(), "Your Name");
        assert_eq!(p.display_profession(), "Your Profession");
        assert_eq!(p.display_email(), "email@example.com");
    }

    #[test]
    fn test_supplied_values_win_over_placeholders() {
        let p = ProfileRecord {
            full_name: "Ada Lovelace".into(),
            profession: "Analyst".into(),
            ..Default::default()
        };
        assert_eq!(p.display_name(), "Ada Lovelace");
        assert_eq!(p.display_profession(), "Analyst");
    }

    #[test]
    fn test_valid_emails() {
        assert!(is_valid_email("john.smith@example.com"));
        assert!(is_valid_email("a@b.c"));
        assert!(is_valid_email("first+tag@sub.domain.io"));
    }

    #[test]
    fn test_invalid_emails() {
        assert!(!is_valid_email(""));
        assert!(!is_valid_email("plainaddress"));
        assert!(!is_valid_email("no-tld@example"));
        assert!(!is_valid_email("two@@example.com"));
        assert!(!is_valid_email("white space@example.com"));
        assert!(!is_valid_email("a@.c"));
    }

    #[test]
    fn test_has_links() {
        let mut p = ProfileRecord::default();
        assert!(!p.has_links());
        p.github = "https://github.com/ada".into();
        assert!(p.has_links());
    }
}
