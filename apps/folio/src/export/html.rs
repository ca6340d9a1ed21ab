//! Standalone HTML page around the last composed preview.

use bytes::Bytes;
use maud::{html, PreEscaped, DOCTYPE};

use super::ExportFile;
use crate::models::FormState;
use crate::preview::PreviewDocument;

pub const FONT_AWESOME_CSS: &str =
    "https://cdnjs.cloudflare.com/ajax/libs/font-awesome/6.4.0/css/all.min.css";
pub const FOOTER_PREFIX: &str = "Generated with Free Resume Generator";

const TEXT_SECONDARY: &str = "#666666";
const BORDER_COLOR: &str = "#e0e0e0";

const NAV_CSS: &str = r#"
.portfolio-navbar { background-color: white; box-shadow: 0 2px 10px rgba(0,0,0,0.1); padding: 15px 0; margin-bottom: 30px; }
.nav-container { max-width: 1200px; margin: 0 auto; padding: 0 20px; display: flex; justify-content: space-between; align-items: center; }
.portfolio-logo { font-size: 1.5rem; font-weight: 700; color: var(--primary-color); text-decoration: none; display: flex; align-items: center; gap: 10px; }
.nav-links { display: flex; list-style: none; gap: 30px; }
.nav-links a { color: var(--text-color); text-decoration: none; font-weight: 500; transition: color 0.3s; }
.nav-links a:hover { color: var(--primary-color); }
.mobile-menu-btn { display: none; background: none; border: none; font-size: 1.5rem; color: var(--text-color); cursor: pointer; }
@media (max-width: 768px) { .nav-links { display: none; } .mobile-menu-btn { display: block; } }
"#;

const PORTFOLIO_CSS: &str = r#"
.generated-portfolio { max-width: 1200px; margin: 0 auto; background: white; border-radius: 10px; overflow: hidden; box-shadow: 0 5px 20px rgba(0,0,0,0.1); }
.portfolio-avatar { width: 120px; height: 120px; background: rgba(255,255,255,0.2); border-radius: 50%; margin: 0 auto 20px; display: flex; align-items: center; justify-content: center; font-size: 3rem; }
.portfolio-name { font-size: 2.5rem; margin-bottom: 10px; }
.portfolio-title { font-size: 1.3rem; opacity: 0.9; margin-bottom: 20px; }
.portfolio-contact { display: flex; justify-content: center; flex-wrap: wrap; gap: 20px; margin-top: 20px; }
.portfolio-section { padding: 30px; border-bottom: 1px solid var(--border-color); }
.portfolio-section:last-child { border-bottom: none; }
.portfolio-section h3 { color: var(--primary-color); margin-bottom: 20px; padding-bottom: 10px; border-bottom: 2px solid var(--border-color); }
.item-header { display: flex; justify-content: space-between; margin-bottom: 10px; }
.item-title { font-weight: 600; font-size: 1.1rem; }
.item-subtitle { color: var(--text-secondary); }
.item-date { color: var(--primary-color); font-weight: 600; }
.skills-list, .hobbies-list { display: flex; flex-wrap: wrap; gap: 10px; margin-top: 10px; }
.skill-tag, .hobby-tag { background: var(--primary-color); color: white; padding: 8px 15px; border-radius: 20px; font-size: 0.9rem; }
.skill-item { margin-bottom: 10px; }
.progress { height: 8px; background: var(--border-color); border-radius: 4px; overflow: hidden; }
.progress > div { height: 100%; background: var(--accent-color); }
.social-links { display: flex; flex-wrap: wrap; gap: 15px; margin-top: 10px; }
.social-links a { color: var(--primary-color); text-decoration: none; padding: 8px 15px; border: 1px solid var(--border-color); border-radius: 5px; transition: all 0.3s; }
@media (max-width: 768px) { body { padding: 10px; } .portfolio-name { font-size: 2rem; } .portfolio-section { padding: 20px; } .item-header { flex-direction: column; gap: 5px; } }
"#;

const NAV_SCRIPT: &str = "document.querySelector('.mobile-menu-btn')?.addEventListener('click', function() { \
    const navLinks = document.querySelector('.nav-links'); \
    navLinks.style.display = navLinks.style.display === 'flex' ? 'none' : 'flex'; });";

/// Google Fonts stylesheet: Poppins when the chosen stack names it, Roboto
/// otherwise.
pub fn google_fonts_url(font_family: &str) -> String {
    let family = if font_family.contains("Poppins") {
        "Poppins"
    } else {
        "Roboto"
    };
    format!("https://fonts.googleapis.com/css2?family={family}:wght@300;400;500;600;700&display=swap")
}

/// `Ada  Lovelace` → `ada-lovelace`. Characters outside letters, digits,
/// `-`, `_` and `.` are dropped.
pub fn slugify(name: &str) -> String {
    name.split_whitespace()
        .collect::<Vec<_>>()
        .join("-")
        .to_lowercase()
        .chars()
        .filter(|c| c.is_alphanumeric() || matches!(c, '-' | '_' | '.'))
        .collect()
}

pub fn html_filename(form: &FormState) -> String {
    let slug = slugify(form.profile.display_name());
    let slug = if slug.trim_matches('-').is_empty() {
        "portfolio".to_string()
    } else {
        slug
    };
    format!("{slug}-portfolio.html")
}

fn stylesheet(form: &FormState) -> String {
    let c = &form.customization;
    let mut css = format!(
        "* {{ margin: 0; padding: 0; box-sizing: border-box; }}\n\
         :root {{ --primary-color: {primary}; --accent-color: {accent}; --bg-color: {bg}; \
         --text-color: {text}; --text-secondary: {TEXT_SECONDARY}; --border-color: {BORDER_COLOR}; }}\n\
         body {{ font-family: {font}; background-color: var(--bg-color); color: var(--text-color); \
         line-height: 1.6; padding: 20px; }}\n\
         .portfolio-header {{ background: linear-gradient(135deg, var(--primary-color), {primary}99); \
         color: white; padding: 40px 20px; text-align: center; }}\n",
        primary = c.primary_color,
        accent = c.accent_color,
        bg = c.background_color,
        text = c.text_color,
        font = c.font_family,
    );
    if form.export.include_navigation {
        css.push_str(NAV_CSS);
    }
    css.push_str(PORTFOLIO_CSS);
    css
}

/// Builds the downloadable page. `year` goes into the footer.
pub fn export_html(preview: &PreviewDocument, form: &FormState, year: i32) -> ExportFile {
    let name = form.profile.display_name();
    let nav = &form.export;

    let page = html! {
        (DOCTYPE)
        html lang="en" {
            head {
                meta charset="UTF-8";
                meta name="viewport" content="width=device-width, initial-scale=1.0";
                title { (name) " - Portfolio" }
                link rel="stylesheet" href=(FONT_AWESOME_CSS);
                link href=(google_fonts_url(&form.customization.font_family)) rel="stylesheet";
                style { (PreEscaped(stylesheet(form))) }
            }
            body {
                @if nav.include_navigation {
                    nav class=(format!("portfolio-navbar {}", nav.nav_style)) {
                        div.nav-container {
                            a.portfolio-logo href="#" { i.fas.fa-file-alt {} " " (name) }
                            button.mobile-menu-btn { i.fas.fa-bars {} }
                            ul.nav-links {
                                @for item in nav.nav_items() {
                                    li {
                                        a href=(format!("#{}", item.id)) {
                                            i class=(item.icon) {} " " (item.label)
                                        }
                                    }
                                }
                            }
                        }
                    }
                }
                main {
                    (PreEscaped(&preview.markup))
                }
                footer style="text-align: center; padding: 30px 20px; color: var(--text-secondary); margin-top: 40px;" {
                    p { (FOOTER_PREFIX) " | " (year) }
                }
                @if nav.include_navigation {
                    script { (PreEscaped(NAV_SCRIPT)) }
                }
            }
        }
    };

    ExportFile {
        filename: html_filename(form),
        content_type: "text/html; charset=utf-8",
        body: Bytes::from(page.into_string()),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::NavItem;
    use crate::preview::{compose, SectionGating};

    fn export(form: &FormState) -> String {
        let preview = compose(form, SectionGating::default());
        let file = export_html(&preview, form, 2026);
        String::from_utf8(file.body.to_vec()).unwrap()
    }

    #[test]
    fn test_slugify() {
        assert_eq!(slugify("Ada   Lovelace"), "ada-lovelace");
        assert_eq!(slugify("O'Brien <dev>"), "obrien-dev");
        assert_eq!(slugify("José Díaz"), "josé-díaz");
    }

    #[test]
    fn test_filename_falls_back_to_placeholder_and_portfolio() {
        let mut form = FormState::default();
        assert_eq!(html_filename(&form), "your-name-portfolio.html");
        form.profile.full_name = "!!!".into();
        assert_eq!(html_filename(&form), "portfolio-portfolio.html");
    }

    #[test]
    fn test_document_shell() {
        let mut form = FormState::default();
        form.profile.full_name = "Ada Lovelace".into();
        let page = export(&form);
        assert!(page.starts_with("<!DOCTYPE html>"));
        assert!(page.contains("<title>Ada Lovelace - Portfolio</title>"));
        assert!(page.contains(FONT_AWESOME_CSS));
        assert!(page.contains("family=Poppins:wght@300;400;500;600;700&amp;display=swap"));
        assert!(page.contains("--primary-color: #4a6fa5;"));
        assert!(page.contains("--text-secondary: #666666;"));
        assert!(page.contains("Generated with Free Resume Generator | 2026"));
        assert!(page.contains(r#"<nav class="portfolio-navbar standard">"#));
        assert!(page.contains(r##"<a href="#experience"><i class="fas fa-briefcase"></i> Experience</a>"##));
        assert!(page.contains(r#"<div class="generated-portfolio template-professional layout-single">"#));
    }

    #[test]
    fn test_navigation_can_be_disabled_or_overridden() {
        let mut form = FormState::default();
        form.export.include_navigation = false;
        let page = export(&form);
        assert!(!page.contains("portfolio-navbar"));
        assert!(!page.contains("<script>"));

        form.export.include_navigation = true;
        form.export.nav_items = Some(vec![NavItem {
            label: "Work".into(),
            id: "projects".into(),
            icon: "fas fa-star".into(),
        }]);
        let page = export(&form);
        assert!(page.contains("Work"));
        assert!(!page.contains("#home"));
    }

    #[test]
    fn test_roboto_for_other_fonts() {
        assert!(google_fonts_url("'Roboto', sans-serif").contains("family=Roboto"));
        assert!(google_fonts_url("Georgia, serif").contains("family=Roboto"));
    }
}
