//! Renders the form into portfolio markup with maud. Rendering is a pure
//! function of `FormState`: the same state always yields the same bytes.

use maud::{html, Markup};

use super::{text, PreviewDocument, PreviewStats, SectionGating};
use crate::models::{
    CertificationEntry, EducationEntry, ExperienceEntry, FormState, HobbyEntry, ProfileRecord,
    ProjectEntry, Section, SectionEntry, SkillEntry,
};

const SECTION_SELECTOR: &str = ".portfolio-section";

pub fn compose(form: &FormState, gating: SectionGating) -> PreviewDocument {
    let markup = render(form, gating).into_string();
    let stats = PreviewStats {
        sections: text::count_matching(&markup, SECTION_SELECTOR) + 1,
        words: text::word_count(&markup),
        template: form.customization.template.display_name().to_string(),
    };
    PreviewDocument {
        markup,
        stats,
        container_style: form.customization.container_style(),
    }
}

fn render(form: &FormState, gating: SectionGating) -> Markup {
    let p = &form.profile;
    let c = &form.customization;
    let root_class = format!(
        "generated-portfolio template-{} layout-{}",
        c.template.as_str(),
        c.layout.as_str()
    );
    let summary = p.summary.trim();

    html! {
        div class=(root_class) {
            (header(p, c.show_photo))
            @if !summary.is_empty() {
                div.portfolio-section id="about" {
                    (heading("fas fa-user", "Professional Summary"))
                    p { (summary) }
                }
            }
            @if let Some(entries) = visible_entries(&form.education, gating) {
                div.portfolio-section id="education" {
                    (heading("fas fa-graduation-cap", "Education"))
                    @for entry in entries { (education_item(entry)) }
                }
            }
            @if let Some(entries) = visible_entries(&form.experience, gating) {
                div.portfolio-section id="experience" {
                    (heading("fas fa-briefcase", "Experience"))
                    @for entry in entries { (experience_item(entry)) }
                }
            }
            @if !form.skills.is_empty() {
                div.portfolio-section id="skills" {
                    (heading("fas fa-code", "Skills"))
                    (skills(form.skills.items(), c.show_skills_chart))
                }
            }
            @if let Some(entries) = visible_entries(&form.projects, gating) {
                div.portfolio-section id="projects" {
                    (heading("fas fa-project-diagram", "Projects"))
                    @for entry in entries { (project_item(entry)) }
                }
            }
            @if let Some(entries) = visible_entries(&form.certifications, gating) {
                div.portfolio-section id="certifications" {
                    (heading("fas fa-certificate", "Certifications"))
                    @for entry in entries { (certification_item(entry)) }
                }
            }
            @if c.show_hobbies && !form.hobbies.is_empty() {
                div.portfolio-section id="hobbies" {
                    (heading("fas fa-heart", "Hobbies & Interests"))
                    (hobbies(form.hobbies.items()))
                }
            }
            @if c.show_references {
                div.portfolio-section id="references" {
                    (heading("fas fa-users", "References"))
                    p { "Available upon request." }
                }
            }
            @if c.show_social && p.has_links() {
                div.portfolio-section id="contact" {
                    (heading("fas fa-share-alt", "Connect With Me"))
                    (social_links(p))
                }
            }
        }
    }
}

/// Entries to render for a section, or `None` when the section is hidden.
fn visible_entries<T: SectionEntry>(
    section: &Section<T>,
    gating: SectionGating,
) -> Option<Vec<&T>> {
    let shown = match gating {
        SectionGating::RepresentativeEntry => {
            !section.representative().primary().trim().is_empty()
        }
        SectionGating::AnyEntry => section.entries().iter().any(T::is_renderable),
    };
    shown.then(|| section.entries().iter().filter(|e| e.is_renderable()).collect())
}

fn or_fallback<'a>(value: &'a str, fallback: &'a str) -> &'a str {
    if value.is_empty() {
        fallback
    } else {
        value
    }
}

/// Link targets are user input; script-capable schemes are never emitted.
fn safe_href(url: &str) -> Option<&str> {
    let url = url.trim();
    let lower = url.to_ascii_lowercase();
    let blocked = ["javascript:", "data:", "vbscript:"]
        .iter()
        .any(|scheme| lower.starts_with(scheme));
    (!url.is_empty() && !blocked).then_some(url)
}

fn heading(icon: &str, title: &str) -> Markup {
    html! {
        h3 { i class=(icon) {} " " (title) }
    }
}

fn header(p: &ProfileRecord, show_photo: bool) -> Markup {
    let phone = p.phone.trim();
    let address = p.address.trim();
    html! {
        div.portfolio-header id="home" {
            @if show_photo {
                div.portfolio-avatar { i.fas.fa-user {} }
            }
            h1.portfolio-name { (p.display_name()) }
            h2.portfolio-title { (p.display_profession()) }
            div.portfolio-contact {
                div { i.fas.fa-envelope {} " " (p.display_email()) }
                @if !phone.is_empty() {
                    div { i.fas.fa-phone {} " " (phone) }
                }
                @if !address.is_empty() {
                    div { i.fas.fa-map-marker-alt {} " " (address) }
                }
            }
        }
    }
}

fn subtitle(primary: &str, location: &str) -> Markup {
    html! {
        (primary)
        @if !location.is_empty() { " , " (location) }
    }
}

fn education_item(e: &EducationEntry) -> Markup {
    let description = e.description.trim();
    html! {
        div.education-item {
            div.item-header {
                div {
                    div.item-title { (or_fallback(e.degree.trim(), "Degree")) }
                    div.item-subtitle {
                        (subtitle(or_fallback(e.institution.trim(), "Institution"), e.location.trim()))
                    }
                }
                @if !e.year.is_empty() {
                    div.item-date { (e.year) }
                }
            }
            @if !description.is_empty() {
                p { (description) }
            }
        }
    }
}

fn experience_item(e: &ExperienceEntry) -> Markup {
    let description = e.description.trim();
    html! {
        div.experience-item {
            div.item-header {
                div {
                    div.item-title { (or_fallback(e.title.trim(), "Job Title")) }
                    div.item-subtitle {
                        (subtitle(or_fallback(e.company.trim(), "Company"), e.location.trim()))
                    }
                }
                div.item-date {
                    (e.start) " - "
                    @if e.current { "Present" } @else { (e.end) }
                }
            }
            @if !description.is_empty() {
                p {
                    @for (i, line) in description.lines().enumerate() {
                        @if i > 0 { br; }
                        (line)
                    }
                }
            }
        }
    }
}

fn skills(items: &[SkillEntry], as_chart: bool) -> Markup {
    html! {
        @if as_chart {
            div.skills-progress {
                @for skill in items {
                    div.skill-item {
                        span { (skill.name) }
                        div.progress {
                            div style=(format!("width: {}%", u32::from(skill.level) * 20)) {}
                        }
                    }
                }
            }
        } @else {
            div.skills-list {
                @for skill in items {
                    span.skill-tag { (skill.name) }
                }
            }
        }
    }
}

fn project_item(e: &ProjectEntry) -> Markup {
    let description = e.description.trim();
    html! {
        div.project-item {
            div.item-header {
                div.item-title { (e.name.trim()) }
                @if let Some(href) = safe_href(&e.url) {
                    a href=(href) target="_blank" { i.fas.fa-link {} " View Project" }
                }
            }
            @if !description.is_empty() {
                p { (description) }
            }
        }
    }
}

fn certification_item(e: &CertificationEntry) -> Markup {
    html! {
        div.certification-item {
            div.item-header {
                div.item-title { (e.name.trim()) }
                div.item-subtitle { (e.organization.trim()) }
            }
            @if !e.date.is_empty() {
                div.item-date { (e.date) }
            }
        }
    }
}

fn hobbies(items: &[HobbyEntry]) -> Markup {
    html! {
        div.hobbies-list {
            @for hobby in items {
                span.hobby-tag { (hobby.name) }
            }
        }
    }
}

fn social_links(p: &ProfileRecord) -> Markup {
    let links = [
        (&p.linkedin, "fab fa-linkedin", "LinkedIn"),
        (&p.github, "fab fa-github", "GitHub"),
        (&p.website, "fas fa-globe", "Website"),
        (&p.twitter, "fab fa-twitter", "Twitter"),
    ];
    html! {
        div.social-links {
            @for (url, icon, label) in links {
                @if let Some(href) = safe_href(url) {
                    a href=(href) target="_blank" { i class=(icon) {} " " (label) }
                }
            }
        }
    }
}
