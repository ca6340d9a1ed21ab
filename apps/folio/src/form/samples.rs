//! Example profiles that fill the form with a ready-made persona.

use std::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::models::{FormError, FormState};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Sample {
    Developer,
    Designer,
    Marketing,
}

impl Sample {
    pub const ALL: [Sample; 3] = [Sample::Developer, Sample::Designer, Sample::Marketing];

    pub fn as_str(self) -> &'static str {
        match self {
            Sample::Developer => "developer",
            Sample::Designer => "designer",
            Sample::Marketing => "marketing",
        }
    }

    pub fn loaded_message(self) -> String {
        let title = match self {
            Sample::Developer => "Developer",
            Sample::Designer => "Designer",
            Sample::Marketing => "Marketing",
        };
        format!("{title} example loaded!")
    }

    /// Overwrites the persona fields and the first entry of the section the
    /// persona showcases. Everything else is left as it was.
    pub fn apply(self, form: &FormState) -> FormState {
        let mut next = form.clone();
        let p = &mut next.profile;
        match self {
            Sample::Developer => {
                p.full_name = "John Smith".into();
                p.profession = "Full Stack Developer".into();
                p.email = "john.smith@example.com".into();
                p.phone = "+1 (234) 567-8900".into();
                p.summary = "Experienced full-stack developer with expertise in JavaScript, React, \
                             Node.js, and cloud platforms. Passionate about creating efficient, \
                             scalable web applications."
                    .into();

                let mut edu = form.education.representative().clone();
                edu.degree = "Bachelor of Computer Science".into();
                edu.institution = "University of Technology".into();
                edu.year = "2020".into();
                next.education = form.education.with_first(edu);

                let mut job = form.experience.representative().clone();
                job.title = "Frontend Developer".into();
                job.company = "Tech Solutions Inc.".into();
                job.start = "2018-01".into();
                job.end = "2022-12".into();
                job.current = false;
                next.experience = form.experience.with_first(job);
            }
            Sample::Designer => {
                p.full_name = "Sarah Johnson".into();
                p.profession = "Graphic Designer".into();
                p.email = "sarah.johnson@example.com".into();
                p.phone = "+1 (987) 654-3210".into();
                p.summary = "Creative graphic designer with 8+ years of experience in branding, \
                             UI/UX design, and digital marketing. Skilled in Adobe Creative Suite \
                             and modern design tools."
                    .into();

                let mut project = form.projects.representative().clone();
                project.name = "Brand Identity Project".into();
                project.url = "https://example.com".into();
                next.projects = form.projects.with_first(project);
            }
            Sample::Marketing => {
                p.full_name = "Michael Chen".into();
                p.profession = "Digital Marketing Specialist".into();
                p.email = "michael.chen@example.com".into();
                p.phone = "+1 (555) 123-7890".into();
                p.summary = "Results-driven marketing professional with expertise in SEO, social \
                             media marketing, and content strategy. Proven track record of \
                             increasing brand visibility and revenue."
                    .into();

                let mut cert = form.certifications.representative().clone();
                cert.name = "Google Analytics Certified".into();
                cert.organization = "Google".into();
                cert.date = "2023-01".into();
                next.certifications = form.certifications.with_first(cert);
            }
        }
        next
    }
}

impl FromStr for Sample {
    type Err = FormError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Sample::ALL
            .into_iter()
            .find(|e| e.as_str() == s)
            .ok_or_else(|| FormError::InvalidValue {
                field: "example".to_string(),
                value: s.to_string(),
            })
    }
}
