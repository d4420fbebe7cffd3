//! HTML rendering for the public application page, its print variant and the portfolio site.
//!
//! Templates live in `templates/` and are compiled in by askama. Views are flattened to
//! plain strings so templates never branch on `Option`.

use askama::Template;
use serde::Serialize;

use crate::models::company::Theme;
use crate::portfolio::{Education, Experience, Owner, Portfolio, Project};

// ────────────────────────────────────────────────────────────────────────────
// View models
// ────────────────────────────────────────────────────────────────────────────

#[derive(Debug, Clone, Serialize)]
pub struct LinkView {
    pub label: String,
    pub url: String,
}

#[derive(Debug, Clone, Serialize)]
pub struct OwnerView {
    pub name: String,
    pub headline: String,
    pub contact_line: String,
    pub summary: String,
    pub links: Vec<LinkView>,
}

impl From<&Owner> for OwnerView {
    fn from(owner: &Owner) -> Self {
        let contact_line = [owner.email.as_deref(), owner.location.as_deref()]
            .into_iter()
            .flatten()
            .collect::<Vec<_>>()
            .join(" · ");
        Self {
            name: owner.name.clone(),
            headline: owner.headline.clone(),
            contact_line,
            summary: owner.summary.clone().unwrap_or_default(),
            links: owner
                .links
                .iter()
                .map(|l| LinkView {
                    label: l.label.clone(),
                    url: l.url.clone(),
                })
                .collect(),
        }
    }
}

#[derive(Debug, Clone, Serialize)]
pub struct ExperienceView {
    pub role: String,
    pub company: String,
    pub period: String,
    pub location: String,
    pub summary: String,
    pub highlights: Vec<String>,
    pub tech: String,
}

impl From<&Experience> for ExperienceView {
    fn from(e: &Experience) -> Self {
        Self {
            role: e.role.clone(),
            company: e.company.clone(),
            period: e.period(),
            location: e.location.clone().unwrap_or_default(),
            summary: e.summary.clone().unwrap_or_default(),
            highlights: e.highlights.clone(),
            tech: e.tech.join(", "),
        }
    }
}

#[derive(Debug, Clone, Serialize)]
pub struct ProjectView {
    pub name: String,
    pub description: String,
    pub url: String,
    pub tech: String,
    pub highlights: Vec<String>,
}

impl From<&Project> for ProjectView {
    fn from(p: &Project) -> Self {
        Self {
            name: p.name.clone(),
            description: p.description.clone(),
            url: p.url.clone().unwrap_or_default(),
            tech: p.tech.join(", "),
            highlights: p.highlights.clone(),
        }
    }
}

#[derive(Debug, Clone, Serialize)]
pub struct EducationView {
    pub institution: String,
    pub degree: String,
    pub period: String,
}

impl From<&Education> for EducationView {
    fn from(e: &Education) -> Self {
        let degree = match &e.field {
            Some(field) => format!("{}, {}", e.degree, field),
            None => e.degree.clone(),
        };
        Self {
            institution: e.institution.clone(),
            degree,
            period: e.period(),
        }
    }
}

/// CV content for one variant, plus the application's skill lists.
#[derive(Debug, Clone, Serialize)]
pub struct CvView {
    pub owner: OwnerView,
    pub experience: Vec<ExperienceView>,
    pub projects: Vec<ProjectView>,
    pub education: Vec<EducationView>,
    pub technical_skills: Vec<String>,
    pub soft_skills: Vec<String>,
}

impl CvView {
    pub fn build(
        portfolio: &Portfolio,
        variant: &str,
        technical_skills: &[String],
        soft_skills: &[String],
    ) -> Self {
        Self::from_portfolio(&portfolio.for_variant(variant), technical_skills, soft_skills)
    }

    /// Uses every experience and project entry, regardless of variant.
    pub fn from_portfolio(
        portfolio: &Portfolio,
        technical_skills: &[String],
        soft_skills: &[String],
    ) -> Self {
        Self {
            owner: OwnerView::from(&portfolio.owner),
            experience: portfolio.experience.iter().map(ExperienceView::from).collect(),
            projects: portfolio.projects.iter().map(ProjectView::from).collect(),
            education: portfolio.education.iter().map(EducationView::from).collect(),
            technical_skills: technical_skills.to_vec(),
            soft_skills: soft_skills.to_vec(),
        }
    }

    pub fn has_skills(&self) -> bool {
        !self.technical_skills.is_empty() || !self.soft_skills.is_empty()
    }
}

/// Everything a public application page shows.
#[derive(Debug, Clone, Serialize)]
pub struct PublicView {
    pub slug: String,
    pub company_name: String,
    pub logo_url: String,
    pub job_title: String,
    pub theme: Theme,
    pub cover_letter: Vec<String>,
    pub cv: CvView,
}

/// Splits a letter into paragraphs on blank lines; single line breaks are folded.
pub fn paragraphs(text: &str) -> Vec<String> {
    let mut out = Vec::new();
    let mut current: Vec<&str> = Vec::new();

    for line in text.lines() {
        let line = line.trim();
        if line.is_empty() {
            if !current.is_empty() {
                out.push(current.join(" "));
                current.clear();
            }
        } else {
            current.push(line);
        }
    }
    if !current.is_empty() {
        out.push(current.join(" "));
    }
    out
}

// ────────────────────────────────────────────────────────────────────────────
// Templates
// ────────────────────────────────────────────────────────────────────────────

/// Which parts of an application page to render.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PageContent {
    Full,
    CoverLetterOnly,
    CvOnly,
}

#[derive(Template)]
#[template(path = "application.html")]
pub struct ApplicationPage<'a> {
    pub title: String,
    pub theme: &'a Theme,
    pub page: &'a PublicView,
    pub show_cover_letter: bool,
    pub show_cv: bool,
    pub print: bool,
    /// Empty disables the tracker script.
    pub tracker_slug: String,
}

impl<'a> ApplicationPage<'a> {
    pub fn new(page: &'a PublicView, content: PageContent, print: bool, track: bool) -> Self {
        Self {
            title: format!("{} — {}", page.job_title, page.company_name),
            theme: &page.theme,
            page,
            show_cover_letter: content != PageContent::CvOnly && !page.cover_letter.is_empty(),
            show_cv: content != PageContent::CoverLetterOnly,
            print,
            tracker_slug: if track && !print {
                page.slug.clone()
            } else {
                String::new()
            },
        }
    }
}

#[derive(Template)]
#[template(path = "portfolio.html")]
pub struct PortfolioPage<'a> {
    pub title: String,
    pub theme: &'a Theme,
    pub cv: CvView,
    pub print: bool,
}

pub fn render_application(
    page: &PublicView,
    content: PageContent,
    print: bool,
    track: bool,
) -> askama::Result<String> {
    ApplicationPage::new(page, content, print, track).render()
}

pub fn render_portfolio(portfolio: &Portfolio, theme: &Theme) -> askama::Result<String> {
    PortfolioPage {
        title: portfolio.owner.name.clone(),
        theme,
        cv: CvView::from_portfolio(portfolio, &[], &[]),
        print: false,
    }
    .render()
}
