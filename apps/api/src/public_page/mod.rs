// Public application pages: one shareable URL per application.

pub mod handlers;

use crate::models::application::ApplicationRow;
use crate::models::company::CompanyRow;
use crate::portfolio::Portfolio;
use crate::render::{paragraphs, CvView, PublicView};

/// Assembles the page view from an application, its company and the portfolio.
/// The CV keeps only entries tagged for the application's `cv_variant`.
pub fn build_public_view(
    application: &ApplicationRow,
    company: &CompanyRow,
    portfolio: &Portfolio,
) -> PublicView {
    PublicView {
        slug: application.slug.clone(),
        company_name: company.name.clone(),
        logo_url: company.logo_url.clone().unwrap_or_default(),
        job_title: application.job_title.clone(),
        theme: company.theme_or_default(),
        cover_letter: paragraphs(&application.cover_letter),
        cv: CvView::build(
            portfolio,
            &application.cv_variant,
            &application.technical_skills,
            &application.soft_skills,
        ),
    }
}
