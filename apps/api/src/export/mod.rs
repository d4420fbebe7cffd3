//! PDF export of application documents.
//!
//! HTML comes from the same templates as the public page (print layout, no tracker).
//! `AppState` holds an `Arc<dyn PdfRenderer>`; the default renderer drives headless Chromium.

pub mod handlers;

use std::time::Duration;

use async_trait::async_trait;
use chromiumoxide::browser::{Browser, BrowserConfig};
use chromiumoxide::cdp::browser_protocol::page::PrintToPdfParams;
use futures::StreamExt;
use serde::Deserialize;
use tracing::{debug, info, warn};

use crate::errors::AppError;
use crate::render::{render_application, PageContent, PublicView};

const RENDER_TIMEOUT: Duration = Duration::from_secs(60);

/// Which document of an application to export.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Document {
    CoverLetter,
    Cv,
}

impl Document {
    pub fn as_str(self) -> &'static str {
        match self {
            Document::CoverLetter => "cover_letter",
            Document::Cv => "cv",
        }
    }

    fn content(self) -> PageContent {
        match self {
            Document::CoverLetter => PageContent::CoverLetterOnly,
            Document::Cv => PageContent::CvOnly,
        }
    }
}

/// Print-layout HTML for one document.
pub fn document_html(view: &PublicView, document: Document) -> Result<String, AppError> {
    if document == Document::CoverLetter && view.cover_letter.is_empty() {
        return Err(AppError::Validation(
            "Application has no cover letter to export".to_string(),
        ));
    }
    Ok(render_application(view, document.content(), true, false)?)
}

pub fn attachment_name(slug: &str, document: Document) -> String {
    format!("{}-{}.pdf", slug, document.as_str())
}

#[async_trait]
pub trait PdfRenderer: Send + Sync {
    async fn render_pdf(&self, html: &str) -> Result<Vec<u8>, AppError>;
}

/// Launches a headless Chromium per export and closes it afterwards.
pub struct ChromiumRenderer {
    chrome_path: Option<String>,
}

impl ChromiumRenderer {
    pub fn new(chrome_path: Option<String>) -> Self {
        Self { chrome_path }
    }

    async fn print(&self, html: &str) -> Result<Vec<u8>, AppError> {
        let mut builder = BrowserConfig::builder()
            .no_sandbox()
            .arg("--disable-gpu")
            .arg("--disable-dev-shm-usage");
        if let Some(path) = &self.chrome_path {
            builder = builder.chrome_executable(path);
        }
        let config = builder
            .build()
            .map_err(|e| AppError::Render(format!("Invalid browser configuration: {e}")))?;

        let (mut browser, mut handler) = Browser::launch(config)
            .await
            .map_err(|e| AppError::Render(format!("Failed to launch Chromium: {e}")))?;
        let events = tokio::spawn(async move {
            while let Some(event) = handler.next().await {
                if event.is_err() {
                    break;
                }
            }
        });

        let result = print_page(&browser, html).await;

        if let Err(e) = browser.close().await {
            warn!("Failed to close Chromium cleanly: {e}");
        }
        if let Err(e) = browser.wait().await {
            debug!("Chromium exit wait failed: {e}");
        }
        events.abort();

        result
    }
}

async fn print_page(browser: &Browser, html: &str) -> Result<Vec<u8>, AppError> {
    let page = browser
        .new_page("about:blank")
        .await
        .map_err(|e| AppError::Render(format!("Failed to open page: {e}")))?;
    page.set_content(html)
        .await
        .map_err(|e| AppError::Render(format!("Failed to load document: {e}")))?;

    let params = PrintToPdfParams {
        print_background: Some(true),
        prefer_css_page_size: Some(true),
        ..Default::default()
    };
    page.pdf(params)
        .await
        .map_err(|e| AppError::Render(format!("Failed to print PDF: {e}")))
}

#[async_trait]
impl PdfRenderer for ChromiumRenderer {
    async fn render_pdf(&self, html: &str) -> Result<Vec<u8>, AppError> {
        let pdf = tokio::time::timeout(RENDER_TIMEOUT, self.print(html))
            .await
            .map_err(|_| {
                AppError::Render(format!(
                    "PDF rendering timed out after {}s",
                    RENDER_TIMEOUT.as_secs()
                ))
            })??;
        info!("Rendered PDF ({} bytes)", pdf.len());
        Ok(pdf)
    }
}

#[cfg(test)]
pub(crate) mod tests {
    use super::*;
    use crate::models::company::Theme;
    use crate::portfolio::tests::sample;
    use crate::render::{paragraphs, CvView};

    /// Returns a fixed PDF header followed by the HTML it was handed.
    pub(crate) struct EchoRenderer;

    #[async_trait]
    impl PdfRenderer for EchoRenderer {
        async fn render_pdf(&self, html: &str) -> Result<Vec<u8>, AppError> {
            Ok([b"%PDF-1.7\n".as_slice(), html.as_bytes()].concat())
        }
    }

    fn view(letter: &str) -> PublicView {
        PublicView {
            slug: "acme-backend-engineer-abc123".to_string(),
            company_name: "Acme".to_string(),
            logo_url: String::new(),
            job_title: "Backend Engineer".to_string(),
            theme: Theme::default(),
            cover_letter: paragraphs(letter),
            cv: CvView::build(&sample(), "backend", &[], &[]),
        }
    }

    #[test]
    fn test_document_wire_names() {
        let doc: Document = serde_json::from_str(r#""cover_letter""#).unwrap();
        assert_eq!(doc, Document::CoverLetter);
        assert_eq!(attachment_name("acme-x1", Document::Cv), "acme-x1-cv.pdf");
        assert_eq!(
            attachment_name("acme-x1", Document::CoverLetter),
            "acme-x1-cover_letter.pdf"
        );
    }

    #[test]
    fn test_cv_html_is_print_layout_without_tracker() {
        let html = document_html(&view("Dear Acme,"), Document::Cv).unwrap();
        assert!(html.contains("data-section=\"experience\""));
        assert!(!html.contains("data-section=\"cover_letter\""));
        assert!(!html.contains("tracker.js"));
    }

    #[test]
    fn test_empty_cover_letter_is_rejected() {
        assert!(matches!(
            document_html(&view("  "), Document::CoverLetter),
            Err(AppError::Validation(_))
        ));
    }

    #[tokio::test]
    async fn test_renderer_trait_object() {
        let renderer: Box<dyn PdfRenderer> = Box::new(EchoRenderer);
        let html = document_html(&view("Dear Acme,"), Document::CoverLetter).unwrap();
        let pdf = renderer.render_pdf(&html).await.unwrap();
        assert!(pdf.starts_with(b"%PDF"));
    }
}
