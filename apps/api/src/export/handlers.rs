use axum::{
    extract::State,
    http::header,
    response::IntoResponse,
};
use serde::Deserialize;
use tracing::info;
use uuid::Uuid;

use crate::applications::handlers::fetch_application;
use crate::companies::handlers::fetch_company;
use crate::errors::AppError;
use crate::extract::{ApiPath, ApiQuery};
use crate::export::{attachment_name, document_html, Document};
use crate::public_page::build_public_view;
use crate::state::AppState;

#[derive(Debug, Deserialize)]
pub struct ExportQuery {
    pub document: Document,
}

/// GET /api/applications/:id/pdf?document=cover_letter|cv
///
/// Works for unpublished applications too.
pub async fn handle_export_pdf(
    State(state): State<AppState>,
    ApiPath(id): ApiPath<Uuid>,
    ApiQuery(query): ApiQuery<ExportQuery>,
) -> Result<impl IntoResponse, AppError> {
    let application = fetch_application(&state.db, id).await?;
    let company = fetch_company(&state.db, application.company_id).await?;
    let view = build_public_view(&application, &company, &state.portfolio);

    let html = document_html(&view, query.document)?;
    let pdf = state.pdf_renderer.render_pdf(&html).await?;

    let filename = attachment_name(&application.slug, query.document);
    info!("Exported {filename} ({} bytes)", pdf.len());

    Ok((
        [
            (header::CONTENT_TYPE, "application/pdf".to_string()),
            (
                header::CONTENT_DISPOSITION,
                format!("attachment; filename=\"{filename}\""),
            ),
        ],
        pdf,
    ))
}
