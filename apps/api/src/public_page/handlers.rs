use axum::{
    extract::State,
    response::Html,
    Json,
};
use serde::Deserialize;
use sqlx::PgPool;
use tracing::debug;

use crate::companies::handlers::fetch_company;
use crate::errors::AppError;
use crate::extract::{ApiPath, ApiQuery};
use crate::models::application::ApplicationRow;
use crate::public_page::build_public_view;
use crate::render::{render_application, PageContent, PublicView};
use crate::state::AppState;

#[derive(Debug, Default, Deserialize)]
pub struct PageQuery {
    pub preview: Option<String>,
}

impl PageQuery {
    /// `?preview=1` renders the page without the tracker so owners don't count themselves.
    pub fn is_preview(&self) -> bool {
        matches!(self.preview.as_deref(), Some("1") | Some("true"))
    }
}

async fn fetch_published(pool: &PgPool, slug: &str) -> Result<ApplicationRow, AppError> {
    sqlx::query_as::<_, ApplicationRow>(
        "SELECT * FROM applications WHERE slug = $1 AND published = TRUE",
    )
    .bind(slug)
    .fetch_optional(pool)
    .await?
    .ok_or_else(|| AppError::NotFound(format!("Page '{slug}' not found")))
}

async fn load_view(state: &AppState, slug: &str) -> Result<PublicView, AppError> {
    let application = fetch_published(&state.db, slug).await?;
    let company = fetch_company(&state.db, application.company_id).await?;
    Ok(build_public_view(&application, &company, &state.portfolio))
}

/// GET /p/:slug
pub async fn handle_public_page(
    State(state): State<AppState>,
    ApiPath(slug): ApiPath<String>,
    ApiQuery(query): ApiQuery<PageQuery>,
) -> Result<Html<String>, AppError> {
    let view = load_view(&state, &slug).await?;
    let track = !query.is_preview();
    debug!("Rendering public page {slug} (tracked={track})");
    let html = render_application(&view, PageContent::Full, false, track)?;
    Ok(Html(html))
}

/// GET /api/public/:slug
pub async fn handle_public_json(
    State(state): State<AppState>,
    ApiPath(slug): ApiPath<String>,
) -> Result<Json<PublicView>, AppError> {
    Ok(Json(load_view(&state, &slug).await?))
}
