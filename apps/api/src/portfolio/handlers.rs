use axum::{extract::State, response::Html, Json};

use crate::errors::AppError;
use crate::models::company::Theme;
use crate::portfolio::Portfolio;
use crate::render::render_portfolio;
use crate::state::AppState;

/// GET /api/portfolio
pub async fn handle_get_portfolio(State(state): State<AppState>) -> Json<Portfolio> {
    Json(state.portfolio.as_ref().clone())
}

/// GET /
pub async fn handle_portfolio_page(State(state): State<AppState>) -> Result<Html<String>, AppError> {
    let html = render_portfolio(&state.portfolio, &Theme::default())?;
    Ok(Html(html))
}
