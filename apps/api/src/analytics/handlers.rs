use axum::{
    extract::State,
    Json,
};
use chrono::Utc;
use serde::Deserialize;
use sqlx::PgPool;
use tracing::info;
use uuid::Uuid;

use crate::analytics::aggregate::{aggregate_visits, AnalyticsSummary, Window};
use crate::analytics::cache::{cache_key, get_cached, put_cached};
use crate::errors::AppError;
use crate::extract::ApiQuery;
use crate::models::visit::{VisitFact, VisitRow};
use crate::state::AppState;

const DEFAULT_WINDOW_DAYS: u32 = 30;
const MAX_WINDOW_DAYS: u32 = 365;
const DEFAULT_VISIT_LIMIT: i64 = 50;
const MAX_VISIT_LIMIT: i64 = 500;

#[derive(Debug, Deserialize)]
pub struct AnalyticsQuery {
    pub days: Option<u32>,
    pub application_id: Option<Uuid>,
}

#[derive(Debug, Deserialize)]
pub struct VisitsQuery {
    pub application_id: Option<Uuid>,
    pub limit: Option<i64>,
}

fn visit_limit(requested: Option<i64>) -> i64 {
    requested
        .unwrap_or(DEFAULT_VISIT_LIMIT)
        .clamp(1, MAX_VISIT_LIMIT)
}

fn window_days(requested: Option<u32>) -> Result<u32, AppError> {
    let days = requested.unwrap_or(DEFAULT_WINDOW_DAYS);
    if !(1..=MAX_WINDOW_DAYS).contains(&days) {
        return Err(AppError::Validation(format!(
            "days must be between 1 and {MAX_WINDOW_DAYS}"
        )));
    }
    Ok(days)
}

/// GET /api/analytics
pub async fn handle_analytics(
    State(state): State<AppState>,
    ApiQuery(params): ApiQuery<AnalyticsQuery>,
) -> Result<Json<AnalyticsSummary>, AppError> {
    let days = window_days(params.days)?;
    let key = cache_key(days, params.application_id);

    if let Some(summary) = get_cached(&state.redis, &key).await {
        return Ok(Json(summary));
    }

    let now = Utc::now();
    let window = Window::ending_at(now, days);
    let facts = load_visit_facts(&state.db, window, params.application_id).await?;
    let summary = aggregate_visits(&facts, window, now);

    info!(
        "Analytics computed: {} visits over {} days ({} applications)",
        summary.totals.views,
        days,
        summary.applications.len()
    );

    put_cached(
        &state.redis,
        &key,
        &summary,
        state.config.analytics_cache_ttl_secs,
    )
    .await;

    Ok(Json(summary))
}

/// GET /api/analytics/visits?application_id=&limit=50
///
/// Raw visit log, newest first. Never cached.
pub async fn handle_recent_visits(
    State(state): State<AppState>,
    ApiQuery(params): ApiQuery<VisitsQuery>,
) -> Result<Json<Vec<VisitRow>>, AppError> {
    let visits = sqlx::query_as::<_, VisitRow>(
        r#"
        SELECT * FROM visits
        WHERE ($1::uuid IS NULL OR application_id = $1)
        ORDER BY created_at DESC
        LIMIT $2
        "#,
    )
    .bind(params.application_id)
    .bind(visit_limit(params.limit))
    .fetch_all(&state.db)
    .await?;
    Ok(Json(visits))
}

async fn load_visit_facts(
    pool: &PgPool,
    window: Window,
    application_id: Option<Uuid>,
) -> Result<Vec<VisitFact>, AppError> {
    Ok(sqlx::query_as::<_, VisitFact>(
        r#"
        SELECT v.application_id,
               a.slug AS application_slug,
               a.job_title,
               c.name AS company_name,
               v.ip, v.source, v.device, v.browser,
               v.time_on_page_secs, v.max_scroll_depth, v.sections, v.created_at
        FROM visits v
        JOIN applications a ON a.id = v.application_id
        JOIN companies c ON c.id = a.company_id
        WHERE v.created_at >= $1
          AND ($2::uuid IS NULL OR v.application_id = $2)
        ORDER BY v.created_at
        "#,
    )
    .bind(window.start())
    .bind(application_id)
    .fetch_all(pool)
    .await?)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_window_days_default_and_bounds() {
        assert_eq!(window_days(None).unwrap(), 30);
        assert_eq!(window_days(Some(1)).unwrap(), 1);
        assert_eq!(window_days(Some(365)).unwrap(), 365);
        assert!(window_days(Some(0)).is_err());
        assert!(window_days(Some(366)).is_err());
    }

    #[test]
    fn test_visit_limit_clamped() {
        assert_eq!(visit_limit(None), 50);
        assert_eq!(visit_limit(Some(0)), 1);
        assert_eq!(visit_limit(Some(10_000)), 500);
    }
}
