//! Axum route handlers for visit tracking. These routes are public.

use std::net::SocketAddr;

use axum::{
    body::Bytes,
    extract::{ConnectInfo, State},
    http::{header, HeaderMap, StatusCode},
    response::IntoResponse,
    Json,
};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::types::Json as SqlJson;
use sqlx::PgPool;
use tracing::{debug, info};
use uuid::Uuid;

use crate::errors::AppError;
use crate::extract::{ApiJson, ApiPath};
use crate::models::visit::SectionViews;
use crate::state::AppState;
use crate::tracking::classify::{
    classify_browser, classify_device, classify_source, client_ip, host_of, is_bot,
};
use crate::tracking::engagement::{is_frozen, merge_engagement, Engagement, EngagementUpdate};

const TRACKER_JS: &str = include_str!("../../assets/tracker.js");

#[derive(Debug, Deserialize)]
pub struct CreateVisitRequest {
    pub slug: String,
    pub referrer: Option<String>,
    pub utm_source: Option<String>,
}

#[derive(Debug, Serialize)]
pub struct CreateVisitResponse {
    /// `None` when the request was not recorded (bots).
    pub visit_id: Option<Uuid>,
}

/// POST /api/visits
pub async fn handle_create_visit(
    State(state): State<AppState>,
    peer: Option<ConnectInfo<SocketAddr>>,
    headers: HeaderMap,
    ApiJson(req): ApiJson<CreateVisitRequest>,
) -> Result<(StatusCode, Json<CreateVisitResponse>), AppError> {
    let application_id: Uuid = sqlx::query_scalar(
        "SELECT id FROM applications WHERE slug = $1 AND published = TRUE",
    )
    .bind(&req.slug)
    .fetch_optional(&state.db)
    .await?
    .ok_or_else(|| AppError::NotFound(format!("Application '{}' not found", req.slug)))?;

    let user_agent = headers
        .get(header::USER_AGENT)
        .and_then(|v| v.to_str().ok())
        .unwrap_or_default()
        .to_string();

    if is_bot(&user_agent) {
        debug!("Skipping bot visit to {}: {:?}", req.slug, user_agent);
        return Ok((StatusCode::OK, Json(CreateVisitResponse { visit_id: None })));
    }

    let ip = client_ip(&headers, peer.map(|ConnectInfo(addr)| addr));
    let own_host = host_of(&state.config.public_base_url);
    let referrer = req.referrer.filter(|r| !r.trim().is_empty());
    let source = classify_source(
        req.utm_source.as_deref(),
        referrer.as_deref(),
        own_host.as_deref(),
    );

    let visit_id = Uuid::new_v4();
    sqlx::query(
        r#"
        INSERT INTO visits
            (id, application_id, ip, user_agent, referrer, source, device, browser, sections)
        VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9)
        "#,
    )
    .bind(visit_id)
    .bind(application_id)
    .bind(&ip)
    .bind(&user_agent)
    .bind(&referrer)
    .bind(&source)
    .bind(classify_device(&user_agent))
    .bind(classify_browser(&user_agent))
    .bind(SqlJson(SectionViews::default()))
    .execute(&state.db)
    .await?;

    info!("Visit {visit_id} recorded for {} (source={source})", req.slug);

    Ok((
        StatusCode::CREATED,
        Json(CreateVisitResponse {
            visit_id: Some(visit_id),
        }),
    ))
}

/// PATCH /api/visits/:id
pub async fn handle_heartbeat(
    State(state): State<AppState>,
    ApiPath(visit_id): ApiPath<Uuid>,
    ApiJson(update): ApiJson<EngagementUpdate>,
) -> Result<StatusCode, AppError> {
    apply_engagement(&state.db, visit_id, &update).await?;
    Ok(StatusCode::NO_CONTENT)
}

/// POST /api/visits/:id/beacon
///
/// `navigator.sendBeacon` posts a text/plain body, so the JSON is parsed by hand.
/// Any body that does not decode, including invalid UTF-8, is ignored.
pub async fn handle_beacon(
    State(state): State<AppState>,
    ApiPath(visit_id): ApiPath<Uuid>,
    body: Bytes,
) -> Result<StatusCode, AppError> {
    match serde_json::from_slice::<EngagementUpdate>(&body) {
        Ok(update) => {
            apply_engagement(&state.db, visit_id, &update).await?;
        }
        Err(e) => debug!("Ignoring malformed beacon for visit {visit_id}: {e}"),
    }
    Ok(StatusCode::NO_CONTENT)
}

/// GET /static/tracker.js
pub async fn handle_tracker_script() -> impl IntoResponse {
    (
        [
            (header::CONTENT_TYPE, "application/javascript; charset=utf-8"),
            (header::CACHE_CONTROL, "public, max-age=3600"),
        ],
        TRACKER_JS,
    )
}

/// Merges an update into the stored visit under a row lock.
/// Returns whether anything was written.
async fn apply_engagement(
    pool: &PgPool,
    visit_id: Uuid,
    update: &EngagementUpdate,
) -> Result<bool, AppError> {
    let mut tx = pool.begin().await?;

    let row: Option<(i32, i16, SqlJson<SectionViews>, DateTime<Utc>)> = sqlx::query_as(
        r#"
        SELECT time_on_page_secs, max_scroll_depth, sections, created_at
        FROM visits
        WHERE id = $1
        FOR UPDATE
        "#,
    )
    .bind(visit_id)
    .fetch_optional(&mut *tx)
    .await?;

    let (time_on_page_secs, max_scroll_depth, sections, created_at) =
        row.ok_or_else(|| AppError::NotFound(format!("Visit {visit_id} not found")))?;

    if is_frozen(created_at, Utc::now()) {
        debug!("Visit {visit_id} is outside the update window; ignoring");
        return Ok(false);
    }

    let stored = Engagement {
        time_on_page_secs,
        max_scroll_depth,
        sections: sections.0,
    };
    let merged = merge_engagement(stored, update);
    if merged == stored {
        return Ok(false);
    }

    sqlx::query(
        r#"
        UPDATE visits
        SET time_on_page_secs = $2, max_scroll_depth = $3, sections = $4, updated_at = NOW()
        WHERE id = $1
        "#,
    )
    .bind(visit_id)
    .bind(merged.time_on_page_secs)
    .bind(merged.max_scroll_depth)
    .bind(SqlJson(merged.sections))
    .execute(&mut *tx)
    .await?;

    tx.commit().await?;
    Ok(true)
}
