//! Axum route handlers for the Companies API.

use axum::{
    extract::{multipart::{Multipart, MultipartRejection}, State},
    http::StatusCode,
    Json,
};
use bytes::Bytes;
use std::future::Future;
use serde::Deserialize;
use sqlx::types::Json as SqlJson;
use sqlx::PgPool;
use tracing::info;
use uuid::Uuid;

use crate::companies::logo::{delete_logo, logo_key, process_logo, upload_logo, MAX_LOGO_BYTES};
use crate::errors::AppError;
use crate::extract::{ApiJson, ApiPath};
use crate::models::company::{CompanyRow, Theme};
use crate::slug::{generate_unique_slug, SlugTable};
use crate::state::AppState;

// ────────────────────────────────────────────────────────────────────────────
// Request types
// ────────────────────────────────────────────────────────────────────────────

#[derive(Debug, Deserialize)]
pub struct CreateCompanyRequest {
    pub name: String,
    pub website: Option<String>,
}

#[derive(Debug, Deserialize)]
pub struct UpdateCompanyRequest {
    pub name: Option<String>,
    /// An empty string clears the website.
    pub website: Option<String>,
}

#[derive(Debug, Deserialize)]
pub struct SetThemeRequest {
    pub theme: Theme,
}

// ────────────────────────────────────────────────────────────────────────────
// Queries
// ────────────────────────────────────────────────────────────────────────────

pub async fn fetch_company(pool: &PgPool, id: Uuid) -> Result<CompanyRow, AppError> {
    sqlx::query_as::<_, CompanyRow>("SELECT * FROM companies WHERE id = $1")
        .bind(id)
        .fetch_optional(pool)
        .await?
        .ok_or_else(|| AppError::NotFound(format!("Company {id} not found")))
}

fn validate_name(name: &str) -> Result<String, AppError> {
    let name = name.trim();
    if name.is_empty() {
        return Err(AppError::Validation("name cannot be empty".to_string()));
    }
    Ok(name.to_string())
}

// ────────────────────────────────────────────────────────────────────────────
// Handlers
// ────────────────────────────────────────────────────────────────────────────

/// POST /api/companies
pub async fn handle_create_company(
    State(state): State<AppState>,
    ApiJson(req): ApiJson<CreateCompanyRequest>,
) -> Result<(StatusCode, Json<CompanyRow>), AppError> {
    let name = validate_name(&req.name)?;
    let slug = generate_unique_slug(&state.db, SlugTable::Companies, &name).await?;
    let website = req.website.filter(|w| !w.trim().is_empty());

    let company = sqlx::query_as::<_, CompanyRow>(
        r#"
        INSERT INTO companies (id, name, slug, website)
        VALUES ($1, $2, $3, $4)
        RETURNING *
        "#,
    )
    .bind(Uuid::new_v4())
    .bind(&name)
    .bind(&slug)
    .bind(&website)
    .fetch_one(&state.db)
    .await?;

    info!("Created company {} ({})", company.id, company.slug);
    Ok((StatusCode::CREATED, Json(company)))
}

/// GET /api/companies
pub async fn handle_list_companies(
    State(state): State<AppState>,
) -> Result<Json<Vec<CompanyRow>>, AppError> {
    let companies = sqlx::query_as::<_, CompanyRow>("SELECT * FROM companies ORDER BY name")
        .fetch_all(&state.db)
        .await?;
    Ok(Json(companies))
}

/// GET /api/companies/:id
pub async fn handle_get_company(
    State(state): State<AppState>,
    ApiPath(id): ApiPath<Uuid>,
) -> Result<Json<CompanyRow>, AppError> {
    Ok(Json(fetch_company(&state.db, id).await?))
}

/// PATCH /api/companies/:id
///
/// The slug is stable: renaming a company does not break shared links.
pub async fn handle_update_company(
    State(state): State<AppState>,
    ApiPath(id): ApiPath<Uuid>,
    ApiJson(req): ApiJson<UpdateCompanyRequest>,
) -> Result<Json<CompanyRow>, AppError> {
    let name = req.name.as_deref().map(validate_name).transpose()?;

    let company = sqlx::query_as::<_, CompanyRow>(
        r#"
        UPDATE companies
        SET name = COALESCE($2, name),
            website = CASE
                WHEN $3::text IS NULL THEN website
                WHEN btrim($3::text) = '' THEN NULL
                ELSE $3::text
            END,
            updated_at = NOW()
        WHERE id = $1
        RETURNING *
        "#,
    )
    .bind(id)
    .bind(&name)
    .bind(&req.website)
    .fetch_optional(&state.db)
    .await?
    .ok_or_else(|| AppError::NotFound(format!("Company {id} not found")))?;

    Ok(Json(company))
}

/// Maps a foreign-key violation on company delete to `Conflict`.
fn referenced_conflict(id: Uuid, e: sqlx::Error) -> AppError {
    match &e {
        sqlx::Error::Database(db) if db.is_foreign_key_violation() => {
            AppError::Conflict(format!("Company {id} is referenced by applications"))
        }
        _ => AppError::Database(e),
    }
}

/// Runs `cleanup` when `result` is an error, then hands the result back.
async fn cleanup_on_error<T, E, F, Fut>(result: Result<T, E>, cleanup: F) -> Result<T, E>
where
    F: FnOnce() -> Fut,
    Fut: Future<Output = ()>,
{
    if result.is_err() {
        cleanup().await;
    }
    result
}

/// DELETE /api/companies/:id
pub async fn handle_delete_company(
    State(state): State<AppState>,
    ApiPath(id): ApiPath<Uuid>,
) -> Result<StatusCode, AppError> {
    let company = fetch_company(&state.db, id).await?;

    let in_use: i64 = sqlx::query_scalar("SELECT COUNT(*) FROM applications WHERE company_id = $1")
        .bind(id)
        .fetch_one(&state.db)
        .await?;
    if in_use > 0 {
        return Err(AppError::Conflict(format!(
            "Company {id} is referenced by {in_use} application(s)"
        )));
    }

    // An application created after the count still trips the foreign key
    sqlx::query("DELETE FROM companies WHERE id = $1")
        .bind(id)
        .execute(&state.db)
        .await
        .map_err(|e| referenced_conflict(id, e))?;

    if let Some(key) = company.logo_key.as_deref() {
        delete_logo(&state.s3, &state.config.s3_bucket, key).await;
    }

    info!("Deleted company {id}");
    Ok(StatusCode::NO_CONTENT)
}

/// POST /api/companies/:id/logo
///
/// Multipart upload with a single `logo` field.
pub async fn handle_upload_logo(
    State(state): State<AppState>,
    ApiPath(id): ApiPath<Uuid>,
    multipart: Result<Multipart, MultipartRejection>,
) -> Result<Json<CompanyRow>, AppError> {
    let mut multipart = multipart?;
    let company = fetch_company(&state.db, id).await?;

    let mut upload: Option<Bytes> = None;
    while let Some(field) = multipart.next_field().await? {
        if field.name() == Some("logo") {
            upload = Some(field.bytes().await?);
            break;
        }
    }
    let upload = upload.ok_or_else(|| AppError::Validation("Missing 'logo' field".to_string()))?;
    if upload.len() > MAX_LOGO_BYTES {
        return Err(AppError::PayloadTooLarge(format!(
            "Logo must be at most {MAX_LOGO_BYTES} bytes"
        )));
    }

    // Decoding and resizing are CPU-bound
    let processed = tokio::task::spawn_blocking(move || process_logo(&upload))
        .await
        .map_err(|e| AppError::Internal(anyhow::anyhow!("Logo processing task failed: {e}")))??;

    let key = logo_key(id);
    let url = format!("{}/{}", state.config.s3_public_base_url, key);
    upload_logo(&state.s3, &state.config.s3_bucket, &key, processed.png).await?;

    let updated = sqlx::query_as::<_, CompanyRow>(
        r#"
        UPDATE companies
        SET logo_key = $2, logo_url = $3, theme = $4, updated_at = NOW()
        WHERE id = $1
        RETURNING *
        "#,
    )
    .bind(id)
    .bind(&key)
    .bind(&url)
    .bind(SqlJson(&processed.theme))
    .fetch_one(&state.db)
    .await;
    let updated = cleanup_on_error(updated, || {
        delete_logo(&state.s3, &state.config.s3_bucket, &key)
    })
    .await?;

    if let Some(old_key) = company.logo_key.as_deref() {
        delete_logo(&state.s3, &state.config.s3_bucket, old_key).await;
    }

    info!(
        "Logo for company {id} stored at {key} ({}x{}), primary colour {}",
        processed.width, processed.height, processed.theme.primary
    );
    Ok(Json(updated))
}

/// PUT /api/companies/:id/theme
pub async fn handle_set_theme(
    State(state): State<AppState>,
    ApiPath(id): ApiPath<Uuid>,
    ApiJson(req): ApiJson<SetThemeRequest>,
) -> Result<Json<CompanyRow>, AppError> {
    if let Some(field) = req.theme.first_invalid_field() {
        return Err(AppError::Validation(format!(
            "theme.{field} must be a #rrggbb colour"
        )));
    }
    let theme = Theme {
        primary: req.theme.primary.to_ascii_lowercase(),
        secondary: req.theme.secondary.to_ascii_lowercase(),
        accent: req.theme.accent.to_ascii_lowercase(),
        background: req.theme.background.to_ascii_lowercase(),
        text: req.theme.text.to_ascii_lowercase(),
        title: req.theme.title.to_ascii_lowercase(),
    };

    let company = sqlx::query_as::<_, CompanyRow>(
        "UPDATE companies SET theme = $2, updated_at = NOW() WHERE id = $1 RETURNING *",
    )
    .bind(id)
    .bind(SqlJson(&theme))
    .fetch_optional(&state.db)
    .await?
    .ok_or_else(|| AppError::NotFound(format!("Company {id} not found")))?;

    Ok(Json(company))
}
