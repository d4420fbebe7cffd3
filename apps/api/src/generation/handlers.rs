//! Axum route handlers for the Generation API.

use axum::{
    extract::State,
    Json,
};
use serde::{Deserialize, Serialize};
use tracing::info;
use uuid::Uuid;

use crate::applications::handlers::fetch_application;
use crate::companies::handlers::fetch_company;
use crate::errors::AppError;
use crate::extract::{ApiJson, ApiPath};
use crate::generation::cover_letter::{generate_cover_letter, CoverLetterInput};
use crate::generation::projects::{recommend_projects, ProjectRecommendation};
use crate::generation::skills::extract_skills;
use crate::generation::tone::Tone;
use crate::generation::GenerationSource;
use crate::models::application::ApplicationRow;
use crate::state::AppState;

// ────────────────────────────────────────────────────────────────────────────
// Request / Response types
// ────────────────────────────────────────────────────────────────────────────

#[derive(Debug, Serialize)]
pub struct CoverLetterResponse {
    pub cover_letter: String,
    pub source: GenerationSource,
}

#[derive(Debug, Deserialize)]
pub struct SkillsRequest {
    pub job_description: String,
}

#[derive(Debug, Serialize)]
pub struct SkillsResponse {
    pub technical_skills: Vec<String>,
    pub soft_skills: Vec<String>,
    pub source: GenerationSource,
}

#[derive(Debug, Serialize)]
pub struct RecommendProjectsResponse {
    pub recommendations: Vec<ProjectRecommendation>,
    pub source: GenerationSource,
}

#[derive(Debug, Default, Deserialize)]
pub struct GenerateApplicationRequest {
    #[serde(default)]
    pub tone: Tone,
}

#[derive(Debug, Serialize)]
pub struct GenerateApplicationResponse {
    pub application: ApplicationRow,
    pub cover_letter_source: GenerationSource,
    pub skills_source: GenerationSource,
}

fn require_text(field: &str, value: &str) -> Result<(), AppError> {
    if value.trim().is_empty() {
        return Err(AppError::Validation(format!("{field} cannot be empty")));
    }
    Ok(())
}

// ────────────────────────────────────────────────────────────────────────────
// Handlers
// ────────────────────────────────────────────────────────────────────────────

/// POST /api/generate/cover-letter
pub async fn handle_generate_cover_letter(
    State(state): State<AppState>,
    ApiJson(input): ApiJson<CoverLetterInput>,
) -> Result<Json<CoverLetterResponse>, AppError> {
    require_text("company_name", &input.company_name)?;
    require_text("job_title", &input.job_title)?;

    let (cover_letter, source) = generate_cover_letter(&state.llm, &state.portfolio, &input).await;
    Ok(Json(CoverLetterResponse {
        cover_letter,
        source,
    }))
}

/// POST /api/generate/skills
pub async fn handle_generate_skills(
    State(state): State<AppState>,
    ApiJson(request): ApiJson<SkillsRequest>,
) -> Result<Json<SkillsResponse>, AppError> {
    require_text("job_description", &request.job_description)?;

    let (skills, source) = extract_skills(&state.llm, &request.job_description).await;
    Ok(Json(SkillsResponse {
        technical_skills: skills.technical_skills,
        soft_skills: skills.soft_skills,
        source,
    }))
}

/// POST /api/applications/:id/recommend-projects
pub async fn handle_recommend_projects(
    State(state): State<AppState>,
    ApiPath(id): ApiPath<Uuid>,
) -> Result<Json<RecommendProjectsResponse>, AppError> {
    let application = fetch_application(&state.db, id).await?;
    let (recommendations, source) = recommend_projects(
        &state.llm,
        &state.portfolio,
        &application.job_title,
        &application.job_description,
    )
    .await;
    Ok(Json(RecommendProjectsResponse {
        recommendations,
        source,
    }))
}

/// POST /api/applications/:id/generate
///
/// Writes a cover letter and skill lists for the application and stores them,
/// replacing whatever was there.
pub async fn handle_generate_for_application(
    State(state): State<AppState>,
    ApiPath(id): ApiPath<Uuid>,
    request: Option<Json<GenerateApplicationRequest>>,
) -> Result<Json<GenerateApplicationResponse>, AppError> {
    let tone = request.map(|Json(r)| r.tone).unwrap_or_default();
    let application = fetch_application(&state.db, id).await?;
    let company = fetch_company(&state.db, application.company_id).await?;

    let input = CoverLetterInput {
        company_name: company.name.clone(),
        job_title: application.job_title.clone(),
        job_description: application.job_description.clone(),
        tone,
    };
    let ((cover_letter, cover_letter_source), (skills, skills_source)) = tokio::join!(
        generate_cover_letter(&state.llm, &state.portfolio, &input),
        extract_skills(&state.llm, &application.job_description),
    );

    let updated = sqlx::query_as::<_, ApplicationRow>(
        r#"
        UPDATE applications
        SET cover_letter = $2, technical_skills = $3, soft_skills = $4, updated_at = NOW()
        WHERE id = $1
        RETURNING *
        "#,
    )
    .bind(id)
    .bind(&cover_letter)
    .bind(&skills.technical_skills)
    .bind(&skills.soft_skills)
    .fetch_optional(&state.db)
    .await?
    .ok_or_else(|| AppError::NotFound(format!("Application {id} not found")))?;

    info!(
        "Generated content for application {id} (cover letter: {:?}, skills: {:?})",
        cover_letter_source, skills_source
    );

    Ok(Json(GenerateApplicationResponse {
        application: updated,
        cover_letter_source,
        skills_source,
    }))
}
