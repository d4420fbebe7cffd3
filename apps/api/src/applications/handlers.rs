//! Axum route handlers for the Applications API.
//!
//! Sub-document edits (notes, reminders, timeline) load the row under
//! `FOR UPDATE`, mutate the embedded arrays and write them back.

use axum::{
    extract::State,
    http::StatusCode,
    Json,
};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::types::Json as SqlJson;
use sqlx::{PgPool, Postgres, Transaction};
use tracing::info;
use uuid::Uuid;

use crate::applications::documents::{
    collect_due, insert_event, remove_by_id, status_change_event, DueReminder,
};
use crate::companies::handlers::fetch_company;
use crate::errors::AppError;
use crate::extract::{ApiJson, ApiPath, ApiQuery};
use crate::models::application::{
    ApplicationRow, ApplicationStatus, Note, Reminder, TimelineEvent, TimelineKind,
};
use crate::slug::{generate_unique_slug, SlugTable};
use crate::state::AppState;

const DEFAULT_CV_VARIANT: &str = "default";
const DEFAULT_DUE_WITHIN_DAYS: i64 = 7;
const MAX_DUE_WITHIN_DAYS: i64 = 365;

// ────────────────────────────────────────────────────────────────────────────
// Request / Response types
// ────────────────────────────────────────────────────────────────────────────

#[derive(Debug, Deserialize)]
pub struct CreateApplicationRequest {
    pub company_id: Uuid,
    pub job_title: String,
    #[serde(default)]
    pub job_description: String,
    #[serde(default)]
    pub cover_letter: String,
    pub cv_variant: Option<String>,
    #[serde(default)]
    pub technical_skills: Vec<String>,
    #[serde(default)]
    pub soft_skills: Vec<String>,
    pub status: Option<ApplicationStatus>,
    #[serde(default)]
    pub published: bool,
}

#[derive(Debug, Default, Deserialize)]
pub struct UpdateApplicationRequest {
    pub job_title: Option<String>,
    pub job_description: Option<String>,
    pub cover_letter: Option<String>,
    pub cv_variant: Option<String>,
    pub technical_skills: Option<Vec<String>>,
    pub soft_skills: Option<Vec<String>>,
    pub status: Option<ApplicationStatus>,
    pub published: Option<bool>,
}

#[derive(Debug, Deserialize)]
pub struct ListApplicationsQuery {
    pub status: Option<ApplicationStatus>,
    pub company_id: Option<Uuid>,
}

#[derive(Debug, Serialize)]
pub struct ApplicationResponse {
    #[serde(flatten)]
    pub application: ApplicationRow,
    pub public_url: String,
}

#[derive(Debug, Deserialize)]
pub struct AddNoteRequest {
    pub body: String,
}

#[derive(Debug, Deserialize)]
pub struct AddReminderRequest {
    pub title: String,
    pub due_at: DateTime<Utc>,
}

#[derive(Debug, Deserialize)]
pub struct UpdateReminderRequest {
    pub title: Option<String>,
    pub due_at: Option<DateTime<Utc>>,
    pub completed: Option<bool>,
}

#[derive(Debug, Deserialize)]
pub struct AddTimelineEventRequest {
    #[serde(default)]
    pub kind: TimelineKind,
    pub description: String,
    pub occurred_at: Option<DateTime<Utc>>,
}

#[derive(Debug, Deserialize)]
pub struct DueRemindersQuery {
    pub within_days: Option<i64>,
}

// ────────────────────────────────────────────────────────────────────────────
// Helpers
// ────────────────────────────────────────────────────────────────────────────

fn respond(state: &AppState, application: ApplicationRow) -> ApplicationResponse {
    let public_url = state.config.public_url(&application.slug);
    ApplicationResponse {
        application,
        public_url,
    }
}

fn required_text(field: &str, value: &str) -> Result<String, AppError> {
    let value = value.trim();
    if value.is_empty() {
        return Err(AppError::Validation(format!("{field} cannot be empty")));
    }
    Ok(value.to_string())
}

fn normalize_variant(variant: Option<&str>) -> String {
    match variant.map(str::trim) {
        Some(v) if !v.is_empty() => v.to_string(),
        _ => DEFAULT_CV_VARIANT.to_string(),
    }
}

fn clean_skills(skills: Vec<String>) -> Vec<String> {
    let mut cleaned: Vec<String> = Vec::with_capacity(skills.len());
    for skill in skills {
        let skill = skill.trim();
        if skill.is_empty() || cleaned.iter().any(|s| s.eq_ignore_ascii_case(skill)) {
            continue;
        }
        cleaned.push(skill.to_string());
    }
    cleaned
}

/// Applies a partial update in place. A status change is recorded on the timeline.
pub(crate) fn apply_update(
    app: &mut ApplicationRow,
    req: UpdateApplicationRequest,
    now: DateTime<Utc>,
) -> Result<(), AppError> {
    if let Some(title) = req.job_title {
        app.job_title = required_text("job_title", &title)?;
    }
    if let Some(description) = req.job_description {
        app.job_description = description;
    }
    if let Some(letter) = req.cover_letter {
        app.cover_letter = letter;
    }
    if let Some(variant) = req.cv_variant {
        app.cv_variant = normalize_variant(Some(&variant));
    }
    if let Some(skills) = req.technical_skills {
        app.technical_skills = clean_skills(skills);
    }
    if let Some(skills) = req.soft_skills {
        app.soft_skills = clean_skills(skills);
    }
    if let Some(published) = req.published {
        app.published = published;
    }
    if let Some(new_status) = req.status {
        let old_status = app.status.parse::<ApplicationStatus>().unwrap_or_default();
        if new_status != old_status {
            insert_event(
                &mut app.timeline.0,
                status_change_event(old_status, new_status, now),
            );
            app.status = new_status.as_str().to_string();
        }
    }
    app.updated_at = now;
    Ok(())
}

pub async fn fetch_application(pool: &PgPool, id: Uuid) -> Result<ApplicationRow, AppError> {
    sqlx::query_as::<_, ApplicationRow>("SELECT * FROM applications WHERE id = $1")
        .bind(id)
        .fetch_optional(pool)
        .await?
        .ok_or_else(|| AppError::NotFound(format!("Application {id} not found")))
}

async fn lock_application(
    tx: &mut Transaction<'_, Postgres>,
    id: Uuid,
) -> Result<ApplicationRow, AppError> {
    sqlx::query_as::<_, ApplicationRow>("SELECT * FROM applications WHERE id = $1 FOR UPDATE")
        .bind(id)
        .fetch_optional(&mut **tx)
        .await?
        .ok_or_else(|| AppError::NotFound(format!("Application {id} not found")))
}

/// Writes back the embedded arrays of a locked row.
async fn save_documents(
    tx: &mut Transaction<'_, Postgres>,
    app: &ApplicationRow,
) -> Result<(), AppError> {
    sqlx::query(
        r#"
        UPDATE applications
        SET notes = $2, reminders = $3, timeline = $4, updated_at = NOW()
        WHERE id = $1
        "#,
    )
    .bind(app.id)
    .bind(&app.notes)
    .bind(&app.reminders)
    .bind(&app.timeline)
    .execute(&mut **tx)
    .await?;
    Ok(())
}

// ────────────────────────────────────────────────────────────────────────────
// Application handlers
// ────────────────────────────────────────────────────────────────────────────

/// POST /api/applications
pub async fn handle_create_application(
    State(state): State<AppState>,
    ApiJson(req): ApiJson<CreateApplicationRequest>,
) -> Result<(StatusCode, Json<ApplicationResponse>), AppError> {
    let job_title = required_text("job_title", &req.job_title)?;
    let company = fetch_company(&state.db, req.company_id).await?;
    let slug = generate_unique_slug(
        &state.db,
        SlugTable::Applications,
        &format!("{} {}", company.name, job_title),
    )
    .await?;

    let now = Utc::now();
    let status = req.status.unwrap_or_default();
    let timeline = vec![TimelineEvent::new(
        TimelineKind::Created,
        format!("Application for {job_title} at {} created", company.name),
        now,
    )];

    let application = sqlx::query_as::<_, ApplicationRow>(
        r#"
        INSERT INTO applications
            (id, company_id, slug, job_title, job_description, cover_letter, cv_variant,
             technical_skills, soft_skills, status, published, notes, reminders, timeline,
             created_at, updated_at)
        VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, $10, $11, $12, $13, $14, $15, $15)
        RETURNING *
        "#,
    )
    .bind(Uuid::new_v4())
    .bind(company.id)
    .bind(&slug)
    .bind(&job_title)
    .bind(&req.job_description)
    .bind(&req.cover_letter)
    .bind(normalize_variant(req.cv_variant.as_deref()))
    .bind(clean_skills(req.technical_skills))
    .bind(clean_skills(req.soft_skills))
    .bind(status.as_str())
    .bind(req.published)
    .bind(SqlJson(Vec::<Note>::new()))
    .bind(SqlJson(Vec::<Reminder>::new()))
    .bind(SqlJson(timeline))
    .bind(now)
    .fetch_one(&state.db)
    .await?;

    info!("Created application {} ({})", application.id, application.slug);
    Ok((StatusCode::CREATED, Json(respond(&state, application))))
}

/// GET /api/applications?status=&company_id=
pub async fn handle_list_applications(
    State(state): State<AppState>,
    ApiQuery(params): ApiQuery<ListApplicationsQuery>,
) -> Result<Json<Vec<ApplicationResponse>>, AppError> {
    let applications = sqlx::query_as::<_, ApplicationRow>(
        r#"
        SELECT * FROM applications
        WHERE ($1::text IS NULL OR status = $1)
          AND ($2::uuid IS NULL OR company_id = $2)
        ORDER BY created_at DESC
        "#,
    )
    .bind(params.status.map(|s| s.as_str()))
    .bind(params.company_id)
    .fetch_all(&state.db)
    .await?;

    Ok(Json(
        applications
            .into_iter()
            .map(|a| respond(&state, a))
            .collect(),
    ))
}

/// GET /api/applications/:id
pub async fn handle_get_application(
    State(state): State<AppState>,
    ApiPath(id): ApiPath<Uuid>,
) -> Result<Json<ApplicationResponse>, AppError> {
    let application = fetch_application(&state.db, id).await?;
    Ok(Json(respond(&state, application)))
}

/// PATCH /api/applications/:id
pub async fn handle_update_application(
    State(state): State<AppState>,
    ApiPath(id): ApiPath<Uuid>,
    ApiJson(req): ApiJson<UpdateApplicationRequest>,
) -> Result<Json<ApplicationResponse>, AppError> {
    let mut tx = state.db.begin().await?;
    let mut app = lock_application(&mut tx, id).await?;
    apply_update(&mut app, req, Utc::now())?;

    let updated = sqlx::query_as::<_, ApplicationRow>(
        r#"
        UPDATE applications
        SET job_title = $2, job_description = $3, cover_letter = $4, cv_variant = $5,
            technical_skills = $6, soft_skills = $7, status = $8, published = $9,
            timeline = $10, updated_at = $11
        WHERE id = $1
        RETURNING *
        "#,
    )
    .bind(app.id)
    .bind(&app.job_title)
    .bind(&app.job_description)
    .bind(&app.cover_letter)
    .bind(&app.cv_variant)
    .bind(&app.technical_skills)
    .bind(&app.soft_skills)
    .bind(&app.status)
    .bind(app.published)
    .bind(&app.timeline)
    .bind(app.updated_at)
    .fetch_one(&mut *tx)
    .await?;
    tx.commit().await?;

    Ok(Json(respond(&state, updated)))
}

/// DELETE /api/applications/:id
///
/// Visits go with it (`ON DELETE CASCADE`).
pub async fn handle_delete_application(
    State(state): State<AppState>,
    ApiPath(id): ApiPath<Uuid>,
) -> Result<StatusCode, AppError> {
    let result = sqlx::query("DELETE FROM applications WHERE id = $1")
        .bind(id)
        .execute(&state.db)
        .await?;
    if result.rows_affected() == 0 {
        return Err(AppError::NotFound(format!("Application {id} not found")));
    }
    info!("Deleted application {id}");
    Ok(StatusCode::NO_CONTENT)
}

// ────────────────────────────────────────────────────────────────────────────
// Notes
// ────────────────────────────────────────────────────────────────────────────

/// POST /api/applications/:id/notes
pub async fn handle_add_note(
    State(state): State<AppState>,
    ApiPath(id): ApiPath<Uuid>,
    ApiJson(req): ApiJson<AddNoteRequest>,
) -> Result<(StatusCode, Json<Note>), AppError> {
    let note = Note {
        id: Uuid::new_v4(),
        body: required_text("body", &req.body)?,
        created_at: Utc::now(),
    };

    let mut tx = state.db.begin().await?;
    let mut app = lock_application(&mut tx, id).await?;
    app.notes.0.push(note.clone());
    save_documents(&mut tx, &app).await?;
    tx.commit().await?;

    Ok((StatusCode::CREATED, Json(note)))
}

/// DELETE /api/applications/:id/notes/:note_id
pub async fn handle_delete_note(
    State(state): State<AppState>,
    ApiPath((id, note_id)): ApiPath<(Uuid, Uuid)>,
) -> Result<StatusCode, AppError> {
    let mut tx = state.db.begin().await?;
    let mut app = lock_application(&mut tx, id).await?;
    if !remove_by_id(&mut app.notes.0, note_id) {
        return Err(AppError::NotFound(format!("Note {note_id} not found")));
    }
    save_documents(&mut tx, &app).await?;
    tx.commit().await?;
    Ok(StatusCode::NO_CONTENT)
}

// ────────────────────────────────────────────────────────────────────────────
// Reminders
// ────────────────────────────────────────────────────────────────────────────

/// POST /api/applications/:id/reminders
pub async fn handle_add_reminder(
    State(state): State<AppState>,
    ApiPath(id): ApiPath<Uuid>,
    ApiJson(req): ApiJson<AddReminderRequest>,
) -> Result<(StatusCode, Json<Reminder>), AppError> {
    let reminder = Reminder {
        id: Uuid::new_v4(),
        title: required_text("title", &req.title)?,
        due_at: req.due_at,
        completed: false,
        created_at: Utc::now(),
    };

    let mut tx = state.db.begin().await?;
    let mut app = lock_application(&mut tx, id).await?;
    app.reminders.0.push(reminder.clone());
    save_documents(&mut tx, &app).await?;
    tx.commit().await?;

    Ok((StatusCode::CREATED, Json(reminder)))
}

/// PATCH /api/applications/:id/reminders/:reminder_id
pub async fn handle_update_reminder(
    State(state): State<AppState>,
    ApiPath((id, reminder_id)): ApiPath<(Uuid, Uuid)>,
    ApiJson(req): ApiJson<UpdateReminderRequest>,
) -> Result<Json<Reminder>, AppError> {
    let title = req
        .title
        .as_deref()
        .map(|t| required_text("title", t))
        .transpose()?;

    let mut tx = state.db.begin().await?;
    let mut app = lock_application(&mut tx, id).await?;
    let reminder = app
        .reminders
        .0
        .iter_mut()
        .find(|r| r.id == reminder_id)
        .ok_or_else(|| AppError::NotFound(format!("Reminder {reminder_id} not found")))?;

    if let Some(title) = title {
        reminder.title = title;
    }
    if let Some(due_at) = req.due_at {
        reminder.due_at = due_at;
    }
    if let Some(completed) = req.completed {
        reminder.completed = completed;
    }
    let updated = reminder.clone();

    save_documents(&mut tx, &app).await?;
    tx.commit().await?;
    Ok(Json(updated))
}

/// DELETE /api/applications/:id/reminders/:reminder_id
pub async fn handle_delete_reminder(
    State(state): State<AppState>,
    ApiPath((id, reminder_id)): ApiPath<(Uuid, Uuid)>,
) -> Result<StatusCode, AppError> {
    let mut tx = state.db.begin().await?;
    let mut app = lock_application(&mut tx, id).await?;
    if !remove_by_id(&mut app.reminders.0, reminder_id) {
        return Err(AppError::NotFound(format!(
            "Reminder {reminder_id} not found"
        )));
    }
    save_documents(&mut tx, &app).await?;
    tx.commit().await?;
    Ok(StatusCode::NO_CONTENT)
}

/// GET /api/reminders/due?within_days=7
pub async fn handle_due_reminders(
    State(state): State<AppState>,
    ApiQuery(params): ApiQuery<DueRemindersQuery>,
) -> Result<Json<Vec<DueReminder>>, AppError> {
    let within_days = params.within_days.unwrap_or(DEFAULT_DUE_WITHIN_DAYS);
    if !(0..=MAX_DUE_WITHIN_DAYS).contains(&within_days) {
        return Err(AppError::Validation(format!(
            "within_days must be between 0 and {MAX_DUE_WITHIN_DAYS}"
        )));
    }

    let rows: Vec<(Uuid, String, String, SqlJson<Vec<Reminder>>)> = sqlx::query_as(
        r#"
        SELECT id, slug, job_title, reminders
        FROM applications
        WHERE jsonb_array_length(reminders) > 0
        "#,
    )
    .fetch_all(&state.db)
    .await?;

    let due = collect_due(
        rows.iter().map(|(id, slug, title, reminders)| {
            (*id, slug.as_str(), title.as_str(), reminders.0.as_slice())
        }),
        Utc::now(),
        within_days,
    );
    Ok(Json(due))
}

// ────────────────────────────────────────────────────────────────────────────
// Timeline
// ────────────────────────────────────────────────────────────────────────────

/// POST /api/applications/:id/timeline
pub async fn handle_add_timeline_event(
    State(state): State<AppState>,
    ApiPath(id): ApiPath<Uuid>,
    ApiJson(req): ApiJson<AddTimelineEventRequest>,
) -> Result<(StatusCode, Json<TimelineEvent>), AppError> {
    let event = TimelineEvent::new(
        req.kind,
        required_text("description", &req.description)?,
        req.occurred_at.unwrap_or_else(Utc::now),
    );

    let mut tx = state.db.begin().await?;
    let mut app = lock_application(&mut tx, id).await?;
    insert_event(&mut app.timeline.0, event.clone());
    save_documents(&mut tx, &app).await?;
    tx.commit().await?;

    Ok((StatusCode::CREATED, Json(event)))
}

/// DELETE /api/applications/:id/timeline/:event_id
pub async fn handle_delete_timeline_event(
    State(state): State<AppState>,
    ApiPath((id, event_id)): ApiPath<(Uuid, Uuid)>,
) -> Result<StatusCode, AppError> {
    let mut tx = state.db.begin().await?;
    let mut app = lock_application(&mut tx, id).await?;
    if !remove_by_id(&mut app.timeline.0, event_id) {
        return Err(AppError::NotFound(format!(
            "Timeline event {event_id} not found"
        )));
    }
    save_documents(&mut tx, &app).await?;
    tx.commit().await?;
    Ok(StatusCode::NO_CONTENT)
}
