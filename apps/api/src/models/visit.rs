use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::types::Json;
use sqlx::FromRow;
use uuid::Uuid;

#[derive(Debug, Clone, Serialize, Deserialize, FromRow)]
pub struct VisitRow {
    pub id: Uuid,
    pub application_id: Uuid,
    pub ip: String,
    pub user_agent: String,
    pub referrer: Option<String>,
    pub source: String,
    pub device: String,
    pub browser: String,
    pub time_on_page_secs: i32,
    pub max_scroll_depth: i16,
    pub sections: Json<SectionViews>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

/// Which sections of the public page scrolled into view during a visit.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct SectionViews {
    pub cover_letter: bool,
    pub experience: bool,
    pub skills: bool,
    pub projects: bool,
    pub education: bool,
}

impl SectionViews {
    /// Section names as used in `data-section` attributes on the public page.
    pub const NAMES: [&'static str; 5] =
        ["cover_letter", "experience", "skills", "projects", "education"];

    pub fn union(self, other: SectionViews) -> SectionViews {
        SectionViews {
            cover_letter: self.cover_letter || other.cover_letter,
            experience: self.experience || other.experience,
            skills: self.skills || other.skills,
            projects: self.projects || other.projects,
            education: self.education || other.education,
        }
    }

    pub fn flags(&self) -> [bool; 5] {
        [
            self.cover_letter,
            self.experience,
            self.skills,
            self.projects,
            self.education,
        ]
    }
}

/// Visit joined with the application and company it belongs to.
#[derive(Debug, Clone, FromRow)]
pub struct VisitFact {
    pub application_id: Uuid,
    pub application_slug: String,
    pub job_title: String,
    pub company_name: String,
    pub ip: String,
    pub source: String,
    pub device: String,
    pub browser: String,
    pub time_on_page_secs: i32,
    pub max_scroll_depth: i16,
    pub sections: Json<SectionViews>,
    pub created_at: DateTime<Utc>,
}
