use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::types::Json;
use sqlx::FromRow;
use uuid::Uuid;

#[derive(Debug, Clone, Serialize, Deserialize, FromRow)]
pub struct CompanyRow {
    pub id: Uuid,
    pub name: String,
    pub slug: String,
    pub website: Option<String>,
    pub logo_key: Option<String>,
    pub logo_url: Option<String>,
    pub theme: Option<Json<Theme>>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl CompanyRow {
    /// The stored theme, or the neutral default when none has been derived yet.
    pub fn theme_or_default(&self) -> Theme {
        self.theme
            .as_ref()
            .map(|t| t.0.clone())
            .unwrap_or_default()
    }
}

/// Named colours skinning a public page and its exported documents.
/// Every value is a `#rrggbb` hex string.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Theme {
    pub primary: String,
    pub secondary: String,
    pub accent: String,
    pub background: String,
    pub text: String,
    pub title: String,
}

impl Default for Theme {
    fn default() -> Self {
        Self {
            primary: "#2563eb".to_string(),
            secondary: "#1e40af".to_string(),
            accent: "#f59e0b".to_string(),
            background: "#ffffff".to_string(),
            text: "#1f2937".to_string(),
            title: "#111827".to_string(),
        }
    }
}

impl Theme {
    /// Returns the name of the first field that is not a `#rrggbb` colour.
    pub fn first_invalid_field(&self) -> Option<&'static str> {
        [
            ("primary", &self.primary),
            ("secondary", &self.secondary),
            ("accent", &self.accent),
            ("background", &self.background),
            ("text", &self.text),
            ("title", &self.title),
        ]
        .into_iter()
        .find(|(_, value)| !is_hex_color(value))
        .map(|(name, _)| name)
    }
}

pub fn is_hex_color(value: &str) -> bool {
    value.len() == 7
        && value.starts_with('#')
        && value[1..].chars().all(|c| c.is_ascii_hexdigit())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_theme_is_valid() {
        assert_eq!(Theme::default().first_invalid_field(), None);
    }

    #[test]
    fn test_invalid_field_reported() {
        let theme = Theme {
            accent: "orange".to_string(),
            ..Theme::default()
        };
        assert_eq!(theme.first_invalid_field(), Some("accent"));
    }

    #[test]
    fn test_hex_color_rules() {
        assert!(is_hex_color("#A1b2C3"));
        assert!(!is_hex_color("#abc"));
        assert!(!is_hex_color("a1b2c3d"));
        assert!(!is_hex_color("#gg0000"));
    }
}
