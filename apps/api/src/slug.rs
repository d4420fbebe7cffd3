//! Human-readable unique identifiers for public URLs: a slugified name plus a random suffix.

use rand::Rng;
use sqlx::PgPool;
use tracing::warn;

use crate::errors::AppError;

const MAX_BASE_LEN: usize = 48;
const SUFFIX_LEN: usize = 6;
const SUFFIX_ALPHABET: &[u8] = b"abcdefghijklmnopqrstuvwxyz0123456789";
const MAX_ATTEMPTS: u32 = 5;

/// Tables that own a `slug` column.
#[derive(Debug, Clone, Copy)]
pub enum SlugTable {
    Companies,
    Applications,
}

impl SlugTable {
    fn exists_query(self) -> &'static str {
        match self {
            SlugTable::Companies => "SELECT EXISTS(SELECT 1 FROM companies WHERE slug = $1)",
            SlugTable::Applications => {
                "SELECT EXISTS(SELECT 1 FROM applications WHERE slug = $1)"
            }
        }
    }
}

/// Lowercase ASCII slug; runs of anything else collapse to a single `-`.
pub fn slugify(text: &str) -> String {
    let mut slug = String::with_capacity(text.len());
    let mut pending_dash = false;

    for c in text.chars() {
        if c.is_ascii_alphanumeric() {
            if pending_dash && !slug.is_empty() {
                slug.push('-');
            }
            pending_dash = false;
            slug.push(c.to_ascii_lowercase());
        } else {
            pending_dash = true;
        }
    }

    if slug.len() > MAX_BASE_LEN {
        slug.truncate(MAX_BASE_LEN);
        // Cut back to the last full word when one exists
        if let Some(idx) = slug.rfind('-') {
            slug.truncate(idx);
        }
    }

    if slug.is_empty() {
        "item".to_string()
    } else {
        slug
    }
}

pub fn random_suffix() -> String {
    let mut rng = rand::thread_rng();
    (0..SUFFIX_LEN)
        .map(|_| SUFFIX_ALPHABET[rng.gen_range(0..SUFFIX_ALPHABET.len())] as char)
        .collect()
}

pub fn with_suffix(base: &str) -> String {
    format!("{}-{}", slugify(base), random_suffix())
}

/// Generates a slug not yet present in `table`.
pub async fn generate_unique_slug(
    pool: &PgPool,
    table: SlugTable,
    base: &str,
) -> Result<String, AppError> {
    for attempt in 1..=MAX_ATTEMPTS {
        let candidate = with_suffix(base);
        let taken: bool = sqlx::query_scalar(table.exists_query())
            .bind(&candidate)
            .fetch_one(pool)
            .await?;
        if !taken {
            return Ok(candidate);
        }
        warn!("Slug collision on attempt {attempt}: {candidate}");
    }

    Err(AppError::Conflict(format!(
        "Could not generate a unique slug for '{base}' after {MAX_ATTEMPTS} attempts"
    )))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_slugify_basic() {
        assert_eq!(slugify("Acme Corp"), "acme-corp");
    }

    #[test]
    fn test_slugify_collapses_punctuation() {
        assert_eq!(slugify("  Senior Engineer -- (Rust/Go)!  "), "senior-engineer-rust-go");
    }

    #[test]
    fn test_slugify_drops_non_ascii() {
        assert_eq!(slugify("Zürich Café"), "z-rich-caf");
    }

    #[test]
    fn test_slugify_empty_falls_back() {
        assert_eq!(slugify("!!!"), "item");
        assert_eq!(slugify(""), "item");
    }

    #[test]
    fn test_slugify_truncates_at_word_boundary() {
        let long = "platform engineering team lead for distributed infrastructure services";
        let slug = slugify(long);
        assert!(slug.len() <= MAX_BASE_LEN, "slug was {slug}");
        assert!(!slug.ends_with('-'));
        assert!(long.replace(' ', "-").starts_with(&slug));
    }

    #[test]
    fn test_suffix_shape() {
        let suffix = random_suffix();
        assert_eq!(suffix.len(), SUFFIX_LEN);
        assert!(suffix
            .chars()
            .all(|c| c.is_ascii_lowercase() || c.is_ascii_digit()));
    }

    #[test]
    fn test_with_suffix_joins_base_and_suffix() {
        let slug = with_suffix("Acme Corp Backend Engineer");
        assert!(slug.starts_with("acme-corp-backend-engineer-"));
        assert_eq!(slug.len(), "acme-corp-backend-engineer-".len() + SUFFIX_LEN);
    }
}
