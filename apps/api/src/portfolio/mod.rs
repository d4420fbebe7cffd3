//! Owner portfolio content: profile, experience, projects and education.
//!
//! Loaded once at startup from a JSON file. Experience and projects carry a list of
//! CV variants they belong to; an empty list means the item is part of every variant.

pub mod handlers;

use std::collections::HashSet;

use anyhow::{bail, Context, Result};
use serde::{Deserialize, Serialize};
use tracing::info;

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Portfolio {
    pub owner: Owner,
    #[serde(default)]
    pub experience: Vec<Experience>,
    #[serde(default)]
    pub projects: Vec<Project>,
    #[serde(default)]
    pub education: Vec<Education>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Owner {
    pub name: String,
    pub headline: String,
    #[serde(default)]
    pub email: Option<String>,
    #[serde(default)]
    pub location: Option<String>,
    #[serde(default)]
    pub summary: Option<String>,
    #[serde(default)]
    pub links: Vec<Link>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Link {
    pub label: String,
    pub url: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Experience {
    pub company: String,
    pub role: String,
    #[serde(default)]
    pub location: Option<String>,
    /// `YYYY-MM`
    pub start: String,
    /// `None` for the current position.
    #[serde(default)]
    pub end: Option<String>,
    #[serde(default)]
    pub summary: Option<String>,
    #[serde(default)]
    pub highlights: Vec<String>,
    #[serde(default)]
    pub tech: Vec<String>,
    #[serde(default)]
    pub variants: Vec<String>,
}

impl Experience {
    pub fn period(&self) -> String {
        format!("{} – {}", self.start, self.end.as_deref().unwrap_or("present"))
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Project {
    pub slug: String,
    pub name: String,
    pub description: String,
    #[serde(default)]
    pub tech: Vec<String>,
    #[serde(default)]
    pub url: Option<String>,
    #[serde(default)]
    pub highlights: Vec<String>,
    #[serde(default)]
    pub variants: Vec<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Education {
    pub institution: String,
    pub degree: String,
    #[serde(default)]
    pub field: Option<String>,
    #[serde(default)]
    pub start: Option<String>,
    #[serde(default)]
    pub end: Option<String>,
}

impl Education {
    pub fn period(&self) -> String {
        match (&self.start, &self.end) {
            (Some(start), Some(end)) => format!("{start} – {end}"),
            (Some(start), None) => format!("{start} – present"),
            (None, Some(end)) => end.clone(),
            (None, None) => String::new(),
        }
    }
}

fn in_variant(variants: &[String], variant: &str) -> bool {
    variants.is_empty() || variants.iter().any(|v| v.eq_ignore_ascii_case(variant))
}

impl Portfolio {
    pub async fn load(path: &str) -> Result<Self> {
        let raw = tokio::fs::read_to_string(path)
            .await
            .with_context(|| format!("Failed to read portfolio content from '{path}'"))?;
        let portfolio = Self::from_json(&raw)?;
        info!(
            "Portfolio loaded: {} experience, {} projects, {} education entries",
            portfolio.experience.len(),
            portfolio.projects.len(),
            portfolio.education.len()
        );
        Ok(portfolio)
    }

    pub fn from_json(raw: &str) -> Result<Self> {
        let portfolio: Portfolio =
            serde_json::from_str(raw).context("Portfolio content is not valid JSON")?;

        let mut seen = HashSet::new();
        for project in &portfolio.projects {
            if !seen.insert(project.slug.as_str()) {
                bail!("Duplicate project slug '{}' in portfolio", project.slug);
            }
        }
        Ok(portfolio)
    }

    /// Experience and projects belonging to one CV variant.
    pub fn for_variant(&self, variant: &str) -> Portfolio {
        Portfolio {
            owner: self.owner.clone(),
            experience: self
                .experience
                .iter()
                .filter(|e| in_variant(&e.variants, variant))
                .cloned()
                .collect(),
            projects: self
                .projects
                .iter()
                .filter(|p| in_variant(&p.variants, variant))
                .cloned()
                .collect(),
            education: self.education.clone(),
        }
    }

    pub fn project(&self, slug: &str) -> Option<&Project> {
        self.projects.iter().find(|p| p.slug == slug)
    }
}
