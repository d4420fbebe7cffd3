//! Portfolio project recommendations for a job description.

use std::collections::HashSet;

use serde::{Deserialize, Serialize};
use serde_json::json;
use tracing::{debug, info, warn};

use crate::generation::prompts::PROJECTS_PROMPT_TEMPLATE;
use crate::generation::GenerationSource;
use crate::llm_client::prompts::JSON_ONLY_SYSTEM;
use crate::llm_client::{LlmClient, LlmError};
use crate::portfolio::{Portfolio, Project};

pub const MAX_RECOMMENDATIONS: usize = 3;
const MIN_WORD_LEN: usize = 4;

const STOPWORDS: &[&str] = &[
    "about", "also", "based", "build", "built", "from", "have", "into", "more", "that", "their",
    "them", "then", "they", "this", "using", "with", "your", "will", "work", "works",
];

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ProjectRecommendation {
    pub slug: String,
    pub name: String,
    /// Relevance in 0.0 – 1.0.
    pub score: f32,
    pub reason: String,
}

#[derive(Debug, Deserialize)]
struct LlmRecommendations {
    #[serde(default)]
    recommendations: Vec<LlmPick>,
}

#[derive(Debug, Deserialize)]
struct LlmPick {
    slug: String,
    #[serde(default)]
    score: f32,
    #[serde(default)]
    reason: String,
}

fn words(text: &str) -> impl Iterator<Item = String> + '_ {
    text.split(|c: char| !(c.is_alphanumeric() || c == '+' || c == '#' || c == '.'))
        .map(|w| w.trim_matches('.').to_lowercase())
        .filter(|w| !w.is_empty())
}

/// Terms a project can be matched on: its tech tags plus meaningful description words.
fn project_terms(project: &Project) -> Vec<String> {
    let mut terms: Vec<String> = Vec::new();
    let mut seen = HashSet::new();
    let tech = project.tech.iter().map(|t| t.trim().to_lowercase());
    let description = words(&project.description)
        .filter(|w| w.chars().count() >= MIN_WORD_LEN && !STOPWORDS.contains(&w.as_str()));
    for term in tech.chain(description) {
        if !term.is_empty() && seen.insert(term.clone()) {
            terms.push(term);
        }
    }
    terms
}

/// Ranks projects by the share of their terms that appear in the job description.
/// Projects with no overlap are not recommended.
pub fn fallback_recommendations(
    portfolio: &Portfolio,
    job_description: &str,
) -> Vec<ProjectRecommendation> {
    let jd_words: HashSet<String> = words(job_description).collect();
    let jd_lower = job_description.to_lowercase();

    let mut ranked: Vec<ProjectRecommendation> = portfolio
        .projects
        .iter()
        .filter_map(|project| {
            let terms = project_terms(project);
            if terms.is_empty() {
                return None;
            }
            // Multi-word tech tags ("machine learning") are matched as phrases
            let matched: Vec<&String> = terms
                .iter()
                .filter(|t| {
                    if t.contains(' ') {
                        jd_lower.contains(t.as_str())
                    } else {
                        jd_words.contains(t.as_str())
                    }
                })
                .collect();
            if matched.is_empty() {
                return None;
            }
            let score = matched.len() as f32 / terms.len() as f32;
            let reason = format!(
                "Overlaps with the job description on: {}",
                matched
                    .iter()
                    .map(|s| s.as_str())
                    .collect::<Vec<_>>()
                    .join(", ")
            );
            Some(ProjectRecommendation {
                slug: project.slug.clone(),
                name: project.name.clone(),
                score: (score * 100.0).round() / 100.0,
                reason,
            })
        })
        .collect();

    ranked.sort_by(|a, b| b.score.total_cmp(&a.score).then_with(|| a.name.cmp(&b.name)));
    ranked.truncate(MAX_RECOMMENDATIONS);
    ranked
}

/// Keeps only picks naming a real project, once each, in model order.
fn resolve_picks(portfolio: &Portfolio, picks: Vec<LlmPick>) -> Vec<ProjectRecommendation> {
    let mut seen = HashSet::new();
    let mut out = Vec::new();
    for pick in picks {
        let Some(project) = portfolio.project(pick.slug.trim()) else {
            debug!("Dropping recommendation for unknown project '{}'", pick.slug);
            continue;
        };
        if !seen.insert(project.slug.clone()) {
            continue;
        }
        out.push(ProjectRecommendation {
            slug: project.slug.clone(),
            name: project.name.clone(),
            score: pick.score.clamp(0.0, 1.0),
            reason: pick.reason.trim().to_string(),
        });
        if out.len() == MAX_RECOMMENDATIONS {
            break;
        }
    }
    out
}

pub fn build_prompt(portfolio: &Portfolio, job_title: &str, job_description: &str) -> String {
    let projects: Vec<_> = portfolio
        .projects
        .iter()
        .map(|p| {
            json!({
                "slug": p.slug,
                "name": p.name,
                "description": p.description,
                "tech": p.tech,
            })
        })
        .collect();
    let projects_json =
        serde_json::to_string_pretty(&projects).unwrap_or_else(|_| "[]".to_string());

    PROJECTS_PROMPT_TEMPLATE
        .replace("{projects_json}", &projects_json)
        .replace("{job_title}", job_title.trim())
        .replace("{job_description}", job_description.trim())
}

pub async fn recommend_projects(
    llm: &LlmClient,
    portfolio: &Portfolio,
    job_title: &str,
    job_description: &str,
) -> (Vec<ProjectRecommendation>, GenerationSource) {
    if portfolio.projects.is_empty() {
        return (Vec::new(), GenerationSource::Fallback);
    }

    let prompt = build_prompt(portfolio, job_title, job_description);
    match llm
        .call_json::<LlmRecommendations>(&prompt, JSON_ONLY_SYSTEM)
        .await
    {
        Ok(response) => {
            let picks = resolve_picks(portfolio, response.recommendations);
            if picks.is_empty() {
                warn!("LLM recommended no known projects; using keyword overlap");
                return (
                    fallback_recommendations(portfolio, job_description),
                    GenerationSource::Fallback,
                );
            }
            info!("LLM recommended {} project(s) for {job_title}", picks.len());
            (picks, GenerationSource::Llm)
        }
        Err(LlmError::MissingApiKey) => {
            debug!("No LLM key configured; ranking projects by keyword overlap");
            (
                fallback_recommendations(portfolio, job_description),
                GenerationSource::Fallback,
            )
        }
        Err(e) => {
            warn!("Project recommendation failed, using keyword overlap: {e}");
            (
                fallback_recommendations(portfolio, job_description),
                GenerationSource::Fallback,
            )
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::llm_client::tests::{client_for, text_response};
    use crate::portfolio::tests::sample;
    use wiremock::matchers::{method, path};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    #[test]
    fn test_project_terms_skip_short_and_stop_words() {
        let portfolio = sample();
        let queue = portfolio.project("queue-lite").unwrap();
        assert_eq!(
            project_terms(queue),
            vec!["rust", "sqlite", "embedded", "persistent", "queue"]
        );
    }

    #[test]
    fn test_fallback_ranks_by_overlap() {
        let recs = fallback_recommendations(
            &sample(),
            "Backend role: Rust services with an embedded queue. Some React is a plus.",
        );
        let slugs: Vec<&str> = recs.iter().map(|r| r.slug.as_str()).collect();
        assert_eq!(slugs, vec!["queue-lite", "palette"]);
        assert_eq!(recs[0].score, 0.6);
        assert!(recs[0].reason.contains("rust"));
        assert_eq!(recs[1].score, 0.2);
    }

    #[test]
    fn test_fallback_without_overlap_is_empty() {
        assert!(fallback_recommendations(&sample(), "Pastry chef wanted").is_empty());
    }

    #[test]
    fn test_resolve_picks_drops_unknown_and_duplicates() {
        let picks = vec![
            LlmPick {
                slug: "made-up".to_string(),
                score: 0.99,
                reason: "hallucinated".to_string(),
            },
            LlmPick {
                slug: "palette".to_string(),
                score: 1.7,
                reason: " UI work ".to_string(),
            },
            LlmPick {
                slug: "palette".to_string(),
                score: 0.1,
                reason: "again".to_string(),
            },
        ];
        let recs = resolve_picks(&sample(), picks);
        assert_eq!(recs.len(), 1);
        assert_eq!(recs[0].name, "Palette");
        assert_eq!(recs[0].score, 1.0);
        assert_eq!(recs[0].reason, "UI work");
    }

    #[test]
    fn test_prompt_lists_project_slugs() {
        let prompt = build_prompt(&sample(), "Backend Engineer", "Rust");
        assert!(prompt.contains("\"queue-lite\""));
        assert!(prompt.contains("\"palette\""));
        assert!(prompt.contains("POSITION: Backend Engineer"));
    }

    #[tokio::test]
    async fn test_model_picks_are_validated() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path("/v1/messages"))
            .respond_with(ResponseTemplate::new(200).set_body_json(text_response(
                r#"{"recommendations": [
                    {"slug": "queue-lite", "score": 0.9, "reason": "Rust and queues"},
                    {"slug": "ghost", "score": 0.8, "reason": "nope"}
                ]}"#,
            )))
            .expect(1)
            .mount(&server)
            .await;

        let (recs, source) =
            recommend_projects(&client_for(&server), &sample(), "Backend Engineer", "Rust").await;
        assert_eq!(source, GenerationSource::Llm);
        assert_eq!(recs.len(), 1);
        assert_eq!(recs[0].slug, "queue-lite");
    }

    #[tokio::test]
    async fn test_missing_key_uses_overlap() {
        let llm = LlmClient::new(None, None).unwrap();
        let (recs, source) = recommend_projects(&llm, &sample(), "Frontend", "React and TypeScript").await;
        assert_eq!(source, GenerationSource::Fallback);
        assert_eq!(recs[0].slug, "palette");
    }
}
