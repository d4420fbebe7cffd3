//! Skill extraction from a job description.
//!
//! The model proposes technical and soft skills; without it, the description is
//! scanned for a fixed vocabulary (case-insensitive, whole words only).

use serde::{Deserialize, Serialize};
use tracing::{debug, info, warn};

use crate::generation::prompts::SKILLS_PROMPT_TEMPLATE;
use crate::generation::GenerationSource;
use crate::llm_client::prompts::JSON_ONLY_SYSTEM;
use crate::llm_client::{LlmClient, LlmError};

const MAX_TECHNICAL: usize = 12;
const MAX_SOFT: usize = 6;

/// Display name followed by the lowercase spellings that count as a mention.
type Vocabulary = &'static [(&'static str, &'static [&'static str])];

const TECHNICAL_VOCABULARY: Vocabulary = &[
    ("Rust", &["rust"]),
    ("Go", &["golang"]),
    ("Python", &["python"]),
    ("Java", &["java"]),
    ("Kotlin", &["kotlin"]),
    ("TypeScript", &["typescript"]),
    ("JavaScript", &["javascript"]),
    ("C++", &["c++"]),
    ("C#", &["c#"]),
    ("Ruby", &["ruby"]),
    ("Node.js", &["node.js", "nodejs"]),
    ("React", &["react"]),
    ("Vue", &["vue", "vue.js"]),
    ("Angular", &["angular"]),
    ("Next.js", &["next.js", "nextjs"]),
    ("GraphQL", &["graphql"]),
    ("REST APIs", &["rest", "restful"]),
    ("gRPC", &["grpc"]),
    ("PostgreSQL", &["postgresql", "postgres"]),
    ("MySQL", &["mysql"]),
    ("MongoDB", &["mongodb", "mongo"]),
    ("Redis", &["redis"]),
    ("Kafka", &["kafka"]),
    ("SQL", &["sql"]),
    ("Docker", &["docker"]),
    ("Kubernetes", &["kubernetes", "k8s"]),
    ("Terraform", &["terraform"]),
    ("AWS", &["aws", "amazon web services"]),
    ("GCP", &["gcp", "google cloud"]),
    ("Azure", &["azure"]),
    ("Linux", &["linux"]),
    ("CI/CD", &["ci/cd", "continuous integration"]),
    ("Git", &["git"]),
    ("Microservices", &["microservices", "microservice"]),
    ("Distributed Systems", &["distributed systems", "distributed system"]),
    ("Machine Learning", &["machine learning", "ml"]),
    ("Testing", &["testing", "tdd", "unit tests"]),
];

const SOFT_VOCABULARY: Vocabulary = &[
    ("Communication", &["communication", "communicate", "communicator"]),
    ("Collaboration", &["collaboration", "collaborate", "collaborative", "teamwork"]),
    ("Leadership", &["leadership", "lead", "leading"]),
    ("Mentoring", &["mentoring", "mentor", "mentorship"]),
    ("Problem Solving", &["problem solving", "problem-solving"]),
    ("Ownership", &["ownership", "own"]),
    ("Adaptability", &["adaptability", "adaptable", "fast-paced"]),
    ("Attention to Detail", &["attention to detail", "detail-oriented"]),
    ("Time Management", &["time management", "prioritize", "prioritise"]),
    ("Stakeholder Management", &["stakeholder", "stakeholders"]),
];

const DEFAULT_TECHNICAL: &[&str] = &["Software Development", "Git", "Testing"];
const DEFAULT_SOFT: &[&str] = &["Communication", "Collaboration", "Problem Solving"];

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct SkillSet {
    #[serde(default)]
    pub technical_skills: Vec<String>,
    #[serde(default)]
    pub soft_skills: Vec<String>,
}

/// True when `term` occurs in `haystack` with no alphanumeric neighbour on either side.
/// Both arguments must already be lowercase.
fn contains_term(haystack: &str, term: &str) -> bool {
    haystack.match_indices(term).any(|(start, matched)| {
        let before = haystack[..start].chars().next_back();
        let after = haystack[start + matched.len()..].chars().next();
        !before.is_some_and(char::is_alphanumeric) && !after.is_some_and(char::is_alphanumeric)
    })
}

fn scan(text: &str, vocabulary: Vocabulary, limit: usize) -> Vec<String> {
    let haystack = text.to_lowercase();
    vocabulary
        .iter()
        .filter(|(_, spellings)| spellings.iter().any(|s| contains_term(&haystack, s)))
        .map(|(name, _)| name.to_string())
        .take(limit)
        .collect()
}

/// Vocabulary scan with fixed defaults for lists that come back empty.
pub fn fallback_skills(job_description: &str) -> SkillSet {
    let mut technical_skills = scan(job_description, TECHNICAL_VOCABULARY, MAX_TECHNICAL);
    if technical_skills.is_empty() {
        technical_skills = DEFAULT_TECHNICAL.iter().map(|s| s.to_string()).collect();
    }
    let mut soft_skills = scan(job_description, SOFT_VOCABULARY, MAX_SOFT);
    if soft_skills.is_empty() {
        soft_skills = DEFAULT_SOFT.iter().map(|s| s.to_string()).collect();
    }
    SkillSet {
        technical_skills,
        soft_skills,
    }
}

fn clean(list: Vec<String>, limit: usize) -> Vec<String> {
    let mut out: Vec<String> = Vec::new();
    for skill in list {
        let skill = skill.trim();
        if skill.is_empty() || out.iter().any(|s| s.eq_ignore_ascii_case(skill)) {
            continue;
        }
        out.push(skill.to_string());
        if out.len() == limit {
            break;
        }
    }
    out
}

/// Trims, de-duplicates and caps model output.
fn normalize(set: SkillSet) -> SkillSet {
    SkillSet {
        technical_skills: clean(set.technical_skills, MAX_TECHNICAL),
        soft_skills: clean(set.soft_skills, MAX_SOFT),
    }
}

pub async fn extract_skills(llm: &LlmClient, job_description: &str) -> (SkillSet, GenerationSource) {
    let prompt = SKILLS_PROMPT_TEMPLATE.replace("{job_description}", job_description.trim());
    match llm.call_json::<SkillSet>(&prompt, JSON_ONLY_SYSTEM).await {
        Ok(set) => {
            let set = normalize(set);
            if set.technical_skills.is_empty() && set.soft_skills.is_empty() {
                warn!("LLM returned no skills; using vocabulary scan");
                return (fallback_skills(job_description), GenerationSource::Fallback);
            }
            info!(
                "Skills extracted: {} technical, {} soft",
                set.technical_skills.len(),
                set.soft_skills.len()
            );
            (set, GenerationSource::Llm)
        }
        Err(LlmError::MissingApiKey) => {
            debug!("No LLM key configured; using vocabulary scan");
            (fallback_skills(job_description), GenerationSource::Fallback)
        }
        Err(e) => {
            warn!("Skill extraction failed, using vocabulary scan: {e}");
            (fallback_skills(job_description), GenerationSource::Fallback)
        }
    }
}
