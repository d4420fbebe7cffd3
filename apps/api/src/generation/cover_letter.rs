//! Cover letter generation with a deterministic template fallback.

use serde::Deserialize;
use tracing::{debug, info, warn};

use crate::generation::prompts::{COVER_LETTER_PROMPT_TEMPLATE, COVER_LETTER_SYSTEM};
use crate::generation::tone::Tone;
use crate::generation::GenerationSource;
use crate::llm_client::prompts::FACTS_ONLY_INSTRUCTION;
use crate::llm_client::{LlmClient, LlmError};
use crate::portfolio::Portfolio;

/// Longest job description forwarded to the model.
const MAX_JOB_DESCRIPTION_CHARS: usize = 8_000;

#[derive(Debug, Clone, Deserialize)]
pub struct CoverLetterInput {
    pub company_name: String,
    pub job_title: String,
    #[serde(default)]
    pub job_description: String,
    #[serde(default)]
    pub tone: Tone,
}

/// Compact plain-text summary of the owner used as grounding for the model.
pub fn candidate_profile(portfolio: &Portfolio) -> String {
    let owner = &portfolio.owner;
    let mut lines = vec![format!("Name: {}", owner.name), format!("Headline: {}", owner.headline)];
    if let Some(summary) = &owner.summary {
        lines.push(format!("Summary: {summary}"));
    }

    if !portfolio.experience.is_empty() {
        lines.push("Experience:".to_string());
        for e in &portfolio.experience {
            let mut line = format!("- {} at {} ({})", e.role, e.company, e.period());
            if !e.highlights.is_empty() {
                line.push_str(&format!(": {}", e.highlights.join("; ")));
            }
            if !e.tech.is_empty() {
                line.push_str(&format!(" [{}]", e.tech.join(", ")));
            }
            lines.push(line);
        }
    }

    if !portfolio.projects.is_empty() {
        lines.push("Projects:".to_string());
        for p in &portfolio.projects {
            let mut line = format!("- {}: {}", p.name, p.description);
            if !p.tech.is_empty() {
                line.push_str(&format!(" [{}]", p.tech.join(", ")));
            }
            lines.push(line);
        }
    }

    for ed in &portfolio.education {
        lines.push(format!("Education: {} ({}), {}", ed.degree, ed.institution, ed.period()));
    }

    lines.join("\n")
}

fn truncate_chars(text: &str, max: usize) -> &str {
    match text.char_indices().nth(max) {
        Some((idx, _)) => &text[..idx],
        None => text,
    }
}

pub fn build_prompt(input: &CoverLetterInput, portfolio: &Portfolio) -> String {
    COVER_LETTER_PROMPT_TEMPLATE
        .replace("{facts_instruction}", FACTS_ONLY_INSTRUCTION)
        .replace("{tone_guidance}", input.tone.guidance())
        .replace("{candidate_profile}", &candidate_profile(portfolio))
        .replace("{company_name}", input.company_name.trim())
        .replace("{job_title}", input.job_title.trim())
        .replace(
            "{job_description}",
            truncate_chars(input.job_description.trim(), MAX_JOB_DESCRIPTION_CHARS),
        )
}

/// Template letter built only from the inputs and the portfolio owner.
pub fn fallback_cover_letter(input: &CoverLetterInput, portfolio: &Portfolio) -> String {
    let company = input.company_name.trim();
    let title = input.job_title.trim();
    let owner = &portfolio.owner;

    let mut paragraphs = vec![
        format!("Dear {company} team,"),
        format!(
            "{} As a {}, I am keen to bring my experience to your team.",
            input.tone.fallback_opening(title, company),
            owner.headline.trim().to_lowercase()
        ),
    ];

    if let Some(latest) = portfolio.experience.first() {
        let mut body = format!(
            "Most recently I have worked as {} at {}.",
            latest.role, latest.company
        );
        if let Some(highlight) = latest.highlights.first() {
            body.push_str(&format!(" Highlights include: {}.", highlight.trim_end_matches('.')));
        }
        paragraphs.push(body);
    }

    paragraphs.push(format!(
        "I would welcome the opportunity to discuss how I can contribute to {company} as your next {title}."
    ));
    paragraphs.push(format!("Kind regards,\n{}", owner.name));

    paragraphs.join("\n\n")
}

/// Generates a letter with the model, falling back to the template on any failure.
pub async fn generate_cover_letter(
    llm: &LlmClient,
    portfolio: &Portfolio,
    input: &CoverLetterInput,
) -> (String, GenerationSource) {
    let prompt = build_prompt(input, portfolio);
    match llm.call_text(&prompt, COVER_LETTER_SYSTEM).await {
        Ok(letter) => {
            info!(
                "Cover letter generated for {} at {} ({} chars)",
                input.job_title,
                input.company_name,
                letter.len()
            );
            (letter, GenerationSource::Llm)
        }
        Err(LlmError::MissingApiKey) => {
            debug!("No LLM key configured; using template cover letter");
            (fallback_cover_letter(input, portfolio), GenerationSource::Fallback)
        }
        Err(e) => {
            warn!("Cover letter generation failed, using template: {e}");
            (fallback_cover_letter(input, portfolio), GenerationSource::Fallback)
        }
    }
}
