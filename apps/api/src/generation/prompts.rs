// All LLM prompt constants for the Generation module.
// Reuses cross-cutting fragments from llm_client::prompts.

/// System prompt for cover letters. Plain text output, no JSON.
pub const COVER_LETTER_SYSTEM: &str = "You are an experienced career writer drafting a \
    cover letter in the first person on behalf of the candidate. \
    Respond with the letter text only: no subject line, no markdown, no commentary. \
    Separate paragraphs with a blank line.";

/// Cover letter prompt template.
/// Replace: {facts_instruction}, {tone_guidance}, {candidate_profile},
///          {company_name}, {job_title}, {job_description}
pub const COVER_LETTER_PROMPT_TEMPLATE: &str = r#"{facts_instruction}

Write a cover letter for the position below.

TONE: {tone_guidance}

LENGTH: 3 to 5 short paragraphs, under 350 words in total.
Open with "Dear {company_name} team," and close with "Kind regards," followed by the candidate's name.
Connect two or three concrete items from the candidate profile to the needs in the job description.

CANDIDATE PROFILE:
{candidate_profile}

COMPANY: {company_name}
POSITION: {job_title}

JOB DESCRIPTION:
{job_description}"#;

/// Skill extraction prompt template. Replace `{job_description}` before sending.
pub const SKILLS_PROMPT_TEMPLATE: &str = r#"Extract the skills a candidate should highlight for the job description below.

Return a JSON object with this EXACT schema (no extra fields):
{
  "technical_skills": ["Rust", "PostgreSQL"],
  "soft_skills": ["Communication"]
}

Rules:
- technical_skills: languages, frameworks, tools, platforms and technical practices. At most 12.
- soft_skills: interpersonal and working-style skills. At most 6.
- Use the canonical capitalisation of each technology ("PostgreSQL", not "postgres").
- Only include skills the job description actually asks for or clearly implies.

JOB DESCRIPTION:
{job_description}"#;

/// Project recommendation prompt template.
/// Replace: {projects_json}, {job_title}, {job_description}
pub const PROJECTS_PROMPT_TEMPLATE: &str = r#"Pick the portfolio projects most relevant to the job below.

Return a JSON object with this EXACT schema (no extra fields):
{
  "recommendations": [
    {"slug": "project-slug", "score": 0.9, "reason": "One sentence on why it fits."}
  ]
}

Rules:
- Choose at most 3 projects, best first.
- "slug" MUST be one of the slugs listed under PROJECTS. Never invent a project.
- "score" is relevance between 0.0 and 1.0.

PROJECTS:
{projects_json}

POSITION: {job_title}

JOB DESCRIPTION:
{job_description}"#;
