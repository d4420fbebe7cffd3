// Shared prompt fragments.
// Each service that needs LLM calls defines its own prompts.rs alongside it.

/// System prompt fragment that enforces JSON-only output.
pub const JSON_ONLY_SYSTEM: &str = "You are a precise, structured assistant. \
    You MUST respond with valid JSON only. \
    Do NOT include any text outside the JSON object. \
    Do NOT use markdown code fences. \
    Do NOT include explanations or apologies.";

/// Appended to every prompt that writes on the owner's behalf.
pub const FACTS_ONLY_INSTRUCTION: &str = "\
    Only use facts present in the material provided below. \
    Do NOT invent employers, dates, metrics, degrees or technologies. \
    If the material does not support a claim, leave it out.";
