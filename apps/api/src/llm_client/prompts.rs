// Shared prompt fragments.
// Each pipeline stage that needs model calls defines its own prompts.rs alongside it.

/// System prompt fragment that enforces JSON-only output.
pub const JSON_ONLY_SYSTEM: &str = "You MUST respond with valid JSON only. \
    Do NOT include any text outside the JSON object. \
    Do NOT use markdown code fences. \
    Do NOT include explanations or apologies.";

/// System prompt fragment that enforces the plain line format used for scoring.
pub const LINE_FORMAT_SYSTEM: &str = "You MUST follow the requested line format exactly. \
    Do NOT use markdown, tables, or JSON. \
    Do NOT add commentary before or after the requested lines.";
