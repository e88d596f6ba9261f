// Shared prompt fragments used by every LLM call.
// Stage-specific prompts live next to the pipeline in analysis/prompts.rs.

/// System prompt fragment that enforces JSON-object output.
pub const JSON_ONLY_SYSTEM: &str = "You are a precise, structured assistant. \
    You MUST respond with a single valid JSON object only. \
    Do NOT include any text outside the JSON object. \
    Do NOT use markdown code fences. \
    Do NOT include explanations or apologies.";

/// Closing line appended to every stage instruction.
pub const JSON_OBJECT_REQUEST: &str = "Format your response as a JSON object.";
