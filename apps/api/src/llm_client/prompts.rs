// Shared prompt fragments. Feature modules keep their own prompts next to them
// and may append these.

/// Appended to every prompt whose answer is parsed as JSON.
pub const JSON_ONLY_INSTRUCTION: &str =
    "Respond with ONLY the JSON object, no explanations or other text.";
