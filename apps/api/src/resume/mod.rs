// Resume skill rating: upload → Gemini → JSON extraction with a fixed fallback.

pub mod analysis;
pub mod handlers;
pub mod prompts;
