// Shared prompt constants for the career assistant.
// The chat gateway assembles these with the user's context and transcript.

/// Fixed preamble opening every completion prompt.
pub const CAREER_ASSISTANT_PREAMBLE: &str = "You are an expert AI career assistant. \
    Provide concise, actionable guidance.\n\
    Prioritize clarity, bullet points, and step-by-step suggestions.\n\
    Use the provided user context (documents and jobs) when relevant. \
    If context is missing, ask a clarifying question.";

/// Instruction closing every completion prompt.
pub const RESPOND_INSTRUCTION: &str =
    "Respond as the assistant with helpful, specific advice.";

/// Placeholder line for an empty context section.
pub const NONE_PLACEHOLDER: &str = "None";
