use crate::knowledge::KnowledgeEntry;

pub const SUPPORT_SYSTEM_PROMPT: &str = "You are a customer support agent for Thoughtful AI, a company that builds AI automation agents for healthcare revenue-cycle work. Help users with questions about Thoughtful AI's products and services. Keep answers friendly, professional and concise.";

const CONTEXT_HEADER: &str = "Here is relevant information from our knowledge base:";

const CONTEXT_USAGE_HINT: &str = "Use the information above when the question is about our agents (EVA, CAM, PHIL). For other questions, give a helpful general answer.";

/// Shown for empty or whitespace-only input.
pub const VALIDATION_MESSAGE: &str =
    "Please ask me a question about Thoughtful AI's agents (EVA, CAM or PHIL).";

/// Shown on a miss when no completion service is configured.
pub const NO_INFORMATION_MESSAGE: &str = "I'm sorry, I don't have specific information about that topic. I can help with Thoughtful AI's automation agents (EVA, CAM and PHIL). Could you rephrase your question or ask about one of them?";

/// Shown when the completion service fails or times out.
pub const DEGRADED_MESSAGE: &str = "I'm having trouble answering that right now. Please try again in a moment, or ask about Thoughtful AI's agents (EVA, CAM or PHIL).";

/// System instruction for a fallback completion. `context` entries are
/// listed in the given order as a numbered Q/A block.
pub fn render_system_prompt(context: &[&KnowledgeEntry]) -> String {
    if context.is_empty() {
        return SUPPORT_SYSTEM_PROMPT.to_string();
    }

    let mut prompt = format!("{SUPPORT_SYSTEM_PROMPT}\n\n{CONTEXT_HEADER}\n\n");
    for (position, entry) in context.iter().enumerate() {
        prompt.push_str(&format!(
            "{}. Q: {}\n   A: {}\n\n",
            position + 1,
            entry.question,
            entry.answer
        ));
    }
    prompt.push_str(CONTEXT_USAGE_HINT);
    prompt
}
