//! Rendering a [`ContextPayload`] into the messages sent to the model.
//!
//! The model receives exactly two messages: one `system` message holding the
//! directive, the retrieved passages and the recent dialogue, then the user's
//! question.

use lexi_core::{ChatMessage, GenerationRequest};
use lexi_rag::ContextPayload;

use crate::config::ChatConfig;

const NO_PASSAGES: &str = "No document passages are available for this question.";
const NO_HISTORY: &str = "This is the start of the conversation.";

/// The system prompt for one turn.
pub fn system_prompt(directive: &str, payload: &ContextPayload) -> String {
    let mut prompt = String::with_capacity(directive.len() + 256);
    prompt.push_str(directive.trim());

    prompt.push_str("\n\nDocument passages:\n");
    if payload.has_context() {
        for (rank, unit) in payload.retrieved_units().enumerate() {
            prompt.push_str(&format!(
                "[{}] {} (position {}, page {}):\n{}\n",
                rank + 1,
                unit.source_id,
                unit.position,
                unit.page,
                unit.content
            ));
        }
    } else {
        prompt.push_str(NO_PASSAGES);
        prompt.push('\n');
    }

    prompt.push_str("\nRecent conversation:\n");
    if payload.recent_turns.is_empty() {
        prompt.push_str(NO_HISTORY);
        prompt.push('\n');
    } else {
        for turn in &payload.recent_turns {
            prompt.push_str(&format!("{}: {}\n", turn.role, turn.content));
        }
    }

    prompt
}

/// `Sources: a.pdf, b.pdf`, or `None` without sources.
pub fn citation_line<'a, I>(sources: I) -> Option<String>
where
    I: IntoIterator<Item = &'a String>,
{
    let names: Vec<&str> = sources.into_iter().map(String::as_str).collect();
    if names.is_empty() { None } else { Some(format!("Sources: {}", names.join(", "))) }
}

/// System message followed by the user's message.
pub fn build_messages(directive: &str, payload: &ContextPayload, query: &str) -> Vec<ChatMessage> {
    vec![ChatMessage::system(system_prompt(directive, payload)), ChatMessage::user(query)]
}

/// The full request for `query` under `config`.
pub fn build_request(config: &ChatConfig, payload: &ContextPayload, query: &str) -> GenerationRequest {
    GenerationRequest::new(config.model.clone(), build_messages(&config.directive, payload, query))
        .with_temperature(config.temperature)
}
