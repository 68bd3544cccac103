//! Conversation turns and the session chat log.

use std::fmt;

use serde::{Deserialize, Serialize};

/// Who authored a turn.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Role {
    User,
    Assistant,
    System,
}

impl Role {
    pub fn as_str(&self) -> &'static str {
        match self {
            Role::User => "user",
            Role::Assistant => "assistant",
            Role::System => "system",
        }
    }
}

impl fmt::Display for Role {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Distinguishes dialogue from the canned welcome message.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TurnKind {
    #[default]
    Message,
    /// Shown to the user on session start; never sent back to the model.
    Greeting,
}

/// One entry of the conversation log.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ConversationTurn {
    pub role: Role,
    pub content: String,
    #[serde(default)]
    pub kind: TurnKind,
    /// Set when the generation that produced this turn failed or was
    /// interrupted; `content` then holds whatever arrived before that.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

impl ConversationTurn {
    pub fn new(role: Role, content: impl Into<String>) -> Self {
        Self { role, content: content.into(), kind: TurnKind::Message, error: None }
    }

    pub fn user(content: impl Into<String>) -> Self {
        Self::new(Role::User, content)
    }

    pub fn assistant(content: impl Into<String>) -> Self {
        Self::new(Role::Assistant, content)
    }

    pub fn system(content: impl Into<String>) -> Self {
        Self::new(Role::System, content)
    }

    pub fn greeting(content: impl Into<String>) -> Self {
        Self { kind: TurnKind::Greeting, ..Self::assistant(content) }
    }

    /// Attach an error marker to this turn.
    pub fn with_error(mut self, error: impl Into<String>) -> Self {
        self.error = Some(error.into());
        self
    }

    pub fn is_greeting(&self) -> bool {
        self.kind == TurnKind::Greeting
    }

    pub fn is_error(&self) -> bool {
        self.error.is_some()
    }

    /// Whether this turn takes part in the dialogue window handed to the model.
    pub fn is_dialogue(&self) -> bool {
        self.role != Role::System && !self.is_greeting()
    }
}

/// The log of a session's turns.
///
/// Turns are appended and only removed by [`clear_dialogue`](Self::clear_dialogue).
/// Windowing for prompt assembly goes through
/// [`recent_dialogue`](Self::recent_dialogue), which copies instead of truncating.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ConversationHistory {
    turns: Vec<ConversationTurn>,
}

impl ConversationHistory {
    pub fn new() -> Self {
        Self::default()
    }

    /// A history that starts with a greeting turn.
    pub fn with_greeting(greeting: impl Into<String>) -> Self {
        let mut history = Self::new();
        history.push(ConversationTurn::greeting(greeting));
        history
    }

    pub fn push(&mut self, turn: ConversationTurn) {
        self.turns.push(turn);
    }

    pub fn turns(&self) -> &[ConversationTurn] {
        &self.turns
    }

    pub fn iter(&self) -> impl Iterator<Item = &ConversationTurn> {
        self.turns.iter()
    }

    pub fn last(&self) -> Option<&ConversationTurn> {
        self.turns.last()
    }

    pub fn len(&self) -> usize {
        self.turns.len()
    }

    pub fn is_empty(&self) -> bool {
        self.turns.is_empty()
    }

    /// The last `window` dialogue turns in chronological order.
    ///
    /// System turns and greetings are skipped. The result never holds more
    /// than `window` entries.
    pub fn recent_dialogue(&self, window: usize) -> Vec<ConversationTurn> {
        let mut recent: Vec<ConversationTurn> =
            self.turns.iter().rev().filter(|t| t.is_dialogue()).take(window).cloned().collect();
        recent.reverse();
        recent
    }

    /// Keep only greeting turns (the state of a freshly started session).
    pub fn clear_dialogue(&mut self) {
        self.turns.retain(ConversationTurn::is_greeting);
    }
}

impl FromIterator<ConversationTurn> for ConversationHistory {
    fn from_iter<I: IntoIterator<Item = ConversationTurn>>(iter: I) -> Self {
        Self { turns: iter.into_iter().collect() }
    }
}

impl<'a> IntoIterator for &'a ConversationHistory {
    type Item = &'a ConversationTurn;
    type IntoIter = std::slice::Iter<'a, ConversationTurn>;

    fn into_iter(self) -> Self::IntoIter {
        self.turns.iter()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn recent_dialogue_skips_greeting_and_system_turns() {
        let mut history = ConversationHistory::with_greeting("Welcome");
        history.push(ConversationTurn::user("q1"));
        history.push(ConversationTurn::assistant("a1"));
        history.push(ConversationTurn::system("note"));
        history.push(ConversationTurn::user("q2"));

        let recent = history.recent_dialogue(2);
        assert_eq!(recent, vec![ConversationTurn::assistant("a1"), ConversationTurn::user("q2")]);
    }

    #[test]
    fn recent_dialogue_with_short_history_returns_everything_in_order() {
        let mut history = ConversationHistory::with_greeting("Welcome");
        history.push(ConversationTurn::user("only"));

        assert_eq!(history.recent_dialogue(2), vec![ConversationTurn::user("only")]);
        assert!(history.recent_dialogue(0).is_empty());
    }

    #[test]
    fn clear_dialogue_keeps_greeting() {
        let mut history = ConversationHistory::with_greeting("Welcome");
        history.push(ConversationTurn::user("q"));
        history.push(ConversationTurn::assistant("partial").with_error("boom"));

        history.clear_dialogue();
        assert_eq!(history.len(), 1);
        assert!(history.turns()[0].is_greeting());
    }

    #[test]
    fn turn_serializes_with_lowercase_role_and_no_empty_error() {
        let json = serde_json::to_value(ConversationTurn::assistant("hi")).unwrap();
        assert_eq!(json["role"], "assistant");
        assert_eq!(json["kind"], "message");
        assert!(json.get("error").is_none());
    }
}
