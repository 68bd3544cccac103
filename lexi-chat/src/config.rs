//! Session configuration.

use lexi_rag::RagConfig;
use serde::{Deserialize, Serialize};

use crate::error::{ChatError, Result};

/// Model used when none is configured.
pub const DEFAULT_MODEL: &str = "gpt-4-32k";

/// Sampling temperature used when none is configured.
pub const DEFAULT_TEMPERATURE: f32 = 0.3;

/// Opening assistant message of every conversation.
pub const DEFAULT_GREETING: &str = "Welcome to Lexi! Upload any legal document and ask me about it. \
I will explain complex legal language in clear, straightforward terms, whatever your level of legal expertise.";

/// Behavioural instructions placed at the top of every system prompt.
pub const DEFAULT_DIRECTIVE: &str = "You are a knowledgeable and approachable legal assistant who \
specializes in simplifying complex legal language. Users upload legal documents and ask questions \
about them. Break down complex terms and give clear, concise explanations in a friendly, professional \
tone. Base your answers on the document passages below and name the source of every passage you rely \
on. If the passages do not answer the question, say so instead of guessing.";

/// Configuration of a [`ChatSession`](crate::ChatSession).
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ChatConfig {
    /// Model name passed to the [`ChatModel`](lexi_core::ChatModel).
    pub model: String,
    /// Sampling temperature, 0.0 to 2.0.
    pub temperature: f32,
    pub greeting: String,
    pub directive: String,
    pub rag: RagConfig,
}

impl Default for ChatConfig {
    fn default() -> Self {
        Self {
            model: DEFAULT_MODEL.to_string(),
            temperature: DEFAULT_TEMPERATURE,
            greeting: DEFAULT_GREETING.to_string(),
            directive: DEFAULT_DIRECTIVE.to_string(),
            rag: RagConfig::default(),
        }
    }
}

impl ChatConfig {
    pub fn builder() -> ChatConfigBuilder {
        ChatConfigBuilder::default()
    }

    /// Check the chat settings and the nested [`RagConfig`].
    pub fn validate(&self) -> Result<()> {
        if self.model.trim().is_empty() {
            return Err(ChatError::Config("model must not be empty".to_string()));
        }
        if !(0.0..=2.0).contains(&self.temperature) {
            return Err(ChatError::Config(format!(
                "temperature ({}) must be between 0.0 and 2.0",
                self.temperature
            )));
        }
        self.rag.validate()?;
        Ok(())
    }
}

/// Builder for [`ChatConfig`].
#[derive(Debug, Default)]
pub struct ChatConfigBuilder {
    config: ChatConfig,
}

impl ChatConfigBuilder {
    pub fn model(mut self, model: impl Into<String>) -> Self {
        self.config.model = model.into();
        self
    }

    pub fn temperature(mut self, temperature: f32) -> Self {
        self.config.temperature = temperature;
        self
    }

    pub fn greeting(mut self, greeting: impl Into<String>) -> Self {
        self.config.greeting = greeting.into();
        self
    }

    pub fn directive(mut self, directive: impl Into<String>) -> Self {
        self.config.directive = directive.into();
        self
    }

    pub fn rag(mut self, rag: RagConfig) -> Self {
        self.config.rag = rag;
        self
    }

    /// Build and validate the configuration.
    pub fn build(self) -> Result<ChatConfig> {
        self.config.validate()?;
        Ok(self.config)
    }
}
