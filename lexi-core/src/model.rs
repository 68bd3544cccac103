//! The generative model contract.
//!
//! A [`ChatModel`] takes an ordered list of role-tagged messages and returns a
//! [`GenerationStream`] of text fragments. How the model is reached (HTTP,
//! local inference, a test double) is up to the implementation.

use std::pin::Pin;
use std::task::{Context, Poll};

use async_trait::async_trait;
use futures::{Stream, StreamExt};
use serde::{Deserialize, Serialize};

use crate::conversation::{ConversationTurn, Role};
use crate::error::{CoreError, Result};

/// A boxed stream of fragments as produced by a model backend.
pub type FragmentStream = Pin<Box<dyn Stream<Item = Result<String>> + Send>>;

/// A single message sent to the model.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ChatMessage {
    pub role: Role,
    pub content: String,
}

impl ChatMessage {
    pub fn new(role: Role, content: impl Into<String>) -> Self {
        Self { role, content: content.into() }
    }

    pub fn system(content: impl Into<String>) -> Self {
        Self::new(Role::System, content)
    }

    pub fn user(content: impl Into<String>) -> Self {
        Self::new(Role::User, content)
    }

    pub fn assistant(content: impl Into<String>) -> Self {
        Self::new(Role::Assistant, content)
    }
}

impl From<&ConversationTurn> for ChatMessage {
    fn from(turn: &ConversationTurn) -> Self {
        Self::new(turn.role, turn.content.clone())
    }
}

/// Everything a model needs for one completion.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct GenerationRequest {
    pub model: String,
    pub messages: Vec<ChatMessage>,
    pub temperature: f32,
}

impl GenerationRequest {
    pub fn new(model: impl Into<String>, messages: Vec<ChatMessage>) -> Self {
        Self { model: model.into(), messages, temperature: 0.3 }
    }

    pub fn with_temperature(mut self, temperature: f32) -> Self {
        self.temperature = temperature;
        self
    }

    /// Reject requests no backend could answer.
    pub fn validate(&self) -> Result<()> {
        if self.messages.is_empty() {
            return Err(CoreError::InvalidRequest("at least one message is required".into()));
        }
        if !(0.0..=2.0).contains(&self.temperature) {
            return Err(CoreError::InvalidRequest(format!(
                "temperature {} is outside 0.0..=2.0",
                self.temperature
            )));
        }
        Ok(())
    }
}

/// A generative capability: messages in, a lazy sequence of fragments out.
#[async_trait]
pub trait ChatModel: Send + Sync {
    /// Identifier used in logs and error messages.
    fn name(&self) -> &str;

    /// Start a generation.
    ///
    /// Returns an error if the request is rejected outright; failures after
    /// streaming has started arrive as `Err` items on the stream.
    async fn generate(&self, request: GenerationRequest) -> Result<GenerationStream>;
}

/// A finite, single-use stream of generated text fragments.
///
/// The stream ends for good after it yields `None` or its first error: every
/// later poll returns `None`. A drained stream is never restarted; a new
/// generation must be requested instead.
pub struct GenerationStream {
    inner: Option<FragmentStream>,
}

impl GenerationStream {
    pub fn new(inner: FragmentStream) -> Self {
        Self { inner: Some(inner) }
    }

    /// Wrap any fragment stream.
    pub fn from_stream<S>(stream: S) -> Self
    where
        S: Stream<Item = Result<String>> + Send + 'static,
    {
        Self::new(Box::pin(stream))
    }

    /// A stream over a fixed list of fragments.
    pub fn from_fragments<I>(fragments: I) -> Self
    where
        I: IntoIterator<Item = String>,
        I::IntoIter: Send + 'static,
    {
        Self::from_stream(futures::stream::iter(fragments.into_iter().map(Ok)))
    }

    /// Next fragment, or `None` once the stream is over.
    pub async fn next_fragment(&mut self) -> Option<Result<String>> {
        self.next().await
    }

    pub fn is_exhausted(&self) -> bool {
        self.inner.is_none()
    }

    /// Drain the remaining fragments into one string.
    pub async fn collect_text(mut self) -> Result<String> {
        let mut text = String::new();
        while let Some(fragment) = self.next_fragment().await {
            text.push_str(&fragment?);
        }
        Ok(text)
    }
}

impl std::fmt::Debug for GenerationStream {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("GenerationStream").field("exhausted", &self.is_exhausted()).finish()
    }
}

impl Stream for GenerationStream {
    type Item = Result<String>;

    fn poll_next(self: Pin<&mut Self>, cx: &mut Context<'_>) -> Poll<Option<Self::Item>> {
        let this = self.get_mut();
        let Some(inner) = this.inner.as_mut() else {
            return Poll::Ready(None);
        };
        match inner.as_mut().poll_next(cx) {
            Poll::Ready(Some(Ok(fragment))) => Poll::Ready(Some(Ok(fragment))),
            Poll::Ready(Some(Err(e))) => {
                this.inner = None;
                Poll::Ready(Some(Err(e)))
            }
            Poll::Ready(None) => {
                this.inner = None;
                Poll::Ready(None)
            }
            Poll::Pending => Poll::Pending,
        }
    }
}
