//! Scripted model for tests and offline runs.

use std::collections::VecDeque;
use std::sync::Mutex;

use async_stream::stream;
use async_trait::async_trait;
use tracing::debug;

use crate::error::{CoreError, Result};
use crate::model::{ChatModel, GenerationRequest, GenerationStream};

#[derive(Debug, Clone)]
enum Script {
    Reply(Vec<String>),
    FailMidStream { fragments: Vec<String>, message: String },
    Reject(String),
}

/// A [`ChatModel`] that replays scripted responses in order.
///
/// Every request is recorded so tests can inspect the prompts that were sent.
/// When the script runs out the model answers with its fallback reply.
///
/// # Example
///
/// ```rust,ignore
/// use lexi_core::{ChatMessage, ChatModel, GenerationRequest, MockModel};
///
/// let model = MockModel::new().with_reply(["Hello", ", world"]);
/// let request = GenerationRequest::new("mock", vec![ChatMessage::user("hi")]);
/// let stream = model.generate(request).await?;
/// assert_eq!(stream.collect_text().await?, "Hello, world");
/// ```
#[derive(Debug)]
pub struct MockModel {
    name: String,
    script: Mutex<VecDeque<Script>>,
    fallback: Vec<String>,
    requests: Mutex<Vec<GenerationRequest>>,
}

impl Default for MockModel {
    fn default() -> Self {
        Self::new()
    }
}

impl MockModel {
    pub fn new() -> Self {
        Self {
            name: "mock".to_string(),
            script: Mutex::new(VecDeque::new()),
            fallback: vec!["I could not find an answer.".to_string()],
            requests: Mutex::new(Vec::new()),
        }
    }

    pub fn with_name(mut self, name: impl Into<String>) -> Self {
        self.name = name.into();
        self
    }

    /// Queue a successful reply streamed as the given fragments.
    pub fn with_reply<I, S>(self, fragments: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.push(Script::Reply(fragments.into_iter().map(Into::into).collect()))
    }

    /// Queue a reply that streams `fragments` and then fails.
    pub fn with_failure_after<I, S>(self, fragments: I, message: impl Into<String>) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.push(Script::FailMidStream {
            fragments: fragments.into_iter().map(Into::into).collect(),
            message: message.into(),
        })
    }

    /// Queue an outright rejection of the request.
    pub fn with_rejection(self, message: impl Into<String>) -> Self {
        self.push(Script::Reject(message.into()))
    }

    /// Requests received so far, oldest first.
    pub fn requests(&self) -> Vec<GenerationRequest> {
        self.requests.lock().map(|r| r.clone()).unwrap_or_default()
    }

    pub fn request_count(&self) -> usize {
        self.requests.lock().map(|r| r.len()).unwrap_or_default()
    }

    fn push(self, script: Script) -> Self {
        if let Ok(mut queue) = self.script.lock() {
            queue.push_back(script);
        }
        self
    }

    fn next_script(&self) -> Script {
        self.script
            .lock()
            .ok()
            .and_then(|mut queue| queue.pop_front())
            .unwrap_or_else(|| Script::Reply(self.fallback.clone()))
    }
}

#[async_trait]
impl ChatModel for MockModel {
    fn name(&self) -> &str {
        &self.name
    }

    async fn generate(&self, request: GenerationRequest) -> Result<GenerationStream> {
        request.validate()?;
        debug!(model = %self.name, messages = request.messages.len(), "mock generation requested");
        if let Ok(mut requests) = self.requests.lock() {
            requests.push(request);
        }

        let model = self.name.clone();
        match self.next_script() {
            Script::Reply(fragments) => Ok(GenerationStream::from_fragments(fragments)),
            Script::Reject(message) => Err(CoreError::generation(model, message)),
            Script::FailMidStream { fragments, message } => {
                Ok(GenerationStream::from_stream(stream! {
                    for fragment in fragments {
                        yield Ok(fragment);
                    }
                    yield Err(CoreError::generation(model, message));
                }))
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::ChatMessage;

    fn request() -> GenerationRequest {
        GenerationRequest::new("mock", vec![ChatMessage::user("hello")])
    }

    #[tokio::test]
    async fn replays_script_in_order_then_falls_back() {
        let model = MockModel::new().with_reply(["one"]).with_rejection("quota exceeded");

        let first = model.generate(request()).await.unwrap();
        assert_eq!(first.collect_text().await.unwrap(), "one");

        let second = model.generate(request()).await;
        assert!(matches!(second, Err(CoreError::Generation { .. })));

        let third = model.generate(request()).await.unwrap();
        assert_eq!(third.collect_text().await.unwrap(), "I could not find an answer.");
        assert_eq!(model.request_count(), 3);
    }

    #[tokio::test]
    async fn failure_after_fragments_surfaces_partial_output_first() {
        let model = MockModel::new().with_failure_after(["par", "tial"], "stream reset");
        let mut stream = model.generate(request()).await.unwrap();

        assert_eq!(stream.next_fragment().await, Some(Ok("par".to_string())));
        assert_eq!(stream.next_fragment().await, Some(Ok("tial".to_string())));
        assert!(matches!(stream.next_fragment().await, Some(Err(_))));
        assert_eq!(stream.next_fragment().await, None);
    }
}
