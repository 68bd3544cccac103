//! Streaming one reply into the session history.

use async_trait::async_trait;
use lexi_core::{ConversationTurn, CoreError, GenerationStream};
use lexi_rag::ContextPayload;
use serde::{Deserialize, Serialize};
use tokio::sync::mpsc;
use tracing::{debug, error, info, warn};

use crate::error::{ChatError, Result};
use crate::prompt;
use crate::session::{ChatSession, SessionState};

/// Error recorded on a reply that was abandoned before the stream ended.
pub const INTERRUPTED: &str = "interrupted";

/// Receives reply fragments as they arrive.
///
/// Implemented for closures taking `&str` and for tokio channel senders.
#[async_trait]
pub trait FragmentSink: Send {
    async fn accept(&mut self, fragment: &str);
}

#[async_trait]
impl<F> FragmentSink for F
where
    F: FnMut(&str) + Send,
{
    async fn accept(&mut self, fragment: &str) {
        (self)(fragment)
    }
}

#[async_trait]
impl FragmentSink for mpsc::Sender<String> {
    async fn accept(&mut self, fragment: &str) {
        if self.send(fragment.to_string()).await.is_err() {
            debug!("fragment receiver closed");
        }
    }
}

#[async_trait]
impl FragmentSink for mpsc::UnboundedSender<String> {
    async fn accept(&mut self, fragment: &str) {
        if self.send(fragment.to_string()).is_err() {
            debug!("fragment receiver closed");
        }
    }
}

/// A completed reply.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TurnOutcome {
    /// The full reply text.
    pub text: String,
    /// Documents the retrieved passages came from, sorted.
    pub sources: Vec<String>,
    /// The context the reply was generated from.
    pub payload: ContextPayload,
}

impl TurnOutcome {
    /// `Sources: a.pdf, b.pdf`, or `None` if no passages were used.
    pub fn citation_line(&self) -> Option<String> {
        prompt::citation_line(&self.sources)
    }
}

/// An in-flight reply.
///
/// Holds the session mutably, so no other turn can start until this one is
/// finished or dropped. Completion appends the reply to the history; a
/// generation error appends the partial reply with the error attached; a
/// turn dropped early appends the partial reply marked [`INTERRUPTED`].
pub struct Turn<'s> {
    session: &'s mut ChatSession,
    stream: GenerationStream,
    payload: ContextPayload,
    text: String,
    done: bool,
}

impl<'s> Turn<'s> {
    pub(crate) fn new(session: &'s mut ChatSession, stream: GenerationStream, payload: ContextPayload) -> Self {
        Self { session, stream, payload, text: String::new(), done: false }
    }

    /// The context this turn was generated from.
    pub fn payload(&self) -> &ContextPayload {
        &self.payload
    }

    /// Text received so far.
    pub fn text(&self) -> &str {
        &self.text
    }

    pub fn is_done(&self) -> bool {
        self.done
    }

    /// Next fragment of the reply.
    ///
    /// Returns `None` once the reply is complete, and forever after. An error
    /// ends the turn as well.
    pub async fn next_fragment(&mut self) -> Option<Result<String>> {
        if self.done {
            return None;
        }
        match self.stream.next_fragment().await {
            Some(Ok(fragment)) => {
                self.text.push_str(&fragment);
                Some(Ok(fragment))
            }
            Some(Err(e)) => {
                self.fail(&e);
                Some(Err(ChatError::Generation(e)))
            }
            None => {
                self.complete();
                None
            }
        }
    }

    /// Stream the rest of the reply into `sink`.
    ///
    /// # Errors
    ///
    /// Returns [`ChatError::Generation`] if the stream fails; fragments
    /// received before the failure have already been passed to `sink`.
    pub async fn finish<S>(mut self, sink: &mut S) -> Result<TurnOutcome>
    where
        S: FragmentSink + ?Sized,
    {
        while let Some(fragment) = self.next_fragment().await {
            sink.accept(&fragment?).await;
        }
        let payload = std::mem::take(&mut self.payload);
        Ok(TurnOutcome {
            text: std::mem::take(&mut self.text),
            sources: payload.source_names.iter().cloned().collect(),
            payload,
        })
    }

    fn complete(&mut self) {
        self.done = true;
        self.session.history.push(ConversationTurn::assistant(self.text.clone()));
        self.session.state = SessionState::Idle;
        info!(
            session_id = %self.session.id(),
            chars = self.text.len(),
            sources = self.payload.source_names.len(),
            "turn completed"
        );
    }

    fn fail(&mut self, e: &CoreError) {
        self.done = true;
        self.session
            .history
            .push(ConversationTurn::assistant(self.text.clone()).with_error(e.to_string()));
        self.session.state = SessionState::Idle;
        error!(session_id = %self.session.id(), partial_chars = self.text.len(), error = %e, "generation failed");
    }
}

impl Drop for Turn<'_> {
    fn drop(&mut self) {
        if self.done {
            return;
        }
        self.done = true;
        self.session
            .history
            .push(ConversationTurn::assistant(std::mem::take(&mut self.text)).with_error(INTERRUPTED));
        self.session.state = SessionState::Idle;
        warn!(session_id = %self.session.id(), "turn abandoned before the reply was complete");
    }
}

impl std::fmt::Debug for Turn<'_> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Turn")
            .field("session_id", &self.session.id())
            .field("received", &self.text.len())
            .field("done", &self.done)
            .finish()
    }
}
