//! One user's conversation: documents, history and the turn state machine.

use std::fmt;
use std::sync::Arc;

use lexi_core::{ChatModel, ConversationHistory, ConversationTurn};
use lexi_rag::{
    ContextAssembler, DocumentSet, EmbeddingProvider, IndexManager, IndexReport, UploadedDocument,
};
use serde::{Deserialize, Serialize};
use tracing::{error, info};
use uuid::Uuid;

use crate::config::ChatConfig;
use crate::error::{ChatError, Result};
use crate::prompt;
use crate::turn::Turn;

/// Where a session is in its turn cycle.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SessionState {
    /// No operation in flight.
    #[default]
    Idle,
    /// A message was received and is being validated.
    AwaitingInput,
    /// Retrieving passages for the message.
    Assembling,
    /// A [`Turn`] is streaming the reply.
    Generating,
}

impl fmt::Display for SessionState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Self::Idle => "idle",
            Self::AwaitingInput => "awaiting_input",
            Self::Assembling => "assembling",
            Self::Generating => "generating",
        };
        f.write_str(name)
    }
}

/// An isolated chat session.
///
/// Owns its document set and history; nothing is shared with other sessions
/// except the embedder and the model, which are read-only. A reply is
/// produced through the [`Turn`] returned by [`submit`](Self::submit), which
/// borrows the session mutably until it is finished or dropped.
pub struct ChatSession {
    id: String,
    config: ChatConfig,
    pub(crate) history: ConversationHistory,
    pub(crate) state: SessionState,
    indexer: IndexManager,
    assembler: ContextAssembler,
    model: Arc<dyn ChatModel>,
}

impl fmt::Debug for ChatSession {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ChatSession")
            .field("id", &self.id)
            .field("state", &self.state)
            .field("turns", &self.history.len())
            .field("document_set", &self.indexer.current().map(|set| set.id().to_string()))
            .field("model", &self.model.name())
            .finish()
    }
}

impl ChatSession {
    /// Start a session whose history holds only the greeting.
    ///
    /// # Errors
    ///
    /// Returns [`ChatError::Config`] or [`ChatError::Rag`] if `config` is invalid.
    pub fn init(
        config: ChatConfig,
        embedder: Arc<dyn EmbeddingProvider>,
        model: Arc<dyn ChatModel>,
    ) -> Result<Self> {
        config.validate()?;
        let session = Self {
            id: Uuid::new_v4().to_string(),
            history: ConversationHistory::with_greeting(config.greeting.clone()),
            state: SessionState::Idle,
            indexer: IndexManager::new(config.rag.clone(), embedder.clone()),
            assembler: ContextAssembler::new(embedder, &config.rag),
            model,
            config,
        };
        info!(session_id = %session.id, model = %session.config.model, "session started");
        Ok(session)
    }

    pub fn id(&self) -> &str {
        &self.id
    }

    pub fn config(&self) -> &ChatConfig {
        &self.config
    }

    pub fn history(&self) -> &ConversationHistory {
        &self.history
    }

    pub fn state(&self) -> SessionState {
        self.state
    }

    /// The indexed documents, if any were uploaded.
    pub fn document_set(&self) -> Option<Arc<DocumentSet>> {
        self.indexer.current()
    }

    /// Index an upload batch, reusing the current index if the batch is unchanged.
    ///
    /// # Errors
    ///
    /// Returns [`ChatError::Rag`] if the index could not be built. The
    /// previous documents stay available in that case.
    pub async fn upload(&mut self, batch: &[UploadedDocument]) -> Result<IndexReport> {
        let report = self.indexer.ensure_index(batch).await?;
        info!(
            session_id = %self.id,
            document_set = %report.document_set.id(),
            rebuilt = report.rebuilt,
            skipped = report.skipped.len(),
            "documents uploaded"
        );
        Ok(report)
    }

    /// Forget the conversation but keep the documents.
    pub fn reset(&mut self) {
        self.history.clear_dialogue();
        self.state = SessionState::Idle;
        info!(session_id = %self.id, "conversation cleared");
    }

    /// End the session, releasing its documents and history.
    pub fn teardown(mut self) {
        self.release();
    }

    pub(crate) fn release(&mut self) {
        self.indexer.clear();
        self.history = ConversationHistory::new();
        self.state = SessionState::Idle;
        info!(session_id = %self.id, "session ended");
    }

    /// Start a turn for `input`.
    ///
    /// The user message is recorded and the request is sent to the model;
    /// the reply is read through the returned [`Turn`].
    ///
    /// # Errors
    ///
    /// - [`ChatError::EmptyInput`] for blank input; nothing is recorded.
    /// - [`ChatError::Generation`] if the model rejects the request; the user
    ///   turn is kept and followed by an empty reply carrying the error.
    pub async fn submit(&mut self, input: &str) -> Result<Turn<'_>> {
        self.state = SessionState::AwaitingInput;
        let query = input.trim();
        if query.is_empty() {
            self.state = SessionState::Idle;
            return Err(ChatError::EmptyInput);
        }

        self.state = SessionState::Assembling;
        let document_set = self.indexer.current();
        let payload =
            self.assembler.assemble_default(query, &self.history, document_set.as_deref()).await;
        self.history.push(ConversationTurn::user(query));

        let request = prompt::build_request(&self.config, &payload, query);
        self.state = SessionState::Generating;
        match self.model.generate(request).await {
            Ok(stream) => Ok(Turn::new(self, stream, payload)),
            Err(e) => {
                error!(session_id = %self.id, model = self.model.name(), error = %e, "generation rejected");
                self.history.push(ConversationTurn::assistant("").with_error(e.to_string()));
                self.state = SessionState::Idle;
                Err(e.into())
            }
        }
    }
}
