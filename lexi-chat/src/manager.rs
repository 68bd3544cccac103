//! Isolated sessions keyed by id.

use std::collections::HashMap;
use std::sync::Arc;

use lexi_core::ChatModel;
use lexi_rag::EmbeddingProvider;
use tokio::sync::{Mutex, RwLock};
use tracing::info;

use crate::config::ChatConfig;
use crate::error::{ChatError, Result};
use crate::session::ChatSession;

/// A session shared behind its own lock; one turn runs at a time.
pub type SharedSession = Arc<Mutex<ChatSession>>;

/// Creates, looks up and ends [`ChatSession`]s.
///
/// Sessions share the embedder and the model but nothing mutable: each one
/// has its own documents and history behind its own mutex, so a slow turn in
/// one session never blocks another.
#[derive(Clone)]
pub struct SessionManager {
    config: ChatConfig,
    embedder: Arc<dyn EmbeddingProvider>,
    model: Arc<dyn ChatModel>,
    sessions: Arc<RwLock<HashMap<String, SharedSession>>>,
}

impl std::fmt::Debug for SessionManager {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("SessionManager")
            .field("model", &self.model.name())
            .field("embedder", &self.embedder.name())
            .finish_non_exhaustive()
    }
}

impl SessionManager {
    /// # Errors
    ///
    /// Fails if `config` is invalid.
    pub fn new(
        config: ChatConfig,
        embedder: Arc<dyn EmbeddingProvider>,
        model: Arc<dyn ChatModel>,
    ) -> Result<Self> {
        config.validate()?;
        Ok(Self { config, embedder, model, sessions: Arc::new(RwLock::new(HashMap::new())) })
    }

    /// Start a new session and return its id.
    pub async fn create_session(&self) -> Result<String> {
        let session = ChatSession::init(self.config.clone(), self.embedder.clone(), self.model.clone())?;
        let session_id = session.id().to_string();
        self.sessions.write().await.insert(session_id.clone(), Arc::new(Mutex::new(session)));
        Ok(session_id)
    }

    pub async fn get(&self, session_id: &str) -> Result<SharedSession> {
        let sessions = self.sessions.read().await;
        sessions
            .get(session_id)
            .cloned()
            .ok_or_else(|| ChatError::SessionNotFound(session_id.to_string()))
    }

    pub async fn has_session(&self, session_id: &str) -> bool {
        self.sessions.read().await.contains_key(session_id)
    }

    pub async fn session_count(&self) -> usize {
        self.sessions.read().await.len()
    }

    /// End a session and release its documents.
    ///
    /// Waits for a turn in progress on that session to finish.
    pub async fn remove(&self, session_id: &str) -> Result<()> {
        let session = self
            .sessions
            .write()
            .await
            .remove(session_id)
            .ok_or_else(|| ChatError::SessionNotFound(session_id.to_string()))?;
        session.lock().await.release();
        info!(session_id, remaining = self.session_count().await, "session removed");
        Ok(())
    }
}
