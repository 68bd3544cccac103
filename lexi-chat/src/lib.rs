//! # lexi-chat
//!
//! Conversation orchestration for the Lexi document assistant.
//!
//! ## Overview
//!
//! - [`ChatSession`] - documents, history and the turn cycle of one user
//! - [`Turn`] - a streamed reply, drained fragment by fragment or into a [`FragmentSink`]
//! - [`SessionManager`] - isolated sessions keyed by id
//! - [`prompt`] - the system prompt built from a [`ContextPayload`](lexi_rag::ContextPayload)
//!
//! ## Quick Start
//!
//! ```rust,ignore
//! use std::sync::Arc;
//! use lexi_chat::{ChatConfig, ChatSession};
//! use lexi_core::MockModel;
//! use lexi_rag::{HashingEmbedder, UploadedDocument};
//!
//! let mut session = ChatSession::init(
//!     ChatConfig::default(),
//!     Arc::new(HashingEmbedder::default()),
//!     Arc::new(MockModel::new()),
//! )?;
//! session.upload(&[UploadedDocument::new("lease.pdf", bytes)]).await?;
//!
//! let outcome = session
//!     .submit("When is rent due?")
//!     .await?
//!     .finish(&mut |fragment: &str| print!("{fragment}"))
//!     .await?;
//! if let Some(citation) = outcome.citation_line() {
//!     println!("\n{citation}");
//! }
//! ```

pub mod config;
pub mod error;
pub mod manager;
pub mod prompt;
pub mod session;
pub mod turn;

pub use config::{ChatConfig, ChatConfigBuilder};
pub use error::{ChatError, Result};
pub use manager::{SessionManager, SharedSession};
pub use session::{ChatSession, SessionState};
pub use turn::{FragmentSink, INTERRUPTED, Turn, TurnOutcome};
