//! # lexi-core
//!
//! Shared vocabulary for the Lexi document assistant.
//!
//! ## Overview
//!
//! - [`ConversationTurn`] / [`ConversationHistory`] - the append-only chat log
//! - [`ChatModel`] - the generative capability (messages in, fragments out)
//! - [`GenerationStream`] - a single-use stream of text fragments
//! - [`MockModel`] - a scripted model for tests and offline runs
//!
//! The retrieval pipeline lives in `lexi-rag` and the turn loop in `lexi-chat`;
//! both build on the types defined here.

pub mod conversation;
pub mod error;
pub mod mock;
pub mod model;

pub use conversation::{ConversationHistory, ConversationTurn, Role, TurnKind};
pub use error::{CoreError, Result};
pub use mock::MockModel;
pub use model::{ChatMessage, ChatModel, FragmentStream, GenerationRequest, GenerationStream};
