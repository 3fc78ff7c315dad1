//! Socratic Tutor Core
//!
//! The pedagogical state controller, the system prompt assembler, and the
//! boundary to the language-model backend. A [`tutor::Tutor`] composes them
//! into a strictly turn-based session for a single learner.

pub mod config;
pub mod error;
pub mod llm_client;
pub mod prompt;
pub mod state;
pub mod tutor;

pub use config::StaticConfiguration;
pub use error::{BackendError, ConfigLookupError, ConfigurationError};
pub use llm_client::{ChatGateway, ChatStream, OpenAICompatibleClient};
pub use prompt::PromptAssembler;
pub use state::{
    LevelUp, Role, SessionState, StateController, StateSnapshot, TeachingMode, TurnRecord,
    UpdateOutcome,
};
pub use tutor::{Tutor, TurnReply, TurnReport};
