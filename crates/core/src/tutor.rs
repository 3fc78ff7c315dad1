//! Contains the per-turn tutoring cycle.
//!
//! A turn snapshots the session, renders the system prompt, streams a reply over
//! the [`ChatGateway`], and feeds the exchange back into the [`StateController`].

use crate::config::StaticConfiguration;
use crate::error::BackendError;
use crate::llm_client::ChatGateway;
use crate::prompt::PromptAssembler;
use crate::state::{StateController, TurnRecord, UpdateOutcome};
use futures::StreamExt;
use std::sync::Arc;
use tracing::{error, info};

/// Number of stored history records sent with each request.
pub const DEFAULT_HISTORY_WINDOW: usize = 10;

/// The reply to one turn, tagged by whether the backend succeeded.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum TurnReply {
    Text(String),
    BackendError(BackendError),
}

impl TurnReply {
    /// The text recorded in history for this reply.
    pub fn as_history_text(&self) -> String {
        match self {
            TurnReply::Text(text) => text.clone(),
            TurnReply::BackendError(e) => format!("ERROR: {e}"),
        }
    }

    pub fn is_error(&self) -> bool {
        matches!(self, TurnReply::BackendError(_))
    }
}

/// Result of [`Tutor::take_turn`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TurnReport {
    pub reply: TurnReply,
    /// `None` when a backend failure was not recorded.
    pub outcome: Option<UpdateOutcome>,
}

/// Drives a tutoring session one exchange at a time.
pub struct Tutor {
    controller: StateController,
    assembler: PromptAssembler,
    gateway: Arc<dyn ChatGateway>,
    history_window: usize,
    record_backend_errors: bool,
}

impl Tutor {
    pub fn new(
        config: Arc<StaticConfiguration>,
        domain: &str,
        gateway: Arc<dyn ChatGateway>,
    ) -> Self {
        Self {
            controller: StateController::new(config.clone(), domain),
            assembler: PromptAssembler::new(config),
            gateway,
            history_window: DEFAULT_HISTORY_WINDOW,
            record_backend_errors: true,
        }
    }

    pub fn with_history_window(mut self, size: usize) -> Self {
        self.history_window = size;
        self
    }

    /// Whether a backend failure is recorded as the assistant's reply.
    pub fn with_record_backend_errors(mut self, record: bool) -> Self {
        self.record_backend_errors = record;
        self
    }

    pub fn controller(&self) -> &StateController {
        &self.controller
    }

    /// Runs one exchange, passing each streamed chunk to `on_chunk`.
    ///
    /// The request carries the last `history_window` stored records followed by
    /// the pending learner input.
    pub async fn take_turn<F>(&mut self, user_input: &str, mut on_chunk: F) -> TurnReport
    where
        F: FnMut(&str),
    {
        let snapshot = self.controller.snapshot();
        let system_prompt = self.assembler.assemble(&snapshot);

        let mut request_history = self.controller.history_window(self.history_window).to_vec();
        request_history.push(TurnRecord::user(user_input));

        let reply = match self.gateway.converse(system_prompt, request_history).await {
            Ok(mut stream) => {
                let mut full_response = String::new();
                let mut failure = None;
                while let Some(item) = stream.next().await {
                    match item {
                        Ok(chunk) => {
                            on_chunk(&chunk);
                            full_response.push_str(&chunk);
                        }
                        Err(e) => {
                            failure = Some(e);
                            break;
                        }
                    }
                }
                match failure {
                    Some(e) => TurnReply::BackendError(e),
                    None => TurnReply::Text(full_response),
                }
            }
            Err(e) => TurnReply::BackendError(e),
        };

        if let TurnReply::BackendError(e) = &reply {
            error!(error = %e, "Model backend failed for this turn");
            if !self.record_backend_errors {
                return TurnReport {
                    reply,
                    outcome: None,
                };
            }
        }

        let outcome = self
            .controller
            .update(user_input, &reply.as_history_text());
        info!(
            flow = outcome.flow,
            mastery_level = outcome.mastery_level,
            mode = %outcome.mode,
            "Turn complete"
        );

        TurnReport {
            reply,
            outcome: Some(outcome),
        }
    }
}
