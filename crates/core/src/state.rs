//! Pedagogical State Controller
//!
//! This module owns the learner's session state and the rules that advance it
//! after every completed exchange. The controller infers frustration from the
//! learner's wording, nudges the flow score, applies the mastery promotion gate,
//! and derives the teaching mode the next prompt should adopt.

use crate::config::{MAX_MASTERY_LEVEL, StaticConfiguration};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::sync::Arc;
use tracing::{debug, info, warn};

/// Topic label used when a curriculum has no entry for the current level.
pub const UNKNOWN_TOPIC: &str = "Unknown";

const MIN_SCORE: u8 = 1;
const MAX_SCORE: u8 = 10;
const INITIAL_FLOW: u8 = 8;
const INITIAL_MASTERY: u8 = 1;
const FRUSTRATION_PENALTY: u8 = 2;

/// How the agent should behave on the next turn.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum TeachingMode {
    /// Supportive guidance through hints and analogies.
    #[default]
    Illuminator,
    /// Challenges an overconfident learner.
    Saboteur,
    /// Strict correctness checking at advanced levels.
    Auditor,
}

impl TeachingMode {
    /// Derives the mode from the post-update scores.
    ///
    /// The branches are checked in order and `Illuminator` is the catch-all, so
    /// every `(flow, mastery)` pair maps to exactly one mode.
    pub fn derive(flow: u8, mastery_level: u8) -> Self {
        if flow > 9 && mastery_level > 3 {
            TeachingMode::Saboteur
        } else if mastery_level > 7 {
            TeachingMode::Auditor
        } else {
            TeachingMode::Illuminator
        }
    }

    /// The configuration key for this mode.
    pub fn as_str(self) -> &'static str {
        match self {
            TeachingMode::Illuminator => "illuminator",
            TeachingMode::Saboteur => "saboteur",
            TeachingMode::Auditor => "auditor",
        }
    }
}

impl fmt::Display for TeachingMode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Role {
    User,
    Assistant,
}

impl fmt::Display for Role {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Role::User => write!(f, "user"),
            Role::Assistant => write!(f, "assistant"),
        }
    }
}

/// One entry of the conversation history.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TurnRecord {
    pub role: Role,
    pub content: String,
}

impl TurnRecord {
    pub fn user(content: impl Into<String>) -> Self {
        Self {
            role: Role::User,
            content: content.into(),
        }
    }

    pub fn assistant(content: impl Into<String>) -> Self {
        Self {
            role: Role::Assistant,
            content: content.into(),
        }
    }
}

/// Mutable state of a single tutoring session.
///
/// Fields are private so the score ranges and the append-only history can only
/// change through [`StateController::update`].
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct SessionState {
    domain: String,
    dreyfus_level: String,
    mastery_level: u8,
    emotional_score: u8,
    mode: TeachingMode,
    history: Vec<TurnRecord>,
}

impl SessionState {
    fn new(domain: String, dreyfus_level: String) -> Self {
        Self {
            domain,
            dreyfus_level,
            mastery_level: INITIAL_MASTERY,
            emotional_score: INITIAL_FLOW,
            mode: TeachingMode::default(),
            history: Vec::new(),
        }
    }

    pub fn domain(&self) -> &str {
        &self.domain
    }

    pub fn dreyfus_level(&self) -> &str {
        &self.dreyfus_level
    }

    pub fn mastery_level(&self) -> u8 {
        self.mastery_level
    }

    pub fn emotional_score(&self) -> u8 {
        self.emotional_score
    }

    pub fn mode(&self) -> TeachingMode {
        self.mode
    }

    pub fn history(&self) -> &[TurnRecord] {
        &self.history
    }
}

/// Read-only view of the session used to assemble a prompt.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct StateSnapshot {
    pub domain: String,
    pub dreyfus_level: String,
    pub mastery_level: u8,
    pub mastery_topic: String,
    pub flow: u8,
    pub mode: TeachingMode,
    pub history_length: usize,
}

/// Emitted when the promotion gate advances the learner.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LevelUp {
    pub level: u8,
    pub topic: String,
}

/// What a single call to [`StateController::update`] changed.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct UpdateOutcome {
    pub frustrated: bool,
    pub flow: u8,
    pub mastery_level: u8,
    pub mode: TeachingMode,
    pub level_up: Option<LevelUp>,
}

/// Owns the [`SessionState`] and applies the per-turn update rule.
pub struct StateController {
    config: Arc<StaticConfiguration>,
    state: SessionState,
}

impl StateController {
    /// Starts a session in `domain`.
    ///
    /// An unknown domain falls back to the first configured one.
    pub fn new(config: Arc<StaticConfiguration>, domain: &str) -> Self {
        let domain = if config.has_domain(domain) {
            domain.to_string()
        } else {
            let fallback = config
                .domains()
                .next()
                .map(str::to_string)
                .unwrap_or_else(|| domain.to_string());
            warn!(requested = %domain, fallback = %fallback, "Domain not configured, falling back");
            fallback
        };
        let dreyfus_level = config
            .state_management
            .dreyfus_levels
            .first()
            .cloned()
            .unwrap_or_else(|| "Novice".to_string());

        info!(domain = %domain, dreyfus = %dreyfus_level, "Session state initialized");
        Self {
            state: SessionState::new(domain, dreyfus_level),
            config,
        }
    }

    pub fn state(&self) -> &SessionState {
        &self.state
    }

    pub fn config(&self) -> &Arc<StaticConfiguration> {
        &self.config
    }

    /// The most recent `size` history records, oldest first.
    pub fn history_window(&self, size: usize) -> &[TurnRecord] {
        let history = &self.state.history;
        &history[history.len().saturating_sub(size)..]
    }

    /// Topic for `level` in the session's domain, or [`UNKNOWN_TOPIC`].
    pub fn topic_for(&self, level: u8) -> String {
        match self.config.mastery_topic(&self.state.domain, level) {
            Ok(topic) => topic.to_string(),
            Err(e) => {
                warn!(error = %e, "Mastery topic lookup failed, using sentinel");
                UNKNOWN_TOPIC.to_string()
            }
        }
    }

    pub fn snapshot(&self) -> StateSnapshot {
        StateSnapshot {
            domain: self.state.domain.clone(),
            dreyfus_level: self.state.dreyfus_level.clone(),
            mastery_level: self.state.mastery_level,
            mastery_topic: self.topic_for(self.state.mastery_level),
            flow: self.state.emotional_score,
            mode: self.state.mode,
            history_length: self.state.history.len(),
        }
    }

    fn is_frustrated(&self, user_input: &str) -> bool {
        let input = user_input.to_lowercase();
        self.config
            .state_management
            .frustration_keywords
            .iter()
            .map(|keyword| keyword.trim().to_lowercase())
            .any(|keyword| !keyword.is_empty() && input.contains(&keyword))
    }

    /// Applies one completed exchange to the session.
    ///
    /// Order matters: the flow score moves first, the promotion gate sees the
    /// history as it was before this exchange, the mode is derived from the new
    /// scores, and only then are the two records appended.
    pub fn update(&mut self, user_input: &str, model_reply: &str) -> UpdateOutcome {
        let frustrated = self.is_frustrated(user_input);
        let state = &mut self.state;

        state.emotional_score = if frustrated {
            state
                .emotional_score
                .saturating_sub(FRUSTRATION_PENALTY)
                .max(MIN_SCORE)
        } else {
            (state.emotional_score + 1).min(MAX_SCORE)
        };

        let promotion = self.config.state_management.promotion;
        let eligible = state.history.len() > promotion.min_history
            && state.emotional_score > promotion.min_flow
            && state.mastery_level < MAX_MASTERY_LEVEL;
        let promoted = if eligible {
            state.mastery_level += 1;
            true
        } else {
            false
        };

        state.mode = if frustrated {
            TeachingMode::Illuminator
        } else {
            TeachingMode::derive(state.emotional_score, state.mastery_level)
        };

        state.history.push(TurnRecord::user(user_input));
        state.history.push(TurnRecord::assistant(model_reply));

        let (flow, mastery_level, mode) =
            (state.emotional_score, state.mastery_level, state.mode);

        let level_up = promoted.then(|| {
            let topic = self.topic_for(mastery_level);
            info!(level = mastery_level, topic = %topic, "Mastery level promoted");
            LevelUp {
                level: mastery_level,
                topic,
            }
        });

        debug!(
            frustrated,
            flow,
            mastery_level,
            mode = %mode,
            history_length = self.state.history.len(),
            "Session state updated"
        );

        UpdateOutcome {
            frustrated,
            flow,
            mastery_level,
            mode,
            level_up,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::test_support::sample_config;

    fn controller() -> StateController {
        StateController::new(Arc::new(sample_config()), "python")
    }

    fn with_scores(flow: u8, mastery: u8) -> StateController {
        let mut controller = controller();
        controller.state.emotional_score = flow;
        controller.state.mastery_level = mastery;
        controller
    }

    #[test]
    fn test_initial_state() {
        let controller = controller();
        let snapshot = controller.snapshot();
        assert_eq!(snapshot.domain, "python");
        assert_eq!(snapshot.dreyfus_level, "Novice");
        assert_eq!(snapshot.mastery_level, 1);
        assert_eq!(snapshot.mastery_topic, "Variables and types");
        assert_eq!(snapshot.flow, 8);
        assert_eq!(snapshot.mode, TeachingMode::Illuminator);
        assert_eq!(snapshot.history_length, 0);
    }

    #[test]
    fn test_unknown_domain_falls_back_to_first_configured() {
        let controller = StateController::new(Arc::new(sample_config()), "cobol");
        assert_eq!(controller.state().domain(), "python");
    }

    #[test]
    fn test_frustration_lowers_flow_and_forces_illuminator() {
        let mut controller = controller();
        let outcome = controller.update("I don't understand this at all", "Let's slow down.");

        assert!(outcome.frustrated);
        assert_eq!(outcome.flow, 6);
        assert_eq!(outcome.mode, TeachingMode::Illuminator);
        assert_eq!(controller.snapshot().history_length, 2);
    }

    #[test]
    fn test_frustration_matching_is_case_insensitive() {
        let mut controller = controller();
        assert!(controller.update("I'm totally STUCK", "ok").frustrated);
        assert!(!controller.update("all good here", "ok").frustrated);
    }

    #[test]
    fn test_frustration_overrides_saboteur_and_auditor() {
        let mut controller = with_scores(10, 9);
        let outcome = controller.update("this is impossible", "hint");
        assert_eq!(outcome.flow, 8);
        assert_eq!(outcome.mode, TeachingMode::Illuminator);
    }

    #[test]
    fn test_flow_is_floored_at_one() {
        let mut controller = with_scores(2, 1);
        assert_eq!(controller.update("I give up", "").flow, 1);
        assert_eq!(controller.update("I give up", "").flow, 1);
    }

    #[test]
    fn test_flow_is_capped_at_ten() {
        let mut controller = with_scores(10, 5);
        let outcome = controller.update("what about generators?", "good question");
        assert_eq!(outcome.flow, 10);
        assert_eq!(outcome.mode, TeachingMode::Saboteur);
    }

    #[test]
    fn test_high_mastery_selects_auditor() {
        let mut controller = with_scores(5, 8);
        let outcome = controller.update("here is my solution", "let's check it");
        assert_eq!(outcome.flow, 6);
        assert_eq!(outcome.mode, TeachingMode::Auditor);
    }

    #[test]
    fn test_mode_derivation_is_exclusive_and_total() {
        for flow in 1..=10 {
            for mastery in 1..=10 {
                let mode = TeachingMode::derive(flow, mastery);
                let expected = match (flow > 9 && mastery > 3, mastery > 7) {
                    (true, _) => TeachingMode::Saboteur,
                    (false, true) => TeachingMode::Auditor,
                    (false, false) => TeachingMode::Illuminator,
                };
                assert_eq!(mode, expected, "flow={flow} mastery={mastery}");
            }
        }
    }

    #[test]
    fn test_history_grows_by_exactly_two() {
        let mut controller = controller();
        for i in 0..5 {
            let before = controller.state().history().len();
            controller.update(&format!("question {i}"), "answer");
            assert_eq!(controller.state().history().len(), before + 2);
        }
        let history = controller.state().history();
        assert_eq!(history[0], TurnRecord::user("question 0"));
        assert_eq!(history[1], TurnRecord::assistant("answer"));
    }

    #[test]
    fn test_promotion_requires_long_history_and_high_flow() {
        let mut controller = controller();
        // Five calm turns: flow saturates but history (0..8 before each update) stays short.
        for _ in 0..5 {
            assert!(controller.update("next", "ok").level_up.is_none());
        }
        assert_eq!(controller.state().mastery_level(), 1);

        // History is 10 before this turn, which is not strictly greater than 10.
        assert!(controller.update("next", "ok").level_up.is_none());

        let outcome = controller.update("next", "ok");
        assert_eq!(
            outcome.level_up,
            Some(LevelUp {
                level: 2,
                topic: "Control flow".to_string()
            })
        );
        assert_eq!(controller.state().mastery_level(), 2);
    }

    #[test]
    fn test_no_promotion_when_flow_is_low() {
        let mut controller = controller();
        for _ in 0..12 {
            controller.update("still stuck", "hint");
        }
        assert_eq!(controller.state().mastery_level(), 1);
        assert_eq!(controller.state().emotional_score(), 1);
    }

    #[test]
    fn test_scores_stay_in_range_and_mastery_never_decreases() {
        let mut controller = controller();
        let inputs = ["fine", "error again", "great", "I give up", "nice", "ok"];
        let mut last_mastery = controller.state().mastery_level();
        for i in 0..200 {
            controller.update(inputs[i % inputs.len()], "reply");
            let state = controller.state();
            assert!((1..=10).contains(&state.emotional_score()));
            assert!((1..=10).contains(&state.mastery_level()));
            assert!(state.mastery_level() >= last_mastery);
            last_mastery = state.mastery_level();
        }
    }

    #[test]
    fn test_mastery_is_capped_at_ten() {
        let mut controller = with_scores(10, 10);
        for _ in 0..8 {
            controller.update("more", "ok");
        }
        assert_eq!(controller.state().mastery_level(), 10);
    }

    #[test]
    fn test_missing_topic_uses_sentinel() {
        let mut controller = StateController::new(Arc::new(sample_config()), "rust");
        controller.state.mastery_level = 7;
        let snapshot = controller.snapshot();
        assert_eq!(snapshot.mastery_topic, UNKNOWN_TOPIC);
        assert_eq!(snapshot.mastery_level, 7);
    }

    #[test]
    fn test_history_window_returns_most_recent_records() {
        let mut controller = controller();
        assert!(controller.history_window(10).is_empty());
        for i in 0..8 {
            controller.update(&format!("q{i}"), &format!("a{i}"));
        }
        let window = controller.history_window(10);
        assert_eq!(window.len(), 10);
        assert_eq!(window[0], TurnRecord::user("q3"));
        assert_eq!(window[9], TurnRecord::assistant("a7"));
    }

    #[test]
    fn test_mode_serializes_lowercase() {
        assert_eq!(
            serde_json::to_string(&TeachingMode::Saboteur).unwrap(),
            "\"saboteur\""
        );
        assert_eq!(TeachingMode::Auditor.to_string(), "auditor");
    }
}
