//! Static Pedagogical Configuration
//!
//! This module defines the strongly-typed configuration document that drives the
//! tutor: the agent's identity, the Socratic rules and teaching modes, optional
//! cognitive modules, and the per-domain mastery curricula. It is validated once
//! at load time and then shared read-only between components.

use crate::error::{ConfigLookupError, ConfigurationError};
use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::collections::BTreeMap;
use std::path::Path;
use tracing::debug;

/// Highest mastery level a curriculum may define.
pub const MAX_MASTERY_LEVEL: u8 = 10;

/// Sections that must be present for the tutor to start, as dotted paths.
const REQUIRED_SECTIONS: &[&str] = &[
    "identity",
    "identity.role",
    "identity.persona",
    "identity.goal",
    "pedagogy",
    "pedagogy.rules",
    "pedagogy.closing_requirements",
    "mastery_maps",
];

fn default_dreyfus_levels() -> Vec<String> {
    ["Novice", "Advanced Beginner", "Competent", "Proficient", "Expert"]
        .into_iter()
        .map(String::from)
        .collect()
}

fn default_frustration_keywords() -> Vec<String> {
    ["stuck", "impossible", "don't understand", "give up", "error", "fail"]
        .into_iter()
        .map(String::from)
        .collect()
}

const fn default_min_history() -> usize {
    10
}

const fn default_min_flow() -> u8 {
    8
}

/// The voice of the agent.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Identity {
    pub role: String,
    pub persona: String,
    pub goal: String,
}

/// Teaching rules, per-mode descriptions, and the directives closing every reply.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Pedagogy {
    /// Ordered, cumulative Socratic rules.
    pub rules: Vec<String>,
    /// Mode tag (e.g. `"illuminator"`) to its descriptive text.
    #[serde(default)]
    pub teaching_modes: BTreeMap<String, String>,
    pub closing_requirements: Vec<String>,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct CriticalThinking {
    #[serde(default)]
    pub biases_to_check: Vec<String>,
}

/// Optional reasoning aids. Absent lists render as empty prompt sections.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct CognitiveModules {
    #[serde(default)]
    pub reasoning_flows: Vec<String>,
    #[serde(default)]
    pub memory_techniques: Vec<String>,
    #[serde(default)]
    pub critical_thinking: CriticalThinking,
}

/// Gate for the mastery promotion heuristic.
///
/// Both comparisons are strict: a learner is promoted when the history holds
/// more than `min_history` records and the flow score exceeds `min_flow`.
/// This is a plain threshold check; no topic-completion tracking backs it.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct PromotionPolicy {
    #[serde(default = "default_min_history")]
    pub min_history: usize,
    #[serde(default = "default_min_flow")]
    pub min_flow: u8,
}

impl Default for PromotionPolicy {
    fn default() -> Self {
        Self {
            min_history: default_min_history(),
            min_flow: default_min_flow(),
        }
    }
}

/// Rule constants for the state controller.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct StateManagement {
    #[serde(default = "default_dreyfus_levels")]
    pub dreyfus_levels: Vec<String>,
    /// Matched case-insensitively as substrings of the learner's input.
    #[serde(default = "default_frustration_keywords")]
    pub frustration_keywords: Vec<String>,
    #[serde(default)]
    pub promotion: PromotionPolicy,
}

impl Default for StateManagement {
    fn default() -> Self {
        Self {
            dreyfus_levels: default_dreyfus_levels(),
            frustration_keywords: default_frustration_keywords(),
            promotion: PromotionPolicy::default(),
        }
    }
}

/// Level number (as a string key, e.g. `"1"`) to topic label.
pub type MasteryMap = BTreeMap<String, String>;

/// The complete, validated configuration document.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct StaticConfiguration {
    pub identity: Identity,
    pub pedagogy: Pedagogy,
    #[serde(default)]
    pub cognitive_modules: CognitiveModules,
    pub mastery_maps: BTreeMap<String, MasteryMap>,
    #[serde(default)]
    pub state_management: StateManagement,
}

impl StaticConfiguration {
    /// Reads and validates a configuration document from disk.
    pub fn load(path: impl AsRef<Path>) -> Result<Self, ConfigurationError> {
        let path = path.as_ref();
        let text = std::fs::read_to_string(path).map_err(|source| ConfigurationError::Io {
            path: path.to_path_buf(),
            source,
        })?;
        debug!(path = %path.display(), "Read configuration document");
        Self::from_json_str(&text)
    }

    pub fn from_json_str(text: &str) -> Result<Self, ConfigurationError> {
        let value: Value = serde_json::from_str(text)?;
        Self::from_value(value)
    }

    /// Validates a parsed JSON document, naming the first missing required section.
    pub fn from_value(value: Value) -> Result<Self, ConfigurationError> {
        for section in REQUIRED_SECTIONS {
            let pointer = format!("/{}", section.replace('.', "/"));
            match value.pointer(&pointer) {
                None | Some(Value::Null) => {
                    return Err(ConfigurationError::MissingSection(section.to_string()));
                }
                Some(_) => {}
            }
        }

        let config: Self = serde_json::from_value(value)?;
        config.validate()?;
        Ok(config)
    }

    fn validate(&self) -> Result<(), ConfigurationError> {
        if self.mastery_maps.is_empty() {
            return Err(ConfigurationError::Invalid(
                "mastery_maps must define at least one domain".to_string(),
            ));
        }
        for (domain, map) in &self.mastery_maps {
            for key in map.keys() {
                let level_ok = key
                    .parse::<u8>()
                    .is_ok_and(|level| (1..=MAX_MASTERY_LEVEL).contains(&level));
                if !level_ok {
                    return Err(ConfigurationError::Invalid(format!(
                        "mastery_maps.{domain} has key '{key}', expected a level between 1 and {MAX_MASTERY_LEVEL}"
                    )));
                }
            }
        }
        let min_flow = self.state_management.promotion.min_flow;
        if !(1..=10).contains(&min_flow) {
            return Err(ConfigurationError::Invalid(format!(
                "state_management.promotion.min_flow must be between 1 and 10, got {min_flow}"
            )));
        }
        Ok(())
    }

    /// Configured domain identifiers, in sorted order.
    pub fn domains(&self) -> impl Iterator<Item = &str> {
        self.mastery_maps.keys().map(String::as_str)
    }

    pub fn has_domain(&self, domain: &str) -> bool {
        self.mastery_maps.contains_key(domain)
    }

    /// Looks up the topic taught at `level` within `domain`.
    pub fn mastery_topic(&self, domain: &str, level: u8) -> Result<&str, ConfigLookupError> {
        let map = self
            .mastery_maps
            .get(domain)
            .ok_or_else(|| ConfigLookupError::UnknownDomain(domain.to_string()))?;
        map.get(&level.to_string())
            .map(String::as_str)
            .ok_or_else(|| ConfigLookupError::MasteryTopic {
                domain: domain.to_string(),
                level,
            })
    }
}
