//! System Prompt Assembly
//!
//! Renders the instruction block sent to the model on every turn. Rendering is a
//! pure function of a [`StateSnapshot`] and the [`StaticConfiguration`]; the
//! same inputs always produce byte-identical output.

use crate::config::StaticConfiguration;
use crate::state::{StateSnapshot, TeachingMode};
use std::sync::Arc;

/// Used when the configuration has neither the active mode nor `illuminator`.
fn builtin_mode_description(mode: TeachingMode) -> &'static str {
    match mode {
        TeachingMode::Illuminator => {
            "Guide the learner with questions, hints and analogies. Never hand over the answer."
        }
        TeachingMode::Saboteur => {
            "The learner is confident. Challenge their assumptions and introduce a flaw for them to find."
        }
        TeachingMode::Auditor => {
            "Audit every claim strictly. Accept only precise, correct and justified reasoning."
        }
    }
}

/// Renders items as `- item` lines in source order.
fn bullet_block(items: &[String]) -> String {
    items
        .iter()
        .map(|item| format!("- {item}"))
        .collect::<Vec<_>>()
        .join("\n")
}

/// Builds the per-turn system prompt.
///
/// Required sections are guaranteed by [`StaticConfiguration`] validation, so
/// assembly itself cannot fail.
#[derive(Debug, Clone)]
pub struct PromptAssembler {
    config: Arc<StaticConfiguration>,
}

impl PromptAssembler {
    pub fn new(config: Arc<StaticConfiguration>) -> Self {
        Self { config }
    }

    /// Description of `mode`, falling back to the `illuminator` entry.
    pub fn mode_description(&self, mode: TeachingMode) -> &str {
        let modes = &self.config.pedagogy.teaching_modes;
        modes
            .get(mode.as_str())
            .or_else(|| modes.get(TeachingMode::Illuminator.as_str()))
            .map(String::as_str)
            .unwrap_or_else(|| builtin_mode_description(mode))
    }

    pub fn assemble(&self, snapshot: &StateSnapshot) -> String {
        let identity = &self.config.identity;
        let pedagogy = &self.config.pedagogy;
        let cognitive = &self.config.cognitive_modules;

        let mut prompt = format!(
            "IDENTITY: {}.\nPERSONA: {}.\nGOAL: {}\n\n",
            identity.role, identity.persona, identity.goal
        );

        prompt.push_str(&format!(
            "*** CURRENT TEACHING MODE: {} ***\nMode Definition: {}\n\n",
            snapshot.mode.as_str().to_uppercase(),
            self.mode_description(snapshot.mode)
        ));

        prompt.push_str(&format!(
            "SOCRATIC RULES:\n{}\n\n",
            bullet_block(&pedagogy.rules)
        ));
        prompt.push_str(&format!(
            "ELITE REASONING MODELS:\n{}\n\n",
            bullet_block(&cognitive.reasoning_flows)
        ));
        if !cognitive.memory_techniques.is_empty() {
            prompt.push_str(&format!(
                "MEMORY TECHNIQUES:\n{}\n\n",
                bullet_block(&cognitive.memory_techniques)
            ));
        }
        prompt.push_str(&format!(
            "CRITICAL THINKING (Avoid Biases):\n{}\n\n",
            bullet_block(&cognitive.critical_thinking.biases_to_check)
        ));

        prompt.push_str(&format!(
            "STUDENT CONTEXT:\n- Domain: {}\n- Dreyfus Level: {}\n- Current Focus: Level {} - {}\n- Emotional Flow: {}/10\n\n",
            snapshot.domain.to_uppercase(),
            snapshot.dreyfus_level,
            snapshot.mastery_level,
            snapshot.mastery_topic,
            snapshot.flow
        ));

        prompt.push_str(&format!(
            "CLOSING REQUIREMENTS (Must be at the end of every response):\n{}",
            bullet_block(&pedagogy.closing_requirements)
        ));

        prompt
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::test_support::sample_config;
    use crate::state::StateController;

    fn snapshot(mode: TeachingMode) -> StateSnapshot {
        StateSnapshot {
            domain: "python".to_string(),
            dreyfus_level: "Novice".to_string(),
            mastery_level: 3,
            mastery_topic: "Functions".to_string(),
            flow: 7,
            mode,
            history_length: 4,
        }
    }

    #[test]
    fn test_assemble_is_deterministic() {
        let assembler = PromptAssembler::new(Arc::new(sample_config()));
        let snap = snapshot(TeachingMode::Auditor);
        assert_eq!(assembler.assemble(&snap), assembler.assemble(&snap));
    }

    #[test]
    fn test_sections_appear_in_fixed_order() {
        let assembler = PromptAssembler::new(Arc::new(sample_config()));
        let prompt = assembler.assemble(&snapshot(TeachingMode::Illuminator));

        let headers = [
            "IDENTITY: Systems Architect Mentor.",
            "PERSONA: Patient but demanding.",
            "GOAL: Build durable understanding",
            "*** CURRENT TEACHING MODE: ILLUMINATOR ***",
            "SOCRATIC RULES:",
            "ELITE REASONING MODELS:",
            "CRITICAL THINKING (Avoid Biases):",
            "STUDENT CONTEXT:",
            "CLOSING REQUIREMENTS",
        ];
        let positions: Vec<usize> = headers
            .iter()
            .map(|h| prompt.find(h).unwrap_or_else(|| panic!("missing {h}")))
            .collect();
        assert!(positions.windows(2).all(|w| w[0] < w[1]));
    }

    #[test]
    fn test_lists_keep_source_order() {
        let assembler = PromptAssembler::new(Arc::new(sample_config()));
        let prompt = assembler.assemble(&snapshot(TeachingMode::Illuminator));

        assert!(prompt.contains("SOCRATIC RULES:\n- Never give the full answer\n- Ask one question at a time\n\n"));
        assert!(prompt.contains("- Confirmation bias\n- Anchoring"));
        assert!(prompt.ends_with("- End with a question\n- Summarize the key idea"));
    }

    #[test]
    fn test_learner_context_block() {
        let assembler = PromptAssembler::new(Arc::new(sample_config()));
        let prompt = assembler.assemble(&snapshot(TeachingMode::Saboteur));

        assert!(prompt.contains(
            "STUDENT CONTEXT:\n- Domain: PYTHON\n- Dreyfus Level: Novice\n- Current Focus: Level 3 - Functions\n- Emotional Flow: 7/10\n\n"
        ));
        assert!(prompt.contains(
            "Mode Definition: Introduce a subtle bug and let the learner find it"
        ));
    }

    #[test]
    fn test_missing_mode_falls_back_to_illuminator() {
        let mut config = sample_config();
        config.pedagogy.teaching_modes.remove("auditor");
        let assembler = PromptAssembler::new(Arc::new(config));

        assert_eq!(
            assembler.mode_description(TeachingMode::Auditor),
            "Guide with hints and analogies"
        );
    }

    #[test]
    fn test_no_modes_configured_uses_builtin_text() {
        let mut config = sample_config();
        config.pedagogy.teaching_modes.clear();
        let assembler = PromptAssembler::new(Arc::new(config));

        let prompt = assembler.assemble(&snapshot(TeachingMode::Auditor));
        assert!(prompt.contains(builtin_mode_description(TeachingMode::Auditor)));
    }

    #[test]
    fn test_absent_cognitive_modules_render_empty_sections() {
        let mut config = sample_config();
        config.cognitive_modules = Default::default();
        let assembler = PromptAssembler::new(Arc::new(config));

        let prompt = assembler.assemble(&snapshot(TeachingMode::Illuminator));
        assert!(prompt.contains("ELITE REASONING MODELS:\n\n\n"));
        assert!(prompt.contains("CRITICAL THINKING (Avoid Biases):\n\n\n"));
        assert!(!prompt.contains("MEMORY TECHNIQUES"));
    }

    #[test]
    fn test_memory_techniques_render_when_present() {
        let mut config = sample_config();
        config.cognitive_modules.memory_techniques = vec!["Spaced repetition".to_string()];
        let assembler = PromptAssembler::new(Arc::new(config));

        let prompt = assembler.assemble(&snapshot(TeachingMode::Illuminator));
        let memory = prompt.find("MEMORY TECHNIQUES:\n- Spaced repetition").unwrap();
        assert!(prompt.find("ELITE REASONING MODELS").unwrap() < memory);
        assert!(memory < prompt.find("CRITICAL THINKING").unwrap());
    }

    #[test]
    fn test_assembles_from_controller_snapshot() {
        let config = Arc::new(sample_config());
        let controller = StateController::new(config.clone(), "rust");
        let prompt = PromptAssembler::new(config).assemble(&controller.snapshot());
        assert!(prompt.contains("- Current Focus: Level 1 - Ownership"));
    }
}
