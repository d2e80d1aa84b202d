//! Option generator serving the scripted scenario table.
//!
//! Lets a deployment run without a generation service: every menu comes from
//! the same `(personality, stage_key)` table the fallback path uses.

use async_trait::async_trait;

use crate::domain::catalog::{Persona, Stage};
use crate::domain::simulation::{Message, ResponseOption, ScenarioTable, Sender};
use crate::ports::{GenerationError, OptionGenerator};

/// Static option source.
#[derive(Debug, Clone, Copy)]
pub struct ScriptedOptionGenerator {
    table: &'static ScenarioTable,
}

impl ScriptedOptionGenerator {
    /// Serves the bundled scenario table.
    pub fn new() -> Self {
        Self::with_table(ScenarioTable::bundled())
    }

    pub fn with_table(table: &'static ScenarioTable) -> Self {
        Self { table }
    }
}

impl Default for ScriptedOptionGenerator {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl OptionGenerator for ScriptedOptionGenerator {
    /// Answers the latest client line when the table scripts it, otherwise
    /// the first exchange of the first variant.
    async fn generate_response_options(
        &self,
        persona: &Persona,
        stage: &Stage,
        history: &[Message],
    ) -> Result<Vec<ResponseOption>, GenerationError> {
        let last_client_line = history
            .iter()
            .rev()
            .find(|m| m.sender == Sender::Client)
            .map(|m| m.text.as_str());

        let variants = self.table.variants(persona.personality, &stage.key);
        let exchanges = || variants.iter().flat_map(|v| v.exchanges.iter());

        let exchange = last_client_line
            .and_then(|line| exchanges().find(|e| e.client_message == line))
            .or_else(|| exchanges().next())
            .ok_or_else(|| {
                GenerationError::unavailable(format!("no scripted content for {}", stage.key))
            })?;

        Ok(exchange.options.clone())
    }

    fn name(&self) -> &'static str {
        "scripted"
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::catalog::Personality;
    use crate::domain::foundation::PersonaId;

    fn persona(personality: Personality) -> Persona {
        Persona::new(PersonaId::new("p-1").unwrap(), "Dana", personality).unwrap()
    }

    #[tokio::test]
    async fn answers_latest_client_line() {
        let generator = ScriptedOptionGenerator::new();
        let stage = Stage::new("opening", "Opening", 0).unwrap();
        let history = vec![
            Message::client("Hello, who is this? I only have a few minutes."),
            Message::player("Hi"),
            Message::client("Okay, go on. What is this about?"),
        ];

        let options = generator
            .generate_response_options(&persona(Personality::Friendly), &stage, &history)
            .await
            .unwrap();
        // Friendly has its own opening, so the shared line is not found there.
        assert!(!options.is_empty());

        let options = generator
            .generate_response_options(&persona(Personality::Skeptical), &stage, &history)
            .await
            .unwrap();
        assert!(options[0].text.starts_with("I noticed you're expanding"));
    }

    #[tokio::test]
    async fn unknown_line_uses_first_exchange() {
        let generator = ScriptedOptionGenerator::new();
        let stage = Stage::new("closing", "Closing", 4).unwrap();
        let options = generator
            .generate_response_options(&persona(Personality::Busy), &stage, &[])
            .await
            .unwrap();
        assert!(options[0].text.starts_with("Let's set up a two-week pilot"));
    }
}
