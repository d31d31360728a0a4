//! One conversation turn: render the prompt, call the provider, trim the reply.
//!
//! The processor is pure with respect to session state. The caller owns the
//! history string and appends `"Agent: …\nCustomer: …\n"` after a successful
//! turn; a failed turn leaves the accumulated history untouched and valid.

use std::sync::Arc;
use tracing::error;

use crate::provider::{ChatProvider, ProviderError};

/// The canned line the simulated customer opens every call with.
pub const CUSTOMER_GREETING: &str = "Hello";

/// Builds the full instruction block sent to the provider for one turn.
///
/// The behavior section is only emitted when a behavior pattern is supplied;
/// the single-scenario console flow runs without one.
pub fn render_prompt(
    context: &str,
    behavior: Option<&str>,
    chat_history: &str,
    agent_message: &str,
) -> String {
    let behavior_section = match behavior {
        Some(behavior) => format!("\nBEHAVIOR PATTERN:\n{}\n", behavior),
        None => String::new(),
    };

    // The instruction list only mentions the behavior pattern when one is
    // actually rendered above it.
    let instructions = match behavior {
        Some(_) => {
            "1. Follow the scenario context to understand the situation and background\n\
             2. Adopt the specified behavior pattern in your responses\n\
             3. Maintain consistency with both the scenario and behavior throughout the conversation\n\
             4. Keep responses natural, concise, and realistic while exhibiting the assigned traits\n\
             5. Pay attention to the conversation history for context"
        }
        None => {
            "1. Follow the scenario context to understand the situation and background\n\
             2. Maintain consistency with the scenario throughout the conversation\n\
             3. Keep responses natural, concise, and realistic\n\
             4. Pay attention to the conversation history for context"
        }
    };

    format!(
        "You are an AI simulating a customer in a telecalling scenario.\n\
         \n\
         SCENARIO CONTEXT:\n\
         {context}\n\
         {behavior_section}\
         \n\
         INSTRUCTIONS:\n\
         {instructions}\n\
         \n\
         CONVERSATION HISTORY:\n\
         {chat_history}\n\
         \n\
         CURRENT MESSAGE FROM AGENT:\n\
         {agent_message}\n\
         \n\
         Respond as the customer, ensuring your response aligns with the scenario context\n\
         and maintains consistency with the previous conversation."
    )
    .trim()
    .to_string()
}

pub struct TurnProcessor {
    provider: Arc<dyn ChatProvider>,
}

impl TurnProcessor {
    pub fn new(provider: Arc<dyn ChatProvider>) -> Self {
        Self { provider }
    }

    /// Runs exactly one agent→customer round-trip. No turn-level retry: the
    /// caller decides whether to resend the same turn or abandon the call.
    pub async fn process_turn(
        &self,
        context: &str,
        behavior: Option<&str>,
        chat_history: &str,
        agent_message: &str,
    ) -> Result<String, ProviderError> {
        let prompt = render_prompt(context, behavior, chat_history, agent_message);

        match self.provider.complete(&prompt).await {
            Ok(reply) => Ok(reply.trim().to_string()),
            Err(e) => {
                error!("Provider call failed for this turn: {}", e);
                Err(e)
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::provider::testing::ScriptedProvider;

    #[test]
    fn rendered_prompt_preserves_history_order() {
        let history = "Customer: Hello\nAgent: hi\nCustomer: hello\n";
        let prompt = render_prompt("ctx", None, history, "how are you");

        let first = prompt.find("Agent: hi").unwrap();
        let second = prompt.find("Customer: hello").unwrap();
        let current = prompt.find("how are you").unwrap();
        assert!(first < second && second < current);
    }

    #[test]
    fn behavior_section_is_present_only_when_supplied() {
        let with = render_prompt("ctx", Some("Impatient and dismissive."), "", "hi");
        assert!(with.contains("BEHAVIOR PATTERN:\nImpatient and dismissive."));
        assert!(with.contains("2. Adopt the specified behavior pattern"));

        let without = render_prompt("ctx", None, "", "hi");
        assert!(!without.contains("BEHAVIOR PATTERN"));
    }

    #[test]
    fn prompt_without_behavior_never_mentions_one() {
        let without = render_prompt("ctx", None, "Customer: Hello\n", "hi");
        assert!(!without.to_lowercase().contains("behavior"));
        assert!(without.contains("INSTRUCTIONS:\n1. Follow the scenario context"));
    }

    #[test]
    fn rendered_prompt_embeds_the_scenario_context() {
        let prompt = render_prompt("Title: busy_customer\nScenario: rush hour", None, "", "hi");
        assert!(prompt.contains("SCENARIO CONTEXT:\nTitle: busy_customer"));
    }

    #[tokio::test]
    async fn successful_turn_returns_a_trimmed_reply() {
        let turns = TurnProcessor::new(ScriptedProvider::replying("  I'm quite busy.  \n"));
        let reply = turns.process_turn("ctx", None, "", "hello").await.unwrap();
        assert_eq!(reply, "I'm quite busy.");
    }

    #[tokio::test]
    async fn failed_turn_surfaces_the_provider_error() {
        let turns = TurnProcessor::new(ScriptedProvider::failing("rate limited"));
        let err = turns
            .process_turn("ctx", Some("rude"), "", "hello")
            .await
            .unwrap_err();
        assert!(err.to_string().contains("rate limited"));
    }
}
