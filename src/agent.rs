use std::collections::HashMap;
use std::sync::Arc;

use anyhow::Result;
use async_trait::async_trait;

use crate::formatters;
use crate::service::SunService;

/// One normalized unit of message text passed to an agent.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ContentBlock {
    pub kind: String,
    pub text: String,
}

impl ContentBlock {
    pub fn text(text: impl Into<String>) -> Self {
        Self {
            kind: "text".to_string(),
            text: text.into(),
        }
    }
}

/// A normalized inbound message: a role plus its ordered content blocks.
#[derive(Debug, Clone)]
pub struct Message {
    pub role: String,
    pub blocks: Vec<ContentBlock>,
}

/// The responder seam: an opaque capability that takes role-tagged
/// messages and produces reply text. The gateway knows nothing beyond
/// this contract.
#[async_trait]
pub trait Agent: Send + Sync {
    async fn generate(&self, messages: &[Message]) -> Result<String>;
}

/// Name-to-agent lookup used by the gateway to dispatch requests.
#[derive(Default)]
pub struct AgentRegistry {
    agents: HashMap<String, Arc<dyn Agent>>,
}

impl AgentRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn register(&mut self, name: impl Into<String>, agent: Arc<dyn Agent>) {
        self.agents.insert(name.into(), agent);
    }

    pub fn get(&self, name: &str) -> Option<Arc<dyn Agent>> {
        self.agents.get(name).cloned()
    }
}

/// Agent answering daily sunrise, sunset, day length, and moon phase
/// questions for a city. The language-model layer sits outside this
/// crate; this is the deterministic capability behind the seam.
pub struct SunriseAgent {
    service: SunService,
}

impl SunriseAgent {
    pub fn new(service: SunService) -> Self {
        Self { service }
    }
}

#[async_trait]
impl Agent for SunriseAgent {
    async fn generate(&self, messages: &[Message]) -> Result<String> {
        let Some(city) = extract_city(messages) else {
            return Ok(
                "Which city would you like sunrise, sunset, and moon information for?".to_string(),
            );
        };

        tracing::info!("Sunrise agent handling city: {}", city);
        let report = self.service.sun_report(&city).await?;

        Ok(formatters::format_report(&report))
    }
}

/// Treats the concatenated message text, minus trailing punctuation, as
/// the city name. Returns `None` when there is no usable text at all.
fn extract_city(messages: &[Message]) -> Option<String> {
    let text = messages
        .iter()
        .flat_map(|m| m.blocks.iter())
        .map(|b| b.text.as_str())
        .collect::<Vec<_>>()
        .join(" ");

    let city = text
        .trim()
        .trim_matches(|c: char| matches!(c, '?' | '!' | '.'))
        .trim();
    if city.is_empty() {
        None
    } else {
        Some(city.to_string())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn user_message(texts: &[&str]) -> Message {
        Message {
            role: "user".to_string(),
            blocks: texts.iter().map(|t| ContentBlock::text(*t)).collect(),
        }
    }

    #[test]
    fn extracts_city_and_strips_trailing_punctuation() {
        assert_eq!(
            extract_city(&[user_message(&["Nairobi?"])]),
            Some("Nairobi".to_string())
        );
        assert_eq!(
            extract_city(&[user_message(&["  Buenos Aires  "])]),
            Some("Buenos Aires".to_string())
        );
    }

    #[test]
    fn joins_blocks_across_messages() {
        assert_eq!(
            extract_city(&[user_message(&["Rio", "de Janeiro"])]),
            Some("Rio de Janeiro".to_string())
        );
    }

    #[test]
    fn empty_input_yields_no_city() {
        assert_eq!(extract_city(&[user_message(&[])]), None);
        assert_eq!(extract_city(&[user_message(&["  ?! "])]), None);
    }

    #[test]
    fn registry_lookup_is_by_exact_name() {
        struct Canned;

        #[async_trait]
        impl Agent for Canned {
            async fn generate(&self, _messages: &[Message]) -> Result<String> {
                Ok("ok".to_string())
            }
        }

        let mut registry = AgentRegistry::new();
        registry.register("sunriseAgent", Arc::new(Canned));
        assert!(registry.get("sunriseAgent").is_some());
        assert!(registry.get("sunriseagent").is_none());
        assert!(registry.get("does-not-exist").is_none());
    }
}
