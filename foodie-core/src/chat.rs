use crate::{Config, Credentials, chat::julep::JulepClient};
use async_trait::async_trait;
use std::{fmt, fmt::Debug};

pub mod julep;

/// Handle for an agent created on the AI service.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct AgentId(String);

impl AgentId {
    pub fn new<S: Into<String>>(id: S) -> Self {
        Self(id.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for AgentId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// Minimal request/response surface of a generative chat service.
///
/// Every `chat` call is independent: implementations open a fresh
/// conversation, send a single user message and return the raw reply text.
#[async_trait]
pub trait ChatClient: Send + Sync + Debug {
    async fn create_agent(&self, name: &str, system_prompt: &str) -> anyhow::Result<AgentId>;

    async fn chat(&self, agent: &AgentId, prompt: &str) -> anyhow::Result<String>;
}

/// Construct the chat client from config and the resolved key.
pub fn chat_client_from_config(
    config: &Config,
    credentials: &Credentials,
) -> anyhow::Result<Box<dyn ChatClient>> {
    let client = JulepClient::new(credentials.ai_api_key.clone(), &config.ai)?;
    Ok(Box::new(client))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn chat_client_from_config_uses_resolved_credentials() {
        let mut cfg = Config::default();
        cfg.weather.api_key = Some("W".to_string());
        cfg.ai.api_key = Some("A".to_string());
        cfg.ai.timeout_secs = 5;
        let creds = cfg.credentials().unwrap();

        assert!(chat_client_from_config(&cfg, &creds).is_ok());
    }
}
