use std::time::Duration;

use anyhow::{Context, Result, anyhow};
use async_trait::async_trait;
use reqwest::{Client, RequestBuilder};
use serde::{Deserialize, Serialize, de::DeserializeOwned};
use serde_json::json;
use tracing::debug;

use crate::{config::AiConfig, http::truncate_body};

use super::{AgentId, ChatClient};

pub const DEFAULT_BASE_URL: &str = "https://api.julep.ai/api";
pub const DEFAULT_MODEL: &str = "gpt-4o";

/// Julep agents/sessions API client.
///
/// Agents are created once per run; each chat goes through a session that is
/// created for that single exchange and never reused.
#[derive(Debug, Clone)]
pub struct JulepClient {
    api_key: String,
    base_url: String,
    model: String,
    http: Client,
}

impl JulepClient {
    pub fn new(api_key: String, config: &AiConfig) -> Result<Self> {
        let http = Client::builder()
            .timeout(Duration::from_secs(config.timeout_secs))
            .build()
            .context("Failed to build HTTP client for Julep")?;

        Ok(Self {
            api_key,
            base_url: config.base_url.trim_end_matches('/').to_string(),
            model: config.model.clone(),
            http,
        })
    }

    fn post(&self, path: &str) -> RequestBuilder {
        self.http.post(format!("{}{}", self.base_url, path)).bearer_auth(&self.api_key)
    }

    async fn send<T: DeserializeOwned>(&self, req: RequestBuilder, what: &str) -> Result<T> {
        let res = req
            .send()
            .await
            .with_context(|| format!("Failed to send {what} request to Julep"))?;

        let status = res.status();
        let body = res
            .text()
            .await
            .with_context(|| format!("Failed to read Julep {what} response body"))?;

        if !status.is_success() {
            return Err(anyhow!(
                "Julep {what} request failed with status {}: {}",
                status,
                truncate_body(&body),
            ));
        }

        serde_json::from_str(&body).with_context(|| format!("Failed to parse Julep {what} JSON"))
    }

    async fn create_session(&self, agent: &AgentId) -> Result<String> {
        let created: Created = self
            .send(self.post("/sessions").json(&json!({ "agent": agent.as_str() })), "session")
            .await?;
        Ok(created.id)
    }
}

#[derive(Debug, Deserialize)]
struct Created {
    id: String,
}

#[derive(Debug, Serialize)]
struct ChatRequest<'a> {
    messages: [ChatMessage<'a>; 1],
    stream: bool,
}

#[derive(Debug, Serialize)]
struct ChatMessage<'a> {
    role: &'a str,
    content: &'a str,
}

#[derive(Debug, Deserialize)]
struct ChatResponse {
    choices: Vec<ChatChoice>,
}

#[derive(Debug, Deserialize)]
struct ChatChoice {
    message: ChoiceMessage,
}

#[derive(Debug, Deserialize)]
struct ChoiceMessage {
    content: Option<String>,
}

#[async_trait]
impl ChatClient for JulepClient {
    async fn create_agent(&self, name: &str, system_prompt: &str) -> Result<AgentId> {
        let body = json!({ "name": name, "about": system_prompt, "model": self.model });
        let created: Created = self.send(self.post("/agents").json(&body), "agent").await?;

        debug!(agent = %created.id, name, "created agent");
        Ok(AgentId::new(created.id))
    }

    async fn chat(&self, agent: &AgentId, prompt: &str) -> Result<String> {
        let session = self.create_session(agent).await?;
        debug!(%agent, session = %session, "chatting in fresh session");

        let request = ChatRequest {
            messages: [ChatMessage { role: "user", content: prompt }],
            stream: false,
        };

        let response: ChatResponse = self
            .send(self.post(&format!("/sessions/{session}/chat")).json(&request), "chat")
            .await?;

        response
            .choices
            .into_iter()
            .next()
            .and_then(|c| c.message.content)
            .filter(|content| !content.trim().is_empty())
            .ok_or_else(|| anyhow!("Julep chat response contained no message content"))
    }
}
