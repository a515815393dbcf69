//! OpenAI-compatible chat-completions client.

use async_trait::async_trait;
use reqwest::Client;
use serde::Deserialize;
use serde_json::json;

use super::{AiCoach, CoachPrompt};
use crate::error::CoachError;
use crate::storage::CoachConfig;

#[derive(Debug, Deserialize)]
struct ChatResponse {
    #[serde(default)]
    choices: Vec<Choice>,
}

#[derive(Debug, Deserialize)]
struct Choice {
    message: ChoiceMessage,
}

#[derive(Debug, Deserialize)]
struct ChoiceMessage {
    #[serde(default)]
    content: Option<String>,
}

pub struct HttpCoach {
    client: Client,
    endpoint: String,
    model: String,
    api_key: String,
}

impl HttpCoach {
    pub fn new(
        endpoint: impl Into<String>,
        model: impl Into<String>,
        api_key: impl Into<String>,
    ) -> Self {
        Self {
            client: Client::new(),
            endpoint: endpoint.into(),
            model: model.into(),
            api_key: api_key.into(),
        }
    }

    /// Build from config, reading the key from the configured env var.
    ///
    /// # Errors
    /// `NotConfigured` when the endpoint is blank or no key is set.
    pub fn from_config(config: &CoachConfig) -> Result<Self, CoachError> {
        if config.endpoint.trim().is_empty() {
            return Err(CoachError::NotConfigured);
        }
        let api_key = config.api_key().ok_or(CoachError::NotConfigured)?;
        Ok(Self::new(&config.endpoint, &config.model, api_key))
    }
}

#[async_trait]
impl AiCoach for HttpCoach {
    async fn respond(&self, prompt: &CoachPrompt) -> Result<String, CoachError> {
        let body = json!({
            "model": self.model,
            "messages": [
                { "role": "system", "content": prompt.system_message() },
                { "role": "user", "content": prompt.user_message() },
            ],
        });

        tracing::debug!(endpoint = %self.endpoint, model = %self.model, "requesting coach reply");
        let resp = self
            .client
            .post(&self.endpoint)
            .bearer_auth(&self.api_key)
            .json(&body)
            .send()
            .await?;

        let status = resp.status();
        if !status.is_success() {
            return Err(CoachError::Status {
                code: status.as_u16(),
            });
        }

        let parsed: ChatResponse = resp.json().await?;
        parsed
            .choices
            .into_iter()
            .next()
            .and_then(|c| c.message.content)
            .filter(|text| !text.trim().is_empty())
            .ok_or(CoachError::MalformedReply)
    }
}
