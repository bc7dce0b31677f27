use crate::config::{Config, Provider};
use crate::error::ProposalError;
use serde::{Deserialize, Serialize};
use std::time::Duration;

#[derive(Debug, Clone, Serialize)]
pub struct ChatMessage {
    pub role: &'static str,
    pub content: String,
}

impl ChatMessage {
    pub fn new(role: &'static str, content: impl Into<String>) -> Self {
        Self {
            role,
            content: content.into(),
        }
    }
}

#[derive(Serialize)]
struct ChatRequest<'a> {
    #[serde(skip_serializing_if = "Option::is_none")]
    model: Option<&'a str>,
    messages: &'a [ChatMessage],
    temperature: f32,
}

#[derive(Deserialize)]
struct ChatResponse {
    choices: Vec<Choice>,
}

#[derive(Deserialize)]
struct Choice {
    message: ResponseMessage,
}

#[derive(Deserialize)]
struct ResponseMessage {
    content: Option<String>,
}

enum Endpoint {
    OpenaiCompatible {
        base_url: String,
        api_key: String,
        model: String,
    },
    Azure {
        endpoint: String,
        api_key: String,
        deployment: String,
        api_version: String,
    },
}

/// Blocking chat-completions client for OpenAI-compatible and Azure
/// backends.
pub struct LlmClient {
    endpoint: Endpoint,
    client: reqwest::blocking::Client,
}

impl LlmClient {
    pub fn from_config(config: &Config) -> Self {
        let timeout = match config.behavior.request_timeout_secs {
            0 => None,
            secs => Some(Duration::from_secs(secs)),
        };
        let client = reqwest::blocking::Client::builder()
            .timeout(timeout)
            .build()
            .unwrap_or_else(|_| reqwest::blocking::Client::new());

        let endpoint = match config.llm_provider {
            Provider::OpenaiCompatible => Endpoint::OpenaiCompatible {
                base_url: config.openai_compatible.base_url.trim_end_matches('/').to_string(),
                api_key: config.openai_compatible.api_key.clone(),
                model: config.openai_compatible.model.clone(),
            },
            Provider::Azure => Endpoint::Azure {
                endpoint: config.azure.endpoint.trim_end_matches('/').to_string(),
                api_key: config.azure.api_key.clone(),
                deployment: config.azure.deployment.clone(),
                api_version: config.azure.api_version.clone(),
            },
        };

        Self { endpoint, client }
    }

    pub fn chat(&self, messages: &[ChatMessage]) -> Result<String, ProposalError> {
        let request = match &self.endpoint {
            Endpoint::OpenaiCompatible {
                base_url,
                api_key,
                model,
            } => {
                let url = format!("{}/chat/completions", base_url);
                let body = ChatRequest {
                    model: Some(model.as_str()),
                    messages,
                    temperature: 0.1,
                };
                self.client.post(&url).bearer_auth(api_key).json(&body)
            }
            Endpoint::Azure {
                endpoint,
                api_key,
                deployment,
                api_version,
            } => {
                // Azure routes by deployment name, not by a model field.
                let url = format!(
                    "{}/openai/deployments/{}/chat/completions?api-version={}",
                    endpoint, deployment, api_version
                );
                let body = ChatRequest {
                    model: None,
                    messages,
                    temperature: 0.1,
                };
                self.client
                    .post(&url)
                    .header("api-key", api_key.as_str())
                    .json(&body)
            }
        };

        log::debug!("sending {} messages to backend", messages.len());
        let response = request.send()?;
        let status = response.status();
        if !status.is_success() {
            log::warn!("backend returned {}", status);
            return Err(ProposalError::Status(status.as_u16()));
        }

        let parsed: ChatResponse = response.json()?;
        parsed
            .choices
            .into_iter()
            .next()
            .and_then(|c| c.message.content)
            .filter(|content| !content.trim().is_empty())
            .ok_or_else(|| {
                ProposalError::Malformed("response contained no message content".to_string())
            })
    }
}
