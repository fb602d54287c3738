use async_trait::async_trait;
use reqwest::Client as HttpClient;
use serde::{ Deserialize, Serialize };
use std::error::Error as StdError;
use std::time::Duration;

use super::{ ChatClient, CompletionResponse };
use crate::llm::LlmConfig;
use crate::models::chat::ChatMessage;

/// Local keyless provider, mainly for development.
#[derive(Debug)]
pub struct OllamaChatClient {
    http: HttpClient,
    base_url: String,
    completion_model: String,
}

#[derive(Serialize)]
struct OllamaMessage {
    role: String,
    content: String,
}

#[derive(Serialize)]
struct OllamaChatRequest {
    model: String,
    messages: Vec<OllamaMessage>,
    stream: bool,
}

#[derive(Deserialize)]
struct OllamaChatResponse {
    message: OllamaResponseMessage,
}

#[derive(Deserialize)]
struct OllamaResponseMessage {
    content: String,
}

impl OllamaChatClient {
    pub fn new(
        base_url: Option<String>,
        completion_model: Option<String>,
        timeout: Duration
    ) -> Result<Self, Box<dyn StdError + Send + Sync>> {
        let model = completion_model.unwrap_or_else(|| "llama3".to_string());
        let url = base_url.unwrap_or_else(|| "http://localhost:11434".into());

        let http = HttpClient::builder()
            .timeout(timeout)
            .build()
            .map_err(|e| Box::new(e) as Box<dyn StdError + Send + Sync>)?;

        Ok(Self {
            http,
            base_url: url,
            completion_model: model,
        })
    }

    pub fn from_config(config: &LlmConfig) -> Result<Self, Box<dyn StdError + Send + Sync>> {
        if config.llm_type != crate::llm::LlmType::Ollama {
            return Err("Invalid config type for OllamaChatClient".into());
        }

        Self::new(
            config.base_url.clone(),
            config.completion_model.clone(),
            Duration::from_secs(config.timeout_secs)
        )
    }
}

#[async_trait]
impl ChatClient for OllamaChatClient {
    async fn complete(
        &self,
        messages: &[ChatMessage]
    ) -> Result<CompletionResponse, Box<dyn StdError + Send + Sync>> {
        let url = format!("{}/api/chat", self.base_url.trim_end_matches('/'));
        let req = OllamaChatRequest {
            model: self.completion_model.clone(),
            messages: messages
                .iter()
                .map(|m| OllamaMessage {
                    role: m.role.to_string(),
                    content: m.content.clone(),
                })
                .collect(),
            stream: false,
        };

        let resp = self.http.post(&url).json(&req).send().await?.error_for_status()?;
        let data = resp.json::<OllamaChatResponse>().await?;
        Ok(CompletionResponse { response: data.message.content })
    }
}
