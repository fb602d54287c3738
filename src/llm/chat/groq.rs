use async_trait::async_trait;
use reqwest::{ Client as HttpClient, header::{ HeaderMap, HeaderValue, CONTENT_TYPE, AUTHORIZATION } };
use serde::{ Deserialize, Serialize };
use std::error::Error as StdError;
use std::time::Duration;

use super::{ ChatClient, CompletionResponse };
use crate::llm::LlmConfig;
use crate::models::chat::ChatMessage;

pub struct GroqChatClient {
    http: HttpClient,
    model: String,
    base_url: String,
}

#[derive(Serialize, Deserialize)]
struct GroqMessage {
    role: String,
    content: String,
}

#[derive(Serialize)]
struct GroqRequest {
    messages: Vec<GroqMessage>,
    model: String,
    temperature: f32,
    #[serde(rename = "max_tokens")]
    max_tokens: u32,
}

#[derive(Deserialize)]
struct GroqResponse {
    choices: Vec<GroqChoice>,
}

#[derive(Deserialize)]
struct GroqChoice {
    message: GroqMessage,
}

fn to_wire(messages: &[ChatMessage]) -> Vec<GroqMessage> {
    messages
        .iter()
        .map(|m| GroqMessage {
            role: m.role.to_string(),
            content: m.content.clone(),
        })
        .collect()
}

impl GroqChatClient {
    pub fn new(
        api_key: String,
        model: Option<String>,
        base_url: Option<String>,
        timeout: Duration
    ) -> Result<Self, Box<dyn StdError + Send + Sync>> {
        let chat_model = model.unwrap_or_else(|| "llama-3.3-70b-versatile".to_string());
        let api_url = base_url.unwrap_or_else(|| "https://api.groq.com".to_string());

        let mut headers = HeaderMap::new();
        headers.insert(CONTENT_TYPE, HeaderValue::from_static("application/json"));
        headers.insert(
            AUTHORIZATION,
            HeaderValue::from_str(&format!("Bearer {}", api_key))
                .map_err(|e| format!("Invalid API key format: {}", e))?
        );

        let http = HttpClient::builder()
            .default_headers(headers)
            .timeout(timeout)
            .build()
            .map_err(|e| Box::new(e) as Box<dyn StdError + Send + Sync>)?;

        Ok(Self {
            http,
            model: chat_model,
            base_url: api_url,
        })
    }

    pub fn from_config(config: &LlmConfig) -> Result<Self, Box<dyn StdError + Send + Sync>> {
        let api_key = config.api_key
            .clone()
            .ok_or_else(|| "Groq API key is required".to_string())?;

        Self::new(
            api_key,
            config.completion_model.clone(),
            config.base_url.clone(),
            Duration::from_secs(config.timeout_secs)
        )
    }
}

#[async_trait]
impl ChatClient for GroqChatClient {
    async fn complete(
        &self,
        messages: &[ChatMessage]
    ) -> Result<CompletionResponse, Box<dyn StdError + Send + Sync>> {
        let url = format!(
            "{}/openai/v1/chat/completions",
            self.base_url.trim_end_matches('/')
        );

        let req = GroqRequest {
            messages: to_wire(messages),
            model: self.model.clone(),
            temperature: 0.7,
            max_tokens: 1024,
        };

        let resp = self.http
            .post(&url)
            .json(&req)
            .send().await?
            .error_for_status()?
            .json::<GroqResponse>().await?;

        let content = resp.choices
            .first()
            .ok_or_else(|| "No response from Groq API".to_string())?
            .message.content.clone();

        Ok(CompletionResponse { response: content })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::chat::Role;

    #[test]
    fn wire_messages_keep_order_and_lowercase_roles() {
        let messages = vec![
            ChatMessage::new(Role::System, "prompt"),
            ChatMessage::new(Role::User, "hi"),
            ChatMessage::new(Role::Assistant, "hello")
        ];
        let wire = to_wire(&messages);
        let roles: Vec<&str> = wire
            .iter()
            .map(|m| m.role.as_str())
            .collect();
        assert_eq!(roles, ["system", "user", "assistant"]);
        assert_eq!(wire[1].content, "hi");
    }

    #[test]
    fn request_serializes_the_full_history() {
        let req = GroqRequest {
            messages: to_wire(&[ChatMessage::new(Role::User, "hey")]),
            model: "llama-3.3-70b-versatile".to_string(),
            temperature: 0.7,
            max_tokens: 1024,
        };
        let json = serde_json::to_value(&req).unwrap();
        assert_eq!(json["model"], "llama-3.3-70b-versatile");
        assert_eq!(json["messages"][0]["role"], "user");
        assert_eq!(json["messages"][0]["content"], "hey");
        assert_eq!(json["max_tokens"], 1024);
    }
}
