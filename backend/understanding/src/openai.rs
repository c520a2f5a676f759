use std::time::Instant;

use anyhow::{Context, Result};
use async_trait::async_trait;
use reqwest::Client;
use serde::{Deserialize, Serialize};
use tracing::debug;

use screentask_core::{VisionModel, VisionRequest, VisionResponse};

/// OpenAI-compatible chat-completions vision provider.
pub struct OpenAiVisionProvider {
    client: Client,
    api_key: String,
    base_url: String,
}

impl OpenAiVisionProvider {
    pub fn new(api_key: impl Into<String>) -> Self {
        Self {
            client: Client::new(),
            api_key: api_key.into(),
            base_url: "https://api.openai.com/v1".to_string(),
        }
    }

    pub fn with_base_url(mut self, url: impl Into<String>) -> Self {
        self.base_url = url.into().trim_end_matches('/').to_string();
        self
    }
}

#[derive(Serialize)]
struct ChatRequest {
    model: String,
    messages: Vec<ChatMessage>,
    max_tokens: u32,
    #[serde(skip_serializing_if = "Option::is_none")]
    response_format: Option<ResponseFormat>,
}

#[derive(Serialize)]
struct ResponseFormat {
    #[serde(rename = "type")]
    kind: &'static str,
}

#[derive(Serialize)]
struct ChatMessage {
    role: &'static str,
    content: MessageContent,
}

#[derive(Serialize)]
#[serde(untagged)]
enum MessageContent {
    Text(String),
    Parts(Vec<ContentPart>),
}

#[derive(Serialize)]
#[serde(tag = "type", rename_all = "snake_case")]
enum ContentPart {
    Text { text: String },
    ImageUrl { image_url: ImageUrl },
}

#[derive(Serialize)]
struct ImageUrl {
    url: String,
}

#[derive(Deserialize)]
struct ChatResponse {
    choices: Vec<Choice>,
    usage: Option<Usage>,
}

#[derive(Deserialize)]
struct Choice {
    message: ReplyMessage,
}

#[derive(Deserialize)]
struct ReplyMessage {
    content: Option<String>,
}

#[derive(Deserialize)]
struct Usage {
    total_tokens: Option<u64>,
}

fn build_body(request: &VisionRequest) -> ChatRequest {
    let mut messages = Vec::with_capacity(2);
    if !request.system_prompt.is_empty() {
        messages.push(ChatMessage {
            role: "system",
            content: MessageContent::Text(request.system_prompt.clone()),
        });
    }
    messages.push(ChatMessage {
        role: "user",
        content: MessageContent::Parts(vec![
            ContentPart::Text {
                text: request.user_prompt.clone(),
            },
            ContentPart::ImageUrl {
                image_url: ImageUrl {
                    url: request.image_url.clone(),
                },
            },
        ]),
    });

    ChatRequest {
        model: request.model.clone(),
        messages,
        max_tokens: request.max_tokens,
        response_format: request
            .json_response
            .then_some(ResponseFormat { kind: "json_object" }),
    }
}

#[async_trait]
impl VisionModel for OpenAiVisionProvider {
    fn name(&self) -> &str {
        "openai"
    }

    async fn complete(&self, request: &VisionRequest) -> Result<VisionResponse> {
        let start = Instant::now();
        let body = build_body(request);

        debug!(
            model = %request.model,
            image_url = %request.image_url,
            "Sending vision request"
        );

        let response = self
            .client
            .post(format!("{}/chat/completions", self.base_url))
            .bearer_auth(&self.api_key)
            .json(&body)
            .send()
            .await
            .context("Vision HTTP request failed")?;

        let status = response.status();
        if !status.is_success() {
            let error_body = response.text().await.unwrap_or_default();
            anyhow::bail!("OpenAI returned {}: {}", status, error_body);
        }

        let chat_response: ChatResponse = response
            .json()
            .await
            .context("Failed to parse OpenAI response")?;

        // A null content is an empty answer; a missing choice is a malformed reply.
        let content = chat_response
            .choices
            .into_iter()
            .next()
            .context("OpenAI reply contained no choices")?
            .message
            .content
            .unwrap_or_default();

        let tokens_used = chat_response
            .usage
            .and_then(|u| u.total_tokens)
            .unwrap_or(0);

        Ok(VisionResponse {
            content,
            provider: "openai".to_string(),
            model: request.model.clone(),
            tokens_used,
            latency_ms: start.elapsed().as_millis() as u64,
        })
    }
}
