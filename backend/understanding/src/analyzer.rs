//! Screenshot analysis: one vision call per image, reply validated into an
//! `AnalysisResult`. Every failure is folded into the error sentinel so
//! callers never see an `Err`.

use std::sync::Arc;

use anyhow::{bail, Context, Result};
use async_trait::async_trait;
use serde_json::{Map, Value};
use tracing::{info, warn};

use screentask_core::types::{NO_CATEGORY, NO_REASON, NO_TASK};
use screentask_core::{AnalysisResult, Analyzer, VisionModel, VisionRequest};
use screentask_logging::redact_sensitive_data;

use crate::prompts::{SYSTEM_PROMPT, USER_PROMPT};

pub const DEFAULT_MODEL: &str = "gpt-4o";
pub const DEFAULT_MAX_TOKENS: u32 = 1000;

pub struct ScreenshotAnalyzer {
    provider: Arc<dyn VisionModel>,
    model: String,
    max_tokens: u32,
}

impl ScreenshotAnalyzer {
    pub fn new(provider: Arc<dyn VisionModel>) -> Self {
        Self {
            provider,
            model: DEFAULT_MODEL.to_string(),
            max_tokens: DEFAULT_MAX_TOKENS,
        }
    }

    pub fn model(mut self, model: impl Into<String>) -> Self {
        self.model = model.into();
        self
    }

    pub fn max_tokens(mut self, max_tokens: u32) -> Self {
        self.max_tokens = max_tokens;
        self
    }

    fn request(&self, image_url: &str) -> VisionRequest {
        VisionRequest {
            model: self.model.clone(),
            system_prompt: SYSTEM_PROMPT.to_string(),
            user_prompt: USER_PROMPT.to_string(),
            image_url: image_url.to_string(),
            max_tokens: self.max_tokens,
            json_response: true,
        }
    }

    async fn try_analyze(&self, image_url: &str) -> Result<AnalysisResult> {
        let response = self.provider.complete(&self.request(image_url)).await?;
        info!(
            provider = %response.provider,
            image_url = %image_url,
            tokens = response.tokens_used,
            latency_ms = response.latency_ms,
            "Screenshot analyzed"
        );
        parse_analysis(&response.content)
    }
}

#[async_trait]
impl Analyzer for ScreenshotAnalyzer {
    async fn analyze(&self, image_url: &str) -> AnalysisResult {
        match self.try_analyze(image_url).await {
            Ok(result) => result,
            Err(e) => {
                let detail = redact_sensitive_data(&format!("{e:#}"));
                warn!(image_url = %image_url, error = %detail, "Error analyzing screenshot");
                AnalysisResult::error(detail)
            }
        }
    }
}

/// Validate a model reply into an `AnalysisResult`.
///
/// An empty reply is treated as `{}`. Missing, empty or non-string fields
/// become placeholders. A reply that is not JSON, or is a JSON scalar, is
/// an error.
pub fn parse_analysis(content: &str) -> Result<AnalysisResult> {
    let body = strip_code_fence(content.trim());
    let empty = Map::new();
    let value: Value = if body.is_empty() {
        Value::Object(Map::new())
    } else {
        serde_json::from_str(body).context("Model reply is not valid JSON")?
    };

    let object = match &value {
        Value::Object(map) => map,
        // Some models wrap the object in a list, as the prompt examples once did.
        Value::Array(items) => items.iter().find_map(Value::as_object).unwrap_or(&empty),
        other => bail!("Model reply is not a JSON object: {}", other),
    };

    Ok(AnalysisResult {
        task: text_field(object, "task", NO_TASK),
        reason: text_field(object, "reason", NO_REASON),
        category: text_field(object, "category", NO_CATEGORY),
    })
}

fn text_field(object: &Map<String, Value>, key: &str, placeholder: &str) -> String {
    object
        .get(key)
        .and_then(Value::as_str)
        .map(str::trim)
        .filter(|s| !s.is_empty())
        .unwrap_or(placeholder)
        .to_string()
}

fn strip_code_fence(body: &str) -> &str {
    let Some(rest) = body.strip_prefix("```") else {
        return body;
    };
    let rest = rest.strip_prefix("json").unwrap_or(rest);
    rest.strip_suffix("```").unwrap_or(rest).trim()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::MockVisionProvider;
    use screentask_core::types::{ERROR_CATEGORY, ERROR_TASK};

    #[test]
    fn test_parse_complete_reply() {
        let result = parse_analysis(
            r#"{"task":"Order 'Atomic Habits'","reason":"User likely wants to read the book","category":"books"}"#,
        )
        .unwrap();
        assert_eq!(result.task, "Order 'Atomic Habits'");
        assert_eq!(result.reason, "User likely wants to read the book");
        assert_eq!(result.category, "books");
    }

    #[test]
    fn test_parse_fills_placeholders() {
        let result = parse_analysis(r#"{"task":"","category":42}"#).unwrap();
        assert_eq!(result.task, NO_TASK);
        assert_eq!(result.reason, NO_REASON);
        assert_eq!(result.category, NO_CATEGORY);
    }

    #[test]
    fn test_parse_empty_reply_is_placeholders() {
        let result = parse_analysis("  ").unwrap();
        assert_eq!(result.task, NO_TASK);
        assert_eq!(result.reason, NO_REASON);
        assert_eq!(result.category, NO_CATEGORY);
    }

    #[test]
    fn test_parse_fenced_and_listed_replies() {
        let fenced = parse_analysis(
            "```json\n{\"task\":\"Save guacamole recipe\",\"reason\":\"Recipe screenshot\",\"category\":\"cooking\"}\n```",
        )
        .unwrap();
        assert_eq!(fenced.category, "cooking");

        let listed = parse_analysis(
            r#"[{"task":"Add avocados to shopping list","reason":"Sale item","category":"shopping"}]"#,
        )
        .unwrap();
        assert_eq!(listed.task, "Add avocados to shopping list");
    }

    #[test]
    fn test_parse_rejects_non_json() {
        assert!(parse_analysis("Sure! Here is your task: buy milk").is_err());
        assert!(parse_analysis("42").is_err());
    }

    #[tokio::test]
    async fn test_analyze_success() {
        let provider = Arc::new(MockVisionProvider::new("mock").with_response(
            r#"{"task":"Block 30 min to try inbox-zero routine","reason":"Tweet describes productivity method","category":"productivity"}"#,
        ));
        let analyzer = ScreenshotAnalyzer::new(provider.clone());
        let result = analyzer.analyze("https://cdn/tweet.png").await;
        assert_eq!(result.category, "productivity");
        assert_eq!(provider.calls(), 1);
        assert_eq!(provider.seen_urls(), vec!["https://cdn/tweet.png"]);
    }

    #[tokio::test]
    async fn test_analyze_provider_error_becomes_sentinel() {
        let provider = Arc::new(MockVisionProvider::new("mock").failing_for("https://cdn/bad.png"));
        let analyzer = ScreenshotAnalyzer::new(provider);
        let result = analyzer.analyze("https://cdn/bad.png").await;
        assert_eq!(result.task, ERROR_TASK);
        assert_eq!(result.category, ERROR_CATEGORY);
        assert!(result.reason.contains("mock provider failure"));
    }

    #[tokio::test]
    async fn test_analyze_non_json_becomes_sentinel() {
        let provider = Arc::new(MockVisionProvider::new("mock").with_response("not json at all"));
        let result = ScreenshotAnalyzer::new(provider)
            .analyze("https://cdn/a.png")
            .await;
        assert!(result.is_error());
        assert!(!result.reason.is_empty());
    }

    #[tokio::test]
    async fn test_analyze_against_http_endpoint() {
        let mut server = mockito::Server::new_async().await;
        server
            .mock("POST", "/chat/completions")
            .with_status(500)
            .with_body("upstream exploded")
            .create_async()
            .await;

        let provider = Arc::new(
            crate::OpenAiVisionProvider::new("sk-test").with_base_url(server.url()),
        );
        let result = ScreenshotAnalyzer::new(provider)
            .analyze("https://cdn/a.png")
            .await;
        assert!(result.is_error());
        assert!(result.reason.contains("500"));
    }

    #[tokio::test]
    async fn test_analyze_reply_without_choices_becomes_sentinel() {
        let mut server = mockito::Server::new_async().await;
        server
            .mock("POST", "/chat/completions")
            .with_status(200)
            .with_header("content-type", "application/json")
            .with_body(r#"{"choices":[]}"#)
            .create_async()
            .await;

        let provider = Arc::new(
            crate::OpenAiVisionProvider::new("sk-test").with_base_url(server.url()),
        );
        let result = ScreenshotAnalyzer::new(provider)
            .analyze("https://cdn/a.png")
            .await;
        assert!(result.is_error());
        assert_eq!(result.task, ERROR_TASK);
        assert!(result.reason.contains("no choices"));
    }
}
