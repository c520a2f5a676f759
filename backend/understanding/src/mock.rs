use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Mutex;

use anyhow::Result;
use async_trait::async_trait;

use screentask_core::{VisionModel, VisionRequest, VisionResponse};

/// A mock vision provider that returns canned replies and counts calls.
pub struct MockVisionProvider {
    name: String,
    fixed_response: Option<String>,
    /// Image URLs for which `complete` fails.
    failing_urls: Vec<String>,
    calls: AtomicUsize,
    seen: Mutex<Vec<String>>,
}

impl MockVisionProvider {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            fixed_response: None,
            failing_urls: Vec::new(),
            calls: AtomicUsize::new(0),
            seen: Mutex::new(Vec::new()),
        }
    }

    pub fn with_response(mut self, response: impl Into<String>) -> Self {
        self.fixed_response = Some(response.into());
        self
    }

    pub fn failing_for(mut self, image_url: impl Into<String>) -> Self {
        self.failing_urls.push(image_url.into());
        self
    }

    /// Number of `complete` calls made so far.
    pub fn calls(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }

    /// Image URLs received, in call order.
    pub fn seen_urls(&self) -> Vec<String> {
        self.seen.lock().map(|s| s.clone()).unwrap_or_default()
    }
}

#[async_trait]
impl VisionModel for MockVisionProvider {
    fn name(&self) -> &str {
        &self.name
    }

    async fn complete(&self, req: &VisionRequest) -> Result<VisionResponse> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        if let Ok(mut seen) = self.seen.lock() {
            seen.push(req.image_url.clone());
        }

        if self.failing_urls.iter().any(|u| u == &req.image_url) {
            anyhow::bail!("mock provider failure for {}", req.image_url);
        }

        // Default reply echoes the URL so each image gets a distinct task.
        let content = self.fixed_response.clone().unwrap_or_else(|| {
            serde_json::json!({
                "task": format!("Review {}", req.image_url),
                "reason": "Mock analysis",
                "category": "other",
            })
            .to_string()
        });

        Ok(VisionResponse {
            content,
            provider: self.name.clone(),
            model: "mock".to_string(),
            tokens_used: 0,
            latency_ms: 0,
        })
    }
}
