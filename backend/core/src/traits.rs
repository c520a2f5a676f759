use anyhow::Result;
use async_trait::async_trait;

use crate::types::{AnalysisResult, OutputRecord, StorageObject};

/// Object-storage collaborator holding the users' screenshots.
#[async_trait]
pub trait ObjectStorage: Send + Sync {
    /// List the raw objects stored under a user's namespace.
    async fn list(&self, user_id: &str) -> Result<Vec<StorageObject>>;

    /// Resolve an object path (`{user_id}/{name}`) to its public URL.
    ///
    /// Must be pure: the same path always yields the same URL.
    fn public_url(&self, object_path: &str) -> String;
}

/// Persistent cache of output records keyed by source image URL.
#[async_trait]
pub trait OutputCache: Send + Sync {
    /// Point lookup. `Ok(None)` means no row; `Err` is a genuine backend failure.
    async fn lookup(&self, source_img: &str) -> Result<Option<OutputRecord>>;

    /// Insert one row. Returns `false` when a row with the same
    /// `source_img` already exists and nothing was written.
    async fn insert(&self, record: &OutputRecord) -> Result<bool>;
}

/// Trait for vision-capable model providers.
#[async_trait]
pub trait VisionModel: Send + Sync {
    /// Provider name (e.g., "openai", "mock").
    fn name(&self) -> &str;

    /// Send one image+prompt request and return the raw reply text.
    async fn complete(&self, request: &VisionRequest) -> Result<VisionResponse>;
}

/// Request to a vision model provider.
#[derive(Debug, Clone)]
pub struct VisionRequest {
    pub model: String,
    pub system_prompt: String,
    pub user_prompt: String,
    pub image_url: String,
    pub max_tokens: u32,
    /// Ask the provider to constrain the reply to a single JSON object.
    pub json_response: bool,
}

/// Response from a vision model provider.
#[derive(Debug, Clone)]
pub struct VisionResponse {
    pub content: String,
    pub provider: String,
    pub model: String,
    pub tokens_used: u64,
    pub latency_ms: u64,
}

/// Turns one image URL into an analysis result. Total: never fails.
#[async_trait]
pub trait Analyzer: Send + Sync {
    async fn analyze(&self, image_url: &str) -> AnalysisResult;
}
