use std::collections::HashMap;

use anyhow::Result;
use async_trait::async_trait;
use chrono::Utc;
use reqwest::Url;
use tokio::sync::RwLock;
use uuid::Uuid;

use screentask_core::{ObjectStorage, StorageObject};

use crate::{parse_base_url, public_object_url};

/// In-memory object storage for tests and local runs.
pub struct InMemoryStorage {
    base_url: Url,
    bucket: String,
    objects: RwLock<HashMap<String, Vec<StorageObject>>>,
    failures: RwLock<HashMap<String, String>>,
}

impl InMemoryStorage {
    pub fn new(base_url: &str) -> Result<Self> {
        Ok(Self {
            base_url: parse_base_url(base_url)?,
            bucket: "screenshots".to_string(),
            objects: RwLock::new(HashMap::new()),
            failures: RwLock::new(HashMap::new()),
        })
    }

    pub fn with_bucket(mut self, bucket: impl Into<String>) -> Self {
        self.bucket = bucket.into();
        self
    }

    /// Store a screenshot under a user's namespace and return its object.
    pub async fn add_screenshot(&self, user_id: &str, name: &str) -> StorageObject {
        let now = Utc::now();
        let object = StorageObject {
            id: Some(Uuid::new_v4()),
            name: name.to_string(),
            owner: Some(user_id.to_string()),
            created_at: Some(now),
            updated_at: Some(now),
            last_accessed_at: Some(now),
            metadata: None,
        };
        self.add_object(user_id, object.clone()).await;
        object
    }

    /// Store a raw listing entry as-is (folders, placeholders).
    pub async fn add_object(&self, user_id: &str, object: StorageObject) {
        let mut objects = self.objects.write().await;
        let entries = objects.entry(user_id.to_string()).or_default();
        entries.push(object);
        entries.sort_by(|a, b| a.name.cmp(&b.name));
    }

    /// Make every listing for `user_id` fail with `message`.
    pub async fn fail_listing(&self, user_id: &str, message: impl Into<String>) {
        self.failures
            .write()
            .await
            .insert(user_id.to_string(), message.into());
    }
}

#[async_trait]
impl ObjectStorage for InMemoryStorage {
    async fn list(&self, user_id: &str) -> Result<Vec<StorageObject>> {
        if let Some(message) = self.failures.read().await.get(user_id) {
            anyhow::bail!("{}", message);
        }
        Ok(self
            .objects
            .read()
            .await
            .get(user_id)
            .cloned()
            .unwrap_or_default())
    }

    fn public_url(&self, object_path: &str) -> String {
        public_object_url(&self.base_url, &self.bucket, object_path)
    }
}
