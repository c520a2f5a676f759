use anyhow::{Context, Result};
use async_trait::async_trait;
use reqwest::{Client, Url};
use serde::Serialize;
use tracing::debug;

use screentask_core::{ObjectStorage, StorageObject};

use crate::{parse_base_url, public_object_url};

/// Connection settings for a Supabase-compatible storage API.
#[derive(Debug, Clone)]
pub struct SupabaseStorageConfig {
    pub url: String,
    pub service_key: String,
    pub bucket: String,
    /// Max objects returned by one listing call.
    pub list_limit: u32,
}

impl SupabaseStorageConfig {
    pub fn new(url: impl Into<String>, service_key: impl Into<String>) -> Self {
        Self {
            url: url.into(),
            service_key: service_key.into(),
            bucket: "screenshots".to_string(),
            list_limit: 100,
        }
    }

    pub fn bucket(mut self, bucket: impl Into<String>) -> Self {
        self.bucket = bucket.into();
        self
    }

    pub fn list_limit(mut self, limit: u32) -> Self {
        self.list_limit = limit;
        self
    }
}

/// REST client for the storage object listing endpoint.
pub struct SupabaseStorage {
    client: Client,
    base_url: Url,
    service_key: String,
    bucket: String,
    list_limit: u32,
}

impl SupabaseStorage {
    pub fn new(config: SupabaseStorageConfig) -> Result<Self> {
        Ok(Self {
            client: Client::new(),
            base_url: parse_base_url(&config.url)?,
            service_key: config.service_key,
            bucket: config.bucket,
            list_limit: config.list_limit,
        })
    }

    fn list_url(&self) -> String {
        let mut url = self.base_url.clone();
        if let Ok(mut segments) = url.path_segments_mut() {
            segments
                .pop_if_empty()
                .extend(["storage", "v1", "object", "list", self.bucket.as_str()]);
        }
        url.to_string()
    }
}

#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
struct ListRequest<'a> {
    prefix: &'a str,
    limit: u32,
    offset: u32,
    sort_by: SortBy,
}

#[derive(Serialize)]
struct SortBy {
    column: &'static str,
    order: &'static str,
}

#[async_trait]
impl ObjectStorage for SupabaseStorage {
    async fn list(&self, user_id: &str) -> Result<Vec<StorageObject>> {
        let body = ListRequest {
            prefix: user_id,
            limit: self.list_limit,
            offset: 0,
            sort_by: SortBy {
                column: "name",
                order: "asc",
            },
        };

        debug!(bucket = %self.bucket, user_id = %user_id, "Listing screenshots");

        let response = self
            .client
            .post(self.list_url())
            .bearer_auth(&self.service_key)
            .header("apikey", &self.service_key)
            .json(&body)
            .send()
            .await
            .context("Storage HTTP request failed")?;

        let status = response.status();
        if !status.is_success() {
            let error_body = response.text().await.unwrap_or_default();
            anyhow::bail!("storage returned {}: {}", status, error_body);
        }

        let objects: Vec<StorageObject> = response
            .json()
            .await
            .context("Failed to parse storage listing")?;

        Ok(objects)
    }

    fn public_url(&self, object_path: &str) -> String {
        public_object_url(&self.base_url, &self.bucket, object_path)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use mockito::Matcher;

    const LISTING: &str = r#"[
        {"name": "a.png", "id": "5d0c6e0e-3b0e-4bb5-9c43-0f8d8a8b1a01", "owner": "user-1",
         "created_at": "2024-05-01T12:00:00Z", "updated_at": "2024-05-01T12:00:00Z",
         "last_accessed_at": "2024-05-01T12:00:00Z", "metadata": {"size": 10}},
        {"name": "b.png", "id": "5d0c6e0e-3b0e-4bb5-9c43-0f8d8a8b1a02", "owner": "user-1",
         "created_at": "2024-05-02T12:00:00Z", "updated_at": "2024-05-02T12:00:00Z",
         "last_accessed_at": "2024-05-02T12:00:00Z", "metadata": {"size": 20}}
    ]"#;

    #[tokio::test]
    async fn test_list_sends_prefix_and_sort() {
        let mut server = mockito::Server::new_async().await;
        let mock = server
            .mock("POST", "/storage/v1/object/list/screenshots")
            .match_header("authorization", "Bearer service-key")
            .match_header("apikey", "service-key")
            .match_body(Matcher::PartialJson(serde_json::json!({
                "prefix": "user-1",
                "limit": 100,
                "offset": 0,
                "sortBy": {"column": "name", "order": "asc"}
            })))
            .with_status(200)
            .with_header("content-type", "application/json")
            .with_body(LISTING)
            .create_async()
            .await;

        let storage =
            SupabaseStorage::new(SupabaseStorageConfig::new(server.url(), "service-key")).unwrap();
        let objects = storage.list("user-1").await.unwrap();

        mock.assert_async().await;
        assert_eq!(objects.len(), 2);
        assert_eq!(objects[0].name, "a.png");
        assert_eq!(objects[1].name, "b.png");
    }

    #[tokio::test]
    async fn test_list_surfaces_backend_error() {
        let mut server = mockito::Server::new_async().await;
        server
            .mock("POST", "/storage/v1/object/list/screenshots")
            .with_status(404)
            .with_body(r#"{"error":"Bucket not found"}"#)
            .create_async()
            .await;

        let storage =
            SupabaseStorage::new(SupabaseStorageConfig::new(server.url(), "service-key")).unwrap();
        let err = storage.list("user-1").await.unwrap_err().to_string();
        assert!(err.contains("404"));
        assert!(err.contains("Bucket not found"));
    }

    #[test]
    fn test_public_url_uses_configured_bucket() {
        let storage = SupabaseStorage::new(
            SupabaseStorageConfig::new("https://proj.supabase.co", "k").bucket("shots"),
        )
        .unwrap();
        assert_eq!(
            storage.public_url("user-1/a.png"),
            "https://proj.supabase.co/storage/v1/object/public/shots/user-1/a.png"
        );
    }
}
