use std::sync::Arc;

use tracing::{debug, warn};

use screentask_core::{ObjectStorage, ScreenshotObject, StorageObject, TaskError};
use screentask_logging::redact_sensitive_data;

/// Name of the marker file storage backends drop into empty folders.
const EMPTY_FOLDER_PLACEHOLDER: &str = ".emptyFolderPlaceholder";

/// Lists a user's screenshots and resolves each to its public URL.
#[derive(Clone)]
pub struct ScreenshotEnumerator {
    storage: Arc<dyn ObjectStorage>,
}

impl ScreenshotEnumerator {
    pub fn new(storage: Arc<dyn ObjectStorage>) -> Self {
        Self { storage }
    }

    /// Screenshots owned by `user_id`, in listing order.
    ///
    /// An empty vector is a valid result. Backend errors surface as
    /// `TaskError::Listing` and are not retried.
    pub async fn list(&self, user_id: &str) -> Result<Vec<ScreenshotObject>, TaskError> {
        if user_id.trim().is_empty() {
            return Err(TaskError::Listing("user id must not be empty".to_string()));
        }

        let objects = self.storage.list(user_id).await.map_err(|e| {
            let detail = redact_sensitive_data(&format!("{e:#}"));
            warn!(user_id = %user_id, error = %detail, "Screenshot listing failed");
            TaskError::Listing(detail)
        })?;

        let screenshots: Vec<ScreenshotObject> = objects
            .into_iter()
            .filter_map(|object| self.resolve(user_id, object))
            .collect();

        debug!(user_id = %user_id, count = screenshots.len(), "Enumerated screenshots");
        Ok(screenshots)
    }

    fn resolve(&self, user_id: &str, object: StorageObject) -> Option<ScreenshotObject> {
        // Folders come back without an id.
        let id = object.id?;
        if object.name == EMPTY_FOLDER_PLACEHOLDER {
            return None;
        }
        let resolved_url = self
            .storage
            .public_url(&format!("{}/{}", user_id, object.name));
        Some(ScreenshotObject {
            id,
            name: object.name,
            owner_id: object.owner,
            created_at: object.created_at,
            updated_at: object.updated_at,
            last_accessed_at: object.last_accessed_at,
            resolved_url,
        })
    }
}
