use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Placeholder used when the model reply carries no task.
pub const NO_TASK: &str = "No task identified";
/// Placeholder used when the model reply carries no reason.
pub const NO_REASON: &str = "No reason provided";
/// Placeholder used when the model reply carries no category.
pub const NO_CATEGORY: &str = "No category provided";
/// Task text of the sentinel result produced when analysis fails.
pub const ERROR_TASK: &str = "Error analyzing screenshot";
/// Category of the sentinel result produced when analysis fails.
pub const ERROR_CATEGORY: &str = "error";

/// Categories the model is asked to choose from. The set is open-ended:
/// the model may still answer with something else.
pub const SUGGESTED_CATEGORIES: &[&str] = &[
    "books",
    "travel",
    "cooking",
    "dating",
    "gadgets",
    "productivity",
    "shopping",
    "receipts",
    "AI",
    "home decor",
    "funny",
    "share",
    "other",
];

/// A raw entry as returned by the object-storage listing call.
///
/// Folders and placeholder files come back through the same listing, with
/// a null `id`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct StorageObject {
    #[serde(default)]
    pub id: Option<Uuid>,
    pub name: String,
    #[serde(default)]
    pub owner: Option<String>,
    #[serde(default)]
    pub created_at: Option<DateTime<Utc>>,
    #[serde(default)]
    pub updated_at: Option<DateTime<Utc>>,
    #[serde(default)]
    pub last_accessed_at: Option<DateTime<Utc>>,
    #[serde(default)]
    pub metadata: Option<serde_json::Value>,
}

/// One user-owned screenshot with its resolved public URL.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ScreenshotObject {
    pub id: Uuid,
    pub name: String,
    pub owner_id: Option<String>,
    pub created_at: Option<DateTime<Utc>>,
    pub updated_at: Option<DateTime<Utc>>,
    pub last_accessed_at: Option<DateTime<Utc>>,
    /// Stable join key against `OutputRecord::source_img`.
    #[serde(rename = "publicUrl")]
    pub resolved_url: String,
}

/// Structured reply of the vision model for one image.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AnalysisResult {
    pub task: String,
    pub reason: String,
    pub category: String,
}

impl AnalysisResult {
    /// Sentinel result carrying the failure detail in `reason`.
    pub fn error(detail: impl Into<String>) -> Self {
        Self {
            task: ERROR_TASK.to_string(),
            reason: detail.into(),
            category: ERROR_CATEGORY.to_string(),
        }
    }

    /// True only for the sentinel built by [`AnalysisResult::error`]; a model
    /// that answers with an "error" category alone is not a failure.
    pub fn is_error(&self) -> bool {
        self.category == ERROR_CATEGORY && self.task == ERROR_TASK
    }
}

/// Durable form of an analysis result, unique per `source_img`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct OutputRecord {
    pub name: String,
    pub description: String,
    pub category: String,
    pub source_img: String,
}

impl OutputRecord {
    pub fn from_analysis(source_img: impl Into<String>, result: AnalysisResult) -> Self {
        Self {
            name: result.task,
            description: result.reason,
            category: result.category,
            source_img: source_img.into(),
        }
    }

    pub fn is_error(&self) -> bool {
        self.category == ERROR_CATEGORY && self.name == ERROR_TASK
    }
}

/// Where a pipeline entry came from.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum OutcomeSource {
    /// Served from the cache without calling the model.
    Cached,
    /// Freshly analyzed and written to the cache.
    Analyzed,
    /// Freshly analyzed but not persisted (sentinel result or failed write).
    Unsaved,
}

/// One entry of the aggregated pipeline output.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TaskOutcome {
    #[serde(flatten)]
    pub record: OutputRecord,
    pub source: OutcomeSource,
}

impl TaskOutcome {
    pub fn new(record: OutputRecord, source: OutcomeSource) -> Self {
        Self { record, source }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_record_maps_task_and_reason() {
        let result = AnalysisResult {
            task: "Order \"Atomic Habits\"".into(),
            reason: "User likely wants to read the book".into(),
            category: "books".into(),
        };
        let record = OutputRecord::from_analysis("https://cdn/a.png", result);
        assert_eq!(record.name, "Order \"Atomic Habits\"");
        assert_eq!(record.description, "User likely wants to read the book");
        assert_eq!(record.category, "books");
        assert_eq!(record.source_img, "https://cdn/a.png");
        assert!(!record.is_error());
    }

    #[test]
    fn test_error_sentinel() {
        let result = AnalysisResult::error("connection refused");
        assert_eq!(result.task, ERROR_TASK);
        assert_eq!(result.reason, "connection refused");
        assert!(result.is_error());
    }

    #[test]
    fn test_model_error_category_is_not_a_sentinel() {
        let result = AnalysisResult {
            task: "Fix the 500 error on checkout".into(),
            reason: "Screenshot of a server error page".into(),
            category: ERROR_CATEGORY.into(),
        };
        assert!(!result.is_error());
        assert!(!OutputRecord::from_analysis("https://cdn/a.png", result).is_error());
        assert!(OutputRecord::from_analysis("https://cdn/a.png", AnalysisResult::error("x")).is_error());
    }

    #[test]
    fn test_outcome_serializes_flat() {
        let outcome = TaskOutcome::new(
            OutputRecord {
                name: "Add avocados to shopping list".into(),
                description: "Image shows grocery sale item".into(),
                category: "shopping".into(),
                source_img: "https://cdn/b.png".into(),
            },
            OutcomeSource::Cached,
        );
        let json = serde_json::to_value(&outcome).unwrap();
        assert_eq!(json["name"], "Add avocados to shopping list");
        assert_eq!(json["source_img"], "https://cdn/b.png");
        assert_eq!(json["source"], "cached");
    }

    #[test]
    fn test_storage_object_tolerates_folder_rows() {
        let raw = r#"[
            {"name": "nested", "id": null, "updated_at": null, "created_at": null,
             "last_accessed_at": null, "metadata": null},
            {"name": "IMG_0001.png", "id": "0b6f3a4e-8a4c-4c7e-9a55-2f0a8a6c1d11",
             "owner": "user-1", "created_at": "2024-05-01T12:00:00.123Z",
             "updated_at": "2024-05-01T12:00:00.123Z",
             "last_accessed_at": "2024-05-02T08:30:00Z",
             "metadata": {"size": 123456, "mimetype": "image/png"}}
        ]"#;
        let objects: Vec<StorageObject> = serde_json::from_str(raw).unwrap();
        assert_eq!(objects.len(), 2);
        assert!(objects[0].id.is_none());
        assert_eq!(objects[1].owner.as_deref(), Some("user-1"));
        assert!(objects[1].created_at.is_some());
    }
}
