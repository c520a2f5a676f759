pub mod error;
pub mod traits;
pub mod types;

pub use error::TaskError;
pub use traits::{Analyzer, ObjectStorage, OutputCache, VisionModel, VisionRequest, VisionResponse};
pub use types::{
    AnalysisResult, OutcomeSource, OutputRecord, ScreenshotObject, StorageObject, TaskOutcome,
};
