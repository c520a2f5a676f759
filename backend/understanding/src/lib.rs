pub mod analyzer;
pub mod mock;
pub mod openai;
pub mod prompts;

pub use analyzer::{parse_analysis, ScreenshotAnalyzer};
pub use mock::MockVisionProvider;
pub use openai::OpenAiVisionProvider;
pub use prompts::{SYSTEM_PROMPT, USER_PROMPT};
