pub mod pipeline;

pub use pipeline::TaskPipeline;
