//! Frame rendering
//!
//! Handles the render pipeline, GPU copies of the scene graph and frame submission.

pub mod gpu_model;
pub mod pipeline_manager;
pub mod render_engine;

// Re-export main types
pub use gpu_model::GpuModel;
pub use pipeline_manager::{PipelineConfig, PipelineError, PipelineManager};
pub use render_engine::RenderEngine;
