//! GPU resource management
//!
//! CPU-side materials plus the uniform buffers and depth texture the renderer uploads.

pub mod global_bindings;
pub mod material;
pub mod texture_resource;
pub mod uniform_buffer;

// Re-export main types
pub use global_bindings::{GlobalBindings, Light, LightConfig, ShaderParams};
pub use material::{Material, MaterialId, MaterialUniform, TextureSlot};
pub use texture_resource::TextureResource;
pub use uniform_buffer::UniformBuffer;
