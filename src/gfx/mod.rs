//! # Graphics Module
//!
//! Everything needed to put the shoe on screen:
//!
//! - **Camera** ([`camera`]) - orbit camera, damped controls and scripted tweens
//! - **Rendering** ([`rendering`]) - surface, pipeline and GPU copies of the scene
//! - **Scene** ([`scene`]) - arena scene graph shared with the customizer
//! - **Resources** ([`resources`]) - materials and uniform buffers
//! - **Color** ([`color`]) - hex color parsing used by the panels

pub mod camera;
pub mod color;
pub mod rendering;
pub mod resources;
pub mod scene;

// Re-export commonly used types
pub use camera::orbit_camera::OrbitCamera;
pub use rendering::render_engine::RenderEngine;
