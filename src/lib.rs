//! Atelier
//!
//! An interactive shoe configurator built on wgpu and winit: an async asset
//! cache feeds a glTF scene whose materials are edited live through a
//! parameter registry and Dear ImGui panels.

pub mod app;
pub mod assets;
pub mod config;
pub mod customizer;
pub mod gfx;
pub mod params;
pub mod prelude;
pub mod showroom;
pub mod ui;

pub use app::ConfiguratorApp;
