//! # User Interface
//!
//! Dear ImGui panels drawn over the model.
//!
//! - [`UiManager`] wires ImGui into winit and wgpu
//! - [`CustomizationPanel`] edits the shoe's materials and moves the camera
//! - [`debug_panel`] lists every registered parameter, shown in debug mode only
//!
//! Panels never write to materials or uniforms themselves. Every edit goes
//! through [`ParamRegistry::update`](crate::params::ParamRegistry::update),
//! which fans the value out to its bound slots and listeners.

pub mod customization_panel;
pub mod debug_panel;
pub mod manager;

pub use customization_panel::{format_element_name, CustomizationPanel};
pub use debug_panel::debug_panel;
pub use manager::UiManager;
