//! # Atelier Prelude
//!
//! Commonly used types in one import:
//!
//! ```
//! use atelier::prelude::*;
//!
//! let mut registry = ParamRegistry::new();
//! registry.define("uIntensity", 1.0, ParamOptions::range(0.0, 2.0, 0.1)).unwrap();
//! assert_eq!(registry.get("uIntensity"), Some(&ParamValue::Number(1.0)));
//! ```

pub use crate::app::ConfiguratorApp;
pub use crate::config::{ConfiguratorConfig, RuntimeFlags};

pub use crate::assets::{
    catalog, AssetBackend, AssetError, AssetErrorKind, AssetKind, AssetRequest, FsBackend,
    LoadProgress, LoaderManager,
};
pub use crate::params::{ParamOptions, ParamRegistry, ParamValue, ParamView, Slot, Uniform};

pub use crate::customizer::ModelCustomizer;
pub use crate::gfx::camera::CameraManager;
pub use crate::gfx::color::Color;
pub use crate::gfx::scene::{SceneGraph, SharedGraph};
pub use crate::showroom::Showroom;

pub use cgmath::{InnerSpace, Vector3, Zero};
pub use imgui::Ui;
