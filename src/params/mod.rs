//! # Parameters
//!
//! A registry of named, live-editable values. Panels write into it with
//! [`ParamRegistry::update`]; bound [`Slot`]s and change listeners receive
//! every new value synchronously.
//!
//! ```
//! use atelier::params::{ParamOptions, ParamRegistry, Uniform};
//!
//! let mut registry = ParamRegistry::new();
//! registry.define("uProgress", 0.0, ParamOptions::range(0.0, 1.0, 0.01)).unwrap();
//!
//! let progress = Uniform::new(0.0);
//! registry.bind_uniform("uProgress", &progress).unwrap();
//! registry.update("uProgress", 0.5).unwrap();
//! assert_eq!(progress.as_f32(), 0.5);
//! ```

pub mod defaults;
pub mod registry;
pub mod slot;
pub mod value;

pub use registry::{Listener, ParamError, ParamRegistry};
pub use slot::{MaterialField, MaterialSlot, Slot, Uniform};
pub use value::{ParamDef, ParamOptions, ParamValue, ParamView, Parameter};
