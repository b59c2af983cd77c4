//! # Asset Loading
//!
//! Named asset requests resolved against a shared, never-evicted cache.
//!
//! - [`LoaderManager`] - batches, de-duplicates and tracks loads
//! - [`AssetBackend`] - per-kind load capability, [`FsBackend`] reads from disk
//! - [`AssetCache`] / [`AssetEntry`] - loaded handles grouped by name
//!
//! ## Usage
//!
//! ```no_run
//! use std::rc::Rc;
//! use futures::executor::LocalPool;
//! use atelier::assets::{catalog, FsBackend, LoaderManager};
//!
//! let mut pool = LocalPool::new();
//! let loader = LoaderManager::new(Rc::new(FsBackend::new("assets")), pool.spawner());
//! pool.run_until(loader.submit(&catalog::bootstrap_requests())).unwrap();
//! let shoe = catalog::model(&loader, catalog::SHOE);
//! ```

pub mod backend;
pub mod cache;
pub mod catalog;
pub mod error;
pub mod fs_backend;
pub mod handle;
pub mod import;
pub mod loader;
pub mod request;

pub use backend::{AssetBackend, LoadFuture};
pub use cache::{AssetCache, AssetEntry};
pub use error::{AssetError, AssetErrorKind, LoadFailure};
pub use fs_backend::FsBackend;
pub use handle::{AssetHandle, FontData, FontFormat, ImageData, TextureData};
pub use loader::{LoadProgress, LoaderManager};
pub use request::{AssetKey, AssetKind, AssetRequest};
