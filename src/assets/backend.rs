use futures::future::LocalBoxFuture;

use super::{error::LoadFailure, handle::AssetHandle, request::AssetKind};

/// Future returned by a single backend load
pub type LoadFuture = LocalBoxFuture<'static, Result<AssetHandle, LoadFailure>>;

/// Per-kind load capability the loader dispatches to
///
/// Implementations own no cache; the loader decides when a load is needed and
/// stores the result. Futures must not borrow the backend.
pub trait AssetBackend {
    fn load_texture(&self, source: &str) -> LoadFuture;
    fn load_model(&self, source: &str) -> LoadFuture;
    fn load_image(&self, source: &str) -> LoadFuture;
    fn load_font(&self, source: &str) -> LoadFuture;
    fn load_object(&self, source: &str) -> LoadFuture;

    fn load(&self, kind: AssetKind, source: &str) -> LoadFuture {
        match kind {
            AssetKind::Texture => self.load_texture(source),
            AssetKind::Model => self.load_model(source),
            AssetKind::Image => self.load_image(source),
            AssetKind::Font => self.load_font(source),
            AssetKind::Object => self.load_object(source),
        }
    }
}
