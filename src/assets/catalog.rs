//! Assets the showroom needs at start-up

use std::rc::Rc;

use super::{
    handle::TextureData,
    loader::LoaderManager,
    request::AssetRequest,
};
use crate::gfx::scene::SceneGraph;

pub const WATER: &str = "water";
pub const SHOE: &str = "shoe";

pub const WATER_TEXTURE: &str = "/textures/water.jpg";
pub const SHOE_MODEL: &str = "/models/air_jordan_1.glb";

pub fn bootstrap_requests() -> Vec<AssetRequest> {
    vec![
        AssetRequest::texture(WATER, WATER_TEXTURE),
        AssetRequest::model(SHOE, SHOE_MODEL),
    ]
}

/// Texture loaded under `name`, if any
pub fn texture(loader: &LoaderManager, name: &str) -> Option<Rc<TextureData>> {
    loader.get(name)?.texture()
}

/// glTF model loaded under `name`, if any
pub fn model(loader: &LoaderManager, name: &str) -> Option<Rc<SceneGraph>> {
    loader.get(name)?.model()
}
