//! Filesystem asset backend
//!
//! Resolves locators such as `/models/air_jordan_1.glb` against an asset root
//! directory and decodes them with `image`, `gltf` and `tobj`.

use std::{
    io::Cursor,
    path::{Path, PathBuf},
    rc::Rc,
};

use futures::FutureExt;
use log::debug;

use super::{
    backend::{AssetBackend, LoadFuture},
    error::LoadFailure,
    handle::{AssetHandle, FontData, ImageData, TextureData},
    import,
};

#[derive(Debug, Clone)]
pub struct FsBackend {
    root: PathBuf,
}

impl FsBackend {
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self { root: root.into() }
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    /// Maps a locator onto the asset root, leading slashes are treated as root-relative
    pub fn resolve(&self, source: &str) -> PathBuf {
        self.root.join(source.trim_start_matches('/'))
    }

    fn read(path: &Path) -> Result<Vec<u8>, LoadFailure> {
        if !path.is_file() {
            return Err(LoadFailure::not_found(format!(
                "no file at {}",
                path.display()
            )));
        }
        debug!("Reading asset file {}", path.display());
        Ok(std::fs::read(path)?)
    }

    fn decode_image(path: &Path) -> Result<ImageData, LoadFailure> {
        let bytes = Self::read(path)?;
        let image = image::load_from_memory(&bytes)
            .map_err(|e| LoadFailure::decode(format!("{}: {}", path.display(), e)))?
            .to_rgba8();
        let (width, height) = image.dimensions();
        Ok(ImageData::new(width, height, image.into_raw()))
    }

    fn load_with<F>(&self, source: &str, load: F) -> LoadFuture
    where
        F: FnOnce(PathBuf) -> Result<AssetHandle, LoadFailure> + 'static,
    {
        let path = self.resolve(source);
        async move { load(path) }.boxed_local()
    }
}

impl AssetBackend for FsBackend {
    fn load_texture(&self, source: &str) -> LoadFuture {
        let label = source.to_string();
        self.load_with(source, move |path| {
            let image = Self::decode_image(&path)?;
            Ok(AssetHandle::Texture(Rc::new(TextureData {
                label,
                image,
                flip_y: true,
            })))
        })
    }

    fn load_model(&self, source: &str) -> LoadFuture {
        self.load_with(source, |path| {
            if !path.is_file() {
                return Err(LoadFailure::not_found(format!(
                    "no file at {}",
                    path.display()
                )));
            }
            let (document, buffers, images) = gltf::import(&path).map_err(|e| match e {
                gltf::Error::Io(io) => LoadFailure::from(io),
                other => LoadFailure::decode(format!("{}: {}", path.display(), other)),
            })?;
            let graph = import::scene_from_gltf(&document, &buffers, &images)?;
            Ok(AssetHandle::Model(Rc::new(graph)))
        })
    }

    fn load_image(&self, source: &str) -> LoadFuture {
        self.load_with(source, |path| {
            Ok(AssetHandle::Image(Rc::new(Self::decode_image(&path)?)))
        })
    }

    fn load_font(&self, source: &str) -> LoadFuture {
        self.load_with(source, |path| {
            let font = FontData::sniff(Self::read(&path)?)?;
            Ok(AssetHandle::Font(Rc::new(font)))
        })
    }

    fn load_object(&self, source: &str) -> LoadFuture {
        self.load_with(source, |path| {
            let bytes = Self::read(&path)?;
            let dir = path.parent().map(Path::to_path_buf).unwrap_or_default();
            let (models, materials) = tobj::load_obj_buf(
                &mut Cursor::new(bytes),
                &tobj::LoadOptions {
                    triangulate: true,
                    single_index: true,
                    ..Default::default()
                },
                |mtl| tobj::load_mtl(dir.join(mtl)),
            )
            .map_err(|e| LoadFailure::decode(format!("{}: {}", path.display(), e)))?;

            let materials = materials.unwrap_or_else(|e| {
                debug!("No usable MTL for {}: {}", path.display(), e);
                Vec::new()
            });
            let graph = import::scene_from_obj(&models, &materials);
            Ok(AssetHandle::Object(Rc::new(graph)))
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::assets::{error::AssetErrorKind, request::AssetKind};
    use futures::executor::block_on;

    const TRIANGLE_OBJ: &str = "o sole\nv 0 0 0\nv 1 0 0\nv 0 1 0\nf 1 2 3\n";

    #[test]
    fn resolves_root_relative_locators() {
        let backend = FsBackend::new("assets");
        assert_eq!(
            backend.resolve("/models/air_jordan_1.glb"),
            PathBuf::from("assets/models/air_jordan_1.glb")
        );
        assert_eq!(
            backend.resolve("textures/water.jpg"),
            PathBuf::from("assets/textures/water.jpg")
        );
    }

    #[test]
    fn missing_file_is_not_found() {
        let dir = tempfile::tempdir().unwrap();
        let backend = FsBackend::new(dir.path());

        for kind in AssetKind::ALL {
            let err = block_on(backend.load(kind, "/nope.bin")).unwrap_err();
            assert_eq!(err.kind, AssetErrorKind::ResourceNotFound, "{kind}");
        }
    }

    #[test]
    fn decodes_png_texture() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("water.png");
        image::RgbaImage::from_pixel(2, 3, image::Rgba([0, 64, 255, 255]))
            .save(&path)
            .unwrap();

        let backend = FsBackend::new(dir.path());
        let handle = block_on(backend.load_texture("/water.png")).unwrap();
        let texture = handle.as_texture().unwrap();

        assert!(texture.flip_y);
        assert_eq!((texture.image.width, texture.image.height), (2, 3));
        assert_eq!(&texture.image.pixels[0..4], &[0, 64, 255, 255]);
    }

    #[test]
    fn corrupt_image_is_decode_failure() {
        let dir = tempfile::tempdir().unwrap();
        std::fs::write(dir.path().join("broken.jpg"), b"not a jpeg").unwrap();

        let backend = FsBackend::new(dir.path());
        let err = block_on(backend.load_image("broken.jpg")).unwrap_err();
        assert_eq!(err.kind, AssetErrorKind::DecodeFailure);
    }

    #[test]
    fn loads_obj_without_mtl() {
        let dir = tempfile::tempdir().unwrap();
        std::fs::write(dir.path().join("sole.obj"), TRIANGLE_OBJ).unwrap();

        let backend = FsBackend::new(dir.path());
        let handle = block_on(backend.load_object("/sole.obj")).unwrap();
        let graph = handle.as_scene().unwrap();

        assert!(graph.find("sole").is_some());
        assert_eq!(graph.stats().triangles, 1);
    }

    #[test]
    fn draco_compressed_model_is_decode_failure() {
        let dir = tempfile::tempdir().unwrap();
        std::fs::write(
            dir.path().join("compressed.gltf"),
            r#"{
                "asset": { "version": "2.0" },
                "extensionsUsed": ["KHR_draco_mesh_compression"],
                "extensionsRequired": ["KHR_draco_mesh_compression"]
            }"#,
        )
        .unwrap();

        let backend = FsBackend::new(dir.path());
        let err = block_on(backend.load_model("/compressed.gltf")).unwrap_err();
        assert_eq!(err.kind, AssetErrorKind::DecodeFailure);
    }
}
