//! Decoded asset payloads
//!
//! Every payload sits behind an `Rc` so cache lookups hand out cheap clones.

use std::{fmt, rc::Rc};

use super::{error::LoadFailure, request::AssetKind};
use crate::gfx::scene::SceneGraph;

/// RGBA8 pixel data
#[derive(Clone, PartialEq, Eq)]
pub struct ImageData {
    pub width: u32,
    pub height: u32,
    pub pixels: Vec<u8>,
}

impl ImageData {
    pub fn new(width: u32, height: u32, pixels: Vec<u8>) -> Self {
        Self {
            width,
            height,
            pixels,
        }
    }

    /// Single-pixel image, handy for placeholder textures
    pub fn solid(rgba: [u8; 4]) -> Self {
        Self::new(1, 1, rgba.to_vec())
    }
}

impl fmt::Debug for ImageData {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ImageData")
            .field("width", &self.width)
            .field("height", &self.height)
            .field("bytes", &self.pixels.len())
            .finish()
    }
}

/// An image prepared for sampling
///
/// `flip_y` is set for standalone textures whose rows are stored top-down;
/// glTF embedded textures already use the sampling convention and leave it unset.
#[derive(Debug, Clone, PartialEq)]
pub struct TextureData {
    pub label: String,
    pub image: ImageData,
    pub flip_y: bool,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FontFormat {
    TrueType,
    OpenType,
    /// Glyph outlines serialised as JSON (typeface.js)
    TypefaceJson,
}

#[derive(Clone, PartialEq, Eq)]
pub struct FontData {
    pub format: FontFormat,
    pub bytes: Vec<u8>,
}

impl fmt::Debug for FontData {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("FontData")
            .field("format", &self.format)
            .field("bytes", &self.bytes.len())
            .finish()
    }
}

impl FontData {
    /// Recognises the font container from its leading bytes
    pub fn sniff(bytes: Vec<u8>) -> Result<Self, LoadFailure> {
        let format = match bytes.get(..4) {
            Some([0x00, 0x01, 0x00, 0x00]) | Some(b"true") => FontFormat::TrueType,
            Some(b"OTTO") => FontFormat::OpenType,
            _ if bytes
                .iter()
                .find(|b| !b.is_ascii_whitespace())
                .is_some_and(|b| *b == b'{') =>
            {
                FontFormat::TypefaceJson
            }
            _ => return Err(LoadFailure::decode("unrecognised font format")),
        };
        Ok(Self { format, bytes })
    }
}

/// A loaded resource of any kind
#[derive(Debug, Clone)]
pub enum AssetHandle {
    Texture(Rc<TextureData>),
    Model(Rc<SceneGraph>),
    Image(Rc<ImageData>),
    Font(Rc<FontData>),
    Object(Rc<SceneGraph>),
}

impl AssetHandle {
    pub fn kind(&self) -> AssetKind {
        match self {
            AssetHandle::Texture(_) => AssetKind::Texture,
            AssetHandle::Model(_) => AssetKind::Model,
            AssetHandle::Image(_) => AssetKind::Image,
            AssetHandle::Font(_) => AssetKind::Font,
            AssetHandle::Object(_) => AssetKind::Object,
        }
    }

    pub fn as_texture(&self) -> Option<&Rc<TextureData>> {
        match self {
            AssetHandle::Texture(texture) => Some(texture),
            _ => None,
        }
    }

    /// Scene graph of a model or an OBJ object
    pub fn as_scene(&self) -> Option<&Rc<SceneGraph>> {
        match self {
            AssetHandle::Model(graph) | AssetHandle::Object(graph) => Some(graph),
            _ => None,
        }
    }

    pub fn as_image(&self) -> Option<&Rc<ImageData>> {
        match self {
            AssetHandle::Image(image) => Some(image),
            _ => None,
        }
    }

    pub fn as_font(&self) -> Option<&Rc<FontData>> {
        match self {
            AssetHandle::Font(font) => Some(font),
            _ => None,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn sniffs_font_formats() {
        let ttf = FontData::sniff(vec![0x00, 0x01, 0x00, 0x00, 0x00]).unwrap();
        let otf = FontData::sniff(b"OTTO....".to_vec()).unwrap();
        let json = FontData::sniff(b"  {\"glyphs\":{}}".to_vec()).unwrap();

        assert_eq!(ttf.format, FontFormat::TrueType);
        assert_eq!(otf.format, FontFormat::OpenType);
        assert_eq!(json.format, FontFormat::TypefaceJson);
        assert!(FontData::sniff(b"GIF89a".to_vec()).is_err());
        assert!(FontData::sniff(Vec::new()).is_err());
    }

    #[test]
    fn handle_reports_its_kind() {
        let handle = AssetHandle::Image(Rc::new(ImageData::solid([255, 0, 0, 255])));
        assert_eq!(handle.kind(), AssetKind::Image);
        assert!(handle.as_image().is_some());
        assert!(handle.as_texture().is_none());
        assert!(handle.as_scene().is_none());
    }
}
