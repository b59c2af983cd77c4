use std::fmt;

/// Category of an asset, selects which backend loader handles the request
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum AssetKind {
    Texture,
    Model,
    Image,
    Font,
    Object,
}

impl AssetKind {
    pub const ALL: [AssetKind; 5] = [
        AssetKind::Texture,
        AssetKind::Model,
        AssetKind::Image,
        AssetKind::Font,
        AssetKind::Object,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            AssetKind::Texture => "texture",
            AssetKind::Model => "model",
            AssetKind::Image => "image",
            AssetKind::Font => "font",
            AssetKind::Object => "object",
        }
    }
}

impl fmt::Display for AssetKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Cache identity of a loaded resource
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct AssetKey {
    pub name: String,
    pub kind: AssetKind,
}

/// A named resource to fetch, e.g. `shoe` as a model from `/models/air_jordan_1.glb`
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct AssetRequest {
    pub name: String,
    pub kind: AssetKind,
    pub source: String,
}

impl AssetRequest {
    pub fn new(name: impl Into<String>, kind: AssetKind, source: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            kind,
            source: source.into(),
        }
    }

    pub fn texture(name: impl Into<String>, source: impl Into<String>) -> Self {
        Self::new(name, AssetKind::Texture, source)
    }

    pub fn model(name: impl Into<String>, source: impl Into<String>) -> Self {
        Self::new(name, AssetKind::Model, source)
    }

    pub fn image(name: impl Into<String>, source: impl Into<String>) -> Self {
        Self::new(name, AssetKind::Image, source)
    }

    pub fn font(name: impl Into<String>, source: impl Into<String>) -> Self {
        Self::new(name, AssetKind::Font, source)
    }

    pub fn object(name: impl Into<String>, source: impl Into<String>) -> Self {
        Self::new(name, AssetKind::Object, source)
    }

    pub fn key(&self) -> AssetKey {
        AssetKey {
            name: self.name.clone(),
            kind: self.kind,
        }
    }
}

impl fmt::Display for AssetRequest {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} '{}' ({})", self.kind, self.name, self.source)
    }
}
