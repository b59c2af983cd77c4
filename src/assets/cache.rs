use std::{collections::HashMap, rc::Rc};

use super::{
    handle::{AssetHandle, FontData, ImageData, TextureData},
    request::AssetKind,
};
use crate::gfx::scene::SceneGraph;

/// Everything loaded under one name, at most one handle per kind
///
/// An entry exists as soon as a load for its name is dispatched and may stay
/// empty until that load lands.
#[derive(Debug, Clone, Default)]
pub struct AssetEntry {
    handles: HashMap<AssetKind, AssetHandle>,
}

impl AssetEntry {
    pub fn get(&self, kind: AssetKind) -> Option<&AssetHandle> {
        self.handles.get(&kind)
    }

    pub fn contains(&self, kind: AssetKind) -> bool {
        self.handles.contains_key(&kind)
    }

    pub fn is_empty(&self) -> bool {
        self.handles.is_empty()
    }

    pub fn kinds(&self) -> impl Iterator<Item = AssetKind> + '_ {
        self.handles.keys().copied()
    }

    pub fn texture(&self) -> Option<Rc<TextureData>> {
        self.get(AssetKind::Texture)?.as_texture().cloned()
    }

    pub fn model(&self) -> Option<Rc<SceneGraph>> {
        self.get(AssetKind::Model)?.as_scene().cloned()
    }

    pub fn image(&self) -> Option<Rc<ImageData>> {
        self.get(AssetKind::Image)?.as_image().cloned()
    }

    pub fn font(&self) -> Option<Rc<FontData>> {
        self.get(AssetKind::Font)?.as_font().cloned()
    }

    pub fn object(&self) -> Option<Rc<SceneGraph>> {
        self.get(AssetKind::Object)?.as_scene().cloned()
    }

    pub(crate) fn insert(&mut self, handle: AssetHandle) {
        self.handles.insert(handle.kind(), handle);
    }
}

/// Name-keyed store of loaded assets; entries are never evicted
#[derive(Debug, Default)]
pub struct AssetCache {
    entries: HashMap<String, AssetEntry>,
}

impl AssetCache {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn get(&self, name: &str) -> Option<&AssetEntry> {
        self.entries.get(name)
    }

    pub fn is_loaded(&self, name: &str, kind: AssetKind) -> bool {
        self.entries
            .get(name)
            .is_some_and(|entry| entry.contains(kind))
    }

    /// Entry for `name`, created empty if missing
    pub fn entry_mut(&mut self, name: &str) -> &mut AssetEntry {
        self.entries.entry(name.to_string()).or_default()
    }

    pub fn insert(&mut self, name: &str, handle: AssetHandle) {
        self.entry_mut(name).insert(handle);
    }

    /// Number of named entries, including ones still waiting on a load
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn names(&self) -> impl Iterator<Item = &str> {
        self.entries.keys().map(String::as_str)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn entries_are_additive_per_kind() {
        let mut cache = AssetCache::new();
        cache.entry_mut("water");
        assert!(cache.get("water").is_some_and(AssetEntry::is_empty));
        assert!(!cache.is_loaded("water", AssetKind::Texture));

        cache.insert("water", AssetHandle::Image(Rc::new(ImageData::solid([0, 0, 255, 255]))));
        cache.insert(
            "water",
            AssetHandle::Texture(Rc::new(TextureData {
                label: "water".into(),
                image: ImageData::solid([0, 0, 255, 255]),
                flip_y: true,
            })),
        );

        assert_eq!(cache.len(), 1);
        assert!(cache.is_loaded("water", AssetKind::Image));
        assert!(cache.is_loaded("water", AssetKind::Texture));
        assert!(cache.get("water").and_then(AssetEntry::texture).is_some());
        assert!(cache.get("water").and_then(AssetEntry::model).is_none());
    }
}
