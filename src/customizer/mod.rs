//! # Model Customizer
//!
//! Looks up parts of a loaded model by node name and edits the materials
//! of every mesh underneath. Materials shared between meshes are edited
//! once per call.

use std::{
    collections::{BTreeSet, HashMap},
    rc::Rc,
};

use log::{debug, info, warn};
use thiserror::Error;

use crate::{
    assets::TextureData,
    gfx::{
        color::{Color, ParseColorError},
        resources::material::{Material, MaterialId, TextureSlot},
        scene::{NodeId, NodeKind, SharedGraph, Transform},
    },
};

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum CustomizeError {
    #[error("no meshes found for element '{0}'")]
    NoMeshes(String),
    #[error(transparent)]
    InvalidColor(#[from] ParseColorError),
}

/// Summary of one material, as shown in panels and reports
#[derive(Debug, Clone, PartialEq)]
pub struct MaterialInfo {
    pub id: MaterialId,
    pub name: String,
    /// Lowercase hex without `#`
    pub color: String,
    pub metalness: f32,
    pub roughness: f32,
    pub textures: Vec<TextureSlot>,
}

impl MaterialInfo {
    pub fn from_material(id: MaterialId, material: &Material) -> Self {
        Self {
            id,
            name: material.name.clone(),
            color: material.color().to_hex_string(),
            metalness: material.metallic,
            roughness: material.roughness,
            textures: material.textures().map(|(slot, _)| slot).collect(),
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct ElementInfo {
    pub name: String,
    pub kind: NodeKind,
    pub transform: Transform,
    pub mesh_count: usize,
    /// Unique materials in first-use order
    pub materials: Vec<MaterialInfo>,
}

pub struct ModelCustomizer {
    graph: SharedGraph,
    elements: HashMap<String, NodeId>,
    /// Element names in the order they were first met during traversal
    order: Vec<String>,
    material_users: HashMap<MaterialId, Vec<NodeId>>,
}

impl ModelCustomizer {
    pub fn new(graph: SharedGraph) -> Self {
        let mut elements = HashMap::new();
        let mut order = Vec::new();
        let mut material_users: HashMap<MaterialId, Vec<NodeId>> = HashMap::new();

        {
            let scene = graph.borrow();
            for id in scene.traverse(scene.root()) {
                let Some(node) = scene.node(id) else {
                    continue;
                };
                if !node.name.is_empty() && elements.insert(node.name.clone(), id).is_none() {
                    order.push(node.name.clone());
                }
                for primitive in &node.primitives {
                    let users = material_users.entry(primitive.material).or_default();
                    if !users.contains(&id) {
                        users.push(id);
                    }
                }
            }
        }

        info!(
            "Model customizer indexed {} named element(s) and {} material(s)",
            order.len(),
            material_users.len()
        );

        Self {
            graph,
            elements,
            order,
            material_users,
        }
    }

    pub fn graph(&self) -> &SharedGraph {
        &self.graph
    }

    /// Node registered under `name`; for duplicate names the last one in traversal order
    pub fn element(&self, name: &str) -> Option<NodeId> {
        self.elements.get(name).copied()
    }

    /// Mesh nodes in the element's subtree, the element itself included
    pub fn meshes(&self, name: &str) -> Vec<NodeId> {
        let Some(element) = self.element(name) else {
            return Vec::new();
        };
        let graph = self.graph.borrow();
        graph
            .traverse(element)
            .into_iter()
            .filter(|&id| graph.node(id).is_some_and(|node| node.is_mesh()))
            .collect()
    }

    /// Mesh nodes using a material
    pub fn material_users(&self, material: MaterialId) -> &[NodeId] {
        self.material_users
            .get(&material)
            .map(Vec::as_slice)
            .unwrap_or_default()
    }

    /// Unique materials of an element's meshes, in first-use order
    fn element_materials(&self, name: &str) -> Result<Vec<MaterialId>, CustomizeError> {
        let meshes = self.meshes(name);
        if meshes.is_empty() {
            warn!("ModelCustomizer: no mesh found for '{}'", name);
            return Err(CustomizeError::NoMeshes(name.to_string()));
        }

        let graph = self.graph.borrow();
        let mut seen = BTreeSet::new();
        Ok(meshes
            .iter()
            .filter_map(|&id| graph.node(id))
            .flat_map(|node| node.primitives.iter().map(|p| p.material))
            .filter(|id| seen.insert(*id))
            .collect())
    }

    fn edit(&self, name: &str, mut apply: impl FnMut(&mut Material)) -> Result<(), CustomizeError> {
        let materials = self.element_materials(name)?;
        let mut graph = self.graph.borrow_mut();
        for id in materials {
            if let Some(material) = graph.material_mut(id) {
                apply(material);
            }
        }
        Ok(())
    }

    /// Sets the base color from a hex string such as `#ff0000`
    pub fn set_color(&self, name: &str, color: &str) -> Result<(), CustomizeError> {
        let color: Color = color.parse()?;
        self.set_rgb(name, color)
    }

    pub fn set_rgb(&self, name: &str, color: Color) -> Result<(), CustomizeError> {
        self.edit(name, |material| material.set_color(color))?;
        debug!("ModelCustomizer: color of '{}' set to {}", name, color.to_hex_string());
        Ok(())
    }

    /// Clamped to `[0, 1]`
    pub fn set_metalness(&self, name: &str, metalness: f32) -> Result<(), CustomizeError> {
        self.edit(name, |material| material.set_metallic(metalness))
    }

    /// Clamped to `[0, 1]`
    pub fn set_roughness(&self, name: &str, roughness: f32) -> Result<(), CustomizeError> {
        self.edit(name, |material| material.set_roughness(roughness))
    }

    /// Replaces a texture on every material of the element
    pub fn set_texture(
        &self,
        name: &str,
        slot: TextureSlot,
        texture: Rc<TextureData>,
    ) -> Result<(), CustomizeError> {
        self.edit(name, |material| {
            if material.set_texture(slot, texture.clone()).is_some() {
                debug!("Replaced {} on material '{}'", slot, material.name);
            }
        })?;
        info!("ModelCustomizer: texture '{}' of '{}' replaced", slot, name);
        Ok(())
    }

    pub fn available_elements(&self) -> &[String] {
        &self.order
    }

    pub fn element_info(&self, name: &str) -> Option<ElementInfo> {
        let element = self.element(name)?;
        let meshes = self.meshes(name);
        let materials = self.element_materials(name).unwrap_or_default();

        let graph = self.graph.borrow();
        let node = graph.node(element)?;
        Some(ElementInfo {
            name: name.to_string(),
            kind: node.kind,
            transform: node.transform,
            mesh_count: meshes.len(),
            materials: materials
                .into_iter()
                .filter_map(|id| {
                    graph
                        .material(id)
                        .map(|material| MaterialInfo::from_material(id, material))
                })
                .collect(),
        })
    }
}

#[cfg(test)]
mod tests {
    use std::cell::RefCell;

    use super::*;
    use crate::{
        assets::ImageData,
        gfx::scene::{Geometry, SceneGraph},
    };

    /// shoe
    /// ├── upper (mesh, leather)
    /// ├── tongue (mesh, leather)
    /// └── shoelace (mesh, cotton)
    fn shoe() -> (SharedGraph, MaterialId, MaterialId) {
        let mut graph = SceneGraph::new();
        let leather = graph.add_material(Material::new("leather", [1.0, 1.0, 1.0, 1.0], 0.1, 0.8));
        let cotton = graph.add_material(Material::new("cotton", [0.0, 0.0, 0.0, 1.0], 0.0, 1.0));
        let geometry = Rc::new(Geometry::new(
            vec![0.0, 0.0, 0.0, 1.0, 0.0, 0.0, 0.0, 1.0, 0.0],
            Vec::new(),
            vec![0, 1, 2],
        ));

        let root = graph.root();
        let shoe = graph.add_node(root, "shoe", NodeKind::Group, Transform::default());
        for (name, material) in [("upper", leather), ("tongue", leather), ("shoelace", cotton)] {
            let node = graph.add_node(shoe, name, NodeKind::Group, Transform::default());
            graph.add_primitive(node, geometry.clone(), material);
        }
        graph.add_node(root, "", NodeKind::Group, Transform::default());

        (Rc::new(RefCell::new(graph)), leather, cotton)
    }

    #[test]
    fn indexes_named_elements_in_traversal_order() {
        let (graph, leather, _) = shoe();
        let customizer = ModelCustomizer::new(graph);

        assert_eq!(
            customizer.available_elements(),
            &["shoe", "upper", "tongue", "shoelace"]
        );
        assert_eq!(customizer.meshes("shoe").len(), 3);
        assert_eq!(customizer.meshes("shoelace").len(), 1);
        assert_eq!(customizer.material_users(leather).len(), 2);
    }

    #[test]
    fn edits_are_clamped_and_shared_materials_touched_once() {
        let (graph, leather, cotton) = shoe();
        let customizer = ModelCustomizer::new(graph.clone());
        let before = graph.borrow().material(leather).unwrap().revision();

        customizer.set_metalness("shoe", 3.0).unwrap();
        customizer.set_roughness("shoelace", -1.0).unwrap();
        customizer.set_color("upper", "#00ff00").unwrap();

        let graph = graph.borrow();
        let leather = graph.material(leather).unwrap();
        let cotton = graph.material(cotton).unwrap();
        assert_eq!(leather.metallic, 1.0);
        assert_eq!(cotton.metallic, 1.0);
        assert_eq!(cotton.roughness, 0.0);
        assert_eq!(leather.color().to_hex(), 0x00ff00);
        assert_eq!(leather.revision(), before + 2);
    }

    #[test]
    fn unknown_or_empty_elements_fail() {
        let (graph, _, _) = shoe();
        let mut scene = graph.borrow_mut();
        let root = scene.root();
        scene.add_node(root, "decal", NodeKind::Group, Transform::default());
        drop(scene);
        let customizer = ModelCustomizer::new(graph);

        assert_eq!(
            customizer.set_roughness("heel", 0.5),
            Err(CustomizeError::NoMeshes("heel".into()))
        );
        assert_eq!(
            customizer.set_metalness("decal", 0.5),
            Err(CustomizeError::NoMeshes("decal".into()))
        );
        assert!(matches!(
            customizer.set_color("shoe", "not-a-color"),
            Err(CustomizeError::InvalidColor(_))
        ));
    }

    #[test]
    fn element_info_deduplicates_materials() {
        let (graph, leather, cotton) = shoe();
        let customizer = ModelCustomizer::new(graph);

        let info = customizer.element_info("shoe").unwrap();
        assert_eq!(info.mesh_count, 3);
        let ids: Vec<_> = info.materials.iter().map(|m| m.id).collect();
        assert_eq!(ids, vec![leather, cotton]);
        assert_eq!(info.materials[0].color, "ffffff");
        assert!(customizer.element_info("heel").is_none());
    }

    #[test]
    fn set_texture_reaches_every_material() {
        let (graph, leather, cotton) = shoe();
        let customizer = ModelCustomizer::new(graph.clone());
        let water = Rc::new(TextureData {
            label: "water".into(),
            image: ImageData::solid([0, 0, 255, 255]),
            flip_y: true,
        });

        customizer.set_texture("shoe", TextureSlot::Map, water.clone()).unwrap();

        let graph = graph.borrow();
        for id in [leather, cotton] {
            let texture = graph.material(id).unwrap().texture(TextureSlot::Map).unwrap();
            assert!(Rc::ptr_eq(texture, &water));
        }
    }
}
