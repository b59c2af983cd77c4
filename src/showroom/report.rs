//! Structural summary of a loaded model
//!
//! Logged once after loading so it is easy to see which parts of a new model
//! can be customized.

use std::collections::BTreeSet;

use log::info;

use crate::{
    customizer::MaterialInfo,
    gfx::scene::{NodeKind, SceneGraph},
};

#[derive(Debug, Clone, PartialEq)]
pub struct MeshReport {
    pub name: String,
    pub vertices: usize,
    pub triangles: usize,
    pub materials: Vec<usize>,
}

#[derive(Debug, Clone, PartialEq)]
pub struct GroupReport {
    pub name: String,
    pub children: usize,
}

#[derive(Debug, Clone, PartialEq, Default)]
pub struct ModelReport {
    /// Named nodes in traversal order
    pub named: Vec<(String, NodeKind)>,
    pub meshes: Vec<MeshReport>,
    /// Unique materials in first-use order
    pub materials: Vec<MaterialInfo>,
    /// Distinct textures across all materials
    pub texture_count: usize,
    pub groups: Vec<GroupReport>,
}

impl ModelReport {
    pub fn from_graph(graph: &SceneGraph) -> Self {
        let mut report = ModelReport::default();
        let mut seen_materials = BTreeSet::new();
        let mut seen_textures = BTreeSet::new();

        for id in graph.traverse(graph.root()) {
            let Some(node) = graph.node(id) else {
                continue;
            };
            if !node.name.is_empty() {
                report.named.push((node.name.clone(), node.kind));
            }

            match node.kind {
                NodeKind::Mesh => {
                    report.meshes.push(MeshReport {
                        name: display_name(&node.name, "Unnamed Mesh"),
                        vertices: node
                            .primitives
                            .iter()
                            .map(|p| p.geometry.vertex_count())
                            .sum(),
                        triangles: node
                            .primitives
                            .iter()
                            .map(|p| p.geometry.triangle_count())
                            .sum(),
                        materials: node.primitives.iter().map(|p| p.material).collect(),
                    });

                    for primitive in &node.primitives {
                        if !seen_materials.insert(primitive.material) {
                            continue;
                        }
                        let Some(material) = graph.material(primitive.material) else {
                            continue;
                        };
                        for (_, texture) in material.textures() {
                            seen_textures.insert(std::rc::Rc::as_ptr(texture));
                        }
                        report
                            .materials
                            .push(MaterialInfo::from_material(primitive.material, material));
                    }
                }
                NodeKind::Group => report.groups.push(GroupReport {
                    name: display_name(&node.name, "Unnamed Group"),
                    children: node.children.len(),
                }),
                NodeKind::Root => {}
            }
        }

        report.texture_count = seen_textures.len();
        report
    }

    pub fn log(&self) {
        info!(
            "Named objects ({}): {}",
            self.named.len(),
            self.named
                .iter()
                .map(|(name, kind)| format!("{} [{}]", name, kind.as_str()))
                .collect::<Vec<_>>()
                .join(", ")
        );
        info!("Meshes: {}", self.meshes.len());
        for mesh in &self.meshes {
            info!(
                "  {} - {} vertices, {} triangles, materials {:?}",
                mesh.name, mesh.vertices, mesh.triangles, mesh.materials
            );
        }
        info!("Materials: {}", self.materials.len());
        for material in &self.materials {
            info!(
                "  #{} {} - color #{}, metalness {:.2}, roughness {:.2}, textures {:?}",
                material.id,
                material.name,
                material.color,
                material.metalness,
                material.roughness,
                material.textures
            );
        }
        info!("Textures: {}", self.texture_count);
        info!("Groups: {}", self.groups.len());
    }
}

fn display_name(name: &str, fallback: &str) -> String {
    if name.is_empty() {
        fallback.to_string()
    } else {
        name.to_string()
    }
}

#[cfg(test)]
mod tests {
    use std::rc::Rc;

    use super::*;
    use crate::{
        assets::{ImageData, TextureData},
        gfx::{
            resources::material::{Material, TextureSlot},
            scene::{Geometry, Transform},
        },
    };

    #[test]
    fn counts_shared_materials_and_textures_once() {
        let texture = Rc::new(TextureData {
            label: "leather".into(),
            image: ImageData::solid([255, 255, 255, 255]),
            flip_y: false,
        });
        let mut graph = SceneGraph::new();
        let leather = graph.add_material(
            Material::default().with_texture(TextureSlot::Map, texture.clone()),
        );
        let lace = graph.add_material(
            Material::default()
                .with_texture(TextureSlot::Map, texture)
                .with_color(1.0, 0.0, 0.0),
        );
        let geometry = Rc::new(Geometry::new(
            vec![0.0, 0.0, 0.0, 1.0, 0.0, 0.0, 0.0, 1.0, 0.0],
            Vec::new(),
            vec![0, 1, 2],
        ));

        let shoe = graph.add_node(graph.root(), "shoe", NodeKind::Group, Transform::default());
        let upper = graph.add_node(shoe, "", NodeKind::Mesh, Transform::default());
        graph.add_primitive(upper, geometry.clone(), leather);
        let tongue = graph.add_node(shoe, "tongue", NodeKind::Mesh, Transform::default());
        graph.add_primitive(tongue, geometry.clone(), leather);
        let laces = graph.add_node(shoe, "shoelace", NodeKind::Mesh, Transform::default());
        graph.add_primitive(laces, geometry, lace);

        let report = ModelReport::from_graph(&graph);

        assert_eq!(report.named.len(), 3);
        assert_eq!(report.named[0], ("shoe".to_string(), NodeKind::Group));
        assert_eq!(report.meshes.len(), 3);
        assert_eq!(report.meshes[0].name, "Unnamed Mesh");
        assert_eq!(report.meshes[0].triangles, 1);
        assert_eq!(report.materials.len(), 2);
        assert_eq!(report.materials[1].color, "ff0000");
        assert_eq!(report.texture_count, 1);
        assert_eq!(report.groups, vec![GroupReport { name: "shoe".into(), children: 3 }]);
    }
}
