//! Conversion of parsed model files into [`SceneGraph`]s

use std::{collections::HashMap, rc::Rc};

use cgmath::{Quaternion, Vector3};
use log::{debug, warn};

use super::{
    error::LoadFailure,
    handle::{ImageData, TextureData},
};
use crate::gfx::{
    resources::material::{Material, MaterialId, TextureSlot},
    scene::{Geometry, NodeId, NodeKind, SceneGraph, Transform},
};

const DRACO_EXTENSION: &str = "KHR_draco_mesh_compression";

/// Builds a scene graph from an imported glTF document
///
/// Only triangle-list primitives are kept. Materials are created once per glTF
/// material, so meshes sharing a material in the file share it in the graph.
pub fn scene_from_gltf(
    document: &gltf::Document,
    buffers: &[gltf::buffer::Data],
    images: &[gltf::image::Data],
) -> Result<SceneGraph, LoadFailure> {
    if document.extensions_required().any(|ext| ext == DRACO_EXTENSION) {
        return Err(LoadFailure::decode(
            "Draco-compressed geometry is not supported",
        ));
    }

    let scene = document
        .default_scene()
        .or_else(|| document.scenes().next())
        .ok_or_else(|| LoadFailure::decode("glTF file contains no scene"))?;

    let mut importer = GltfImporter {
        buffers,
        images,
        graph: SceneGraph::new(),
        materials: HashMap::new(),
        textures: HashMap::new(),
    };
    let root = importer.graph.root();
    for node in scene.nodes() {
        importer.visit_node(&node, root)?;
    }

    let graph = importer.graph;
    let stats = graph.stats();
    debug!(
        "Imported glTF scene: {} nodes, {} meshes, {} materials",
        stats.nodes, stats.meshes, stats.materials
    );
    Ok(graph)
}

struct GltfImporter<'a> {
    buffers: &'a [gltf::buffer::Data],
    images: &'a [gltf::image::Data],
    graph: SceneGraph,
    /// glTF material index (`None` for the implicit default) to graph material
    materials: HashMap<Option<usize>, MaterialId>,
    textures: HashMap<usize, Rc<TextureData>>,
}

impl GltfImporter<'_> {
    fn visit_node(&mut self, node: &gltf::Node, parent: NodeId) -> Result<(), LoadFailure> {
        let (translation, rotation, scale) = node.transform().decomposed();
        let transform = Transform {
            translation: Vector3::from(translation),
            rotation: Quaternion::new(rotation[3], rotation[0], rotation[1], rotation[2]),
            scale: Vector3::from(scale),
        };
        let name = node.name().unwrap_or_default();
        let id = self.graph.add_node(parent, name, NodeKind::Group, transform);

        if let Some(mesh) = node.mesh() {
            for primitive in mesh.primitives() {
                if primitive.mode() != gltf::mesh::Mode::Triangles {
                    debug!("Skipping non-triangle primitive in mesh '{}'", name);
                    continue;
                }
                let geometry = self.read_geometry(&primitive)?;
                let material = self.material(&primitive.material());
                self.graph.add_primitive(id, Rc::new(geometry), material);
            }
        }

        for child in node.children() {
            self.visit_node(&child, id)?;
        }
        Ok(())
    }

    fn read_geometry(&self, primitive: &gltf::Primitive) -> Result<Geometry, LoadFailure> {
        let reader = primitive.reader(|buffer| {
            self.buffers
                .get(buffer.index())
                .map(|data| data.0.as_slice())
        });

        let positions: Vec<f32> = reader
            .read_positions()
            .ok_or_else(|| LoadFailure::decode("primitive has no POSITION attribute"))?
            .flatten()
            .collect();
        let normals: Vec<f32> = reader
            .read_normals()
            .map(|normals| normals.flatten().collect())
            .unwrap_or_default();
        let indices: Vec<u32> = match reader.read_indices() {
            Some(indices) => indices.into_u32().collect(),
            None => (0..(positions.len() / 3) as u32).collect(),
        };

        Ok(Geometry::new(positions, normals, indices))
    }

    fn material(&mut self, source: &gltf::Material) -> MaterialId {
        if let Some(&id) = self.materials.get(&source.index()) {
            return id;
        }

        let pbr = source.pbr_metallic_roughness();
        let [er, eg, eb] = source.emissive_factor();
        let mut material = Material::new(
            source.name().unwrap_or_default(),
            pbr.base_color_factor(),
            pbr.metallic_factor(),
            pbr.roughness_factor(),
        )
        .with_emission(er, eg, eb);

        if let Some(normal) = source.normal_texture() {
            material.normal_scale = normal.scale();
            self.attach(&mut material, TextureSlot::NormalMap, normal.texture());
        }
        if let Some(occlusion) = source.occlusion_texture() {
            material.occlusion_strength = occlusion.strength();
            self.attach(&mut material, TextureSlot::AoMap, occlusion.texture());
        }
        if let Some(info) = pbr.base_color_texture() {
            self.attach(&mut material, TextureSlot::Map, info.texture());
        }
        if let Some(info) = pbr.metallic_roughness_texture() {
            // glTF packs both factors in one image: roughness in G, metalness in B
            self.attach(&mut material, TextureSlot::RoughnessMap, info.texture());
            self.attach(&mut material, TextureSlot::MetalnessMap, info.texture());
        }
        if let Some(info) = source.emissive_texture() {
            self.attach(&mut material, TextureSlot::EmissiveMap, info.texture());
        }

        let id = self.graph.add_material(material);
        self.materials.insert(source.index(), id);
        id
    }

    fn attach(&mut self, material: &mut Material, slot: TextureSlot, texture: gltf::Texture) {
        let index = texture.source().index();
        let cached = self.textures.get(&index).cloned();
        let texture = match cached {
            Some(texture) => texture,
            None => {
                let Some(image) = self.images.get(index).and_then(rgba8_from_gltf) else {
                    warn!(
                        "Unsupported pixel format for image {} of material '{}'",
                        index, material.name
                    );
                    return;
                };
                let texture = Rc::new(TextureData {
                    label: texture.source().name().unwrap_or_default().to_string(),
                    image,
                    flip_y: false,
                });
                self.textures.insert(index, texture.clone());
                texture
            }
        };
        material.set_texture(slot, texture);
    }
}

/// Expands 8-bit glTF images to RGBA8; wider formats are not sampled
fn rgba8_from_gltf(data: &gltf::image::Data) -> Option<ImageData> {
    use gltf::image::Format;

    let pixels: Vec<u8> = match data.format {
        Format::R8G8B8A8 => data.pixels.clone(),
        Format::R8G8B8 => data
            .pixels
            .chunks_exact(3)
            .flat_map(|p| [p[0], p[1], p[2], 255])
            .collect(),
        Format::R8G8 => data
            .pixels
            .chunks_exact(2)
            .flat_map(|p| [p[0], p[1], 0, 255])
            .collect(),
        Format::R8 => data.pixels.iter().flat_map(|&l| [l, l, l, 255]).collect(),
        _ => return None,
    };
    Some(ImageData::new(data.width, data.height, pixels))
}

/// Builds a scene graph from OBJ models, one mesh node per model
///
/// MTL shininess is mapped onto roughness; metalness is not expressible in MTL.
pub fn scene_from_obj(models: &[tobj::Model], materials: &[tobj::Material]) -> SceneGraph {
    let mut graph = SceneGraph::new();

    let material_ids: Vec<MaterialId> = materials
        .iter()
        .enumerate()
        .map(|(i, mtl)| {
            let name = if mtl.name.is_empty() {
                format!("material_{}", i)
            } else {
                mtl.name.clone()
            };
            let diffuse = mtl.diffuse.unwrap_or([0.8, 0.8, 0.8]);
            graph.add_material(Material::new(
                &name,
                [diffuse[0], diffuse[1], diffuse[2], mtl.dissolve.unwrap_or(1.0)],
                0.0,
                1.0 - (mtl.shininess.unwrap_or(32.0) / 128.0).clamp(0.0, 1.0),
            ))
        })
        .collect();

    let mut fallback = None;
    for model in models {
        let mesh = &model.mesh;
        let material = match mesh.material_id.and_then(|i| material_ids.get(i)) {
            Some(&id) => id,
            None => *fallback.get_or_insert_with(|| graph.add_material(Material::default())),
        };

        let node = graph.add_node(
            graph.root(),
            &model.name,
            NodeKind::Mesh,
            Transform::default(),
        );
        let geometry = Geometry::new(
            mesh.positions.clone(),
            mesh.normals.clone(),
            mesh.indices.clone(),
        );
        graph.add_primitive(node, Rc::new(geometry), material);
    }

    graph
}

#[cfg(test)]
mod tests {
    use super::*;

    /// One triangle in an embedded buffer, two nodes sharing one material
    const TRIANGLE_GLTF: &str = r#"{
        "asset": { "version": "2.0" },
        "scene": 0,
        "scenes": [{ "nodes": [0] }],
        "nodes": [
            { "name": "shoe", "children": [1, 2], "translation": [0.0, 2.0, 0.0] },
            { "name": "upper", "mesh": 0 },
            { "name": "shoelace", "mesh": 0, "translation": [5.0, 0.0, 0.0] }
        ],
        "meshes": [{ "primitives": [{ "attributes": { "POSITION": 0 }, "material": 0 }] }],
        "materials": [{
            "name": "leather",
            "pbrMetallicRoughness": {
                "baseColorFactor": [1.0, 0.0, 0.0, 1.0],
                "metallicFactor": 0.25,
                "roughnessFactor": 0.75
            }
        }],
        "buffers": [{
            "byteLength": 36,
            "uri": "data:application/octet-stream;base64,AAAAAAAAAAAAAAAAAACAPwAAAAAAAAAAAAAAAAAAgD8AAAAA"
        }],
        "bufferViews": [{ "buffer": 0, "byteLength": 36 }],
        "accessors": [{
            "bufferView": 0,
            "componentType": 5126,
            "count": 3,
            "type": "VEC3",
            "min": [0.0, 0.0, 0.0],
            "max": [1.0, 1.0, 0.0]
        }]
    }"#;

    #[test]
    fn imports_gltf_hierarchy_and_materials() {
        let (document, buffers, images) = gltf::import_slice(TRIANGLE_GLTF.as_bytes()).unwrap();
        let graph = scene_from_gltf(&document, &buffers, &images).unwrap();

        let shoe = graph.find("shoe").unwrap();
        let upper = graph.find("upper").unwrap();
        let laces = graph.find("shoelace").unwrap();

        assert_eq!(graph.node(upper).unwrap().parent, Some(shoe));
        assert!(graph.node(upper).unwrap().is_mesh());
        assert!(!graph.node(shoe).unwrap().is_mesh());

        // both meshes reuse the single glTF material
        assert_eq!(graph.materials().len(), 1);
        let material = &graph.materials()[0];
        assert_eq!(material.name, "leather");
        assert_eq!(material.metallic, 0.25);
        assert_eq!(material.roughness, 0.75);

        let bounds = graph.bounding_box(laces);
        assert_eq!(bounds.min, Vector3::new(5.0, 2.0, 0.0));
        assert_eq!(bounds.max, Vector3::new(6.0, 3.0, 0.0));
    }

    #[test]
    fn imports_obj_with_mtl_roughness() {
        let models = vec![tobj::Model::new(
            tobj::Mesh {
                positions: vec![0.0, 0.0, 0.0, 1.0, 0.0, 0.0, 0.0, 1.0, 0.0],
                indices: vec![0, 1, 2],
                material_id: Some(0),
                ..Default::default()
            },
            "sole".to_string(),
        )];
        let materials = vec![tobj::Material {
            name: "rubber".to_string(),
            diffuse: Some([0.1, 0.1, 0.1]),
            shininess: Some(64.0),
            ..Default::default()
        }];

        let graph = scene_from_obj(&models, &materials);
        let sole = graph.find("sole").unwrap();
        let primitive = &graph.node(sole).unwrap().primitives[0];

        assert_eq!(graph.material(primitive.material).unwrap().roughness, 0.5);
        assert_eq!(primitive.geometry.normals.len(), 9);
    }

    #[test]
    fn obj_without_materials_gets_default() {
        let point = |x: f32| tobj::Mesh {
            positions: vec![x, 0.0, 0.0],
            ..Default::default()
        };
        let models = vec![
            tobj::Model::new(point(0.0), "a".to_string()),
            tobj::Model::new(point(1.0), "b".to_string()),
        ];

        let graph = scene_from_obj(&models, &[]);
        assert_eq!(graph.materials().len(), 1);
        assert_eq!(graph.materials()[0].name, "Default");
    }
}
