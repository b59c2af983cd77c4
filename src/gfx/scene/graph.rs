//! Arena-backed scene graph for imported models
//!
//! Nodes and materials live in flat vectors and refer to each other by index.
//! Geometry is shared behind `Rc`, so cloning a graph copies the hierarchy and
//! the materials but not the vertex data.

use std::{cell::RefCell, rc::Rc};

use cgmath::{Matrix4, One, Quaternion, SquareMatrix, Vector3};

use super::bounds::Aabb;
use crate::gfx::resources::material::{Material, MaterialId};

pub type NodeId = usize;

/// Scene graph shared between the showroom, the customizer and the renderer
pub type SharedGraph = Rc<RefCell<SceneGraph>>;

/// Local transform of a node, composed as T * R * S
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Transform {
    pub translation: Vector3<f32>,
    pub rotation: Quaternion<f32>,
    pub scale: Vector3<f32>,
}

impl Default for Transform {
    fn default() -> Self {
        Self {
            translation: Vector3::new(0.0, 0.0, 0.0),
            rotation: Quaternion::one(),
            scale: Vector3::new(1.0, 1.0, 1.0),
        }
    }
}

impl Transform {
    pub fn from_translation(translation: Vector3<f32>) -> Self {
        Self {
            translation,
            ..Default::default()
        }
    }

    pub fn matrix(&self) -> Matrix4<f32> {
        Matrix4::from_translation(self.translation)
            * Matrix4::from(self.rotation)
            * Matrix4::from_nonuniform_scale(self.scale.x, self.scale.y, self.scale.z)
    }
}

/// Triangle mesh data with flattened xyz components
#[derive(Debug, Clone, Default)]
pub struct Geometry {
    pub positions: Vec<f32>,
    pub normals: Vec<f32>,
    pub indices: Vec<u32>,
}

impl Geometry {
    /// Builds geometry, computing smooth normals when none are supplied
    pub fn new(positions: Vec<f32>, normals: Vec<f32>, indices: Vec<u32>) -> Self {
        let normals = if normals.len() == positions.len() {
            normals
        } else {
            Self::calculate_face_normals(&positions, &indices)
        };
        Self {
            positions,
            normals,
            indices,
        }
    }

    /// Averages face normals into per-vertex normals
    pub fn calculate_face_normals(positions: &[f32], indices: &[u32]) -> Vec<f32> {
        let vertex_count = positions.len() / 3;
        let mut normals = vec![0.0; positions.len()];
        let mut counts = vec![0u32; vertex_count];

        for triangle in indices.chunks_exact(3) {
            let [i0, i1, i2] = [
                triangle[0] as usize,
                triangle[1] as usize,
                triangle[2] as usize,
            ];
            if i0 >= vertex_count || i1 >= vertex_count || i2 >= vertex_count {
                continue;
            }

            let vertex = |i: usize| {
                Vector3::new(positions[i * 3], positions[i * 3 + 1], positions[i * 3 + 2])
            };
            let (v0, v1, v2) = (vertex(i0), vertex(i1), vertex(i2));
            let face_normal = (v1 - v0).cross(v2 - v0);

            for &vertex_idx in &[i0, i1, i2] {
                normals[vertex_idx * 3] += face_normal.x;
                normals[vertex_idx * 3 + 1] += face_normal.y;
                normals[vertex_idx * 3 + 2] += face_normal.z;
                counts[vertex_idx] += 1;
            }
        }

        for (i, count) in counts.iter().enumerate() {
            let n = &mut normals[i * 3..i * 3 + 3];
            let length = (n[0] * n[0] + n[1] * n[1] + n[2] * n[2]).sqrt();
            if *count > 0 && length > 0.0 {
                n.iter_mut().for_each(|c| *c /= length);
            } else {
                n.copy_from_slice(&[0.0, 1.0, 0.0]);
            }
        }

        normals
    }

    pub fn vertex_count(&self) -> usize {
        self.positions.len() / 3
    }

    pub fn triangle_count(&self) -> usize {
        self.indices.len() / 3
    }

    /// Local-space bounds of the vertex positions
    pub fn bounds(&self) -> Aabb {
        let mut aabb = Aabb::empty();
        for p in self.positions.chunks_exact(3) {
            aabb.expand(Vector3::new(p[0], p[1], p[2]));
        }
        aabb
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum NodeKind {
    Root,
    Group,
    Mesh,
}

impl NodeKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            NodeKind::Root => "Scene",
            NodeKind::Group => "Group",
            NodeKind::Mesh => "Mesh",
        }
    }
}

#[derive(Debug, Clone)]
pub struct Primitive {
    pub geometry: Rc<Geometry>,
    pub material: MaterialId,
}

#[derive(Debug, Clone)]
pub struct Node {
    pub name: String,
    pub kind: NodeKind,
    pub transform: Transform,
    pub parent: Option<NodeId>,
    pub children: Vec<NodeId>,
    pub primitives: Vec<Primitive>,
}

impl Node {
    pub fn is_mesh(&self) -> bool {
        self.kind == NodeKind::Mesh
    }
}

/// Structural counts of a graph
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct GraphStats {
    pub nodes: usize,
    pub meshes: usize,
    pub materials: usize,
    pub vertices: usize,
    pub triangles: usize,
}

#[derive(Debug, Clone)]
pub struct SceneGraph {
    nodes: Vec<Node>,
    materials: Vec<Material>,
    root: NodeId,
}

impl Default for SceneGraph {
    fn default() -> Self {
        Self::new()
    }
}

impl SceneGraph {
    pub fn new() -> Self {
        Self {
            nodes: vec![Node {
                name: String::new(),
                kind: NodeKind::Root,
                transform: Transform::default(),
                parent: None,
                children: Vec::new(),
                primitives: Vec::new(),
            }],
            materials: Vec::new(),
            root: 0,
        }
    }

    pub fn root(&self) -> NodeId {
        self.root
    }

    /// Appends a node under `parent`; an out-of-range parent attaches to the root
    pub fn add_node(
        &mut self,
        parent: NodeId,
        name: &str,
        kind: NodeKind,
        transform: Transform,
    ) -> NodeId {
        let parent = if parent < self.nodes.len() {
            parent
        } else {
            self.root
        };
        let id = self.nodes.len();
        self.nodes.push(Node {
            name: name.to_string(),
            kind,
            transform,
            parent: Some(parent),
            children: Vec::new(),
            primitives: Vec::new(),
        });
        self.nodes[parent].children.push(id);
        id
    }

    /// Attaches geometry to a node, turning it into a mesh
    pub fn add_primitive(&mut self, node: NodeId, geometry: Rc<Geometry>, material: MaterialId) {
        if let Some(node) = self.nodes.get_mut(node) {
            node.kind = NodeKind::Mesh;
            node.primitives.push(Primitive { geometry, material });
        }
    }

    pub fn add_material(&mut self, material: Material) -> MaterialId {
        self.materials.push(material);
        self.materials.len() - 1
    }

    pub fn node(&self, id: NodeId) -> Option<&Node> {
        self.nodes.get(id)
    }

    pub fn node_mut(&mut self, id: NodeId) -> Option<&mut Node> {
        self.nodes.get_mut(id)
    }

    pub fn nodes(&self) -> &[Node] {
        &self.nodes
    }

    pub fn material(&self, id: MaterialId) -> Option<&Material> {
        self.materials.get(id)
    }

    pub fn material_mut(&mut self, id: MaterialId) -> Option<&mut Material> {
        self.materials.get_mut(id)
    }

    pub fn materials(&self) -> &[Material] {
        &self.materials
    }

    /// Depth-first pre-order walk of the subtree rooted at `from`
    pub fn traverse(&self, from: NodeId) -> Vec<NodeId> {
        let mut order = Vec::new();
        let mut stack = vec![from];
        while let Some(id) = stack.pop() {
            let Some(node) = self.nodes.get(id) else {
                continue;
            };
            order.push(id);
            stack.extend(node.children.iter().rev());
        }
        order
    }

    /// First node with the given name in traversal order
    pub fn find(&self, name: &str) -> Option<NodeId> {
        self.traverse(self.root)
            .into_iter()
            .find(|&id| self.nodes[id].name == name)
    }

    /// Product of every transform from the root down to `id`
    pub fn world_matrix(&self, id: NodeId) -> Matrix4<f32> {
        let mut matrix = Matrix4::identity();
        let mut current = Some(id);
        while let Some(node) = current.and_then(|i| self.nodes.get(i)) {
            matrix = node.transform.matrix() * matrix;
            current = node.parent;
        }
        matrix
    }

    /// World-space bounds of every primitive under `id`
    pub fn bounding_box(&self, id: NodeId) -> Aabb {
        self.traverse(id)
            .into_iter()
            .fold(Aabb::empty(), |acc, node_id| {
                let world = self.world_matrix(node_id);
                self.nodes[node_id]
                    .primitives
                    .iter()
                    .fold(acc, |acc, primitive| {
                        acc.union(&primitive.geometry.bounds().transformed(&world))
                    })
            })
    }

    /// Shifts the root so the model's bounds are centred on the origin
    pub fn center_at_origin(&mut self) -> Vector3<f32> {
        let center = self.bounding_box(self.root).center();
        self.nodes[self.root].transform.translation -= center;
        center
    }

    pub fn stats(&self) -> GraphStats {
        let mut stats = GraphStats {
            nodes: self.nodes.len(),
            materials: self.materials.len(),
            ..Default::default()
        };
        for node in self.nodes.iter().filter(|n| n.is_mesh()) {
            stats.meshes += 1;
            for primitive in &node.primitives {
                stats.vertices += primitive.geometry.vertex_count();
                stats.triangles += primitive.geometry.triangle_count();
            }
        }
        stats
    }
}
