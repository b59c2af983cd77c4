//! GPU copy of a scene graph
//!
//! Geometry is uploaded once. Material factors and node transforms are
//! re-synced every frame, but only written when they actually changed.

use cgmath::{Matrix, Matrix4, SquareMatrix};
use log::debug;

use crate::gfx::{
    resources::{
        material::{MaterialId, MaterialUniform},
        uniform_buffer::{uniform_bind_group, UniformBuffer},
    },
    scene::{
        graph::{Geometry, NodeId, SceneGraph},
        vertex::Vertex3D,
    },
};

/// Per-mesh transform uniform, matches `Object` in the shader
#[repr(C)]
#[derive(Copy, Clone, Debug, PartialEq, bytemuck::Pod, bytemuck::Zeroable)]
pub struct ObjectUniform {
    pub model: [[f32; 4]; 4],
    pub normal: [[f32; 4]; 4],
}

impl ObjectUniform {
    pub fn from_world(world: Matrix4<f32>) -> Self {
        let normal = world
            .invert()
            .map(|inverse| inverse.transpose())
            .unwrap_or_else(Matrix4::identity);
        Self {
            model: world.into(),
            normal: normal.into(),
        }
    }
}

/// Interleaves positions and normals into vertex buffer order
pub fn vertices_from_geometry(geometry: &Geometry) -> Vec<Vertex3D> {
    geometry
        .positions
        .chunks_exact(3)
        .zip(geometry.normals.chunks_exact(3))
        .map(|(p, n)| Vertex3D {
            position: [p[0], p[1], p[2]],
            normal: [n[0], n[1], n[2]],
        })
        .collect()
}

struct GpuPrimitive {
    node: NodeId,
    material: MaterialId,
    vertex_buffer: wgpu::Buffer,
    index_buffer: wgpu::Buffer,
    index_count: u32,
    object: UniformBuffer<ObjectUniform>,
    object_bind_group: wgpu::BindGroup,
}

struct GpuMaterial {
    buffer: UniformBuffer<MaterialUniform>,
    bind_group: wgpu::BindGroup,
    revision: u64,
}

pub struct GpuModel {
    primitives: Vec<GpuPrimitive>,
    materials: Vec<GpuMaterial>,
    node_count: usize,
}

impl GpuModel {
    pub fn upload(
        device: &wgpu::Device,
        graph: &SceneGraph,
        object_layout: &wgpu::BindGroupLayout,
        material_layout: &wgpu::BindGroupLayout,
    ) -> Self {
        let materials = graph
            .materials()
            .iter()
            .map(|material| {
                let buffer = UniformBuffer::new(device, &material.uniform());
                let bind_group =
                    uniform_bind_group(device, material_layout, &buffer, &material.name);
                GpuMaterial {
                    buffer,
                    bind_group,
                    revision: material.revision(),
                }
            })
            .collect();

        let mut primitives = Vec::new();
        for id in graph.traverse(graph.root()) {
            let Some(node) = graph.node(id) else {
                continue;
            };
            let world = graph.world_matrix(id);

            for primitive in &node.primitives {
                let geometry = &primitive.geometry;
                if geometry.indices.is_empty() {
                    continue;
                }
                let vertex_buffer = wgpu::util::DeviceExt::create_buffer_init(
                    device,
                    &wgpu::util::BufferInitDescriptor {
                        label: Some(&format!("{} Vertex Buffer", node.name)),
                        contents: bytemuck::cast_slice(&vertices_from_geometry(geometry)),
                        usage: wgpu::BufferUsages::VERTEX,
                    },
                );
                let index_buffer = wgpu::util::DeviceExt::create_buffer_init(
                    device,
                    &wgpu::util::BufferInitDescriptor {
                        label: Some(&format!("{} Index Buffer", node.name)),
                        contents: bytemuck::cast_slice(&geometry.indices),
                        usage: wgpu::BufferUsages::INDEX,
                    },
                );
                let object = UniformBuffer::new(device, &ObjectUniform::from_world(world));
                let object_bind_group =
                    uniform_bind_group(device, object_layout, &object, &node.name);

                primitives.push(GpuPrimitive {
                    node: id,
                    material: primitive.material,
                    vertex_buffer,
                    index_buffer,
                    index_count: geometry.indices.len() as u32,
                    object,
                    object_bind_group,
                });
            }
        }

        debug!(
            "Uploaded {} primitives and {} materials",
            primitives.len(),
            graph.materials().len()
        );

        Self {
            primitives,
            materials,
            node_count: graph.nodes().len(),
        }
    }

    /// Whether this upload still describes `graph`'s structure
    pub fn matches(&self, graph: &SceneGraph) -> bool {
        self.node_count == graph.nodes().len() && self.materials.len() == graph.materials().len()
    }

    /// Pushes edited materials and moved nodes; returns how many materials were re-uploaded
    pub fn sync(&mut self, queue: &wgpu::Queue, graph: &SceneGraph) -> usize {
        let mut uploaded = 0;
        for (gpu, material) in self.materials.iter_mut().zip(graph.materials()) {
            if gpu.revision != material.revision() {
                gpu.buffer.update_content(queue, material.uniform());
                gpu.revision = material.revision();
                uploaded += 1;
            }
        }

        for primitive in &mut self.primitives {
            let world = graph.world_matrix(primitive.node);
            primitive
                .object
                .update_content(queue, ObjectUniform::from_world(world));
        }

        uploaded
    }

    /// Records draw calls; group 0 must already be bound
    pub fn draw<'a>(&'a self, render_pass: &mut wgpu::RenderPass<'a>) {
        for primitive in &self.primitives {
            let Some(material) = self.materials.get(primitive.material) else {
                continue;
            };
            render_pass.set_bind_group(1, &primitive.object_bind_group, &[]);
            render_pass.set_bind_group(2, &material.bind_group, &[]);
            render_pass.set_vertex_buffer(0, primitive.vertex_buffer.slice(..));
            render_pass.set_index_buffer(primitive.index_buffer.slice(..), wgpu::IndexFormat::Uint32);
            render_pass.draw_indexed(0..primitive.index_count, 0, 0..1);
        }
    }

    pub fn primitive_count(&self) -> usize {
        self.primitives.len()
    }
}

#[cfg(test)]
mod tests {
    use cgmath::Vector3;

    use super::*;

    #[test]
    fn interleaves_positions_and_normals() {
        let geometry = Geometry::new(
            vec![0.0, 0.0, 0.0, 1.0, 0.0, 0.0, 0.0, 1.0, 0.0],
            vec![],
            vec![0, 1, 2],
        );
        let vertices = vertices_from_geometry(&geometry);

        assert_eq!(vertices.len(), 3);
        assert_eq!(vertices[1].position, [1.0, 0.0, 0.0]);
        assert_eq!(vertices[2].normal, [0.0, 0.0, 1.0]);
    }

    #[test]
    fn translation_leaves_normal_matrix_rotation_free() {
        let uniform = ObjectUniform::from_world(Matrix4::from_translation(Vector3::new(
            1.0, 2.0, 3.0,
        )));
        assert_eq!(uniform.model[3], [1.0, 2.0, 3.0, 1.0]);
        assert_eq!(uniform.normal[0], [1.0, 0.0, 0.0, -1.0]);
        assert_eq!(uniform.normal[1][1], 1.0);
    }

    #[test]
    fn singular_world_falls_back_to_identity_normals() {
        let uniform = ObjectUniform::from_world(Matrix4::from_scale(0.0));
        let identity: [[f32; 4]; 4] = Matrix4::<f32>::identity().into();
        assert_eq!(uniform.normal, identity);
    }
}
