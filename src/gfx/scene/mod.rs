//! # Scene Management Module
//!
//! Representation of imported models: an arena-indexed node hierarchy with
//! transforms, shared geometry and per-graph materials.
//!
//! ## Key Components
//!
//! - [`SceneGraph`] - Nodes, materials and hierarchy queries
//! - [`Geometry`] - Triangle data shared between clones of a graph
//! - [`Aabb`] - World-space bounds used for centring and camera framing
//! - [`Vertex3D`] - Interleaved vertex layout uploaded to the GPU
//!
//! ## Usage
//!
//! ```no_run
//! use atelier::gfx::scene::{NodeKind, SceneGraph, Transform};
//!
//! let mut graph = SceneGraph::new();
//! let laces = graph.add_node(graph.root(), "shoelace", NodeKind::Group, Transform::default());
//! let bounds = graph.bounding_box(laces);
//! ```

pub mod bounds;
pub mod graph;
pub mod vertex;

pub use bounds::Aabb;
pub use graph::{
    Geometry, GraphStats, Node, NodeId, NodeKind, Primitive, SceneGraph, SharedGraph, Transform,
};
pub use vertex::Vertex3D;
