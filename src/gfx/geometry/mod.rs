//! # Procedural Geometry Generation
//!
//! This module provides functions to generate the primitive shapes the scene
//! needs procedurally, so no model files are loaded.
//!
//! ## Supported Primitives
//!
//! - **Sphere**: UV sphere with configurable radius and resolution
//! - **Axes**: three coloured line segments marking the world axes
//!
//! ## Usage
//!
//! ```rust
//! use pulse_sphere::gfx::geometry::{generate_axes, generate_sphere};
//!
//! // The reference sphere: radius 5, 96 x 96 segments
//! let sphere = generate_sphere(5.0, 96, 96);
//! let wireframe = sphere.wireframe_indices();
//!
//! // Axes helper of length 3
//! let axes = generate_axes(3.0);
//! assert_eq!(axes.len(), 6);
//! ```

pub mod primitives;

use std::collections::HashSet;

pub use primitives::*;

use crate::gfx::scene::vertex::{LineVertex, Vertex3D};

/// Represents generated geometry data ready for GPU upload
#[derive(Debug, Clone, Default)]
pub struct GeometryData {
    /// Vertex positions (x, y, z)
    pub vertices: Vec<[f32; 3]>,
    /// Texture coordinates (u, v)
    pub tex_coords: Vec<[f32; 2]>,
    /// Normal vectors (x, y, z)
    pub normals: Vec<[f32; 3]>,
    /// Triangle indices (counter-clockwise winding)
    pub indices: Vec<u32>,
}

impl GeometryData {
    /// Create a new empty geometry data structure
    pub fn new() -> Self {
        Self::default()
    }

    /// Get the number of vertices in this geometry
    pub fn vertex_count(&self) -> usize {
        self.vertices.len()
    }

    /// Get the number of triangles in this geometry
    pub fn triangle_count(&self) -> usize {
        self.indices.len() / 3
    }

    /// Line-list indices covering every triangle edge exactly once
    pub fn wireframe_indices(&self) -> Vec<u32> {
        let mut seen = HashSet::with_capacity(self.indices.len());
        let mut lines = Vec::with_capacity(self.indices.len() * 2);

        for triangle in self.indices.chunks_exact(3) {
            for (a, b) in [
                (triangle[0], triangle[1]),
                (triangle[1], triangle[2]),
                (triangle[2], triangle[0]),
            ] {
                if seen.insert((a.min(b), a.max(b))) {
                    lines.push(a);
                    lines.push(b);
                }
            }
        }

        lines
    }

    /// Interleaves positions, normals and UVs into GPU vertices
    pub fn to_vertices(&self) -> Vec<Vertex3D> {
        (0..self.vertices.len())
            .map(|i| Vertex3D {
                position: self.vertices[i],
                normal: self.normals.get(i).copied().unwrap_or([0.0, 1.0, 0.0]),
                uv: self.tex_coords.get(i).copied().unwrap_or([0.0, 0.0]),
            })
            .collect()
    }
}

/// Coloured line segments, two vertices per segment
pub type LineData = Vec<LineVertex>;
