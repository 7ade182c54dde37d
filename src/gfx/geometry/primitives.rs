//! # Primitive Shape Generation
//!
//! This module contains functions to generate the scene's 3D primitives.
//! Shapes are generated with proper normals and texture coordinates.

use super::{GeometryData, LineData};
use crate::gfx::scene::vertex::LineVertex;
use std::f32::consts::PI;

/// Generate a UV sphere with specified resolution
///
/// # Arguments
/// * `radius` - Sphere radius
/// * `width_segments` - Number of vertical segments (longitude lines)
/// * `height_segments` - Number of horizontal segments (latitude lines)
///
/// Returns a sphere centered at the origin, Y up. Each ring has
/// `width_segments + 1` vertices so the UV seam can wrap; the poles use a
/// single triangle per segment.
pub fn generate_sphere(radius: f32, width_segments: u32, height_segments: u32) -> GeometryData {
    let mut data = GeometryData::new();

    let w_segs = width_segments.max(3);
    let h_segs = height_segments.max(2);

    // Generate vertices
    for iy in 0..=h_segs {
        let v = iy as f32 / h_segs as f32;
        let theta = v * PI; // 0 at the north pole, PI at the south pole

        for ix in 0..=w_segs {
            let u = ix as f32 / w_segs as f32;
            let phi = u * 2.0 * PI;

            let x = -phi.cos() * theta.sin();
            let y = theta.cos();
            let z = phi.sin() * theta.sin();

            data.vertices.push([x * radius, y * radius, z * radius]);
            data.normals.push([x, y, z]); // Unit direction doubles as normal
            data.tex_coords.push([u, 1.0 - v]);
        }
    }

    // Generate indices
    let row = w_segs + 1;
    for iy in 0..h_segs {
        for ix in 0..w_segs {
            let a = iy * row + ix + 1;
            let b = iy * row + ix;
            let c = (iy + 1) * row + ix;
            let d = (iy + 1) * row + ix + 1;

            if iy != 0 {
                data.indices.extend_from_slice(&[a, b, d]);
            }
            if iy != h_segs - 1 {
                data.indices.extend_from_slice(&[b, c, d]);
            }
        }
    }

    data
}

/// Generate the axes helper: X red, Y green, Z blue, each `size` long
///
/// Colours fade slightly towards the tip, matching the usual axes gizmo.
pub fn generate_axes(size: f32) -> LineData {
    vec![
        LineVertex::new([0.0, 0.0, 0.0], [1.0, 0.0, 0.0]),
        LineVertex::new([size, 0.0, 0.0], [1.0, 0.6, 0.0]),
        LineVertex::new([0.0, 0.0, 0.0], [0.0, 1.0, 0.0]),
        LineVertex::new([0.0, size, 0.0], [0.6, 1.0, 0.0]),
        LineVertex::new([0.0, 0.0, 0.0], [0.0, 0.0, 1.0]),
        LineVertex::new([0.0, 0.0, size], [0.0, 0.6, 1.0]),
    ]
}
