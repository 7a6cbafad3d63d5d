//! POINTS: headerless point file format plus the generators that produce it.
//!
//! - One record per point: three little-endian `f32` values `x, y, z`.
//! - No header, no count: the point count is `file_len / 12`.
//! - A trailing partial record is rejected as `InvalidData`.
//!
//! File layout (little-endian):
//!   00  : f32 x0, f32 y0, f32 z0
//!   0C  : f32 x1, f32 y1, f32 z1
//!   ..
//!
//! Alongside the codec this crate provides lattice [`shapes`] (cube, sphere)
//! and a [`mesh::PointMesh`] for neighbour-based relaxation.

pub mod io;
pub mod mesh;
pub mod shapes;

pub use io::{parse_points, read_points, write_points, DEFAULT_POINTS_FILE, RECORD_LEN};
pub use mesh::{MeshStats, PointMesh};

/// A single point, `[x, y, z]`.
pub type Point3 = [f32; 3];

/// Flattens points into the contiguous `x, y, z, x, y, z, ..` layout used
/// by vertex buffers.
pub fn flatten(points: &[Point3]) -> Vec<f32> {
    let mut out = Vec::with_capacity(points.len() * 3);
    for p in points {
        out.extend_from_slice(p);
    }
    out
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn flatten_keeps_order() {
        let flat = flatten(&[[1.0, 2.0, 3.0], [4.0, 5.0, 6.0]]);
        assert_eq!(flat, vec![1.0, 2.0, 3.0, 4.0, 5.0, 6.0]);
    }

    #[test]
    fn flatten_empty() {
        assert!(flatten(&[]).is_empty());
    }
}
