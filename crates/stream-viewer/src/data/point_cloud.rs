use crate::error::StreamError;
use pointfile::Point3;

/// Decodes a JSON array of `[x, y, z]` triples into a flat `x, y, z, ..`
/// buffer, preserving input order. Every element must be an array of exactly
/// three numbers.
pub fn decode_points(payload: &str) -> Result<Vec<f32>, StreamError> {
    let points: Vec<Point3> = serde_json::from_str(payload)?;
    Ok(pointfile::flatten(&points))
}

/// The CPU copy of the displayed cloud. Replaced wholesale on every update.
#[derive(Debug, Default)]
pub struct PointCloud {
    vertices: Vec<f32>,
    needs_update: bool,
    generation: u64,
}

impl PointCloud {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn from_points(points: &[Point3]) -> Self {
        let mut cloud = Self::new();
        cloud.replace(pointfile::flatten(points));
        cloud
    }

    /// Swaps in a new vertex buffer and flags it for upload.
    pub fn replace(&mut self, vertices: Vec<f32>) {
        debug_assert_eq!(vertices.len() % 3, 0, "vertex buffer must hold whole triples");
        self.vertices = vertices;
        self.needs_update = true;
        self.generation += 1;
    }

    #[inline]
    pub fn vertices(&self) -> &[f32] {
        &self.vertices
    }

    #[inline]
    pub fn point_count(&self) -> usize {
        self.vertices.len() / 3
    }

    #[inline]
    pub fn is_empty(&self) -> bool {
        self.vertices.is_empty()
    }

    /// True between a `replace` and the next GPU upload.
    #[inline]
    pub fn needs_update(&self) -> bool {
        self.needs_update
    }

    pub fn mark_uploaded(&mut self) {
        self.needs_update = false;
    }

    /// Number of replacements since creation.
    #[inline]
    pub fn generation(&self) -> u64 {
        self.generation
    }
}
