//! Neighbour graph over a point set, used to smooth ("relax") clouds.

use crate::Point3;
use rayon::prelude::*;

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct MeshStats {
    /// Mean neighbour count over all points.
    pub average_connections: f64,
    /// Points with no neighbour at all.
    pub unconnected: usize,
}

#[derive(Debug, Clone, Default)]
pub struct PointMesh {
    pub points: Vec<Point3>,
    /// `connections[i]` lists the indices of every neighbour of point `i`.
    /// Symmetric: `j ∈ connections[i]` iff `i ∈ connections[j]`.
    pub connections: Vec<Vec<usize>>,
}

#[inline(always)]
fn dist2(a: &Point3, b: &Point3) -> f32 {
    let dx = a[0] - b[0];
    let dy = a[1] - b[1];
    let dz = a[2] - b[2];
    dx * dx + dy * dy + dz * dz
}

impl PointMesh {
    pub fn new(points: Vec<Point3>) -> Self {
        let connections = vec![Vec::new(); points.len()];
        Self {
            points,
            connections,
        }
    }

    /// Rebuilds the neighbour lists, linking every pair closer than `radius`.
    pub fn establish_connections(&mut self, radius: f32) {
        let r2 = radius * radius;
        let points = &self.points;

        self.connections = points
            .par_iter()
            .enumerate()
            .map(|(i, p)| {
                points
                    .iter()
                    .enumerate()
                    .filter(|&(j, q)| j != i && dist2(p, q) <= r2)
                    .map(|(j, _)| j)
                    .collect()
            })
            .collect();
    }

    /// Drops points without neighbours and rewrites the remaining indices.
    pub fn remove_unconnected_points(&mut self) {
        let mut remap = vec![usize::MAX; self.points.len()];
        let mut next = 0;
        for (old, links) in self.connections.iter().enumerate() {
            if !links.is_empty() {
                remap[old] = next;
                next += 1;
            }
        }

        let mut points = Vec::with_capacity(next);
        let mut connections = Vec::with_capacity(next);
        for (old, links) in self.connections.iter().enumerate() {
            if remap[old] == usize::MAX {
                continue;
            }
            points.push(self.points[old]);
            connections.push(links.iter().map(|&j| remap[j]).collect());
        }

        self.points = points;
        self.connections = connections;
    }

    /// Moves every connected point towards the centroid of its neighbours.
    /// `factor = 0` leaves points in place, `factor = 1` snaps them to the centroid.
    pub fn relaxation_step(&mut self, factor: f32) {
        let points = &self.points;

        let relaxed: Vec<Point3> = points
            .par_iter()
            .zip(self.connections.par_iter())
            .map(|(p, links)| {
                if links.is_empty() {
                    return *p;
                }

                let mut sum = [0.0f32; 3];
                for &j in links {
                    sum[0] += points[j][0];
                    sum[1] += points[j][1];
                    sum[2] += points[j][2];
                }
                let n = links.len() as f32;

                [
                    p[0] * (1.0 - factor) + sum[0] / n * factor,
                    p[1] * (1.0 - factor) + sum[1] / n * factor,
                    p[2] * (1.0 - factor) + sum[2] / n * factor,
                ]
            })
            .collect();

        self.points = relaxed;
    }

    pub fn statistics(&self) -> MeshStats {
        let total: usize = self.connections.iter().map(Vec::len).sum();
        let unconnected = self.connections.iter().filter(|l| l.is_empty()).count();
        let average_connections = if self.points.is_empty() {
            0.0
        } else {
            total as f64 / self.points.len() as f64
        };

        MeshStats {
            average_connections,
            unconnected,
        }
    }
}
