//! Regular lattice shapes centred on the origin.

use crate::Point3;
use rayon::prelude::*;

/// `side_count³` points spaced by `step`, centred on the origin.
pub fn cube(side_count: usize, step: f32) -> Vec<Point3> {
    let half = side_count as f32 / 2.0 * step;
    lattice(side_count, step, half, |_| true)
}

/// Fills a cube of edge `side` with a lattice of spacing `step`.
pub fn filled_cube(side: f32, step: f32) -> Vec<Point3> {
    if !(step > 0.0) || !(side > 0.0) {
        return Vec::new();
    }
    let count = (side / step) as usize;
    lattice(count, step, side / 2.0, |_| true)
}

/// Lattice points of spacing `step` lying inside a ball of `radius`.
pub fn sphere(radius: f32, step: f32) -> Vec<Point3> {
    if !(step > 0.0) || !(radius > 0.0) {
        return Vec::new();
    }
    let count = (2.0 * radius / step) as usize + 1;
    let r2 = radius * radius;
    lattice(count, step, radius, |p| {
        p[0] * p[0] + p[1] * p[1] + p[2] * p[2] <= r2
    })
}

fn lattice<F>(count: usize, step: f32, half: f32, keep: F) -> Vec<Point3>
where
    F: Fn(&Point3) -> bool + Sync,
{
    let keep = &keep;
    let coord = move |i: usize| i as f32 * step - half;

    (0..count)
        .into_par_iter()
        .flat_map_iter(move |x| {
            (0..count).flat_map(move |y| {
                (0..count).filter_map(move |z| {
                    let p = [coord(x), coord(y), coord(z)];
                    keep(&p).then_some(p)
                })
            })
        })
        .collect()
}
