//! Shared mesh fixtures for unit tests.

use crate::math::Point3;

/// A regular tetrahedron with consistent outward winding.
pub fn tetrahedron() -> (Vec<Point3>, Vec<[u32; 3]>) {
    let positions = vec![
        Point3::new(1.0, 1.0, 1.0),
        Point3::new(1.0, -1.0, -1.0),
        Point3::new(-1.0, 1.0, -1.0),
        Point3::new(-1.0, -1.0, 1.0),
    ];
    let triangles = vec![[0, 1, 2], [0, 2, 3], [0, 3, 1], [1, 3, 2]];
    (positions, triangles)
}

/// A unit icosphere: 12 vertices, 30 edges, 20 triangles, outward winding.
pub fn icosphere() -> (Vec<Point3>, Vec<[u32; 3]>) {
    let phi = (1.0 + 5.0_f64.sqrt()) / 2.0;
    let raw = [
        (-1.0, phi, 0.0),
        (1.0, phi, 0.0),
        (-1.0, -phi, 0.0),
        (1.0, -phi, 0.0),
        (0.0, -1.0, phi),
        (0.0, 1.0, phi),
        (0.0, -1.0, -phi),
        (0.0, 1.0, -phi),
        (phi, 0.0, -1.0),
        (phi, 0.0, 1.0),
        (-phi, 0.0, -1.0),
        (-phi, 0.0, 1.0),
    ];
    let positions = raw
        .iter()
        .map(|&(x, y, z)| {
            let len = (x * x + y * y + z * z).sqrt();
            Point3::new(x / len, y / len, z / len)
        })
        .collect();
    let triangles = vec![
        [0, 11, 5],
        [0, 5, 1],
        [0, 1, 7],
        [0, 7, 10],
        [0, 10, 11],
        [1, 5, 9],
        [5, 11, 4],
        [11, 10, 2],
        [10, 7, 6],
        [7, 1, 8],
        [3, 9, 4],
        [3, 4, 2],
        [3, 2, 6],
        [3, 6, 8],
        [3, 8, 9],
        [4, 9, 5],
        [2, 4, 11],
        [6, 2, 10],
        [8, 6, 7],
        [9, 8, 1],
    ];
    (positions, triangles)
}

/// A flat `n x n`-cell grid patch in the XY plane with unit cells.
///
/// `(n + 1)²` vertices; vertex `(i, j)` has index `j * (n + 1) + i`.
/// Each cell carries the diagonal from its lower-left to its upper-right
/// corner.
pub fn grid(n: u32) -> (Vec<Point3>, Vec<[u32; 3]>) {
    let side = n + 1;
    let mut positions = Vec::with_capacity((side * side) as usize);
    for j in 0..side {
        for i in 0..side {
            positions.push(Point3::new(f64::from(i), f64::from(j), 0.0));
        }
    }
    let mut triangles = Vec::with_capacity((n * n * 2) as usize);
    for j in 0..n {
        for i in 0..n {
            let v00 = j * side + i;
            let v10 = v00 + 1;
            let v01 = v00 + side;
            let v11 = v01 + 1;
            triangles.push([v00, v10, v11]);
            triangles.push([v00, v11, v01]);
        }
    }
    (positions, triangles)
}

/// A torus centred at the origin with its axis along Z.
///
/// `segments` steps around the major circle, `rings` around the minor
/// circle; closed, genus 1, consistent winding.
pub fn torus(major_radius: f64, minor_radius: f64, segments: u32, rings: u32) -> (Vec<Point3>, Vec<[u32; 3]>) {
    let mut positions = Vec::with_capacity((segments * rings) as usize);
    for s in 0..segments {
        let theta = f64::from(s) / f64::from(segments) * std::f64::consts::TAU;
        for r in 0..rings {
            let phi = f64::from(r) / f64::from(rings) * std::f64::consts::TAU;
            let ring_radius = major_radius + minor_radius * phi.cos();
            positions.push(Point3::new(
                ring_radius * theta.cos(),
                ring_radius * theta.sin(),
                minor_radius * phi.sin(),
            ));
        }
    }
    let mut triangles = Vec::with_capacity((segments * rings * 2) as usize);
    for s in 0..segments {
        let s1 = (s + 1) % segments;
        for r in 0..rings {
            let r1 = (r + 1) % rings;
            let v00 = s * rings + r;
            let v01 = s * rings + r1;
            let v10 = s1 * rings + r;
            let v11 = s1 * rings + r1;
            triangles.push([v00, v10, v11]);
            triangles.push([v00, v11, v01]);
        }
    }
    (positions, triangles)
}
