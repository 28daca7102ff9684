use std::cmp::Ordering;
use std::collections::BinaryHeap;

use tracing::debug;

use crate::error::{FieldError, Result};
use crate::math::Point3;
use crate::topology::MeshTopology;

use super::VertexField;

/// Single-source shortest-path distance field over the mesh vertex graph.
///
/// Distances are measured along mesh edges (edge weight = Euclidean
/// distance between endpoints), which approximates geodesic distance
/// without unfolding across triangle interiors. Vertices in components
/// disconnected from the source keep `f64::INFINITY`.
#[derive(Debug, Clone)]
pub struct GeodesicField {
    distances: Vec<f64>,
    source: u32,
    max_distance: f64,
}

/// Frontier entry ordered so the binary heap pops the smallest tentative
/// distance first, ties broken by vertex index.
#[derive(Debug, Clone, Copy, PartialEq)]
struct FrontierEntry {
    distance: f64,
    vertex: u32,
}

impl Eq for FrontierEntry {}

impl Ord for FrontierEntry {
    fn cmp(&self, other: &Self) -> Ordering {
        other
            .distance
            .total_cmp(&self.distance)
            .then_with(|| other.vertex.cmp(&self.vertex))
    }
}

impl PartialOrd for FrontierEntry {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

impl GeodesicField {
    /// Computes the distance field from a source vertex.
    ///
    /// Runs Dijkstra over the vertex adjacency graph with a binary-heap
    /// frontier (stale entries skipped on pop).
    ///
    /// # Errors
    ///
    /// Returns an error if `source` is out of range for the topology.
    pub fn build(topology: &MeshTopology, source: u32) -> Result<Self> {
        let n = topology.vertex_count();
        if source as usize >= n {
            return Err(FieldError::SourceOutOfRange {
                source_vertex: source,
                vertex_count: n,
            }
            .into());
        }

        let vertices = topology.vertices();
        let mut distances = vec![f64::INFINITY; n];
        distances[source as usize] = 0.0;

        let mut frontier = BinaryHeap::new();
        frontier.push(FrontierEntry {
            distance: 0.0,
            vertex: source,
        });

        let mut settled = 0usize;
        while let Some(entry) = frontier.pop() {
            if entry.distance > distances[entry.vertex as usize] {
                continue;
            }
            settled += 1;

            let point = vertices[entry.vertex as usize].point;
            for &neighbor in &vertices[entry.vertex as usize].neighbors {
                let edge_length = (vertices[neighbor as usize].point - point).norm();
                let candidate = entry.distance + edge_length;
                if candidate < distances[neighbor as usize] {
                    distances[neighbor as usize] = candidate;
                    frontier.push(FrontierEntry {
                        distance: candidate,
                        vertex: neighbor,
                    });
                }
            }
        }

        let max_distance = distances
            .iter()
            .copied()
            .filter(|d| d.is_finite())
            .fold(0.0, f64::max);

        debug!(source, settled, max_distance, "geodesic field built");

        Ok(Self {
            distances,
            source,
            max_distance,
        })
    }

    /// Computes the distance field from the vertex nearest to a
    /// world-space point.
    ///
    /// # Errors
    ///
    /// Returns an error if the topology has no vertices to snap to.
    pub fn build_from_point(topology: &MeshTopology, point: &Point3) -> Result<Self> {
        match topology.closest_vertex(point) {
            Some(source) => Self::build(topology, source),
            None => Err(FieldError::SourceOutOfRange {
                source_vertex: 0,
                vertex_count: 0,
            }
            .into()),
        }
    }

    /// The source vertex the field was seeded from.
    #[must_use]
    pub fn source(&self) -> u32 {
        self.source
    }

    /// The largest finite distance in the field.
    #[must_use]
    pub fn max_distance(&self) -> f64 {
        self.max_distance
    }

    /// The distance at vertex `v`; `f64::INFINITY` for out-of-range
    /// indices and unreachable vertices.
    #[must_use]
    pub fn distance(&self, v: u32) -> f64 {
        self.distances
            .get(v as usize)
            .copied()
            .unwrap_or(f64::INFINITY)
    }

    /// All per-vertex distances, indexed by vertex index.
    #[must_use]
    pub fn distances(&self) -> &[f64] {
        &self.distances
    }

    /// Barycentric interpolation of the field inside a triangle.
    ///
    /// Returns `f64::MAX` for an out-of-range triangle index, matching
    /// the tolerant point-query convention.
    #[must_use]
    pub fn interpolate(&self, topology: &MeshTopology, triangle: u32, bary: [f64; 3]) -> f64 {
        let Ok(tri) = topology.triangle(triangle) else {
            return f64::MAX;
        };
        tri.vertices
            .iter()
            .zip(bary)
            .map(|(&v, w)| w * self.distance(v))
            .sum()
    }

    /// The interpolated field value at a world-space point, using the
    /// closest triangle and the barycentric coordinates of the closest
    /// surface point. Returns `f64::MAX` when no triangle is found
    /// rather than failing.
    #[must_use]
    pub fn distance_at_point(&self, topology: &MeshTopology, point: &Point3) -> f64 {
        match topology.closest_triangle(point) {
            Some((triangle, bary)) => self.interpolate(topology, triangle, bary),
            None => f64::MAX,
        }
    }
}

impl VertexField for GeodesicField {
    fn len(&self) -> usize {
        self.distances.len()
    }

    fn value(&self, v: u32) -> f64 {
        self.distance(v)
    }

    fn max_value(&self) -> f64 {
        self.max_distance
    }
}
