pub mod edge;
pub mod triangle;
pub mod vertex;

pub use edge::EdgeData;
pub use triangle::TriangleData;
pub use vertex::VertexData;

use std::collections::{BTreeMap, BTreeSet, HashMap};

use tracing::debug;

use crate::error::{Result, TopologyError};
use crate::math::triangle_3d::closest_point_on_triangle;
use crate::math::{safe_normalize, Point3, Vector3};

/// Parameters controlling topology construction.
#[derive(Debug, Clone, Copy)]
pub struct TopologyParams {
    /// Vertices closer than this distance are merged into one shared
    /// vertex. `None` disables welding and keeps input vertices as-is.
    pub weld_epsilon: Option<f64>,
}

impl Default for TopologyParams {
    fn default() -> Self {
        Self {
            weld_epsilon: Some(1e-3),
        }
    }
}

/// The 1-ring of a vertex in cyclic fan order.
#[derive(Debug, Clone)]
pub struct VertexLink {
    /// Neighboring vertices, ordered by walking the triangle fan.
    pub vertices: Vec<u32>,
    /// Whether the ring closes into a cycle. Open for vertices on the
    /// mesh boundary.
    pub closed: bool,
}

/// Welded vertex/edge/triangle adjacency built from raw indexed mesh data.
///
/// Built once from a position array and a triangle index list; immutable
/// afterwards. Entities reference each other by dense `u32` indices into
/// the vertex, edge and triangle arrays.
#[derive(Debug, Clone)]
pub struct MeshTopology {
    vertices: Vec<VertexData>,
    edges: Vec<EdgeData>,
    triangles: Vec<TriangleData>,
}

impl MeshTopology {
    /// Builds the adjacency structure from raw mesh data.
    ///
    /// Welding (when enabled in `params`) scans previously accepted
    /// vertices linearly for a match within the epsilon, so construction
    /// is O(n²) in the vertex count. Triangles that collapse to fewer
    /// than three distinct vertices after welding are dropped. Edges
    /// with more than two incident triangles (non-manifold input) are
    /// accepted silently.
    ///
    /// # Errors
    ///
    /// Returns an error if the vertex or triangle array is empty, if a
    /// triangle references an out-of-range vertex index, or if every
    /// triangle collapses during welding.
    pub fn build(
        positions: &[Point3],
        triangles: &[[u32; 3]],
        params: TopologyParams,
    ) -> Result<Self> {
        if positions.is_empty() || triangles.is_empty() {
            return Err(TopologyError::EmptyMesh.into());
        }

        let (mut vertices, remap) = weld_vertices(positions, params.weld_epsilon);

        let mut edges: Vec<EdgeData> = Vec::new();
        let mut tris: Vec<TriangleData> = Vec::with_capacity(triangles.len());
        let mut edge_lookup: HashMap<(u32, u32), u32> = HashMap::new();

        for (ti, corners) in triangles.iter().enumerate() {
            for &index in corners {
                if index as usize >= positions.len() {
                    return Err(TopologyError::IndexOutOfRange {
                        triangle: ti,
                        index,
                        vertex_count: positions.len(),
                    }
                    .into());
                }
            }

            let mapped = corners.map(|i| remap[i as usize]);
            let [a, b, c] = mapped;
            if a == b || b == c || a == c {
                // Collapsed by welding
                continue;
            }

            let tri_index = tris.len() as u32;
            let pa = vertices[a as usize].point;
            let pb = vertices[b as usize].point;
            let pc = vertices[c as usize].point;
            let normal = safe_normalize(&(pb - pa).cross(&(pc - pa)));

            let mut tri_edges = [0u32; 3];
            for k in 0..3 {
                let u = mapped[k];
                let v = mapped[(k + 1) % 3];
                let key = if u < v { (u, v) } else { (v, u) };
                let edge_index = *edge_lookup.entry(key).or_insert_with(|| {
                    edges.push(EdgeData::new(u, v));
                    (edges.len() - 1) as u32
                });
                tri_edges[k] = edge_index;
                edges[edge_index as usize].triangles.push(tri_index);
            }

            for k in 0..3 {
                let vert = &mut vertices[mapped[k] as usize];
                vert.triangles.push(tri_index);
                push_unique(&mut vert.edges, tri_edges[k]);
                push_unique(&mut vert.edges, tri_edges[(k + 2) % 3]);
                push_unique(&mut vert.neighbors, mapped[(k + 1) % 3]);
                push_unique(&mut vert.neighbors, mapped[(k + 2) % 3]);
            }

            tris.push(TriangleData {
                vertices: mapped,
                edges: tri_edges,
                normal,
                neighbors: Vec::new(),
            });
        }

        if tris.is_empty() {
            return Err(TopologyError::EmptyMesh.into());
        }

        // Secondary pass: edges sharing an endpoint.
        for e in 0..edges.len() {
            let [a, b] = edges[e].vertices;
            let mut neighbors = Vec::new();
            for v in [a, b] {
                for &other in &vertices[v as usize].edges {
                    if other != e as u32 {
                        push_unique(&mut neighbors, other);
                    }
                }
            }
            edges[e].neighbors = neighbors;
        }

        // Secondary pass: triangles sharing an edge.
        for edge in &edges {
            for i in 0..edge.triangles.len() {
                for j in (i + 1)..edge.triangles.len() {
                    let (ta, tb) = (edge.triangles[i], edge.triangles[j]);
                    push_unique(&mut tris[ta as usize].neighbors, tb);
                    push_unique(&mut tris[tb as usize].neighbors, ta);
                }
            }
        }

        for vert in &mut vertices {
            let mut sum = Vector3::zeros();
            for &t in &vert.triangles {
                sum += tris[t as usize].normal;
            }
            vert.normal = safe_normalize(&sum);
        }

        debug!(
            vertices = vertices.len(),
            edges = edges.len(),
            triangles = tris.len(),
            "mesh topology built"
        );

        Ok(Self {
            vertices,
            edges,
            triangles: tris,
        })
    }

    /// Builds the adjacency structure from a flat triangle index list,
    /// as produced by conventional indexed-mesh assets.
    ///
    /// # Errors
    ///
    /// Returns an error if the index list length is not a multiple of
    /// three, plus everything [`MeshTopology::build`] rejects.
    pub fn build_from_flat(
        positions: &[Point3],
        indices: &[u32],
        params: TopologyParams,
    ) -> Result<Self> {
        if indices.len() % 3 != 0 {
            return Err(TopologyError::RaggedIndexList(indices.len()).into());
        }
        let triangles: Vec<[u32; 3]> = indices
            .chunks_exact(3)
            .map(|chunk| [chunk[0], chunk[1], chunk[2]])
            .collect();
        Self::build(positions, &triangles, params)
    }

    // --- Accessors ---

    /// Number of (welded) vertices.
    #[must_use]
    pub fn vertex_count(&self) -> usize {
        self.vertices.len()
    }

    /// Number of unique edges.
    #[must_use]
    pub fn edge_count(&self) -> usize {
        self.edges.len()
    }

    /// Number of triangles that survived welding.
    #[must_use]
    pub fn triangle_count(&self) -> usize {
        self.triangles.len()
    }

    /// All vertex data, indexed by vertex index.
    #[must_use]
    pub fn vertices(&self) -> &[VertexData] {
        &self.vertices
    }

    /// All edge data, indexed by edge index.
    #[must_use]
    pub fn edges(&self) -> &[EdgeData] {
        &self.edges
    }

    /// All triangle data, indexed by triangle index.
    #[must_use]
    pub fn triangles(&self) -> &[TriangleData] {
        &self.triangles
    }

    /// Returns a reference to the vertex data, or an error if not found.
    ///
    /// # Errors
    ///
    /// Returns an error if the index is out of range.
    pub fn vertex(&self, index: u32) -> Result<&VertexData, TopologyError> {
        self.vertices
            .get(index as usize)
            .ok_or_else(|| TopologyError::EntityNotFound("vertex".into()))
    }

    /// Returns a reference to the edge data, or an error if not found.
    ///
    /// # Errors
    ///
    /// Returns an error if the index is out of range.
    pub fn edge(&self, index: u32) -> Result<&EdgeData, TopologyError> {
        self.edges
            .get(index as usize)
            .ok_or_else(|| TopologyError::EntityNotFound("edge".into()))
    }

    /// Returns a reference to the triangle data, or an error if not found.
    ///
    /// # Errors
    ///
    /// Returns an error if the index is out of range.
    pub fn triangle(&self, index: u32) -> Result<&TriangleData, TopologyError> {
        self.triangles
            .get(index as usize)
            .ok_or_else(|| TopologyError::EntityNotFound("triangle".into()))
    }

    // --- Queries ---

    /// The vertex closest to `point` (O(n) scan).
    #[must_use]
    pub fn closest_vertex(&self, point: &Point3) -> Option<u32> {
        let mut best: Option<(f64, u32)> = None;
        for (i, vert) in self.vertices.iter().enumerate() {
            let d2 = (vert.point - point).norm_squared();
            if best.is_none_or(|(bd, _)| d2 < bd) {
                best = Some((d2, i as u32));
            }
        }
        best.map(|(_, i)| i)
    }

    /// The triangle closest to `point` together with the barycentric
    /// coordinates of the closest surface point (O(n) scan).
    #[must_use]
    pub fn closest_triangle(&self, point: &Point3) -> Option<(u32, [f64; 3])> {
        let mut best: Option<(f64, u32, [f64; 3])> = None;
        for (i, tri) in self.triangles.iter().enumerate() {
            let [a, b, c] = tri.vertices.map(|v| self.vertices[v as usize].point);
            let (closest, bary) = closest_point_on_triangle(point, &a, &b, &c);
            let d2 = (point - closest).norm_squared();
            if best.is_none_or(|(bd, _, _)| d2 < bd) {
                best = Some((d2, i as u32, bary));
            }
        }
        best.map(|(_, i, bary)| (i, bary))
    }

    /// The cyclically ordered 1-ring of vertex `v`, built by walking its
    /// triangle fan. The ring is open for boundary vertices. Inconsistent
    /// winding or non-manifold fans yield a partial ring.
    ///
    /// # Errors
    ///
    /// Returns an error if the index is out of range.
    pub fn vertex_link(&self, v: u32) -> Result<VertexLink, TopologyError> {
        let vert = self.vertex(v)?;

        let mut next: BTreeMap<u32, u32> = BTreeMap::new();
        for &t in &vert.triangles {
            if let Some((p, q)) = self.triangles[t as usize].opposite_pair(v) {
                next.insert(p, q);
            }
        }

        let successors: BTreeSet<u32> = next.values().copied().collect();
        // A fan with a boundary has a unique neighbor with no predecessor.
        let start = next
            .keys()
            .copied()
            .find(|k| !successors.contains(k))
            .or_else(|| next.keys().next().copied());
        let Some(start) = start else {
            return Ok(VertexLink {
                vertices: Vec::new(),
                closed: false,
            });
        };

        let mut ring = vec![start];
        let mut closed = false;
        let mut current = start;
        while let Some(&n) = next.get(&current) {
            if n == start {
                closed = true;
                break;
            }
            if ring.len() >= next.len() {
                break;
            }
            ring.push(n);
            current = n;
        }

        Ok(VertexLink {
            vertices: ring,
            closed,
        })
    }

    /// Number of boundary edges (edges with exactly one incident triangle).
    #[must_use]
    pub fn boundary_edge_count(&self) -> usize {
        self.edges.iter().filter(|e| e.is_boundary()).count()
    }

    /// Whether the mesh is closed (no boundary edges).
    #[must_use]
    pub fn is_closed(&self) -> bool {
        self.boundary_edge_count() == 0
    }

    /// Whether every edge has at most two incident triangles.
    #[must_use]
    pub fn is_manifold(&self) -> bool {
        self.edges.iter().all(|e| e.triangles.len() <= 2)
    }
}

/// Welds near-duplicate input vertices, returning the accepted unique
/// vertices and the input-index to unique-index remap table.
fn weld_vertices(positions: &[Point3], epsilon: Option<f64>) -> (Vec<VertexData>, Vec<u32>) {
    let Some(eps) = epsilon else {
        let vertices = positions.iter().map(|p| VertexData::new(*p)).collect();
        let remap = (0..positions.len() as u32).collect();
        return (vertices, remap);
    };

    let eps2 = eps * eps;
    let mut vertices: Vec<VertexData> = Vec::with_capacity(positions.len());
    let mut remap = Vec::with_capacity(positions.len());
    for p in positions {
        let found = vertices
            .iter()
            .position(|v| (v.point - p).norm_squared() <= eps2);
        match found {
            Some(i) => remap.push(i as u32),
            None => {
                remap.push(vertices.len() as u32);
                vertices.push(VertexData::new(*p));
            }
        }
    }
    (vertices, remap)
}

fn push_unique(list: &mut Vec<u32>, value: u32) {
    if !list.contains(&value) {
        list.push(value);
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;
    use crate::test_meshes::{icosphere, tetrahedron};

    fn p(x: f64, y: f64, z: f64) -> Point3 {
        Point3::new(x, y, z)
    }

    // ── build ──

    #[test]
    fn tetrahedron_counts() {
        let (positions, tris) = tetrahedron();
        let topo = MeshTopology::build(&positions, &tris, TopologyParams::default()).unwrap();
        assert_eq!(topo.vertex_count(), 4);
        assert_eq!(topo.edge_count(), 6);
        assert_eq!(topo.triangle_count(), 4);
        assert!(topo.is_closed());
        assert!(topo.is_manifold());
    }

    #[test]
    fn tetrahedron_adjacency() {
        let (positions, tris) = tetrahedron();
        let topo = MeshTopology::build(&positions, &tris, TopologyParams::default()).unwrap();
        for vert in topo.vertices() {
            assert_eq!(vert.neighbors.len(), 3);
            assert_eq!(vert.edges.len(), 3);
            assert_eq!(vert.triangles.len(), 3);
        }
        for edge in topo.edges() {
            assert_eq!(edge.triangles.len(), 2);
            // 2 other edges per endpoint
            assert_eq!(edge.neighbors.len(), 4);
        }
        for tri in topo.triangles() {
            assert_eq!(tri.neighbors.len(), 3);
        }
    }

    #[test]
    fn welding_merges_triangle_soup() {
        // The tetrahedron as a triangle soup: every face carries its own
        // copies of the corner positions.
        let (positions, tris) = tetrahedron();
        let mut soup_positions = Vec::new();
        let mut soup_tris = Vec::new();
        for tri in &tris {
            let base = soup_positions.len() as u32;
            for &v in tri {
                soup_positions.push(positions[v as usize]);
            }
            soup_tris.push([base, base + 1, base + 2]);
        }

        let topo =
            MeshTopology::build(&soup_positions, &soup_tris, TopologyParams::default()).unwrap();
        assert_eq!(topo.vertex_count(), 4);
        assert_eq!(topo.edge_count(), 6);
        assert_eq!(topo.triangle_count(), 4);
    }

    #[test]
    fn welding_is_idempotent() {
        let (positions, tris) = icosphere();
        let a = MeshTopology::build(&positions, &tris, TopologyParams::default()).unwrap();
        let b = MeshTopology::build(&positions, &tris, TopologyParams::default()).unwrap();

        assert_eq!(a.vertex_count(), b.vertex_count());
        assert_eq!(a.edge_count(), b.edge_count());
        assert_eq!(a.triangle_count(), b.triangle_count());
        for (va, vb) in a.vertices().iter().zip(b.vertices()) {
            assert_eq!(va.neighbors, vb.neighbors);
            assert_eq!(va.edges, vb.edges);
            assert_eq!(va.triangles, vb.triangles);
        }
        for (ea, eb) in a.edges().iter().zip(b.edges()) {
            assert_eq!(ea.vertices, eb.vertices);
            assert_eq!(ea.triangles, eb.triangles);
        }
    }

    #[test]
    fn icosphere_is_manifold() {
        let (positions, tris) = icosphere();
        let topo = MeshTopology::build(&positions, &tris, TopologyParams::default()).unwrap();
        assert_eq!(topo.vertex_count(), 12);
        assert_eq!(topo.edge_count(), 30);
        assert_eq!(topo.triangle_count(), 20);
        assert!(topo.is_closed());
        assert!(topo.is_manifold());
        for edge in topo.edges() {
            assert_eq!(edge.triangles.len(), 2);
        }
        for vert in topo.vertices() {
            assert_eq!(vert.neighbors.len(), vert.edges.len());
        }
    }

    #[test]
    fn empty_input_fails() {
        let result = MeshTopology::build(&[], &[], TopologyParams::default());
        assert!(result.is_err());
    }

    #[test]
    fn flat_index_list_builds_the_same_mesh() {
        let (positions, tris) = tetrahedron();
        let flat: Vec<u32> = tris.iter().flatten().copied().collect();
        let topo =
            MeshTopology::build_from_flat(&positions, &flat, TopologyParams::default()).unwrap();
        assert_eq!(topo.vertex_count(), 4);
        assert_eq!(topo.triangle_count(), 4);
    }

    #[test]
    fn ragged_flat_index_list_fails() {
        let (positions, _) = tetrahedron();
        let result =
            MeshTopology::build_from_flat(&positions, &[0, 1, 2, 3], TopologyParams::default());
        assert!(result.is_err());
    }

    #[test]
    fn out_of_range_index_fails() {
        let positions = vec![p(0.0, 0.0, 0.0), p(1.0, 0.0, 0.0), p(0.0, 1.0, 0.0)];
        let result = MeshTopology::build(&positions, &[[0, 1, 7]], TopologyParams::default());
        assert!(result.is_err());
    }

    #[test]
    fn degenerate_triangles_are_dropped() {
        // Two coincident vertices collapse the second triangle.
        let positions = vec![
            p(0.0, 0.0, 0.0),
            p(1.0, 0.0, 0.0),
            p(0.0, 1.0, 0.0),
            p(1e-6, 0.0, 0.0),
        ];
        let topo =
            MeshTopology::build(&positions, &[[0, 1, 2], [0, 3, 1]], TopologyParams::default())
                .unwrap();
        assert_eq!(topo.triangle_count(), 1);
    }

    // ── queries ──

    #[test]
    fn closest_vertex_picks_nearest() {
        let (positions, tris) = tetrahedron();
        let topo = MeshTopology::build(&positions, &tris, TopologyParams::default()).unwrap();
        let target = positions[2] + Vector3::new(0.01, 0.0, 0.0);
        assert_eq!(topo.closest_vertex(&target), Some(2));
    }

    #[test]
    fn closest_triangle_returns_barycentric() {
        let positions = vec![p(0.0, 0.0, 0.0), p(1.0, 0.0, 0.0), p(0.0, 1.0, 0.0)];
        let topo =
            MeshTopology::build(&positions, &[[0, 1, 2]], TopologyParams::default()).unwrap();
        let (tri, bary) = topo.closest_triangle(&p(0.25, 0.25, 0.5)).unwrap();
        assert_eq!(tri, 0);
        assert!((bary[0] + bary[1] + bary[2] - 1.0).abs() < 1e-9);
        assert!((bary[1] - 0.25).abs() < 1e-9);
        assert!((bary[2] - 0.25).abs() < 1e-9);
    }

    #[test]
    fn vertex_link_closed_on_tetrahedron() {
        let (positions, tris) = tetrahedron();
        let topo = MeshTopology::build(&positions, &tris, TopologyParams::default()).unwrap();
        for v in 0..4 {
            let link = topo.vertex_link(v).unwrap();
            assert!(link.closed, "vertex {v} should have a closed link");
            assert_eq!(link.vertices.len(), 3);
        }
    }

    #[test]
    fn vertex_link_open_on_boundary() {
        let positions = vec![p(0.0, 0.0, 0.0), p(1.0, 0.0, 0.0), p(0.0, 1.0, 0.0)];
        let topo =
            MeshTopology::build(&positions, &[[0, 1, 2]], TopologyParams::default()).unwrap();
        let link = topo.vertex_link(0).unwrap();
        assert!(!link.closed);
        assert_eq!(link.vertices.len(), 2);
    }

    #[test]
    fn vertex_normals_point_outward_on_icosphere() {
        let (positions, tris) = icosphere();
        let topo = MeshTopology::build(&positions, &tris, TopologyParams::default()).unwrap();
        for vert in topo.vertices() {
            // On a unit sphere the accumulated normal is close to the
            // radial direction.
            let radial = vert.point.coords.normalize();
            assert!(vert.normal.dot(&radial) > 0.9);
        }
    }
}
