use std::collections::{HashMap, VecDeque};

use crate::field::VertexField;
use crate::math::{Point3, TOLERANCE};
use crate::topology::MeshTopology;

/// A polyline where a scalar field crosses a threshold level.
#[derive(Debug, Clone)]
pub struct Contour {
    /// Ordered points along the polyline. Closed contours do not repeat
    /// the first point at the end.
    pub points: Vec<Point3>,
    /// Whether the polyline closes into a loop; open contours end on the
    /// mesh boundary or at a vertex the level passes through exactly.
    pub closed: bool,
    /// Indices of the triangles the polyline passes through.
    pub triangles: Vec<u32>,
}

/// Marching-triangles extraction of a field's level set at a fixed
/// threshold.
///
/// Every triangle whose vertex values straddle the threshold contributes
/// one segment between its two crossing edges; segments are stitched
/// into polylines across shared mesh edges. Because a crossing point is
/// identified by its edge index, stitching is exact and needs no
/// coordinate quantization.
///
/// A vertex exactly at the threshold counts as at-or-above. Segments
/// whose two crossings coincide (the level passing exactly through a
/// vertex) are dropped, which separates the lobes of a critical level
/// set into distinct chains terminating at the critical vertex.
#[derive(Debug, Clone, Copy)]
pub struct ExtractContours {
    level: f64,
    through_vertex: Option<u32>,
}

/// One triangle's piece of the level set, identified by its two crossing
/// edges.
#[derive(Debug, Clone, Copy)]
struct Segment {
    edges: [u32; 2],
    triangle: u32,
}

impl ExtractContours {
    /// Creates an extraction at the given threshold level.
    #[must_use]
    pub fn new(level: f64) -> Self {
        Self {
            level,
            through_vertex: None,
        }
    }

    /// Restricts the output to contour components passing through an
    /// edge incident to `vertex`. Used to isolate the portion of a
    /// critical level set local to a saddle.
    #[must_use]
    pub fn through_vertex(mut self, vertex: u32) -> Self {
        self.through_vertex = Some(vertex);
        self
    }

    /// Runs the extraction, returning one [`Contour`] per stitched
    /// component.
    pub fn execute<F: VertexField>(&self, topology: &MeshTopology, field: &F) -> Vec<Contour> {
        let (crossings, segments) = self.march(topology, field);
        let chains = stitch(&segments);

        let mut contours = Vec::with_capacity(chains.len());
        for chain in chains {
            if let Some(s) = self.through_vertex {
                let touches = chain
                    .edges
                    .iter()
                    .any(|&e| topology.edges()[e as usize].has_vertex(s));
                if !touches {
                    continue;
                }
            }
            let points = chain.edges.iter().map(|e| crossings[e]).collect();
            contours.push(Contour {
                points,
                closed: chain.closed,
                triangles: chain.triangles,
            });
        }
        contours
    }

    /// Marches every straddling triangle, producing per-edge crossing
    /// points and per-triangle segments.
    fn march<F: VertexField>(
        &self,
        topology: &MeshTopology,
        field: &F,
    ) -> (HashMap<u32, Point3>, Vec<Segment>) {
        let mut crossings: HashMap<u32, Point3> = HashMap::new();
        let mut segments = Vec::new();

        for (ti, tri) in topology.triangles().iter().enumerate() {
            let below = tri.vertices.map(|v| field.is_below(v, self.level));
            if below.iter().all(|&b| b) || !below.iter().any(|&b| b) {
                continue;
            }

            let mut crossed = [0u32; 2];
            let mut count = 0;
            for k in 0..3 {
                if below[k] != below[(k + 1) % 3] && count < 2 {
                    crossed[count] = tri.edges[k];
                    count += 1;
                }
            }
            if count != 2 {
                continue;
            }

            for &e in &crossed {
                crossings
                    .entry(e)
                    .or_insert_with(|| self.crossing_point(topology, e, field));
            }

            let p0 = crossings[&crossed[0]];
            let p1 = crossings[&crossed[1]];
            if (p1 - p0).norm_squared() < TOLERANCE {
                continue;
            }

            segments.push(Segment {
                edges: crossed,
                triangle: ti as u32,
            });
        }

        (crossings, segments)
    }

    /// Linear interpolation of the crossing point along a straddling
    /// edge.
    fn crossing_point<F: VertexField>(
        &self,
        topology: &MeshTopology,
        edge: u32,
        field: &F,
    ) -> Point3 {
        let [a, b] = topology.edges()[edge as usize].vertices;
        let fa = field.value(a);
        let fb = field.value(b);
        // A crossing into an unreachable region lands on the reachable
        // endpoint.
        let t = if fa.is_finite() && fb.is_finite() {
            ((self.level - fa) / (fb - fa)).clamp(0.0, 1.0)
        } else if fa.is_finite() {
            0.0
        } else {
            1.0
        };
        let pa = topology.vertices()[a as usize].point;
        let pb = topology.vertices()[b as usize].point;
        pa + (pb - pa) * t
    }
}

/// A stitched run of segments, stored as the ordered edge indices its
/// crossing points lie on.
struct Chain {
    edges: VecDeque<u32>,
    triangles: Vec<u32>,
    closed: bool,
}

/// Stitches segments into chains by matching their shared crossing
/// edges. Each chain grows forward until it closes or dead-ends, then
/// backward from its other end.
fn stitch(segments: &[Segment]) -> Vec<Chain> {
    let mut by_edge: HashMap<u32, Vec<usize>> = HashMap::new();
    for (i, seg) in segments.iter().enumerate() {
        by_edge.entry(seg.edges[0]).or_default().push(i);
        by_edge.entry(seg.edges[1]).or_default().push(i);
    }

    let mut used = vec![false; segments.len()];
    let mut chains = Vec::new();

    for start in 0..segments.len() {
        if used[start] {
            continue;
        }
        used[start] = true;

        let mut edges: VecDeque<u32> = VecDeque::new();
        edges.push_back(segments[start].edges[0]);
        edges.push_back(segments[start].edges[1]);
        let mut triangles = VecDeque::new();
        triangles.push_back(segments[start].triangle);
        let mut closed = false;

        while let Some(&back) = edges.back() {
            let Some(next) = take_unused(&by_edge, &mut used, back) else {
                break;
            };
            let other = other_edge(segments[next], back);
            triangles.push_back(segments[next].triangle);
            if edges.front() == Some(&other) {
                closed = true;
                break;
            }
            edges.push_back(other);
        }

        if !closed {
            while let Some(&front) = edges.front() {
                let Some(next) = take_unused(&by_edge, &mut used, front) else {
                    break;
                };
                let other = other_edge(segments[next], front);
                triangles.push_front(segments[next].triangle);
                edges.push_front(other);
            }
        }

        chains.push(Chain {
            edges,
            triangles: triangles.into_iter().collect(),
            closed,
        });
    }

    chains
}

/// Claims the first unused segment touching `edge`, if any.
fn take_unused(by_edge: &HashMap<u32, Vec<usize>>, used: &mut [bool], edge: u32) -> Option<usize> {
    for &i in by_edge.get(&edge)? {
        if !used[i] {
            used[i] = true;
            return Some(i);
        }
    }
    None
}

fn other_edge(segment: Segment, edge: u32) -> u32 {
    if segment.edges[0] == edge {
        segment.edges[1]
    } else {
        segment.edges[0]
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;
    use crate::field::GeodesicField;
    use crate::test_meshes::{grid, icosphere};
    use crate::topology::TopologyParams;

    fn icosphere_field() -> (MeshTopology, GeodesicField) {
        let (positions, tris) = icosphere();
        let topo = MeshTopology::build(&positions, &tris, TopologyParams::default()).unwrap();
        let field = GeodesicField::build(&topo, 0).unwrap();
        (topo, field)
    }

    // ── extraction ──

    #[test]
    fn closed_mesh_yields_closed_contours() {
        let (topo, field) = icosphere_field();
        for fraction in [0.25, 0.5, 0.75] {
            let level = field.max_distance() * fraction;
            let contours = ExtractContours::new(level).execute(&topo, &field);
            assert!(!contours.is_empty(), "no contours at fraction {fraction}");
            for contour in &contours {
                assert!(contour.closed, "open contour at fraction {fraction}");
                assert!(contour.points.len() >= 3);
                assert!(!contour.triangles.is_empty());
            }
        }
    }

    #[test]
    fn bounded_mesh_yields_open_contours() {
        let (positions, tris) = grid(4);
        let topo = MeshTopology::build(&positions, &tris, TopologyParams::default()).unwrap();
        let field = GeodesicField::build(&topo, 0).unwrap();

        let contours = ExtractContours::new(1.5).execute(&topo, &field);
        assert!(!contours.is_empty());
        assert!(contours.iter().any(|c| !c.closed));
    }

    #[test]
    fn crossed_triangles_straddle_the_level() {
        let (topo, field) = icosphere_field();
        let level = field.max_distance() * 0.5;
        for contour in ExtractContours::new(level).execute(&topo, &field) {
            for &t in &contour.triangles {
                let tri = &topo.triangles()[t as usize];
                let any_below = tri.vertices.iter().any(|&v| field.is_below(v, level));
                let any_above = tri.vertices.iter().any(|&v| !field.is_below(v, level));
                assert!(any_below && any_above);
            }
        }
    }

    #[test]
    fn level_below_minimum_yields_nothing() {
        let (topo, field) = icosphere_field();
        let contours = ExtractContours::new(-1.0).execute(&topo, &field);
        assert!(contours.is_empty());
    }

    #[test]
    fn through_vertex_restricts_components() {
        let (topo, field) = icosphere_field();
        // Pick a mid-field vertex and extract exactly at its value; only
        // chains touching its star survive the restriction.
        let v = 9;
        let level = field.distance(v);
        let all = ExtractContours::new(level).execute(&topo, &field);
        let local = ExtractContours::new(level)
            .through_vertex(v)
            .execute(&topo, &field);
        assert!(local.len() <= all.len());
        for contour in &local {
            let touches = contour.triangles.iter().any(|&t| {
                topo.triangles()[t as usize].has_vertex(v)
            });
            assert!(touches);
        }
    }

    #[test]
    fn level_through_vertex_terminates_chains_there() {
        let (topo, field) = icosphere_field();
        let v = 9;
        let level = field.distance(v);
        let local = ExtractContours::new(level)
            .through_vertex(v)
            .execute(&topo, &field);
        assert!(!local.is_empty());
        let vertex_point = topo.vertices()[v as usize].point;
        for contour in &local {
            let first = contour.points.first().unwrap();
            let last = contour.points.last().unwrap();
            let touches_vertex = (first - vertex_point).norm() < 1e-9
                || (last - vertex_point).norm() < 1e-9;
            assert!(touches_vertex, "chain does not terminate at the vertex");
        }
    }
}
