use std::cmp::Ordering;
use std::collections::BinaryHeap;

use slotmap::SlotMap;
use tracing::{debug, trace};

use crate::contour::{Contour, ExtractContours};
use crate::error::{DiagramError, Result};
use crate::field::VertexField;
use crate::topology::{MeshTopology, VertexLink};

use super::{ContourId, ContourNode, LevelSet, LevelSetDiagram};

/// Reference levels closer than this are treated as duplicates and not
/// recorded twice.
const LEVEL_EPSILON: f64 = 1e-3;

/// Frontier entry ordered so the heap pops the smallest `(value, vertex)`
/// pair first, making the sweep order total and deterministic.
#[derive(Debug, Clone, Copy, PartialEq)]
struct SweepEntry {
    value: f64,
    vertex: u32,
}

impl Eq for SweepEntry {}

impl Ord for SweepEntry {
    fn cmp(&self, other: &Self) -> Ordering {
        other
            .value
            .total_cmp(&self.value)
            .then_with(|| other.vertex.cmp(&self.vertex))
    }
}

impl PartialOrd for SweepEntry {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

/// Ascending sweep over the field, growing the contour tree.
pub(super) fn execute<F: VertexField>(
    topology: &MeshTopology,
    field: &F,
) -> Result<LevelSetDiagram> {
    let n = topology.vertex_count();
    let seed = (0..n as u32)
        .filter(|&v| field.value(v).is_finite())
        .min_by(|&a, &b| {
            field
                .value(a)
                .total_cmp(&field.value(b))
                .then_with(|| a.cmp(&b))
        })
        .ok_or(DiagramError::EmptyField)?;

    let mut nodes: SlotMap<ContourId, ContourNode> = SlotMap::with_key();
    let root_level = field.value(seed);
    let root = nodes.insert(ContourNode {
        vertex: seed,
        level: root_level,
        contour: point_contour(topology, seed),
        parent: None,
        children: Vec::new(),
    });

    let mut owner: Vec<Option<ContourId>> = vec![None; n];
    owner[seed as usize] = Some(root);
    let mut processed = vec![false; n];
    let mut queued = vec![false; n];
    queued[seed as usize] = true;

    let mut frontier = BinaryHeap::new();
    frontier.push(SweepEntry {
        value: root_level,
        vertex: seed,
    });

    let mut reference_levels: Vec<f64> = Vec::new();

    while let Some(entry) = frontier.pop() {
        let v = entry.vertex;
        if processed[v as usize] {
            continue;
        }
        processed[v as usize] = true;

        // Propagate the owning contour to neighbors on first sight.
        let inherited = owner[v as usize];
        for &neighbor in &topology.vertices()[v as usize].neighbors {
            let i = neighbor as usize;
            if processed[i] || !field.value(neighbor).is_finite() {
                continue;
            }
            if owner[i].is_none() {
                owner[i] = inherited;
            }
            if !queued[i] {
                queued[i] = true;
                frontier.push(SweepEntry {
                    value: field.value(neighbor),
                    vertex: neighbor,
                });
            }
        }

        // The root was created before the sweep.
        if v == seed {
            continue;
        }

        let link = topology.vertex_link(v)?;
        let index = index_number(&link, field, v);
        let Some(own) = owner[v as usize] else {
            continue;
        };

        if index == 1 {
            // Extremum: the branch terminates in a leaf.
            let leaf = nodes.insert(ContourNode {
                vertex: v,
                level: entry.value,
                contour: point_contour(topology, v),
                parent: Some(own),
                children: Vec::new(),
            });
            nodes[own].children.push(leaf);
            owner[v as usize] = Some(leaf);
            record_level(&mut reference_levels, entry.value);
            trace!(vertex = v, level = entry.value, "extremum");
        } else if index < 0 {
            // Saddle: the level set splits into lobes, one branch each.
            // Vertices beyond the saddle are re-owned by the branch whose
            // lobe crosses their triangles, so the sweep routes them
            // correctly afterwards.
            let lobes = ExtractContours::new(entry.value)
                .through_vertex(v)
                .execute(topology, field);
            record_level(&mut reference_levels, entry.value);
            trace!(
                vertex = v,
                level = entry.value,
                branches = lobes.len(),
                "saddle"
            );
            for lobe in lobes {
                let lobe_triangles = lobe.triangles.clone();
                let branch = nodes.insert(ContourNode {
                    vertex: v,
                    level: entry.value,
                    contour: lobe,
                    parent: Some(own),
                    children: Vec::new(),
                });
                nodes[own].children.push(branch);
                for &t in &lobe_triangles {
                    for &tv in &topology.triangles()[t as usize].vertices {
                        if field.value(tv) > entry.value {
                            owner[tv as usize] = Some(branch);
                        }
                    }
                }
            }
        }
    }

    let max_level = field.max_value();
    let level_sets = reference_levels
        .iter()
        .map(|&level| LevelSet {
            level,
            contours: ExtractContours::new(level).execute(topology, field),
        })
        .collect();

    debug!(
        nodes = nodes.len(),
        reference_levels = reference_levels.len(),
        "level-set diagram built"
    );

    Ok(LevelSetDiagram {
        nodes,
        root,
        reference_levels,
        level_sets,
        max_level,
    })
}

/// Critical-point index of `v`: `1 - sign_changes / 2`, where the sign
/// changes are counted between consecutive 1-ring neighbors (with
/// wraparound only for closed rings). Regular vertices score 0, extrema
/// 1, saddles are negative. Odd counts from boundary or non-manifold
/// fans truncate.
pub(super) fn index_number<F: VertexField>(link: &VertexLink, field: &F, v: u32) -> i32 {
    let ring = &link.vertices;
    if ring.len() < 2 {
        return 1;
    }
    let below: Vec<bool> = ring.iter().map(|&r| field.is_less(r, v)).collect();
    let mut changes = 0i32;
    for pair in below.windows(2) {
        if pair[0] != pair[1] {
            changes += 1;
        }
    }
    if link.closed && below[below.len() - 1] != below[0] {
        changes += 1;
    }
    1 - changes / 2
}

fn point_contour(topology: &MeshTopology, vertex: u32) -> Contour {
    Contour {
        points: vec![topology.vertices()[vertex as usize].point],
        closed: false,
        triangles: Vec::new(),
    }
}

fn record_level(levels: &mut Vec<f64>, level: f64) {
    let is_new = levels
        .last()
        .is_none_or(|&last| (level - last).abs() > LEVEL_EPSILON);
    if is_new {
        levels.push(level);
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;
    use crate::field::GeodesicField;
    use crate::test_meshes::{icosphere, torus};
    use crate::topology::TopologyParams;

    fn index_sum(positions: &[crate::math::Point3], tris: &[[u32; 3]]) -> i32 {
        let topo = MeshTopology::build(positions, tris, TopologyParams::default()).unwrap();
        let field = GeodesicField::build(&topo, 0).unwrap();
        (0..topo.vertex_count() as u32)
            .map(|v| {
                let link = topo.vertex_link(v).unwrap();
                index_number(&link, &field, v)
            })
            .sum()
    }

    // ── index classification ──

    #[test]
    fn index_sum_matches_sphere_euler_characteristic() {
        let (positions, tris) = icosphere();
        assert_eq!(index_sum(&positions, &tris), 2);
    }

    #[test]
    fn index_sum_matches_torus_euler_characteristic() {
        let (positions, tris) = torus(2.0, 0.75, 24, 12);
        assert_eq!(index_sum(&positions, &tris), 0);
    }

    #[test]
    fn source_is_an_extremum() {
        let (positions, tris) = icosphere();
        let topo = MeshTopology::build(&positions, &tris, TopologyParams::default()).unwrap();
        let field = GeodesicField::build(&topo, 0).unwrap();
        let link = topo.vertex_link(0).unwrap();
        assert_eq!(index_number(&link, &field, 0), 1);
    }

    #[test]
    fn torus_has_a_saddle_vertex() {
        let (positions, tris) = torus(2.0, 0.75, 24, 12);
        let topo = MeshTopology::build(&positions, &tris, TopologyParams::default()).unwrap();
        let field = GeodesicField::build(&topo, 0).unwrap();
        let has_saddle = (0..topo.vertex_count() as u32).any(|v| {
            let link = topo.vertex_link(v).unwrap();
            index_number(&link, &field, v) < 0
        });
        assert!(has_saddle);
    }

    // ── reference level recording ──

    #[test]
    fn near_duplicate_levels_are_suppressed() {
        let mut levels = Vec::new();
        record_level(&mut levels, 1.0);
        record_level(&mut levels, 1.0005);
        record_level(&mut levels, 1.01);
        assert_eq!(levels, vec![1.0, 1.01]);
    }
}
