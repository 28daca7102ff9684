mod build;

use slotmap::SlotMap;

use crate::contour::Contour;
use crate::error::{DiagramError, Result};
use crate::field::VertexField;
use crate::topology::MeshTopology;

slotmap::new_key_type! {
    /// Unique identifier for a node in the contour tree.
    pub struct ContourId;
}

/// A contour-tree node: one branch segment born at a critical vertex.
///
/// Nodes are arena-allocated; parent and child links are plain keys, so
/// the tree carries no reference cycles.
#[derive(Debug, Clone)]
pub struct ContourNode {
    /// The critical vertex this node was born at.
    pub vertex: u32,
    /// The field level at that vertex.
    pub level: f64,
    /// The node's polyline: one lobe of the critical level set for
    /// saddle branches, a single point for the root and leaves.
    pub contour: Contour,
    /// The owning parent node; `None` for the root.
    pub parent: Option<ContourId>,
    /// Child branches, appended in sweep order.
    pub children: Vec<ContourId>,
}

/// A cached full-mesh level set at one reference level.
#[derive(Debug, Clone)]
pub struct LevelSet {
    /// The threshold the contours were extracted at.
    pub level: f64,
    /// All contour components at that threshold.
    pub contours: Vec<Contour>,
}

/// Contour tree of a scalar field over a mesh.
///
/// Built by sweeping the vertices in ascending field order, classifying
/// each as regular, extremum or saddle from the sign changes of the
/// field over its cyclically ordered 1-ring, and growing one branch per
/// lobe whenever the level set splits at a saddle. Alongside the tree,
/// the sweep records the critical levels it crossed and caches the
/// full-mesh contours at each of them.
#[derive(Debug, Clone)]
pub struct LevelSetDiagram {
    nodes: SlotMap<ContourId, ContourNode>,
    root: ContourId,
    reference_levels: Vec<f64>,
    level_sets: Vec<LevelSet>,
    max_level: f64,
}

impl LevelSetDiagram {
    /// Builds the contour tree of `field` over `topology`.
    ///
    /// # Errors
    ///
    /// Returns an error if the field has no finite values to sweep.
    pub fn build<F: VertexField>(topology: &MeshTopology, field: &F) -> Result<Self> {
        build::execute(topology, field)
    }

    /// The root node, born at the field's global minimum vertex.
    #[must_use]
    pub fn root(&self) -> ContourId {
        self.root
    }

    /// Returns a reference to a node, or an error if not found.
    ///
    /// # Errors
    ///
    /// Returns an error if the id does not belong to this diagram.
    pub fn node(&self, id: ContourId) -> Result<&ContourNode, DiagramError> {
        self.nodes
            .get(id)
            .ok_or_else(|| DiagramError::EntityNotFound("contour node".into()))
    }

    /// Iterates over all nodes with their ids.
    pub fn nodes(&self) -> impl Iterator<Item = (ContourId, &ContourNode)> {
        self.nodes.iter()
    }

    /// Iterates over the leaves (nodes with no children).
    pub fn leaves(&self) -> impl Iterator<Item = (ContourId, &ContourNode)> {
        self.nodes.iter().filter(|(_, node)| node.children.is_empty())
    }

    /// Number of nodes in the tree.
    #[must_use]
    pub fn len(&self) -> usize {
        self.nodes.len()
    }

    /// Whether the tree has no nodes (never true for a built diagram).
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.nodes.is_empty()
    }

    /// The critical levels crossed by the sweep, ascending, with
    /// near-duplicates suppressed.
    #[must_use]
    pub fn reference_levels(&self) -> &[f64] {
        &self.reference_levels
    }

    /// The cached full-mesh level sets, one per reference level.
    #[must_use]
    pub fn level_sets(&self) -> &[LevelSet] {
        &self.level_sets
    }

    /// The largest finite field value the diagram was built over.
    #[must_use]
    pub fn max_level(&self) -> f64 {
        self.max_level
    }

    /// The cached level set nearest to a normalized sweep position:
    /// `normalized` in `[0, 1]` maps to `normalized * max_level`.
    #[must_use]
    pub fn level_set_at(&self, normalized: f64) -> Option<&LevelSet> {
        let target = normalized.clamp(0.0, 1.0) * self.max_level;
        self.level_sets.iter().min_by(|a, b| {
            (a.level - target)
                .abs()
                .total_cmp(&(b.level - target).abs())
        })
    }
}
