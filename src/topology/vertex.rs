use crate::math::{Point3, Vector3};

/// Data associated with a welded mesh vertex.
///
/// Positions and adjacency sets are filled in during topology
/// construction and never change afterwards.
#[derive(Debug, Clone)]
pub struct VertexData {
    /// The 3D position of the vertex.
    pub point: Point3,
    /// Accumulated vertex normal: the safe-normalized sum of the
    /// incident triangle normals (zero for isolated vertices).
    pub normal: Vector3,
    /// Indices of vertices connected to this one by an edge.
    pub neighbors: Vec<u32>,
    /// Indices of edges incident on this vertex.
    pub edges: Vec<u32>,
    /// Indices of triangles incident on this vertex.
    pub triangles: Vec<u32>,
}

impl VertexData {
    pub(crate) fn new(point: Point3) -> Self {
        Self {
            point,
            normal: Vector3::zeros(),
            neighbors: Vec::new(),
            edges: Vec::new(),
            triangles: Vec::new(),
        }
    }
}
