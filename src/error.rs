use thiserror::Error;

/// Top-level error type for the isolis toolkit.
#[derive(Debug, Error)]
pub enum IsolisError {
    #[error(transparent)]
    Topology(#[from] TopologyError),

    #[error(transparent)]
    Field(#[from] FieldError),

    #[error(transparent)]
    Diagram(#[from] DiagramError),
}

/// Errors related to mesh topology construction and queries.
#[derive(Debug, Error)]
pub enum TopologyError {
    #[error("mesh has no vertices or no triangles")]
    EmptyMesh,

    #[error("triangle {triangle} references vertex {index}, but the mesh has {vertex_count} vertices")]
    IndexOutOfRange {
        triangle: usize,
        index: u32,
        vertex_count: usize,
    },

    #[error("flat triangle index list has length {0}, not a multiple of 3")]
    RaggedIndexList(usize),

    #[error("entity not found: {0}")]
    EntityNotFound(String),
}

/// Errors related to scalar-field construction.
#[derive(Debug, Error)]
pub enum FieldError {
    #[error("source vertex {source_vertex} is out of range for a mesh with {vertex_count} vertices")]
    SourceOutOfRange { source_vertex: u32, vertex_count: usize },
}

/// Errors related to level-set diagram construction and queries.
#[derive(Debug, Error)]
pub enum DiagramError {
    #[error("scalar field has no finite values to sweep")]
    EmptyField,

    #[error("entity not found: {0}")]
    EntityNotFound(String),
}

/// Convenience type alias for results using [`IsolisError`].
pub type Result<T, E = IsolisError> = std::result::Result<T, E>;
