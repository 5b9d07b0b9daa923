pub mod plane;
pub mod polygon;
pub mod segment;
pub mod similarity;
pub mod triangle;
pub mod vector;

use thiserror::Error;

/// Failures raised by the plane and polygon algebra.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum GeometryError {
    #[error("plane normal has zero length")]
    DegenerateNormal,
    #[error("plane normals are linearly dependent (det = {determinant:e})")]
    DegenerateIntersection { determinant: f64 },
    #[error("polygon is not simple: edges {first} and {second} touch or cross")]
    NonSimplePolygon { first: usize, second: usize },
    #[error("triangulation stalled with {remaining} vertices left and no usable ear")]
    TriangulationStall { remaining: usize },
    #[error("polygon needs at least 3 points, got {0}")]
    TooFewPoints(usize),
    #[error("similarity transform needs two distinct source points")]
    DegenerateCorrespondence,
}
