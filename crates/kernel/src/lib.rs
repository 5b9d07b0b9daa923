pub mod geometry;
pub mod mesh;
pub mod normals;
pub mod uv;

// Re-export the types every builder touches.
pub use geometry::GeometryError;
pub use geometry::plane::Plane;
pub use geometry::vector::{Vec2, Vec3};
pub use mesh::{Face, Mesh, MeshError};
pub use normals::{NormalRules, SmoothAll, smooth_normals};

/// Tolerances for geometric comparisons.
#[derive(Debug, Clone, Copy)]
pub struct Tolerance {
    /// Points closer than this are considered coincident (meters).
    pub coincidence: f64,
    /// Determinants smaller than this mark a plane triple as dependent.
    pub determinant: f64,
}

impl Tolerance {
    pub const DEFAULT: Self = Self {
        coincidence: 1e-9,
        determinant: 1e-12,
    };
}

impl Default for Tolerance {
    fn default() -> Self {
        Self::DEFAULT
    }
}
