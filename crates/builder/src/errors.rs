use table_atlas::PackError;
use table_kernel::uv::UvError;
use table_kernel::{GeometryError, MeshError};

use crate::spec::SpecError;

/// Errors raised while generating a table.
#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum BuildError {
    #[error(transparent)]
    Spec(#[from] SpecError),

    #[error(transparent)]
    Geometry(#[from] GeometryError),

    #[error(transparent)]
    Mesh(#[from] MeshError),

    #[error("uv unwrap failed: {0}")]
    Uv(#[from] UvError),

    #[error("atlas packing failed: {0}")]
    Pack(#[from] PackError),

    #[error("{part}: face {face} corner {corner} has no {attribute}")]
    MissingAttribute {
        part: String,
        face: usize,
        corner: usize,
        attribute: &'static str,
    },

    #[error("found {found} slate corners where the pocket fall circles cut the rail box, expected 12")]
    PocketCorners { found: usize },
}
