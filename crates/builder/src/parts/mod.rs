//! Mesh construction for every part of the table.

pub mod casing;
pub mod cushions;
pub mod liners;
pub mod rails;
pub mod slate;

use serde::{Deserialize, Serialize};
use tracing::info;

use table_kernel::{Mesh, MeshError, Vec3};

use crate::context::{BuildContext, Cushion};
use crate::errors::BuildError;

/// Part groups of the table. Each group is exported as one object file
/// with one material.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Part {
    Cushions,
    Slate,
    Liners,
    Casing,
    Rails,
    RailSights,
}

impl Part {
    /// Build and export order.
    pub const ALL: [Part; 6] = [
        Self::Cushions,
        Self::Slate,
        Self::Liners,
        Self::Casing,
        Self::Rails,
        Self::RailSights,
    ];

    /// Order of the material library.
    pub const MATERIAL_ORDER: [Part; 6] = [
        Self::Cushions,
        Self::Slate,
        Self::Rails,
        Self::RailSights,
        Self::Liners,
        Self::Casing,
    ];

    pub fn name(self) -> &'static str {
        match self {
            Self::Cushions => "cushions",
            Self::Slate => "slate",
            Self::Liners => "liners",
            Self::Casing => "casing",
            Self::Rails => "rails",
            Self::RailSights => "rail_sights",
        }
    }
}

/// Which piece of a part group a mesh is.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum PieceKey {
    Cushion(Cushion),
    Pocket(usize),
    /// The part group is a single mesh.
    Whole,
}

/// One mesh of a part group, e.g. cushion C or the liner of pocket 4.
#[derive(Debug, Clone, PartialEq)]
pub struct PartMesh {
    pub part: Part,
    pub key: PieceKey,
    pub mesh: Mesh,
}

impl PartMesh {
    pub fn new(part: Part, key: PieceKey, mesh: Mesh) -> Self {
        Self { part, key, mesh }
    }

    /// `"C"`, `"4"` or the part name for single-mesh parts.
    pub fn name(&self) -> String {
        match self.key {
            PieceKey::Cushion(cushion) => cushion.name().to_string(),
            PieceKey::Pocket(pocket) => pocket.to_string(),
            PieceKey::Whole => self.part.name().to_string(),
        }
    }
}

/// Mesh from a vertex table and faces given as index loops.
pub(crate) fn indexed_mesh(vertices: &[Vec3], faces: &[Vec<usize>]) -> Result<Mesh, MeshError> {
    Mesh::from_loops(
        faces
            .iter()
            .map(|face| face.iter().map(|&k| vertices[k]).collect::<Vec<_>>()),
    )
}

/// Build every part mesh, grouped in [`Part::ALL`] order.
pub fn build_parts(ctx: &BuildContext) -> Result<Vec<PartMesh>, BuildError> {
    let mut parts = Vec::new();
    for (cushion, mesh) in cushions::build_cushions(ctx)? {
        parts.push(PartMesh::new(Part::Cushions, PieceKey::Cushion(cushion), mesh));
    }
    parts.push(PartMesh::new(Part::Slate, PieceKey::Whole, slate::build_slate(ctx)?));
    for (pocket, mesh) in liners::build_liners(ctx)? {
        parts.push(PartMesh::new(Part::Liners, PieceKey::Pocket(pocket), mesh));
    }
    parts.push(PartMesh::new(Part::Casing, PieceKey::Whole, casing::build_casing(ctx)?));
    for (pocket, mesh) in rails::build_rails(ctx)? {
        parts.push(PartMesh::new(Part::Rails, PieceKey::Pocket(pocket), mesh));
    }
    for (cushion, mesh) in rails::build_rail_sights(ctx)? {
        parts.push(PartMesh::new(Part::RailSights, PieceKey::Cushion(cushion), mesh));
    }
    info!(
        meshes = parts.len(),
        faces = parts.iter().map(|p| p.mesh.len()).sum::<usize>(),
        "table parts built"
    );
    Ok(parts)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::spec::Spec;

    #[test]
    fn test_build_parts_order_and_keys() {
        let ctx = BuildContext::new(&Spec::default()).unwrap();
        let parts = build_parts(&ctx).unwrap();
        assert_eq!(parts.len(), 6 + 1 + 6 + 1 + 6 + 6);
        let keys: Vec<String> = parts.iter().map(|p| format!("{}/{}", p.part.name(), p.name())).collect();
        assert_eq!(keys[0], "cushions/A");
        assert_eq!(keys[6], "slate/slate");
        assert_eq!(keys[7], "liners/1");
        assert_eq!(keys[13], "casing/casing");
        assert_eq!(keys[14], "rails/1");
        assert_eq!(keys[25], "rail_sights/F");
        // Groups are contiguous in export order.
        let mut order: Vec<Part> = parts.iter().map(|p| p.part).collect();
        order.dedup();
        assert_eq!(order, Part::ALL.to_vec());
    }

    #[test]
    fn test_part_names_match_serde() {
        for part in Part::ALL {
            let json = serde_json::to_string(&part).unwrap();
            assert_eq!(json, format!("\"{}\"", part.name()));
        }
    }

    #[test]
    fn test_indexed_mesh_rejects_short_loops() {
        let vertices = [Vec3::ZERO, Vec3::X];
        let err = indexed_mesh(&vertices, &[vec![0, 1]]).unwrap_err();
        assert_eq!(err, MeshError::TooFewPoints(2));
    }
}
