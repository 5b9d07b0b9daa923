//! The generation pipeline: spec to shaded, unwrapped, triangulated parts.

use tracing::{info, instrument};

use table_atlas::PackerConfig;
use table_kernel::normals::DEFAULT_ANGLE_LIMIT;
use table_kernel::{Tolerance, smooth_normals};

use crate::context::BuildContext;
use crate::errors::BuildError;
use crate::export::{mtl_text, obj_text};
use crate::layout::{AtlasLayout, layout_atlas};
use crate::metadata::{TableMetadata, table_metadata};
use crate::parts::{Part, PartMesh, build_parts};
use crate::shading::TableShading;
use crate::spec::Spec;
use crate::unwrap::unwrap_parts;

/// Knobs of a generation run that are not table dimensions.
#[derive(Debug, Clone, Copy)]
pub struct GenerationConfig {
    pub tolerance: Tolerance,
    pub packer: PackerConfig,
    /// Smoothing threshold between neighbouring face normals.
    pub angle_limit: f64,
}

impl Default for GenerationConfig {
    fn default() -> Self {
        Self {
            tolerance: Tolerance::default(),
            packer: PackerConfig::default(),
            angle_limit: DEFAULT_ANGLE_LIMIT,
        }
    }
}

impl GenerationConfig {
    /// Faster atlas search, for previews and tests.
    pub fn preview() -> Self {
        Self {
            packer: PackerConfig::coarse(),
            ..Self::default()
        }
    }
}

/// Everything a run produces.
#[derive(Debug, Clone)]
pub struct TableModel {
    pub spec: Spec,
    /// Triangulated, shaded part meshes in [`Part::ALL`] order.
    pub parts: Vec<PartMesh>,
    pub layout: AtlasLayout,
    pub metadata: TableMetadata,
}

impl TableModel {
    pub fn meshes(&self, part: Part) -> impl Iterator<Item = &PartMesh> {
        self.parts.iter().filter(move |p| p.part == part)
    }

    /// Object file text for one part group.
    pub fn obj(&self, part: Part) -> Result<String, BuildError> {
        obj_text(part, self.meshes(part).map(|p| &p.mesh))
    }

    pub fn mtl(&self) -> String {
        mtl_text()
    }

    pub fn face_count(&self) -> usize {
        self.parts.iter().map(|p| p.mesh.len()).sum()
    }
}

/// Build a table from `spec`.
///
/// Validates the spec, builds every part, smooths normals, unwraps uvs,
/// packs the atlas and triangulates the result.
#[instrument(skip_all)]
pub fn generate(spec: &Spec, config: &GenerationConfig) -> Result<TableModel, BuildError> {
    spec.validate()?;
    let ctx = BuildContext::new(spec)?;
    let tol = config.tolerance.coincidence;

    let mut parts = build_parts(&ctx)?;
    for part in &mut parts {
        let rules = TableShading::new(&ctx, part.part).with_angle_limit(config.angle_limit);
        smooth_normals(&mut part.mesh, &rules, tol);
    }
    let islands = unwrap_parts(&ctx, &mut parts, tol)?;
    let layout = layout_atlas(spec, &mut parts, &islands, &config.packer)?;
    for part in &mut parts {
        part.mesh = part.mesh.triangulate()?;
    }
    let metadata = table_metadata(&ctx)?;

    let model = TableModel {
        spec: spec.clone(),
        parts,
        layout,
        metadata,
    };
    info!(
        meshes = model.parts.len(),
        triangles = model.face_count(),
        atlas_width = model.layout.width,
        atlas_height = model.layout.height,
        "table generated"
    );
    Ok(model)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::spec::SpecError;

    #[test]
    fn test_generate_reference_table() {
        let model = generate(&Spec::default(), &GenerationConfig::preview()).unwrap();
        assert_eq!(model.parts.len(), 26);
        for part in &model.parts {
            assert!(part.mesh.is_triangle_mesh());
            assert!(part.mesh.faces().iter().all(|f| f.is_shaded()), "{}", part.name());
        }
        assert!(model.obj(Part::Cushions).unwrap().starts_with("mtllib pooltable.mtl\n"));
    }

    #[test]
    fn test_invalid_spec_stops_the_run() {
        let spec = Spec {
            slate_thickness: 0.001,
            ..Spec::default()
        };
        let err = generate(&spec, &GenerationConfig::preview()).unwrap_err();
        assert!(matches!(err, BuildError::Spec(SpecError::Infeasible { .. })));
    }
}
