//! Rail tops and the rail sight plates.
//!
//! Each rail top is two flat polygons, one on either side of a pocket,
//! running from the sight plate along the cushion back, around the pocket
//! liner and out to the bevelled casing edge. All polygons are built near
//! pocket 2 or 3 and reflected into place.

use tracing::{debug, instrument};

use table_kernel::geometry::plane::reflect_through;
use table_kernel::{Mesh, Plane, Vec3};

use super::casing::casing_circuit;
use super::liners::liner_arc;
use crate::context::{BuildContext, Cushion, POCKETS};
use crate::errors::BuildError;
use crate::spec::SpecError;

const SIGHTS_BLOCK: &str = "TABLE_RAIL_SIGHTS_BLOCK";

/// Inner and outer edges of the long rail, `y0` and `y1`.
fn rail_band(ctx: &BuildContext) -> (f64, f64) {
    let spec = &ctx.spec;
    let quarter = spec.table_length / 4.0;
    (
        quarter + spec.cushion_width,
        quarter + spec.rail_width - spec.casing_bevel_radius,
    )
}

/// Rail top polygon on cushion B next to corner pocket 3.
fn corner_section(ctx: &BuildContext) -> Result<Vec<Vec3>, BuildError> {
    let spec = &ctx.spec;
    let h0 = spec.rail_height();
    let (y0, y1) = rail_band(ctx);
    let n = spec.casing_num_points.0;
    let m = spec.pocket_liner_num_points;
    let x = spec.table_length / 2.0 - spec.rail_sights_block.1;

    let circuit = casing_circuit(ctx, -spec.casing_bevel_radius, 0.0, h0);
    let liner = liner_arc(ctx, 3, spec.pocket_liner_width, h0)?;
    if x >= circuit[2 * n].x || x >= liner[2 * m].x {
        return Err(SpecError::infeasible(SIGHTS_BLOCK, "second value is too small to clear the corner pocket").into());
    }

    let mut points: Vec<Vec3> = circuit[n..=2 * n].to_vec();
    points.push(Vec3::new(x, y1, h0));
    points.push(Vec3::new(x, y0, h0));
    points.extend((0..=m).map(|k| liner[2 * m - k]));
    Ok(points)
}

/// Rail top polygon on cushion B next to side pocket 2.
fn side_section(ctx: &BuildContext) -> Result<Vec<Vec3>, BuildError> {
    let spec = &ctx.spec;
    let h0 = spec.rail_height();
    let (y0, y1) = rail_band(ctx);
    let m = spec.pocket_liner_num_points;
    let x = spec.rail_sights_block.0;

    let liner = liner_arc(ctx, 2, spec.pocket_liner_width, h0)?;
    if x <= liner[0].x {
        return Err(SpecError::infeasible(SIGHTS_BLOCK, "first value is too small to clear the side pocket").into());
    }

    let mut points = vec![Vec3::new(x, y1, h0), Vec3::new(0.0, y1, h0)];
    points.extend((0..=m).map(|k| liner[m - k]));
    points.push(Vec3::new(x, y0, h0));
    Ok(points)
}

/// The rail top polygon on `cushion` next to `pocket`.
fn rail_section(
    ctx: &BuildContext,
    cushion: Cushion,
    pocket: usize,
    side: &[Vec3],
    corner: &[Vec3],
) -> Vec<Vec3> {
    let (yz, xz) = (Plane::yz(), Plane::xz());
    let (base, planes): (&[Vec3], Vec<Plane>) = match (cushion, pocket) {
        (Cushion::A, 1) => (corner, vec![yz]),
        (Cushion::A, _) => (side, vec![yz]),
        (Cushion::B, 2) => (side, vec![]),
        (Cushion::B, _) => (corner, vec![]),
        (Cushion::C, 3) => (corner, vec![*ctx.bisector(3)]),
        (Cushion::C, _) => (corner, vec![xz, *ctx.bisector(4)]),
        (Cushion::D, 4) => (corner, vec![xz]),
        (Cushion::D, _) => (side, vec![xz]),
        (Cushion::E, 5) => (side, vec![yz, xz]),
        (Cushion::E, _) => (corner, vec![yz, xz]),
        (Cushion::F, 6) => (corner, vec![yz, xz, *ctx.bisector(6)]),
        (Cushion::F, _) => (corner, vec![yz, *ctx.bisector(1)]),
    };
    reflect_through(&planes, base)
}

/// Rail top around each pocket, keyed by pocket number. Each is the union
/// of the two polygons on the cushions meeting at that pocket.
#[instrument(skip(ctx))]
pub fn build_rails(ctx: &BuildContext) -> Result<Vec<(usize, Mesh)>, BuildError> {
    let side = side_section(ctx)?;
    let corner = corner_section(ctx)?;

    let mut rails = Vec::with_capacity(POCKETS.len());
    for pocket in POCKETS {
        // Cushion ending at this pocket, then the one starting there.
        let before = Cushion::ALL[(pocket + 4) % 6];
        let after = Cushion::ALL[(pocket - 1) % 6];
        let loops = [before, after].map(|cushion| rail_section(ctx, cushion, pocket, &side, &corner));
        let mesh = Mesh::from_loops(loops)?;
        debug!(pocket, "rail top built");
        rails.push((pocket, mesh));
    }
    Ok(rails)
}

/// Flat rectangular plates carrying the sights, one per cushion.
#[instrument(skip(ctx))]
pub fn build_rail_sights(ctx: &BuildContext) -> Result<Vec<(Cushion, Mesh)>, BuildError> {
    let spec = &ctx.spec;
    let h0 = spec.rail_height();
    let (y0, y1) = rail_band(ctx);
    let w = spec.table_length / 2.0;
    let (o0, o1) = spec.rail_sights_block;
    let x0 = w + spec.cushion_width;
    let x1 = w + spec.rail_width - spec.casing_bevel_radius;

    let long = vec![
        Vec3::new(o0, y0, h0),
        Vec3::new(w - o1, y0, h0),
        Vec3::new(w - o1, y1, h0),
        Vec3::new(o0, y1, h0),
    ];
    let short = vec![
        Vec3::new(x0, -w / 2.0 + o1, h0),
        Vec3::new(x1, -w / 2.0 + o1, h0),
        Vec3::new(x1, w / 2.0 - o1, h0),
        Vec3::new(x0, w / 2.0 - o1, h0),
    ];
    let (yz, xz) = (Plane::yz(), Plane::xz());

    Cushion::ALL
        .into_iter()
        .map(|cushion| {
            let plate = match cushion {
                Cushion::A => yz.reflect_reversed(&long),
                Cushion::B => long.clone(),
                Cushion::C => short.clone(),
                Cushion::D => xz.reflect_reversed(&long),
                Cushion::E => reflect_through(&[xz, yz], &long),
                Cushion::F => yz.reflect_reversed(&short),
            };
            Ok((cushion, Mesh::from_loops([plate])?))
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::spec::Spec;
    use table_kernel::mesh::audit::{FindingCode, Severity, audit};

    fn context() -> BuildContext {
        BuildContext::new(&Spec::default()).unwrap()
    }

    #[test]
    fn test_rails_are_flat_and_face_up() {
        let ctx = context();
        let h0 = ctx.spec.rail_height();
        for (pocket, mesh) in build_rails(&ctx).unwrap() {
            assert_eq!(mesh.len(), 2, "pocket {pocket}");
            for face in mesh.faces() {
                assert!(face.lies_in(&Plane::horizontal(h0), 1e-12));
                assert!((face.normal().z - 1.0).abs() < 1e-9, "pocket {pocket}");
            }
        }
    }

    #[test]
    fn test_rail_halves_meet_at_the_pocket() {
        let ctx = context();
        for (pocket, mesh) in build_rails(&ctx).unwrap() {
            // The two halves share the edge on the pocket's mirror line.
            let report = audit(&mesh, 1e-9, Severity::Warning);
            assert_eq!(report.count(FindingCode::NonManifoldEdge), 0, "pocket {pocket}");
            let topo = mesh.topology(1e-9);
            assert!(!topo.shared_vertices(0, 1).is_empty(), "pocket {pocket}");
        }
    }

    #[test]
    fn test_sight_plates_sit_between_rails() {
        let ctx = context();
        let plates = build_rail_sights(&ctx).unwrap();
        let rails = build_rails(&ctx).unwrap();
        let b = &plates[1].1;
        let rail3 = &rails[2].1;
        // Plate B touches the rail top around pocket 3 along its right edge.
        let merged = Mesh::merge([b.clone(), rail3.clone()]);
        let topo = merged.topology(1e-9);
        assert_eq!(topo.shared_vertices(0, 1).len(), 2);
        for (_, plate) in &plates {
            assert!((plate.faces()[0].normal().z - 1.0).abs() < 1e-9);
        }
    }

    #[test]
    fn test_small_sights_block_is_rejected() {
        let spec = Spec {
            rail_sights_block: (0.01, 0.3 * 100.0 * crate::spec::INCH / 8.0),
            ..Spec::default()
        };
        let ctx = BuildContext::new(&spec).unwrap();
        let err = build_rails(&ctx).unwrap_err();
        assert!(matches!(err, BuildError::Spec(SpecError::Infeasible { ref constant, .. }) if constant == SIGHTS_BLOCK));
    }
}
