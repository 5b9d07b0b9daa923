//! Pocket liners: the lining between the rail top and the bottom of the
//! slate around each pocket opening.

use std::f64::consts::{FRAC_PI_2, FRAC_PI_4};

use tracing::{debug, instrument};

use table_kernel::geometry::plane::reflect_through;
use table_kernel::{GeometryError, Mesh, Plane, Vec3};

use super::indexed_mesh;
use crate::context::{BuildContext, Cushion};
use crate::errors::BuildError;
use crate::spec::PocketKind;

/// Inner edge of a pocket liner at `height`, pushed outward by `bulge`.
///
/// At the rail top the liner leaves the cushion end plane at the rail back,
/// runs along the end plane to its closest point to the liner circle, and
/// follows the circle to the pocket bisector; the other half is the mirror
/// image through the bisector. The result has `2 * N + 1` points. Pockets
/// are built as pocket 2 or 3 and reflected into place.
pub fn liner_arc(
    ctx: &BuildContext,
    pocket: usize,
    bulge: f64,
    height: f64,
) -> Result<Vec<Vec3>, GeometryError> {
    let kind = PocketKind::of(pocket);
    let (base, cushion, mid_angle) = match kind {
        PocketKind::Side => (2, Cushion::B, FRAC_PI_2),
        PocketKind::Corner => (3, Cushion::C, FRAC_PI_4),
    };
    let placement: Vec<Plane> = match pocket {
        1 => vec![Plane::yz(), *ctx.bisector(1)],
        4 => vec![Plane::xz(), *ctx.bisector(4)],
        5 => vec![Plane::xz(), *ctx.bisector(5)],
        6 => vec![Plane::yz(), Plane::xz()],
        _ => Vec::new(),
    };

    let spec = &ctx.spec;
    let n = spec.pocket_liner_num_points;
    let center = ctx.liner_center(base).with_z(height);
    let planes = ctx.cushion(cushion);

    // The end plane leans by the vertical cut angle; shifting it by
    // `bulge * cos` moves its trace at any height by `bulge`.
    let end = planes.end1.translated(-bulge * spec.pocket(kind).vertical_angle.cos());
    let level = Plane::horizontal(height);
    let start = Plane::intersection(&end, &level, &planes.rail_back)?;
    let ahead = Plane::intersection(&end, &level, &planes.rail_back.translated(1.0))?;
    let direction = (ahead - start).normalized().ok_or(GeometryError::DegenerateNormal)?;

    let closest = start - direction * (start - center).dot(&direction);
    let angle = (closest.y - center.y).atan2(closest.x - center.x);
    let radius = (closest - center).length();

    let mut arc = Vec::with_capacity(2 * n + 1);
    arc.push(start);
    for k in 0..n {
        let t = k as f64 / (n - 1) as f64;
        let a = angle + t * (mid_angle - angle);
        arc.push(center + Vec3::new(radius * a.cos(), radius * a.sin(), 0.0));
    }
    let bisector = ctx.bisector(base);
    let mirrored: Vec<Vec3> = arc.iter().rev().skip(1).map(|p| bisector.reflect(p)).collect();
    arc.extend(mirrored);

    Ok(reflect_through(&placement, &arc))
}

/// Liner of one pocket: a horizontal band on the rail top, a wall down to
/// the bottom of the slate and two small triangles closing the gap at the
/// slate's rounded edge.
#[instrument(skip(ctx))]
pub fn build_liner(ctx: &BuildContext, pocket: usize) -> Result<Mesh, BuildError> {
    let spec = &ctx.spec;
    let h0 = spec.rail_height();
    let arcs = [
        liner_arc(ctx, pocket, spec.pocket_liner_width, h0)?,
        liner_arc(ctx, pocket, 0.0, h0)?,
        liner_arc(ctx, pocket, 0.0, -spec.slate_thickness)?,
    ];
    let n = arcs[0].len();
    let mut vertices: Vec<Vec3> = arcs.concat();

    let mut faces = Vec::with_capacity(2 * (n - 1) + 2);
    for k in 0..n - 1 {
        faces.push(vec![k, k + 1, n + k + 1, n + k]);
        faces.push(vec![n + k, n + k + 1, 2 * n + k + 1, 2 * n + k]);
    }

    let bed = liner_arc(ctx, pocket, 0.0, 0.0)?;
    let x = spec.slate_drop_point_radius;
    let first = (bed[1] - bed[0]).normalized().ok_or(GeometryError::DegenerateNormal)?;
    let last = (bed[n - 2] - bed[n - 1]).normalized().ok_or(GeometryError::DegenerateNormal)?;
    vertices.extend([bed[0], bed[0] - first * x, bed[n - 1], bed[n - 1] - last * x]);
    faces.push(vec![3 * n, 2 * n, 3 * n + 1]);
    faces.push(vec![3 * n + 2, 3 * n + 3, 3 * n - 1]);

    let mesh = indexed_mesh(&vertices, &faces)?;
    debug!(pocket, faces = mesh.len(), "liner built");
    Ok(mesh)
}

pub fn build_liners(ctx: &BuildContext) -> Result<Vec<(usize, Mesh)>, BuildError> {
    crate::context::POCKETS
        .into_iter()
        .map(|pocket| Ok((pocket, build_liner(ctx, pocket)?)))
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::spec::Spec;
    use approx::assert_abs_diff_eq;

    fn context() -> BuildContext {
        BuildContext::new(&Spec::default()).unwrap()
    }

    #[test]
    fn test_arc_is_symmetric_about_bisector() {
        let ctx = context();
        let n = ctx.spec.pocket_liner_num_points;
        for pocket in [2, 3] {
            let arc = liner_arc(&ctx, pocket, 0.0, ctx.spec.rail_height()).unwrap();
            assert_eq!(arc.len(), 2 * n + 1);
            let bisector = ctx.bisector(pocket);
            for k in 0..arc.len() {
                let mirror = bisector.reflect(&arc[arc.len() - 1 - k]);
                assert_abs_diff_eq!(arc[k], mirror, epsilon = 1e-12);
            }
        }
    }

    #[test]
    fn test_arc_starts_on_rail_back() {
        let ctx = context();
        let arc = liner_arc(&ctx, 3, 0.0, ctx.spec.rail_height()).unwrap();
        let planes = ctx.cushion(Cushion::C);
        assert!(planes.rail_back.contains(&arc[0], 1e-12));
        assert!(planes.end1.contains(&arc[0], 1e-12));
    }

    #[test]
    fn test_bulge_widens_arc() {
        let ctx = context();
        let h0 = ctx.spec.rail_height();
        let inner = liner_arc(&ctx, 2, 0.0, h0).unwrap();
        let outer = liner_arc(&ctx, 2, ctx.spec.pocket_liner_width, h0).unwrap();
        let center = ctx.liner_center(2).with_z(h0);
        let mid = ctx.spec.pocket_liner_num_points;
        // Middle of the arc sits on the bisector; the bulged arc is farther out.
        assert!(outer[mid].distance_to(&center) > inner[mid].distance_to(&center));
    }

    #[test]
    fn test_reflected_pockets_mirror_base_pockets() {
        let ctx = context();
        let h0 = ctx.spec.rail_height();
        let three = liner_arc(&ctx, 3, 0.0, h0).unwrap();
        let six = liner_arc(&ctx, 6, 0.0, h0).unwrap();
        // Pocket 6 is pocket 3 rotated by half a turn.
        for (p, q) in three.iter().zip(&six) {
            assert_abs_diff_eq!(Vec3::new(-p.x, -p.y, p.z), *q, epsilon = 1e-12);
        }
        let two = liner_arc(&ctx, 2, 0.0, h0).unwrap();
        let five = liner_arc(&ctx, 5, 0.0, h0).unwrap();
        for p in &five {
            assert!(p.y < 0.0);
        }
        assert_eq!(two.len(), five.len());
    }

    #[test]
    fn test_liner_face_count() {
        let ctx = context();
        for (pocket, mesh) in build_liners(&ctx).unwrap() {
            let n = 2 * ctx.spec.pocket_liner_num_points + 1;
            assert_eq!(mesh.len(), 2 * (n - 1) + 2, "pocket {pocket}");
        }
    }
}
