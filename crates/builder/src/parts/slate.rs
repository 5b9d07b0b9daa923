//! The slate: the bed cut to the rail box, with the pocket fall circles
//! removed and the pocket edges rounded by the drop point radius.

use std::f64::consts::{FRAC_PI_2, FRAC_PI_4};

use tracing::{debug, instrument};

use table_kernel::{Mesh, Vec3};

use super::indexed_mesh;
use crate::context::BuildContext;
use crate::errors::BuildError;

fn flip_x(p: &Vec3) -> Vec3 {
    Vec3::new(-p.x, p.y, p.z)
}

fn flip_y(p: &Vec3) -> Vec3 {
    Vec3::new(p.x, -p.y, p.z)
}

/// `n` points on the circle around `center` at angles
/// `mid + t * span`, `t` running over `[-0.5, 0.5]`.
fn arc(center: Vec3, radius: f64, span: f64, mid: f64, n: usize) -> Vec<Vec3> {
    (0..n)
        .map(|k| {
            let t = -0.5 + k as f64 / (n - 1) as f64;
            let a = mid + t * span;
            center + Vec3::new(radius * a.cos(), radius * a.sin(), 0.0)
        })
        .collect()
}

/// Outline of the slate with the pocket circles shrunk by `bulge`.
///
/// Pockets are visited in the order 2, 3, 4, 5, 6, 1, giving `6 * n`
/// points clockwise seen from above. Points lie in `z = 0`.
pub fn slate_outline(ctx: &BuildContext, n: usize, bulge: f64) -> Vec<Vec3> {
    let spec = &ctx.spec;
    let rail = ctx.rail_box();
    let (center2, center3) = (ctx.fall_center(2), ctx.fall_center(3));
    let r2 = spec.side_pocket.radius - bulge;
    let r3 = spec.corner_pocket.radius - bulge;

    // Each arc ends where its circle crosses the rail box.
    let span2 = 2.0 * ((center2.y - rail.y) / r2).clamp(-1.0, 1.0).acos();
    let alpha = ((rail.x - center3.x) / r3).clamp(-1.0, 1.0).acos();
    let span3 = 2.0 * (3.0 * FRAC_PI_4 - alpha);

    let side = arc(center2, r2, span2, -FRAC_PI_2, n);
    let corner = arc(center3, r3, span3, -3.0 * FRAC_PI_4, n);

    let mut points = Vec::with_capacity(6 * n);
    points.extend(side.iter().copied());
    points.extend(corner.iter().copied());
    points.extend(corner.iter().rev().map(flip_y));
    points.extend(side.iter().rev().map(flip_y));
    points.extend(corner.iter().map(|p| flip_x(&flip_y(p))));
    points.extend(corner.iter().rev().map(flip_x));
    points
}

/// Closed triangle mesh of the slate.
///
/// Slice `k` of `S` shrinks the pocket circles by `r * sin(π/2 * k/(S-1))`
/// and sits at `z = -r + r * cos(π/2 * k/(S-1))` on top, mirrored at the
/// bottom. The top and bottom are fans around the centre axis.
#[instrument(skip(ctx))]
pub fn build_slate(ctx: &BuildContext) -> Result<Mesh, BuildError> {
    let spec = &ctx.spec;
    let (slices, arc_points) = spec.slate_num_points;
    let r = spec.slate_drop_point_radius;
    let thickness = spec.slate_thickness;
    let m = 6 * arc_points;
    let rings = 2 * slices;

    let mut vertices = vec![Vec3::ZERO; rings * m + 2];
    for ks in 0..slices {
        let t = FRAC_PI_2 * ks as f64 / (slices - 1) as f64;
        let outline = slate_outline(ctx, arc_points, r * t.sin());
        let top_z = -r + r * t.cos();
        let bottom_z = -thickness + r - r * t.cos();
        for (ka, p) in outline.iter().enumerate() {
            vertices[ks * m + ka] = p.with_z(top_z);
            vertices[(rings - 1 - ks) * m + ka] = p.with_z(bottom_z);
        }
    }
    let top_center = rings * m;
    let bottom_center = rings * m + 1;
    vertices[bottom_center] = Vec3::new(0.0, 0.0, -thickness);

    let mut faces = Vec::with_capacity(2 * (rings - 1) * m + 2 * m);
    // The side bands are not planar, so they are split into triangles.
    for ks in 0..rings - 1 {
        for ka in 0..m {
            let next = (ka + 1) % m;
            let quad = [ks * m + ka, ks * m + next, (ks + 1) * m + next, (ks + 1) * m + ka];
            faces.push(vec![quad[0], quad[1], quad[2]]);
            faces.push(vec![quad[0], quad[2], quad[3]]);
        }
    }
    for ka in 0..m {
        faces.push(vec![top_center, (ka + 1) % m, ka]);
    }
    let bottom = (rings - 1) * m;
    for ka in 0..m {
        faces.push(vec![bottom_center, bottom + ka, bottom + (ka + 1) % m]);
    }

    let mesh = indexed_mesh(&vertices, &faces)?;
    debug!(vertices = vertices.len(), faces = mesh.len(), "slate built");
    Ok(mesh)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::spec::Spec;
    use table_kernel::mesh::audit::{Severity, audit};

    fn context() -> BuildContext {
        BuildContext::new(&Spec::default()).unwrap()
    }

    #[test]
    fn test_outline_meets_rail_box() {
        let ctx = context();
        let rail = ctx.rail_box();
        let n = 10;
        let outline = slate_outline(&ctx, n, 0.0);
        assert_eq!(outline.len(), 6 * n);
        // Side arc ends and the first corner arc start lie on the long rail.
        assert!((outline[n - 1].y - rail.y).abs() < 1e-12);
        assert!((outline[n].y - rail.y).abs() < 1e-12);
        // The corner arc ends on the short rail.
        assert!((outline[2 * n - 1].x - rail.x).abs() < 1e-12);
        for p in &outline {
            assert!(p.x.abs() <= rail.x + 1e-12 && p.y.abs() <= rail.y + 1e-12);
        }
    }

    #[test]
    fn test_slate_is_closed() {
        let ctx = context();
        let mesh = build_slate(&ctx).unwrap();
        assert!(mesh.is_triangle_mesh());
        let (slices, points) = ctx.spec.slate_num_points;
        let m = 6 * points;
        assert_eq!(mesh.len(), 2 * (2 * slices - 1) * m + 2 * m);
        let report = audit(&mesh, 1e-9, Severity::Error);
        assert!(report.is_watertight(), "{report}");
        assert_eq!(report.euler_characteristic, 2);
    }

    #[test]
    fn test_slate_spans_thickness() {
        let ctx = context();
        let mesh = build_slate(&ctx).unwrap();
        let topo = mesh.topology(1e-9);
        let zs: Vec<f64> = topo.vertices().iter().map(|p| p.z).collect();
        let top = zs.iter().cloned().fold(f64::MIN, f64::max);
        let bottom = zs.iter().cloned().fold(f64::MAX, f64::min);
        assert!(top.abs() < 1e-12);
        assert!((bottom + ctx.spec.slate_thickness).abs() < 1e-12);
    }
}
