//! Cushions: closed five-sided prisms cut off by the pocket planes.

use tracing::{debug, instrument};

use table_kernel::{Mesh, Plane, Vec3};

use super::indexed_mesh;
use crate::context::{BuildContext, Cushion};
use crate::errors::BuildError;

/// Mesh of one cushion.
///
/// The profile planes (rail back, rail top, rubber top, rubber bottom,
/// slate) are cut by both end planes. Vertices `0..5` lie on the first end,
/// `5..10` on the second; two pentagon caps and five quads close the solid.
#[instrument(skip(ctx))]
pub fn build_cushion(ctx: &BuildContext, cushion: Cushion) -> Result<Mesh, BuildError> {
    let planes = ctx.cushion(cushion);
    let profile = planes.profile();
    let n = profile.len();

    let mut vertices: Vec<Vec3> = Vec::with_capacity(2 * n);
    for end in [&planes.end1, &planes.end2] {
        for k in 0..n {
            vertices.push(Plane::intersection(end, &profile[k], &profile[(k + 1) % n])?);
        }
    }

    let mut faces = vec![vec![4, 3, 2, 1, 0], vec![5, 6, 7, 8, 9]];
    for k in 0..n {
        faces.push(vec![k, (k + 1) % n, (k + 1) % n + n, k + n]);
    }
    let mesh = indexed_mesh(&vertices, &faces)?;
    debug!(cushion = cushion.name(), faces = mesh.len(), "cushion built");
    Ok(mesh)
}

pub fn build_cushions(ctx: &BuildContext) -> Result<Vec<(Cushion, Mesh)>, BuildError> {
    Cushion::ALL
        .into_iter()
        .map(|cushion| Ok((cushion, build_cushion(ctx, cushion)?)))
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::spec::Spec;
    use table_kernel::mesh::audit::{Severity, audit};

    fn context() -> BuildContext {
        BuildContext::new(&Spec::default()).unwrap()
    }

    fn vertices(mesh: &Mesh) -> Vec<Vec3> {
        mesh.topology(1e-9).vertices().to_vec()
    }

    /// Every point of `a` has a partner in `b` within `tol`, and the
    /// counts agree.
    fn same_point_set(a: &[Vec3], b: &[Vec3], tol: f64) -> bool {
        a.len() == b.len() && a.iter().all(|p| b.iter().any(|q| p.distance_to(q) < tol))
    }

    #[test]
    fn test_cushions_are_closed() {
        let ctx = context();
        for (cushion, mesh) in build_cushions(&ctx).unwrap() {
            assert_eq!(mesh.len(), 7, "{}", cushion.name());
            let report = audit(&mesh, 1e-9, Severity::Error);
            assert!(report.is_watertight(), "{}: {report}", cushion.name());
            assert_eq!(report.vertex_count, 10);
            assert_eq!(report.edge_count, 15);
            assert_eq!(report.euler_characteristic, 2);
        }
    }

    #[test]
    fn test_cushions_are_mirror_symmetric() {
        let ctx = context();
        let v = |c| vertices(&build_cushion(&ctx, c).unwrap());
        let yz = Plane::yz();
        let xz = Plane::xz();
        assert!(same_point_set(&yz.reflect_all(&v(Cushion::A)), &v(Cushion::B), 1e-9));
        assert!(same_point_set(&yz.reflect_all(&v(Cushion::C)), &v(Cushion::F), 1e-9));
        assert!(same_point_set(&xz.reflect_all(&v(Cushion::A)), &v(Cushion::E), 1e-9));
        assert!(same_point_set(&xz.reflect_all(&v(Cushion::B)), &v(Cushion::D), 1e-9));
        // C is symmetric in itself.
        assert!(same_point_set(&xz.reflect_all(&v(Cushion::C)), &v(Cushion::C), 1e-9));
    }

    #[test]
    fn test_neighbouring_cushions_are_split_by_a_pocket_mouth() {
        let ctx = context();
        let cushions = build_cushions(&ctx).unwrap();
        for k in 0..cushions.len() {
            let (a, mesh_a) = &cushions[k];
            let (b, mesh_b) = &cushions[(k + 1) % cushions.len()];
            let gap = vertices(mesh_a)
                .iter()
                .flat_map(|p| vertices(mesh_b).into_iter().map(move |q| p.distance_to(&q)))
                .fold(f64::INFINITY, f64::min);
            assert!(gap > 0.01, "{} and {} are {gap} apart", a.name(), b.name());
        }
    }

    #[test]
    fn test_cushion_spans_bed_to_rail() {
        let ctx = context();
        let mesh = build_cushion(&ctx, Cushion::B).unwrap();
        let zs: Vec<f64> = vertices(&mesh).iter().map(|p| p.z).collect();
        let top = zs.iter().cloned().fold(f64::MIN, f64::max);
        let bottom = zs.iter().cloned().fold(f64::MAX, f64::min);
        assert!((top - ctx.spec.rail_height()).abs() < 1e-12);
        assert!(bottom.abs() < 1e-12);
    }
}
