//! Casing: the outer skirt of the table below the rail, with a bevelled
//! top edge and rounded corners. It is open at the top.

use std::f64::consts::FRAC_PI_2;

use tracing::{debug, instrument};

use table_kernel::geometry::plane::reflect_through;
use table_kernel::{Mesh, Plane, Vec3};

use super::indexed_mesh;
use crate::context::BuildContext;
use crate::errors::BuildError;

/// Closed path around the table along the outer casing edge at `height`.
///
/// The corner radius grows by `bulge_radius` and the corner centres move
/// outward by `bulge_length`. Each rounded corner has
/// `2 * casing_num_points.0 + 1` points; corners are visited in the order
/// of pockets 3, 1, 6, 4.
pub fn casing_circuit(ctx: &BuildContext, bulge_radius: f64, bulge_length: f64, height: f64) -> Vec<Vec3> {
    let spec = &ctx.spec;
    let radius = spec.casing_edge_radius + bulge_radius;
    let inset = spec.rail_width - spec.casing_edge_radius;
    let center = Vec3::new(
        bulge_length + spec.table_length / 2.0 + inset,
        bulge_length + spec.table_length / 4.0 + inset,
        height,
    );
    let n = 2 * spec.casing_num_points.0 + 1;
    let corner: Vec<Vec3> = (0..n)
        .map(|k| {
            let t = FRAC_PI_2 * k as f64 / (n - 1) as f64;
            center + Vec3::new(radius * t.cos(), radius * t.sin(), 0.0)
        })
        .collect();

    let mut circuit = Vec::with_capacity(4 * n);
    circuit.extend(corner.iter().copied());
    circuit.extend(reflect_through(&[Plane::yz(), *ctx.bisector(1)], &corner));
    circuit.extend(reflect_through(&[Plane::yz(), Plane::xz()], &corner));
    circuit.extend(reflect_through(&[Plane::xz(), *ctx.bisector(4)], &corner));
    circuit
}

/// Bevel rings from the rail top down to the bevel's end, a tapered skirt
/// down to the casing height and a fan closing the bottom.
#[instrument(skip(ctx))]
pub fn build_casing(ctx: &BuildContext) -> Result<Mesh, BuildError> {
    let spec = &ctx.spec;
    let n1 = 2 * spec.casing_num_points.0 + 1;
    let rings = spec.casing_num_points.1;
    let m = 4 * n1;
    let h0 = spec.rail_height();
    let r = spec.casing_bevel_radius;
    let depth = spec.casing_height;

    let mut vertices = Vec::with_capacity((rings + 1) * m + 1);
    for k in 0..rings {
        let t = FRAC_PI_2 * k as f64 / (rings - 1) as f64;
        vertices.extend(casing_circuit(ctx, -r + r * t.sin(), 0.0, h0 - r + r * t.cos()));
    }
    let taper = -spec.casing_vertical_angle.tan() * depth;
    vertices.extend(casing_circuit(ctx, 0.0, taper, h0 - depth));
    vertices.push(Vec3::new(0.0, 0.0, h0 - depth));

    let mut faces = Vec::with_capacity(rings * m + m);
    for k in 0..rings {
        for j in 0..m {
            let jp = (j + 1) % m;
            faces.push(vec![k * m + j, (k + 1) * m + j, (k + 1) * m + jp, k * m + jp]);
        }
    }
    let bottom_point = (rings + 1) * m;
    for j in 0..m {
        faces.push(vec![rings * m + j, bottom_point, rings * m + (j + 1) % m]);
    }

    let mesh = indexed_mesh(&vertices, &faces)?;
    debug!(faces = mesh.len(), "casing built");
    Ok(mesh)
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
    fn test_circuit_is_symmetric_and_closed_up() {
        let ctx = context();
        let circuit = casing_circuit(&ctx, 0.0, 0.0, 0.1);
        let n = 2 * ctx.spec.casing_num_points.0 + 1;
        assert_eq!(circuit.len(), 4 * n);
        let outer_x = ctx.spec.table_length / 2.0 + ctx.spec.rail_width;
        let outer_y = ctx.spec.table_length / 4.0 + ctx.spec.rail_width;
        // The first corner starts on the short side and ends on the long side.
        assert!((circuit[0].x - outer_x).abs() < 1e-12);
        assert!((circuit[n - 1].y - outer_y).abs() < 1e-12);
        for p in &circuit {
            assert!(p.x.abs() <= outer_x + 1e-12 && p.y.abs() <= outer_y + 1e-12);
            assert_eq!(p.z, 0.1);
        }
    }

    #[test]
    fn test_casing_is_open_only_at_the_top() {
        let ctx = context();
        let mesh = build_casing(&ctx).unwrap();
        let report = audit(&mesh, 1e-9, Severity::Warning);
        let m = 4 * (2 * ctx.spec.casing_num_points.0 + 1);
        assert_eq!(report.count(FindingCode::FreeEdge), m);
        assert_eq!(report.count(FindingCode::NonManifoldEdge), 0);
        let h0 = ctx.spec.rail_height();
        let topo = mesh.topology(1e-9);
        for e in topo.boundary_edges() {
            let (a, b) = topo.edges()[e];
            assert!((topo.vertices()[a].z - h0).abs() < 1e-12);
            assert!((topo.vertices()[b].z - h0).abs() < 1e-12);
        }
    }
}
