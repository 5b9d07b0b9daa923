//! Structural audit of generated meshes.
//!
//! Free edge and non-manifold edge detection plus degenerate faces, reported
//! as structured findings.

use std::fmt;

use tracing::{info, instrument};

use super::Mesh;

/// Severity of an audit finding.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Severity {
    /// The mesh is not a closed 2-manifold.
    Error,
    /// Informational; may be intentional for open parts.
    Warning,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum FindingCode {
    /// Edge is referenced by only one face (open boundary).
    FreeEdge,
    /// Edge is shared by more than two faces.
    NonManifoldEdge,
    /// Face has (near) zero area.
    ZeroAreaFace,
}

impl fmt::Display for FindingCode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        fmt::Debug::fmt(self, f)
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct Finding {
    pub code: FindingCode,
    pub severity: Severity,
    pub edge: Option<usize>,
    pub faces: Vec<usize>,
    pub message: String,
}

#[derive(Debug, Clone, PartialEq)]
pub struct MeshReport {
    pub vertex_count: usize,
    pub edge_count: usize,
    pub face_count: usize,
    pub euler_characteristic: i64,
    pub findings: Vec<Finding>,
}

impl MeshReport {
    pub fn errors(&self) -> impl Iterator<Item = &Finding> {
        self.findings.iter().filter(|f| f.severity == Severity::Error)
    }

    pub fn count(&self, code: FindingCode) -> usize {
        self.findings.iter().filter(|f| f.code == code).count()
    }

    /// No free edges, no non-manifold edges, no degenerate faces.
    pub fn is_watertight(&self) -> bool {
        self.findings.is_empty()
    }
}

impl fmt::Display for MeshReport {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "V={} E={} F={} chi={} findings={}",
            self.vertex_count,
            self.edge_count,
            self.face_count,
            self.euler_characteristic,
            self.findings.len()
        )
    }
}

/// Audit a mesh for closedness, manifoldness and degenerate faces.
///
/// `free_edges` selects how open boundaries are graded: parts that are cut
/// open on purpose report them as warnings.
#[instrument(skip(mesh), fields(faces = mesh.len()))]
pub fn audit(mesh: &Mesh, tol: f64, free_edges: Severity) -> MeshReport {
    let topo = mesh.topology(tol);
    let mut findings = Vec::new();

    for e in topo.boundary_edges() {
        findings.push(Finding {
            code: FindingCode::FreeEdge,
            severity: free_edges,
            edge: Some(e),
            faces: topo.edge_faces(e).to_vec(),
            message: "Edge is referenced by only one face (open boundary)".into(),
        });
    }
    for e in topo.non_manifold_edges() {
        let faces = topo.edge_faces(e).to_vec();
        findings.push(Finding {
            code: FindingCode::NonManifoldEdge,
            severity: Severity::Error,
            edge: Some(e),
            message: format!("Edge shared by {} faces (expected 2)", faces.len()),
            faces,
        });
    }
    for (index, face) in mesh.faces().iter().enumerate() {
        let area = crate::geometry::polygon::Polygon2::new(face.chart_points()).area();
        if area < tol * tol {
            findings.push(Finding {
                code: FindingCode::ZeroAreaFace,
                severity: Severity::Error,
                edge: None,
                faces: vec![index],
                message: format!("Face area {area:e} below tolerance"),
            });
        }
    }

    let report = MeshReport {
        vertex_count: topo.vertices().len(),
        edge_count: topo.edges().len(),
        face_count: topo.face_count(),
        euler_characteristic: topo.euler_characteristic(),
        findings,
    };
    info!(
        vertices = report.vertex_count,
        edges = report.edge_count,
        findings = report.findings.len(),
        "mesh audit complete"
    );
    report
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::mesh::tests::unit_cube;

    #[test]
    fn test_cube_is_watertight() {
        let report = audit(&unit_cube(), 1e-9, Severity::Error);
        assert!(report.is_watertight());
        assert_eq!(report.euler_characteristic, 2);
        assert_eq!(report.to_string(), "V=8 E=12 F=6 chi=2 findings=0");
    }

    #[test]
    fn test_open_box_reports_free_edges() {
        let mut faces = unit_cube().into_faces();
        faces.remove(1);
        let report = audit(&Mesh::from_faces(faces), 1e-9, Severity::Warning);
        assert_eq!(report.count(FindingCode::FreeEdge), 4);
        assert_eq!(report.errors().count(), 0);
    }

    #[test]
    fn test_fin_is_non_manifold() {
        let mut mesh = unit_cube();
        let fin = crate::mesh::Face::new(vec![
            crate::Vec3::new(0.0, 0.0, 0.0),
            crate::Vec3::new(1.0, 0.0, 0.0),
            crate::Vec3::new(0.5, -1.0, 0.0),
        ])
        .unwrap();
        mesh.add_face(fin);
        let report = audit(&mesh, 1e-9, Severity::Error);
        assert_eq!(report.count(FindingCode::NonManifoldEdge), 1);
        assert!(!report.is_watertight());
    }
}
