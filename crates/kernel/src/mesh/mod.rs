//! Polygon meshes with on-demand topology.

pub mod audit;
pub mod face;
pub mod topology;

use std::collections::BTreeMap;
use std::fmt;

use thiserror::Error;
use tracing::debug;

use crate::geometry::GeometryError;
pub use face::{Face, FaceBasis};
pub use topology::{Topology, unique_indexing};

#[derive(Debug, Clone, PartialEq, Error)]
pub enum MeshError {
    #[error("face needs at least 3 points, got {0}")]
    TooFewPoints(usize),
    #[error("failed to triangulate face {face}: {source}")]
    Triangulation { face: usize, source: GeometryError },
    #[error(transparent)]
    Geometry(#[from] GeometryError),
}

/// An owned, unordered collection of faces.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Mesh {
    faces: Vec<Face>,
}

impl Mesh {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn from_faces(faces: Vec<Face>) -> Self {
        Self { faces }
    }

    /// Build a mesh from point loops, one face per loop.
    pub fn from_loops<I>(loops: I) -> Result<Self, MeshError>
    where
        I: IntoIterator<Item = Vec<crate::Vec3>>,
    {
        let faces = loops
            .into_iter()
            .map(Face::new)
            .collect::<Result<Vec<_>, _>>()?;
        Ok(Self { faces })
    }

    pub fn add_face(&mut self, face: Face) {
        self.faces.push(face);
    }

    pub fn faces(&self) -> &[Face] {
        &self.faces
    }

    pub fn faces_mut(&mut self) -> &mut [Face] {
        &mut self.faces
    }

    pub fn into_faces(self) -> Vec<Face> {
        self.faces
    }

    pub fn len(&self) -> usize {
        self.faces.len()
    }

    pub fn is_empty(&self) -> bool {
        self.faces.is_empty()
    }

    /// Union of the faces of several meshes. Vertices are not welded here;
    /// coincident points only merge when a topology is computed.
    pub fn merge<I>(meshes: I) -> Self
    where
        I: IntoIterator<Item = Mesh>,
    {
        Self {
            faces: meshes.into_iter().flat_map(|m| m.faces).collect(),
        }
    }

    pub fn extend(&mut self, other: Mesh) {
        self.faces.extend(other.faces);
    }

    /// Compute the incidence tables from scratch. The snapshot borrows the
    /// mesh, so the mesh cannot change while it is alive.
    pub fn topology(&self, tol: f64) -> Topology<'_> {
        Topology::build(self, tol)
    }

    pub fn triangulate(&self) -> Result<Mesh, MeshError> {
        let mut faces = Vec::with_capacity(self.faces.len() * 2);
        for (index, face) in self.faces.iter().enumerate() {
            let tris = face.triangulate().map_err(|err| match err {
                MeshError::Geometry(source) => MeshError::Triangulation { face: index, source },
                other => other,
            })?;
            faces.extend(tris);
        }
        debug!(faces = self.faces.len(), triangles = faces.len(), "triangulated mesh");
        Ok(Mesh { faces })
    }

    pub fn is_triangle_mesh(&self) -> bool {
        self.faces.iter().all(|f| f.len() == 3)
    }

    /// Number of faces per corner count.
    pub fn face_counts(&self) -> BTreeMap<usize, usize> {
        let mut counts = BTreeMap::new();
        for face in &self.faces {
            *counts.entry(face.len()).or_insert(0) += 1;
        }
        counts
    }
}

impl fmt::Display for Mesh {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Mesh(faces={}", self.faces.len())?;
        for (corners, count) in self.face_counts() {
            match corners {
                3 => write!(f, ", tri={count}")?,
                4 => write!(f, ", quad={count}")?,
                n => write!(f, ", {n}-gon={count}")?,
            }
        }
        write!(f, ")")
    }
}

#[cfg(test)]
pub(crate) mod tests {
    use super::*;
    use crate::Vec3;

    pub(crate) fn unit_cube() -> Mesh {
        let p = |x: f64, y: f64, z: f64| Vec3::new(x, y, z);
        Mesh::from_loops(vec![
            vec![p(0., 0., 0.), p(0., 1., 0.), p(1., 1., 0.), p(1., 0., 0.)],
            vec![p(0., 0., 1.), p(1., 0., 1.), p(1., 1., 1.), p(0., 1., 1.)],
            vec![p(0., 0., 0.), p(1., 0., 0.), p(1., 0., 1.), p(0., 0., 1.)],
            vec![p(1., 0., 0.), p(1., 1., 0.), p(1., 1., 1.), p(1., 0., 1.)],
            vec![p(1., 1., 0.), p(0., 1., 0.), p(0., 1., 1.), p(1., 1., 1.)],
            vec![p(0., 1., 0.), p(0., 0., 0.), p(0., 0., 1.), p(0., 1., 1.)],
        ])
        .unwrap()
    }

    #[test]
    fn test_cube_normals_point_outward() {
        let cube = unit_cube();
        let center = Vec3::new(0.5, 0.5, 0.5);
        for face in cube.faces() {
            assert!(face.normal().dot(&(face.centroid() - center)) > 0.0);
        }
    }

    #[test]
    fn test_triangulate_cube() {
        let cube = unit_cube();
        assert!(!cube.is_triangle_mesh());
        let tris = cube.triangulate().unwrap();
        assert!(tris.is_triangle_mesh());
        assert_eq!(tris.len(), 12);
        assert!(tris.topology(1e-9).is_closed());
    }

    #[test]
    fn test_merge_keeps_faces_and_display() {
        let merged = Mesh::merge(vec![unit_cube(), unit_cube().triangulate().unwrap()]);
        assert_eq!(merged.len(), 18);
        assert_eq!(merged.to_string(), "Mesh(faces=18, tri=12, quad=6)");
    }
}
