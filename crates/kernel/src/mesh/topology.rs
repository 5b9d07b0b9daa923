use std::collections::HashMap;

use tracing::{debug, instrument};

use super::Mesh;
use crate::geometry::vector::Vec3;

/// Deduplicate `items` under a distance function.
///
/// Returns the unique items in first-seen order and, for every input item,
/// the index of its representative. The first unique item within `eps`
/// wins. Quadratic in the number of unique items.
pub fn unique_indexing<P, F>(items: &[P], distance: F, eps: f64) -> (Vec<P>, Vec<usize>)
where
    P: Clone,
    F: Fn(&P, &P) -> f64,
{
    let mut unique: Vec<P> = Vec::new();
    let mut index = Vec::with_capacity(items.len());
    for item in items {
        match unique.iter().position(|u| distance(u, item) < eps) {
            Some(k) => index.push(k),
            None => {
                index.push(unique.len());
                unique.push(item.clone());
            }
        }
    }
    (unique, index)
}

/// Incidence tables of a mesh with coincident points welded.
///
/// Borrowing the mesh ties the snapshot to the faces it was computed from.
#[derive(Debug, Clone)]
pub struct Topology<'m> {
    mesh: &'m Mesh,
    vertices: Vec<Vec3>,
    face_vertices: Vec<Vec<usize>>,
    vertex_faces: Vec<Vec<usize>>,
    edges: Vec<(usize, usize)>,
    edge_lookup: HashMap<(usize, usize), usize>,
    vertex_edges: Vec<Vec<usize>>,
    face_edges: Vec<Vec<usize>>,
    edge_faces: Vec<Vec<usize>>,
}

fn edge_key(a: usize, b: usize) -> (usize, usize) {
    (a.min(b), a.max(b))
}

impl<'m> Topology<'m> {
    #[instrument(skip(mesh), fields(faces = mesh.len()))]
    pub fn build(mesh: &'m Mesh, tol: f64) -> Self {
        let corners: Vec<Vec3> = mesh
            .faces()
            .iter()
            .flat_map(|f| f.points().iter().copied())
            .collect();
        let (vertices, corner_index) = unique_indexing(&corners, |a, b| a.distance_to(b), tol);

        let mut face_vertices = Vec::with_capacity(mesh.len());
        let mut vertex_faces = vec![Vec::new(); vertices.len()];
        let mut cursor = 0;
        for (f, face) in mesh.faces().iter().enumerate() {
            let fv: Vec<usize> = corner_index[cursor..cursor + face.len()].to_vec();
            cursor += face.len();
            for &v in &fv {
                let incident: &mut Vec<usize> = &mut vertex_faces[v];
                if incident.last() != Some(&f) {
                    incident.push(f);
                }
            }
            face_vertices.push(fv);
        }

        let mut edges = Vec::new();
        let mut edge_lookup = HashMap::new();
        let mut vertex_edges = vec![Vec::new(); vertices.len()];
        let mut face_edges = Vec::with_capacity(mesh.len());
        for fv in &face_vertices {
            let n = fv.len();
            let mut fe = Vec::with_capacity(n);
            for k in 0..n {
                let (a, b) = (fv[k], fv[(k + 1) % n]);
                if a == b {
                    continue;
                }
                let e = *edge_lookup.entry(edge_key(a, b)).or_insert_with(|| {
                    edges.push((a, b));
                    vertex_edges[a].push(edges.len() - 1);
                    vertex_edges[b].push(edges.len() - 1);
                    edges.len() - 1
                });
                fe.push(e);
            }
            face_edges.push(fe);
        }

        let mut edge_faces = vec![Vec::new(); edges.len()];
        for (f, fe) in face_edges.iter().enumerate() {
            for &e in fe {
                edge_faces[e].push(f);
            }
        }

        debug!(
            vertices = vertices.len(),
            edges = edges.len(),
            "computed mesh topology"
        );

        Self {
            mesh,
            vertices,
            face_vertices,
            vertex_faces,
            edges,
            edge_lookup,
            vertex_edges,
            face_edges,
            edge_faces,
        }
    }

    pub fn mesh(&self) -> &'m Mesh {
        self.mesh
    }

    pub fn vertices(&self) -> &[Vec3] {
        &self.vertices
    }

    pub fn face_count(&self) -> usize {
        self.face_vertices.len()
    }

    /// Welded vertex index of every corner of face `f`.
    pub fn face_vertices(&self, f: usize) -> &[usize] {
        &self.face_vertices[f]
    }

    pub fn vertex_faces(&self, v: usize) -> &[usize] {
        &self.vertex_faces[v]
    }

    /// Edges as vertex pairs in the direction first traversed.
    pub fn edges(&self) -> &[(usize, usize)] {
        &self.edges
    }

    pub fn vertex_edges(&self, v: usize) -> &[usize] {
        &self.vertex_edges[v]
    }

    pub fn face_edges(&self, f: usize) -> &[usize] {
        &self.face_edges[f]
    }

    pub fn edge_faces(&self, e: usize) -> &[usize] {
        &self.edge_faces[e]
    }

    /// Edge joining two vertices, in either direction.
    pub fn edge_between(&self, a: usize, b: usize) -> Option<usize> {
        self.edge_lookup.get(&edge_key(a, b)).copied()
    }

    /// Corner position of vertex `v` in face `f`.
    pub fn corner_of(&self, f: usize, v: usize) -> Option<usize> {
        self.face_vertices[f].iter().position(|&u| u == v)
    }

    /// Vertices shared by two faces, in the order they appear in `f`.
    pub fn shared_vertices(&self, f: usize, g: usize) -> Vec<usize> {
        let other = &self.face_vertices[g];
        let mut shared: Vec<usize> = Vec::new();
        for &v in &self.face_vertices[f] {
            if other.contains(&v) && !shared.contains(&v) {
                shared.push(v);
            }
        }
        shared
    }

    /// Faces sharing at least one edge with `f`.
    pub fn edge_neighbors(&self, f: usize) -> Vec<usize> {
        let mut out: Vec<usize> = Vec::new();
        for &e in &self.face_edges[f] {
            for &g in &self.edge_faces[e] {
                if g != f && !out.contains(&g) {
                    out.push(g);
                }
            }
        }
        out
    }

    /// Edges with exactly one incident face.
    pub fn boundary_edges(&self) -> Vec<usize> {
        (0..self.edges.len())
            .filter(|&e| self.edge_faces[e].len() == 1)
            .collect()
    }

    /// Edges with more than two incident faces.
    pub fn non_manifold_edges(&self) -> Vec<usize> {
        (0..self.edges.len())
            .filter(|&e| self.edge_faces[e].len() > 2)
            .collect()
    }

    /// Every edge is shared by exactly two faces.
    pub fn is_closed(&self) -> bool {
        !self.edges.is_empty() && self.edge_faces.iter().all(|faces| faces.len() == 2)
    }

    /// `V - E + F`.
    pub fn euler_characteristic(&self) -> i64 {
        self.vertices.len() as i64 - self.edges.len() as i64 + self.face_vertices.len() as i64
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::mesh::Face;
    use crate::mesh::tests::unit_cube;

    #[test]
    fn test_unique_indexing_first_match_wins() {
        let pts = [0.0, 1.0, 1e-12, 2.0, 1.0 + 1e-12];
        let (unique, index) = unique_indexing(&pts, |a: &f64, b: &f64| (a - b).abs(), 1e-9);
        assert_eq!(unique, vec![0.0, 1.0, 2.0]);
        assert_eq!(index, vec![0, 1, 0, 2, 1]);
    }

    #[test]
    fn test_cube_tables() {
        let cube = unit_cube();
        let topo = cube.topology(1e-9);
        assert_eq!(topo.vertices().len(), 8);
        assert_eq!(topo.edges().len(), 12);
        assert_eq!(topo.euler_characteristic(), 2);
        assert!(topo.is_closed());
        for v in 0..8 {
            assert_eq!(topo.vertex_faces(v).len(), 3);
            assert_eq!(topo.vertex_edges(v).len(), 3);
        }
        for f in 0..6 {
            assert_eq!(topo.face_edges(f).len(), 4);
            assert_eq!(topo.edge_neighbors(f).len(), 4);
        }
    }

    #[test]
    fn test_open_mesh_has_boundary() {
        let mut faces = unit_cube().into_faces();
        faces.pop();
        let open = Mesh::from_faces(faces);
        let topo = open.topology(1e-9);
        assert!(!topo.is_closed());
        assert_eq!(topo.boundary_edges().len(), 4);
        assert!(topo.non_manifold_edges().is_empty());
    }

    #[test]
    fn test_welding_tolerance() {
        let a = Face::new(vec![Vec3::ZERO, Vec3::X, Vec3::Y]).unwrap();
        let b = Face::new(vec![
            Vec3::new(1.0 + 1e-12, 0.0, 0.0),
            Vec3::new(1.0, 1.0, 0.0),
            Vec3::new(0.0, 1.0, 1e-12),
        ])
        .unwrap();
        let mesh = Mesh::from_faces(vec![a, b]);
        let topo = mesh.topology(1e-9);
        assert_eq!(topo.vertices().len(), 4);
        assert_eq!(topo.shared_vertices(0, 1), vec![1, 2]);
        let e = topo.edge_between(2, 1).unwrap();
        assert_eq!(topo.edge_faces(e), &[0, 1]);
    }
}
