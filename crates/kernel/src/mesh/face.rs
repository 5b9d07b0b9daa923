use nalgebra::Matrix3;

use super::MeshError;
use crate::geometry::plane::Plane;
use crate::geometry::polygon::Polygon2;
use crate::geometry::vector::{Vec2, Vec3};

/// Right-handed frame fitted to a face: `e1`, `e2` span the best-fit plane,
/// `normal` is oriented so the face winds counter-clockwise in `(e1, e2)`.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct FaceBasis {
    pub e1: Vec3,
    pub e2: Vec3,
    pub normal: Vec3,
    /// Centroid of the face points.
    pub origin: Vec3,
}

impl FaceBasis {
    /// Fit a basis by principal component analysis of the points.
    pub fn fit(points: &[Vec3]) -> Self {
        let origin = Vec3::centroid(points);
        let mut cov = Matrix3::zeros();
        for p in points {
            let d = *p - origin;
            let v = nalgebra::Vector3::new(d.x, d.y, d.z);
            cov += v * v.transpose();
        }
        let eig = cov.symmetric_eigen();
        let mut order = [0usize, 1, 2];
        order.sort_by(|&i, &j| eig.eigenvalues[j].total_cmp(&eig.eigenvalues[i]));
        let axis = |k: usize| {
            let c = eig.eigenvectors.column(order[k]);
            Vec3::new(c[0], c[1], c[2])
        };
        let e1 = axis(0);
        let e2 = axis(1);
        let mut normal = axis(2);
        if e1.cross(&e2).dot(&normal) < 0.0 {
            normal = -normal;
        }

        let chart: Vec<Vec2> = points
            .iter()
            .map(|p| Vec2::new((*p - origin).dot(&e1), (*p - origin).dot(&e2)))
            .collect();
        if Polygon2::new(chart).signed_area() < 0.0 {
            Self {
                e1: e2,
                e2: e1,
                normal: -normal,
                origin,
            }
        } else {
            Self {
                e1,
                e2,
                normal,
                origin,
            }
        }
    }

    pub fn chart(&self, p: &Vec3) -> Vec2 {
        let d = *p - self.origin;
        Vec2::new(d.dot(&self.e1), d.dot(&self.e2))
    }
}

/// A planar polygon of a mesh with optional per-corner shading attributes.
#[derive(Debug, Clone, PartialEq)]
pub struct Face {
    points: Vec<Vec3>,
    basis: FaceBasis,
    /// Per-corner normals, filled in by the smoothing pass.
    pub normals: Vec<Option<Vec3>>,
    /// Per-corner texture coordinates, filled in by the unwrapping pass.
    pub uvs: Vec<Option<Vec2>>,
}

impl Face {
    pub fn new(points: Vec<Vec3>) -> Result<Self, MeshError> {
        if points.len() < 3 {
            return Err(MeshError::TooFewPoints(points.len()));
        }
        let basis = FaceBasis::fit(&points);
        let n = points.len();
        Ok(Self {
            points,
            basis,
            normals: vec![None; n],
            uvs: vec![None; n],
        })
    }

    pub fn points(&self) -> &[Vec3] {
        &self.points
    }

    pub fn len(&self) -> usize {
        self.points.len()
    }

    pub fn is_empty(&self) -> bool {
        self.points.is_empty()
    }

    pub fn basis(&self) -> &FaceBasis {
        &self.basis
    }

    /// Flat normal of the face.
    pub fn normal(&self) -> Vec3 {
        self.basis.normal
    }

    pub fn centroid(&self) -> Vec3 {
        self.basis.origin
    }

    /// Coordinates of a point in the face's own chart.
    pub fn chart(&self, p: &Vec3) -> Vec2 {
        self.basis.chart(p)
    }

    pub fn chart_points(&self) -> Vec<Vec2> {
        self.points.iter().map(|p| self.basis.chart(p)).collect()
    }

    /// Every corner lies within `tol` of `plane`.
    pub fn lies_in(&self, plane: &Plane, tol: f64) -> bool {
        self.points.iter().all(|p| plane.contains(p, tol))
    }

    /// Whether every corner has a normal and a texture coordinate.
    pub fn is_shaded(&self) -> bool {
        self.normals.iter().all(Option::is_some) && self.uvs.iter().all(Option::is_some)
    }

    /// Split into triangles in the face's own winding, carrying each
    /// corner's normal and uv over by index.
    pub fn triangulate(&self) -> Result<Vec<Face>, MeshError> {
        if self.points.len() == 3 {
            return Ok(vec![self.clone()]);
        }
        let triangles = Polygon2::new(self.chart_points()).triangulate()?;
        triangles
            .into_iter()
            .map(|t| {
                let mut face = Face::new(t.iter().map(|&k| self.points[k]).collect())?;
                for (corner, &k) in t.iter().enumerate() {
                    face.normals[corner] = self.normals[k];
                    face.uvs[corner] = self.uvs[k];
                }
                Ok(face)
            })
            .collect()
    }
}
