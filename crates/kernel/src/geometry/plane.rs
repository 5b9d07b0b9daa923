//! Point-normal planes and the reflection algebra used to mirror table parts.

use nalgebra::{Matrix3, Vector3};

use super::GeometryError;
use super::vector::{Vec2, Vec3};
use crate::Tolerance;

/// Plane `{p : normal . p = offset}` with a unit normal.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Plane {
    normal: Vec3,
    offset: f64,
}

impl Plane {
    /// Build a plane from a (not necessarily unit) normal and an offset.
    ///
    /// The normal is normalized; the offset is kept as given and measured
    /// along the normalized direction.
    pub fn new(normal: Vec3, offset: f64) -> Result<Self, GeometryError> {
        let normal = normal.normalized().ok_or(GeometryError::DegenerateNormal)?;
        Ok(Self { normal, offset })
    }

    /// Plane through `point` with the given normal.
    pub fn through(point: Vec3, normal: Vec3) -> Result<Self, GeometryError> {
        let normal = normal.normalized().ok_or(GeometryError::DegenerateNormal)?;
        Ok(Self {
            normal,
            offset: normal.dot(&point),
        })
    }

    /// Plane through three points, normal `normalize((p3 - p1) x (p2 - p1))`.
    pub fn from_points(p1: Vec3, p2: Vec3, p3: Vec3) -> Result<Self, GeometryError> {
        Self::through(p1, (p3 - p1).cross(&(p2 - p1)))
    }

    /// The `x = 0` plane.
    pub const fn yz() -> Self {
        Self {
            normal: Vec3::X,
            offset: 0.0,
        }
    }

    /// The `y = 0` plane.
    pub const fn xz() -> Self {
        Self {
            normal: Vec3::Y,
            offset: 0.0,
        }
    }

    /// The horizontal plane `z = height`, normal pointing up.
    pub const fn horizontal(height: f64) -> Self {
        Self {
            normal: Vec3::Z,
            offset: height,
        }
    }

    pub fn normal(&self) -> Vec3 {
        self.normal
    }

    pub fn offset(&self) -> f64 {
        self.offset
    }

    pub fn signed_distance(&self, p: &Vec3) -> f64 {
        self.normal.dot(p) - self.offset
    }

    pub fn distance(&self, p: &Vec3) -> f64 {
        self.signed_distance(p).abs()
    }

    pub fn contains(&self, p: &Vec3, tol: f64) -> bool {
        self.distance(p) < tol
    }

    /// Orthogonal projection of `p` onto the plane.
    pub fn project(&self, p: &Vec3) -> Vec3 {
        *p - self.signed_distance(p) * self.normal
    }

    pub fn reflect(&self, p: &Vec3) -> Vec3 {
        *p - 2.0 * self.signed_distance(p) * self.normal
    }

    /// Reflect every point, keeping the order.
    pub fn reflect_all(&self, points: &[Vec3]) -> Vec<Vec3> {
        points.iter().map(|p| self.reflect(p)).collect()
    }

    /// Reflect every point and reverse the order, which restores the
    /// winding a mirror image would otherwise flip.
    pub fn reflect_reversed(&self, points: &[Vec3]) -> Vec<Vec3> {
        points.iter().rev().map(|p| self.reflect(p)).collect()
    }

    /// Parallel plane shifted by `delta` along the normal.
    pub fn translated(&self, delta: f64) -> Self {
        Self {
            normal: self.normal,
            offset: self.offset + delta,
        }
    }

    /// Same plane with the normal pointing the other way.
    pub fn flipped(&self) -> Self {
        Self {
            normal: -self.normal,
            offset: -self.offset,
        }
    }

    /// Orthonormal in-plane axes `(u, v)` with `u x v = normal`.
    ///
    /// For the `+Z` plane this gives `(X, Y)`.
    pub fn chart_axes(&self) -> (Vec3, Vec3) {
        let n = self.normal;
        let reference = if n.y.abs() < 0.9 { Vec3::Y } else { Vec3::Z };
        // u = reference x n lies in the plane; v = n x u completes the frame.
        let u = reference.cross(&n).normalized().unwrap_or(Vec3::X);
        let v = n.cross(&u);
        (u, v)
    }

    /// Coordinates of `p` in the plane's chart.
    pub fn chart(&self, p: &Vec3) -> Vec2 {
        let (u, v) = self.chart_axes();
        Vec2::new(u.dot(p), v.dot(p))
    }

    /// Unique common point of three planes.
    pub fn intersection(a: &Self, b: &Self, c: &Self) -> Result<Vec3, GeometryError> {
        Self::intersection_with_tolerance(a, b, c, Tolerance::DEFAULT.determinant)
    }

    pub fn intersection_with_tolerance(
        a: &Self,
        b: &Self,
        c: &Self,
        det_tol: f64,
    ) -> Result<Vec3, GeometryError> {
        let m = Matrix3::new(
            a.normal.x, a.normal.y, a.normal.z,
            b.normal.x, b.normal.y, b.normal.z,
            c.normal.x, c.normal.y, c.normal.z,
        );
        let determinant = m.determinant();
        if determinant.abs() < det_tol {
            return Err(GeometryError::DegenerateIntersection { determinant });
        }
        let rhs = Vector3::new(a.offset, b.offset, c.offset);
        let x = m
            .lu()
            .solve(&rhs)
            .ok_or(GeometryError::DegenerateIntersection { determinant })?;
        Ok(Vec3::new(x[0], x[1], x[2]))
    }
}

/// Apply a sequence of reflections in order to every point.
///
/// Each reflection is applied with reversal, so an odd or even chain keeps
/// the winding of the input either way.
pub fn reflect_through(planes: &[Plane], points: &[Vec3]) -> Vec<Vec3> {
    planes
        .iter()
        .fold(points.to_vec(), |acc, plane| plane.reflect_reversed(&acc))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_new_normalizes() {
        let p = Plane::new(Vec3::new(0.0, 3.0, 4.0), 2.0).unwrap();
        assert!((p.normal().length() - 1.0).abs() < 1e-12);
        assert!((p.offset() - 2.0).abs() < 1e-12);
        assert_eq!(
            Plane::new(Vec3::ZERO, 1.0),
            Err(GeometryError::DegenerateNormal)
        );
    }

    #[test]
    fn test_from_points_orientation() {
        // (p3 - p1) x (p2 - p1) with p2 on X and p3 on Y gives -Z.
        let p = Plane::from_points(Vec3::ZERO, Vec3::X, Vec3::Y).unwrap();
        assert!((p.normal().z + 1.0).abs() < 1e-12);
        assert!(p.offset().abs() < 1e-12);
        assert!(Plane::from_points(Vec3::ZERO, Vec3::X, Vec3::X * 2.0).is_err());
    }

    #[test]
    fn test_reflect_and_signed_distance() {
        let p = Plane::new(Vec3::X, 1.0).unwrap();
        let q = Vec3::new(3.0, 2.0, -1.0);
        assert!((p.signed_distance(&q) - 2.0).abs() < 1e-12);
        let r = p.reflect(&q);
        approx::assert_abs_diff_eq!(r, Vec3::new(-1.0, 2.0, -1.0), epsilon = 1e-12);
        approx::assert_abs_diff_eq!(p.reflect(&r), q, epsilon = 1e-12);
    }

    #[test]
    fn test_intersection_of_axis_planes() {
        let x = Plane::new(Vec3::X, 1.0).unwrap();
        let y = Plane::new(Vec3::Y, 2.0).unwrap();
        let z = Plane::horizontal(3.0);
        let p = Plane::intersection(&x, &y, &z).unwrap();
        approx::assert_abs_diff_eq!(p, Vec3::new(1.0, 2.0, 3.0), epsilon = 1e-12);
    }

    #[test]
    fn test_intersection_parallel_fails() {
        let a = Plane::new(Vec3::X, 1.0).unwrap();
        let b = Plane::new(Vec3::X, 2.0).unwrap();
        let c = Plane::horizontal(0.0);
        assert!(matches!(
            Plane::intersection(&a, &b, &c),
            Err(GeometryError::DegenerateIntersection { .. })
        ));
    }

    #[test]
    fn test_chart_axes_of_horizontal_plane() {
        let (u, v) = Plane::horizontal(0.5).chart_axes();
        approx::assert_abs_diff_eq!(u, Vec3::X, epsilon = 1e-12);
        approx::assert_abs_diff_eq!(v, Vec3::Y, epsilon = 1e-12);
    }

    #[test]
    fn test_chart_axes_right_handed() {
        let plane = Plane::new(Vec3::new(0.2, 0.95, -0.1), 0.0).unwrap();
        let (u, v) = plane.chart_axes();
        approx::assert_abs_diff_eq!(u.cross(&v), plane.normal(), epsilon = 1e-12);
    }

    #[test]
    fn test_reflect_through_chain() {
        let pts = [Vec3::new(1.0, 2.0, 0.0), Vec3::new(3.0, 4.0, 0.0)];
        let out = reflect_through(&[Plane::yz(), Plane::xz()], &pts);
        // Two reversals restore the original order.
        approx::assert_abs_diff_eq!(out[0], Vec3::new(-1.0, -2.0, 0.0), epsilon = 1e-12);
        approx::assert_abs_diff_eq!(out[1], Vec3::new(-3.0, -4.0, 0.0), epsilon = 1e-12);
    }
}
