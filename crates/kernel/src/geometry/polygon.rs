//! Simple planar polygons: validation, signed distance and ear-clipping
//! triangulation.

use tracing::{debug, instrument};

use super::GeometryError;
use super::segment::{LineSegment2, nearly_equal};
use super::vector::Vec2;

/// Parametric tolerance for snapping a boundary parameter onto a vertex.
const PARAM_TOL: f64 = 1e-9;

/// A planar polygon, not necessarily positively oriented.
#[derive(Debug, Clone, PartialEq)]
pub struct Polygon2 {
    points: Vec<Vec2>,
    validated: bool,
}

/// Closest boundary point of a polygon to a query point.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct BoundaryDistance {
    /// Negative inside, positive outside, zero on the boundary.
    pub signed_distance: f64,
    pub point: Vec2,
    /// Boundary parameter: edge index plus position along that edge.
    pub parameter: f64,
}

impl Polygon2 {
    /// Wrap points without checking simplicity.
    pub fn new(points: Vec<Vec2>) -> Self {
        Self {
            points,
            validated: false,
        }
    }

    /// Build a polygon and require it to pass [`Polygon2::check`].
    pub fn simple(points: Vec<Vec2>) -> Result<Self, GeometryError> {
        if points.len() < 3 {
            return Err(GeometryError::TooFewPoints(points.len()));
        }
        let mut polygon = Self::new(points);
        polygon.check()?;
        Ok(polygon)
    }

    pub fn points(&self) -> &[Vec2] {
        &self.points
    }

    pub fn len(&self) -> usize {
        self.points.len()
    }

    pub fn is_empty(&self) -> bool {
        self.points.is_empty()
    }

    pub fn is_validated(&self) -> bool {
        self.validated
    }

    /// Edge `k` modulo the vertex count; `None` for an empty polygon.
    pub fn edge(&self, k: usize) -> Option<LineSegment2> {
        let n = self.points.len();
        if n == 0 {
            return None;
        }
        Some(self.segment(k % n))
    }

    fn segment(&self, k: usize) -> LineSegment2 {
        let n = self.points.len();
        LineSegment2::new(self.points[k % n], self.points[(k + 1) % n])
    }

    /// Test every pair of non-adjacent edges for contact.
    ///
    /// Sets the validated flag only when no such pair touches or crosses.
    pub fn check(&mut self) -> Result<(), GeometryError> {
        self.validated = false;
        let n = self.points.len();
        for k in 0..n {
            let ek = self.segment(k);
            for j in 0..k.saturating_sub(1) {
                if j == 0 && k == n - 1 {
                    continue;
                }
                if ek.touches(&self.segment(j)) {
                    return Err(GeometryError::NonSimplePolygon {
                        first: j,
                        second: k,
                    });
                }
            }
        }
        self.validated = true;
        Ok(())
    }

    /// Shoelace area; positive for counter-clockwise winding.
    pub fn signed_area(&self) -> f64 {
        let n = self.points.len();
        let twice: f64 = (0..n)
            .map(|k| self.points[k].cross(&self.points[(k + 1) % n]))
            .sum();
        0.5 * twice
    }

    pub fn area(&self) -> f64 {
        self.signed_area().abs()
    }

    /// Point on the boundary at parameter `t` (edge index plus fraction), wrapping.
    pub fn at(&self, t: f64) -> Option<Vec2> {
        let n = self.points.len() as f64;
        let s = t - n * (t / n).floor();
        let k = s.floor();
        Some(self.edge(k as usize)?.at(s - k))
    }

    /// Signed distance from `z` to the boundary, with the closest boundary point.
    ///
    /// `None` for an empty polygon.
    pub fn signed_distance(&self, z: &Vec2) -> Option<BoundaryDistance> {
        let n = self.points.len();
        if n == 0 {
            return None;
        }
        let mut best = (f64::INFINITY, 0usize, 0.0);
        for k in 0..n {
            let (d, t) = self.segment(k).distance_to_point(z);
            if d < best.0 {
                best = (d, k, t);
            }
        }
        let (_, k, t) = best;
        Some(BoundaryDistance {
            signed_distance: self.resolve_sign(z, k, t),
            point: self.segment(k).at(t),
            parameter: k as f64 + t,
        })
    }

    /// Decide the side of `z` from the turning angle at its closest boundary point.
    fn resolve_sign(&self, z: &Vec2, mut k: usize, mut t: f64) -> f64 {
        let n = self.points.len();
        if (t - 1.0).abs() <= PARAM_TOL {
            k = (k + 1) % n;
            t = 0.0;
        }
        let mut prev = self.points[k];
        let next = self.points[(k + 1) % n];
        let mut base = (1.0 - t) * prev + t * next;
        if t.abs() <= PARAM_TOL {
            base = prev;
            prev = self.points[(k + n - 1) % n];
        }
        if nearly_equal(z, &base) {
            return 0.0;
        }
        let w = *z - base;
        let dz1 = base - prev;
        let dz2 = next - base;
        // Arguments of w / dz1 and dz2 / dz1 as complex numbers.
        let ang1 = dz1.cross(&w).atan2(dz1.dot(&w));
        let ang2 = dz1.cross(&dz2).atan2(dz1.dot(&dz2));
        let sign = self.signed_area().signum();
        if ang1 > ang2 {
            -sign * w.length()
        } else {
            sign * w.length()
        }
    }

    /// Diagonal `(k1, k2)` lies inside the polygon and only meets the
    /// boundary at its endpoints.
    fn diagonal_usable(&self, k1: usize, k2: usize) -> bool {
        let n = self.points.len();
        let diagonal = LineSegment2::new(self.points[k1], self.points[k2]);
        for j in 0..n {
            let jn = (j + 1) % n;
            if j == k1 || j == k2 || jn == k1 || jn == k2 {
                continue;
            }
            if diagonal.touches(&self.segment(j)) {
                return false;
            }
        }
        let mid = diagonal.at(0.5);
        let Some(boundary) = self.signed_distance(&mid) else {
            return false;
        };
        boundary.signed_distance < 0.0 && !nearly_equal(&boundary.point, &mid)
    }

    fn usable_diagonals(&self) -> Vec<Vec<bool>> {
        let n = self.points.len();
        let mut usable = vec![vec![false; n]; n];
        for k1 in 0..n {
            for k2 in (k1 + 2)..n {
                if k1 == 0 && k2 == n - 1 {
                    continue;
                }
                if self.diagonal_usable(k1, k2) {
                    usable[k1][k2] = true;
                    usable[k2][k1] = true;
                }
            }
        }
        usable
    }

    fn is_ear(&self, remaining: &[usize], at: usize, usable: &[Vec<bool>], orientation: f64) -> bool {
        let m = remaining.len();
        let prev = remaining[(at + m - 1) % m];
        let here = remaining[at];
        let next = remaining[(at + 1) % m];
        if !usable[prev][next] {
            return false;
        }
        let (a, b, c) = (self.points[prev], self.points[here], self.points[next]);
        let e1 = b - a;
        let e2 = c - b;
        let turn = orientation * e1.cross(&e2);
        if turn <= PARAM_TOL * e1.length() * e2.length() {
            return false;
        }
        remaining
            .iter()
            .filter(|&&v| v != prev && v != here && v != next)
            .all(|&v| !in_triangle(&self.points[v], &a, &b, &c))
    }

    /// Ear-clipping triangulation into `n - 2` index triangles.
    ///
    /// Triangles keep the polygon's winding. Fails instead of returning a
    /// partial result when no ear with a usable diagonal remains.
    #[instrument(skip(self), fields(n = self.points.len()))]
    pub fn triangulate(&self) -> Result<Vec<[usize; 3]>, GeometryError> {
        let n = self.points.len();
        if n < 3 {
            return Err(GeometryError::TooFewPoints(n));
        }
        if n == 3 {
            return Ok(vec![[0, 1, 2]]);
        }
        let orientation = self.signed_area().signum();
        let usable = self.usable_diagonals();
        let mut remaining: Vec<usize> = (0..n).collect();
        let mut triangles = Vec::with_capacity(n - 2);

        while remaining.len() > 3 {
            let m = remaining.len();
            let Some(at) = (0..m).find(|&k| self.is_ear(&remaining, k, &usable, orientation)) else {
                debug!(remaining = m, "no usable ear");
                return Err(GeometryError::TriangulationStall { remaining: m });
            };
            triangles.push([
                remaining[(at + m - 1) % m],
                remaining[at],
                remaining[(at + 1) % m],
            ]);
            remaining.remove(at);
        }
        triangles.push([remaining[0], remaining[1], remaining[2]]);
        Ok(triangles)
    }
}

/// Closed point-in-triangle test, independent of the triangle's winding.
fn in_triangle(p: &Vec2, a: &Vec2, b: &Vec2, c: &Vec2) -> bool {
    let d1 = (*b - *a).cross(&(*p - *a));
    let d2 = (*c - *b).cross(&(*p - *b));
    let d3 = (*a - *c).cross(&(*p - *c));
    let has_neg = d1 < 0.0 || d2 < 0.0 || d3 < 0.0;
    let has_pos = d1 > 0.0 || d2 > 0.0 || d3 > 0.0;
    !(has_neg && has_pos)
}
