//! Planar segment distance queries used by polygon validation and triangulation.

use super::vector::Vec2;

/// Relative tolerance for treating two 2D points as the same point.
const REL_TOL: f64 = 1e-9;
const ABS_TOL: f64 = 1e-20;

/// Whether `a` and `b` coincide up to a tolerance relative to their magnitude.
pub fn nearly_equal(a: &Vec2, b: &Vec2) -> bool {
    a.distance_to(b) <= (REL_TOL * a.length().max(b.length())).max(ABS_TOL)
}

/// A 2D line segment parametrized as `(1 - t) * start + t * end`, `t` in `[0, 1]`.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct LineSegment2 {
    pub start: Vec2,
    pub end: Vec2,
}

/// Result of a segment-to-segment query.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct SegmentDistance {
    pub distance: f64,
    /// Parameter of the closest point on the first segment.
    pub t1: f64,
    /// Parameter of the closest point on the second segment.
    pub t2: f64,
}

impl LineSegment2 {
    pub fn new(start: Vec2, end: Vec2) -> Self {
        Self { start, end }
    }

    pub fn at(&self, t: f64) -> Vec2 {
        (1.0 - t) * self.start + t * self.end
    }

    pub fn length(&self) -> f64 {
        self.start.distance_to(&self.end)
    }

    pub fn is_degenerate(&self) -> bool {
        nearly_equal(&self.start, &self.end)
    }

    /// Distance from `z` to the segment and the minimizing parameter.
    pub fn distance_to_point(&self, z: &Vec2) -> (f64, f64) {
        if self.is_degenerate() {
            return (z.distance_to(&self.start), 0.0);
        }
        let v1 = *z - self.start;
        let v2 = self.end - self.start;
        let t = (v1.dot(&v2) / v2.dot(&v2)).clamp(0.0, 1.0);
        ((v1 - t * v2).length(), t)
    }

    /// Minimum distance between two segments and both minimizing parameters.
    pub fn distance_to_segment(&self, other: &Self) -> SegmentDistance {
        if self.is_degenerate() {
            let (distance, t) = other.distance_to_point(&self.start);
            return SegmentDistance { distance, t1: 0.0, t2: t };
        }
        if other.is_degenerate() {
            let (distance, t) = self.distance_to_point(&other.start);
            return SegmentDistance { distance, t1: t, t2: 0.0 };
        }

        let dz1 = self.end - self.start;
        let dz2 = other.end - other.start;
        let cross = dz1.cross(&dz2);
        if cross.abs() <= REL_TOL * dz1.length() * dz2.length() {
            return self.parallel_distance(other, &dz1);
        }

        // Solve start1 + t1 dz1 = start2 + t2 dz2 with Cramer's rule.
        let w = other.start - self.start;
        let t1 = w.cross(&dz2) / cross;
        let t2 = w.cross(&dz1) / cross;
        if (0.0..=1.0).contains(&t1) && (0.0..=1.0).contains(&t2) {
            return SegmentDistance { distance: 0.0, t1, t2 };
        }

        // No crossing: the minimum is attained at an endpoint of one of the segments.
        let candidates = [
            {
                let (d, t) = other.distance_to_point(&self.start);
                SegmentDistance { distance: d, t1: 0.0, t2: t }
            },
            {
                let (d, t) = other.distance_to_point(&self.end);
                SegmentDistance { distance: d, t1: 1.0, t2: t }
            },
            {
                let (d, t) = self.distance_to_point(&other.start);
                SegmentDistance { distance: d, t1: t, t2: 0.0 }
            },
            {
                let (d, t) = self.distance_to_point(&other.end);
                SegmentDistance { distance: d, t1: t, t2: 1.0 }
            },
        ];
        candidates
            .into_iter()
            .min_by(|a, b| a.distance.total_cmp(&b.distance))
            .unwrap_or(candidates[0])
    }

    fn parallel_distance(&self, other: &Self, dz1: &Vec2) -> SegmentDistance {
        let len2 = dz1.dot(dz1);
        let s1 = (other.start - self.start).dot(dz1) / len2;
        let s2 = (other.end - self.start).dot(dz1) / len2;
        if s1 <= 0.0 && s2 <= 0.0 {
            let (distance, t) = other.distance_to_point(&self.start);
            return SegmentDistance { distance, t1: 0.0, t2: t };
        }
        if s1 >= 1.0 && s2 >= 1.0 {
            let (distance, t) = other.distance_to_point(&self.end);
            return SegmentDistance { distance, t1: 1.0, t2: t };
        }
        if (0.0..=1.0).contains(&s1) {
            let (distance, t) = self.distance_to_point(&other.start);
            return SegmentDistance { distance, t1: t, t2: 0.0 };
        }
        if (0.0..=1.0).contains(&s2) {
            let (distance, t) = self.distance_to_point(&other.end);
            return SegmentDistance { distance, t1: t, t2: 1.0 };
        }
        // The other segment overhangs this one on both sides.
        let (distance, t) = other.distance_to_point(&self.start);
        SegmentDistance { distance, t1: 0.0, t2: t }
    }

    /// Whether the two segments touch or cross.
    pub fn touches(&self, other: &Self) -> bool {
        let d = self.distance_to_segment(other);
        nearly_equal(&self.at(d.t1), &other.at(d.t2))
    }

    /// Points where the circle `|z - center| = radius` crosses the segment,
    /// ordered along the segment.
    pub fn circle_intersections(&self, center: &Vec2, radius: f64) -> Vec<Vec2> {
        let d = self.end - self.start;
        let f = self.start - *center;
        let a = d.dot(&d);
        if a < ABS_TOL {
            return Vec::new();
        }
        let b = 2.0 * f.dot(&d);
        let c = f.dot(&f) - radius * radius;
        let disc = b * b - 4.0 * a * c;
        if disc < 0.0 {
            return Vec::new();
        }
        let root = disc.sqrt();
        let mut ts = vec![(-b - root) / (2.0 * a), (-b + root) / (2.0 * a)];
        ts.dedup_by(|x, y| (*x - *y).abs() < REL_TOL);
        ts.into_iter()
            .filter(|t| (0.0..=1.0).contains(t))
            .map(|t| self.at(t))
            .collect()
    }
}
