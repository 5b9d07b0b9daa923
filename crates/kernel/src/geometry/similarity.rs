use nalgebra::Complex;

use super::GeometryError;
use super::vector::Vec2;

/// Planar similarity `w = a * z + b` over complex numbers: uniform scale,
/// rotation and translation, orientation preserving.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Similarity2 {
    a: Complex<f64>,
    b: Complex<f64>,
}

fn to_complex(v: &Vec2) -> Complex<f64> {
    Complex::new(v.x, v.y)
}

impl Similarity2 {
    pub fn identity() -> Self {
        Self {
            a: Complex::new(1.0, 0.0),
            b: Complex::new(0.0, 0.0),
        }
    }

    /// The unique similarity sending `z1 -> w1` and `z2 -> w2`.
    pub fn from_pairs(z1: &Vec2, z2: &Vec2, w1: &Vec2, w2: &Vec2) -> Result<Self, GeometryError> {
        let dz = to_complex(z2) - to_complex(z1);
        if dz.norm() < 1e-15 {
            return Err(GeometryError::DegenerateCorrespondence);
        }
        let a = (to_complex(w2) - to_complex(w1)) / dz;
        let b = to_complex(w1) - a * to_complex(z1);
        Ok(Self { a, b })
    }

    pub fn apply(&self, z: &Vec2) -> Vec2 {
        let w = self.a * to_complex(z) + self.b;
        Vec2::new(w.re, w.im)
    }

    pub fn scale(&self) -> f64 {
        self.a.norm()
    }

    pub fn rotation(&self) -> f64 {
        self.a.arg()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_maps_both_pairs() {
        let z1 = Vec2::new(0.0, 0.0);
        let z2 = Vec2::new(1.0, 0.0);
        let w1 = Vec2::new(2.0, 3.0);
        let w2 = Vec2::new(2.0, 5.0);
        let s = Similarity2::from_pairs(&z1, &z2, &w1, &w2).unwrap();
        approx::assert_abs_diff_eq!(s.apply(&z1), w1, epsilon = 1e-12);
        approx::assert_abs_diff_eq!(s.apply(&z2), w2, epsilon = 1e-12);
        assert!((s.scale() - 2.0).abs() < 1e-12);
        assert!((s.rotation() - std::f64::consts::FRAC_PI_2).abs() < 1e-12);
        // Third point follows the same rotation and scale.
        approx::assert_abs_diff_eq!(s.apply(&Vec2::new(0.0, 1.0)), Vec2::new(0.0, 3.0), epsilon = 1e-12);
    }

    #[test]
    fn test_coincident_sources_rejected() {
        let z = Vec2::new(1.0, 1.0);
        assert_eq!(
            Similarity2::from_pairs(&z, &z, &Vec2::ZERO, &Vec2::new(1.0, 0.0)),
            Err(GeometryError::DegenerateCorrespondence)
        );
    }
}
