//! Per-corner normal smoothing with an angle threshold and override rules.

use tracing::{info, instrument};

use crate::geometry::vector::Vec3;
use crate::mesh::{Face, Mesh};

/// Default smoothing threshold, 60 degrees.
pub const DEFAULT_ANGLE_LIMIT: f64 = std::f64::consts::FRAC_PI_3;

/// Domain rules consulted by [`smooth_normals`].
pub trait NormalRules {
    /// Faces whose flat normals differ by more than this never blend.
    fn angle_limit(&self) -> f64 {
        DEFAULT_ANGLE_LIMIT
    }

    /// Face lies on an artificial cutting plane and must not blend into
    /// its neighbors.
    fn is_cutoff(&self, _face: &Face) -> bool {
        false
    }

    /// Face keeps its flat normal regardless of smoothing.
    fn force_flat(&self, _face: &Face) -> bool {
        false
    }
}

/// Smooth everything with a fixed threshold, no cutoffs, no overrides.
#[derive(Debug, Clone, Copy)]
pub struct SmoothAll {
    pub angle_limit: f64,
}

impl Default for SmoothAll {
    fn default() -> Self {
        Self {
            angle_limit: DEFAULT_ANGLE_LIMIT,
        }
    }
}

impl NormalRules for SmoothAll {
    fn angle_limit(&self) -> f64 {
        self.angle_limit
    }
}

/// Fill every face corner's normal.
///
/// A corner normal is the normalized sum of the flat normals of the
/// non-cutoff faces around that vertex (the face itself included) whose
/// flat normal is within the angle limit of the face's own. With nothing
/// to average, or when `force_flat` holds, the flat normal is used.
#[instrument(skip(mesh, rules), fields(faces = mesh.len()))]
pub fn smooth_normals<R>(mesh: &mut Mesh, rules: &R, tol: f64)
where
    R: NormalRules + ?Sized,
{
    let cos_limit = rules.angle_limit().cos();
    let (normals, flat_faces) = {
        let topo = mesh.topology(tol);
        let faces = mesh.faces();
        let cutoff: Vec<bool> = faces.iter().map(|f| rules.is_cutoff(f)).collect();
        let mut flat_faces = 0usize;
        let normals: Vec<Vec<Vec3>> = faces
            .iter()
            .enumerate()
            .map(|(f, face)| {
                let n0 = face.normal();
                if rules.force_flat(face) {
                    flat_faces += 1;
                    return vec![n0; face.len()];
                }
                topo.face_vertices(f)
                    .iter()
                    .map(|&v| {
                        let sum = topo
                            .vertex_faces(v)
                            .iter()
                            .filter(|&&g| !cutoff[g])
                            .map(|&g| faces[g].normal())
                            .filter(|n| n.dot(&n0) > cos_limit)
                            .fold(Vec3::ZERO, |acc, n| acc + n);
                        sum.normalized().unwrap_or(n0)
                    })
                    .collect()
            })
            .collect();
        (normals, flat_faces)
    };

    for (face, corner_normals) in mesh.faces_mut().iter_mut().zip(normals) {
        face.normals = corner_normals.into_iter().map(Some).collect();
    }
    info!(flat_faces, "normals assigned");
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::mesh::tests::unit_cube;

    /// Two quads meeting at a shallow ridge along x = 1.
    fn ridge(angle: f64) -> Mesh {
        let h = angle.tan();
        Mesh::from_loops(vec![
            vec![
                Vec3::new(0.0, 0.0, 0.0),
                Vec3::new(1.0, 0.0, 0.0),
                Vec3::new(1.0, 1.0, 0.0),
                Vec3::new(0.0, 1.0, 0.0),
            ],
            vec![
                Vec3::new(1.0, 0.0, 0.0),
                Vec3::new(2.0, 0.0, h),
                Vec3::new(2.0, 1.0, h),
                Vec3::new(1.0, 1.0, 0.0),
            ],
        ])
        .unwrap()
    }

    #[test]
    fn test_cube_corners_stay_flat() {
        let mut cube = unit_cube();
        smooth_normals(&mut cube, &SmoothAll::default(), 1e-9);
        for face in cube.faces() {
            for n in &face.normals {
                approx::assert_abs_diff_eq!(n.unwrap(), face.normal(), epsilon = 1e-12);
            }
        }
    }

    #[test]
    fn test_shallow_ridge_is_blended() {
        let mut mesh = ridge(0.2);
        smooth_normals(&mut mesh, &SmoothAll::default(), 1e-9);
        let left = &mesh.faces()[0];
        let right = &mesh.faces()[1];
        let expected = (left.normal() + right.normal()).normalized().unwrap();
        // Corners on the ridge share the blended normal.
        approx::assert_abs_diff_eq!(left.normals[1].unwrap(), expected, epsilon = 1e-12);
        approx::assert_abs_diff_eq!(right.normals[0].unwrap(), expected, epsilon = 1e-12);
        // Corners away from the ridge keep the flat normal.
        approx::assert_abs_diff_eq!(left.normals[0].unwrap(), left.normal(), epsilon = 1e-12);
    }

    struct CutRight;

    impl NormalRules for CutRight {
        fn is_cutoff(&self, face: &Face) -> bool {
            face.centroid().x > 1.0
        }
        fn force_flat(&self, face: &Face) -> bool {
            self.is_cutoff(face)
        }
    }

    #[test]
    fn test_cutoff_faces_never_blend() {
        let mut mesh = ridge(0.2);
        smooth_normals(&mut mesh, &CutRight, 1e-9);
        for face in mesh.faces() {
            for n in &face.normals {
                approx::assert_abs_diff_eq!(n.unwrap(), face.normal(), epsilon = 1e-12);
            }
        }
    }

    #[test]
    fn test_steep_ridge_is_not_blended() {
        let mut mesh = ridge(1.2);
        smooth_normals(&mut mesh, &SmoothAll::default(), 1e-9);
        let left = &mesh.faces()[0];
        approx::assert_abs_diff_eq!(left.normals[1].unwrap(), left.normal(), epsilon = 1e-12);
    }
}
