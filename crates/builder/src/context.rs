//! Points and planes shared by the part builders.
//!
//! Naming follows the table seen from above, long side along x:
//!
//! ```text
//! 1 A 2 B 3
//! F       C
//! 6 E 5 D 4
//! ```
//!
//! Pockets are numbered 1 to 6, cushions lettered A to F. Cushion nose
//! points are named by cushion and pocket, so `B3` is where cushion B ends
//! at pocket 3.

use std::f64::consts::FRAC_1_SQRT_2;

use serde::{Deserialize, Serialize};
use tracing::{debug, instrument};

use table_kernel::{GeometryError, Plane, Vec3};

use crate::spec::{PocketKind, Spec};

/// Pocket numbers in order.
pub const POCKETS: [usize; 6] = [1, 2, 3, 4, 5, 6];

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub enum Cushion {
    A,
    B,
    C,
    D,
    E,
    F,
}

impl Cushion {
    pub const ALL: [Cushion; 6] = [Self::A, Self::B, Self::C, Self::D, Self::E, Self::F];

    pub fn name(self) -> &'static str {
        match self {
            Self::A => "A",
            Self::B => "B",
            Self::C => "C",
            Self::D => "D",
            Self::E => "E",
            Self::F => "F",
        }
    }

    /// Pockets at the first and second end.
    pub fn pockets(self) -> (usize, usize) {
        let k = self as usize;
        (k + 1, (k + 1) % 6 + 1)
    }

    /// Horizontal direction from the playing field towards the rail.
    pub fn outward(self) -> Vec3 {
        match self {
            Self::A | Self::B => Vec3::Y,
            Self::C => Vec3::X,
            Self::D | Self::E => -Vec3::Y,
            Self::F => -Vec3::X,
        }
    }
}

/// The seven planes bounding a cushion.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum CushionPlane {
    End1,
    End2,
    RailBack,
    RailTop,
    RubberTop,
    RubberBottom,
    Slate,
}

impl CushionPlane {
    pub const ALL: [CushionPlane; 7] = [
        Self::End1,
        Self::End2,
        Self::RailBack,
        Self::RailTop,
        Self::RubberTop,
        Self::RubberBottom,
        Self::Slate,
    ];
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct CushionPlanes {
    pub end1: Plane,
    pub end2: Plane,
    pub rail_back: Plane,
    pub rail_top: Plane,
    pub rubber_top: Plane,
    pub rubber_bottom: Plane,
    pub slate: Plane,
}

impl CushionPlanes {
    pub fn get(&self, which: CushionPlane) -> &Plane {
        match which {
            CushionPlane::End1 => &self.end1,
            CushionPlane::End2 => &self.end2,
            CushionPlane::RailBack => &self.rail_back,
            CushionPlane::RailTop => &self.rail_top,
            CushionPlane::RubberTop => &self.rubber_top,
            CushionPlane::RubberBottom => &self.rubber_bottom,
            CushionPlane::Slate => &self.slate,
        }
    }

    /// Planes walked around the cushion profile, closing back on the first.
    pub fn profile(&self) -> [Plane; 5] {
        [
            self.rail_back,
            self.rail_top,
            self.rubber_top,
            self.rubber_bottom,
            self.slate,
        ]
    }
}

/// Cut of one cushion end: horizontal and vertical pocket angles.
#[derive(Debug, Clone, Copy, PartialEq)]
struct EndCut {
    horizontal: f64,
    vertical: f64,
}

/// Everything derived once from a [`Spec`].
#[derive(Debug, Clone)]
pub struct BuildContext {
    pub spec: Spec,
    noses: [(Vec3, Vec3); 6],
    mouth_centers: [Vec3; 6],
    pocket_normals: [Vec3; 6],
    fall_centers: [Vec3; 6],
    liner_centers: [Vec3; 6],
    bisectors: [Plane; 6],
    cushions: [CushionPlanes; 6],
}

impl BuildContext {
    #[instrument(skip(spec))]
    pub fn new(spec: &Spec) -> Result<Self, GeometryError> {
        let l = spec.table_length;
        let h = spec.cushion_nose_height();
        let cm = spec.corner_pocket.mouth * FRAC_1_SQRT_2;
        let sm = 0.5 * spec.side_pocket.mouth;

        let noses = [
            (Vec3::new(cm - l / 2.0, l / 4.0, h), Vec3::new(-sm, l / 4.0, h)),
            (Vec3::new(sm, l / 4.0, h), Vec3::new(l / 2.0 - cm, l / 4.0, h)),
            (Vec3::new(l / 2.0, l / 4.0 - cm, h), Vec3::new(l / 2.0, cm - l / 4.0, h)),
            (Vec3::new(l / 2.0 - cm, -l / 4.0, h), Vec3::new(sm, -l / 4.0, h)),
            (Vec3::new(-sm, -l / 4.0, h), Vec3::new(cm - l / 2.0, -l / 4.0, h)),
            (Vec3::new(-l / 2.0, cm - l / 4.0, h), Vec3::new(-l / 2.0, l / 4.0 - cm, h)),
        ];

        // Pocket k sits between the second nose of the cushion before it and
        // the first nose of the cushion after it.
        let mouth_centers: [Vec3; 6] = std::array::from_fn(|k| {
            let before = noses[(k + 5) % 6].1;
            let after = noses[k].0;
            (before + after) * 0.5
        });
        let diagonal = |x: f64, y: f64| Vec3::new(x * FRAC_1_SQRT_2, y * FRAC_1_SQRT_2, 0.0);
        let pocket_normals = [
            diagonal(-1.0, 1.0),
            Vec3::Y,
            diagonal(1.0, 1.0),
            diagonal(1.0, -1.0),
            -Vec3::Y,
            diagonal(-1.0, -1.0),
        ];

        let along_normal = |k: usize, distance: f64| mouth_centers[k].with_z(0.0) + pocket_normals[k] * distance;
        let fall_centers: [Vec3; 6] = std::array::from_fn(|k| {
            let pocket = spec.pocket(PocketKind::of(k + 1));
            along_normal(k, pocket.radius + pocket.shelf)
        });
        let liner_centers: [Vec3; 6] = std::array::from_fn(|k| {
            let pocket = spec.pocket(PocketKind::of(k + 1));
            along_normal(k, pocket.liner_depth_offset + pocket.shelf + pocket.radius)
        });

        let mut bisectors = [Plane::yz(); 6];
        for k in 0..6 {
            let base = mouth_centers[k];
            bisectors[k] = Plane::from_points(base, base + pocket_normals[k], base + Vec3::Z)?;
        }

        let end_cut = |pocket: usize| {
            let p = spec.pocket(PocketKind::of(pocket));
            EndCut {
                horizontal: p.horizontal_angle,
                vertical: p.vertical_angle,
            }
        };
        let mut cushions = Vec::with_capacity(6);
        for cushion in Cushion::ALL {
            let (p1, p2) = noses[cushion as usize];
            let (first, second) = cushion.pockets();
            cushions.push(cushion_planes(
                spec,
                p1,
                p2,
                cushion.outward(),
                end_cut(first),
                end_cut(second),
            )?);
        }
        let cushions: [CushionPlanes; 6] = std::array::from_fn(|k| cushions[k]);

        debug!(rail_height = spec.rail_height(), "build context ready");
        Ok(Self {
            spec: spec.clone(),
            noses,
            mouth_centers,
            pocket_normals,
            fall_centers,
            liner_centers,
            bisectors,
            cushions,
        })
    }

    /// The two nose points of a cushion, first end first.
    pub fn noses(&self, cushion: Cushion) -> (Vec3, Vec3) {
        self.noses[cushion as usize]
    }

    /// Midpoint of the two cushion noses at a pocket, at nose height.
    pub fn mouth_center(&self, pocket: usize) -> Vec3 {
        self.mouth_centers[pocket - 1]
    }

    /// Horizontal unit vector pointing from the table into the pocket.
    pub fn pocket_normal(&self, pocket: usize) -> Vec3 {
        self.pocket_normals[pocket - 1]
    }

    /// Centre of the disc the pocket cuts into the bed, at `z = 0`.
    pub fn fall_center(&self, pocket: usize) -> Vec3 {
        self.fall_centers[pocket - 1]
    }

    pub fn fall_radius(&self, pocket: usize) -> f64 {
        self.spec.pocket(PocketKind::of(pocket)).radius
    }

    /// Centre of the circle the pocket liner follows, at `z = 0`.
    pub fn liner_center(&self, pocket: usize) -> Vec3 {
        self.liner_centers[pocket - 1]
    }

    /// Vertical plane through the mouth centre along the pocket normal.
    pub fn bisector(&self, pocket: usize) -> &Plane {
        &self.bisectors[pocket - 1]
    }

    pub fn cushion(&self, cushion: Cushion) -> &CushionPlanes {
        &self.cushions[cushion as usize]
    }

    /// Half extents of the box bounded by the rail backs, and the rail height.
    pub fn rail_box(&self) -> Vec3 {
        let spec = &self.spec;
        Vec3::new(
            spec.table_length / 2.0 + spec.cushion_width,
            spec.table_length / 4.0 + spec.cushion_width,
            spec.rail_height(),
        )
    }
}

fn cushion_planes(
    spec: &Spec,
    p1: Vec3,
    p2: Vec3,
    outward: Vec3,
    end1: EndCut,
    end2: EndCut,
) -> Result<CushionPlanes, GeometryError> {
    let along = (p2 - p1).normalized().ok_or(GeometryError::DegenerateNormal)?;
    let slope = spec.cushion_slope();
    let bed = spec.cushion_bed_angle();

    let rubber_top = Plane::from_points(p1, p2, p1 + Vec3::Z * slope.sin() + outward * slope.cos())?;
    let rubber_bottom = Plane::from_points(p1, p2, p1 + Vec3::Z * bed.sin() - outward * bed.cos())?;
    let back = p1 + outward * spec.cushion_width;
    let rail_back = Plane::from_points(back, back + along, back + Vec3::Z)?;

    // End planes are tilted from the vertical by the pocket's vertical cut,
    // leaning away from the cushion.
    let q = outward * end1.horizontal.sin() + along * end1.horizontal.cos();
    let v = q.cross(&Vec3::Z).normalized().ok_or(GeometryError::DegenerateNormal)?;
    let q2 = Vec3::Z * end1.vertical.cos() - v * end1.vertical.sin();
    let end1 = Plane::from_points(p1, p1 + q, p1 + q2)?;

    let q = outward * end2.horizontal.sin() - along * end2.horizontal.cos();
    let v = q.cross(&Vec3::Z).normalized().ok_or(GeometryError::DegenerateNormal)?;
    let q2 = Vec3::Z * end2.vertical.cos() + v * end2.vertical.sin();
    let end2 = Plane::from_points(p2, p2 + q, p2 + q2)?;

    Ok(CushionPlanes {
        end1,
        end2,
        rail_back,
        rail_top: Plane::horizontal(spec.rail_height()),
        rubber_top,
        rubber_bottom,
        slate: Plane::horizontal(0.0),
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_abs_diff_eq;

    fn context() -> BuildContext {
        BuildContext::new(&Spec::default()).unwrap()
    }

    #[test]
    fn test_cushion_pockets_wrap_around() {
        assert_eq!(Cushion::A.pockets(), (1, 2));
        assert_eq!(Cushion::C.pockets(), (3, 4));
        assert_eq!(Cushion::F.pockets(), (6, 1));
    }

    #[test]
    fn test_mouths_and_falls_are_mirror_symmetric() {
        let ctx = context();
        let yz = Plane::yz();
        let xz = Plane::xz();
        assert_abs_diff_eq!(ctx.mouth_center(1), yz.reflect(&ctx.mouth_center(3)), epsilon = 1e-12);
        assert_abs_diff_eq!(ctx.fall_center(4), xz.reflect(&ctx.fall_center(3)), epsilon = 1e-12);
        assert_abs_diff_eq!(ctx.fall_center(5), xz.reflect(&ctx.fall_center(2)), epsilon = 1e-12);
        assert_abs_diff_eq!(ctx.mouth_center(2).x, 0.0, epsilon = 1e-12);
    }

    #[test]
    fn test_fall_centers_match_validation() {
        let spec = Spec::default();
        let ctx = context();
        assert_abs_diff_eq!(ctx.fall_center(3).x, spec.corner_fall_center_x(), epsilon = 1e-12);
        assert_abs_diff_eq!(ctx.fall_center(2).y, spec.side_fall_center_y(), epsilon = 1e-12);
        assert_eq!(ctx.fall_center(3).z, 0.0);
    }

    #[test]
    fn test_bisector_contains_pocket_axis() {
        let ctx = context();
        for pocket in POCKETS {
            let b = ctx.bisector(pocket);
            let m = ctx.mouth_center(pocket);
            assert!(b.contains(&m, 1e-12));
            assert!(b.contains(&(m + ctx.pocket_normal(pocket)), 1e-12));
            assert!(b.contains(&ctx.fall_center(pocket), 1e-12));
        }
    }

    #[test]
    fn test_cushion_planes_pass_through_noses() {
        let ctx = context();
        for cushion in Cushion::ALL {
            let (p1, p2) = ctx.noses(cushion);
            let planes = ctx.cushion(cushion);
            assert!(planes.end1.contains(&p1, 1e-12));
            assert!(planes.end2.contains(&p2, 1e-12));
            assert!(planes.rubber_top.contains(&p1, 1e-12));
            assert!(planes.rubber_bottom.contains(&p2, 1e-12));
            // Rail back sits one cushion width behind the nose line.
            assert_abs_diff_eq!(planes.rail_back.distance(&p1), ctx.spec.cushion_width, epsilon = 1e-12);
        }
    }

    #[test]
    fn test_rail_box() {
        let ctx = context();
        let b = ctx.rail_box();
        assert_abs_diff_eq!(b.x, 2.0 * b.y - ctx.spec.cushion_width, epsilon = 1e-12);
        assert_eq!(b.z, ctx.spec.rail_height());
    }
}
