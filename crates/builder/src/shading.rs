//! Normal smoothing rules for the table parts.

use table_kernel::normals::DEFAULT_ANGLE_LIMIT;
use table_kernel::{Face, NormalRules, Vec3};

use crate::context::BuildContext;
use crate::parts::Part;

const FLAT_TOLERANCE: f64 = 1e-9;

/// Smoothing rules for one part group.
///
/// Slate faces cut flat by the rail box are artificial and never blend.
/// Horizontal faces and the planar parts (cushions, rail tops and sight
/// plates) keep their flat normals.
#[derive(Debug, Clone, Copy)]
pub struct TableShading {
    pub part: Part,
    /// Half extents of the rail box.
    pub rail_box: Vec3,
    pub angle_limit: f64,
}

impl TableShading {
    pub fn new(ctx: &BuildContext, part: Part) -> Self {
        Self {
            part,
            rail_box: ctx.rail_box(),
            angle_limit: DEFAULT_ANGLE_LIMIT,
        }
    }

    pub fn with_angle_limit(mut self, angle_limit: f64) -> Self {
        self.angle_limit = angle_limit;
        self
    }
}

impl NormalRules for TableShading {
    fn angle_limit(&self) -> f64 {
        self.angle_limit
    }

    fn is_cutoff(&self, face: &Face) -> bool {
        if self.part != Part::Slate {
            return false;
        }
        let c = face.centroid();
        (c.x.abs() - self.rail_box.x).abs() < FLAT_TOLERANCE
            || (c.y.abs() - self.rail_box.y).abs() < FLAT_TOLERANCE
    }

    fn force_flat(&self, face: &Face) -> bool {
        let n = face.normal();
        let horizontal = (n - Vec3::Z).length() < FLAT_TOLERANCE || (n + Vec3::Z).length() < FLAT_TOLERANCE;
        horizontal
            || self.is_cutoff(face)
            || matches!(self.part, Part::Cushions | Part::Rails | Part::RailSights)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::parts::build_parts;
    use crate::spec::Spec;
    use table_kernel::smooth_normals;

    #[test]
    fn test_slate_cutoff_faces_keep_flat_normals() {
        let ctx = BuildContext::new(&Spec::default()).unwrap();
        let rules = TableShading::new(&ctx, Part::Slate);
        let mut slate = build_parts(&ctx)
            .unwrap()
            .into_iter()
            .find(|p| p.part == Part::Slate)
            .unwrap()
            .mesh;
        smooth_normals(&mut slate, &rules, 1e-9);
        let mut cutoffs = 0;
        for face in slate.faces() {
            assert!(face.normals.iter().all(Option::is_some));
            if rules.is_cutoff(face) {
                cutoffs += 1;
                for n in &face.normals {
                    assert!(n.unwrap().distance_to(&face.normal()) < 1e-12);
                }
            }
        }
        // Two band triangles per ring step along each of the six box cuts.
        let slices = ctx.spec.slate_num_points.0;
        assert_eq!(cutoffs, 6 * 2 * (2 * slices - 1));
    }

    #[test]
    fn test_planar_parts_are_flat() {
        let ctx = BuildContext::new(&Spec::default()).unwrap();
        for part in [Part::Cushions, Part::Rails, Part::RailSights] {
            let rules = TableShading::new(&ctx, part);
            let face = Face::new(vec![Vec3::ZERO, Vec3::X, Vec3::new(0.0, 1.0, 1.0)]).unwrap();
            assert!(rules.force_flat(&face));
            assert!(!rules.is_cutoff(&face));
        }
        let liners = TableShading::new(&ctx, Part::Liners);
        let wall = Face::new(vec![Vec3::ZERO, Vec3::X, Vec3::new(1.0, 0.0, 1.0)]).unwrap();
        assert!(!liners.force_flat(&wall));
        let floor = Face::new(vec![Vec3::ZERO, Vec3::X, Vec3::Y]).unwrap();
        assert!(liners.force_flat(&floor));
    }
}
