//! Table metadata for the application placing balls and decals on the
//! model: the rail box, pocket fall circles, slate corners and sights.

use std::collections::BTreeMap;

use serde::Serialize;
use tracing::instrument;

use table_kernel::geometry::plane::reflect_through;
use table_kernel::geometry::segment::LineSegment2;
use table_kernel::{Plane, Vec2, Vec3};

use crate::context::{BuildContext, POCKETS};
use crate::errors::BuildError;

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct PocketFall {
    pub pocket: usize,
    pub center: [f64; 3],
    pub radius: f64,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct TableMetadata {
    /// Every table constant, derived ones included, with comments.
    pub specs: serde_json::Value,
    /// Half extents of the box between the rail backs, and the rail height.
    pub railbox: [f64; 3],
    pub pocket_falls: Vec<PocketFall>,
    /// Points where the pocket fall circles cross the rail box edges.
    pub pocket_fall_corners: Vec<[f64; 2]>,
    /// Sight centres on the rail top, three per cushion.
    pub sights: BTreeMap<String, Vec<[f64; 3]>>,
}

impl TableMetadata {
    pub fn to_json(&self) -> Result<serde_json::Value, serde_json::Error> {
        serde_json::to_value(self)
    }
}

/// Crossings of the pocket fall circles with the rail box, pockets in
/// order and box edges walked from the top left corner clockwise.
pub fn pocket_fall_corners(ctx: &BuildContext) -> Result<Vec<Vec2>, BuildError> {
    let rail = ctx.rail_box();
    let corners = [
        Vec2::new(-rail.x, rail.y),
        Vec2::new(rail.x, rail.y),
        Vec2::new(rail.x, -rail.y),
        Vec2::new(-rail.x, -rail.y),
    ];
    let edges: Vec<LineSegment2> = (0..4)
        .map(|k| LineSegment2::new(corners[k], corners[(k + 1) % 4]))
        .collect();

    let mut found = Vec::new();
    for pocket in POCKETS {
        let center = ctx.fall_center(pocket).xy();
        for edge in &edges {
            found.extend(edge.circle_intersections(&center, ctx.fall_radius(pocket)));
        }
    }
    if found.len() != 12 {
        return Err(BuildError::PocketCorners { found: found.len() });
    }
    Ok(found)
}

/// Sights sit at the quarter points of each cushion, `TABLE_SIGHTS_DEPTH`
/// behind the nose line.
pub fn sights(ctx: &BuildContext) -> BTreeMap<String, Vec<Vec3>> {
    let spec = &ctx.spec;
    let x0 = spec.table_length / 2.0;
    let y0 = spec.table_length / 4.0;
    let h0 = spec.rail_height();
    let depth = spec.sights_depth;

    let long: Vec<Vec3> = (1..4)
        .map(|k| Vec3::new(x0 * k as f64 / 4.0, y0 + depth, h0))
        .collect();
    let short: Vec<Vec3> = (1..4)
        .map(|k| Vec3::new(x0 + depth, y0 - 2.0 * y0 * k as f64 / 4.0, h0))
        .collect();
    let (yz, xz) = (Plane::yz(), Plane::xz());

    let mut sights = BTreeMap::new();
    sights.insert("A".to_string(), yz.reflect_reversed(&long));
    sights.insert("B".to_string(), long.clone());
    sights.insert("C".to_string(), short.clone());
    sights.insert("D".to_string(), xz.reflect_reversed(&long));
    sights.insert("E".to_string(), reflect_through(&[yz, xz], &long));
    sights.insert("F".to_string(), yz.reflect_reversed(&short));
    sights
}

#[instrument(skip(ctx))]
pub fn table_metadata(ctx: &BuildContext) -> Result<TableMetadata, BuildError> {
    let pocket_falls = POCKETS
        .into_iter()
        .map(|pocket| PocketFall {
            pocket,
            center: ctx.fall_center(pocket).to_array(),
            radius: ctx.fall_radius(pocket),
        })
        .collect();
    let corners = pocket_fall_corners(ctx)?;
    Ok(TableMetadata {
        specs: ctx.spec.to_json(),
        railbox: ctx.rail_box().to_array(),
        pocket_falls,
        pocket_fall_corners: corners.iter().map(|c| [c.x, c.y]).collect(),
        sights: sights(ctx)
            .into_iter()
            .map(|(cushion, points)| (cushion, points.iter().map(Vec3::to_array).collect()))
            .collect(),
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::spec::Spec;

    fn context() -> BuildContext {
        BuildContext::new(&Spec::default()).unwrap()
    }

    #[test]
    fn test_twelve_slate_corners_on_the_box() {
        let ctx = context();
        let rail = ctx.rail_box();
        let corners = pocket_fall_corners(&ctx).unwrap();
        assert_eq!(corners.len(), 12);
        for c in &corners {
            let on_x = (c.x.abs() - rail.x).abs() < 1e-12;
            let on_y = (c.y.abs() - rail.y).abs() < 1e-12;
            assert!(on_x || on_y, "{c:?}");
        }
    }

    #[test]
    fn test_sights_are_mirrored() {
        let ctx = context();
        let sights = sights(&ctx);
        assert_eq!(sights.len(), 6);
        let b = &sights["B"];
        let e = &sights["E"];
        for (p, q) in b.iter().zip(e) {
            assert!((*p + *q).xy().length() < 1e-12);
        }
        // The middle sight of the short rail sits on the long axis.
        assert!(sights["C"][1].y.abs() < 1e-12);
        assert!(sights["F"][1].y.abs() < 1e-12);
    }

    #[test]
    fn test_metadata_json_shape() {
        let ctx = context();
        let json = table_metadata(&ctx).unwrap().to_json().unwrap();
        assert_eq!(json["pocket_falls"].as_array().unwrap().len(), 6);
        assert_eq!(json["pocket_fall_corners"].as_array().unwrap().len(), 12);
        assert!(json["specs"]["TABLE_LENGTH"].is_number());
        assert_eq!(json["sights"]["A"].as_array().unwrap().len(), 3);
    }
}
