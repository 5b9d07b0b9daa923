//! Property-based tests for spec handling and part construction using the
//! `proptest` crate.

use proptest::prelude::*;

use table_builder::BuildContext;
use table_builder::metadata::pocket_fall_corners;
use table_builder::parts::cushions::build_cushions;
use table_builder::spec::{INCH, Spec};
use table_kernel::mesh::audit::{Severity, audit};

// ---------------------------------------------------------------------------
// Strategy helpers
// ---------------------------------------------------------------------------

/// Tables between seven and ten foot with a range of rail widths and
/// pocket liner resolutions.
fn arb_spec() -> impl Strategy<Value = Spec> {
    (84.0f64..112.0, 4.0f64..6.0, 2usize..12).prop_map(|(length, rail, liner_points)| Spec {
        table_length: length * INCH,
        rail_width: rail * INCH,
        pocket_liner_num_points: liner_points,
        ..Spec::default()
    })
}

// ---------------------------------------------------------------------------
// 1. Spec tables survive JSON text
// ---------------------------------------------------------------------------

proptest! {
    #[test]
    fn spec_json_round_trip(spec in arb_spec()) {
        let text = serde_json::to_string(&spec.to_json()).unwrap();
        prop_assert_eq!(Spec::from_json(&text).unwrap(), spec);
    }
}

// ---------------------------------------------------------------------------
// 2. Scaled tables stay valid and build closed cushions
// ---------------------------------------------------------------------------

proptest! {
    #![proptest_config(ProptestConfig::with_cases(32))]

    #[test]
    fn scaled_tables_build_closed_cushions(spec in arb_spec()) {
        prop_assert!(spec.validate().is_ok());
        let ctx = BuildContext::new(&spec).unwrap();
        for (cushion, mesh) in build_cushions(&ctx).unwrap() {
            let report = audit(&mesh, 1e-9, Severity::Error);
            prop_assert!(report.is_watertight(), "{}: {}", cushion.name(), report);
        }
    }

    #[test]
    fn scaled_tables_keep_twelve_slate_corners(spec in arb_spec()) {
        let ctx = BuildContext::new(&spec).unwrap();
        let corners = pocket_fall_corners(&ctx).unwrap();
        prop_assert_eq!(corners.len(), 12);
        let rail = ctx.rail_box();
        for c in corners {
            prop_assert!(c.x.abs() <= rail.x + 1e-12 && c.y.abs() <= rail.y + 1e-12);
        }
    }
}
