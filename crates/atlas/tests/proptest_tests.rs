//! Property-based tests for the packer using the `proptest` crate.

use proptest::prelude::*;
use rand::SeedableRng;
use rand_pcg::Pcg64;

use table_atlas::{PackError, PackerConfig, maxrects_pack, pack};

// ---------------------------------------------------------------------------
// Strategy helpers
// ---------------------------------------------------------------------------

fn arb_sizes(max_count: usize) -> impl Strategy<Value = Vec<(u32, u32)>> {
    proptest::collection::vec((1u32..40, 1u32..40), 1..max_count)
}

// ---------------------------------------------------------------------------
// 1. Fixed canvas: placements are disjoint and inside, or the packer says why not
// ---------------------------------------------------------------------------

proptest! {
    #[test]
    fn fixed_canvas_placements_are_disjoint(
        sizes in arb_sizes(30),
        width in 40u32..120,
        height in 40u32..120,
        seed in any::<u64>(),
    ) {
        let mut rng = Pcg64::seed_from_u64(seed);
        match maxrects_pack(width, height, &sizes, &PackerConfig::default(), &mut rng) {
            Ok(placements) => {
                prop_assert_eq!(placements.len(), sizes.len());
                for (k, p) in placements.iter().enumerate() {
                    prop_assert_eq!((p.width, p.height), sizes[k]);
                    prop_assert!(p.right() <= width && p.bottom() <= height);
                    for q in &placements[k + 1..] {
                        prop_assert!(!p.overlaps(q), "{:?} overlaps {:?}", p, q);
                    }
                }
            }
            Err(PackError::DoesNotFit { index, .. }) => prop_assert!(index < sizes.len()),
            Err(other) => prop_assert!(false, "unexpected error {:?}", other),
        }
    }
}

// ---------------------------------------------------------------------------
// 2. Canvas search always succeeds and never goes below the area bound
// ---------------------------------------------------------------------------

proptest! {
    #![proptest_config(ProptestConfig::with_cases(24))]

    #[test]
    fn search_finds_valid_canvas(sizes in arb_sizes(20), seed in any::<u64>()) {
        let config = PackerConfig { seed, ..PackerConfig::coarse() };
        let packing = pack(&sizes, &config).unwrap();
        prop_assert!(packing.is_valid());
        let total: u64 = sizes.iter().map(|&(w, h)| w as u64 * h as u64).sum();
        prop_assert!(packing.width as u64 * packing.height as u64 >= total);
        prop_assert!(packing.efficiency() <= 1.0);
    }
}
