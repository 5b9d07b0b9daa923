//! Search for a small canvas that holds every rectangle.

use rand::SeedableRng;
use rand_pcg::Pcg64;
use tracing::{debug, info, instrument};

use crate::maxrects::maxrects_pack;
use crate::sampler::CanvasSampler;
use crate::{PackError, PackerConfig, Packing, check_sizes};

/// Pack `sizes` into as small a canvas as the search can find.
///
/// The area bracket starts at `[max(Σ w·h, max_w·max_h), ∞)`. Each trial
/// tries `samples_per_area` canvas shapes at
/// `A = min(2·lo, (lo + hi) / 2)`: the first shape that packs closes the
/// bracket from above, and a trial with no success raises `lo` to `A`.
/// The same seed always gives the same packing.
#[instrument(skip(sizes, config), fields(count = sizes.len()))]
pub fn pack(sizes: &[(u32, u32)], config: &PackerConfig) -> Result<Packing, PackError> {
    check_sizes(sizes)?;
    let sampler = CanvasSampler::for_sizes(sizes);
    let total_area: f64 = sizes.iter().map(|&(w, h)| w as f64 * h as f64).sum();
    let min_canvas = sampler.min_width() as f64 * sampler.min_height() as f64;

    let mut rng = Pcg64::seed_from_u64(config.seed);
    let mut lo = total_area.max(min_canvas);
    let mut hi = f64::INFINITY;
    let mut best: Option<Packing> = None;
    let mut trials = 0;

    while hi > config.tolerance * lo {
        if trials >= config.max_trials {
            debug!(trials, lo, hi, "trial budget spent");
            break;
        }
        trials += 1;
        let area = (2.0 * lo).min(0.5 * (lo + hi));
        let canvases = sampler
            .sample(config.samples_per_area, area, &mut rng)
            .unwrap_or_default();

        let mut packed = None;
        for (width, height) in canvases {
            match maxrects_pack(width, height, sizes, config, &mut rng) {
                Ok(placements) => {
                    packed = Some(Packing {
                        width,
                        height,
                        placements,
                    });
                    break;
                }
                Err(PackError::DoesNotFit { .. }) => continue,
                Err(err) => return Err(err),
            }
        }

        match packed {
            Some(packing) => {
                debug!(area, width = packing.width, height = packing.height, "canvas packed");
                hi = area;
                best = Some(packing);
            }
            None => {
                debug!(area, "no canvas packed");
                lo = area;
            }
        }
    }

    let packing = best.ok_or(PackError::SearchExhausted { trials })?;
    info!(
        width = packing.width,
        height = packing.height,
        efficiency = packing.efficiency(),
        trials,
        "atlas packed"
    );
    Ok(packing)
}
