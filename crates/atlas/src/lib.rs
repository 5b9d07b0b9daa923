//! Rectangle packing for texture atlases.
//!
//! [`maxrects`] places fixed-orientation rectangles into a given canvas with
//! the MAXRECTS bottom-left heuristic; [`search`] looks for a small canvas
//! by sampling canvas shapes over a shrinking range of areas.

pub mod maxrects;
pub mod sampler;
pub mod search;

use serde::{Deserialize, Serialize};
use thiserror::Error;

pub use maxrects::{FreeRect, FreeRects, maxrects_pack};
pub use search::pack;

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum PackError {
    #[error("nothing to pack")]
    Empty,
    #[error("rectangle {index} has zero size ({width}x{height})")]
    DegenerateRectangle { index: usize, width: u32, height: u32 },
    #[error("rectangle {index} ({width}x{height}) does not fit in the {canvas_width}x{canvas_height} canvas")]
    DoesNotFit {
        index: usize,
        width: u32,
        height: u32,
        canvas_width: u32,
        canvas_height: u32,
    },
    #[error("no canvas found after {trials} area trials")]
    SearchExhausted { trials: usize },
}

/// Tuning for the packer and the canvas search.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct PackerConfig {
    /// Relative jitter on the sort score; zero keeps the plain descending order.
    pub jitter: f64,
    pub seed: u64,
    /// Free-rectangle set is cut back to this many once it grows past
    /// `1.25 * free_rect_cap`.
    pub free_rect_cap: usize,
    /// Canvas shapes tried per area before the area is declared too small.
    pub samples_per_area: usize,
    /// Search stops once the upper area bound is within this factor of the lower.
    pub tolerance: f64,
    pub max_trials: usize,
}

impl Default for PackerConfig {
    fn default() -> Self {
        Self {
            jitter: 0.1,
            seed: 0,
            free_rect_cap: 3000,
            samples_per_area: 8,
            tolerance: 1.0001,
            max_trials: 64,
        }
    }
}

impl PackerConfig {
    /// Plain descending order, no randomness in the placement order.
    pub fn deterministic() -> Self {
        Self {
            jitter: 0.0,
            ..Self::default()
        }
    }

    /// Cheaper search for previews and tests.
    pub fn coarse() -> Self {
        Self {
            samples_per_area: 4,
            tolerance: 1.01,
            ..Self::default()
        }
    }
}

/// Position of one input rectangle.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Placement {
    pub x: u32,
    pub y: u32,
    pub width: u32,
    pub height: u32,
}

impl Placement {
    pub fn right(&self) -> u32 {
        self.x + self.width
    }

    pub fn bottom(&self) -> u32 {
        self.y + self.height
    }

    /// Half-open interiors overlap.
    pub fn overlaps(&self, other: &Self) -> bool {
        self.x < other.right() && other.x < self.right() && self.y < other.bottom() && other.y < self.bottom()
    }
}

/// A successful packing: canvas size and placements in input order.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Packing {
    pub width: u32,
    pub height: u32,
    pub placements: Vec<Placement>,
}

impl Packing {
    /// Fraction of the canvas covered by rectangles.
    pub fn efficiency(&self) -> f64 {
        let used: u64 = self
            .placements
            .iter()
            .map(|p| p.width as u64 * p.height as u64)
            .sum();
        used as f64 / (self.width as u64 * self.height as u64).max(1) as f64
    }

    /// Every placement lies inside the canvas and no two overlap.
    pub fn is_valid(&self) -> bool {
        let inside = self
            .placements
            .iter()
            .all(|p| p.right() <= self.width && p.bottom() <= self.height);
        let disjoint = self.placements.iter().enumerate().all(|(i, a)| {
            self.placements[i + 1..].iter().all(|b| !a.overlaps(b))
        });
        inside && disjoint
    }
}

/// Reject empty input and zero-sized rectangles.
pub(crate) fn check_sizes(sizes: &[(u32, u32)]) -> Result<(), PackError> {
    if sizes.is_empty() {
        return Err(PackError::Empty);
    }
    for (index, &(width, height)) in sizes.iter().enumerate() {
        if width == 0 || height == 0 {
            return Err(PackError::DegenerateRectangle { index, width, height });
        }
    }
    Ok(())
}
