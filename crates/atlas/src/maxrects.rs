//! MAXRECTS bottom-left placement into a fixed canvas.
//!
//! Integer coordinates; a rectangle `(x, y, w, h)` covers the half-open
//! cells `x <= px < x + w`, `y <= py < y + h`.

use rand::Rng;
use tracing::trace;

use crate::{PackError, PackerConfig, Placement, check_sizes};

/// Growth factor over the cap that triggers cutting the free set back.
const CAP_SLACK: f64 = 1.25;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct FreeRect {
    pub x: u32,
    pub y: u32,
    pub width: u32,
    pub height: u32,
}

impl FreeRect {
    pub const fn new(x: u32, y: u32, width: u32, height: u32) -> Self {
        Self { x, y, width, height }
    }

    pub fn right(&self) -> u32 {
        self.x + self.width
    }

    pub fn bottom(&self) -> u32 {
        self.y + self.height
    }

    pub fn area(&self) -> u64 {
        self.width as u64 * self.height as u64
    }

    pub fn fits(&self, width: u32, height: u32) -> bool {
        width <= self.width && height <= self.height
    }

    pub fn contains(&self, other: &Self) -> bool {
        other.x >= self.x
            && other.y >= self.y
            && other.right() <= self.right()
            && other.bottom() <= self.bottom()
    }

    /// The closures of the two rectangles intersect; sharing only an edge
    /// or a corner counts.
    pub fn touches(&self, placed: &Placement) -> bool {
        self.x.max(placed.x) <= self.right().min(placed.right())
            && self.y.max(placed.y) <= self.bottom().min(placed.bottom())
    }

    /// Parts of `self` left, above, right and below `placed`.
    fn split(&self, placed: &Placement, out: &mut Vec<FreeRect>) {
        if placed.x > self.x {
            out.push(Self::new(self.x, self.y, self.width.min(placed.x - self.x), self.height));
        }
        if placed.y > self.y {
            out.push(Self::new(self.x, self.y, self.width, self.height.min(placed.y - self.y)));
        }
        if placed.right() < self.right() {
            let x = self.x.max(placed.right());
            out.push(Self::new(x, self.y, self.right() - x, self.height));
        }
        if placed.bottom() < self.bottom() {
            let y = self.y.max(placed.bottom());
            out.push(Self::new(self.x, y, self.width, self.bottom() - y));
        }
    }
}

/// The set of maximal free rectangles of a partially filled canvas.
#[derive(Debug, Clone, PartialEq)]
pub struct FreeRects {
    rects: Vec<FreeRect>,
    cap: usize,
}

impl FreeRects {
    pub fn new(width: u32, height: u32, cap: usize) -> Self {
        Self {
            rects: vec![FreeRect::new(0, 0, width, height)],
            cap,
        }
    }

    pub fn rects(&self) -> &[FreeRect] {
        &self.rects
    }

    pub fn len(&self) -> usize {
        self.rects.len()
    }

    pub fn is_empty(&self) -> bool {
        self.rects.is_empty()
    }

    /// Bottom-left choice: the fitting free rectangle with the smallest
    /// `x + y`, then the smallest `y`, then the smallest `x`.
    pub fn find_position(&self, width: u32, height: u32) -> Option<(u32, u32)> {
        self.rects
            .iter()
            .filter(|f| f.fits(width, height))
            .min_by_key(|f| (f.x as u64 + f.y as u64, f.y, f.x))
            .map(|f| (f.x, f.y))
    }

    /// Remove `placed` from the free space and restore maximality.
    pub fn occupy(&mut self, placed: &Placement) {
        let mut kept = Vec::with_capacity(self.rects.len() + 4);
        let mut pieces = Vec::new();
        for f in &self.rects {
            if f.touches(placed) {
                f.split(placed, &mut pieces);
            } else {
                kept.push(*f);
            }
        }

        // A piece inside another unflagged piece is not maximal. Flagging
        // keeps exactly one of two identical pieces.
        let mut removed = vec![false; pieces.len()];
        for k1 in 0..pieces.len() {
            let inside = (0..pieces.len())
                .any(|k2| k2 != k1 && !removed[k2] && pieces[k2].contains(&pieces[k1]));
            if inside {
                removed[k1] = true;
            } else {
                kept.push(pieces[k1]);
            }
        }
        self.rects = kept;
        self.enforce_cap();
    }

    fn enforce_cap(&mut self) {
        if (self.rects.len() as f64) < CAP_SLACK * self.cap as f64 {
            return;
        }
        self.rects.sort_by(|a, b| b.area().cmp(&a.area()));
        self.rects.truncate(self.cap);
        trace!(cap = self.cap, "free rectangle set truncated");
    }
}

/// Placement order: descending `max(w, h)`, each score scaled by
/// `1 + jitter * u` with `u` uniform in `[-1, 1]`. Stable for equal scores.
pub fn placement_order<R: Rng + ?Sized>(sizes: &[(u32, u32)], jitter: f64, rng: &mut R) -> Vec<usize> {
    let scores: Vec<f64> = sizes
        .iter()
        .map(|&(w, h)| {
            let u: f64 = if jitter > 0.0 { rng.random_range(-1.0..=1.0) } else { 0.0 };
            w.max(h) as f64 * (1.0 + jitter * u)
        })
        .collect();
    let mut order: Vec<usize> = (0..sizes.len()).collect();
    order.sort_by(|&a, &b| scores[b].total_cmp(&scores[a]));
    order
}

/// Pack `sizes` into a `width x height` canvas.
///
/// Placements come back in input order. Fails with
/// [`PackError::DoesNotFit`] naming the first rectangle that found no room.
pub fn maxrects_pack<R: Rng + ?Sized>(
    width: u32,
    height: u32,
    sizes: &[(u32, u32)],
    config: &PackerConfig,
    rng: &mut R,
) -> Result<Vec<Placement>, PackError> {
    check_sizes(sizes)?;
    let order = placement_order(sizes, config.jitter, rng);
    let mut free = FreeRects::new(width, height, config.free_rect_cap);
    let mut placements = vec![None; sizes.len()];

    for index in order {
        let (w, h) = sizes[index];
        let Some((x, y)) = free.find_position(w, h) else {
            return Err(PackError::DoesNotFit {
                index,
                width: w,
                height: h,
                canvas_width: width,
                canvas_height: height,
            });
        };
        let placed = Placement {
            x,
            y,
            width: w,
            height: h,
        };
        free.occupy(&placed);
        placements[index] = Some(placed);
    }

    // Every index appears once in the order, so every slot is filled.
    Ok(placements.into_iter().flatten().collect())
}
