//! Canvas shapes of a given area.
//!
//! A canvas `(W, H)` with `W * H = A` is the point at angle `θ` on the
//! hyperbola, `W = r cos θ`, `H = r sin θ`. Angles are drawn through a
//! triangular density on `[-1, 1]` that peaks at the preferred aspect.

use std::f64::consts::FRAC_PI_2;

use rand::Rng;

/// Half-width of the noise around the preferred angle.
const BIAS_NOISE: f64 = 0.1;

/// CDF of the triangular density `1 - |t|` on `[-1, 1]`.
pub fn cdf(t: f64) -> f64 {
    if t >= 0.0 {
        0.5 + t - 0.5 * t * t
    } else {
        0.5 + t + 0.5 * t * t
    }
}

/// Inverse of [`cdf`] on `[0, 1]`.
pub fn inverse_cdf(y: f64) -> f64 {
    if y >= 0.5 {
        1.0 - (2.0 - 2.0 * y).max(0.0).sqrt()
    } else {
        -1.0 + (2.0 * y).max(0.0).sqrt()
    }
}

/// `n` draws from the triangular density restricted to `[a, b]`.
pub fn normalized_samples<R: Rng + ?Sized>(n: usize, a: f64, b: f64, rng: &mut R) -> Vec<f64> {
    let (lo, hi) = (cdf(a), cdf(b));
    (0..n)
        .map(|_| inverse_cdf(lo + (hi - lo) * rng.random::<f64>()))
        .collect()
}

/// Draws canvases of a requested area no smaller than the largest rectangle.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct CanvasSampler {
    min_width: u32,
    min_height: u32,
    /// Preferred canvas angle; `π/4` is square.
    bias: f64,
}

impl CanvasSampler {
    /// Sampler for `sizes`: minimum extents are the largest width and
    /// height, and the preferred angle is `atan2(Σh, Σw)`.
    pub fn for_sizes(sizes: &[(u32, u32)]) -> Self {
        let min_width = sizes.iter().map(|s| s.0).max().unwrap_or(1);
        let min_height = sizes.iter().map(|s| s.1).max().unwrap_or(1);
        let sum_w: f64 = sizes.iter().map(|s| s.0 as f64).sum();
        let sum_h: f64 = sizes.iter().map(|s| s.1 as f64).sum();
        let bias = if sum_w > 0.0 && sum_h > 0.0 {
            sum_h.atan2(sum_w)
        } else {
            FRAC_PI_2 / 2.0
        };
        Self {
            min_width,
            min_height,
            bias,
        }
    }

    pub fn min_width(&self) -> u32 {
        self.min_width
    }

    pub fn min_height(&self) -> u32 {
        self.min_height
    }

    pub fn bias(&self) -> f64 {
        self.bias
    }

    /// Angle range whose canvases of area `area` keep both minimum extents.
    pub fn angle_range(&self, area: f64) -> Option<(f64, f64)> {
        let (w0, h0) = (self.min_width as f64, self.min_height as f64);
        let low = h0.atan2(area / h0);
        let high = (area / w0).atan2(w0);
        (low <= high).then_some((low, high))
    }

    fn to_normalized(&self, angle: f64) -> f64 {
        if angle < self.bias {
            angle / self.bias - 1.0
        } else {
            (angle - self.bias) / (FRAC_PI_2 - self.bias)
        }
    }

    fn to_angle(&self, x: f64) -> f64 {
        if x < 0.0 {
            self.bias * (1.0 + x)
        } else {
            self.bias + x * (FRAC_PI_2 - self.bias)
        }
    }

    /// `count` rounded canvases of area about `area`. The first half sit
    /// near the preferred angle; the rest follow the density. `None` when
    /// `area` is below `min_width * min_height`.
    pub fn sample<R: Rng + ?Sized>(&self, count: usize, area: f64, rng: &mut R) -> Option<Vec<(u32, u32)>> {
        let (low, high) = self.angle_range(area)?;
        let xs = normalized_samples(count, self.to_normalized(low), self.to_normalized(high), rng);
        let canvases = xs
            .into_iter()
            .enumerate()
            .map(|(k, x)| {
                let mut angle = self.to_angle(x);
                if 2 * k < count {
                    let noise = BIAS_NOISE * rng.random_range(-1.0..=1.0);
                    angle = (self.bias.clamp(low, high) + noise).clamp(low, high);
                }
                self.canvas(area, angle)
            })
            .collect();
        Some(canvases)
    }

    fn canvas(&self, area: f64, angle: f64) -> (u32, u32) {
        let r = (area / (angle.sin() * angle.cos())).sqrt();
        let w = (r * angle.cos()).round() as u32;
        let h = (r * angle.sin()).round() as u32;
        (w.max(self.min_width), h.max(self.min_height))
    }
}
