//! Weighted neighbourhood windows for convolution.

use lure_core::{EdgeHandler, EdgeLookup, MapError, PotentialMap};

/// A `(2 * radius_x + 1) x (2 * radius_y + 1)` weight window.
///
/// Applied at `(x, y)` it returns the weighted sum of source values at
/// `(x + dx, y + dy)` for every offset in the window. Offsets that fall
/// outside the source go through the kernel's own [`EdgeHandler`]:
/// `Extend` reads the source at the clamped coordinate, `Custom(v)` uses
/// `v` directly.
#[derive(Clone, Debug, PartialEq)]
pub struct Kernel {
    radius_x: u32,
    radius_y: u32,
    /// Row-major, `dy` outer.
    weights: Vec<f64>,
    edge: EdgeHandler<f64>,
}

impl Kernel {
    /// Build from explicit row-major weights.
    ///
    /// # Errors
    ///
    /// Returns [`MapError::InvalidKernel`] if `weights` does not hold
    /// `(2 * radius_x + 1) * (2 * radius_y + 1)` entries or any weight is
    /// not finite.
    pub fn from_weights(radius_x: u32, radius_y: u32, weights: Vec<f64>) -> Result<Self, MapError> {
        let expected = window_len(radius_x, radius_y);
        if weights.len() != expected {
            return Err(MapError::InvalidKernel {
                reason: format!(
                    "{}x{} window needs {expected} weights, got {}",
                    2 * radius_x + 1,
                    2 * radius_y + 1,
                    weights.len()
                ),
            });
        }
        if let Some(w) = weights.iter().find(|w| !w.is_finite()) {
            return Err(MapError::InvalidKernel {
                reason: format!("weight {w} is not finite"),
            });
        }
        Ok(Self {
            radius_x,
            radius_y,
            weights,
            edge: EdgeHandler::Extend,
        })
    }

    /// Uniform average: every weight is `1 / window size`.
    pub fn uniform(radius_x: u32, radius_y: u32) -> Self {
        let n = window_len(radius_x, radius_y);
        Self {
            radius_x,
            radius_y,
            weights: vec![1.0 / n as f64; n],
            edge: EdgeHandler::Extend,
        }
    }

    /// Unnormalized box sum: every weight is 1.
    pub fn box_sum(radius_x: u32, radius_y: u32) -> Self {
        Self {
            radius_x,
            radius_y,
            weights: vec![1.0; window_len(radius_x, radius_y)],
            edge: EdgeHandler::Extend,
        }
    }

    /// Square Gaussian blur normalized to sum to 1.
    ///
    /// # Errors
    ///
    /// Returns [`MapError::InvalidKernel`] if `sigma` is not finite and
    /// positive.
    pub fn gaussian(radius: u32, sigma: f64) -> Result<Self, MapError> {
        if !sigma.is_finite() || sigma <= 0.0 {
            return Err(MapError::InvalidKernel {
                reason: format!("sigma must be finite and positive, got {sigma}"),
            });
        }
        let r = radius as i32;
        let two_sigma_sq = 2.0 * sigma * sigma;
        let mut weights = Vec::with_capacity(window_len(radius, radius));
        for dy in -r..=r {
            for dx in -r..=r {
                weights.push((-((dx * dx + dy * dy) as f64) / two_sigma_sq).exp());
            }
        }
        let total: f64 = weights.iter().sum();
        for w in &mut weights {
            *w /= total;
        }
        Self::from_weights(radius, radius, weights)
    }

    /// Replace the out-of-bounds policy used when sampling the source.
    pub fn with_edge_handler(mut self, edge: EdgeHandler<f64>) -> Self {
        self.edge = edge;
        self
    }

    /// Horizontal radius.
    pub fn radius_x(&self) -> u32 {
        self.radius_x
    }

    /// Vertical radius.
    pub fn radius_y(&self) -> u32 {
        self.radius_y
    }

    /// Out-of-bounds policy.
    pub fn edge_handler(&self) -> &EdgeHandler<f64> {
        &self.edge
    }

    /// Weight at offset `(dx, dy)`, or 0 outside the window.
    pub fn weight(&self, dx: i32, dy: i32) -> f64 {
        let rx = self.radius_x as i32;
        let ry = self.radius_y as i32;
        if dx.abs() > rx || dy.abs() > ry {
            return 0.0;
        }
        let cols = (2 * rx + 1) as usize;
        self.weights[(dy + ry) as usize * cols + (dx + rx) as usize]
    }

    /// Weighted sum of `source` around `(x, y)`.
    pub fn apply<P: PotentialMap + ?Sized>(&self, source: &P, x: i32, y: i32) -> f64 {
        let rx = self.radius_x as i32;
        let ry = self.radius_y as i32;
        let (width, height) = (source.width(), source.height());
        let mut sum = 0.0;
        let mut weights = self.weights.iter();
        for dy in -ry..=ry {
            for dx in -rx..=rx {
                let w = *weights.next().unwrap_or(&0.0);
                if w == 0.0 {
                    continue;
                }
                let v = match self.edge.resolve(x + dx, y + dy, width, height) {
                    EdgeLookup::Cell(cx, cy) => source.obtain_potential(cx, cy),
                    EdgeLookup::Value(v) => v,
                };
                sum += w * v;
            }
        }
        sum
    }
}

fn window_len(radius_x: u32, radius_y: u32) -> usize {
    (2 * radius_x as usize + 1) * (2 * radius_y as usize + 1)
}
