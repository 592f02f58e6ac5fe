//! Standard source maps for propagation tests.
//!
//! - [`flat`]: every cell the same value.
//! - [`ramp_x`]: potential equal to the column index.
//! - [`spike`]: zero everywhere except one cell.
//! - [`scatter`]: seeded noise.
//! - [`uniform_flow`]: every cell pointing the same way.

use lure_core::{Direction, Grid};
use lure_maps::{SimpleFlowMap, SimplePotentialMap};
use rand_chacha::rand_core::{RngCore, SeedableRng};
use rand_chacha::ChaCha8Rng;
use std::rc::Rc;

pub fn flat(width: u32, height: u32, value: f64) -> Rc<SimplePotentialMap> {
    SimplePotentialMap::new(Grid::new(width, height, value).expect("valid fixture size"))
}

/// Potential `x * slope` at every cell.
pub fn ramp_x(width: u32, height: u32, slope: f64) -> Rc<SimplePotentialMap> {
    let grid = Grid::from_fn(width, height, |x, _| x as f64 * slope).expect("valid fixture size");
    SimplePotentialMap::new(grid)
}

/// `value` at `(x, y)`, zero elsewhere.
pub fn spike(width: u32, height: u32, x: i32, y: i32, value: f64) -> Rc<SimplePotentialMap> {
    let mut grid = Grid::new(width, height, 0.0).expect("valid fixture size");
    grid.set(x, y, value);
    SimplePotentialMap::new(grid)
}

/// Seeded potentials in `[0, 1)`; the same seed gives the same grid.
pub fn scatter(width: u32, height: u32, seed: u64) -> Rc<SimplePotentialMap> {
    let mut rng = ChaCha8Rng::seed_from_u64(seed);
    let grid = Grid::from_fn(width, height, |_, _| unit(&mut rng)).expect("valid fixture size");
    SimplePotentialMap::new(grid)
}

/// Uniform sample in `[0, 1)` with 53 bits of precision.
pub fn unit(rng: &mut ChaCha8Rng) -> f64 {
    (rng.next_u64() >> 11) as f64 / (1u64 << 53) as f64
}

pub fn uniform_flow(width: u32, height: u32, direction: Direction) -> Rc<SimpleFlowMap> {
    SimpleFlowMap::new(Grid::new(width, height, direction).expect("valid fixture size"))
}
