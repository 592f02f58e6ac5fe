//! Benchmark scenarios for Lure guidance maps.
//!
//! - [`guidance_stack`]: leaf -> blur -> steering flow -> blended flow,
//!   the shape of a typical agent-guidance setup.
//! - [`edit_script`]: deterministic point edits to replay against it.

#![forbid(unsafe_code)]
#![deny(rustdoc::broken_intra_doc_links)]

use lure_core::{Direction, Grid, PotentialMap, UpdateMode};
use lure_maps::{
    FilteringPotentialMap, FlowFromFlowsMap, FlowFromPotentialsMap, Kernel, SimpleFlowMap,
    SimplePotentialMap,
};
use rand_chacha::rand_core::{RngCore, SeedableRng};
use rand_chacha::ChaCha8Rng;
use std::rc::Rc;

/// A four-level map stack sharing one mutable leaf.
pub struct Stack {
    pub leaf: Rc<SimplePotentialMap>,
    pub blur: Rc<FilteringPotentialMap>,
    pub toward: Rc<FlowFromPotentialsMap>,
    pub steer: Rc<FlowFromFlowsMap>,
}

/// Build a `width x height` stack where every derived map uses `mode`.
///
/// The blur kernel is a radius-2 Gaussian; the final blend mixes the
/// steering flow with a weak constant wind.
pub fn guidance_stack(width: u32, height: u32, mode: UpdateMode, seed: u64) -> Stack {
    let mut rng = ChaCha8Rng::seed_from_u64(seed);
    let grid = Grid::from_fn(width, height, |_, _| unit(&mut rng)).unwrap();
    let leaf = SimplePotentialMap::new(grid);
    let blur = FilteringPotentialMap::builder()
        .source(leaf.clone())
        .kernel(Kernel::gaussian(2, 1.0).unwrap())
        .mode(mode)
        .name("blur")
        .build()
        .unwrap();
    let toward = FlowFromPotentialsMap::builder()
        .named_source("blur", blur.clone(), 1.0)
        .mode(mode)
        .name("toward")
        .build()
        .unwrap();
    let wind = SimpleFlowMap::new(Grid::new(width, height, Direction::EAST).unwrap());
    let steer = FlowFromFlowsMap::builder()
        .named_source("toward", toward.clone(), 1.0)
        .named_source("wind", wind, 0.25)
        .mode(mode)
        .name("steer")
        .build()
        .unwrap();
    Stack {
        leaf,
        blur,
        toward,
        steer,
    }
}

/// `count` deterministic `(x, y, value)` edits inside the grid.
pub fn edit_script(count: usize, width: u32, height: u32, seed: u64) -> Vec<(i32, i32, f64)> {
    let mut rng = ChaCha8Rng::seed_from_u64(seed);
    (0..count)
        .map(|_| {
            let x = (rng.next_u64() % width as u64) as i32;
            let y = (rng.next_u64() % height as u64) as i32;
            (x, y, unit(&mut rng))
        })
        .collect()
}

/// Independent potential layers for structural-change benchmarks.
pub fn layers(count: usize, width: u32, height: u32, seed: u64) -> Vec<Rc<dyn PotentialMap>> {
    let mut rng = ChaCha8Rng::seed_from_u64(seed);
    (0..count)
        .map(|_| {
            let grid = Grid::from_fn(width, height, |_, _| unit(&mut rng)).unwrap();
            SimplePotentialMap::new(grid) as Rc<dyn PotentialMap>
        })
        .collect()
}

fn unit(rng: &mut ChaCha8Rng) -> f64 {
    (rng.next_u64() >> 11) as f64 / (1u64 << 53) as f64
}
