//! Randomized checks that incremental maps never diverge from a rebuild.

use lure_core::{Direction, DynamicMap, FlowMap, Grid, PotentialMap, UpdateMode};
use lure_maps::{
    FilteringPotentialMap, FlowFromFlowsMap, FlowFromPotentialsMap, Kernel, SimplePotentialMap,
};
use lure_test_utils::fixtures;
use proptest::prelude::*;
use std::rc::Rc;

const W: u32 = 8;
const H: u32 = 6;

#[ctor::ctor]
fn init_test_tracing() {
    lure_test_utils::init_test_tracing();
}

struct Pipeline {
    blur: Rc<FilteringPotentialMap>,
    toward: Rc<FlowFromPotentialsMap>,
    steer: Rc<FlowFromFlowsMap>,
}

fn pipeline(leaf: Rc<SimplePotentialMap>, mode: UpdateMode) -> Pipeline {
    let blur = FilteringPotentialMap::builder()
        .source(leaf.clone())
        .kernel(Kernel::uniform(1, 1))
        .mode(mode)
        .build()
        .unwrap();
    let toward = FlowFromPotentialsMap::builder()
        .weighted_source(leaf, 1.0)
        .weighted_source(blur.clone(), -0.5)
        .mode(mode)
        .build()
        .unwrap();
    let steer = FlowFromFlowsMap::builder()
        .weighted_source(toward.clone(), 2.0)
        .weighted_source(fixtures::uniform_flow(W, H, Direction::NORTH), 1.0)
        .mode(mode)
        .build()
        .unwrap();
    Pipeline {
        blur,
        toward,
        steer,
    }
}

fn assert_same(a: &Pipeline, b: &Pipeline) -> Result<(), TestCaseError> {
    for y in 0..H as i32 {
        for x in 0..W as i32 {
            prop_assert_eq!(a.blur.obtain_potential(x, y), b.blur.obtain_potential(x, y));
            prop_assert_eq!(a.toward.obtain_direction(x, y), b.toward.obtain_direction(x, y));
            prop_assert_eq!(a.steer.obtain_direction(x, y), b.steer.obtain_direction(x, y));
        }
    }
    Ok(())
}

proptest! {
    #[test]
    fn lazy_and_eager_match_rebuild(
        seed in any::<u64>(),
        edits in prop::collection::vec(
            (0i32..W as i32, 0i32..H as i32, -5.0f64..5.0, any::<bool>()),
            1..24,
        ),
    ) {
        let leaf = fixtures::scatter(W, H, seed);
        let lazy = pipeline(leaf.clone(), UpdateMode::Lazy);
        let eager = pipeline(leaf.clone(), UpdateMode::Eager);

        for &(x, y, value, peek) in &edits {
            leaf.set(x, y, value);
            prop_assert!(eager.steer.dirty_cells().is_empty());
            if peek {
                // Partial refreshes in between must not leave stale cells.
                lazy.steer.obtain_direction(x, y);
            }
        }

        let fresh = pipeline(SimplePotentialMap::new(leaf.snapshot()), UpdateMode::Lazy);
        assert_same(&lazy, &fresh)?;
        assert_same(&eager, &fresh)?;
    }

    #[test]
    fn a_single_change_dirties_exactly_the_kernel_window(
        rx in 0u32..3,
        ry in 0u32..3,
        x in 0i32..W as i32,
        y in 0i32..H as i32,
    ) {
        let leaf = fixtures::flat(W, H, 0.0);
        let blur = FilteringPotentialMap::builder()
            .source(leaf.clone())
            .kernel(Kernel::box_sum(rx, ry))
            .build()
            .unwrap();
        leaf.set(x, y, 1.0);

        let expected: Vec<(i32, i32)> = (0..H as i32)
            .flat_map(|cy| (0..W as i32).map(move |cx| (cx, cy)))
            .filter(|&(cx, cy)| (cx - x).abs() <= rx as i32 && (cy - y).abs() <= ry as i32)
            .collect();
        prop_assert_eq!(blur.dirty_cells(), expected.clone());
        for &(cx, cy) in &expected {
            prop_assert_eq!(blur.obtain_potential(cx, cy), 1.0);
        }
    }

    #[test]
    fn cells_outside_the_extent_keep_their_values(
        seed in any::<u64>(),
        x in 0i32..W as i32,
        y in 0i32..H as i32,
        value in -5.0f64..5.0,
    ) {
        let leaf = fixtures::scatter(W, H, seed);
        let flow = FlowFromPotentialsMap::builder()
            .source(leaf.clone())
            .build()
            .unwrap();
        let before: Vec<Direction> = cells()
            .map(|(cx, cy)| flow.obtain_direction(cx, cy))
            .collect();

        leaf.set(x, y, value);
        flow.update_if_dirty_all();
        for ((cx, cy), old) in cells().zip(before) {
            if (cx - x).abs() > 1 || (cy - y).abs() > 1 {
                prop_assert_eq!(flow.obtain_direction(cx, cy), old);
            }
        }
    }

    #[test]
    fn splitting_a_weight_is_linear(
        values in prop::collection::vec(-8i32..8, (W * H) as usize),
        a in -4i32..5,
        b in -4i32..5,
    ) {
        // Small integers keep every product and partial sum exact.
        let grid = Grid::from_vec(W, H, values.iter().map(|&v| v as f64).collect()).unwrap();
        let field = SimplePotentialMap::new(grid);
        let split = FlowFromPotentialsMap::builder()
            .weighted_source(field.clone(), a as f64)
            .weighted_source(field.clone(), b as f64)
            .build()
            .unwrap();
        let joined = FlowFromPotentialsMap::builder()
            .weighted_source(field, (a + b) as f64)
            .build()
            .unwrap();
        for (cx, cy) in cells() {
            prop_assert_eq!(split.obtain_direction(cx, cy), joined.obtain_direction(cx, cy));
        }
    }

    #[test]
    fn opposite_flows_cancel(
        seed in any::<u64>(),
        weight in 0.1f64..10.0,
    ) {
        let toward = FlowFromPotentialsMap::builder()
            .source(fixtures::scatter(W, H, seed))
            .build()
            .unwrap();
        let away = FlowFromPotentialsMap::builder()
            .weighted_source(fixtures::scatter(W, H, seed), -1.0)
            .build()
            .unwrap();
        let blend = FlowFromFlowsMap::builder()
            .weighted_source(toward, weight)
            .weighted_source(away, weight)
            .build()
            .unwrap();
        for (cx, cy) in cells() {
            prop_assert_eq!(blend.obtain_direction(cx, cy), Direction::NEUTRAL);
        }
    }
}

fn cells() -> impl Iterator<Item = (i32, i32)> {
    (0..H as i32).flat_map(|y| (0..W as i32).map(move |x| (x, y)))
}
