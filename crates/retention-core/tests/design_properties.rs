//! Property tests for experiment design validation

use proptest::prelude::*;
use retention_core::ExperimentDesign;

proptest! {
    #[test]
    fn segments_partition_population(
        baseline in 0.01f64..0.99,
        mde in -0.01f64..0.01,
        population in 2u64..5_000_000,
        ratio in 1.0f64..100.0,
    ) {
        match ExperimentDesign::new(baseline, mde, population, ratio) {
            Ok(design) => {
                prop_assert_eq!(design.control_n() + design.exposed_n(), population);
                prop_assert!(design.control_n() >= 1);
                prop_assert!(design.exposed_n() >= 1);
                prop_assert!((0.0..=1.0).contains(&design.control_rate()));
            }
            Err(err) => {
                // Only parameter validation may reject a design
                prop_assert!(err.is_invalid_parameter());
            }
        }
    }

    #[test]
    fn ratio_above_two_always_splits(
        population in 2u64..5_000_000,
        ratio in 2.0f64..50.0,
    ) {
        let design = ExperimentDesign::new(0.5, 0.0, population, ratio).unwrap();
        prop_assert!(design.control_n() <= design.exposed_n() + 1);
    }
}

#[test]
fn long_term_grid_is_valid() {
    for &baseline in &[0.55, 0.60, 0.65] {
        for &mde in &[0.02, 0.03, 0.04] {
            for &population in &[175_000u64, 200_000, 225_000] {
                for &ratio in &[5.66, 9.0, 19.0] {
                    let design = ExperimentDesign::new(baseline, mde, population, ratio).unwrap();
                    assert_eq!(design.control_n() + design.exposed_n(), population);
                }
            }
        }
    }
}
