//! Welch t-test and proportions z-test on identical binary data

use approx::assert_abs_diff_eq;
use proptest::prelude::*;
use retention_hypothesis::{
    Alternative, IntervalMethod, TestConfig, TestStatisticEngine, ZTestMethod,
};

fn binary(ones: usize, total: usize) -> Vec<u8> {
    (0..total).map(|i| u8::from(i < ones)).collect()
}

fn assert_close(engine: &TestStatisticEngine, control: &[u8], exposed: &[u8]) {
    let paired = engine.compare_binary(control, exposed).unwrap();
    let (t, z) = (paired.t_test, paired.proportion_test);

    assert_abs_diff_eq!(t.statistic, z.statistic, epsilon = 5e-2);
    assert_abs_diff_eq!(t.pvalue, z.pvalue, epsilon = 1e-2);

    if t.interval.lower.is_finite() {
        assert_abs_diff_eq!(t.interval.lower, z.interval.lower, epsilon = 2e-3);
    }
    if t.interval.upper.is_finite() {
        assert_abs_diff_eq!(t.interval.upper, z.interval.upper, epsilon = 2e-3);
    }
    assert_eq!(t.interval.lower.is_finite(), z.interval.lower.is_finite());
    assert_eq!(t.interval.upper.is_finite(), z.interval.upper.is_finite());
}

#[test]
fn balanced_large_samples_agree() {
    let control = binary(6_350, 10_000);
    let exposed = binary(6_150, 10_000);

    for alternative in [Alternative::TwoSided, Alternative::Larger, Alternative::Smaller] {
        let engine =
            TestStatisticEngine::new(TestConfig::default().with_alternative(alternative));
        assert_close(&engine, &control, &exposed);
    }
}

#[test]
fn imbalanced_samples_agree() {
    // 19:1 exposed to control, as in the long-term design
    let control = binary(668, 1_053);
    let exposed = binary(11_653, 18_947);

    let engine = TestStatisticEngine::default();
    assert_close(&engine, &control, &exposed);

    let engine = TestStatisticEngine::default()
        .with_z_method(ZTestMethod::Wald)
        .with_interval_method(IntervalMethod::Wald);
    assert_close(&engine, &control, &exposed);
}

#[test]
fn all_identical_samples_never_produce_nan() {
    let engine = TestStatisticEngine::default();
    let mixed = binary(400, 1_000);

    for constant in [vec![0u8; 1_000], vec![1u8; 1_000]] {
        let err = engine.compare_binary(&constant, &mixed).unwrap_err();
        assert!(err.is_degenerate());
        let err = engine.compare_binary(&mixed, &constant).unwrap_err();
        assert!(err.is_degenerate());
    }
}

proptest! {
    #[test]
    fn pvalues_in_unit_interval_and_bounds_ordered(
        n1 in 2usize..3_000,
        n2 in 2usize..3_000,
        f1 in 0.0f64..1.0,
        f2 in 0.0f64..1.0,
        level in 0.5f64..0.999,
        alt in prop_oneof![
            Just(Alternative::TwoSided),
            Just(Alternative::Larger),
            Just(Alternative::Smaller),
        ],
    ) {
        let ones1 = ((n1 as f64 * f1) as usize).clamp(1, n1 - 1);
        let ones2 = ((n2 as f64 * f2) as usize).clamp(1, n2 - 1);
        let config = TestConfig::new(alt, level).unwrap();
        let engine = TestStatisticEngine::new(config);

        let paired = engine.compare_binary(&binary(ones1, n1), &binary(ones2, n2)).unwrap();
        for outcome in [paired.t_test, paired.proportion_test] {
            prop_assert!((0.0..=1.0).contains(&outcome.pvalue));
            prop_assert!(outcome.statistic.is_finite());
            prop_assert!(outcome.interval.lower <= outcome.interval.upper);
            prop_assert!(!outcome.interval.lower.is_nan());
            prop_assert!(!outcome.interval.upper.is_nan());
        }
    }
}
