//! Property-based tests for the equal-error search and the sweep.

use ht_core::measurement::{generate_samples, parse_measurements, GenerateParams};
use ht_core::sweep::{compute_point, find_critical_value, CriticalValue};
use ht_core::{run_sweep, Hypothesis, HypothesisPair, SweepParams};
use proptest::prelude::*;

/// Sorted LLR-like values on a quarter grid, so ties are common.
fn distribution_strategy() -> impl Strategy<Value = Vec<f64>> {
    prop::collection::vec(-40i32..40, 1..60).prop_map(|raw| {
        let mut values: Vec<f64> = raw.into_iter().map(|v| f64::from(v) / 4.0).collect();
        values.sort_by(f64::total_cmp);
        values
    })
}

/// Quadratic reference: best imbalance over every split, ties going to the
/// largest split.
fn naive_search(d0: &[f64], d1: &[f64]) -> (usize, usize) {
    let n0 = d0.len();
    let mut best = (0, usize::MAX);
    for (a, &threshold) in d0.iter().enumerate() {
        let below = d1.iter().filter(|&&v| v < threshold).count();
        let imbalance = (below + a).abs_diff(n0);
        if imbalance <= best.1 {
            best = (a, imbalance);
        }
    }
    best
}

fn pair_from_seed(rate1: f64, count: usize, seed: u64) -> HypothesisPair {
    let gen = |rate: f64, seed: u64| {
        let params = GenerateParams::new(rate, count as i64, seed).expect("valid generator params");
        generate_samples(&params)
    };
    HypothesisPair::new(
        Hypothesis::from_parts(0, 1.0, gen(1.0, seed)),
        Hypothesis::from_parts(1, rate1, gen(rate1, seed.wrapping_add(1))),
    )
}

proptest! {
    #![proptest_config(ProptestConfig::with_cases(2_000))]

    #[test]
    fn critical_value_matches_quadratic_search(
        d0 in distribution_strategy(),
        d1 in distribution_strategy(),
    ) {
        let cv: CriticalValue = find_critical_value(&d0, &d1).expect("non-empty inputs");
        let (split, imbalance) = naive_search(&d0, &d1);

        prop_assert_eq!(cv.split, split);
        prop_assert_eq!(cv.imbalance, imbalance);
        prop_assert_eq!(cv.threshold, d0[split]);
        prop_assert_eq!(
            cv.type_two_count,
            d1.iter().filter(|&&v| v < cv.threshold).count()
        );
    }

    #[test]
    fn alpha_is_a_probability(
        d0 in distribution_strategy(),
        d1 in distribution_strategy(),
    ) {
        let cv = find_critical_value(&d0, &d1).expect("non-empty inputs");
        prop_assert!(cv.alpha > 0.0 && cv.alpha <= 1.0, "alpha out of range: {}", cv.alpha);
        prop_assert!(cv.split < d0.len());
        prop_assert_eq!(
            cv.alpha,
            (d0.len() - cv.split) as f64 / d0.len() as f64
        );
    }

    #[test]
    fn parser_never_panics(text in "\\PC{0,200}", required in 0usize..20) {
        let _ = parse_measurements(&text, "fuzz", 0, required);
    }
}

proptest! {
    #![proptest_config(ProptestConfig::with_cases(16))]

    #[test]
    fn separated_rates_gain_significance(seed in any::<u64>(), rate1 in 2.0f64..4.0) {
        let n_exp = 200;
        let mpe = 16;
        let pair = pair_from_seed(rate1, n_exp * mpe, seed);
        let params = SweepParams::new(n_exp, mpe, 1).expect("valid params");
        let curve = run_sweep(&params, &pair, None).expect("sweep succeeds");

        prop_assert_eq!(curve.len(), mpe - 1);
        for point in &curve.points {
            prop_assert!((0.0..=1.0).contains(&point.alpha));
        }
        let first = curve.points.first().map(|p| p.alpha).unwrap_or(1.0);
        let last = curve.points.last().map(|p| p.alpha).unwrap_or(1.0);
        prop_assert!(last < first, "alpha did not fall: {} -> {}", first, last);
    }

    #[test]
    fn same_law_data_balances_near_one_half(seed in any::<u64>(), m in 1usize..6) {
        // Both data sets come from rate 1 while the tested rates differ, so
        // D0 and D1 share one continuous law.
        let n_exp = 2_000;
        let params = GenerateParams::new(1.0, (n_exp * m) as i64, seed).expect("valid params");
        let other = GenerateParams { seed: seed.wrapping_add(7), ..params };
        let pair = HypothesisPair::new(
            Hypothesis::from_parts(0, 1.0, generate_samples(&params)),
            Hypothesis::from_parts(1, 1.5, generate_samples(&other)),
        );
        let point = compute_point(&pair, m, n_exp).expect("enough data");
        prop_assert!((point.alpha - 0.5).abs() < 0.1, "alpha {} far from 0.5", point.alpha);
    }

    #[test]
    fn sweep_is_deterministic_across_jobs(
        seed in any::<u64>(),
        step in 1usize..4,
        jobs in 2usize..6,
    ) {
        let n_exp = 50;
        let mpe = 12;
        let pair = pair_from_seed(1.5, n_exp * mpe, seed);
        let sequential = SweepParams::new(n_exp, mpe, step).expect("valid params");
        let parallel = sequential.with_jobs(jobs).expect("valid jobs");

        let a = run_sweep(&sequential, &pair, None).expect("sweep succeeds");
        let b = run_sweep(&sequential, &pair, None).expect("sweep succeeds");
        let c = run_sweep(&parallel, &pair, None).expect("sweep succeeds");

        prop_assert_eq!(&a, &b);
        prop_assert_eq!(&a, &c);
        let ms: Vec<usize> = a.points.iter().map(|p| p.m).collect();
        prop_assert_eq!(ms, sequential.measurement_counts());
    }
}
