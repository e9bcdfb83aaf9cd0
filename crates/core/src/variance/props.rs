//! Property tests for variance classification.

use proptest::prelude::*;
use rust_decimal::Decimal;

use super::classify::{classify, deviation_pct};
use super::types::{Severity, SeverityBands};

fn amount() -> impl Strategy<Value = Decimal> {
    (-10_000_000i64..10_000_000i64).prop_map(|n| Decimal::new(n, 2))
}

proptest! {
    #![proptest_config(ProptestConfig::with_cases(100))]

    /// A zero baseline never divides; it is always undefined.
    #[test]
    fn prop_zero_baseline_is_undefined(actual in amount()) {
        let deviation = deviation_pct(actual, Decimal::ZERO);
        prop_assert!(deviation.is_none());
        prop_assert_eq!(classify(deviation, &SeverityBands::default()), Severity::Undefined);
    }

    /// Any nonzero baseline yields a defined band that grows with the magnitude.
    #[test]
    fn prop_bands_follow_magnitude(actual in amount(), baseline in amount()) {
        prop_assume!(!baseline.is_zero());
        let bands = SeverityBands::default();
        let deviation = deviation_pct(actual, baseline);
        let severity = classify(deviation, &bands);
        let magnitude = deviation.map(|d| d.abs()).unwrap_or_default();

        prop_assert_ne!(severity, Severity::Undefined);
        prop_assert_eq!(severity == Severity::Normal, magnitude < bands.warning_pct);
        prop_assert_eq!(severity == Severity::Critical, magnitude > bands.critical_pct);
    }

    /// Matching the baseline is always normal.
    #[test]
    fn prop_on_baseline_is_normal(baseline in amount()) {
        prop_assume!(!baseline.is_zero());
        prop_assert_eq!(
            classify(deviation_pct(baseline, baseline), &SeverityBands::default()),
            Severity::Normal
        );
    }
}
