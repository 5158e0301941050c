use proptest::prelude::*;

use mobihue::zone::{Zone, ZoneThresholds, classify};

/// Generate strictly increasing threshold triples.
fn thresholds_strategy() -> impl Strategy<Value = ZoneThresholds> {
    (0i64..120, 1i64..120, 1i64..120).prop_map(|(imminent, close_gap, intermediate_gap)| {
        ZoneThresholds {
            imminent,
            close: imminent + close_gap,
            intermediate: imminent + close_gap + intermediate_gap,
        }
    })
}

proptest! {
    /// Classification is total over non-negative ETAs and never produces the
    /// synthetic warning zone.
    #[test]
    fn classification_is_total_and_never_warning(
        eta in 0i64..10_000,
        thresholds in thresholds_strategy()
    ) {
        let zone = classify(eta, &thresholds);
        prop_assert_ne!(zone, Zone::Warning);
    }

    /// A later bus never lands in a more urgent zone.
    #[test]
    fn classification_is_monotonic_in_the_eta(
        eta in 0i64..10_000,
        gap in 0i64..10_000,
        thresholds in thresholds_strategy()
    ) {
        let earlier = classify(eta, &thresholds);
        let later = classify(eta + gap, &thresholds);
        prop_assert!(earlier <= later);
    }

    /// An ETA exactly on a cutoff belongs to the more urgent zone.
    #[test]
    fn cutoffs_belong_to_the_closer_zone(thresholds in thresholds_strategy()) {
        prop_assert_eq!(classify(thresholds.imminent, &thresholds), Zone::Imminent);
        prop_assert_eq!(classify(thresholds.close, &thresholds), Zone::Close);
        prop_assert_eq!(
            classify(thresholds.intermediate, &thresholds),
            Zone::Intermediate
        );
        prop_assert_eq!(
            classify(thresholds.intermediate + 1, &thresholds),
            Zone::Further
        );
    }
}
