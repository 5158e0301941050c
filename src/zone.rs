//! Zone classification for departure ETAs.
//!
//! A zone is a discrete urgency bucket for "minutes until the next bus".
//! Classification is a total function over non-negative ETAs: thresholds are
//! checked in increasing order and the first match wins, with `Further` as
//! the catch-all above the intermediate cutoff. `Warning` is synthetic and
//! never produced by classification; the controller uses it when the feed
//! carries no departure data at all.

use serde::Deserialize;

/// Urgency bucket for a departure's estimated time of arrival.
///
/// Ordered by urgency: `Imminent` is the most urgent. The derived `Ord`
/// follows declaration order, so classification is monotonic in the ETA.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Zone {
    Imminent,
    Close,
    Intermediate,
    Further,
    /// Synthetic zone signalling "no departure data available".
    Warning,
}

impl Zone {
    pub fn label(&self) -> &'static str {
        match self {
            Zone::Imminent => "imminent",
            Zone::Close => "close",
            Zone::Intermediate => "intermediate",
            Zone::Further => "further",
            Zone::Warning => "warning",
        }
    }

    /// All zones that carry a configured visual state.
    pub fn all() -> [Zone; 5] {
        [
            Zone::Imminent,
            Zone::Close,
            Zone::Intermediate,
            Zone::Further,
            Zone::Warning,
        ]
    }
}

impl std::fmt::Display for Zone {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.label())
    }
}

/// Maximum minutes-to-arrival cutoffs for the threshold-bearing zones.
///
/// Anything above `intermediate` classifies as `Further`; `Warning` has no
/// threshold.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ZoneThresholds {
    pub imminent: i64,
    pub close: i64,
    pub intermediate: i64,
}

/// Classify an ETA in whole minutes into a zone.
///
/// An ETA exactly on a cutoff belongs to the closer (more urgent) zone: the
/// comparisons are `<=`, checked ascending.
pub fn classify(eta_minutes: i64, thresholds: &ZoneThresholds) -> Zone {
    if eta_minutes <= thresholds.imminent {
        Zone::Imminent
    } else if eta_minutes <= thresholds.close {
        Zone::Close
    } else if eta_minutes <= thresholds.intermediate {
        Zone::Intermediate
    } else {
        Zone::Further
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn thresholds() -> ZoneThresholds {
        ZoneThresholds {
            imminent: 5,
            close: 10,
            intermediate: 20,
        }
    }

    #[test]
    fn classifies_each_band() {
        let t = thresholds();
        assert_eq!(classify(0, &t), Zone::Imminent);
        assert_eq!(classify(3, &t), Zone::Imminent);
        assert_eq!(classify(7, &t), Zone::Close);
        assert_eq!(classify(15, &t), Zone::Intermediate);
        assert_eq!(classify(45, &t), Zone::Further);
    }

    #[test]
    fn ties_favor_the_closer_zone() {
        let t = thresholds();
        assert_eq!(classify(5, &t), Zone::Imminent);
        assert_eq!(classify(10, &t), Zone::Close);
        assert_eq!(classify(20, &t), Zone::Intermediate);
        assert_eq!(classify(21, &t), Zone::Further);
    }

    #[test]
    fn never_produces_warning() {
        let t = thresholds();
        for eta in 0..200 {
            assert_ne!(classify(eta, &t), Zone::Warning);
        }
    }

    #[test]
    fn urgency_order_matches_declaration() {
        assert!(Zone::Imminent < Zone::Close);
        assert!(Zone::Close < Zone::Intermediate);
        assert!(Zone::Intermediate < Zone::Further);
    }
}
