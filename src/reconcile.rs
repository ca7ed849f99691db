// =============================================================================
// Price Reconciliation: pick one authoritative quote from two sources
// =============================================================================
//
// POLICY: the primary source wins unless the secondary disagrees by more than
// DIVERGENCE_THRESHOLD_BPS, in which case the primary is treated as stale and
// the secondary quote is reported instead. The threshold is fixed; there is
// no averaging and no retry.
// =============================================================================

use serde::Serialize;
use tracing::{debug, warn};

use crate::types::PriceSource;

/// Divergence above which the secondary quote replaces the primary.
pub const DIVERGENCE_THRESHOLD_BPS: f64 = 10.0;

// ---------------------------------------------------------------------------
// Result type
// ---------------------------------------------------------------------------

/// Outcome of reconciling the primary and secondary quotes.
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct ReconciledPrice {
    /// The authoritative price.
    pub price: f64,
    /// Which source `price` came from.
    pub price_source: PriceSource,
    /// Raw primary quote.
    pub price_primary: f64,
    /// Raw secondary quote, if one was available.
    pub price_secondary: Option<f64>,
    /// Divergence between the two quotes in basis points. Only present when
    /// both quotes exist.
    pub price_diff_bps: Option<f64>,
}

// ---------------------------------------------------------------------------
// Public entry points
// ---------------------------------------------------------------------------

/// Absolute divergence between two prices in basis points, relative to their
/// midpoint. Symmetric in its arguments.
pub fn divergence_bps(a: f64, b: f64) -> f64 {
    (a - b).abs() / ((a + b) / 2.0) * 10_000.0
}

/// Decide which of the two quotes is authoritative.
pub fn reconcile(primary: f64, secondary: Option<f64>) -> ReconciledPrice {
    let Some(secondary_price) = secondary else {
        debug!(primary, "no secondary quote; using primary");
        return ReconciledPrice {
            price: primary,
            price_source: PriceSource::Primary,
            price_primary: primary,
            price_secondary: None,
            price_diff_bps: None,
        };
    };

    let diff_bps = divergence_bps(primary, secondary_price);

    let (price, price_source) = if diff_bps > DIVERGENCE_THRESHOLD_BPS {
        warn!(
            primary,
            secondary = secondary_price,
            diff_bps,
            threshold_bps = DIVERGENCE_THRESHOLD_BPS,
            "quote divergence above threshold; preferring secondary source"
        );
        (secondary_price, PriceSource::Secondary)
    } else {
        debug!(primary, secondary = secondary_price, diff_bps, "quotes agree");
        (primary, PriceSource::Primary)
    };

    ReconciledPrice {
        price,
        price_source,
        price_primary: primary,
        price_secondary: Some(secondary_price),
        price_diff_bps: Some(diff_bps),
    }
}

// =============================================================================
// Tests
// =============================================================================
#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn absent_secondary_keeps_primary() {
        let r = reconcile(187.25, None);
        assert_eq!(r.price, 187.25);
        assert_eq!(r.price_source, PriceSource::Primary);
        assert!(r.price_secondary.is_none());
        assert!(r.price_diff_bps.is_none());
    }

    #[test]
    fn wide_divergence_prefers_secondary() {
        let r = reconcile(100.0, Some(100.20));
        let bps = r.price_diff_bps.unwrap();
        assert!((bps - 20.0).abs() < 0.05, "got {bps}");
        assert_eq!(r.price, 100.20);
        assert_eq!(r.price_source, PriceSource::Secondary);
        assert_eq!(r.price_primary, 100.0);
    }

    #[test]
    fn narrow_divergence_keeps_primary() {
        let r = reconcile(100.0, Some(100.05));
        let bps = r.price_diff_bps.unwrap();
        assert!((bps - 5.0).abs() < 0.05, "got {bps}");
        assert_eq!(r.price, 100.0);
        assert_eq!(r.price_source, PriceSource::Primary);
        assert_eq!(r.price_secondary, Some(100.05));
    }

    #[test]
    fn threshold_boundary() {
        // 0.10 / 100.05 * 1e4 ≈ 9.995 bps
        assert_eq!(reconcile(100.0, Some(100.10)).price_source, PriceSource::Primary);
        // 0.11 / 100.055 * 1e4 ≈ 10.994 bps
        assert_eq!(reconcile(100.0, Some(100.11)).price_source, PriceSource::Secondary);
    }

    #[test]
    fn exactly_at_threshold_keeps_primary() {
        // 1.0 / 1000.0 * 1e4 = 10 bps
        let r = reconcile(999.5, Some(1000.5));
        assert_eq!(r.price_diff_bps, Some(DIVERGENCE_THRESHOLD_BPS));
        assert_eq!(r.price_source, PriceSource::Primary);
        assert_eq!(r.price, 999.5);
    }

    #[test]
    fn identical_quotes_have_zero_divergence() {
        let r = reconcile(42.0, Some(42.0));
        assert_eq!(r.price_diff_bps, Some(0.0));
        assert_eq!(r.price_source, PriceSource::Primary);
    }

    #[test]
    fn divergence_is_symmetric() {
        let pairs = [(100.0, 100.2), (55.5, 54.1), (0.013, 0.0131)];
        for (a, b) in pairs {
            assert_eq!(divergence_bps(a, b).to_bits(), divergence_bps(b, a).to_bits());
        }
    }

    #[test]
    fn choice_is_not_symmetric() {
        let forward = reconcile(100.0, Some(100.20));
        let swapped = reconcile(100.20, Some(100.0));
        assert_eq!(forward.price_diff_bps, swapped.price_diff_bps);
        assert_eq!(forward.price, 100.20);
        assert_eq!(swapped.price, 100.0);
        assert_eq!(forward.price_source, PriceSource::Secondary);
        assert_eq!(swapped.price_source, PriceSource::Secondary);
    }

    #[test]
    fn secondary_below_primary_also_flips() {
        let r = reconcile(100.0, Some(99.8));
        assert_eq!(r.price_source, PriceSource::Secondary);
        assert_eq!(r.price, 99.8);
    }

    #[test]
    fn reconcile_is_deterministic() {
        assert_eq!(reconcile(123.45, Some(123.61)), reconcile(123.45, Some(123.61)));
    }

    #[test]
    fn serialises_with_lowercase_source() {
        let json = serde_json::to_value(reconcile(100.0, Some(100.20))).unwrap();
        assert_eq!(json["price_source"], "secondary");
        assert_eq!(json["price_primary"], 100.0);
    }
}
