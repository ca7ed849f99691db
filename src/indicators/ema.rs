// =============================================================================
// Exponential Moving Average (EMA)
// =============================================================================
//
// Seeded with the plain average of the first `period` closes, then smoothed
// recursively with k = 2 / (period + 1):
//
//   ema_0 = mean(close[0..period])
//   ema_t = close_t * k + ema_{t-1} * (1 - k)
//
// Used directly for EMA-50 / EMA-200 and as the building block for MACD.
// =============================================================================

/// Look-back of the medium-term EMA reported for every symbol.
pub const EMA_MEDIUM_PERIOD: usize = 50;
/// Look-back of the long-term EMA reported for every symbol.
pub const EMA_LONG_PERIOD: usize = 200;

/// Running EMA over `closes`, one value per close from index `period - 1`.
///
/// The output has `closes.len() - period + 1` elements, or none at all when
/// `period` is zero or exceeds the available history.
pub fn calculate_ema(closes: &[f64], period: usize) -> Vec<f64> {
    if period == 0 || period > closes.len() {
        return Vec::new();
    }

    let k = 2.0 / (period as f64 + 1.0);
    let (warmup, rest) = closes.split_at(period);
    let seed = warmup.iter().sum::<f64>() / period as f64;

    std::iter::once(seed)
        .chain(rest.iter().scan(seed, |prev, &px| {
            *prev = px * k + *prev * (1.0 - k);
            Some(*prev)
        }))
        .collect()
}

/// Latest EMA value after consuming the whole series.
///
/// `None` when fewer than `period` closes are available; insufficient history
/// is an expected outcome, not an error.
pub fn ema(closes: &[f64], period: usize) -> Option<f64> {
    calculate_ema(closes, period).last().copied()
}
