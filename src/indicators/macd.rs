// =============================================================================
// Moving Average Convergence / Divergence (MACD)
// =============================================================================
//
//   MACD line   = EMA_fast(close) - EMA_slow(close)
//   Signal line = EMA_signal(MACD line)
//   Histogram   = MACD line - Signal line
//
// All three EMAs use the ordinary 2 / (period + 1) multiplier with an SMA
// seed (see `ema.rs`), unlike RSI which uses Wilder's 1 / period.
// =============================================================================

use serde::{Deserialize, Serialize};

use super::ema::calculate_ema;

pub const MACD_FAST: usize = 12;
pub const MACD_SLOW: usize = 26;
pub const MACD_SIGNAL: usize = 9;

/// Latest MACD reading. The three values only ever exist together.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Macd {
    pub line: f64,
    pub signal: f64,
    pub histogram: f64,
}

/// Compute the latest MACD reading.
///
/// Returns `None` when `closes.len() < slow + signal`, when any period is
/// zero, or when fewer than `signal` MACD-line values can be formed.
pub fn macd(closes: &[f64], fast: usize, slow: usize, signal: usize) -> Option<Macd> {
    if fast == 0 || slow == 0 || signal == 0 || closes.len() < slow + signal {
        return None;
    }

    let fast_ema = calculate_ema(closes, fast);
    let slow_ema = calculate_ema(closes, slow);

    // Both series end on the last close; the MACD line exists from the first
    // index where both are seeded.
    let start = fast.max(slow) - 1;
    let fast_offset = fast - 1;
    let slow_offset = slow - 1;
    let line: Vec<f64> = (start..closes.len())
        .map(|i| fast_ema[i - fast_offset] - slow_ema[i - slow_offset])
        .collect();

    if line.len() < signal {
        return None;
    }

    let signal_line = calculate_ema(&line, signal);
    let latest_line = *line.last()?;
    let latest_signal = *signal_line.last()?;

    Some(Macd {
        line: latest_line,
        signal: latest_signal,
        histogram: latest_line - latest_signal,
    })
}

/// Crossover state of the MACD line relative to its signal.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum MacdState {
    Bullish,
    Bearish,
}

impl MacdState {
    /// `Bullish` when the MACD line is strictly above the signal line.
    pub fn from_macd(reading: &Macd) -> Self {
        if reading.line > reading.signal {
            Self::Bullish
        } else {
            Self::Bearish
        }
    }
}

impl std::fmt::Display for MacdState {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Bullish => write!(f, "Bullish"),
            Self::Bearish => write!(f, "Bearish"),
        }
    }
}
