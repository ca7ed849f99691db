// =============================================================================
// Relative Strength Index (RSI)
// =============================================================================
//
// Close-to-close changes are split into gains and losses. The first `period`
// changes seed both averages with a simple mean; every later change is folded
// in with Wilder's smoothing (alpha = 1 / period):
//
//   avg = (avg * (period - 1) + x) / period
//   RSI = 100 - 100 / (1 + avg_gain / avg_loss)
//
// A window with no losses reads 100, flat windows included.
// =============================================================================

use serde::{Deserialize, Serialize};

/// Look-back used for the reported `rsi14`.
pub const RSI_PERIOD: usize = 14;

const OVERBOUGHT: f64 = 70.0;
const OVERSOLD: f64 = 30.0;

/// Gain/loss averages carried through Wilder's smoothing.
#[derive(Debug, Clone, Copy)]
struct WilderAverages {
    gain: f64,
    loss: f64,
}

impl WilderAverages {
    fn seed(changes: &[f64]) -> Self {
        let n = changes.len() as f64;
        let gain: f64 = changes.iter().filter(|c| **c > 0.0).sum();
        let loss: f64 = changes.iter().filter(|c| **c < 0.0).map(|c| -c).sum();
        Self {
            gain: gain / n,
            loss: loss / n,
        }
    }

    fn push(&mut self, change: f64, period: f64) {
        self.gain = (self.gain * (period - 1.0) + change.max(0.0)) / period;
        self.loss = (self.loss * (period - 1.0) + (-change).max(0.0)) / period;
    }

    fn value(self) -> f64 {
        if self.loss == 0.0 {
            return 100.0;
        }
        100.0 - 100.0 / (1.0 + self.gain / self.loss)
    }
}

/// RSI for every close from index `period` onward.
///
/// Empty when `period` is zero or there are fewer than `period + 1` closes.
pub fn calculate_rsi(closes: &[f64], period: usize) -> Vec<f64> {
    if period == 0 || closes.len() <= period {
        return Vec::new();
    }

    let changes: Vec<f64> = closes.windows(2).map(|w| w[1] - w[0]).collect();
    let (head, tail) = changes.split_at(period);
    let period_f = period as f64;

    let mut averages = WilderAverages::seed(head);
    let mut out = Vec::with_capacity(tail.len() + 1);
    out.push(averages.value());
    for &change in tail {
        averages.push(change, period_f);
        out.push(averages.value());
    }
    out
}

/// Latest RSI reading. `None` without enough history.
pub fn rsi(closes: &[f64], period: usize) -> Option<f64> {
    calculate_rsi(closes, period).last().copied()
}

/// Momentum bucket for the latest RSI.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum RsiState {
    Overbought,
    Oversold,
    Neutral,
}

impl RsiState {
    /// Thresholds are strict: exactly 70 or 30 is `Neutral`.
    ///
    /// An undefined reading is also `Neutral`, so callers cannot tell "no
    /// signal" apart from a neutral one.
    pub fn from_rsi(value: Option<f64>) -> Self {
        match value {
            Some(v) if v > OVERBOUGHT => Self::Overbought,
            Some(v) if v < OVERSOLD => Self::Oversold,
            _ => Self::Neutral,
        }
    }
}

impl std::fmt::Display for RsiState {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let label = match self {
            Self::Overbought => "Overbought",
            Self::Oversold => "Oversold",
            Self::Neutral => "Neutral",
        };
        f.write_str(label)
    }
}
