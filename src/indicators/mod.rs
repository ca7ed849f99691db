// =============================================================================
// Technical Indicators Module
// =============================================================================
//
// Pure functions over an ascending slice of closes. The single-value entry
// points return `Option<T>`; `None` means insufficient history.

pub mod ema;
pub mod macd;
pub mod rsi;

pub use ema::{ema, EMA_LONG_PERIOD, EMA_MEDIUM_PERIOD};
pub use macd::{macd, MacdState, MACD_FAST, MACD_SIGNAL, MACD_SLOW};
pub use rsi::{rsi, RsiState, RSI_PERIOD};
