//! Exchange-agnostic market analysis types.

pub mod analysis;
pub mod candle;
pub mod error;
pub mod indicator;
pub mod schedule;
pub mod signal;
pub mod symbol;
pub mod timeframe;

// Core domain types
pub use analysis::{AnalysisRecord, NewAnalysis, Outcome, Recommendation, Verification};
pub use candle::{Candle, PriceTick};
pub use symbol::Symbol;
pub use timeframe::Timeframe;

// Indicators and signals
pub use indicator::{IndicatorSeries, IndicatorSnapshot, Readings, Stance};
pub use signal::{Direction, Signal, SignalKind, SignalSummary, Strength};

pub use schedule::ClockSchedule;
