//! Shared data models spanning the engine layers.

pub mod indicators;
pub mod signal;

pub use indicators::{
    BollingerBandsIndicator, Candle, FibonacciLevels, IchimokuIndicator, IchimokuState,
    IndicatorSnapshot, MacdIndicator, SnapshotPair, StochasticIndicator,
    SupportResistanceIndicator, VolumeTrend,
};
pub use signal::{Signal, SignalDirection, SignalStrength, StopBasis};
