//! Adapters around the engine: market data collectors and notifiers.

pub mod archive;
pub mod binance;
pub mod cryptocompare;
pub mod fallback;
pub mod market_data;
pub mod notifier;
pub mod sms;

pub use archive::ArchiveNotifier;
pub use binance::BinanceCandleSource;
pub use cryptocompare::CryptoCompareCandleSource;
pub use fallback::FallbackCandleSource;
pub use market_data::CandleSource;
pub use notifier::{
    format_message, format_plain, BroadcastNotifier, LogNotifier, Notifier, TelegramNotifier,
};
pub use sms::SmsNotifier;
