//! Core application primitives: candle buffer, pipeline, runtime loop, HTTP

pub mod buffer;
pub mod http;
pub mod pipeline;
pub mod runtime;

pub use buffer::{CandleBuffer, MergeReport, PushOutcome};
pub use http::{create_router, start_server, AppState, HealthStatus};
pub use pipeline::{SignalPipeline, SkipReason, TickOutcome};
pub use runtime::SignalRuntime;
