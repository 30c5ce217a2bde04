//! signalbot: candle-driven signal generation and risk engine for a single
//! instrument.
//!
//! Data flows candle buffer -> indicator engine -> classifier -> window gate
//! -> risk calculator, orchestrated one tick at a time by
//! [`core::pipeline::SignalPipeline`].

pub mod common;
pub mod config;
pub mod core;
pub mod error;
pub mod indicators;
pub mod logging;
pub mod metrics;
pub mod models;
pub mod risk;
pub mod schedule;
pub mod services;
pub mod signals;
