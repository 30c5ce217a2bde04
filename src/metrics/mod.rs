//! Prometheus metrics for the evaluation loop and the HTTP endpoint.

use prometheus::{
    Encoder, Histogram, HistogramOpts, IntCounter, IntCounterVec, IntGauge, Opts, Registry,
    TextEncoder,
};

pub struct Metrics {
    registry: Registry,
    pub ticks_total: IntCounter,
    pub ticks_skipped_total: IntCounterVec,
    pub gate_rejections_total: IntCounterVec,
    pub signals_emitted_total: IntCounterVec,
    pub signals_today: IntGauge,
    pub tick_duration_seconds: Histogram,
    pub http_requests_total: IntCounter,
    pub http_request_duration_seconds: Histogram,
    pub http_requests_in_flight: IntGauge,
}

impl Metrics {
    pub fn new() -> Result<Self, prometheus::Error> {
        let registry = Registry::new();

        let ticks_total = IntCounter::new("signal_ticks_total", "Evaluation ticks run")?;
        let ticks_skipped_total = IntCounterVec::new(
            Opts::new("signal_ticks_skipped_total", "Ticks skipped before classification"),
            &["reason"],
        )?;
        let gate_rejections_total = IntCounterVec::new(
            Opts::new("signal_gate_rejections_total", "Candidates rejected by the window gate"),
            &["reason"],
        )?;
        let signals_emitted_total = IntCounterVec::new(
            Opts::new("signals_emitted_total", "Signals admitted and handed to the notifier"),
            &["direction", "strength"],
        )?;
        let signals_today =
            IntGauge::new("signals_today", "Signals emitted on the current local day")?;
        let tick_duration_seconds = Histogram::with_opts(
            HistogramOpts::new("signal_tick_duration_seconds", "Evaluation tick duration")
                .buckets(vec![0.01, 0.05, 0.1, 0.25, 0.5, 1.0, 2.5, 5.0, 10.0]),
        )?;
        let http_requests_total =
            IntCounter::new("http_requests_total", "HTTP requests served")?;
        let http_request_duration_seconds = Histogram::with_opts(HistogramOpts::new(
            "http_request_duration_seconds",
            "HTTP request duration",
        ))?;
        let http_requests_in_flight =
            IntGauge::new("http_requests_in_flight", "HTTP requests currently in flight")?;

        registry.register(Box::new(ticks_total.clone()))?;
        registry.register(Box::new(ticks_skipped_total.clone()))?;
        registry.register(Box::new(gate_rejections_total.clone()))?;
        registry.register(Box::new(signals_emitted_total.clone()))?;
        registry.register(Box::new(signals_today.clone()))?;
        registry.register(Box::new(tick_duration_seconds.clone()))?;
        registry.register(Box::new(http_requests_total.clone()))?;
        registry.register(Box::new(http_request_duration_seconds.clone()))?;
        registry.register(Box::new(http_requests_in_flight.clone()))?;

        Ok(Self {
            registry,
            ticks_total,
            ticks_skipped_total,
            gate_rejections_total,
            signals_emitted_total,
            signals_today,
            tick_duration_seconds,
            http_requests_total,
            http_request_duration_seconds,
            http_requests_in_flight,
        })
    }

    /// Text exposition of every registered metric.
    pub fn export(&self) -> Result<String, prometheus::Error> {
        let mut buffer = Vec::new();
        TextEncoder::new().encode(&self.registry.gather(), &mut buffer)?;
        String::from_utf8(buffer).map_err(|e| prometheus::Error::Msg(e.to_string()))
    }
}
