//! Signal pipeline: one evaluation tick from fetch to notification.

use crate::config::Config;
use crate::core::buffer::{CandleBuffer, MergeReport};
use crate::indicators::IndicatorEngine;
use crate::metrics::Metrics;
use crate::models::indicators::{Candle, SnapshotPair};
use crate::models::signal::Signal;
use crate::risk::RiskCalculator;
use crate::schedule::{DailyLedger, GateDecision, Rejection, WindowGate};
use crate::services::market_data::CandleSource;
use crate::services::notifier::Notifier;
use crate::signals::{Classification, SignalClassifier};
use chrono::{DateTime, NaiveDate, Utc};
use std::fmt;
use std::sync::Arc;
use std::time::{Duration, Instant};
use tracing::{debug, error, info, warn};

/// Why a tick stopped before classification produced a result.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SkipReason {
    FetchFailed,
    FetchTimeout,
    /// Not enough candles yet for the primary indicators.
    Warmup,
    /// A gap left too short a contiguous run for MACD or Stochastic.
    DataGap,
    /// Risk parameters could not be derived; the ledger was not touched.
    RiskUnavailable,
    /// The latest closed candle was already evaluated on an earlier tick.
    NoNewCandle,
}

impl SkipReason {
    pub fn as_str(&self) -> &'static str {
        match self {
            SkipReason::FetchFailed => "fetch_failed",
            SkipReason::FetchTimeout => "fetch_timeout",
            SkipReason::Warmup => "warmup",
            SkipReason::DataGap => "data_gap",
            SkipReason::RiskUnavailable => "risk_unavailable",
            SkipReason::NoNewCandle => "no_new_candle",
        }
    }
}

impl fmt::Display for SkipReason {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Debug, Clone, PartialEq)]
pub enum TickOutcome {
    Emitted(Signal),
    NoCandidate,
    Ambiguous,
    Rejected(Rejection),
    Skipped(SkipReason),
}

impl TickOutcome {
    pub fn label(&self) -> &'static str {
        match self {
            TickOutcome::Emitted(_) => "emitted",
            TickOutcome::NoCandidate => "no_candidate",
            TickOutcome::Ambiguous => "ambiguous",
            TickOutcome::Rejected(rejection) => rejection.as_str(),
            TickOutcome::Skipped(reason) => reason.as_str(),
        }
    }

    pub fn signal(&self) -> Option<&Signal> {
        match self {
            TickOutcome::Emitted(signal) => Some(signal),
            _ => None,
        }
    }
}

pub struct SignalPipeline {
    symbol: String,
    source: Arc<dyn CandleSource>,
    notifier: Arc<dyn Notifier>,
    buffer: CandleBuffer,
    engine: IndicatorEngine,
    classifier: SignalClassifier,
    gate: WindowGate,
    risk: RiskCalculator,
    ledger: DailyLedger,
    last_evaluated: Option<DateTime<Utc>>,
    fetch_limit: usize,
    fetch_timeout: Duration,
    expiry: Duration,
    metrics: Option<Arc<Metrics>>,
}

impl SignalPipeline {
    pub fn new(
        config: &Config,
        source: Arc<dyn CandleSource>,
        notifier: Arc<dyn Notifier>,
    ) -> Self {
        Self {
            symbol: config.instrument.symbol.clone(),
            source,
            notifier,
            buffer: CandleBuffer::new(config.buffer.capacity, config.instrument.interval_secs),
            engine: IndicatorEngine::new(
                config.indicators.clone(),
                config.instrument.interval_secs,
            ),
            classifier: SignalClassifier::new(config.classifier.clone()),
            gate: WindowGate::new(&config.schedule),
            risk: RiskCalculator::new(config.risk.clone()),
            // rolls over to the real local day on the first admission
            ledger: DailyLedger::new(NaiveDate::MIN),
            last_evaluated: None,
            fetch_limit: config.buffer.fetch_limit,
            fetch_timeout: Duration::from_secs(config.runtime.fetch_timeout_secs),
            expiry: Duration::from_secs(config.schedule.expiry_secs),
            metrics: None,
        }
    }

    pub fn with_metrics(mut self, metrics: Arc<Metrics>) -> Self {
        self.metrics = Some(metrics);
        self
    }

    /// Resume from a ledger saved earlier in the day.
    pub fn with_ledger(mut self, ledger: DailyLedger) -> Self {
        self.ledger = ledger;
        self
    }

    pub fn ledger(&self) -> &DailyLedger {
        &self.ledger
    }

    pub fn buffer(&self) -> &CandleBuffer {
        &self.buffer
    }

    pub fn symbol(&self) -> &str {
        &self.symbol
    }

    /// Timestamp of the newest candle a tick has evaluated.
    pub fn last_evaluated(&self) -> Option<DateTime<Utc>> {
        self.last_evaluated
    }

    /// Fetch, merge and evaluate. The first tick seeds the whole buffer.
    /// Each closed candle is evaluated at most once.
    pub async fn tick(&mut self, now: DateTime<Utc>) -> TickOutcome {
        let started = Instant::now();
        if let Some(metrics) = &self.metrics {
            metrics.ticks_total.inc();
        }

        let outcome = match self.fetch().await {
            Ok(candles) => {
                let report = self.ingest(&candles);
                debug!(
                    symbol = %self.symbol,
                    appended = report.appended,
                    already_buffered = report.already_buffered,
                    rejected = report.rejected,
                    buffered = self.buffer.len(),
                    "Merged fetched candles"
                );
                let latest = self.buffer.latest().map(|c| c.timestamp);
                if latest.is_some() && latest == self.last_evaluated {
                    debug!(
                        symbol = %self.symbol,
                        latest = ?latest,
                        "No new closed candle since the last tick"
                    );
                    TickOutcome::Skipped(SkipReason::NoNewCandle)
                } else {
                    self.last_evaluated = latest;
                    self.evaluate(now).await
                }
            }
            Err(reason) => TickOutcome::Skipped(reason),
        };

        if let Some(metrics) = &self.metrics {
            metrics
                .tick_duration_seconds
                .observe(started.elapsed().as_secs_f64());
            if let TickOutcome::Skipped(reason) = &outcome {
                metrics
                    .ticks_skipped_total
                    .with_label_values(&[reason.as_str()])
                    .inc();
            }
            if self.ledger.date != self.gate.local_date(now) {
                metrics.signals_today.set(0);
            }
        }
        outcome
    }

    async fn fetch(&self) -> Result<Vec<Candle>, SkipReason> {
        let limit = if self.buffer.is_empty() {
            self.buffer.capacity()
        } else {
            self.fetch_limit
        };

        match tokio::time::timeout(self.fetch_timeout, self.source.fetch_latest(limit)).await {
            Ok(Ok(candles)) => Ok(candles),
            Ok(Err(e)) => {
                warn!(
                    symbol = %self.symbol,
                    source = self.source.name(),
                    error = %e,
                    "Candle fetch failed, skipping tick"
                );
                Err(SkipReason::FetchFailed)
            }
            Err(_) => {
                warn!(
                    symbol = %self.symbol,
                    timeout_secs = self.fetch_timeout.as_secs(),
                    "Candle fetch timed out, skipping tick"
                );
                Err(SkipReason::FetchTimeout)
            }
        }
    }

    /// Merge candles into the buffer without evaluating.
    pub fn ingest(&mut self, candles: &[Candle]) -> MergeReport {
        self.buffer.merge(candles)
    }

    /// Evaluate the buffer as it stands.
    pub async fn evaluate(&mut self, now: DateTime<Utc>) -> TickOutcome {
        let Some(pair) = self.engine.compute_pair(self.buffer.candles()) else {
            warn!(
                symbol = %self.symbol,
                buffered = self.buffer.len(),
                "Not enough candles to evaluate, skipping tick"
            );
            return TickOutcome::Skipped(SkipReason::Warmup);
        };
        self.process_snapshots(pair, now).await
    }

    /// Classify, gate, size and notify for a computed snapshot pair.
    pub async fn process_snapshots(
        &mut self,
        pair: SnapshotPair,
        now: DateTime<Utc>,
    ) -> TickOutcome {
        let candidate = match self.classifier.classify(&pair) {
            Classification::Candidate(candidate) => candidate,
            Classification::NoSignal => {
                debug!(symbol = %self.symbol, "No candidate this tick");
                return TickOutcome::NoCandidate;
            }
            Classification::Ambiguous { buy, sell } => {
                warn!(
                    symbol = %self.symbol,
                    buy_secondary = buy.secondary_count(),
                    sell_secondary = sell.secondary_count(),
                    "Buy and sell conditions both hold, suppressing signal"
                );
                return TickOutcome::Ambiguous;
            }
            Classification::Incomplete => {
                let reason = self.incomplete_reason();
                warn!(
                    symbol = %self.symbol,
                    reason = %reason,
                    buffered = self.buffer.len(),
                    contiguous = self.buffer.contiguous_len(),
                    "Indicators undefined, skipping tick"
                );
                return TickOutcome::Skipped(reason);
            }
        };

        let (next_ledger, decision) = self.gate.admit(self.ledger.clone(), now);
        let admission = match decision {
            GateDecision::Admitted(admission) => admission,
            GateDecision::Rejected(rejection) => {
                debug!(
                    symbol = %self.symbol,
                    direction = %candidate.direction,
                    reason = %rejection,
                    "Candidate rejected by window gate"
                );
                if let Some(metrics) = &self.metrics {
                    metrics
                        .gate_rejections_total
                        .with_label_values(&[rejection.as_str()])
                        .inc();
                }
                return TickOutcome::Rejected(rejection);
            }
        };

        let risk = match self
            .risk
            .calculate(candidate.direction, candidate.strength, &pair)
        {
            Ok(risk) => risk,
            Err(e) => {
                error!(
                    symbol = %self.symbol,
                    direction = %candidate.direction,
                    error = %e,
                    "Risk calculation failed, abandoning tick"
                );
                return TickOutcome::Skipped(SkipReason::RiskUnavailable);
            }
        };

        self.ledger = next_ledger;

        let signal = Signal {
            sequence: admission.sequence,
            symbol: self.symbol.clone(),
            direction: candidate.direction,
            strength: candidate.strength,
            generated_at: now,
            scheduled_entry_at: admission.scheduled_entry_at,
            expiry: self.expiry,
            entry_price: risk.entry_price,
            position_size_pct: risk.position_size_pct,
            stop_loss_price: risk.stop_loss_price,
            stop_basis: risk.stop_basis,
            take_profit_pct: risk.take_profit_pct,
            take_profit_price: risk.take_profit_price,
            secondary_take_profit_pct: risk.secondary_take_profit_pct,
        };

        info!(
            symbol = %self.symbol,
            sequence = signal.sequence,
            direction = %signal.direction,
            strength = %signal.strength,
            secondary = ?candidate.conditions.met_secondary(),
            entry_price = signal.entry_price,
            "Signal admitted"
        );
        if let Some(metrics) = &self.metrics {
            metrics
                .signals_emitted_total
                .with_label_values(&[signal.direction.as_str(), signal.strength.as_str()])
                .inc();
            metrics.signals_today.set(self.ledger.emitted_count as i64);
        }

        if let Err(e) = self.notifier.notify(&signal).await {
            error!(
                symbol = %self.symbol,
                sequence = signal.sequence,
                notifier = self.notifier.name(),
                error = %e,
                "Failed to deliver signal"
            );
        }

        TickOutcome::Emitted(signal)
    }

    fn incomplete_reason(&self) -> SkipReason {
        let contiguous = self.buffer.contiguous_len();
        if contiguous < self.buffer.len() && contiguous < self.engine.required_contiguous() {
            SkipReason::DataGap
        } else {
            SkipReason::Warmup
        }
    }
}
