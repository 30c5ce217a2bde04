//! Run configuration.
//!
//! Loaded once at start from an optional TOML file, then environment
//! overrides, then validated. Nothing here is reloaded while running.

use crate::error::ConfigError;
use crate::schedule::window::{ScheduledInstant, TimeWindow};
use chrono::NaiveTime;
use chrono_tz::Tz;
use serde::{Deserialize, Serialize};
use std::env;
use std::path::{Path, PathBuf};
use std::str::FromStr;

/// Longest accepted candle interval.
pub const MAX_INTERVAL_SECS: u64 = 7 * 86_400;
/// Longest accepted schedule offset (delays, expiry, lead and tolerance).
pub const MAX_SCHEDULE_OFFSET_SECS: u64 = 86_400;

/// Deployment environment name (`ENVIRONMENT`), defaults to `sandbox`.
pub fn get_environment() -> String {
    env::var("ENVIRONMENT").unwrap_or_else(|_| "sandbox".to_string())
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    pub instrument: InstrumentConfig,
    pub buffer: BufferConfig,
    pub indicators: IndicatorConfig,
    pub classifier: ClassifierConfig,
    pub schedule: ScheduleConfig,
    pub risk: RiskConfig,
    pub runtime: RuntimeConfig,
    pub data_source: DataSourceConfig,
    pub notifier: NotifierConfig,
}

impl Config {
    /// Load from `path` (defaults when `None`), apply environment overrides
    /// and validate.
    pub fn load(path: Option<&Path>) -> Result<Self, ConfigError> {
        let mut config = match path {
            Some(path) => {
                let raw = std::fs::read_to_string(path).map_err(|source| ConfigError::Read {
                    path: path.display().to_string(),
                    source,
                })?;
                Self::from_toml(&raw)?
            }
            None => Self::default(),
        };
        config.apply_env_overrides();
        config.validate()?;
        Ok(config)
    }

    pub fn from_toml(raw: &str) -> Result<Self, ConfigError> {
        Ok(toml::from_str(raw)?)
    }

    /// Secrets and endpoints may come from the environment instead of the file.
    pub fn apply_env_overrides(&mut self) {
        if let Ok(token) = env::var("TELEGRAM_BOT_TOKEN") {
            self.notifier.telegram_bot_token = Some(token);
        }
        if let Ok(chat_id) = env::var("TELEGRAM_CHAT_ID") {
            self.notifier.telegram_chat_id = Some(chat_id);
        }
        if let Ok(sid) = env::var("TWILIO_ACCOUNT_SID") {
            self.notifier.sms_account_sid = Some(sid);
        }
        if let Ok(token) = env::var("TWILIO_AUTH_TOKEN") {
            self.notifier.sms_auth_token = Some(token);
        }
        if let Ok(url) = env::var("BINANCE_BASE_URL") {
            self.data_source.binance_base_url = url;
        }
        if let Ok(url) = env::var("CRYPTOCOMPARE_BASE_URL") {
            self.data_source.cryptocompare_base_url = url;
        }
        if let Some(port) = env::var("PORT").ok().and_then(|p| p.parse().ok()) {
            self.runtime.http_port = port;
        }
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.instrument.symbol.trim().is_empty() {
            return Err(ConfigError::invalid("instrument.symbol", "must not be empty"));
        }
        if self.instrument.interval_secs == 0 || self.instrument.interval_secs > MAX_INTERVAL_SECS {
            return Err(ConfigError::invalid(
                "instrument.interval_secs",
                format!("must be between 1 and {}", MAX_INTERVAL_SECS),
            ));
        }
        self.indicators.validate()?;
        self.classifier.validate()?;
        self.schedule.validate()?;
        self.risk.validate()?;

        let required = self.indicators.required_lookback();
        if self.buffer.capacity < required {
            return Err(ConfigError::invalid(
                "buffer.capacity",
                format!(
                    "{} is below the {} candles the indicators need",
                    self.buffer.capacity, required
                ),
            ));
        }
        if self.buffer.fetch_limit < 2 || self.buffer.fetch_limit > self.buffer.capacity {
            return Err(ConfigError::invalid(
                "buffer.fetch_limit",
                "must be between 2 and buffer.capacity",
            ));
        }
        if cron::Schedule::from_str(&self.runtime.tick_cron).is_err() {
            return Err(ConfigError::invalid(
                "runtime.tick_cron",
                format!("'{}' is not a valid cron expression", self.runtime.tick_cron),
            ));
        }
        if self.runtime.fetch_timeout_secs == 0 {
            return Err(ConfigError::invalid("runtime.fetch_timeout_secs", "must be > 0"));
        }
        let request_timeout = self.data_source.request_timeout_secs;
        if request_timeout == 0 || request_timeout > self.runtime.fetch_timeout_secs {
            return Err(ConfigError::invalid(
                "data_source.request_timeout_secs",
                "must be > 0 and not above runtime.fetch_timeout_secs",
            ));
        }
        self.notifier.validate()?;
        Ok(())
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct InstrumentConfig {
    pub symbol: String,
    /// Candle interval; consecutive candles further apart are a data gap.
    pub interval_secs: u64,
}

impl Default for InstrumentConfig {
    fn default() -> Self {
        Self {
            symbol: "BTCUSDT".to_string(),
            interval_secs: 60,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct BufferConfig {
    pub capacity: usize,
    /// Candles requested from the data source on every tick after warm-up.
    pub fetch_limit: usize,
}

impl Default for BufferConfig {
    fn default() -> Self {
        Self {
            capacity: 200,
            fetch_limit: 100,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct IndicatorConfig {
    pub rsi_period: usize,
    pub macd_fast: usize,
    pub macd_slow: usize,
    pub macd_signal: usize,
    pub bollinger_period: usize,
    pub bollinger_std_dev: f64,
    pub stochastic_k: usize,
    pub stochastic_d: usize,
    pub atr_period: usize,
    pub ichimoku_conversion: usize,
    pub ichimoku_base: usize,
    pub ichimoku_span_b: usize,
    pub ichimoku_displacement: usize,
    pub fib_lookback: usize,
    pub volume_period: usize,
    /// Relative band around the volume baseline treated as flat.
    pub volume_tolerance: f64,
    pub swing_lookback: usize,
}

impl Default for IndicatorConfig {
    fn default() -> Self {
        Self {
            rsi_period: 14,
            macd_fast: 12,
            macd_slow: 26,
            macd_signal: 9,
            bollinger_period: 20,
            bollinger_std_dev: 2.0,
            stochastic_k: 14,
            stochastic_d: 3,
            atr_period: 14,
            ichimoku_conversion: 9,
            ichimoku_base: 26,
            ichimoku_span_b: 52,
            ichimoku_displacement: 26,
            fib_lookback: 50,
            volume_period: 5,
            volume_tolerance: 0.0,
            swing_lookback: 20,
        }
    }
}

impl IndicatorConfig {
    /// Candles needed for every indicator on both the previous and the
    /// current snapshot.
    pub fn required_lookback(&self) -> usize {
        let per_snapshot = [
            self.rsi_period + 1,
            self.macd_slow + self.macd_signal,
            self.bollinger_period,
            self.stochastic_k + self.stochastic_d - 1,
            self.atr_period + 1,
            self.ichimoku_conversion
                .max(self.ichimoku_base)
                .max(self.ichimoku_span_b)
                + self.ichimoku_displacement,
            self.fib_lookback,
            self.volume_period + 1,
            self.swing_lookback + 1,
        ]
        .into_iter()
        .max()
        .unwrap_or(0);
        per_snapshot + 1
    }

    fn validate(&self) -> Result<(), ConfigError> {
        let periods = [
            ("indicators.rsi_period", self.rsi_period),
            ("indicators.macd_fast", self.macd_fast),
            ("indicators.macd_signal", self.macd_signal),
            ("indicators.stochastic_k", self.stochastic_k),
            ("indicators.stochastic_d", self.stochastic_d),
            ("indicators.atr_period", self.atr_period),
            ("indicators.ichimoku_conversion", self.ichimoku_conversion),
            ("indicators.ichimoku_base", self.ichimoku_base),
            ("indicators.ichimoku_span_b", self.ichimoku_span_b),
            ("indicators.fib_lookback", self.fib_lookback),
            ("indicators.volume_period", self.volume_period),
            ("indicators.swing_lookback", self.swing_lookback),
        ];
        for (field, value) in periods {
            if value == 0 {
                return Err(ConfigError::invalid(field, "must be > 0"));
            }
        }
        if self.bollinger_period < 2 {
            return Err(ConfigError::invalid("indicators.bollinger_period", "must be >= 2"));
        }
        if self.macd_fast >= self.macd_slow {
            return Err(ConfigError::invalid(
                "indicators.macd_fast",
                "must be shorter than indicators.macd_slow",
            ));
        }
        if !(self.bollinger_std_dev > 0.0) {
            return Err(ConfigError::invalid("indicators.bollinger_std_dev", "must be > 0"));
        }
        if !(self.volume_tolerance >= 0.0) {
            return Err(ConfigError::invalid("indicators.volume_tolerance", "must be >= 0"));
        }
        Ok(())
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ClassifierConfig {
    pub rsi_oversold: f64,
    pub rsi_overbought: f64,
    pub stochastic_oversold: f64,
    pub stochastic_overbought: f64,
    /// Relative distance from a Fibonacci level counted as "at" the level.
    pub fib_tolerance: f64,
    /// Primary rules that must hold for a direction (out of 4).
    pub primary_required: usize,
    /// Secondary confirmations needed for STRONG.
    pub strong_secondary_min: usize,
}

impl Default for ClassifierConfig {
    fn default() -> Self {
        Self {
            rsi_oversold: 30.0,
            rsi_overbought: 70.0,
            stochastic_oversold: 20.0,
            stochastic_overbought: 80.0,
            fib_tolerance: 0.01,
            primary_required: 4,
            strong_secondary_min: 2,
        }
    }
}

impl ClassifierConfig {
    fn validate(&self) -> Result<(), ConfigError> {
        let in_range = |v: f64| (0.0..=100.0).contains(&v);
        if !in_range(self.rsi_oversold)
            || !in_range(self.rsi_overbought)
            || self.rsi_oversold >= self.rsi_overbought
        {
            return Err(ConfigError::invalid(
                "classifier.rsi_oversold",
                "thresholds must lie in [0, 100] with oversold < overbought",
            ));
        }
        if !in_range(self.stochastic_oversold)
            || !in_range(self.stochastic_overbought)
            || self.stochastic_oversold >= self.stochastic_overbought
        {
            return Err(ConfigError::invalid(
                "classifier.stochastic_oversold",
                "thresholds must lie in [0, 100] with oversold < overbought",
            ));
        }
        if !(1..=4).contains(&self.primary_required) {
            return Err(ConfigError::invalid("classifier.primary_required", "must be 1..=4"));
        }
        if !(1..=3).contains(&self.strong_secondary_min) {
            return Err(ConfigError::invalid(
                "classifier.strong_secondary_min",
                "must be 1..=3",
            ));
        }
        if !(self.fib_tolerance >= 0.0) {
            return Err(ConfigError::invalid("classifier.fib_tolerance", "must be >= 0"));
        }
        Ok(())
    }
}

/// How admission windows are described.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum WindowMode {
    /// Admit anywhere inside one of the local time-of-day ranges.
    Range { windows: Vec<TimeWindow> },
    /// Admit only within `tolerance_secs` of each instant's check time.
    Discrete {
        instants: Vec<ScheduledInstant>,
        tolerance_secs: u64,
    },
}

impl Default for WindowMode {
    fn default() -> Self {
        WindowMode::Range {
            windows: vec![
                TimeWindow::new(hm(8, 0), hm(11, 0)),
                TimeWindow::new(hm(17, 0), hm(19, 0)),
            ],
        }
    }
}

impl WindowMode {
    /// Six checks a day, three minutes ahead of half-hourly entries.
    pub fn default_discrete() -> Self {
        let entries = [hm(8, 30), hm(9, 0), hm(9, 30), hm(17, 30), hm(18, 0), hm(18, 30)];
        WindowMode::Discrete {
            instants: entries
                .into_iter()
                .map(|entry_at| ScheduledInstant::new(entry_at, 180))
                .collect(),
            tolerance_secs: 60,
        }
    }
}

fn hm(hour: u32, minute: u32) -> NaiveTime {
    NaiveTime::from_hms_opt(hour, minute, 0).unwrap_or(NaiveTime::MIN)
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ScheduleConfig {
    /// IANA zone the windows and the trading day are expressed in.
    pub timezone: Tz,
    pub daily_cap: u32,
    pub mode: WindowMode,
    /// Range mode: delay between generation and the suggested entry.
    pub entry_delay_secs: u64,
    pub expiry_secs: u64,
}

impl Default for ScheduleConfig {
    fn default() -> Self {
        Self {
            timezone: chrono_tz::Europe::Amsterdam,
            daily_cap: 6,
            mode: WindowMode::default(),
            entry_delay_secs: 180,
            expiry_secs: 300,
        }
    }
}

impl ScheduleConfig {
    fn validate(&self) -> Result<(), ConfigError> {
        if self.daily_cap == 0 {
            return Err(ConfigError::invalid("schedule.daily_cap", "must be > 0"));
        }
        let offsets = [
            ("schedule.entry_delay_secs", self.entry_delay_secs),
            ("schedule.expiry_secs", self.expiry_secs),
        ];
        for (field, value) in offsets {
            if value > MAX_SCHEDULE_OFFSET_SECS {
                return Err(ConfigError::invalid(
                    field,
                    format!("must not exceed {}", MAX_SCHEDULE_OFFSET_SECS),
                ));
            }
        }
        match &self.mode {
            WindowMode::Range { windows } => {
                if windows.is_empty() {
                    return Err(ConfigError::invalid("schedule.mode.windows", "must not be empty"));
                }
                if let Some(w) = windows.iter().find(|w| w.start >= w.end) {
                    return Err(ConfigError::invalid(
                        "schedule.mode.windows",
                        format!("window {} - {} does not end after it starts", w.start, w.end),
                    ));
                }
            }
            WindowMode::Discrete {
                instants,
                tolerance_secs,
            } => {
                if instants.is_empty() {
                    return Err(ConfigError::invalid("schedule.mode.instants", "must not be empty"));
                }
                if *tolerance_secs > MAX_SCHEDULE_OFFSET_SECS {
                    return Err(ConfigError::invalid(
                        "schedule.mode.tolerance_secs",
                        format!("must not exceed {}", MAX_SCHEDULE_OFFSET_SECS),
                    ));
                }
                if instants
                    .iter()
                    .any(|i| i.lead_time_secs > MAX_SCHEDULE_OFFSET_SECS)
                {
                    return Err(ConfigError::invalid(
                        "schedule.mode.instants",
                        format!("lead_time_secs must not exceed {}", MAX_SCHEDULE_OFFSET_SECS),
                    ));
                }
                let mut seen: Vec<NaiveTime> = instants.iter().map(|i| i.entry_at).collect();
                seen.sort();
                seen.dedup();
                if seen.len() != instants.len() {
                    return Err(ConfigError::invalid(
                        "schedule.mode.instants",
                        "entry times must be unique",
                    ));
                }
            }
        }
        Ok(())
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct RiskConfig {
    pub base_position_pct: f64,
    pub min_position_pct: f64,
    pub max_position_pct: f64,
    pub strong_multiplier: f64,
    pub moderate_multiplier: f64,
    /// ATR as a percentage of price considered "normal" volatility.
    pub baseline_atr_pct: f64,
    pub volatility_adjustment_min: f64,
    pub volatility_adjustment_max: f64,
    pub stop_atr_multiplier: f64,
    /// Technical levels closer to entry than this many ATRs are ignored.
    pub min_stop_atr: f64,
    pub take_profit_pct: f64,
    pub secondary_take_profit_pct: f64,
}

impl Default for RiskConfig {
    fn default() -> Self {
        Self {
            base_position_pct: 2.0,
            min_position_pct: 0.5,
            max_position_pct: 2.0,
            strong_multiplier: 1.0,
            moderate_multiplier: 0.75,
            baseline_atr_pct: 0.1,
            volatility_adjustment_min: 0.5,
            volatility_adjustment_max: 1.5,
            stop_atr_multiplier: 1.5,
            min_stop_atr: 0.5,
            take_profit_pct: 1.0,
            secondary_take_profit_pct: 1.5,
        }
    }
}

impl RiskConfig {
    fn validate(&self) -> Result<(), ConfigError> {
        if !(self.min_position_pct > 0.0) || self.min_position_pct > self.max_position_pct {
            return Err(ConfigError::invalid(
                "risk.min_position_pct",
                "must be > 0 and not above risk.max_position_pct",
            ));
        }
        if !(self.base_position_pct > 0.0) {
            return Err(ConfigError::invalid("risk.base_position_pct", "must be > 0"));
        }
        if !(self.baseline_atr_pct > 0.0) {
            return Err(ConfigError::invalid("risk.baseline_atr_pct", "must be > 0"));
        }
        if !(self.volatility_adjustment_min > 0.0)
            || self.volatility_adjustment_min > self.volatility_adjustment_max
        {
            return Err(ConfigError::invalid(
                "risk.volatility_adjustment_min",
                "must be > 0 and not above risk.volatility_adjustment_max",
            ));
        }
        if !(self.stop_atr_multiplier > 0.0) {
            return Err(ConfigError::invalid("risk.stop_atr_multiplier", "must be > 0"));
        }
        if !(self.take_profit_pct > 0.0) || !(self.secondary_take_profit_pct > 0.0) {
            return Err(ConfigError::invalid("risk.take_profit_pct", "targets must be > 0"));
        }
        Ok(())
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct RuntimeConfig {
    /// Six-field cron expression (with seconds) driving evaluation ticks.
    pub tick_cron: String,
    pub fetch_timeout_secs: u64,
    pub http_port: u16,
}

impl Default for RuntimeConfig {
    fn default() -> Self {
        Self {
            tick_cron: "5 * * * * *".to_string(),
            fetch_timeout_secs: 10,
            http_port: 8080,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct DataSourceConfig {
    pub binance_base_url: String,
    pub cryptocompare_base_url: String,
    pub base_asset: String,
    pub quote_asset: String,
    /// Retries per source before falling back to the next one.
    pub max_retries: usize,
    /// Limit on a single HTTP request to a collector.
    pub request_timeout_secs: u64,
}

impl Default for DataSourceConfig {
    fn default() -> Self {
        Self {
            binance_base_url: "https://api.binance.com".to_string(),
            cryptocompare_base_url: "https://min-api.cryptocompare.com".to_string(),
            base_asset: "BTC".to_string(),
            quote_asset: "USDT".to_string(),
            max_retries: 3,
            request_timeout_secs: 4,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct NotifierConfig {
    pub telegram_base_url: String,
    pub telegram_bot_token: Option<String>,
    pub telegram_chat_id: Option<String>,
    /// Twilio-compatible messaging API.
    pub sms_base_url: String,
    pub sms_account_sid: Option<String>,
    pub sms_auth_token: Option<String>,
    pub sms_from_number: Option<String>,
    pub sms_recipients: Vec<String>,
    /// Directory receiving a JSON copy of every emitted signal.
    pub archive_dir: Option<PathBuf>,
    pub request_timeout_secs: u64,
}

impl Default for NotifierConfig {
    fn default() -> Self {
        Self {
            telegram_base_url: "https://api.telegram.org".to_string(),
            telegram_bot_token: None,
            telegram_chat_id: None,
            sms_base_url: "https://api.twilio.com".to_string(),
            sms_account_sid: None,
            sms_auth_token: None,
            sms_from_number: None,
            sms_recipients: Vec::new(),
            archive_dir: None,
            request_timeout_secs: 30,
        }
    }
}

impl NotifierConfig {
    pub fn telegram_enabled(&self) -> bool {
        self.telegram_bot_token.is_some() && self.telegram_chat_id.is_some()
    }

    pub fn sms_enabled(&self) -> bool {
        self.sms_account_sid.is_some()
            && self.sms_auth_token.is_some()
            && self.sms_from_number.is_some()
            && !self.sms_recipients.is_empty()
    }

    fn validate(&self) -> Result<(), ConfigError> {
        if self.request_timeout_secs == 0 {
            return Err(ConfigError::invalid("notifier.request_timeout_secs", "must be > 0"));
        }
        Ok(())
    }
}
