//! Unit tests for configuration loading and validation

use chrono::NaiveTime;
use signalbot::config::{Config, WindowMode, MAX_INTERVAL_SECS, MAX_SCHEDULE_OFFSET_SECS};
use signalbot::error::ConfigError;
use signalbot::schedule::ScheduledInstant;
use std::path::Path;

#[test]
fn test_defaults_are_valid() {
    let config = Config::default();
    assert!(config.validate().is_ok());
    assert_eq!(config.indicators.required_lookback(), 79);
    assert_eq!(config.schedule.daily_cap, 6);
    assert_eq!(config.schedule.timezone, chrono_tz::Europe::Amsterdam);
    assert_eq!(config.buffer.capacity, 200);
}

#[test]
fn test_parse_discrete_schedule() {
    let raw = r#"
        [instrument]
        symbol = "ETHUSDT"
        interval_secs = 60

        [schedule]
        timezone = "America/New_York"
        daily_cap = 3

        [schedule.mode]
        kind = "discrete"
        tolerance_secs = 30
        instants = [
            { entry_at = "09:30:00", lead_time_secs = 180 },
            { entry_at = "15:00:00", lead_time_secs = 120 },
        ]
    "#;
    let config = Config::from_toml(raw).unwrap();
    assert_eq!(config.instrument.symbol, "ETHUSDT");
    assert_eq!(config.schedule.timezone, chrono_tz::America::New_York);
    assert_eq!(config.schedule.daily_cap, 3);
    match &config.schedule.mode {
        WindowMode::Discrete {
            instants,
            tolerance_secs,
        } => {
            assert_eq!(*tolerance_secs, 30);
            assert_eq!(instants.len(), 2);
            assert_eq!(instants[0].entry_at, NaiveTime::from_hms_opt(9, 30, 0).unwrap());
            assert_eq!(instants[1].lead_time_secs, 120);
        }
        other => panic!("expected discrete mode, got {:?}", other),
    }
    // untouched sections keep their defaults
    assert_eq!(config.risk.take_profit_pct, 1.0);
    assert!(config.validate().is_ok());
}

#[test]
fn test_parse_rejects_unknown_timezone() {
    let raw = r#"
        [schedule]
        timezone = "Mars/Olympus_Mons"
    "#;
    assert!(matches!(Config::from_toml(raw), Err(ConfigError::Parse(_))));
}

#[test]
fn test_validation_errors() {
    let mut config = Config::default();
    config.buffer.capacity = 50;
    assert!(matches!(
        config.validate(),
        Err(ConfigError::Invalid {
            field: "buffer.capacity",
            ..
        })
    ));

    let mut config = Config::default();
    config.schedule.daily_cap = 0;
    assert!(config.validate().is_err());

    let mut config = Config::default();
    config.classifier.rsi_oversold = 80.0;
    assert!(config.validate().is_err());

    let mut config = Config::default();
    config.runtime.tick_cron = "every minute".to_string();
    assert!(matches!(
        config.validate(),
        Err(ConfigError::Invalid {
            field: "runtime.tick_cron",
            ..
        })
    ));

    let mut config = Config::default();
    config.schedule.mode = WindowMode::Range {
        windows: Vec::new(),
    };
    assert!(config.validate().is_err());
}

fn invalid_field(config: &Config) -> Option<&'static str> {
    match config.validate() {
        Err(ConfigError::Invalid { field, .. }) => Some(field),
        _ => None,
    }
}

#[test]
fn test_oversized_durations_rejected() {
    let mut config = Config::default();
    config.instrument.interval_secs = MAX_INTERVAL_SECS;
    assert!(config.validate().is_ok());
    config.instrument.interval_secs = u64::MAX;
    assert_eq!(invalid_field(&config), Some("instrument.interval_secs"));

    let mut config = Config::default();
    config.schedule.entry_delay_secs = u64::MAX;
    assert_eq!(invalid_field(&config), Some("schedule.entry_delay_secs"));

    let mut config = Config::default();
    config.schedule.expiry_secs = MAX_SCHEDULE_OFFSET_SECS + 1;
    assert_eq!(invalid_field(&config), Some("schedule.expiry_secs"));

    let instant = ScheduledInstant {
        entry_at: NaiveTime::from_hms_opt(9, 30, 0).unwrap(),
        lead_time_secs: 180,
    };
    let mut config = Config::default();
    config.schedule.mode = WindowMode::Discrete {
        instants: vec![instant],
        tolerance_secs: u64::MAX,
    };
    assert_eq!(invalid_field(&config), Some("schedule.mode.tolerance_secs"));

    config.schedule.mode = WindowMode::Discrete {
        instants: vec![ScheduledInstant {
            lead_time_secs: u64::MAX,
            ..instant
        }],
        tolerance_secs: 30,
    };
    assert_eq!(invalid_field(&config), Some("schedule.mode.instants"));
}

#[test]
fn test_timeouts_must_fit_the_tick_budget() {
    let mut config = Config::default();
    config.data_source.request_timeout_secs = config.runtime.fetch_timeout_secs + 1;
    assert_eq!(invalid_field(&config), Some("data_source.request_timeout_secs"));

    config.data_source.request_timeout_secs = 0;
    assert_eq!(invalid_field(&config), Some("data_source.request_timeout_secs"));

    let mut config = Config::default();
    config.notifier.request_timeout_secs = 0;
    assert_eq!(invalid_field(&config), Some("notifier.request_timeout_secs"));
}

#[test]
fn test_duplicate_instants_rejected() {
    let mut config = Config::default();
    config.schedule.mode = WindowMode::default_discrete();
    assert!(config.validate().is_ok());
    if let WindowMode::Discrete { instants, .. } = &mut config.schedule.mode {
        let first = instants[0];
        instants.push(first);
    }
    assert!(config.validate().is_err());
}

#[test]
fn test_example_file_loads() {
    let path = Path::new(env!("CARGO_MANIFEST_DIR")).join("config/signalbot.example.toml");
    let config = Config::load(Some(path.as_path())).unwrap();
    assert_eq!(config.schedule.mode, WindowMode::default());
    assert_eq!(config.indicators.required_lookback(), 79);
}

#[test]
fn test_missing_file_is_read_error() {
    let result = Config::load(Some(Path::new("/nonexistent/signalbot.toml")));
    assert!(matches!(result, Err(ConfigError::Read { .. })));
}

#[test]
fn test_env_overrides_endpoint() {
    std::env::set_var("CRYPTOCOMPARE_BASE_URL", "http://localhost:9999");
    let mut config = Config::default();
    config.apply_env_overrides();
    std::env::remove_var("CRYPTOCOMPARE_BASE_URL");
    assert_eq!(config.data_source.cryptocompare_base_url, "http://localhost:9999");
}
