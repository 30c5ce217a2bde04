//! Integration tests for signal notifiers

use crate::test_utils::{utc, RecordingNotifier};
use chrono::Duration;
use serde_json::json;
use signalbot::config::NotifierConfig;
use signalbot::error::NotifyError;
use signalbot::models::signal::{Signal, SignalDirection, SignalStrength, StopBasis};
use signalbot::services::{
    format_message, format_plain, ArchiveNotifier, BroadcastNotifier, LogNotifier, Notifier,
    SmsNotifier, TelegramNotifier,
};
use std::sync::Arc;
use tokio_test::assert_ok;
use wiremock::matchers::{body_partial_json, body_string_contains, header, method, path};
use wiremock::{Mock, MockServer, ResponseTemplate};

fn sample_signal() -> Signal {
    let generated_at = utc(2024, 1, 15, 8, 0, 0);
    Signal {
        sequence: 1,
        symbol: "BTCUSDT".to_string(),
        direction: SignalDirection::Buy,
        strength: SignalStrength::Moderate,
        generated_at,
        scheduled_entry_at: generated_at + Duration::seconds(180),
        expiry: std::time::Duration::from_secs(300),
        entry_price: 100.0,
        position_size_pct: 1.5,
        stop_loss_price: 98.5,
        stop_basis: StopBasis::Atr,
        take_profit_pct: 1.0,
        take_profit_price: 101.0,
        secondary_take_profit_pct: None,
    }
}

#[test]
fn message_shows_local_and_utc_times() {
    let text = format_message(&sample_signal(), chrono_tz::Europe::Amsterdam);

    assert!(text.starts_with("🟢 <b>BTCUSDT SIGNAL #1</b>"));
    assert!(text.contains("📊 <b>Type:</b> BUY"));
    assert!(text.contains("⏰ <b>Signal Time:</b> 09:00:00 Europe/Amsterdam"));
    assert!(text.contains("🚀 <b>ENTER TRADE AT:</b> 09:03 local / 08:03 UTC"));
    assert!(text.contains("⏳ <b>Expiry:</b> 5 minutes"));
    assert!(text.contains("🎯 <b>Target:</b> +1.0% ($101.00)"));
    assert!(text.contains("🛑 <b>Stop-Loss:</b> $98.50"));
    assert!(text.contains("💰 <b>Position Size:</b> 1.5%"));
    assert!(text.contains("💪 <b>Conviction:</b> MODERATE"));
    assert!(!text.contains("Extended Target"));
}

#[test]
fn message_for_strong_sell() {
    let mut signal = sample_signal();
    signal.direction = SignalDirection::Sell;
    signal.strength = SignalStrength::Strong;
    signal.take_profit_price = 99.0;
    signal.secondary_take_profit_pct = Some(1.5);

    let text = format_message(&signal, chrono_tz::Europe::Amsterdam);
    assert!(text.starts_with("🔴"));
    assert!(text.contains("<b>Type:</b> SELL"));
    assert!(text.contains("<b>Target:</b> -1.0% ($99.00)"));
    assert!(text.contains("<b>Extended Target:</b> -1.5%"));
    assert!(text.contains("<b>Conviction:</b> STRONG"));
}

#[tokio::test]
async fn telegram_posts_html_message() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/botTEST-TOKEN/sendMessage"))
        .and(body_partial_json(json!({
            "chat_id": "42",
            "parse_mode": "HTML",
            "disable_web_page_preview": true,
        })))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "ok": true,
            "result": { "message_id": 7 }
        })))
        .expect(1)
        .mount(&server)
        .await;

    let notifier =
        TelegramNotifier::new(server.uri(), "TEST-TOKEN", "42", chrono_tz::Europe::Amsterdam);
    assert_ok!(notifier.notify(&sample_signal()).await);
}

#[tokio::test]
async fn telegram_rejection_is_reported() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/botTEST-TOKEN/sendMessage"))
        .respond_with(ResponseTemplate::new(400).set_body_json(json!({
            "ok": false,
            "error_code": 400,
            "description": "Bad Request: chat not found"
        })))
        .mount(&server)
        .await;

    let notifier =
        TelegramNotifier::new(server.uri(), "TEST-TOKEN", "42", chrono_tz::Europe::Amsterdam);
    match notifier.notify(&sample_signal()).await {
        Err(NotifyError::Rejected(reason)) => assert_eq!(reason, "Bad Request: chat not found"),
        other => panic!("expected rejection, got {:?}", other),
    }
}

#[test]
fn telegram_requires_token_and_chat() {
    let tz = chrono_tz::Europe::Amsterdam;
    let mut config = NotifierConfig::default();
    assert!(!config.telegram_enabled());
    assert!(matches!(
        TelegramNotifier::from_config(&config, tz),
        Err(NotifyError::NotConfigured("telegram_bot_token"))
    ));

    config.telegram_bot_token = Some("token".to_string());
    assert!(matches!(
        TelegramNotifier::from_config(&config, tz),
        Err(NotifyError::NotConfigured("telegram_chat_id"))
    ));

    config.telegram_chat_id = Some("42".to_string());
    assert!(config.telegram_enabled());
    assert!(TelegramNotifier::from_config(&config, tz).is_ok());
}

#[tokio::test]
async fn log_notifier_always_succeeds() {
    assert_ok!(LogNotifier.notify(&sample_signal()).await);
}

#[test]
fn plain_message_has_no_markup() {
    let text = format_plain(&sample_signal(), chrono_tz::Europe::Amsterdam);

    assert!(text.starts_with("BTCUSDT SIGNAL #1\n"));
    assert!(text.contains("Type: BUY"));
    assert!(text.contains("Time: 2024-01-15 08:00:00 UTC"));
    assert!(text.contains("Enter at: 09:03 Europe/Amsterdam"));
    assert!(text.contains("Expiry: 5 minutes"));
    assert!(text.contains("Target: +1.0%"));
    assert!(text.contains("Stop-Loss: 98.50"));
    assert!(!text.contains('<'));
}

fn sms_notifier(server: &MockServer, recipients: &[&str]) -> SmsNotifier {
    SmsNotifier::new(
        server.uri(),
        "AC123",
        "secret",
        "+15550000",
        recipients.iter().map(|r| r.to_string()).collect(),
        chrono_tz::Europe::Amsterdam,
    )
}

#[tokio::test]
async fn sms_posts_form_to_every_recipient() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/2010-04-01/Accounts/AC123/Messages.json"))
        .and(header("authorization", "Basic QUMxMjM6c2VjcmV0"))
        .and(body_string_contains("From=%2B15550000"))
        .and(body_string_contains("Body=BTCUSDT+SIGNAL+%231"))
        .respond_with(ResponseTemplate::new(201).set_body_json(json!({ "sid": "SM1" })))
        .expect(2)
        .mount(&server)
        .await;

    let notifier = sms_notifier(&server, &["+15550001", "+15550002"]);
    assert_ok!(notifier.notify(&sample_signal()).await);
}

#[tokio::test]
async fn sms_failed_recipient_does_not_stop_the_rest() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/2010-04-01/Accounts/AC123/Messages.json"))
        .and(body_string_contains("To=%2B15550001"))
        .respond_with(ResponseTemplate::new(400).set_body_json(json!({
            "code": 21211,
            "message": "Invalid 'To' Phone Number",
            "status": 400
        })))
        .expect(1)
        .mount(&server)
        .await;
    Mock::given(method("POST"))
        .and(path("/2010-04-01/Accounts/AC123/Messages.json"))
        .and(body_string_contains("To=%2B15550002"))
        .respond_with(ResponseTemplate::new(201).set_body_json(json!({ "sid": "SM2" })))
        .expect(1)
        .mount(&server)
        .await;

    let notifier = sms_notifier(&server, &["+15550001", "+15550002"]);
    match notifier.notify(&sample_signal()).await {
        Err(NotifyError::Rejected(reason)) => {
            assert!(reason.starts_with("+15550001:"), "{}", reason);
            assert!(reason.contains("Invalid 'To' Phone Number (21211)"), "{}", reason);
            assert!(!reason.contains("+15550002"), "{}", reason);
        }
        other => panic!("expected rejection, got {:?}", other),
    }
}

#[test]
fn sms_requires_credentials_sender_and_recipients() {
    let tz = chrono_tz::Europe::Amsterdam;
    let mut config = NotifierConfig::default();
    assert!(!config.sms_enabled());
    assert!(matches!(
        SmsNotifier::from_config(&config, tz),
        Err(NotifyError::NotConfigured("sms_account_sid"))
    ));

    config.sms_account_sid = Some("AC123".to_string());
    config.sms_auth_token = Some("secret".to_string());
    config.sms_from_number = Some("+15550000".to_string());
    assert!(matches!(
        SmsNotifier::from_config(&config, tz),
        Err(NotifyError::NotConfigured("sms_recipients"))
    ));

    config.sms_recipients = vec!["+15550001".to_string()];
    assert!(config.sms_enabled());
    assert!(SmsNotifier::from_config(&config, tz).is_ok());
}

#[tokio::test]
async fn archive_writes_json_and_text_records() {
    let dir = tempfile::tempdir().unwrap();
    let archive_dir = dir.path().join("signals");
    let notifier = ArchiveNotifier::new(&archive_dir, chrono_tz::Europe::Amsterdam);
    let signal = sample_signal();

    assert_ok!(notifier.notify(&signal).await);

    let record = notifier.record_path(&signal);
    assert_eq!(record, archive_dir.join("signal_20240115_080000_01.json"));
    let stored: Signal = serde_json::from_slice(&std::fs::read(&record).unwrap()).unwrap();
    assert_eq!(stored, signal);
    let text = std::fs::read_to_string(record.with_extension("txt")).unwrap();
    assert_eq!(text, format_plain(&signal, chrono_tz::Europe::Amsterdam));
}

#[tokio::test]
async fn broadcast_reaches_every_notifier_despite_failures() {
    let failing = Arc::new(RecordingNotifier::failing());
    let healthy = Arc::new(RecordingNotifier::default());
    let notifiers: Vec<Arc<dyn Notifier>> =
        vec![Arc::new(LogNotifier), failing.clone(), healthy.clone()];
    let broadcast = BroadcastNotifier::new(notifiers);
    assert_eq!(broadcast.len(), 3);

    let signal = sample_signal();
    match broadcast.notify(&signal).await {
        Err(NotifyError::Rejected(reason)) => assert!(reason.starts_with("recording:"), "{}", reason),
        other => panic!("expected rejection, got {:?}", other),
    }
    assert_eq!(failing.signals(), vec![signal.clone()]);
    assert_eq!(healthy.signals(), vec![signal]);
}
