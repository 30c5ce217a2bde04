//! Signal notifiers.

use crate::config::NotifierConfig;
use crate::error::NotifyError;
use crate::models::signal::{Signal, SignalDirection};
use async_trait::async_trait;
use chrono_tz::Tz;
use serde::Deserialize;
use serde_json::json;
use std::sync::Arc;
use std::time::Duration;
use tracing::{info, warn};

const DEFAULT_REQUEST_TIMEOUT: Duration = Duration::from_secs(30);

#[async_trait]
pub trait Notifier: Send + Sync {
    fn name(&self) -> &'static str;

    async fn notify(&self, signal: &Signal) -> Result<(), NotifyError>;
}

/// Writes each signal as a structured log event.
#[derive(Debug, Default, Clone, Copy)]
pub struct LogNotifier;

#[async_trait]
impl Notifier for LogNotifier {
    fn name(&self) -> &'static str {
        "log"
    }

    async fn notify(&self, signal: &Signal) -> Result<(), NotifyError> {
        info!(
            sequence = signal.sequence,
            symbol = %signal.symbol,
            direction = %signal.direction,
            strength = %signal.strength,
            generated_at = %signal.generated_at,
            scheduled_entry_at = %signal.scheduled_entry_at,
            entry_price = signal.entry_price,
            stop_loss_price = signal.stop_loss_price,
            take_profit_price = signal.take_profit_price,
            position_size_pct = signal.position_size_pct,
            "Signal emitted"
        );
        Ok(())
    }
}

#[derive(Debug, Deserialize)]
struct TelegramResponse {
    ok: bool,
    #[serde(default)]
    description: Option<String>,
}

/// Hands every signal to each inner notifier in turn. One failing notifier
/// does not stop the others.
pub struct BroadcastNotifier {
    notifiers: Vec<Arc<dyn Notifier>>,
}

impl BroadcastNotifier {
    pub fn new(notifiers: Vec<Arc<dyn Notifier>>) -> Self {
        Self { notifiers }
    }

    pub fn len(&self) -> usize {
        self.notifiers.len()
    }

    pub fn is_empty(&self) -> bool {
        self.notifiers.is_empty()
    }
}

#[async_trait]
impl Notifier for BroadcastNotifier {
    fn name(&self) -> &'static str {
        "broadcast"
    }

    async fn notify(&self, signal: &Signal) -> Result<(), NotifyError> {
        let mut failures = Vec::new();
        for notifier in &self.notifiers {
            if let Err(e) = notifier.notify(signal).await {
                warn!(
                    sequence = signal.sequence,
                    notifier = notifier.name(),
                    error = %e,
                    "Notifier failed"
                );
                failures.push(format!("{}: {}", notifier.name(), e));
            }
        }
        if failures.is_empty() {
            Ok(())
        } else {
            Err(NotifyError::Rejected(failures.join("; ")))
        }
    }
}

/// Sends signals through the Telegram Bot API `sendMessage` method.
pub struct TelegramNotifier {
    client: reqwest::Client,
    base_url: String,
    bot_token: String,
    chat_id: String,
    timezone: Tz,
    request_timeout: Duration,
}

impl TelegramNotifier {
    pub fn new(
        base_url: impl Into<String>,
        bot_token: impl Into<String>,
        chat_id: impl Into<String>,
        timezone: Tz,
    ) -> Self {
        Self {
            client: reqwest::Client::new(),
            base_url: base_url.into().trim_end_matches('/').to_string(),
            bot_token: bot_token.into(),
            chat_id: chat_id.into(),
            timezone,
            request_timeout: DEFAULT_REQUEST_TIMEOUT,
        }
    }

    pub fn with_request_timeout(mut self, timeout: Duration) -> Self {
        self.request_timeout = timeout;
        self
    }

    pub fn from_config(config: &NotifierConfig, timezone: Tz) -> Result<Self, NotifyError> {
        let token = config
            .telegram_bot_token
            .as_deref()
            .ok_or(NotifyError::NotConfigured("telegram_bot_token"))?;
        let chat_id = config
            .telegram_chat_id
            .as_deref()
            .ok_or(NotifyError::NotConfigured("telegram_chat_id"))?;
        Ok(Self::new(&config.telegram_base_url, token, chat_id, timezone)
            .with_request_timeout(Duration::from_secs(config.request_timeout_secs)))
    }
}

#[async_trait]
impl Notifier for TelegramNotifier {
    fn name(&self) -> &'static str {
        "telegram"
    }

    async fn notify(&self, signal: &Signal) -> Result<(), NotifyError> {
        let url = format!("{}/bot{}/sendMessage", self.base_url, self.bot_token);
        let payload = json!({
            "chat_id": self.chat_id,
            "text": format_message(signal, self.timezone),
            "parse_mode": "HTML",
            "disable_web_page_preview": true,
        });

        let response = self
            .client
            .post(&url)
            .json(&payload)
            .timeout(self.request_timeout)
            .send()
            .await?;
        let status = response.status();
        let body: TelegramResponse = response.json().await?;
        if !status.is_success() || !body.ok {
            return Err(NotifyError::Rejected(
                body.description
                    .unwrap_or_else(|| format!("status {}", status)),
            ));
        }

        info!(
            sequence = signal.sequence,
            chat_id = %self.chat_id,
            "Telegram notification sent"
        );
        Ok(())
    }
}

/// HTML message body for a signal, times shown in `timezone` and UTC.
pub fn format_message(signal: &Signal, timezone: Tz) -> String {
    let marker = match signal.direction {
        SignalDirection::Buy => "🟢",
        SignalDirection::Sell => "🔴",
    };
    let generated_local = signal.generated_at.with_timezone(&timezone);
    let entry_local = signal.scheduled_entry_at.with_timezone(&timezone);
    let expiry = expiry_text(signal.expiry);

    let mut lines = vec![
        format!("{} <b>{} SIGNAL #{}</b>", marker, signal.symbol, signal.sequence),
        String::new(),
        format!("📊 <b>Type:</b> {}", signal.direction),
        format!(
            "⏰ <b>Signal Time:</b> {} {}",
            generated_local.format("%H:%M:%S"),
            timezone.name()
        ),
        format!(
            "🚀 <b>ENTER TRADE AT:</b> {} local / {} UTC",
            entry_local.format("%H:%M"),
            signal.scheduled_entry_at.format("%H:%M")
        ),
        format!("⏳ <b>Expiry:</b> {}", expiry),
        format!(
            "🎯 <b>Target:</b> {:+.1}% (${:.2})",
            signal.direction.sign() * signal.take_profit_pct,
            signal.take_profit_price
        ),
    ];
    if let Some(secondary) = signal.secondary_take_profit_pct {
        lines.push(format!(
            "🎯 <b>Extended Target:</b> {:+.1}%",
            signal.direction.sign() * secondary
        ));
    }
    lines.extend([
        format!("🛑 <b>Stop-Loss:</b> ${:.2}", signal.stop_loss_price),
        format!("💰 <b>Position Size:</b> {:.1}%", signal.position_size_pct),
        format!("💪 <b>Conviction:</b> {}", signal.strength),
        String::new(),
        "<i>Trade at your own risk. This is not financial advice.</i>".to_string(),
    ]);
    lines.join("\n")
}

/// Plain-text body for SMS and archived copies.
pub fn format_plain(signal: &Signal, timezone: Tz) -> String {
    let entry_local = signal.scheduled_entry_at.with_timezone(&timezone);
    [
        format!("{} SIGNAL #{}", signal.symbol, signal.sequence),
        format!("Type: {}", signal.direction),
        format!("Time: {}", signal.generated_at.format("%Y-%m-%d %H:%M:%S UTC")),
        format!("Enter at: {} {}", entry_local.format("%H:%M"), timezone.name()),
        format!("Expiry: {}", expiry_text(signal.expiry)),
        format!(
            "Target: {:+.1}%",
            signal.direction.sign() * signal.take_profit_pct
        ),
        format!("Stop-Loss: {:.2}", signal.stop_loss_price),
        format!("Position Size: {:.1}%", signal.position_size_pct),
        format!("Conviction: {}", signal.strength),
    ]
    .join("\n")
}

fn expiry_text(expiry: Duration) -> String {
    let secs = expiry.as_secs();
    if secs == 60 {
        "1 minute".to_string()
    } else if secs % 60 == 0 {
        format!("{} minutes", secs / 60)
    } else {
        format!("{} seconds", secs)
    }
}
