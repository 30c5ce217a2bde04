//! SMS delivery through a Twilio-compatible Messages API.

use crate::config::NotifierConfig;
use crate::error::NotifyError;
use crate::models::signal::Signal;
use crate::services::notifier::{format_plain, Notifier};
use async_trait::async_trait;
use chrono_tz::Tz;
use serde::Deserialize;
use std::time::Duration;
use tracing::{info, warn};

#[derive(Debug, Deserialize)]
struct MessageResource {
    sid: String,
}

#[derive(Debug, Deserialize)]
struct ApiError {
    #[serde(default)]
    code: Option<u32>,
    #[serde(default)]
    message: Option<String>,
}

pub struct SmsNotifier {
    client: reqwest::Client,
    base_url: String,
    account_sid: String,
    auth_token: String,
    from_number: String,
    recipients: Vec<String>,
    timezone: Tz,
    request_timeout: Duration,
}

impl SmsNotifier {
    pub fn new(
        base_url: impl Into<String>,
        account_sid: impl Into<String>,
        auth_token: impl Into<String>,
        from_number: impl Into<String>,
        recipients: Vec<String>,
        timezone: Tz,
    ) -> Self {
        Self {
            client: reqwest::Client::new(),
            base_url: base_url.into().trim_end_matches('/').to_string(),
            account_sid: account_sid.into(),
            auth_token: auth_token.into(),
            from_number: from_number.into(),
            recipients,
            timezone,
            request_timeout: Duration::from_secs(30),
        }
    }

    pub fn with_request_timeout(mut self, timeout: Duration) -> Self {
        self.request_timeout = timeout;
        self
    }

    pub fn from_config(config: &NotifierConfig, timezone: Tz) -> Result<Self, NotifyError> {
        let sid = config
            .sms_account_sid
            .as_deref()
            .ok_or(NotifyError::NotConfigured("sms_account_sid"))?;
        let token = config
            .sms_auth_token
            .as_deref()
            .ok_or(NotifyError::NotConfigured("sms_auth_token"))?;
        let from = config
            .sms_from_number
            .as_deref()
            .ok_or(NotifyError::NotConfigured("sms_from_number"))?;
        if config.sms_recipients.is_empty() {
            return Err(NotifyError::NotConfigured("sms_recipients"));
        }
        Ok(Self::new(
            &config.sms_base_url,
            sid,
            token,
            from,
            config.sms_recipients.clone(),
            timezone,
        )
        .with_request_timeout(Duration::from_secs(config.request_timeout_secs)))
    }

    async fn send_one(&self, url: &str, recipient: &str, body: &str) -> Result<String, NotifyError> {
        let response = self
            .client
            .post(url)
            .basic_auth(&self.account_sid, Some(&self.auth_token))
            .form(&[("To", recipient), ("From", self.from_number.as_str()), ("Body", body)])
            .timeout(self.request_timeout)
            .send()
            .await?;

        let status = response.status();
        if status.is_success() {
            let message: MessageResource = response.json().await?;
            return Ok(message.sid);
        }
        let reason = match response.json::<ApiError>().await {
            Ok(ApiError {
                code: Some(code),
                message: Some(message),
            }) => format!("{} ({})", message, code),
            Ok(ApiError {
                message: Some(message),
                ..
            }) => message,
            _ => format!("status {}", status),
        };
        Err(NotifyError::Rejected(reason))
    }
}

#[async_trait]
impl Notifier for SmsNotifier {
    fn name(&self) -> &'static str {
        "sms"
    }

    /// Every recipient is attempted; the call fails if any of them failed.
    async fn notify(&self, signal: &Signal) -> Result<(), NotifyError> {
        let url = format!(
            "{}/2010-04-01/Accounts/{}/Messages.json",
            self.base_url, self.account_sid
        );
        let body = format_plain(signal, self.timezone);

        let mut failures = Vec::new();
        for recipient in &self.recipients {
            match self.send_one(&url, recipient, &body).await {
                Ok(message_sid) => info!(
                    sequence = signal.sequence,
                    recipient = %recipient,
                    message_sid = %message_sid,
                    "SMS notification sent"
                ),
                Err(e) => {
                    warn!(
                        sequence = signal.sequence,
                        recipient = %recipient,
                        error = %e,
                        "SMS notification failed"
                    );
                    failures.push(format!("{}: {}", recipient, e));
                }
            }
        }
        if failures.is_empty() {
            Ok(())
        } else {
            Err(NotifyError::Rejected(failures.join("; ")))
        }
    }
}
