//! Telegram bot delivery: POST `{chat_id, text}` to `sendMessage`.

use super::AlertSink;
use crate::config::AlertConfig;
use crate::error::AlertError;
use std::time::Duration;
use tracing::info;

pub struct TelegramSink {
    client: reqwest::blocking::Client,
    url: String,
    chat_id: String,
}

impl TelegramSink {
    /// Requires both token and chat id.
    pub fn new(config: &AlertConfig) -> Result<Self, AlertError> {
        let token = config
            .telegram_token
            .as_deref()
            .filter(|t| !t.is_empty())
            .ok_or(AlertError::NotConfigured("telegram_token"))?;
        let chat_id = config
            .chat_id
            .clone()
            .filter(|c| !c.is_empty())
            .ok_or(AlertError::NotConfigured("chat_id"))?;
        let client = reqwest::blocking::Client::builder()
            .timeout(Duration::from_secs(config.timeout_secs))
            .connect_timeout(Duration::from_secs(5))
            .build()?;
        let url = format!(
            "{}/bot{}/sendMessage",
            config.api_base.trim_end_matches('/'),
            token
        );
        Ok(Self {
            client,
            url,
            chat_id,
        })
    }
}

impl AlertSink for TelegramSink {
    fn send_alert(&self, message: &str) -> Result<(), AlertError> {
        let res = self
            .client
            .post(&self.url)
            .form(&[("chat_id", self.chat_id.as_str()), ("text", message)])
            .send()?;
        if !res.status().is_success() {
            let status = res.status().as_u16();
            let body = res.text().unwrap_or_default();
            return Err(AlertError::Status { status, body });
        }
        info!(chat_id = %self.chat_id, "telegram alert delivered");
        Ok(())
    }
}
