use async_trait::async_trait;
use reqwest::Client;
use serde::de::DeserializeOwned;
use serde::Serialize;
use std::time::Duration;
use tracing::debug;

use super::{ApiResponse, MessageSink, Update, User};
use crate::config::TelegramConfig;
use crate::{Error, Result};

/// Slack on top of the long-poll timeout before the HTTP request gives up.
const POLL_GRACE: Duration = Duration::from_secs(10);
const SEND_TIMEOUT: Duration = Duration::from_secs(15);

pub struct TelegramClient {
    client: Client,
    endpoint: String,
    poll_timeout: Duration,
}

#[derive(Debug, Serialize)]
struct GetUpdatesRequest {
    #[serde(skip_serializing_if = "Option::is_none")]
    offset: Option<i64>,
    timeout: u64,
    allowed_updates: [&'static str; 2],
}

#[derive(Debug, Serialize)]
struct SendMessageRequest<'a> {
    chat_id: i64,
    text: &'a str,
    parse_mode: &'static str,
    disable_web_page_preview: bool,
}

impl TelegramClient {
    pub fn new(config: &TelegramConfig) -> Result<Self> {
        Ok(Self {
            client: Client::builder().build()?,
            endpoint: format!("{}/bot{}", config.api_url.trim_end_matches('/'), config.bot_token),
            poll_timeout: config.poll_timeout,
        })
    }

    /// Long-poll for updates after `offset`.
    pub async fn get_updates(&self, offset: Option<i64>) -> Result<Vec<Update>> {
        let request = GetUpdatesRequest {
            offset,
            timeout: self.poll_timeout.as_secs(),
            allowed_updates: ["message", "my_chat_member"],
        };
        let updates: Vec<Update> = self
            .call("getUpdates", &request, self.poll_timeout + POLL_GRACE)
            .await?;
        if !updates.is_empty() {
            debug!("Received {} Telegram updates", updates.len());
        }
        Ok(updates)
    }

    /// The bot's own account; its `username` is what `/cmd@username` must name.
    pub async fn get_me(&self) -> Result<User> {
        self.call("getMe", &serde_json::json!({}), SEND_TIMEOUT).await
    }

    async fn call<B, T>(&self, method: &str, body: &B, timeout: Duration) -> Result<T>
    where
        B: Serialize + ?Sized,
        T: DeserializeOwned,
    {
        // The endpoint embeds the bot token; keep it out of error messages.
        let response = self
            .client
            .post(format!("{}/{}", self.endpoint, method))
            .timeout(timeout)
            .json(body)
            .send()
            .await
            .map_err(|e| Error::Http(e.without_url()))?;

        let parsed: ApiResponse<T> = response
            .json()
            .await
            .map_err(|e| Error::Http(e.without_url()))?;

        match parsed {
            ApiResponse { ok: true, result: Some(result), .. } => Ok(result),
            ApiResponse { error_code: Some(401), .. } => Err(Error::Config(
                "TELEGRAM_BOT_TOKEN was rejected by the Telegram Bot API".to_string(),
            )),
            ApiResponse { description, error_code, .. } => Err(Error::Telegram(format!(
                "{} failed ({}): {}",
                method,
                error_code.map(|c| c.to_string()).unwrap_or_else(|| "no code".to_string()),
                description.unwrap_or_else(|| "no description".to_string())
            ))),
        }
    }
}

#[async_trait]
impl MessageSink for TelegramClient {
    async fn send_message(&self, chat_id: i64, text: &str) -> Result<()> {
        let request = SendMessageRequest {
            chat_id,
            text,
            parse_mode: "HTML",
            disable_web_page_preview: true,
        };
        let _: serde_json::Value = self.call("sendMessage", &request, SEND_TIMEOUT).await?;
        Ok(())
    }
}
