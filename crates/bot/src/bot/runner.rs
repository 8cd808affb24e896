use std::sync::Arc;
use std::time::Duration;
use tracing::{error, info, warn};

use super::Dispatcher;
use crate::telegram::TelegramClient;
use crate::{Error, Result};

const RETRY_DELAY: Duration = Duration::from_secs(5);

/// Long-polling loop feeding Telegram updates to the dispatcher one at a time.
pub struct Bot {
    telegram: Arc<TelegramClient>,
    dispatcher: Arc<Dispatcher>,
    retry_delay: Duration,
}

impl Bot {
    pub fn new(telegram: Arc<TelegramClient>, dispatcher: Arc<Dispatcher>) -> Self {
        Self {
            telegram,
            dispatcher,
            retry_delay: RETRY_DELAY,
        }
    }

    /// Pause between a failed `getUpdates` and the next attempt.
    pub fn with_retry_delay(mut self, delay: Duration) -> Self {
        self.retry_delay = delay;
        self
    }

    /// Poll until the bot token is rejected. Transport failures are retried.
    pub async fn run(&self) -> Result<()> {
        info!("Starting Telegram polling loop");
        let mut offset: Option<i64> = None;

        loop {
            let updates = match self.telegram.get_updates(offset).await {
                Ok(updates) => updates,
                Err(e @ Error::Config(_)) => {
                    error!("Stopping polling loop: {}", e);
                    return Err(e);
                }
                Err(e) => {
                    warn!("Polling Telegram failed, retrying in {:?}: {}", self.retry_delay, e);
                    tokio::time::sleep(self.retry_delay).await;
                    continue;
                }
            };

            for update in updates {
                offset = Some(update.update_id + 1);
                if let Err(e) = self.dispatcher.handle_update(&update, self.telegram.as_ref()).await {
                    error!("Handling update {} failed: {}", update.update_id, e);
                }
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::{Config, TelegramConfig};
    use crate::grafana::MockGrafanaApi;
    use crate::workflow::ProvisioningWorkflow;
    use serde_json::json;
    use wiremock::matchers::{body_partial_json, method, path};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    fn bot_for(base_url: &str) -> Bot {
        let mut config = Config::default();
        config.telegram = TelegramConfig {
            bot_token: "123:abc".to_string(),
            admin_chat_id: 1,
            creator_ids: vec![],
            api_url: base_url.to_string(),
            poll_timeout: Duration::from_secs(0),
        };
        let telegram = Arc::new(TelegramClient::new(&config.telegram).unwrap());
        let workflow = ProvisioningWorkflow::new(Arc::new(MockGrafanaApi::new()), &config);
        let dispatcher = Arc::new(Dispatcher::new(Arc::new(config), Arc::new(workflow)));
        Bot::new(telegram, dispatcher).with_retry_delay(Duration::from_millis(10))
    }

    fn rejected_token() -> ResponseTemplate {
        ResponseTemplate::new(401).set_body_json(json!({
            "ok": false,
            "error_code": 401,
            "description": "Unauthorized"
        }))
    }

    #[tokio::test]
    async fn test_offset_follows_last_update() {
        let server = MockServer::start().await;
        // Mounted first so it wins once the offset is present.
        Mock::given(method("POST"))
            .and(path("/bot123:abc/getUpdates"))
            .and(body_partial_json(json!({ "offset": 13 })))
            .respond_with(rejected_token())
            .expect(1)
            .mount(&server)
            .await;
        Mock::given(method("POST"))
            .and(path("/bot123:abc/getUpdates"))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({
                "ok": true,
                "result": [{ "update_id": 11 }, { "update_id": 12 }]
            })))
            .up_to_n_times(1)
            .expect(1)
            .mount(&server)
            .await;

        let err = bot_for(&server.uri()).run().await.unwrap_err();
        assert!(matches!(err, Error::Config(_)));
    }

    #[tokio::test]
    async fn test_transport_error_is_retried() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path("/bot123:abc/getUpdates"))
            .respond_with(ResponseTemplate::new(502).set_body_string("Bad Gateway"))
            .up_to_n_times(1)
            .expect(1)
            .mount(&server)
            .await;
        Mock::given(method("POST"))
            .and(path("/bot123:abc/getUpdates"))
            .respond_with(rejected_token())
            .expect(1)
            .mount(&server)
            .await;

        let err = bot_for(&server.uri()).run().await.unwrap_err();
        assert!(matches!(err, Error::Config(_)));
    }

    #[tokio::test]
    async fn test_rejected_token_stops_immediately() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path("/bot123:abc/getUpdates"))
            .respond_with(rejected_token())
            .expect(1)
            .mount(&server)
            .await;

        let result = bot_for(&server.uri()).run().await;
        assert!(matches!(result, Err(Error::Config(ref msg)) if msg.contains("TELEGRAM_BOT_TOKEN")));
    }
}
