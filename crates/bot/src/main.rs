use anyhow::Context;
use std::sync::Arc;
use tracing::{error, info};
use tracing_subscriber::EnvFilter;

use grafana_bot::{
    bot::{Bot, Dispatcher},
    config::Config,
    grafana::{GrafanaApi, GrafanaClient},
    metrics,
    server::Server,
    telegram::TelegramClient,
    workflow::ProvisioningWorkflow,
};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Initialize logging
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")))
        .init();

    // Load configuration
    let config = Arc::new(Config::load().context("failed to load configuration")?);
    info!("Loaded configuration: {:?}", config);

    metrics::register_metrics();

    let grafana = Arc::new(GrafanaClient::new(&config)?);
    let user = grafana
        .current_user()
        .await
        .with_context(|| format!("Grafana at {} did not accept the configured credentials", grafana.base_url()))?;
    if !user.is_grafana_admin {
        error!(
            "Grafana user '{}' is not a server admin; organization management will fail",
            user.login
        );
    }
    info!("Authenticated to Grafana as '{}'", user.login);

    let workflow = Arc::new(ProvisioningWorkflow::new(grafana, &config));
    let telegram = Arc::new(TelegramClient::new(&config.telegram)?);
    let me = telegram
        .get_me()
        .await
        .context("Telegram did not accept TELEGRAM_BOT_TOKEN")?;
    let mut dispatcher = Dispatcher::new(config.clone(), workflow);
    match me.username {
        Some(username) => {
            info!("Running as Telegram bot @{}", username);
            dispatcher = dispatcher.with_bot_username(username);
        }
        None => error!("Telegram returned no username for the bot; /cmd@mention commands will be ignored"),
    }
    let dispatcher = Arc::new(dispatcher);
    let bot = Bot::new(telegram, dispatcher);
    let server = Server::new(&config);

    tokio::select! {
        result = bot.run() => result.context("Telegram polling loop stopped")?,
        result = server.start() => result.context("ops server stopped")?,
        _ = tokio::signal::ctrl_c() => info!("Received Ctrl-C, shutting down"),
    }

    Ok(())
}
