pub mod bot;
pub mod config;
pub mod grafana;
pub mod metrics;
pub mod server;
pub mod telegram;
pub mod workflow;

use thiserror::Error;

use crate::grafana::GrafanaError;

#[derive(Debug, Error)]
pub enum Error {
    #[error("Configuration error: {0}")]
    Config(String),
    #[error("Grafana error: {0}")]
    Grafana(#[from] GrafanaError),
    #[error("Telegram error: {0}")]
    Telegram(String),
    #[error("HTTP client error: {0}")]
    Http(#[from] reqwest::Error),
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

pub type Result<T> = std::result::Result<T, Error>;
