use std::fmt;
use std::time::Duration;

use url::Url;

use crate::{Error, Result};

const DEFAULT_GRAFANA_URL: &str = "http://localhost:3000";
const DEFAULT_TELEGRAM_API_URL: &str = "https://api.telegram.org";
const DEFAULT_RESERVED_ORG_NAME: &str = "Main Org.";

#[derive(Clone)]
pub struct Config {
    pub telegram: TelegramConfig,
    pub grafana: GrafanaConfig,
    pub datasources: DatasourceUrls,
    pub server: ServerConfig,
}

#[derive(Clone)]
pub struct TelegramConfig {
    pub bot_token: String,
    pub admin_chat_id: i64,
    /// Users allowed to issue commands from chats other than the admin chat.
    pub creator_ids: Vec<i64>,
    pub api_url: String,
    pub poll_timeout: Duration,
}

#[derive(Clone)]
pub struct GrafanaConfig {
    pub url: String,
    pub user: String,
    pub password: String,
    pub timeout: Duration,
    /// The built-in organization that is never treated as a project.
    pub reserved_org_name: String,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DatasourceUrls {
    pub metrics: String,
    pub logs: String,
    pub traces: String,
}

#[derive(Debug, Clone)]
pub struct ServerConfig {
    pub addr: String,
}

impl Default for DatasourceUrls {
    fn default() -> Self {
        Self {
            metrics: "http://prometheus:9090".to_string(),
            logs: "http://loki:3100".to_string(),
            traces: "http://tempo:3200".to_string(),
        }
    }
}

impl Config {
    pub fn load() -> Result<Self> {
        // Load environment variables from .env file if it exists
        let _ = dotenvy::dotenv();

        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Build the configuration from an arbitrary variable source.
    pub fn from_lookup<F>(lookup: F) -> Result<Self>
    where
        F: Fn(&str) -> Option<String>,
    {
        let var = |key: &str| {
            lookup(key)
                .map(|v| v.trim().to_string())
                .filter(|v| !v.is_empty())
        };
        let required = |key: &str| {
            var(key).ok_or_else(|| Error::Config(format!("{} must be set", key)))
        };

        let defaults = DatasourceUrls::default();

        let config = Config {
            telegram: TelegramConfig {
                bot_token: required("TELEGRAM_BOT_TOKEN")?,
                admin_chat_id: parse_number("TELEGRAM_ADMIN_CHAT_ID", &required("TELEGRAM_ADMIN_CHAT_ID")?)?,
                creator_ids: match var("TELEGRAM_CREATOR_IDS") {
                    Some(raw) => parse_id_list("TELEGRAM_CREATOR_IDS", &raw)?,
                    None => Vec::new(),
                },
                api_url: base_url(
                    "TELEGRAM_API_URL",
                    var("TELEGRAM_API_URL").unwrap_or_else(|| DEFAULT_TELEGRAM_API_URL.to_string()),
                )?,
                poll_timeout: Duration::from_secs(match var("TELEGRAM_POLL_TIMEOUT_SECS") {
                    Some(raw) => parse_number("TELEGRAM_POLL_TIMEOUT_SECS", &raw)?,
                    None => 30,
                }),
            },
            grafana: GrafanaConfig {
                url: base_url(
                    "GRAFANA_URL",
                    var("GRAFANA_URL").unwrap_or_else(|| DEFAULT_GRAFANA_URL.to_string()),
                )?,
                user: var("GRAFANA_USER").unwrap_or_else(|| "admin".to_string()),
                password: required("GRAFANA_PASSWORD")?,
                timeout: Duration::from_secs(match var("GRAFANA_TIMEOUT_SECS") {
                    Some(raw) => parse_number("GRAFANA_TIMEOUT_SECS", &raw)?,
                    None => 10,
                }),
                reserved_org_name: var("RESERVED_ORG_NAME")
                    .unwrap_or_else(|| DEFAULT_RESERVED_ORG_NAME.to_string()),
            },
            datasources: DatasourceUrls {
                metrics: base_url("PROMETHEUS_URL", var("PROMETHEUS_URL").unwrap_or(defaults.metrics))?,
                logs: base_url("LOKI_URL", var("LOKI_URL").unwrap_or(defaults.logs))?,
                traces: base_url("TEMPO_URL", var("TEMPO_URL").unwrap_or(defaults.traces))?,
            },
            server: ServerConfig {
                addr: var("SERVER_ADDR").unwrap_or_else(|| "0.0.0.0:8000".to_string()),
            },
        };

        if config.grafana.timeout.is_zero() {
            return Err(Error::Config("GRAFANA_TIMEOUT_SECS must be greater than zero".to_string()));
        }

        if config.telegram.creator_ids.is_empty() {
            tracing::debug!("TELEGRAM_CREATOR_IDS is empty; only the admin chat may issue commands");
        }

        Ok(config)
    }

    pub fn is_allowed_sender(&self, chat_id: i64, user_id: Option<i64>) -> bool {
        chat_id == self.telegram.admin_chat_id
            || user_id.map_or(false, |id| self.telegram.creator_ids.contains(&id))
    }
}

fn parse_number<T: std::str::FromStr>(key: &str, raw: &str) -> Result<T> {
    raw.trim()
        .parse()
        .map_err(|_| Error::Config(format!("{} must be a number, got '{}'", key, raw)))
}

/// Accepts `1,2,3`, `1 2 3` and the JSON form `[1, 2, 3]`.
fn parse_id_list(key: &str, raw: &str) -> Result<Vec<i64>> {
    raw.trim()
        .trim_start_matches('[')
        .trim_end_matches(']')
        .split(|c: char| c == ',' || c.is_whitespace())
        .filter(|part| !part.is_empty())
        .map(|part| parse_number(key, part))
        .collect()
}

fn base_url(key: &str, raw: String) -> Result<String> {
    let parsed = Url::parse(&raw)
        .map_err(|e| Error::Config(format!("{} is not a valid URL ({}): {}", key, raw, e)))?;
    if !matches!(parsed.scheme(), "http" | "https") {
        return Err(Error::Config(format!("{} must use http or https, got '{}'", key, raw)));
    }
    Ok(raw.trim_end_matches('/').to_string())
}

impl fmt::Debug for Config {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Config")
            .field("telegram", &self.telegram)
            .field("grafana", &self.grafana)
            .field("datasources", &self.datasources)
            .field("server", &self.server)
            .finish()
    }
}

impl fmt::Debug for TelegramConfig {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("TelegramConfig")
            .field("bot_token", &"<redacted>")
            .field("admin_chat_id", &self.admin_chat_id)
            .field("creator_ids", &self.creator_ids)
            .field("api_url", &self.api_url)
            .field("poll_timeout", &self.poll_timeout)
            .finish()
    }
}

impl fmt::Debug for GrafanaConfig {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("GrafanaConfig")
            .field("url", &self.url)
            .field("user", &self.user)
            .field("password", &"<redacted>")
            .field("timeout", &self.timeout)
            .field("reserved_org_name", &self.reserved_org_name)
            .finish()
    }
}

impl Default for Config {
    fn default() -> Self {
        Self {
            telegram: TelegramConfig {
                bot_token: String::new(),
                admin_chat_id: 0,
                creator_ids: Vec::new(),
                api_url: DEFAULT_TELEGRAM_API_URL.to_string(),
                poll_timeout: Duration::from_secs(30),
            },
            grafana: GrafanaConfig {
                url: DEFAULT_GRAFANA_URL.to_string(),
                user: "admin".to_string(),
                password: String::new(),
                timeout: Duration::from_secs(10),
                reserved_org_name: DEFAULT_RESERVED_ORG_NAME.to_string(),
            },
            datasources: DatasourceUrls::default(),
            server: ServerConfig {
                addr: "0.0.0.0:8000".to_string(),
            },
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    fn lookup_from(pairs: &[(&str, &str)]) -> impl Fn(&str) -> Option<String> {
        let map: HashMap<String, String> = pairs
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect();
        move |key: &str| map.get(key).cloned()
    }

    fn minimal() -> Vec<(&'static str, &'static str)> {
        vec![
            ("TELEGRAM_BOT_TOKEN", "123:abc"),
            ("TELEGRAM_ADMIN_CHAT_ID", "-1001"),
            ("GRAFANA_PASSWORD", "secret"),
        ]
    }

    #[test]
    fn test_defaults_applied() {
        let config = Config::from_lookup(lookup_from(&minimal())).unwrap();

        assert_eq!(config.telegram.admin_chat_id, -1001);
        assert!(config.telegram.creator_ids.is_empty());
        assert_eq!(config.grafana.url, "http://localhost:3000");
        assert_eq!(config.grafana.user, "admin");
        assert_eq!(config.grafana.timeout, Duration::from_secs(10));
        assert_eq!(config.grafana.reserved_org_name, "Main Org.");
        assert_eq!(config.datasources, DatasourceUrls::default());
        assert_eq!(config.server.addr, "0.0.0.0:8000");
    }

    #[test]
    fn test_missing_required_variable() {
        let pairs: Vec<_> = minimal()
            .into_iter()
            .filter(|(k, _)| *k != "GRAFANA_PASSWORD")
            .collect();
        let err = Config::from_lookup(lookup_from(&pairs)).unwrap_err();
        assert!(err.to_string().contains("GRAFANA_PASSWORD"));
    }

    #[test]
    fn test_creator_ids_formats() {
        for raw in ["[1, 2, 3]", "1,2,3", "1 2 3"] {
            let mut pairs = minimal();
            pairs.push(("TELEGRAM_CREATOR_IDS", raw));
            let config = Config::from_lookup(lookup_from(&pairs)).unwrap();
            assert_eq!(config.telegram.creator_ids, vec![1, 2, 3], "input {}", raw);
        }
    }

    #[test]
    fn test_invalid_admin_chat_id() {
        let mut pairs = minimal();
        pairs.retain(|(k, _)| *k != "TELEGRAM_ADMIN_CHAT_ID");
        pairs.push(("TELEGRAM_ADMIN_CHAT_ID", "admins"));
        let err = Config::from_lookup(lookup_from(&pairs)).unwrap_err();
        assert!(matches!(err, Error::Config(msg) if msg.contains("TELEGRAM_ADMIN_CHAT_ID")));
    }

    #[test]
    fn test_grafana_url_trailing_slash_trimmed() {
        let mut pairs = minimal();
        pairs.push(("GRAFANA_URL", "https://grafana.internal/"));
        let config = Config::from_lookup(lookup_from(&pairs)).unwrap();
        assert_eq!(config.grafana.url, "https://grafana.internal");
    }

    #[test]
    fn test_rejects_non_http_url() {
        let mut pairs = minimal();
        pairs.push(("LOKI_URL", "ftp://loki"));
        assert!(Config::from_lookup(lookup_from(&pairs)).is_err());
    }

    #[test]
    fn test_debug_redacts_secrets() {
        let config = Config::from_lookup(lookup_from(&minimal())).unwrap();
        let rendered = format!("{:?}", config);
        assert!(!rendered.contains("123:abc"));
        assert!(!rendered.contains("secret"));
        assert!(rendered.contains("<redacted>"));
    }

    #[test]
    fn test_allowed_senders() {
        let mut pairs = minimal();
        pairs.push(("TELEGRAM_CREATOR_IDS", "42"));
        let config = Config::from_lookup(lookup_from(&pairs)).unwrap();

        assert!(config.is_allowed_sender(-1001, None));
        assert!(config.is_allowed_sender(555, Some(42)));
        assert!(!config.is_allowed_sender(555, Some(7)));
        assert!(!config.is_allowed_sender(555, None));
    }
}
