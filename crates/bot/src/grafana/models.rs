use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::fmt;

pub type OrgId = i64;
pub type FolderId = String;
pub type ContactPointId = String;

pub const TENANT_HEADER: &str = "X-Scope-OrgID";
pub const CONTACT_POINT_NAME: &str = "Telegram";

/// Longest folder uid Grafana accepts.
const FOLDER_UID_MAX_LEN: usize = 40;

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Organization {
    pub id: OrgId,
    pub name: String,
}

#[derive(Debug, Deserialize)]
pub(crate) struct CreateOrgResponse {
    #[serde(rename = "orgId")]
    pub org_id: OrgId,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum DatasourceKind {
    Metrics,
    Logs,
    Traces,
}

impl fmt::Display for DatasourceKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            DatasourceKind::Metrics => write!(f, "metrics"),
            DatasourceKind::Logs => write!(f, "logs"),
            DatasourceKind::Traces => write!(f, "traces"),
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct DatasourceDescriptor {
    pub kind: DatasourceKind,
    pub name: String,
    pub ds_type: String,
    pub url: String,
    pub is_default: bool,
    /// Extra HTTP headers Grafana attaches to every proxied query.
    pub headers: Vec<(String, String)>,
    pub json_data: serde_json::Map<String, Value>,
}

impl DatasourceDescriptor {
    pub fn prometheus(url: &str) -> Self {
        let mut json_data = serde_json::Map::new();
        json_data.insert("timeInterval".to_string(), Value::String("15s".to_string()));
        Self {
            kind: DatasourceKind::Metrics,
            name: "Prometheus".to_string(),
            ds_type: "prometheus".to_string(),
            url: url.to_string(),
            is_default: true,
            headers: Vec::new(),
            json_data,
        }
    }

    pub fn loki(url: &str, tenant: &str) -> Self {
        Self {
            kind: DatasourceKind::Logs,
            name: "Loki".to_string(),
            ds_type: "loki".to_string(),
            url: url.to_string(),
            is_default: false,
            headers: vec![(TENANT_HEADER.to_string(), tenant.to_string())],
            json_data: serde_json::Map::new(),
        }
    }

    pub fn tempo(url: &str) -> Self {
        Self {
            kind: DatasourceKind::Traces,
            name: "Tempo".to_string(),
            ds_type: "tempo".to_string(),
            url: url.to_string(),
            is_default: false,
            headers: Vec::new(),
            json_data: serde_json::Map::new(),
        }
    }

    /// Request body for `POST /api/datasources`. Header names go to
    /// `jsonData.httpHeaderNameN`, their values to the encrypted
    /// `secureJsonData.httpHeaderValueN`.
    pub fn to_payload(&self) -> Value {
        let mut json_data = self.json_data.clone();
        let mut secure_json_data = serde_json::Map::new();
        for (idx, (name, value)) in self.headers.iter().enumerate() {
            json_data.insert(format!("httpHeaderName{}", idx + 1), Value::String(name.clone()));
            secure_json_data.insert(format!("httpHeaderValue{}", idx + 1), Value::String(value.clone()));
        }

        let mut payload = serde_json::json!({
            "name": self.name,
            "type": self.ds_type,
            "url": self.url,
            "access": "proxy",
            "isDefault": self.is_default,
        });
        if !json_data.is_empty() {
            payload["jsonData"] = Value::Object(json_data);
        }
        if !secure_json_data.is_empty() {
            payload["secureJsonData"] = Value::Object(secure_json_data);
        }
        payload
    }
}

#[derive(Debug, Serialize)]
pub(crate) struct CreateFolderRequest<'a> {
    pub title: &'a str,
    pub uid: String,
}

#[derive(Debug, Deserialize)]
pub(crate) struct FolderResponse {
    pub uid: FolderId,
}

/// Folder uid derived from a project name: lowercase, anything outside
/// `[a-z0-9_-]` replaced by `-`, capped at Grafana's uid length.
pub fn folder_uid(project_name: &str) -> String {
    project_name
        .to_lowercase()
        .chars()
        .map(|c| if c.is_ascii_alphanumeric() || c == '-' || c == '_' { c } else { '-' })
        .take(FOLDER_UID_MAX_LEN)
        .collect()
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ContactPoint {
    pub uid: ContactPointId,
    pub name: String,
}

#[derive(Debug, Serialize)]
pub(crate) struct TelegramSettings {
    pub bottoken: String,
    pub chatid: String,
}

#[derive(Debug, Serialize)]
pub(crate) struct CreateContactPointRequest {
    pub name: &'static str,
    #[serde(rename = "type")]
    pub cp_type: &'static str,
    pub settings: TelegramSettings,
}

#[derive(Debug, Deserialize)]
pub(crate) struct ContactPointResponse {
    pub uid: ContactPointId,
    pub name: Option<String>,
}

/// Root of the organization's notification policy tree.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct NotificationPolicy {
    pub receiver: String,
    pub group_by: Vec<String>,
    pub group_wait: String,
    pub group_interval: String,
    pub repeat_interval: String,
}

impl NotificationPolicy {
    pub fn default_for(contact_point: &ContactPoint) -> Self {
        Self {
            receiver: contact_point.name.clone(),
            group_by: vec!["alertname".to_string()],
            group_wait: "30s".to_string(),
            group_interval: "5m".to_string(),
            repeat_interval: "4h".to_string(),
        }
    }
}

#[derive(Debug, Clone, Deserialize)]
pub struct CurrentUser {
    pub id: i64,
    pub login: String,
    #[serde(rename = "isGrafanaAdmin", default)]
    pub is_grafana_admin: bool,
}

#[derive(Debug, Deserialize)]
pub(crate) struct ApiMessage {
    pub message: Option<String>,
}
