use async_trait::async_trait;
use reqwest::{Client, Method, RequestBuilder, Response, StatusCode};
use serde::de::DeserializeOwned;
use std::time::Duration;
use tokio::sync::RwLock;
use tracing::{debug, error, info};

use super::models::{
    folder_uid, ApiMessage, ContactPointResponse, CreateContactPointRequest, CreateFolderRequest,
    CreateOrgResponse, FolderResponse, TelegramSettings, CONTACT_POINT_NAME,
};
use super::{
    ContactPoint, CurrentUser, DatasourceDescriptor, FolderId, GrafanaApi, GrafanaError,
    NotificationPolicy, OrgId, Organization,
};
use crate::config::Config;

const ORG_HEADER: &str = "X-Grafana-Org-Id";

/// Basic-auth client for the Grafana HTTP API.
///
/// Org-scoped calls carry the org chosen by the last `select_organization`
/// both as the user's server-side context and as the `X-Grafana-Org-Id`
/// header.
pub struct GrafanaClient {
    client: Client,
    base_url: String,
    user: String,
    password: String,
    bot_token: String,
    timeout: Duration,
    selected_org: RwLock<Option<OrgId>>,
}

impl GrafanaClient {
    pub fn new(config: &Config) -> crate::Result<Self> {
        let client = Client::builder()
            .timeout(config.grafana.timeout)
            .build()?;

        Ok(Self {
            client,
            base_url: config.grafana.url.trim_end_matches('/').to_string(),
            user: config.grafana.user.clone(),
            password: config.grafana.password.clone(),
            bot_token: config.telegram.bot_token.clone(),
            timeout: config.grafana.timeout,
            selected_org: RwLock::new(None),
        })
    }

    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    pub async fn selected_organization(&self) -> Option<OrgId> {
        *self.selected_org.read().await
    }

    fn request(&self, method: Method, path: &str) -> RequestBuilder {
        let url = format!("{}{}", self.base_url, path);
        debug!("Grafana request: {} {}", method, path);
        self.client
            .request(method, url)
            .basic_auth(&self.user, Some(&self.password))
    }

    async fn scoped_request(&self, method: Method, path: &str) -> Result<RequestBuilder, GrafanaError> {
        let org_id = (*self.selected_org.read().await).ok_or(GrafanaError::NoOrgSelected)?;
        Ok(self.request(method, path).header(ORG_HEADER, org_id.to_string()))
    }

    async fn send(&self, request: RequestBuilder) -> Result<Response, GrafanaError> {
        let response = request.send().await.map_err(|e| self.transport_error(e))?;
        let status = response.status();
        if status.is_success() {
            return Ok(response);
        }

        let body = response.text().await.unwrap_or_default();
        let message = serde_json::from_str::<ApiMessage>(&body)
            .ok()
            .and_then(|m| m.message)
            .unwrap_or_else(|| body.clone());

        Err(match status {
            StatusCode::UNAUTHORIZED | StatusCode::FORBIDDEN => {
                error!("Grafana credentials rejected (HTTP {}): {}", status.as_u16(), message);
                GrafanaError::Auth(message)
            }
            StatusCode::NOT_FOUND => GrafanaError::NotFound(message),
            StatusCode::CONFLICT | StatusCode::PRECONDITION_FAILED => GrafanaError::Conflict(message),
            _ => GrafanaError::Api {
                status: status.as_u16(),
                body,
            },
        })
    }

    async fn decode<T: DeserializeOwned>(response: Response) -> Result<T, GrafanaError> {
        response
            .json::<T>()
            .await
            .map_err(|e| GrafanaError::Decode(e.to_string()))
    }

    fn transport_error(&self, err: reqwest::Error) -> GrafanaError {
        if err.is_timeout() {
            GrafanaError::Transport(format!(
                "Grafana at {} did not respond within {:?}.",
                self.base_url, self.timeout
            ))
        } else {
            GrafanaError::Transport(format!(
                "Cannot reach Grafana at {}. Check that the service is running and GRAFANA_URL is correct. ({})",
                self.base_url, err
            ))
        }
    }
}

#[async_trait]
impl GrafanaApi for GrafanaClient {
    async fn create_organization(&self, name: &str) -> Result<OrgId, GrafanaError> {
        let request = self
            .request(Method::POST, "/api/orgs")
            .json(&serde_json::json!({ "name": name }));

        let response = self.send(request).await.map_err(|e| match e {
            GrafanaError::Conflict(_) => {
                GrafanaError::Conflict(format!("Organization '{}' already exists.", name))
            }
            other => other,
        })?;
        let created: CreateOrgResponse = Self::decode(response).await?;

        info!("Created Grafana organization '{}' with id {}", name, created.org_id);
        Ok(created.org_id)
    }

    async fn select_organization(&self, org_id: OrgId) -> Result<(), GrafanaError> {
        let request = self.request(Method::POST, &format!("/api/user/using/{}", org_id));
        self.send(request).await.map_err(|e| match e {
            GrafanaError::NotFound(_) => {
                GrafanaError::NotFound(format!("Organization {} not found.", org_id))
            }
            other => other,
        })?;

        *self.selected_org.write().await = Some(org_id);
        debug!("Selected Grafana organization {}", org_id);
        Ok(())
    }

    async fn add_datasource(&self, descriptor: &DatasourceDescriptor) -> Result<(), GrafanaError> {
        let request = self
            .scoped_request(Method::POST, "/api/datasources")
            .await?
            .json(&descriptor.to_payload());
        self.send(request).await?;

        info!("Added {} datasource '{}' -> {}", descriptor.kind, descriptor.name, descriptor.url);
        Ok(())
    }

    async fn create_folder(&self, name: &str) -> Result<FolderId, GrafanaError> {
        let request = self
            .scoped_request(Method::POST, "/api/folders")
            .await?
            .json(&CreateFolderRequest {
                title: name,
                uid: folder_uid(name),
            });
        let folder: FolderResponse = Self::decode(self.send(request).await?).await?;

        info!("Created dashboard folder '{}' (uid {})", name, folder.uid);
        Ok(folder.uid)
    }

    async fn create_contact_point(&self, chat_id: i64) -> Result<ContactPoint, GrafanaError> {
        let request = self
            .scoped_request(Method::POST, "/api/v1/provisioning/contact-points")
            .await?
            .header("X-Disable-Provenance", "true")
            .json(&CreateContactPointRequest {
                name: CONTACT_POINT_NAME,
                cp_type: "telegram",
                settings: TelegramSettings {
                    bottoken: self.bot_token.clone(),
                    chatid: chat_id.to_string(),
                },
            });
        let created: ContactPointResponse = Self::decode(self.send(request).await?).await?;

        info!("Created Telegram contact point {} for chat {}", created.uid, chat_id);
        Ok(ContactPoint {
            uid: created.uid,
            name: created.name.unwrap_or_else(|| CONTACT_POINT_NAME.to_string()),
        })
    }

    async fn set_default_notification_policy(&self, contact_point: &ContactPoint) -> Result<(), GrafanaError> {
        let request = self
            .scoped_request(Method::PUT, "/api/v1/provisioning/policies")
            .await?
            .header("X-Disable-Provenance", "true")
            .json(&NotificationPolicy::default_for(contact_point));
        self.send(request).await?;

        info!("Default notification policy now routes to '{}'", contact_point.name);
        Ok(())
    }

    async fn list_organizations(&self) -> Result<Vec<Organization>, GrafanaError> {
        let response = self.send(self.request(Method::GET, "/api/orgs")).await?;
        Self::decode(response).await
    }

    async fn delete_organization(&self, org_id: OrgId) -> Result<(), GrafanaError> {
        let request = self.request(Method::DELETE, &format!("/api/orgs/{}", org_id));
        self.send(request).await.map_err(|e| match e {
            GrafanaError::NotFound(_) => {
                GrafanaError::NotFound(format!("Organization {} not found.", org_id))
            }
            other => other,
        })?;

        {
            let mut selected = self.selected_org.write().await;
            if *selected == Some(org_id) {
                *selected = None;
            }
        }

        info!("Deleted Grafana organization {}", org_id);
        Ok(())
    }

    async fn current_user(&self) -> Result<CurrentUser, GrafanaError> {
        let response = self.send(self.request(Method::GET, "/api/user")).await?;
        Self::decode(response).await
    }
}
