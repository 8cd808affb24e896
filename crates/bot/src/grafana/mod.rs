//! Grafana administrative API
//!
//! One method per provisioning primitive, each a single HTTP request with no
//! client-side retry. The `GrafanaApi` trait is the seam the workflow and the
//! chat dispatcher are written against.

mod client;
pub mod models;

pub use client::GrafanaClient;
pub use models::{
    ContactPoint, ContactPointId, CurrentUser, DatasourceDescriptor, DatasourceKind, FolderId,
    NotificationPolicy, OrgId, Organization,
};

use async_trait::async_trait;
use thiserror::Error;

#[derive(Debug, Clone, Error)]
pub enum GrafanaError {
    #[error("Grafana rejected the credentials: {0}")]
    Auth(String),
    #[error("{0}")]
    Conflict(String),
    #[error("{0}")]
    NotFound(String),
    #[error("Grafana returned HTTP {status}: {body}")]
    Api { status: u16, body: String },
    #[error("{0}")]
    Transport(String),
    #[error("Unexpected response from Grafana: {0}")]
    Decode(String),
    #[error("No organization selected for an org-scoped call")]
    NoOrgSelected,
}

#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait GrafanaApi: Send + Sync {
    /// Create an organization; `Conflict` when the name is taken.
    async fn create_organization(&self, name: &str) -> Result<OrgId, GrafanaError>;

    /// Switch the org context used by every org-scoped call that follows.
    async fn select_organization(&self, org_id: OrgId) -> Result<(), GrafanaError>;

    /// Not idempotent: calling twice creates a duplicate.
    async fn add_datasource(&self, descriptor: &DatasourceDescriptor) -> Result<(), GrafanaError>;

    async fn create_folder(&self, name: &str) -> Result<FolderId, GrafanaError>;

    async fn create_contact_point(&self, chat_id: i64) -> Result<ContactPoint, GrafanaError>;

    /// Overwrites the organization's existing policy tree unconditionally.
    async fn set_default_notification_policy(&self, contact_point: &ContactPoint) -> Result<(), GrafanaError>;

    /// Every organization, the default one included.
    async fn list_organizations(&self) -> Result<Vec<Organization>, GrafanaError>;

    /// Irreversible; Grafana has no soft delete.
    async fn delete_organization(&self, org_id: OrgId) -> Result<(), GrafanaError>;

    async fn current_user(&self) -> Result<CurrentUser, GrafanaError>;
}
