use chrono::{DateTime, Utc};
use serde::Serialize;
use std::fmt;
use thiserror::Error;

use crate::grafana::{ContactPointId, FolderId, GrafanaError, OrgId};
use crate::workflow::{ProvisionedResource, ProvisioningStep};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum ErrorKind {
    Validation,
    Auth,
    Conflict,
    NotFound,
    Api,
    Transport,
}

impl ErrorKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            ErrorKind::Validation => "validation",
            ErrorKind::Auth => "auth",
            ErrorKind::Conflict => "conflict",
            ErrorKind::NotFound => "not_found",
            ErrorKind::Api => "api",
            ErrorKind::Transport => "transport",
        }
    }
}

impl fmt::Display for ErrorKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl From<&GrafanaError> for ErrorKind {
    fn from(err: &GrafanaError) -> Self {
        match err {
            GrafanaError::Auth(_) => ErrorKind::Auth,
            GrafanaError::Conflict(_) => ErrorKind::Conflict,
            GrafanaError::NotFound(_) => ErrorKind::NotFound,
            GrafanaError::Transport(_) => ErrorKind::Transport,
            GrafanaError::Api { .. } | GrafanaError::Decode(_) | GrafanaError::NoOrgSelected => {
                ErrorKind::Api
            }
        }
    }
}

/// A fully provisioned project.
#[derive(Debug, Clone, Serialize)]
pub struct ProvisionedProject {
    pub name: String,
    pub org_id: OrgId,
    pub chat_id: i64,
    pub datasources: Vec<String>,
    pub folder_uid: FolderId,
    pub contact_point_uid: ContactPointId,
    pub started_at: DateTime<Utc>,
    pub completed_at: DateTime<Utc>,
}

/// `Failed(at_step)`: where the run stopped, why, and what it left behind.
#[derive(Debug, Clone, Error)]
#[error("{step} failed ({kind}): {message}")]
pub struct ProvisioningFailure {
    pub step: ProvisioningStep,
    pub kind: ErrorKind,
    pub message: String,
    pub org_id: Option<OrgId>,
    /// Name of the datasource whose creation failed.
    pub datasource: Option<String>,
    /// Resources created before the failure. They are not rolled back.
    pub left_in_place: Vec<ProvisionedResource>,
}

impl ProvisioningFailure {
    /// An organization exists but not every resource was created.
    pub fn is_partial(&self) -> bool {
        self.org_id.is_some()
    }
}

#[derive(Debug, Clone, Error)]
pub enum WorkflowError {
    #[error("{0}")]
    Validation(String),
    #[error(transparent)]
    Grafana(#[from] GrafanaError),
    #[error(transparent)]
    Failed(Box<ProvisioningFailure>),
}

impl WorkflowError {
    pub fn kind(&self) -> ErrorKind {
        match self {
            WorkflowError::Validation(_) => ErrorKind::Validation,
            WorkflowError::Grafana(e) => ErrorKind::from(e),
            WorkflowError::Failed(f) => f.kind,
        }
    }
}

impl From<ProvisioningFailure> for WorkflowError {
    fn from(failure: ProvisioningFailure) -> Self {
        WorkflowError::Failed(Box::new(failure))
    }
}
