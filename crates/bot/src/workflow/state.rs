use serde::Serialize;
use std::fmt;

/// States of a `create_project` run, in execution order. A failure is
/// reported against the state that was active when it happened.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
pub enum ProvisioningStep {
    Idle,
    OrgCreating,
    DatasourcesProvisioning,
    FolderCreating,
    AlertingConfiguring,
    Done,
}

impl ProvisioningStep {
    /// The state that follows this one on success.
    pub fn next(&self) -> Option<ProvisioningStep> {
        match self {
            ProvisioningStep::Idle => Some(ProvisioningStep::OrgCreating),
            ProvisioningStep::OrgCreating => Some(ProvisioningStep::DatasourcesProvisioning),
            ProvisioningStep::DatasourcesProvisioning => Some(ProvisioningStep::FolderCreating),
            ProvisioningStep::FolderCreating => Some(ProvisioningStep::AlertingConfiguring),
            ProvisioningStep::AlertingConfiguring => Some(ProvisioningStep::Done),
            ProvisioningStep::Done => None,
        }
    }

    /// Short label for chat output and metric labels.
    pub fn label(&self) -> &'static str {
        match self {
            ProvisioningStep::Idle => "validation",
            ProvisioningStep::OrgCreating => "organization",
            ProvisioningStep::DatasourcesProvisioning => "datasources",
            ProvisioningStep::FolderCreating => "folder",
            ProvisioningStep::AlertingConfiguring => "alerting",
            ProvisioningStep::Done => "done",
        }
    }
}

impl fmt::Display for ProvisioningStep {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ProvisioningStep::Idle => write!(f, "Idle"),
            ProvisioningStep::OrgCreating => write!(f, "OrgCreating"),
            ProvisioningStep::DatasourcesProvisioning => write!(f, "DatasourcesProvisioning"),
            ProvisioningStep::FolderCreating => write!(f, "FolderCreating"),
            ProvisioningStep::AlertingConfiguring => write!(f, "AlertingConfiguring"),
            ProvisioningStep::Done => write!(f, "Done"),
        }
    }
}
