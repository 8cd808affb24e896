use chrono::{DateTime, Utc};
use serde::Serialize;
use std::fmt;

use crate::grafana::{ContactPointId, FolderId, OrgId};
use crate::workflow::ProvisioningStep;

/// Something a `create_project` run has created in Grafana.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "kind", content = "id", rename_all = "snake_case")]
pub enum ProvisionedResource {
    Organization(OrgId),
    Datasource(String),
    Folder(FolderId),
    ContactPoint(ContactPointId),
    NotificationPolicy(String),
}

impl fmt::Display for ProvisionedResource {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ProvisionedResource::Organization(id) => write!(f, "organization {}", id),
            ProvisionedResource::Datasource(name) => write!(f, "datasource {}", name),
            ProvisionedResource::Folder(uid) => write!(f, "folder {}", uid),
            ProvisionedResource::ContactPoint(uid) => write!(f, "contact point {}", uid),
            ProvisionedResource::NotificationPolicy(receiver) => {
                write!(f, "notification policy -> {}", receiver)
            }
        }
    }
}

/// Progress of a single `create_project` run.
#[derive(Debug, Clone, Serialize)]
pub struct ProvisioningContext {
    pub project: String,
    pub chat_id: i64,
    pub org_id: Option<OrgId>,
    pub current_step: ProvisioningStep,
    /// Every state entered, with the time it was entered.
    pub transitions: Vec<(ProvisioningStep, DateTime<Utc>)>,
    /// Resources created so far, in creation order.
    pub resources: Vec<ProvisionedResource>,
    pub started_at: DateTime<Utc>,
}

impl ProvisioningContext {
    pub fn new(project: &str, chat_id: i64) -> Self {
        let now = Utc::now();
        Self {
            project: project.to_string(),
            chat_id,
            org_id: None,
            current_step: ProvisioningStep::Idle,
            transitions: vec![(ProvisioningStep::Idle, now)],
            resources: Vec::new(),
            started_at: now,
        }
    }

    /// Move to the step after the current one. `Done` stays `Done`.
    pub fn advance(&mut self) -> ProvisioningStep {
        if let Some(step) = self.current_step.next() {
            self.enter(step);
        }
        self.current_step
    }

    fn enter(&mut self, step: ProvisioningStep) {
        tracing::info!(
            project = %self.project,
            from = %self.current_step,
            to = %step,
            "Provisioning transition"
        );
        self.current_step = step;
        self.transitions.push((step, Utc::now()));
    }

    pub fn record(&mut self, resource: ProvisionedResource) {
        if let ProvisionedResource::Organization(id) = resource {
            self.org_id = Some(id);
        }
        self.resources.push(resource);
    }

    pub fn datasource_names(&self) -> Vec<String> {
        self.resources
            .iter()
            .filter_map(|r| match r {
                ProvisionedResource::Datasource(name) => Some(name.clone()),
                _ => None,
            })
            .collect()
    }

    /// Convert the context to JSON for logging
    pub fn to_json(&self) -> serde_json::Value {
        serde_json::json!({
            "project": self.project,
            "chat_id": self.chat_id,
            "org_id": self.org_id,
            "current_step": self.current_step.to_string(),
            "resources": self.resources,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_record_tracks_org_id_and_order() {
        let mut ctx = ProvisioningContext::new("acme", 1);
        assert_eq!(ctx.advance(), ProvisioningStep::OrgCreating);
        ctx.record(ProvisionedResource::Organization(4));
        assert_eq!(ctx.advance(), ProvisioningStep::DatasourcesProvisioning);
        ctx.record(ProvisionedResource::Datasource("Prometheus".to_string()));
        ctx.record(ProvisionedResource::Datasource("Loki".to_string()));

        assert_eq!(ctx.org_id, Some(4));
        assert_eq!(ctx.current_step, ProvisioningStep::DatasourcesProvisioning);
        assert_eq!(ctx.datasource_names(), vec!["Prometheus", "Loki"]);
        let steps: Vec<ProvisioningStep> = ctx.transitions.iter().map(|(step, _)| *step).collect();
        assert_eq!(
            steps,
            vec![
                ProvisioningStep::Idle,
                ProvisioningStep::OrgCreating,
                ProvisioningStep::DatasourcesProvisioning,
            ]
        );
    }

    #[test]
    fn test_advance_stops_at_done() {
        let mut ctx = ProvisioningContext::new("acme", 1);
        for _ in 0..10 {
            ctx.advance();
        }

        assert_eq!(ctx.current_step, ProvisioningStep::Done);
        // Idle plus the five steps after it, nothing more.
        assert_eq!(ctx.transitions.len(), 6);
    }

    #[test]
    fn test_to_json_lists_resources() {
        let mut ctx = ProvisioningContext::new("acme", 1);
        ctx.record(ProvisionedResource::Organization(4));
        let json = ctx.to_json();

        assert_eq!(json["org_id"], 4);
        assert_eq!(json["resources"][0]["kind"], "organization");
        assert_eq!(json["resources"][0]["id"], 4);
    }
}
