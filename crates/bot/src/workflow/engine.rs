use chrono::Utc;
use std::sync::Arc;
use tracing::{error, info, warn};

use crate::{
    config::{Config, DatasourceUrls},
    grafana::{DatasourceDescriptor, GrafanaApi, GrafanaError, OrgId, Organization},
    metrics,
    workflow::{
        validation::{validate_chat_id, validate_project_name},
        ErrorKind, ProvisionedProject, ProvisionedResource, ProvisioningContext,
        ProvisioningFailure, ProvisioningStep, WorkflowError,
    },
};

/// Creates, lists and deletes projects. Every step is one Grafana call made
/// strictly in sequence; a failed create leaves what it already built in
/// place and reports the step it stopped at.
pub struct ProvisioningWorkflow {
    grafana: Arc<dyn GrafanaApi>,
    datasources: DatasourceUrls,
    reserved_org_name: String,
}

impl ProvisioningWorkflow {
    pub fn new(grafana: Arc<dyn GrafanaApi>, config: &Config) -> Self {
        Self {
            grafana,
            datasources: config.datasources.clone(),
            reserved_org_name: config.grafana.reserved_org_name.clone(),
        }
    }

    /// The fixed metrics/logs/traces datasources of a project.
    pub fn datasources_for(&self, project: &str) -> Vec<DatasourceDescriptor> {
        vec![
            DatasourceDescriptor::prometheus(&self.datasources.metrics),
            DatasourceDescriptor::loki(&self.datasources.logs, project),
            DatasourceDescriptor::tempo(&self.datasources.traces),
        ]
    }

    pub async fn create_project(&self, name: &str, chat_id: i64) -> Result<ProvisionedProject, WorkflowError> {
        let name = name.trim();
        if let Err(e) = validate_project_name(name, &self.reserved_org_name)
            .and_then(|_| validate_chat_id(chat_id))
        {
            metrics::record_failure(ProvisioningStep::Idle, ErrorKind::Validation);
            return Err(e);
        }

        info!("Creating project '{}' (alerts -> chat {})", name, chat_id);
        let mut ctx = ProvisioningContext::new(name, chat_id);

        ctx.advance();
        let org_id = match self.grafana.create_organization(name).await {
            Ok(id) => id,
            Err(e) => return Err(self.fail(&ctx, e, None)),
        };
        ctx.record(ProvisionedResource::Organization(org_id));

        ctx.advance();
        if let Err(e) = self.grafana.select_organization(org_id).await {
            return Err(self.fail(&ctx, e, None));
        }
        for descriptor in self.datasources_for(name) {
            if let Err(e) = self.grafana.add_datasource(&descriptor).await {
                return Err(self.fail(&ctx, e, Some(descriptor.name)));
            }
            ctx.record(ProvisionedResource::Datasource(descriptor.name));
        }

        ctx.advance();
        let folder_uid = match self.grafana.create_folder(name).await {
            Ok(uid) => uid,
            Err(e) => return Err(self.fail(&ctx, e, None)),
        };
        ctx.record(ProvisionedResource::Folder(folder_uid.clone()));

        ctx.advance();
        let contact_point = match self.grafana.create_contact_point(chat_id).await {
            Ok(cp) => cp,
            Err(e) => return Err(self.fail(&ctx, e, None)),
        };
        ctx.record(ProvisionedResource::ContactPoint(contact_point.uid.clone()));
        if let Err(e) = self.grafana.set_default_notification_policy(&contact_point).await {
            return Err(self.fail(&ctx, e, None));
        }
        ctx.record(ProvisionedResource::NotificationPolicy(contact_point.name.clone()));

        ctx.advance();
        metrics::PROJECTS_CREATED_TOTAL.inc();
        info!("Project '{}' provisioned as organization {}", name, org_id);

        Ok(ProvisionedProject {
            name: name.to_string(),
            org_id,
            chat_id,
            datasources: ctx.datasource_names(),
            folder_uid,
            contact_point_uid: contact_point.uid,
            started_at: ctx.started_at,
            completed_at: Utc::now(),
        })
    }

    /// Every organization except the reserved default one, in server order.
    pub async fn list_projects(&self) -> Result<Vec<Organization>, WorkflowError> {
        let orgs = self.grafana.list_organizations().await.map_err(|e| {
            error!("Listing organizations failed: {}", e);
            WorkflowError::from(e)
        })?;

        Ok(orgs
            .into_iter()
            .filter(|org| !self.is_reserved(&org.name))
            .collect())
    }

    pub async fn delete_project(&self, name: &str) -> Result<OrgId, WorkflowError> {
        let name = name.trim();
        if name.is_empty() {
            return Err(WorkflowError::Validation("Project name must not be empty.".to_string()));
        }
        if self.is_reserved(name) {
            return Err(WorkflowError::Validation(format!(
                "'{}' is the reserved default organization and cannot be deleted.",
                name
            )));
        }

        let org = self
            .list_projects()
            .await?
            .into_iter()
            .find(|org| org.name == name)
            .ok_or_else(|| {
                WorkflowError::Grafana(GrafanaError::NotFound(format!("Project '{}' not found.", name)))
            })?;

        info!("Deleting project '{}' (organization {})", name, org.id);
        self.grafana.delete_organization(org.id).await.map_err(|e| {
            error!("Deleting organization {} failed: {}", org.id, e);
            WorkflowError::from(e)
        })?;
        metrics::PROJECTS_DELETED_TOTAL.inc();

        Ok(org.id)
    }

    fn is_reserved(&self, name: &str) -> bool {
        name.trim().eq_ignore_ascii_case(self.reserved_org_name.trim())
    }

    fn fail(&self, ctx: &ProvisioningContext, err: GrafanaError, datasource: Option<String>) -> WorkflowError {
        let kind = ErrorKind::from(&err);
        let failure = ProvisioningFailure {
            step: ctx.current_step,
            kind,
            message: err.to_string(),
            org_id: ctx.org_id,
            datasource,
            left_in_place: ctx.resources.clone(),
        };

        error!(
            progress = %ctx.to_json(),
            "Provisioning of '{}' failed at {}: {}",
            ctx.project, failure.step, failure.message
        );
        if failure.is_partial() {
            warn!(
                "Organization {} for '{}' is partially provisioned and was left in place",
                ctx.org_id.unwrap_or_default(),
                ctx.project
            );
        }
        metrics::record_failure(failure.step, kind);

        failure.into()
    }
}
