//! HTML chat messages for every command outcome

use crate::grafana::{GrafanaError, Organization};
use crate::workflow::{ProvisionedProject, ProvisioningFailure, WorkflowError};

pub use tera::escape_html;

pub const UNAUTHORIZED: &str = "Unauthorized.";
pub const UNKNOWN_COMMAND: &str = "Unknown command. Send /help for the list of commands.";

pub fn help() -> String {
    "<b>Grafana Manager — available commands:</b>\n\n\
     /create_project &lt;name&gt; &lt;chat_id&gt;\n  \
     Create a Grafana organization with Prometheus, Loki,\n  \
     Tempo datasources, a dashboard folder, and a Telegram\n  \
     alert contact point.\n\n\
     /list_projects\n  \
     List all Grafana organizations (excluding Main Org).\n\n\
     /delete_project &lt;name&gt;\n  \
     Delete a Grafana organization and all its data.\n\n\
     /help — show this message"
        .to_string()
}

pub fn creating(name: &str) -> String {
    format!("Creating project <b>{}</b>…", escape_html(name))
}

pub fn created(project: &ProvisionedProject) -> String {
    format!(
        "Project <b>{}</b> created successfully.\n\
         Org ID: <code>{}</code>\n\
         Datasources: {}\n\
         Folder: <code>{}</code>\n\
         Alerts → chat <code>{}</code>",
        escape_html(&project.name),
        project.org_id,
        escape_html(&project.datasources.join(", ")),
        escape_html(&project.folder_uid),
        project.chat_id
    )
}

pub fn project_list(projects: &[Organization]) -> String {
    if projects.is_empty() {
        return "No projects found.".to_string();
    }
    let lines: Vec<String> = projects
        .iter()
        .map(|org| format!("• <b>{}</b> (ID: {})", escape_html(&org.name), org.id))
        .collect();
    format!("<b>Projects:</b>\n{}", lines.join("\n"))
}

pub fn deleted(name: &str) -> String {
    format!("Project <b>{}</b> deleted successfully.", escape_html(name))
}

pub fn not_found(name: &str) -> String {
    format!("Project <b>{}</b> not found.", escape_html(name))
}

pub fn provisioning_failed(name: &str, failure: &ProvisioningFailure) -> String {
    let mut text = format!(
        "Error while creating <b>{}</b> at step <b>{}</b> ({}): {}",
        escape_html(name),
        failure.step.label(),
        failure.kind,
        escape_html(&failure.message)
    );
    if let Some(datasource) = &failure.datasource {
        text.push_str(&format!("\nFailed datasource: <b>{}</b>", escape_html(datasource)));
    }
    if let Some(org_id) = failure.org_id {
        let resources: Vec<String> = failure.left_in_place.iter().map(|r| r.to_string()).collect();
        text.push_str(&format!(
            "\nOrganization <code>{}</code> is partially provisioned and was left in place ({}).\n\
             Run /delete_project {} before retrying.",
            org_id,
            escape_html(&resources.join(", ")),
            escape_html(name)
        ));
    }
    text
}

pub fn error(err: &WorkflowError) -> String {
    match err {
        WorkflowError::Grafana(GrafanaError::Auth(msg)) => format!(
            "Error: Grafana rejected the bot's credentials ({}). Check GRAFANA_USER and GRAFANA_PASSWORD.",
            escape_html(msg)
        ),
        other => format!("Error: {}", escape_html(&other.to_string())),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::workflow::{ErrorKind, ProvisionedResource, ProvisioningStep};

    #[test]
    fn test_escape_html() {
        assert_eq!(escape_html("<b>a & b</b>"), "&lt;b&gt;a &amp; b&lt;&#x2F;b&gt;");
        assert_eq!(escape_html("it's \"x\""), "it&#x27;s &quot;x&quot;");
    }

    #[test]
    fn test_project_list() {
        assert_eq!(project_list(&[]), "No projects found.");
        let projects = vec![
            Organization { id: 2, name: "acme".to_string() },
            Organization { id: 3, name: "globex".to_string() },
        ];
        assert_eq!(
            project_list(&projects),
            "<b>Projects:</b>\n• <b>acme</b> (ID: 2)\n• <b>globex</b> (ID: 3)"
        );
    }

    #[test]
    fn test_partial_failure_mentions_cleanup() {
        let failure = ProvisioningFailure {
            step: ProvisioningStep::DatasourcesProvisioning,
            kind: ErrorKind::Api,
            message: "Grafana returned HTTP 500: boom".to_string(),
            org_id: Some(3),
            datasource: Some("Loki".to_string()),
            left_in_place: vec![
                ProvisionedResource::Organization(3),
                ProvisionedResource::Datasource("Prometheus".to_string()),
            ],
        };

        let text = provisioning_failed("acme", &failure);
        assert!(text.contains("at step <b>datasources</b> (api)"));
        assert!(text.contains("Failed datasource: <b>Loki</b>"));
        assert!(text.contains("organization 3, datasource Prometheus"));
        assert!(text.contains("/delete_project acme"));
    }

    #[test]
    fn test_failure_without_org_has_no_cleanup_hint() {
        let failure = ProvisioningFailure {
            step: ProvisioningStep::OrgCreating,
            kind: ErrorKind::Conflict,
            message: "Organization 'acme' already exists.".to_string(),
            org_id: None,
            datasource: None,
            left_in_place: vec![],
        };

        let text = provisioning_failed("acme", &failure);
        assert!(text.contains("already exists"));
        assert!(!text.contains("/delete_project"));
    }
}
