use lazy_static::lazy_static;
use prometheus::{
    register_int_counter_vec_with_registry, register_int_counter_with_registry, Encoder, IntCounter,
    IntCounterVec, Registry, TextEncoder,
};

use crate::workflow::{ErrorKind, ProvisioningStep};

lazy_static! {
    pub static ref REGISTRY: Registry = Registry::new();
    pub static ref PROJECTS_CREATED_TOTAL: IntCounter = register_int_counter_with_registry!(
        "grafana_bot_projects_created_total",
        "Total number of fully provisioned projects.",
        REGISTRY
    )
    .unwrap();
    pub static ref PROJECTS_DELETED_TOTAL: IntCounter = register_int_counter_with_registry!(
        "grafana_bot_projects_deleted_total",
        "Total number of deleted projects.",
        REGISTRY
    )
    .unwrap();
    pub static ref PROVISIONING_FAILURES_TOTAL: IntCounterVec = register_int_counter_vec_with_registry!(
        "grafana_bot_provisioning_failures_total",
        "Total number of failed project creations by step and error kind.",
        &["step", "kind"],
        REGISTRY
    )
    .unwrap();
}

pub fn record_failure(step: ProvisioningStep, kind: ErrorKind) {
    PROVISIONING_FAILURES_TOTAL
        .with_label_values(&[step.label(), kind.as_str()])
        .inc();
}

// Touch every metric so the exposition lists them before the first event.
pub fn register_metrics() {
    lazy_static::initialize(&PROJECTS_CREATED_TOTAL);
    lazy_static::initialize(&PROJECTS_DELETED_TOTAL);
    lazy_static::initialize(&PROVISIONING_FAILURES_TOTAL);
}

// Function to gather metrics for exposition
pub fn gather_metrics() -> String {
    let mut buffer = vec![];
    let encoder = TextEncoder::new();
    let metric_families = REGISTRY.gather();
    if let Err(e) = encoder.encode(&metric_families, &mut buffer) {
        tracing::error!("Failed to encode metrics: {}", e);
        return String::new();
    }
    String::from_utf8(buffer).unwrap_or_default()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_failures_are_labelled_by_step_and_kind() {
        register_metrics();
        record_failure(ProvisioningStep::FolderCreating, ErrorKind::Transport);

        let text = gather_metrics();
        assert!(text.contains("grafana_bot_projects_created_total"));
        let line = text
            .lines()
            .find(|l| l.starts_with("grafana_bot_provisioning_failures_total{") && l.contains(r#"step="folder""#))
            .unwrap();
        assert!(line.contains(r#"kind="transport""#));
    }
}
