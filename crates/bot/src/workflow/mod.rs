pub mod context;
pub mod engine;
pub mod outcome;
pub mod state;
pub mod validation;

pub use context::{ProvisionedResource, ProvisioningContext};
pub use engine::ProvisioningWorkflow;
pub use outcome::{ErrorKind, ProvisionedProject, ProvisioningFailure, WorkflowError};
pub use state::ProvisioningStep;
