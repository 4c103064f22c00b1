//! Provisioning orchestration
//!
//! Ordered steps over injected services, with the resource group released on
//! every exit path.

pub mod context;
pub mod interaction;
pub mod plan;
pub mod reporter;
pub mod runner;
pub mod state;
pub mod steps;

pub use context::{ResourceGroupLease, RunContext, Services};
pub use interaction::{ConsoleInteraction, Interaction, NonInteractive};
pub use plan::{RunPlan, WarmupPlan};
pub use reporter::{ConsoleReporter, LogLevel, RecordingReporter, Reporter};
pub use runner::Orchestrator;
pub use state::{CleanupOutcome, ProvisionState, RunOutcome};
pub use steps::{default_steps, ProvisionStep};
