//! Orchestrator
//!
//! Runs the provisioning steps in order and guarantees that the resource group
//! lease is released on every exit path: success, a failed step or shutdown.

use std::future::{pending, Future};

use super::context::{RunContext, Services};
use super::plan::RunPlan;
use super::state::{CleanupOutcome, ProvisionState, RunOutcome};
use super::steps::{default_steps, ProvisionStep};
use crate::error::{ProvisionError, Result};

const PAUSE_PROMPT: &str = "Press Enter (or Ctrl-C) to delete the resource group";
const INTERRUPTED: &str = "Interrupted, cleaning up. The resource group delete runs to completion";

pub struct Orchestrator {
    plan: RunPlan,
    services: Services,
    steps: Vec<Box<dyn ProvisionStep>>,
}

impl Orchestrator {
    pub fn new(plan: RunPlan, services: Services) -> Self {
        Self::with_steps(plan, services, default_steps())
    }

    pub fn with_steps(plan: RunPlan, services: Services, steps: Vec<Box<dyn ProvisionStep>>) -> Self {
        Self {
            plan,
            services,
            steps,
        }
    }

    pub fn plan(&self) -> &RunPlan {
        &self.plan
    }

    /// Run to completion without an external shutdown signal
    pub async fn run(self) -> RunOutcome {
        self.run_until(pending::<()>()).await
    }

    /// Run until every step finished, a step failed or `shutdown` resolved.
    /// Cleanup runs afterwards in all three cases.
    pub async fn run_until<F>(self, shutdown: F) -> RunOutcome
    where
        F: Future<Output = ()> + Send,
    {
        let Orchestrator {
            plan,
            services,
            steps,
        } = self;
        let mut ctx = RunContext::new(plan, services.clone());
        tokio::pin!(shutdown);
        let mut interrupted = false;

        let error = tokio::select! {
            result = run_steps(&steps, &mut ctx) => result.err(),
            _ = &mut shutdown => {
                interrupted = true;
                services.reporter.warn(INTERRUPTED);
                Some(ProvisionError::Cancelled)
            }
        };

        let reached = ctx.state;
        if let Some(e) = &error {
            services
                .reporter
                .error(&format!("Provisioning stopped after {}: {}", reached, e));
        }

        // A shutdown during the pause skips straight to cleanup
        if ctx.plan.pause_before_cleanup && !interrupted {
            tokio::select! {
                result = services.interaction.pause(PAUSE_PROMPT) => {
                    if let Err(e) = result {
                        tracing::warn!("Pause before cleanup failed: {}", e);
                    }
                }
                _ = &mut shutdown => services.reporter.warn(INTERRUPTED),
            }
        }

        let cleanup = match ctx.take_lease() {
            Some(lease) => {
                lease
                    .release(services.resources.as_ref(), services.reporter.as_ref())
                    .await
            }
            None => {
                services.reporter.info("Nothing to clean up");
                CleanupOutcome::NothingToCleanUp
            }
        };
        ctx.state = ProvisionState::CleanedUp;

        RunOutcome {
            reached,
            error,
            cleanup,
        }
    }
}

async fn run_steps(steps: &[Box<dyn ProvisionStep>], ctx: &mut RunContext) -> Result<()> {
    for step in steps {
        tracing::debug!("Starting step: {}", step.name());
        step.execute(ctx).await?;
        ctx.state = step.completes();
        tracing::debug!("Finished step: {} (state: {})", step.name(), ctx.state);
    }
    Ok(())
}
