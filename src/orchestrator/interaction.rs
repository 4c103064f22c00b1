//! User interaction hooks

use async_trait::async_trait;

use crate::error::{ProvisionError, Result};

/// Lets a run stop and wait for the operator
#[async_trait]
pub trait Interaction: Send + Sync {
    async fn pause(&self, prompt: &str) -> Result<()>;
}

/// Never waits
#[derive(Debug, Default, Clone)]
pub struct NonInteractive;

#[async_trait]
impl Interaction for NonInteractive {
    async fn pause(&self, _prompt: &str) -> Result<()> {
        Ok(())
    }
}

/// Waits for Enter on the terminal
#[derive(Debug, Default, Clone)]
pub struct ConsoleInteraction;

#[async_trait]
impl Interaction for ConsoleInteraction {
    async fn pause(&self, prompt: &str) -> Result<()> {
        let prompt = prompt.to_string();
        tokio::task::spawn_blocking(move || {
            dialoguer::Input::<String>::new()
                .with_prompt(prompt)
                .allow_empty(true)
                .interact_text()
                .map(|_| ())
                .map_err(input_failed)
        })
        .await
        .map_err(|e| ProvisionError::interaction(format!("Input task failed: {}", e)))?
    }
}

fn input_failed(error: dialoguer::Error) -> ProvisionError {
    ProvisionError::interaction(format!("Failed to read input: {}", error))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_non_interactive_never_waits() {
        NonInteractive.pause("Press Enter").await.unwrap();
    }

    #[test]
    fn test_input_failures_are_not_setup_errors() {
        let io = std::io::Error::new(std::io::ErrorKind::Other, "not a terminal");
        let err = input_failed(dialoguer::Error::IO(io));
        assert!(matches!(err, ProvisionError::InteractionError(_)));
        assert!(!err.is_setup_error());
        assert_eq!(
            err.to_string(),
            "Terminal interaction failed: Failed to read input: IO error: not a terminal"
        );
    }
}
