//! Azure Resource Manager access
//!
//! REST client plumbing, request/response models and the resource operations
//! the orchestrator drives.

pub mod arm;
pub mod models;
pub mod operations;

pub use arm::{ArmClient, PollSettings};
pub use models::*;
pub use operations::{AzureResourceManager, ResourceManager};
