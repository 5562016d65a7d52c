//! Workflow layer - explore / save / integrate / discard on the active repository

pub mod engine;
pub mod locks;
pub mod types;

pub use engine::WorkflowEngine;
pub use types::{
    CheckoutOutcome, DiscardOutcome, ExploreOutcome, IntegrationOutcome, IntegrationPreview,
    RepositoryStatus, SaveOutcome,
};
