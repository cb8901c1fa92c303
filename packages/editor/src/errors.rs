//! Error types for the editor

use crate::mutations::MutationError;
use npb_tree::{GroupingId, NodeId, NodeKind, TreeError};
use thiserror::Error;

/// Failure of a fragment request. Every variant is terminal for the action.
#[derive(Error, Debug, Clone, PartialEq)]
pub enum FetchError {
    #[error("Transport error: {0}")]
    Transport(String),

    #[error("Renderer answered {status} for {endpoint}")]
    Status { endpoint: String, status: u16 },

    #[error("Unusable fragment: {0}")]
    Decode(String),
}

impl From<TreeError> for FetchError {
    fn from(e: TreeError) -> Self {
        FetchError::Decode(e.to_string())
    }
}

/// Errors surfaced at the operation boundary of the builder
#[derive(Error, Debug, Clone, PartialEq)]
pub enum EditError {
    #[error("Unknown {kind} pattern `{pattern}`")]
    InvalidPattern { kind: NodeKind, pattern: String },

    #[error("Incompatible target: {0}")]
    IncompatibleTarget(String),

    #[error("Fragment fetch failed: {0}")]
    FetchFailure(#[from] FetchError),

    #[error("Node not found: {0}")]
    NodeNotFound(NodeId),

    #[error("Grouping not found: {0}")]
    GroupingNotFound(GroupingId),

    #[error("Trigger {0} already has a pending fetch")]
    TriggerBusy(String),

    #[error("No choice picker is open")]
    NoActivePicker,

    #[error("No drag gesture in progress")]
    DragNotActive,

    #[error("Tree error: {0}")]
    Tree(#[from] TreeError),
}

impl EditError {
    pub fn invalid_pattern(kind: NodeKind, pattern: impl Into<String>) -> Self {
        Self::InvalidPattern {
            kind,
            pattern: pattern.into(),
        }
    }

    pub fn is_incompatible(&self) -> bool {
        matches!(self, EditError::IncompatibleTarget(_))
    }
}

impl From<MutationError> for EditError {
    fn from(e: MutationError) -> Self {
        match e {
            MutationError::NodeNotFound(id) => EditError::NodeNotFound(id),
            MutationError::GroupingNotFound(id) => EditError::GroupingNotFound(id),
            other => EditError::IncompatibleTarget(other.to_string()),
        }
    }
}
