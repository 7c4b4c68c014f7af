//! Error types for tree operations.
//!
//! Every variant signals caller misuse or a broken structural invariant. Data
//! conditions such as a missing key or a duplicate insert are reported through
//! ordinary return values instead.

use thiserror::Error;

/// Result type for tree operations
pub type Result<T> = std::result::Result<T, TreeError>;

/// Unrecoverable tree errors. `op` names the failing operation.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum TreeError {
    /// Insert was handed a zero-length payload
    #[error("{op}: payload must be at least one byte")]
    EmptyPayload { op: &'static str },

    /// Operation requires at least one element
    #[error("{op}: invoked on an empty tree")]
    EmptyTree { op: &'static str },

    /// A structural invariant does not hold
    #[error("{op}: malformed tree ({reason})")]
    Malformed {
        op: &'static str,
        reason: &'static str,
    },

    /// Scratch space could not be reserved
    #[error("{op}: failed to reserve space for {nodes} nodes")]
    AllocationFailed { op: &'static str, nodes: usize },
}

impl TreeError {
    pub(crate) fn empty_payload(op: &'static str) -> Self {
        Self::EmptyPayload { op }
    }

    pub(crate) fn empty_tree(op: &'static str) -> Self {
        Self::EmptyTree { op }
    }

    pub(crate) fn malformed(op: &'static str, reason: &'static str) -> Self {
        Self::Malformed { op, reason }
    }

    pub(crate) fn allocation_failed(op: &'static str, nodes: usize) -> Self {
        Self::AllocationFailed { op, nodes }
    }
}
