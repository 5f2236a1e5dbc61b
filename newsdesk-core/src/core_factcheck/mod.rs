//! Fact-check verification lifecycle
//!
//! A fact-check flags a text span on a story or piece for verification. Once
//! a reviewer leaves `pending` the verdict can be corrected between
//! `verified` and `disputed` indefinitely, but never returns to `pending`.
//! Each item carries an append-only comment thread.

pub mod factcheck;
pub mod manager;

pub use factcheck::{
    CheckComment, CheckParent, FactCheck, FactCheckKind, FactCheckStatus, TextSelection,
};
pub use manager::FactCheckManager;

use thiserror::Error;

/// Fact-check operation errors
#[derive(Debug, Error)]
pub enum FactCheckError {
    /// Absent ids and ids belonging to another workspace are reported
    /// identically
    #[error("Fact-check not found")]
    NotFound,

    #[error("Cannot move fact-check from {from} to {to}")]
    InvalidTransition {
        from: FactCheckStatus,
        to: FactCheckStatus,
    },

    #[error("Invalid input: {0}")]
    InvalidInput(String),

    #[error("Membership error: {0}")]
    Membership(#[from] crate::core_workspace::MembershipError),

    #[error("Workflow error: {0}")]
    Workflow(#[from] crate::core_workflow::WorkflowError),

    #[error("Activity error: {0}")]
    Activity(#[from] crate::core_activity::ActivityError),

    #[error("Storage error: {0}")]
    Storage(#[from] crate::storage::StoreError),
}
