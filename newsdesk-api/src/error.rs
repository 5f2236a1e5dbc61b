//! Unified error taxonomy for the operation surface
//!
//! Every expected outcome from the core maps into one of these kinds;
//! transport collaborators translate kinds into their own status codes.
//! Infrastructure faults collapse into `Internal` and never carry detail to
//! the caller.

use thiserror::Error;

use newsdesk_core::core_factcheck::FactCheckError;
use newsdesk_core::core_identity::AuthError;
use newsdesk_core::core_workflow::WorkflowError;
use newsdesk_core::core_workspace::{InviteError, MembershipError, WorkspaceError};
use newsdesk_core::storage::StoreError;

#[derive(Debug, Error)]
pub enum ApiError {
    /// Missing/invalid/expired credential, or its subject no longer exists
    #[error("Please sign in again: {0}")]
    Unauthenticated(String),

    /// Authenticated but lacking membership or role
    #[error("You don't have permission: {0}")]
    Forbidden(String),

    /// Absent entities and entities in another workspace, reported
    /// identically
    #[error("{0} not found")]
    NotFound(String),

    /// State conflicts with a specific actionable message
    #[error("{0}")]
    Conflict(String),

    /// Malformed input or an out-of-range state transition
    #[error("{0}")]
    Invalid(String),

    /// Backpressure from the upstream rate-limit collaborator
    #[error("Too many attempts; retry after {retry_after_secs}s")]
    RateLimited { retry_after_secs: u64 },

    /// Infrastructure failure; details stay in the logs
    #[error("Internal error")]
    Internal(#[from] anyhow::Error),
}

pub type ApiResult<T> = Result<T, ApiError>;

impl From<StoreError> for ApiError {
    fn from(e: StoreError) -> Self {
        ApiError::Internal(anyhow::Error::new(e))
    }
}

impl From<AuthError> for ApiError {
    fn from(e: AuthError) -> Self {
        match e {
            AuthError::Unauthenticated => {
                ApiError::Unauthenticated("Session is invalid or expired".to_string())
            }
            AuthError::InvalidCredentials => {
                ApiError::Unauthenticated("Invalid email or password".to_string())
            }
            AuthError::EmailTaken => ApiError::Conflict("Email is already registered".to_string()),
            AuthError::InvalidInput(msg) => ApiError::Invalid(msg),
            AuthError::HashingFailed(_) => ApiError::Internal(anyhow::Error::new(e)),
            AuthError::Storage(e) => e.into(),
        }
    }
}

impl From<WorkspaceError> for ApiError {
    fn from(e: WorkspaceError) -> Self {
        match e {
            WorkspaceError::NotFound => ApiError::NotFound("Workspace".to_string()),
            WorkspaceError::InvalidName(msg) => ApiError::Invalid(msg),
            WorkspaceError::SlugExhausted => {
                ApiError::Conflict("Could not allocate a unique slug for that name".to_string())
            }
            WorkspaceError::Storage(e) => e.into(),
        }
    }
}

impl From<InviteError> for ApiError {
    fn from(e: InviteError) -> Self {
        match e {
            InviteError::InvalidOrExpired => {
                ApiError::Invalid("Invite is invalid or has expired".to_string())
            }
            InviteError::Storage(e) => e.into(),
        }
    }
}

impl From<MembershipError> for ApiError {
    fn from(e: MembershipError) -> Self {
        match e {
            MembershipError::WorkspaceNotFound => ApiError::NotFound("Workspace".to_string()),
            MembershipError::NotAMember => {
                ApiError::Forbidden("You are not a member of this workspace".to_string())
            }
            MembershipError::InsufficientRole { minimum } => {
                ApiError::Forbidden(format!("Requires {} role or above", minimum))
            }
            MembershipError::MemberNotFound => ApiError::NotFound("Member".to_string()),
            MembershipError::LastOwner => {
                ApiError::Conflict("A workspace must retain at least one owner".to_string())
            }
            MembershipError::Invite(e) => e.into(),
            MembershipError::Workspace(e) => e.into(),
            MembershipError::Storage(e) => e.into(),
        }
    }
}

impl From<WorkflowError> for ApiError {
    fn from(e: WorkflowError) -> Self {
        match e {
            WorkflowError::StoryNotFound => ApiError::NotFound("Story".to_string()),
            WorkflowError::PieceNotFound => ApiError::NotFound("Piece".to_string()),
            WorkflowError::InvalidTransition { from, to } => {
                ApiError::Invalid(format!("Cannot move piece from {} to {}", from, to))
            }
            WorkflowError::NotArchived => {
                ApiError::Invalid("Entity is not archived".to_string())
            }
            WorkflowError::AlreadyInPackage => {
                ApiError::Conflict("Story is already part of another package".to_string())
            }
            WorkflowError::ChildOrderCycle => {
                ApiError::Conflict("Ordering would make a story its own ancestor".to_string())
            }
            WorkflowError::InvalidInput(msg) => ApiError::Invalid(msg),
            WorkflowError::Membership(e) => e.into(),
            WorkflowError::Activity(e) => ApiError::Internal(anyhow::Error::new(e)),
            WorkflowError::Storage(e) => e.into(),
        }
    }
}

impl From<FactCheckError> for ApiError {
    fn from(e: FactCheckError) -> Self {
        match e {
            FactCheckError::NotFound => ApiError::NotFound("Fact-check".to_string()),
            FactCheckError::InvalidTransition { from, to } => {
                ApiError::Invalid(format!("Cannot move fact-check from {} to {}", from, to))
            }
            FactCheckError::InvalidInput(msg) => ApiError::Invalid(msg),
            FactCheckError::Membership(e) => e.into(),
            FactCheckError::Workflow(e) => e.into(),
            FactCheckError::Activity(e) => ApiError::Internal(anyhow::Error::new(e)),
            FactCheckError::Storage(e) => e.into(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use newsdesk_core::core_workspace::Role;

    #[test]
    fn test_membership_errors_classify() {
        let err: ApiError = MembershipError::NotAMember.into();
        assert!(matches!(err, ApiError::Forbidden(_)));

        let err: ApiError = MembershipError::InsufficientRole {
            minimum: Role::Admin,
        }
        .into();
        assert!(matches!(err, ApiError::Forbidden(_)));

        let err: ApiError = MembershipError::LastOwner.into();
        assert!(matches!(err, ApiError::Conflict(_)));

        let err: ApiError = MembershipError::WorkspaceNotFound.into();
        assert!(matches!(err, ApiError::NotFound(_)));
    }

    #[test]
    fn test_workflow_errors_classify() {
        let err: ApiError = WorkflowError::StoryNotFound.into();
        assert!(matches!(err, ApiError::NotFound(_)));

        let err: ApiError = WorkflowError::ChildOrderCycle.into();
        assert!(matches!(err, ApiError::Conflict(_)));

        use newsdesk_core::core_workflow::PieceState;
        let err: ApiError = WorkflowError::InvalidTransition {
            from: PieceState::Scripting,
            to: PieceState::Published,
        }
        .into();
        assert!(matches!(err, ApiError::Invalid(_)));
    }

    #[test]
    fn test_auth_errors_become_unauthenticated() {
        let err: ApiError = AuthError::Unauthenticated.into();
        assert!(matches!(err, ApiError::Unauthenticated(_)));

        let err: ApiError = AuthError::InvalidCredentials.into();
        assert!(matches!(err, ApiError::Unauthenticated(_)));
    }

    #[test]
    fn test_internal_error_hides_detail() {
        let err: ApiError = anyhow::anyhow!("connection refused to 10.0.0.3").into();
        assert_eq!(format!("{}", err), "Internal error");
    }
}
