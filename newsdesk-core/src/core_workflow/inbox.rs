//! Ideas-inbox review markers
//!
//! Stories and pieces share the same pending-review sub-lifecycle: an entity
//! starts neither approved nor rejected, and approve/reject/park are
//! mutually exclusive on the persisted markers (last write wins). Parking is
//! never materialized as a transition; visibility is a pure function of
//! (now, parked_until).

use serde::{Deserialize, Serialize};

use crate::model::{Timestamp, UserId};

/// Approval markers shared by stories and pieces
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ReviewState {
    /// Whether the entity has been approved into the active workflow
    pub approved: bool,

    /// Who approved it
    pub approved_by: Option<UserId>,

    /// When it was approved
    pub approved_at: Option<Timestamp>,

    /// When it was rejected
    pub rejected_at: Option<Timestamp>,

    /// Why it was rejected
    pub rejection_reason: Option<String>,

    /// Hidden from the inbox until this instant passes
    pub parked_until: Option<Timestamp>,
}

impl ReviewState {
    /// Approve the entity, clearing any rejection or park markers
    pub fn approve(&mut self, by: UserId, now: Timestamp) {
        self.approved = true;
        self.approved_by = Some(by);
        self.approved_at = Some(now);
        self.rejected_at = None;
        self.rejection_reason = None;
        self.parked_until = None;
    }

    /// Reject the entity, clearing any approval or park markers
    pub fn reject(&mut self, reason: String, now: Timestamp) {
        self.approved = false;
        self.approved_by = None;
        self.approved_at = None;
        self.rejected_at = Some(now);
        self.rejection_reason = Some(reason);
        self.parked_until = None;
    }

    /// Park the entity until a future instant, clearing approval/rejection
    pub fn park(&mut self, until: Timestamp) {
        self.approved = false;
        self.approved_by = None;
        self.approved_at = None;
        self.rejected_at = None;
        self.rejection_reason = None;
        self.parked_until = Some(until);
    }

    /// Still awaiting a review decision
    pub fn is_pending(&self) -> bool {
        !self.approved && self.rejected_at.is_none()
    }

    /// Whether the entity surfaces in the ideas inbox at `now`
    ///
    /// Parked entities resurface automatically once the threshold passes;
    /// nothing is stored when that happens.
    pub fn in_inbox(&self, now: Timestamp) -> bool {
        if !self.is_pending() {
            return false;
        }
        match self.parked_until {
            None => true,
            Some(until) => until <= now,
        }
    }
}
