//! Role-based authorization.
//!
//! [`authorize`] is a total function over the closed sets of roles and
//! actions. The match below has no wildcard arm, so a new role or action
//! does not compile until every rule for it has been written down.

use serde::{Deserialize, Serialize};
use std::fmt;

use hcms_core::Role;

use crate::error::{AuthError, Result};

/// Something an actor may attempt.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Action {
    CreateComplaint,
    ViewComplaint,
    ListOwnComplaints,
    ListAllComplaints,
    ChangeStatus,
    AddComment,
    DeleteComplaint,
    /// Statistics across every complaint, or another user's complaints.
    ViewStatistics,
    /// Statistics over the caller's own complaints.
    ViewOwnStatistics,
    /// Create accounts, change roles, deactivate users.
    ManageUsers,
}

impl Action {
    pub const ALL: [Action; 10] = [
        Action::CreateComplaint,
        Action::ViewComplaint,
        Action::ListOwnComplaints,
        Action::ListAllComplaints,
        Action::ChangeStatus,
        Action::AddComment,
        Action::DeleteComplaint,
        Action::ViewStatistics,
        Action::ViewOwnStatistics,
        Action::ManageUsers,
    ];

    pub fn as_str(self) -> &'static str {
        match self {
            Action::CreateComplaint => "create_complaint",
            Action::ViewComplaint => "view_complaint",
            Action::ListOwnComplaints => "list_own_complaints",
            Action::ListAllComplaints => "list_all_complaints",
            Action::ChangeStatus => "change_status",
            Action::AddComment => "add_comment",
            Action::DeleteComplaint => "delete_complaint",
            Action::ViewStatistics => "view_statistics",
            Action::ViewOwnStatistics => "view_own_statistics",
            Action::ManageUsers => "manage_users",
        }
    }
}

impl fmt::Display for Action {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Outcome of an authorization check.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Decision {
    Allow,
    Deny,
}

impl Decision {
    pub fn is_allowed(self) -> bool {
        self == Decision::Allow
    }

    /// `Deny` becomes [`AuthError::Forbidden`].
    pub fn require(self) -> Result<()> {
        match self {
            Decision::Allow => Ok(()),
            Decision::Deny => Err(AuthError::Forbidden),
        }
    }
}

impl From<bool> for Decision {
    fn from(allowed: bool) -> Self {
        if allowed {
            Decision::Allow
        } else {
            Decision::Deny
        }
    }
}

/// The permission matrix.
///
/// `is_owner` is whether the caller owns the complaint the action targets.
/// It is ignored for actions that do not target a single complaint.
pub fn authorize(role: Role, action: Action, is_owner: bool) -> Decision {
    use Action::*;
    use Role::*;

    let allowed = match (role, action) {
        (_, CreateComplaint) => true,
        (_, ListOwnComplaints) => true,
        (_, ViewOwnStatistics) => true,

        (Citizen, ViewComplaint) => is_owner,
        (Staff | Admin, ViewComplaint) => true,

        (Citizen, AddComment) => is_owner,
        (Staff | Admin, AddComment) => true,

        (Citizen, ListAllComplaints) => false,
        (Staff | Admin, ListAllComplaints) => true,

        (Citizen, ChangeStatus) => false,
        (Staff | Admin, ChangeStatus) => true,

        (Citizen, ViewStatistics) => false,
        (Staff | Admin, ViewStatistics) => true,

        (Citizen | Staff, DeleteComplaint) => false,
        (Admin, DeleteComplaint) => true,

        (Citizen | Staff, ManageUsers) => false,
        (Admin, ManageUsers) => true,
    };
    allowed.into()
}

/// [`authorize`] plus a `warn!` on denial.
#[derive(Debug, Clone, Copy, Default)]
pub struct RoleAuthorizer;

impl RoleAuthorizer {
    pub fn check(&self, role: Role, action: Action, is_owner: bool) -> Result<()> {
        let decision = authorize(role, action, is_owner);
        if !decision.is_allowed() {
            tracing::warn!(%role, %action, is_owner, "authorization denied");
        }
        decision.require()
    }
}
