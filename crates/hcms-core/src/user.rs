//! Users and their roles.

use serde::{Deserialize, Serialize};
use std::fmt;

use crate::error::{CoreError, Result};
use crate::types::{Timestamp, UserId};

/// The closed set of roles. Authorization decisions match on this
/// exhaustively, so adding a role forces every rule to be revisited.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
#[repr(u8)]
pub enum Role {
    /// A member of the public filing complaints.
    Citizen = 0,
    /// Hospital staff handling complaints.
    Staff = 1,
    /// Administrator.
    Admin = 2,
}

impl Role {
    pub const ALL: [Role; 3] = [Role::Citizen, Role::Staff, Role::Admin];

    pub fn to_u8(self) -> u8 {
        self as u8
    }

    pub fn from_u8(value: u8) -> Option<Self> {
        match value {
            0 => Some(Self::Citizen),
            1 => Some(Self::Staff),
            2 => Some(Self::Admin),
            _ => None,
        }
    }

    pub fn as_str(self) -> &'static str {
        match self {
            Role::Citizen => "citizen",
            Role::Staff => "staff",
            Role::Admin => "admin",
        }
    }

    pub fn parse(value: &str) -> Result<Self> {
        match value.trim().to_ascii_lowercase().as_str() {
            "citizen" => Ok(Self::Citizen),
            "staff" => Ok(Self::Staff),
            "admin" => Ok(Self::Admin),
            other => Err(CoreError::UnknownVariant {
                kind: "role",
                value: other.to_string(),
            }),
        }
    }
}

impl fmt::Display for Role {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Optional profile fields supplied at registration.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct UserProfile {
    /// Preferred language tag, e.g. "en" or "ar".
    pub language: Option<String>,
    /// Whether the user asked for their identity to be hidden from staff.
    pub is_anonymous: bool,
}

/// A registered user.
///
/// Users are never deleted, only deactivated. The credential hash is not
/// part of this type; it lives with the credential store.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct User {
    pub id: UserId,
    pub username: String,
    pub role: Role,
    pub profile: UserProfile,
    pub active: bool,
    pub created_at: Timestamp,
}

impl User {
    /// Create a new active user.
    pub fn new(username: String, role: Role, profile: UserProfile, now: Timestamp) -> Self {
        Self {
            id: UserId::new(),
            username,
            role,
            profile,
            active: true,
            created_at: now,
        }
    }
}
