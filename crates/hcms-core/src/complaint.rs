//! Complaint: a citizen's grievance and its review lifecycle.
//!
//! Status changes only ever happen through [`Complaint::transition`], which
//! consults the transition table in [`ComplaintStatus::can_transition_to`].
//! Fields are private so no caller can assign a status directly.

use serde::{Deserialize, Serialize};
use std::fmt;

use crate::error::{CoreError, Result};
use crate::types::{ComplaintId, Timestamp, UserId};
use crate::validation::{validate_optional_text, validate_text};

/// Review status of a complaint.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[repr(u8)]
pub enum ComplaintStatus {
    /// Initial state, set at creation.
    Pending = 0,
    /// Picked up by staff.
    InReview = 1,
    /// Resolved. Reopenable.
    Solved = 2,
    /// Closed without resolution. Reopenable.
    Unsolved = 3,
}

impl ComplaintStatus {
    /// Every status, in lifecycle order.
    pub const ALL: [ComplaintStatus; 4] = [
        ComplaintStatus::Pending,
        ComplaintStatus::InReview,
        ComplaintStatus::Solved,
        ComplaintStatus::Unsolved,
    ];

    /// Convert to u8 for storage.
    pub fn to_u8(self) -> u8 {
        self as u8
    }

    /// Try to parse from u8.
    pub fn from_u8(value: u8) -> Option<Self> {
        match value {
            0 => Some(Self::Pending),
            1 => Some(Self::InReview),
            2 => Some(Self::Solved),
            3 => Some(Self::Unsolved),
            _ => None,
        }
    }

    /// The transition table. Anything not listed here is rejected.
    pub fn can_transition_to(self, to: ComplaintStatus) -> bool {
        use ComplaintStatus::*;
        matches!(
            (self, to),
            (Pending, InReview)
                | (InReview, Solved)
                | (InReview, Unsolved)
                | (Solved, InReview)
                | (Unsolved, InReview)
        )
    }

    /// Statuses reachable from this one.
    pub fn successors(self) -> Vec<ComplaintStatus> {
        Self::ALL
            .into_iter()
            .filter(|to| self.can_transition_to(*to))
            .collect()
    }

    /// Solved and Unsolved end a review cycle (both may be reopened).
    pub fn is_closed(self) -> bool {
        matches!(self, ComplaintStatus::Solved | ComplaintStatus::Unsolved)
    }
}

impl fmt::Display for ComplaintStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            ComplaintStatus::Pending => "pending",
            ComplaintStatus::InReview => "in_review",
            ComplaintStatus::Solved => "solved",
            ComplaintStatus::Unsolved => "unsolved",
        };
        f.write_str(name)
    }
}

/// What kind of feedback the citizen is filing.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ComplaintCategory {
    #[default]
    Complaint,
    Request,
    Suggestion,
}

impl ComplaintCategory {
    /// Stable storage name.
    pub fn as_str(self) -> &'static str {
        match self {
            ComplaintCategory::Complaint => "complaint",
            ComplaintCategory::Request => "request",
            ComplaintCategory::Suggestion => "suggestion",
        }
    }

    /// Parse a storage name.
    pub fn parse(value: &str) -> Result<Self> {
        match value {
            "complaint" => Ok(Self::Complaint),
            "request" => Ok(Self::Request),
            "suggestion" => Ok(Self::Suggestion),
            other => Err(CoreError::UnknownVariant {
                kind: "complaint category",
                value: other.to_string(),
            }),
        }
    }
}

/// Caller-supplied fields for a new complaint.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct NewComplaint {
    pub hospital_id: u64,
    pub category: ComplaintCategory,
    pub department: Option<String>,
    pub description: String,
    pub attachment_url: Option<String>,
}

impl NewComplaint {
    /// A plain complaint against a hospital with just a description.
    pub fn new(hospital_id: u64, description: impl Into<String>) -> Self {
        Self {
            hospital_id,
            category: ComplaintCategory::Complaint,
            department: None,
            description: description.into(),
            attachment_url: None,
        }
    }

    pub fn category(mut self, category: ComplaintCategory) -> Self {
        self.category = category;
        self
    }

    pub fn department(mut self, department: impl Into<String>) -> Self {
        self.department = Some(department.into());
        self
    }

    pub fn attachment_url(mut self, url: impl Into<String>) -> Self {
        self.attachment_url = Some(url.into());
        self
    }
}

/// A complaint record.
///
/// ## Invariants
/// - exactly one owner, fixed at creation
/// - `updated_at >= created_at`
/// - `version` starts at 1 and grows by exactly 1 per accepted mutation
/// - `resolved_at` is set iff `status == Solved`
///
/// Deserializing goes through [`ComplaintParts`], so a serialized record is
/// re-checked the same way a stored row is.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(try_from = "ComplaintParts")]
pub struct Complaint {
    id: ComplaintId,
    owner_id: UserId,
    hospital_id: u64,
    category: ComplaintCategory,
    department: Option<String>,
    description: String,
    attachment_url: Option<String>,
    status: ComplaintStatus,
    created_at: Timestamp,
    updated_at: Timestamp,
    resolved_at: Option<Timestamp>,
    version: u64,
}

impl Complaint {
    /// Open a new complaint in `Pending` at version 1.
    ///
    /// `max_description_len` bounds the description in characters.
    pub fn open(
        owner_id: UserId,
        new: NewComplaint,
        now: Timestamp,
        max_description_len: usize,
    ) -> Result<Self> {
        let description = validate_text("description", &new.description, max_description_len)?;
        let department = validate_optional_text("department", new.department.as_deref(), 200)?;
        let attachment_url =
            validate_optional_text("attachment_url", new.attachment_url.as_deref(), 2048)?;

        Ok(Self {
            id: ComplaintId::new(),
            owner_id,
            hospital_id: new.hospital_id,
            category: new.category,
            department,
            description,
            attachment_url,
            status: ComplaintStatus::Pending,
            created_at: now,
            updated_at: now,
            resolved_at: None,
            version: 1,
        })
    }

    /// Apply a status change, producing the next version of this record.
    ///
    /// `self` is left untouched; the caller persists the returned value with
    /// `self.version()` as the expected version.
    pub fn transition(&self, to: ComplaintStatus, now: Timestamp) -> Result<Self> {
        if !self.status.can_transition_to(to) {
            return Err(CoreError::InvalidTransition {
                from: self.status,
                to,
            });
        }

        let updated_at = now.max(self.updated_at);
        let mut next = self.clone();
        next.status = to;
        next.updated_at = updated_at;
        next.resolved_at = (to == ComplaintStatus::Solved).then_some(updated_at);
        next.version = self.version + 1;
        Ok(next)
    }

    pub fn id(&self) -> ComplaintId {
        self.id
    }

    pub fn owner_id(&self) -> UserId {
        self.owner_id
    }

    /// Whether `user` created this complaint.
    pub fn is_owned_by(&self, user: UserId) -> bool {
        self.owner_id == user
    }

    pub fn hospital_id(&self) -> u64 {
        self.hospital_id
    }

    pub fn category(&self) -> ComplaintCategory {
        self.category
    }

    pub fn department(&self) -> Option<&str> {
        self.department.as_deref()
    }

    pub fn description(&self) -> &str {
        &self.description
    }

    pub fn attachment_url(&self) -> Option<&str> {
        self.attachment_url.as_deref()
    }

    pub fn status(&self) -> ComplaintStatus {
        self.status
    }

    pub fn created_at(&self) -> Timestamp {
        self.created_at
    }

    pub fn updated_at(&self) -> Timestamp {
        self.updated_at
    }

    pub fn resolved_at(&self) -> Option<Timestamp> {
        self.resolved_at
    }

    pub fn version(&self) -> u64 {
        self.version
    }
}

/// Raw column values used by storage backends to rebuild a record.
///
/// Rehydration goes through [`ComplaintParts::into_complaint`], which
/// re-checks the record invariants instead of trusting storage blindly.
#[derive(Debug, Clone, Deserialize)]
pub struct ComplaintParts {
    pub id: ComplaintId,
    pub owner_id: UserId,
    pub hospital_id: u64,
    pub category: ComplaintCategory,
    pub department: Option<String>,
    pub description: String,
    pub attachment_url: Option<String>,
    pub status: ComplaintStatus,
    pub created_at: Timestamp,
    pub updated_at: Timestamp,
    pub resolved_at: Option<Timestamp>,
    pub version: u64,
}

impl ComplaintParts {
    pub fn into_complaint(self) -> Result<Complaint> {
        if self.version == 0 {
            return Err(CoreError::InvalidInput("version must be at least 1".into()));
        }
        if self.updated_at < self.created_at {
            return Err(CoreError::InvalidInput(
                "updated_at precedes created_at".into(),
            ));
        }
        if self.resolved_at.is_some() != (self.status == ComplaintStatus::Solved) {
            return Err(CoreError::InvalidInput(format!(
                "resolved_at does not match status {}",
                self.status
            )));
        }
        Ok(Complaint {
            id: self.id,
            owner_id: self.owner_id,
            hospital_id: self.hospital_id,
            category: self.category,
            department: self.department,
            description: self.description,
            attachment_url: self.attachment_url,
            status: self.status,
            created_at: self.created_at,
            updated_at: self.updated_at,
            resolved_at: self.resolved_at,
            version: self.version,
        })
    }
}

impl TryFrom<ComplaintParts> for Complaint {
    type Error = CoreError;

    fn try_from(parts: ComplaintParts) -> Result<Self> {
        parts.into_complaint()
    }
}

impl From<&Complaint> for ComplaintParts {
    fn from(c: &Complaint) -> Self {
        Self {
            id: c.id,
            owner_id: c.owner_id,
            hospital_id: c.hospital_id,
            category: c.category,
            department: c.department.clone(),
            description: c.description.clone(),
            attachment_url: c.attachment_url.clone(),
            status: c.status,
            created_at: c.created_at,
            updated_at: c.updated_at,
            resolved_at: c.resolved_at,
            version: c.version,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;
    use ComplaintStatus::*;

    fn open(now: Timestamp) -> Complaint {
        Complaint::open(UserId::new(), NewComplaint::new(7, "leaking pipe"), now, 4000).unwrap()
    }

    #[test]
    fn test_open_starts_pending_at_version_one() {
        let c = open(1_000);
        assert_eq!(c.status(), Pending);
        assert_eq!(c.version(), 1);
        assert_eq!(c.created_at(), 1_000);
        assert_eq!(c.updated_at(), 1_000);
        assert_eq!(c.resolved_at(), None);
    }

    #[test]
    fn test_open_rejects_blank_description() {
        let err = Complaint::open(UserId::new(), NewComplaint::new(1, "   "), 0, 4000).unwrap_err();
        assert!(matches!(err, CoreError::InvalidInput(_)));
    }

    #[test]
    fn test_open_trims_description() {
        let c = Complaint::open(UserId::new(), NewComplaint::new(1, "  cold food \n"), 0, 4000)
            .unwrap();
        assert_eq!(c.description(), "cold food");
    }

    #[test]
    fn test_transition_table() {
        let allowed = [
            (Pending, InReview),
            (InReview, Solved),
            (InReview, Unsolved),
            (Solved, InReview),
            (Unsolved, InReview),
        ];
        for from in ComplaintStatus::ALL {
            for to in ComplaintStatus::ALL {
                assert_eq!(
                    from.can_transition_to(to),
                    allowed.contains(&(from, to)),
                    "{from} -> {to}"
                );
            }
        }
    }

    #[test]
    fn test_transition_bumps_version_and_time() {
        let c = open(1_000);
        let next = c.transition(InReview, 2_000).unwrap();
        assert_eq!(next.status(), InReview);
        assert_eq!(next.version(), 2);
        assert_eq!(next.updated_at(), 2_000);
        assert_eq!(next.created_at(), 1_000);

        // input record unchanged
        assert_eq!(c.status(), Pending);
        assert_eq!(c.version(), 1);
    }

    #[test]
    fn test_transition_never_moves_time_backwards() {
        let c = open(5_000);
        let next = c.transition(InReview, 4_000).unwrap();
        assert_eq!(next.updated_at(), 5_000);
    }

    #[test]
    fn test_invalid_transition_names_both_states() {
        let c = open(0);
        let err = c.transition(Solved, 1).unwrap_err();
        assert_eq!(
            err,
            CoreError::InvalidTransition {
                from: Pending,
                to: Solved
            }
        );
        assert_eq!(err.to_string(), "invalid transition from pending to solved");
    }

    #[test]
    fn test_resolved_at_follows_solved() {
        let c = open(0).transition(InReview, 10).unwrap();
        let solved = c.transition(Solved, 20).unwrap();
        assert_eq!(solved.resolved_at(), Some(20));

        let reopened = solved.transition(InReview, 30).unwrap();
        assert_eq!(reopened.resolved_at(), None);

        let unsolved = reopened.transition(Unsolved, 40).unwrap();
        assert_eq!(unsolved.resolved_at(), None);
    }

    #[test]
    fn test_successors_and_closed_states() {
        assert_eq!(Pending.successors(), vec![InReview]);
        assert_eq!(InReview.successors(), vec![Solved, Unsolved]);
        assert_eq!(Solved.successors(), vec![InReview]);
        assert_eq!(Unsolved.successors(), vec![InReview]);

        let closed: Vec<_> = ComplaintStatus::ALL
            .into_iter()
            .filter(|s| s.is_closed())
            .collect();
        assert_eq!(closed, vec![Solved, Unsolved]);
        // closed states can still be reopened
        assert!(closed.iter().all(|s| s.can_transition_to(InReview)));
    }

    #[test]
    fn test_category_defaults_to_complaint() {
        assert_eq!(ComplaintCategory::default(), ComplaintCategory::Complaint);
        assert_eq!(NewComplaint::new(1, "x").category, ComplaintCategory::Complaint);
    }

    #[test]
    fn test_status_u8_roundtrip() {
        for status in ComplaintStatus::ALL {
            assert_eq!(ComplaintStatus::from_u8(status.to_u8()), Some(status));
        }
        assert_eq!(ComplaintStatus::from_u8(9), None);
    }

    #[test]
    fn test_parts_reject_inconsistent_timestamps() {
        let mut parts = ComplaintParts::from(&open(100));
        parts.updated_at = 50;
        assert!(parts.into_complaint().is_err());
    }

    #[test]
    fn test_parts_reject_resolved_at_without_solved() {
        let mut parts = ComplaintParts::from(&open(100));
        parts.resolved_at = Some(100);
        assert!(parts.into_complaint().is_err());

        let solved = open(0)
            .transition(InReview, 1)
            .unwrap()
            .transition(Solved, 2)
            .unwrap();
        let mut parts = ComplaintParts::from(&solved);
        parts.resolved_at = None;
        assert!(parts.into_complaint().is_err());
    }

    #[test]
    fn test_json_roundtrip_keeps_record() {
        let c = open(100).transition(InReview, 200).unwrap();
        let json = serde_json::to_string(&c).unwrap();
        assert_eq!(serde_json::from_str::<Complaint>(&json).unwrap(), c);
    }

    #[test]
    fn test_json_with_broken_invariants_is_rejected() {
        let c = open(100);
        let mut value = serde_json::to_value(&c).unwrap();
        value["version"] = serde_json::json!(0);
        let err = serde_json::from_value::<Complaint>(value).unwrap_err();
        assert!(err.to_string().contains("version must be at least 1"));

        let mut value = serde_json::to_value(&c).unwrap();
        value["updated_at"] = serde_json::json!(50);
        assert!(serde_json::from_value::<Complaint>(value).is_err());
    }

    fn status() -> impl Strategy<Value = ComplaintStatus> {
        prop::sample::select(ComplaintStatus::ALL.to_vec())
    }

    proptest! {
        #[test]
        fn test_random_walk_respects_table(
            steps in prop::collection::vec((status(), 0i64..10_000), 0..40)
        ) {
            let mut current = open(0);
            for (to, now) in steps {
                match current.transition(to, now) {
                    Ok(next) => {
                        prop_assert!(current.status().can_transition_to(to));
                        prop_assert_eq!(next.version(), current.version() + 1);
                        prop_assert!(next.updated_at() >= current.updated_at());
                        prop_assert!(next.updated_at() >= next.created_at());
                        current = next;
                    }
                    Err(CoreError::InvalidTransition { from, to: rejected }) => {
                        prop_assert_eq!(from, current.status());
                        prop_assert_eq!(rejected, to);
                        prop_assert!(!current.status().can_transition_to(to));
                    }
                    Err(other) => prop_assert!(false, "unexpected error {other}"),
                }
            }
        }
    }
}
