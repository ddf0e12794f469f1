//! Store traits: the abstract interface for HCMS persistence.
//!
//! These traits allow the registry and comment thread to be
//! storage-agnostic. Implementations include SQLite (primary) and in-memory
//! (for tests).

use std::cmp::Ordering;

use async_trait::async_trait;
use hcms_core::{Comment, Complaint, ComplaintId, ComplaintStatus, Role, User, UserId};

use crate::error::Result;

/// Result of saving a complaint.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SaveResult {
    /// The record was written.
    Saved,
    /// Insert requested but a complaint with this ID already exists.
    AlreadyExists,
    /// Update requested but the stored version differs from the expected one.
    VersionConflict {
        /// The version currently stored, or `None` if the record is gone.
        actual: Option<u64>,
    },
}

/// Result of appending a comment.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum AppendResult {
    /// Comment stored; carries the store-assigned sequence number.
    Appended(Comment),
    /// The referenced complaint does not exist.
    ComplaintMissing,
}

/// Result of inserting a user.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum InsertUserResult {
    Inserted,
    DuplicateUsername,
}

/// Which complaints to list.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct ComplaintFilter {
    /// Only complaints owned by this user.
    pub owner: Option<UserId>,
    /// Only complaints currently in this status.
    pub status: Option<ComplaintStatus>,
}

impl ComplaintFilter {
    pub fn all() -> Self {
        Self::default()
    }

    pub fn owned_by(owner: UserId) -> Self {
        Self {
            owner: Some(owner),
            status: None,
        }
    }

    pub fn with_status(mut self, status: Option<ComplaintStatus>) -> Self {
        self.status = status;
        self
    }

    pub fn matches(&self, complaint: &Complaint) -> bool {
        self.owner.map_or(true, |o| complaint.owner_id() == o)
            && self.status.map_or(true, |s| complaint.status() == s)
    }
}

/// Listing order: newest first, ID as tie-breaker so output is deterministic.
pub fn newest_first(a: &Complaint, b: &Complaint) -> Ordering {
    b.created_at()
        .cmp(&a.created_at())
        .then_with(|| b.id().cmp(&a.id()))
}

/// Persistence for complaints and their comment threads.
///
/// # Design Notes
///
/// - **Compare-and-swap saves**: `save_complaint` with `Some(expected)` writes
///   only if the stored version still equals `expected`. The check and the
///   write happen under one lock / transaction.
/// - **Sequenced comments**: `append_comment` assigns the next per-thread
///   sequence number, starting at 1.
/// - **Cascading delete**: deleting a complaint removes its comments in the
///   same operation.
#[async_trait]
pub trait ComplaintStore: Send + Sync {
    /// Load a complaint by ID.
    async fn load_complaint(&self, id: &ComplaintId) -> Result<Option<Complaint>>;

    /// Insert (`expected_version == None`) or conditionally update a complaint.
    async fn save_complaint(
        &self,
        complaint: &Complaint,
        expected_version: Option<u64>,
    ) -> Result<SaveResult>;

    /// List complaints matching `filter`, ordered by [`newest_first`].
    async fn list_complaints(&self, filter: &ComplaintFilter) -> Result<Vec<Complaint>>;

    /// Delete a complaint and its comments. Returns whether it existed.
    async fn delete_complaint(&self, id: &ComplaintId) -> Result<bool>;

    /// All comments for a complaint, oldest first.
    async fn load_comments_for(&self, complaint_id: &ComplaintId) -> Result<Vec<Comment>>;

    /// Append a comment, assigning its sequence number.
    async fn append_comment(&self, comment: &Comment) -> Result<AppendResult>;
}

/// Persistence for user accounts and their credential hashes.
#[async_trait]
pub trait UserStore: Send + Sync {
    /// Insert a new user with the given credential hash.
    async fn insert_user(&self, user: &User, credential_hash: &str) -> Result<InsertUserResult>;

    /// Load a user by ID.
    async fn get_user(&self, id: &UserId) -> Result<Option<User>>;

    /// Load a user and credential hash by username.
    async fn find_credentials(&self, username: &str) -> Result<Option<(User, String)>>;

    /// Set one user's role without touching any other column. Returns the
    /// user as stored after the write, or `None` if unknown.
    async fn set_role(&self, id: &UserId, role: Role) -> Result<Option<User>>;

    /// Set one user's active flag without touching any other column.
    async fn set_active(&self, id: &UserId, active: bool) -> Result<Option<User>>;
}
