//! In-memory implementation of the store traits.
//!
//! This is primarily for testing. It has the same semantics as SQLite
//! but keeps everything in memory with no persistence.

use std::collections::HashMap;
use std::sync::{RwLock, RwLockReadGuard, RwLockWriteGuard};

use async_trait::async_trait;

use hcms_core::{sort_thread, Comment, Complaint, ComplaintId, Role, User, UserId};

use crate::error::{Result, StoreError};
use crate::traits::{
    newest_first, AppendResult, ComplaintFilter, ComplaintStore, InsertUserResult, SaveResult,
    UserStore,
};

/// In-memory store implementation.
///
/// All data is lost when the store is dropped. Thread-safe via RwLock; every
/// compare-and-swap runs under the write lock.
pub struct MemoryStore {
    inner: RwLock<MemoryStoreInner>,
}

#[derive(Default)]
struct MemoryStoreInner {
    /// Complaints indexed by ID.
    complaints: HashMap<ComplaintId, Complaint>,

    /// Comment threads in append order.
    comments: HashMap<ComplaintId, Vec<Comment>>,

    /// Users with their credential hashes.
    users: HashMap<UserId, StoredUser>,

    /// Username index.
    usernames: HashMap<String, UserId>,
}

struct StoredUser {
    user: User,
    credential_hash: String,
}

impl MemoryStore {
    /// Create a new empty in-memory store.
    pub fn new() -> Self {
        Self {
            inner: RwLock::new(MemoryStoreInner::default()),
        }
    }

    fn read(&self) -> Result<RwLockReadGuard<'_, MemoryStoreInner>> {
        self.inner.read().map_err(|_| StoreError::LockPoisoned)
    }

    fn write(&self) -> Result<RwLockWriteGuard<'_, MemoryStoreInner>> {
        self.inner.write().map_err(|_| StoreError::LockPoisoned)
    }
}

impl Default for MemoryStore {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl ComplaintStore for MemoryStore {
    async fn load_complaint(&self, id: &ComplaintId) -> Result<Option<Complaint>> {
        Ok(self.read()?.complaints.get(id).cloned())
    }

    async fn save_complaint(
        &self,
        complaint: &Complaint,
        expected_version: Option<u64>,
    ) -> Result<SaveResult> {
        let mut inner = self.write()?;
        let stored = inner.complaints.get(&complaint.id()).map(Complaint::version);

        match (expected_version, stored) {
            (None, Some(_)) => Ok(SaveResult::AlreadyExists),
            (None, None) => {
                inner.complaints.insert(complaint.id(), complaint.clone());
                Ok(SaveResult::Saved)
            }
            (Some(expected), Some(actual)) if expected == actual => {
                inner.complaints.insert(complaint.id(), complaint.clone());
                Ok(SaveResult::Saved)
            }
            (Some(_), actual) => Ok(SaveResult::VersionConflict { actual }),
        }
    }

    async fn list_complaints(&self, filter: &ComplaintFilter) -> Result<Vec<Complaint>> {
        let inner = self.read()?;
        let mut complaints: Vec<Complaint> = inner
            .complaints
            .values()
            .filter(|c| filter.matches(c))
            .cloned()
            .collect();
        complaints.sort_by(newest_first);
        Ok(complaints)
    }

    async fn delete_complaint(&self, id: &ComplaintId) -> Result<bool> {
        let mut inner = self.write()?;
        inner.comments.remove(id);
        Ok(inner.complaints.remove(id).is_some())
    }

    async fn load_comments_for(&self, complaint_id: &ComplaintId) -> Result<Vec<Comment>> {
        let mut comments = self
            .read()?
            .comments
            .get(complaint_id)
            .cloned()
            .unwrap_or_default();
        sort_thread(&mut comments);
        Ok(comments)
    }

    async fn append_comment(&self, comment: &Comment) -> Result<AppendResult> {
        let mut inner = self.write()?;
        if !inner.complaints.contains_key(&comment.complaint_id) {
            return Ok(AppendResult::ComplaintMissing);
        }

        let thread = inner.comments.entry(comment.complaint_id).or_default();
        let mut stored = comment.clone();
        stored.seq = thread.last().map_or(0, |c| c.seq) + 1;
        thread.push(stored.clone());

        Ok(AppendResult::Appended(stored))
    }
}

#[async_trait]
impl UserStore for MemoryStore {
    async fn insert_user(&self, user: &User, credential_hash: &str) -> Result<InsertUserResult> {
        let mut inner = self.write()?;
        if inner.usernames.contains_key(&user.username) || inner.users.contains_key(&user.id) {
            return Ok(InsertUserResult::DuplicateUsername);
        }

        inner.usernames.insert(user.username.clone(), user.id);
        inner.users.insert(
            user.id,
            StoredUser {
                user: user.clone(),
                credential_hash: credential_hash.to_string(),
            },
        );
        Ok(InsertUserResult::Inserted)
    }

    async fn get_user(&self, id: &UserId) -> Result<Option<User>> {
        Ok(self.read()?.users.get(id).map(|s| s.user.clone()))
    }

    async fn find_credentials(&self, username: &str) -> Result<Option<(User, String)>> {
        let inner = self.read()?;
        Ok(inner
            .usernames
            .get(username)
            .and_then(|id| inner.users.get(id))
            .map(|s| (s.user.clone(), s.credential_hash.clone())))
    }

    async fn set_role(&self, id: &UserId, role: Role) -> Result<Option<User>> {
        let mut inner = self.write()?;
        Ok(inner.users.get_mut(id).map(|stored| {
            stored.user.role = role;
            stored.user.clone()
        }))
    }

    async fn set_active(&self, id: &UserId, active: bool) -> Result<Option<User>> {
        let mut inner = self.write()?;
        Ok(inner.users.get_mut(id).map(|stored| {
            stored.user.active = active;
            stored.user.clone()
        }))
    }
}
