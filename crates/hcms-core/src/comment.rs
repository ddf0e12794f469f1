//! Comments: an append-only discussion attached to a complaint.

use serde::{Deserialize, Serialize};
use std::cmp::Ordering;

use crate::error::Result;
use crate::types::{CommentId, ComplaintId, Timestamp, UserId};
use crate::validation::validate_text;

/// A single immutable comment.
///
/// `seq` is assigned by the store when the comment is appended. It is
/// strictly increasing per complaint and breaks ties between comments that
/// share a `created_at`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Comment {
    pub id: CommentId,
    pub complaint_id: ComplaintId,
    pub author_id: UserId,
    pub text: String,
    pub created_at: Timestamp,
    pub seq: u64,
}

impl Comment {
    /// Build an unsequenced comment (`seq == 0`) after validating the text.
    pub fn draft(
        complaint_id: ComplaintId,
        author_id: UserId,
        text: &str,
        now: Timestamp,
        max_len: usize,
    ) -> Result<Self> {
        let text = validate_text("comment", text, max_len)?;
        Ok(Self {
            id: CommentId::new(),
            complaint_id,
            author_id,
            text,
            created_at: now,
            seq: 0,
        })
    }

    /// Total order within a thread: oldest first, then by append order.
    pub fn thread_order(&self, other: &Self) -> Ordering {
        self.created_at
            .cmp(&other.created_at)
            .then(self.seq.cmp(&other.seq))
    }
}

/// Sort comments into thread order in place.
pub fn sort_thread(comments: &mut [Comment]) {
    comments.sort_by(Comment::thread_order);
}
