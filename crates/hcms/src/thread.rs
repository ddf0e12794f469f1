//! Comment threads attached to complaints.

use std::sync::Arc;

use hcms_core::{Clock, Comment, ComplaintId, UserId};
use hcms_store::{AppendResult, ComplaintStore};

use crate::error::{HcmsError, Result};

/// Append-only comment threads.
///
/// Comments are never edited. The store assigns each a per-thread sequence
/// number so comments sharing a timestamp still have a total order.
pub struct CommentThread<S: ComplaintStore> {
    store: Arc<S>,
    clock: Arc<dyn Clock>,
    max_comment_len: usize,
}

impl<S: ComplaintStore> CommentThread<S> {
    pub fn new(store: Arc<S>, clock: Arc<dyn Clock>, max_comment_len: usize) -> Self {
        Self {
            store,
            clock,
            max_comment_len,
        }
    }

    pub async fn add(
        &self,
        complaint_id: &ComplaintId,
        author_id: UserId,
        text: &str,
    ) -> Result<Comment> {
        let draft = Comment::draft(
            *complaint_id,
            author_id,
            text,
            self.clock.now_millis(),
            self.max_comment_len,
        )?;

        match self.store.append_comment(&draft).await? {
            AppendResult::Appended(comment) => {
                tracing::info!(
                    complaint_id = %complaint_id,
                    comment_id = %comment.id,
                    seq = comment.seq,
                    "comment added"
                );
                Ok(comment)
            }
            AppendResult::ComplaintMissing => {
                Err(HcmsError::NotFound(format!("complaint {complaint_id}")))
            }
        }
    }

    /// The thread for a complaint, oldest first.
    pub async fn list_for(&self, complaint_id: &ComplaintId) -> Result<Vec<Comment>> {
        tracing::debug!(complaint_id = %complaint_id, "listing comments");
        if self.store.load_complaint(complaint_id).await?.is_none() {
            return Err(HcmsError::NotFound(format!("complaint {complaint_id}")));
        }
        Ok(self.store.load_comments_for(complaint_id).await?)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use hcms_core::{Complaint, ManualClock, NewComplaint};
    use hcms_store::MemoryStore;

    async fn setup() -> (CommentThread<MemoryStore>, Complaint) {
        let store = Arc::new(MemoryStore::new());
        let clock = Arc::new(ManualClock::new(500));
        let complaint =
            Complaint::open(UserId::new(), NewComplaint::new(1, "long wait"), 0, 100).unwrap();
        store.save_complaint(&complaint, None).await.unwrap();
        (CommentThread::new(store, clock, 20), complaint)
    }

    #[tokio::test]
    async fn test_same_timestamp_keeps_append_order() {
        let (thread, complaint) = setup().await;
        let author = complaint.owner_id();

        for text in ["a", "b", "c", "d"] {
            thread.add(&complaint.id(), author, text).await.unwrap();
        }

        let texts: Vec<_> = thread
            .list_for(&complaint.id())
            .await
            .unwrap()
            .into_iter()
            .map(|c| c.text)
            .collect();
        assert_eq!(texts, vec!["a", "b", "c", "d"]);
    }

    #[tokio::test]
    async fn test_add_validates_text() {
        let (thread, complaint) = setup().await;
        let author = complaint.owner_id();

        assert!(matches!(
            thread.add(&complaint.id(), author, "  ").await,
            Err(HcmsError::InvalidInput(_))
        ));
        assert!(matches!(
            thread
                .add(&complaint.id(), author, "this comment is far too long")
                .await,
            Err(HcmsError::InvalidInput(_))
        ));
    }

    #[tokio::test]
    async fn test_missing_complaint_is_not_found() {
        let (thread, _) = setup().await;
        let missing = ComplaintId::new();

        assert!(matches!(
            thread.add(&missing, UserId::new(), "hello").await,
            Err(HcmsError::NotFound(_))
        ));
        assert!(matches!(
            thread.list_for(&missing).await,
            Err(HcmsError::NotFound(_))
        ));
    }
}
