//! The complaint registry: sole owner of complaint records.
//!
//! Every status change goes through [`ComplaintRegistry::transition`], which
//! checks the caller's version, applies the transition table and persists
//! with a compare-and-swap. No caller-facing authorization happens here;
//! that is the service's job.

use std::sync::Arc;

use hcms_core::{Clock, Complaint, ComplaintId, ComplaintStatus, NewComplaint, UserId};
use hcms_store::{ComplaintFilter, ComplaintStore, SaveResult};

use crate::error::{HcmsError, Result};

pub struct ComplaintRegistry<S: ComplaintStore> {
    store: Arc<S>,
    clock: Arc<dyn Clock>,
    max_description_len: usize,
}

impl<S: ComplaintStore> ComplaintRegistry<S> {
    pub fn new(store: Arc<S>, clock: Arc<dyn Clock>, max_description_len: usize) -> Self {
        Self {
            store,
            clock,
            max_description_len,
        }
    }

    /// Open a new complaint in `Pending`.
    pub async fn create(&self, owner_id: UserId, new: NewComplaint) -> Result<Complaint> {
        let complaint = Complaint::open(
            owner_id,
            new,
            self.clock.now_millis(),
            self.max_description_len,
        )?;

        match self.store.save_complaint(&complaint, None).await? {
            SaveResult::Saved => {
                tracing::info!(
                    complaint_id = %complaint.id(),
                    owner_id = %owner_id,
                    hospital_id = complaint.hospital_id(),
                    "complaint created"
                );
                Ok(complaint)
            }
            other => Err(HcmsError::Internal(format!(
                "fresh complaint {} not stored: {other:?}",
                complaint.id()
            ))),
        }
    }

    /// Look a complaint up without failing on absence.
    pub async fn find(&self, id: &ComplaintId) -> Result<Option<Complaint>> {
        tracing::debug!(complaint_id = %id, "loading complaint");
        Ok(self.store.load_complaint(id).await?)
    }

    pub async fn get(&self, id: &ComplaintId) -> Result<Complaint> {
        self.find(id)
            .await?
            .ok_or_else(|| HcmsError::NotFound(format!("complaint {id}")))
    }

    /// Complaints filed by `owner_id`, newest first.
    pub async fn list_by_owner(&self, owner_id: UserId) -> Result<Vec<Complaint>> {
        tracing::debug!(owner_id = %owner_id, "listing complaints by owner");
        Ok(self
            .store
            .list_complaints(&ComplaintFilter::owned_by(owner_id))
            .await?)
    }

    /// Every complaint, optionally only those in `status`, newest first.
    pub async fn list_all(&self, status: Option<ComplaintStatus>) -> Result<Vec<Complaint>> {
        tracing::debug!(status = ?status, "listing all complaints");
        Ok(self
            .store
            .list_complaints(&ComplaintFilter::all().with_status(status))
            .await?)
    }

    /// Move a complaint to `to`, provided it is still at `expected_version`.
    ///
    /// A stale version is reported as [`HcmsError::ConcurrentModification`]
    /// before the transition table is consulted.
    pub async fn transition(
        &self,
        id: &ComplaintId,
        expected_version: u64,
        to: ComplaintStatus,
    ) -> Result<Complaint> {
        let current = self.get(id).await?;
        if current.version() != expected_version {
            return Err(self.conflict(id, expected_version, current.version()));
        }

        let next = current.transition(to, self.clock.now_millis())?;

        match self.store.save_complaint(&next, Some(expected_version)).await? {
            SaveResult::Saved => {
                tracing::info!(
                    complaint_id = %id,
                    from = ?current.status(),
                    to = ?to,
                    version = next.version(),
                    "complaint status changed"
                );
                Ok(next)
            }
            SaveResult::VersionConflict {
                actual: Some(actual),
            } => Err(self.conflict(id, expected_version, actual)),
            SaveResult::VersionConflict { actual: None } => {
                Err(HcmsError::NotFound(format!("complaint {id}")))
            }
            SaveResult::AlreadyExists => Err(HcmsError::Internal(format!(
                "update of complaint {id} reported as insert"
            ))),
        }
    }

    /// Delete a complaint and its comment thread.
    pub async fn delete(&self, id: &ComplaintId) -> Result<()> {
        if !self.store.delete_complaint(id).await? {
            return Err(HcmsError::NotFound(format!("complaint {id}")));
        }
        tracing::info!(complaint_id = %id, "complaint deleted");
        Ok(())
    }

    fn conflict(&self, id: &ComplaintId, expected: u64, actual: u64) -> HcmsError {
        tracing::warn!(complaint_id = %id, expected, actual, "concurrent modification");
        HcmsError::ConcurrentModification { expected, actual }
    }
}
