//! Counts of complaints by status.

use std::sync::Arc;

use hcms_core::{Complaint, StatsScope, StatusCounts};
use hcms_store::{ComplaintFilter, ComplaintStore};

use crate::error::Result;

/// Read-side fold over the registry's current records.
///
/// Nothing is cached: every call reads the authoritative record set, so a
/// transition is visible to the very next `compute`.
pub struct StatisticsAggregator<S: ComplaintStore> {
    store: Arc<S>,
}

impl<S: ComplaintStore> StatisticsAggregator<S> {
    pub fn new(store: Arc<S>) -> Self {
        Self { store }
    }

    pub async fn compute(&self, scope: StatsScope) -> Result<StatusCounts> {
        let filter = match scope {
            StatsScope::All => ComplaintFilter::all(),
            StatsScope::Owner(owner) => ComplaintFilter::owned_by(owner),
        };
        let complaints = self.store.list_complaints(&filter).await?;
        let counts = StatusCounts::tally(complaints.iter().map(Complaint::status));
        tracing::debug!(?scope, total = counts.total(), "computed statistics");
        Ok(counts)
    }
}
