//! Counts of complaints by status.

use serde::{Deserialize, Serialize};

use crate::complaint::ComplaintStatus;
use crate::error::{CoreError, Result};
use crate::types::UserId;

/// Which complaints a statistics query covers.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum StatsScope {
    /// Every complaint in the registry.
    All,
    /// Only complaints owned by the given user.
    Owner(UserId),
}

/// Per-status tallies.
///
/// ## Invariant
/// `pending + in_review + solved + unsolved == total`. Values built through
/// [`StatusCounts::record`] or [`StatusCounts::tally`] hold it by
/// construction; [`StatusCounts::new`] checks it.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct StatusCounts {
    total: u64,
    pending: u64,
    in_review: u64,
    solved: u64,
    unsolved: u64,
}

impl StatusCounts {
    /// Build from explicit values, rejecting counts that don't add up.
    pub fn new(total: u64, pending: u64, in_review: u64, solved: u64, unsolved: u64) -> Result<Self> {
        let counts = Self {
            total,
            pending,
            in_review,
            solved,
            unsolved,
        };
        match counts.sum_of_statuses() {
            Some(sum) if sum == total => Ok(counts),
            sum => Err(CoreError::CountMismatch {
                sum: sum.unwrap_or(u64::MAX),
                total,
            }),
        }
    }

    /// Fold a sequence of statuses.
    pub fn tally(statuses: impl IntoIterator<Item = ComplaintStatus>) -> Self {
        statuses.into_iter().fold(Self::default(), |mut acc, s| {
            acc.record(s);
            acc
        })
    }

    /// Count one more complaint in `status`.
    pub fn record(&mut self, status: ComplaintStatus) {
        self.total += 1;
        match status {
            ComplaintStatus::Pending => self.pending += 1,
            ComplaintStatus::InReview => self.in_review += 1,
            ComplaintStatus::Solved => self.solved += 1,
            ComplaintStatus::Unsolved => self.unsolved += 1,
        }
    }

    pub fn total(&self) -> u64 {
        self.total
    }

    pub fn pending(&self) -> u64 {
        self.pending
    }

    pub fn in_review(&self) -> u64 {
        self.in_review
    }

    pub fn solved(&self) -> u64 {
        self.solved
    }

    pub fn unsolved(&self) -> u64 {
        self.unsolved
    }

    /// Count for a single status.
    pub fn get(&self, status: ComplaintStatus) -> u64 {
        match status {
            ComplaintStatus::Pending => self.pending,
            ComplaintStatus::InReview => self.in_review,
            ComplaintStatus::Solved => self.solved,
            ComplaintStatus::Unsolved => self.unsolved,
        }
    }

    /// Sum of the four per-status counts, or `None` if it overflows.
    pub fn sum_of_statuses(&self) -> Option<u64> {
        self.pending
            .checked_add(self.in_review)?
            .checked_add(self.solved)?
            .checked_add(self.unsolved)
    }

    pub fn is_consistent(&self) -> bool {
        self.sum_of_statuses() == Some(self.total)
    }
}
