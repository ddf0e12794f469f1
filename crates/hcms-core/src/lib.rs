//! # HCMS Core
//!
//! Pure domain primitives for the healthcare complaint management system:
//! users and roles, complaints and their status state machine, comments,
//! and status statistics.
//!
//! This crate contains no I/O, no storage, no networking.
//!
//! ## Key Types
//!
//! - [`Complaint`] - A complaint record; status changes only via [`Complaint::transition`]
//! - [`ComplaintStatus`] - `Pending -> InReview -> Solved | Unsolved`, reopenable
//! - [`Comment`] - An immutable entry in a complaint's thread
//! - [`Role`] - The closed set of actor roles
//! - [`StatusCounts`] - Per-status tallies that always sum to their total
//! - [`Keypair`] - Ed25519 signing key used for session tokens

pub mod clock;
pub mod comment;
pub mod complaint;
pub mod crypto;
pub mod error;
pub mod stats;
pub mod types;
pub mod user;
pub mod validation;

pub use clock::{Clock, ManualClock, SystemClock};
pub use comment::{sort_thread, Comment};
pub use complaint::{Complaint, ComplaintCategory, ComplaintParts, ComplaintStatus, NewComplaint};
pub use crypto::{Ed25519PublicKey, Ed25519Signature, Keypair};
pub use error::{CoreError, Result};
pub use stats::{StatsScope, StatusCounts};
pub use types::{CommentId, ComplaintId, Timestamp, UserId};
pub use user::{Role, User, UserProfile};
pub use validation::{MAX_COMMENT_LEN, MAX_DESCRIPTION_LEN};
