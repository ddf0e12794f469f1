//! # HCMS
//!
//! The unified API for the healthcare complaint management system.
//!
//! ## Overview
//!
//! Citizens file complaints against hospitals; staff review and resolve
//! them; administrators manage accounts and may delete records. Every
//! operation on [`ComplaintService`] takes a bearer token, checks it, checks
//! the caller's role against the permission matrix, then acts.
//!
//! ## Usage
//!
//! ```rust,no_run
//! use hcms::{ComplaintService, HcmsConfig};
//! use hcms::core::{Keypair, NewComplaint, UserProfile};
//! use hcms::store::SqliteStore;
//!
//! async fn example() {
//!     let store = SqliteStore::open("hcms.db").unwrap();
//!     let service = ComplaintService::new(Keypair::generate(), store, HcmsConfig::default()).unwrap();
//!
//!     service
//!         .register_citizen("amina", "hunter2", UserProfile::default())
//!         .await
//!         .unwrap();
//!     let token = service.login("amina", "hunter2").await.unwrap();
//!
//!     let complaint = service
//!         .create_complaint(token.as_str(), NewComplaint::new(17, "leaking pipe in ward 3"))
//!         .await
//!         .unwrap();
//!     println!("filed {}", complaint.id());
//! }
//! ```
//!
//! ## Re-exports
//!
//! - `hcms::core` - Domain types (complaints, users, comments, statistics)
//! - `hcms::store` - Storage traits, SQLite and in-memory backends
//! - `hcms::auth` - Session tokens, permission matrix, credentials

pub mod config;
pub mod error;
pub mod registry;
pub mod service;
pub mod stats;
pub mod thread;

pub use hcms_auth as auth;
pub use hcms_core as core;
pub use hcms_store as store;

pub use config::HcmsConfig;
pub use error::{ErrorCategory, HcmsError, Result};
pub use registry::ComplaintRegistry;
pub use service::ComplaintService;
pub use stats::StatisticsAggregator;
pub use thread::CommentThread;

pub use hcms_auth::{Action, SessionClaims, Token};
pub use hcms_core::{
    Comment, Complaint, ComplaintCategory, ComplaintId, ComplaintStatus, NewComplaint, Role,
    StatsScope, StatusCounts, UserId, UserProfile,
};
