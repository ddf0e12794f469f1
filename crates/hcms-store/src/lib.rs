//! # HCMS Store
//!
//! Storage abstraction for HCMS. Provides trait-based interfaces for
//! complaint, comment and user persistence with SQLite and in-memory
//! implementations.
//!
//! ## Key Types
//!
//! - [`ComplaintStore`] - Complaints and their comment threads
//! - [`UserStore`] - User accounts and credential hashes
//! - [`SqliteStore`] - SQLite-based persistent storage
//! - [`MemoryStore`] - In-memory storage for tests
//! - [`SaveResult`] - Outcome of an insert or compare-and-swap update
//!
//! ## Usage
//!
//! ```rust,no_run
//! use hcms_store::{ComplaintFilter, ComplaintStore, SqliteStore};
//!
//! async fn example() {
//!     let store = SqliteStore::open("hcms.db").unwrap();
//!     let pending = store.list_complaints(&ComplaintFilter::all()).await.unwrap();
//!     println!("{} complaints", pending.len());
//! }
//! ```
//!
//! ## Design Notes
//!
//! - **Optimistic concurrency**: updates carry the version the caller read;
//!   a stale version yields `VersionConflict` and nothing is written
//! - **Append-only threads**: comments are never edited and are sequenced by
//!   the store
//! - **Cascading delete**: removing a complaint removes its thread

pub mod error;
pub mod memory;
pub mod migration;
pub mod sqlite;
pub mod traits;

pub use error::{Result, StoreError};
pub use memory::MemoryStore;
pub use sqlite::SqliteStore;
pub use traits::{
    newest_first, AppendResult, ComplaintFilter, ComplaintStore, InsertUserResult, SaveResult,
    UserStore,
};
