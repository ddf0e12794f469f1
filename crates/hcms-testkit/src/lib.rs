//! # HCMS Testkit
//!
//! Testing utilities for HCMS.
//!
//! ## Overview
//!
//! - **Fixtures**: a service over an in-memory store with a manual clock and
//!   helpers that register and log in actors of each role
//! - **Generators**: proptest strategies for statuses, roles, actions and
//!   valid complaint input
//!
//! ## Test Fixtures
//!
//! ```rust,no_run
//! use hcms_testkit::TestFixture;
//!
//! async fn example() {
//!     let fixture = TestFixture::new();
//!     let citizen = fixture.citizen("amina").await;
//!     let complaint = fixture.file(&citizen, "leaking pipe").await;
//!     fixture.advance(60_000);
//! }
//! ```
//!
//! ## Property Testing
//!
//! ```rust,ignore
//! use proptest::prelude::*;
//! use hcms_testkit::generators::{role, action};
//!
//! proptest! {
//!     #[test]
//!     fn authorize_is_total(role in role(), action in action(), owner: bool) {
//!         let _ = hcms_auth::authorize(role, action, owner);
//!     }
//! }
//! ```

pub mod fixtures;
pub mod generators;

pub use fixtures::{Actor, TestFixture, FIXTURE_SECRET, FIXTURE_SEED, FIXTURE_START};
