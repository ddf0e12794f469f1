//! # HCMS Auth
//!
//! Who is calling, and may they do this?
//!
//! ## Overview
//!
//! - [`SessionIssuer`] mints and validates stateless signed [`Token`]s
//!   carrying [`SessionClaims`] (subject, role, issue and expiry times).
//! - [`authorize`] is the permission matrix: a pure function of role,
//!   [`Action`] and resource ownership.
//! - [`CredentialStore`] registers accounts and checks login secrets through
//!   a pluggable [`CredentialHasher`] ([`Argon2Hasher`] by default).
//!
//! ## Usage
//!
//! ```rust,no_run
//! use std::sync::Arc;
//! use hcms_auth::{authorize, Action, SessionIssuer, DEFAULT_TOKEN_TTL};
//! use hcms_core::{Keypair, Role, SystemClock, UserId};
//!
//! let issuer = SessionIssuer::new(Keypair::generate(), DEFAULT_TOKEN_TTL, Arc::new(SystemClock));
//! let token = issuer.issue(UserId::new(), Role::Staff).unwrap();
//! let claims = issuer.validate(token.as_str()).unwrap();
//! assert!(authorize(claims.role, Action::ChangeStatus, false).is_allowed());
//! ```
//!
//! ## Design Notes
//!
//! - **No revocation**: a token is good until it expires. Keep the TTL short.
//! - **Deny by default**: the matrix is exhaustive; nothing is allowed unless
//!   a rule says so.

pub mod authorizer;
pub mod credentials;
pub mod error;
pub mod session;

pub use authorizer::{authorize, Action, Decision, RoleAuthorizer};
pub use credentials::{Argon2Hasher, CredentialHasher, CredentialStore};
pub use error::{AuthError, Result};
pub use session::{SessionClaims, SessionIssuer, Token, DEFAULT_TOKEN_TTL, TOKEN_PREFIX};
