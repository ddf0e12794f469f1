//! Stateless signed session tokens.
//!
//! A token is three dot-separated parts:
//!
//! ```text
//! hcms1.<hex(CBOR claims)>.<hex(Ed25519 signature)>
//! ```
//!
//! The signature covers the prefix and the raw CBOR bytes, so a token minted
//! under a different format version never verifies. Nothing is stored
//! server-side; a token lives until `expires_at` and cannot be revoked.

use std::fmt;
use std::sync::Arc;
use std::time::Duration;

use serde::{Deserialize, Serialize};

use hcms_core::{Clock, Ed25519PublicKey, Ed25519Signature, Keypair, Role, Timestamp, UserId};

use crate::error::{AuthError, Result};

/// Format tag at the front of every token.
pub const TOKEN_PREFIX: &str = "hcms1";

/// Default session lifetime.
pub const DEFAULT_TOKEN_TTL: Duration = Duration::from_secs(24 * 60 * 60);

/// What a token asserts about its bearer.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SessionClaims {
    pub subject: UserId,
    pub role: Role,
    pub issued_at: Timestamp,
    pub expires_at: Timestamp,
}

impl SessionClaims {
    /// Valid while `now < expires_at`.
    pub fn is_expired_at(&self, now: Timestamp) -> bool {
        now >= self.expires_at
    }
}

/// An opaque bearer token.
///
/// `Debug` is redacted so tokens never end up in logs.
#[derive(Clone, PartialEq, Eq)]
pub struct Token(String);

impl Token {
    pub fn as_str(&self) -> &str {
        &self.0
    }

    pub fn into_string(self) -> String {
        self.0
    }
}

impl From<String> for Token {
    fn from(s: String) -> Self {
        Self(s)
    }
}

impl AsRef<str> for Token {
    fn as_ref(&self) -> &str {
        &self.0
    }
}

impl fmt::Debug for Token {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("Token(..)")
    }
}

/// Mints and validates session tokens.
///
/// # Design Notes
///
/// - **Signature before expiry**: `validate` checks structure and signature
///   first. Only a token this issuer actually signed can be reported as
///   [`AuthError::TokenExpired`]; everything else is
///   [`AuthError::InvalidToken`].
/// - **Pure validation**: no I/O and no shared mutable state, so validation
///   may run with unbounded parallelism.
pub struct SessionIssuer {
    keypair: Keypair,
    public_key: Ed25519PublicKey,
    ttl: Duration,
    clock: Arc<dyn Clock>,
}

impl SessionIssuer {
    pub fn new(keypair: Keypair, ttl: Duration, clock: Arc<dyn Clock>) -> Self {
        let public_key = keypair.public_key();
        Self {
            keypair,
            public_key,
            ttl,
            clock,
        }
    }

    pub fn ttl(&self) -> Duration {
        self.ttl
    }

    pub fn public_key(&self) -> Ed25519PublicKey {
        self.public_key
    }

    /// Issue a token for `subject` valid from now for the configured TTL.
    pub fn issue(&self, subject: UserId, role: Role) -> Result<Token> {
        self.issue_at(subject, role, self.clock.now_millis())
    }

    pub fn issue_at(&self, subject: UserId, role: Role, now: Timestamp) -> Result<Token> {
        let ttl_millis = i64::try_from(self.ttl.as_millis()).unwrap_or(i64::MAX);
        let claims = SessionClaims {
            subject,
            role,
            issued_at: now,
            expires_at: now.saturating_add(ttl_millis),
        };

        let mut claims_bytes = Vec::new();
        ciborium::into_writer(&claims, &mut claims_bytes)
            .map_err(|e| AuthError::Internal(format!("encoding session claims: {e}")))?;
        let signature = self.keypair.sign(&signing_input(&claims_bytes));

        Ok(Token(format!(
            "{TOKEN_PREFIX}.{}.{}",
            hex::encode(&claims_bytes),
            signature.to_hex()
        )))
    }

    /// Validate a token against the current time.
    pub fn validate(&self, token: &str) -> Result<SessionClaims> {
        self.validate_at(token, self.clock.now_millis())
    }

    pub fn validate_at(&self, token: &str, now: Timestamp) -> Result<SessionClaims> {
        let claims = self.verify(token)?;
        if claims.is_expired_at(now) {
            return Err(AuthError::TokenExpired);
        }
        Ok(claims)
    }

    /// Structure and signature checks only.
    fn verify(&self, token: &str) -> Result<SessionClaims> {
        let mut parts = token.split('.');
        let (Some(prefix), Some(claims_hex), Some(sig_hex), None) =
            (parts.next(), parts.next(), parts.next(), parts.next())
        else {
            return Err(AuthError::InvalidToken);
        };
        if prefix != TOKEN_PREFIX {
            return Err(AuthError::InvalidToken);
        }

        let claims_bytes = hex::decode(claims_hex).map_err(|_| AuthError::InvalidToken)?;
        let signature = Ed25519Signature::from_hex(sig_hex).map_err(|_| AuthError::InvalidToken)?;
        self.public_key
            .verify(&signing_input(&claims_bytes), &signature)
            .map_err(|_| AuthError::InvalidToken)?;

        let claims: SessionClaims =
            ciborium::from_reader(claims_bytes.as_slice()).map_err(|_| AuthError::InvalidToken)?;
        if claims.expires_at < claims.issued_at {
            return Err(AuthError::InvalidToken);
        }
        Ok(claims)
    }
}

fn signing_input(claims_bytes: &[u8]) -> Vec<u8> {
    let mut input = Vec::with_capacity(TOKEN_PREFIX.len() + 1 + claims_bytes.len());
    input.extend_from_slice(TOKEN_PREFIX.as_bytes());
    input.push(b'.');
    input.extend_from_slice(claims_bytes);
    input
}
