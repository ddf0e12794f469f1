//! Service configuration.

use std::time::Duration;

use hcms_auth::DEFAULT_TOKEN_TTL;
use hcms_core::{MAX_COMMENT_LEN, MAX_DESCRIPTION_LEN};

/// Configuration for [`crate::ComplaintService`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct HcmsConfig {
    /// How long an issued session token stays valid.
    pub token_ttl: Duration,
    /// Maximum complaint description length, in characters.
    pub max_description_len: usize,
    /// Maximum comment length, in characters.
    pub max_comment_len: usize,
}

impl Default for HcmsConfig {
    fn default() -> Self {
        Self {
            token_ttl: DEFAULT_TOKEN_TTL,
            max_description_len: MAX_DESCRIPTION_LEN,
            max_comment_len: MAX_COMMENT_LEN,
        }
    }
}

impl HcmsConfig {
    pub fn with_token_ttl(mut self, ttl: Duration) -> Self {
        self.token_ttl = ttl;
        self
    }

    pub fn with_max_description_len(mut self, len: usize) -> Self {
        self.max_description_len = len;
        self
    }

    pub fn with_max_comment_len(mut self, len: usize) -> Self {
        self.max_comment_len = len;
        self
    }
}
