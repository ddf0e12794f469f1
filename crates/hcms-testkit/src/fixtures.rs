//! Test fixtures and helpers.
//!
//! Common setup code for integration tests: a service over an in-memory
//! store, a clock that only moves when told to, and ready-made actors.

use std::sync::Arc;

use hcms::{ComplaintService, HcmsConfig};
use hcms_auth::{Argon2Hasher, CredentialHasher, CredentialStore, Token};
use hcms_core::{
    Complaint, Keypair, ManualClock, NewComplaint, Role, Timestamp, UserId, UserProfile,
};
use hcms_store::{MemoryStore, UserStore};

/// Seed for the fixture's signing key.
pub const FIXTURE_SEED: [u8; 32] = [42u8; 32];

/// Where the fixture clock starts (2023-11-14T22:13:20Z).
pub const FIXTURE_START: Timestamp = 1_700_000_000_000;

/// Secret every fixture actor is registered with.
pub const FIXTURE_SECRET: &str = "fixture-secret";

/// A logged-in user.
#[derive(Debug, Clone)]
pub struct Actor {
    pub id: UserId,
    pub username: String,
    pub role: Role,
    pub token: Token,
}

impl Actor {
    /// The bearer token as passed to service calls.
    pub fn token(&self) -> &str {
        self.token.as_str()
    }
}

/// A service wired to a memory store and a manual clock.
pub struct TestFixture {
    pub clock: Arc<ManualClock>,
    pub store: Arc<MemoryStore>,
    pub service: ComplaintService<MemoryStore>,
    /// Direct registration, bypassing the admin-only service path.
    accounts: CredentialStore,
}

impl TestFixture {
    pub fn new() -> Self {
        Self::with_config(HcmsConfig::default())
    }

    pub fn with_config(config: HcmsConfig) -> Self {
        let clock = Arc::new(ManualClock::new(FIXTURE_START));
        let store = Arc::new(MemoryStore::new());
        // Lowest Argon2id cost the crate accepts.
        let hasher: Arc<dyn CredentialHasher> =
            Arc::new(Argon2Hasher::with_params(8, 1, 1).expect("valid argon2 params"));

        let service = ComplaintService::with_parts(
            Keypair::from_seed(&FIXTURE_SEED),
            store.clone(),
            hasher.clone(),
            clock.clone(),
            config,
        )
        .expect("fixture service");

        let users: Arc<dyn UserStore> = store.clone();
        let accounts = CredentialStore::new(users, hasher).expect("fixture credential store");

        Self {
            clock,
            store,
            service,
            accounts,
        }
    }

    /// Register a user with any role and log them in.
    pub async fn actor(&self, username: &str, role: Role) -> Actor {
        let id = self
            .accounts
            .register(
                username,
                FIXTURE_SECRET,
                role,
                UserProfile::default(),
                self.now(),
            )
            .await
            .expect("register fixture actor");
        let token = self
            .service
            .login(username, FIXTURE_SECRET)
            .await
            .expect("log in fixture actor");

        Actor {
            id,
            username: username.to_string(),
            role,
            token,
        }
    }

    pub async fn citizen(&self, username: &str) -> Actor {
        self.actor(username, Role::Citizen).await
    }

    pub async fn staff(&self, username: &str) -> Actor {
        self.actor(username, Role::Staff).await
    }

    pub async fn admin(&self, username: &str) -> Actor {
        self.actor(username, Role::Admin).await
    }

    /// File a plain complaint as `actor`.
    pub async fn file(&self, actor: &Actor, description: &str) -> Complaint {
        self.service
            .create_complaint(actor.token(), NewComplaint::new(1, description))
            .await
            .expect("file fixture complaint")
    }

    pub fn now(&self) -> Timestamp {
        use hcms_core::Clock;
        self.clock.now_millis()
    }

    /// Move the clock forward and return the new time.
    pub fn advance(&self, millis: i64) -> Timestamp {
        self.clock.advance(millis)
    }
}

impl Default for TestFixture {
    fn default() -> Self {
        Self::new()
    }
}
