//! Credential hashing and the credential store.

use std::sync::Arc;

use argon2::password_hash::rand_core::OsRng;
use argon2::password_hash::{PasswordHash, PasswordHasher, PasswordVerifier, SaltString};
use argon2::{Algorithm, Argon2, Params, Version};

use hcms_core::validation::{validate_secret, validate_username};
use hcms_core::{Role, Timestamp, User, UserId, UserProfile};
use hcms_store::{InsertUserResult, UserStore};

use crate::error::{AuthError, Result};

/// One-way hashing of login secrets.
pub trait CredentialHasher: Send + Sync {
    /// Hash a secret into a self-describing string.
    fn hash(&self, secret: &str) -> Result<String>;

    /// Whether `secret` matches `hash`. A malformed hash never matches.
    fn verify(&self, secret: &str, hash: &str) -> bool;
}

/// Argon2id with a random salt per hash, stored as a PHC string.
#[derive(Default)]
pub struct Argon2Hasher {
    argon2: Argon2<'static>,
}

impl Argon2Hasher {
    pub fn new() -> Self {
        Self::default()
    }

    /// Argon2id with explicit cost parameters (memory in KiB).
    pub fn with_params(memory_kib: u32, iterations: u32, parallelism: u32) -> Result<Self> {
        let params = Params::new(memory_kib, iterations, parallelism, None)
            .map_err(|e| AuthError::Internal(format!("invalid argon2 parameters: {e}")))?;
        Ok(Self {
            argon2: Argon2::new(Algorithm::Argon2id, Version::V0x13, params),
        })
    }
}

impl CredentialHasher for Argon2Hasher {
    fn hash(&self, secret: &str) -> Result<String> {
        let salt = SaltString::generate(&mut OsRng);
        self.argon2
            .hash_password(secret.as_bytes(), &salt)
            .map(|hash| hash.to_string())
            .map_err(|e| AuthError::Internal(format!("failed to hash credential: {e}")))
    }

    fn verify(&self, secret: &str, hash: &str) -> bool {
        PasswordHash::new(hash)
            .map(|parsed| {
                self.argon2
                    .verify_password(secret.as_bytes(), &parsed)
                    .is_ok()
            })
            .unwrap_or(false)
    }
}

/// Registration and login against a [`UserStore`].
///
/// # Design Notes
///
/// - **Uniform failure**: an unknown username, a wrong secret and a
///   deactivated account all produce [`AuthError::InvalidCredentials`].
/// - **Hash even on miss**: an unknown username still runs one verification
///   against a dummy hash so response time does not reveal which usernames
///   exist.
pub struct CredentialStore {
    users: Arc<dyn UserStore>,
    hasher: Arc<dyn CredentialHasher>,
    dummy_hash: String,
}

impl CredentialStore {
    pub fn new(users: Arc<dyn UserStore>, hasher: Arc<dyn CredentialHasher>) -> Result<Self> {
        let dummy_hash = hasher.hash("hcms-dummy-credential")?;
        Ok(Self {
            users,
            hasher,
            dummy_hash,
        })
    }

    /// Register a new account. The username is trimmed before storing.
    pub async fn register(
        &self,
        username: &str,
        secret: &str,
        role: Role,
        profile: UserProfile,
        now: Timestamp,
    ) -> Result<UserId> {
        let username = validate_username(username)?;
        validate_secret(secret)?;

        let hash = self.hasher.hash(secret)?;
        let user = User::new(username, role, profile, now);

        match self.users.insert_user(&user, &hash).await? {
            InsertUserResult::Inserted => {
                tracing::info!(user_id = %user.id, %role, "registered user");
                Ok(user.id)
            }
            InsertUserResult::DuplicateUsername => Err(AuthError::DuplicateUsername),
        }
    }

    /// Check a username/secret pair.
    pub async fn verify(&self, username: &str, secret: &str) -> Result<(UserId, Role)> {
        let username = username.trim();
        let found = self.users.find_credentials(username).await?;

        let Some((user, hash)) = found else {
            self.hasher.verify(secret, &self.dummy_hash);
            tracing::warn!("login failed");
            return Err(AuthError::InvalidCredentials);
        };

        if !self.hasher.verify(secret, &hash) || !user.active {
            tracing::warn!(user_id = %user.id, "login failed");
            return Err(AuthError::InvalidCredentials);
        }

        Ok((user.id, user.role))
    }

    pub async fn get(&self, user_id: &UserId) -> Result<Option<User>> {
        Ok(self.users.get_user(user_id).await?)
    }

    /// Set a user's role. Returns the updated user, or `None` if unknown.
    ///
    /// Only the role column is written, so a concurrent deactivation is
    /// never overwritten.
    pub async fn change_role(&self, user_id: &UserId, role: Role) -> Result<Option<User>> {
        let updated = self.users.set_role(user_id, role).await?;
        if let Some(user) = &updated {
            tracing::info!(user_id = %user.id, role = %user.role, "changed user role");
        }
        Ok(updated)
    }

    /// Deactivate an account. Deactivated users can no longer log in.
    pub async fn deactivate(&self, user_id: &UserId) -> Result<Option<User>> {
        let updated = self.users.set_active(user_id, false).await?;
        if let Some(user) = &updated {
            tracing::info!(user_id = %user.id, "deactivated user");
        }
        Ok(updated)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use async_trait::async_trait;
    use hcms_store::MemoryStore;

    /// Plaintext "hash" for tests.
    struct PlainHasher;

    impl CredentialHasher for PlainHasher {
        fn hash(&self, secret: &str) -> Result<String> {
            Ok(format!("plain:{secret}"))
        }

        fn verify(&self, secret: &str, hash: &str) -> bool {
            hash.strip_prefix("plain:") == Some(secret)
        }
    }

    /// Yields to the scheduler before every call so concurrent updates
    /// interleave the way they do over a blocking-pool backend.
    struct YieldingUsers(MemoryStore);

    #[async_trait]
    impl UserStore for YieldingUsers {
        async fn insert_user(
            &self,
            user: &User,
            credential_hash: &str,
        ) -> hcms_store::Result<InsertUserResult> {
            tokio::task::yield_now().await;
            self.0.insert_user(user, credential_hash).await
        }

        async fn get_user(&self, id: &UserId) -> hcms_store::Result<Option<User>> {
            tokio::task::yield_now().await;
            self.0.get_user(id).await
        }

        async fn find_credentials(
            &self,
            username: &str,
        ) -> hcms_store::Result<Option<(User, String)>> {
            tokio::task::yield_now().await;
            self.0.find_credentials(username).await
        }

        async fn set_role(&self, id: &UserId, role: Role) -> hcms_store::Result<Option<User>> {
            tokio::task::yield_now().await;
            self.0.set_role(id, role).await
        }

        async fn set_active(&self, id: &UserId, active: bool) -> hcms_store::Result<Option<User>> {
            tokio::task::yield_now().await;
            self.0.set_active(id, active).await
        }
    }

    fn store() -> CredentialStore {
        CredentialStore::new(Arc::new(MemoryStore::new()), Arc::new(PlainHasher)).unwrap()
    }

    #[test]
    fn test_argon2_hash_and_verify() {
        let hasher = Argon2Hasher::new();
        let hash = hasher.hash("correct-horse-battery-staple").unwrap();

        assert!(hash.starts_with("$argon2id$"));
        assert!(hasher.verify("correct-horse-battery-staple", &hash));
        assert!(!hasher.verify("wrong", &hash));
        assert!(!hasher.verify("anything", "not a phc string"));
    }

    #[test]
    fn test_argon2_custom_params() {
        let hasher = Argon2Hasher::with_params(8, 1, 1).unwrap();
        let hash = hasher.hash("pw").unwrap();
        assert!(hash.contains("m=8,t=1,p=1"));
        assert!(hasher.verify("pw", &hash));
        assert!(Argon2Hasher::with_params(0, 0, 0).is_err());
    }

    #[test]
    fn test_argon2_salts_differ() {
        let hasher = Argon2Hasher::new();
        assert_ne!(hasher.hash("same").unwrap(), hasher.hash("same").unwrap());
    }

    #[tokio::test]
    async fn test_register_and_verify() {
        let creds = store();
        let id = creds
            .register("  nour  ", "s3cret", Role::Citizen, UserProfile::default(), 0)
            .await
            .unwrap();

        assert_eq!(creds.verify("nour", "s3cret").await.unwrap(), (id, Role::Citizen));
        assert_eq!(creds.get(&id).await.unwrap().unwrap().username, "nour");
    }

    #[tokio::test]
    async fn test_register_rejects_duplicates_and_blank_input() {
        let creds = store();
        creds
            .register("nour", "a", Role::Citizen, UserProfile::default(), 0)
            .await
            .unwrap();

        assert!(matches!(
            creds
                .register("nour", "b", Role::Staff, UserProfile::default(), 1)
                .await,
            Err(AuthError::DuplicateUsername)
        ));
        assert!(matches!(
            creds
                .register("   ", "b", Role::Citizen, UserProfile::default(), 1)
                .await,
            Err(AuthError::InvalidInput(_))
        ));
        assert!(matches!(
            creds
                .register("sami", "", Role::Citizen, UserProfile::default(), 1)
                .await,
            Err(AuthError::InvalidInput(_))
        ));
    }

    #[tokio::test]
    async fn test_login_failures_are_uniform() {
        let creds = store();
        let id = creds
            .register("nour", "right", Role::Staff, UserProfile::default(), 0)
            .await
            .unwrap();

        assert!(matches!(
            creds.verify("nour", "wrong").await,
            Err(AuthError::InvalidCredentials)
        ));
        assert!(matches!(
            creds.verify("ghost", "right").await,
            Err(AuthError::InvalidCredentials)
        ));

        creds.deactivate(&id).await.unwrap().unwrap();
        assert!(matches!(
            creds.verify("nour", "right").await,
            Err(AuthError::InvalidCredentials)
        ));
    }

    #[tokio::test]
    async fn test_change_role() {
        let creds = store();
        let id = creds
            .register("nour", "pw", Role::Citizen, UserProfile::default(), 0)
            .await
            .unwrap();

        let updated = creds.change_role(&id, Role::Staff).await.unwrap().unwrap();
        assert_eq!(updated.role, Role::Staff);
        assert_eq!(creds.verify("nour", "pw").await.unwrap().1, Role::Staff);
        assert!(creds
            .change_role(&UserId::new(), Role::Admin)
            .await
            .unwrap()
            .is_none());
    }

    #[tokio::test]
    async fn test_interleaved_role_change_and_deactivation_both_stick() {
        let creds = CredentialStore::new(
            Arc::new(YieldingUsers(MemoryStore::new())),
            Arc::new(PlainHasher),
        )
        .unwrap();
        let id = creds
            .register("nour", "pw", Role::Citizen, UserProfile::default(), 0)
            .await
            .unwrap();

        let (promoted, deactivated) =
            tokio::join!(creds.change_role(&id, Role::Admin), creds.deactivate(&id));
        assert!(promoted.unwrap().is_some());
        assert!(deactivated.unwrap().is_some());

        let user = creds.get(&id).await.unwrap().unwrap();
        assert_eq!(user.role, Role::Admin);
        assert!(!user.active);
        assert!(matches!(
            creds.verify("nour", "pw").await,
            Err(AuthError::InvalidCredentials)
        ));
    }
}
