//! The complaint service: authenticated entry point for every operation.
//!
//! Each call follows the same path: validate the bearer token, authorize
//! the action for the caller's role (and ownership, where it matters), then
//! hand off to the registry, comment thread or aggregator.

use std::sync::Arc;

use hcms_auth::{
    authorize, Action, Argon2Hasher, CredentialHasher, CredentialStore, RoleAuthorizer,
    SessionClaims, SessionIssuer, Token,
};
use hcms_core::{
    Clock, Comment, Complaint, ComplaintId, ComplaintStatus, Keypair, NewComplaint, Role,
    StatsScope, StatusCounts, SystemClock, User, UserId, UserProfile,
};
use hcms_store::{ComplaintStore, UserStore};

use crate::config::HcmsConfig;
use crate::error::{HcmsError, Result};
use crate::registry::ComplaintRegistry;
use crate::stats::StatisticsAggregator;
use crate::thread::CommentThread;

/// The HCMS API.
///
/// # Design Notes
///
/// - **Uniform denial**: a caller who may not act on a complaint gets
///   [`HcmsError::Forbidden`] whether or not the complaint exists.
///   [`HcmsError::NotFound`] is only possible once authorization passed.
/// - **No internal retries**: a [`HcmsError::ConcurrentModification`] goes
///   straight back to the caller, who re-reads and decides.
/// - **Stateless sessions**: a token's role is trusted until it expires, even
///   if an admin changes the user's role in the meantime.
pub struct ComplaintService<S: ComplaintStore + UserStore + 'static> {
    sessions: SessionIssuer,
    authorizer: RoleAuthorizer,
    credentials: CredentialStore,
    registry: ComplaintRegistry<S>,
    comments: CommentThread<S>,
    stats: StatisticsAggregator<S>,
    clock: Arc<dyn Clock>,
    config: HcmsConfig,
}

impl<S: ComplaintStore + UserStore + 'static> ComplaintService<S> {
    /// Create a service over `store` using wall-clock time and Argon2id.
    pub fn new(keypair: Keypair, store: S, config: HcmsConfig) -> Result<Self> {
        Self::with_parts(
            keypair,
            Arc::new(store),
            Arc::new(Argon2Hasher::new()),
            Arc::new(SystemClock),
            config,
        )
    }

    /// Create a service with explicit collaborators.
    pub fn with_parts(
        keypair: Keypair,
        store: Arc<S>,
        hasher: Arc<dyn CredentialHasher>,
        clock: Arc<dyn Clock>,
        config: HcmsConfig,
    ) -> Result<Self> {
        let users: Arc<dyn UserStore> = store.clone();
        Ok(Self {
            sessions: SessionIssuer::new(keypair, config.token_ttl, clock.clone()),
            authorizer: RoleAuthorizer,
            credentials: CredentialStore::new(users, hasher)?,
            registry: ComplaintRegistry::new(
                store.clone(),
                clock.clone(),
                config.max_description_len,
            ),
            comments: CommentThread::new(store.clone(), clock.clone(), config.max_comment_len),
            stats: StatisticsAggregator::new(store),
            clock,
            config,
        })
    }

    pub fn config(&self) -> &HcmsConfig {
        &self.config
    }

    pub fn registry(&self) -> &ComplaintRegistry<S> {
        &self.registry
    }

    pub fn sessions(&self) -> &SessionIssuer {
        &self.sessions
    }

    // ─────────────────────────────────────────────────────────────────────────
    // Accounts and sessions
    // ─────────────────────────────────────────────────────────────────────────

    /// Self-registration. Always creates a citizen.
    pub async fn register_citizen(
        &self,
        username: &str,
        secret: &str,
        profile: UserProfile,
    ) -> Result<UserId> {
        Ok(self
            .credentials
            .register(username, secret, Role::Citizen, profile, self.clock.now_millis())
            .await?)
    }

    /// Exchange a username and secret for a session token.
    pub async fn login(&self, username: &str, secret: &str) -> Result<Token> {
        let (user_id, role) = self.credentials.verify(username, secret).await?;
        let token = self.sessions.issue(user_id, role)?;
        tracing::info!(user_id = %user_id, %role, "session issued");
        Ok(token)
    }

    /// Validate a bearer token.
    pub fn authenticate(&self, token: &str) -> Result<SessionClaims> {
        self.sessions.validate(token).map_err(|err| {
            tracing::warn!(reason = %err, "rejected session token");
            HcmsError::from(err)
        })
    }

    /// Create an account with any role. Admin only.
    pub async fn create_user(
        &self,
        token: &str,
        username: &str,
        secret: &str,
        role: Role,
        profile: UserProfile,
    ) -> Result<UserId> {
        let claims = self.authenticate(token)?;
        self.authorizer.check(claims.role, Action::ManageUsers, false)?;
        Ok(self
            .credentials
            .register(username, secret, role, profile, self.clock.now_millis())
            .await?)
    }

    /// Change a user's role. Admin only.
    pub async fn change_role(&self, token: &str, user_id: &UserId, role: Role) -> Result<User> {
        let claims = self.authenticate(token)?;
        self.authorizer.check(claims.role, Action::ManageUsers, false)?;
        self.credentials
            .change_role(user_id, role)
            .await?
            .ok_or_else(|| HcmsError::NotFound(format!("user {user_id}")))
    }

    /// Deactivate a user so they can no longer log in. Admin only.
    pub async fn deactivate_user(&self, token: &str, user_id: &UserId) -> Result<User> {
        let claims = self.authenticate(token)?;
        self.authorizer.check(claims.role, Action::ManageUsers, false)?;
        self.credentials
            .deactivate(user_id)
            .await?
            .ok_or_else(|| HcmsError::NotFound(format!("user {user_id}")))
    }

    // ─────────────────────────────────────────────────────────────────────────
    // Complaints
    // ─────────────────────────────────────────────────────────────────────────

    /// File a complaint owned by the caller.
    pub async fn create_complaint(&self, token: &str, new: NewComplaint) -> Result<Complaint> {
        let claims = self.authenticate(token)?;
        self.authorizer
            .check(claims.role, Action::CreateComplaint, true)?;
        self.registry.create(claims.subject, new).await
    }

    pub async fn view_complaint(&self, token: &str, id: &ComplaintId) -> Result<Complaint> {
        let claims = self.authenticate(token)?;
        self.authorize_on(&claims, Action::ViewComplaint, id).await?;
        self.registry.get(id).await
    }

    /// The caller's own complaints, newest first.
    pub async fn list_my_complaints(&self, token: &str) -> Result<Vec<Complaint>> {
        let claims = self.authenticate(token)?;
        self.authorizer
            .check(claims.role, Action::ListOwnComplaints, true)?;
        self.registry.list_by_owner(claims.subject).await
    }

    /// All complaints, optionally filtered by status, newest first.
    pub async fn list_all_complaints(
        &self,
        token: &str,
        status: Option<ComplaintStatus>,
    ) -> Result<Vec<Complaint>> {
        let claims = self.authenticate(token)?;
        self.authorizer
            .check(claims.role, Action::ListAllComplaints, false)?;
        self.registry.list_all(status).await
    }

    /// Move a complaint to `to`. `expected_version` is the version the caller
    /// last read.
    pub async fn change_status(
        &self,
        token: &str,
        id: &ComplaintId,
        expected_version: u64,
        to: ComplaintStatus,
    ) -> Result<Complaint> {
        let claims = self.authenticate(token)?;
        self.authorize_on(&claims, Action::ChangeStatus, id).await?;
        self.registry.transition(id, expected_version, to).await
    }

    /// Delete a complaint and its comments.
    pub async fn delete_complaint(&self, token: &str, id: &ComplaintId) -> Result<()> {
        let claims = self.authenticate(token)?;
        self.authorize_on(&claims, Action::DeleteComplaint, id).await?;
        self.registry.delete(id).await
    }

    // ─────────────────────────────────────────────────────────────────────────
    // Comments
    // ─────────────────────────────────────────────────────────────────────────

    pub async fn add_comment(&self, token: &str, id: &ComplaintId, text: &str) -> Result<Comment> {
        let claims = self.authenticate(token)?;
        self.authorize_on(&claims, Action::AddComment, id).await?;
        self.comments.add(id, claims.subject, text).await
    }

    /// A complaint's thread, oldest first. Visible to whoever may view the
    /// complaint.
    pub async fn list_comments(&self, token: &str, id: &ComplaintId) -> Result<Vec<Comment>> {
        let claims = self.authenticate(token)?;
        self.authorize_on(&claims, Action::ViewComplaint, id).await?;
        self.comments.list_for(id).await
    }

    // ─────────────────────────────────────────────────────────────────────────
    // Statistics
    // ─────────────────────────────────────────────────────────────────────────

    /// Status counts. Any caller may see their own; everything else needs
    /// [`Action::ViewStatistics`].
    pub async fn statistics(&self, token: &str, scope: StatsScope) -> Result<StatusCounts> {
        let claims = self.authenticate(token)?;
        let action = match scope {
            StatsScope::Owner(owner) if owner == claims.subject => Action::ViewOwnStatistics,
            _ => Action::ViewStatistics,
        };
        self.authorizer.check(claims.role, action, false)?;
        self.stats.compute(scope).await
    }

    /// Authorize an action on one complaint.
    ///
    /// Ownership is only looked up when the role's decision depends on it.
    /// A missing complaint counts as "not yours".
    async fn authorize_on(
        &self,
        claims: &SessionClaims,
        action: Action,
        id: &ComplaintId,
    ) -> Result<()> {
        if authorize(claims.role, action, false).is_allowed() {
            return Ok(());
        }

        let is_owner = if authorize(claims.role, action, true).is_allowed() {
            self.registry
                .find(id)
                .await?
                .map_or(false, |c| c.is_owned_by(claims.subject))
        } else {
            false
        };

        Ok(self.authorizer.check(claims.role, action, is_owner)?)
    }
}
