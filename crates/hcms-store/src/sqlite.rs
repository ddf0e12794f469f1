//! SQLite implementation of the store traits.
//!
//! This is the primary storage backend. It uses rusqlite with bundled
//! SQLite, wrapped in async via tokio::spawn_blocking.

use std::path::Path;
use std::sync::{Arc, Mutex};

use async_trait::async_trait;
use rusqlite::types::Type;
use rusqlite::{params, Connection, OptionalExtension, Row, ToSql};

use hcms_core::{
    Comment, CommentId, Complaint, ComplaintCategory, ComplaintId, ComplaintParts,
    ComplaintStatus, CoreError, Role, User, UserId, UserProfile,
};

use crate::error::{Result, StoreError};
use crate::migration;
use crate::traits::{
    AppendResult, ComplaintFilter, ComplaintStore, InsertUserResult, SaveResult, UserStore,
};

/// SQLite-based store implementation.
///
/// Thread-safe via internal Mutex. All operations use spawn_blocking
/// to avoid blocking the async runtime.
pub struct SqliteStore {
    conn: Arc<Mutex<Connection>>,
}

impl SqliteStore {
    /// Open a SQLite database at the given path.
    ///
    /// Creates the file and runs migrations if it doesn't exist.
    pub fn open(path: impl AsRef<Path>) -> Result<Self> {
        let mut conn = Connection::open(path)?;
        migration::migrate(&mut conn)?;
        Ok(Self {
            conn: Arc::new(Mutex::new(conn)),
        })
    }

    /// Open an in-memory SQLite database.
    ///
    /// Useful for testing.
    pub fn open_memory() -> Result<Self> {
        let mut conn = Connection::open_in_memory()?;
        migration::migrate(&mut conn)?;
        Ok(Self {
            conn: Arc::new(Mutex::new(conn)),
        })
    }

    /// Run `f` against the connection on the blocking thread pool.
    async fn blocking<F, T>(&self, f: F) -> Result<T>
    where
        F: FnOnce(&mut Connection) -> Result<T> + Send + 'static,
        T: Send + 'static,
    {
        let conn = self.conn.clone();
        tokio::task::spawn_blocking(move || {
            let mut conn = conn.lock().map_err(|_| StoreError::LockPoisoned)?;
            f(&mut conn)
        })
        .await
        .map_err(|e| StoreError::Task(e.to_string()))?
    }
}

fn conversion_error(idx: usize, ty: Type, err: CoreError) -> rusqlite::Error {
    rusqlite::Error::FromSqlConversionFailure(idx, ty, Box::new(err))
}

fn get_id_bytes(row: &Row<'_>, column: &str) -> rusqlite::Result<[u8; 16]> {
    let bytes: Vec<u8> = row.get(column)?;
    let idx = row.as_ref().column_index(column)?;
    bytes
        .try_into()
        .map_err(|_| rusqlite::Error::InvalidColumnType(idx, column.into(), Type::Blob))
}

fn row_to_parts(row: &Row<'_>) -> rusqlite::Result<ComplaintParts> {
    let status: u8 = row.get("status")?;
    let status = ComplaintStatus::from_u8(status).ok_or_else(|| {
        conversion_error(
            7,
            Type::Integer,
            CoreError::UnknownVariant {
                kind: "complaint status",
                value: status.to_string(),
            },
        )
    })?;
    let category: String = row.get("category")?;
    let category =
        ComplaintCategory::parse(&category).map_err(|e| conversion_error(3, Type::Text, e))?;

    Ok(ComplaintParts {
        id: ComplaintId::from_bytes(get_id_bytes(row, "id")?),
        owner_id: UserId::from_bytes(get_id_bytes(row, "owner_id")?),
        hospital_id: row.get("hospital_id")?,
        category,
        department: row.get("department")?,
        description: row.get("description")?,
        attachment_url: row.get("attachment_url")?,
        status,
        created_at: row.get("created_at")?,
        updated_at: row.get("updated_at")?,
        resolved_at: row.get("resolved_at")?,
        version: row.get("version")?,
    })
}

fn parts_to_complaint(parts: ComplaintParts) -> Result<Complaint> {
    parts
        .into_complaint()
        .map_err(|e| StoreError::InvalidData(e.to_string()))
}

fn row_to_comment(row: &Row<'_>) -> rusqlite::Result<Comment> {
    Ok(Comment {
        id: CommentId::from_bytes(get_id_bytes(row, "id")?),
        complaint_id: ComplaintId::from_bytes(get_id_bytes(row, "complaint_id")?),
        author_id: UserId::from_bytes(get_id_bytes(row, "author_id")?),
        text: row.get("text")?,
        created_at: row.get("created_at")?,
        seq: row.get("seq")?,
    })
}

fn row_to_user(row: &Row<'_>) -> rusqlite::Result<User> {
    let role: u8 = row.get("role")?;
    let role = Role::from_u8(role).ok_or_else(|| {
        conversion_error(
            3,
            Type::Integer,
            CoreError::UnknownVariant {
                kind: "role",
                value: role.to_string(),
            },
        )
    })?;

    Ok(User {
        id: UserId::from_bytes(get_id_bytes(row, "id")?),
        username: row.get("username")?,
        role,
        profile: UserProfile {
            language: row.get("language")?,
            is_anonymous: row.get("is_anonymous")?,
        },
        active: row.get("active")?,
        created_at: row.get("created_at")?,
    })
}

const COMPLAINT_COLUMNS: &str = "id, owner_id, hospital_id, category, department, description, \
     attachment_url, status, created_at, updated_at, resolved_at, version";

const USER_COLUMNS: &str = "id, username, role, language, is_anonymous, active, created_at";

/// Write a single user column and read the row back in one transaction.
/// `column` is always a literal from this module.
fn set_user_column(
    conn: &mut Connection,
    id: &UserId,
    column: &str,
    value: &dyn ToSql,
) -> Result<Option<User>> {
    let tx = conn.transaction()?;
    let changed = tx.execute(
        &format!("UPDATE users SET {column} = ?2 WHERE id = ?1"),
        params![id.as_bytes().as_slice(), value],
    )?;
    if changed == 0 {
        return Ok(None);
    }
    let user = tx.query_row(
        &format!("SELECT {USER_COLUMNS} FROM users WHERE id = ?1"),
        params![id.as_bytes().as_slice()],
        row_to_user,
    )?;
    tx.commit()?;
    Ok(Some(user))
}

#[async_trait]
impl ComplaintStore for SqliteStore {
    async fn load_complaint(&self, id: &ComplaintId) -> Result<Option<Complaint>> {
        let id = *id;
        self.blocking(move |conn| {
            let parts = conn
                .query_row(
                    &format!("SELECT {COMPLAINT_COLUMNS} FROM complaints WHERE id = ?1"),
                    params![id.as_bytes().as_slice()],
                    row_to_parts,
                )
                .optional()?;
            parts.map(parts_to_complaint).transpose()
        })
        .await
    }

    async fn save_complaint(
        &self,
        complaint: &Complaint,
        expected_version: Option<u64>,
    ) -> Result<SaveResult> {
        let c = complaint.clone();
        self.blocking(move |conn| {
            let id = c.id();
            let Some(expected) = expected_version else {
                let changed = conn.execute(
                    &format!(
                        "INSERT OR IGNORE INTO complaints ({COMPLAINT_COLUMNS})
                         VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9, ?10, ?11, ?12)"
                    ),
                    params![
                        id.as_bytes().as_slice(),
                        c.owner_id().as_bytes().as_slice(),
                        c.hospital_id(),
                        c.category().as_str(),
                        c.department(),
                        c.description(),
                        c.attachment_url(),
                        c.status().to_u8(),
                        c.created_at(),
                        c.updated_at(),
                        c.resolved_at(),
                        c.version(),
                    ],
                )?;
                return Ok(if changed == 1 {
                    SaveResult::Saved
                } else {
                    SaveResult::AlreadyExists
                });
            };

            let tx = conn.transaction()?;
            let changed = tx.execute(
                "UPDATE complaints
                 SET category = ?2, department = ?3, description = ?4, attachment_url = ?5,
                     status = ?6, updated_at = ?7, resolved_at = ?8, version = ?9
                 WHERE id = ?1 AND version = ?10",
                params![
                    id.as_bytes().as_slice(),
                    c.category().as_str(),
                    c.department(),
                    c.description(),
                    c.attachment_url(),
                    c.status().to_u8(),
                    c.updated_at(),
                    c.resolved_at(),
                    c.version(),
                    expected,
                ],
            )?;

            let result = if changed == 1 {
                SaveResult::Saved
            } else {
                let actual: Option<u64> = tx
                    .query_row(
                        "SELECT version FROM complaints WHERE id = ?1",
                        params![id.as_bytes().as_slice()],
                        |row| row.get(0),
                    )
                    .optional()?;
                SaveResult::VersionConflict { actual }
            };
            tx.commit()?;
            Ok(result)
        })
        .await
    }

    async fn list_complaints(&self, filter: &ComplaintFilter) -> Result<Vec<Complaint>> {
        let filter = *filter;
        self.blocking(move |conn| {
            let mut stmt = conn.prepare(&format!(
                "SELECT {COMPLAINT_COLUMNS} FROM complaints
                 WHERE (?1 IS NULL OR owner_id = ?1) AND (?2 IS NULL OR status = ?2)
                 ORDER BY created_at DESC, id DESC"
            ))?;
            let owner = filter.owner.map(|o| o.as_bytes().to_vec());
            let status = filter.status.map(ComplaintStatus::to_u8);

            let parts = stmt
                .query_map(params![owner, status], row_to_parts)?
                .collect::<rusqlite::Result<Vec<_>>>()?;
            parts.into_iter().map(parts_to_complaint).collect()
        })
        .await
    }

    async fn delete_complaint(&self, id: &ComplaintId) -> Result<bool> {
        let id = *id;
        self.blocking(move |conn| {
            let tx = conn.transaction()?;
            tx.execute(
                "DELETE FROM comments WHERE complaint_id = ?1",
                params![id.as_bytes().as_slice()],
            )?;
            let removed = tx.execute(
                "DELETE FROM complaints WHERE id = ?1",
                params![id.as_bytes().as_slice()],
            )?;
            tx.commit()?;
            Ok(removed > 0)
        })
        .await
    }

    async fn load_comments_for(&self, complaint_id: &ComplaintId) -> Result<Vec<Comment>> {
        let complaint_id = *complaint_id;
        self.blocking(move |conn| {
            let mut stmt = conn.prepare(
                "SELECT id, complaint_id, author_id, text, created_at, seq FROM comments
                 WHERE complaint_id = ?1
                 ORDER BY created_at ASC, seq ASC",
            )?;
            let comments = stmt
                .query_map(params![complaint_id.as_bytes().as_slice()], row_to_comment)?
                .collect::<rusqlite::Result<Vec<_>>>()?;
            Ok(comments)
        })
        .await
    }

    async fn append_comment(&self, comment: &Comment) -> Result<AppendResult> {
        let mut comment = comment.clone();
        self.blocking(move |conn| {
            let tx = conn.transaction()?;
            let thread = comment.complaint_id.as_bytes().to_vec();

            let exists: Option<i64> = tx
                .query_row(
                    "SELECT 1 FROM complaints WHERE id = ?1",
                    params![thread],
                    |row| row.get(0),
                )
                .optional()?;
            if exists.is_none() {
                return Ok(AppendResult::ComplaintMissing);
            }

            comment.seq = tx.query_row(
                "SELECT COALESCE(MAX(seq), 0) + 1 FROM comments WHERE complaint_id = ?1",
                params![thread],
                |row| row.get(0),
            )?;

            tx.execute(
                "INSERT INTO comments (id, complaint_id, author_id, text, created_at, seq)
                 VALUES (?1, ?2, ?3, ?4, ?5, ?6)",
                params![
                    comment.id.as_bytes().as_slice(),
                    thread,
                    comment.author_id.as_bytes().as_slice(),
                    comment.text,
                    comment.created_at,
                    comment.seq,
                ],
            )?;
            tx.commit()?;

            Ok(AppendResult::Appended(comment))
        })
        .await
    }
}

#[async_trait]
impl UserStore for SqliteStore {
    async fn insert_user(&self, user: &User, credential_hash: &str) -> Result<InsertUserResult> {
        let user = user.clone();
        let credential_hash = credential_hash.to_string();
        self.blocking(move |conn| {
            let changed = conn.execute(
                "INSERT OR IGNORE INTO users
                 (id, username, credential_hash, role, language, is_anonymous, active, created_at)
                 VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8)",
                params![
                    user.id.as_bytes().as_slice(),
                    user.username,
                    credential_hash,
                    user.role.to_u8(),
                    user.profile.language,
                    user.profile.is_anonymous,
                    user.active,
                    user.created_at,
                ],
            )?;
            Ok(if changed == 1 {
                InsertUserResult::Inserted
            } else {
                InsertUserResult::DuplicateUsername
            })
        })
        .await
    }

    async fn get_user(&self, id: &UserId) -> Result<Option<User>> {
        let id = *id;
        self.blocking(move |conn| {
            Ok(conn
                .query_row(
                    &format!("SELECT {USER_COLUMNS} FROM users WHERE id = ?1"),
                    params![id.as_bytes().as_slice()],
                    row_to_user,
                )
                .optional()?)
        })
        .await
    }

    async fn find_credentials(&self, username: &str) -> Result<Option<(User, String)>> {
        let username = username.to_string();
        self.blocking(move |conn| {
            Ok(conn
                .query_row(
                    &format!("SELECT {USER_COLUMNS}, credential_hash FROM users WHERE username = ?1"),
                    params![username],
                    |row| Ok((row_to_user(row)?, row.get("credential_hash")?)),
                )
                .optional()?)
        })
        .await
    }

    async fn set_role(&self, id: &UserId, role: Role) -> Result<Option<User>> {
        let id = *id;
        self.blocking(move |conn| set_user_column(conn, &id, "role", &role.to_u8()))
            .await
    }

    async fn set_active(&self, id: &UserId, active: bool) -> Result<Option<User>> {
        let id = *id;
        self.blocking(move |conn| set_user_column(conn, &id, "active", &active))
            .await
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use hcms_core::NewComplaint;

    fn complaint(owner: UserId, now: i64) -> Complaint {
        let new = NewComplaint::new(12, "no interpreter available")
            .category(ComplaintCategory::Request)
            .department("radiology");
        Complaint::open(owner, new, now, 4000).unwrap()
    }

    #[tokio::test]
    async fn test_sqlite_complaint_roundtrip() {
        let store = SqliteStore::open_memory().unwrap();
        let c = complaint(UserId::new(), 1_000);

        assert_eq!(store.save_complaint(&c, None).await.unwrap(), SaveResult::Saved);
        assert_eq!(
            store.save_complaint(&c, None).await.unwrap(),
            SaveResult::AlreadyExists
        );

        let loaded = store.load_complaint(&c.id()).await.unwrap().unwrap();
        assert_eq!(loaded, c);
        assert_eq!(loaded.department(), Some("radiology"));
        assert!(store
            .load_complaint(&ComplaintId::new())
            .await
            .unwrap()
            .is_none());
    }

    #[tokio::test]
    async fn test_sqlite_compare_and_swap() {
        let store = SqliteStore::open_memory().unwrap();
        let c = complaint(UserId::new(), 1_000);
        store.save_complaint(&c, None).await.unwrap();

        let reviewed = c.transition(ComplaintStatus::InReview, 1_500).unwrap();
        assert_eq!(
            store.save_complaint(&reviewed, Some(1)).await.unwrap(),
            SaveResult::Saved
        );

        let stale = c.transition(ComplaintStatus::InReview, 1_600).unwrap();
        assert_eq!(
            store.save_complaint(&stale, Some(1)).await.unwrap(),
            SaveResult::VersionConflict { actual: Some(2) }
        );

        let ghost = complaint(UserId::new(), 0);
        assert_eq!(
            store.save_complaint(&ghost, Some(1)).await.unwrap(),
            SaveResult::VersionConflict { actual: None }
        );

        let solved = reviewed.transition(ComplaintStatus::Solved, 2_000).unwrap();
        store.save_complaint(&solved, Some(2)).await.unwrap();
        let loaded = store.load_complaint(&c.id()).await.unwrap().unwrap();
        assert_eq!(loaded.status(), ComplaintStatus::Solved);
        assert_eq!(loaded.resolved_at(), Some(2_000));
        assert_eq!(loaded.version(), 3);
    }

    #[tokio::test(flavor = "multi_thread", worker_threads = 4)]
    async fn test_sqlite_racing_writers_one_wins() {
        let store = Arc::new(SqliteStore::open_memory().unwrap());
        let c = complaint(UserId::new(), 0);
        store.save_complaint(&c, None).await.unwrap();

        let mut handles = Vec::new();
        for i in 0..8 {
            let store = store.clone();
            let next = c.transition(ComplaintStatus::InReview, 10 + i).unwrap();
            handles.push(tokio::spawn(async move {
                store.save_complaint(&next, Some(1)).await.unwrap()
            }));
        }

        let mut saved = 0;
        for handle in handles {
            if handle.await.unwrap() == SaveResult::Saved {
                saved += 1;
            }
        }
        assert_eq!(saved, 1);
    }

    #[tokio::test]
    async fn test_sqlite_list_filters_and_orders() {
        let store = SqliteStore::open_memory().unwrap();
        let alice = UserId::new();
        let bob = UserId::new();

        let a1 = complaint(alice, 100);
        let a2 = complaint(alice, 300);
        let b1 = complaint(bob, 200);
        for c in [&a1, &a2, &b1] {
            store.save_complaint(c, None).await.unwrap();
        }
        let a1_review = a1.transition(ComplaintStatus::InReview, 400).unwrap();
        store.save_complaint(&a1_review, Some(1)).await.unwrap();

        let all = store.list_complaints(&ComplaintFilter::all()).await.unwrap();
        let ids: Vec<_> = all.iter().map(Complaint::id).collect();
        assert_eq!(ids, vec![a2.id(), b1.id(), a1.id()]);

        let mine = store
            .list_complaints(&ComplaintFilter::owned_by(alice))
            .await
            .unwrap();
        assert_eq!(mine.len(), 2);

        let in_review = store
            .list_complaints(&ComplaintFilter::all().with_status(Some(ComplaintStatus::InReview)))
            .await
            .unwrap();
        assert_eq!(in_review.len(), 1);
        assert_eq!(in_review[0].id(), a1.id());
    }

    #[tokio::test]
    async fn test_sqlite_comments_and_cascade() {
        let store = SqliteStore::open_memory().unwrap();
        let owner = UserId::new();
        let c = complaint(owner, 0);
        store.save_complaint(&c, None).await.unwrap();

        for text in ["one", "two"] {
            let draft = Comment::draft(c.id(), owner, text, 50, 100).unwrap();
            assert!(matches!(
                store.append_comment(&draft).await.unwrap(),
                AppendResult::Appended(_)
            ));
        }

        let thread = store.load_comments_for(&c.id()).await.unwrap();
        assert_eq!(thread.len(), 2);
        assert_eq!((thread[0].seq, thread[0].text.as_str()), (1, "one"));
        assert_eq!((thread[1].seq, thread[1].text.as_str()), (2, "two"));

        assert!(store.delete_complaint(&c.id()).await.unwrap());
        assert!(!store.delete_complaint(&c.id()).await.unwrap());
        assert!(store.load_comments_for(&c.id()).await.unwrap().is_empty());

        let orphan = Comment::draft(c.id(), owner, "late", 60, 100).unwrap();
        assert_eq!(
            store.append_comment(&orphan).await.unwrap(),
            AppendResult::ComplaintMissing
        );
    }

    #[tokio::test]
    async fn test_sqlite_users() {
        let store = SqliteStore::open_memory().unwrap();
        let profile = UserProfile {
            language: Some("ar".into()),
            is_anonymous: true,
        };
        let user = User::new("layla".into(), Role::Citizen, profile, 7);

        assert_eq!(
            store.insert_user(&user, "$argon2id$stub").await.unwrap(),
            InsertUserResult::Inserted
        );
        let twin = User::new("layla".into(), Role::Admin, UserProfile::default(), 8);
        assert_eq!(
            store.insert_user(&twin, "other").await.unwrap(),
            InsertUserResult::DuplicateUsername
        );

        let (found, hash) = store.find_credentials("layla").await.unwrap().unwrap();
        assert_eq!(found, user);
        assert_eq!(hash, "$argon2id$stub");
        assert!(store.find_credentials("nobody").await.unwrap().is_none());

        let promoted = store.set_role(&user.id, Role::Staff).await.unwrap().unwrap();
        assert_eq!(promoted.role, Role::Staff);
        assert_eq!(promoted.profile.language.as_deref(), Some("ar"));

        let deactivated = store.set_active(&user.id, false).await.unwrap().unwrap();
        assert!(!deactivated.active);
        assert_eq!(deactivated.role, Role::Staff);
        assert!(!store.get_user(&user.id).await.unwrap().unwrap().active);
        assert!(store.set_active(&UserId::new(), false).await.unwrap().is_none());
    }

    #[tokio::test]
    async fn test_sqlite_persists_across_reopen() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("hcms.db");
        let c = complaint(UserId::new(), 5);

        {
            let store = SqliteStore::open(&path).unwrap();
            store.save_complaint(&c, None).await.unwrap();
        }

        let store = SqliteStore::open(&path).unwrap();
        let loaded = store.load_complaint(&c.id()).await.unwrap().unwrap();
        assert_eq!(loaded, c);
    }
}
