use chrono::{DateTime, Duration, Utc};
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::PathBuf;
use tracing::debug;
use uuid::Uuid;

use crate::domain::User;
use crate::error::{ArchiveError, Result};
use crate::repository::UserRepository;

#[derive(Debug, Clone, PartialEq, Deserialize, Serialize)]
pub struct Session {
    pub user_id: Uuid,
    pub email: String,
    pub issued_at: DateTime<Utc>,
    pub expires_at: DateTime<Utc>,
}

/// The login session persisted in `session.toml`
pub struct Sessions {
    path: PathBuf,
}

impl Sessions {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    /// Start a session for `user`, replacing any previous one
    pub fn start(&self, user: &User, max_age_days: u32) -> Result<Session> {
        let now = Utc::now();
        let session = Session {
            user_id: user.id,
            email: user.email.clone(),
            issued_at: now,
            expires_at: now + Duration::days(i64::from(max_age_days)),
        };
        let content =
            toml::to_string_pretty(&session).map_err(|e| ArchiveError::Store(e.to_string()))?;
        fs::write(&self.path, content)?;
        Ok(session)
    }

    /// The stored session, if any. An unreadable session file counts as no session.
    pub fn current(&self) -> Result<Option<Session>> {
        if !self.path.exists() {
            return Ok(None);
        }
        let content = fs::read_to_string(&self.path)?;
        match toml::from_str(&content) {
            Ok(session) => Ok(Some(session)),
            Err(e) => {
                debug!(error = %e, "ignoring unreadable session file");
                Ok(None)
            }
        }
    }

    /// Gate for protected commands: a live session whose user still exists
    pub fn require(&self, users: &dyn UserRepository) -> Result<Session> {
        let session = self.current()?.ok_or(ArchiveError::NotAuthenticated)?;
        if Utc::now() >= session.expires_at {
            return Err(ArchiveError::SessionExpired);
        }
        if users.find_by_id(session.user_id)?.is_none() {
            return Err(ArchiveError::NotAuthenticated);
        }
        Ok(session)
    }

    /// Remove the session. Returns whether one existed.
    pub fn end(&self) -> Result<bool> {
        if !self.path.exists() {
            return Ok(false);
        }
        fs::remove_file(&self.path)?;
        Ok(true)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::repository::MemoryStore;
    use tempfile::TempDir;

    fn setup() -> (TempDir, Sessions, MemoryStore, User) {
        let dir = TempDir::new().unwrap();
        let sessions = Sessions::new(dir.path().join("session.toml"));
        let store = MemoryStore::new();
        let user = UserRepository::create(&store, "owner@example.com", "hash").unwrap();
        (dir, sessions, store, user)
    }

    #[test]
    fn test_no_session_is_not_authenticated() {
        let (_dir, sessions, store, _) = setup();
        assert!(matches!(
            sessions.require(&store),
            Err(ArchiveError::NotAuthenticated)
        ));
    }

    #[test]
    fn test_started_session_passes_gate() {
        let (_dir, sessions, store, user) = setup();
        sessions.start(&user, 7).unwrap();
        let session = sessions.require(&store).unwrap();
        assert_eq!(session.user_id, user.id);
        assert_eq!(session.email, "owner@example.com");
    }

    #[test]
    fn test_zero_day_session_is_expired() {
        let (_dir, sessions, store, user) = setup();
        sessions.start(&user, 0).unwrap();
        assert!(matches!(
            sessions.require(&store),
            Err(ArchiveError::SessionExpired)
        ));
    }

    #[test]
    fn test_session_for_deleted_user_rejected() {
        let (_dir, sessions, _, user) = setup();
        sessions.start(&user, 7).unwrap();
        let empty = MemoryStore::new();
        assert!(matches!(
            sessions.require(&empty),
            Err(ArchiveError::NotAuthenticated)
        ));
    }

    #[test]
    fn test_end_is_idempotent() {
        let (_dir, sessions, _, user) = setup();
        sessions.start(&user, 7).unwrap();
        assert!(sessions.end().unwrap());
        assert!(!sessions.end().unwrap());
        assert_eq!(sessions.current().unwrap(), None);
    }

    #[test]
    fn test_garbage_session_file_ignored() {
        let (dir, sessions, _, _) = setup();
        fs::write(dir.path().join("session.toml"), "not = [valid").unwrap();
        assert_eq!(sessions.current().unwrap(), None);
    }
}
