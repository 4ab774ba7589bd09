//! Tracks the authenticated user for the running process, mirrored into the
//! store so it survives restarts.

use tracing::{debug, info, warn};

use crate::collection::Collection;
use crate::domain::User;
use crate::error::PersistenceWriteFailure;
use crate::store::{self, Store, Table};

/// Holds only the current user's id. The user record itself is resolved from
/// the live collection on every read, so profile updates are seen at once.
#[derive(Debug, Default)]
pub struct SessionManager {
    current: Option<String>,
}

impl SessionManager {
    /// Restores the mirrored session. An id that no longer resolves to a user
    /// yields an empty session.
    pub async fn restore(store: &dyn Store, users: &Collection<User>) -> Self {
        let stored: Option<String> = store::load_or(store, Table::Session, None).await;
        match stored {
            Some(id) if users.get(&id).is_some() => {
                info!(user_id = %id, "Session restored");
                Self { current: Some(id) }
            }
            Some(id) => {
                warn!(user_id = %id, "Stored session refers to an unknown user, ignoring");
                Self::default()
            }
            None => {
                debug!("No stored session");
                Self::default()
            }
        }
    }

    pub async fn set(
        &mut self,
        store: &dyn Store,
        user_id: &str,
        attempts: u32,
    ) -> Result<(), PersistenceWriteFailure> {
        self.current = Some(user_id.to_string());
        store::save(store, Table::Session, user_id, attempts).await
    }

    pub async fn clear(&mut self, store: &dyn Store, attempts: u32) -> Result<(), PersistenceWriteFailure> {
        self.current = None;
        store::remove(store, Table::Session, attempts).await
    }

    pub fn current_id(&self) -> Option<&str> {
        self.current.as_deref()
    }

    pub fn current<'a>(&self, users: &'a Collection<User>) -> Option<&'a User> {
        self.current.as_ref().and_then(|id| users.get(id))
    }

    pub fn is_current(&self, user_id: &str) -> bool {
        self.current_id() == Some(user_id)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::{BloodGroup, Registration};
    use crate::store::MemoryStore;

    fn users() -> Collection<User> {
        let alice = User::from_registration(
            "user_a".to_string(),
            Registration::donor("Alice", "alice@college.edu", BloodGroup::APos),
        );
        Collection::new(vec![alice], || "unused".to_string())
    }

    #[tokio::test]
    async fn test_restore_without_saved_session_is_empty() {
        let store = MemoryStore::new();
        let session = SessionManager::restore(&store, &users()).await;
        assert_eq!(session.current_id(), None);
    }

    #[tokio::test]
    async fn test_set_survives_restart() {
        let store = MemoryStore::new();
        let users = users();

        let mut session = SessionManager::default();
        session.set(&store, "user_a", 1).await.unwrap();

        let restored = SessionManager::restore(&store, &users).await;
        assert_eq!(restored.current(&users).map(|u| u.name.as_str()), Some("Alice"));
    }

    #[tokio::test]
    async fn test_clear_removes_mirror() {
        let store = MemoryStore::new();
        let users = users();

        let mut session = SessionManager::default();
        session.set(&store, "user_a", 1).await.unwrap();
        session.clear(&store, 1).await.unwrap();

        assert_eq!(session.current(&users), None);
        assert_eq!(store.read(Table::Session).await.unwrap(), None);
        assert_eq!(SessionManager::restore(&store, &users).await.current_id(), None);
    }

    #[tokio::test]
    async fn test_stale_session_is_discarded() {
        let store = MemoryStore::new();
        store.write(Table::Session, "\"user_gone\"").await.unwrap();

        let session = SessionManager::restore(&store, &users()).await;
        assert_eq!(session.current_id(), None);
    }
}
