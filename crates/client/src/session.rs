//! Process-wide session state.
//!
//! Holds the signed-in user and bearer token, mirrored to [`LocalStorage`]
//! so a later run starts signed in. The token's expiry is never checked here;
//! an expired token is only discovered when the backend answers 401.

use std::sync::Arc;

use scuffmart_core::{User, UserId};
use secrecy::SecretString;
use tokio::sync::watch;

use crate::storage::{LocalStorage, StorageError, keys};

/// The signed-in identity.
#[derive(Debug, Clone)]
pub struct Session {
    pub user: User,
    pub token: SecretString,
}

/// Shared session store.
///
/// Cheap to clone; all clones share one session. Persistence failures are
/// logged and never block the in-memory update.
#[derive(Debug, Clone)]
pub struct SessionStore {
    inner: Arc<SessionStoreInner>,
}

#[derive(Debug)]
struct SessionStoreInner {
    state: watch::Sender<Option<Session>>,
    storage: LocalStorage,
}

impl SessionStore {
    /// Open the store, seeding it from `storage` when both a token and a user
    /// were saved.
    #[must_use]
    pub fn open(storage: LocalStorage) -> Self {
        let seeded = match load(&storage) {
            Ok(session) => session,
            Err(e) => {
                tracing::warn!(
                    error = %e,
                    path = %storage.path().display(),
                    "Ignoring unreadable stored session"
                );
                None
            }
        };
        if let Some(session) = &seeded {
            tracing::debug!(user_id = %session.user.id, "Session restored from storage");
        }

        let (state, _) = watch::channel(seeded);
        Self {
            inner: Arc::new(SessionStoreInner { state, storage }),
        }
    }

    /// Current session, if any.
    #[must_use]
    pub fn current(&self) -> Option<Session> {
        self.inner.state.borrow().clone()
    }

    /// Signed-in user, if any.
    #[must_use]
    pub fn user(&self) -> Option<User> {
        self.inner.state.borrow().as_ref().map(|s| s.user.clone())
    }

    /// Identity of the signed-in user, if any.
    #[must_use]
    pub fn user_id(&self) -> Option<UserId> {
        self.inner.state.borrow().as_ref().map(|s| s.user.id)
    }

    /// Bearer token, if any.
    #[must_use]
    pub fn token(&self) -> Option<SecretString> {
        self.inner.state.borrow().as_ref().map(|s| s.token.clone())
    }

    /// Whether someone is signed in.
    #[must_use]
    pub fn is_authenticated(&self) -> bool {
        self.inner.state.borrow().is_some()
    }

    /// Whether the signed-in user is an admin.
    #[must_use]
    pub fn is_admin(&self) -> bool {
        self.inner
            .state
            .borrow()
            .as_ref()
            .is_some_and(|s| s.user.is_admin())
    }

    /// Install a new session in memory and in storage.
    pub fn establish(&self, user: User, token: SecretString) {
        if let Err(e) = persist(&self.inner.storage, &user, &token) {
            tracing::warn!(error = %e, "Failed to persist session");
        }
        tracing::info!(user_id = %user.id, role = %user.role, "Session established");
        self.inner.state.send_replace(Some(Session { user, token }));
    }

    /// Replace the stored user, keeping the token. No-op when signed out.
    pub fn replace_user(&self, user: User) {
        let storage = &self.inner.storage;
        self.inner.state.send_if_modified(|state| match state {
            Some(session) => {
                if let Err(e) = storage.set(keys::USER, &user) {
                    tracing::warn!(error = %e, "Failed to persist refreshed user");
                }
                session.user = user;
                true
            }
            None => false,
        });
    }

    /// Forget the session in memory and in storage.
    pub fn clear(&self) {
        if let Err(e) = self.inner.storage.remove(&[keys::TOKEN, keys::USER]) {
            tracing::warn!(error = %e, "Failed to clear stored session");
        }
        let previous = self.inner.state.send_replace(None);
        if let Some(session) = previous {
            tracing::info!(user_id = %session.user.id, "Session cleared");
        }
    }

    /// Watch session changes.
    #[must_use]
    pub fn subscribe(&self) -> watch::Receiver<Option<Session>> {
        self.inner.state.subscribe()
    }
}

fn load(storage: &LocalStorage) -> Result<Option<Session>, StorageError> {
    let token = storage.get::<String>(keys::TOKEN)?;
    let user = storage.get::<User>(keys::USER)?;
    Ok(match (token, user) {
        (Some(token), Some(user)) => Some(Session {
            user,
            token: SecretString::from(token),
        }),
        _ => None,
    })
}

fn persist(storage: &LocalStorage, user: &User, token: &SecretString) -> Result<(), StorageError> {
    use secrecy::ExposeSecret;

    storage.set(keys::TOKEN, &token.expose_secret())?;
    storage.set(keys::USER, user)
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use scuffmart_core::{Email, Role};
    use secrecy::ExposeSecret;

    use super::*;

    fn temp_storage(name: &str) -> LocalStorage {
        let dir = std::env::temp_dir().join(format!(
            "scuffmart-session-{name}-{}",
            std::process::id()
        ));
        let _ = std::fs::remove_dir_all(&dir);
        LocalStorage::new(dir.join("storage.json"))
    }

    fn user(id: i32, role: Role) -> User {
        User {
            id: UserId::new(id),
            name: "Ana".to_owned(),
            email: Email::parse("ana@example.com").unwrap(),
            role,
        }
    }

    #[test]
    fn test_establish_persists_and_reseeds() {
        let storage = temp_storage("reseed");
        let store = SessionStore::open(storage.clone());
        assert!(!store.is_authenticated());

        store.establish(user(3, Role::Admin), SecretString::from("tok-3"));
        assert!(store.is_admin());

        let reopened = SessionStore::open(storage);
        assert_eq!(reopened.user_id(), Some(UserId::new(3)));
        assert_eq!(reopened.token().unwrap().expose_secret(), "tok-3");
    }

    #[test]
    fn test_clear_removes_storage() {
        let storage = temp_storage("clear");
        let store = SessionStore::open(storage.clone());
        store.establish(user(1, Role::Client), SecretString::from("tok"));
        store.clear();

        assert!(store.current().is_none());
        assert!(SessionStore::open(storage).current().is_none());
    }

    #[test]
    fn test_token_without_user_is_not_a_session() {
        let storage = temp_storage("partial");
        storage.set(keys::TOKEN, &"orphan").unwrap();
        assert!(SessionStore::open(storage).current().is_none());
    }

    #[test]
    fn test_replace_user_keeps_token() {
        let store = SessionStore::open(temp_storage("replace"));
        store.establish(user(1, Role::Client), SecretString::from("tok"));
        let mut renamed = user(1, Role::Client);
        renamed.name = "Ana Maria".to_owned();
        store.replace_user(renamed);

        assert_eq!(store.user().unwrap().name, "Ana Maria");
        assert_eq!(store.token().unwrap().expose_secret(), "tok");
    }

    #[tokio::test]
    async fn test_subscribers_observe_identity_changes() {
        let store = SessionStore::open(temp_storage("watch"));
        let mut rx = store.subscribe();
        store.establish(user(9, Role::Client), SecretString::from("t"));
        rx.changed().await.unwrap();
        assert_eq!(rx.borrow().as_ref().map(|s| s.user.id), Some(UserId::new(9)));
    }
}
