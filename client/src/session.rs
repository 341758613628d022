//! Session store: the single owner of the signed-in credential and identity.
//!
//! The session survives restarts through [`DurableStorage`]. Both halves are
//! persisted as one record, so a crash can never leave a credential without
//! its identity or the other way round.

use crate::error::Result;
use crate::storage::DurableStorage;
use crate::types::{Credential, Identity, Role};
use serde::{Deserialize, Serialize};
use std::sync::{Arc, PoisonError, RwLock};

/// Storage key of the persisted session record.
pub const SESSION_KEY: &str = "session";

/// Snapshot of the session.
///
/// The credential and the identity are either both present or both absent;
/// the constructors are the only way to build one.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct Session {
    signed_in: Option<(Credential, Identity)>,
}

impl Session {
    /// No one is signed in.
    #[must_use]
    pub const fn anonymous() -> Self {
        Self { signed_in: None }
    }

    /// A signed-in user.
    #[must_use]
    pub const fn authenticated(credential: Credential, identity: Identity) -> Self {
        Self {
            signed_in: Some((credential, identity)),
        }
    }

    /// True iff a credential is held.
    #[must_use]
    pub const fn is_authenticated(&self) -> bool {
        self.signed_in.is_some()
    }

    /// True iff signed in with exactly `required`; never fails.
    #[must_use]
    pub fn has_role(&self, required: Role) -> bool {
        self.identity().is_some_and(|identity| identity.role == required)
    }

    /// The bearer credential, if signed in.
    #[must_use]
    pub fn credential(&self) -> Option<&Credential> {
        self.signed_in.as_ref().map(|(credential, _)| credential)
    }

    /// The user profile, if signed in.
    #[must_use]
    pub fn identity(&self) -> Option<&Identity> {
        self.signed_in.as_ref().map(|(_, identity)| identity)
    }
}

#[derive(Serialize, Deserialize)]
struct PersistedSession {
    credential: Credential,
    identity: Identity,
}

struct Inner {
    session: RwLock<Session>,
    storage: Arc<dyn DurableStorage>,
}

/// Shared handle to the process-wide session.
///
/// Cloning is cheap; every clone sees the same session. Only this type
/// writes session state.
#[derive(Clone)]
pub struct SessionStore {
    inner: Arc<Inner>,
}

impl std::fmt::Debug for SessionStore {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("SessionStore")
            .field("session", &self.snapshot())
            .finish_non_exhaustive()
    }
}

impl SessionStore {
    /// Rebuild the session from durable storage.
    ///
    /// Must run before the first guarded navigation. Unreadable or malformed
    /// records are discarded and the session starts anonymous.
    pub fn restore(storage: Arc<dyn DurableStorage>) -> Self {
        let session = match storage.get(SESSION_KEY) {
            Ok(Some(raw)) => match serde_json::from_str::<PersistedSession>(&raw) {
                Ok(record) if !record.credential.is_blank() => {
                    tracing::info!(role = %record.identity.role, "Restored persisted session");
                    Session::authenticated(record.credential, record.identity)
                },
                Ok(_) | Err(_) => {
                    tracing::warn!("Discarding malformed persisted session");
                    if let Err(error) = storage.remove(SESSION_KEY) {
                        tracing::warn!(%error, "Failed to remove malformed session record");
                    }
                    Session::anonymous()
                },
            },
            Ok(None) => Session::anonymous(),
            Err(error) => {
                tracing::warn!(%error, "Could not read persisted session, starting signed out");
                Session::anonymous()
            },
        };

        Self {
            inner: Arc::new(Inner {
                session: RwLock::new(session),
                storage,
            }),
        }
    }

    /// Sign in: persist first, then update memory.
    ///
    /// The token is not inspected; the server decides whether it is valid.
    ///
    /// # Errors
    ///
    /// Returns [`crate::ClientError::Storage`] if the record cannot be
    /// persisted; the in-memory session is then left unchanged.
    pub fn login(&self, credential: Credential, identity: Identity) -> Result<()> {
        let record = PersistedSession { credential, identity };
        let raw = serde_json::to_string(&record)?;
        self.inner.storage.set(SESSION_KEY, &raw)?;

        tracing::info!(role = %record.identity.role, "Session established");
        *self.write() = Session::authenticated(record.credential, record.identity);
        Ok(())
    }

    /// Sign out. Always clears memory and is safe to call repeatedly.
    pub fn logout(&self) {
        self.clear();
        tracing::info!("Session cleared");
    }

    /// Drop the session because the server stopped accepting it.
    pub fn invalidate(&self, reason: &str) {
        tracing::warn!(reason, "Session invalidated");
        self.clear();
    }

    /// Invalidate only if `credential` is still the active one.
    ///
    /// A rejection that arrives after the user already signed in again with
    /// a different credential leaves the new session alone. Returns whether
    /// the session was cleared.
    pub fn invalidate_credential(&self, credential: &Credential, reason: &str) -> bool {
        let is_current = self.read().credential() == Some(credential);
        if is_current {
            self.invalidate(reason);
        } else {
            tracing::debug!(reason, "Ignoring rejection of a credential that is no longer active");
        }
        is_current
    }

    /// True iff a credential is held.
    #[must_use]
    pub fn is_authenticated(&self) -> bool {
        self.read().is_authenticated()
    }

    /// True iff the signed-in identity has exactly `required`.
    #[must_use]
    pub fn has_role(&self, required: Role) -> bool {
        self.read().has_role(required)
    }

    /// Copy of the current session.
    #[must_use]
    pub fn snapshot(&self) -> Session {
        self.read().clone()
    }

    /// Current credential.
    #[must_use]
    pub fn credential(&self) -> Option<Credential> {
        self.read().credential().cloned()
    }

    /// Current identity.
    #[must_use]
    pub fn identity(&self) -> Option<Identity> {
        self.read().identity().cloned()
    }

    fn clear(&self) {
        if let Err(error) = self.inner.storage.remove(SESSION_KEY) {
            tracing::warn!(%error, "Failed to clear persisted session");
        }
        *self.write() = Session::anonymous();
    }

    fn read(&self) -> std::sync::RwLockReadGuard<'_, Session> {
        self.inner.session.read().unwrap_or_else(PoisonError::into_inner)
    }

    fn write(&self) -> std::sync::RwLockWriteGuard<'_, Session> {
        self.inner.session.write().unwrap_or_else(PoisonError::into_inner)
    }
}

#[cfg(all(test, feature = "test-utils"))]
mod tests {
    use super::*;
    use crate::error::ClientError;
    use crate::mocks::MemoryStorage;

    fn customer() -> Identity {
        Identity::new(Role::Customer, "Ana").with_email("a@b.com")
    }

    #[test]
    fn login_persists_and_restore_recovers() {
        let storage = Arc::new(MemoryStorage::new());
        let store = SessionStore::restore(storage.clone());
        assert!(!store.is_authenticated());

        assert!(store.login(Credential::new("T1"), customer()).is_ok());
        assert!(store.is_authenticated());
        assert!(store.has_role(Role::Customer));
        assert!(!store.has_role(Role::Admin));

        let reloaded = SessionStore::restore(storage);
        assert_eq!(reloaded.snapshot(), store.snapshot());
        assert_eq!(reloaded.credential().map(|c| c.expose().to_string()), Some("T1".to_string()));
    }

    #[test]
    fn logout_is_idempotent_and_clears_storage() {
        let storage = Arc::new(MemoryStorage::new());
        let store = SessionStore::restore(storage.clone());
        assert!(store.login(Credential::new("T1"), customer()).is_ok());

        store.logout();
        store.logout();

        assert!(!store.is_authenticated());
        assert!(store.identity().is_none());
        assert_eq!(storage.get(SESSION_KEY), Ok(None));
    }

    #[test]
    fn failed_persist_leaves_memory_unchanged() {
        let storage = Arc::new(MemoryStorage::new());
        let store = SessionStore::restore(storage.clone());
        storage.fail_writes(true);

        let result = store.login(Credential::new("T1"), customer());
        assert!(matches!(result, Err(ClientError::Storage { .. })));
        assert!(!store.is_authenticated());
    }

    #[test]
    fn logout_clears_memory_even_if_storage_fails() {
        let storage = Arc::new(MemoryStorage::new());
        let store = SessionStore::restore(storage.clone());
        assert!(store.login(Credential::new("T1"), customer()).is_ok());

        storage.fail_writes(true);
        store.logout();
        assert!(!store.is_authenticated());
    }

    #[test]
    fn malformed_record_is_discarded() {
        let storage = Arc::new(MemoryStorage::new());
        assert!(storage.set(SESSION_KEY, "{not json").is_ok());

        let store = SessionStore::restore(storage.clone());
        assert!(!store.is_authenticated());
        assert_eq!(storage.get(SESSION_KEY), Ok(None));
    }

    #[test]
    fn stale_rejection_does_not_clear_new_session() {
        let storage = Arc::new(MemoryStorage::new());
        let store = SessionStore::restore(storage);
        assert!(store.login(Credential::new("OLD"), customer()).is_ok());
        assert!(store.login(Credential::new("NEW"), customer()).is_ok());

        assert!(!store.invalidate_credential(&Credential::new("OLD"), "401"));
        assert!(store.is_authenticated());

        assert!(store.invalidate_credential(&Credential::new("NEW"), "401"));
        assert!(!store.is_authenticated());
    }

    #[test]
    fn anonymous_session_has_no_role() {
        let session = Session::anonymous();
        for role in [Role::Guest, Role::Customer, Role::Admin] {
            assert!(!session.has_role(role));
        }
    }
}
