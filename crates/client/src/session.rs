//! Authenticated session persistence and role-based navigation.
//!
//! The credential and the profile live under two storage keys and are always
//! written and cleared as a pair. [`SessionStore::clear`] is the only
//! teardown path: it runs the teardown hook, wipes both halves and sends the
//! user to login.
//!
//! Reads fail open: an unreadable or corrupt slot is treated as "no session"
//! and logged, so a storage glitch never blocks navigation.

use std::fmt;
use std::sync::Arc;

use secrecy::{ExposeSecret, SecretString};
use serde::{Deserialize, Serialize};
use tracing::{debug, info, warn};

use fastbite_core::models::AuthResponse;
use fastbite_core::{Email, Role, UserId};

use crate::error::{clear_sentry_user, set_sentry_user};
use crate::navigation::{Navigator, Route};
use crate::storage::{KeyValueStore, StorageError, keys};

/// Opaque bearer token authenticating the session.
#[derive(Clone)]
pub struct Credential(SecretString);

impl Credential {
    /// Wrap a raw token.
    #[must_use]
    pub fn new(token: impl Into<String>) -> Self {
        Self(SecretString::from(token.into()))
    }

    /// Value for the `Authorization` header.
    #[must_use]
    pub fn bearer(&self) -> String {
        format!("Bearer {}", self.0.expose_secret())
    }

    /// The raw token.
    #[must_use]
    pub fn expose(&self) -> &str {
        self.0.expose_secret()
    }
}

impl fmt::Debug for Credential {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("Credential([REDACTED])")
    }
}

/// Normalized identity of the signed-in user.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Profile {
    pub id: UserId,
    pub email: Email,
    pub name: String,
    pub role: Role,
}

impl From<&AuthResponse> for Profile {
    fn from(auth: &AuthResponse) -> Self {
        Self {
            id: auth.user_id.clone(),
            email: auth.email.clone(),
            name: auth.name.clone(),
            role: auth.role.clone(),
        }
    }
}

/// Callback run at the start of every session teardown.
pub type TeardownHook = Arc<dyn Fn() + Send + Sync>;

/// Owner of the persisted credential and profile.
///
/// Cheap to clone; clones share the same storage, navigator and hook.
#[derive(Clone)]
pub struct SessionStore {
    store: Arc<dyn KeyValueStore>,
    navigator: Arc<dyn Navigator>,
    teardown: Option<TeardownHook>,
}

impl SessionStore {
    /// Create a session store over `store`, redirecting through `navigator`.
    #[must_use]
    pub fn new(store: Arc<dyn KeyValueStore>, navigator: Arc<dyn Navigator>) -> Self {
        Self {
            store,
            navigator,
            teardown: None,
        }
    }

    /// Run `hook` whenever the session is cleared, whether by sign-out or by
    /// a rejected credential.
    #[must_use]
    pub fn with_teardown(mut self, hook: impl Fn() + Send + Sync + 'static) -> Self {
        self.teardown = Some(Arc::new(hook));
        self
    }

    /// Persist a successful authentication result.
    ///
    /// The profile is written first and the credential second. If the
    /// credential write fails the previous profile is put back (or removed
    /// when there was none), so a failed save leaves the earlier pair intact.
    ///
    /// # Errors
    ///
    /// Returns an error if the current profile cannot be read or either write fails.
    pub fn save(&self, auth: &AuthResponse) -> Result<(), StorageError> {
        let profile = Profile::from(auth);
        let encoded = serde_json::to_string(&profile).map_err(|source| StorageError::Encode {
            key: keys::PROFILE.to_string(),
            source,
        })?;

        let previous = self.store.get(keys::PROFILE)?;
        self.store.set(keys::PROFILE, &encoded)?;
        if let Err(e) = self.store.set(keys::CREDENTIAL, &auth.credential) {
            let rollback = match previous.as_deref() {
                Some(raw) => self.store.set(keys::PROFILE, raw),
                None => self.store.remove(keys::PROFILE),
            };
            if let Err(rollback) = rollback {
                warn!(error = %rollback, "failed to roll back profile after credential write failed");
            }
            return Err(e);
        }

        set_sentry_user(&profile.id, Some(profile.email.as_str()));
        info!(user_id = %profile.id, role = %profile.role, "session saved");
        Ok(())
    }

    /// The stored credential, if any.
    #[must_use]
    pub fn credential(&self) -> Option<Credential> {
        self.read(keys::CREDENTIAL)
            .filter(|token| !token.is_empty())
            .map(Credential::new)
    }

    /// The stored profile, if any.
    #[must_use]
    pub fn profile(&self) -> Option<Profile> {
        let raw = self.read(keys::PROFILE)?;
        match serde_json::from_str(&raw) {
            Ok(profile) => Some(profile),
            Err(e) => {
                warn!(error = %e, "stored profile is corrupt; treating as signed out");
                None
            }
        }
    }

    /// Whether a credential is present.
    #[must_use]
    pub fn is_authenticated(&self) -> bool {
        self.credential().is_some()
    }

    /// Tear the session down and redirect to login.
    ///
    /// Both slots are removed even if the first removal fails, and the
    /// redirect always happens.
    ///
    /// # Errors
    ///
    /// Returns the first storage failure encountered.
    pub fn clear(&self) -> Result<(), StorageError> {
        if let Some(hook) = &self.teardown {
            hook();
        }
        let credential = self.store.remove(keys::CREDENTIAL);
        let profile = self.store.remove(keys::PROFILE);

        clear_sentry_user();
        info!("session cleared");
        self.navigator.navigate(Route::Login);

        credential.and(profile)
    }

    /// Send the user to the landing view for their role.
    ///
    /// Missing profiles and unrecognized roles go to login.
    pub fn redirect_for_role(&self) -> Route {
        let route = self
            .profile()
            .map_or(Route::Login, |profile| Route::landing_for(&profile.role));
        debug!(route = %route, "redirecting for role");
        self.navigator.navigate(route);
        route
    }

    fn read(&self, key: &str) -> Option<String> {
        match self.store.get(key) {
            Ok(value) => value,
            Err(e) => {
                warn!(key, error = %e, "session storage read failed; treating as absent");
                None
            }
        }
    }
}

impl fmt::Debug for SessionStore {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("SessionStore")
            .field("authenticated", &self.is_authenticated())
            .finish_non_exhaustive()
    }
}
