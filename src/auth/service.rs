use std::sync::Arc;

use serde::{Deserialize, Serialize};

use crate::codec::CredentialCodec;
use crate::error::{AuthError, AuthResult};
use crate::keyring::KeyRing;
use crate::store::{Credential, CredentialStore, StoreError};

/// Closed result taxonomy of authentication calls
///
/// Everything a caller can observe from a successful service call is one
/// of these variants; integrity, configuration, and transient storage
/// failures surface as [`AuthError`] instead and are never folded into
/// `InvalidCredentials`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum AuthOutcome {
    /// Registration succeeded
    Registered,
    /// Registration rejected: the username is already taken
    UsernameTaken,
    /// Empty or blank username/password
    InvalidInput,
    /// Login succeeded
    Authenticated,
    /// Login rejected; deliberately silent on whether the username exists
    InvalidCredentials,
    /// Password change succeeded
    PasswordChanged,
}

/// Registration, login, and password-change orchestration
///
/// Holds the key ring, the codec, and the store adapter. All methods
/// take `&self`; the service can be shared across request workers behind
/// an `Arc` and raced freely against an in-flight rotation pass: a login
/// always reads the key version recorded on its own credential, which
/// stays resolvable throughout a rotation.
pub struct AuthService<S: CredentialStore> {
    keyring: Arc<KeyRing>,
    codec: CredentialCodec,
    store: Arc<S>,
}

impl<S: CredentialStore> AuthService<S> {
    pub fn new(keyring: Arc<KeyRing>, codec: CredentialCodec, store: Arc<S>) -> Self {
        Self {
            keyring,
            codec,
            store,
        }
    }

    /// Register a new credential under the active key version
    ///
    /// # Outcomes
    ///
    /// * `InvalidInput`: empty/blank username or empty password
    /// * `UsernameTaken`: the store already holds this username
    /// * `Registered`: success
    ///
    /// # Errors
    ///
    /// `NoActiveKey` if the key ring was never initialized (fatal
    /// misconfiguration, not retried), plus transient storage errors.
    pub fn register(&self, username: &str, password: &str) -> AuthResult<AuthOutcome> {
        if username.trim().is_empty() || password.is_empty() {
            return Ok(AuthOutcome::InvalidInput);
        }

        let (version, key) = self.keyring.active()?;
        let representation = self.codec.derive(password, &key)?;

        match self
            .store
            .put(Credential::new(username, representation, version))
        {
            Ok(()) => {
                log::debug!("registered '{}' under key version {}", username, version);
                Ok(AuthOutcome::Registered)
            }
            Err(StoreError::Conflict) => Ok(AuthOutcome::UsernameTaken),
            Err(e) => Err(e.into()),
        }
    }

    /// Verify a password for a username
    ///
    /// A missing username and a wrong password produce the same
    /// `InvalidCredentials` outcome, and the missing-username path runs a
    /// dummy derivation under the active key so both paths cost a
    /// comparable amount of wall-clock time, denying callers a way to
    /// enumerate usernames by timing.
    ///
    /// # Errors
    ///
    /// `CorruptKeyReference` when the stored record names a key version
    /// the ring cannot resolve, and `MalformedRepresentation` when the
    /// stored bytes are not a valid envelope. Both indicate data
    /// corruption or misconfiguration; they are logged and never
    /// reported as a wrong password.
    pub fn login(&self, username: &str, password: &str) -> AuthResult<AuthOutcome> {
        if username.trim().is_empty() || password.is_empty() {
            return Ok(AuthOutcome::InvalidInput);
        }

        let credential = match self.store.get(username)? {
            Some(credential) => credential,
            None => {
                self.equalize_missing_user(password)?;
                return Ok(AuthOutcome::InvalidCredentials);
            }
        };

        let key = match self.keyring.resolve(credential.key_version) {
            Ok(key) => key,
            Err(AuthError::UnknownKeyVersion { version }) => {
                let err = AuthError::corrupt_key_reference(username, version);
                log::error!("{}", err);
                return Err(err);
            }
            Err(e) => return Err(e),
        };

        match self.codec.verify(password, &credential.representation, &key) {
            Ok(true) => Ok(AuthOutcome::Authenticated),
            Ok(false) => Ok(AuthOutcome::InvalidCredentials),
            Err(e) if e.is_integrity() => {
                log::error!("stored representation for '{}' is corrupt: {}", username, e);
                Err(e)
            }
            Err(e) => Err(e),
        }
    }

    /// Change a password, re-deriving under the current active key
    ///
    /// Follows the same derive-under-active-key pattern as registration:
    /// whatever version the old credential was bound to, the replacement
    /// is sealed under the active version.
    pub fn change_password(
        &self,
        username: &str,
        old_password: &str,
        new_password: &str,
    ) -> AuthResult<AuthOutcome> {
        if username.trim().is_empty() || old_password.is_empty() || new_password.is_empty() {
            return Ok(AuthOutcome::InvalidInput);
        }

        match self.login(username, old_password)? {
            AuthOutcome::Authenticated => {}
            other => return Ok(other),
        }

        let (version, key) = self.keyring.active()?;
        let representation = self.codec.derive(new_password, &key)?;
        self.store
            .update(Credential::new(username, representation, version))?;

        log::debug!(
            "password changed for '{}', now under key version {}",
            username,
            version
        );
        Ok(AuthOutcome::PasswordChanged)
    }

    /// Burn a derivation's worth of time when the username does not exist
    ///
    /// Keeps the not-found path and the wrong-password path (which pays
    /// for a real verification) within the same cost envelope.
    fn equalize_missing_user(&self, password: &str) -> AuthResult<()> {
        let (_, key) = self.keyring.active()?;
        let _ = self.codec.derive(password, &key)?;
        Ok(())
    }
}
