use std::collections::BTreeMap;
use std::fmt;
use std::sync::{PoisonError, RwLock};

use serde::{Deserialize, Serialize};
use zeroize::{Zeroize, ZeroizeOnDrop};

use crate::error::AuthError;

/// Identifier of a master-key version
///
/// Monotonically increasing and never reused, even after a purge.
pub type KeyVersion = u32;

/// Opaque master-key material owned by the key ring
///
/// The raw bytes are only reachable from inside the crate; callers hold
/// and pass `KeyMaterial` values without ever seeing the secret. The
/// backing buffer is zeroed when the value is dropped.
#[derive(Clone, Zeroize, ZeroizeOnDrop)]
pub struct KeyMaterial {
    bytes: Vec<u8>,
}

impl KeyMaterial {
    /// Wrap raw secret bytes as key material
    ///
    /// # Errors
    ///
    /// Returns `InvalidKeyMaterial` if the byte string is empty.
    pub fn new(bytes: impl Into<Vec<u8>>) -> Result<Self, AuthError> {
        let bytes = bytes.into();
        if bytes.is_empty() {
            return Err(AuthError::invalid_key_material("key material is empty"));
        }
        Ok(Self { bytes })
    }

    /// Length of the key material in bytes
    pub fn len(&self) -> usize {
        self.bytes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.bytes.is_empty()
    }

    /// Raw secret bytes, visible only inside the crate
    pub(crate) fn expose(&self) -> &[u8] {
        &self.bytes
    }
}

impl fmt::Debug for KeyMaterial {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("KeyMaterial")
            .field("bytes", &format!("[{} bytes redacted]", self.bytes.len()))
            .finish()
    }
}

/// Lifecycle state of a registered key version
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum KeyState {
    /// Registered and usable for new derivations once activated
    Available,
    /// Ineligible for new derivations, still resolvable for verification
    Retired,
}

struct KeyEntry {
    material: KeyMaterial,
    state: KeyState,
}

struct KeyRingState {
    keys: BTreeMap<KeyVersion, KeyEntry>,
    active: Option<KeyVersion>,
    next_version: KeyVersion,
}

/// Registry of every live master-key version
///
/// Exactly one version is active at a time; all others are retained as
/// long as any stored credential references them. Readers always observe
/// a consistent snapshot: lookups take the read lock, and the mutating
/// operations (`add_version`, `activate`, `retire`, `purge`) swap state
/// atomically under the write lock.
///
/// Mutations are expected to come from a single writer: the bootstrap
/// code at process start and the rotation coordinator afterwards. The
/// lock makes concurrent mutation safe regardless, but the calling
/// convention keeps the version history linear.
pub struct KeyRing {
    inner: RwLock<KeyRingState>,
}

impl KeyRing {
    /// Create an empty key ring with no active version
    ///
    /// Version numbering starts at 1.
    pub fn new() -> Self {
        Self {
            inner: RwLock::new(KeyRingState {
                keys: BTreeMap::new(),
                active: None,
                next_version: 1,
            }),
        }
    }

    /// Create a key ring from the bootstrap secret supplied at process start
    ///
    /// Registers `material` under the caller-chosen `version` and makes it
    /// active, equivalent to an initial `add_version` followed by
    /// `activate`. Later versions continue from `version + 1`.
    pub fn bootstrap(version: KeyVersion, material: KeyMaterial) -> Self {
        let mut keys = BTreeMap::new();
        keys.insert(
            version,
            KeyEntry {
                material,
                state: KeyState::Available,
            },
        );
        Self {
            inner: RwLock::new(KeyRingState {
                keys,
                active: Some(version),
                next_version: version.saturating_add(1),
            }),
        }
    }

    /// Resolve a key version to its material
    ///
    /// # Errors
    ///
    /// Returns `UnknownKeyVersion` if the version was never registered or
    /// has been purged. Retired versions resolve normally; credentials
    /// not yet rotated forward still verify against them.
    pub fn resolve(&self, version: KeyVersion) -> Result<KeyMaterial, AuthError> {
        let state = self.inner.read().unwrap_or_else(PoisonError::into_inner);
        state
            .keys
            .get(&version)
            .map(|entry| entry.material.clone())
            .ok_or(AuthError::UnknownKeyVersion { version })
    }

    /// The current active version and its material
    ///
    /// # Errors
    ///
    /// Returns `NoActiveKey` if the ring was never initialized.
    pub fn active(&self) -> Result<(KeyVersion, KeyMaterial), AuthError> {
        let state = self.inner.read().unwrap_or_else(PoisonError::into_inner);
        let version = state.active.ok_or(AuthError::NoActiveKey)?;
        let entry = state
            .keys
            .get(&version)
            .ok_or(AuthError::UnknownKeyVersion { version })?;
        Ok((version, entry.material.clone()))
    }

    /// Register new key material under the next version number
    ///
    /// The new version is NOT made active; cut-over is a separate
    /// `activate` call so a rotation can introduce the key before any
    /// derivation uses it.
    pub fn add_version(&self, material: KeyMaterial) -> KeyVersion {
        let mut state = self.inner.write().unwrap_or_else(PoisonError::into_inner);
        let version = state.next_version;
        state.next_version = version.saturating_add(1);
        state.keys.insert(
            version,
            KeyEntry {
                material,
                state: KeyState::Available,
            },
        );
        version
    }

    /// Atomically switch the active pointer to a previously added version
    ///
    /// Activating a retired version returns it to service.
    ///
    /// # Errors
    ///
    /// Returns `UnknownKeyVersion` if the version was never added or has
    /// been purged.
    pub fn activate(&self, version: KeyVersion) -> Result<(), AuthError> {
        let mut state = self.inner.write().unwrap_or_else(PoisonError::into_inner);
        let entry = state
            .keys
            .get_mut(&version)
            .ok_or(AuthError::UnknownKeyVersion { version })?;
        entry.state = KeyState::Available;
        state.active = Some(version);
        Ok(())
    }

    /// Mark a version ineligible for new derivations
    ///
    /// The version stays resolvable for verification until explicitly
    /// purged. Retiring is idempotent.
    ///
    /// # Errors
    ///
    /// Returns `UnknownKeyVersion` for unregistered/purged versions and
    /// `RetireActiveKey` when asked to retire the active version, which
    /// would strand every new derivation.
    pub fn retire(&self, version: KeyVersion) -> Result<(), AuthError> {
        let mut state = self.inner.write().unwrap_or_else(PoisonError::into_inner);
        if state.active == Some(version) {
            return Err(AuthError::RetireActiveKey { version });
        }
        let entry = state
            .keys
            .get_mut(&version)
            .ok_or(AuthError::UnknownKeyVersion { version })?;
        entry.state = KeyState::Retired;
        Ok(())
    }

    /// Permanently remove a retired version's material
    ///
    /// Administrative operation; nothing in the crate purges
    /// automatically, since a purge strands any credential still
    /// referencing the version. The version number stays burned.
    ///
    /// # Errors
    ///
    /// Returns `UnknownKeyVersion` for unregistered versions and
    /// `PurgeRefused` if the version is active or was never retired.
    pub fn purge(&self, version: KeyVersion) -> Result<(), AuthError> {
        let mut state = self.inner.write().unwrap_or_else(PoisonError::into_inner);
        if state.active == Some(version) {
            return Err(AuthError::PurgeRefused {
                version,
                reason: "version is active".to_string(),
            });
        }
        match state.keys.get(&version) {
            None => return Err(AuthError::UnknownKeyVersion { version }),
            Some(entry) if entry.state != KeyState::Retired => {
                return Err(AuthError::PurgeRefused {
                    version,
                    reason: "version was never retired".to_string(),
                });
            }
            Some(_) => {}
        }
        state.keys.remove(&version);
        Ok(())
    }

    /// Snapshot of every registered version and its state
    pub fn versions(&self) -> BTreeMap<KeyVersion, KeyState> {
        let state = self.inner.read().unwrap_or_else(PoisonError::into_inner);
        state
            .keys
            .iter()
            .map(|(version, entry)| (*version, entry.state))
            .collect()
    }

    /// The active version number, if any
    pub fn active_version(&self) -> Option<KeyVersion> {
        let state = self.inner.read().unwrap_or_else(PoisonError::into_inner);
        state.active
    }
}

impl Default for KeyRing {
    fn default() -> Self {
        Self::new()
    }
}

impl fmt::Debug for KeyRing {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let state = self.inner.read().unwrap_or_else(PoisonError::into_inner);
        f.debug_struct("KeyRing")
            .field("versions", &state.keys.len())
            .field("active", &state.active)
            .finish()
    }
}
