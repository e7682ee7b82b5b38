use std::fmt;

use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::keyring::KeyVersion;

/// One stored credential record, keyed by username
///
/// The representation bytes are only meaningful together with the key
/// material of `key_version`; pairing them with any other version fails
/// verification.
#[derive(Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Credential {
    /// Unique account name
    pub username: String,
    /// Opaque envelope produced by the credential codec
    pub representation: Vec<u8>,
    /// Master-key version the representation was sealed under
    pub key_version: KeyVersion,
}

impl Credential {
    pub fn new(username: impl Into<String>, representation: Vec<u8>, key_version: KeyVersion) -> Self {
        Self {
            username: username.into(),
            representation,
            key_version,
        }
    }
}

impl fmt::Debug for Credential {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Credential")
            .field("username", &self.username)
            .field(
                "representation",
                &format!("[{} bytes redacted]", self.representation.len()),
            )
            .field("key_version", &self.key_version)
            .finish()
    }
}

/// Failures surfaced by a credential store implementation
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum StoreError {
    /// A record with this username already exists (registration uniqueness)
    #[error("a credential with this username already exists")]
    Conflict,

    /// No record with this username
    #[error("no credential with this username")]
    NotFound,

    /// Transient backend failure; the operation may be retried
    #[error("storage I/O failure: {0}")]
    Io(String),
}

/// Persistence contract required by the authentication engine
///
/// Implementations are provided by the embedding application and must
/// make `put`/`update` atomic per record. No cross-record transaction is
/// required: the rotation pass only needs monotonic progress through an
/// ordered scan.
pub trait CredentialStore: Send + Sync {
    /// Fetch the credential for `username`, if present
    fn get(&self, username: &str) -> Result<Option<Credential>, StoreError>;

    /// Insert a new credential
    ///
    /// Fails with `Conflict` if the username already exists; this is the
    /// registration-time uniqueness guarantee.
    fn put(&self, credential: Credential) -> Result<(), StoreError>;

    /// Replace an existing credential atomically
    ///
    /// Fails with `NotFound` if no record exists for the username.
    fn update(&self, credential: Credential) -> Result<(), StoreError>;

    /// Scan records in ascending username order, strictly after `after`
    ///
    /// Returns at most `limit` records. Passing the last username of one
    /// page as `after` of the next restarts the scan exactly where it
    /// stopped, which is what makes rotation resumable.
    fn scan_from(&self, after: Option<&str>, limit: usize) -> Result<Vec<Credential>, StoreError>;
}
