/*!
 * Error Handling for the CredVault Authentication Engine
 *
 * Provides the error taxonomy shared by every component: key-ring lookup
 * failures, codec failures, storage failures, and rotation control errors,
 * with stable numeric codes for operator tooling.
 */

use thiserror::Error;

use crate::store::StoreError;

/// Comprehensive error type for all credential operations
///
/// The taxonomy follows four classes:
///
/// * **configuration**: `NoActiveKey`; fatal at startup, never retried
/// * **integrity**: `CorruptKeyReference`, `MalformedRepresentation`;
///   indicate data corruption, never reported to a caller as a wrong password
/// * **transient**: `Store(StoreError::Io)`; retryable by the caller
/// * **control**: rotation sequencing errors (`RotationInProgress`,
///   `NoRotationJob`) and key-ring state violations
#[derive(Debug, Error)]
pub enum AuthError {
    #[error("unknown key version {version}")]
    UnknownKeyVersion { version: u32 },

    #[error("no active key configured")]
    NoActiveKey,

    #[error("key version {version} is the active key and cannot be retired")]
    RetireActiveKey { version: u32 },

    #[error("key version {version} cannot be purged: {reason}")]
    PurgeRefused { version: u32, reason: String },

    #[error("invalid key material: {reason}")]
    InvalidKeyMaterial { reason: String },

    #[error("credential for '{username}' references unresolvable key version {version}")]
    CorruptKeyReference { username: String, version: u32 },

    #[error("malformed stored representation: {reason}")]
    MalformedRepresentation { reason: String },

    #[error("password derivation failed: {cause}")]
    DerivationFailed { cause: String },

    #[error("envelope encryption failed: {cause}")]
    EnvelopeFailed { cause: String },

    #[error("rewrap failed: {cause}")]
    RewrapFailed { cause: String },

    #[error("storage error: {0}")]
    Store(#[from] StoreError),

    #[error("a rotation is already in progress or awaiting resume")]
    RotationInProgress,

    #[error("no rotation job to resume")]
    NoRotationJob,
}

/// Error code constants for different error categories
pub mod error_codes {
    // Key ring errors: 1000-1999
    pub const UNKNOWN_KEY_VERSION: u32 = 1001;
    pub const NO_ACTIVE_KEY: u32 = 1002;
    pub const RETIRE_ACTIVE_KEY: u32 = 1003;
    pub const PURGE_REFUSED: u32 = 1004;
    pub const INVALID_KEY_MATERIAL: u32 = 1005;

    // Codec errors: 2000-2999
    pub const MALFORMED_REPRESENTATION: u32 = 2001;
    pub const DERIVATION_FAILED: u32 = 2002;
    pub const ENVELOPE_FAILED: u32 = 2003;
    pub const REWRAP_FAILED: u32 = 2004;

    // Integrity errors: 3000-3999
    pub const CORRUPT_KEY_REFERENCE: u32 = 3001;

    // Storage errors: 4000-4999
    pub const STORE_CONFLICT: u32 = 4001;
    pub const STORE_NOT_FOUND: u32 = 4002;
    pub const STORE_IO: u32 = 4003;

    // Rotation errors: 5000-5999
    pub const ROTATION_IN_PROGRESS: u32 = 5001;
    pub const NO_ROTATION_JOB: u32 = 5002;
}

impl AuthError {
    /// Get the numeric error code for this error
    pub fn error_code(&self) -> u32 {
        match self {
            AuthError::UnknownKeyVersion { .. } => error_codes::UNKNOWN_KEY_VERSION,
            AuthError::NoActiveKey => error_codes::NO_ACTIVE_KEY,
            AuthError::RetireActiveKey { .. } => error_codes::RETIRE_ACTIVE_KEY,
            AuthError::PurgeRefused { .. } => error_codes::PURGE_REFUSED,
            AuthError::InvalidKeyMaterial { .. } => error_codes::INVALID_KEY_MATERIAL,
            AuthError::CorruptKeyReference { .. } => error_codes::CORRUPT_KEY_REFERENCE,
            AuthError::MalformedRepresentation { .. } => error_codes::MALFORMED_REPRESENTATION,
            AuthError::DerivationFailed { .. } => error_codes::DERIVATION_FAILED,
            AuthError::EnvelopeFailed { .. } => error_codes::ENVELOPE_FAILED,
            AuthError::RewrapFailed { .. } => error_codes::REWRAP_FAILED,
            AuthError::Store(StoreError::Conflict) => error_codes::STORE_CONFLICT,
            AuthError::Store(StoreError::NotFound) => error_codes::STORE_NOT_FOUND,
            AuthError::Store(StoreError::Io(_)) => error_codes::STORE_IO,
            AuthError::RotationInProgress => error_codes::ROTATION_IN_PROGRESS,
            AuthError::NoRotationJob => error_codes::NO_ROTATION_JOB,
        }
    }

    /// Whether the caller may retry the failed operation as-is
    ///
    /// Only transient storage failures are retryable. Configuration and
    /// integrity errors require operator intervention.
    pub fn is_transient(&self) -> bool {
        matches!(self, AuthError::Store(StoreError::Io(_)))
    }

    /// Whether this error indicates stored-data corruption or a key-ring
    /// misconfiguration rather than a caller mistake
    pub fn is_integrity(&self) -> bool {
        matches!(
            self,
            AuthError::CorruptKeyReference { .. } | AuthError::MalformedRepresentation { .. }
        )
    }

    /// Get the error category as a string
    pub fn error_type(&self) -> &'static str {
        match self {
            AuthError::UnknownKeyVersion { .. } => "UnknownKeyVersion",
            AuthError::NoActiveKey => "NoActiveKey",
            AuthError::RetireActiveKey { .. } => "RetireActiveKey",
            AuthError::PurgeRefused { .. } => "PurgeRefused",
            AuthError::InvalidKeyMaterial { .. } => "InvalidKeyMaterial",
            AuthError::CorruptKeyReference { .. } => "CorruptKeyReference",
            AuthError::MalformedRepresentation { .. } => "MalformedRepresentation",
            AuthError::DerivationFailed { .. } => "DerivationFailed",
            AuthError::EnvelopeFailed { .. } => "EnvelopeFailed",
            AuthError::RewrapFailed { .. } => "RewrapFailed",
            AuthError::Store(_) => "Store",
            AuthError::RotationInProgress => "RotationInProgress",
            AuthError::NoRotationJob => "NoRotationJob",
        }
    }
}

/// Convenience constructors for common error types
impl AuthError {
    pub fn unknown_key_version(version: u32) -> Self {
        AuthError::UnknownKeyVersion { version }
    }

    pub fn corrupt_key_reference(username: &str, version: u32) -> Self {
        AuthError::CorruptKeyReference {
            username: username.to_string(),
            version,
        }
    }

    pub fn malformed_representation(reason: &str) -> Self {
        AuthError::MalformedRepresentation {
            reason: reason.to_string(),
        }
    }

    pub fn derivation_failed(cause: &str) -> Self {
        AuthError::DerivationFailed {
            cause: cause.to_string(),
        }
    }

    pub fn envelope_failed(cause: &str) -> Self {
        AuthError::EnvelopeFailed {
            cause: cause.to_string(),
        }
    }

    pub fn rewrap_failed(cause: &str) -> Self {
        AuthError::RewrapFailed {
            cause: cause.to_string(),
        }
    }

    pub fn invalid_key_material(reason: &str) -> Self {
        AuthError::InvalidKeyMaterial {
            reason: reason.to_string(),
        }
    }
}

/// Result type alias for credential operations
pub type AuthResult<T> = Result<T, AuthError>;
