/*!
 * CredVault Credential Authentication Engine
 *
 * This crate implements password-based credential issuance, verification,
 * and re-keying under a versioned master-key scheme. Stored secrets stay
 * verifiable across periodic master-key rotations without forcing users
 * to reset passwords.
 *
 * The moving parts are:
 *
 * - A key ring tracking the active master-key version and every retired
 *   version still referenced by stored credentials
 * - A credential codec sealing salted Argon2id password digests inside
 *   AES-256-GCM envelopes keyed from the master key
 * - An authentication service mapping registration, login, and password
 *   changes onto a closed outcome taxonomy
 * - A rotation coordinator that re-encrypts every stored credential from
 *   a retired key to a new one, resumably and idempotently
 *
 * Persistence is supplied by the embedding application through the
 * [`store::CredentialStore`] trait; an in-memory implementation backs the
 * test suite and simple embeddings.
 */

/// Versioned master-key registry
pub mod keyring;

/// Password-to-envelope codec built on Argon2id and AES-256-GCM
pub mod codec;

/// Credential persistence contract and in-memory reference store
pub mod store;

/// Registration, login, and password-change orchestration
pub mod auth;

/// Resumable master-key rotation over all stored credentials
pub mod rotation;

/// Common error types for the authentication engine
pub mod error;

/// Utilities for cryptographic operations
pub mod utils;

// Re-export main types for convenience
pub use auth::AuthOutcome;
pub use auth::AuthService;
pub use codec::CredentialCodec;
pub use codec::DerivationParams;
pub use error::{AuthError, AuthResult};
pub use keyring::KeyMaterial;
pub use keyring::KeyRing;
pub use keyring::KeyState;
pub use keyring::KeyVersion;
pub use rotation::RetryPolicy;
pub use rotation::RotationCoordinator;
pub use rotation::RotationJob;
pub use rotation::RotationStatus;
pub use store::Credential;
pub use store::CredentialStore;
pub use store::MemoryStore;
pub use store::StoreError;

/// Provides a simplified interface to the most commonly used operations.
///
/// This aims to make the library easier to use with reasonable defaults.
pub mod prelude {
    pub use crate::auth::{AuthOutcome, AuthService};
    pub use crate::codec::{CredentialCodec, DerivationParams};
    pub use crate::error::{AuthError, AuthResult};
    pub use crate::keyring::{KeyMaterial, KeyRing, KeyState, KeyVersion};
    pub use crate::rotation::{RetryPolicy, RotationCoordinator, RotationJob, RotationStatus};
    pub use crate::store::{Credential, CredentialStore, MemoryStore, StoreError};
}
