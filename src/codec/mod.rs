/*!
 * Credential Codec
 *
 * This module turns a password plus a master key into the opaque stored
 * representation kept by the credential store, and back: salted Argon2id
 * derivation wrapped in an AES-256-GCM envelope keyed from the master
 * key, so stored credentials can be re-keyed without the password.
 */

mod codec;

pub use codec::{
    CredentialCodec, DerivationParams, DIGEST_LEN, FORMAT_VERSION, NONCE_LEN,
    REPRESENTATION_LEN, SALT_LEN,
};
