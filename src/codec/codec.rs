use aes_gcm::{
    aead::{Aead, KeyInit, Payload},
    Aes256Gcm, Key, Nonce,
};
use argon2::{Algorithm, Argon2, ParamsBuilder, Version};
use hkdf::Hkdf;
use sha2::Sha256;
use zeroize::Zeroize;

use crate::error::AuthError;
use crate::keyring::KeyMaterial;
use crate::utils;

/// Format tag of the envelope layout produced by this codec
pub const FORMAT_VERSION: u8 = 1;

/// Length of the per-credential random salt
pub const SALT_LEN: usize = 16;

/// Length of the AES-GCM nonce
pub const NONCE_LEN: usize = 12;

/// Length of the Argon2id digest sealed inside the envelope
pub const DIGEST_LEN: usize = 32;

/// AES-GCM authentication tag length
const TAG_LEN: usize = 16;

/// Total length of a well-formed stored representation:
/// `format(1) || salt(16) || nonce(12) || ciphertext(32 + 16)`
pub const REPRESENTATION_LEN: usize = 1 + SALT_LEN + NONCE_LEN + DIGEST_LEN + TAG_LEN;

/// Domain-separation label for deriving the envelope cipher key
const ENVELOPE_KEY_INFO: &[u8] = b"credvault envelope key v1";

/// Parameters for password derivation
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct DerivationParams {
    /// Memory cost (in KB)
    pub memory_cost: u32,
    /// Time cost (iterations)
    pub time_cost: u32,
    /// Parallelism factor
    pub parallelism: u32,
}

impl Default for DerivationParams {
    fn default() -> Self {
        Self {
            // These are reasonable defaults for most applications
            memory_cost: 65536, // 64 MB
            time_cost: 3,
            parallelism: 4,
        }
    }
}

impl DerivationParams {
    /// Low-resource mode for constrained environments
    pub fn low_resource() -> Self {
        Self {
            memory_cost: 19456, // 19 MB
            time_cost: 2,
            parallelism: 1,
        }
    }
}

/// Codec between passwords and key-versioned stored representations
///
/// A stored representation is a self-contained binary envelope:
///
/// ```text
/// format(1) || salt(16) || nonce(12) || AES-256-GCM(argon2id_digest)
/// ```
///
/// The password is hashed with Argon2id under a per-credential random
/// salt, and the digest is then sealed with AES-256-GCM under a cipher
/// key derived (HKDF-SHA256) from the master key material and the same
/// salt. The salt and nonce travel inside the envelope, so the store
/// needs no side columns, and the sealed digest can be re-encrypted
/// under a new master key without knowing the password.
///
/// # Security Properties
///
/// 1. Two derivations of the same password never produce equal bytes
///    (fresh salt and nonce per call), preventing equality correlation
/// 2. Verification compares digests with a constant-time equality that
///    never short-circuits on an early byte mismatch
/// 3. A representation only opens under the key material that sealed it;
///    any other key fails GCM authentication deterministically
/// 4. The format byte and salt are bound as GCM associated data, so a
///    spliced envelope fails authentication
///
/// # Examples
///
/// ```
/// use credvault::codec::{CredentialCodec, DerivationParams};
/// use credvault::keyring::KeyMaterial;
///
/// let codec = CredentialCodec::new(DerivationParams::low_resource());
/// let key = KeyMaterial::new(vec![0x42; 32]).unwrap();
///
/// let stored = codec.derive("correct horse battery staple", &key).unwrap();
/// assert!(codec.verify("correct horse battery staple", &stored, &key).unwrap());
/// assert!(!codec.verify("wrong password", &stored, &key).unwrap());
/// ```
#[derive(Debug, Clone)]
pub struct CredentialCodec {
    params: DerivationParams,
}

impl CredentialCodec {
    /// Create a codec with the given derivation parameters
    pub fn new(params: DerivationParams) -> Self {
        Self { params }
    }

    /// Derive a stored representation from a password under a master key
    ///
    /// Deterministic given the same password, key, salt, and nonce; the
    /// salt and nonce are drawn fresh on every call, so repeated
    /// derivations of one password differ byte-for-byte.
    ///
    /// # Arguments
    ///
    /// * `password` - The password to derive from
    /// * `key` - Master key material of the version the credential is
    ///   being bound to
    ///
    /// # Returns
    ///
    /// The opaque envelope bytes to persist alongside the key version
    pub fn derive(&self, password: &str, key: &KeyMaterial) -> Result<Vec<u8>, AuthError> {
        let salt = utils::random_bytes(SALT_LEN)?;
        let nonce = utils::random_bytes(NONCE_LEN)?;

        let mut digest = self.digest(password, &salt)?;
        let sealed = self.seal(&digest, key, &salt, &nonce);
        digest.zeroize();

        sealed
    }

    /// Verify a password against a stored representation
    ///
    /// Recomputes the Argon2id digest with the embedded salt, opens the
    /// envelope under `key`, and compares the two digests in constant
    /// time. The derivation runs before the envelope is opened, so the
    /// call costs the same whether the password is right or wrong.
    ///
    /// # Returns
    ///
    /// * `Ok(true)` if the password produced this representation
    /// * `Ok(false)` for a wrong password, or for key material that is
    ///   not the one the envelope was sealed under
    /// * `Err(MalformedRepresentation)` if the envelope bytes are not a
    ///   well-formed representation; corruption is never reported as a
    ///   mere mismatch
    pub fn verify(
        &self,
        password: &str,
        stored: &[u8],
        key: &KeyMaterial,
    ) -> Result<bool, AuthError> {
        let (salt, nonce, ciphertext) = parse_envelope(stored)?;

        // Uniform cost: the expensive derivation happens on every path,
        // including wrong-key envelopes that will fail authentication.
        let mut candidate = self.digest(password, salt)?;

        let cipher = envelope_cipher(key, salt)?;
        let aad = envelope_aad(salt);
        let opened = cipher.decrypt(
            Nonce::from_slice(nonce),
            Payload {
                msg: ciphertext,
                aad: &aad,
            },
        );

        let matches = match opened {
            Ok(mut digest) => {
                let equal = utils::constant_time_eq(&candidate, &digest);
                digest.zeroize();
                equal
            }
            // Authentication failure: sealed under different key material
            // (or tampered ciphertext). Deterministically not a match.
            Err(_) => false,
        };

        candidate.zeroize();
        Ok(matches)
    }

    /// Re-encrypt a stored representation from one master key to another
    ///
    /// Rotation cannot re-run the password derivation (the password is
    /// not available server-side), so the sealed digest is decrypted with
    /// the old key and re-sealed under the new key with a fresh nonce.
    /// The salt is preserved: the password-side derivation is untouched,
    /// and future verification under the new key recomputes the same
    /// digest.
    ///
    /// # Errors
    ///
    /// * `MalformedRepresentation` if the envelope bytes are invalid
    /// * `RewrapFailed` if `old_key` does not open the envelope
    pub fn rewrap(
        &self,
        stored: &[u8],
        old_key: &KeyMaterial,
        new_key: &KeyMaterial,
    ) -> Result<Vec<u8>, AuthError> {
        let (salt, nonce, ciphertext) = parse_envelope(stored)?;

        let old_cipher = envelope_cipher(old_key, salt)?;
        let aad = envelope_aad(salt);
        let mut digest = old_cipher
            .decrypt(
                Nonce::from_slice(nonce),
                Payload {
                    msg: ciphertext,
                    aad: &aad,
                },
            )
            .map_err(|_| {
                AuthError::rewrap_failed("old key material does not open this representation")
            })?;

        let new_nonce = utils::random_bytes(NONCE_LEN)?;
        let sealed = self.seal(&digest, new_key, salt, &new_nonce);
        digest.zeroize();

        sealed
    }

    /// Argon2id digest of `password` under `salt`
    fn digest(&self, password: &str, salt: &[u8]) -> Result<[u8; DIGEST_LEN], AuthError> {
        let mut builder = ParamsBuilder::new();
        builder
            .m_cost(self.params.memory_cost)
            .t_cost(self.params.time_cost)
            .p_cost(self.params.parallelism)
            .output_len(DIGEST_LEN);

        let params = builder.build().map_err(|e| {
            AuthError::derivation_failed(&format!("failed to build Argon2 parameters: {}", e))
        })?;

        let argon2 = Argon2::new(Algorithm::Argon2id, Version::V0x13, params);

        let mut digest = [0u8; DIGEST_LEN];
        argon2
            .hash_password_into(password.as_bytes(), salt, &mut digest)
            .map_err(|e| AuthError::derivation_failed(&format!("failed to derive digest: {}", e)))?;

        Ok(digest)
    }

    /// Seal a digest into a fresh envelope under `key`
    fn seal(
        &self,
        digest: &[u8],
        key: &KeyMaterial,
        salt: &[u8],
        nonce: &[u8],
    ) -> Result<Vec<u8>, AuthError> {
        let cipher = envelope_cipher(key, salt)?;
        let aad = envelope_aad(salt);

        let ciphertext = cipher
            .encrypt(
                Nonce::from_slice(nonce),
                Payload {
                    msg: digest,
                    aad: &aad,
                },
            )
            .map_err(|e| {
                AuthError::envelope_failed(&format!("AES-GCM encryption failed: {}", e))
            })?;

        let mut envelope = Vec::with_capacity(REPRESENTATION_LEN);
        envelope.push(FORMAT_VERSION);
        envelope.extend_from_slice(salt);
        envelope.extend_from_slice(nonce);
        envelope.extend_from_slice(&ciphertext);
        Ok(envelope)
    }
}

impl Default for CredentialCodec {
    fn default() -> Self {
        Self::new(DerivationParams::default())
    }
}

/// Split a stored representation into (salt, nonce, ciphertext)
fn parse_envelope(stored: &[u8]) -> Result<(&[u8], &[u8], &[u8]), AuthError> {
    if stored.len() != REPRESENTATION_LEN {
        return Err(AuthError::malformed_representation(&format!(
            "length {} does not match expected {}",
            stored.len(),
            REPRESENTATION_LEN
        )));
    }
    if stored[0] != FORMAT_VERSION {
        return Err(AuthError::malformed_representation(&format!(
            "unsupported format byte 0x{}",
            utils::to_hex(&stored[..1])
        )));
    }

    let salt = &stored[1..1 + SALT_LEN];
    let nonce = &stored[1 + SALT_LEN..1 + SALT_LEN + NONCE_LEN];
    let ciphertext = &stored[1 + SALT_LEN + NONCE_LEN..];
    Ok((salt, nonce, ciphertext))
}

/// AES-256-GCM cipher keyed from the master key material and the salt
///
/// HKDF-SHA256 stretches the arbitrary-length master key into the cipher
/// key; the salt participates so each credential gets its own envelope
/// key under the same master key.
fn envelope_cipher(key: &KeyMaterial, salt: &[u8]) -> Result<Aes256Gcm, AuthError> {
    let hk = Hkdf::<Sha256>::new(Some(salt), key.expose());
    let mut okm = [0u8; 32];
    hk.expand(ENVELOPE_KEY_INFO, &mut okm)
        .map_err(|e| AuthError::envelope_failed(&format!("HKDF expansion failed: {}", e)))?;

    let cipher = Aes256Gcm::new(Key::<Aes256Gcm>::from_slice(&okm));
    okm.zeroize();
    Ok(cipher)
}

/// Associated data binding the format byte and salt to the ciphertext
fn envelope_aad(salt: &[u8]) -> Vec<u8> {
    let mut aad = Vec::with_capacity(1 + salt.len());
    aad.push(FORMAT_VERSION);
    aad.extend_from_slice(salt);
    aad
}
