use rand::{rngs::OsRng, RngCore};

use crate::error::AuthError;

/// Generate random bytes of the specified length
pub fn random_bytes(length: usize) -> Result<Vec<u8>, AuthError> {
    let mut bytes = vec![0u8; length];
    OsRng.fill_bytes(&mut bytes);
    Ok(bytes)
}

/// Constant-time comparison of two byte slices to avoid timing attacks
///
/// This function compares two byte slices in constant time to prevent
/// timing attacks that could leak information about the content.
pub fn constant_time_eq(a: &[u8], b: &[u8]) -> bool {
    if a.len() != b.len() {
        return false;
    }

    use subtle::ConstantTimeEq;
    a.ct_eq(b).into()
}

/// Convert bytes to a hexadecimal string
pub fn to_hex(data: &[u8]) -> String {
    hex::encode(data)
}

/// Convert a hexadecimal string to bytes
pub fn from_hex(hex_str: &str) -> Result<Vec<u8>, AuthError> {
    hex::decode(hex_str)
        .map_err(|e| AuthError::malformed_representation(&format!("invalid hex: {}", e)))
}
