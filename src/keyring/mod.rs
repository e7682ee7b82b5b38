/*!
 * Versioned Master-Key Ring
 *
 * This module tracks every master-key version the service has ever used:
 * the single active version new credentials are derived under, and the
 * retired versions that must stay resolvable until every credential
 * referencing them has been rotated forward.
 */

mod keyring;

pub use keyring::{KeyMaterial, KeyRing, KeyState, KeyVersion};

#[cfg(test)]
mod tests;
