/*!
 * Authentication Service
 *
 * Orchestrates registration, login, and password changes: selects the
 * active key version, drives the credential codec, persists through the
 * store adapter, and maps every outcome into a closed result taxonomy.
 */

mod service;

pub use service::{AuthOutcome, AuthService};
