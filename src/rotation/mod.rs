/*!
 * Master-Key Rotation
 *
 * This module re-keys every stored credential from the previous active
 * key version to a new one: introduce the new key, cut registrations
 * over to it, then walk the store in username order rewrapping each
 * record, with a persisted cursor so an interrupted pass resumes instead
 * of restarting. The old version is retired only after the scan proves
 * no record still references it.
 */

mod coordinator;

pub use coordinator::{RetryPolicy, RotationCoordinator, RotationJob, RotationStatus};
