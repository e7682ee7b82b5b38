use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, Mutex, PoisonError, TryLockError};
use std::thread;
use std::time::Duration;

use serde::{Deserialize, Serialize};

use crate::codec::CredentialCodec;
use crate::error::{AuthError, AuthResult};
use crate::keyring::{KeyMaterial, KeyRing, KeyVersion};
use crate::store::{Credential, CredentialStore};

/// How many records one store scan call returns
const SCAN_PAGE: usize = 64;

/// Progress state of a rotation pass
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum RotationStatus {
    /// The pass is incomplete: executing, or stopped with a valid cursor
    Running,
    /// Every record left the old version; the old version is retired
    Completed,
    /// A record could not be migrated within the retry budget; the
    /// cursor marks the last success for operator-driven resume
    Failed,
}

/// Snapshot of an in-progress or finished rotation
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RotationJob {
    /// Version records are being moved away from
    pub from_version: KeyVersion,
    /// Version records are being moved onto (the new active version)
    pub to_version: KeyVersion,
    /// Username of the last successfully processed record
    pub cursor: Option<String>,
    pub status: RotationStatus,
    /// Records rewrapped by this job
    pub migrated: u64,
    /// Records visited that were already off the old version
    pub skipped: u64,
}

/// Retry budget for per-record failures during the scan
///
/// A failed rewrap or store write is retried with linear backoff; only
/// after `max_attempts` does the job fail. A record is never skipped
/// silently.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RetryPolicy {
    pub max_attempts: u32,
    pub backoff: Duration,
}

impl Default for RetryPolicy {
    fn default() -> Self {
        Self {
            max_attempts: 3,
            backoff: Duration::from_millis(50),
        }
    }
}

/// Coordinator for re-keying every stored credential
///
/// Runs at most one pass at a time per process; the cross-process
/// at-most-one guarantee (a rotation lock or lease) belongs to the
/// deployment, not this type. All methods take `&self`, so the
/// coordinator can be shared behind an `Arc` with an operator thread
/// that calls [`cancel`](Self::cancel) and [`status`](Self::status)
/// while [`start`](Self::start) runs elsewhere.
///
/// # Rotation protocol
///
/// 1. Register the new key material (`add_version`); introduced, not
///    yet used.
/// 2. `activate` it: registrations and password changes switch to the
///    new version immediately, while existing credentials keep
///    verifying against their recorded versions.
/// 3. Scan the store in username order from the cursor. Every record
///    still on the old version is rewrapped and updated atomically;
///    records already off it are skipped, which is what makes
///    re-processing after a crash or resume harmless.
/// 4. When the scan drains, retire the old version and mark the job
///    `Completed`.
///
/// Logins racing the pass always succeed with the password that was
/// valid before it started: until a record is rewrapped its old version
/// stays resolvable, and afterwards its record names the new version.
pub struct RotationCoordinator<S: CredentialStore> {
    keyring: Arc<KeyRing>,
    codec: CredentialCodec,
    store: Arc<S>,
    job: Mutex<Option<RotationJob>>,
    run_guard: Mutex<()>,
    cancel: AtomicBool,
    retry: RetryPolicy,
}

impl<S: CredentialStore> RotationCoordinator<S> {
    pub fn new(keyring: Arc<KeyRing>, codec: CredentialCodec, store: Arc<S>) -> Self {
        Self {
            keyring,
            codec,
            store,
            job: Mutex::new(None),
            run_guard: Mutex::new(()),
            cancel: AtomicBool::new(false),
            retry: RetryPolicy::default(),
        }
    }

    /// Replace the default per-record retry budget
    pub fn with_retry_policy(mut self, retry: RetryPolicy) -> Self {
        self.retry = retry;
        self
    }

    /// Start a fresh rotation from the current active version to new material
    ///
    /// Blocks until the pass completes, fails, or is cancelled, and
    /// returns the final job snapshot. Refused with `RotationInProgress`
    /// while an unfinished job exists: an interrupted or failed pass
    /// must be [`resume`](Self::resume)d, never abandoned, or records
    /// would be stranded on a version nobody is migrating away from.
    pub fn start(&self, new_material: KeyMaterial) -> AuthResult<RotationJob> {
        let _guard = self.try_acquire_run()?;

        {
            let job = self.job.lock().unwrap_or_else(PoisonError::into_inner);
            if matches!(
                job.as_ref(),
                Some(j) if j.status != RotationStatus::Completed
            ) {
                return Err(AuthError::RotationInProgress);
            }
        }

        let (from_version, _) = self.keyring.active()?;
        let to_version = self.keyring.add_version(new_material);
        self.keyring.activate(to_version)?;

        {
            let mut job = self.job.lock().unwrap_or_else(PoisonError::into_inner);
            *job = Some(RotationJob {
                from_version,
                to_version,
                cursor: None,
                status: RotationStatus::Running,
                migrated: 0,
                skipped: 0,
            });
        }

        log::info!(
            "key rotation started: version {} -> {}",
            from_version,
            to_version
        );
        self.run()
    }

    /// Resume an interrupted or failed pass from its preserved cursor
    ///
    /// Re-enters the scan loop; records processed before the
    /// interruption are already off the old version and are skipped.
    /// Resuming an already-completed job rescans and mutates nothing.
    pub fn resume(&self) -> AuthResult<RotationJob> {
        let _guard = self.try_acquire_run()?;

        {
            let mut job = self.job.lock().unwrap_or_else(PoisonError::into_inner);
            match job.as_mut() {
                Some(j) => {
                    j.status = RotationStatus::Running;
                    log::info!(
                        "key rotation resumed: version {} -> {}, cursor {:?}",
                        j.from_version,
                        j.to_version,
                        j.cursor
                    );
                }
                None => return Err(AuthError::NoRotationJob),
            }
        }

        self.run()
    }

    /// Request a cooperative stop
    ///
    /// The in-flight record finishes (a record's move to the new key is
    /// all-or-nothing), then the scan loop exits with the cursor
    /// preserved and the job still `Running`. [`resume`](Self::resume)
    /// continues from there.
    pub fn cancel(&self) {
        self.cancel.store(true, Ordering::SeqCst);
    }

    /// Snapshot of the current or last rotation job
    pub fn status(&self) -> Option<RotationJob> {
        self.job
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .clone()
    }

    fn try_acquire_run(&self) -> AuthResult<std::sync::MutexGuard<'_, ()>> {
        match self.run_guard.try_lock() {
            Ok(guard) => Ok(guard),
            Err(TryLockError::Poisoned(poisoned)) => Ok(poisoned.into_inner()),
            Err(TryLockError::WouldBlock) => Err(AuthError::RotationInProgress),
        }
    }

    /// Drive the scan loop; caller holds the run guard
    fn run(&self) -> AuthResult<RotationJob> {
        self.cancel.store(false, Ordering::SeqCst);

        match self.scan_loop() {
            Ok(()) => {}
            Err(e) => {
                let mut job = self.job.lock().unwrap_or_else(PoisonError::into_inner);
                if let Some(j) = job.as_mut() {
                    j.status = RotationStatus::Failed;
                    log::error!(
                        "key rotation failed at cursor {:?}: {}",
                        j.cursor,
                        e
                    );
                }
                return Err(e);
            }
        }

        self.status().ok_or(AuthError::NoRotationJob)
    }

    fn scan_loop(&self) -> AuthResult<()> {
        let (from_version, to_version, mut cursor) = {
            let job = self.job.lock().unwrap_or_else(PoisonError::into_inner);
            let j = job.as_ref().ok_or(AuthError::NoRotationJob)?;
            (j.from_version, j.to_version, j.cursor.clone())
        };

        let old_key = self.keyring.resolve(from_version)?;
        let new_key = self.keyring.resolve(to_version)?;

        loop {
            let page = self.with_record_retry("scan", cursor.as_deref().unwrap_or(""), || {
                self.store
                    .scan_from(cursor.as_deref(), SCAN_PAGE)
                    .map_err(AuthError::from)
            })?;

            if page.is_empty() {
                break;
            }

            for credential in page {
                if self.cancel.load(Ordering::SeqCst) {
                    log::info!(
                        "key rotation stopping cooperatively at cursor {:?}",
                        cursor
                    );
                    return Ok(());
                }

                let username = credential.username.clone();
                if credential.key_version == from_version {
                    self.with_record_retry("rewrap", &username, || {
                        let representation = self.codec.rewrap(
                            &credential.representation,
                            &old_key,
                            &new_key,
                        )?;
                        self.store
                            .update(Credential::new(
                                username.as_str(),
                                representation,
                                to_version,
                            ))
                            .map_err(AuthError::from)
                    })?;

                    let mut job = self.job.lock().unwrap_or_else(PoisonError::into_inner);
                    if let Some(j) = job.as_mut() {
                        j.migrated += 1;
                        j.cursor = Some(username.clone());
                    }
                } else {
                    let mut job = self.job.lock().unwrap_or_else(PoisonError::into_inner);
                    if let Some(j) = job.as_mut() {
                        j.skipped += 1;
                        j.cursor = Some(username.clone());
                    }
                }

                cursor = Some(username);
            }
        }

        // Scan drained: nothing references the old version any more
        self.keyring.retire(from_version)?;

        let mut job = self.job.lock().unwrap_or_else(PoisonError::into_inner);
        if let Some(j) = job.as_mut() {
            j.status = RotationStatus::Completed;
            j.cursor = None;
            log::info!(
                "key rotation completed: version {} -> {}, {} migrated, {} skipped",
                j.from_version,
                j.to_version,
                j.migrated,
                j.skipped
            );
        }
        Ok(())
    }

    /// Run one record operation with bounded linear-backoff retries
    fn with_record_retry<T>(
        &self,
        what: &str,
        username: &str,
        mut op: impl FnMut() -> AuthResult<T>,
    ) -> AuthResult<T> {
        let mut attempt = 1;
        loop {
            match op() {
                Ok(value) => return Ok(value),
                Err(e) if attempt < self.retry.max_attempts => {
                    log::warn!(
                        "rotation {} for '{}' failed (attempt {}/{}): {}",
                        what,
                        username,
                        attempt,
                        self.retry.max_attempts,
                        e
                    );
                    thread::sleep(self.retry.backoff * attempt);
                    attempt += 1;
                }
                Err(e) => return Err(e),
            }
        }
    }
}
