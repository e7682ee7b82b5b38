use std::sync::Arc;
use std::time::{Duration, Instant};

use credvault::prelude::*;

fn fast_params() -> DerivationParams {
    DerivationParams {
        memory_cost: 1024,
        time_cost: 1,
        parallelism: 1,
    }
}

fn engine(
    params: DerivationParams,
) -> (
    AuthService<MemoryStore>,
    RotationCoordinator<MemoryStore>,
    Arc<KeyRing>,
    Arc<MemoryStore>,
) {
    let keyring = Arc::new(KeyRing::bootstrap(
        1,
        KeyMaterial::new(b"initial master key material".to_vec()).unwrap(),
    ));
    let store = Arc::new(MemoryStore::new());
    let codec = CredentialCodec::new(params);
    let auth = AuthService::new(Arc::clone(&keyring), codec.clone(), Arc::clone(&store));
    let rotation = RotationCoordinator::new(Arc::clone(&keyring), codec, Arc::clone(&store));
    (auth, rotation, keyring, store)
}

#[test]
fn test_register_login_rotate_scenario() {
    let (auth, rotation, keyring, _) = engine(fast_params());

    assert_eq!(auth.register("alice", "pw1").unwrap(), AuthOutcome::Registered);
    assert_eq!(auth.register("alice", "pw2").unwrap(), AuthOutcome::UsernameTaken);
    assert_eq!(auth.login("alice", "pw1").unwrap(), AuthOutcome::Authenticated);
    assert_eq!(
        auth.login("alice", "wrong").unwrap(),
        AuthOutcome::InvalidCredentials
    );

    // Rotate to a new master key
    let job = rotation
        .start(KeyMaterial::new(b"rotated master key material".to_vec()).unwrap())
        .unwrap();
    assert_eq!(job.status, RotationStatus::Completed);
    assert_eq!(keyring.active().unwrap().0, 2);

    // The password that was valid before rotation stays valid after it
    assert_eq!(auth.login("alice", "pw1").unwrap(), AuthOutcome::Authenticated);
    assert_eq!(
        auth.login("alice", "wrong").unwrap(),
        AuthOutcome::InvalidCredentials
    );

    // New registrations land on the new version and keep working
    assert_eq!(auth.register("bob", "pw3").unwrap(), AuthOutcome::Registered);
    assert_eq!(auth.login("bob", "pw3").unwrap(), AuthOutcome::Authenticated);
}

#[test]
fn test_login_remains_valid_across_many_rotations() {
    let (auth, rotation, _, _) = engine(fast_params());
    auth.register("alice", "pw1").unwrap();

    for round in 0u8..4 {
        let material = KeyMaterial::new(vec![round + 10; 32]).unwrap();
        let job = rotation.start(material).unwrap();
        assert_eq!(job.status, RotationStatus::Completed);
        assert_eq!(auth.login("alice", "pw1").unwrap(), AuthOutcome::Authenticated);
    }
}

#[test]
fn test_change_password_survives_rotation() {
    let (auth, rotation, _, _) = engine(fast_params());
    auth.register("alice", "pw1").unwrap();

    rotation
        .start(KeyMaterial::new(vec![0x77; 32]).unwrap())
        .unwrap();

    assert_eq!(
        auth.change_password("alice", "pw1", "pw2").unwrap(),
        AuthOutcome::PasswordChanged
    );
    assert_eq!(auth.login("alice", "pw2").unwrap(), AuthOutcome::Authenticated);
    assert_eq!(
        auth.login("alice", "pw1").unwrap(),
        AuthOutcome::InvalidCredentials
    );
}

/// Login on a missing username must cost about as much as login with a
/// wrong password for an existing username, or the difference would
/// betray which usernames exist. Uses production-shaped derivation
/// parameters so the derivation dominates both paths, and a generous
/// bound to tolerate scheduler noise.
#[test]
fn test_username_enumeration_timing_resistance() {
    let (auth, _, _, _) = engine(DerivationParams::low_resource());
    auth.register("alice", "pw1").unwrap();

    let time_login = |username: &str, password: &str| -> Duration {
        (0..5)
            .map(|_| {
                let started = Instant::now();
                let outcome = auth.login(username, password).unwrap();
                assert_eq!(outcome, AuthOutcome::InvalidCredentials);
                started.elapsed()
            })
            .min()
            .unwrap()
    };

    let missing_user = time_login("no_such_user", "pw1");
    let wrong_password = time_login("alice", "wrong_password");

    let (slower, faster) = if missing_user > wrong_password {
        (missing_user, wrong_password)
    } else {
        (wrong_password, missing_user)
    };
    assert!(
        slower < faster * 3,
        "timing gap leaks username existence: missing={:?} wrong={:?}",
        missing_user,
        wrong_password
    );
}
