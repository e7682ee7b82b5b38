use super::*;
use crate::error::AuthError;
use crate::utils;

fn material(seed: u8) -> KeyMaterial {
    KeyMaterial::new(vec![seed; 32]).unwrap()
}

#[test]
fn test_empty_ring_has_no_active_key() {
    let ring = KeyRing::new();
    assert!(matches!(ring.active(), Err(AuthError::NoActiveKey)));
    assert_eq!(ring.active_version(), None);
}

#[test]
fn test_bootstrap_sets_active() {
    let ring = KeyRing::bootstrap(5, material(1));

    let (version, _) = ring.active().unwrap();
    assert_eq!(version, 5);

    // Versions continue after the bootstrap version
    let next = ring.add_version(material(2));
    assert_eq!(next, 6);
}

#[test]
fn test_add_version_does_not_activate() {
    let ring = KeyRing::bootstrap(1, material(1));
    let v2 = ring.add_version(material(2));

    assert_eq!(v2, 2);
    assert_eq!(ring.active().unwrap().0, 1);

    ring.activate(v2).unwrap();
    assert_eq!(ring.active().unwrap().0, 2);
}

#[test]
fn test_resolve_unknown_version() {
    let ring = KeyRing::bootstrap(1, material(1));
    assert!(matches!(
        ring.resolve(42),
        Err(AuthError::UnknownKeyVersion { version: 42 })
    ));
}

#[test]
fn test_activate_unknown_version() {
    let ring = KeyRing::new();
    assert!(matches!(
        ring.activate(3),
        Err(AuthError::UnknownKeyVersion { version: 3 })
    ));
}

#[test]
fn test_retired_version_still_resolves() {
    let ring = KeyRing::bootstrap(1, material(1));
    let v2 = ring.add_version(material(2));
    ring.activate(v2).unwrap();
    ring.retire(1).unwrap();

    // Old credentials must still be verifiable
    let resolved = ring.resolve(1).unwrap();
    assert_eq!(resolved.len(), 32);
    assert_eq!(ring.versions()[&1], KeyState::Retired);
}

#[test]
fn test_retire_active_is_rejected() {
    let ring = KeyRing::bootstrap(1, material(1));
    assert!(matches!(
        ring.retire(1),
        Err(AuthError::RetireActiveKey { version: 1 })
    ));
}

#[test]
fn test_purge_requires_retirement() {
    let ring = KeyRing::bootstrap(1, material(1));
    let v2 = ring.add_version(material(2));

    // Not retired yet
    assert!(matches!(ring.purge(v2), Err(AuthError::PurgeRefused { .. })));
    // Active version never purgeable
    assert!(matches!(ring.purge(1), Err(AuthError::PurgeRefused { .. })));

    ring.activate(v2).unwrap();
    ring.retire(1).unwrap();
    ring.purge(1).unwrap();

    assert!(matches!(
        ring.resolve(1),
        Err(AuthError::UnknownKeyVersion { version: 1 })
    ));
}

#[test]
fn test_version_numbers_never_reused() {
    let ring = KeyRing::bootstrap(1, material(1));
    let v2 = ring.add_version(material(2));
    ring.activate(v2).unwrap();
    ring.retire(1).unwrap();
    ring.purge(1).unwrap();

    // The purged version number stays burned
    let v3 = ring.add_version(material(3));
    assert_eq!(v3, 3);
}

#[test]
fn test_key_material_rejects_empty() {
    assert!(matches!(
        KeyMaterial::new(Vec::new()),
        Err(AuthError::InvalidKeyMaterial { .. })
    ));
}

#[test]
fn test_key_material_debug_is_redacted() {
    let secret = utils::random_bytes(32).unwrap();
    let hex = utils::to_hex(&secret);
    let mat = KeyMaterial::new(secret).unwrap();

    let rendered = format!("{:?}", mat);
    assert!(!rendered.contains(&hex));
    assert!(rendered.contains("redacted"));
}

#[test]
fn test_reactivating_retired_version_returns_it_to_service() {
    let ring = KeyRing::bootstrap(1, material(1));
    let v2 = ring.add_version(material(2));
    ring.activate(v2).unwrap();
    ring.retire(1).unwrap();

    ring.activate(1).unwrap();
    assert_eq!(ring.active().unwrap().0, 1);
    assert_eq!(ring.versions()[&1], KeyState::Available);
}
