use super::*;

fn credential(username: &str, version: u32) -> Credential {
    Credential::new(username, vec![0u8; 8], version)
}

#[test]
fn test_put_and_get() {
    let store = MemoryStore::new();
    store.put(credential("alice", 1)).unwrap();

    let fetched = store.get("alice").unwrap().unwrap();
    assert_eq!(fetched.username, "alice");
    assert_eq!(fetched.key_version, 1);

    assert!(store.get("bob").unwrap().is_none());
}

#[test]
fn test_put_conflict_on_duplicate_username() {
    let store = MemoryStore::new();
    store.put(credential("alice", 1)).unwrap();

    let result = store.put(credential("alice", 2));
    assert_eq!(result, Err(StoreError::Conflict));

    // Original record untouched
    assert_eq!(store.get("alice").unwrap().unwrap().key_version, 1);
}

#[test]
fn test_update_requires_existing_record() {
    let store = MemoryStore::new();
    assert_eq!(
        store.update(credential("ghost", 1)),
        Err(StoreError::NotFound)
    );

    store.put(credential("alice", 1)).unwrap();
    store.update(credential("alice", 2)).unwrap();
    assert_eq!(store.get("alice").unwrap().unwrap().key_version, 2);
}

#[test]
fn test_scan_is_ordered_and_cursorable() {
    let store = MemoryStore::new();
    for name in ["carol", "alice", "eve", "bob", "dave"] {
        store.put(credential(name, 1)).unwrap();
    }

    let first = store.scan_from(None, 2).unwrap();
    let names: Vec<_> = first.iter().map(|c| c.username.as_str()).collect();
    assert_eq!(names, ["alice", "bob"]);

    // Cursor semantics are strictly-greater-than
    let second = store.scan_from(Some("bob"), 2).unwrap();
    let names: Vec<_> = second.iter().map(|c| c.username.as_str()).collect();
    assert_eq!(names, ["carol", "dave"]);

    let last = store.scan_from(Some("dave"), 10).unwrap();
    let names: Vec<_> = last.iter().map(|c| c.username.as_str()).collect();
    assert_eq!(names, ["eve"]);

    assert!(store.scan_from(Some("eve"), 10).unwrap().is_empty());
}

#[test]
fn test_mutation_counters() {
    let store = MemoryStore::new();
    store.put(credential("alice", 1)).unwrap();
    store.put(credential("bob", 1)).unwrap();
    let _ = store.put(credential("alice", 1)); // conflict, not counted
    store.update(credential("alice", 2)).unwrap();

    assert_eq!(store.put_count(), 2);
    assert_eq!(store.update_count(), 1);
    assert_eq!(store.len(), 2);
}

#[test]
fn test_credential_debug_redacts_representation() {
    let cred = Credential::new("alice", vec![0xde, 0xad, 0xbe, 0xef], 1);
    let rendered = format!("{:?}", cred);
    assert!(rendered.contains("alice"));
    assert!(!rendered.contains("222")); // 0xde = 222 would leak via byte Debug
    assert!(!rendered.contains("deadbeef"));
    assert!(rendered.contains("redacted"));
}
