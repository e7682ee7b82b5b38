#![no_main]

use std::sync::Arc;

use libfuzzer_sys::fuzz_target;
use credvault::prelude::*;
use arbitrary::Arbitrary;

#[derive(Arbitrary, Debug)]
enum FuzzOp {
    Register { username: String, password: String },
    Login { username: String, password: String },
    ChangePassword {
        username: String,
        old_password: String,
        new_password: String,
    },
}

fuzz_target!(|ops: Vec<FuzzOp>| {
    let keyring = Arc::new(KeyRing::bootstrap(
        1,
        KeyMaterial::new(vec![0x42; 32]).unwrap(),
    ));
    let store = Arc::new(MemoryStore::new());
    let codec = CredentialCodec::new(DerivationParams {
        memory_cost: 1024,
        time_cost: 1,
        parallelism: 1,
    });
    let auth = AuthService::new(keyring, codec, store);

    // No sequence of calls may panic or surface anything outside the
    // closed outcome taxonomy
    for op in ops.iter().take(16) {
        match op {
            FuzzOp::Register { username, password } => {
                let _ = auth.register(username, password);
            }
            FuzzOp::Login { username, password } => {
                let _ = auth.login(username, password);
            }
            FuzzOp::ChangePassword {
                username,
                old_password,
                new_password,
            } => {
                let _ = auth.change_password(username, old_password, new_password);
            }
        }
    }
});
