#![no_main]

use libfuzzer_sys::fuzz_target;
use credvault::codec::{CredentialCodec, DerivationParams};
use credvault::keyring::KeyMaterial;
use arbitrary::Arbitrary;

#[derive(Arbitrary, Debug)]
struct EnvelopeFuzzInput {
    password: String,
    key: Vec<u8>,
    stored: Vec<u8>,
}

fuzz_target!(|input: EnvelopeFuzzInput| {
    let codec = CredentialCodec::new(DerivationParams {
        memory_cost: 1024,
        time_cost: 1,
        parallelism: 1,
    });

    // Ensure we have non-empty key material
    let key = if input.key.is_empty() {
        KeyMaterial::new(vec![0x42; 32]).unwrap()
    } else {
        KeyMaterial::new(input.key.clone()).unwrap()
    };

    // Arbitrary stored bytes must never panic: either a clean parse
    // error or a boolean verdict
    let _ = codec.verify(&input.password, &input.stored, &key);

    // A freshly derived envelope must round-trip
    if !input.password.is_empty() {
        if let Ok(stored) = codec.derive(&input.password, &key) {
            let _ = codec.verify(&input.password, &stored, &key);
            let other = KeyMaterial::new(vec![0x43; 32]).unwrap();
            let _ = codec.rewrap(&stored, &key, &other);
        }
    }
});
