//! Random object contents and object names.

use std::fmt::Write;

use bytes::Bytes;
use rand::RngCore;

/// Number of random bytes in a generated object name.
const NAME_BYTES: usize = 20;

/// Prefix of the objects seeded into the durability bucket.
const DURABILITY_PREFIX: &str = "fake-item-";

/// Returns `size` bytes of fresh random data from the thread-local CSPRNG.
pub fn random_payload(size: usize) -> Bytes {
    let mut buffer = vec![0; size];
    rand::rng().fill_bytes(&mut buffer);
    buffer.into()
}

/// Returns a random object name of 40 lowercase hex characters.
pub fn random_object_name() -> String {
    let mut bytes = [0; NAME_BYTES];
    rand::rng().fill_bytes(&mut bytes);

    bytes
        .iter()
        .fold(String::with_capacity(NAME_BYTES * 2), |mut name, byte| {
            let _ = write!(name, "{byte:02x}");
            name
        })
}

/// Returns the deterministic name of the durability object at `index`.
pub fn durability_object_name(index: u64) -> String {
    format!("{DURABILITY_PREFIX}{index}")
}
