//! Process-wide fingerprint generation with collision breaking.
//!
//! A [`FingerprintRegistry`] is created once at driver entry and threaded explicitly (as
//! `&mut FingerprintRegistry`) into every checker's `check` call. It is the only piece of
//! state shared across checkers (see §5 of SPEC_FULL.md), which is why it is an explicit
//! argument rather than a global: it keeps the single-threaded dispatch model honest and
//! makes tests trivially resettable.

use sha2::{Digest, Sha256};
use std::collections::HashSet;

/// Generates stable, collision-free 16-hex-digit fingerprints for [`Finding`](crate::finding::Finding)s.
#[derive(Debug, Default)]
pub struct FingerprintRegistry {
    seen: HashSet<[u8; 8]>,
}

impl FingerprintRegistry {
    /// Creates an empty registry.
    pub fn new() -> Self {
        Self::default()
    }

    /// Clears all seen fingerprints, as if the registry were freshly created.
    pub fn reset(&mut self) {
        self.seen.clear();
    }

    /// Derives a fingerprint for `(path, line, check_name, description)`, breaking ties with
    /// identical prior inputs by incrementing the low byte (with carry) until the result is
    /// unique within this registry's lifetime.
    pub fn register(&mut self, path: &str, line: u32, check_name: &str, description: &str) -> String {
        let mut bytes = digest(path, line, check_name, description);
        loop {
            if self.seen.insert(bytes) {
                break;
            }
            increment_with_carry(&mut bytes);
        }
        hex_encode(&bytes)
    }
}

fn digest(path: &str, line: u32, check_name: &str, description: &str) -> [u8; 8] {
    let mut hasher = Sha256::new();
    hasher.update(path.as_bytes());
    hasher.update(b"\0");
    hasher.update(line.to_le_bytes());
    hasher.update(b"\0");
    hasher.update(check_name.as_bytes());
    hasher.update(b"\0");
    hasher.update(description.as_bytes());
    let result = hasher.finalize();
    let mut bytes = [0u8; 8];
    bytes.copy_from_slice(&result[..8]);
    bytes
}

fn increment_with_carry(bytes: &mut [u8; 8]) {
    for byte in bytes.iter_mut().rev() {
        let (next, overflowed) = byte.overflowing_add(1);
        *byte = next;
        if !overflowed {
            return;
        }
    }
}

fn hex_encode(bytes: &[u8]) -> String {
    bytes.iter().map(|b| format!("{b:02x}")).collect()
}
