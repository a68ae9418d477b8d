//! # Hashing Utilities
//!
//! The two digests the SDK needs and nothing else:
//!
//! - **SHA-384** — transaction hashes. The network identifies a submitted
//!   transaction by the SHA-384 of its signed bytes, so this is what shows
//!   up in receipts, records and explorers.
//! - **Keccak-256** — the message digest ECDSA(secp256k1) signatures are
//!   computed over, and the hash behind EVM addresses.

use sha2::{Digest, Sha384};
use sha3::Keccak256;

/// SHA-384 of `data`. 48 bytes.
pub fn sha384(data: &[u8]) -> [u8; 48] {
    let mut out = [0u8; 48];
    out.copy_from_slice(&Sha384::digest(data));
    out
}

/// Keccak-256 of `data`. 32 bytes.
pub fn keccak256(data: &[u8]) -> [u8; 32] {
    let mut hasher = Keccak256::new();
    hasher.update(data);
    hasher.finalize().into()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn sha384_of_empty_input() {
        assert_eq!(
            hex::encode(sha384(b"")),
            "38b060a751ac96384cd9327eb1b1e36a21fdb71114be07434c0cc7bf63f6e1da\
             274edebfe76f65fbd51ad2f14898b95b"
        );
    }

    #[test]
    fn keccak256_is_not_sha3() {
        // Keccak-256 of the empty string, as used by EVM tooling.
        assert_eq!(
            hex::encode(keccak256(b"")),
            "c5d2460186f7233c927e7db2dcc703c0e500b653ca82273b7bfad8045d85a470"
        );
    }
}
