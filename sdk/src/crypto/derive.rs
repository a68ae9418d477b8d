//! Hierarchical key derivation.
//!
//! Two schemes, one per curve:
//!
//! - Ed25519 follows SLIP-10. Only hardened children exist, so every index
//!   is hardened whether or not the caller set the high bit.
//! - secp256k1 follows BIP-32, with both hardened and normal children.
//!
//! Both start from a 64-byte seed run through HMAC-SHA512 under a
//! curve-specific key, giving a 32-byte private key and a 32-byte chain code.

use hmac::{Hmac, Mac};
use k256::elliptic_curve::sec1::ToEncodedPoint;
use k256::SecretKey;
use sha2::Sha512;

use crate::error::{Error, Result};

/// High bit marking a hardened child index.
pub const HARDENED: u32 = 0x8000_0000;

const ED25519_SEED_KEY: &[u8] = b"ed25519 seed";
const SECP256K1_SEED_KEY: &[u8] = b"Bitcoin seed";

/// Key material plus chain code.
pub(crate) struct ExtendedKey {
    pub key: [u8; 32],
    pub chain_code: [u8; 32],
}

fn hmac_sha512(key: &[u8], parts: &[&[u8]]) -> Result<[u8; 64]> {
    let mut mac = Hmac::<Sha512>::new_from_slice(key)
        .map_err(|e| Error::KeyDerive(format!("hmac key: {e}")))?;
    for part in parts {
        mac.update(part);
    }
    let mut out = [0u8; 64];
    out.copy_from_slice(&mac.finalize().into_bytes());
    Ok(out)
}

fn split(output: [u8; 64]) -> ExtendedKey {
    let mut key = [0u8; 32];
    let mut chain_code = [0u8; 32];
    key.copy_from_slice(&output[..32]);
    chain_code.copy_from_slice(&output[32..]);
    ExtendedKey { key, chain_code }
}

pub(crate) fn ed25519_master(seed: &[u8]) -> Result<ExtendedKey> {
    hmac_sha512(ED25519_SEED_KEY, &[seed]).map(split)
}

pub(crate) fn secp256k1_master(seed: &[u8]) -> Result<ExtendedKey> {
    let master = split(hmac_sha512(SECP256K1_SEED_KEY, &[seed])?);
    // The master scalar must be a valid, non-zero secp256k1 key.
    SecretKey::from_slice(&master.key)
        .map_err(|_| Error::KeyDerive("seed produced an invalid secp256k1 master key".into()))?;
    Ok(master)
}

/// SLIP-10 child of an Ed25519 key. Always hardened.
pub(crate) fn ed25519_child(parent: &ExtendedKey, index: u32) -> Result<ExtendedKey> {
    let index = (index | HARDENED).to_be_bytes();
    hmac_sha512(&parent.chain_code, &[&[0u8], &parent.key, &index]).map(split)
}

/// BIP-32 child of a secp256k1 key.
pub(crate) fn secp256k1_child(parent: &ExtendedKey, index: u32) -> Result<ExtendedKey> {
    let parent_key = SecretKey::from_slice(&parent.key)
        .map_err(|_| Error::KeyDerive("invalid secp256k1 parent key".into()))?;
    let index_bytes = index.to_be_bytes();

    let output = if index & HARDENED != 0 {
        hmac_sha512(&parent.chain_code, &[&[0u8], &parent.key, &index_bytes])?
    } else {
        let public = parent_key.public_key().to_encoded_point(true);
        hmac_sha512(&parent.chain_code, &[public.as_bytes(), &index_bytes])?
    };
    let derived = split(output);

    let tweak = SecretKey::from_slice(&derived.key)
        .map_err(|_| Error::KeyDerive(format!("index {index} yields an out-of-range tweak")))?;
    let child_scalar = *tweak.to_nonzero_scalar() + *parent_key.to_nonzero_scalar();
    let child = SecretKey::from_bytes(&child_scalar.to_bytes())
        .map_err(|_| Error::KeyDerive(format!("index {index} yields a zero key")))?;

    let mut key = [0u8; 32];
    key.copy_from_slice(&child.to_bytes());
    Ok(ExtendedKey {
        key,
        chain_code: derived.chain_code,
    })
}
