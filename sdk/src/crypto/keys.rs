//! # Key Management
//!
//! Private keys, public keys and signatures for the two curves the network
//! accepts.
//!
//! | Curve          | Private | Public          | Signed bytes            |
//! |----------------|---------|-----------------|-------------------------|
//! | Ed25519        | 32      | 32              | the message itself      |
//! | ECDSA secp256k1| 32      | 33 (compressed) | Keccak-256 of message   |
//!
//! Both schemes sign deterministically: Ed25519 by construction, ECDSA via
//! RFC 6979 nonces. A signature only ever covers the exact bytes handed to
//! [`PrivateKey::sign`]; callers are responsible for signing the frozen
//! serialization, never a re-encoding of it.
//!
//! ## Text encodings
//!
//! `Display` / `FromStr` use hex-encoded DER (PKCS#8 for private keys,
//! SubjectPublicKeyInfo for public keys), which is what the network tooling
//! and config files carry. Raw hex needs the curve spelled out:
//! [`PrivateKey::from_str_ed25519`], [`PrivateKey::from_str_ecdsa`].
//!
//! ## Security considerations
//!
//! - Private key bytes are never logged; `Debug` prints the public key.
//! - Generation uses `OsRng`.

use std::fmt;
use std::str::FromStr;

use ed25519_dalek::{Signer as _, Verifier as _};
use k256::ecdsa::signature::{DigestSigner as _, DigestVerifier as _};
use rand::rngs::OsRng;
use sha3::{Digest, Keccak256};

use super::derive::{self, ExtendedKey};
use super::hash::keccak256;
use crate::error::{Error, Result};

const ED25519_PRIVATE_DER_PREFIX: &[u8] = &[
    0x30, 0x2e, 0x02, 0x01, 0x00, 0x30, 0x05, 0x06, 0x03, 0x2b, 0x65, 0x70, 0x04, 0x22, 0x04, 0x20,
];
const ED25519_PUBLIC_DER_PREFIX: &[u8] = &[
    0x30, 0x2a, 0x30, 0x05, 0x06, 0x03, 0x2b, 0x65, 0x70, 0x03, 0x21, 0x00,
];
const ECDSA_PRIVATE_DER_PREFIX: &[u8] = &[
    0x30, 0x30, 0x02, 0x01, 0x00, 0x30, 0x07, 0x06, 0x05, 0x2b, 0x81, 0x04, 0x00, 0x0a, 0x04, 0x22,
    0x04, 0x20,
];
const ECDSA_PUBLIC_DER_PREFIX: &[u8] = &[
    0x30, 0x2d, 0x30, 0x07, 0x06, 0x05, 0x2b, 0x81, 0x04, 0x00, 0x0a, 0x03, 0x22, 0x00,
];

/// Which curve a key lives on.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum KeyAlgorithm {
    Ed25519,
    EcdsaSecp256k1,
}

impl FromStr for KeyAlgorithm {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self> {
        match s.to_ascii_lowercase().as_str() {
            "ed25519" => Ok(Self::Ed25519),
            "ecdsa" | "secp256k1" | "ecdsa-secp256k1" => Ok(Self::EcdsaSecp256k1),
            other => Err(Error::parse(format!("unknown key algorithm `{other}`"))),
        }
    }
}

// ---------------------------------------------------------------------------
// PrivateKey
// ---------------------------------------------------------------------------

#[derive(Clone)]
enum SigningKey {
    Ed25519(ed25519_dalek::SigningKey),
    EcdsaSecp256k1(k256::ecdsa::SigningKey),
}

/// A private key on either curve, optionally carrying a chain code for
/// hierarchical derivation.
#[derive(Clone)]
pub struct PrivateKey {
    key: SigningKey,
    chain_code: Option<[u8; 32]>,
}

impl PrivateKey {
    /// A fresh random key on `algorithm`.
    pub fn generate(algorithm: KeyAlgorithm) -> Self {
        match algorithm {
            KeyAlgorithm::Ed25519 => Self::generate_ed25519(),
            KeyAlgorithm::EcdsaSecp256k1 => Self::generate_ecdsa(),
        }
    }

    pub fn generate_ed25519() -> Self {
        Self::plain(SigningKey::Ed25519(ed25519_dalek::SigningKey::generate(
            &mut OsRng,
        )))
    }

    pub fn generate_ecdsa() -> Self {
        Self::plain(SigningKey::EcdsaSecp256k1(k256::ecdsa::SigningKey::random(
            &mut OsRng,
        )))
    }

    fn plain(key: SigningKey) -> Self {
        Self {
            key,
            chain_code: None,
        }
    }

    /// From 32 raw Ed25519 secret bytes.
    pub fn from_bytes_ed25519(bytes: &[u8]) -> Result<Self> {
        let bytes: [u8; 32] = bytes
            .try_into()
            .map_err(|_| Error::parse("Ed25519 private key must be 32 bytes"))?;
        Ok(Self::plain(SigningKey::Ed25519(
            ed25519_dalek::SigningKey::from_bytes(&bytes),
        )))
    }

    /// From a 32-byte secp256k1 scalar.
    pub fn from_bytes_ecdsa(bytes: &[u8]) -> Result<Self> {
        if bytes.len() != 32 {
            return Err(Error::parse("secp256k1 private key must be 32 bytes"));
        }
        let key = k256::ecdsa::SigningKey::from_slice(bytes)
            .map_err(|_| Error::parse("invalid secp256k1 private key"))?;
        Ok(Self::plain(SigningKey::EcdsaSecp256k1(key)))
    }

    /// From DER bytes on either curve.
    pub fn from_bytes_der(bytes: &[u8]) -> Result<Self> {
        if let Some(raw) = bytes.strip_prefix(ED25519_PRIVATE_DER_PREFIX) {
            return Self::from_bytes_ed25519(raw);
        }
        if let Some(raw) = bytes.strip_prefix(ECDSA_PRIVATE_DER_PREFIX) {
            return Self::from_bytes_ecdsa(raw);
        }
        Err(Error::parse("unrecognized private key DER encoding"))
    }

    pub fn from_str_ed25519(s: &str) -> Result<Self> {
        Self::from_bytes_ed25519(&decode_hex(s)?)
    }

    pub fn from_str_ecdsa(s: &str) -> Result<Self> {
        Self::from_bytes_ecdsa(&decode_hex(s)?)
    }

    pub fn from_str_der(s: &str) -> Result<Self> {
        Self::from_bytes_der(&decode_hex(s)?)
    }

    pub(crate) fn from_extended(algorithm: KeyAlgorithm, extended: &ExtendedKey) -> Result<Self> {
        let mut key = match algorithm {
            KeyAlgorithm::Ed25519 => Self::from_bytes_ed25519(&extended.key)?,
            KeyAlgorithm::EcdsaSecp256k1 => Self::from_bytes_ecdsa(&extended.key)?,
        };
        key.chain_code = Some(extended.chain_code);
        Ok(key)
    }

    pub fn algorithm(&self) -> KeyAlgorithm {
        match &self.key {
            SigningKey::Ed25519(_) => KeyAlgorithm::Ed25519,
            SigningKey::EcdsaSecp256k1(_) => KeyAlgorithm::EcdsaSecp256k1,
        }
    }

    pub fn public_key(&self) -> PublicKey {
        match &self.key {
            SigningKey::Ed25519(key) => PublicKey::Ed25519(key.verifying_key().to_bytes()),
            SigningKey::EcdsaSecp256k1(key) => {
                let point = key.verifying_key().to_encoded_point(true);
                let mut bytes = [0u8; 33];
                bytes.copy_from_slice(point.as_bytes());
                PublicKey::EcdsaSecp256k1(bytes)
            }
        }
    }

    /// Signs `message`. Deterministic for a given key and message.
    pub fn sign(&self, message: &[u8]) -> Signature {
        match &self.key {
            SigningKey::Ed25519(key) => Signature::Ed25519(key.sign(message).to_bytes()),
            SigningKey::EcdsaSecp256k1(key) => {
                let signature: k256::ecdsa::Signature =
                    key.sign_digest(Keccak256::new_with_prefix(message));
                let mut bytes = [0u8; 64];
                bytes.copy_from_slice(&signature.to_bytes());
                Signature::EcdsaSecp256k1(bytes)
            }
        }
    }

    /// Raw secret bytes. Handle with care.
    pub fn to_bytes_raw(&self) -> [u8; 32] {
        match &self.key {
            SigningKey::Ed25519(key) => key.to_bytes(),
            SigningKey::EcdsaSecp256k1(key) => {
                let mut bytes = [0u8; 32];
                bytes.copy_from_slice(&key.to_bytes());
                bytes
            }
        }
    }

    pub fn to_bytes_der(&self) -> Vec<u8> {
        let prefix = match self.algorithm() {
            KeyAlgorithm::Ed25519 => ED25519_PRIVATE_DER_PREFIX,
            KeyAlgorithm::EcdsaSecp256k1 => ECDSA_PRIVATE_DER_PREFIX,
        };
        [prefix, &self.to_bytes_raw()[..]].concat()
    }

    pub fn to_string_raw(&self) -> String {
        hex::encode(self.to_bytes_raw())
    }

    pub fn chain_code(&self) -> Option<[u8; 32]> {
        self.chain_code
    }

    /// Whether [`derive`](Self::derive) can be called on this key.
    pub fn is_derivable(&self) -> bool {
        self.chain_code.is_some()
    }

    /// Derives child `index`.
    ///
    /// Ed25519 children are always hardened. For secp256k1 set
    /// [`derive::HARDENED`] in `index` to request a hardened child.
    pub fn derive(&self, index: u32) -> Result<Self> {
        let chain_code = self
            .chain_code
            .ok_or_else(|| Error::KeyDerive("key has no chain code".into()))?;
        let parent = ExtendedKey {
            key: self.to_bytes_raw(),
            chain_code,
        };
        let child = match self.algorithm() {
            KeyAlgorithm::Ed25519 => derive::ed25519_child(&parent, index)?,
            KeyAlgorithm::EcdsaSecp256k1 => derive::secp256k1_child(&parent, index)?,
        };
        Self::from_extended(self.algorithm(), &child)
    }
}

impl fmt::Debug for PrivateKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        // Never print secret material.
        write!(f, "PrivateKey(pub={})", self.public_key())
    }
}

impl fmt::Display for PrivateKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&hex::encode(self.to_bytes_der()))
    }
}

impl FromStr for PrivateKey {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self> {
        Self::from_str_der(s)
    }
}

impl PartialEq for PrivateKey {
    /// Keys compare by public key; secret bytes are never compared.
    fn eq(&self, other: &Self) -> bool {
        self.public_key() == other.public_key()
    }
}

impl Eq for PrivateKey {}

// ---------------------------------------------------------------------------
// PublicKey
// ---------------------------------------------------------------------------

/// A public key. ECDSA keys are held in compressed SEC1 form.
#[derive(Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum PublicKey {
    Ed25519([u8; 32]),
    EcdsaSecp256k1([u8; 33]),
}

impl PublicKey {
    pub fn from_bytes_ed25519(bytes: &[u8]) -> Result<Self> {
        let bytes: [u8; 32] = bytes
            .try_into()
            .map_err(|_| Error::parse("Ed25519 public key must be 32 bytes"))?;
        ed25519_dalek::VerifyingKey::from_bytes(&bytes)
            .map_err(|_| Error::parse("invalid Ed25519 public key"))?;
        Ok(Self::Ed25519(bytes))
    }

    /// Accepts compressed (33 bytes) or uncompressed (65 bytes) SEC1.
    pub fn from_bytes_ecdsa(bytes: &[u8]) -> Result<Self> {
        let key = k256::ecdsa::VerifyingKey::from_sec1_bytes(bytes)
            .map_err(|_| Error::parse("invalid secp256k1 public key"))?;
        let point = key.to_encoded_point(true);
        let mut out = [0u8; 33];
        out.copy_from_slice(point.as_bytes());
        Ok(Self::EcdsaSecp256k1(out))
    }

    pub fn from_bytes_der(bytes: &[u8]) -> Result<Self> {
        if let Some(raw) = bytes.strip_prefix(ED25519_PUBLIC_DER_PREFIX) {
            return Self::from_bytes_ed25519(raw);
        }
        if let Some(raw) = bytes.strip_prefix(ECDSA_PUBLIC_DER_PREFIX) {
            return Self::from_bytes_ecdsa(raw);
        }
        Err(Error::parse("unrecognized public key DER encoding"))
    }

    pub fn from_str_der(s: &str) -> Result<Self> {
        Self::from_bytes_der(&decode_hex(s)?)
    }

    pub fn algorithm(&self) -> KeyAlgorithm {
        match self {
            Self::Ed25519(_) => KeyAlgorithm::Ed25519,
            Self::EcdsaSecp256k1(_) => KeyAlgorithm::EcdsaSecp256k1,
        }
    }

    pub fn to_bytes_raw(&self) -> Vec<u8> {
        match self {
            Self::Ed25519(bytes) => bytes.to_vec(),
            Self::EcdsaSecp256k1(bytes) => bytes.to_vec(),
        }
    }

    pub fn to_bytes_der(&self) -> Vec<u8> {
        let prefix = match self {
            Self::Ed25519(_) => ED25519_PUBLIC_DER_PREFIX,
            Self::EcdsaSecp256k1(_) => ECDSA_PUBLIC_DER_PREFIX,
        };
        [prefix, &self.to_bytes_raw()[..]].concat()
    }

    pub fn to_string_raw(&self) -> String {
        hex::encode(self.to_bytes_raw())
    }

    /// The 20-byte EVM address of a secp256k1 key: the last 20 bytes of the
    /// Keccak-256 of the uncompressed point, without its `0x04` tag.
    /// Ed25519 keys have none.
    pub fn to_evm_address(&self) -> Option<[u8; 20]> {
        let Self::EcdsaSecp256k1(bytes) = self else {
            return None;
        };
        let key = k256::ecdsa::VerifyingKey::from_sec1_bytes(bytes).ok()?;
        let point = key.to_encoded_point(false);
        let digest = keccak256(&point.as_bytes()[1..]);
        let mut address = [0u8; 20];
        address.copy_from_slice(&digest[12..]);
        Some(address)
    }

    /// Checks `signature` over exactly `message`.
    pub fn verify(&self, message: &[u8], signature: &Signature) -> Result<()> {
        let invalid = || Error::Signature(format!("signature does not verify for {self}"));
        match (self, signature) {
            (Self::Ed25519(key), Signature::Ed25519(sig)) => {
                let key = ed25519_dalek::VerifyingKey::from_bytes(key).map_err(|_| invalid())?;
                key.verify(message, &ed25519_dalek::Signature::from_bytes(sig))
                    .map_err(|_| invalid())
            }
            (Self::EcdsaSecp256k1(key), Signature::EcdsaSecp256k1(sig)) => {
                let key =
                    k256::ecdsa::VerifyingKey::from_sec1_bytes(key).map_err(|_| invalid())?;
                let sig = k256::ecdsa::Signature::from_slice(sig).map_err(|_| invalid())?;
                key.verify_digest(Keccak256::new_with_prefix(message), &sig)
                    .map_err(|_| invalid())
            }
            _ => Err(Error::Signature(
                "signature algorithm does not match key algorithm".into(),
            )),
        }
    }
}

impl fmt::Display for PublicKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&hex::encode(self.to_bytes_der()))
    }
}

impl fmt::Debug for PublicKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "PublicKey({:?}, {})", self.algorithm(), self.to_string_raw())
    }
}

impl FromStr for PublicKey {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self> {
        Self::from_str_der(s)
    }
}

// ---------------------------------------------------------------------------
// Signature
// ---------------------------------------------------------------------------

/// A 64-byte signature tagged with its curve. ECDSA signatures are `r || s`.
#[derive(Clone, Copy, PartialEq, Eq, Hash)]
pub enum Signature {
    Ed25519([u8; 64]),
    EcdsaSecp256k1([u8; 64]),
}

impl Signature {
    pub fn as_bytes(&self) -> &[u8; 64] {
        match self {
            Self::Ed25519(bytes) | Self::EcdsaSecp256k1(bytes) => bytes,
        }
    }

    /// Rebuilds a signature from wire bytes for `algorithm`.
    pub fn from_bytes(algorithm: KeyAlgorithm, bytes: &[u8]) -> Result<Self> {
        let bytes: [u8; 64] = bytes
            .try_into()
            .map_err(|_| Error::decode("signature must be 64 bytes"))?;
        Ok(match algorithm {
            KeyAlgorithm::Ed25519 => Self::Ed25519(bytes),
            KeyAlgorithm::EcdsaSecp256k1 => Self::EcdsaSecp256k1(bytes),
        })
    }

    pub fn to_hex(&self) -> String {
        hex::encode(self.as_bytes())
    }
}

impl fmt::Debug for Signature {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Signature({}..)", &self.to_hex()[..16])
    }
}

fn decode_hex(s: &str) -> Result<Vec<u8>> {
    let s = s.strip_prefix("0x").unwrap_or(s);
    hex::decode(s).map_err(|e| Error::parse(format!("invalid hex: {e}")))
}
