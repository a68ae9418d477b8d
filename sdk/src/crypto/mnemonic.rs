//! # Mnemonic Phrases
//!
//! BIP-39 recovery phrases and the key paths the network's wallets agree on.
//!
//! A phrase is 12 or 24 words from the English list, encoding 128 or 256 bits
//! of entropy plus a short SHA-256 checksum. From the phrase:
//!
//! ```text
//! words ──PBKDF2-HMAC-SHA512 (2048 rounds, salt "mnemonic"+passphrase)──► seed (64 bytes)
//! seed  ──SLIP-10 "ed25519 seed"──► m/44'/3030'/0'/0'     to_private_key
//!                                  m/44'/3030'/0'/0'/i'   to_standard_ed25519_private_key
//! seed  ──BIP-32  "Bitcoin seed"──► m/44'/3030'/0'/0/i    to_standard_ecdsa_secp256k1_private_key
//! ```
//!
//! The same words and passphrase always produce the same key. Change the
//! passphrase and you get a different, equally valid wallet, which is the
//! point of having one.

use std::fmt;
use std::str::FromStr;

use bip39::Language;
use rand::rngs::OsRng;
use rand::RngCore;

use super::derive::{self, HARDENED};
use super::keys::{KeyAlgorithm, PrivateKey};
use crate::error::{Error, Result};

const SEED_LEN: usize = 64;

/// `44'/3030'/0'/0'`, shared by every path below.
const ACCOUNT_PATH: [u32; 4] = [44 | HARDENED, 3030 | HARDENED, HARDENED, HARDENED];

/// A validated 12- or 24-word recovery phrase.
#[derive(Clone, PartialEq, Eq)]
pub struct Mnemonic(bip39::Mnemonic);

impl Mnemonic {
    /// A fresh 12-word phrase (128 bits of entropy).
    pub fn generate_12() -> Result<Self> {
        Self::generate_from_rng(&mut OsRng, 12)
    }

    /// A fresh 24-word phrase (256 bits of entropy).
    pub fn generate_24() -> Result<Self> {
        Self::generate_from_rng(&mut OsRng, 24)
    }

    /// A phrase of `words` words (12 or 24) drawn from `rng`.
    pub fn generate_from_rng<R: RngCore>(rng: &mut R, words: usize) -> Result<Self> {
        let len = match words {
            12 => 16,
            24 => 32,
            n => {
                return Err(Error::parse(format!("mnemonic must have 12 or 24 words, got {n}")))
            }
        };
        let mut entropy = [0u8; 32];
        rng.fill_bytes(&mut entropy[..len]);
        Self::from_entropy(&entropy[..len])
    }

    /// The phrase encoding `entropy`, which must be 16 or 32 bytes.
    pub fn from_entropy(entropy: &[u8]) -> Result<Self> {
        if !matches!(entropy.len(), 16 | 32) {
            return Err(Error::parse(format!(
                "mnemonic entropy must be 16 or 32 bytes, got {}",
                entropy.len()
            )));
        }
        bip39::Mnemonic::from_entropy_in(Language::English, entropy)
            .map(Self)
            .map_err(|err| Error::parse(format!("invalid mnemonic entropy: {err}")))
    }

    pub fn words(&self) -> impl Iterator<Item = &'static str> + '_ {
        self.0.words()
    }

    pub fn word_count(&self) -> usize {
        self.0.word_count()
    }

    /// The BIP-39 seed for `passphrase`.
    pub fn to_seed(&self, passphrase: &str) -> [u8; SEED_LEN] {
        self.0.to_seed(passphrase)
    }

    /// The Ed25519 account key at `m/44'/3030'/0'/0'`.
    ///
    /// The result carries a chain code, so further children can be taken
    /// with [`PrivateKey::derive`].
    pub fn to_private_key(&self, passphrase: &str) -> Result<PrivateKey> {
        let mut key = derive::ed25519_master(&self.to_seed(passphrase))?;
        for index in ACCOUNT_PATH {
            key = derive::ed25519_child(&key, index)?;
        }
        PrivateKey::from_extended(KeyAlgorithm::Ed25519, &key)
    }

    /// The Ed25519 key at `m/44'/3030'/0'/0'/index'`.
    pub fn to_standard_ed25519_private_key(
        &self,
        passphrase: &str,
        index: u32,
    ) -> Result<PrivateKey> {
        if index & HARDENED != 0 {
            return Err(Error::KeyDerive(format!(
                "index {index} must be below 2^31"
            )));
        }
        self.to_private_key(passphrase)?.derive(index | HARDENED)
    }

    /// The secp256k1 key at `m/44'/3030'/0'/0/index`.
    pub fn to_standard_ecdsa_secp256k1_private_key(
        &self,
        passphrase: &str,
        index: u32,
    ) -> Result<PrivateKey> {
        let mut key = derive::secp256k1_master(&self.to_seed(passphrase))?;
        let path = [44 | HARDENED, 3030 | HARDENED, HARDENED, 0, index];
        for step in path {
            key = derive::secp256k1_child(&key, step)?;
        }
        PrivateKey::from_extended(KeyAlgorithm::EcdsaSecp256k1, &key)
    }
}

impl FromStr for Mnemonic {
    type Err = Error;

    /// Words are matched case-sensitively against the English list and the
    /// checksum must hold.
    fn from_str(s: &str) -> Result<Self> {
        let count = s.split_whitespace().count();
        if count != 12 && count != 24 {
            return Err(Error::parse(format!(
                "mnemonic must have 12 or 24 words, got {count}"
            )));
        }
        let words = s.split_whitespace().collect::<Vec<_>>().join(" ");
        bip39::Mnemonic::parse_in_normalized(Language::English, &words)
            .map(Self)
            .map_err(|err| Error::parse(format!("invalid mnemonic: {err}")))
    }
}

impl fmt::Display for Mnemonic {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        fmt::Display::fmt(&self.0, f)
    }
}

impl fmt::Debug for Mnemonic {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        // The phrase is a secret.
        write!(f, "Mnemonic({} words)", self.word_count())
    }
}
