//! # Cryptographic Primitives
//!
//! Everything that touches key material lives here: the two signature
//! schemes the network accepts, the digests around them, and the recovery
//! phrase machinery that turns 24 words into a wallet.
//!
//! - **Ed25519** for most accounts. Fast, deterministic, boring.
//! - **ECDSA secp256k1** over Keccak-256 for EVM-compatible accounts.
//! - **SHA-384** for transaction hashes.
//! - **BIP-39 / SLIP-10 / BIP-32** for mnemonic derivation.
//!
//! ## A note on "rolling your own crypto"
//!
//! We don't. The curve arithmetic, hashes and KDFs come from audited
//! RustCrypto and dalek crates; this module only arranges bytes in the order
//! the network expects them.

mod derive;
pub mod hash;
pub mod keys;
pub mod mnemonic;

pub use derive::HARDENED;
pub use hash::{keccak256, sha384};
pub use keys::{KeyAlgorithm, PrivateKey, PublicKey, Signature};
pub use mnemonic::Mnemonic;
