// Copyright (c) 2026 ALAS Technology. MIT License.
// See LICENSE for details.

//! # Hiero SDK — Client Library
//!
//! Builds, signs and submits transactions to a Hiero ledger, then follows
//! them to consensus through receipt and record queries.
//!
//! ## Architecture
//!
//! - **entity** — `shard.realm.num` identifiers, ledger IDs and checksums.
//! - **crypto** — Ed25519 and ECDSA(secp256k1) keys, mnemonics, derivation.
//! - **transaction** — The builder, the frozen form, chunking, signing.
//! - **query** — Receipt and record lookups.
//! - **network** — Node list, per-node health, the transport seam.
//! - **client** — Operator, defaults, retry envelope, checksum cache.
//! - **proto** — Wire messages.
//! - **config** — Constants and JSON client configuration.
//!
//! ## Example
//!
//! ```no_run
//! # async fn run(transport: std::sync::Arc<dyn hiero_sdk::network::Transport>)
//! # -> hiero_sdk::Result<()> {
//! use hiero_sdk::{AccountId, Client, Hbar, PrivateKey, TransferTransaction};
//!
//! let client = Client::for_testnet();
//! client.set_transport(transport);
//! client.set_operator(AccountId::new(0, 0, 1001), PrivateKey::generate_ed25519());
//!
//! let receipt = TransferTransaction::new()
//!     .hbar_transfer(AccountId::new(0, 0, 1001), Hbar::new(-1))
//!     .hbar_transfer(AccountId::new(0, 0, 1002), Hbar::new(1))
//!     .freeze_with(&client)?
//!     .execute(&client)
//!     .await?
//!     .get_receipt(&client)
//!     .await?;
//! println!("{}", receipt.status);
//! # Ok(())
//! # }
//! ```
//!
//! ## Design Philosophy
//!
//! 1. A frozen transaction never changes its bytes. Retries resend what was
//!    signed.
//! 2. Every wait is bounded by a deadline and can be cancelled.
//! 3. Secret key bytes are never printed or compared.

pub mod client;
pub mod config;
pub mod crypto;
pub mod entity;
pub mod error;
pub(crate) mod execute;
pub mod hbar;
pub mod network;
pub mod proto;
pub mod query;
pub mod status;
pub mod timestamp;
pub mod transaction;

pub use client::{Client, Operator};
pub use crypto::{KeyAlgorithm, Mnemonic, PrivateKey, PublicKey, Signature};
pub use entity::{AccountId, Checksum, EntityId, FileId, LedgerId, TopicId};
pub use error::{Error, Result};
pub use hbar::Hbar;
pub use query::{TransactionReceipt, TransactionReceiptQuery, TransactionRecord};
pub use query::{TransactionRecordQuery, Transfer};
pub use status::Status;
pub use timestamp::Timestamp;
pub use transaction::{
    ChunkInfo, FileAppendTransaction, FrozenTransaction, TopicMessageSubmitTransaction,
    Transaction, TransactionId, TransactionResponse, TransferTransaction,
};
