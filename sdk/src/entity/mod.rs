//! # Entity Identity
//!
//! Addresses for ledger-resident resources and the checksum scheme that
//! ties an address to the ledger it was minted on.
//!
//! ```text
//! ledger.rs    — LedgerId: mainnet / testnet / previewnet / custom bytes
//! checksum.rs  — the five-letter weighted digest
//! id.rs        — EntityId and the typed AccountId / FileId / TopicId
//! ```
//!
//! Checksums are validated lazily: an ID can be parsed long before the SDK
//! knows which network it will be used against, so the check happens when a
//! client first executes something that references it.

pub mod checksum;
pub mod id;
pub mod ledger;

pub use checksum::Checksum;
pub use id::{AccountId, EntityId, FileId, TopicId};
pub use ledger::LedgerId;
