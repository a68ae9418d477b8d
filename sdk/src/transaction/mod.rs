//! # Transaction Module
//!
//! Building, freezing, signing and submitting transactions.
//!
//! ## Architecture
//!
//! ```text
//! id.rs            — TransactionId: payer + valid start, monotonic generation
//! chunk.rs         — ChunkInfo and the payload splitter
//! data.rs          — TransactionData, the per-kind capability trait
//! builder.rs       — Transaction<D>: the mutable builder
//! frozen.rs        — FrozenTransaction<D>: signing, bytes, hashes, execution
//! signing.rs       — SignatureSet and the signed-body envelope
//! response.rs      — TransactionResponse, the node's acceptance
//! transfer.rs      — hbar transfers
//! topic_message.rs — chunked consensus messages
//! file_append.rs   — chunked file appends
//! ```
//!
//! ## Transaction Lifecycle
//!
//! 1. **Build**: set fields on a [`Transaction`].
//! 2. **Freeze**: [`Transaction::freeze_with`] assigns the ID and nodes and
//!    encodes one body per chunk and node. Nothing in a body changes after
//!    this point.
//! 3. **Sign**: [`FrozenTransaction::sign`] signs every body.
//! 4. **Submit**: [`FrozenTransaction::execute`] submits chunk by chunk.
//! 5. **Resolve**: [`TransactionResponse::get_receipt`] polls for the outcome.
//!
//! ## Design Decisions
//!
//! - The builder and the frozen form are different types. Mutating after
//!   freeze and executing before it are both compile errors.
//! - Retries resend the exact signed bytes under the same transaction ID, so
//!   a submission the client gave up on but the network recorded shows up as
//!   a duplicate rather than a second transfer.

pub mod builder;
pub mod chunk;
pub mod data;
pub mod file_append;
pub mod frozen;
pub mod id;
pub mod response;
pub mod signing;
pub mod topic_message;
pub mod transfer;

pub use builder::Transaction;
pub use chunk::{ChunkData, ChunkInfo};
pub use data::TransactionData;
pub use file_append::{FileAppendData, FileAppendTransaction};
pub use frozen::FrozenTransaction;
pub use id::TransactionId;
pub use response::TransactionResponse;
pub use signing::SignatureSet;
pub use topic_message::{TopicMessageSubmitData, TopicMessageSubmitTransaction};
pub use transfer::{TransferData, TransferTransaction};
