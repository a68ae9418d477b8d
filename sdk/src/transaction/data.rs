//! The seam between the generic transaction machinery and concrete kinds.

use std::fmt::Debug;

use super::chunk::{ChunkData, ChunkInfo};
use crate::entity::EntityId;
use crate::error::Result;
use crate::proto::services;

/// What a transaction kind has to provide.
///
/// The builder, freezer and execution engine only ever talk to a kind
/// through this trait: they never look at concrete payload types.
pub trait TransactionData: Clone + Debug + Send + Sync + 'static {
    /// RPC method the kind is submitted through.
    fn method(&self) -> &'static str;

    /// The payload that gets split across chunks, for chunked kinds.
    fn chunk_data(&self) -> Option<&ChunkData> {
        None
    }

    /// Entity IDs whose checksums are checked before submission.
    fn entity_ids(&self) -> Vec<EntityId> {
        Vec::new()
    }

    /// Kind-specific checks run at freeze time.
    fn validate(&self) -> Result<()> {
        Ok(())
    }

    /// The kind's part of the body for one chunk.
    fn to_body_data(&self, chunk: &ChunkInfo) -> services::transaction_body::Data;

    /// Rebuilds the kind from the body data of every chunk, in chain order.
    fn from_body_data(chunks: Vec<services::transaction_body::Data>) -> Result<Self>;

    /// Number of chunks the payload needs.
    fn chunk_count(&self) -> Result<usize> {
        self.chunk_data().map_or(Ok(1), ChunkData::checked_chunks)
    }
}
