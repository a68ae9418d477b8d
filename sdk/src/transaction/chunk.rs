//! Splitting oversized payloads into an ordered chain of chunks.
//!
//! Every transaction is a chain, most of them of length one. Chunk `i` gets
//! its own transaction ID (the initial ID plus `i` nanoseconds), its own body
//! and its own signatures; a signature on chunk 0 says nothing about chunk 1.

use crate::entity::AccountId;
use crate::error::{Error, Result};
use crate::proto::services;
use crate::proto::ToProtobuf;

use super::id::TransactionId;

/// Where one chunk sits in its chain.
///
/// `current < total`, `total >= 1`, and for a single chunk the current and
/// initial IDs are equal.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ChunkInfo {
    pub current: usize,
    pub total: usize,
    pub initial_transaction_id: TransactionId,
    pub current_transaction_id: TransactionId,
    /// The node this chunk's body is addressed to, once one is chosen.
    pub node_account_id: Option<AccountId>,
}

impl ChunkInfo {
    /// Info for chunk `current` of `total` in the chain started by `initial`.
    pub(crate) fn new(current: usize, total: usize, initial: TransactionId) -> Self {
        debug_assert!(current < total);
        Self {
            current,
            total,
            initial_transaction_id: initial,
            current_transaction_id: initial.offset_nanos(current),
            node_account_id: None,
        }
    }

    /// A single-chunk chain.
    pub(crate) fn single(transaction_id: TransactionId) -> Self {
        Self::new(0, 1, transaction_id)
    }

    pub(crate) fn with_node(mut self, node_account_id: AccountId) -> Self {
        self.node_account_id = Some(node_account_id);
        self
    }

    pub fn is_chunked(&self) -> bool {
        self.total > 1
    }

    /// The consensus-service chunk header. Only chained messages carry one.
    pub(crate) fn to_consensus_chunk_info(&self) -> Option<services::ConsensusMessageChunkInfo> {
        self.is_chunked().then(|| services::ConsensusMessageChunkInfo {
            initial_transaction_id: Some(self.initial_transaction_id.to_protobuf()),
            total: self.total as i32,
            number: (self.current + 1) as i32,
        })
    }
}

/// A byte payload that may be spread over several chunks.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ChunkData {
    pub data: Vec<u8>,
    pub chunk_size: usize,
    pub max_chunks: usize,
}

impl ChunkData {
    pub fn new(chunk_size: usize, max_chunks: usize) -> Self {
        Self {
            data: Vec::new(),
            chunk_size,
            max_chunks,
        }
    }

    /// Chunks needed for the payload. An empty payload still takes one.
    pub fn required_chunks(&self) -> usize {
        self.data.len().div_ceil(self.chunk_size.max(1)).max(1)
    }

    /// Checks the payload fits and returns the chunk count.
    pub fn checked_chunks(&self) -> Result<usize> {
        let required = self.required_chunks();
        if required > self.max_chunks {
            return Err(Error::MaxChunksExceeded {
                required,
                max: self.max_chunks,
            });
        }
        Ok(required)
    }

    /// The slice of the payload carried by chunk `index`.
    pub fn chunk(&self, index: usize) -> &[u8] {
        let size = self.chunk_size.max(1);
        let start = (index * size).min(self.data.len());
        let end = (start + size).min(self.data.len());
        &self.data[start..end]
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn id() -> TransactionId {
        "0.0.1001@1700000000.000000000".parse().unwrap()
    }

    #[test]
    fn chunk_count_rounds_up() {
        let mut data = ChunkData::new(1024, 20);
        assert_eq!(data.required_chunks(), 1);
        data.data = vec![0; 1024];
        assert_eq!(data.required_chunks(), 1);
        data.data = vec![0; 1025];
        assert_eq!(data.required_chunks(), 2);
    }

    #[test]
    fn too_many_chunks_is_an_error() {
        let mut data = ChunkData::new(10, 3);
        data.data = vec![0; 31];
        assert!(matches!(
            data.checked_chunks(),
            Err(Error::MaxChunksExceeded { required: 4, max: 3 })
        ));
    }

    #[test]
    fn chunks_cover_payload_exactly() {
        let mut data = ChunkData::new(4, 10);
        data.data = (0u8..10).collect();
        let joined: Vec<u8> = (0..data.required_chunks())
            .flat_map(|i| data.chunk(i).to_vec())
            .collect();
        assert_eq!(joined, data.data);
        assert_eq!(data.chunk(2), &[8, 9]);
    }

    #[test]
    fn single_chunk_ids_coincide() {
        let info = ChunkInfo::single(id());
        assert_eq!(info.current_transaction_id, info.initial_transaction_id);
        assert!(!info.is_chunked());
        assert!(info.to_consensus_chunk_info().is_none());
    }

    #[test]
    fn chained_info_numbers_from_one() {
        let info = ChunkInfo::new(2, 3, id());
        let header = info.to_consensus_chunk_info().unwrap();
        assert_eq!(header.number, 3);
        assert_eq!(header.total, 3);
        assert_eq!(info.current_transaction_id.to_string(), "0.0.1001@1700000000.000000002");
    }
}
