//! Consensus-service message submission.
//!
//! Messages longer than one chunk are split and each piece is submitted as
//! its own transaction. Every piece carries a header naming the chain's
//! initial transaction ID, its 1-based position and the chain length so
//! subscribers can reassemble the message.

use super::builder::Transaction;
use super::chunk::{ChunkData, ChunkInfo};
use super::data::TransactionData;
use crate::config::{DEFAULT_MAX_CHUNKS, TOPIC_MESSAGE_CHUNK_SIZE};
use crate::entity::{EntityId, TopicId};
use crate::error::{Error, Result};
use crate::proto::{services, FromProtobuf, ToProtobuf};

pub type TopicMessageSubmitTransaction = Transaction<TopicMessageSubmitData>;

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TopicMessageSubmitData {
    topic_id: Option<TopicId>,
    chunks: ChunkData,
}

impl Default for TopicMessageSubmitData {
    fn default() -> Self {
        Self {
            topic_id: None,
            chunks: ChunkData::new(TOPIC_MESSAGE_CHUNK_SIZE, DEFAULT_MAX_CHUNKS),
        }
    }
}

impl TopicMessageSubmitData {
    pub fn topic_id(&self) -> Option<TopicId> {
        self.topic_id
    }

    pub fn message(&self) -> &[u8] {
        &self.chunks.data
    }
}

impl TopicMessageSubmitTransaction {
    pub fn topic_id(mut self, topic_id: TopicId) -> Self {
        self.data_mut().topic_id = Some(topic_id);
        self
    }

    pub fn message(mut self, message: impl Into<Vec<u8>>) -> Self {
        self.data_mut().chunks.data = message.into();
        self
    }

    pub fn max_chunks(mut self, max_chunks: usize) -> Self {
        self.data_mut().chunks.max_chunks = max_chunks;
        self
    }

    pub fn chunk_size(mut self, chunk_size: usize) -> Self {
        self.data_mut().chunks.chunk_size = chunk_size;
        self
    }
}

impl TransactionData for TopicMessageSubmitData {
    fn method(&self) -> &'static str {
        "proto.ConsensusService/submitMessage"
    }

    fn chunk_data(&self) -> Option<&ChunkData> {
        Some(&self.chunks)
    }

    fn entity_ids(&self) -> Vec<EntityId> {
        self.topic_id.iter().map(TopicId::entity_id).collect()
    }

    fn to_body_data(&self, chunk: &ChunkInfo) -> services::transaction_body::Data {
        services::transaction_body::Data::ConsensusSubmitMessage(
            services::ConsensusSubmitMessageTransactionBody {
                topic_id: self.topic_id.map(|id| id.to_protobuf()),
                message: self.chunks.chunk(chunk.current).to_vec(),
                chunk_info: chunk.to_consensus_chunk_info(),
            },
        )
    }

    fn from_body_data(chunks: Vec<services::transaction_body::Data>) -> Result<Self> {
        let total = chunks.len();
        let mut data = Self::default();
        data.chunks.max_chunks = data.chunks.max_chunks.max(total);

        for (index, chunk) in chunks.into_iter().enumerate() {
            let services::transaction_body::Data::ConsensusSubmitMessage(body) = chunk else {
                return Err(Error::decode("transaction body is not a topic message submit"));
            };
            let topic_id = body.topic_id.map(TopicId::from_protobuf).transpose()?;
            if index == 0 {
                data.topic_id = topic_id;
                if total > 1 {
                    data.chunks.chunk_size = body.message.len().max(1);
                }
            } else if topic_id != data.topic_id {
                return Err(Error::decode("chunks address different topics"));
            }
            data.chunks.data.extend_from_slice(&body.message);
        }

        Ok(data)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::transaction::TransactionId;

    fn initial() -> TransactionId {
        "0.0.1001@1700000000.000000000".parse().unwrap()
    }

    #[test]
    fn defaults_follow_network_limits() {
        let data = TopicMessageSubmitData::default();
        assert_eq!(data.chunks.chunk_size, 1024);
        assert_eq!(data.chunks.max_chunks, 20);
    }

    #[test]
    fn single_chunk_carries_no_header() {
        let tx = TopicMessageSubmitTransaction::new()
            .topic_id(TopicId::new(0, 0, 7))
            .message("hello");
        let services::transaction_body::Data::ConsensusSubmitMessage(body) =
            tx.data().to_body_data(&ChunkInfo::single(initial()))
        else {
            panic!("wrong body kind");
        };
        assert!(body.chunk_info.is_none());
        assert_eq!(body.message, b"hello");
    }

    #[test]
    fn chained_chunks_reassemble() {
        let message: Vec<u8> = (0..2500u32).map(|i| i as u8).collect();
        let tx = TopicMessageSubmitTransaction::new()
            .topic_id(TopicId::new(0, 0, 7))
            .message(message.clone());
        let total = tx.data().chunk_count().unwrap();
        assert_eq!(total, 3);

        let bodies: Vec<_> = (0..total)
            .map(|i| tx.data().to_body_data(&ChunkInfo::new(i, total, initial())))
            .collect();
        let restored = TopicMessageSubmitData::from_body_data(bodies).unwrap();
        assert_eq!(restored.message(), &message[..]);
        assert_eq!(restored.topic_id(), Some(TopicId::new(0, 0, 7)));
        assert_eq!(restored.chunks.chunk_size, 1024);
    }

    #[test]
    fn oversized_message_is_rejected() {
        let tx = TopicMessageSubmitTransaction::new()
            .message(vec![0u8; 1024 * 3 + 1])
            .max_chunks(3);
        assert!(matches!(
            tx.data().chunk_count(),
            Err(Error::MaxChunksExceeded { required: 4, max: 3 })
        ));
    }
}
