//! Appending bytes to a ledger file, split into 4 KiB chunks.

use super::builder::Transaction;
use super::chunk::{ChunkData, ChunkInfo};
use super::data::TransactionData;
use crate::config::{DEFAULT_MAX_CHUNKS, FILE_APPEND_CHUNK_SIZE};
use crate::entity::{EntityId, FileId};
use crate::error::{Error, Result};
use crate::proto::{services, FromProtobuf, ToProtobuf};

pub type FileAppendTransaction = Transaction<FileAppendData>;

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FileAppendData {
    file_id: Option<FileId>,
    chunks: ChunkData,
}

impl Default for FileAppendData {
    fn default() -> Self {
        Self {
            file_id: None,
            chunks: ChunkData::new(FILE_APPEND_CHUNK_SIZE, DEFAULT_MAX_CHUNKS),
        }
    }
}

impl FileAppendData {
    pub fn file_id(&self) -> Option<FileId> {
        self.file_id
    }

    pub fn contents(&self) -> &[u8] {
        &self.chunks.data
    }
}

impl FileAppendTransaction {
    pub fn file_id(mut self, file_id: FileId) -> Self {
        self.data_mut().file_id = Some(file_id);
        self
    }

    pub fn contents(mut self, contents: impl Into<Vec<u8>>) -> Self {
        self.data_mut().chunks.data = contents.into();
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

impl TransactionData for FileAppendData {
    fn method(&self) -> &'static str {
        "proto.FileService/appendContent"
    }

    fn chunk_data(&self) -> Option<&ChunkData> {
        Some(&self.chunks)
    }

    fn entity_ids(&self) -> Vec<EntityId> {
        self.file_id.iter().map(FileId::entity_id).collect()
    }

    fn to_body_data(&self, chunk: &ChunkInfo) -> services::transaction_body::Data {
        services::transaction_body::Data::FileAppend(services::FileAppendTransactionBody {
            file_id: self.file_id.map(|id| id.to_protobuf()),
            contents: self.chunks.chunk(chunk.current).to_vec(),
        })
    }

    fn from_body_data(chunks: Vec<services::transaction_body::Data>) -> Result<Self> {
        let total = chunks.len();
        let mut data = Self::default();
        data.chunks.max_chunks = data.chunks.max_chunks.max(total);

        for (index, chunk) in chunks.into_iter().enumerate() {
            let services::transaction_body::Data::FileAppend(body) = chunk else {
                return Err(Error::decode("transaction body is not a file append"));
            };
            let file_id = body.file_id.map(FileId::from_protobuf).transpose()?;
            if index == 0 {
                data.file_id = file_id;
                if total > 1 {
                    data.chunks.chunk_size = body.contents.len().max(1);
                }
            } else if file_id != data.file_id {
                return Err(Error::decode("chunks address different files"));
            }
            data.chunks.data.extend_from_slice(&body.contents);
        }

        Ok(data)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn contents_split_at_four_kib() {
        let tx = FileAppendTransaction::new()
            .file_id(FileId::new(0, 0, 150))
            .contents(vec![1u8; 4096 * 2 + 10]);
        assert_eq!(tx.data().chunk_count().unwrap(), 3);
    }

    #[test]
    fn body_carries_only_its_slice() {
        let tx = FileAppendTransaction::new()
            .file_id(FileId::new(0, 0, 150))
            .contents(vec![9u8; 5000]);
        let id = "0.0.2@1.0".parse().unwrap();
        let services::transaction_body::Data::FileAppend(body) =
            tx.data().to_body_data(&ChunkInfo::new(1, 2, id))
        else {
            panic!("wrong body kind");
        };
        assert_eq!(body.contents.len(), 5000 - 4096);
    }

    #[test]
    fn mismatched_files_fail_to_decode() {
        let id = "0.0.2@1.0".parse().unwrap();
        let a = FileAppendTransaction::new().file_id(FileId::new(0, 0, 1)).contents("a");
        let b = FileAppendTransaction::new().file_id(FileId::new(0, 0, 2)).contents("b");
        let bodies = vec![
            a.data().to_body_data(&ChunkInfo::new(0, 2, id)),
            b.data().to_body_data(&ChunkInfo::new(1, 2, id)),
        ];
        assert!(matches!(FileAppendData::from_body_data(bodies), Err(Error::Decode(_))));
    }
}
