//! What a node says when it accepts a transaction for consensus.

use std::fmt;

use crate::client::Client;
use crate::entity::AccountId;
use crate::error::Result;
use crate::query::{
    TransactionReceipt, TransactionReceiptQuery, TransactionRecord, TransactionRecordQuery,
};

use super::id::TransactionId;

/// Acceptance of one chunk by one node.
///
/// Acceptance only means the node passed precheck. The outcome is in the
/// receipt, which is asked of the same node.
#[derive(Clone, PartialEq, Eq)]
pub struct TransactionResponse {
    pub node_account_id: AccountId,
    pub transaction_id: TransactionId,
    /// SHA-384 of the signed bytes sent to `node_account_id`.
    pub transaction_hash: Vec<u8>,
    /// Dispatches it took, including the accepted one.
    pub attempts: usize,
    /// Whether [`get_receipt`](Self::get_receipt) fails on a non-success
    /// status. On by default.
    pub validate_status: bool,
}

impl TransactionResponse {
    pub fn validate_status(mut self, validate: bool) -> Self {
        self.validate_status = validate;
        self
    }

    /// A receipt query aimed at the node that accepted the transaction.
    pub fn get_receipt_query(&self) -> TransactionReceiptQuery {
        TransactionReceiptQuery::new()
            .transaction_id(self.transaction_id)
            .node_account_ids([self.node_account_id])
            .validate_status(self.validate_status)
    }

    /// A record query aimed at the node that accepted the transaction.
    pub fn get_record_query(&self) -> TransactionRecordQuery {
        TransactionRecordQuery::new()
            .transaction_id(self.transaction_id)
            .node_account_ids([self.node_account_id])
            .validate_status(self.validate_status)
    }

    /// Polls until the receipt is known.
    pub async fn get_receipt(&self, client: &Client) -> Result<TransactionReceipt> {
        self.get_receipt_query().execute(client).await
    }

    /// Waits for the receipt, then fetches the (paid) record.
    pub async fn get_record(&self, client: &Client) -> Result<TransactionRecord> {
        self.get_receipt(client).await?;
        self.get_record_query().execute(client).await
    }
}

impl fmt::Debug for TransactionResponse {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("TransactionResponse")
            .field("node_account_id", &self.node_account_id)
            .field("transaction_id", &self.transaction_id)
            .field("transaction_hash", &hex::encode(&self.transaction_hash))
            .field("attempts", &self.attempts)
            .field("validate_status", &self.validate_status)
            .finish()
    }
}
