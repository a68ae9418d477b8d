//! Transaction receipts.
//!
//! A receipt is the cheapest answer to "what happened to my transaction":
//! the consensus status plus whatever entity the transaction created. Nodes
//! answer receipt queries for free, which is why the SDK polls them.

use prost::Message;
use tokio::time::Instant;
use tracing::debug;

use super::{precheck, query_header, GET_RECEIPT_METHOD};
use crate::client::Client;
use crate::entity::{AccountId, FileId, TopicId};
use crate::error::{Error, Result};
use crate::execute::{self, Execute, Outcome};
use crate::proto::{services, FromProtobuf, ToProtobuf};
use crate::status::Status;
use crate::transaction::TransactionId;

/// Outcome of a transaction once it reached consensus.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TransactionReceipt {
    pub status: Status,
    pub account_id: Option<AccountId>,
    pub file_id: Option<FileId>,
    pub topic_id: Option<TopicId>,
    pub topic_sequence_number: u64,
    pub topic_running_hash: Option<Vec<u8>>,
    pub topic_running_hash_version: u64,
}

impl ToProtobuf for TransactionReceipt {
    type Protobuf = services::TransactionReceipt;

    fn to_protobuf(&self) -> Self::Protobuf {
        services::TransactionReceipt {
            status: self.status.code(),
            account_id: self.account_id.map(|id| id.to_protobuf()),
            file_id: self.file_id.map(|id| id.to_protobuf()),
            topic_id: self.topic_id.map(|id| id.to_protobuf()),
            topic_sequence_number: self.topic_sequence_number,
            topic_running_hash: self.topic_running_hash.clone().unwrap_or_default(),
            topic_running_hash_version: self.topic_running_hash_version,
        }
    }
}

impl FromProtobuf<services::TransactionReceipt> for TransactionReceipt {
    fn from_protobuf(pb: services::TransactionReceipt) -> Result<Self> {
        Ok(Self {
            status: Status::from_code(pb.status),
            account_id: pb.account_id.map(AccountId::from_protobuf).transpose()?,
            file_id: pb.file_id.map(FileId::from_protobuf).transpose()?,
            topic_id: pb.topic_id.map(TopicId::from_protobuf).transpose()?,
            topic_sequence_number: pb.topic_sequence_number,
            topic_running_hash: Some(pb.topic_running_hash).filter(|hash| !hash.is_empty()),
            topic_running_hash_version: pb.topic_running_hash_version,
        })
    }
}

/// Polls for a transaction's receipt until it is known.
#[derive(Debug, Clone, Default)]
pub struct TransactionReceiptQuery {
    transaction_id: Option<TransactionId>,
    node_account_ids: Option<Vec<AccountId>>,
    include_duplicates: bool,
    validate_status: bool,
}

impl TransactionReceiptQuery {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn transaction_id(mut self, id: TransactionId) -> Self {
        self.transaction_id = Some(id);
        self
    }

    /// Nodes to ask. Defaults to any node in the network.
    pub fn node_account_ids(mut self, ids: impl IntoIterator<Item = AccountId>) -> Self {
        self.node_account_ids = Some(ids.into_iter().collect());
        self
    }

    pub fn include_duplicates(mut self, include: bool) -> Self {
        self.include_duplicates = include;
        self
    }

    /// Fail with `ReceiptStatus` when the receipt's status is not `SUCCESS`.
    pub fn validate_status(mut self, validate: bool) -> Self {
        self.validate_status = validate;
        self
    }

    pub async fn execute(&self, client: &Client) -> Result<TransactionReceipt> {
        self.execute_with_timeout(client, client.backoff().receipt_timeout)
            .await
    }

    pub async fn execute_with_timeout(
        &self,
        client: &Client,
        timeout: std::time::Duration,
    ) -> Result<TransactionReceipt> {
        let transaction_id = self
            .transaction_id
            .ok_or_else(|| Error::illegal_state("receipt query needs a transaction ID"))?;
        client.validate_checksums([transaction_id.account_id.entity_id()])?;

        let mut request = ReceiptRequest {
            query: self,
            transaction_id,
        };
        let deadline = Instant::now() + timeout;
        let executed = execute::execute(client, &mut request, deadline, None).await?;
        let receipt = executed.output;
        debug!(
            transaction_id = %transaction_id,
            status = %receipt.status,
            attempts = executed.attempts,
            "receipt resolved"
        );

        if self.validate_status && receipt.status != Status::Success {
            return Err(Error::ReceiptStatus {
                status: receipt.status,
                transaction_id,
            });
        }
        Ok(receipt)
    }
}

struct ReceiptRequest<'a> {
    query: &'a TransactionReceiptQuery,
    transaction_id: TransactionId,
}

impl Execute for ReceiptRequest<'_> {
    type Output = TransactionReceipt;

    fn node_account_ids(&self) -> Option<&[AccountId]> {
        self.query.node_account_ids.as_deref()
    }

    fn method(&self) -> &'static str {
        GET_RECEIPT_METHOD
    }

    fn make_request(&self, _node: AccountId) -> Result<Vec<u8>> {
        let query = services::TransactionGetReceiptQuery {
            header: Some(query_header(services::RESPONSE_TYPE_ANSWER_ONLY, None)),
            transaction_id: Some(self.transaction_id.to_protobuf()),
            include_duplicates: self.query.include_duplicates,
            include_child_receipts: false,
        };
        Ok(services::Query {
            query: Some(services::query::Query::TransactionGetReceipt(query)),
        }
        .encode_to_vec())
    }

    fn classify(&self, _node: AccountId, response: &[u8]) -> Outcome<TransactionReceipt> {
        let response = match services::Response::decode(response) {
            Ok(services::Response {
                response: Some(services::response::Response::TransactionGetReceipt(response)),
            }) => response,
            Ok(_) => return Outcome::Fatal(Error::decode("expected a receipt response")),
            Err(err) => return Outcome::Fatal(err.into()),
        };
        if let Err(outcome) = precheck(response.header, self.transaction_id) {
            return outcome;
        }
        let Some(receipt) = response.receipt else {
            return Outcome::Fatal(Error::decode("receipt response has no receipt"));
        };

        let status = Status::from_code(receipt.status);
        if status.is_pending() {
            return Outcome::Pending(Error::Rejected {
                status,
                transaction_id: Some(self.transaction_id),
            });
        }
        match TransactionReceipt::from_protobuf(receipt) {
            Ok(receipt) => Outcome::Done(receipt),
            Err(err) => Outcome::Fatal(err),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn id() -> TransactionId {
        "0.0.1001@1700000000.000000000".parse().unwrap()
    }

    fn respond(precheck: Status, receipt: Option<Status>) -> Vec<u8> {
        services::Response {
            response: Some(services::response::Response::TransactionGetReceipt(
                services::TransactionGetReceiptResponse {
                    header: Some(services::ResponseHeader {
                        node_transaction_precheck_code: precheck.code(),
                        ..Default::default()
                    }),
                    receipt: receipt.map(|status| services::TransactionReceipt {
                        status: status.code(),
                        topic_id: Some(TopicId::new(0, 0, 9).to_protobuf()),
                        topic_sequence_number: 4,
                        ..Default::default()
                    }),
                },
            )),
        }
        .encode_to_vec()
    }

    fn classify(bytes: &[u8]) -> Outcome<TransactionReceipt> {
        let query = TransactionReceiptQuery::new();
        let request = ReceiptRequest {
            query: &query,
            transaction_id: id(),
        };
        request.classify(AccountId::new(0, 0, 3), bytes)
    }

    #[test]
    fn success_resolves() {
        let Outcome::Done(receipt) = classify(&respond(Status::Ok, Some(Status::Success))) else {
            panic!("expected a receipt");
        };
        assert_eq!(receipt.status, Status::Success);
        assert_eq!(receipt.topic_id, Some(TopicId::new(0, 0, 9)));
        assert_eq!(receipt.topic_sequence_number, 4);
    }

    #[test]
    fn unknown_status_polls_again() {
        assert!(matches!(
            classify(&respond(Status::Ok, Some(Status::Unknown))),
            Outcome::Pending(_)
        ));
        assert!(matches!(
            classify(&respond(Status::ReceiptNotFound, None)),
            Outcome::Pending(_)
        ));
        assert!(matches!(classify(&respond(Status::Busy, None)), Outcome::Busy(_)));
    }

    #[test]
    fn failure_status_is_still_a_receipt() {
        assert!(matches!(
            classify(&respond(Status::Ok, Some(Status::InsufficientPayerBalance))),
            Outcome::Done(TransactionReceipt {
                status: Status::InsufficientPayerBalance,
                ..
            })
        ));
    }

    #[test]
    fn malformed_response_is_fatal() {
        assert!(matches!(classify(&[0xff, 0xff]), Outcome::Fatal(Error::Decode(_))));
        assert!(matches!(
            classify(&services::Response::default().encode_to_vec()),
            Outcome::Fatal(Error::Decode(_))
        ));
    }

    #[test]
    fn receipt_wire_round_trip() {
        let receipt = TransactionReceipt {
            status: Status::Success,
            account_id: Some(AccountId::new(0, 0, 1234)),
            file_id: None,
            topic_id: None,
            topic_sequence_number: 0,
            topic_running_hash: Some(vec![7; 48]),
            topic_running_hash_version: 3,
        };
        assert_eq!(TransactionReceipt::from_bytes(&receipt.to_bytes()).unwrap(), receipt);
    }
}
