//! Transaction records.
//!
//! A record is the full account of a transaction after consensus: the
//! receipt plus the consensus timestamp, the fee actually charged and every
//! balance change. Unlike receipts, records cost money to fetch.
//!
//! ## Payment flow
//!
//! 1. Ask one node what the query costs (`COST_ANSWER`, no payment).
//! 2. Refuse if that exceeds the max query payment.
//! 3. Build one payment transfer per candidate node (operator → node) and
//!    sign it with the operator key.
//! 4. Run the `ANSWER_ONLY` query, attaching the payment addressed to
//!    whichever node the engine picks.

use std::collections::BTreeMap;
use std::time::Duration;

use prost::Message;
use tokio::time::Instant;
use tracing::debug;

use super::receipt::TransactionReceipt;
use super::{precheck, query_header, GET_RECORD_METHOD};
use crate::client::{Client, Operator};
use crate::entity::AccountId;
use crate::error::{Error, Result};
use crate::execute::{self, Execute, Outcome};
use crate::hbar::Hbar;
use crate::proto::{required, services, FromProtobuf, ToProtobuf};
use crate::status::Status;
use crate::timestamp::Timestamp;
use crate::transaction::{TransactionId, TransferTransaction};

/// One balance change in a record.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Transfer {
    pub account_id: AccountId,
    pub amount: Hbar,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TransactionRecord {
    pub receipt: TransactionReceipt,
    pub transaction_hash: Vec<u8>,
    pub consensus_timestamp: Option<Timestamp>,
    pub transaction_id: TransactionId,
    pub memo: String,
    pub transaction_fee: Hbar,
    pub transfers: Vec<Transfer>,
}

impl ToProtobuf for TransactionRecord {
    type Protobuf = services::TransactionRecord;

    fn to_protobuf(&self) -> Self::Protobuf {
        let account_amounts = self
            .transfers
            .iter()
            .map(|transfer| services::AccountAmount {
                account_id: Some(transfer.account_id.to_protobuf()),
                amount: transfer.amount.to_tinybars(),
                is_approval: false,
            })
            .collect();

        services::TransactionRecord {
            receipt: Some(self.receipt.to_protobuf()),
            transaction_hash: self.transaction_hash.clone(),
            consensus_timestamp: self.consensus_timestamp.map(|ts| ts.to_protobuf()),
            transaction_id: Some(self.transaction_id.to_protobuf()),
            memo: self.memo.clone(),
            transaction_fee: self.transaction_fee.to_tinybars() as u64,
            transfer_list: Some(services::TransferList { account_amounts }),
        }
    }
}

impl FromProtobuf<services::TransactionRecord> for TransactionRecord {
    fn from_protobuf(pb: services::TransactionRecord) -> Result<Self> {
        let transfers = pb
            .transfer_list
            .unwrap_or_default()
            .account_amounts
            .into_iter()
            .map(|leg| {
                Ok(Transfer {
                    account_id: AccountId::from_protobuf(required(leg.account_id, "accountID")?)?,
                    amount: Hbar::from_tinybars(leg.amount),
                })
            })
            .collect::<Result<Vec<_>>>()?;

        Ok(Self {
            receipt: TransactionReceipt::from_protobuf(required(pb.receipt, "receipt")?)?,
            transaction_hash: pb.transaction_hash,
            consensus_timestamp: pb.consensus_timestamp.map(Timestamp::from_protobuf).transpose()?,
            transaction_id: TransactionId::from_protobuf(required(
                pb.transaction_id,
                "transactionID",
            )?)?,
            memo: pb.memo,
            transaction_fee: Hbar::from_tinybars(pb.transaction_fee as i64),
            transfers,
        })
    }
}

/// Fetches a transaction's record, paying for it from the operator account.
#[derive(Debug, Clone, Default)]
pub struct TransactionRecordQuery {
    transaction_id: Option<TransactionId>,
    node_account_ids: Option<Vec<AccountId>>,
    include_duplicates: bool,
    validate_status: bool,
    query_payment: Option<Hbar>,
    max_query_payment: Option<Hbar>,
}

impl TransactionRecordQuery {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn transaction_id(mut self, id: TransactionId) -> Self {
        self.transaction_id = Some(id);
        self
    }

    pub fn node_account_ids(mut self, ids: impl IntoIterator<Item = AccountId>) -> Self {
        self.node_account_ids = Some(ids.into_iter().collect());
        self
    }

    pub fn include_duplicates(mut self, include: bool) -> Self {
        self.include_duplicates = include;
        self
    }

    /// Fail with `ReceiptStatus` when the record's receipt is not `SUCCESS`.
    pub fn validate_status(mut self, validate: bool) -> Self {
        self.validate_status = validate;
        self
    }

    /// Pays exactly this much and skips the cost lookup.
    pub fn query_payment(mut self, amount: Hbar) -> Self {
        self.query_payment = Some(amount);
        self
    }

    /// Overrides the client's ceiling on what the looked-up cost may be.
    pub fn max_query_payment(mut self, amount: Hbar) -> Self {
        self.max_query_payment = Some(amount);
        self
    }

    pub async fn execute(&self, client: &Client) -> Result<TransactionRecord> {
        self.execute_with_timeout(client, client.backoff().receipt_timeout)
            .await
    }

    pub async fn execute_with_timeout(
        &self,
        client: &Client,
        timeout: Duration,
    ) -> Result<TransactionRecord> {
        let transaction_id = self
            .transaction_id
            .ok_or_else(|| Error::illegal_state("record query needs a transaction ID"))?;
        let operator = client.operator().ok_or(Error::NoOperator)?;
        client.validate_checksums([
            transaction_id.account_id.entity_id(),
            operator.account_id.entity_id(),
        ])?;
        let deadline = Instant::now() + timeout;

        let cost = match self.query_payment {
            Some(amount) => amount,
            None => {
                let cost = self.cost(client, transaction_id, deadline).await?;
                let max = self
                    .max_query_payment
                    .unwrap_or_else(|| client.default_max_query_payment());
                if cost > max {
                    return Err(Error::MaxQueryPaymentExceeded { cost, max });
                }
                cost
            }
        };

        let nodes = match &self.node_account_ids {
            Some(nodes) => nodes.clone(),
            None => client.network().sample_node_account_ids(Instant::now())?,
        };
        let payments = payments(client, &operator, &nodes, cost)?;
        debug!(
            transaction_id = %transaction_id,
            %cost,
            nodes = nodes.len(),
            "paying for record query"
        );

        let mut request = RecordRequest {
            query: self,
            transaction_id,
            nodes,
            payments,
        };
        let record = execute::execute(client, &mut request, deadline, None)
            .await?
            .output;

        if self.validate_status && record.receipt.status != Status::Success {
            return Err(Error::ReceiptStatus {
                status: record.receipt.status,
                transaction_id,
            });
        }
        Ok(record)
    }

    async fn cost(
        &self,
        client: &Client,
        transaction_id: TransactionId,
        deadline: Instant,
    ) -> Result<Hbar> {
        let mut request = CostRequest {
            query: self,
            transaction_id,
        };
        Ok(execute::execute(client, &mut request, deadline, None)
            .await?
            .output)
    }

    fn encode(
        &self,
        transaction_id: TransactionId,
        response_type: i32,
        payment: Option<services::Transaction>,
    ) -> Vec<u8> {
        let query = services::TransactionGetRecordQuery {
            header: Some(query_header(response_type, payment)),
            transaction_id: Some(transaction_id.to_protobuf()),
            include_duplicates: self.include_duplicates,
            include_child_records: false,
        };
        services::Query {
            query: Some(services::query::Query::TransactionGetRecord(query)),
        }
        .encode_to_vec()
    }
}

/// One signed operator → node transfer of `cost` per node.
fn payments(
    client: &Client,
    operator: &Operator,
    nodes: &[AccountId],
    cost: Hbar,
) -> Result<BTreeMap<AccountId, services::Transaction>> {
    let mut payments = BTreeMap::new();
    for node in nodes {
        let mut payment = TransferTransaction::new()
            .hbar_transfer(operator.account_id, -cost)
            .hbar_transfer(*node, cost)
            .transaction_id(TransactionId::generate(operator.account_id))
            .node_account_ids([*node])
            .max_transaction_fee(client.default_max_transaction_fee())
            .freeze()?;
        payment.sign(&operator.private_key)?;
        let envelope = payment
            .envelope_for(*node)
            .ok_or_else(|| Error::illegal_state(format!("payment has no body for node {node}")))?;
        payments.insert(*node, envelope);
    }
    Ok(payments)
}

fn decode_record_response(response: &[u8]) -> Result<services::TransactionGetRecordResponse> {
    match services::Response::decode(response)? {
        services::Response {
            response: Some(services::response::Response::TransactionGetRecord(response)),
        } => Ok(response),
        _ => Err(Error::decode("expected a record response")),
    }
}

struct CostRequest<'a> {
    query: &'a TransactionRecordQuery,
    transaction_id: TransactionId,
}

impl Execute for CostRequest<'_> {
    type Output = Hbar;

    fn node_account_ids(&self) -> Option<&[AccountId]> {
        self.query.node_account_ids.as_deref()
    }

    fn method(&self) -> &'static str {
        GET_RECORD_METHOD
    }

    fn make_request(&self, _node: AccountId) -> Result<Vec<u8>> {
        Ok(self
            .query
            .encode(self.transaction_id, services::RESPONSE_TYPE_COST_ANSWER, None))
    }

    fn classify(&self, _node: AccountId, response: &[u8]) -> Outcome<Hbar> {
        let response = match decode_record_response(response) {
            Ok(response) => response,
            Err(err) => return Outcome::Fatal(err),
        };
        match precheck(response.header, self.transaction_id) {
            Ok(header) => Outcome::Done(Hbar::from_tinybars(header.cost as i64)),
            // A cost is known even while the record is not.
            Err(Outcome::Pending(err)) => Outcome::Fatal(err),
            Err(outcome) => outcome,
        }
    }
}

struct RecordRequest<'a> {
    query: &'a TransactionRecordQuery,
    transaction_id: TransactionId,
    nodes: Vec<AccountId>,
    payments: BTreeMap<AccountId, services::Transaction>,
}

impl Execute for RecordRequest<'_> {
    type Output = TransactionRecord;

    fn node_account_ids(&self) -> Option<&[AccountId]> {
        Some(&self.nodes)
    }

    fn method(&self) -> &'static str {
        GET_RECORD_METHOD
    }

    fn make_request(&self, node: AccountId) -> Result<Vec<u8>> {
        let payment = self
            .payments
            .get(&node)
            .cloned()
            .ok_or_else(|| Error::illegal_state(format!("no query payment for node {node}")))?;
        Ok(self.query.encode(
            self.transaction_id,
            services::RESPONSE_TYPE_ANSWER_ONLY,
            Some(payment),
        ))
    }

    fn classify(&self, _node: AccountId, response: &[u8]) -> Outcome<TransactionRecord> {
        let response = match decode_record_response(response) {
            Ok(response) => response,
            Err(err) => return Outcome::Fatal(err),
        };
        if let Err(outcome) = precheck(response.header, self.transaction_id) {
            return outcome;
        }
        let Some(record) = response.transaction_record else {
            return Outcome::Fatal(Error::decode("record response has no record"));
        };

        let status = record
            .receipt
            .as_ref()
            .map_or(Status::Unknown, |receipt| Status::from_code(receipt.status));
        if status.is_pending() {
            return Outcome::Pending(Error::Rejected {
                status,
                transaction_id: Some(self.transaction_id),
            });
        }
        match TransactionRecord::from_protobuf(record) {
            Ok(record) => Outcome::Done(record),
            Err(err) => Outcome::Fatal(err),
        }
    }
}
