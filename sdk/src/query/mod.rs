//! # Query Module
//!
//! Asking a node about a transaction after it was submitted.
//!
//! ```text
//! receipt.rs  — TransactionReceipt and the free receipt query
//! record.rs   — TransactionRecord and the paid record query
//! ```
//!
//! Both queries go through the same execution engine as transactions. The
//! difference is in classification: "not known yet" is a poll-again outcome
//! with a fixed interval, bounded by the client's receipt timeout rather than
//! the attempt budget.

pub mod receipt;
pub mod record;

pub use receipt::{TransactionReceipt, TransactionReceiptQuery};
pub use record::{Transfer, TransactionRecord, TransactionRecordQuery};

use crate::error::Error;
use crate::execute::Outcome;
use crate::proto::services;
use crate::status::Status;
use crate::transaction::TransactionId;

/// Receipt and record lookups are served by the crypto service.
pub(crate) const GET_RECEIPT_METHOD: &str = "proto.CryptoService/getTransactionReceipts";
pub(crate) const GET_RECORD_METHOD: &str = "proto.CryptoService/getTxRecordByTxID";

pub(crate) fn query_header(
    response_type: i32,
    payment: Option<services::Transaction>,
) -> services::QueryHeader {
    services::QueryHeader {
        payment,
        response_type,
    }
}

/// Passes through an `OK` header and turns anything else into the outcome
/// the engine should act on.
pub(crate) fn precheck<T>(
    header: Option<services::ResponseHeader>,
    transaction_id: TransactionId,
) -> Result<services::ResponseHeader, Outcome<T>> {
    let Some(header) = header else {
        return Err(Outcome::Fatal(Error::decode("response has no header")));
    };
    let status = Status::from_code(header.node_transaction_precheck_code);
    let rejected = Error::Rejected {
        status,
        transaction_id: Some(transaction_id),
    };
    match status {
        Status::Ok => Ok(header),
        status if status.is_transient() => Err(Outcome::Busy(rejected)),
        status if status.is_pending() => Err(Outcome::Pending(rejected)),
        _ => Err(Outcome::Fatal(rejected)),
    }
}
