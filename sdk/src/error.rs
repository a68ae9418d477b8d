//! Error types for the SDK.
//!
//! Every fallible operation in the crate returns [`Error`]. The variants map
//! one-to-one onto how the failure is handled: local validation errors are
//! reported before anything touches the network, transport errors stay
//! inside the execution engine until its budget runs out, and network-side
//! verdicts come back carrying their status code.

use std::time::Duration;

use thiserror::Error;

use crate::hbar::Hbar;
use crate::network::TransportError;
use crate::status::Status;
use crate::transaction::TransactionId;

/// Crate-wide result alias.
pub type Result<T> = std::result::Result<T, Error>;

/// Errors returned by the SDK.
#[derive(Debug, Error)]
pub enum Error {
    /// Malformed textual input: entity ID, key, mnemonic, amount.
    #[error("failed to parse: {0}")]
    Parse(String),

    /// An entity ID's checksum does not belong to the ledger being used.
    #[error("checksum mismatch for `{id}`: expected `{expected}`, found `{present}`")]
    ChecksumMismatch {
        /// The entity ID, without its checksum.
        id: String,
        /// Checksum computed for the configured ledger.
        expected: String,
        /// Checksum carried by the ID.
        present: String,
    },

    /// Bytes from the network (or handed to `from_bytes`) are not a valid
    /// encoding of the expected message.
    #[error("failed to decode protobuf: {0}")]
    Decode(String),

    /// An operation was invoked in a state that forbids it.
    #[error("illegal state: {0}")]
    IllegalState(String),

    /// The payload cannot be split into the allowed number of chunks.
    #[error("payload needs {required} chunks but at most {max} are allowed")]
    MaxChunksExceeded {
        /// Chunks the payload would need.
        required: usize,
        /// Configured chunk ceiling.
        max: usize,
    },

    /// The transport could not complete a call.
    #[error(transparent)]
    Transport(#[from] TransportError),

    /// The network answered with a definitive rejection.
    #[error("{} rejected with status {status:?}", describe_subject(.transaction_id))]
    Rejected {
        status: Status,
        /// Set when the rejected request was a transaction.
        transaction_id: Option<TransactionId>,
    },

    /// A receipt came back with a non-success status and status validation
    /// was requested.
    #[error("receipt for transaction `{transaction_id}` contained error status {status:?}")]
    ReceiptStatus {
        status: Status,
        transaction_id: TransactionId,
    },

    /// The retry budget ran out while the request was still retryable.
    #[error("exceeded {attempts} attempts; last error: {last}")]
    MaxAttemptsExceeded {
        attempts: usize,
        last: Box<Error>,
    },

    /// The execution deadline passed.
    #[error("timed out after {elapsed:?}{}", describe_last(.last))]
    Timeout {
        elapsed: Duration,
        last: Option<Box<Error>>,
    },

    /// The caller cancelled the execution.
    #[error("execution cancelled")]
    Cancelled,

    /// The client has no nodes (or none of the requested ones) to dispatch to.
    #[error("no nodes available: {0}")]
    NoNodes(String),

    /// The operation requires an operator account and key.
    #[error("no operator configured on the client")]
    NoOperator,

    /// A signature failed verification or could not be attached.
    #[error("signature error: {0}")]
    Signature(String),

    /// Key derivation failed (invalid child index or curve limitation).
    #[error("key derivation failed: {0}")]
    KeyDerive(String),

    /// A paid query would cost more than the configured ceiling.
    #[error("query cost {cost} exceeds max query payment {max}")]
    MaxQueryPaymentExceeded { cost: Hbar, max: Hbar },

    /// The client configuration is invalid.
    #[error("invalid configuration: {0}")]
    Config(String),
}

impl Error {
    pub(crate) fn parse(msg: impl Into<String>) -> Self {
        Self::Parse(msg.into())
    }

    pub(crate) fn decode(msg: impl Into<String>) -> Self {
        Self::Decode(msg.into())
    }

    pub(crate) fn illegal_state(msg: impl Into<String>) -> Self {
        Self::IllegalState(msg.into())
    }

    /// The last underlying cause, for budget-exhaustion errors.
    pub fn last_cause(&self) -> Option<&Error> {
        match self {
            Self::MaxAttemptsExceeded { last, .. } => Some(last),
            Self::Timeout { last, .. } => last.as_deref(),
            _ => None,
        }
    }
}

impl From<prost::DecodeError> for Error {
    fn from(err: prost::DecodeError) -> Self {
        Self::Decode(err.to_string())
    }
}

fn describe_subject(transaction_id: &Option<TransactionId>) -> String {
    match transaction_id {
        Some(id) => format!("transaction `{id}`"),
        None => "query".to_string(),
    }
}

fn describe_last(last: &Option<Box<Error>>) -> String {
    match last {
        Some(err) => format!("; last error: {err}"),
        None => String::new(),
    }
}
