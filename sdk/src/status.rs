//! Response codes returned by consensus nodes.
//!
//! The numeric values are fixed by the network's wire schema. Only the codes
//! the SDK needs to reason about get their own variant; anything else is
//! carried through untouched as [`Status::Unrecognized`].

use std::fmt;

macro_rules! statuses {
    ($($variant:ident = $code:literal => $name:literal,)*) => {
        /// A precheck or receipt status code.
        #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
        pub enum Status {
            $($variant,)*
            /// A code this SDK has no name for.
            Unrecognized(i32),
        }

        impl Status {
            /// Maps a wire code to a status.
            pub fn from_code(code: i32) -> Self {
                match code {
                    $($code => Self::$variant,)*
                    other => Self::Unrecognized(other),
                }
            }

            /// The wire code for this status.
            pub fn code(self) -> i32 {
                match self {
                    $(Self::$variant => $code,)*
                    Self::Unrecognized(code) => code,
                }
            }

            /// The schema name, e.g. `INVALID_SIGNATURE`.
            pub fn name(self) -> Option<&'static str> {
                match self {
                    $(Self::$variant => Some($name),)*
                    Self::Unrecognized(_) => None,
                }
            }
        }
    };
}

statuses! {
    Ok = 0 => "OK",
    InvalidTransaction = 1 => "INVALID_TRANSACTION",
    PayerAccountNotFound = 2 => "PAYER_ACCOUNT_NOT_FOUND",
    InvalidNodeAccount = 3 => "INVALID_NODE_ACCOUNT",
    TransactionExpired = 4 => "TRANSACTION_EXPIRED",
    InvalidTransactionStart = 5 => "INVALID_TRANSACTION_START",
    InvalidTransactionDuration = 6 => "INVALID_TRANSACTION_DURATION",
    InvalidSignature = 7 => "INVALID_SIGNATURE",
    MemoTooLong = 8 => "MEMO_TOO_LONG",
    InsufficientTxFee = 9 => "INSUFFICIENT_TX_FEE",
    InsufficientPayerBalance = 10 => "INSUFFICIENT_PAYER_BALANCE",
    DuplicateTransaction = 11 => "DUPLICATE_TRANSACTION",
    Busy = 12 => "BUSY",
    NotSupported = 13 => "NOT_SUPPORTED",
    InvalidFileId = 14 => "INVALID_FILE_ID",
    InvalidAccountId = 15 => "INVALID_ACCOUNT_ID",
    InvalidContractId = 16 => "INVALID_CONTRACT_ID",
    InvalidTransactionId = 17 => "INVALID_TRANSACTION_ID",
    ReceiptNotFound = 18 => "RECEIPT_NOT_FOUND",
    RecordNotFound = 19 => "RECORD_NOT_FOUND",
    InvalidSolidityId = 20 => "INVALID_SOLIDITY_ID",
    Unknown = 21 => "UNKNOWN",
    Success = 22 => "SUCCESS",
    FailInvalid = 23 => "FAIL_INVALID",
    FailFee = 24 => "FAIL_FEE",
    FailBalance = 25 => "FAIL_BALANCE",
    KeyRequired = 26 => "KEY_REQUIRED",
    BadEncoding = 27 => "BAD_ENCODING",
    InsufficientAccountBalance = 28 => "INSUFFICIENT_ACCOUNT_BALANCE",
    InvalidAccountAmounts = 48 => "INVALID_ACCOUNT_AMOUNTS",
    TransactionOversize = 64 => "TRANSACTION_OVERSIZE",
    PlatformNotActive = 67 => "PLATFORM_NOT_ACTIVE",
    KeyPrefixMismatch = 68 => "KEY_PREFIX_MISMATCH",
    PlatformTransactionNotCreated = 69 => "PLATFORM_TRANSACTION_NOT_CREATED",
    InvalidTopicId = 150 => "INVALID_TOPIC_ID",
    InvalidChunkNumber = 163 => "INVALID_CHUNK_NUMBER",
    InvalidChunkTransactionId = 164 => "INVALID_CHUNK_TRANSACTION_ID",
}

impl Status {
    /// Node-side congestion: worth retrying on another node, says nothing
    /// about the node's long-term health.
    pub fn is_transient(self) -> bool {
        matches!(
            self,
            Self::Busy | Self::PlatformNotActive | Self::PlatformTransactionNotCreated
        )
    }

    /// The outcome is not known yet; a receipt or record poll should ask again.
    pub fn is_pending(self) -> bool {
        matches!(
            self,
            Self::Unknown | Self::ReceiptNotFound | Self::RecordNotFound
        )
    }
}

impl Default for Status {
    fn default() -> Self {
        Self::Ok
    }
}

impl fmt::Display for Status {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self.name() {
            Some(name) => f.write_str(name),
            None => write!(f, "UNRECOGNIZED({})", self.code()),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn codes_round_trip() {
        for code in [0, 7, 12, 21, 22, 67, 164, 9999] {
            assert_eq!(Status::from_code(code).code(), code);
        }
    }

    #[test]
    fn unknown_codes_are_preserved() {
        assert_eq!(Status::from_code(4242), Status::Unrecognized(4242));
        assert_eq!(Status::from_code(4242).to_string(), "UNRECOGNIZED(4242)");
    }

    #[test]
    fn classification() {
        assert!(Status::Busy.is_transient());
        assert!(Status::PlatformNotActive.is_transient());
        assert!(!Status::InvalidSignature.is_transient());
        assert!(Status::ReceiptNotFound.is_pending());
        assert!(!Status::Success.is_pending());
    }

    #[test]
    fn display_uses_schema_name() {
        assert_eq!(Status::DuplicateTransaction.to_string(), "DUPLICATE_TRANSACTION");
    }
}
