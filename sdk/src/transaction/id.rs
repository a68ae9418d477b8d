//! Transaction identifiers.
//!
//! A transaction ID is the payer account plus the instant the transaction
//! becomes valid. The network deduplicates on it, so two transactions built
//! in the same nanosecond by the same payer must still get distinct IDs.

use std::fmt;
use std::str::FromStr;
use std::sync::atomic::{AtomicI64, Ordering};

use rand::Rng;

use crate::config::TRANSACTION_ID_BACKDATE_MAX;
use crate::entity::AccountId;
use crate::error::{Error, Result};
use crate::proto::{required, services, FromProtobuf, ToProtobuf};
use crate::timestamp::Timestamp;

/// Last valid-start handed out by [`TransactionId::generate`], in Unix nanos.
static LAST_VALID_START: AtomicI64 = AtomicI64::new(0);

/// `payer@seconds.nanos[?scheduled][/nonce]`.
///
/// A nonce of zero is the wire default and means "no nonce"; it is stored as
/// `None`.
#[derive(Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct TransactionId {
    pub account_id: AccountId,
    pub valid_start: Timestamp,
    pub scheduled: bool,
    pub nonce: Option<i32>,
}

impl TransactionId {
    pub fn with_valid_start(account_id: AccountId, valid_start: Timestamp) -> Self {
        Self {
            account_id,
            valid_start,
            scheduled: false,
            nonce: None,
        }
    }

    /// A fresh ID for `account_id`.
    ///
    /// The valid start is backdated by a random offset (so clock skew with the
    /// node does not make it look like it is from the future) and is strictly
    /// increasing across every call in the process.
    pub fn generate(account_id: AccountId) -> Self {
        let backdate = rand::thread_rng()
            .gen_range(0..TRANSACTION_ID_BACKDATE_MAX.as_nanos() as i64);
        let candidate = Timestamp::now().to_unix_nanos() as i64 - backdate;

        let mut last = LAST_VALID_START.load(Ordering::Relaxed);
        let valid_start = loop {
            let next = candidate.max(last + 1);
            match LAST_VALID_START.compare_exchange_weak(
                last,
                next,
                Ordering::AcqRel,
                Ordering::Relaxed,
            ) {
                Ok(_) => break next,
                Err(actual) => last = actual,
            }
        };

        Self::with_valid_start(account_id, Timestamp::from_unix_nanos(i128::from(valid_start)))
    }

    pub fn scheduled(mut self, scheduled: bool) -> Self {
        self.scheduled = scheduled;
        self
    }

    pub fn nonce(mut self, nonce: i32) -> Self {
        self.nonce = non_zero(nonce);
        self
    }

    /// The ID of chunk `index` in a chain started by `self`.
    pub(crate) fn offset_nanos(&self, index: usize) -> Self {
        Self {
            valid_start: self.valid_start.plus_nanos(index as u64),
            ..*self
        }
    }
}

impl fmt::Display for TransactionId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}@{}", self.account_id, self.valid_start)?;
        if self.scheduled {
            f.write_str("?scheduled")?;
        }
        if let Some(nonce) = self.nonce {
            write!(f, "/{nonce}")?;
        }
        Ok(())
    }
}

impl fmt::Debug for TransactionId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "TransactionId(\"{self}\")")
    }
}

impl FromStr for TransactionId {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self> {
        let bad = || {
            Error::parse(format!(
                "expected `<account>@<seconds>.<nanos>[?scheduled][/<nonce>]`, got `{s}`"
            ))
        };

        let (account, rest) = s.split_once('@').ok_or_else(bad)?;
        let (rest, nonce) = match rest.split_once('/') {
            Some((rest, nonce)) => (rest, non_zero(nonce.parse::<i32>().map_err(|_| bad())?)),
            None => (rest, None),
        };
        let (valid_start, scheduled) = match rest.strip_suffix("?scheduled") {
            Some(valid_start) => (valid_start, true),
            None => (rest, false),
        };

        Ok(Self {
            account_id: account.parse()?,
            valid_start: valid_start.parse()?,
            scheduled,
            nonce,
        })
    }
}

impl ToProtobuf for TransactionId {
    type Protobuf = services::TransactionId;

    fn to_protobuf(&self) -> Self::Protobuf {
        services::TransactionId {
            transaction_valid_start: Some(self.valid_start.to_protobuf()),
            account_id: Some(self.account_id.to_protobuf()),
            scheduled: self.scheduled,
            nonce: self.nonce.unwrap_or_default(),
        }
    }
}

impl FromProtobuf<services::TransactionId> for TransactionId {
    fn from_protobuf(pb: services::TransactionId) -> Result<Self> {
        Ok(Self {
            account_id: AccountId::from_protobuf(required(pb.account_id, "accountID")?)?,
            valid_start: Timestamp::from_protobuf(required(
                pb.transaction_valid_start,
                "transactionValidStart",
            )?)?,
            scheduled: pb.scheduled,
            nonce: non_zero(pb.nonce),
        })
    }
}

fn non_zero(nonce: i32) -> Option<i32> {
    (nonce != 0).then_some(nonce)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn text_round_trip() {
        for text in [
            "0.0.1001@1700000000.000000042",
            "0.0.1001@1700000000.000000042?scheduled",
            "0.0.1001@1700000000.000000042?scheduled/3",
            "1.2.3@5.000000000/7",
        ] {
            let id: TransactionId = text.parse().unwrap();
            assert_eq!(id.to_string(), text);
        }
    }

    #[test]
    fn reject_malformed_text() {
        for text in ["0.0.1001", "0.0.1001@", "0.0.1001@1.2/x", "a.b.c@1.2", "0.0.1@1.2?sched"] {
            assert!(text.parse::<TransactionId>().is_err(), "`{text}` should not parse");
        }
    }

    #[test]
    fn wire_round_trip() {
        let id: TransactionId = "0.0.1001@1700000000.000000042?scheduled/9".parse().unwrap();
        assert_eq!(TransactionId::from_bytes(&id.to_bytes()).unwrap(), id);
    }

    #[test]
    fn zero_nonce_is_no_nonce() {
        let id: TransactionId = "0.0.1001@1700000000.000000042/0".parse().unwrap();
        assert_eq!(id.nonce, None);
        assert_eq!(id.to_string(), "0.0.1001@1700000000.000000042");
        assert_eq!(TransactionId::from_bytes(&id.to_bytes()).unwrap(), id);

        let built = TransactionId::with_valid_start(AccountId::new(0, 0, 2), Timestamp::new(5, 0));
        assert_eq!(built.nonce(0), built);
        assert_eq!(built.nonce(4).nonce, Some(4));
    }

    #[test]
    fn wire_requires_account_and_start() {
        let pb = services::TransactionId {
            account_id: None,
            ..Default::default()
        };
        assert!(matches!(TransactionId::from_protobuf(pb), Err(Error::Decode(_))));
    }

    #[test]
    fn generate_is_strictly_monotonic() {
        let account = AccountId::new(0, 0, 1001);
        let mut last = TransactionId::generate(account);
        for _ in 0..1_000 {
            let next = TransactionId::generate(account);
            assert!(next.valid_start > last.valid_start);
            last = next;
        }
    }

    #[test]
    fn generate_is_backdated() {
        let before = Timestamp::now();
        let id = TransactionId::generate(AccountId::new(0, 0, 2));
        assert!(id.valid_start <= before.plus_nanos(1_000_000));
        let floor = before
            .minus(TRANSACTION_ID_BACKDATE_MAX)
            .minus(std::time::Duration::from_secs(1));
        assert!(id.valid_start >= floor);
    }

    #[test]
    fn chunk_offsets_advance_by_nanos() {
        let id: TransactionId = "0.0.5@10.999999999".parse().unwrap();
        assert_eq!(id.offset_nanos(0), id);
        assert_eq!(id.offset_nanos(2).to_string(), "0.0.5@11.000000001");
    }
}
