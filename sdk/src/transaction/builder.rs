//! The mutable side of a transaction.
//!
//! A [`Transaction`] is a plain builder: every setter takes `self` and hands
//! it back, and nothing is validated until [`Transaction::freeze`] or
//! [`Transaction::freeze_with`] turns it into a [`FrozenTransaction`]. There
//! is no `execute` on the builder, so an unfrozen transaction cannot reach
//! the network at all.

use std::time::Duration;

use tokio::time::Instant;
use tracing::debug;

use super::data::TransactionData;
use super::frozen::{FrozenTransaction, TransactionCommon};
use super::id::TransactionId;
use crate::client::Client;
use crate::config::{
    DEFAULT_MAX_TRANSACTION_FEE_TINYBARS, DEFAULT_TRANSACTION_VALID_DURATION, MAX_MEMO_LENGTH,
};
use crate::entity::AccountId;
use crate::error::{Error, Result};
use crate::hbar::Hbar;

/// A transaction under construction.
///
/// `D` is the kind-specific payload; see the `*Transaction` aliases in this
/// module's parent for the concrete kinds.
#[derive(Debug, Clone)]
pub struct Transaction<D> {
    data: D,
    node_account_ids: Option<Vec<AccountId>>,
    transaction_id: Option<TransactionId>,
    max_transaction_fee: Option<Hbar>,
    valid_duration: Duration,
    memo: String,
    regenerate_transaction_id: Option<bool>,
}

impl<D: TransactionData + Default> Default for Transaction<D> {
    fn default() -> Self {
        Self {
            data: D::default(),
            node_account_ids: None,
            transaction_id: None,
            max_transaction_fee: None,
            valid_duration: DEFAULT_TRANSACTION_VALID_DURATION,
            memo: String::new(),
            regenerate_transaction_id: None,
        }
    }
}

impl<D: TransactionData + Default> Transaction<D> {
    pub fn new() -> Self {
        Self::default()
    }
}

impl<D: TransactionData> Transaction<D> {
    pub fn data(&self) -> &D {
        &self.data
    }

    pub(crate) fn data_mut(&mut self) -> &mut D {
        &mut self.data
    }

    // -----------------------------------------------------------------------
    // Setters
    // -----------------------------------------------------------------------

    /// Nodes the transaction may be submitted to. One body is built and
    /// signed per node.
    pub fn node_account_ids(mut self, ids: impl IntoIterator<Item = AccountId>) -> Self {
        self.node_account_ids = Some(ids.into_iter().collect());
        self
    }

    /// Uses a caller-chosen ID instead of generating one from the operator.
    /// An explicit ID is never regenerated on expiry.
    pub fn transaction_id(mut self, id: TransactionId) -> Self {
        self.transaction_id = Some(id);
        self
    }

    pub fn max_transaction_fee(mut self, fee: Hbar) -> Self {
        self.max_transaction_fee = Some(fee);
        self
    }

    pub fn transaction_valid_duration(mut self, duration: Duration) -> Self {
        self.valid_duration = duration;
        self
    }

    pub fn transaction_memo(mut self, memo: impl Into<String>) -> Self {
        self.memo = memo.into();
        self
    }

    /// Overrides the client's setting for regenerating the ID after
    /// `TRANSACTION_EXPIRED`.
    pub fn regenerate_transaction_id(mut self, regenerate: bool) -> Self {
        self.regenerate_transaction_id = Some(regenerate);
        self
    }

    // -----------------------------------------------------------------------
    // Getters
    // -----------------------------------------------------------------------

    pub fn get_node_account_ids(&self) -> Option<&[AccountId]> {
        self.node_account_ids.as_deref()
    }

    pub fn get_transaction_id(&self) -> Option<TransactionId> {
        self.transaction_id
    }

    pub fn get_max_transaction_fee(&self) -> Option<Hbar> {
        self.max_transaction_fee
    }

    pub fn get_transaction_valid_duration(&self) -> Duration {
        self.valid_duration
    }

    pub fn get_transaction_memo(&self) -> &str {
        &self.memo
    }

    // -----------------------------------------------------------------------
    // Freezing
    // -----------------------------------------------------------------------

    /// Freezes without a client. The transaction ID and node IDs must both
    /// have been set.
    pub fn freeze(self) -> Result<FrozenTransaction<D>> {
        let transaction_id = self.transaction_id.ok_or_else(|| {
            Error::illegal_state("freeze without a client requires a transaction ID")
        })?;
        let node_account_ids = self.node_account_ids.clone().ok_or_else(|| {
            Error::illegal_state("freeze without a client requires node account IDs")
        })?;
        let max_fee = self
            .max_transaction_fee
            .unwrap_or(Hbar::from_tinybars(DEFAULT_MAX_TRANSACTION_FEE_TINYBARS));
        let regenerate = self.regenerate_transaction_id.unwrap_or(true);

        self.into_frozen(transaction_id, true, node_account_ids, max_fee, regenerate)
    }

    /// Freezes using `client` for whatever was left unset: the ID is
    /// generated from the operator, nodes are sampled from the network, and
    /// the fee ceiling comes from the client. When the operator pays, its key
    /// signs every body straight away.
    pub fn freeze_with(self, client: &Client) -> Result<FrozenTransaction<D>> {
        let operator = client.operator();

        let (transaction_id, explicit) = match self.transaction_id {
            Some(id) => (id, true),
            None => {
                let operator = operator.as_ref().ok_or(Error::NoOperator)?;
                (TransactionId::generate(operator.account_id), false)
            }
        };
        let node_account_ids = match &self.node_account_ids {
            Some(ids) => ids.clone(),
            None => client.network().sample_node_account_ids(Instant::now())?,
        };
        let max_fee = self
            .max_transaction_fee
            .unwrap_or_else(|| client.default_max_transaction_fee());
        let regenerate = self
            .regenerate_transaction_id
            .unwrap_or_else(|| client.default_regenerate_transaction_id());

        let mut frozen =
            self.into_frozen(transaction_id, explicit, node_account_ids, max_fee, regenerate)?;
        if let Some(operator) = operator {
            if operator.account_id == transaction_id.account_id {
                frozen.sign(&operator.private_key)?;
            }
        }
        Ok(frozen)
    }

    fn into_frozen(
        self,
        transaction_id: TransactionId,
        explicit_transaction_id: bool,
        node_account_ids: Vec<AccountId>,
        max_transaction_fee: Hbar,
        regenerate_transaction_id: bool,
    ) -> Result<FrozenTransaction<D>> {
        if node_account_ids.is_empty() {
            return Err(Error::illegal_state("node account IDs must not be empty"));
        }
        if self.memo.len() > MAX_MEMO_LENGTH {
            return Err(Error::illegal_state(format!(
                "memo is {} bytes, limit is {MAX_MEMO_LENGTH}",
                self.memo.len()
            )));
        }
        if max_transaction_fee < Hbar::ZERO {
            return Err(Error::illegal_state("max transaction fee must not be negative"));
        }
        self.data.validate()?;
        let total = self.data.chunk_count()?;

        debug!(
            transaction_id = %transaction_id,
            chunks = total,
            nodes = node_account_ids.len(),
            "freezing transaction"
        );

        let common = TransactionCommon {
            max_transaction_fee,
            valid_duration: self.valid_duration,
            memo: self.memo,
            regenerate_transaction_id,
        };
        Ok(FrozenTransaction::build(
            self.data,
            common,
            transaction_id,
            explicit_transaction_id,
            node_account_ids,
            total,
        ))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::transaction::{TopicMessageSubmitTransaction, TransferTransaction};

    fn id() -> TransactionId {
        "0.0.1001@1700000000.000000000".parse().unwrap()
    }

    fn node() -> AccountId {
        AccountId::new(0, 0, 3)
    }

    #[test]
    fn freeze_needs_id_and_nodes() {
        let missing_id = TransferTransaction::new().node_account_ids([node()]).freeze();
        assert!(matches!(missing_id, Err(Error::IllegalState(_))));

        let missing_nodes = TransferTransaction::new().transaction_id(id()).freeze();
        assert!(matches!(missing_nodes, Err(Error::IllegalState(_))));

        let empty_nodes = TransferTransaction::new()
            .transaction_id(id())
            .node_account_ids([])
            .freeze();
        assert!(matches!(empty_nodes, Err(Error::IllegalState(_))));
    }

    #[test]
    fn long_memo_is_rejected() {
        let tx = TransferTransaction::new()
            .transaction_id(id())
            .node_account_ids([node()])
            .transaction_memo("x".repeat(101));
        assert!(matches!(tx.freeze(), Err(Error::IllegalState(_))));
    }

    #[test]
    fn freeze_applies_defaults() {
        let frozen = TransferTransaction::new()
            .transaction_id(id())
            .node_account_ids([node()])
            .freeze()
            .unwrap();
        assert_eq!(frozen.max_transaction_fee(), Hbar::new(2));
        assert_eq!(frozen.transaction_valid_duration(), Duration::from_secs(120));
        assert_eq!(frozen.transaction_id(), id());
    }

    #[test]
    fn oversized_payload_fails_at_freeze() {
        let tx = TopicMessageSubmitTransaction::new()
            .transaction_id(id())
            .node_account_ids([node()])
            .message(vec![1u8; 1024 * 20 + 1]);
        assert!(matches!(
            tx.freeze(),
            Err(Error::MaxChunksExceeded { required: 21, max: 20 })
        ));
    }
}
