//! Hbar transfers between accounts.

use std::collections::BTreeMap;

use super::builder::Transaction;
use super::chunk::ChunkInfo;
use super::data::TransactionData;
use crate::entity::{AccountId, EntityId};
use crate::error::{Error, Result};
use crate::hbar::Hbar;
use crate::proto::{required, services, FromProtobuf, ToProtobuf};

/// Moves hbar between accounts. Debits are negative, credits positive, and
/// the whole list must net to zero.
pub type TransferTransaction = Transaction<TransferData>;

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct TransferData {
    transfers: BTreeMap<AccountId, Hbar>,
}

impl TransferData {
    pub fn transfers(&self) -> impl Iterator<Item = (AccountId, Hbar)> + '_ {
        self.transfers.iter().map(|(id, amount)| (*id, *amount))
    }
}

impl TransferTransaction {
    /// Adds `amount` to `account_id`'s leg, merging with any earlier leg for
    /// the same account.
    pub fn hbar_transfer(mut self, account_id: AccountId, amount: Hbar) -> Self {
        let leg = self.data_mut().transfers.entry(account_id).or_default();
        *leg = *leg + amount;
        self
    }
}

impl TransactionData for TransferData {
    fn method(&self) -> &'static str {
        "proto.CryptoService/cryptoTransfer"
    }

    fn entity_ids(&self) -> Vec<EntityId> {
        self.transfers.keys().map(|id| id.entity_id()).collect()
    }

    fn validate(&self) -> Result<()> {
        let net = self
            .transfers
            .values()
            .fold(0i128, |sum, amount| sum + i128::from(amount.to_tinybars()));
        if net != 0 {
            return Err(Error::illegal_state(format!(
                "transfers must net to zero, got {net} tinybars"
            )));
        }
        Ok(())
    }

    fn to_body_data(&self, _chunk: &ChunkInfo) -> services::transaction_body::Data {
        let account_amounts = self
            .transfers
            .iter()
            .map(|(id, amount)| services::AccountAmount {
                account_id: Some(id.to_protobuf()),
                amount: amount.to_tinybars(),
                is_approval: false,
            })
            .collect();

        services::transaction_body::Data::CryptoTransfer(services::CryptoTransferTransactionBody {
            transfers: Some(services::TransferList { account_amounts }),
        })
    }

    fn from_body_data(chunks: Vec<services::transaction_body::Data>) -> Result<Self> {
        let chunk: [_; 1] = chunks.try_into().map_err(|chunks: Vec<_>| {
            Error::decode(format!("transfer must be a single chunk, got {}", chunks.len()))
        })?;
        let [services::transaction_body::Data::CryptoTransfer(body)] = chunk else {
            return Err(Error::decode("transaction body is not a crypto transfer"));
        };

        let mut transfers = BTreeMap::new();
        for leg in body.transfers.unwrap_or_default().account_amounts {
            let account = AccountId::from_protobuf(required(leg.account_id, "accountID")?)?;
            let entry: &mut Hbar = transfers.entry(account).or_default();
            *entry = *entry + Hbar::from_tinybars(leg.amount);
        }
        Ok(Self { transfers })
    }
}
