//! # Client
//!
//! The handle everything executes against. A [`Client`] owns the node
//! network (and its health state), the operator that pays for transactions,
//! the retry envelope, and the [`Transport`] requests go out through.
//!
//! Cloning a client is cheap and every clone shares the same state, so one
//! client can drive any number of concurrent executions.
//!
//! ```text
//! Client ── Arc<ClientInner>
//!            ├── Network                 read-only node list, per-node health
//!            ├── operator                RwLock<Option<Operator>>
//!            ├── defaults                max fee, max query payment, toggles
//!            ├── BackoffConfig           RwLock
//!            ├── Transport               RwLock<Option<Arc<dyn Transport>>>
//!            └── checksum cache          DashSet<(EntityId, Checksum, LedgerId)>
//! ```

use std::collections::BTreeMap;
use std::fmt;
use std::path::Path;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;

use dashmap::DashSet;
use parking_lot::RwLock;
use tracing::{debug, info};

use crate::config::{
    BackoffConfig, ClientConfig, MirrorNetworkConfig, NetworkConfig,
    DEFAULT_MAX_QUERY_PAYMENT_TINYBARS, DEFAULT_MAX_TRANSACTION_FEE_TINYBARS, MIRROR_DEFAULT_PORT,
};
use crate::crypto::{PrivateKey, PublicKey};
use crate::entity::{AccountId, Checksum, EntityId, LedgerId};
use crate::error::{Error, Result};
use crate::hbar::Hbar;
use crate::network::{addressbook, Network, Transport};

/// The account that pays for transactions and queries, and its key.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Operator {
    pub account_id: AccountId,
    pub private_key: PrivateKey,
}

/// Shared handle to a ledger network.
#[derive(Clone)]
pub struct Client {
    inner: Arc<ClientInner>,
}

struct ClientInner {
    network: Network,
    mirror_network: Vec<String>,
    ledger_id: RwLock<Option<LedgerId>>,
    operator: RwLock<Option<Operator>>,
    max_transaction_fee: RwLock<Hbar>,
    max_query_payment: RwLock<Hbar>,
    auto_validate_checksums: AtomicBool,
    regenerate_transaction_id: AtomicBool,
    backoff: RwLock<BackoffConfig>,
    transport: RwLock<Option<Arc<dyn Transport>>>,
    /// Checksums already found valid against a ledger.
    validated: DashSet<(EntityId, Checksum, LedgerId)>,
}

impl Client {
    fn new(network: Network, mirror_network: Vec<String>, ledger_id: Option<LedgerId>) -> Self {
        info!(
            ledger = %ledger_id.as_ref().map_or_else(|| "custom".to_string(), LedgerId::to_string),
            nodes = network.nodes().len(),
            "client created"
        );
        Self {
            inner: Arc::new(ClientInner {
                network,
                mirror_network,
                ledger_id: RwLock::new(ledger_id),
                operator: RwLock::new(None),
                max_transaction_fee: RwLock::new(Hbar::from_tinybars(
                    DEFAULT_MAX_TRANSACTION_FEE_TINYBARS,
                )),
                max_query_payment: RwLock::new(Hbar::from_tinybars(
                    DEFAULT_MAX_QUERY_PAYMENT_TINYBARS,
                )),
                auto_validate_checksums: AtomicBool::new(true),
                regenerate_transaction_id: AtomicBool::new(true),
                backoff: RwLock::new(BackoffConfig::default()),
                transport: RwLock::new(None),
                validated: DashSet::new(),
            }),
        }
    }

    // -----------------------------------------------------------------------
    // Construction
    // -----------------------------------------------------------------------

    pub fn for_mainnet() -> Self {
        Self::new(
            Network::mainnet(),
            mirrors(addressbook::MAINNET_MIRROR),
            Some(LedgerId::mainnet()),
        )
    }

    pub fn for_testnet() -> Self {
        Self::new(
            Network::testnet(),
            mirrors(addressbook::TESTNET_MIRROR),
            Some(LedgerId::testnet()),
        )
    }

    pub fn for_previewnet() -> Self {
        Self::new(
            Network::previewnet(),
            mirrors(addressbook::PREVIEWNET_MIRROR),
            Some(LedgerId::previewnet()),
        )
    }

    /// A single local node at `127.0.0.1:50211` as `0.0.3`, with its mirror
    /// at `127.0.0.1:5600`.
    pub fn for_local_node() -> Result<Self> {
        let network = Network::from_addresses([("127.0.0.1:50211", AccountId::new(0, 0, 3))])?;
        Ok(Self::new(network, vec!["127.0.0.1:5600".to_string()], None))
    }

    /// `mainnet`, `testnet`, `previewnet` or `localhost`.
    pub fn for_name(name: &str) -> Result<Self> {
        match name {
            "mainnet" => Ok(Self::for_mainnet()),
            "testnet" => Ok(Self::for_testnet()),
            "previewnet" => Ok(Self::for_previewnet()),
            "localhost" | "local-node" => Self::for_local_node(),
            other => Err(Error::Config(format!("unknown network `{other}`"))),
        }
    }

    /// A custom network from `(address, node account)` pairs. The ledger ID
    /// is unknown until [`set_ledger_id`](Self::set_ledger_id) is called, and
    /// checksums are not validated before that.
    pub fn for_network<I, S>(addresses: I) -> Result<Self>
    where
        I: IntoIterator<Item = (S, AccountId)>,
        S: AsRef<str>,
    {
        Ok(Self::new(Network::from_addresses(addresses)?, Vec::new(), None))
    }

    pub fn from_config(json: &str) -> Result<Self> {
        Self::from_parsed_config(ClientConfig::from_json(json)?)
    }

    pub fn from_config_file(path: impl AsRef<Path>) -> Result<Self> {
        Self::from_parsed_config(ClientConfig::from_file(path)?)
    }

    fn from_parsed_config(config: ClientConfig) -> Result<Self> {
        let client = match config.network {
            NetworkConfig::Named(name) => Self::for_name(&name)?,
            NetworkConfig::Map(map) => Self::for_network(parse_network_map(map)?)?,
        };

        let client = match config.mirror_network {
            None => client,
            Some(mirror) => {
                let mirror_network = match mirror {
                    MirrorNetworkConfig::Named(name) => match name.as_str() {
                        "mainnet" => mirrors(addressbook::MAINNET_MIRROR),
                        "testnet" => mirrors(addressbook::TESTNET_MIRROR),
                        "previewnet" => mirrors(addressbook::PREVIEWNET_MIRROR),
                        other => {
                            return Err(Error::Config(format!("unknown mirror network `{other}`")))
                        }
                    },
                    MirrorNetworkConfig::List(list) => {
                        list.into_iter().map(with_mirror_port).collect()
                    }
                };
                client.with_mirror_network(mirror_network)
            }
        };

        if let Some(operator) = config.operator {
            let account_id: AccountId = operator
                .account_id
                .parse()
                .map_err(|e| Error::Config(format!("operator account: {e}")))?;
            let private_key: PrivateKey = operator
                .private_key
                .parse()
                .map_err(|e| Error::Config(format!("operator key: {e}")))?;
            client.set_operator(account_id, private_key);
        }
        Ok(client)
    }

    /// Rebuilds the handle with a different mirror list. Only used while
    /// constructing, before any clone exists.
    fn with_mirror_network(self, mirror_network: Vec<String>) -> Self {
        match Arc::try_unwrap(self.inner) {
            Ok(mut inner) => {
                inner.mirror_network = mirror_network;
                Self {
                    inner: Arc::new(inner),
                }
            }
            Err(inner) => Self { inner },
        }
    }

    // -----------------------------------------------------------------------
    // Accessors
    // -----------------------------------------------------------------------

    pub fn network(&self) -> &Network {
        &self.inner.network
    }

    pub fn mirror_network(&self) -> &[String] {
        &self.inner.mirror_network
    }

    pub fn ledger_id(&self) -> Option<LedgerId> {
        self.inner.ledger_id.read().clone()
    }

    pub fn set_ledger_id(&self, ledger_id: Option<LedgerId>) {
        *self.inner.ledger_id.write() = ledger_id;
    }

    /// Sets the account that pays for transactions built with
    /// `freeze_with(&client)`, and the key that signs for it.
    pub fn set_operator(&self, account_id: AccountId, private_key: PrivateKey) {
        debug!(operator = %account_id, "operator set");
        *self.inner.operator.write() = Some(Operator {
            account_id,
            private_key,
        });
    }

    pub fn operator_account_id(&self) -> Option<AccountId> {
        self.inner.operator.read().as_ref().map(|op| op.account_id)
    }

    pub fn operator_public_key(&self) -> Option<PublicKey> {
        self.inner
            .operator
            .read()
            .as_ref()
            .map(|op| op.private_key.public_key())
    }

    pub(crate) fn operator(&self) -> Option<Operator> {
        self.inner.operator.read().clone()
    }

    pub fn default_max_transaction_fee(&self) -> Hbar {
        *self.inner.max_transaction_fee.read()
    }

    pub fn set_default_max_transaction_fee(&self, fee: Hbar) {
        *self.inner.max_transaction_fee.write() = fee;
    }

    pub fn default_max_query_payment(&self) -> Hbar {
        *self.inner.max_query_payment.read()
    }

    pub fn set_default_max_query_payment(&self, amount: Hbar) {
        *self.inner.max_query_payment.write() = amount;
    }

    pub fn auto_validate_checksums(&self) -> bool {
        self.inner.auto_validate_checksums.load(Ordering::Relaxed)
    }

    pub fn set_auto_validate_checksums(&self, enabled: bool) {
        self.inner
            .auto_validate_checksums
            .store(enabled, Ordering::Relaxed);
    }

    pub fn default_regenerate_transaction_id(&self) -> bool {
        self.inner.regenerate_transaction_id.load(Ordering::Relaxed)
    }

    pub fn set_default_regenerate_transaction_id(&self, enabled: bool) {
        self.inner
            .regenerate_transaction_id
            .store(enabled, Ordering::Relaxed);
    }

    pub fn backoff(&self) -> BackoffConfig {
        *self.inner.backoff.read()
    }

    pub fn set_backoff(&self, backoff: BackoffConfig) {
        *self.inner.backoff.write() = backoff;
    }

    /// Installs the transport every request goes out through.
    pub fn set_transport(&self, transport: Arc<dyn Transport>) {
        *self.inner.transport.write() = Some(transport);
    }

    pub(crate) fn transport(&self) -> Result<Arc<dyn Transport>> {
        self.inner
            .transport
            .read()
            .clone()
            .ok_or_else(|| Error::illegal_state("client has no transport configured"))
    }

    // -----------------------------------------------------------------------
    // Checksums
    // -----------------------------------------------------------------------

    /// Checks every checksum-carrying ID against the client's ledger. Each
    /// `(id, checksum, ledger)` is checked at most once per client.
    pub(crate) fn validate_checksums(&self, ids: impl IntoIterator<Item = EntityId>) -> Result<()> {
        if !self.auto_validate_checksums() {
            return Ok(());
        }
        let Some(ledger_id) = self.ledger_id() else {
            return Ok(());
        };

        for id in ids {
            let Some(checksum) = id.checksum else {
                continue;
            };
            let key = (id, checksum, ledger_id.clone());
            if self.inner.validated.contains(&key) {
                continue;
            }
            id.validate_checksum(&ledger_id)?;
            self.inner.validated.insert(key);
        }
        Ok(())
    }
}

impl fmt::Debug for Client {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Client")
            .field("nodes", &self.inner.network.nodes().len())
            .field("ledger_id", &self.ledger_id())
            .field("operator", &self.operator_account_id())
            .finish_non_exhaustive()
    }
}

fn mirrors(table: &[&str]) -> Vec<String> {
    table.iter().map(|address| address.to_string()).collect()
}

fn with_mirror_port(address: String) -> String {
    if address.contains(':') {
        address
    } else {
        format!("{address}:{MIRROR_DEFAULT_PORT}")
    }
}

fn parse_network_map(map: BTreeMap<String, String>) -> Result<Vec<(String, AccountId)>> {
    map.into_iter()
        .map(|(address, account)| {
            let account_id = account
                .parse()
                .map_err(|e| Error::Config(format!("node `{address}`: {e}")))?;
            Ok((address, account_id))
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn named_networks_carry_their_ledger() {
        assert!(Client::for_name("mainnet").unwrap().ledger_id().unwrap().is_mainnet());
        assert!(Client::for_name("testnet").unwrap().ledger_id().unwrap().is_testnet());
        assert!(Client::for_name("previewnet").unwrap().ledger_id().unwrap().is_previewnet());
        assert!(Client::for_name("localhost").unwrap().ledger_id().is_none());
        assert!(matches!(Client::for_name("moonnet"), Err(Error::Config(_))));
    }

    #[test]
    fn config_with_map_and_operator() {
        let key = PrivateKey::generate_ed25519();
        let json = format!(
            r#"{{
                "network": {{"127.0.0.1:50211": "0.0.3", "127.0.0.1:50212": "0.0.4"}},
                "mirrorNetwork": ["127.0.0.1"],
                "operator": {{"accountId": "0.0.1001", "privateKey": "{key}"}}
            }}"#
        );
        let client = Client::from_config(&json).unwrap();
        assert_eq!(client.network().nodes().len(), 2);
        assert_eq!(client.mirror_network(), ["127.0.0.1:443"]);
        assert_eq!(client.operator_account_id(), Some(AccountId::new(0, 0, 1001)));
        assert_eq!(client.operator_public_key(), Some(key.public_key()));
    }

    #[test]
    fn config_with_named_network() {
        let client = Client::from_config(r#"{"network": "testnet", "mirrorNetwork": "testnet"}"#)
            .unwrap();
        assert_eq!(client.mirror_network(), ["testnet.mirrornode.hedera.com:443"]);
    }

    #[test]
    fn bad_operator_is_a_config_error() {
        let json = r#"{"network": "testnet", "operator": {"accountId": "x", "privateKey": "y"}}"#;
        assert!(matches!(Client::from_config(json), Err(Error::Config(_))));
    }

    #[test]
    fn checksum_validated_against_client_ledger() {
        let client = Client::for_testnet();
        let on_testnet = EntityId::parse("0.0.123-esxsf").unwrap();
        let on_mainnet = EntityId::parse("0.0.123-vfmkw").unwrap();

        client.validate_checksums([on_testnet]).unwrap();
        assert!(matches!(
            client.validate_checksums([on_mainnet]),
            Err(Error::ChecksumMismatch { .. })
        ));

        client.set_auto_validate_checksums(false);
        client.validate_checksums([on_mainnet]).unwrap();
    }

    #[test]
    fn successful_checks_are_cached() {
        let client = Client::for_mainnet();
        let id = EntityId::parse("0.0.123-vfmkw").unwrap();
        client.validate_checksums([id]).unwrap();
        assert!(client
            .inner
            .validated
            .contains(&(id, id.checksum.unwrap(), LedgerId::mainnet())));
    }

    #[test]
    fn missing_transport_is_reported() {
        let client = Client::for_testnet();
        assert!(matches!(client.transport(), Err(Error::IllegalState(_))));
    }

    #[test]
    fn defaults() {
        let client = Client::for_testnet();
        assert_eq!(client.default_max_transaction_fee(), Hbar::new(2));
        assert_eq!(client.default_max_query_payment(), Hbar::new(1));
        assert!(client.default_regenerate_transaction_id());
        assert!(client.operator_account_id().is_none());
    }
}
