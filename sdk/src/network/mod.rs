//! # Network Module
//!
//! The set of consensus nodes a client may talk to, their health, and the
//! seam through which requests actually leave the process.
//!
//! ## Architecture
//!
//! ```text
//! endpoint.rs     — host:port addresses
//! node.rs         — per-node record with failure count, backoff and exclusion
//! addressbook.rs  — static address books for mainnet / testnet / previewnet
//! transport.rs    — the Transport trait and TransportError
//! ```
//!
//! ## Design Decisions
//!
//! - Node addresses are resolved once, when the network is built. After that
//!   the node list is read-only; only per-node health mutates.
//! - Selection prefers nodes that are neither backing off nor excluded,
//!   picked at random to spread load. If every candidate is unavailable the
//!   one that frees up soonest is used rather than failing outright.
//! - Health timestamps use `tokio::time::Instant`, so tests with paused time
//!   see backoff windows expire deterministically.

pub mod addressbook;
pub mod endpoint;
pub mod node;
pub mod transport;

pub use endpoint::Endpoint;
pub use node::{HealthSnapshot, NodeRecord};
pub use transport::{Transport, TransportError};

use std::collections::BTreeMap;
use std::sync::Arc;

use rand::seq::SliceRandom;
use tokio::time::Instant;

use crate::entity::AccountId;
use crate::error::{Error, Result};

/// The consensus nodes known to a client.
#[derive(Debug, Default)]
pub struct Network {
    /// Sorted by account ID.
    nodes: Vec<Arc<NodeRecord>>,
}

impl Network {
    pub fn mainnet() -> Self {
        Self::from_table(addressbook::MAINNET)
    }

    pub fn testnet() -> Self {
        Self::from_table(addressbook::TESTNET)
    }

    pub fn previewnet() -> Self {
        Self::from_table(addressbook::PREVIEWNET)
    }

    fn from_table(table: &[(&str, u64)]) -> Self {
        let mut by_node: BTreeMap<AccountId, Vec<Endpoint>> = BTreeMap::new();
        for (address, num) in table {
            if let Ok(endpoint) = address.parse() {
                by_node.entry(AccountId::new(0, 0, *num)).or_default().push(endpoint);
            }
        }
        Self::from_grouped(by_node)
    }

    /// Builds a network from `(address, node account)` pairs. A node listed
    /// under several addresses gets all of them.
    pub fn from_addresses<I, S>(addresses: I) -> Result<Self>
    where
        I: IntoIterator<Item = (S, AccountId)>,
        S: AsRef<str>,
    {
        let mut by_node: BTreeMap<AccountId, Vec<Endpoint>> = BTreeMap::new();
        for (address, account_id) in addresses {
            let endpoint: Endpoint = address.as_ref().parse()?;
            by_node.entry(account_id).or_default().push(endpoint);
        }
        if by_node.is_empty() {
            return Err(Error::Config("network has no nodes".into()));
        }
        Ok(Self::from_grouped(by_node))
    }

    fn from_grouped(by_node: BTreeMap<AccountId, Vec<Endpoint>>) -> Self {
        let nodes = by_node
            .into_iter()
            .map(|(account_id, addresses)| Arc::new(NodeRecord::new(account_id, addresses)))
            .collect();
        Self { nodes }
    }

    pub fn nodes(&self) -> &[Arc<NodeRecord>] {
        &self.nodes
    }

    pub fn node(&self, account_id: AccountId) -> Option<&Arc<NodeRecord>> {
        self.nodes
            .binary_search_by_key(&account_id, |node| node.account_id())
            .ok()
            .map(|index| &self.nodes[index])
    }

    pub fn node_account_ids(&self) -> Vec<AccountId> {
        self.nodes.iter().map(|node| node.account_id()).collect()
    }

    /// The nodes a request restricted to `allowed` may go to; every node when
    /// `allowed` is `None`.
    pub fn candidates(&self, allowed: Option<&[AccountId]>) -> Result<Vec<&Arc<NodeRecord>>> {
        let candidates: Vec<&Arc<NodeRecord>> = match allowed {
            Some(ids) => ids.iter().filter_map(|id| self.node(*id)).collect(),
            None => self.nodes.iter().collect(),
        };
        if candidates.is_empty() {
            return Err(Error::NoNodes(match allowed {
                Some(ids) => format!("none of {ids:?} are in the network"),
                None => "the network is empty".into(),
            }));
        }
        Ok(candidates)
    }

    /// Picks a node for the next attempt, restricted to `allowed` if given.
    ///
    /// Nodes in `skip` are passed over while any other candidate remains.
    pub fn select(
        &self,
        allowed: Option<&[AccountId]>,
        skip: &[AccountId],
        now: Instant,
    ) -> Result<Arc<NodeRecord>> {
        let candidates = self.candidates(allowed)?;
        let untried: Vec<&Arc<NodeRecord>> = candidates
            .iter()
            .copied()
            .filter(|node| !skip.contains(&node.account_id()))
            .collect();
        let pool = if untried.is_empty() { candidates } else { untried };

        let available: Vec<&Arc<NodeRecord>> = pool
            .iter()
            .copied()
            .filter(|node| node.is_available(now))
            .collect();
        let chosen = match available.choose(&mut rand::thread_rng()) {
            Some(node) => *node,
            None => pool
                .iter()
                .copied()
                .min_by_key(|node| node.available_at(now))
                .ok_or_else(|| Error::NoNodes("no candidate nodes".into()))?,
        };
        Ok(Arc::clone(chosen))
    }

    /// About a third of the currently available nodes (at least one), for
    /// transactions frozen without explicit node IDs.
    pub fn sample_node_account_ids(&self, now: Instant) -> Result<Vec<AccountId>> {
        if self.nodes.is_empty() {
            return Err(Error::NoNodes("the network is empty".into()));
        }
        let mut available: Vec<AccountId> = self
            .nodes
            .iter()
            .filter(|node| node.is_available(now))
            .map(|node| node.account_id())
            .collect();
        if available.is_empty() {
            available = self.node_account_ids();
        }

        let count = ((available.len() + 2) / 3).max(1);
        available.shuffle(&mut rand::thread_rng());
        available.truncate(count);
        available.sort();
        Ok(available)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::BackoffConfig;
    use std::time::Duration;

    fn local(n: u64) -> Network {
        Network::from_addresses(
            (0..n).map(|i| (format!("127.0.0.1:{}", 50211 + i), AccountId::new(0, 0, 3 + i))),
        )
        .unwrap()
    }

    #[test]
    fn builtin_address_books_are_well_formed() {
        for (network, nodes) in [
            (Network::mainnet(), 8),
            (Network::testnet(), 7),
            (Network::previewnet(), 7),
        ] {
            assert_eq!(network.nodes().len(), nodes);
            assert_eq!(network.nodes()[0].account_id(), AccountId::new(0, 0, 3));
        }
        assert_eq!(Network::mainnet().node(AccountId::new(0, 0, 3)).unwrap().addresses().len(), 3);
    }

    #[test]
    fn empty_map_is_a_config_error() {
        let empty: Vec<(String, AccountId)> = Vec::new();
        assert!(matches!(Network::from_addresses(empty), Err(Error::Config(_))));
    }

    #[test]
    fn selection_respects_allowed_list() {
        let network = local(4);
        let allowed = [AccountId::new(0, 0, 5)];
        for _ in 0..20 {
            let node = network.select(Some(&allowed), &[], Instant::now()).unwrap();
            assert_eq!(node.account_id(), allowed[0]);
        }
        assert!(matches!(
            network.select(Some(&[AccountId::new(0, 0, 99)]), &[], Instant::now()),
            Err(Error::NoNodes(_))
        ));
    }

    #[test]
    fn selection_skips_backed_off_nodes() {
        let network = local(2);
        let cfg = BackoffConfig::default();
        let now = Instant::now();
        network.nodes()[0].mark_unhealthy(&cfg, now);
        for _ in 0..20 {
            let node = network.select(None, &[], now).unwrap();
            assert_eq!(node.account_id(), AccountId::new(0, 0, 4));
        }
    }

    #[test]
    fn all_backed_off_picks_nearest_expiry() {
        let network = local(2);
        let cfg = BackoffConfig::default();
        let now = Instant::now();
        network.nodes()[0].mark_unhealthy(&cfg, now);
        network.nodes()[0].mark_unhealthy(&cfg, now);
        network.nodes()[1].mark_unhealthy(&cfg, now + Duration::from_millis(1));
        // Node 0 is on its doubled backoff; node 1 on the floor.
        assert_eq!(network.select(None, &[], now).unwrap().account_id(), AccountId::new(0, 0, 4));
    }

    #[test]
    fn skipped_nodes_are_passed_over_until_none_remain() {
        let network = local(3);
        let now = Instant::now();
        let skip = [AccountId::new(0, 0, 3), AccountId::new(0, 0, 5)];
        for _ in 0..20 {
            assert_eq!(
                network.select(None, &skip, now).unwrap().account_id(),
                AccountId::new(0, 0, 4)
            );
        }
        let all = network.node_account_ids();
        assert!(network.select(None, &all, now).is_ok());
    }

    #[test]
    fn sample_takes_about_a_third() {
        let network = local(9);
        let sample = network.sample_node_account_ids(Instant::now()).unwrap();
        assert_eq!(sample.len(), 3);
        assert!(sample.windows(2).all(|w| w[0] < w[1]));
        assert_eq!(local(1).sample_node_account_ids(Instant::now()).unwrap().len(), 1);
    }
}
