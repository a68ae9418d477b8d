//! # Consensus Node Records
//!
//! One [`NodeRecord`] per node the client may submit to. The record owns the
//! node's addresses and its health: how many times in a row it has failed,
//! how long it is backed off for, and whether it has been pulled from
//! rotation entirely.
//!
//! ```text
//!            success                     failure (n < max)
//!   Healthy ◄──────────── Backing off ◄────────────────── Healthy
//!      ▲                      │ failure (n == max)
//!      │   health-check       ▼
//!      └──── interval ─── Excluded
//! ```
//!
//! Health lives behind a per-node `parking_lot::Mutex`. Many executions may
//! pick and penalize the same node at once; each update is a short critical
//! section and never held across an `.await`.

use parking_lot::Mutex;
use tokio::time::{Duration, Instant};
use tracing::{debug, info, warn};

use super::endpoint::Endpoint;
use crate::config::BackoffConfig;
use crate::entity::AccountId;

#[derive(Debug, Clone, Default)]
struct Health {
    consecutive_failures: u32,
    current_backoff: Duration,
    backoff_until: Option<Instant>,
    excluded_until: Option<Instant>,
    last_used: Option<Instant>,
}

/// A point-in-time copy of a node's health.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct HealthSnapshot {
    pub consecutive_failures: u32,
    pub current_backoff: Duration,
    pub backoff_until: Option<Instant>,
    pub excluded_until: Option<Instant>,
    pub last_used: Option<Instant>,
}

#[derive(Debug)]
pub struct NodeRecord {
    account_id: AccountId,
    addresses: Vec<Endpoint>,
    health: Mutex<Health>,
}

impl NodeRecord {
    pub fn new(account_id: AccountId, addresses: Vec<Endpoint>) -> Self {
        Self {
            account_id,
            addresses,
            health: Mutex::new(Health::default()),
        }
    }

    pub fn account_id(&self) -> AccountId {
        self.account_id
    }

    pub fn addresses(&self) -> &[Endpoint] {
        &self.addresses
    }

    /// The address for the `attempt`-th call, rotating through every known
    /// address of the node.
    pub fn endpoint(&self, attempt: usize) -> Option<&Endpoint> {
        if self.addresses.is_empty() {
            return None;
        }
        self.addresses.get(attempt % self.addresses.len())
    }

    pub fn health(&self) -> HealthSnapshot {
        let h = self.health.lock();
        HealthSnapshot {
            consecutive_failures: h.consecutive_failures,
            current_backoff: h.current_backoff,
            backoff_until: h.backoff_until,
            excluded_until: h.excluded_until,
            last_used: h.last_used,
        }
    }

    /// When the node next becomes eligible. `None` means now.
    pub fn available_at(&self, now: Instant) -> Option<Instant> {
        let h = self.health.lock();
        [h.backoff_until, h.excluded_until]
            .into_iter()
            .flatten()
            .filter(|at| *at > now)
            .max()
    }

    pub fn is_available(&self, now: Instant) -> bool {
        self.available_at(now).is_none()
    }

    pub(crate) fn mark_used(&self, now: Instant) {
        self.health.lock().last_used = Some(now);
    }

    /// A call to this node completed. Resets backoff to the floor.
    pub(crate) fn mark_healthy(&self, config: &BackoffConfig) {
        let mut h = self.health.lock();
        if h.consecutive_failures > 0 || h.excluded_until.is_some() {
            info!(node = %self.account_id, "node recovered");
        }
        h.consecutive_failures = 0;
        h.current_backoff = config.node_min_backoff;
        h.backoff_until = None;
        h.excluded_until = None;
    }

    /// The node could not be reached. Doubles its backoff and pulls it from
    /// rotation once it has failed `max_node_failures` times in a row.
    pub(crate) fn mark_unhealthy(&self, config: &BackoffConfig, now: Instant) {
        let mut h = self.health.lock();
        h.consecutive_failures = h.consecutive_failures.saturating_add(1);
        h.current_backoff = if h.consecutive_failures == 1 {
            config.node_min_backoff
        } else {
            (h.current_backoff * 2).clamp(config.node_min_backoff, config.node_max_backoff)
        };
        h.backoff_until = Some(now + h.current_backoff);

        if h.consecutive_failures >= config.max_node_failures {
            h.excluded_until = Some(now + config.health_check_interval);
            warn!(
                node = %self.account_id,
                failures = h.consecutive_failures,
                "node excluded until next health check"
            );
        } else {
            debug!(
                node = %self.account_id,
                failures = h.consecutive_failures,
                backoff = ?h.current_backoff,
                "node backing off"
            );
        }
    }

    /// The node answered but is congested. Steers selection away for one
    /// backoff floor without touching its failure count.
    pub(crate) fn mark_busy(&self, config: &BackoffConfig, now: Instant) {
        let mut h = self.health.lock();
        let until = now + config.node_min_backoff;
        h.backoff_until = Some(h.backoff_until.map_or(until, |at| at.max(until)));
    }
}
