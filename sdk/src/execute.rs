//! # Execution Engine
//!
//! The retry loop every request goes through: transaction chunks, receipt
//! polls, record queries and their cost lookups.
//!
//! ```text
//!  ┌────────────┐ select  ┌────────────┐ send   ┌──────────────┐
//!  │ NotStarted │────────►│ Dispatched │───────►│   classify   │
//!  └────────────┘         └────────────┘        └──────┬───────┘
//!        ▲                                             │
//!        │   backoff / poll interval                   ├─► Done     → Ok
//!        └─────────────────────────────────────────────┤─► Busy     → retry, node backs off
//!                                                      ├─► Pending  → retry after fixed interval
//!                                                      ├─► Expired  → regenerate ID or fail
//!                                                      └─► Fatal    → Err, no retry
//! ```
//!
//! Transport failures mark the node unhealthy and retry elsewhere with the
//! same request bytes. Retryable outcomes consume the attempt budget;
//! "still pending" polls only consume the deadline.
//!
//! Retries are organised in rounds. Within a round every candidate node is
//! tried at most once and the next attempt goes out immediately; the
//! exponential delay applies only once a whole round has failed.
//!
//! ## Cancellation
//!
//! The only suspension points are the transport call and the sleeps between
//! attempts. Both race against the caller's cancel signal and the global
//! deadline. Node health is only touched after a response (or a transport
//! error) has arrived, so an aborted attempt never counts as a success or a
//! failure.

use std::time::Duration;

use tokio::sync::watch;
use tokio::time::{sleep_until, timeout_at, Instant};
use tracing::{debug, info, warn};

use crate::client::Client;
use crate::config::{BackoffConfig, RECEIPT_POLL_INTERVAL};
use crate::entity::AccountId;
use crate::error::{Error, Result};
use crate::network::TransportError;

/// How a response is handled.
pub(crate) enum Outcome<T> {
    /// Terminal success.
    Done(T),
    /// The node is congested; try again, possibly elsewhere.
    Busy(Error),
    /// The answer is not known yet; poll again after a fixed interval.
    Pending(Error),
    /// The transaction's valid window has passed. Carries the rejection to
    /// report if the ID cannot be regenerated.
    Expired(Error),
    /// Terminal failure.
    Fatal(Error),
}

/// One retryable request.
pub(crate) trait Execute: Send {
    type Output: Send;

    /// Nodes the request may go to; `None` lets the network choose freely.
    fn node_account_ids(&self) -> Option<&[AccountId]>;

    /// Full RPC method path.
    fn method(&self) -> &'static str;

    /// Encoded request for `node`.
    fn make_request(&self, node: AccountId) -> Result<Vec<u8>>;

    fn classify(&self, node: AccountId, response: &[u8]) -> Outcome<Self::Output>;

    /// Swaps in a fresh transaction ID after `TRANSACTION_EXPIRED`. Returns
    /// whether it did.
    fn regenerate(&mut self) -> bool {
        false
    }
}

/// A completed request.
#[derive(Debug)]
pub(crate) struct Executed<T> {
    pub output: T,
    pub node_account_id: AccountId,
    /// Dispatches it took, including the successful one.
    pub attempts: usize,
}

/// Drives `request` until it completes, fails, runs out of attempts, passes
/// `deadline`, or `cancel` fires.
pub(crate) async fn execute<E: Execute>(
    client: &Client,
    request: &mut E,
    deadline: Instant,
    mut cancel: Option<watch::Receiver<bool>>,
) -> Result<Executed<E::Output>> {
    let config = client.backoff();
    let transport = client.transport()?;
    let network = client.network();
    let method = request.method();

    let mut round = Round::new(network.candidates(request.node_account_ids())?.len());

    let started = Instant::now();
    let mut attempts = 0usize;
    let mut failures = 0usize;
    let mut last: Option<Error> = None;

    loop {
        if is_cancelled(&cancel) {
            return Err(Error::Cancelled);
        }
        let now = Instant::now();
        if now >= deadline {
            return Err(timed_out(started, last));
        }
        if failures >= config.max_attempts {
            return Err(exceeded(attempts, last));
        }

        let node = network.select(request.node_account_ids(), round.tried(), now)?;
        let node_id = node.account_id();
        let endpoint = node
            .endpoint(attempts)
            .cloned()
            .ok_or_else(|| Error::NoNodes(format!("node {node_id} has no addresses")))?;
        let bytes = request.make_request(node_id)?;

        attempts += 1;
        node.mark_used(now);
        let call_deadline = (now + config.request_timeout).min(deadline);
        debug!(node = %node_id, %endpoint, method, attempt = attempts, "dispatching request");

        let sent = tokio::select! {
            biased;
            _ = cancelled(&mut cancel) => return Err(Error::Cancelled),
            sent = timeout_at(
                call_deadline,
                transport.send(&endpoint, method, bytes, call_deadline),
            ) => sent,
        };
        let response = sent.unwrap_or(Err(TransportError::Timeout));

        let delay = match response {
            Err(err) => {
                node.mark_unhealthy(&config, Instant::now());
                warn!(node = %node_id, attempt = attempts, error = %err, "transport failure");
                failures += 1;
                last = Some(err.into());
                if failures >= config.max_attempts {
                    return Err(exceeded(attempts, last));
                }
                round.failed(node_id, &config)
            }
            Ok(response) => {
                node.mark_healthy(&config);
                match request.classify(node_id, &response) {
                    Outcome::Done(output) => {
                        debug!(node = %node_id, method, attempts, "request completed");
                        return Ok(Executed {
                            output,
                            node_account_id: node_id,
                            attempts,
                        });
                    }
                    Outcome::Busy(err) => {
                        node.mark_busy(&config, Instant::now());
                        debug!(node = %node_id, attempt = attempts, error = %err, "node busy");
                        failures += 1;
                        last = Some(err);
                        if failures >= config.max_attempts {
                            return Err(exceeded(attempts, last));
                        }
                        round.failed(node_id, &config)
                    }
                    Outcome::Pending(err) => {
                        debug!(node = %node_id, attempt = attempts, "result not ready yet");
                        last = Some(err);
                        RECEIPT_POLL_INTERVAL
                    }
                    Outcome::Expired(err) => {
                        if !request.regenerate() {
                            return Err(err);
                        }
                        info!(node = %node_id, attempt = attempts, "expired, regenerated ID");
                        failures += 1;
                        last = Some(err);
                        if failures >= config.max_attempts {
                            return Err(exceeded(attempts, last));
                        }
                        Duration::ZERO
                    }
                    Outcome::Fatal(err) => {
                        debug!(node = %node_id, attempt = attempts, error = %err, "request failed");
                        return Err(err);
                    }
                }
            }
        };

        if !delay.is_zero() {
            let wake = (Instant::now() + delay).min(deadline);
            tokio::select! {
                biased;
                _ = cancelled(&mut cancel) => return Err(Error::Cancelled),
                _ = sleep_until(wake) => {}
            }
        }
    }
}

/// Nodes already tried in the current retry round.
#[derive(Debug)]
struct Round {
    candidates: usize,
    tried: Vec<AccountId>,
    completed: usize,
}

impl Round {
    fn new(candidates: usize) -> Self {
        Self {
            candidates,
            tried: Vec::with_capacity(candidates),
            completed: 0,
        }
    }

    fn tried(&self) -> &[AccountId] {
        &self.tried
    }

    /// Records a failed attempt on `node` and returns the delay before the
    /// next one: zero while untried candidates remain, otherwise the backoff
    /// for the number of rounds completed so far.
    fn failed(&mut self, node: AccountId, config: &BackoffConfig) -> Duration {
        if !self.tried.contains(&node) {
            self.tried.push(node);
        }
        if self.tried.len() < self.candidates {
            return Duration::ZERO;
        }
        self.tried.clear();
        self.completed += 1;
        backoff_delay(config, self.completed)
    }
}

/// `min_backoff * 2^(failures - 1)`, capped at `max_backoff`.
pub(crate) fn backoff_delay(config: &BackoffConfig, failures: usize) -> Duration {
    let exponent = failures.saturating_sub(1).min(31) as u32;
    config
        .min_backoff
        .saturating_mul(1u32 << exponent)
        .min(config.max_backoff)
}

fn exceeded(attempts: usize, last: Option<Error>) -> Error {
    Error::MaxAttemptsExceeded {
        attempts,
        last: Box::new(last.unwrap_or_else(|| Error::illegal_state("max_attempts is zero"))),
    }
}

fn timed_out(started: Instant, last: Option<Error>) -> Error {
    Error::Timeout {
        elapsed: started.elapsed(),
        last: last.map(Box::new),
    }
}

fn is_cancelled(cancel: &Option<watch::Receiver<bool>>) -> bool {
    cancel.as_ref().is_some_and(|rx| *rx.borrow())
}

/// Resolves once the cancel signal is raised. Never resolves without one,
/// or once the sender is gone.
async fn cancelled(cancel: &mut Option<watch::Receiver<bool>>) {
    let Some(rx) = cancel else {
        return std::future::pending().await;
    };
    loop {
        if *rx.borrow_and_update() {
            return;
        }
        if rx.changed().await.is_err() {
            return std::future::pending().await;
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn backoff_doubles_and_caps() {
        let config = BackoffConfig {
            min_backoff: Duration::from_millis(250),
            max_backoff: Duration::from_secs(1),
            ..BackoffConfig::default()
        };
        assert_eq!(backoff_delay(&config, 1), Duration::from_millis(250));
        assert_eq!(backoff_delay(&config, 2), Duration::from_millis(500));
        assert_eq!(backoff_delay(&config, 3), Duration::from_secs(1));
        assert_eq!(backoff_delay(&config, 60), Duration::from_secs(1));
    }

    #[test]
    fn round_backs_off_only_after_every_candidate() {
        let config = BackoffConfig {
            min_backoff: Duration::from_millis(250),
            ..BackoffConfig::default()
        };
        let (a, b) = (AccountId::new(0, 0, 3), AccountId::new(0, 0, 4));
        let mut round = Round::new(2);

        assert_eq!(round.failed(a, &config), Duration::ZERO);
        assert_eq!(round.tried(), [a]);
        assert_eq!(round.failed(b, &config), Duration::from_millis(250));
        assert!(round.tried().is_empty());

        round.failed(b, &config);
        assert_eq!(round.failed(a, &config), Duration::from_millis(500));
    }

    #[test]
    fn single_candidate_backs_off_every_time() {
        let config = BackoffConfig::default();
        let mut round = Round::new(1);
        let node = AccountId::new(0, 0, 3);
        assert_eq!(round.failed(node, &config), config.min_backoff);
        assert_eq!(round.failed(node, &config), config.min_backoff * 2);
    }

    #[tokio::test]
    async fn cancel_signal_resolves() {
        let (tx, rx) = watch::channel(false);
        let mut cancel = Some(rx);
        assert!(!is_cancelled(&cancel));
        tx.send(true).unwrap();
        cancelled(&mut cancel).await;
        assert!(is_cancelled(&cancel));
    }
}
