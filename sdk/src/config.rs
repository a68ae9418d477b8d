//! # SDK Configuration & Constants
//!
//! Every magic number the SDK relies on lives here: wire ports, chunk
//! ceilings, default fees, and the retry/backoff envelope. If you're
//! hardcoding one of these somewhere else, you're doing it wrong.
//!
//! The second half of the module is the JSON configuration surface
//! ([`ClientConfig`]) that callers load a client from. It is deliberately
//! dumb: plain strings in, validated types out happen in
//! [`crate::client::Client::from_config`].

use std::collections::BTreeMap;
use std::path::Path;
use std::time::Duration;

use serde::{Deserialize, Serialize};

use crate::error::{Error, Result};

// ---------------------------------------------------------------------------
// Network Ports
// ---------------------------------------------------------------------------

/// Plaintext gRPC port exposed by consensus nodes.
pub const NODE_PLAINTEXT_PORT: u16 = 50211;

/// TLS gRPC port exposed by consensus nodes.
pub const NODE_TLS_PORT: u16 = 50212;

/// Port assumed for a mirror address given without one.
pub const MIRROR_DEFAULT_PORT: u16 = 443;

// ---------------------------------------------------------------------------
// Transaction Parameters
// ---------------------------------------------------------------------------

/// How long a transaction stays valid after its start timestamp.
pub const DEFAULT_TRANSACTION_VALID_DURATION: Duration = Duration::from_secs(120);

/// Default ceiling on what a transaction may charge its payer, in tinybars (2 ℏ).
pub const DEFAULT_MAX_TRANSACTION_FEE_TINYBARS: i64 = 200_000_000;

/// Default ceiling on what a paid query may cost, in tinybars (1 ℏ).
pub const DEFAULT_MAX_QUERY_PAYMENT_TINYBARS: i64 = 100_000_000;

/// Memo length limit enforced by the network, in bytes.
pub const MAX_MEMO_LENGTH: usize = 100;

/// Per-chunk payload ceiling for topic messages.
pub const TOPIC_MESSAGE_CHUNK_SIZE: usize = 1024;

/// Per-chunk payload ceiling for file appends.
pub const FILE_APPEND_CHUNK_SIZE: usize = 4096;

/// Default number of chunks a single logical transaction may span.
pub const DEFAULT_MAX_CHUNKS: usize = 20;

/// Upper bound on the random offset subtracted from "now" when generating a
/// transaction ID. Absorbs small local clock skew against the network.
pub const TRANSACTION_ID_BACKDATE_MAX: Duration = Duration::from_secs(8);

// ---------------------------------------------------------------------------
// Retry & Backoff
// ---------------------------------------------------------------------------

/// Attempts per request before giving up with `MaxAttemptsExceeded`.
pub const DEFAULT_MAX_ATTEMPTS: usize = 10;

/// Delay before the first retry. Doubles per attempt up to the ceiling.
pub const DEFAULT_MIN_BACKOFF: Duration = Duration::from_millis(250);

/// Ceiling on the delay between two attempts.
pub const DEFAULT_MAX_BACKOFF: Duration = Duration::from_secs(8);

/// Time budget for a single RPC call.
pub const DEFAULT_REQUEST_TIMEOUT: Duration = Duration::from_secs(10);

/// Wall-clock budget for one execution across every chunk and retry.
pub const DEFAULT_EXECUTION_TIMEOUT: Duration = Duration::from_secs(120);

/// Wall-clock budget for polling a receipt or record.
pub const DEFAULT_RECEIPT_TIMEOUT: Duration = Duration::from_secs(120);

/// Fixed delay between two receipt polls that came back "not yet known".
pub const RECEIPT_POLL_INTERVAL: Duration = Duration::from_millis(500);

/// Floor of a node's personal backoff after a transport failure.
pub const NODE_MIN_BACKOFF: Duration = Duration::from_millis(250);

/// Ceiling of a node's personal backoff.
pub const NODE_MAX_BACKOFF: Duration = Duration::from_secs(30 * 60);

/// Consecutive transport failures before a node is pulled from rotation.
pub const DEFAULT_MAX_NODE_FAILURES: u32 = 5;

/// How long an unhealthy node sits out before it is offered again.
pub const DEFAULT_HEALTH_CHECK_INTERVAL: Duration = Duration::from_secs(15 * 60);

/// Retry and backoff envelope shared by every execution a client runs.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct BackoffConfig {
    /// Attempts per chunk before `MaxAttemptsExceeded`.
    pub max_attempts: usize,
    /// First delay between attempts.
    pub min_backoff: Duration,
    /// Ceiling for the delay between attempts.
    pub max_backoff: Duration,
    /// Per-call transport deadline.
    pub request_timeout: Duration,
    /// Global deadline for an execution (all chunks, all attempts).
    pub execution_timeout: Duration,
    /// Global deadline for receipt/record polling.
    pub receipt_timeout: Duration,
    /// Floor of a node's own backoff window.
    pub node_min_backoff: Duration,
    /// Ceiling of a node's own backoff window.
    pub node_max_backoff: Duration,
    /// Consecutive failures after which a node is marked unhealthy.
    pub max_node_failures: u32,
    /// How long an unhealthy node is excluded from selection.
    pub health_check_interval: Duration,
}

impl Default for BackoffConfig {
    fn default() -> Self {
        Self {
            max_attempts: DEFAULT_MAX_ATTEMPTS,
            min_backoff: DEFAULT_MIN_BACKOFF,
            max_backoff: DEFAULT_MAX_BACKOFF,
            request_timeout: DEFAULT_REQUEST_TIMEOUT,
            execution_timeout: DEFAULT_EXECUTION_TIMEOUT,
            receipt_timeout: DEFAULT_RECEIPT_TIMEOUT,
            node_min_backoff: NODE_MIN_BACKOFF,
            node_max_backoff: NODE_MAX_BACKOFF,
            max_node_failures: DEFAULT_MAX_NODE_FAILURES,
            health_check_interval: DEFAULT_HEALTH_CHECK_INTERVAL,
        }
    }
}

// ---------------------------------------------------------------------------
// JSON Client Configuration
// ---------------------------------------------------------------------------

/// Operator credentials as they appear in a config file.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct OperatorConfig {
    /// Payer account, e.g. `"0.0.1001"`.
    pub account_id: String,
    /// DER-hex encoded private key.
    pub private_key: String,
}

/// The `network` entry: either a well-known name or an explicit
/// `{"host:port": "shard.realm.num"}` map.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum NetworkConfig {
    Named(String),
    Map(BTreeMap<String, String>),
}

/// The `mirrorNetwork` entry: either a well-known name or an address list.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum MirrorNetworkConfig {
    Named(String),
    List(Vec<String>),
}

/// Raw client configuration.
///
/// ```json
/// {
///   "network": "testnet",
///   "mirrorNetwork": ["testnet.mirrornode.hedera.com:443"],
///   "operator": { "accountId": "0.0.1001", "privateKey": "302e..." }
/// }
/// ```
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ClientConfig {
    pub network: NetworkConfig,
    #[serde(default)]
    pub mirror_network: Option<MirrorNetworkConfig>,
    #[serde(default)]
    pub operator: Option<OperatorConfig>,
}

impl ClientConfig {
    /// Parses a configuration from JSON text.
    pub fn from_json(text: &str) -> Result<Self> {
        serde_json::from_str(text).map_err(|e| Error::Config(e.to_string()))
    }

    /// Reads and parses a JSON configuration file.
    pub fn from_file(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        let text = std::fs::read_to_string(path)
            .map_err(|e| Error::Config(format!("{}: {e}", path.display())))?;
        Self::from_json(&text)
    }
}
