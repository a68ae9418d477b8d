//! The RPC seam.
//!
//! Channel setup, TLS and connection pooling belong to whoever implements
//! [`Transport`]. The SDK hands it an endpoint, a method path and encoded
//! request bytes, and expects encoded response bytes back before the
//! deadline.

use async_trait::async_trait;
use thiserror::Error;
use tokio::time::Instant;

use super::endpoint::Endpoint;

/// Why a call never produced a response. Every variant is retryable.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum TransportError {
    #[error("request timed out")]
    Timeout,

    #[error("connection refused")]
    ConnectionRefused,

    #[error("node unavailable: {0}")]
    Unavailable(String),

    #[error("transport failure: {0}")]
    Other(String),
}

/// Sends one encoded request to one node.
#[async_trait]
pub trait Transport: Send + Sync {
    /// `method` is the full RPC path, e.g. `proto.CryptoService/cryptoTransfer`.
    async fn send(
        &self,
        endpoint: &Endpoint,
        method: &str,
        request: Vec<u8>,
        deadline: Instant,
    ) -> Result<Vec<u8>, TransportError>;
}
