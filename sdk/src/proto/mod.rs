//! # Wire Codec
//!
//! Every value that crosses the network boundary converts to and from a
//! tagged binary message. The contract is small and strict:
//!
//! - `from_protobuf(to_protobuf(x)) == x` for every valid `x`.
//! - Truncated or malformed bytes produce [`Error::Decode`]; required
//!   fields that are absent do too. Nothing silently falls back to a
//!   default.
//! - Unsigned domain values stored in signed wire fields are bit-cast both
//!   ways, so the conversion is symmetric over the whole `u64` range.
//!
//! The message definitions themselves live in [`services`].

pub mod services;

use prost::Message;

use crate::error::{Error, Result};

/// Conversion of a domain value into its wire message.
pub trait ToProtobuf {
    /// The wire message this value encodes to.
    type Protobuf: Message;

    /// Builds the wire message.
    fn to_protobuf(&self) -> Self::Protobuf;

    /// Encodes the wire message to bytes.
    fn to_bytes(&self) -> Vec<u8> {
        self.to_protobuf().encode_to_vec()
    }
}

/// Conversion of a wire message into a domain value.
pub trait FromProtobuf<P>: Sized {
    /// Validates and converts the wire message.
    fn from_protobuf(pb: P) -> Result<Self>;

    /// Decodes bytes and converts the resulting message.
    fn from_bytes(bytes: &[u8]) -> Result<Self>
    where
        P: Message + Default,
    {
        Self::from_protobuf(P::decode(bytes)?)
    }
}

/// Unwraps a message field the schema marks optional but the domain needs.
pub(crate) fn required<T>(value: Option<T>, field: &'static str) -> Result<T> {
    value.ok_or_else(|| Error::decode(format!("missing required field `{field}`")))
}
