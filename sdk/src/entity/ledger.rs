//! Ledger identity.
//!
//! A ledger is identified by a short byte string. The three public networks
//! use single-byte IDs; private networks may use anything.

use std::borrow::Cow;
use std::fmt;
use std::str::FromStr;

use crate::error::{Error, Result};

/// Identifies the ledger a client talks to. Feeds the entity checksum.
#[derive(Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct LedgerId(Cow<'static, [u8]>);

const MAINNET: &[u8] = &[0];
const TESTNET: &[u8] = &[1];
const PREVIEWNET: &[u8] = &[2];

impl LedgerId {
    pub const fn mainnet() -> Self {
        Self(Cow::Borrowed(MAINNET))
    }

    pub const fn testnet() -> Self {
        Self(Cow::Borrowed(TESTNET))
    }

    pub const fn previewnet() -> Self {
        Self(Cow::Borrowed(PREVIEWNET))
    }

    /// A ledger with arbitrary identity bytes.
    pub fn from_bytes(bytes: Vec<u8>) -> Self {
        Self(Cow::Owned(bytes))
    }

    pub fn as_bytes(&self) -> &[u8] {
        &self.0
    }

    /// The well-known name, if this is one of the public networks.
    pub fn name(&self) -> Option<&'static str> {
        match &*self.0 {
            MAINNET => Some("mainnet"),
            TESTNET => Some("testnet"),
            PREVIEWNET => Some("previewnet"),
            _ => None,
        }
    }

    pub fn is_mainnet(&self) -> bool {
        &*self.0 == MAINNET
    }

    pub fn is_testnet(&self) -> bool {
        &*self.0 == TESTNET
    }

    pub fn is_previewnet(&self) -> bool {
        &*self.0 == PREVIEWNET
    }
}

impl fmt::Display for LedgerId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self.name() {
            Some(name) => f.write_str(name),
            None => f.write_str(&hex::encode(&self.0)),
        }
    }
}

impl fmt::Debug for LedgerId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "LedgerId({self})")
    }
}

impl FromStr for LedgerId {
    type Err = Error;

    /// Accepts a network name or a hex string.
    fn from_str(s: &str) -> Result<Self> {
        match s {
            "mainnet" => Ok(Self::mainnet()),
            "testnet" => Ok(Self::testnet()),
            "previewnet" => Ok(Self::previewnet()),
            _ => hex::decode(s)
                .map(Self::from_bytes)
                .map_err(|_| Error::parse(format!("invalid ledger id `{s}`"))),
        }
    }
}
