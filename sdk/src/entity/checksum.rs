//! Entity ID checksums.
//!
//! A checksum is five lowercase letters derived from an entity's
//! `shard.realm.num` text and the ledger's identity bytes. Attaching it to an
//! ID (`0.0.123-vfmkw`) lets the SDK catch an ID copied from the wrong
//! network before anything is sent.

use std::fmt;
use std::str::FromStr;

use super::ledger::LedgerId;
use crate::error::{Error, Result};

/// Length of a checksum in characters.
pub const CHECKSUM_LEN: usize = 5;

const P3: u64 = 26 * 26 * 26;
const P5: u64 = 26 * 26 * 26 * 26 * 26;
const WEIGHT: u64 = 31;
const MULTIPLIER: u64 = 1_000_003;

/// Five lowercase ASCII letters.
#[derive(Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct Checksum([u8; CHECKSUM_LEN]);

impl Checksum {
    /// Computes the checksum of `shard.realm.num` for `ledger`.
    pub fn generate(shard: u64, realm: u64, num: u64, ledger: &LedgerId) -> Self {
        let text = format!("{shard}.{realm}.{num}");

        let mut sum = 0u64;
        let mut even = 0u64;
        let mut odd = 0u64;
        for (i, ch) in text.bytes().enumerate() {
            let digit = if ch == b'.' { 10 } else { u64::from(ch - b'0') };
            sum = (WEIGHT * sum + digit) % P3;
            if i % 2 == 0 {
                even = (even + digit) % 11;
            } else {
                odd = (odd + digit) % 11;
            }
        }

        // Ledger bytes followed by six zero bytes.
        let mut ledger_hash = 0u64;
        for &b in ledger.as_bytes().iter().chain([0u8; 6].iter()) {
            ledger_hash = (WEIGHT * ledger_hash + u64::from(b)) % P5;
        }

        let mut c = ((text.len() as u64 % 5) * 11 + even) * 11 + odd;
        c = (c * P3 + sum + ledger_hash) % P5;
        c = (c * MULTIPLIER) % P5;

        let mut out = [0u8; CHECKSUM_LEN];
        for slot in out.iter_mut().rev() {
            *slot = b'a' + (c % 26) as u8;
            c /= 26;
        }
        Self(out)
    }

    pub fn as_str(&self) -> &str {
        // Construction guarantees ASCII.
        std::str::from_utf8(&self.0).unwrap_or_default()
    }
}

impl FromStr for Checksum {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self> {
        let bytes: [u8; CHECKSUM_LEN] = s
            .as_bytes()
            .try_into()
            .map_err(|_| {
                Error::parse(format!("checksum `{s}` must be {CHECKSUM_LEN} characters"))
            })?;
        if !bytes.iter().all(u8::is_ascii_lowercase) {
            return Err(Error::parse(format!(
                "checksum `{s}` must be lowercase letters"
            )));
        }
        Ok(Self(bytes))
    }
}

impl fmt::Display for Checksum {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl fmt::Debug for Checksum {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "\"{self}\"")
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn checksum(num: u64, ledger: LedgerId) -> String {
        Checksum::generate(0, 0, num, &ledger).to_string()
    }

    #[test]
    fn known_vectors() {
        assert_eq!(checksum(123, LedgerId::mainnet()), "vfmkw");
        assert_eq!(checksum(123, LedgerId::testnet()), "esxsf");
        assert_eq!(checksum(123, LedgerId::previewnet()), "ogizo");
        assert_eq!(checksum(3, LedgerId::mainnet()), "tzfmz");
        assert_eq!(checksum(3, LedgerId::testnet()), "dmqui");
    }

    #[test]
    fn extreme_values_stay_in_alphabet() {
        let c = Checksum::generate(u64::MAX, u64::MAX, u64::MAX, &LedgerId::mainnet());
        assert!(c.as_str().bytes().all(|b| b.is_ascii_lowercase()));
    }

    #[test]
    fn parse_rejects_wrong_shape() {
        assert!("abcd".parse::<Checksum>().is_err());
        assert!("abcdef".parse::<Checksum>().is_err());
        assert!("ABCDE".parse::<Checksum>().is_err());
        assert!("abc1e".parse::<Checksum>().is_err());
        assert_eq!("vfmkw".parse::<Checksum>().unwrap().as_str(), "vfmkw");
    }
}
