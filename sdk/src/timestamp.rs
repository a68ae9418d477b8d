//! Wall-clock instants with nanosecond precision, as the ledger sees them.

use std::fmt;
use std::str::FromStr;
use std::time::Duration;

use chrono::{DateTime, Utc};

use crate::error::{Error, Result};
use crate::proto::{services, FromProtobuf, ToProtobuf};

const NANOS_PER_SECOND: i128 = 1_000_000_000;

/// Seconds and nanoseconds since the Unix epoch. `nanos` is always below 10^9.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct Timestamp {
    pub seconds: i64,
    pub nanos: u32,
}

impl Timestamp {
    pub const fn new(seconds: i64, nanos: u32) -> Self {
        Self { seconds, nanos }
    }

    pub fn now() -> Self {
        Self::from(Utc::now())
    }

    pub fn from_unix_nanos(nanos: i128) -> Self {
        Self {
            seconds: nanos.div_euclid(NANOS_PER_SECOND) as i64,
            nanos: nanos.rem_euclid(NANOS_PER_SECOND) as u32,
        }
    }

    pub fn to_unix_nanos(self) -> i128 {
        i128::from(self.seconds) * NANOS_PER_SECOND + i128::from(self.nanos)
    }

    pub fn plus_nanos(self, nanos: u64) -> Self {
        Self::from_unix_nanos(self.to_unix_nanos() + i128::from(nanos))
    }

    pub fn minus(self, duration: Duration) -> Self {
        Self::from_unix_nanos(self.to_unix_nanos() - duration.as_nanos() as i128)
    }

    pub fn to_datetime(self) -> Option<DateTime<Utc>> {
        DateTime::from_timestamp(self.seconds, self.nanos)
    }
}

impl From<DateTime<Utc>> for Timestamp {
    fn from(at: DateTime<Utc>) -> Self {
        Self {
            seconds: at.timestamp(),
            nanos: at.timestamp_subsec_nanos(),
        }
    }
}

impl fmt::Display for Timestamp {
    /// `seconds.nanos`, nanos zero-padded to nine digits.
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}.{:09}", self.seconds, self.nanos)
    }
}

impl FromStr for Timestamp {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self> {
        let bad = || Error::parse(format!("expected `<seconds>.<nanos>`, got `{s}`"));
        let (seconds, nanos) = s.split_once('.').ok_or_else(bad)?;
        if nanos.is_empty() || !nanos.bytes().all(|b| b.is_ascii_digit()) {
            return Err(bad());
        }
        let seconds: i64 = seconds.parse().map_err(|_| bad())?;
        let nanos: u32 = nanos.parse().map_err(|_| bad())?;
        if i128::from(nanos) >= NANOS_PER_SECOND {
            return Err(bad());
        }
        Ok(Self { seconds, nanos })
    }
}

impl ToProtobuf for Timestamp {
    type Protobuf = services::Timestamp;

    fn to_protobuf(&self) -> Self::Protobuf {
        services::Timestamp {
            seconds: self.seconds,
            nanos: self.nanos as i32,
        }
    }
}

impl FromProtobuf<services::Timestamp> for Timestamp {
    fn from_protobuf(pb: services::Timestamp) -> Result<Self> {
        if pb.nanos < 0 || i128::from(pb.nanos) >= NANOS_PER_SECOND {
            return Err(Error::decode(format!("timestamp nanos out of range: {}", pb.nanos)));
        }
        Ok(Self {
            seconds: pb.seconds,
            nanos: pb.nanos as u32,
        })
    }
}
