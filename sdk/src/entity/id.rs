//! Entity identifiers.
//!
//! [`EntityId`] is the untyped `shard.realm.num` triple shared by every
//! ledger resource. The typed wrappers ([`AccountId`], [`FileId`],
//! [`TopicId`]) add a wire message each so the compiler keeps a topic from
//! being passed where an account is expected.
//!
//! Equality, hashing and ordering ignore the checksum: it is advisory text,
//! not identity.

use std::cmp::Ordering;
use std::fmt;
use std::hash::{Hash, Hasher};
use std::str::FromStr;

use super::checksum::Checksum;
use super::ledger::LedgerId;
use crate::error::{Error, Result};
use crate::proto::{services, FromProtobuf, ToProtobuf};

/// An untyped `shard.realm.num[-checksum]` identifier.
#[derive(Clone, Copy)]
pub struct EntityId {
    pub shard: u64,
    pub realm: u64,
    pub num: u64,
    pub checksum: Option<Checksum>,
}

impl EntityId {
    pub const fn new(shard: u64, realm: u64, num: u64) -> Self {
        Self {
            shard,
            realm,
            num,
            checksum: None,
        }
    }

    /// Parses `shard.realm.num` or `shard.realm.num-checksum`.
    pub fn parse(text: &str) -> Result<Self> {
        let bad = || {
            Error::parse(format!(
                "expected `<shard>.<realm>.<num>[-<checksum>]`, got `{text}`"
            ))
        };

        let (body, checksum) = match text.split_once('-') {
            Some((body, checksum)) => (body, Some(checksum.parse::<Checksum>()?)),
            None => (text, None),
        };

        let mut parts = body.split('.');
        let (Some(shard), Some(realm), Some(num), None) =
            (parts.next(), parts.next(), parts.next(), parts.next())
        else {
            return Err(bad());
        };

        Ok(Self {
            shard: parse_component(shard).ok_or_else(bad)?,
            realm: parse_component(realm).ok_or_else(bad)?,
            num: parse_component(num).ok_or_else(bad)?,
            checksum,
        })
    }

    /// The checksum this ID would carry on `ledger`.
    pub fn generate_checksum(&self, ledger: &LedgerId) -> Checksum {
        Checksum::generate(self.shard, self.realm, self.num, ledger)
    }

    /// Succeeds when no checksum is present, or when the present one matches
    /// `ledger`.
    pub fn validate_checksum(&self, ledger: &LedgerId) -> Result<()> {
        let Some(present) = self.checksum else {
            return Ok(());
        };
        let expected = self.generate_checksum(ledger);
        if expected == present {
            Ok(())
        } else {
            Err(Error::ChecksumMismatch {
                id: self.without_checksum().to_string(),
                expected: expected.to_string(),
                present: present.to_string(),
            })
        }
    }

    /// `shard.realm.num-checksum` for `ledger`.
    pub fn to_string_with_checksum(&self, ledger: &LedgerId) -> String {
        format!(
            "{}.{}.{}-{}",
            self.shard,
            self.realm,
            self.num,
            self.generate_checksum(ledger)
        )
    }

    pub fn without_checksum(&self) -> Self {
        Self::new(self.shard, self.realm, self.num)
    }
}

/// Decimal digits only; no sign, no whitespace.
fn parse_component(part: &str) -> Option<u64> {
    if part.is_empty() || !part.bytes().all(|b| b.is_ascii_digit()) {
        return None;
    }
    part.parse().ok()
}

impl PartialEq for EntityId {
    fn eq(&self, other: &Self) -> bool {
        (self.shard, self.realm, self.num) == (other.shard, other.realm, other.num)
    }
}

impl Eq for EntityId {}

impl Hash for EntityId {
    fn hash<H: Hasher>(&self, state: &mut H) {
        (self.shard, self.realm, self.num).hash(state);
    }
}

impl PartialOrd for EntityId {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

impl Ord for EntityId {
    fn cmp(&self, other: &Self) -> Ordering {
        (self.shard, self.realm, self.num).cmp(&(other.shard, other.realm, other.num))
    }
}

impl fmt::Display for EntityId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}.{}.{}", self.shard, self.realm, self.num)?;
        if let Some(checksum) = &self.checksum {
            write!(f, "-{checksum}")?;
        }
        Ok(())
    }
}

impl fmt::Debug for EntityId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "\"{self}\"")
    }
}

impl FromStr for EntityId {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self> {
        Self::parse(s)
    }
}

// ---------------------------------------------------------------------------
// Typed IDs
// ---------------------------------------------------------------------------

macro_rules! typed_entity_id {
    ($(#[$meta:meta])* $name:ident, $proto:ident, $num_field:ident) => {
        $(#[$meta])*
        #[derive(Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
        pub struct $name(EntityId);

        impl $name {
            pub const fn new(shard: u64, realm: u64, num: u64) -> Self {
                Self(EntityId::new(shard, realm, num))
            }

            pub fn shard(&self) -> u64 {
                self.0.shard
            }

            pub fn realm(&self) -> u64 {
                self.0.realm
            }

            pub fn num(&self) -> u64 {
                self.0.num
            }

            pub fn checksum(&self) -> Option<Checksum> {
                self.0.checksum
            }

            /// The untyped identifier.
            pub fn entity_id(&self) -> EntityId {
                self.0
            }

            pub fn validate_checksum(&self, ledger: &LedgerId) -> Result<()> {
                self.0.validate_checksum(ledger)
            }

            pub fn to_string_with_checksum(&self, ledger: &LedgerId) -> String {
                self.0.to_string_with_checksum(ledger)
            }
        }

        impl From<EntityId> for $name {
            fn from(id: EntityId) -> Self {
                Self(id)
            }
        }

        impl From<$name> for EntityId {
            fn from(id: $name) -> Self {
                id.0
            }
        }

        impl FromStr for $name {
            type Err = Error;

            fn from_str(s: &str) -> Result<Self> {
                EntityId::parse(s).map(Self)
            }
        }

        impl fmt::Display for $name {
            fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
                fmt::Display::fmt(&self.0, f)
            }
        }

        impl fmt::Debug for $name {
            fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
                write!(f, "{}(\"{}\")", stringify!($name), self.0)
            }
        }

        impl ToProtobuf for $name {
            type Protobuf = services::$proto;

            fn to_protobuf(&self) -> Self::Protobuf {
                services::$proto {
                    shard_num: self.0.shard as i64,
                    realm_num: self.0.realm as i64,
                    $num_field: self.0.num as i64,
                }
            }
        }

        impl FromProtobuf<services::$proto> for $name {
            fn from_protobuf(pb: services::$proto) -> Result<Self> {
                Ok(Self::new(
                    pb.shard_num as u64,
                    pb.realm_num as u64,
                    pb.$num_field as u64,
                ))
            }
        }
    };
}

typed_entity_id!(
    /// A ledger account: payer, transfer party, or node.
    AccountId,
    AccountId,
    account_num
);

typed_entity_id!(
    /// A file stored on the ledger.
    FileId,
    FileId,
    file_num
);

typed_entity_id!(
    /// A consensus topic.
    TopicId,
    TopicId,
    topic_num
);
