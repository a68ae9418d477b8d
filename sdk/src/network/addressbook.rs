//! Built-in address books for the public networks.
//!
//! A static snapshot: good enough to bootstrap, not a substitute for a live
//! address book fetched from a mirror node.

pub(crate) const MAINNET: &[(&str, u64)] = &[
    ("35.237.200.180:50211", 3),
    ("34.239.82.6:50211", 3),
    ("13.124.142.126:50211", 3),
    ("35.186.191.247:50211", 4),
    ("3.130.52.236:50211", 4),
    ("35.192.2.25:50211", 5),
    ("3.18.18.254:50211", 5),
    ("35.199.161.108:50211", 6),
    ("13.52.108.243:50211", 6),
    ("35.203.82.240:50211", 7),
    ("3.114.54.4:50211", 7),
    ("35.236.5.219:50211", 8),
    ("35.183.66.150:50211", 8),
    ("35.197.192.225:50211", 9),
    ("35.181.158.250:50211", 9),
    ("35.242.233.154:50211", 10),
    ("3.248.27.48:50211", 10),
];

pub(crate) const TESTNET: &[(&str, u64)] = &[
    ("0.testnet.hedera.com:50211", 3),
    ("1.testnet.hedera.com:50211", 4),
    ("2.testnet.hedera.com:50211", 5),
    ("3.testnet.hedera.com:50211", 6),
    ("4.testnet.hedera.com:50211", 7),
    ("5.testnet.hedera.com:50211", 8),
    ("6.testnet.hedera.com:50211", 9),
];

pub(crate) const PREVIEWNET: &[(&str, u64)] = &[
    ("0.previewnet.hedera.com:50211", 3),
    ("1.previewnet.hedera.com:50211", 4),
    ("2.previewnet.hedera.com:50211", 5),
    ("3.previewnet.hedera.com:50211", 6),
    ("4.previewnet.hedera.com:50211", 7),
    ("5.previewnet.hedera.com:50211", 8),
    ("6.previewnet.hedera.com:50211", 9),
];

pub(crate) const MAINNET_MIRROR: &[&str] = &["mainnet-public.mirrornode.hedera.com:443"];
pub(crate) const TESTNET_MIRROR: &[&str] = &["testnet.mirrornode.hedera.com:443"];
pub(crate) const PREVIEWNET_MIRROR: &[&str] = &["previewnet.mirrornode.hedera.com:443"];
