//! # CLI Interface
//!
//! Defines the command-line argument structure for `hiero` using `clap`
//! derive. Every subcommand works offline: nothing here opens a connection
//! to a node.

use clap::{Parser, Subcommand, ValueEnum};
use std::path::PathBuf;

use hiero_sdk::KeyAlgorithm;

use crate::logging::LogFormat;

/// Offline companion for the Hiero SDK.
///
/// Parses and checksums entity IDs, generates keys and recovery phrases,
/// and validates client configuration files.
#[derive(Parser, Debug)]
#[command(
    name = "hiero",
    about = "Hiero SDK command-line tools",
    version,
    propagate_version = true
)]
pub struct HieroCli {
    /// Log output format. Logs go to stderr.
    #[arg(
        long,
        global = true,
        env = "HIERO_LOG_FORMAT",
        value_enum,
        default_value_t = LogFormat::Pretty
    )]
    pub log_format: LogFormat,

    /// Default log level when `RUST_LOG` is not set.
    #[arg(long, global = true, env = "HIERO_LOG_LEVEL", default_value = "warn")]
    pub log_level: String,

    /// Print command output as JSON instead of aligned text.
    #[arg(long, global = true)]
    pub json: bool,

    /// Subcommand to execute.
    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Parse an entity ID and print its canonical form.
    Id(IdArgs),
    /// Compute (and, if present, check) the checksum of an entity ID.
    Checksum(ChecksumArgs),
    /// Generate a fresh private key.
    Keygen(KeygenArgs),
    /// Generate or recover a recovery phrase and derive a key from it.
    Mnemonic(MnemonicArgs),
    /// Load a client configuration file and summarize it.
    Config(ConfigArgs),
}

#[derive(Parser, Debug)]
pub struct IdArgs {
    /// `shard.realm.num`, optionally followed by `-checksum`.
    pub text: String,

    /// Ledger to check the checksum against: a network name or hex bytes.
    #[arg(long, env = "HIERO_LEDGER")]
    pub ledger: Option<String>,
}

#[derive(Parser, Debug)]
pub struct ChecksumArgs {
    /// `shard.realm.num`, optionally followed by `-checksum`.
    pub id: String,

    /// Ledger the checksum is computed for: a network name or hex bytes.
    #[arg(long, env = "HIERO_LEDGER")]
    pub ledger: String,
}

#[derive(Parser, Debug)]
pub struct KeygenArgs {
    #[arg(long, value_enum, default_value_t = Curve::Ed25519)]
    pub curve: Curve,
}

#[derive(Parser, Debug)]
pub struct MnemonicArgs {
    /// Number of words in a newly generated phrase: 12 or 24.
    #[arg(long, default_value_t = 24)]
    pub words: usize,

    /// Recover from an existing phrase instead of generating one.
    #[arg(long, env = "HIERO_MNEMONIC")]
    pub phrase: Option<String>,

    /// Account index on the standard derivation path.
    #[arg(long, default_value_t = 0)]
    pub index: u32,

    #[arg(long, env = "HIERO_MNEMONIC_PASSPHRASE", default_value = "")]
    pub passphrase: String,

    #[arg(long, value_enum, default_value_t = Curve::Ed25519)]
    pub curve: Curve,
}

#[derive(Parser, Debug)]
pub struct ConfigArgs {
    /// Path to a JSON client configuration.
    pub path: PathBuf,
}

/// Signature curve.
#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub enum Curve {
    Ed25519,
    Ecdsa,
}

impl Curve {
    pub fn algorithm(self) -> KeyAlgorithm {
        match self {
            Curve::Ed25519 => KeyAlgorithm::Ed25519,
            Curve::Ecdsa => KeyAlgorithm::EcdsaSecp256k1,
        }
    }

    pub fn name(self) -> &'static str {
        match self {
            Curve::Ed25519 => "ed25519",
            Curve::Ecdsa => "ecdsa-secp256k1",
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use clap::CommandFactory;

    #[test]
    fn verify_cli_structure() {
        HieroCli::command().debug_assert();
    }

    #[test]
    fn global_flags_follow_the_subcommand() {
        let cli = HieroCli::try_parse_from([
            "hiero",
            "keygen",
            "--curve",
            "ecdsa",
            "--log-format",
            "json",
            "--json",
        ])
        .unwrap();
        assert_eq!(cli.log_format, LogFormat::Json);
        assert!(cli.json);
        match cli.command {
            Commands::Keygen(args) => assert_eq!(args.curve, Curve::Ecdsa),
            other => panic!("unexpected command {other:?}"),
        }
    }

    #[test]
    fn checksum_requires_a_ledger() {
        std::env::remove_var("HIERO_LEDGER");
        assert!(HieroCli::try_parse_from(["hiero", "checksum", "0.0.3"]).is_err());
    }
}
