// Copyright (c) 2026 ALAS Technology. MIT License.
// See LICENSE for details.

//! # Hiero CLI
//!
//! Entry point for the `hiero` binary. Parses CLI arguments, initializes
//! logging, runs one offline command and prints its result.
//!
//! - `id`       — parse an entity ID
//! - `checksum` — compute or verify an entity ID checksum
//! - `keygen`   — generate a private key
//! - `mnemonic` — generate or recover a phrase and derive a key
//! - `config`   — validate a client configuration file

mod cli;
mod logging;

use anyhow::{bail, Context, Result};
use clap::Parser;
use serde::Serialize;

use hiero_sdk::{Client, EntityId, LedgerId, Mnemonic, PrivateKey};

use cli::{Commands, HieroCli};

fn main() -> Result<()> {
    let cli = HieroCli::parse();
    logging::init_logging(&cli.log_level, cli.log_format);

    let report = match cli.command {
        Commands::Id(args) => id(args)?,
        Commands::Checksum(args) => checksum(args)?,
        Commands::Keygen(args) => keygen(args),
        Commands::Mnemonic(args) => mnemonic(args)?,
        Commands::Config(args) => config(args)?,
    };
    print!("{}", render(&report, cli.json)?);
    Ok(())
}

// ---------------------------------------------------------------------------
// Reports
// ---------------------------------------------------------------------------

/// Command output: a flat list of labelled values, rendered as aligned text
/// or as a JSON object. Fields keep the order they were added in.
#[derive(Debug, Default, Serialize)]
#[serde(transparent)]
struct Report(serde_json::Map<String, serde_json::Value>);

impl Report {
    fn field(mut self, name: &str, value: impl Serialize) -> Self {
        let value = serde_json::to_value(value).unwrap_or(serde_json::Value::Null);
        self.0.insert(name.to_string(), value);
        self
    }

    fn merge(mut self, other: Report) -> Self {
        self.0.extend(other.0);
        self
    }
}

fn render(report: &Report, json: bool) -> Result<String> {
    if json {
        return Ok(serde_json::to_string_pretty(report)? + "\n");
    }
    let width = report.0.keys().map(String::len).max().unwrap_or(0);
    let mut out = String::new();
    for (name, value) in &report.0 {
        let text = match value {
            serde_json::Value::Null => "-".to_string(),
            serde_json::Value::String(s) => s.clone(),
            serde_json::Value::Array(items) => items
                .iter()
                .map(|item| item.as_str().map_or_else(|| item.to_string(), str::to_string))
                .collect::<Vec<_>>()
                .join(", "),
            other => other.to_string(),
        };
        out.push_str(&format!("{name:<width$} : {text}\n"));
    }
    Ok(out)
}

// ---------------------------------------------------------------------------
// Commands
// ---------------------------------------------------------------------------

fn parse_ledger(text: &str) -> Result<LedgerId> {
    text.parse().with_context(|| format!("invalid ledger `{text}`"))
}

fn id(args: cli::IdArgs) -> Result<Report> {
    let id = EntityId::parse(&args.text).with_context(|| format!("invalid id `{}`", args.text))?;
    let mut report = Report::default()
        .field("id", id.to_string())
        .field("shard", id.shard)
        .field("realm", id.realm)
        .field("num", id.num)
        .field("checksum", id.checksum.map(|c| c.as_str().to_string()));

    if let Some(ledger) = args.ledger.as_deref() {
        let ledger = parse_ledger(ledger)?;
        id.validate_checksum(&ledger)?;
        report = report
            .field("ledger", ledger.to_string())
            .field("with_checksum", id.to_string_with_checksum(&ledger));
    }
    Ok(report)
}

fn checksum(args: cli::ChecksumArgs) -> Result<Report> {
    let id = EntityId::parse(&args.id).with_context(|| format!("invalid id `{}`", args.id))?;
    let ledger = parse_ledger(&args.ledger)?;
    let valid = id.checksum.map(|_| id.validate_checksum(&ledger).is_ok());
    tracing::debug!(%id, %ledger, ?valid, "checksum computed");

    let report = Report::default()
        .field("ledger", ledger.to_string())
        .field("with_checksum", id.to_string_with_checksum(&ledger))
        .field("given_checksum_valid", valid);
    if valid == Some(false) {
        bail!(
            "checksum of `{}` does not match ledger {ledger}, expected {}",
            args.id,
            id.to_string_with_checksum(&ledger)
        );
    }
    Ok(report)
}

fn key_report(key: &PrivateKey, curve: &str) -> Report {
    let public_key = key.public_key();
    Report::default()
        .field("curve", curve)
        .field("private_key", key.to_string())
        .field("public_key", public_key.to_string())
        .field("public_key_raw", public_key.to_string_raw())
        .field(
            "evm_address",
            public_key.to_evm_address().map(|address| format!("0x{}", hex::encode(address))),
        )
}

fn keygen(args: cli::KeygenArgs) -> Report {
    let key = PrivateKey::generate(args.curve.algorithm());
    tracing::info!(curve = args.curve.name(), "key generated");
    key_report(&key, args.curve.name())
}

fn mnemonic(args: cli::MnemonicArgs) -> Result<Report> {
    let mnemonic = match args.phrase.as_deref() {
        Some(phrase) => phrase
            .parse::<Mnemonic>()
            .context("invalid recovery phrase")?,
        None => match args.words {
            12 => Mnemonic::generate_12()?,
            24 => Mnemonic::generate_24()?,
            other => bail!("--words must be 12 or 24, got {other}"),
        },
    };

    let key = match args.curve {
        cli::Curve::Ed25519 => {
            mnemonic.to_standard_ed25519_private_key(&args.passphrase, args.index)?
        }
        cli::Curve::Ecdsa => {
            mnemonic.to_standard_ecdsa_secp256k1_private_key(&args.passphrase, args.index)?
        }
    };
    Ok(Report::default()
        .field("mnemonic", mnemonic.to_string())
        .field("index", args.index)
        .merge(key_report(&key, args.curve.name())))
}

fn config(args: cli::ConfigArgs) -> Result<Report> {
    let client = Client::from_config_file(&args.path)
        .with_context(|| format!("failed to load {}", args.path.display()))?;

    let nodes: Vec<String> = client
        .network()
        .nodes()
        .iter()
        .map(|node| {
            let addresses: Vec<String> =
                node.addresses().iter().map(ToString::to_string).collect();
            format!("{} @ {}", node.account_id(), addresses.join(" "))
        })
        .collect();
    Ok(Report::default()
        .field("ledger", client.ledger_id().map(|ledger| ledger.to_string()))
        .field("nodes", nodes)
        .field("mirror_network", client.mirror_network())
        .field("operator", client.operator_account_id().map(|id| id.to_string())))
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    #[test]
    fn id_with_ledger_adds_checksum() {
        let report = id(cli::IdArgs {
            text: "0.0.123".into(),
            ledger: Some("testnet".into()),
        })
        .unwrap();
        assert_eq!(report.0["with_checksum"], "0.0.123-esxsf");
        assert_eq!(report.0["checksum"], serde_json::Value::Null);
    }

    #[test]
    fn id_with_wrong_checksum_fails() {
        let result = id(cli::IdArgs {
            text: "0.0.123-vfmkw".into(),
            ledger: Some("testnet".into()),
        });
        assert!(result.is_err());
    }

    #[test]
    fn checksum_for_each_network() {
        for (ledger, expected) in [
            ("mainnet", "0.0.3-tzfmz"),
            ("testnet", "0.0.3-dmqui"),
        ] {
            let report = checksum(cli::ChecksumArgs {
                id: "0.0.3".into(),
                ledger: ledger.into(),
            })
            .unwrap();
            assert_eq!(report.0["with_checksum"], expected);
        }
    }

    #[test]
    fn recovered_phrase_is_deterministic() {
        let phrase = Mnemonic::generate_12().unwrap().to_string();
        let args = || cli::MnemonicArgs {
            words: 24,
            phrase: Some(phrase.clone()),
            index: 1,
            passphrase: String::new(),
            curve: cli::Curve::Ecdsa,
        };
        let first = mnemonic(args()).unwrap();
        let second = mnemonic(args()).unwrap();
        assert_eq!(first.0["private_key"], second.0["private_key"]);
        assert_eq!(first.0["curve"], "ecdsa-secp256k1");
    }

    #[test]
    fn bad_word_count_is_rejected() {
        let result = mnemonic(cli::MnemonicArgs {
            words: 18,
            phrase: None,
            index: 0,
            passphrase: String::new(),
            curve: cli::Curve::Ed25519,
        });
        assert!(result.is_err());
    }

    #[test]
    fn config_file_summary() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        write!(
            file,
            r#"{{"network": {{"127.0.0.1:50211": "0.0.3"}}, "mirrorNetwork": ["127.0.0.1:5600"]}}"#
        )
        .unwrap();

        let report = config(cli::ConfigArgs {
            path: file.path().to_path_buf(),
        })
        .unwrap();
        assert_eq!(report.0["nodes"][0], "0.0.3 @ 127.0.0.1:50211");
        assert_eq!(report.0["operator"], serde_json::Value::Null);
    }

    #[test]
    fn fields_render_in_insertion_order() {
        let report = Report::default().field("zeta", 1).field("alpha", 2).field("mid", 3);
        assert_eq!(render(&report, false).unwrap(), "zeta  : 1\nalpha : 2\nmid   : 3\n");

        let key = keygen(cli::KeygenArgs {
            curve: cli::Curve::Ecdsa,
        });
        let labels: Vec<&str> = key.0.keys().map(String::as_str).collect();
        assert_eq!(
            labels,
            ["curve", "private_key", "public_key", "public_key_raw", "evm_address"]
        );
        assert!(key.0["evm_address"].as_str().unwrap().starts_with("0x"));
    }

    #[test]
    fn text_rendering_aligns_labels() {
        let report = Report::default().field("a", "x").field("long", vec!["p", "q"]);
        assert_eq!(render(&report, false).unwrap(), "a    : x\nlong : p, q\n");
        assert!(render(&report, true).unwrap().contains("\"long\""));
    }
}
