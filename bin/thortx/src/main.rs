use std::path::{Path, PathBuf};

use clap::{Parser, Subcommand};
use secp256k1::SecretKey;
use serde_json::{json, Value};
use thor_tx::{
    load_gas_schedule, to_hex, GasSchedule, ThorTransaction, TransactionBody, TxError,
};
use tracing_subscriber::{fmt, EnvFilter};

#[derive(Parser)]
#[command(name = "thortx")]
#[command(about = "Encode, hash and sign VeChain Thor transactions")]
#[command(version)]
struct Args {
    #[command(subcommand)]
    command: Command,

    /// Log level (trace, debug, info, warn, error)
    #[arg(long, default_value = "warn", global = true)]
    log_level: String,
}

#[derive(Subcommand)]
enum Command {
    /// Decode a raw transaction and print its body and derived fields
    Decode {
        /// RLP encoded transaction (0x... or hex)
        raw: String,

        /// Input is the unsigned layout
        #[arg(long)]
        unsigned: bool,
    },

    /// Print the signing hash of a JSON body
    Hash {
        /// Path to the JSON transaction body
        #[arg(long)]
        body: PathBuf,

        /// Print the delegator's hash for this origin address instead
        #[arg(long)]
        delegate_for: Option<String>,
    },

    /// Sign a JSON body and print the encoded transaction
    Sign {
        /// Path to the JSON transaction body
        #[arg(long)]
        body: PathBuf,

        /// Origin private key (0x... or hex)
        #[arg(long)]
        key: String,

        /// Fee delegator private key, required for delegated bodies
        #[arg(long)]
        delegator_key: Option<String>,
    },

    /// Print the intrinsic gas of a JSON body
    Gas {
        /// Path to the JSON transaction body
        #[arg(long)]
        body: PathBuf,

        /// YAML gas schedule overriding the Thor defaults
        #[arg(long)]
        gas_config: Option<PathBuf>,
    },
}

fn main() {
    let args = Args::parse();
    init_tracing(&args.log_level);

    match run(args.command) {
        Ok(output) => println!("{output}"),
        Err(err) => {
            eprintln!("thortx failed: {err}");
            std::process::exit(1);
        }
    }
}

fn init_tracing(level: &str) {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(level));
    fmt().with_env_filter(filter).with_writer(std::io::stderr).init();
}

fn run(command: Command) -> Result<String, String> {
    match command {
        Command::Decode { raw, unsigned } => {
            let bytes = parse_hex_bytes(&raw)?;
            let tx = if unsigned {
                ThorTransaction::decode_unsigned(&bytes)
            } else {
                ThorTransaction::decode(&bytes)
            }
            .map_err(|e| format!("failed to decode transaction: {e}"))?;
            let summary = describe(&tx).map_err(|e| e.to_string())?;
            serde_json::to_string_pretty(&summary).map_err(|e| e.to_string())
        }
        Command::Hash { body, delegate_for } => {
            let tx = ThorTransaction::new(read_body(&body)?, None).map_err(|e| e.to_string())?;
            let hash = match delegate_for {
                Some(origin) => tx.delegated_signing_hash(&origin),
                None => tx.signing_hash(),
            }
            .map_err(|e| e.to_string())?;
            Ok(format!("{hash:#x}"))
        }
        Command::Sign {
            body,
            key,
            delegator_key,
        } => {
            let tx = ThorTransaction::new(read_body(&body)?, None).map_err(|e| e.to_string())?;
            let origin_key = parse_secret_key(&key)?;
            let signed = match (tx.is_delegated(), delegator_key) {
                (true, Some(delegator_key)) => {
                    tx.sign_delegated(&origin_key, &parse_secret_key(&delegator_key)?)
                }
                (true, None) => return Err("delegated body requires --delegator-key".into()),
                (false, Some(_)) => {
                    return Err("--delegator-key given but body is not delegated".into())
                }
                (false, None) => tx.sign(&origin_key),
            }
            .map_err(|e| e.to_string())?;

            let raw = signed.encoded().map_err(|e| e.to_string())?;
            let id = signed.id().map_err(|e| e.to_string())?;
            tracing::info!(%id, delegated = signed.is_delegated(), "signed transaction");
            Ok(format!("0x{}", hex::encode(raw)))
        }
        Command::Gas { body, gas_config } => {
            let schedule = match gas_config {
                Some(path) => load_gas_schedule(&path).map_err(|e| e.to_string())?,
                None => GasSchedule::default(),
            };
            let tx = ThorTransaction::new(read_body(&body)?, None).map_err(|e| e.to_string())?;
            Ok(tx.intrinsic_gas(&schedule).to_string())
        }
    }
}

/// Body plus every property derivable from the transaction.
///
/// A delegator that cannot be recovered is reported in `delegatorError`
/// rather than failing the whole summary.
fn describe(tx: &ThorTransaction) -> Result<Value, TxError> {
    let mut summary = json!({
        "body": tx.body(),
        "signingHash": format!("{:#x}", tx.signing_hash()?),
        "delegated": tx.is_delegated(),
        "intrinsicGas": tx.intrinsic_gas(&GasSchedule::default()),
    });

    if let (Some(signature), Some(fields)) = (tx.signature(), summary.as_object_mut()) {
        fields.insert("signature".into(), json!(format!("0x{}", hex::encode(signature))));
        fields.insert("origin".into(), json!(to_hex(&tx.origin()?)));
        fields.insert("id".into(), json!(format!("{:#x}", tx.id()?)));
        if tx.is_delegated() {
            match tx.delegator() {
                Ok(delegator) => {
                    fields.insert("delegator".into(), json!(to_hex(&delegator)));
                }
                Err(err) => {
                    tracing::warn!(%err, "failed to recover delegator");
                    fields.insert("delegatorError".into(), json!(err.to_string()));
                }
            }
        }
    }
    Ok(summary)
}

fn read_body(path: &Path) -> Result<TransactionBody, String> {
    let content = std::fs::read_to_string(path)
        .map_err(|e| format!("failed to read body '{}': {e}", path.display()))?;
    serde_json::from_str(&content)
        .map_err(|e| format!("invalid body '{}': {e}", path.display()))
}

fn parse_hex_bytes(input: &str) -> Result<Vec<u8>, String> {
    let trimmed = input.trim();
    let hex_str = trimmed
        .strip_prefix("0x")
        .or_else(|| trimmed.strip_prefix("0X"))
        .unwrap_or(trimmed);
    hex::decode(hex_str).map_err(|e| format!("invalid hex: {e}"))
}

fn parse_secret_key(input: &str) -> Result<SecretKey, String> {
    let decoded = parse_hex_bytes(input).map_err(|e| format!("invalid private key: {e}"))?;
    let bytes: [u8; 32] = decoded
        .try_into()
        .map_err(|_| "private key must be 32 bytes".to_string())?;
    SecretKey::from_slice(&bytes).map_err(|e| format!("invalid private key: {e}"))
}

#[cfg(test)]
#[allow(clippy::unwrap_used, clippy::expect_used, clippy::indexing_slicing)]
mod tests {
    use super::*;

    const BODY_JSON: &str = r#"{
        "chainTag": 1,
        "blockRef": "0x00000000aabbccdd",
        "expiration": 32,
        "clauses": [
            {"to": "0x7567d83b7b8d80addcb281a71d54fc7b3364ffed", "value": 10000, "data": "0x000000606060"},
            {"to": "0x7567d83b7b8d80addcb281a71d54fc7b3364ffed", "value": 20000, "data": "0x000000606060"}
        ],
        "gasPriceCoef": 128,
        "gas": 21000,
        "dependsOn": null,
        "nonce": 12345678
    }"#;

    const SECRET_KEY: &str = "0x7582be841ca040aa940fff6c05773129e135623e41acce3e0b8ba520dc1ae26a";

    fn write_body(dir: &tempfile::TempDir, json: &str) -> PathBuf {
        let path = dir.path().join("body.json");
        std::fs::write(&path, json).expect("write body");
        path
    }

    #[test]
    fn parse_secret_key_accepts_prefixed_and_unprefixed_hex() {
        let with_prefix = parse_secret_key(SECRET_KEY).expect("with-prefix key should parse");
        let without_prefix =
            parse_secret_key(&SECRET_KEY[2..]).expect("without-prefix key should parse");
        assert_eq!(with_prefix, without_prefix);
    }

    #[test]
    fn parse_secret_key_rejects_wrong_length() {
        let err = parse_secret_key("0x1234").expect_err("short key must fail");
        assert!(err.contains("private key must be 32 bytes"));
    }

    #[test]
    fn hash_prints_signing_hash() {
        let dir = tempfile::tempdir().unwrap();
        let body = write_body(&dir, BODY_JSON);
        let output = run(Command::Hash {
            body,
            delegate_for: None,
        })
        .unwrap();
        assert_eq!(
            output,
            "0x2a1c25ce0d66f45276a5f308b99bf410e2fc7d5b6ea37a49f2ab9f1da9446478"
        );
    }

    #[test]
    fn hash_rejects_bad_delegate_address() {
        let dir = tempfile::tempdir().unwrap();
        let body = write_body(&dir, BODY_JSON);
        let err = run(Command::Hash {
            body,
            delegate_for: Some("0x1234".into()),
        })
        .unwrap_err();
        assert!(err.contains("invalid address"), "{err}");
    }

    #[test]
    fn sign_then_decode_reports_origin() {
        let dir = tempfile::tempdir().unwrap();
        let body = write_body(&dir, BODY_JSON);
        let raw = run(Command::Sign {
            body,
            key: SECRET_KEY.into(),
            delegator_key: None,
        })
        .unwrap();
        assert!(raw.starts_with("0xf897"));

        let output = run(Command::Decode {
            raw,
            unsigned: false,
        })
        .unwrap();
        let summary: Value = serde_json::from_str(&output).unwrap();
        assert_eq!(summary["origin"], "0xd989829d88b0ed1b06edf5c50174ecfa64f14a64");
        assert_eq!(
            summary["id"],
            "0xda90eaea52980bc4bb8d40cb2ff84d78433b3b4a6e7d50b75736c5e3e77b71ec"
        );
        assert_eq!(summary["body"]["nonce"], 12345678);
        assert!(summary.get("delegator").is_none());
    }

    #[test]
    fn sign_delegated_requires_delegator_key() {
        let dir = tempfile::tempdir().unwrap();
        let delegated = BODY_JSON.replace(
            r#""nonce": 12345678"#,
            r#""nonce": 12345678, "reserved": {"features": 1}"#,
        );
        let body = write_body(&dir, &delegated);

        let err = run(Command::Sign {
            body: body.clone(),
            key: SECRET_KEY.into(),
            delegator_key: None,
        })
        .unwrap_err();
        assert!(err.contains("--delegator-key"));

        let raw = run(Command::Sign {
            body,
            key: SECRET_KEY.into(),
            delegator_key: Some("11".repeat(32)),
        })
        .unwrap();
        let output = run(Command::Decode {
            raw,
            unsigned: false,
        })
        .unwrap();
        let summary: Value = serde_json::from_str(&output).unwrap();
        assert_eq!(summary["delegated"], true);
        assert!(summary["delegator"].is_string());
    }

    #[test]
    fn decode_reports_unrecoverable_delegator() {
        let dir = tempfile::tempdir().unwrap();
        let delegated = BODY_JSON.replace(
            r#""nonce": 12345678"#,
            r#""nonce": 12345678, "reserved": {"features": 1}"#,
        );
        let body = write_body(&dir, &delegated);
        let raw = run(Command::Sign {
            body,
            key: SECRET_KEY.into(),
            delegator_key: Some("11".repeat(32)),
        })
        .unwrap();

        // the delegator signature ends the encoding; break its recovery id
        let broken = format!("{}09", &raw[..raw.len() - 2]);
        let output = run(Command::Decode {
            raw: broken,
            unsigned: false,
        })
        .unwrap();
        let summary: Value = serde_json::from_str(&output).unwrap();
        assert_eq!(summary["origin"], "0xd989829d88b0ed1b06edf5c50174ecfa64f14a64");
        assert!(summary["id"].is_string());
        assert!(summary.get("delegator").is_none());
        assert!(summary["delegatorError"]
            .as_str()
            .unwrap()
            .contains("recover"));
    }

    #[test]
    fn decode_unsigned_has_no_origin() {
        let raw = "0xf8540184aabbccdd20f840df947567d83b7b8d80addcb281a71d54fc7b3364ffed82271086000000606060df947567d83b7b8d80addcb281a71d54fc7b3364ffed824e208600000060606081808252088083bc614ec0";
        let output = run(Command::Decode {
            raw: raw.into(),
            unsigned: true,
        })
        .unwrap();
        let summary: Value = serde_json::from_str(&output).unwrap();
        assert_eq!(summary["intrinsicGas"], 37432);
        assert!(summary.get("origin").is_none());

        let err = run(Command::Decode {
            raw: raw.into(),
            unsigned: false,
        })
        .unwrap_err();
        assert!(err.contains("failed to decode transaction"));
    }

    #[test]
    fn gas_uses_schedule_file() {
        let dir = tempfile::tempdir().unwrap();
        let body = write_body(&dir, BODY_JSON);
        let default = run(Command::Gas {
            body: body.clone(),
            gas_config: None,
        })
        .unwrap();
        assert_eq!(default, "37432");

        let config = dir.path().join("gas.yaml");
        std::fs::write(&config, "tx_gas: 6000\n").unwrap();
        let tuned = run(Command::Gas {
            body,
            gas_config: Some(config),
        })
        .unwrap();
        assert_eq!(tuned, "38432");
    }
}
