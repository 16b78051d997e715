// nym/nym-verifier/src/main.rs
// Numan Thabit 2025

use std::{fs, path::PathBuf};

use anyhow::{Context, Result};
use clap::Parser;
use serde::Serialize;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use nym_common::{fp_to_hex, is_valid_nym_handle, Attestation, ContentMessage};
use nym_verifier::NymVerifier;

/// Decode an attestation and check its public input without the proof system.
#[derive(Parser)]
struct Args {
    /// Attestation file, raw bytes or `0x` hex with `--hex`.
    #[arg(long)]
    attestation: PathBuf,
    #[arg(long)]
    hex: bool,
    /// Content JSON (`title`, `body`, `parentId`, `timestamp`) to check the
    /// attestation against.
    #[arg(long)]
    content: Option<PathBuf>,
}

#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
struct Report {
    nym_name: String,
    nym_handle: String,
    nym_handle_valid: bool,
    nym_hash: String,
    root: String,
    proof_bytes: usize,
    #[serde(skip_serializing_if = "Option::is_none")]
    post_id: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    public_input_valid: Option<bool>,
}

fn main() -> Result<()> {
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "nym_verifier=info".into()),
        )
        .with(tracing_subscriber::fmt::layer().with_writer(std::io::stderr))
        .init();

    let args = Args::parse();
    let raw = fs::read(&args.attestation)
        .with_context(|| format!("failed to read {}", args.attestation.display()))?;
    let bytes = if args.hex {
        let text = String::from_utf8(raw).context("attestation hex is not UTF-8")?;
        let text = text.trim();
        hex::decode(text.strip_prefix("0x").unwrap_or(text)).context("invalid attestation hex")?
    } else {
        raw
    };
    let attestation = Attestation::from_bytes(&bytes).context("failed to decode attestation")?;

    let content = args
        .content
        .as_ref()
        .map(read_content)
        .transpose()?;

    let nym_handle = attestation.nym_handle();
    let report = Report {
        nym_name: attestation.nym_name.clone(),
        nym_handle_valid: is_valid_nym_handle(&nym_handle),
        nym_handle,
        nym_hash: fp_to_hex(&attestation.nym_hash()),
        root: fp_to_hex(&attestation.root()),
        proof_bytes: attestation.proof.len(),
        post_id: content.as_ref().map(ContentMessage::post_id),
        public_input_valid: content
            .as_ref()
            .map(|content| NymVerifier::verify_public_input(content, &attestation)),
    };
    println!(
        "{}",
        serde_json::to_string_pretty(&report).context("failed to serialize report")?
    );
    Ok(())
}

fn read_content(path: &PathBuf) -> Result<ContentMessage> {
    let json = fs::read_to_string(path)
        .with_context(|| format!("failed to read {}", path.display()))?;
    serde_json::from_str(&json).context("failed to parse content json")
}
