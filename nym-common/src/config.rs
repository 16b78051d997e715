//! Prover and verifier configuration.

use std::env;

use serde::{Deserialize, Serialize};

pub const DEFAULT_CIRCUIT_URL: &str =
    "https://storage.googleapis.com/personae-proving-keys/nym/nym_ownership.circuit";
pub const DEFAULT_WITNESS_GEN_URL: &str =
    "https://storage.googleapis.com/personae-proving-keys/nym/nym_ownership.wasm";

const CIRCUIT_URL_ENV: &str = "NYM_CIRCUIT_URL";
const WITNESS_GEN_URL_ENV: &str = "NYM_WITNESS_GEN_URL";
const ENABLE_PROFILER_ENV: &str = "NYM_ENABLE_PROFILER";
const CIRCUIT_BLAKE3_ENV: &str = "NYM_CIRCUIT_BLAKE3";

#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ProverConfig {
    #[serde(default = "default_circuit_url")]
    pub circuit_url: String,

    /// Module that turns a witness input record into the circuit witness.
    #[serde(default = "default_witness_gen_url")]
    pub witness_gen_url: String,

    #[serde(default)]
    pub enable_profiler: bool,

    /// Expected blake3 hex digest of the circuit; unchecked when unset.
    #[serde(default)]
    pub circuit_blake3: Option<String>,
}

impl Default for ProverConfig {
    fn default() -> Self {
        Self {
            circuit_url: default_circuit_url(),
            witness_gen_url: default_witness_gen_url(),
            enable_profiler: false,
            circuit_blake3: None,
        }
    }
}

impl ProverConfig {
    /// Defaults overridden by `NYM_*` environment variables.
    pub fn from_env() -> Self {
        Self {
            circuit_url: env::var(CIRCUIT_URL_ENV).unwrap_or_else(|_| default_circuit_url()),
            witness_gen_url: env::var(WITNESS_GEN_URL_ENV)
                .unwrap_or_else(|_| default_witness_gen_url()),
            enable_profiler: flag_from_env(ENABLE_PROFILER_ENV),
            circuit_blake3: env::var(CIRCUIT_BLAKE3_ENV).ok(),
        }
    }
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct VerifierConfig {
    #[serde(default = "default_circuit_url")]
    pub circuit_url: String,

    #[serde(default)]
    pub enable_profiler: bool,

    #[serde(default)]
    pub circuit_blake3: Option<String>,
}

impl Default for VerifierConfig {
    fn default() -> Self {
        Self {
            circuit_url: default_circuit_url(),
            enable_profiler: false,
            circuit_blake3: None,
        }
    }
}

impl VerifierConfig {
    pub fn from_env() -> Self {
        Self {
            circuit_url: env::var(CIRCUIT_URL_ENV).unwrap_or_else(|_| default_circuit_url()),
            enable_profiler: flag_from_env(ENABLE_PROFILER_ENV),
            circuit_blake3: env::var(CIRCUIT_BLAKE3_ENV).ok(),
        }
    }
}

fn default_circuit_url() -> String {
    DEFAULT_CIRCUIT_URL.to_string()
}

fn default_witness_gen_url() -> String {
    DEFAULT_WITNESS_GEN_URL.to_string()
}

fn flag_from_env(var: &str) -> bool {
    env::var(var).map(|value| parse_flag(&value)).unwrap_or(false)
}

fn parse_flag(value: &str) -> bool {
    matches!(value.to_ascii_lowercase().as_str(), "1" | "true" | "yes")
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn missing_fields_fall_back_to_published_assets() {
        let config: ProverConfig = serde_json::from_str(r#"{"enableProfiler": true}"#).unwrap();
        assert_eq!(config.circuit_url, DEFAULT_CIRCUIT_URL);
        assert_eq!(config.witness_gen_url, DEFAULT_WITNESS_GEN_URL);
        assert!(config.enable_profiler);
        assert_eq!(config.circuit_blake3, None);

        let config: VerifierConfig =
            serde_json::from_str(r#"{"circuitUrl": "file:///tmp/nym.circuit"}"#).unwrap();
        assert_eq!(config.circuit_url, "file:///tmp/nym.circuit");
        assert!(!config.enable_profiler);
    }

    #[test]
    fn flags_accept_common_spellings() {
        assert!(parse_flag("1"));
        assert!(parse_flag("TRUE"));
        assert!(parse_flag("yes"));
        assert!(!parse_flag("0"));
        assert!(!parse_flag("off"));
    }
}
