// nym/nym-verifier/src/lib.rs
// Numan Thabit 2025

use std::sync::Arc;

use nym_common::{
    assets::Asset, backend::run_blocking, AssetCache, AssetFetcher, Attestation, BackendError,
    Content, ContentMessage, NymPublicInput, ProofBackend, Profiler, TypedMessage, UriFetcher,
    VerifierConfig,
};
use tracing::{debug, warn};

/// Rebuilds the public input `attestation` claims for `content` from scratch:
/// fresh digests for the nym name and the content, bound to the attested
/// coordinates and `(r, v)` pairs.
pub fn reconstruct_public_input(content: &ContentMessage, attestation: &Attestation) -> NymPublicInput {
    NymPublicInput::new(
        attestation.public_input,
        attestation.auxiliary,
        &TypedMessage::nym_binding(&attestation.nym_name),
        &content.typed(),
    )
}

/// Checks attestations. Every failure, including malformed input and
/// backend faults, comes back as `false`.
pub struct NymVerifier {
    config: VerifierConfig,
    backend: Arc<dyn ProofBackend>,
    fetcher: Arc<dyn AssetFetcher>,
    assets: Arc<AssetCache>,
    profiler: Profiler,
}

impl NymVerifier {
    pub fn new(config: VerifierConfig, backend: Arc<dyn ProofBackend>) -> Self {
        let profiler = Profiler::new(config.enable_profiler);
        Self {
            config,
            backend,
            fetcher: Arc::new(UriFetcher::new()),
            assets: AssetCache::shared(),
            profiler,
        }
    }

    pub fn with_fetcher(mut self, fetcher: Arc<dyn AssetFetcher>) -> Self {
        self.fetcher = fetcher;
        self
    }

    pub fn with_asset_cache(mut self, assets: Arc<AssetCache>) -> Self {
        self.assets = assets;
        self
    }

    pub fn config(&self) -> &VerifierConfig {
        &self.config
    }

    /// Local algebraic check only; no proof system involved.
    pub fn verify_public_input(content: &ContentMessage, attestation: &Attestation) -> bool {
        reconstruct_public_input(content, attestation).verify_locally()
    }

    pub async fn verify(&self, content: &ContentMessage, attestation: &[u8]) -> bool {
        let attestation = match Attestation::from_bytes(attestation) {
            Ok(attestation) => attestation,
            Err(err) => {
                debug!(%err, "rejecting undecodable attestation");
                return false;
            }
        };
        self.verify_attestation(content, &attestation).await
    }

    /// Like [`NymVerifier::verify`], and additionally requires the record's
    /// stored nym name to be the attested one.
    pub async fn verify_content(&self, content: &Content) -> bool {
        let attestation = match Attestation::from_bytes(&content.attestation) {
            Ok(attestation) => attestation,
            Err(err) => {
                debug!(%err, "rejecting undecodable attestation");
                return false;
            }
        };
        if attestation.nym_name != content.nym_name {
            debug!(
                stored = %content.nym_name,
                attested = %attestation.nym_name,
                "nym name differs from attestation"
            );
            return false;
        }
        self.verify_attestation(&content.message, &attestation).await
    }

    pub async fn verify_attestation(&self, content: &ContentMessage, attestation: &Attestation) -> bool {
        let locally_valid = {
            let _timer = self.profiler.start("public input check");
            Self::verify_public_input(content, attestation)
        };
        if !locally_valid {
            debug!(nym = %attestation.nym_name, "public input does not match content");
            return false;
        }

        match self.verify_proof(attestation).await {
            Ok(valid) => {
                debug!(valid, nym = %attestation.nym_handle(), "proof checked");
                valid
            }
            Err(err) => {
                warn!(%err, "proof verification failed");
                false
            }
        }
    }

    async fn verify_proof(&self, attestation: &Attestation) -> Result<bool, BackendError> {
        let circuit = self.load_circuit().await?;
        let _timer = self.profiler.start("proof check");
        let backend = Arc::clone(&self.backend);
        let proof = attestation.proof.clone();
        let public_input = attestation.public_input.serialize();
        run_blocking(move || backend.verify_circuit(&circuit, &proof, &public_input)).await
    }

    async fn load_circuit(&self) -> Result<Asset, BackendError> {
        let _timer = self.profiler.start("asset load");
        self.assets
            .load_pinned(
                &self.config.circuit_url,
                self.fetcher.as_ref(),
                self.config.circuit_blake3.as_deref(),
            )
            .await
    }
}
