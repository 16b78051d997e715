// nym/nym-prover/src/lib.rs
// Numan Thabit 2025

pub mod checks;

use std::sync::Arc;

use nym_common::{
    assets::Asset, backend::run_blocking, compute_nym_hash, AssetCache, AssetFetcher,
    Attestation, AuxiliaryProof, ContentMessage, EffectiveSignature, Fp, MerkleProof,
    ProofBackend, Profiler, ProverConfig, PublicInput, RecoverableSignature, Result,
    TypedMessage, UriFetcher, WitnessGenerator, WitnessInput,
};
use tracing::debug;

/// Produces attestations. Holds no per-call state; the only thing shared
/// between calls is the asset cache.
pub struct NymProver {
    config: ProverConfig,
    backend: Arc<dyn ProofBackend>,
    witness_gen: Arc<dyn WitnessGenerator>,
    fetcher: Arc<dyn AssetFetcher>,
    assets: Arc<AssetCache>,
    trusted_root: Option<Fp>,
    profiler: Profiler,
}

impl NymProver {
    /// Fetches assets through [`UriFetcher`] into the process-wide cache.
    pub fn new(
        config: ProverConfig,
        backend: Arc<dyn ProofBackend>,
        witness_gen: Arc<dyn WitnessGenerator>,
    ) -> Self {
        let profiler = Profiler::new(config.enable_profiler);
        Self {
            config,
            backend,
            witness_gen,
            fetcher: Arc::new(UriFetcher::new()),
            assets: AssetCache::shared(),
            trusted_root: None,
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

    /// Refuse membership proofs against any other root.
    pub fn with_trusted_root(mut self, root: Fp) -> Self {
        self.trusted_root = Some(root);
        self
    }

    pub fn config(&self) -> &ProverConfig {
        &self.config
    }

    /// Loads the circuit and witness generator ahead of the first `prove`.
    pub async fn prepare(&self) -> Result<()> {
        self.load_assets().await.map(|_| ())
    }

    /// Serialized attestation for `content` posted under `nym_name`.
    pub async fn prove(
        &self,
        nym_name: &str,
        content: &ContentMessage,
        nym_sig: &RecoverableSignature,
        content_sig: &RecoverableSignature,
        membership: &MerkleProof,
    ) -> Result<Vec<u8>> {
        self.prove_attestation(nym_name, content, nym_sig, content_sig, membership)
            .await?
            .to_bytes()
    }

    pub async fn prove_attestation(
        &self,
        nym_name: &str,
        content: &ContentMessage,
        nym_sig: &RecoverableSignature,
        content_sig: &RecoverableSignature,
        membership: &MerkleProof,
    ) -> Result<Attestation> {
        let nym_message = TypedMessage::nym_binding(nym_name);
        let content_message = content.typed();
        let nym_effective = EffectiveSignature::transform(nym_sig, &nym_message);
        let content_effective = EffectiveSignature::transform(content_sig, &content_message);

        let signer =
            checks::check_consistent_signers(nym_sig, &nym_message, content_sig, &content_message)?;
        checks::check_effective_binding(&nym_effective, &signer)?;
        checks::check_effective_binding(&content_effective, &signer)?;
        debug!(signer = %signer.address_hex(), "signatures agree");

        checks::check_membership(&signer, membership, self.trusted_root.as_ref())?;
        debug!("signer is a member of the eligibility tree");

        let nym_hash = compute_nym_hash(nym_sig.s());
        let public_input = PublicInput {
            root: membership.root,
            nym_hash,
            nym_sig: nym_effective.points,
            content_sig: content_effective.points,
        };
        let auxiliary = AuxiliaryProof::from_signatures(&nym_effective, &content_effective);

        let (circuit, witness_module) = self.load_assets().await?;

        let witness_input =
            WitnessInput::new(nym_hash, &nym_effective, &content_effective, membership);
        let witness = {
            let _timer = self.profiler.start("witness generation");
            let witness_gen = Arc::clone(&self.witness_gen);
            run_blocking(move || witness_gen.generate_witness(&witness_module, &witness_input))
                .await?
        };
        debug!(bytes = witness.len(), "generated witness");

        let public_bytes = public_input.serialize();
        let proof = {
            let _timer = self.profiler.start("prove");
            let backend = Arc::clone(&self.backend);
            run_blocking(move || backend.prove_circuit(&circuit, &witness, &public_bytes)).await?
        };
        debug!(bytes = proof.len(), "generated proof");

        Ok(Attestation {
            nym_name: nym_name.to_owned(),
            proof,
            public_input,
            auxiliary,
        })
    }

    async fn load_assets(&self) -> Result<(Asset, Asset)> {
        let _timer = self.profiler.start("asset load");
        let circuit = self
            .assets
            .load_pinned(
                &self.config.circuit_url,
                self.fetcher.as_ref(),
                self.config.circuit_blake3.as_deref(),
            )
            .await?;
        let witness_module = self
            .assets
            .load(&self.config.witness_gen_url, self.fetcher.as_ref())
            .await?;
        Ok((circuit, witness_module))
    }
}
