// nym/nym-test-fixtures/src/lib.rs
// Numan Thabit 2025

//! Deterministic signers, an in-memory eligibility tree and transparent
//! stand-ins for the proof system, witness generator and asset store.

use std::{
    collections::HashMap,
    sync::{
        atomic::{AtomicUsize, Ordering},
        Arc,
    },
};

use anyhow::{anyhow, Context, Result};
use async_trait::async_trait;
use k256::ecdsa::SigningKey;
use nym_common::{
    compute_nym_hash, fp_to_bytes, fq_from_bytes, fq_to_bytes,
    merkle::hash_nodes,
    reduce_be_bytes_to_fq, AssetCache, AssetFetcher, BackendError, ContentMessage,
    EffectivePoints, Fp, MerkleProof, ProofBackend, ProverConfig, PublicInput,
    RecoverableSignature, SignerKey, TypedMessage, VerifierConfig, WitnessGenerator,
    WitnessInput, PUBLIC_INPUT_BYTES, TREE_DEPTH,
};
use once_cell::sync::OnceCell;

pub const CIRCUIT_BYTES: &[u8] = b"nym-ownership circuit fixture v1";
pub const WITNESS_MODULE_BYTES: &[u8] = b"nym-ownership witness generator fixture v1";
const PROOF_TAG: &[u8] = b"nym-transcript-proof:";

static FIXTURES: OnceCell<TestFixtures> = OnceCell::new();
static DEPLOYMENTS: AtomicUsize = AtomicUsize::new(0);

/// Signer holding a fixed secp256k1 key.
#[derive(Clone, Debug)]
pub struct TestSigner {
    signing_key: SigningKey,
    public: SignerKey,
}

impl TestSigner {
    /// Key bytes `[seed; 32]`; `seed` must be non-zero.
    pub fn from_seed(seed: u8) -> Result<Self> {
        let signing_key =
            SigningKey::from_slice(&[seed; 32]).context("invalid signing key bytes")?;
        let public = SignerKey::from_verifying_key(signing_key.verifying_key())
            .map_err(|err| anyhow!("derive public key: {err}"))?;
        Ok(Self {
            signing_key,
            public,
        })
    }

    pub fn public(&self) -> &SignerKey {
        &self.public
    }

    pub fn leaf(&self) -> Fp {
        self.public.leaf()
    }

    /// RFC 6979 deterministic signature over the typed digest.
    pub fn sign(&self, message: &TypedMessage) -> Result<RecoverableSignature> {
        let (signature, recovery_id) = self
            .signing_key
            .sign_prehash_recoverable(&message.digest())
            .context("sign typed message")?;
        let mut rpc = signature.to_bytes().to_vec();
        rpc.push(recovery_id.to_byte());
        RecoverableSignature::from_rpc_bytes(&rpc).map_err(|err| anyhow!("encode signature: {err}"))
    }

    /// Same signature with `s` replaced by `n - s` and the parity flipped, as
    /// signers that skip low-s normalization produce.
    pub fn sign_high_s(&self, message: &TypedMessage) -> Result<RecoverableSignature> {
        let low = self.sign(message)?;
        let s = fq_from_bytes(low.s()).ok_or_else(|| anyhow!("signature s out of range"))?;
        let v = if low.v() == 27 { 28 } else { 27 };
        RecoverableSignature::new(*low.r(), fq_to_bytes(&-s), v)
            .map_err(|err| anyhow!("encode signature: {err}"))
    }

    pub fn sign_nym(&self, nym_name: &str) -> Result<RecoverableSignature> {
        self.sign(&TypedMessage::nym_binding(nym_name))
    }

    pub fn sign_content(&self, content: &ContentMessage) -> Result<RecoverableSignature> {
        self.sign(&content.typed())
    }
}

/// Append-only Poseidon tree of depth [`TREE_DEPTH`]; empty slots hold zero.
#[derive(Clone, Debug)]
pub struct MembershipTree {
    zeros: Vec<Fp>,
    leaves: Vec<Fp>,
}

impl Default for MembershipTree {
    fn default() -> Self {
        Self::new()
    }
}

impl MembershipTree {
    pub fn new() -> Self {
        let mut zeros = Vec::with_capacity(TREE_DEPTH + 1);
        zeros.push(Fp::from(0u64));
        for level in 0..TREE_DEPTH {
            zeros.push(hash_nodes(zeros[level], zeros[level]));
        }
        Self {
            zeros,
            leaves: Vec::new(),
        }
    }

    pub fn insert(&mut self, leaf: Fp) -> usize {
        self.leaves.push(leaf);
        self.leaves.len() - 1
    }

    pub fn index_of(&self, leaf: &Fp) -> Option<usize> {
        self.leaves.iter().position(|candidate| candidate == leaf)
    }

    pub fn root(&self) -> Fp {
        self.layers()
            .last()
            .and_then(|top| top.first().copied())
            .unwrap_or(self.zeros[TREE_DEPTH])
    }

    pub fn proof(&self, index: usize) -> Option<MerkleProof> {
        if index >= self.leaves.len() {
            return None;
        }
        let layers = self.layers();
        let mut position = index;
        let mut siblings = Vec::with_capacity(TREE_DEPTH);
        let mut path_indices = Vec::with_capacity(TREE_DEPTH);
        for (level, layer) in layers.iter().take(TREE_DEPTH).enumerate() {
            siblings.push(layer.get(position ^ 1).copied().unwrap_or(self.zeros[level]));
            path_indices.push((position & 1) as u8);
            position >>= 1;
        }
        let root = layers[TREE_DEPTH].first().copied().unwrap_or(self.zeros[TREE_DEPTH]);
        Some(MerkleProof {
            siblings,
            path_indices,
            root,
        })
    }

    pub fn proof_for(&self, signer: &TestSigner) -> Option<MerkleProof> {
        self.index_of(&signer.leaf()).and_then(|index| self.proof(index))
    }

    fn layers(&self) -> Vec<Vec<Fp>> {
        let mut layers = Vec::with_capacity(TREE_DEPTH + 1);
        layers.push(self.leaves.clone());
        for level in 0..TREE_DEPTH {
            let next = layers[level]
                .chunks(2)
                .map(|pair| hash_nodes(pair[0], pair.get(1).copied().unwrap_or(self.zeros[level])))
                .collect();
            layers.push(next);
        }
        layers
    }
}

/// Shared eligibility set: two members and one outsider.
pub struct TestFixtures {
    member: TestSigner,
    second_member: TestSigner,
    outsider: TestSigner,
    tree: MembershipTree,
}

impl TestFixtures {
    pub fn member(&self) -> &TestSigner {
        &self.member
    }

    pub fn second_member(&self) -> &TestSigner {
        &self.second_member
    }

    /// Valid key that is not in the tree.
    pub fn outsider(&self) -> &TestSigner {
        &self.outsider
    }

    pub fn tree(&self) -> &MembershipTree {
        &self.tree
    }

    pub fn member_proof(&self) -> MerkleProof {
        self.tree
            .proof_for(&self.member)
            .expect("member leaf is in the fixture tree")
    }
}

/// Return lazily constructed fixtures shared across tests.
pub fn fixtures() -> &'static TestFixtures {
    FIXTURES.get_or_init(|| build_fixtures().expect("failed to build nym test fixtures"))
}

fn build_fixtures() -> Result<TestFixtures> {
    let member = TestSigner::from_seed(1)?;
    let second_member = TestSigner::from_seed(2)?;
    let outsider = TestSigner::from_seed(3)?;

    let mut tree = MembershipTree::new();
    for filler in 100u64..103 {
        tree.insert(Fp::from(filler));
    }
    tree.insert(member.leaf());
    tree.insert(Fp::from(200u64));
    tree.insert(second_member.leaf());

    Ok(TestFixtures {
        member,
        second_member,
        outsider,
        tree,
    })
}

/// Proof system stand-in that checks the ownership statement in the clear.
///
/// `prove_circuit` parses the JSON witness, checks that it satisfies the
/// statement behind `public_input` and returns `tag || blake3(circuit ||
/// public_input)`. `verify_circuit` recomputes that transcript.
#[derive(Debug, Default)]
pub struct TranscriptBackend {
    prove_calls: AtomicUsize,
    verify_calls: AtomicUsize,
}

impl TranscriptBackend {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn prove_calls(&self) -> usize {
        self.prove_calls.load(Ordering::SeqCst)
    }

    pub fn verify_calls(&self) -> usize {
        self.verify_calls.load(Ordering::SeqCst)
    }

    fn transcript(circuit: &[u8], public_input: &[u8; PUBLIC_INPUT_BYTES]) -> Vec<u8> {
        let mut hasher = blake3::Hasher::new();
        hasher.update(circuit);
        hasher.update(public_input);
        let mut proof = PROOF_TAG.to_vec();
        proof.extend_from_slice(hasher.finalize().as_bytes());
        proof
    }
}

impl ProofBackend for TranscriptBackend {
    fn prove_circuit(
        &self,
        circuit: &[u8],
        witness: &[u8],
        public_input: &[u8; PUBLIC_INPUT_BYTES],
    ) -> Result<Vec<u8>, BackendError> {
        self.prove_calls.fetch_add(1, Ordering::SeqCst);
        let input = WitnessInput::from_json(witness)?;
        check_statement(&input, public_input).map_err(BackendError::Prover)?;
        Ok(Self::transcript(circuit, public_input))
    }

    fn verify_circuit(
        &self,
        circuit: &[u8],
        proof: &[u8],
        public_input: &[u8; PUBLIC_INPUT_BYTES],
    ) -> Result<bool, BackendError> {
        self.verify_calls.fetch_add(1, Ordering::SeqCst);
        if !proof.starts_with(PROOF_TAG) || proof.len() != PROOF_TAG.len() + 32 {
            return Err(BackendError::Verifier("proof is not a transcript".into()));
        }
        Ok(proof == Self::transcript(circuit, public_input).as_slice())
    }
}

/// The ownership statement: both signatures verify under one key, that key is
/// a tree member and the nym hash is `Poseidon(s, s)` of the nym signature.
fn check_statement(
    input: &WitnessInput,
    public_input: &[u8; PUBLIC_INPUT_BYTES],
) -> std::result::Result<(), String> {
    let nym_points = EffectivePoints {
        t_x: input.nym_sig_tx,
        t_y: input.nym_sig_ty,
        u_x: input.nym_sig_ux,
        u_y: input.nym_sig_uy,
    };
    let content_points = EffectivePoints {
        t_x: input.content_sig_tx,
        t_y: input.content_sig_ty,
        u_x: input.content_sig_ux,
        u_y: input.content_sig_uy,
    };
    let statement = PublicInput {
        root: input.root,
        nym_hash: input.nym_hash,
        nym_sig: nym_points,
        content_sig: content_points,
    };
    if statement.serialize() != *public_input {
        return Err("witness does not match the public input".into());
    }

    let nym_key = implied_signer(&nym_points, &input.nym_sig_s)
        .ok_or("nym signature does not verify")?;
    let content_key = implied_signer(&content_points, &input.content_sig_s)
        .ok_or("content signature does not verify")?;
    if nym_key != content_key {
        return Err("signatures come from different keys".into());
    }

    let membership = MerkleProof {
        siblings: input.siblings.clone(),
        path_indices: input.path_indices.clone(),
        root: input.root,
    };
    if !membership.verify(nym_key.leaf()) {
        return Err("signer is not in the tree".into());
    }
    if compute_nym_hash(&fp_to_bytes(&input.nym_sig_s)) != input.nym_hash {
        return Err("nym hash does not match the nym signature".into());
    }
    Ok(())
}

fn implied_signer(points: &EffectivePoints, s: &Fp) -> Option<SignerKey> {
    let s = reduce_be_bytes_to_fq(&fp_to_bytes(s));
    points
        .implied_key(s)
        .and_then(|point| SignerKey::from_affine(&point))
}

/// Backend whose every call fails, as an unreachable proving service would.
#[derive(Debug, Default)]
pub struct FailingBackend;

impl ProofBackend for FailingBackend {
    fn prove_circuit(
        &self,
        _circuit: &[u8],
        _witness: &[u8],
        _public_input: &[u8; PUBLIC_INPUT_BYTES],
    ) -> Result<Vec<u8>, BackendError> {
        Err(BackendError::Prover("proving service unavailable".into()))
    }

    fn verify_circuit(
        &self,
        _circuit: &[u8],
        _proof: &[u8],
        _public_input: &[u8; PUBLIC_INPUT_BYTES],
    ) -> Result<bool, BackendError> {
        Err(BackendError::Verifier("verifying service unavailable".into()))
    }
}

/// Emits the input record as JSON after checking it was handed the fixture
/// module.
#[derive(Debug, Default)]
pub struct JsonWitnessGenerator {
    calls: AtomicUsize,
}

impl JsonWitnessGenerator {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn calls(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }
}

impl WitnessGenerator for JsonWitnessGenerator {
    fn generate_witness(&self, module: &[u8], input: &WitnessInput) -> Result<Vec<u8>, BackendError> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        if module != WITNESS_MODULE_BYTES {
            return Err(BackendError::Witness("unknown witness module".into()));
        }
        input.to_json()
    }
}

/// In-memory asset store that counts fetches.
#[derive(Debug, Default)]
pub struct StaticFetcher {
    assets: HashMap<String, Vec<u8>>,
    calls: AtomicUsize,
}

impl StaticFetcher {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_asset(mut self, uri: impl Into<String>, bytes: impl Into<Vec<u8>>) -> Self {
        self.assets.insert(uri.into(), bytes.into());
        self
    }

    pub fn calls(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl AssetFetcher for StaticFetcher {
    async fn fetch(&self, uri: &str) -> Result<Vec<u8>, BackendError> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        self.assets
            .get(uri)
            .cloned()
            .ok_or_else(|| BackendError::Asset {
                uri: uri.to_owned(),
                reason: "not found".into(),
            })
    }
}

/// One isolated set of collaborators: unique asset URIs, a private cache and
/// fresh call counters.
pub struct Deployment {
    pub prover_config: ProverConfig,
    pub verifier_config: VerifierConfig,
    pub fetcher: Arc<StaticFetcher>,
    pub assets: Arc<AssetCache>,
    pub backend: Arc<TranscriptBackend>,
    pub witness_gen: Arc<JsonWitnessGenerator>,
}

impl Default for Deployment {
    fn default() -> Self {
        Self::new()
    }
}

impl Deployment {
    pub fn new() -> Self {
        let id = DEPLOYMENTS.fetch_add(1, Ordering::SeqCst);
        let circuit_url = format!("mem://deployment-{id}/nym_ownership.circuit");
        let witness_gen_url = format!("mem://deployment-{id}/nym_ownership.wasm");
        let fetcher = StaticFetcher::new()
            .with_asset(circuit_url.clone(), CIRCUIT_BYTES)
            .with_asset(witness_gen_url.clone(), WITNESS_MODULE_BYTES);
        Self {
            prover_config: ProverConfig {
                circuit_url: circuit_url.clone(),
                witness_gen_url,
                enable_profiler: true,
                circuit_blake3: None,
            },
            verifier_config: VerifierConfig {
                circuit_url,
                enable_profiler: true,
                circuit_blake3: None,
            },
            fetcher: Arc::new(fetcher),
            assets: Arc::new(AssetCache::new()),
            backend: Arc::new(TranscriptBackend::new()),
            witness_gen: Arc::new(JsonWitnessGenerator::new()),
        }
    }
}
